use libiot_mqtt::network::application::mqtt::MAX_REMAINING_LENGTH;
use libiot_mqtt::network::application::mqtt::varint::{
    decode_remaining_length, encode_remaining_length, encoded_size,
};
use libiot_mqtt::{
    Error, IncomingPacket, OutgoingPacket, PublishInfo, QoS, deserialize,
    get_incoming_packet_type_and_length,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::MockConnection;

const TOPIC_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789/_-";

#[test]
fn test_remaining_length_boundaries() {
    for value in [
        0,
        127,
        128,
        16_383,
        16_384,
        2_097_151,
        2_097_152,
        MAX_REMAINING_LENGTH,
    ] {
        let encoded = encode_remaining_length(value).unwrap();
        assert_eq!(encoded.len(), encoded_size(value).unwrap());
        assert_eq!(decode_remaining_length(&encoded), Ok((value, encoded.len())));
    }
    assert_eq!(
        encode_remaining_length(MAX_REMAINING_LENGTH + 1),
        Err(Error::BadParameter)
    );
}

#[test]
fn test_remaining_length_random_values() {
    let mut rng = StdRng::seed_from_u64(0x4D51_5454);
    for _ in 0..10_000 {
        let value = rng.gen_range(0..=MAX_REMAINING_LENGTH);
        let encoded = encode_remaining_length(value).unwrap();
        let (decoded, consumed) = decode_remaining_length(&encoded).unwrap();
        assert_eq!(decoded, value);
        assert_eq!(consumed, encoded.len());
    }
}

fn random_topic(rng: &mut StdRng, buf: &mut [u8]) -> usize {
    let len = rng.gen_range(1..=buf.len());
    for byte in &mut buf[..len] {
        *byte = TOPIC_ALPHABET[rng.gen_range(0..TOPIC_ALPHABET.len())];
    }
    len
}

#[test]
fn test_publish_random_round_trip() {
    let mut rng = StdRng::seed_from_u64(1883);
    let mut conn = MockConnection::new();

    for _ in 0..500 {
        let mut topic_buf = [0u8; 48];
        let topic_len = random_topic(&mut rng, &mut topic_buf);
        let topic_name = core::str::from_utf8(&topic_buf[..topic_len]).unwrap();

        let mut payload = [0u8; 200];
        let payload_len = rng.gen_range(0..=payload.len());
        rng.fill(&mut payload[..payload_len]);

        let qos = QoS::try_from(rng.gen_range(0..=2u8)).unwrap();
        let info = PublishInfo {
            qos,
            retain: rng.r#gen(),
            dup: qos != QoS::AtMostOnce && rng.r#gen(),
            topic_name,
            payload: &payload[..payload_len],
        };
        let packet_id = rng.gen_range(1..=u16::MAX);

        let mut wire = [0u8; 300];
        let written = OutgoingPacket::Publish { info, packet_id }
            .encode(&mut wire)
            .unwrap();

        conn.push_read_data(&wire[..written]);
        let framed = get_incoming_packet_type_and_length(&mut conn).unwrap();
        let mut body = [0u8; 300];
        let body = conn.read_body(&mut body, framed.remaining_length);

        match deserialize(&framed.with_remaining_data(body)).unwrap() {
            IncomingPacket::Publish(received) => {
                assert_eq!(received.info, info);
                let expected_id = (qos != QoS::AtMostOnce).then_some(packet_id);
                assert_eq!(received.packet_id, expected_id);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(conn.pending().is_empty());
    }
}

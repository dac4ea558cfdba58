use libiot_mqtt::network::application::mqtt::serialize_ack;
use libiot_mqtt::{
    Ack, AckType, Error, IncomingPacket, PacketInfo, Refusal, deserialize, deserialize_ack,
    deserialize_publish, deserialize_refusal, get_incoming_packet_type_and_length,
};
use libiot_mqtt::network::application::mqtt::ConnackReturnCode;

use crate::MockConnection;

/// Push `wire` through the framer and return the deserialized packet.
fn receive<'a>(
    conn: &mut MockConnection,
    wire: &[u8],
    body: &'a mut [u8],
) -> Result<IncomingPacket<'a>, Error> {
    conn.push_read_data(wire);
    let packet = get_incoming_packet_type_and_length(conn)?;
    let body = conn.read_body(body, packet.remaining_length);
    deserialize(&packet.with_remaining_data(body))
}

#[test]
fn test_publish_acks_round_trip() {
    let mut conn = MockConnection::new();
    for ack_type in [
        AckType::PubAck,
        AckType::PubRec,
        AckType::PubRel,
        AckType::PubComp,
    ] {
        let mut wire = [0u8; 4];
        serialize_ack(ack_type, 0x0A0B, &mut wire).unwrap();

        let mut body = [0u8; 4];
        let packet = receive(&mut conn, &wire, &mut body).unwrap();
        assert_eq!(
            packet,
            IncomingPacket::Ack(Ack::Publish {
                ack_type,
                packet_id: 0x0A0B
            })
        );
    }
}

#[test]
fn test_suback_and_unsuback() {
    let mut conn = MockConnection::new();
    let mut body = [0u8; 8];
    let packet = receive(&mut conn, &[0x90, 0x04, 0x00, 0x07, 0x01, 0x00], &mut body).unwrap();
    match packet {
        IncomingPacket::Ack(ack @ Ack::SubAck { return_codes, .. }) => {
            assert_eq!(ack.packet_id(), Some(7));
            assert_eq!(return_codes, &[0x01, 0x00]);
        }
        other => panic!("unexpected {:?}", other),
    }

    let mut body = [0u8; 8];
    assert_eq!(
        receive(&mut conn, &[0x90, 0x03, 0x00, 0x07, 0x80], &mut body),
        Err(Error::ServerRefused)
    );

    let mut body = [0u8; 8];
    assert_eq!(
        receive(&mut conn, &[0xB0, 0x02, 0x00, 0x09], &mut body),
        Ok(IncomingPacket::Ack(Ack::UnsubAck { packet_id: 9 }))
    );
}

#[test]
fn test_partially_refused_suback_keeps_packet_id() {
    let mut conn = MockConnection::new();
    conn.push_read_data(&[0x90, 0x04, 0x00, 0x07, 0x01, 0x80]);
    let packet = get_incoming_packet_type_and_length(&mut conn).unwrap();
    let mut buf = [0u8; 8];
    let body = conn.read_body(&mut buf, packet.remaining_length);
    let packet = packet.with_remaining_data(body);

    assert_eq!(deserialize(&packet), Err(Error::ServerRefused));
    match deserialize_refusal(&packet).unwrap() {
        Refusal::Subscribe {
            packet_id,
            return_codes,
        } => {
            assert_eq!(packet_id, 7);
            assert_eq!(return_codes, &[0x01, 0x80]);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_connack_refusals() {
    for return_code in 1..=5u8 {
        let packet = PacketInfo {
            packet_type: 0x20,
            remaining_data: &[0x00, return_code],
            remaining_length: 2,
        };
        assert_eq!(deserialize_ack(&packet), Err(Error::ServerRefused));
        let refusal = deserialize_refusal(&packet).unwrap();
        assert_eq!(
            refusal,
            Refusal::Connect {
                return_code: ConnackReturnCode::from_byte(return_code).unwrap()
            }
        );
        assert_eq!(refusal.packet_id(), None);
    }

    let mut conn = MockConnection::new();
    let mut body = [0u8; 4];
    assert_eq!(
        receive(&mut conn, &[0x20, 0x02, 0x01, 0x00], &mut body),
        Ok(IncomingPacket::Ack(Ack::ConnAck {
            session_present: true
        }))
    );
}

#[test]
fn test_pingresp() {
    let mut conn = MockConnection::new();
    let mut body = [0u8; 0];
    assert_eq!(
        receive(&mut conn, &[0xD0, 0x00], &mut body),
        Ok(IncomingPacket::Ack(Ack::PingResp))
    );
}

#[test]
fn test_wrong_ack_length() {
    let mut conn = MockConnection::new();
    let mut body = [0u8; 3];
    assert_eq!(
        receive(&mut conn, &[0x40, 0x03, 0x00, 0x01, 0x00], &mut body),
        Err(Error::BadResponse)
    );
}

#[test]
fn test_publish_payload_borrows_receive_buffer() {
    let body = [0x00, 0x01, b't', 0x12, 0x34, 0xDE, 0xAD];
    let packet = PacketInfo {
        packet_type: 0x34,
        remaining_data: &body,
        remaining_length: body.len(),
    };
    let publish = deserialize_publish(&packet).unwrap();
    assert_eq!(publish.packet_id, Some(0x1234));
    assert_eq!(publish.info.payload, &[0xDE, 0xAD]);
    assert_eq!(publish.info.payload.as_ptr(), body[5..].as_ptr());
}

#[test]
fn test_publish_uses_only_remaining_length_bytes() {
    // Extra bytes after the packet belong to the next one.
    let body = [0x00, 0x01, b't', b'p', 0xFF, 0xFF];
    let packet = PacketInfo {
        packet_type: 0x30,
        remaining_data: &body,
        remaining_length: 4,
    };
    assert_eq!(deserialize_publish(&packet).unwrap().info.payload, b"p");
}

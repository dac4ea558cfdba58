use libiot_mqtt::network::{RecvError, RecvFn};
use libiot_mqtt::{Ack, Error, deserialize_ack, get_incoming_packet_type_and_length};

use crate::MockConnection;

#[test]
fn test_connack_is_framed_then_deserialized() {
    let mut conn = MockConnection::new();
    conn.push_read_data(&[0x20, 0x02, 0x00, 0x00]);

    let packet = get_incoming_packet_type_and_length(&mut conn).unwrap();
    assert_eq!(packet.packet_type, 0x20);
    assert_eq!(packet.remaining_length, 2);
    // The body is still on the transport.
    assert_eq!(conn.pending(), &[0x00, 0x00]);

    let mut buf = [0u8; 8];
    let body = conn.read_body(&mut buf, packet.remaining_length);
    let ack = deserialize_ack(&packet.with_remaining_data(body)).unwrap();
    assert_eq!(
        ack,
        Ack::ConnAck {
            session_present: false
        }
    );
}

#[test]
fn test_no_data_on_first_read() {
    let mut conn = MockConnection::new();
    let error = get_incoming_packet_type_and_length(&mut conn).unwrap_err();
    assert_eq!(error, Error::NoDataAvailable);
    assert!(error.is_transient());
    assert_eq!(conn.reads, 1);

    let mut calls = 0;
    let mut recv = RecvFn(|_: &mut [u8]| {
        calls += 1;
        0
    });
    assert_eq!(
        get_incoming_packet_type_and_length(&mut recv),
        Err(Error::NoDataAvailable)
    );
    drop(recv);
    assert_eq!(calls, 1);
}

#[test]
fn test_transport_failure_is_recv_failed() {
    let mut conn = MockConnection::new();
    conn.is_open = false;
    assert_eq!(
        get_incoming_packet_type_and_length(&mut conn),
        Err(Error::RecvFailed)
    );

    // Failure while reading the Remaining Length.
    let wire = [0x30u8, 0x80];
    let mut pos = 0;
    let mut recv = RecvFn(|buf: &mut [u8]| {
        if pos == wire.len() {
            return -5;
        }
        buf[0] = wire[pos];
        pos += 1;
        1
    });
    assert_eq!(
        get_incoming_packet_type_and_length(&mut recv),
        Err(Error::RecvFailed)
    );
}

#[test]
fn test_invalid_type_byte() {
    for header in [0x00u8, 0x12, 0x80, 0xA0, 0x60, 0xF0, 0x21] {
        let mut conn = MockConnection::new();
        conn.push_read_data(&[header, 0x00]);
        assert_eq!(
            get_incoming_packet_type_and_length(&mut conn),
            Err(Error::BadResponse),
            "header {:#04x}",
            header
        );
    }
}

#[test]
fn test_publish_flags_are_accepted() {
    let mut conn = MockConnection::new();
    conn.push_read_data(&[0x3D, 0x00]);
    let packet = get_incoming_packet_type_and_length(&mut conn).unwrap();
    assert_eq!(packet.packet_type, 0x3D);
    assert_eq!(packet.remaining_length, 0);
}

#[test]
fn test_remaining_length_limits() {
    let mut conn = MockConnection::new();
    conn.push_read_data(&[0x30, 0xFF, 0xFF, 0xFF, 0x7F]);
    let packet = get_incoming_packet_type_and_length(&mut conn).unwrap();
    assert_eq!(packet.remaining_length, 268_435_455);
    assert_eq!(conn.reads, 5);

    let mut conn = MockConnection::new();
    conn.push_read_data(&[0x30, 0xFF, 0xFF, 0xFF, 0xFF, 0x01]);
    assert_eq!(
        get_incoming_packet_type_and_length(&mut conn),
        Err(Error::BadResponse)
    );
    // The fourth length byte is read to see its continuation bit; nothing
    // after it is consumed.
    assert_eq!(conn.pending(), &[0x01]);

    let mut conn = MockConnection::new();
    conn.push_read_data(&[0xD0, 0x80]);
    assert_eq!(
        get_incoming_packet_type_and_length(&mut conn),
        Err(Error::BadResponse)
    );
}

#[test]
fn test_recv_fn_reporting_too_much_is_an_error() {
    let mut recv = RecvFn(|_: &mut [u8]| 4);
    let mut byte = [0u8; 1];
    assert_eq!(
        libiot_mqtt::network::Read::read(&mut recv, &mut byte),
        Err(RecvError(-1))
    );
    assert_eq!(
        get_incoming_packet_type_and_length(&mut recv),
        Err(Error::RecvFailed)
    );
}

#[cfg(feature = "async")]
mod asynchronous {
    use futures::executor::block_on;
    use libiot_mqtt::network::AsyncRead;
    use libiot_mqtt::network::application::mqtt::get_incoming_packet_type_and_length_async;
    use libiot_mqtt::{Error, PacketType};

    struct AsyncSlice<'a> {
        data: &'a [u8],
    }

    impl AsyncRead for AsyncSlice<'_> {
        type Error = ();

        async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            let n = buf.len().min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_async_framing() {
        let mut transport = AsyncSlice {
            data: &[0x90, 0x03, 0x00, 0x01, 0x00],
        };
        let packet = block_on(get_incoming_packet_type_and_length_async(&mut transport)).unwrap();
        assert_eq!(packet.kind(), Some(PacketType::SubAck));
        assert_eq!(packet.remaining_length, 3);
        assert_eq!(transport.data, &[0x00, 0x01, 0x00]);

        let mut empty = AsyncSlice { data: &[] };
        assert_eq!(
            block_on(get_incoming_packet_type_and_length_async(&mut empty)),
            Err(Error::NoDataAvailable)
        );
    }
}

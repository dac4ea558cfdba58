use libiot_mqtt::network::Read;

mod config;
mod deserialize;
mod incoming;
mod roundtrip;

const MOCK_BUFFER_SIZE: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MockError {
    NotOpen,
}

/// In-memory transport that serves injected bytes in order.
#[derive(Debug)]
struct MockConnection {
    read_buffer: [u8; MOCK_BUFFER_SIZE],
    read_pos: usize,
    reads: usize,
    is_open: bool,
}

impl MockConnection {
    fn new() -> Self {
        Self {
            read_buffer: [0; MOCK_BUFFER_SIZE],
            read_pos: 0,
            reads: 0,
            is_open: true,
        }
    }

    /// Append bytes to what the next reads will return.
    fn push_read_data(&mut self, data: &[u8]) {
        let len = data.len().min(MOCK_BUFFER_SIZE - self.read_pos);
        self.read_buffer[self.read_pos..self.read_pos + len].copy_from_slice(&data[..len]);
        self.read_pos += len;
    }

    fn pending(&self) -> &[u8] {
        &self.read_buffer[..self.read_pos]
    }

    /// Read exactly `len` bytes of packet body, as a caller of the framer would.
    fn read_body<'a>(&mut self, buf: &'a mut [u8], len: usize) -> &'a [u8] {
        let body = &mut buf[..len];
        let n = self.read(body).unwrap();
        assert_eq!(n, len, "mock ran out of data");
        body
    }
}

impl Read for MockConnection {
    type Error = MockError;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if !self.is_open {
            return Err(MockError::NotOpen);
        }
        self.reads += 1;
        let readable = self.read_pos;
        let len = buf.len().min(readable);
        buf[..len].copy_from_slice(&self.read_buffer[..len]);

        // Shift remaining data
        self.read_buffer.copy_within(len..readable, 0);
        self.read_pos -= len;

        Ok(len)
    }
}

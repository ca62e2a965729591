//! Record layer: framing, fragmentation, per-direction sequence numbers,
//! and the cryptographic state swap at the ChangeCipherSpec boundary.
use crate::error::{Error, Result};
use crate::suite::RecordCipher;
use std::io::{Read, Write};

/// Largest plaintext fragment in one record.
pub const MAX_PLAINTEXT: usize = 16384;
/// Inbound ciphertext tolerance: plaintext limit plus cipher expansion.
pub const MAX_CIPHERTEXT: usize = MAX_PLAINTEXT + 2048;

pub const RECORD_HEADER_LEN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolVersion {
    pub major: u8,
    pub minor: u8,
}

/// The single supported wire version.
pub const TLS12: ProtocolVersion = ProtocolVersion { major: 3, minor: 3 };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    ChangeCipherSpec = 20,
    Alert = 21,
    Handshake = 22,
    ApplicationData = 23,
}

impl TryFrom<u8> for ContentType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            20 => Ok(ContentType::ChangeCipherSpec),
            21 => Ok(ContentType::Alert),
            22 => Ok(ContentType::Handshake),
            23 => Ok(ContentType::ApplicationData),
            other => Err(Error::UnexpectedMessage(format!(
                "unknown record content type {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

/// Per-direction cryptographic context: the record sequence number and the
/// active cipher, if any. Starts as the null state; replaced wholesale at
/// ChangeCipherSpec, which also restarts the sequence at zero for the new
/// cipher's epoch.
#[derive(Debug)]
pub struct ConnectionState {
    sequence: u64,
    cipher: Option<RecordCipher>,
}

impl ConnectionState {
    pub fn plaintext() -> Self {
        Self {
            sequence: 0,
            cipher: None,
        }
    }

    pub fn with_cipher(cipher: RecordCipher) -> Self {
        Self {
            sequence: 0,
            cipher: Some(cipher),
        }
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    fn next_sequence(&mut self) -> Result<u64> {
        let current = self.sequence;
        self.sequence = self.sequence.checked_add(1).ok_or(Error::SequenceOverflow)?;
        Ok(current)
    }
}

/// Frames outbound plaintext into records and reassembles, decrypts, and
/// authenticates inbound records. Owns the transport and both direction
/// states; all mutation is confined to the sequence counters and the
/// active ciphers.
#[derive(Debug)]
pub struct RecordLayer<S> {
    stream: S,
    read_state: ConnectionState,
    write_state: ConnectionState,
}

impl<S> RecordLayer<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            read_state: ConnectionState::plaintext(),
            write_state: ConnectionState::plaintext(),
        }
    }

    /// Atomically replace one direction's state. Called exactly once per
    /// direction per handshake, after key derivation and before the
    /// corresponding Finished message.
    pub fn change_cipher_spec(&mut self, direction: Direction, cipher: RecordCipher) {
        let state = ConnectionState::with_cipher(cipher);
        match direction {
            Direction::Read => self.read_state = state,
            Direction::Write => self.write_state = state,
        }
    }

    pub fn state(&self, direction: Direction) -> &ConnectionState {
        match direction {
            Direction::Read => &self.read_state,
            Direction::Write => &self.write_state,
        }
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S: Read + Write> RecordLayer<S> {
    /// Send `plaintext` as one or more records of at most [`MAX_PLAINTEXT`]
    /// bytes each.
    pub fn send(&mut self, content_type: ContentType, plaintext: &[u8]) -> Result<()> {
        if plaintext.is_empty() {
            return self.send_fragment(content_type, plaintext);
        }

        for fragment in plaintext.chunks(MAX_PLAINTEXT) {
            self.send_fragment(content_type, fragment)?;
        }
        Ok(())
    }

    fn send_fragment(&mut self, content_type: ContentType, fragment: &[u8]) -> Result<()> {
        if fragment.len() > MAX_PLAINTEXT {
            return Err(Error::RecordOverflow(fragment.len()));
        }

        let sequence = self.write_state.next_sequence()?;
        let body = match &self.write_state.cipher {
            Some(cipher) => cipher.encrypt(sequence, content_type as u8, TLS12, fragment)?,
            None => fragment.to_vec(),
        };

        log::trace!(
            "send record type={:?} seq={} len={}",
            content_type,
            sequence,
            body.len()
        );

        let mut header = [0u8; RECORD_HEADER_LEN];
        header[0] = content_type as u8;
        header[1] = TLS12.major;
        header[2] = TLS12.minor;
        header[3..5].copy_from_slice(&(body.len() as u16).to_be_bytes());

        self.stream.write_all(&header)?;
        self.stream.write_all(&body)?;
        self.stream.flush()?;
        Ok(())
    }

    /// Block until a complete record is available; decrypt and authenticate
    /// it under the read state. Returns the content type and plaintext
    /// fragment.
    pub fn recv(&mut self) -> Result<(ContentType, Vec<u8>)> {
        let mut header = [0u8; RECORD_HEADER_LEN];
        self.stream.read_exact(&mut header)?;

        let content_type = ContentType::try_from(header[0])?;
        let version = ProtocolVersion {
            major: header[1],
            minor: header[2],
        };
        if version != TLS12 {
            return Err(Error::Decode(format!(
                "unsupported record version {}.{}",
                version.major, version.minor
            )));
        }

        let length = u16::from_be_bytes([header[3], header[4]]) as usize;
        if length > MAX_CIPHERTEXT {
            return Err(Error::RecordOverflow(length));
        }

        let mut body = vec![0u8; length];
        self.stream.read_exact(&mut body)?;

        let sequence = self.read_state.next_sequence()?;
        let fragment = match &self.read_state.cipher {
            Some(cipher) => cipher.decrypt(sequence, content_type as u8, version, &body)?,
            None => body,
        };

        if fragment.len() > MAX_PLAINTEXT {
            return Err(Error::RecordOverflow(fragment.len()));
        }

        log::trace!(
            "recv record type={:?} seq={} len={}",
            content_type,
            sequence,
            fragment.len()
        );

        Ok((content_type, fragment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suite::{descriptor, CipherSuiteId, RecordCipher};
    use std::io::Cursor;

    fn test_cipher() -> RecordCipher {
        let desc = descriptor(CipherSuiteId::RsaAes128CbcSha);
        RecordCipher::new(desc, &[0x0B; 20], &[0x2E; 16]).unwrap()
    }

    #[test]
    fn test_plaintext_record_roundtrip() {
        let mut writer = RecordLayer::new(Cursor::new(Vec::new()));
        writer.send(ContentType::Handshake, b"hello").unwrap();

        let mut reader = RecordLayer::new(Cursor::new(writer.into_inner().into_inner()));
        let (content_type, fragment) = reader.recv().unwrap();
        assert_eq!(content_type, ContentType::Handshake);
        assert_eq!(fragment, b"hello");
    }

    #[test]
    fn test_encrypted_record_roundtrip() {
        let mut writer = RecordLayer::new(Cursor::new(Vec::new()));
        writer.change_cipher_spec(Direction::Write, test_cipher());
        writer.send(ContentType::ApplicationData, b"ping").unwrap();

        let wire = writer.into_inner().into_inner();
        // Body is not the plaintext.
        assert!(!wire.windows(4).any(|w| w == b"ping"));

        let mut reader = RecordLayer::new(Cursor::new(wire));
        reader.change_cipher_spec(Direction::Read, test_cipher());
        let (content_type, fragment) = reader.recv().unwrap();
        assert_eq!(content_type, ContentType::ApplicationData);
        assert_eq!(fragment, b"ping");
    }

    #[test]
    fn test_sequence_numbers_increment() {
        let mut writer = RecordLayer::new(Cursor::new(Vec::new()));
        writer.change_cipher_spec(Direction::Write, test_cipher());
        assert_eq!(writer.state(Direction::Write).sequence(), 0);

        writer.send(ContentType::ApplicationData, b"one").unwrap();
        assert_eq!(writer.state(Direction::Write).sequence(), 1);
        writer.send(ContentType::ApplicationData, b"two").unwrap();
        assert_eq!(writer.state(Direction::Write).sequence(), 2);
        // Read direction untouched.
        assert_eq!(writer.state(Direction::Read).sequence(), 0);

        let mut reader = RecordLayer::new(Cursor::new(writer.into_inner().into_inner()));
        reader.change_cipher_spec(Direction::Read, test_cipher());
        assert_eq!(reader.recv().unwrap().1, b"one");
        assert_eq!(reader.recv().unwrap().1, b"two");
        assert_eq!(reader.state(Direction::Read).sequence(), 2);
    }

    #[test]
    fn test_large_payload_fragments() {
        let payload = vec![0x55u8; MAX_PLAINTEXT + 10];
        let mut writer = RecordLayer::new(Cursor::new(Vec::new()));
        writer.send(ContentType::ApplicationData, &payload).unwrap();
        assert_eq!(writer.state(Direction::Write).sequence(), 2);

        let mut reader = RecordLayer::new(Cursor::new(writer.into_inner().into_inner()));
        let (_, first) = reader.recv().unwrap();
        let (_, second) = reader.recv().unwrap();
        assert_eq!(first.len(), MAX_PLAINTEXT);
        assert_eq!(second.len(), 10);
    }

    #[test]
    fn test_corrupted_record_fails_mac() {
        let mut writer = RecordLayer::new(Cursor::new(Vec::new()));
        writer.change_cipher_spec(Direction::Write, test_cipher());
        writer.send(ContentType::ApplicationData, b"payload").unwrap();

        let mut wire = writer.into_inner().into_inner();
        let last = wire.len() - 1;
        wire[last] ^= 0x80;

        let mut reader = RecordLayer::new(Cursor::new(wire));
        reader.change_cipher_spec(Direction::Read, test_cipher());
        assert!(matches!(reader.recv().unwrap_err(), Error::BadRecordMac));
    }

    #[test]
    fn test_bad_version_rejected() {
        let wire = vec![22, 3, 1, 0, 1, 0xAA];
        let mut reader = RecordLayer::new(Cursor::new(wire));
        assert!(matches!(reader.recv().unwrap_err(), Error::Decode(_)));
    }

    #[test]
    fn test_unknown_content_type_rejected() {
        let wire = vec![99, 3, 3, 0, 1, 0xAA];
        let mut reader = RecordLayer::new(Cursor::new(wire));
        assert!(matches!(
            reader.recv().unwrap_err(),
            Error::UnexpectedMessage(_)
        ));
    }

    #[test]
    fn test_oversize_length_rejected() {
        let mut wire = vec![23, 3, 3];
        wire.extend_from_slice(&((MAX_CIPHERTEXT + 1) as u16).to_be_bytes());
        let mut reader = RecordLayer::new(Cursor::new(wire));
        assert!(matches!(
            reader.recv().unwrap_err(),
            Error::RecordOverflow(_)
        ));
    }

    #[test]
    fn test_truncated_body_is_transport_error() {
        let wire = vec![22, 3, 3, 0, 10, 0x01];
        let mut reader = RecordLayer::new(Cursor::new(wire));
        assert!(matches!(reader.recv().unwrap_err(), Error::Transport(_)));
    }
}

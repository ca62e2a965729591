//! Handshake message wire formats: a 4-byte header (1-byte type, 3-byte
//! big-endian length) followed by the message body. The message set is a
//! closed enum; the state machine in `connection` decides which are legal
//! when.
use crate::error::{Error, Result};
use crate::utils;

pub mod certificate;
pub mod certificate_request;
pub mod certificate_verify;
pub mod client_hello;
pub mod client_key_exchange;
pub mod extensions;
pub mod finished;
pub mod server_hello;
pub mod server_key_exchange;

pub use certificate::Certificate;
pub use certificate_request::CertificateRequest;
pub use certificate_verify::CertificateVerify;
pub use client_hello::ClientHello;
pub use client_key_exchange::ClientKeyExchange;
pub use extensions::{ClientExtensionConfig, Extension, ExtensionType};
pub use finished::Finished;
pub use server_hello::ServerHello;
pub use server_key_exchange::ServerKeyExchange;

pub const HANDSHAKE_HEADER_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeType {
    HelloRequest = 0,
    ClientHello = 1,
    ServerHello = 2,
    Certificate = 11,
    ServerKeyExchange = 12,
    CertificateRequest = 13,
    ServerHelloDone = 14,
    CertificateVerify = 15,
    ClientKeyExchange = 16,
    Finished = 20,
}

impl TryFrom<u8> for HandshakeType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(HandshakeType::HelloRequest),
            1 => Ok(HandshakeType::ClientHello),
            2 => Ok(HandshakeType::ServerHello),
            11 => Ok(HandshakeType::Certificate),
            12 => Ok(HandshakeType::ServerKeyExchange),
            13 => Ok(HandshakeType::CertificateRequest),
            14 => Ok(HandshakeType::ServerHelloDone),
            15 => Ok(HandshakeType::CertificateVerify),
            16 => Ok(HandshakeType::ClientKeyExchange),
            20 => Ok(HandshakeType::Finished),
            other => Err(Error::Decode(format!("invalid handshake type {}", other))),
        }
    }
}

#[derive(Debug, Clone)]
pub enum HandshakeMessage {
    HelloRequest,
    ClientHello(ClientHello),
    ServerHello(ServerHello),
    Certificate(Certificate),
    ServerKeyExchange(ServerKeyExchange),
    CertificateRequest(CertificateRequest),
    ServerHelloDone,
    CertificateVerify(CertificateVerify),
    ClientKeyExchange(ClientKeyExchange),
    Finished(Finished),
}

impl HandshakeMessage {
    pub fn message_type(&self) -> HandshakeType {
        match self {
            HandshakeMessage::HelloRequest => HandshakeType::HelloRequest,
            HandshakeMessage::ClientHello(_) => HandshakeType::ClientHello,
            HandshakeMessage::ServerHello(_) => HandshakeType::ServerHello,
            HandshakeMessage::Certificate(_) => HandshakeType::Certificate,
            HandshakeMessage::ServerKeyExchange(_) => HandshakeType::ServerKeyExchange,
            HandshakeMessage::CertificateRequest(_) => HandshakeType::CertificateRequest,
            HandshakeMessage::ServerHelloDone => HandshakeType::ServerHelloDone,
            HandshakeMessage::CertificateVerify(_) => HandshakeType::CertificateVerify,
            HandshakeMessage::ClientKeyExchange(_) => HandshakeType::ClientKeyExchange,
            HandshakeMessage::Finished(_) => HandshakeType::Finished,
        }
    }

    /// Parse one message starting at `pos`, advancing past it. Returns
    /// `None` when fewer bytes than a whole message are buffered.
    pub fn parse(data: &[u8], pos: &mut usize) -> Result<Option<Self>> {
        if data.len() - *pos < HANDSHAKE_HEADER_LEN {
            return Ok(None);
        }

        let mut header_pos = *pos;
        let message_type = HandshakeType::try_from(utils::read_u8(data, &mut header_pos)?)?;
        let length = utils::read_u24(data, &mut header_pos)? as usize;

        if data.len() - header_pos < length {
            return Ok(None);
        }

        let body = &data[header_pos..header_pos + length];
        *pos = header_pos + length;

        let message = match message_type {
            HandshakeType::HelloRequest => {
                utils::expect_consumed(body, 0)?;
                HandshakeMessage::HelloRequest
            }
            HandshakeType::ClientHello => HandshakeMessage::ClientHello(ClientHello::parse(body)?),
            HandshakeType::ServerHello => HandshakeMessage::ServerHello(ServerHello::parse(body)?),
            HandshakeType::Certificate => HandshakeMessage::Certificate(Certificate::parse(body)?),
            HandshakeType::ServerKeyExchange => {
                HandshakeMessage::ServerKeyExchange(ServerKeyExchange::parse(body)?)
            }
            HandshakeType::CertificateRequest => {
                HandshakeMessage::CertificateRequest(CertificateRequest::parse(body)?)
            }
            HandshakeType::ServerHelloDone => {
                utils::expect_consumed(body, 0)?;
                HandshakeMessage::ServerHelloDone
            }
            HandshakeType::CertificateVerify => {
                HandshakeMessage::CertificateVerify(CertificateVerify::parse(body)?)
            }
            HandshakeType::ClientKeyExchange => {
                HandshakeMessage::ClientKeyExchange(ClientKeyExchange::parse(body)?)
            }
            HandshakeType::Finished => HandshakeMessage::Finished(Finished::parse(body)?),
        };

        Ok(Some(message))
    }

    /// Wire encoding with the 4-byte handshake header.
    pub fn serialize(&self) -> Vec<u8> {
        let mut body = Vec::new();
        match self {
            HandshakeMessage::HelloRequest | HandshakeMessage::ServerHelloDone => {}
            HandshakeMessage::ClientHello(m) => m.serialize_body(&mut body),
            HandshakeMessage::ServerHello(m) => m.serialize_body(&mut body),
            HandshakeMessage::Certificate(m) => m.serialize_body(&mut body),
            HandshakeMessage::ServerKeyExchange(m) => m.serialize_body(&mut body),
            HandshakeMessage::CertificateRequest(m) => m.serialize_body(&mut body),
            HandshakeMessage::CertificateVerify(m) => m.serialize_body(&mut body),
            HandshakeMessage::ClientKeyExchange(m) => m.serialize_body(&mut body),
            HandshakeMessage::Finished(m) => m.serialize_body(&mut body),
        }

        let mut out = Vec::with_capacity(HANDSHAKE_HEADER_LEN + body.len());
        utils::write_u8(&mut out, self.message_type() as u8);
        utils::write_u24(&mut out, body.len() as u32);
        out.extend_from_slice(&body);
        out
    }
}

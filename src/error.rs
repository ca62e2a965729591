use crate::alert::AlertDescription;
use thiserror::Error;

/// Error taxonomy for the protocol engine. Every variant is fatal for the
/// connection it occurred on; the engine never retries a failed record or
/// handshake step.
#[derive(Debug, Error)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("unexpected message: {0}")]
    UnexpectedMessage(String),

    #[error("illegal parameter: {0}")]
    IllegalParameter(String),

    #[error("bad record MAC")]
    BadRecordMac,

    #[error("decryption error: {0}")]
    Decryption(String),

    #[error("record overflow: {0} bytes")]
    RecordOverflow(usize),

    #[error("record sequence number exhausted")]
    SequenceOverflow,

    #[error("handshake failure: {0}")]
    HandshakeFailure(String),

    #[error("bad certificate: {0}")]
    BadCertificate(String),

    #[error("unsupported cipher suite {0:#06x}")]
    UnsupportedCipherSuite(u16),

    #[error("no client certificate available")]
    NoClientCertificate,

    #[error("peer sent fatal alert: {0:?}")]
    PeerAlert(AlertDescription),

    #[error("crypto error: {0}")]
    Crypto(String),
}

pub type Result<T> = std::result::Result<T, Error>;

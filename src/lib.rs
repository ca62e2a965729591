//! A TLS 1.2 client protocol engine over caller-supplied byte streams.
//!
//! The engine owns the record layer, the handshake state machine, and the
//! key schedule; transports, trust decisions, and client credentials are
//! injected through the [`client::TlsClient`] policy trait.
pub mod alert;
pub mod client;
pub mod connection;
pub mod crypto;
pub mod error;
pub mod handshake;
pub mod record;
pub mod suite;
pub mod utils;

pub use client::{CertificateVerifier, ClientConfig, TlsClient};
pub use connection::{HandshakeStage, TlsConnection};
pub use error::{Error, Result};
pub use suite::CipherSuiteId;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn init_logging() {
    let _ = env_logger::builder().try_init();
}

/// Construct a connection over `stream` and run the handshake to
/// completion.
pub fn connect<S, C>(stream: S, policy: C) -> Result<TlsConnection<S, C>>
where
    S: std::io::Read + std::io::Write,
    C: TlsClient,
{
    let mut connection = TlsConnection::new(stream, policy)?;
    connection.handshake()?;
    Ok(connection)
}

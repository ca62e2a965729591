//! The caller-supplied policy that configures a connection: cipher suite
//! offer, certificate verification capability, optional client
//! authentication, and protocol extensions.
use crate::error::{Error, Result};
use crate::handshake::ClientExtensionConfig;
use crate::handshake::Extension;
use crate::suite::CipherSuiteId;

/// Capability deciding whether a server certificate chain is acceptable.
/// The chain arrives leaf first as opaque DER blobs; path building, store
/// lookups, and revocation are entirely this capability's business. A
/// rejection fails the handshake closed.
pub trait CertificateVerifier {
    fn verify(&self, chain: &[Vec<u8>]) -> Result<()>;
}

/// Client policy contract. The engine calls these in handshake order:
/// `cipher_suites` and `extensions` at ClientHello construction,
/// `verifier` on the server Certificate, `process_server_extensions` on
/// ServerHello, and the client-auth pair only if the server sends a
/// CertificateRequest.
pub trait TlsClient {
    /// The offer, most preferred first. Must be non-empty.
    fn cipher_suites(&self) -> Vec<CipherSuiteId>;

    fn verifier(&self) -> &dyn CertificateVerifier;

    /// Client certificate chain for client authentication, leaf first.
    fn certificate(&self) -> Option<Vec<Vec<u8>>> {
        None
    }

    /// Sign the handshake transcript hash for CertificateVerify. Only
    /// invoked when a certificate was supplied and the server requested
    /// client authentication.
    fn sign_transcript(&self, _transcript_hash: &[u8]) -> Result<Vec<u8>> {
        Err(Error::NoClientCertificate)
    }

    fn extensions(&self) -> ClientExtensionConfig {
        ClientExtensionConfig::default()
    }

    fn process_server_extensions(&mut self, _extensions: &[Extension]) -> Result<()> {
        Ok(())
    }
}

/// A ready-made policy for the common case: a suite preference list, a
/// verifier, and extension configuration. Client authentication callers
/// implement [`TlsClient`] directly.
#[derive(Debug)]
pub struct ClientConfig<V> {
    pub cipher_suites: Vec<CipherSuiteId>,
    pub verifier: V,
    pub extensions: ClientExtensionConfig,
}

impl<V: CertificateVerifier> ClientConfig<V> {
    pub fn new(cipher_suites: Vec<CipherSuiteId>, verifier: V) -> Self {
        Self {
            cipher_suites,
            verifier,
            extensions: ClientExtensionConfig::default(),
        }
    }
}

impl<V: CertificateVerifier> TlsClient for ClientConfig<V> {
    fn cipher_suites(&self) -> Vec<CipherSuiteId> {
        self.cipher_suites.clone()
    }

    fn verifier(&self) -> &dyn CertificateVerifier {
        &self.verifier
    }

    fn extensions(&self) -> ClientExtensionConfig {
        self.extensions.clone()
    }
}

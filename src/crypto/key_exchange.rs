//! Key exchange computations for the two negotiated kinds: RSA key
//! transport (encrypt a fresh pre-master secret to the server's public key)
//! and ephemeral X25519 with RSA-signed server parameters.
use crate::error::{Error, Result};
use crate::record::TLS12;
use ring::rand::{SecureRandom, SystemRandom};
use ring::{agreement, signature};
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::{Pkcs1v15Encrypt, RsaPublicKey};
use x509_parser::prelude::*;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// SignatureAndHashAlgorithm { sha256, rsa }, the one scheme accepted for
/// ServerKeyExchange and emitted for CertificateVerify.
pub const SIG_RSA_PKCS1_SHA256: u16 = 0x0401;

pub const PRE_MASTER_LEN: usize = 48;

/// Key-exchange-specific shared secret. Short-lived: consumed by master
/// secret derivation and wiped on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PreMasterSecret(pub Vec<u8>);

/// Pull the RSA public key (PKCS#1 DER) out of the leaf certificate. The
/// chain is otherwise opaque to the engine; path validation belongs to the
/// caller's verifier.
pub fn server_public_key(leaf_der: &[u8]) -> Result<Vec<u8>> {
    let (_, cert) = X509Certificate::from_der(leaf_der)
        .map_err(|e| Error::BadCertificate(format!("cannot parse leaf certificate: {}", e)))?;

    Ok(cert.tbs_certificate.subject_pki.subject_public_key.data.to_vec())
}

/// A fresh 48-byte RSA pre-master secret: the offered protocol version in
/// the first two bytes, then 46 random bytes.
pub fn generate_rsa_pre_master() -> Result<PreMasterSecret> {
    let rng = SystemRandom::new();
    let mut secret = vec![0u8; PRE_MASTER_LEN];
    rng.fill(&mut secret[2..])
        .map_err(|_| Error::Crypto("system RNG failure".to_string()))?;
    secret[0] = TLS12.major;
    secret[1] = TLS12.minor;

    Ok(PreMasterSecret(secret))
}

/// PKCS#1 v1.5 encryption of the pre-master secret to the server's RSA
/// public key.
pub fn encrypt_pre_master(
    pre_master: &PreMasterSecret,
    server_spki_pkcs1: &[u8],
) -> Result<Vec<u8>> {
    let public_key = RsaPublicKey::from_pkcs1_der(server_spki_pkcs1)
        .map_err(|e| Error::BadCertificate(format!("unusable server RSA key: {}", e)))?;

    public_key
        .encrypt(&mut rand::thread_rng(), Pkcs1v15Encrypt, &pre_master.0)
        .map_err(|e| Error::Crypto(format!("RSA encryption failed: {}", e)))
}

/// Client side of the ephemeral X25519 exchange.
pub struct EphemeralKeyPair {
    private_key: agreement::EphemeralPrivateKey,
    public_key: Vec<u8>,
}

impl EphemeralKeyPair {
    pub fn generate() -> Result<Self> {
        let rng = SystemRandom::new();
        let private_key = agreement::EphemeralPrivateKey::generate(&agreement::X25519, &rng)
            .map_err(|_| Error::Crypto("failed to generate X25519 key".to_string()))?;
        let public_key = private_key
            .compute_public_key()
            .map_err(|_| Error::Crypto("failed to compute X25519 public key".to_string()))?
            .as_ref()
            .to_vec();

        Ok(Self {
            private_key,
            public_key,
        })
    }

    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// Consumes the private key; a second agreement with the same ephemeral
    /// key is not possible by construction.
    pub fn agree(self, peer_public: &[u8]) -> Result<PreMasterSecret> {
        let peer = agreement::UnparsedPublicKey::new(&agreement::X25519, peer_public);

        agreement::agree_ephemeral(self.private_key, &peer, |secret| {
            PreMasterSecret(secret.to_vec())
        })
        .map_err(|_| Error::HandshakeFailure("X25519 agreement failed".to_string()))
    }
}

/// Verify the server's signature over its ephemeral parameters:
/// client_random + server_random + params, RSA PKCS#1 v1.5 with SHA-256.
pub fn verify_signed_params(
    server_spki_pkcs1: &[u8],
    client_random: &[u8; 32],
    server_random: &[u8; 32],
    params: &[u8],
    signature_algorithm: u16,
    sig: &[u8],
) -> Result<()> {
    if signature_algorithm != SIG_RSA_PKCS1_SHA256 {
        return Err(Error::IllegalParameter(format!(
            "unsupported ServerKeyExchange signature algorithm {:#06x}",
            signature_algorithm
        )));
    }

    let mut message = Vec::with_capacity(64 + params.len());
    message.extend_from_slice(client_random);
    message.extend_from_slice(server_random);
    message.extend_from_slice(params);

    let public_key = signature::UnparsedPublicKey::new(
        &signature::RSA_PKCS1_2048_8192_SHA256,
        server_spki_pkcs1,
    );
    public_key
        .verify(&message, sig)
        .map_err(|_| Error::HandshakeFailure("ServerKeyExchange signature invalid".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pre_master_layout() {
        let pre_master = generate_rsa_pre_master().unwrap();
        assert_eq!(pre_master.0.len(), PRE_MASTER_LEN);
        assert_eq!(pre_master.0[0], 3);
        assert_eq!(pre_master.0[1], 3);
    }

    #[test]
    fn test_pre_master_randoms_differ() {
        let a = generate_rsa_pre_master().unwrap();
        let b = generate_rsa_pre_master().unwrap();
        assert_ne!(a.0[2..], b.0[2..]);
    }

    #[test]
    fn test_x25519_agreement_matches() {
        let client = EphemeralKeyPair::generate().unwrap();
        let server = EphemeralKeyPair::generate().unwrap();

        let client_public = client.public_key().to_vec();
        let server_public = server.public_key().to_vec();

        let a = client.agree(&server_public).unwrap();
        let b = server.agree(&client_public).unwrap();
        assert_eq!(a.0, b.0);
        assert_eq!(a.0.len(), 32);
    }

    #[test]
    fn test_unknown_signature_algorithm_rejected() {
        let err = verify_signed_params(&[], &[0; 32], &[0; 32], &[], 0x0601, &[]).unwrap_err();
        assert!(matches!(err, Error::IllegalParameter(_)));
    }
}

//! Cipher suite registry and the live per-record transform.
//!
//! The registry is a closed, read-only table mapping each 16-bit suite
//! identifier to its key-exchange, bulk-cipher, and MAC parameters. The
//! `RecordCipher` bound to one direction's keys performs the TLS 1.2
//! MAC-then-encrypt CBC transform with a per-record explicit IV.
use crate::crypto::cbc::{self, AesKeySize, BLOCK_LEN};
use crate::error::{Error, Result};
use crate::record::ProtocolVersion;
use ring::rand::{SecureRandom, SystemRandom};
use ring::{constant_time, hmac};
use zeroize::Zeroize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherSuiteId {
    RsaAes128CbcSha = 0x002F,
    RsaAes256CbcSha = 0x0035,
    EcdheRsaAes128CbcSha = 0xC013,
    EcdheRsaAes256CbcSha = 0xC014,
}

impl TryFrom<u16> for CipherSuiteId {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self> {
        match value {
            0x002F => Ok(CipherSuiteId::RsaAes128CbcSha),
            0x0035 => Ok(CipherSuiteId::RsaAes256CbcSha),
            0xC013 => Ok(CipherSuiteId::EcdheRsaAes128CbcSha),
            0xC014 => Ok(CipherSuiteId::EcdheRsaAes256CbcSha),
            other => Err(Error::UnsupportedCipherSuite(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyExchangeKind {
    /// Pre-master secret encrypted to the server's RSA public key.
    Rsa,
    /// Ephemeral X25519 with RSA-signed server parameters.
    EcdheRsa,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkCipherKind {
    Aes128Cbc,
    Aes256Cbc,
}

impl BulkCipherKind {
    pub fn key_len(&self) -> usize {
        self.aes_key_size().key_len()
    }

    /// IV bytes drawn from the key block. Zero: the CBC IV is explicit,
    /// generated fresh per record.
    pub fn fixed_iv_len(&self) -> usize {
        0
    }

    pub fn block_len(&self) -> usize {
        BLOCK_LEN
    }

    fn aes_key_size(&self) -> AesKeySize {
        match self {
            BulkCipherKind::Aes128Cbc => AesKeySize::Aes128,
            BulkCipherKind::Aes256Cbc => AesKeySize::Aes256,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacKind {
    HmacSha1,
}

impl MacKind {
    pub fn key_len(&self) -> usize {
        20
    }

    pub fn output_len(&self) -> usize {
        20
    }

    fn hmac_algorithm(&self) -> hmac::Algorithm {
        match self {
            MacKind::HmacSha1 => hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipherSuiteDescriptor {
    pub id: CipherSuiteId,
    pub key_exchange: KeyExchangeKind,
    pub bulk: BulkCipherKind,
    pub mac: MacKind,
}

impl CipherSuiteDescriptor {
    /// Combined key block length for both directions.
    pub fn key_block_len(&self) -> usize {
        2 * (self.mac.key_len() + self.bulk.key_len() + self.bulk.fixed_iv_len())
    }
}

static REGISTRY: [CipherSuiteDescriptor; 4] = [
    CipherSuiteDescriptor {
        id: CipherSuiteId::RsaAes128CbcSha,
        key_exchange: KeyExchangeKind::Rsa,
        bulk: BulkCipherKind::Aes128Cbc,
        mac: MacKind::HmacSha1,
    },
    CipherSuiteDescriptor {
        id: CipherSuiteId::RsaAes256CbcSha,
        key_exchange: KeyExchangeKind::Rsa,
        bulk: BulkCipherKind::Aes256Cbc,
        mac: MacKind::HmacSha1,
    },
    CipherSuiteDescriptor {
        id: CipherSuiteId::EcdheRsaAes128CbcSha,
        key_exchange: KeyExchangeKind::EcdheRsa,
        bulk: BulkCipherKind::Aes128Cbc,
        mac: MacKind::HmacSha1,
    },
    CipherSuiteDescriptor {
        id: CipherSuiteId::EcdheRsaAes256CbcSha,
        key_exchange: KeyExchangeKind::EcdheRsa,
        bulk: BulkCipherKind::Aes256Cbc,
        mac: MacKind::HmacSha1,
    },
];

pub fn descriptor(id: CipherSuiteId) -> &'static CipherSuiteDescriptor {
    REGISTRY
        .iter()
        .find(|d| d.id == id)
        .expect("registry covers every CipherSuiteId variant")
}

/// One direction's live cryptographic transform: MAC key, cipher key, and
/// the suite parameters. Built from a key block slice at the
/// ChangeCipherSpec boundary and handed to the record layer.
#[derive(Debug)]
pub struct RecordCipher {
    descriptor: &'static CipherSuiteDescriptor,
    mac_key: hmac::Key,
    enc_key: Vec<u8>,
    rng: SystemRandom,
}

impl RecordCipher {
    pub fn new(
        descriptor: &'static CipherSuiteDescriptor,
        mac_key: &[u8],
        enc_key: &[u8],
    ) -> Result<Self> {
        if mac_key.len() != descriptor.mac.key_len() {
            return Err(Error::Crypto(format!(
                "MAC key length {} does not match suite",
                mac_key.len()
            )));
        }
        if enc_key.len() != descriptor.bulk.key_len() {
            return Err(Error::Crypto(format!(
                "cipher key length {} does not match suite",
                enc_key.len()
            )));
        }

        Ok(Self {
            descriptor,
            mac_key: hmac::Key::new(descriptor.mac.hmac_algorithm(), mac_key),
            enc_key: enc_key.to_vec(),
            rng: SystemRandom::new(),
        })
    }

    pub fn descriptor(&self) -> &'static CipherSuiteDescriptor {
        self.descriptor
    }

    /// MAC-then-encrypt: HMAC over (sequence, type, version, length,
    /// fragment), TLS padding to the block size, CBC under a fresh explicit
    /// IV. Output is IV plus ciphertext.
    pub fn encrypt(
        &self,
        sequence: u64,
        content_type: u8,
        version: ProtocolVersion,
        plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        let mac = self.compute_mac(sequence, content_type, version, plaintext);

        let mut payload = Vec::with_capacity(plaintext.len() + mac.as_ref().len() + BLOCK_LEN);
        payload.extend_from_slice(plaintext);
        payload.extend_from_slice(mac.as_ref());

        let pad_len = (BLOCK_LEN - (payload.len() + 1) % BLOCK_LEN) % BLOCK_LEN;
        payload.resize(payload.len() + pad_len + 1, pad_len as u8);

        let mut iv = [0u8; BLOCK_LEN];
        self.rng
            .fill(&mut iv)
            .map_err(|_| Error::Crypto("system RNG failure".to_string()))?;

        let ciphertext = cbc::encrypt(
            self.descriptor.bulk.aes_key_size(),
            &self.enc_key,
            &iv,
            &payload,
        )?;
        payload.zeroize();

        let mut out = Vec::with_capacity(BLOCK_LEN + ciphertext.len());
        out.extend_from_slice(&iv);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Decrypt, validate padding, and verify the MAC. Padding and MAC
    /// comparisons are constant time and their results are combined before
    /// either can fail the record.
    pub fn decrypt(
        &self,
        sequence: u64,
        content_type: u8,
        version: ProtocolVersion,
        body: &[u8],
    ) -> Result<Vec<u8>> {
        if body.len() < 2 * BLOCK_LEN {
            return Err(Error::Decryption("record body too short".to_string()));
        }

        let (iv, ciphertext) = body.split_at(BLOCK_LEN);
        let plaintext = cbc::decrypt(
            self.descriptor.bulk.aes_key_size(),
            &self.enc_key,
            iv,
            ciphertext,
        )?;

        let mac_len = self.descriptor.mac.output_len();
        let total = plaintext.len();
        let pad_len = plaintext[total - 1] as usize;
        if total < mac_len + pad_len + 1 {
            return Err(Error::BadRecordMac);
        }

        let mut pad_diff = 0u8;
        for &byte in &plaintext[total - 1 - pad_len..] {
            pad_diff |= byte ^ pad_len as u8;
        }

        let content_len = total - mac_len - pad_len - 1;
        let content = &plaintext[..content_len];
        let received_mac = &plaintext[content_len..content_len + mac_len];

        let expected_mac = self.compute_mac(sequence, content_type, version, content);
        let mac_ok =
            constant_time::verify_slices_are_equal(received_mac, expected_mac.as_ref()).is_ok();

        if pad_diff != 0 || !mac_ok {
            return Err(Error::BadRecordMac);
        }

        Ok(content.to_vec())
    }

    fn compute_mac(
        &self,
        sequence: u64,
        content_type: u8,
        version: ProtocolVersion,
        fragment: &[u8],
    ) -> hmac::Tag {
        let mut input = Vec::with_capacity(13 + fragment.len());
        input.extend_from_slice(&sequence.to_be_bytes());
        input.push(content_type);
        input.push(version.major);
        input.push(version.minor);
        input.extend_from_slice(&(fragment.len() as u16).to_be_bytes());
        input.extend_from_slice(fragment);

        hmac::sign(&self.mac_key, &input)
    }
}

impl Drop for RecordCipher {
    fn drop(&mut self) {
        self.enc_key.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::TLS12;

    fn paired_ciphers(id: CipherSuiteId) -> (RecordCipher, RecordCipher) {
        let desc = descriptor(id);
        let mac_key = vec![0x0B; desc.mac.key_len()];
        let enc_key = vec![0x2E; desc.bulk.key_len()];
        (
            RecordCipher::new(desc, &mac_key, &enc_key).unwrap(),
            RecordCipher::new(desc, &mac_key, &enc_key).unwrap(),
        )
    }

    #[test]
    fn test_registry_lookup() {
        let desc = descriptor(CipherSuiteId::RsaAes128CbcSha);
        assert_eq!(desc.key_exchange, KeyExchangeKind::Rsa);
        assert_eq!(desc.bulk.key_len(), 16);
        assert_eq!(desc.key_block_len(), 72);

        let desc = descriptor(CipherSuiteId::EcdheRsaAes256CbcSha);
        assert_eq!(desc.key_exchange, KeyExchangeKind::EcdheRsa);
        assert_eq!(desc.bulk.key_len(), 32);
        assert_eq!(desc.key_block_len(), 104);
    }

    #[test]
    fn test_unknown_suite_id() {
        let err = CipherSuiteId::try_from(0x1301).unwrap_err();
        assert!(matches!(err, Error::UnsupportedCipherSuite(0x1301)));
    }

    #[test]
    fn test_record_roundtrip() {
        for id in [CipherSuiteId::RsaAes128CbcSha, CipherSuiteId::RsaAes256CbcSha] {
            let (write, read) = paired_ciphers(id);
            for plaintext in [&b""[..], b"x", b"ping", &[0x7Fu8; 1000]] {
                let body = write.encrypt(7, 23, TLS12, plaintext).unwrap();
                let out = read.decrypt(7, 23, TLS12, &body).unwrap();
                assert_eq!(out, plaintext);
            }
        }
    }

    #[test]
    fn test_mismatched_sequence_fails() {
        let (write, read) = paired_ciphers(CipherSuiteId::RsaAes128CbcSha);
        let body = write.encrypt(1, 23, TLS12, b"data").unwrap();
        assert!(matches!(
            read.decrypt(2, 23, TLS12, &body).unwrap_err(),
            Error::BadRecordMac
        ));
    }

    #[test]
    fn test_single_byte_corruption_fails() {
        let (write, read) = paired_ciphers(CipherSuiteId::RsaAes128CbcSha);
        let body = write.encrypt(0, 23, TLS12, b"sensitive payload").unwrap();

        for i in 0..body.len() {
            let mut corrupted = body.clone();
            corrupted[i] ^= 0x01;
            assert!(
                matches!(
                    read.decrypt(0, 23, TLS12, &corrupted).unwrap_err(),
                    Error::BadRecordMac
                ),
                "corruption at byte {} must fail the MAC",
                i
            );
        }
    }

    #[test]
    fn test_truncated_body_rejected() {
        let (_, read) = paired_ciphers(CipherSuiteId::RsaAes128CbcSha);
        assert!(read.decrypt(0, 23, TLS12, &[0u8; 16]).is_err());
    }
}

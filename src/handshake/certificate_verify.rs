use crate::error::Result;
use crate::utils;

/// The client's proof of certificate possession: a signature over the
/// handshake transcript hash, produced by the policy's signing callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateVerify {
    pub signature_algorithm: u16,
    pub signature: Vec<u8>,
}

impl CertificateVerify {
    pub fn new(signature_algorithm: u16, signature: Vec<u8>) -> Self {
        Self {
            signature_algorithm,
            signature,
        }
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut pos = 0;
        let signature_algorithm = utils::read_u16(data, &mut pos)?;
        let signature = utils::read_vector_u16(data, &mut pos)?.to_vec();
        utils::expect_consumed(data, pos)?;

        Ok(Self {
            signature_algorithm,
            signature,
        })
    }

    pub fn serialize_body(&self, out: &mut Vec<u8>) {
        utils::write_u16(out, self.signature_algorithm);
        utils::write_vector_u16(out, &self.signature);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::key_exchange::SIG_RSA_PKCS1_SHA256;

    #[test]
    fn test_certificate_verify_roundtrip() {
        let verify = CertificateVerify::new(SIG_RSA_PKCS1_SHA256, vec![0x99; 128]);
        let mut body = Vec::new();
        verify.serialize_body(&mut body);
        assert_eq!(CertificateVerify::parse(&body).unwrap(), verify);
    }
}

use crate::error::{Error, Result};
use crate::utils;

/// Server's request for client authentication. The engine treats the
/// request as optional: a client without a certificate answers with an
/// empty chain and the server decides whether to continue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRequest {
    pub certificate_types: Vec<u8>,
    pub signature_algorithms: Vec<u16>,
    /// DER-encoded distinguished names, opaque to the engine.
    pub certificate_authorities: Vec<u8>,
}

impl CertificateRequest {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut pos = 0;

        let certificate_types = utils::read_vector_u8(data, &mut pos)?.to_vec();

        let algorithms_bytes = utils::read_vector_u16(data, &mut pos)?;
        if algorithms_bytes.len() % 2 != 0 {
            return Err(Error::Decode(
                "signature algorithm list length must be even".to_string(),
            ));
        }
        let signature_algorithms = algorithms_bytes
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();

        let certificate_authorities = utils::read_vector_u16(data, &mut pos)?.to_vec();
        utils::expect_consumed(data, pos)?;

        Ok(Self {
            certificate_types,
            signature_algorithms,
            certificate_authorities,
        })
    }

    pub fn serialize_body(&self, out: &mut Vec<u8>) {
        utils::write_vector_u8(out, &self.certificate_types);

        let mut algorithms = Vec::with_capacity(self.signature_algorithms.len() * 2);
        for algorithm in &self.signature_algorithms {
            utils::write_u16(&mut algorithms, *algorithm);
        }
        utils::write_vector_u16(out, &algorithms);

        utils::write_vector_u16(out, &self.certificate_authorities);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::key_exchange::SIG_RSA_PKCS1_SHA256;

    #[test]
    fn test_certificate_request_roundtrip() {
        let request = CertificateRequest {
            certificate_types: vec![1], // rsa_sign
            signature_algorithms: vec![SIG_RSA_PKCS1_SHA256, 0x0201],
            certificate_authorities: vec![0x30, 0x0A, 0x31],
        };

        let mut body = Vec::new();
        request.serialize_body(&mut body);
        assert_eq!(CertificateRequest::parse(&body).unwrap(), request);
    }

    #[test]
    fn test_odd_algorithm_list_rejected() {
        let body = [1, 1, 0, 3, 4, 1, 4, 0, 0];
        assert!(CertificateRequest::parse(&body).is_err());
    }
}

use crate::error::Result;
use crate::utils;

/// A certificate chain, leaf first. Each entry is an opaque DER blob;
/// decoding beyond the wire framing is delegated to the caller's verifier
/// and the key exchange helpers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    pub chain: Vec<Vec<u8>>,
}

impl Certificate {
    pub fn new(chain: Vec<Vec<u8>>) -> Self {
        Self { chain }
    }

    /// The empty chain a client sends when the server requested a
    /// certificate it does not have.
    pub fn empty() -> Self {
        Self { chain: Vec::new() }
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut pos = 0;
        let list = utils::read_vector_u24(data, &mut pos)?;
        utils::expect_consumed(data, pos)?;

        let mut chain = Vec::new();
        let mut list_pos = 0;
        while list_pos < list.len() {
            chain.push(utils::read_vector_u24(list, &mut list_pos)?.to_vec());
        }

        Ok(Self { chain })
    }

    pub fn serialize_body(&self, out: &mut Vec<u8>) {
        let mut list = Vec::new();
        for cert in &self.chain {
            utils::write_vector_u24(&mut list, cert);
        }
        utils::write_vector_u24(out, &list);
    }

    pub fn leaf(&self) -> Option<&[u8]> {
        self.chain.first().map(|c| c.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_roundtrip() {
        let cert = Certificate::new(vec![vec![0x30, 0x82, 0x01], vec![0x30, 0x82, 0x02, 0x03]]);
        let mut body = Vec::new();
        cert.serialize_body(&mut body);

        let parsed = Certificate::parse(&body).unwrap();
        assert_eq!(parsed, cert);
        assert_eq!(parsed.leaf().unwrap(), &[0x30, 0x82, 0x01]);
    }

    #[test]
    fn test_empty_chain() {
        let mut body = Vec::new();
        Certificate::empty().serialize_body(&mut body);
        assert_eq!(body, [0, 0, 0]);

        let parsed = Certificate::parse(&body).unwrap();
        assert!(parsed.chain.is_empty());
        assert!(parsed.leaf().is_none());
    }

    #[test]
    fn test_truncated_entry_rejected() {
        // List claims 5 bytes but the entry claims 10.
        let body = [0, 0, 5, 0, 0, 10, 0xAA, 0xBB];
        assert!(Certificate::parse(&body).is_err());
    }
}

use crate::error::Result;
use crate::utils;

/// The client's key exchange contribution. The body encoding depends on
/// the negotiated kind: a u16-length-framed RSA-encrypted pre-master
/// secret, or a u8-length-framed ephemeral public point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientKeyExchange {
    pub body: Vec<u8>,
}

impl ClientKeyExchange {
    pub fn new_rsa(encrypted_pre_master: &[u8]) -> Self {
        let mut body = Vec::with_capacity(2 + encrypted_pre_master.len());
        utils::write_vector_u16(&mut body, encrypted_pre_master);
        Self { body }
    }

    pub fn new_ecdhe(public_point: &[u8]) -> Self {
        let mut body = Vec::with_capacity(1 + public_point.len());
        utils::write_vector_u8(&mut body, public_point);
        Self { body }
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        Ok(Self {
            body: data.to_vec(),
        })
    }

    pub fn serialize_body(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.body);
    }

    pub fn rsa_encrypted_pre_master(&self) -> Result<&[u8]> {
        let mut pos = 0;
        let encrypted = utils::read_vector_u16(&self.body, &mut pos)?;
        utils::expect_consumed(&self.body, pos)?;
        Ok(encrypted)
    }

    pub fn ecdhe_public_point(&self) -> Result<&[u8]> {
        let mut pos = 0;
        let point = utils::read_vector_u8(&self.body, &mut pos)?;
        utils::expect_consumed(&self.body, pos)?;
        Ok(point)
    }
}

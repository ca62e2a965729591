use crate::error::{Error, Result};
use crate::utils;

/// named_curve per RFC 4492.
const CURVE_TYPE_NAMED: u8 = 3;
/// The one supported ephemeral group.
pub const NAMED_CURVE_X25519: u16 = 0x001D;

/// Ephemeral server parameters for the ECDHE key exchange: a named curve,
/// the server's public point, and a signature binding the parameters to
/// both hello randoms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerKeyExchange {
    pub named_curve: u16,
    pub public_point: Vec<u8>,
    pub signature_algorithm: u16,
    pub signature: Vec<u8>,
}

impl ServerKeyExchange {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut pos = 0;

        let curve_type = utils::read_u8(data, &mut pos)?;
        if curve_type != CURVE_TYPE_NAMED {
            return Err(Error::IllegalParameter(format!(
                "unsupported curve type {}",
                curve_type
            )));
        }

        let named_curve = utils::read_u16(data, &mut pos)?;
        let public_point = utils::read_vector_u8(data, &mut pos)?.to_vec();
        let signature_algorithm = utils::read_u16(data, &mut pos)?;
        let signature = utils::read_vector_u16(data, &mut pos)?.to_vec();
        utils::expect_consumed(data, pos)?;

        Ok(Self {
            named_curve,
            public_point,
            signature_algorithm,
            signature,
        })
    }

    pub fn serialize_body(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.params_bytes());
        utils::write_u16(out, self.signature_algorithm);
        utils::write_vector_u16(out, &self.signature);
    }

    /// The ServerECDHParams bytes covered by the signature (together with
    /// the client and server randoms).
    pub fn params_bytes(&self) -> Vec<u8> {
        let mut params = Vec::with_capacity(4 + self.public_point.len());
        utils::write_u8(&mut params, CURVE_TYPE_NAMED);
        utils::write_u16(&mut params, self.named_curve);
        utils::write_vector_u8(&mut params, &self.public_point);
        params
    }
}

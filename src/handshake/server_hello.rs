use crate::error::Result;
use crate::handshake::extensions::{self, Extension};
use crate::record::ProtocolVersion;
use crate::suite::CipherSuiteId;
use crate::utils;

#[derive(Debug, Clone)]
pub struct ServerHello {
    pub version: ProtocolVersion,
    pub random: [u8; 32],
    pub session_id: Vec<u8>,
    pub cipher_suite: CipherSuiteId,
    pub compression_method: u8,
    pub extensions: Vec<Extension>,
}

impl ServerHello {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut pos = 0;

        let major = utils::read_u8(data, &mut pos)?;
        let minor = utils::read_u8(data, &mut pos)?;
        let version = ProtocolVersion { major, minor };

        let mut random = [0u8; 32];
        random.copy_from_slice(utils::read_bytes(data, &mut pos, 32)?);

        let session_id = utils::read_vector_u8(data, &mut pos)?.to_vec();
        let cipher_suite = CipherSuiteId::try_from(utils::read_u16(data, &mut pos)?)?;
        let compression_method = utils::read_u8(data, &mut pos)?;
        let extensions = extensions::parse_list(data, &mut pos)?;
        utils::expect_consumed(data, pos)?;

        Ok(Self {
            version,
            random,
            session_id,
            cipher_suite,
            compression_method,
            extensions,
        })
    }

    pub fn serialize_body(&self, out: &mut Vec<u8>) {
        utils::write_u8(out, self.version.major);
        utils::write_u8(out, self.version.minor);
        out.extend_from_slice(&self.random);
        utils::write_vector_u8(out, &self.session_id);
        utils::write_u16(out, self.cipher_suite as u16);
        utils::write_u8(out, self.compression_method);
        extensions::serialize_list(&self.extensions, out);
    }
}

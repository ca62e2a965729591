use crate::error::{Error, Result};
use crate::handshake::extensions::{self, Extension};
use crate::record::{ProtocolVersion, TLS12};
use crate::suite::CipherSuiteId;
use crate::utils;

#[derive(Debug, Clone)]
pub struct ClientHello {
    pub version: ProtocolVersion,
    pub random: [u8; 32],
    pub session_id: Vec<u8>,
    pub cipher_suites: Vec<CipherSuiteId>,
    pub compression_methods: Vec<u8>,
    pub extensions: Vec<Extension>,
}

impl ClientHello {
    /// The hello this engine offers: fixed version, no session resumption,
    /// null compression only.
    pub fn new(random: [u8; 32], cipher_suites: Vec<CipherSuiteId>, extensions: Vec<Extension>) -> Self {
        Self {
            version: TLS12,
            random,
            session_id: Vec::new(),
            cipher_suites,
            compression_methods: vec![0],
            extensions,
        }
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut pos = 0;

        let major = utils::read_u8(data, &mut pos)?;
        let minor = utils::read_u8(data, &mut pos)?;
        let version = ProtocolVersion { major, minor };

        let mut random = [0u8; 32];
        random.copy_from_slice(utils::read_bytes(data, &mut pos, 32)?);

        let session_id = utils::read_vector_u8(data, &mut pos)?.to_vec();

        let suites_bytes = utils::read_vector_u16(data, &mut pos)?;
        if suites_bytes.len() % 2 != 0 {
            return Err(Error::Decode("cipher suite list length must be even".to_string()));
        }
        let mut cipher_suites = Vec::with_capacity(suites_bytes.len() / 2);
        for pair in suites_bytes.chunks_exact(2) {
            cipher_suites.push(CipherSuiteId::try_from(u16::from_be_bytes([pair[0], pair[1]]))?);
        }

        let compression_methods = utils::read_vector_u8(data, &mut pos)?.to_vec();
        let extensions = extensions::parse_list(data, &mut pos)?;
        utils::expect_consumed(data, pos)?;

        Ok(Self {
            version,
            random,
            session_id,
            cipher_suites,
            compression_methods,
            extensions,
        })
    }

    pub fn serialize_body(&self, out: &mut Vec<u8>) {
        utils::write_u8(out, self.version.major);
        utils::write_u8(out, self.version.minor);
        out.extend_from_slice(&self.random);
        utils::write_vector_u8(out, &self.session_id);

        let mut suites = Vec::with_capacity(self.cipher_suites.len() * 2);
        for suite in &self.cipher_suites {
            utils::write_u16(&mut suites, *suite as u16);
        }
        utils::write_vector_u16(out, &suites);

        utils::write_vector_u8(out, &self.compression_methods);
        extensions::serialize_list(&self.extensions, out);
    }
}

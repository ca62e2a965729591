use crate::error::{Error, Result};
use crate::utils;

/// Extension identifiers the engine knows about, with an escape hatch for
/// anything else: unknown extensions are carried through unmodified and
/// left to the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionType {
    ServerName,
    SupportedGroups,
    EcPointFormats,
    SignatureAlgorithms,
    Unknown(u16),
}

impl From<u16> for ExtensionType {
    fn from(value: u16) -> Self {
        match value {
            0 => ExtensionType::ServerName,
            10 => ExtensionType::SupportedGroups,
            11 => ExtensionType::EcPointFormats,
            13 => ExtensionType::SignatureAlgorithms,
            other => ExtensionType::Unknown(other),
        }
    }
}

impl From<ExtensionType> for u16 {
    fn from(value: ExtensionType) -> Self {
        match value {
            ExtensionType::ServerName => 0,
            ExtensionType::SupportedGroups => 10,
            ExtensionType::EcPointFormats => 11,
            ExtensionType::SignatureAlgorithms => 13,
            ExtensionType::Unknown(other) => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    pub extension_type: ExtensionType,
    pub data: Vec<u8>,
}

impl Extension {
    pub fn new(extension_type: ExtensionType, data: Vec<u8>) -> Self {
        Self {
            extension_type,
            data,
        }
    }

    pub fn parse(data: &[u8], pos: &mut usize) -> Result<Self> {
        let extension_type = ExtensionType::from(utils::read_u16(data, pos)?);
        let extension_data = utils::read_vector_u16(data, pos)?;

        Ok(Self {
            extension_type,
            data: extension_data.to_vec(),
        })
    }

    pub fn serialize(&self, out: &mut Vec<u8>) {
        utils::write_u16(out, self.extension_type.into());
        utils::write_vector_u16(out, &self.data);
    }
}

/// Parse a u16-length-framed extension list, as carried in ClientHello and
/// ServerHello. An absent list (no bytes remaining) is an empty list.
pub fn parse_list(data: &[u8], pos: &mut usize) -> Result<Vec<Extension>> {
    let mut extensions = Vec::new();
    if *pos == data.len() {
        return Ok(extensions);
    }

    let list = utils::read_vector_u16(data, pos)?;
    let mut list_pos = 0;
    while list_pos < list.len() {
        extensions.push(Extension::parse(list, &mut list_pos)?);
    }

    Ok(extensions)
}

/// Serialize the extension list. Omitted entirely when empty, matching the
/// optional trailing-extensions encoding of the hello messages.
pub fn serialize_list(extensions: &[Extension], out: &mut Vec<u8>) {
    if extensions.is_empty() {
        return;
    }

    let mut list = Vec::new();
    for extension in extensions {
        extension.serialize(&mut list);
    }
    utils::write_vector_u16(out, &list);
}

/// Typed client extension configuration, with the opaque list as the
/// pass-through escape hatch.
#[derive(Debug, Clone, Default)]
pub struct ClientExtensionConfig {
    /// Server Name Indication host name.
    pub server_name: Option<String>,
    /// Extensions emitted verbatim after the recognized ones.
    pub opaque: Vec<Extension>,
}

impl ClientExtensionConfig {
    pub fn to_extensions(&self) -> Vec<Extension> {
        let mut extensions = Vec::new();

        if let Some(name) = &self.server_name {
            // server_name_list with a single host_name entry.
            let mut data = Vec::with_capacity(5 + name.len());
            let mut entry = Vec::with_capacity(3 + name.len());
            utils::write_u8(&mut entry, 0); // name_type host_name
            utils::write_vector_u16(&mut entry, name.as_bytes());
            utils::write_vector_u16(&mut data, &entry);
            extensions.push(Extension::new(ExtensionType::ServerName, data));
        }

        extensions.extend(self.opaque.iter().cloned());
        extensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extension_roundtrip() {
        let extension = Extension::new(ExtensionType::Unknown(0xFF01), vec![0xDE, 0xAD]);
        let mut out = Vec::new();
        extension.serialize(&mut out);
        assert_eq!(out, [0xFF, 0x01, 0x00, 0x02, 0xDE, 0xAD]);

        let mut pos = 0;
        assert_eq!(Extension::parse(&out, &mut pos).unwrap(), extension);
        assert_eq!(pos, out.len());
    }

    #[test]
    fn test_list_roundtrip() {
        let extensions = vec![
            Extension::new(ExtensionType::SupportedGroups, vec![0x00, 0x02, 0x00, 0x1D]),
            Extension::new(ExtensionType::Unknown(0x4242), vec![]),
        ];

        let mut out = Vec::new();
        serialize_list(&extensions, &mut out);

        let mut pos = 0;
        assert_eq!(parse_list(&out, &mut pos).unwrap(), extensions);
    }

    #[test]
    fn test_absent_list_is_empty() {
        let mut pos = 0;
        assert!(parse_list(&[], &mut pos).unwrap().is_empty());
    }

    #[test]
    fn test_server_name_encoding() {
        let config = ClientExtensionConfig {
            server_name: Some("example.com".to_string()),
            opaque: vec![],
        };

        let extensions = config.to_extensions();
        assert_eq!(extensions.len(), 1);
        assert_eq!(extensions[0].extension_type, ExtensionType::ServerName);

        let mut expected = vec![0x00, 0x0E, 0x00, 0x00, 0x0B];
        expected.extend_from_slice(b"example.com");
        assert_eq!(extensions[0].data, expected);
    }
}

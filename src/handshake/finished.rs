use crate::crypto::prf::VERIFY_DATA_LEN;
use crate::error::{Error, Result};

/// MAC over the full handshake transcript under the derived master secret.
/// The verify_data length is fixed by the negotiated version; anything
/// else is a decode error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finished {
    pub verify_data: [u8; VERIFY_DATA_LEN],
}

impl Finished {
    pub fn new(verify_data: [u8; VERIFY_DATA_LEN]) -> Self {
        Self { verify_data }
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() != VERIFY_DATA_LEN {
            return Err(Error::Decode(format!(
                "Finished verify_data length {}, expected {}",
                data.len(),
                VERIFY_DATA_LEN
            )));
        }

        let mut verify_data = [0u8; VERIFY_DATA_LEN];
        verify_data.copy_from_slice(data);
        Ok(Self { verify_data })
    }

    pub fn serialize_body(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.verify_data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finished_roundtrip() {
        let finished = Finished::new([0xF1; 12]);
        let mut body = Vec::new();
        finished.serialize_body(&mut body);
        assert_eq!(Finished::parse(&body).unwrap(), finished);
    }

    #[test]
    fn test_wrong_length_rejected() {
        assert!(matches!(
            Finished::parse(&[0u8; 11]).unwrap_err(),
            Error::Decode(_)
        ));
        assert!(matches!(
            Finished::parse(&[0u8; 32]).unwrap_err(),
            Error::Decode(_)
        ));
    }
}

use crate::error::{Error, Result};
use crate::utils;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertLevel {
    Warning = 1,
    Fatal = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertDescription {
    CloseNotify = 0,
    UnexpectedMessage = 10,
    BadRecordMac = 20,
    RecordOverflow = 22,
    DecompressionFailure = 30,
    HandshakeFailure = 40,
    BadCertificate = 42,
    UnsupportedCertificate = 43,
    CertificateRevoked = 44,
    CertificateExpired = 45,
    CertificateUnknown = 46,
    IllegalParameter = 47,
    UnknownCa = 48,
    AccessDenied = 49,
    DecodeError = 50,
    DecryptError = 51,
    ProtocolVersion = 70,
    InsufficientSecurity = 71,
    InternalError = 80,
    UserCanceled = 90,
    NoRenegotiation = 100,
    UnsupportedExtension = 110,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alert {
    pub level: AlertLevel,
    pub description: AlertDescription,
}

impl Alert {
    pub fn new(level: AlertLevel, description: AlertDescription) -> Self {
        Self { level, description }
    }

    pub fn close_notify() -> Self {
        Self::new(AlertLevel::Warning, AlertDescription::CloseNotify)
    }

    /// The fatal alert the engine emits before tearing the connection down
    /// for the given error. Transport errors get none; the stream is
    /// already unusable.
    pub fn for_error(error: &Error) -> Option<Self> {
        let description = match error {
            Error::Transport(_) => return None,
            Error::Decode(_) => AlertDescription::DecodeError,
            Error::UnexpectedMessage(_) => AlertDescription::UnexpectedMessage,
            Error::IllegalParameter(_) => AlertDescription::IllegalParameter,
            Error::BadRecordMac => AlertDescription::BadRecordMac,
            Error::Decryption(_) => AlertDescription::DecryptError,
            Error::RecordOverflow(_) => AlertDescription::RecordOverflow,
            Error::SequenceOverflow => AlertDescription::InternalError,
            Error::HandshakeFailure(_) => AlertDescription::HandshakeFailure,
            Error::BadCertificate(_) => AlertDescription::BadCertificate,
            Error::UnsupportedCipherSuite(_) => AlertDescription::HandshakeFailure,
            Error::NoClientCertificate => AlertDescription::HandshakeFailure,
            // The peer already closed the conversation; nothing to send back.
            Error::PeerAlert(_) => return None,
            Error::Crypto(_) => AlertDescription::InternalError,
        };
        Some(Self::new(AlertLevel::Fatal, description))
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut pos = 0;
        let level = match utils::read_u8(data, &mut pos)? {
            1 => AlertLevel::Warning,
            2 => AlertLevel::Fatal,
            other => {
                return Err(Error::Decode(format!("invalid alert level: {}", other)));
            }
        };

        let description = match utils::read_u8(data, &mut pos)? {
            0 => AlertDescription::CloseNotify,
            10 => AlertDescription::UnexpectedMessage,
            20 => AlertDescription::BadRecordMac,
            22 => AlertDescription::RecordOverflow,
            30 => AlertDescription::DecompressionFailure,
            40 => AlertDescription::HandshakeFailure,
            42 => AlertDescription::BadCertificate,
            43 => AlertDescription::UnsupportedCertificate,
            44 => AlertDescription::CertificateRevoked,
            45 => AlertDescription::CertificateExpired,
            46 => AlertDescription::CertificateUnknown,
            47 => AlertDescription::IllegalParameter,
            48 => AlertDescription::UnknownCa,
            49 => AlertDescription::AccessDenied,
            50 => AlertDescription::DecodeError,
            51 => AlertDescription::DecryptError,
            70 => AlertDescription::ProtocolVersion,
            71 => AlertDescription::InsufficientSecurity,
            80 => AlertDescription::InternalError,
            90 => AlertDescription::UserCanceled,
            100 => AlertDescription::NoRenegotiation,
            110 => AlertDescription::UnsupportedExtension,
            other => {
                return Err(Error::Decode(format!("invalid alert description: {}", other)));
            }
        };

        Ok(Self { level, description })
    }

    pub fn serialize(&self) -> Vec<u8> {
        vec![self.level as u8, self.description as u8]
    }

    pub fn is_fatal(&self) -> bool {
        self.level == AlertLevel::Fatal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_roundtrip() {
        let alert = Alert::new(AlertLevel::Fatal, AlertDescription::BadRecordMac);
        let bytes = alert.serialize();
        assert_eq!(bytes, [2, 20]);
        assert_eq!(Alert::parse(&bytes).unwrap(), alert);
        assert!(alert.is_fatal());
    }

    #[test]
    fn test_close_notify_is_warning() {
        let alert = Alert::close_notify();
        assert!(!alert.is_fatal());
        assert_eq!(alert.description, AlertDescription::CloseNotify);
    }

    #[test]
    fn test_invalid_level() {
        assert!(Alert::parse(&[3, 0]).is_err());
    }

    #[test]
    fn test_error_mapping() {
        let alert = Alert::for_error(&Error::BadRecordMac).unwrap();
        assert_eq!(alert.description, AlertDescription::BadRecordMac);
        assert!(alert.is_fatal());

        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        assert!(Alert::for_error(&Error::Transport(io)).is_none());
    }
}

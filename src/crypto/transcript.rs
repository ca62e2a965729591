use ring::digest::{Context, SHA256};

/// Running hash over every handshake message sent and received, in wire
/// order, including each message's 4-byte handshake header but never the
/// record framing. Owned exclusively by the handshake driver; append-only.
pub struct HandshakeTranscript {
    context: Context,
}

impl std::fmt::Debug for HandshakeTranscript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandshakeTranscript").finish_non_exhaustive()
    }
}

impl HandshakeTranscript {
    pub fn new() -> Self {
        Self {
            context: Context::new(&SHA256),
        }
    }

    /// Append one serialized handshake message (header plus body).
    pub fn update(&mut self, message: &[u8]) {
        self.context.update(message);
    }

    /// Snapshot of the hash at this point in the handshake. The running
    /// state is unaffected; Finished and CertificateVerify both need a
    /// frozen view while later messages keep accumulating.
    pub fn current_hash(&self) -> Vec<u8> {
        self.context.clone().finish().as_ref().to_vec()
    }
}

impl Default for HandshakeTranscript {
    fn default() -> Self {
        Self::new()
    }
}

//! Client handshake state machine and the post-handshake connection API.
//!
//! The engine is synchronous and single-connection: whichever thread calls
//! `handshake`, `send`, or `recv` drives the record layer directly. Fatal
//! errors emit a best-effort alert record and poison the connection; no
//! step is ever retried.
use crate::alert::{Alert, AlertDescription};
use crate::client::TlsClient;
use crate::crypto::key_exchange::{self, EphemeralKeyPair, SIG_RSA_PKCS1_SHA256};
use crate::crypto::prf::{self, FinishedLabel};
use crate::crypto::HandshakeTranscript;
use crate::error::{Error, Result};
use crate::handshake::server_key_exchange::NAMED_CURVE_X25519;
use crate::handshake::{
    Certificate, CertificateRequest, CertificateVerify, ClientHello, ClientKeyExchange, Finished,
    HandshakeMessage, ServerHello, ServerKeyExchange,
};
use crate::record::{ContentType, Direction, RecordLayer, TLS12};
use crate::suite::{descriptor, CipherSuiteDescriptor, CipherSuiteId, KeyExchangeKind, RecordCipher};
use ring::constant_time;
use ring::rand::{SecureRandom, SystemRandom};
use std::io::{Read, Write};

/// Client-side handshake progression. Bracket states
/// (ServerKeyExchangeReceived, CertificateRequestReceived,
/// CertificateVerifySent) occur only for ephemeral suites or when the
/// server requests client authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeStage {
    Start,
    HelloSent,
    ServerHelloReceived,
    CertificateReceived,
    ServerKeyExchangeReceived,
    CertificateRequestReceived,
    ServerHelloDoneReceived,
    ClientKeyExchangeSent,
    CertificateVerifySent,
    ChangeCipherSpecSent,
    FinishedSent,
    Established,
    Failed,
}

/// A single TLS client connection over a reliable, ordered byte stream.
#[derive(Debug)]
pub struct TlsConnection<S, C> {
    record: RecordLayer<S>,
    policy: C,
    stage: HandshakeStage,
    transcript: HandshakeTranscript,
    /// Reassembly buffer for inbound handshake fragments.
    inbound: Vec<u8>,
    inbound_pos: usize,
    offered: Vec<CipherSuiteId>,
    client_random: [u8; 32],
    server_random: [u8; 32],
    selected: Option<&'static CipherSuiteDescriptor>,
    server_spki: Option<Vec<u8>>,
    ecdhe_peer_point: Option<Vec<u8>>,
    certificate_request: Option<CertificateRequest>,
}

impl<S: Read + Write, C: TlsClient> TlsConnection<S, C> {
    /// Validates the policy's offer before any network I/O.
    pub fn new(stream: S, policy: C) -> Result<Self> {
        let offered = policy.cipher_suites();
        if offered.is_empty() {
            return Err(Error::HandshakeFailure(
                "cipher suite offer is empty".to_string(),
            ));
        }

        Ok(Self {
            record: RecordLayer::new(stream),
            policy,
            stage: HandshakeStage::Start,
            transcript: HandshakeTranscript::new(),
            inbound: Vec::new(),
            inbound_pos: 0,
            offered,
            client_random: [0u8; 32],
            server_random: [0u8; 32],
            selected: None,
            server_spki: None,
            ecdhe_peer_point: None,
            certificate_request: None,
        })
    }

    pub fn stage(&self) -> HandshakeStage {
        self.stage
    }

    pub fn is_established(&self) -> bool {
        self.stage == HandshakeStage::Established
    }

    /// Run the full client handshake to `Established`. On any fatal error
    /// a mapped alert is sent best-effort and the connection is poisoned.
    pub fn handshake(&mut self) -> Result<()> {
        if self.stage != HandshakeStage::Start {
            return Err(Error::UnexpectedMessage(format!(
                "handshake invoked in state {:?}",
                self.stage
            )));
        }

        match self.run_handshake() {
            Ok(()) => Ok(()),
            Err(error) => {
                self.send_alert_for(&error);
                self.stage = HandshakeStage::Failed;
                Err(error)
            }
        }
    }

    fn run_handshake(&mut self) -> Result<()> {
        let rng = SystemRandom::new();
        rng.fill(&mut self.client_random)
            .map_err(|_| Error::Crypto("system RNG failure".to_string()))?;

        let hello = ClientHello::new(
            self.client_random,
            self.offered.clone(),
            self.policy.extensions().to_extensions(),
        );
        self.send_handshake(&HandshakeMessage::ClientHello(hello))?;
        self.stage = HandshakeStage::HelloSent;
        log::debug!("sent ClientHello offering {:?}", self.offered);

        // Server flight: ServerHello .. ServerHelloDone.
        loop {
            let message = self.next_handshake_message()?;
            match message {
                HandshakeMessage::ServerHello(hello)
                    if self.stage == HandshakeStage::HelloSent =>
                {
                    self.on_server_hello(hello)?;
                }
                HandshakeMessage::Certificate(certificate)
                    if self.stage == HandshakeStage::ServerHelloReceived =>
                {
                    self.on_certificate(certificate)?;
                }
                HandshakeMessage::ServerKeyExchange(ske)
                    if self.stage == HandshakeStage::CertificateReceived =>
                {
                    self.on_server_key_exchange(ske)?;
                }
                HandshakeMessage::CertificateRequest(request)
                    if self.client_auth_may_follow() =>
                {
                    log::debug!("server requested client authentication");
                    self.certificate_request = Some(request);
                    self.stage = HandshakeStage::CertificateRequestReceived;
                }
                HandshakeMessage::ServerHelloDone if self.hello_done_expected() => {
                    self.stage = HandshakeStage::ServerHelloDoneReceived;
                    break;
                }
                other => {
                    return Err(Error::UnexpectedMessage(format!(
                        "{:?} in state {:?}",
                        other.message_type(),
                        self.stage
                    )));
                }
            }
        }

        self.send_client_flight()
    }

    fn on_server_hello(&mut self, hello: ServerHello) -> Result<()> {
        if hello.version != TLS12 {
            return Err(Error::IllegalParameter(format!(
                "server selected version {}.{}",
                hello.version.major, hello.version.minor
            )));
        }
        if !self.offered.contains(&hello.cipher_suite) {
            return Err(Error::IllegalParameter(format!(
                "server selected unoffered suite {:?}",
                hello.cipher_suite
            )));
        }
        if hello.compression_method != 0 {
            return Err(Error::IllegalParameter(
                "server selected non-null compression".to_string(),
            ));
        }

        self.server_random = hello.random;
        self.selected = Some(descriptor(hello.cipher_suite));
        self.policy.process_server_extensions(&hello.extensions)?;
        self.stage = HandshakeStage::ServerHelloReceived;
        log::debug!("negotiated cipher suite {:?}", hello.cipher_suite);
        Ok(())
    }

    fn on_certificate(&mut self, certificate: Certificate) -> Result<()> {
        let leaf = certificate
            .leaf()
            .ok_or_else(|| Error::BadCertificate("empty server certificate chain".to_string()))?;

        // Fail closed before touching the key material in the chain.
        self.policy
            .verifier()
            .verify(&certificate.chain)
            .map_err(|error| match error {
                Error::BadCertificate(_) => error,
                other => Error::BadCertificate(other.to_string()),
            })?;

        self.server_spki = Some(key_exchange::server_public_key(leaf)?);
        self.stage = HandshakeStage::CertificateReceived;
        Ok(())
    }

    fn on_server_key_exchange(&mut self, ske: ServerKeyExchange) -> Result<()> {
        let desc = self.selected_descriptor()?;
        if desc.key_exchange != KeyExchangeKind::EcdheRsa {
            return Err(Error::UnexpectedMessage(
                "ServerKeyExchange for a static key exchange".to_string(),
            ));
        }
        if ske.named_curve != NAMED_CURVE_X25519 {
            return Err(Error::IllegalParameter(format!(
                "unsupported named curve {:#06x}",
                ske.named_curve
            )));
        }

        let spki = self
            .server_spki
            .as_ref()
            .ok_or_else(|| Error::UnexpectedMessage("ServerKeyExchange before Certificate".to_string()))?;
        key_exchange::verify_signed_params(
            spki,
            &self.client_random,
            &self.server_random,
            &ske.params_bytes(),
            ske.signature_algorithm,
            &ske.signature,
        )?;

        self.ecdhe_peer_point = Some(ske.public_point);
        self.stage = HandshakeStage::ServerKeyExchangeReceived;
        Ok(())
    }

    fn client_auth_may_follow(&self) -> bool {
        self.certificate_request.is_none()
            && match self.stage {
                HandshakeStage::CertificateReceived => self
                    .selected
                    .map(|d| d.key_exchange == KeyExchangeKind::Rsa)
                    .unwrap_or(false),
                HandshakeStage::ServerKeyExchangeReceived => true,
                _ => false,
            }
    }

    fn hello_done_expected(&self) -> bool {
        match self.stage {
            HandshakeStage::CertificateReceived => self
                .selected
                .map(|d| d.key_exchange == KeyExchangeKind::Rsa)
                .unwrap_or(false),
            HandshakeStage::ServerKeyExchangeReceived
            | HandshakeStage::CertificateRequestReceived => true,
            _ => false,
        }
    }

    /// The client's answering flight through Finished verification.
    fn send_client_flight(&mut self) -> Result<()> {
        let desc = self.selected_descriptor()?;

        let client_auth_requested = self.certificate_request.is_some();
        let client_chain = if client_auth_requested {
            self.policy.certificate()
        } else {
            None
        };

        if client_auth_requested {
            // An absent certificate answers the request with an empty
            // chain; the server decides whether that is acceptable.
            let certificate = match &client_chain {
                Some(chain) => Certificate::new(chain.clone()),
                None => Certificate::empty(),
            };
            self.send_handshake(&HandshakeMessage::Certificate(certificate))?;
        }

        let (pre_master, key_exchange_msg) = match desc.key_exchange {
            KeyExchangeKind::Rsa => {
                let spki = self.server_spki.as_ref().ok_or_else(|| {
                    Error::UnexpectedMessage("key exchange without server certificate".to_string())
                })?;
                let pre_master = key_exchange::generate_rsa_pre_master()?;
                let encrypted = key_exchange::encrypt_pre_master(&pre_master, spki)?;
                (pre_master, ClientKeyExchange::new_rsa(&encrypted))
            }
            KeyExchangeKind::EcdheRsa => {
                let peer_point = self.ecdhe_peer_point.take().ok_or_else(|| {
                    Error::UnexpectedMessage("missing server ephemeral parameters".to_string())
                })?;
                let ephemeral = EphemeralKeyPair::generate()?;
                let message = ClientKeyExchange::new_ecdhe(ephemeral.public_key());
                (ephemeral.agree(&peer_point)?, message)
            }
        };
        self.send_handshake(&HandshakeMessage::ClientKeyExchange(key_exchange_msg))?;
        self.stage = HandshakeStage::ClientKeyExchangeSent;

        let master = prf::derive_master_secret(
            &pre_master.0,
            &self.client_random,
            &self.server_random,
        )?;
        // Zeroed here; the master secret never runs twice for it.
        drop(pre_master);

        if client_auth_requested && client_chain.is_some() {
            let transcript_hash = self.transcript.current_hash();
            let signature = self.policy.sign_transcript(&transcript_hash)?;
            let verify = CertificateVerify::new(SIG_RSA_PKCS1_SHA256, signature);
            self.send_handshake(&HandshakeMessage::CertificateVerify(verify))?;
            self.stage = HandshakeStage::CertificateVerifySent;
        }

        let keys = prf::derive_key_block(&master, &self.client_random, &self.server_random, desc)?;
        let write_cipher = RecordCipher::new(desc, &keys.client_mac_key, &keys.client_key)?;
        let read_cipher = RecordCipher::new(desc, &keys.server_mac_key, &keys.server_key)?;

        // ChangeCipherSpec is record-layer signaling, not a handshake
        // message; it stays out of the transcript.
        self.record.send(ContentType::ChangeCipherSpec, &[1])?;
        self.record.change_cipher_spec(Direction::Write, write_cipher);
        self.stage = HandshakeStage::ChangeCipherSpecSent;

        let verify_data =
            prf::finished_verify_data(&master, FinishedLabel::Client, &self.transcript.current_hash());
        self.send_handshake(&HandshakeMessage::Finished(Finished::new(verify_data)))?;
        self.stage = HandshakeStage::FinishedSent;

        self.expect_change_cipher_spec()?;
        self.record.change_cipher_spec(Direction::Read, read_cipher);

        // Frozen before the server's Finished enters the transcript.
        let expected =
            prf::finished_verify_data(&master, FinishedLabel::Server, &self.transcript.current_hash());
        let finished = match self.next_handshake_message()? {
            HandshakeMessage::Finished(finished) => finished,
            other => {
                return Err(Error::UnexpectedMessage(format!(
                    "{:?} while awaiting server Finished",
                    other.message_type()
                )));
            }
        };

        constant_time::verify_slices_are_equal(&finished.verify_data, &expected)
            .map_err(|_| Error::HandshakeFailure("server Finished verification failed".to_string()))?;

        self.stage = HandshakeStage::Established;
        log::info!("handshake established, cipher suite {:?}", desc.id);
        Ok(())
    }

    fn selected_descriptor(&self) -> Result<&'static CipherSuiteDescriptor> {
        self.selected
            .ok_or_else(|| Error::HandshakeFailure("no cipher suite negotiated".to_string()))
    }

    /// Serialize, append to the transcript, and send one handshake message.
    fn send_handshake(&mut self, message: &HandshakeMessage) -> Result<()> {
        let wire = message.serialize();
        self.transcript.update(&wire);
        self.record.send(ContentType::Handshake, &wire)
    }

    /// Next complete handshake message, reading records as needed.
    /// Transcribes every message except HelloRequest, which is tolerated
    /// and ignored (renegotiation is unsupported).
    fn next_handshake_message(&mut self) -> Result<HandshakeMessage> {
        loop {
            let start = self.inbound_pos;
            if let Some(message) = HandshakeMessage::parse(&self.inbound, &mut self.inbound_pos)? {
                if matches!(message, HandshakeMessage::HelloRequest) {
                    log::debug!("ignoring HelloRequest");
                    self.compact_inbound();
                    continue;
                }

                let raw = self.inbound[start..self.inbound_pos].to_vec();
                self.transcript.update(&raw);
                self.compact_inbound();
                return Ok(message);
            }

            let (content_type, fragment) = self.record.recv()?;
            match content_type {
                ContentType::Handshake => {
                    if fragment.is_empty() {
                        return Err(Error::Decode("empty handshake record".to_string()));
                    }
                    self.inbound.extend_from_slice(&fragment);
                }
                ContentType::Alert => self.handle_handshake_alert(&fragment)?,
                ContentType::ChangeCipherSpec => {
                    return Err(Error::UnexpectedMessage(
                        "ChangeCipherSpec within a handshake flight".to_string(),
                    ));
                }
                ContentType::ApplicationData => {
                    return Err(Error::UnexpectedMessage(
                        "application data during handshake".to_string(),
                    ));
                }
            }
        }
    }

    fn compact_inbound(&mut self) {
        if self.inbound_pos == self.inbound.len() {
            self.inbound.clear();
            self.inbound_pos = 0;
        }
    }

    /// Await the peer's ChangeCipherSpec. A handshake message here would
    /// be running ahead of the cipher switch.
    fn expect_change_cipher_spec(&mut self) -> Result<()> {
        loop {
            let (content_type, fragment) = self.record.recv()?;
            match content_type {
                ContentType::ChangeCipherSpec => {
                    if fragment != [1] {
                        return Err(Error::Decode("malformed ChangeCipherSpec".to_string()));
                    }
                    if self.inbound_pos != self.inbound.len() {
                        return Err(Error::UnexpectedMessage(
                            "ChangeCipherSpec splits a handshake message".to_string(),
                        ));
                    }
                    return Ok(());
                }
                ContentType::Alert => self.handle_handshake_alert(&fragment)?,
                ContentType::Handshake => {
                    return Err(Error::UnexpectedMessage(
                        "handshake message before ChangeCipherSpec".to_string(),
                    ));
                }
                ContentType::ApplicationData => {
                    return Err(Error::UnexpectedMessage(
                        "application data during handshake".to_string(),
                    ));
                }
            }
        }
    }

    fn handle_handshake_alert(&mut self, fragment: &[u8]) -> Result<()> {
        let alert = Alert::parse(fragment)?;
        if alert.is_fatal() {
            return Err(Error::PeerAlert(alert.description));
        }
        if alert.description == AlertDescription::CloseNotify {
            return Err(Error::UnexpectedMessage(
                "close_notify during handshake".to_string(),
            ));
        }
        log::warn!("ignoring warning alert {:?}", alert.description);
        Ok(())
    }

    fn send_alert_for(&mut self, error: &Error) {
        if let Some(alert) = Alert::for_error(error) {
            // Best effort; the connection is failing anyway.
            let _ = self.record.send(ContentType::Alert, &alert.serialize());
        }
    }

    fn ensure_established(&self) -> Result<()> {
        if self.stage != HandshakeStage::Established {
            return Err(Error::UnexpectedMessage(format!(
                "application data in state {:?}",
                self.stage
            )));
        }
        Ok(())
    }

    /// Send application data under the negotiated write state.
    pub fn send(&mut self, data: &[u8]) -> Result<()> {
        self.ensure_established()?;
        self.record.send(ContentType::ApplicationData, data)
    }

    /// Receive one record's worth of application data. `None` signals the
    /// peer's orderly close_notify.
    pub fn recv(&mut self) -> Result<Option<Vec<u8>>> {
        self.ensure_established()?;
        loop {
            let (content_type, fragment) = self.record.recv()?;
            match content_type {
                ContentType::ApplicationData => return Ok(Some(fragment)),
                ContentType::Alert => {
                    let alert = Alert::parse(&fragment)?;
                    if alert.is_fatal() {
                        return Err(Error::PeerAlert(alert.description));
                    }
                    if alert.description == AlertDescription::CloseNotify {
                        return Ok(None);
                    }
                    log::warn!("ignoring warning alert {:?}", alert.description);
                }
                ContentType::Handshake => {
                    // Renegotiation is unsupported; a post-handshake
                    // HelloRequest is dropped on the floor.
                    log::debug!("ignoring post-handshake handshake record");
                }
                ContentType::ChangeCipherSpec => {
                    return Err(Error::UnexpectedMessage(
                        "ChangeCipherSpec after handshake".to_string(),
                    ));
                }
            }
        }
    }

    /// Send close_notify. The connection remains readable until the peer
    /// answers in kind.
    pub fn close(&mut self) -> Result<()> {
        self.record
            .send(ContentType::Alert, &Alert::close_notify().serialize())
    }
}

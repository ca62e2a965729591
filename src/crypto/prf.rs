//! TLS 1.2 pseudo-random function (RFC 5246 section 5) and the key
//! derivation steps built on it. All suites in the registry hash with
//! P_SHA256.
use crate::error::Result;
use crate::suite::CipherSuiteDescriptor;
use ring::hmac;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub const MASTER_SECRET_LEN: usize = 48;
pub const VERIFY_DATA_LEN: usize = 12;

const LABEL_MASTER_SECRET: &[u8] = b"master secret";
const LABEL_KEY_EXPANSION: &[u8] = b"key expansion";
const LABEL_CLIENT_FINISHED: &[u8] = b"client finished";
const LABEL_SERVER_FINISHED: &[u8] = b"server finished";

/// The 48-byte master secret. Wiped on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct MasterSecret(pub [u8; MASTER_SECRET_LEN]);

/// The key block partitioned per the selected suite descriptor, client-write
/// materials before server-write materials. Wiped on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial {
    pub client_mac_key: Vec<u8>,
    pub server_mac_key: Vec<u8>,
    pub client_key: Vec<u8>,
    pub server_key: Vec<u8>,
    pub client_iv: Vec<u8>,
    pub server_iv: Vec<u8>,
}

/// P_SHA256(secret, label + seed), truncated to `out_len` bytes.
/// Deterministic for identical inputs; HMAC keeps the secret's content out
/// of the control flow.
pub fn prf(secret: &[u8], label: &[u8], seed: &[u8], out_len: usize) -> Vec<u8> {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret);

    let mut label_seed = Vec::with_capacity(label.len() + seed.len());
    label_seed.extend_from_slice(label);
    label_seed.extend_from_slice(seed);

    let mut output = Vec::with_capacity(out_len + 32);
    let mut a = hmac::sign(&key, &label_seed).as_ref().to_vec();

    while output.len() < out_len {
        let mut context = Vec::with_capacity(a.len() + label_seed.len());
        context.extend_from_slice(&a);
        context.extend_from_slice(&label_seed);
        output.extend_from_slice(hmac::sign(&key, &context).as_ref());

        a = hmac::sign(&key, &a).as_ref().to_vec();
    }

    output.truncate(out_len);
    output
}

/// master_secret = PRF(pre_master_secret, "master secret",
/// client_random + server_random). The caller owns the pre-master secret
/// and is expected to drop it immediately after this returns.
pub fn derive_master_secret(
    pre_master_secret: &[u8],
    client_random: &[u8; 32],
    server_random: &[u8; 32],
) -> Result<MasterSecret> {
    let mut seed = [0u8; 64];
    seed[..32].copy_from_slice(client_random);
    seed[32..].copy_from_slice(server_random);

    let mut out = prf(pre_master_secret, LABEL_MASTER_SECRET, &seed, MASTER_SECRET_LEN);
    let mut master = [0u8; MASTER_SECRET_LEN];
    master.copy_from_slice(&out);
    out.zeroize();

    Ok(MasterSecret(master))
}

/// key_block = PRF(master_secret, "key expansion",
/// server_random + client_random), partitioned into the per-direction MAC
/// keys, cipher keys, and IVs the descriptor declares.
pub fn derive_key_block(
    master_secret: &MasterSecret,
    client_random: &[u8; 32],
    server_random: &[u8; 32],
    descriptor: &CipherSuiteDescriptor,
) -> Result<KeyMaterial> {
    // The key expansion seed swaps the randoms relative to the master
    // secret derivation.
    let mut seed = [0u8; 64];
    seed[..32].copy_from_slice(server_random);
    seed[32..].copy_from_slice(client_random);

    let mac_key_len = descriptor.mac.key_len();
    let key_len = descriptor.bulk.key_len();
    let iv_len = descriptor.bulk.fixed_iv_len();
    let total = 2 * (mac_key_len + key_len + iv_len);

    let mut block = prf(&master_secret.0, LABEL_KEY_EXPANSION, &seed, total);

    let mut pos = 0;
    let mut take = |len: usize| {
        let slice = block[pos..pos + len].to_vec();
        pos += len;
        slice
    };

    let material = KeyMaterial {
        client_mac_key: take(mac_key_len),
        server_mac_key: take(mac_key_len),
        client_key: take(key_len),
        server_key: take(key_len),
        client_iv: take(iv_len),
        server_iv: take(iv_len),
    };

    block.zeroize();
    Ok(material)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishedLabel {
    Client,
    Server,
}

/// verify_data = PRF(master_secret, finished_label, Hash(transcript))[0..12].
pub fn finished_verify_data(
    master_secret: &MasterSecret,
    label: FinishedLabel,
    transcript_hash: &[u8],
) -> [u8; VERIFY_DATA_LEN] {
    let label = match label {
        FinishedLabel::Client => LABEL_CLIENT_FINISHED,
        FinishedLabel::Server => LABEL_SERVER_FINISHED,
    };

    let out = prf(&master_secret.0, label, transcript_hash, VERIFY_DATA_LEN);
    let mut verify_data = [0u8; VERIFY_DATA_LEN];
    verify_data.copy_from_slice(&out);
    verify_data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suite::{descriptor, CipherSuiteId};
    use pretty_assertions::assert_eq;

    // Published P_SHA256 interop vector.
    #[test]
    fn test_prf_sha256_vector() {
        let secret = hex::decode("9bbe436ba940f017b17652849a71db35").unwrap();
        let seed = hex::decode("a0ba9f936cda311827a6f796ffd5198c").unwrap();

        let out = prf(&secret, b"test label", &seed, 100);
        assert_eq!(
            hex::encode(out),
            "e3f229ba727be17b8d122620557cd453c2aab21d07c3d495329b52d4e61edb5a\
             6b301791e90d35c9c9a46b4e14baf9af0fa022f7077def17abfd3797c0564bab\
             4fbc91666e9def9b97fce34f796789baa48082d122ee42c5a72e5a5110fff701\
             87347b66"
        );
    }

    #[test]
    fn test_master_secret_deterministic() {
        let pre_master: Vec<u8> = (0u8..48).collect();
        let client_random = [0x11u8; 32];
        let server_random = [0x22u8; 32];

        let a = derive_master_secret(&pre_master, &client_random, &server_random).unwrap();
        let b = derive_master_secret(&pre_master, &client_random, &server_random).unwrap();
        assert_eq!(a.0, b.0);
        assert_eq!(
            hex::encode(a.0),
            "bf2551a89a700d5408b099b3d733fd2a9f44a59f47bec76b219de5796d273c6f\
             8e1cf456a7689d195e9894b193822fc3"
        );
    }

    #[test]
    fn test_key_block_partition() {
        let pre_master: Vec<u8> = (0u8..48).collect();
        let client_random = [0x11u8; 32];
        let server_random = [0x22u8; 32];
        let master = derive_master_secret(&pre_master, &client_random, &server_random).unwrap();

        let desc = descriptor(CipherSuiteId::RsaAes128CbcSha);
        let keys = derive_key_block(&master, &client_random, &server_random, desc).unwrap();

        assert_eq!(keys.client_mac_key.len(), 20);
        assert_eq!(keys.server_mac_key.len(), 20);
        assert_eq!(keys.client_key.len(), 16);
        assert_eq!(keys.server_key.len(), 16);
        // Explicit per-record IVs; nothing drawn from the key block.
        assert!(keys.client_iv.is_empty());
        assert!(keys.server_iv.is_empty());

        // First bytes of the block land in the client MAC key.
        let expected = prf(&master.0, b"key expansion", &{
            let mut seed = [0u8; 64];
            seed[..32].copy_from_slice(&server_random);
            seed[32..].copy_from_slice(&client_random);
            seed
        }, 72);
        assert_eq!(keys.client_mac_key, expected[..20]);
        assert_eq!(keys.server_key, expected[56..72]);
    }

    #[test]
    fn test_finished_verify_data_directional() {
        let master = MasterSecret([0x42u8; 48]);
        let hash = [0xABu8; 32];

        let client = finished_verify_data(&master, FinishedLabel::Client, &hash);
        let server = finished_verify_data(&master, FinishedLabel::Server, &hash);
        assert_eq!(client.len(), VERIFY_DATA_LEN);
        assert_ne!(client, server);
    }
}

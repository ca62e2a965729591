pub mod cbc;
pub mod key_exchange;
pub mod prf;
pub mod transcript;

pub use prf::{derive_key_block, derive_master_secret, finished_verify_data, MasterSecret};
pub use transcript::HandshakeTranscript;

//! Raw AES-CBC block transforms. TLS padding is applied and checked by the
//! record transform in `suite`; these helpers refuse anything that is not
//! block aligned.
use crate::error::{Error, Result};
use aes::cipher::{block_padding::NoPadding, BlockDecryptMut, BlockEncryptMut, KeyIvInit};

pub const BLOCK_LEN: usize = 16;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AesKeySize {
    Aes128,
    Aes256,
}

impl AesKeySize {
    pub fn key_len(&self) -> usize {
        match self {
            AesKeySize::Aes128 => 16,
            AesKeySize::Aes256 => 32,
        }
    }
}

pub fn encrypt(size: AesKeySize, key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    if plaintext.len() % BLOCK_LEN != 0 {
        return Err(Error::Crypto("CBC input not block aligned".to_string()));
    }

    let ciphertext = match size {
        AesKeySize::Aes128 => Aes128CbcEnc::new_from_slices(key, iv)
            .map_err(|_| Error::Crypto("invalid AES-128 key or IV length".to_string()))?
            .encrypt_padded_vec_mut::<NoPadding>(plaintext),
        AesKeySize::Aes256 => Aes256CbcEnc::new_from_slices(key, iv)
            .map_err(|_| Error::Crypto("invalid AES-256 key or IV length".to_string()))?
            .encrypt_padded_vec_mut::<NoPadding>(plaintext),
    };

    Ok(ciphertext)
}

pub fn decrypt(size: AesKeySize, key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
        return Err(Error::Decryption("ciphertext not block aligned".to_string()));
    }

    let plaintext = match size {
        AesKeySize::Aes128 => Aes128CbcDec::new_from_slices(key, iv)
            .map_err(|_| Error::Crypto("invalid AES-128 key or IV length".to_string()))?
            .decrypt_padded_vec_mut::<NoPadding>(ciphertext)
            .map_err(|_| Error::Decryption("CBC decrypt failed".to_string()))?,
        AesKeySize::Aes256 => Aes256CbcDec::new_from_slices(key, iv)
            .map_err(|_| Error::Crypto("invalid AES-256 key or IV length".to_string()))?
            .decrypt_padded_vec_mut::<NoPadding>(ciphertext)
            .map_err(|_| Error::Decryption("CBC decrypt failed".to_string()))?,
    };

    Ok(plaintext)
}

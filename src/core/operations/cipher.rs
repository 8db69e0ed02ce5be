//! Thin adapters around the TDES and AES block cipher primitives.
//!
//! TR-31 needs ECB over a single block (CMAC subkey derivation) and CBC over
//! whole-block payloads (key data encryption and CBC-MAC). Key lengths select
//! the key schedule: 8/16/24 bytes map to single/two-key/three-key TDES and
//! 16/24/32 bytes to AES-128/-192/-256.

use aes::{Aes128, Aes192, Aes256};
use cipher::block_padding::NoPadding;
use cipher::generic_array::GenericArray;
use cipher::{
    BlockCipher, BlockDecryptMut, BlockEncrypt, BlockEncryptMut, InnerIvInit,
    KeyInit,
};
use des::{Des, TdesEde2, TdesEde3};

use crate::core::error::KeyBlockError;

/// Encrypts whole blocks in ECB mode with TDES.
pub fn encrypt_tdes_ecb(key: &[u8], data: &[u8]) -> Result<Vec<u8>, KeyBlockError> {
    match key.len() {
        8 => ecb_encrypt(&tdes_key(Des::new_from_slice(key), key)?, data),
        16 => ecb_encrypt(&tdes_key(TdesEde2::new_from_slice(key), key)?, data),
        24 => ecb_encrypt(&tdes_key(TdesEde3::new_from_slice(key), key)?, data),
        other => Err(KeyBlockError::TdesKeyLength(other)),
    }
}

/// Encrypts whole blocks in CBC mode with TDES.
pub fn encrypt_tdes_cbc(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>, KeyBlockError> {
    match key.len() {
        8 => cbc_encrypt(tdes_key(Des::new_from_slice(key), key)?, iv, data),
        16 => cbc_encrypt(tdes_key(TdesEde2::new_from_slice(key), key)?, iv, data),
        24 => cbc_encrypt(tdes_key(TdesEde3::new_from_slice(key), key)?, iv, data),
        other => Err(KeyBlockError::TdesKeyLength(other)),
    }
}

/// Decrypts whole blocks in CBC mode with TDES.
pub fn decrypt_tdes_cbc(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>, KeyBlockError> {
    match key.len() {
        8 => cbc_decrypt(tdes_key(Des::new_from_slice(key), key)?, iv, data),
        16 => cbc_decrypt(tdes_key(TdesEde2::new_from_slice(key), key)?, iv, data),
        24 => cbc_decrypt(tdes_key(TdesEde3::new_from_slice(key), key)?, iv, data),
        other => Err(KeyBlockError::TdesKeyLength(other)),
    }
}

/// Encrypts whole blocks in ECB mode with AES.
pub fn encrypt_aes_ecb(key: &[u8], data: &[u8]) -> Result<Vec<u8>, KeyBlockError> {
    match key.len() {
        16 => ecb_encrypt(&aes_key(Aes128::new_from_slice(key), key)?, data),
        24 => ecb_encrypt(&aes_key(Aes192::new_from_slice(key), key)?, data),
        32 => ecb_encrypt(&aes_key(Aes256::new_from_slice(key), key)?, data),
        other => Err(KeyBlockError::AesKeyLength(other)),
    }
}

/// Encrypts whole blocks in CBC mode with AES.
pub fn encrypt_aes_cbc(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>, KeyBlockError> {
    match key.len() {
        16 => cbc_encrypt(aes_key(Aes128::new_from_slice(key), key)?, iv, data),
        24 => cbc_encrypt(aes_key(Aes192::new_from_slice(key), key)?, iv, data),
        32 => cbc_encrypt(aes_key(Aes256::new_from_slice(key), key)?, iv, data),
        other => Err(KeyBlockError::AesKeyLength(other)),
    }
}

/// Decrypts whole blocks in CBC mode with AES.
pub fn decrypt_aes_cbc(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>, KeyBlockError> {
    match key.len() {
        16 => cbc_decrypt(aes_key(Aes128::new_from_slice(key), key)?, iv, data),
        24 => cbc_decrypt(aes_key(Aes192::new_from_slice(key), key)?, iv, data),
        32 => cbc_decrypt(aes_key(Aes256::new_from_slice(key), key)?, iv, data),
        other => Err(KeyBlockError::AesKeyLength(other)),
    }
}

fn tdes_key<C>(cipher: Result<C, cipher::InvalidLength>, key: &[u8]) -> Result<C, KeyBlockError> {
    cipher.map_err(|_| KeyBlockError::TdesKeyLength(key.len()))
}

fn aes_key<C>(cipher: Result<C, cipher::InvalidLength>, key: &[u8]) -> Result<C, KeyBlockError> {
    cipher.map_err(|_| KeyBlockError::AesKeyLength(key.len()))
}

fn check_aligned(len: usize, block_size: usize) -> Result<(), KeyBlockError> {
    if len == 0 || len % block_size != 0 {
        return Err(KeyBlockError::UnalignedData { len, block_size });
    }
    Ok(())
}

fn ecb_encrypt<C>(cipher: &C, data: &[u8]) -> Result<Vec<u8>, KeyBlockError>
where
    C: BlockEncrypt,
{
    let block_size = C::block_size();
    check_aligned(data.len(), block_size)?;

    let mut buf = data.to_vec();
    for block in buf.chunks_mut(block_size) {
        cipher.encrypt_block(GenericArray::from_mut_slice(block));
    }
    Ok(buf)
}

fn cbc_encrypt<C>(cipher: C, iv: &[u8], data: &[u8]) -> Result<Vec<u8>, KeyBlockError>
where
    C: BlockCipher + BlockEncryptMut,
{
    let block_size = C::block_size();
    check_aligned(data.len(), block_size)?;

    let mode = cbc::Encryptor::inner_iv_slice_init(cipher, iv).map_err(|_| {
        KeyBlockError::InvalidIvLength {
            len: iv.len(),
            block_size,
        }
    })?;

    let mut buf = data.to_vec();
    let len = buf.len();
    mode.encrypt_padded_mut::<NoPadding>(&mut buf, len)
        .map_err(|_| KeyBlockError::UnalignedData { len, block_size })?;
    Ok(buf)
}

fn cbc_decrypt<C>(cipher: C, iv: &[u8], data: &[u8]) -> Result<Vec<u8>, KeyBlockError>
where
    C: BlockCipher + BlockDecryptMut,
{
    let block_size = C::block_size();
    check_aligned(data.len(), block_size)?;

    let mode = cbc::Decryptor::inner_iv_slice_init(cipher, iv).map_err(|_| {
        KeyBlockError::InvalidIvLength {
            len: iv.len(),
            block_size,
        }
    })?;

    let mut buf = data.to_vec();
    mode.decrypt_padded_mut::<NoPadding>(&mut buf)
        .map_err(|_| KeyBlockError::UnalignedData {
            len: data.len(),
            block_size,
        })?;
    Ok(buf)
}

//! Key variant binding method for versions A and C.
//!
//! The working keys are XOR variants of the KBPK. The key field is encrypted
//! first, with the leading 8 header characters as the IV, and the MAC then
//! covers the header and the ciphertext. Both versions emit uppercase hex.

use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::core::error::KeyBlockError;
use crate::core::operations::cipher::{decrypt_tdes_cbc, encrypt_tdes_cbc};
use crate::core::operations::mac::{generate_cbc_mac, MacAlgorithm};
use crate::core::operations::padding::PaddingMode;
use crate::core::version::KeyBlockVersion;

use super::{assemble_key_field, extract_key};

/// Mask byte producing the encryption variant of the KBPK.
const ENCRYPTION_VARIANT: u8 = 0x45;

/// Mask byte producing the authentication variant of the KBPK.
const AUTHENTICATION_VARIANT: u8 = 0x4D;

fn check_kbpk(kbpk: &[u8], version: KeyBlockVersion) -> Result<(), KeyBlockError> {
    if !matches!(kbpk.len(), 8 | 16 | 24) {
        return Err(KeyBlockError::InvalidKbpkLength {
            len: kbpk.len(),
            version,
        });
    }
    Ok(())
}

/// KBEK and KBAK as XOR variants of the KBPK.
fn derive(kbpk: &[u8]) -> (Zeroizing<Vec<u8>>, Zeroizing<Vec<u8>>) {
    let kbek = kbpk.iter().map(|b| b ^ ENCRYPTION_VARIANT).collect();
    let kbak = kbpk.iter().map(|b| b ^ AUTHENTICATION_VARIANT).collect();
    (Zeroizing::new(kbek), Zeroizing::new(kbak))
}

/// 4-byte CBC-MAC over the header and the encrypted key field.
fn generate_mac(kbak: &[u8], header: &str, key_data: &[u8]) -> Result<Vec<u8>, KeyBlockError> {
    let mut data = Vec::with_capacity(header.len() + key_data.len());
    data.extend_from_slice(header.as_bytes());
    data.extend_from_slice(key_data);
    generate_cbc_mac(kbak, &data, PaddingMode::Method1, 4, MacAlgorithm::Des)
}

pub(crate) fn wrap(
    kbpk: &[u8],
    version: KeyBlockVersion,
    header: &str,
    key: &[u8],
    extra_pad: usize,
) -> Result<String, KeyBlockError> {
    check_kbpk(kbpk, version)?;

    let (kbek, kbak) = derive(kbpk);
    let clear_key_data = assemble_key_field(key, extra_pad, 8)?;
    let encrypted = encrypt_tdes_cbc(&kbek, &header.as_bytes()[..8], &clear_key_data)?;
    let mac = generate_mac(&kbak, header, &encrypted)?;

    Ok(format!(
        "{header}{}{}",
        hex::encode_upper(&encrypted),
        hex::encode_upper(&mac)
    ))
}

pub(crate) fn unwrap(
    kbpk: &[u8],
    version: KeyBlockVersion,
    header: &str,
    key_data: &[u8],
    received_mac: &[u8],
) -> Result<Zeroizing<Vec<u8>>, KeyBlockError> {
    check_kbpk(kbpk, version)?;
    if key_data.len() < 8 || key_data.len() % 8 != 0 {
        return Err(KeyBlockError::MalformedEncryptedKey);
    }

    let (kbek, kbak) = derive(kbpk);
    let mac = generate_mac(&kbak, header, key_data)?;
    if !bool::from(mac.ct_eq(received_mac)) {
        return Err(KeyBlockError::MacMismatch);
    }

    let clear_key_data = Zeroizing::new(decrypt_tdes_cbc(
        &kbek,
        &header.as_bytes()[..8],
        key_data,
    )?);
    extract_key(&clear_key_data)
}

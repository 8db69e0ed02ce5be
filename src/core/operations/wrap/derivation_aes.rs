//! AES key derivation binding method for version D.
//!
//! The derivation input is a padded single AES block, so the CMAC calls use
//! the K2 subkey. Each call yields 16 bytes of keying material; KBEK and
//! KBAK are truncated to the KBPK length. As in version B the MAC covers the
//! header and the cleartext key field and serves as the encryption IV.

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, Zeroizing};

use crate::core::error::KeyBlockError;
use crate::core::operations::cipher::{decrypt_aes_cbc, encrypt_aes_cbc};
use crate::core::operations::mac::{generate_cbc_mac, MacAlgorithm};
use crate::core::operations::padding::PaddingMode;
use crate::core::operations::subkeys::derive_aes_subkeys;
use crate::core::version::KeyBlockVersion;

use super::{assemble_key_field, extract_key, xor};

/// Key usage indicator for encryption keying material.
const USAGE_ENCRYPTION: [u8; 2] = [0x00, 0x00];

/// Key usage indicator for MAC keying material.
const USAGE_MAC: [u8; 2] = [0x00, 0x01];

fn check_kbpk(kbpk: &[u8]) -> Result<(), KeyBlockError> {
    if !matches!(kbpk.len(), 16 | 24 | 32) {
        return Err(KeyBlockError::InvalidKbpkLength {
            len: kbpk.len(),
            version: KeyBlockVersion::D,
        });
    }
    Ok(())
}

/// Derives KBEK and KBAK from the KBPK, each truncated to the KBPK length.
fn derive(kbpk: &[u8]) -> Result<(Zeroizing<Vec<u8>>, Zeroizing<Vec<u8>>), KeyBlockError> {
    let (algorithm, key_bits, counters): ([u8; 2], [u8; 2], &[u8]) = match kbpk.len() {
        // AES-128
        16 => ([0x00, 0x02], [0x00, 0x80], &[1]),
        // AES-192
        24 => ([0x00, 0x03], [0x00, 0xC0], &[1, 2]),
        // AES-256
        32 => ([0x00, 0x04], [0x01, 0x00], &[1, 2]),
        other => {
            return Err(KeyBlockError::InvalidKbpkLength {
                len: other,
                version: KeyBlockVersion::D,
            })
        }
    };

    let (_, k2) = derive_aes_subkeys(kbpk)?;

    let mut kd = Zeroizing::new([0u8; 16]);
    kd[4..6].copy_from_slice(&algorithm);
    kd[6..8].copy_from_slice(&key_bits);
    kd[8] = 0x80;

    let mut kbek = Zeroizing::new(Vec::with_capacity(counters.len() * 16));
    let mut kbak = Zeroizing::new(Vec::with_capacity(counters.len() * 16));
    for &counter in counters {
        kd[0] = counter;

        kd[1..3].copy_from_slice(&USAGE_ENCRYPTION);
        let mut material = generate_cbc_mac(
            kbpk,
            &xor(&kd[..], &k2[..]),
            PaddingMode::Method1,
            16,
            MacAlgorithm::Aes,
        )?;
        kbek.extend_from_slice(&material);
        material.zeroize();

        kd[1..3].copy_from_slice(&USAGE_MAC);
        let mut material = generate_cbc_mac(
            kbpk,
            &xor(&kd[..], &k2[..]),
            PaddingMode::Method1,
            16,
            MacAlgorithm::Aes,
        )?;
        kbak.extend_from_slice(&material);
        material.zeroize();
    }

    kbek.truncate(kbpk.len());
    kbak.truncate(kbpk.len());
    Ok((kbek, kbak))
}

/// 16-byte CMAC over the header and the cleartext key field.
fn generate_mac(kbak: &[u8], header: &str, key_data: &[u8]) -> Result<Vec<u8>, KeyBlockError> {
    let (km1, _) = derive_aes_subkeys(kbak)?;

    let mut mac_data = Zeroizing::new(Vec::with_capacity(header.len() + key_data.len()));
    mac_data.extend_from_slice(header.as_bytes());
    mac_data.extend_from_slice(key_data);

    let tail = mac_data.len() - 16;
    for (byte, subkey) in mac_data[tail..].iter_mut().zip(km1.iter()) {
        *byte ^= subkey;
    }

    generate_cbc_mac(kbak, &mac_data, PaddingMode::Method1, 16, MacAlgorithm::Aes)
}

pub(crate) fn wrap(
    kbpk: &[u8],
    header: &str,
    key: &[u8],
    extra_pad: usize,
) -> Result<String, KeyBlockError> {
    check_kbpk(kbpk)?;

    let (kbek, kbak) = derive(kbpk)?;
    let clear_key_data = assemble_key_field(key, extra_pad, 16)?;
    let mac = generate_mac(&kbak, header, &clear_key_data)?;
    let encrypted = encrypt_aes_cbc(&kbek, &mac, &clear_key_data)?;

    Ok(format!(
        "{header}{}{}",
        hex::encode(&encrypted),
        hex::encode(&mac)
    ))
}

pub(crate) fn unwrap(
    kbpk: &[u8],
    header: &str,
    key_data: &[u8],
    received_mac: &[u8],
) -> Result<Zeroizing<Vec<u8>>, KeyBlockError> {
    check_kbpk(kbpk)?;
    if key_data.len() < 16 || key_data.len() % 16 != 0 {
        return Err(KeyBlockError::MalformedEncryptedKey);
    }

    let (kbek, kbak) = derive(kbpk)?;
    let clear_key_data = Zeroizing::new(decrypt_aes_cbc(&kbek, received_mac, key_data)?);
    let mac = generate_mac(&kbak, header, &clear_key_data)?;
    if !bool::from(mac.ct_eq(received_mac)) {
        return Err(KeyBlockError::MacMismatch);
    }

    extract_key(&clear_key_data)
}

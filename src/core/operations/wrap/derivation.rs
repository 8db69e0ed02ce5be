//! TDES key derivation binding method for version B.
//!
//! KBEK and KBAK are derived from the KBPK through single-block CMAC calls,
//! one 8-byte block of keying material per counter value. The MAC covers the
//! header and the cleartext key field and doubles as the encryption IV, so
//! the ciphertext cannot be re-spliced under a different header.

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, Zeroizing};

use crate::core::error::KeyBlockError;
use crate::core::operations::cipher::{decrypt_tdes_cbc, encrypt_tdes_cbc};
use crate::core::operations::mac::{generate_cbc_mac, MacAlgorithm};
use crate::core::operations::padding::PaddingMode;
use crate::core::operations::subkeys::derive_tdes_subkeys;
use crate::core::version::KeyBlockVersion;

use super::{assemble_key_field, extract_key, xor};

/// Key usage indicator for encryption keying material.
const USAGE_ENCRYPTION: [u8; 2] = [0x00, 0x00];

/// Key usage indicator for MAC keying material.
const USAGE_MAC: [u8; 2] = [0x00, 0x01];

fn check_kbpk(kbpk: &[u8]) -> Result<(), KeyBlockError> {
    if !matches!(kbpk.len(), 16 | 24) {
        return Err(KeyBlockError::InvalidKbpkLength {
            len: kbpk.len(),
            version: KeyBlockVersion::B,
        });
    }
    Ok(())
}

/// Derives KBEK and KBAK from the KBPK.
///
/// The derivation input is one TDES block:
/// counter, usage, separator, algorithm, key bits. Each CMAC call over
/// `input XOR K1` yields 8 bytes of keying material; counters run until the
/// material matches the KBPK length.
fn derive(kbpk: &[u8]) -> Result<(Zeroizing<Vec<u8>>, Zeroizing<Vec<u8>>), KeyBlockError> {
    let (algorithm, key_bits, counters): ([u8; 2], [u8; 2], &[u8]) = match kbpk.len() {
        // Two-key TDES
        16 => ([0x00, 0x00], [0x00, 0x80], &[1, 2]),
        // Three-key TDES
        24 => ([0x00, 0x01], [0x00, 0xC0], &[1, 2, 3]),
        other => {
            return Err(KeyBlockError::InvalidKbpkLength {
                len: other,
                version: KeyBlockVersion::B,
            })
        }
    };

    let (k1, _) = derive_tdes_subkeys(kbpk)?;

    let mut kd = Zeroizing::new([0u8; 8]);
    kd[4..6].copy_from_slice(&algorithm);
    kd[6..8].copy_from_slice(&key_bits);

    let mut kbek = Zeroizing::new(Vec::with_capacity(kbpk.len()));
    let mut kbak = Zeroizing::new(Vec::with_capacity(kbpk.len()));
    for &counter in counters {
        kd[0] = counter;

        kd[1..3].copy_from_slice(&USAGE_ENCRYPTION);
        let mut material = generate_cbc_mac(
            kbpk,
            &xor(&kd[..], &k1[..]),
            PaddingMode::Method1,
            8,
            MacAlgorithm::Des,
        )?;
        kbek.extend_from_slice(&material);
        material.zeroize();

        kd[1..3].copy_from_slice(&USAGE_MAC);
        let mut material = generate_cbc_mac(
            kbpk,
            &xor(&kd[..], &k1[..]),
            PaddingMode::Method1,
            8,
            MacAlgorithm::Des,
        )?;
        kbak.extend_from_slice(&material);
        material.zeroize();
    }

    Ok((kbek, kbak))
}

/// 8-byte CMAC over the header and the cleartext key field.
fn generate_mac(kbak: &[u8], header: &str, key_data: &[u8]) -> Result<Vec<u8>, KeyBlockError> {
    let (km1, _) = derive_tdes_subkeys(kbak)?;

    let mut mac_data = Zeroizing::new(Vec::with_capacity(header.len() + key_data.len()));
    mac_data.extend_from_slice(header.as_bytes());
    mac_data.extend_from_slice(key_data);

    let tail = mac_data.len() - 8;
    for (byte, subkey) in mac_data[tail..].iter_mut().zip(km1.iter()) {
        *byte ^= subkey;
    }

    generate_cbc_mac(kbak, &mac_data, PaddingMode::Method1, 8, MacAlgorithm::Des)
}

pub(crate) fn wrap(
    kbpk: &[u8],
    header: &str,
    key: &[u8],
    extra_pad: usize,
) -> Result<String, KeyBlockError> {
    check_kbpk(kbpk)?;

    let (kbek, kbak) = derive(kbpk)?;
    let clear_key_data = assemble_key_field(key, extra_pad, 8)?;
    let mac = generate_mac(&kbak, header, &clear_key_data)?;
    let encrypted = encrypt_tdes_cbc(&kbek, &mac, &clear_key_data)?;

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
    if key_data.len() < 8 || key_data.len() % 8 != 0 {
        return Err(KeyBlockError::MalformedEncryptedKey);
    }

    let (kbek, kbak) = derive(kbpk)?;
    let clear_key_data = Zeroizing::new(decrypt_tdes_cbc(&kbek, received_mac, key_data)?);
    let mac = generate_mac(&kbak, header, &clear_key_data)?;
    if !bool::from(mac.ct_eq(received_mac)) {
        return Err(KeyBlockError::MacMismatch);
    }

    extract_key(&clear_key_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    const HEADER: &str = "B0096P0TE00E0000";

    #[test]
    fn test_derived_keys_match_kbpk_length() -> Result<(), KeyBlockError> {
        let kbpk = hex!("0123456789ABCDEFFEDCBA9876543210");
        let (kbek, kbak) = derive(&kbpk)?;
        assert_eq!(kbek.len(), 16);
        assert_eq!(kbak.len(), 16);
        assert_ne!(&kbek[..], &kbak[..]);

        let kbpk = [0x42u8; 24];
        let (kbek, kbak) = derive(&kbpk)?;
        assert_eq!(kbek.len(), 24);
        assert_eq!(kbak.len(), 24);
        Ok(())
    }

    #[test]
    fn test_wrap_unwrap_round_trip() -> Result<(), KeyBlockError> {
        let kbpk = hex!("0123456789ABCDEFFEDCBA9876543210");
        let key = hex!("0123456789ABCDEF0123456789ABCDEF");

        let wrapped = wrap(&kbpk, HEADER, &key, 8)?;
        assert!(wrapped.starts_with(HEADER));

        let mac = hex::decode(&wrapped[wrapped.len() - 16..]).expect("mac hex");
        let key_data = hex::decode(&wrapped[HEADER.len()..wrapped.len() - 16]).expect("cipher hex");
        let unwrapped = unwrap(&kbpk, HEADER, &key_data, &mac)?;
        assert_eq!(&unwrapped[..], &key);
        Ok(())
    }

    #[test]
    fn test_mac_binds_header() -> Result<(), KeyBlockError> {
        let kbpk = hex!("0123456789ABCDEFFEDCBA9876543210");
        let key = hex!("0123456789ABCDEF0123456789ABCDEF");

        let wrapped = wrap(&kbpk, HEADER, &key, 0)?;
        let mac = hex::decode(&wrapped[wrapped.len() - 16..]).expect("mac hex");
        let key_data = hex::decode(&wrapped[HEADER.len()..wrapped.len() - 16]).expect("cipher hex");

        let other_header = "B0096P0TE00N0000";
        let result = unwrap(&kbpk, other_header, &key_data, &mac);
        assert!(matches!(result, Err(KeyBlockError::MacMismatch)));
        Ok(())
    }

    #[test]
    fn test_rejects_single_des_kbpk() {
        let result = wrap(&[0u8; 8], HEADER, &[0u8; 16], 0);
        assert!(matches!(
            result,
            Err(KeyBlockError::InvalidKbpkLength { len: 8, .. })
        ));
    }
}

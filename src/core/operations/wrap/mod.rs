//! Version-specific wrap and unwrap pipelines.
//!
//! Each key block version pairs a key derivation scheme with a MAC/encrypt
//! composition:
//!
//! - [`variant`] - versions A and C, TDES with XOR-variant keys
//! - [`derivation`] - version B, TDES with CMAC-derived keys
//! - [`derivation_aes`] - version D, AES with CMAC-derived keys
//!
//! All three share the cleartext key field layout: a 2-byte big-endian key
//! length in bits, the key itself, and random padding up to a whole number
//! of cipher blocks.

pub(crate) mod derivation;
pub(crate) mod derivation_aes;
pub(crate) mod variant;

use rand_core::{OsRng, TryRngCore};
use zeroize::Zeroizing;

use crate::core::error::KeyBlockError;

/// Builds the cleartext key field: bit length, key, then random pad bytes.
///
/// `extra_pad` extends the pad so the field hides the true key length; the
/// total is always a whole number of `block_size` blocks.
pub(crate) fn assemble_key_field(
    key: &[u8],
    extra_pad: usize,
    block_size: usize,
) -> Result<Zeroizing<Vec<u8>>, KeyBlockError> {
    let pad_len = block_size - ((2 + key.len() + extra_pad) % block_size);
    let mut pad = Zeroizing::new(vec![0u8; pad_len + extra_pad]);
    OsRng
        .try_fill_bytes(&mut pad)
        .map_err(|_| KeyBlockError::RandomSource)?;

    let bit_len = (key.len() * 8) as u16;
    let mut field = Zeroizing::new(Vec::with_capacity(2 + key.len() + pad.len()));
    field.extend_from_slice(&bit_len.to_be_bytes());
    field.extend_from_slice(key);
    field.extend_from_slice(&pad);
    Ok(field)
}

/// Recovers the key from a decrypted key field by its declared bit length.
pub(crate) fn extract_key(clear_key_data: &[u8]) -> Result<Zeroizing<Vec<u8>>, KeyBlockError> {
    if clear_key_data.len() < 2 {
        return Err(KeyBlockError::MalformedDecryptedKey);
    }
    let bit_len = usize::from(u16::from_be_bytes([clear_key_data[0], clear_key_data[1]]));
    if bit_len % 8 != 0 {
        return Err(KeyBlockError::InvalidDecryptedKey);
    }
    let key_len = bit_len / 8;
    if clear_key_data.len() < key_len + 2 {
        return Err(KeyBlockError::MalformedDecryptedKey);
    }
    Ok(Zeroizing::new(clear_key_data[2..2 + key_len].to_vec()))
}

/// XOR of two equal-length byte strings.
pub(crate) fn xor(a: &[u8], b: &[u8]) -> Zeroizing<Vec<u8>> {
    debug_assert_eq!(a.len(), b.len());
    Zeroizing::new(a.iter().zip(b).map(|(x, y)| x ^ y).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_field_layout() -> Result<(), KeyBlockError> {
        let key = [0xABu8; 16];
        let field = assemble_key_field(&key, 0, 8)?;

        // 2 + 16 rounds up to 24.
        assert_eq!(field.len(), 24);
        assert_eq!(&field[..2], &[0x00, 0x80]);
        assert_eq!(&field[2..18], &key);
        Ok(())
    }

    #[test]
    fn test_key_field_extra_pad_masks_length() -> Result<(), KeyBlockError> {
        let key = [0xABu8; 16];
        let field = assemble_key_field(&key, 8, 8)?;

        // 2 + 16 + 8 rounds up to 32; the bit length still names 16 bytes.
        assert_eq!(field.len(), 32);
        assert_eq!(&field[..2], &[0x00, 0x80]);
        Ok(())
    }

    #[test]
    fn test_key_field_always_gains_padding() -> Result<(), KeyBlockError> {
        // 2 + 6 is already aligned, so a full extra block is added.
        let field = assemble_key_field(&[0u8; 6], 0, 8)?;
        assert_eq!(field.len(), 16);
        Ok(())
    }

    #[test]
    fn test_extract_key_round_trip() -> Result<(), KeyBlockError> {
        let key = [0x42u8; 24];
        let field = assemble_key_field(&key, 0, 16)?;
        let extracted = extract_key(&field)?;
        assert_eq!(&extracted[..], &key);
        Ok(())
    }

    #[test]
    fn test_extract_key_rejects_partial_bytes() {
        // 12 bits is not a whole number of bytes.
        let result = extract_key(&[0x00, 0x0C, 0xAA, 0xBB]);
        assert!(matches!(result, Err(KeyBlockError::InvalidDecryptedKey)));
    }

    #[test]
    fn test_extract_key_rejects_overflow() {
        // Declares 8 bytes but carries 4.
        let result = extract_key(&[0x00, 0x40, 0x01, 0x02, 0x03, 0x04]);
        assert!(matches!(result, Err(KeyBlockError::MalformedDecryptedKey)));
    }
}

//! CMAC subkey derivation (NIST SP 800-38B).
//!
//! Both subkeys come from `L`, the encryption of a zero block under the base
//! key. Doubling in GF(2^64) / GF(2^128) is a left shift with a conditional
//! XOR of the field constant into the low byte.

use zeroize::{Zeroize, Zeroizing};

use crate::core::error::KeyBlockError;
use crate::core::operations::cipher::{encrypt_aes_ecb, encrypt_tdes_ecb};

/// Field constant for the 8-byte (TDES) block size.
const RB_TDES: u8 = 0x1B;

/// Field constant for the 16-byte (AES) block size.
const RB_AES: u8 = 0x87;

/// Derives the CMAC subkeys `(K1, K2)` from a TDES key.
pub(crate) fn derive_tdes_subkeys(
    key: &[u8],
) -> Result<(Zeroizing<[u8; 8]>, Zeroizing<[u8; 8]>), KeyBlockError> {
    let mut l = encrypt_tdes_ecb(key, &[0u8; 8])?;
    let mut block = [0u8; 8];
    block.copy_from_slice(&l);
    l.zeroize();

    let k1 = Zeroizing::new(double(&block, RB_TDES));
    let k2 = Zeroizing::new(double(&k1, RB_TDES));
    block.zeroize();
    Ok((k1, k2))
}

/// Derives the CMAC subkeys `(K1, K2)` from an AES key.
pub(crate) fn derive_aes_subkeys(
    key: &[u8],
) -> Result<(Zeroizing<[u8; 16]>, Zeroizing<[u8; 16]>), KeyBlockError> {
    let mut l = encrypt_aes_ecb(key, &[0u8; 16])?;
    let mut block = [0u8; 16];
    block.copy_from_slice(&l);
    l.zeroize();

    let k1 = Zeroizing::new(double(&block, RB_AES));
    let k2 = Zeroizing::new(double(&k1, RB_AES));
    block.zeroize();
    Ok((k1, k2))
}

/// Shifts the block left by one bit as a big-endian integer, discarding the
/// overflow, and folds in `rb` when the pre-shift top bit was set.
fn double<const N: usize>(block: &[u8; N], rb: u8) -> [u8; N] {
    let mut out = [0u8; N];
    let mut carry = 0u8;
    for i in (0..N).rev() {
        out[i] = (block[i] << 1) | carry;
        carry = block[i] >> 7;
    }
    if block[0] & 0x80 != 0 {
        out[N - 1] ^= rb;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_double_shifts_left() {
        let block = [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x80, 0x01];
        assert_eq!(
            double(&block, RB_TDES),
            [0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x02]
        );
    }

    #[test]
    fn test_double_folds_in_rb_on_carry() {
        let block = [0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(
            double(&block, RB_TDES),
            [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1B]
        );
    }

    #[test]
    fn test_aes_subkeys_rfc_4493() -> Result<(), KeyBlockError> {
        // RFC 4493 section 4: subkey generation for the all-vectors key.
        let key = hex!("2b7e151628aed2a6abf7158809cf4f3c");
        let (k1, k2) = derive_aes_subkeys(&key)?;
        assert_eq!(*k1, hex!("fbeed618357133667c85e08f7236a8de"));
        assert_eq!(*k2, hex!("f7ddac306ae266ccf90bc11ee46d513b"));
        Ok(())
    }

    #[test]
    fn test_tdes_subkeys_are_chained_doublings() -> Result<(), KeyBlockError> {
        let key = hex!("0123456789ABCDEFFEDCBA9876543210");
        let (k1, k2) = derive_tdes_subkeys(&key)?;

        let l = encrypt_tdes_ecb(&key, &[0u8; 8])?;
        let mut block = [0u8; 8];
        block.copy_from_slice(&l);
        assert_eq!(*k1, double(&block, RB_TDES));
        assert_eq!(*k2, double(&k1, RB_TDES));
        Ok(())
    }
}

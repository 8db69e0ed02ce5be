//! CBC-MAC engine and the single-DES retail MAC.
//!
//! A CBC-MAC is the final ciphertext block of a CBC encryption under a zero
//! IV, truncated to the requested length. The retail MAC (ISO/IEC 9797-1 MAC
//! algorithm 3) runs the CBC chain under the first key with single DES and
//! applies a decrypt/encrypt transform to the last block.

use cipher::generic_array::GenericArray;
use cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use des::Des;
use zeroize::Zeroize;

use crate::core::error::KeyBlockError;
use crate::core::operations::cipher::{encrypt_aes_cbc, encrypt_tdes_cbc};
use crate::core::operations::padding::PaddingMode;

/// Cipher family used by the CBC-MAC engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacAlgorithm {
    /// TDES, 8-byte blocks.
    Des,
    /// AES, 16-byte blocks.
    Aes,
}

impl MacAlgorithm {
    /// Block size in bytes.
    #[must_use]
    pub const fn block_size(self) -> usize {
        match self {
            Self::Des => 8,
            Self::Aes => 16,
        }
    }
}

/// Computes a CBC-MAC over `data`.
///
/// The input is padded with `padding`, CBC-encrypted under a zero IV, and the
/// final ciphertext block is truncated to `length` bytes. A `length` of zero
/// selects the full block size.
///
/// # Errors
///
/// Rejects an empty key, empty data, or a `length` larger than the block
/// size, before any cryptographic work.
pub fn generate_cbc_mac(
    key: &[u8],
    data: &[u8],
    padding: PaddingMode,
    length: usize,
    algorithm: MacAlgorithm,
) -> Result<Vec<u8>, KeyBlockError> {
    if key.is_empty() {
        return Err(KeyBlockError::InvalidMacKey);
    }
    if data.is_empty() {
        return Err(KeyBlockError::InvalidMacData);
    }
    let block_size = algorithm.block_size();
    let length = if length == 0 { block_size } else { length };
    if length > block_size {
        return Err(KeyBlockError::InvalidMacLength { length, block_size });
    }

    let mut padded = padding.apply(data, block_size);
    let iv = vec![0u8; block_size];
    let result = match algorithm {
        MacAlgorithm::Des => encrypt_tdes_cbc(key, &iv, &padded),
        MacAlgorithm::Aes => encrypt_aes_cbc(key, &iv, &padded),
    };
    padded.zeroize();
    let encrypted = result?;

    let mut mac = encrypted[encrypted.len() - block_size..].to_vec();
    mac.truncate(length);
    Ok(mac)
}

/// Computes an ISO/IEC 9797-1 MAC algorithm 3 (retail) MAC.
///
/// The padded input is CBC-encrypted under `key1` with single DES; the last
/// block is then decrypted under `key2` and re-encrypted under `key1`, and
/// the result truncated to `length` bytes (zero selects 8).
///
/// # Errors
///
/// Rejects empty data and keys that are not exactly 8 bytes each.
pub fn generate_retail_mac(
    key1: &[u8],
    key2: &[u8],
    data: &[u8],
    padding: PaddingMode,
    length: usize,
) -> Result<Vec<u8>, KeyBlockError> {
    if key1.is_empty() || key2.is_empty() {
        return Err(KeyBlockError::InvalidMacKey);
    }
    if data.is_empty() {
        return Err(KeyBlockError::InvalidMacData);
    }
    if key1.len() != 8 {
        return Err(KeyBlockError::RetailMacKeyLength(key1.len()));
    }
    if key2.len() != 8 {
        return Err(KeyBlockError::RetailMacKeyLength(key2.len()));
    }
    let length = if length == 0 { 8 } else { length };
    if length > 8 {
        return Err(KeyBlockError::InvalidMacLength {
            length,
            block_size: 8,
        });
    }

    let mut padded = padding.apply(data, 8);
    let result = encrypt_tdes_cbc(key1, &[0u8; 8], &padded);
    padded.zeroize();
    let chained = result?;

    let mut block = [0u8; 8];
    block.copy_from_slice(&chained[chained.len() - 8..]);

    let des1 = Des::new_from_slice(key1).map_err(|_| KeyBlockError::RetailMacKeyLength(key1.len()))?;
    let des2 = Des::new_from_slice(key2).map_err(|_| KeyBlockError::RetailMacKeyLength(key2.len()))?;
    des2.decrypt_block(GenericArray::from_mut_slice(&mut block));
    des1.encrypt_block(GenericArray::from_mut_slice(&mut block));

    let mut mac = block.to_vec();
    mac.truncate(length);
    Ok(mac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_cbc_mac_is_final_cbc_block() -> Result<(), KeyBlockError> {
        // Last CBC block of the ICAO 9303-11 encryption example.
        let key = hex!("AB94FDECF2674FDFB9B391F85D7F76F2");
        let data = hex!("781723860C06C2264608F919887022120B795240CB7049B01C19B33E32804F0B");

        let mac = generate_cbc_mac(&key, &data, PaddingMode::Method1, 8, MacAlgorithm::Des)?;
        assert_eq!(mac, hex!("AE2F498F76ED92F2"));
        Ok(())
    }

    #[test]
    fn test_cbc_mac_truncates() -> Result<(), KeyBlockError> {
        let key = hex!("AB94FDECF2674FDFB9B391F85D7F76F2");
        let data = hex!("781723860C06C2264608F919887022120B795240CB7049B01C19B33E32804F0B");

        let mac = generate_cbc_mac(&key, &data, PaddingMode::Method1, 4, MacAlgorithm::Des)?;
        assert_eq!(mac, hex!("AE2F498F"));
        Ok(())
    }

    #[test]
    fn test_cbc_mac_zero_length_selects_block_size() -> Result<(), KeyBlockError> {
        let key = [0x11u8; 16];
        let data = [0x22u8; 16];

        let des = generate_cbc_mac(&key, &data, PaddingMode::Method1, 0, MacAlgorithm::Des)?;
        assert_eq!(des.len(), 8);

        let aes = generate_cbc_mac(&key, &data, PaddingMode::Method1, 0, MacAlgorithm::Aes)?;
        assert_eq!(aes.len(), 16);
        Ok(())
    }

    #[test]
    fn test_cbc_mac_argument_policing() {
        assert!(matches!(
            generate_cbc_mac(&[], &[0u8; 8], PaddingMode::Method1, 8, MacAlgorithm::Des),
            Err(KeyBlockError::InvalidMacKey)
        ));
        assert!(matches!(
            generate_cbc_mac(&[0u8; 16], &[], PaddingMode::Method1, 8, MacAlgorithm::Des),
            Err(KeyBlockError::InvalidMacData)
        ));
        assert!(matches!(
            generate_cbc_mac(
                &[0u8; 16],
                &[0u8; 8],
                PaddingMode::Method1,
                9,
                MacAlgorithm::Des
            ),
            Err(KeyBlockError::InvalidMacLength { .. })
        ));
    }

    #[test]
    fn test_cbc_mac_composes_to_aes_cmac() -> Result<(), KeyBlockError> {
        // RFC 4493 example 2: CMAC of one aligned block is the CBC-MAC of
        // the block XORed with subkey K1.
        use crate::core::operations::subkeys::derive_aes_subkeys;

        let key = hex!("2b7e151628aed2a6abf7158809cf4f3c");
        let msg = hex!("6bc1bee22e409f96e93d7e117393172a");
        let (k1, _) = derive_aes_subkeys(&key)?;

        let xored: Vec<u8> = msg.iter().zip(k1.iter()).map(|(m, k)| m ^ k).collect();
        let mac = generate_cbc_mac(&key, &xored, PaddingMode::Method1, 16, MacAlgorithm::Aes)?;
        assert_eq!(mac, hex!("070a16b46b4d4144f79bdd9dd04a287c"));
        Ok(())
    }

    #[test]
    fn test_retail_mac_icao_vectors() -> Result<(), KeyBlockError> {
        // ICAO 9303-11 secure messaging MAC examples (key split K1 || K2).
        let key = hex!("7962D9ECE03D1ACD4C76089DCE131543");
        let msg = hex!("72C29C2371CC9BDB65B779B8E8D37B29ECC154AA56A8799FAE2F498F76ED92F2");
        let mac = generate_retail_mac(&key[..8], &key[8..], &msg, PaddingMode::Method2, 8)?;
        assert_eq!(mac, hex!("5F1448EEA8AD90A7"));

        let key = hex!("F1CB1F1FB5ADF208806B89DC579DC1F8");
        let msg = hex!("887022120C06C2270CA4020C800000008709016375432908C044F6");
        let mac = generate_retail_mac(&key[..8], &key[8..], &msg, PaddingMode::Method2, 0)?;
        assert_eq!(mac, hex!("BF8B92D635FF24F8"));
        Ok(())
    }

    #[test]
    fn test_retail_mac_rejects_bad_keys() {
        assert!(matches!(
            generate_retail_mac(&[0u8; 16], &[0u8; 8], &[1], PaddingMode::Method2, 8),
            Err(KeyBlockError::RetailMacKeyLength(16))
        ));
    }
}

//! Error types for TR-31 key block operations.
//!
//! Two error kinds surface from this crate: [`HeaderError`] for structural
//! problems with the header or optional-block grammar, and [`KeyBlockError`]
//! for cryptographic or framing problems with a full key block.
//! Authentication failures are intentionally uninformative: a MAC mismatch
//! reports nothing about where or how the comparison failed.

use thiserror::Error;

use crate::core::version::KeyBlockVersion;

/// Errors raised while parsing or serializing a key block header.
#[derive(Debug, Error)]
pub enum HeaderError {
    /// The version ID character is not one of `A`, `B`, `C`, `D`.
    #[error("Version ID ({0}) is not supported.")]
    UnsupportedVersion(char),

    /// The key usage field is not 2 ASCII alphanumeric characters.
    #[error("Key usage ({0}) is invalid.")]
    InvalidKeyUsage(String),

    /// The algorithm field is not an ASCII alphanumeric character.
    #[error("Algorithm ({0}) is invalid.")]
    InvalidAlgorithm(char),

    /// The mode-of-use field is not an ASCII alphanumeric character.
    #[error("Mode of use ({0}) is invalid.")]
    InvalidModeOfUse(char),

    /// The version number field is not 2 ASCII alphanumeric characters.
    #[error("Version number ({0}) is invalid.")]
    InvalidVersionNum(String),

    /// The exportability field is not an ASCII alphanumeric character.
    #[error("Exportability ({0}) is invalid.")]
    InvalidExportability(char),

    /// The input is shorter than the 16-character fixed header.
    #[error("Header length ({0}) must be at least 16 characters.")]
    TooShort(usize),

    /// The 16-character fixed header contains non-alphanumeric characters.
    #[error("Header must be ASCII alphanumeric. Header: '{0}'")]
    NotAlphanumeric(String),

    /// The 2-digit optional block count is not numeric.
    #[error("Number of blocks ({0}) is invalid. Expecting 2 digits.")]
    InvalidBlockCount(String),

    /// More optional blocks than the 2-digit count field can express.
    #[error("Number of blocks ({0}) exceeds the limit of 99.")]
    TooManyBlocks(usize),

    /// An optional block ID is not 2 ASCII alphanumeric characters.
    #[error("Block ID ({0}) is invalid. Expecting 2 alphanumeric characters.")]
    InvalidBlockId(String),

    /// The `PB` pad block ID is reserved and cannot be set by callers.
    #[error("Block ID ({0}) is reserved for padding.")]
    ReservedBlockId(String),

    /// An optional block value contains non-printable ASCII.
    #[error("Block {0} data is invalid. Expecting ASCII printable characters.")]
    InvalidBlockData(String),

    /// An optional block length field is not valid hex of the expected width.
    #[error("Block {id} length ({field}) is malformed. Expecting hexchars.")]
    MalformedBlockLength { id: String, field: String },

    /// An extended length-of-length field decoded to zero.
    #[error("Block {0} length of length must not be 0.")]
    ZeroLengthOfLength(String),

    /// An encoded block length is smaller than the block frame overhead.
    #[error("Block {0} length does not include block ID and length.")]
    BlockLengthUnderflow(String),

    /// An optional block payload extends past the end of the block area.
    #[error("Block {id} data is malformed. Received {received}/{expected} characters.")]
    TruncatedBlockData {
        id: String,
        received: usize,
        expected: usize,
    },

    /// An optional block payload is too long for the extended length field.
    #[error("Block {0} length is too long.")]
    BlockTooLong(String),

    /// The serialized key block would exceed the 4-digit length field.
    #[error("Total key block length ({0}) exceeds limit of 9999.")]
    KeyBlockTooLong(usize),
}

/// Errors raised while wrapping or unwrapping a full key block.
#[derive(Debug, Error)]
pub enum KeyBlockError {
    /// A structural problem with the header or optional-block grammar.
    #[error(transparent)]
    Header(#[from] HeaderError),

    /// The KBPK was empty at construction.
    #[error("Key Block Protection Key (KBPK) cannot be empty.")]
    EmptyKbpk,

    /// The KBPK length is outside the allowed set for the key block version.
    #[error("KBPK length ({len}) is invalid for key block version {version}.")]
    InvalidKbpkLength {
        len: usize,
        version: KeyBlockVersion,
    },

    /// The 4-digit length field is missing or not numeric.
    #[error("Key block header length ({0}) is malformed. Expecting 4 digits.")]
    MalformedLengthField(String),

    /// The 4-digit length field disagrees with the actual input length.
    #[error("Key block header length ({header_len}) doesn't match input data length ({data_len}).")]
    LengthMismatch { header_len: usize, data_len: usize },

    /// The textual key block length is not a multiple of the cipher block size.
    #[error("Key block length ({len}) must be multiple of {block_size} for key block version {version}.")]
    UnalignedKeyBlock {
        len: usize,
        block_size: usize,
        version: KeyBlockVersion,
    },

    /// The key block is too short to carry a MAC and at least one cipher block.
    #[error("Key block MAC is malformed.")]
    MalformedMac,

    /// The trailing MAC characters are not valid hex.
    #[error("Key block MAC must be valid hexchars. MAC: '{0}'")]
    NonHexMac(String),

    /// The encrypted key characters are not valid hex.
    #[error("Encrypted key must be valid hexchars.")]
    NonHexKeyData,

    /// The encrypted key data is empty or not a multiple of the block size.
    #[error("Encrypted key is malformed.")]
    MalformedEncryptedKey,

    /// The recomputed MAC disagrees with the received MAC.
    #[error("Key block MAC doesn't match generated MAC.")]
    MacMismatch,

    /// The decrypted key length is not a whole number of bytes.
    #[error("Decrypted key is invalid.")]
    InvalidDecryptedKey,

    /// The decrypted key length field overflows the decrypted data.
    #[error("Decrypted key is malformed.")]
    MalformedDecryptedKey,

    /// A MAC was requested with an empty key.
    #[error("Invalid key.")]
    InvalidMacKey,

    /// A MAC was requested over empty data.
    #[error("Invalid data.")]
    InvalidMacData,

    /// A MAC output length exceeds the cipher block size.
    #[error("MAC length ({length}) must not exceed the cipher block size ({block_size}).")]
    InvalidMacLength { length: usize, block_size: usize },

    /// A TDES key has a length other than 8, 16 or 24 bytes.
    #[error("TDES key must be 8, 16 or 24 bytes. Got {0}.")]
    TdesKeyLength(usize),

    /// An AES key has a length other than 16, 24 or 32 bytes.
    #[error("AES key must be 16, 24 or 32 bytes. Got {0}.")]
    AesKeyLength(usize),

    /// A retail MAC key has a length other than 8 bytes.
    #[error("Retail MAC keys must be 8 bytes. Got {0}.")]
    RetailMacKeyLength(usize),

    /// An IV does not match the cipher block size.
    #[error("IV length ({len}) must equal the cipher block size ({block_size}).")]
    InvalidIvLength { len: usize, block_size: usize },

    /// Cipher input is not a whole number of blocks.
    #[error("Data length ({len}) must be a multiple of the cipher block size ({block_size}).")]
    UnalignedData { len: usize, block_size: usize },

    /// The operating system random source failed.
    #[error("Random pad generation failed.")]
    RandomSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_error_display() {
        let err = HeaderError::UnsupportedVersion('Z');
        assert_eq!(err.to_string(), "Version ID (Z) is not supported.");

        let err = HeaderError::InvalidBlockId("k*".to_string());
        assert_eq!(
            err.to_string(),
            "Block ID (k*) is invalid. Expecting 2 alphanumeric characters."
        );

        let err = HeaderError::KeyBlockTooLong(10_240);
        assert_eq!(
            err.to_string(),
            "Total key block length (10240) exceeds limit of 9999."
        );
    }

    #[test]
    fn test_key_block_error_display() {
        let err = KeyBlockError::MacMismatch;
        assert_eq!(err.to_string(), "Key block MAC doesn't match generated MAC.");

        let err = KeyBlockError::LengthMismatch {
            header_len: 81,
            data_len: 80,
        };
        assert_eq!(
            err.to_string(),
            "Key block header length (81) doesn't match input data length (80)."
        );
    }

    #[test]
    fn test_header_error_converts_to_key_block_error() {
        let err: KeyBlockError = HeaderError::UnsupportedVersion('Z').into();
        assert_eq!(err.to_string(), "Version ID (Z) is not supported.");
        assert!(matches!(
            err,
            KeyBlockError::Header(HeaderError::UnsupportedVersion('Z'))
        ));
    }
}

//! Key block header: six fixed fields plus the optional block area.
//!
//! Serialized form (16 characters, then blocks):
//!
//! ```text
//! version ‖ length(4) ‖ key usage(2) ‖ algorithm ‖ mode of use ‖
//! key version(2) ‖ exportability ‖ block count(2) ‖ reserved(2) ‖ blocks
//! ```
//!
//! The length field counts the whole textual key block, so the header can
//! only be serialized once the padded key length is known.

use crate::core::error::HeaderError;
use crate::core::types::blocks::OptionalBlocks;
use crate::core::version::KeyBlockVersion;

fn require_alphanumeric_2(value: &str) -> bool {
    value.len() == 2 && value.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// A TR-31 key block header.
///
/// Field values other than the version ID are opaque to this crate; they are
/// validated against the header alphabet, not against usage tables.
///
/// # Example
///
/// ```rust
/// use tr31::{Header, KeyBlockVersion};
///
/// let mut header = Header::new(KeyBlockVersion::B, "P0", 'T', 'E', "00", 'E')?;
/// header.blocks_mut().insert("KS", "00604B120F9292800000")?;
/// assert_eq!(header.version(), KeyBlockVersion::B);
/// # Ok::<(), tr31::HeaderError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    version: KeyBlockVersion,
    key_usage: String,
    algorithm: char,
    mode_of_use: char,
    version_num: String,
    exportability: char,
    reserved: String,
    blocks: OptionalBlocks,
}

impl Default for Header {
    /// The header the Go reference calls the default: version B, opaque
    /// usage, non-exportable.
    fn default() -> Self {
        Self {
            version: KeyBlockVersion::B,
            key_usage: "00".to_string(),
            algorithm: '0',
            mode_of_use: '0',
            version_num: "00".to_string(),
            exportability: 'N',
            reserved: "00".to_string(),
            blocks: OptionalBlocks::new(),
        }
    }
}

impl Header {
    /// Creates a header from its fixed fields, validating each.
    pub fn new(
        version: KeyBlockVersion,
        key_usage: &str,
        algorithm: char,
        mode_of_use: char,
        version_num: &str,
        exportability: char,
    ) -> Result<Self, HeaderError> {
        let mut header = Self {
            version,
            ..Self::default()
        };
        header.set_key_usage(key_usage)?;
        header.set_algorithm(algorithm)?;
        header.set_mode_of_use(mode_of_use)?;
        header.set_version_num(version_num)?;
        header.set_exportability(exportability)?;
        Ok(header)
    }

    // =========================================================================
    // Field access
    // =========================================================================

    #[must_use]
    pub fn version(&self) -> KeyBlockVersion {
        self.version
    }

    #[must_use]
    pub fn key_usage(&self) -> &str {
        &self.key_usage
    }

    #[must_use]
    pub fn algorithm(&self) -> char {
        self.algorithm
    }

    #[must_use]
    pub fn mode_of_use(&self) -> char {
        self.mode_of_use
    }

    #[must_use]
    pub fn version_num(&self) -> &str {
        &self.version_num
    }

    #[must_use]
    pub fn exportability(&self) -> char {
        self.exportability
    }

    #[must_use]
    pub fn reserved(&self) -> &str {
        &self.reserved
    }

    /// The optional blocks of this header.
    #[must_use]
    pub fn blocks(&self) -> &OptionalBlocks {
        &self.blocks
    }

    /// Mutable access to the optional blocks.
    pub fn blocks_mut(&mut self) -> &mut OptionalBlocks {
        &mut self.blocks
    }

    pub fn set_version(&mut self, version: KeyBlockVersion) {
        self.version = version;
    }

    pub fn set_key_usage(&mut self, key_usage: &str) -> Result<(), HeaderError> {
        if !require_alphanumeric_2(key_usage) {
            return Err(HeaderError::InvalidKeyUsage(key_usage.to_string()));
        }
        self.key_usage = key_usage.to_string();
        Ok(())
    }

    pub fn set_algorithm(&mut self, algorithm: char) -> Result<(), HeaderError> {
        if !algorithm.is_ascii_alphanumeric() {
            return Err(HeaderError::InvalidAlgorithm(algorithm));
        }
        self.algorithm = algorithm;
        Ok(())
    }

    pub fn set_mode_of_use(&mut self, mode_of_use: char) -> Result<(), HeaderError> {
        if !mode_of_use.is_ascii_alphanumeric() {
            return Err(HeaderError::InvalidModeOfUse(mode_of_use));
        }
        self.mode_of_use = mode_of_use;
        Ok(())
    }

    pub fn set_version_num(&mut self, version_num: &str) -> Result<(), HeaderError> {
        if !require_alphanumeric_2(version_num) {
            return Err(HeaderError::InvalidVersionNum(version_num.to_string()));
        }
        self.version_num = version_num.to_string();
        Ok(())
    }

    pub fn set_exportability(&mut self, exportability: char) -> Result<(), HeaderError> {
        if !exportability.is_ascii_alphanumeric() {
            return Err(HeaderError::InvalidExportability(exportability));
        }
        self.exportability = exportability;
        Ok(())
    }

    // =========================================================================
    // Codec
    // =========================================================================

    /// Serializes the header for a key field of `key_len` bytes (the padded,
    /// masked length, not the raw key length).
    ///
    /// # Errors
    ///
    /// Fails when the total key block would exceed 9999 characters or the
    /// block area cannot be framed.
    pub(crate) fn dump(&self, key_len: usize) -> Result<String, HeaderError> {
        let block_size = self.version.algo_block_size();
        let pad_len = block_size - ((2 + key_len) % block_size);
        let (blocks_num, block_area) = self.blocks.dump(block_size)?;

        let total = 16
            + 4
            + 2 * key_len
            + 2 * pad_len
            + 2 * self.version.mac_len()
            + block_area.len();
        if total > 9999 {
            return Err(HeaderError::KeyBlockTooLong(total));
        }

        Ok(format!(
            "{}{:04}{}{}{}{}{}{:02}{}{}",
            self.version,
            total,
            self.key_usage,
            self.algorithm,
            self.mode_of_use,
            self.version_num,
            self.exportability,
            blocks_num,
            self.reserved,
            block_area
        ))
    }

    /// Parses a header from the start of `input`.
    ///
    /// Returns the header and the number of characters consumed (16 plus the
    /// block area). The 4-digit length field is not interpreted here; the key
    /// block façade checks it against the input length.
    pub fn load(input: &str) -> Result<(Self, usize), HeaderError> {
        let bytes = input.as_bytes();
        if bytes.len() < 16 {
            return Err(HeaderError::TooShort(bytes.len()));
        }
        let prefix = &bytes[..16];
        if !prefix.iter().all(u8::is_ascii_alphanumeric) {
            return Err(HeaderError::NotAlphanumeric(
                String::from_utf8_lossy(prefix).into_owned(),
            ));
        }

        let mut header = Self {
            version: KeyBlockVersion::try_from(bytes[0] as char)?,
            ..Self::default()
        };
        header.set_key_usage(&input[5..7])?;
        header.set_algorithm(bytes[7] as char)?;
        header.set_mode_of_use(bytes[8] as char)?;
        header.set_version_num(&input[9..11])?;
        header.set_exportability(bytes[11] as char)?;
        header.reserved = input[14..16].to_string();

        if !bytes[12..14].iter().all(u8::is_ascii_digit) {
            return Err(HeaderError::InvalidBlockCount(input[12..14].to_string()));
        }
        let blocks_num = usize::from(bytes[12] - b'0') * 10 + usize::from(bytes[13] - b'0');

        let (blocks, blocks_len) = OptionalBlocks::load(blocks_num, &bytes[16..])?;
        header.blocks = blocks;

        Ok((header, 16 + blocks_len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_validates_fields() {
        assert!(Header::new(KeyBlockVersion::B, "P0", 'T', 'E', "00", 'E').is_ok());

        let result = Header::new(KeyBlockVersion::B, "P", 'T', 'E', "00", 'E');
        assert!(matches!(result, Err(HeaderError::InvalidKeyUsage(_))));

        let result = Header::new(KeyBlockVersion::B, "P0", '*', 'E', "00", 'E');
        assert!(matches!(result, Err(HeaderError::InvalidAlgorithm('*'))));

        let result = Header::new(KeyBlockVersion::B, "P0", 'T', 'E', "0!", 'E');
        assert!(matches!(result, Err(HeaderError::InvalidVersionNum(_))));
    }

    #[test]
    fn test_dump_fixed_fields() -> Result<(), HeaderError> {
        let header = Header::new(KeyBlockVersion::B, "P0", 'T', 'E', "00", 'E')?;

        // 16 header + 48 hex characters of 24-byte key field + 16 hex MAC.
        let dumped = header.dump(16)?;
        assert_eq!(dumped, "B0080P0TE00E0000");
        Ok(())
    }

    #[test]
    fn test_dump_counts_blocks_in_length() -> Result<(), HeaderError> {
        let mut header = Header::new(KeyBlockVersion::B, "P0", 'T', 'E', "00", 'E')?;
        header.blocks_mut().insert("KS", "0123")?;

        let dumped = header.dump(16)?;
        // One aligned 8-character block raises the total from 80 to 88.
        assert_eq!(dumped, "B0088P0TE00E0100KS080123");
        Ok(())
    }

    #[test]
    fn test_dump_rejects_oversized_key_block() -> Result<(), HeaderError> {
        let header = Header::new(KeyBlockVersion::D, "P0", 'A', 'E', "00", 'E')?;
        let result = header.dump(5_000);
        assert!(matches!(result, Err(HeaderError::KeyBlockTooLong(_))));
        Ok(())
    }

    #[test]
    fn test_load_round_trips_dump() -> Result<(), HeaderError> {
        let mut header = Header::new(KeyBlockVersion::D, "P0", 'A', 'E', "01", 'S')?;
        header.blocks_mut().insert("KS", "00604B120F9292800000")?;
        header.blocks_mut().insert("TS", "1234")?;

        let dumped = header.dump(32)?;
        let (parsed, consumed) = Header::load(&dumped)?;

        assert_eq!(consumed, dumped.len());
        assert_eq!(parsed, header);
        Ok(())
    }

    #[test]
    fn test_load_field_positions() -> Result<(), HeaderError> {
        let (header, consumed) = Header::load("B0080P0TE00E0000")?;
        assert_eq!(consumed, 16);
        assert_eq!(header.version(), KeyBlockVersion::B);
        assert_eq!(header.key_usage(), "P0");
        assert_eq!(header.algorithm(), 'T');
        assert_eq!(header.mode_of_use(), 'E');
        assert_eq!(header.version_num(), "00");
        assert_eq!(header.exportability(), 'E');
        assert_eq!(header.reserved(), "00");
        assert!(header.blocks().is_empty());
        Ok(())
    }

    #[test]
    fn test_load_rejects_unsupported_version() {
        let result = Header::load("Z0080P0TE00E0000");
        assert!(matches!(result, Err(HeaderError::UnsupportedVersion('Z'))));
    }

    #[test]
    fn test_load_rejects_short_input() {
        let result = Header::load("B0080P0TE00");
        assert!(matches!(result, Err(HeaderError::TooShort(11))));
    }

    #[test]
    fn test_load_rejects_non_alphanumeric_prefix() {
        let result = Header::load("B0080P0TE00E00*0");
        assert!(matches!(result, Err(HeaderError::NotAlphanumeric(_))));
    }

    #[test]
    fn test_load_rejects_bad_block_count() {
        // Prefix check runs first, so the count must be alphanumeric but
        // non-numeric to reach the count validation.
        let result = Header::load("B0080P0TE00E0A00");
        assert!(matches!(result, Err(HeaderError::InvalidBlockCount(_))));
    }

    #[test]
    fn test_load_extended_block_round_trip() -> Result<(), HeaderError> {
        let payload = "A".repeat(600);
        let mut header = Header::new(KeyBlockVersion::B, "P0", 'T', 'E', "00", 'E')?;
        header.blocks_mut().insert("TC", &payload)?;

        let dumped = header.dump(16)?;
        let (parsed, _) = Header::load(&dumped)?;
        assert_eq!(parsed.blocks().get("TC"), Some(payload.as_str()));
        Ok(())
    }
}

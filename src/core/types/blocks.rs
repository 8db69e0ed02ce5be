//! Optional header blocks.
//!
//! A key block header may carry typed metadata records after the 16 fixed
//! characters. Each block is a 2-character alphanumeric ID followed by a
//! length field and a printable-ASCII payload. Blocks serialize in ascending
//! ID order; a synthetic `PB` pad block aligns the block area to the cipher
//! block size and is never visible through this type.

use std::collections::BTreeMap;

use crate::core::error::HeaderError;

/// ID of the synthetic pad block.
pub(crate) const PAD_BLOCK_ID: &str = "PB";

/// Longest payload an extended-length block can frame.
const MAX_EXTENDED_PAYLOAD: usize = 0xFFFF - 10;

pub(crate) fn is_printable_ascii(byte: u8) -> bool {
    (0x20..=0x7E).contains(&byte)
}

/// Parses a fixed-width ASCII hex field into its value.
fn parse_hex_field(bytes: &[u8]) -> Option<usize> {
    if bytes.is_empty() {
        return None;
    }
    let mut value = 0usize;
    for &byte in bytes {
        let digit = (byte as char).to_digit(16)? as usize;
        value = value.checked_mul(16)?.checked_add(digit)?;
    }
    Some(value)
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// The optional blocks of a key block header.
///
/// # Example
///
/// ```rust
/// use tr31::OptionalBlocks;
///
/// let mut blocks = OptionalBlocks::new();
/// blocks.insert("KS", "00604B120F9292800000")?;
/// assert_eq!(blocks.get("KS"), Some("00604B120F9292800000"));
/// assert_eq!(blocks.len(), 1);
/// # Ok::<(), tr31::HeaderError>(())
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OptionalBlocks {
    blocks: BTreeMap<String, String>,
}

impl OptionalBlocks {
    /// Creates an empty block set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blocks in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Returns the payload of the block with the given ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&str> {
        self.blocks.get(id).map(String::as_str)
    }

    /// Whether a block with the given ID is present.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.blocks.contains_key(id)
    }

    /// Iterates over `(id, payload)` pairs in ascending ID order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.blocks
            .iter()
            .map(|(id, data)| (id.as_str(), data.as_str()))
    }

    /// Inserts a block, returning any payload it replaces.
    ///
    /// # Errors
    ///
    /// Rejects IDs that are not 2 alphanumeric characters, the reserved `PB`
    /// ID, and payloads containing non-printable ASCII.
    pub fn insert(&mut self, id: &str, data: &str) -> Result<Option<String>, HeaderError> {
        if id.len() != 2 || !id.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(HeaderError::InvalidBlockId(id.to_string()));
        }
        if id == PAD_BLOCK_ID {
            return Err(HeaderError::ReservedBlockId(id.to_string()));
        }
        if !data.bytes().all(is_printable_ascii) {
            return Err(HeaderError::InvalidBlockData(id.to_string()));
        }
        Ok(self.blocks.insert(id.to_string(), data.to_string()))
    }

    /// Removes a block, returning its payload.
    pub fn remove(&mut self, id: &str) -> Option<String> {
        self.blocks.remove(id)
    }

    /// Serializes the block area, aligning it to `algo_block_size`.
    ///
    /// Returns the emitted block count (including a `PB` pad block when one
    /// was appended) and the serialized area. Blocks whose framed length fits
    /// in 2 hex characters use the short form `ID ‖ len`; longer blocks use
    /// the extended form `ID ‖ "00" ‖ LL ‖ len` where `LL` counts the hex
    /// characters of `len` and `len` counts the whole block.
    pub(crate) fn dump(&self, algo_block_size: usize) -> Result<(usize, String), HeaderError> {
        let mut area = String::new();
        for (id, data) in &self.blocks {
            area.push_str(id);
            if data.len() + 4 <= 0xFF {
                area.push_str(&format!("{:02X}", data.len() + 4));
            } else {
                if data.len() > MAX_EXTENDED_PAYLOAD {
                    return Err(HeaderError::BlockTooLong(id.clone()));
                }
                area.push_str(&format!("0004{:04X}", data.len() + 10));
            }
            area.push_str(data);
        }

        let mut count = self.blocks.len();
        if !area.is_empty() && algo_block_size > 0 && area.len() % algo_block_size != 0 {
            let pad_num = algo_block_size - ((area.len() + 4) % algo_block_size);
            area.push_str(PAD_BLOCK_ID);
            area.push_str(&format!("{:02X}", 4 + pad_num));
            area.extend(std::iter::repeat('0').take(pad_num));
            count += 1;
        }

        if count > 99 {
            return Err(HeaderError::TooManyBlocks(count));
        }
        Ok((count, area))
    }

    /// Parses `count` blocks from the start of `area`.
    ///
    /// Returns the block set and the number of bytes consumed. `PB` pad
    /// blocks are consumed and discarded.
    pub(crate) fn load(count: usize, area: &[u8]) -> Result<(Self, usize), HeaderError> {
        let mut blocks = BTreeMap::new();
        let mut i = 0;

        for _ in 0..count {
            if area.len() < i + 2 {
                return Err(HeaderError::InvalidBlockId(lossy(&area[i..])));
            }
            let id_bytes = &area[i..i + 2];
            if !id_bytes.iter().all(u8::is_ascii_alphanumeric) {
                return Err(HeaderError::InvalidBlockId(lossy(id_bytes)));
            }
            let id = lossy(id_bytes);
            i += 2;

            if area.len() < i + 2 {
                return Err(HeaderError::MalformedBlockLength {
                    id,
                    field: lossy(&area[i..]),
                });
            }
            let short_len =
                parse_hex_field(&area[i..i + 2]).ok_or_else(|| HeaderError::MalformedBlockLength {
                    id: id.clone(),
                    field: lossy(&area[i..i + 2]),
                })?;
            i += 2;

            let data_len = if short_len == 0 {
                // Extended form: 2-char length-of-length, then the length
                // field itself. The encoded length covers the whole block.
                if area.len() < i + 2 {
                    return Err(HeaderError::MalformedBlockLength {
                        id,
                        field: lossy(&area[i..]),
                    });
                }
                let len_of_len = parse_hex_field(&area[i..i + 2]).ok_or_else(|| {
                    HeaderError::MalformedBlockLength {
                        id: id.clone(),
                        field: lossy(&area[i..i + 2]),
                    }
                })?;
                i += 2;
                if len_of_len == 0 {
                    return Err(HeaderError::ZeroLengthOfLength(id));
                }
                if area.len() < i + len_of_len {
                    return Err(HeaderError::MalformedBlockLength {
                        id,
                        field: lossy(&area[i..]),
                    });
                }
                let block_len = parse_hex_field(&area[i..i + len_of_len]).ok_or_else(|| {
                    HeaderError::MalformedBlockLength {
                        id: id.clone(),
                        field: lossy(&area[i..i + len_of_len]),
                    }
                })?;
                i += len_of_len;

                block_len
                    .checked_sub(4 + 2 + len_of_len)
                    .ok_or_else(|| HeaderError::BlockLengthUnderflow(id.clone()))?
            } else {
                short_len
                    .checked_sub(4)
                    .ok_or_else(|| HeaderError::BlockLengthUnderflow(id.clone()))?
            };

            if area.len() < i + data_len {
                return Err(HeaderError::TruncatedBlockData {
                    id,
                    received: area.len() - i,
                    expected: data_len,
                });
            }
            let data = &area[i..i + data_len];
            if !data.iter().copied().all(is_printable_ascii) {
                return Err(HeaderError::InvalidBlockData(id));
            }
            i += data_len;

            if id != PAD_BLOCK_ID {
                blocks.insert(id, lossy(data));
            }
        }

        Ok((Self { blocks }, i))
    }
}

//! The key block façade: wrap and unwrap under a KBPK.

use core::fmt::{self, Debug};

use zeroize::Zeroizing;

use crate::core::error::KeyBlockError;
use crate::core::operations::wrap::{derivation, derivation_aes, variant};
use crate::core::types::header::Header;
use crate::core::version::KeyBlockVersion;

/// Default masked key length per wrapped-key algorithm tag.
///
/// Wrapping pads the key field to the algorithm's largest key size, so the
/// ciphertext length does not reveal the key length. Unknown tags get no
/// masking.
fn default_masked_len(algorithm: char, key_len: usize) -> usize {
    match algorithm {
        // TDES and DES
        'T' | 'D' => 24,
        // AES
        'A' => 32,
        _ => key_len,
    }
}

/// Wraps and unwraps keys under a Key Block Protection Key.
///
/// Both operations are pure functions over the immutable KBPK and header:
/// wrapping twice yields different pads (and therefore different text), and
/// unwrapping parses its own header from the input.
///
/// # Security
///
/// - The KBPK is zeroized on drop and never serialized
/// - Working keys and cleartext key data are zeroized on all exit paths
/// - MAC verification is constant time
///
/// # Example
///
/// ```rust
/// use tr31::{Header, KeyBlock, KeyBlockVersion};
///
/// let kbpk = [0x35u8; 16];
/// let header = Header::new(KeyBlockVersion::B, "P0", 'T', 'E', "00", 'E')?;
/// let key_block = KeyBlock::with_header(kbpk.to_vec(), header)?;
///
/// let wrapped = key_block.wrap(&[0xABu8; 16], None)?;
/// assert!(wrapped.starts_with("B0096P0TE00E0000"));
///
/// let (key, parsed) = key_block.unwrap(&wrapped)?;
/// assert_eq!(&key[..], &[0xABu8; 16]);
/// assert_eq!(parsed.key_usage(), "P0");
/// # Ok::<(), tr31::KeyBlockError>(())
/// ```
pub struct KeyBlock {
    kbpk: Zeroizing<Vec<u8>>,
    header: Header,
}

impl Debug for KeyBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyBlock")
            .field("kbpk", &"[REDACTED]")
            .field("header", &self.header)
            .finish()
    }
}

impl KeyBlock {
    /// Creates a key block façade with the default header.
    ///
    /// # Errors
    ///
    /// Fails when the KBPK is empty. Length policing against the header's
    /// version happens at wrap/unwrap time.
    pub fn new(kbpk: impl Into<Vec<u8>>) -> Result<Self, KeyBlockError> {
        Self::with_header(kbpk, Header::default())
    }

    /// Creates a key block façade with an explicit header.
    pub fn with_header(kbpk: impl Into<Vec<u8>>, header: Header) -> Result<Self, KeyBlockError> {
        let kbpk = Zeroizing::new(kbpk.into());
        if kbpk.is_empty() {
            return Err(KeyBlockError::EmptyKbpk);
        }
        Ok(Self { kbpk, header })
    }

    /// The header used when wrapping.
    #[must_use]
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Mutable access to the wrapping header, e.g. to add optional blocks.
    pub fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    /// Wraps `key` into a textual key block.
    ///
    /// `masked_key_len` pads the encrypted key field as if the key were that
    /// long, hiding the true length; it is raised to at least the key length.
    /// When `None`, the largest key size of the header's algorithm tag is
    /// used (24 for `T`/`D`, 32 for `A`, otherwise no masking).
    ///
    /// # Errors
    ///
    /// Fails when the KBPK length is not allowed for the header's version or
    /// the resulting key block would exceed 9999 characters.
    pub fn wrap(&self, key: &[u8], masked_key_len: Option<usize>) -> Result<String, KeyBlockError> {
        let masked_key_len = masked_key_len
            .unwrap_or_else(|| default_masked_len(self.header.algorithm(), key.len()))
            .max(key.len());
        let extra_pad = masked_key_len - key.len();

        let header = self.header.dump(masked_key_len)?;
        let version = self.header.version();
        match version {
            KeyBlockVersion::A | KeyBlockVersion::C => {
                variant::wrap(&self.kbpk, version, &header, key, extra_pad)
            }
            KeyBlockVersion::B => derivation::wrap(&self.kbpk, &header, key, extra_pad),
            KeyBlockVersion::D => derivation_aes::wrap(&self.kbpk, &header, key, extra_pad),
        }
    }

    /// Unwraps a textual key block, returning the key and the parsed header.
    ///
    /// # Errors
    ///
    /// Fails with a [`crate::HeaderError`] when the header or block grammar
    /// is malformed, and with a [`KeyBlockError`] when the framing or
    /// authentication of the key block is wrong. MAC and decryption failures
    /// are indistinguishable.
    pub fn unwrap(
        &self,
        key_block: &str,
    ) -> Result<(Zeroizing<Vec<u8>>, Header), KeyBlockError> {
        if key_block.len() < 5 {
            return Err(KeyBlockError::MalformedLengthField(key_block.to_string()));
        }
        let (header, header_len) = Header::load(key_block)?;

        // The fixed header is ASCII, so byte positions 1..5 are characters.
        let bytes = key_block.as_bytes();
        let length_field = &key_block[1..5];
        if !bytes[1..5].iter().all(u8::is_ascii_digit) {
            return Err(KeyBlockError::MalformedLengthField(length_field.to_string()));
        }
        let declared: usize = length_field
            .parse()
            .map_err(|_| KeyBlockError::MalformedLengthField(length_field.to_string()))?;
        if declared != bytes.len() {
            return Err(KeyBlockError::LengthMismatch {
                header_len: declared,
                data_len: bytes.len(),
            });
        }

        let version = header.version();
        let block_size = version.algo_block_size();
        if bytes.len() % block_size != 0 {
            return Err(KeyBlockError::UnalignedKeyBlock {
                len: bytes.len(),
                block_size,
                version,
            });
        }

        let mac_chars = version.mac_len() * 2;
        let remainder = &bytes[header_len..];
        if remainder.len() <= mac_chars {
            return Err(KeyBlockError::MalformedMac);
        }
        let (cipher_hex, mac_hex) = remainder.split_at(remainder.len() - mac_chars);
        let received_mac = hex::decode(mac_hex).map_err(|_| {
            KeyBlockError::NonHexMac(String::from_utf8_lossy(mac_hex).into_owned())
        })?;
        let key_data = hex::decode(cipher_hex).map_err(|_| KeyBlockError::NonHexKeyData)?;

        // Everything up to the ciphertext was validated as ASCII.
        let header_str = &key_block[..header_len];
        let key = match version {
            KeyBlockVersion::A | KeyBlockVersion::C => {
                variant::unwrap(&self.kbpk, version, header_str, &key_data, &received_mac)?
            }
            KeyBlockVersion::B => {
                derivation::unwrap(&self.kbpk, header_str, &key_data, &received_mac)?
            }
            KeyBlockVersion::D => {
                derivation_aes::unwrap(&self.kbpk, header_str, &key_data, &received_mac)?
            }
        };
        Ok((key, header))
    }
}

//! Key block version identifiers and their cryptographic parameters.
//!
//! The version ID is the first character of every TR-31 key block and selects
//! the complete cryptographic profile: cipher family, block size, MAC length
//! and the set of acceptable KBPK sizes.

use core::fmt::{self, Display};
use core::str::FromStr;

use crate::core::error::HeaderError;

/// TR-31 key block version.
///
/// Each version binds the wrapped key to the header with a different
/// composition:
///
/// | Version | Cipher | Binding | MAC length |
/// |---------|--------|---------|------------|
/// | `A`     | TDES   | key variant | 4 |
/// | `B`     | TDES   | key derivation (CMAC) | 8 |
/// | `C`     | TDES   | key variant | 4 |
/// | `D`     | AES    | key derivation (CMAC) | 16 |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyBlockVersion {
    /// TDES key variant binding (legacy).
    A,
    /// TDES key derivation binding.
    B,
    /// TDES key variant binding.
    C,
    /// AES key derivation binding.
    D,
}

impl KeyBlockVersion {
    /// Block size in bytes of the underlying cipher.
    #[must_use]
    pub const fn algo_block_size(self) -> usize {
        match self {
            Self::A | Self::B | Self::C => 8,
            Self::D => 16,
        }
    }

    /// Length in bytes of the key block MAC.
    #[must_use]
    pub const fn mac_len(self) -> usize {
        match self {
            Self::A | Self::C => 4,
            Self::B => 8,
            Self::D => 16,
        }
    }

    /// KBPK sizes in bytes accepted by this version.
    #[must_use]
    pub const fn kbpk_lengths(self) -> &'static [usize] {
        match self {
            Self::A | Self::C => &[8, 16, 24],
            Self::B => &[16, 24],
            Self::D => &[16, 24, 32],
        }
    }

    /// Whether `len` is an acceptable KBPK size for this version.
    #[must_use]
    pub fn allows_kbpk_len(self, len: usize) -> bool {
        self.kbpk_lengths().contains(&len)
    }

    /// The single-character version ID.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
        }
    }
}

impl Display for KeyBlockVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl TryFrom<char> for KeyBlockVersion {
    type Error = HeaderError;

    fn try_from(id: char) -> Result<Self, Self::Error> {
        match id {
            'A' => Ok(Self::A),
            'B' => Ok(Self::B),
            'C' => Ok(Self::C),
            'D' => Ok(Self::D),
            other => Err(HeaderError::UnsupportedVersion(other)),
        }
    }
}

impl FromStr for KeyBlockVersion {
    type Err = HeaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(id), None) => Self::try_from(id),
            _ => Err(HeaderError::UnsupportedVersion(
                s.chars().next().unwrap_or('?'),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_sizes() {
        assert_eq!(KeyBlockVersion::A.algo_block_size(), 8);
        assert_eq!(KeyBlockVersion::B.algo_block_size(), 8);
        assert_eq!(KeyBlockVersion::C.algo_block_size(), 8);
        assert_eq!(KeyBlockVersion::D.algo_block_size(), 16);
    }

    #[test]
    fn test_mac_lengths() {
        assert_eq!(KeyBlockVersion::A.mac_len(), 4);
        assert_eq!(KeyBlockVersion::B.mac_len(), 8);
        assert_eq!(KeyBlockVersion::C.mac_len(), 4);
        assert_eq!(KeyBlockVersion::D.mac_len(), 16);
    }

    #[test]
    fn test_kbpk_length_policing() {
        assert!(KeyBlockVersion::A.allows_kbpk_len(8));
        assert!(!KeyBlockVersion::B.allows_kbpk_len(8));
        assert!(KeyBlockVersion::B.allows_kbpk_len(24));
        assert!(KeyBlockVersion::D.allows_kbpk_len(32));
        assert!(!KeyBlockVersion::D.allows_kbpk_len(8));
    }

    #[test]
    fn test_round_trip_through_char() -> Result<(), HeaderError> {
        for version in [
            KeyBlockVersion::A,
            KeyBlockVersion::B,
            KeyBlockVersion::C,
            KeyBlockVersion::D,
        ] {
            assert_eq!(KeyBlockVersion::try_from(version.as_char())?, version);
            assert_eq!(version.to_string().parse::<KeyBlockVersion>()?, version);
        }
        Ok(())
    }

    #[test]
    fn test_unsupported_version() {
        let result = KeyBlockVersion::try_from('Z');
        assert!(matches!(result, Err(HeaderError::UnsupportedVersion('Z'))));

        let result = "BB".parse::<KeyBlockVersion>();
        assert!(matches!(result, Err(HeaderError::UnsupportedVersion('B'))));
    }
}

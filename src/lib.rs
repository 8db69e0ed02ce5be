//! ANSI TR-31 key block wrapping and unwrapping.
//!
//! TR-31 is the interchange format for symmetric keys in payment systems: a
//! key travels inside an authenticated, encrypted textual envelope together
//! with metadata describing its permitted usage, all protected by a Key
//! Block Protection Key (KBPK). This crate implements the codec: building
//! and parsing headers with optional blocks, and the wrap/unwrap pipelines
//! for key block versions A through D.
//!
//! # Quick Start
//!
//! ```rust
//! use tr31::{Header, KeyBlock, KeyBlockVersion};
//!
//! // A PIN encryption key protected by a 2-key TDES KBPK.
//! let kbpk = [0x35u8; 16];
//! let header = Header::new(KeyBlockVersion::B, "P0", 'T', 'E', "00", 'E')?;
//! let key_block = KeyBlock::with_header(kbpk.to_vec(), header)?;
//!
//! let key = [0xABu8; 16];
//! let wrapped = key_block.wrap(&key, None)?;
//! assert!(wrapped.starts_with("B0096P0TE00E0000"));
//!
//! let (unwrapped, header) = key_block.unwrap(&wrapped)?;
//! assert_eq!(&unwrapped[..], &key);
//! assert_eq!(header.key_usage(), "P0");
//! # Ok::<(), tr31::KeyBlockError>(())
//! ```
//!
//! # Key Block Versions
//!
//! | Version | Cipher | Binding method | MAC | KBPK sizes |
//! |---------|--------|----------------|-----|------------|
//! | `A` | TDES | key variant | 4 bytes | 8, 16, 24 |
//! | `B` | TDES | key derivation (CMAC) | 8 bytes | 16, 24 |
//! | `C` | TDES | key variant | 4 bytes | 8, 16, 24 |
//! | `D` | AES | key derivation (CMAC) | 16 bytes | 16, 24, 32 |
//!
//! Versions A and C exist for interchange with legacy systems; version D is
//! the current profile.
//!
//! # Security
//!
//! - KBPK, working keys, CMAC subkeys and cleartext key data are zeroized
//!   on drop, including error paths
//! - MAC comparison is constant time
//! - Pad bytes come from the operating system CSPRNG
//! - No unsafe code
//!
//! # Scope
//!
//! This is a pure codec: no network or storage I/O, no HSM integration, and
//! no key-usage policy enforcement beyond the header grammar.

#![forbid(unsafe_code)]

pub mod core;

// Re-export commonly used items at crate root
pub use core::error::{HeaderError, KeyBlockError};
pub use core::operations::{generate_cbc_mac, generate_retail_mac, MacAlgorithm, PaddingMode};
pub use core::types::{Header, KeyBlock, OptionalBlocks};
pub use core::version::KeyBlockVersion;

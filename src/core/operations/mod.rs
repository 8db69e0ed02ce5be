//! Cryptographic operations behind the key block codec.
//!
//! - [`padding`] - ISO/IEC 9797-1 padding methods 1, 2 and 3
//! - [`mac`] - CBC-MAC engine and the single-DES retail MAC
//! - [`cipher`] - TDES/AES ECB and CBC adapters (crate internal)
//! - [`subkeys`] - CMAC subkey derivation (crate internal)
//! - [`wrap`] - per-version wrap/unwrap pipelines (crate internal)

pub(crate) mod cipher;
pub mod mac;
pub mod padding;
pub(crate) mod subkeys;
pub(crate) mod wrap;

// Re-export commonly used items
pub use mac::{generate_cbc_mac, generate_retail_mac, MacAlgorithm};
pub use padding::PaddingMode;

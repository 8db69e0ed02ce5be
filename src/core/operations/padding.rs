//! ISO/IEC 9797-1 padding methods.
//!
//! All three methods operate on byte-aligned input and pad to a whole number
//! of cipher blocks. A `block_size` of zero selects the DES block size of 8.

/// ISO/IEC 9797-1 padding method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaddingMode {
    /// Method 1: append the minimum number of zero bytes to reach a block
    /// boundary; empty input becomes one block of zeros.
    Method1,
    /// Method 2: append a single `0x80` byte, then method 1.
    Method2,
    /// Method 3: prepend one block carrying the big-endian bit length of the
    /// input, then method-1-pad the input.
    Method3,
}

impl PaddingMode {
    /// Pads `data` to a multiple of `block_size` bytes.
    #[must_use]
    pub fn apply(self, data: &[u8], block_size: usize) -> Vec<u8> {
        let block_size = if block_size == 0 { 8 } else { block_size };
        match self {
            Self::Method1 => pad_method_1(data, block_size),
            Self::Method2 => {
                let mut marked = Vec::with_capacity(data.len() + block_size);
                marked.extend_from_slice(data);
                marked.push(0x80);
                pad_method_1(&marked, block_size)
            }
            Self::Method3 => {
                let mut padded = length_block(data.len(), block_size);
                padded.extend_from_slice(&pad_method_1(data, block_size));
                padded
            }
        }
    }
}

fn pad_method_1(data: &[u8], block_size: usize) -> Vec<u8> {
    let mut padded = data.to_vec();
    let remainder = padded.len() % block_size;
    if remainder > 0 {
        padded.resize(padded.len() + block_size - remainder, 0);
    }
    if padded.is_empty() {
        padded.resize(block_size, 0);
    }
    padded
}

fn length_block(data_len: usize, block_size: usize) -> Vec<u8> {
    let mut block = vec![0u8; block_size];
    let bit_len = (data_len as u64) * 8;
    if block_size < 8 {
        let bytes = (bit_len as u32).to_be_bytes();
        block[..4.min(block_size)].copy_from_slice(&bytes[..4.min(block_size)]);
    } else {
        block[..8].copy_from_slice(&bit_len.to_be_bytes());
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_1_aligns_to_block() {
        assert_eq!(
            PaddingMode::Method1.apply(&[0xAA; 5], 8),
            [0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_method_1_keeps_aligned_input() {
        let data = [0x11u8; 16];
        assert_eq!(PaddingMode::Method1.apply(&data, 8), data);
    }

    #[test]
    fn test_method_1_empty_input_becomes_one_block() {
        assert_eq!(PaddingMode::Method1.apply(&[], 8), [0u8; 8]);
        assert_eq!(PaddingMode::Method1.apply(&[], 16), [0u8; 16]);
    }

    #[test]
    fn test_method_2_appends_marker() {
        assert_eq!(
            PaddingMode::Method2.apply(&[0x01, 0x02], 8),
            [0x01, 0x02, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00]
        );
        // A full block still gains a whole padding block.
        assert_eq!(PaddingMode::Method2.apply(&[0x55; 8], 8).len(), 16);
    }

    #[test]
    fn test_method_3_prepends_bit_length() {
        let padded = PaddingMode::Method3.apply(&[0xFF; 3], 8);
        assert_eq!(padded.len(), 16);
        assert_eq!(&padded[..8], &[0, 0, 0, 0, 0, 0, 0, 24]);
        assert_eq!(&padded[8..11], &[0xFF; 3]);
        assert_eq!(&padded[11..], &[0; 5]);
    }

    #[test]
    fn test_zero_block_size_defaults_to_des() {
        assert_eq!(PaddingMode::Method1.apply(&[0x01], 0).len(), 8);
    }
}

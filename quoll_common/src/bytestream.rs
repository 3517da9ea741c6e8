//! Append-only little-endian byte buffer with random-access patching.
//!
//! Function bodies are assembled into per-function streams, then appended
//! into the shared program stream; forward jumps are resolved by
//! overwriting their placeholder operands in place.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteStream {
    data: Vec<u8>,
}

impl ByteStream {
    pub fn new() -> Self {
        ByteStream::default()
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        ByteStream { data }
    }

    pub fn add_8(&mut self, value: u8) {
        self.data.push(value);
    }

    pub fn add_16(&mut self, value: u16) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn add_32(&mut self, value: u32) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn append(&mut self, other: &ByteStream) {
        self.data.extend_from_slice(&other.data);
    }

    /// Pad with zero bytes until the size is a positive multiple of
    /// `multiple`. An empty stream is padded to `multiple` bytes.
    pub fn pad_to(&mut self, multiple: usize) {
        if multiple == 0 {
            return;
        }
        while self.data.is_empty() || self.data.len() % multiple != 0 {
            self.data.push(0);
        }
    }

    pub fn read_8(&self, at: usize) -> Option<u8> {
        self.data.get(at).copied()
    }

    pub fn read_16(&self, at: usize) -> Option<u16> {
        let bytes = self.data.get(at..at + 2)?;
        Some(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_32(&self, at: usize) -> Option<u32> {
        let bytes = self.data.get(at..at + 4)?;
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn overwrite_8(&mut self, at: usize, value: u8) {
        if let Some(slot) = self.data.get_mut(at) {
            *slot = value;
        }
    }

    pub fn overwrite_16(&mut self, at: usize, value: u16) {
        if let Some(slice) = self.data.get_mut(at..at + 2) {
            slice.copy_from_slice(&value.to_le_bytes());
        }
    }

    pub fn overwrite_32(&mut self, at: usize, value: u32) {
        if let Some(slice) = self.data.get_mut(at..at + 4) {
            slice.copy_from_slice(&value.to_le_bytes());
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn sixteen_bit_values_are_little_endian() {
        let mut bs = ByteStream::new();
        bs.add_16(1000);
        assert_eq!(bs.read_8(0), Some(232));
        assert_eq!(bs.read_16(0), Some(1000));
    }

    #[test]
    fn pad_never_shrinks_and_aligns() {
        let mut bs = ByteStream::new();
        bs.pad_to(4);
        assert_eq!(bs.size(), 4);
        bs.add_8(1);
        let before = bs.size();
        bs.pad_to(4);
        assert!(bs.size() >= before);
        assert_eq!(bs.size() % 4, 0);
        bs.pad_to(4);
        assert_eq!(bs.size(), 8);
    }

    #[test]
    fn append_concatenates_in_order() {
        let mut a = ByteStream::new();
        a.add_8(1);
        a.add_8(2);
        let mut b = ByteStream::new();
        b.add_8(3);
        a.append(&b);
        assert_eq!(a.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn overwrite_32_touches_exactly_four_bytes() {
        let mut bs = ByteStream::new();
        for _ in 0..8 {
            bs.add_8(0xAA);
        }
        bs.overwrite_32(2, 0x0403_0201);
        assert_eq!(bs.as_slice(), &[0xAA, 0xAA, 1, 2, 3, 4, 0xAA, 0xAA]);
    }

    #[test]
    fn reads_past_the_end_are_none() {
        let mut bs = ByteStream::new();
        bs.add_8(7);
        assert_eq!(bs.read_8(1), None);
        assert_eq!(bs.read_16(0), None);
        assert_eq!(bs.read_32(0), None);
    }

    proptest! {
        #[test]
        fn word_round_trip(values in proptest::collection::vec(any::<u32>(), 0..64)) {
            let mut bs = ByteStream::new();
            for v in &values {
                bs.add_32(*v);
            }
            for (i, v) in values.iter().enumerate() {
                prop_assert_eq!(bs.read_32(i * 4), Some(*v));
            }
        }

        #[test]
        fn pad_to_is_aligned(extra in 0usize..16, multiple in 1usize..9) {
            let mut bs = ByteStream::new();
            for i in 0..extra {
                bs.add_8(i as u8);
            }
            let before = bs.size();
            bs.pad_to(multiple);
            prop_assert!(bs.size() >= before);
            prop_assert_eq!(bs.size() % multiple, 0);
            prop_assert!(bs.size() > 0);
        }
    }
}

//! Constants of the binary gamefile layout shared by encoder and decoder.

/// Magic number at offset 0: "TRPG" read as a little-endian u32.
pub const FILETYPE_ID: u32 = 0x4750_5254;

/// Only format version 0 exists.
pub const FORMAT_VERSION: u32 = 0;

/// The fixed header occupies the first 64 bytes.
pub const HEADER_SIZE: usize = 64;

/// Every stored string is XOR'd byte-wise with this key.
pub const STRING_XOR_KEY: u8 = 0x7B;

/// Longest storable string body, in bytes (length prefix is a u16).
pub const MAX_STRING_BYTES: usize = u16::MAX as usize;

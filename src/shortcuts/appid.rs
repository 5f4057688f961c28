//! App id derivation for non-Steam shortcuts
//!
//! Steam names grid images and other per-shortcut files after a 64-bit id
//! computed from the shortcut's exe and name. The id must match Steam's own
//! value bit for bit, otherwise Steam never looks at the files we write.
//!
//! # Algorithm
//! 1. Concatenate exe path then display name
//! 2. CRC-32 (poly 0x04C11DB7, reflected in/out, init and xorout 0xFFFFFFFF)
//! 3. Set the top bit of the 32-bit checksum
//! 4. Place it in the upper half of a u64, lower half = 0x02000000

use super::record::encode_latin1;

/// Generator polynomial in normal (MSB-first) form
const CRC_POLY: u32 = 0x04C1_1DB7;
const CRC_INIT: u32 = 0xFFFF_FFFF;
const CRC_XOR_OUT: u32 = 0xFFFF_FFFF;

/// Flag Steam forces on in the upper 32 bits
const HIGH_BIT: u32 = 0x8000_0000;

/// Constant lower half of every shortcut id
pub const SHORTCUT_ID_LOW: u64 = 0x0200_0000;

/// Byte-wise lookup table for the reflected algorithm
const CRC_TABLE: [u32; 256] = build_table(CRC_POLY.reverse_bits());

const fn build_table(poly_reflected: u32) -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ poly_reflected
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// CRC-32 with reflected input and output
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = CRC_INIT;
    for &byte in data {
        let index = ((crc ^ u32::from(byte)) & 0xFF) as usize;
        crc = CRC_TABLE[index] ^ (crc >> 8);
    }
    crc ^ CRC_XOR_OUT
}

/// Derive the id from the raw bytes as they appear in the store
pub fn derive_app_id_bytes(display_name: &[u8], executable_path: &[u8]) -> u64 {
    let mut input = Vec::with_capacity(executable_path.len() + display_name.len());
    input.extend_from_slice(executable_path);
    input.extend_from_slice(display_name);

    let top = crc32(&input) | HIGH_BIT;
    (u64::from(top) << 32) | SHORTCUT_ID_LOW
}

/// Derive the id Steam assigns to a shortcut.
///
/// Strings are encoded one byte per char, matching how the parser decoded
/// them, so ids computed from parsed records hash Steam's original bytes.
pub fn derive_app_id(display_name: &str, executable_path: &str) -> u64 {
    derive_app_id_bytes(
        &encode_latin1(display_name),
        &encode_latin1(executable_path),
    )
}

use byteorder::{LittleEndian, WriteBytesExt};

use crate::version::{bitstream_version, DEFAULT_MESH_VERSION};

/// Growable output buffer. Fixed width values are written little endian.
///
/// Carries the bitstream version being written so that version dependent
/// fields match what a decoder of that version expects.
#[derive(Debug, Clone)]
pub struct EncoderBuffer {
    buffer: Vec<u8>,
    version_major: u8,
    version_minor: u8,
}

impl Default for EncoderBuffer {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl EncoderBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            version_major: DEFAULT_MESH_VERSION.0,
            version_minor: DEFAULT_MESH_VERSION.1,
        }
    }

    pub fn set_version(&mut self, major: u8, minor: u8) {
        self.version_major = major;
        self.version_minor = minor;
    }

    /// Version packed as `major << 8 | minor`.
    pub fn bitstream_version(&self) -> u16 {
        bitstream_version(self.version_major, self.version_minor)
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn data(&self) -> &[u8] {
        &self.buffer
    }

    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buffer
    }

    pub fn encode_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    pub fn encode_i8(&mut self, value: i8) {
        self.buffer.push(value as u8);
    }

    // Writes into a Vec<u8> cannot fail.
    pub fn encode_u16(&mut self, value: u16) {
        let _ = self.buffer.write_u16::<LittleEndian>(value);
    }

    pub fn encode_u32(&mut self, value: u32) {
        let _ = self.buffer.write_u32::<LittleEndian>(value);
    }

    pub fn encode_i32(&mut self, value: i32) {
        let _ = self.buffer.write_i32::<LittleEndian>(value);
    }

    pub fn encode_f32(&mut self, value: f32) {
        let _ = self.buffer.write_f32::<LittleEndian>(value);
    }

    /// LEB128 unsigned varint.
    pub fn encode_varint(&mut self, mut value: u64) {
        loop {
            let byte = (value & 0x7F) as u8;
            value >>= 7;
            if value == 0 {
                self.buffer.push(byte);
                break;
            }
            self.buffer.push(byte | 0x80);
        }
    }

    /// Signed varint: non-negative values map to even symbols, negative ones
    /// to odd symbols.
    pub fn encode_varint_signed_i32(&mut self, value: i32) {
        let symbol = if value >= 0 {
            (value as u32) << 1
        } else {
            ((-(value as i64) - 1) as u32) << 1 | 1
        };
        self.encode_varint(symbol as u64);
    }

    pub fn encode_data(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varint_layout() {
        let mut buffer = EncoderBuffer::new();
        buffer.encode_varint(0);
        buffer.encode_varint(127);
        buffer.encode_varint(128);
        buffer.encode_varint(300);
        assert_eq!(buffer.data(), &[0x00, 0x7F, 0x80, 0x01, 0xAC, 0x02]);
    }

    #[test]
    fn signed_symbols() {
        let mut buffer = EncoderBuffer::new();
        buffer.encode_varint_signed_i32(0);
        buffer.encode_varint_signed_i32(-1);
        buffer.encode_varint_signed_i32(1);
        buffer.encode_varint_signed_i32(-2);
        assert_eq!(buffer.data(), &[0, 1, 2, 3]);
    }

    #[test]
    fn fixed_width_is_little_endian() {
        let mut buffer = EncoderBuffer::new();
        buffer.encode_u32(0x0403_0201);
        buffer.encode_i32(-1);
        assert_eq!(buffer.data(), &[1, 2, 3, 4, 0xFF, 0xFF, 0xFF, 0xFF]);
    }
}

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::status::{CodecError, CodecResult};
use crate::version::{bitstream_version, DEFAULT_MESH_VERSION};

/// Read cursor over an encoded stream.
///
/// Carries the bitstream version of the stream being decoded so that
/// version dependent fields can be skipped or read.
pub struct DecoderBuffer<'a> {
    cursor: Cursor<&'a [u8]>,
    version_major: u8,
    version_minor: u8,
}

fn end_of_buffer(e: std::io::Error) -> CodecError {
    CodecError::BufferError(format!("unexpected end of buffer: {e}"))
}

impl<'a> DecoderBuffer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
            version_major: DEFAULT_MESH_VERSION.0,
            version_minor: DEFAULT_MESH_VERSION.1,
        }
    }

    pub fn set_version(&mut self, major: u8, minor: u8) {
        self.version_major = major;
        self.version_minor = minor;
    }

    pub fn version_major(&self) -> u8 {
        self.version_major
    }

    pub fn version_minor(&self) -> u8 {
        self.version_minor
    }

    /// Version packed as `major << 8 | minor`.
    pub fn bitstream_version(&self) -> u16 {
        bitstream_version(self.version_major, self.version_minor)
    }

    pub fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    pub fn remaining_size(&self) -> usize {
        self.cursor.get_ref().len().saturating_sub(self.position())
    }

    pub fn decode_u8(&mut self) -> CodecResult<u8> {
        self.cursor.read_u8().map_err(end_of_buffer)
    }

    pub fn decode_i8(&mut self) -> CodecResult<i8> {
        self.cursor.read_i8().map_err(end_of_buffer)
    }

    pub fn decode_u16(&mut self) -> CodecResult<u16> {
        self.cursor.read_u16::<LittleEndian>().map_err(end_of_buffer)
    }

    pub fn decode_u32(&mut self) -> CodecResult<u32> {
        self.cursor.read_u32::<LittleEndian>().map_err(end_of_buffer)
    }

    pub fn decode_i32(&mut self) -> CodecResult<i32> {
        self.cursor.read_i32::<LittleEndian>().map_err(end_of_buffer)
    }

    pub fn decode_f32(&mut self) -> CodecResult<f32> {
        self.cursor.read_f32::<LittleEndian>().map_err(end_of_buffer)
    }

    pub fn decode_varint(&mut self) -> CodecResult<u64> {
        let mut val = 0u64;
        let mut shift = 0;
        loop {
            let b = self.decode_u8()?;
            val |= ((b & 0x7F) as u64) << shift;
            if (b & 0x80) == 0 {
                break;
            }
            shift += 7;
            if shift >= 64 {
                return Err(CodecError::BufferError("varint exceeds 64 bits".into()));
            }
        }
        Ok(val)
    }

    /// Varint that must fit a `u32`.
    pub fn decode_varint_u32(&mut self) -> CodecResult<u32> {
        let v = self.decode_varint()?;
        u32::try_from(v).map_err(|_| CodecError::BufferError(format!("varint {v} exceeds 32 bits")))
    }

    /// Inverse of [`EncoderBuffer::encode_varint_signed_i32`](crate::encoder_buffer::EncoderBuffer::encode_varint_signed_i32).
    pub fn decode_varint_signed_i32(&mut self) -> CodecResult<i32> {
        let symbol = self.decode_varint_u32()?;
        let v = (symbol >> 1) as i32;
        if symbol & 1 == 0 {
            Ok(v)
        } else {
            Ok(-v - 1)
        }
    }

    /// Returns the next `size` bytes and advances past them.
    pub fn decode_slice(&mut self, size: usize) -> CodecResult<&'a [u8]> {
        let start = self.position();
        if size > self.remaining_size() {
            return Err(CodecError::BufferError(format!(
                "unexpected end of buffer: need {} bytes, have {}",
                size,
                self.remaining_size()
            )));
        }
        let data: &'a [u8] = *self.cursor.get_ref();
        self.cursor.set_position((start + size) as u64);
        Ok(&data[start..start + size])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder_buffer::EncoderBuffer;

    #[test]
    fn reads_what_encoder_wrote() {
        let mut enc = EncoderBuffer::new();
        enc.encode_u8(7);
        enc.encode_varint(1 << 40);
        enc.encode_varint_signed_i32(i32::MIN);
        enc.encode_varint_signed_i32(-17);
        enc.encode_f32(1.5);
        enc.encode_data(&[9, 8]);

        let mut dec = DecoderBuffer::new(enc.data());
        assert_eq!(dec.decode_u8().unwrap(), 7);
        assert_eq!(dec.decode_varint().unwrap(), 1 << 40);
        assert_eq!(dec.decode_varint_signed_i32().unwrap(), i32::MIN);
        assert_eq!(dec.decode_varint_signed_i32().unwrap(), -17);
        assert_eq!(dec.decode_f32().unwrap(), 1.5);
        assert_eq!(dec.decode_slice(2).unwrap(), &[9, 8]);
        assert_eq!(dec.remaining_size(), 0);
        assert!(matches!(dec.decode_u8(), Err(CodecError::BufferError(_))));
    }

    #[test]
    fn fixed_width_fields() {
        let mut enc = EncoderBuffer::new();
        enc.encode_u16(0xBEEF);
        enc.encode_u32(70_000);
        enc.encode_i32(-5);
        let mut dec = DecoderBuffer::new(enc.data());
        assert_eq!(dec.decode_u16().unwrap(), 0xBEEF);
        assert_eq!(dec.decode_u32().unwrap(), 70_000);
        assert_eq!(dec.decode_i32().unwrap(), -5);
        assert!(dec.decode_u16().is_err());
    }

    #[test]
    fn oversized_varint_is_rejected() {
        let data = [0xFFu8; 11];
        let mut dec = DecoderBuffer::new(&data);
        assert!(dec.decode_varint().is_err());
    }
}

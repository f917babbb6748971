use crate::ans::AnsDecoder;
use crate::decoder_buffer::DecoderBuffer;
use crate::status::Status;

/// Reads bits written by [`RAnsBitEncoder`](crate::rans_bit_encoder::RAnsBitEncoder).
#[derive(Default)]
pub struct RAnsBitDecoder<'a> {
    ans_decoder: Option<AnsDecoder<'a>>,
    prob_zero: u8,
}

impl<'a> RAnsBitDecoder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_decoding(&mut self, source_buffer: &mut DecoderBuffer<'a>) -> Status {
        self.clear();
        self.prob_zero = source_buffer.decode_u8()?;
        let size = source_buffer.decode_varint_u32()?;
        let slice = source_buffer.decode_slice(size as usize)?;
        self.ans_decoder = Some(AnsDecoder::new(slice)?);
        Ok(())
    }

    /// Returns `false` when decoding has not been started.
    pub fn decode_next_bit(&mut self) -> bool {
        match &mut self.ans_decoder {
            Some(decoder) => decoder.rabs_desc_read(self.prob_zero),
            None => false,
        }
    }

    pub fn end_decoding(&mut self) {
        self.ans_decoder = None;
    }

    fn clear(&mut self) {
        self.ans_decoder = None;
        self.prob_zero = 0;
    }
}

use crate::ans::AnsCoder;
use crate::encoder_buffer::EncoderBuffer;
use crate::status::Status;

/// Adaptive binary coder. Bits are buffered and the zero probability is
/// measured over the whole sequence before anything is written.
#[derive(Default)]
pub struct RAnsBitEncoder {
    bit_counts: [u64; 2],
    bits: Vec<u32>,
    local_bits: u32,
    num_local_bits: u32,
}

impl RAnsBitEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_encoding(&mut self) {
        self.clear();
    }

    pub fn clear(&mut self) {
        self.bit_counts = [0; 2];
        self.bits.clear();
        self.local_bits = 0;
        self.num_local_bits = 0;
    }

    pub fn encode_bit(&mut self, bit: bool) {
        if bit {
            self.bit_counts[1] += 1;
            self.local_bits |= 1 << self.num_local_bits;
        } else {
            self.bit_counts[0] += 1;
        }
        self.num_local_bits += 1;

        if self.num_local_bits == 32 {
            self.bits.push(self.local_bits);
            self.num_local_bits = 0;
            self.local_bits = 0;
        }
    }

    /// Number of bits encoded since the last start.
    pub fn num_bits(&self) -> u64 {
        self.bit_counts[0] + self.bit_counts[1]
    }

    /// Writes `zero_prob: u8`, the varint payload size and the payload.
    pub fn end_encoding(&mut self, target_buffer: &mut EncoderBuffer) -> Status {
        let total = self.num_bits().max(1);

        let zero_prob_raw = ((self.bit_counts[0] as f64 / total as f64) * 256.0 + 0.5) as u32;
        let zero_prob = zero_prob_raw.clamp(1, 255) as u8;

        let mut ans_coder = AnsCoder::new();
        ans_coder.write_init();

        // LIFO: the last bit goes in first.
        let tail = (0..self.num_local_bits).rev().map(|i| (self.local_bits >> i) & 1 != 0);
        let words = self
            .bits
            .iter()
            .rev()
            .flat_map(|&word| (0..32).rev().map(move |i| (word >> i) & 1 != 0));
        for bit in tail.chain(words) {
            ans_coder.rabs_desc_write(bit, zero_prob);
        }

        let size = ans_coder.write_end()?;

        target_buffer.encode_u8(zero_prob);
        target_buffer.encode_varint(size as u64);
        target_buffer.encode_data(ans_coder.data());
        self.clear();
        Ok(())
    }
}

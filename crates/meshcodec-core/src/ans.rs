//! Range asymmetric binary coder (rABS) state machines.
//!
//! The coder is LIFO: symbols must be written in reverse of the order in
//! which they will be read.

use crate::status::{CodecError, CodecResult};

pub const ANS_P8_PRECISION: u32 = 256;
pub const ANS_L_BASE: u32 = 4096;
pub const ANS_IO_BASE: u32 = 256;

pub struct AnsCoder {
    buf: Vec<u8>,
    state: u32,
}

impl Default for AnsCoder {
    fn default() -> Self {
        Self {
            buf: Vec::new(),
            state: ANS_L_BASE,
        }
    }
}

impl AnsCoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_init(&mut self) {
        self.buf.clear();
        self.state = ANS_L_BASE;
    }

    /// Flushes the final state. The top two bits of the last byte give the
    /// number of state bytes that precede it.
    pub fn write_end(&mut self) -> CodecResult<usize> {
        let state = self.state - ANS_L_BASE;
        let extra = match state {
            s if s < (1 << 6) => 0u32,
            s if s < (1 << 14) => 1,
            s if s < (1 << 22) => 2,
            s if s < (1 << 30) => 3,
            _ => {
                return Err(CodecError::InvalidParameter(format!(
                    "rANS state too large to be serialized: {state}"
                )))
            }
        };
        for i in 0..extra {
            self.buf.push((state >> (8 * i)) as u8);
        }
        self.buf.push(((extra << 6) | ((state >> (8 * extra)) & 0x3F)) as u8);
        Ok(self.buf.len())
    }

    /// Writes one bit with probability of zero `p0 / 256`.
    pub fn rabs_desc_write(&mut self, val: bool, p0: u8) {
        let p = ANS_P8_PRECISION - p0 as u32;
        let l_s = if val { p } else { p0 as u32 };

        if self.state >= ANS_L_BASE / ANS_P8_PRECISION * ANS_IO_BASE * l_s {
            self.buf.push((self.state % ANS_IO_BASE) as u8);
            self.state /= ANS_IO_BASE;
        }

        let quot = self.state / l_s;
        let rem = self.state % l_s;
        self.state = quot * ANS_P8_PRECISION + rem + if val { 0 } else { p };
    }

    pub fn data(&self) -> &[u8] {
        &self.buf
    }
}

pub struct AnsDecoder<'a> {
    buf: &'a [u8],
    buf_offset: usize,
    state: u32,
}

impl<'a> AnsDecoder<'a> {
    /// Reads the final state stored at the end of `buf`.
    pub fn new(buf: &'a [u8]) -> CodecResult<Self> {
        let truncated = || CodecError::CorruptEncodingData("truncated rANS state".into());
        let mut offset = buf.len();
        let val = *buf.last().ok_or_else(truncated)?;
        offset -= 1;
        let extra = (val >> 6) as usize;
        if offset < extra {
            return Err(truncated());
        }
        let mut state = (val & 0x3F) as u32;
        for _ in 0..extra {
            offset -= 1;
            state = (state << 8) | buf[offset] as u32;
        }
        Ok(Self {
            buf,
            buf_offset: offset,
            state: state + ANS_L_BASE,
        })
    }

    fn read_normalize(&mut self) {
        while self.state < ANS_L_BASE && self.buf_offset > 0 {
            self.buf_offset -= 1;
            self.state = (self.state * ANS_IO_BASE) | (self.buf[self.buf_offset] as u32);
        }
    }

    pub fn rabs_desc_read(&mut self, p0: u8) -> bool {
        let p = ANS_P8_PRECISION - p0 as u32;
        self.read_normalize();

        let x = self.state;
        let quot = x / ANS_P8_PRECISION;
        let rem = x % ANS_P8_PRECISION;
        let xn = quot * p;
        let val = rem < p;
        if val {
            self.state = xn + rem;
        } else {
            self.state = x - xn - p;
        }
        val
    }
}

use meshcodec_core::decoder_buffer::DecoderBuffer;
use meshcodec_core::encoder_buffer::EncoderBuffer;
use meshcodec_core::rans_bit_decoder::RAnsBitDecoder;
use meshcodec_core::rans_bit_encoder::RAnsBitEncoder;
use proptest::prelude::*;

fn encode(bits: &[bool]) -> EncoderBuffer {
    let mut encoder = RAnsBitEncoder::new();
    encoder.start_encoding();
    for &bit in bits {
        encoder.encode_bit(bit);
    }
    assert_eq!(encoder.num_bits(), bits.len() as u64);
    let mut buffer = EncoderBuffer::new();
    encoder.end_encoding(&mut buffer).unwrap();
    buffer
}

fn decode(buffer: &EncoderBuffer, count: usize) -> Vec<bool> {
    let mut input = DecoderBuffer::new(buffer.data());
    let mut decoder = RAnsBitDecoder::new();
    decoder.start_decoding(&mut input).unwrap();
    let bits = (0..count).map(|_| decoder.decode_next_bit()).collect();
    decoder.end_decoding();
    assert_eq!(input.remaining_size(), 0);
    bits
}

#[test]
fn mostly_false_sequence_is_small() {
    let mut bits = vec![false; 1000];
    bits[17] = true;
    bits[400] = true;
    let buffer = encode(&bits);
    assert!(buffer.size() < 64, "{} bytes for 1000 skewed bits", buffer.size());
    assert_eq!(decode(&buffer, bits.len()), bits);
}

#[test]
fn word_boundaries() {
    for len in [31, 32, 33, 64, 65] {
        let bits: Vec<bool> = (0..len).map(|i| i % 3 == 0).collect();
        assert_eq!(decode(&encode(&bits), len), bits, "{len} bits");
    }
}

proptest! {
    #[test]
    fn bits_round_trip(bits in prop::collection::vec(any::<bool>(), 0..500)) {
        let buffer = encode(&bits);
        prop_assert_eq!(decode(&buffer, bits.len()), bits);
    }
}

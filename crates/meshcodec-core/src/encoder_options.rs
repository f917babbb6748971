use std::collections::HashMap;

use crate::version::DEFAULT_MESH_VERSION;

/// String keyed integer options. Attribute scoped lookups fall back to the
/// global value and then to the caller's default.
#[derive(Debug, Clone, Default)]
pub struct EncoderOptions {
    global_options: HashMap<String, i32>,
    attribute_options: HashMap<i32, HashMap<String, i32>>,
}

impl EncoderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 0 is the slowest setting with the best compression, 10 the fastest.
    pub fn encoding_speed(&self) -> i32 {
        self.get_global_int("encoding_speed", 5)
    }

    pub fn set_encoding_speed(&mut self, speed: i32) {
        self.set_global_int("encoding_speed", speed);
    }

    pub fn decoding_speed(&self) -> i32 {
        self.get_global_int("decoding_speed", 5)
    }

    /// Forced prediction method code, if any.
    pub fn prediction_scheme(&self, att_id: i32) -> Option<i32> {
        self.find_attribute_int(att_id, "prediction_scheme")
    }

    pub fn set_prediction_scheme(&mut self, att_id: i32, method: i32) {
        self.set_attribute_int(att_id, "prediction_scheme", method);
    }

    /// Forced traversal method code, if any.
    pub fn traversal_method(&self, att_id: i32) -> Option<i32> {
        self.find_attribute_int(att_id, "traversal_method")
    }

    pub fn set_traversal_method(&mut self, att_id: i32, method: i32) {
        self.set_attribute_int(att_id, "traversal_method", method);
    }

    /// Quantization bits of a float attribute. `None` keeps it lossless.
    pub fn quantization_bits(&self, att_id: i32) -> Option<i32> {
        self.find_attribute_int(att_id, "quantization_bits").filter(|&bits| bits > 0)
    }

    pub fn set_quantization_bits(&mut self, att_id: i32, bits: i32) {
        self.set_attribute_int(att_id, "quantization_bits", bits);
    }

    pub fn octahedron_canonicalized(&self, att_id: i32) -> bool {
        self.get_attribute_int(att_id, "octahedron_canonicalized", 1) != 0
    }

    pub fn set_version(&mut self, major: u8, minor: u8) {
        self.set_global_int("version_major", major as i32);
        self.set_global_int("version_minor", minor as i32);
    }

    /// Target bitstream version, 2.2 unless set.
    pub fn version(&self) -> (u8, u8) {
        let major = self.get_global_int("version_major", -1);
        let minor = self.get_global_int("version_minor", -1);
        match (u8::try_from(major), u8::try_from(minor)) {
            (Ok(major), Ok(minor)) => (major, minor),
            _ => DEFAULT_MESH_VERSION,
        }
    }

    pub fn set_global_int(&mut self, key: &str, value: i32) {
        self.global_options.insert(key.to_string(), value);
    }

    pub fn get_global_int(&self, key: &str, default_val: i32) -> i32 {
        *self.global_options.get(key).unwrap_or(&default_val)
    }

    pub fn set_attribute_int(&mut self, att_id: i32, key: &str, value: i32) {
        self.attribute_options
            .entry(att_id)
            .or_default()
            .insert(key.to_string(), value);
    }

    pub fn get_attribute_int(&self, att_id: i32, key: &str, default_val: i32) -> i32 {
        self.find_attribute_int(att_id, key).unwrap_or(default_val)
    }

    fn find_attribute_int(&self, att_id: i32, key: &str) -> Option<i32> {
        self.attribute_options
            .get(&att_id)
            .and_then(|opts| opts.get(key))
            .or_else(|| self.global_options.get(key))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_values_fall_back_to_global() {
        let mut options = EncoderOptions::new();
        assert_eq!(options.encoding_speed(), 5);
        assert_eq!(options.quantization_bits(0), None);
        options.set_global_int("quantization_bits", 11);
        options.set_quantization_bits(1, 8);
        assert_eq!(options.quantization_bits(0), Some(11));
        assert_eq!(options.quantization_bits(1), Some(8));
        assert!(options.octahedron_canonicalized(1));
        assert_eq!(options.version(), DEFAULT_MESH_VERSION);
        options.set_version(2, 1);
        assert_eq!(options.version(), (2, 1));
    }
}

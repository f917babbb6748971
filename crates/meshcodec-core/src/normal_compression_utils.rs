//! Octahedral parametrization of unit normals.
//!
//! A unit vector is projected onto the octahedron `|x| + |y| + |z| = 1` and
//! the octahedron is unfolded into a square of side `2^q - 1`. The two
//! square coordinates (s, t) are what gets predicted and stored.

use crate::status::{CodecError, Status};

#[derive(Debug, Clone, Copy)]
pub struct OctahedronToolBox {
    quantization_bits: i32,
    max_quantized_value: i32,
    max_value: i32,
    dequantization_scale: f32,
    center_value: i32,
}

impl Default for OctahedronToolBox {
    fn default() -> Self {
        Self {
            quantization_bits: -1,
            max_quantized_value: -1,
            max_value: -1,
            dequantization_scale: 1.0,
            center_value: -1,
        }
    }
}

impl OctahedronToolBox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quantization_bits(q: i32) -> Result<Self, CodecError> {
        let mut tool_box = Self::default();
        tool_box.set_quantization_bits(q)?;
        Ok(tool_box)
    }

    pub fn set_quantization_bits(&mut self, q: i32) -> Status {
        if !(2..=30).contains(&q) {
            return Err(CodecError::InvalidParameter(format!(
                "octahedral quantization bits must be in 2..=30, got {q}"
            )));
        }
        self.quantization_bits = q;
        self.max_quantized_value = (1 << q) - 1;
        self.max_value = self.max_quantized_value - 1;
        self.dequantization_scale = 2.0 / self.max_value as f32;
        self.center_value = self.max_value / 2;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.quantization_bits != -1
    }

    pub fn quantization_bits(&self) -> i32 {
        self.quantization_bits
    }

    pub fn max_quantized_value(&self) -> i32 {
        self.max_quantized_value
    }

    pub fn max_value(&self) -> i32 {
        self.max_value
    }

    pub fn center_value(&self) -> i32 {
        self.center_value
    }

    /// True when the centered point lies inside the inner diamond
    /// `|s| + |t| <= center`.
    #[inline]
    pub fn is_in_diamond(&self, s: i32, t: i32) -> bool {
        s.unsigned_abs() + t.unsigned_abs() <= self.center_value as u32
    }

    /// Mirrors a centered point across the diamond edge of its quadrant.
    /// Applying it twice gives back the input.
    pub fn invert_diamond(&self, s: i32, t: i32) -> (i32, i32) {
        let (sign_s, sign_t) = if s >= 0 && t >= 0 {
            (1, 1)
        } else if s <= 0 && t <= 0 {
            (-1, -1)
        } else {
            (if s > 0 { 1 } else { -1 }, if t > 0 { 1 } else { -1 })
        };

        // Unsigned arithmetic keeps corrupt input from overflowing.
        let corner_s = (sign_s * self.center_value) as u32;
        let corner_t = (sign_t * self.center_value) as u32;
        let mut us = (s as u32).wrapping_mul(2).wrapping_sub(corner_s);
        let mut ut = (t as u32).wrapping_mul(2).wrapping_sub(corner_t);
        if sign_s * sign_t >= 0 {
            let tmp = us;
            us = ut.wrapping_neg();
            ut = tmp.wrapping_neg();
        } else {
            std::mem::swap(&mut us, &mut ut);
        }
        us = us.wrapping_add(corner_s);
        ut = ut.wrapping_add(corner_t);
        ((us as i32) / 2, (ut as i32) / 2)
    }

    /// Wraps a difference of two centered values back into `[-center, center]`.
    #[inline]
    pub fn mod_max(&self, x: i32) -> i32 {
        if x > self.center_value {
            x - self.max_quantized_value
        } else if x < -self.center_value {
            x + self.max_quantized_value
        } else {
            x
        }
    }

    #[inline]
    pub fn make_positive(&self, x: i32) -> i32 {
        if x < 0 {
            x + self.max_quantized_value
        } else {
            x
        }
    }

    /// Points on the square border that map to the same normal are folded
    /// onto one representative.
    pub fn canonicalize_octahedral_coords(&self, s: i32, t: i32) -> (i32, i32) {
        let (max, center) = (self.max_value, self.center_value);
        if (s == 0 && t == 0) || (s == 0 && t == max) || (s == max && t == 0) {
            (max, max)
        } else if s == 0 && t > center {
            (s, center - (t - center))
        } else if s == max && t < center {
            (s, center + (center - t))
        } else if t == max && s < center {
            (center + (center - s), t)
        } else if t == 0 && s > center {
            (center - (s - center), t)
        } else {
            (s, t)
        }
    }

    /// Rescales an integer vector so that its L1 norm equals the center value.
    /// The zero vector becomes `[center, 0, 0]`.
    pub fn canonicalize_integer_vector(&self, vec: &mut [i64; 3]) {
        let abs_sum = vec[0].abs() + vec[1].abs() + vec[2].abs();
        let center = self.center_value as i64;
        if abs_sum == 0 {
            *vec = [center, 0, 0];
            return;
        }
        vec[0] = vec[0] * center / abs_sum;
        vec[1] = vec[1] * center / abs_sum;
        let rest = center - vec[0].abs() - vec[1].abs();
        vec[2] = if vec[2] >= 0 { rest } else { -rest };
    }

    /// Expects a vector with L1 norm equal to the center value.
    pub fn integer_vector_to_quantized_octahedral_coords(&self, int_vec: &[i32; 3]) -> (i32, i32) {
        debug_assert_eq!(
            int_vec[0].abs() + int_vec[1].abs() + int_vec[2].abs(),
            self.center_value
        );
        let (s, t) = if int_vec[0] >= 0 {
            (int_vec[1] + self.center_value, int_vec[2] + self.center_value)
        } else {
            let s = if int_vec[1] < 0 {
                int_vec[2].abs()
            } else {
                self.max_value - int_vec[2].abs()
            };
            let t = if int_vec[2] < 0 {
                int_vec[1].abs()
            } else {
                self.max_value - int_vec[1].abs()
            };
            (s, t)
        };
        self.canonicalize_octahedral_coords(s, t)
    }

    pub fn float_vector_to_quantized_octahedral_coords(&self, vector: &[f32; 3]) -> (i32, i32) {
        let abs_sum = vector[0].abs() + vector[1].abs() + vector[2].abs();
        let scaled = if abs_sum > 1e-6 {
            let scale = 1.0 / abs_sum;
            [vector[0] * scale, vector[1] * scale, vector[2] * scale]
        } else {
            [1.0, 0.0, 0.0]
        };

        let center = self.center_value as f32;
        let mut int_vec = [
            (scaled[0] * center + 0.5).floor() as i32,
            (scaled[1] * center + 0.5).floor() as i32,
            0,
        ];
        int_vec[2] = self.center_value - int_vec[0].abs() - int_vec[1].abs();
        if int_vec[2] < 0 {
            // Rounding overshot; take the excess from the second component.
            if int_vec[1] > 0 {
                int_vec[1] += int_vec[2];
            } else {
                int_vec[1] -= int_vec[2];
            }
            int_vec[2] = 0;
        }
        if scaled[2] < 0.0 {
            int_vec[2] = -int_vec[2];
        }
        self.integer_vector_to_quantized_octahedral_coords(&int_vec)
    }

    pub fn quantized_octahedral_coords_to_unit_vector(&self, s: i32, t: i32) -> [f32; 3] {
        let mut y = s as f32 * self.dequantization_scale - 1.0;
        let mut z = t as f32 * self.dequantization_scale - 1.0;
        let x = 1.0 - y.abs() - z.abs();

        // Unfold the lower hemisphere.
        if x < 0.0 {
            let x_offset = -x;
            y += if y < 0.0 { x_offset } else { -x_offset };
            z += if z < 0.0 { x_offset } else { -x_offset };
        }

        let norm_squared = x * x + y * y + z * z;
        if norm_squared < 1e-6 {
            [0.0, 0.0, 0.0]
        } else {
            let d = 1.0 / norm_squared.sqrt();
            [x * d, y * d, z * d]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_bits() {
        assert!(OctahedronToolBox::with_quantization_bits(1).is_err());
        assert!(OctahedronToolBox::with_quantization_bits(31).is_err());
        let tb = OctahedronToolBox::with_quantization_bits(8).unwrap();
        assert_eq!(tb.max_quantized_value(), 255);
        assert_eq!(tb.center_value(), 127);
    }

    #[test]
    fn axis_vectors_survive_quantization() {
        let tb = OctahedronToolBox::with_quantization_bits(10).unwrap();
        for v in [
            [1.0f32, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, -1.0],
            [-1.0, 0.0, 0.0],
        ] {
            let (s, t) = tb.float_vector_to_quantized_octahedral_coords(&v);
            let back = tb.quantized_octahedral_coords_to_unit_vector(s, t);
            for i in 0..3 {
                assert!((back[i] - v[i]).abs() < 1e-3, "{v:?} -> {back:?}");
            }
        }
    }

    #[test]
    fn canonicalized_vector_has_center_norm() {
        let tb = OctahedronToolBox::with_quantization_bits(8).unwrap();
        let mut v = [300i64, -200, 41];
        tb.canonicalize_integer_vector(&mut v);
        assert_eq!(v[0].abs() + v[1].abs() + v[2].abs(), 127);
        let mut zero = [0i64; 3];
        tb.canonicalize_integer_vector(&mut zero);
        assert_eq!(zero, [127, 0, 0]);
    }
}

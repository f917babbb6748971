//! Integer helpers shared by the prediction schemes.

/// Returns floor(sqrt(x)) where x is an integer number.
///
/// Deterministic across platforms, unlike a floating point square root, which
/// matters because encoder and decoder must derive identical predictions.
///
/// ```
/// use meshcodec_core::math_utils::int_sqrt;
/// assert_eq!(int_sqrt(0), 0);
/// assert_eq!(int_sqrt(15), 3);
/// assert_eq!(int_sqrt(16), 4);
/// ```
pub fn int_sqrt(number: u64) -> u64 {
    if number == 0 {
        return 0;
    }

    // Initial estimate: a power of two at least as large as the root.
    let mut act_number = number;
    let mut square_root = 1u64;
    while act_number >= 2 {
        square_root *= 2;
        act_number /= 4;
    }

    // Newton iteration. After the first step the estimate never drops below
    // the true root, so we stop once its square fits.
    loop {
        square_root = (square_root + number / square_root) / 2;
        match square_root.checked_mul(square_root) {
            Some(sq) if sq <= number => break,
            _ => {}
        }
    }
    square_root
}

/// Index of the most significant set bit, `-1` for zero.
pub fn most_significant_bit(n: u32) -> i32 {
    if n == 0 {
        -1
    } else {
        31 - n.leading_zeros() as i32
    }
}

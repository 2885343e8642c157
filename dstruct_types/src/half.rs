/* IEEE-754 binary16 conversions for the complex32 lane */

/// Converts an `f32` to binary16 bits, rounding to nearest even.
pub fn f16_bits_from_f32(value: f32) -> u16 {
    let bits = value.to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let exponent = ((bits >> 23) & 0xff) as i32;
    let mantissa = bits & 0x007f_ffff;

    if exponent == 0xff {
        /* Inf or NaN; keep NaN quiet */
        let nan_bit = if mantissa != 0 { 0x0200 } else { 0 };
        return sign | 0x7c00 | nan_bit;
    }

    let unbiased = exponent - 127;
    if unbiased > 15 {
        return sign | 0x7c00;
    }

    if unbiased >= -14 {
        let half_exponent = ((unbiased + 15) as u32) << 10;
        let half_mantissa = mantissa >> 13;
        let round_bits = mantissa & 0x1fff;
        let mut result = half_exponent | half_mantissa;
        if round_bits > 0x1000 || (round_bits == 0x1000 && (half_mantissa & 1) == 1) {
            /* Carry may roll into the exponent, which is the correct result */
            result += 1;
        }
        return sign | result as u16;
    }

    if unbiased < -25 {
        return sign;
    }

    /* Subnormal half */
    let full_mantissa = mantissa | 0x0080_0000;
    let shift = (-1 - unbiased) as u32;
    let half_mantissa = full_mantissa >> shift;
    let remainder = full_mantissa & ((1 << shift) - 1);
    let halfway = 1 << (shift - 1);
    let mut result = half_mantissa;
    if remainder > halfway || (remainder == halfway && (half_mantissa & 1) == 1) {
        result += 1;
    }
    sign | result as u16
}

/// Converts binary16 bits to an `f32`. Exact.
pub fn f32_from_f16_bits(bits: u16) -> f32 {
    let sign = ((bits & 0x8000) as u32) << 16;
    let exponent = ((bits >> 10) & 0x1f) as u32;
    let mantissa = (bits & 0x03ff) as u32;

    let out = match (exponent, mantissa) {
        (0, 0) => sign,
        (0, _) => {
            /* Normalise the subnormal */
            let mut e: i32 = -14;
            let mut m = mantissa;
            while m & 0x0400 == 0 {
                m <<= 1;
                e -= 1;
            }
            m &= 0x03ff;
            sign | (((e + 127) as u32) << 23) | (m << 13)
        }
        (0x1f, 0) => sign | 0x7f80_0000,
        (0x1f, _) => sign | 0x7fc0_0000 | (mantissa << 13),
        _ => sign | ((exponent + 112) << 23) | (mantissa << 13),
    };
    f32::from_bits(out)
}

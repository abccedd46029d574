use num::{BigInt, BigUint, One, Zero, bigint::Sign};
use num_traits::{Signed, ToPrimitive};

const MANTISSA_MASK: u32 = 0x007f_ffff;
const SIGN_BIT: u32 = 0x0080_0000;

/// Expands compact difficulty bits into a (possibly negative) big integer.
///
/// The high byte is a base-256 exponent, bit 23 is the sign and the low 23 bits are the
/// mantissa: `N = (-1)^sign * mantissa * 256^(exponent - 3)`.
pub fn compact_to_big(compact: u32) -> BigInt {
    let mantissa = compact & MANTISSA_MASK;
    let is_negative = compact & SIGN_BIT != 0;
    let exponent = compact >> 24;

    let magnitude = if exponent <= 3 {
        BigInt::from(mantissa >> (8 * (3 - exponent)))
    } else {
        BigInt::from(mantissa) << (8 * (exponent - 3) as usize)
    };

    if is_negative { -magnitude } else { magnitude }
}

/// Inverse of [`compact_to_big`], keeping the 3 most significant bytes of `n`
pub fn big_to_compact(n: &BigInt) -> u32 {
    if n.is_zero() {
        return 0;
    }

    let abs = n.magnitude();
    let mut exponent = abs.bits().div_ceil(8) as u32;
    let mut mantissa = if exponent <= 3 {
        abs.to_u32().unwrap_or_default() << (8 * (3 - exponent))
    } else {
        (abs >> (8 * (exponent - 3) as usize)).to_u32().unwrap_or_default()
    };

    // The sign bit is not part of the mantissa, so shift it out of the way
    if mantissa & SIGN_BIT != 0 {
        mantissa >>= 8;
        exponent += 1;
    }

    let mut compact = (exponent << 24) | mantissa;
    if n.is_negative() {
        compact |= SIGN_BIT;
    }
    compact
}

/// Work represented by a block with the given difficulty bits: `2^256 / (target + 1)`.
///
/// Non-positive targets carry no work. The result saturates at `u128::MAX`, which only
/// trivially small targets can reach.
pub fn calc_work(bits: u32) -> u128 {
    let target = compact_to_big(bits);
    if !target.is_positive() {
        return 0;
    }
    let numerator = BigInt::one() << 256usize;
    (numerator / (target + BigInt::one())).to_u128().unwrap_or(u128::MAX)
}

/// Interprets 32 hash bytes as an unsigned little-endian integer, the way PoW hashes are compared
pub fn target_from_le_bytes(bytes: &[u8]) -> BigInt {
    BigInt::from_biguint(Sign::Plus, BigUint::from_bytes_le(bytes))
}

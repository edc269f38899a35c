//! Integer to text conversion without allocation.
//!
//! Digits are produced two at a time from precomputed tables, which halves the
//! number of divisions compared to peeling one digit per iteration.

use static_assertions::const_assert;

/// Size of the scratch area a single numeric value is formatted into.
pub const MAX_NUMERIC_SIZE: usize = 48;

/// Longest decimal text of a supported integer: `i64::MIN` is a sign and 19 digits.
const MAX_DECIMAL_LEN: usize = 20;

/// Longest pointer text: `0x` and 16 nibbles.
const MAX_POINTER_LEN: usize = 2 + 2 * std::mem::size_of::<u64>();

const_assert!(MAX_NUMERIC_SIZE - 10 > MAX_DECIMAL_LEN);
const_assert!(MAX_NUMERIC_SIZE - 10 > MAX_POINTER_LEN);
const_assert!(std::mem::size_of::<usize>() <= std::mem::size_of::<u64>());

const fn decimal_pairs() -> [[u8; 2]; 100] {
    let mut table = [[0; 2]; 100];
    let mut i = 0;
    while i < 100 {
        table[i] = [b'0' + (i / 10) as u8, b'0' + (i % 10) as u8];
        i += 1;
    }
    table
}

const fn hex_pairs() -> [[u8; 2]; 256] {
    const NIBBLES: &[u8; 16] = b"0123456789abcdef";
    let mut table = [[0; 2]; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = [NIBBLES[i >> 4], NIBBLES[i & 0xf]];
        i += 1;
    }
    table
}

/// `"00"`, `"01"`, ..., `"99"`.
pub static DECIMAL_PAIRS: [[u8; 2]; 100] = decimal_pairs();

/// `"00"`, `"01"`, ..., `"ff"`.
pub static HEX_PAIRS: [[u8; 2]; 256] = hex_pairs();

mod private {
    pub trait Sealed {}
}

/// Integers that can be written as decimal text.
///
/// Sealed: implemented for the 16, 32 and 64 bit integers and the pointer sized ones.
pub trait Integer: Copy + private::Sealed {
    /// Splits the value into its sign and its magnitude.
    ///
    /// The magnitude is taken in the unsigned type of the same width, so the
    /// minimum value of a signed type does not overflow.
    fn into_parts(self) -> (bool, u64);
}

macro_rules! impl_signed {
    ($($t:ty),*) => {$(
        impl private::Sealed for $t {}

        impl Integer for $t {
            #[inline]
            fn into_parts(self) -> (bool, u64) {
                (self < 0, self.unsigned_abs() as u64)
            }
        }
    )*};
}

macro_rules! impl_unsigned {
    ($($t:ty),*) => {$(
        impl private::Sealed for $t {}

        impl Integer for $t {
            #[inline]
            fn into_parts(self) -> (bool, u64) {
                (false, self as u64)
            }
        }
    )*};
}

impl_signed!(i16, i32, i64, isize);
impl_unsigned!(u16, u32, u64, usize);

/// Writes the decimal digits of `n` at the end of `scratch`, returning where they start.
fn write_decimal(mut n: u64, scratch: &mut [u8; MAX_NUMERIC_SIZE]) -> usize {
    let mut pos = scratch.len();
    while n >= 100 {
        let pair = (n % 100) as usize;
        n /= 100;
        pos -= 2;
        scratch[pos..pos + 2].copy_from_slice(&DECIMAL_PAIRS[pair]);
    }
    if n >= 10 {
        pos -= 2;
        scratch[pos..pos + 2].copy_from_slice(&DECIMAL_PAIRS[n as usize]);
    } else {
        pos -= 1;
        scratch[pos] = b'0' + n as u8;
    }
    pos
}

/// Writes the lowercase hex digits of `n` at the end of `scratch`, returning where they start.
fn write_hex(mut n: u64, scratch: &mut [u8; MAX_NUMERIC_SIZE]) -> usize {
    let mut pos = scratch.len();
    while n >= 0x100 {
        let pair = (n & 0xff) as usize;
        n >>= 8;
        pos -= 2;
        scratch[pos..pos + 2].copy_from_slice(&HEX_PAIRS[pair]);
    }
    if n >= 0x10 {
        pos -= 2;
        scratch[pos..pos + 2].copy_from_slice(&HEX_PAIRS[n as usize]);
    } else {
        pos -= 1;
        scratch[pos] = HEX_PAIRS[n as usize][1];
    }
    pos
}

/// Writes `value` as decimal text to the start of `dest` and returns the number of bytes written.
///
/// No leading zeros, a leading `-` for negative values.
///
/// # Panics
///
/// If `dest` is shorter than the text. [`MAX_NUMERIC_SIZE`] bytes are always enough.
pub fn convert<T: Integer>(dest: &mut [u8], value: T) -> usize {
    let (negative, magnitude) = value.into_parts();

    let mut scratch = [0; MAX_NUMERIC_SIZE];
    let mut start = write_decimal(magnitude, &mut scratch);
    if negative {
        start -= 1;
        scratch[start] = b'-';
    }

    let text = &scratch[start..];
    dest[..text.len()].copy_from_slice(text);
    text.len()
}

/// Writes `value` as lowercase hex digits, without prefix, to the start of `dest`.
///
/// Returns the number of bytes written; zero is rendered as a single `0`.
///
/// # Panics
///
/// If `dest` is shorter than the text. [`MAX_NUMERIC_SIZE`] bytes are always enough.
pub fn convert_hex(dest: &mut [u8], value: usize) -> usize {
    let mut scratch = [0; MAX_NUMERIC_SIZE];
    let start = write_hex(value as u64, &mut scratch);

    let text = &scratch[start..];
    dest[..text.len()].copy_from_slice(text);
    text.len()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn decimal<T: Integer>(value: T) -> String {
        let mut buf = [0; MAX_NUMERIC_SIZE];
        let len = convert(&mut buf, value);
        String::from_utf8(buf[..len].to_vec()).unwrap()
    }

    fn hex(value: usize) -> String {
        let mut buf = [0; MAX_NUMERIC_SIZE];
        let len = convert_hex(&mut buf, value);
        String::from_utf8(buf[..len].to_vec()).unwrap()
    }

    #[test]
    fn pair_tables() {
        assert_eq!(&DECIMAL_PAIRS[0], b"00");
        assert_eq!(&DECIMAL_PAIRS[7], b"07");
        assert_eq!(&DECIMAL_PAIRS[42], b"42");
        assert_eq!(&DECIMAL_PAIRS[99], b"99");
        assert_eq!(&HEX_PAIRS[0x0a], b"0a");
        assert_eq!(&HEX_PAIRS[0xff], b"ff");
    }

    #[rstest]
    #[case(0, "0")]
    #[case(9, "9")]
    #[case(10, "10")]
    #[case(99, "99")]
    #[case(100, "100")]
    #[case(-1, "-1")]
    #[case(-10, "-10")]
    #[case(-101, "-101")]
    #[case(i64::MAX, "9223372036854775807")]
    #[case(i64::MIN, "-9223372036854775808")]
    fn signed_decimal(#[case] value: i64, #[case] expected: &str) {
        assert_eq!(decimal(value), expected);
    }

    #[test]
    fn extremes_of_every_width() {
        assert_eq!(decimal(i16::MIN), i16::MIN.to_string());
        assert_eq!(decimal(i16::MAX), i16::MAX.to_string());
        assert_eq!(decimal(u16::MAX), u16::MAX.to_string());
        assert_eq!(decimal(i32::MIN), i32::MIN.to_string());
        assert_eq!(decimal(u32::MAX), u32::MAX.to_string());
        assert_eq!(decimal(u64::MAX), "18446744073709551615");
        assert_eq!(decimal(isize::MIN), isize::MIN.to_string());
        assert_eq!(decimal(usize::MAX), usize::MAX.to_string());
    }

    #[test]
    fn decimal_text_parses_back() {
        let mut value: i64 = 1;
        while let Some(next) = value.checked_mul(7) {
            for v in [value, -value, value - 1, 1 - value] {
                assert_eq!(decimal(v).parse::<i64>().unwrap(), v);
            }
            value = next;
        }

        for v in (0..=u16::MAX).step_by(37) {
            assert_eq!(decimal(v).parse::<u16>().unwrap(), v);
        }
        for v in (i32::MIN..=i32::MAX).step_by(65_537) {
            assert_eq!(decimal(v).parse::<i32>().unwrap(), v);
        }
    }

    #[rstest]
    #[case(0, "0")]
    #[case(0xf, "f")]
    #[case(0x10, "10")]
    #[case(0xabc, "abc")]
    #[case(0xdead_beef, "deadbeef")]
    fn hex_digits(#[case] value: usize, #[case] expected: &str) {
        assert_eq!(hex(value), expected);
    }

    #[test]
    fn widest_hex() {
        assert_eq!(hex(usize::MAX), "f".repeat(2 * std::mem::size_of::<usize>()));
    }
}

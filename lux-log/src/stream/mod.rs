//! Stream style formatting of primitive values into a fixed buffer.
//!
//! A [`LogStream`] owns a [`SmallBuffer`] and turns booleans, characters, integers,
//! floats, pointers and strings into text without allocating. Values are pushed one
//! after the other and the calls chain:
//!
//! ```
//! use lux_log::LogStream;
//!
//! let mut stream = LogStream::new();
//! stream.push(true).push(-42).push("end");
//!
//! assert_eq!(stream.buffer().data(), b"1-42end");
//! ```
//!
//! The `<<` operator is available on `&mut LogStream` as well:
//!
//! ```
//! use lux_log::LogStream;
//!
//! let mut stream = LogStream::new();
//! let _ = &mut stream << "answer=" << 42u32;
//!
//! assert_eq!(stream.buffer().data(), b"answer=42");
//! ```
//!
//! Anything that does not fit in the remaining space is silently dropped.

use std::ffi::CStr;
use std::fmt::{self, Write};
use std::ops::Shl;

pub mod buffer;
pub mod numeric;
pub mod quantity;

use self::buffer::{FixedBuffer, SmallBuffer};
use self::numeric::{Integer, MAX_NUMERIC_SIZE};

/// Placeholder written for a missing C string.
const NULL_CSTR: &[u8] = b"(null)";

/// A stream of formatted values backed by a [`SmallBuffer`].
///
/// Intended to be filled for one log record, handed to a sink through
/// [`buffer`](Self::buffer) and then reset.
#[derive(Debug, Default)]
pub struct LogStream {
    buffer: SmallBuffer,
}

impl LogStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `value` using the formatting rules of its type.
    pub fn push<T: Streamable>(&mut self, value: T) -> &mut Self {
        value.write_to(self);
        self
    }

    /// Appends `"1"` or `"0"`.
    pub fn append_bool(&mut self, value: bool) -> &mut Self {
        self.buffer.append(if value { b"1" } else { b"0" });
        self
    }

    /// Appends a single raw byte.
    pub fn append_byte(&mut self, value: u8) -> &mut Self {
        self.buffer.append(&[value]);
        self
    }

    /// Appends the UTF-8 encoding of `value`, unescaped.
    pub fn append_char(&mut self, value: char) -> &mut Self {
        let mut utf8 = [0; 4];
        self.buffer.append(value.encode_utf8(&mut utf8).as_bytes());
        self
    }

    pub fn append_i16(&mut self, value: i16) -> &mut Self {
        self.format_integer(value)
    }

    pub fn append_u16(&mut self, value: u16) -> &mut Self {
        self.format_integer(value)
    }

    pub fn append_i32(&mut self, value: i32) -> &mut Self {
        self.format_integer(value)
    }

    pub fn append_u32(&mut self, value: u32) -> &mut Self {
        self.format_integer(value)
    }

    pub fn append_i64(&mut self, value: i64) -> &mut Self {
        self.format_integer(value)
    }

    pub fn append_u64(&mut self, value: u64) -> &mut Self {
        self.format_integer(value)
    }

    pub fn append_isize(&mut self, value: isize) -> &mut Self {
        self.format_integer(value)
    }

    pub fn append_usize(&mut self, value: usize) -> &mut Self {
        self.format_integer(value)
    }

    pub fn append_f32(&mut self, value: f32) -> &mut Self {
        self.append_f64(f64::from(value))
    }

    /// Appends the shortest text that parses back to `value`.
    ///
    /// Plain notation is used for magnitudes in `[1e-4, 1e16)` and zero, scientific
    /// notation (`1e300`, `-2.5e-7`) outside that range. `NaN` and `inf` are
    /// written as such.
    pub fn append_f64(&mut self, value: f64) -> &mut Self {
        if self.buffer.avail() >= MAX_NUMERIC_SIZE {
            let mut scratch = ScratchWriter::new(&mut self.buffer.current()[..MAX_NUMERIC_SIZE]);
            let magnitude = value.abs();
            let plain = magnitude == 0.0
                || !magnitude.is_finite()
                || (1e-4..1e16).contains(&magnitude);
            let _ = if plain {
                write!(scratch, "{value}")
            } else {
                write!(scratch, "{value:e}")
            };
            let len = scratch.len();
            self.buffer.add(len);
        }
        self
    }

    /// Appends `0x` and the address in lowercase hex. A null pointer is `0x0`.
    pub fn append_ptr<T: ?Sized>(&mut self, value: *const T) -> &mut Self {
        if self.buffer.avail() >= MAX_NUMERIC_SIZE {
            let address = value.cast::<()>() as usize;
            let buf = self.buffer.current();
            buf[..2].copy_from_slice(b"0x");
            let len = numeric::convert_hex(&mut buf[2..], address);
            self.buffer.add(len + 2);
        }
        self
    }

    /// Appends the bytes of a C string up to its terminator, or `(null)` for `None`.
    pub fn append_cstr(&mut self, value: Option<&CStr>) -> &mut Self {
        match value {
            Some(s) => self.buffer.append(s.to_bytes()),
            None => self.buffer.append(NULL_CSTR),
        }
        self
    }

    pub fn append_str(&mut self, value: &str) -> &mut Self {
        self.buffer.append(value.as_bytes());
        self
    }

    pub fn append_bytes(&mut self, value: &[u8]) -> &mut Self {
        self.buffer.append(value);
        self
    }

    /// Appends the written range of another buffer.
    pub fn append_buffer<const N: usize>(&mut self, value: &FixedBuffer<N>) -> &mut Self {
        self.buffer.append(value.data());
        self
    }

    pub fn append_fmt(&mut self, value: &Fmt) -> &mut Self {
        self.buffer.append(value.data());
        self
    }

    /// Raw passthrough to [`FixedBuffer::append`].
    pub fn append(&mut self, data: &[u8]) {
        self.buffer.append(data);
    }

    pub fn buffer(&self) -> &SmallBuffer {
        &self.buffer
    }

    /// Discards the written content.
    pub fn reset_buffer(&mut self) {
        self.buffer.reset();
    }

    // Integers are formatted in place, so they need the full scratch size to be free.
    fn format_integer<T: Integer>(&mut self, value: T) -> &mut Self {
        if self.buffer.avail() >= MAX_NUMERIC_SIZE {
            let len = numeric::convert(self.buffer.current(), value);
            self.buffer.add(len);
        }
        self
    }
}

impl Write for LogStream {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.buffer.append(s.as_bytes());
        Ok(())
    }
}

impl<'a, T: Streamable> Shl<T> for &'a mut LogStream {
    type Output = &'a mut LogStream;

    fn shl(self, value: T) -> Self::Output {
        self.push(value)
    }
}

mod private {
    pub trait Sealed {}
}

/// Values accepted by [`LogStream::push`] and `<<`.
///
/// The set is closed: it is sealed and covers primitives, pointers, strings,
/// C strings, fixed buffers and [`Fmt`].
pub trait Streamable: private::Sealed {
    fn write_to(self, stream: &mut LogStream);
}

macro_rules! streamable {
    ($($t:ty => $method:ident),* $(,)?) => {$(
        impl private::Sealed for $t {}

        impl Streamable for $t {
            #[inline]
            fn write_to(self, stream: &mut LogStream) {
                stream.$method(self);
            }
        }
    )*};
}

streamable! {
    bool => append_bool,
    u8 => append_byte,
    char => append_char,
    i16 => append_i16,
    u16 => append_u16,
    i32 => append_i32,
    u32 => append_u32,
    i64 => append_i64,
    u64 => append_u64,
    isize => append_isize,
    usize => append_usize,
    f32 => append_f32,
    f64 => append_f64,
    Option<&CStr> => append_cstr,
    &str => append_str,
    &[u8] => append_bytes,
    &Fmt => append_fmt,
}

impl private::Sealed for &String {}

impl Streamable for &String {
    fn write_to(self, stream: &mut LogStream) {
        stream.append_str(self);
    }
}

impl private::Sealed for &CStr {}

impl Streamable for &CStr {
    fn write_to(self, stream: &mut LogStream) {
        stream.append_cstr(Some(self));
    }
}

impl<T: ?Sized> private::Sealed for *const T {}

impl<T: ?Sized> Streamable for *const T {
    fn write_to(self, stream: &mut LogStream) {
        stream.append_ptr(self);
    }
}

impl<T: ?Sized> private::Sealed for *mut T {}

impl<T: ?Sized> Streamable for *mut T {
    fn write_to(self, stream: &mut LogStream) {
        stream.append_ptr(self.cast_const());
    }
}

impl<const N: usize> private::Sealed for &FixedBuffer<N> {}

impl<const N: usize> Streamable for &FixedBuffer<N> {
    fn write_to(self, stream: &mut LogStream) {
        stream.append_buffer(self);
    }
}

const FMT_SIZE: usize = 32;

/// A single value formatted up front into a small inline buffer.
///
/// Text longer than 32 bytes is cut off.
///
/// ```
/// use lux_log::{Fmt, LogStream};
///
/// let mut stream = LogStream::new();
/// stream.push(&Fmt::new(format_args!("{:.2}", 1.23456)));
///
/// assert_eq!(stream.buffer().data(), b"1.23");
/// ```
#[derive(Clone, Copy)]
pub struct Fmt {
    buf: [u8; FMT_SIZE],
    length: usize,
}

impl Fmt {
    pub fn new(args: fmt::Arguments<'_>) -> Self {
        let mut buf = [0; FMT_SIZE];
        let mut writer = ScratchWriter::new(&mut buf);
        let _ = writer.write_fmt(args);
        let length = writer.len();

        Self { buf, length }
    }

    pub fn data(&self) -> &[u8] {
        &self.buf[..self.length]
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

impl fmt::Debug for Fmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Fmt")
            .field(&String::from_utf8_lossy(self.data()))
            .finish()
    }
}

/// Writes into a byte slice, keeping whatever fits.
struct ScratchWriter<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl<'a> ScratchWriter<'a> {
    fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, len: 0 }
    }

    fn len(&self) -> usize {
        self.len
    }
}

impl Write for ScratchWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = self.buf.len() - self.len;
        let count = s.len().min(room);
        self.buf[self.len..self.len + count].copy_from_slice(&s.as_bytes()[..count]);
        self.len += count;
        if count < s.len() {
            Err(fmt::Error)
        } else {
            Ok(())
        }
    }
}

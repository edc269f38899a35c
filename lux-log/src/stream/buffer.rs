use std::alloc::{self, Layout};
use std::{fmt, ptr, str};

/// Capacity of the buffer owned by every [`LogStream`](super::LogStream).
pub const SMALL_BUFFER: usize = 4000;

/// Capacity of [`LargeBuffer`]. Build it with [`FixedBuffer::new_boxed`].
pub const LARGE_BUFFER: usize = 4000 * 1000;

pub type SmallBuffer = FixedBuffer<SMALL_BUFFER>;
pub type LargeBuffer = FixedBuffer<LARGE_BUFFER>;

/// Marker stored in every live [`FixedBuffer`].
///
/// The values are readable ASCII words (`LUXS` / `LUXE`) so a debugger or a core
/// dump inspector can find buffers in memory and tell live ones from torn down ones.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cookie {
    Start = 0x4C55_5853,
    End = 0x4C55_5845,
}

/// A byte buffer of static capacity `N` with all-or-nothing appends.
///
/// The buffer never grows. An append that does not fit is dropped entirely,
/// so a record is never cut in the middle of a value.
pub struct FixedBuffer<const N: usize> {
    cookie: Cookie,
    data: [u8; N],
    cur: usize,
}

impl<const N: usize> FixedBuffer<N> {
    pub fn new() -> Self {
        Self {
            cookie: Cookie::Start,
            data: [0; N],
            cur: 0,
        }
    }

    /// Creates an empty buffer directly on the heap.
    ///
    /// Use this for capacities that do not fit on a thread stack, such as [`LargeBuffer`].
    pub fn new_boxed() -> Box<Self> {
        let layout = Layout::new::<Self>();
        // SAFETY: `Self` is never zero sized (it holds the cookie). Zeroed memory is a
        // valid `data` array and a valid `cur`, and the cookie is written before the
        // allocation is handed over to the `Box`.
        unsafe {
            let raw = alloc::alloc_zeroed(layout) as *mut Self;
            if raw.is_null() {
                alloc::handle_alloc_error(layout);
            }
            ptr::addr_of_mut!((*raw).cookie).write(Cookie::Start);
            Box::from_raw(raw)
        }
    }

    /// Copies `buf` in if strictly more than `buf.len()` bytes are left.
    ///
    /// Otherwise nothing is written. One byte always stays free so a caller can
    /// terminate the content through [`current`](Self::current).
    pub fn append(&mut self, buf: &[u8]) {
        if self.avail() > buf.len() {
            self.data[self.cur..self.cur + buf.len()].copy_from_slice(buf);
            self.cur += buf.len();
        }
    }

    /// The written range.
    pub fn data(&self) -> &[u8] {
        &self.data[..self.cur]
    }

    pub fn len(&self) -> usize {
        self.cur
    }

    pub fn is_empty(&self) -> bool {
        self.cur == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// The unwritten tail, for formatting straight into the buffer.
    ///
    /// Call [`add`](Self::add) with the number of bytes written afterwards.
    pub fn current(&mut self) -> &mut [u8] {
        &mut self.data[self.cur..]
    }

    pub fn avail(&self) -> usize {
        N - self.cur
    }

    /// Commits `len` bytes written through [`current`](Self::current).
    pub fn add(&mut self, len: usize) {
        debug_assert!(len <= self.avail(), "add past the end of the buffer");
        self.cur += len;
    }

    /// Forgets the written content. The bytes themselves are left in place.
    pub fn reset(&mut self) {
        self.cur = 0;
    }

    /// Zeroes the whole storage.
    pub fn bzero(&mut self) {
        self.data.fill(0);
    }

    /// Returns the written range followed by a NUL byte, for debuggers.
    ///
    /// The NUL is not counted in [`len`](Self::len). When the buffer is completely
    /// full there is no room for it and the plain written range is returned.
    pub fn debug_str(&mut self) -> &[u8] {
        if self.cur < N {
            self.data[self.cur] = 0;
            &self.data[..=self.cur]
        } else {
            &self.data[..]
        }
    }

    pub fn cookie(&self) -> Cookie {
        self.cookie
    }

    /// The written range as text, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        str::from_utf8(self.data()).ok()
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(self.data()).into_owned()
    }
}

impl<const N: usize> Default for FixedBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Drop for FixedBuffer<N> {
    fn drop(&mut self) {
        // Volatile: nothing in the program reads the cookie after this point.
        unsafe { ptr::write_volatile(&mut self.cookie, Cookie::End) };
    }
}

impl<const N: usize> fmt::Write for FixedBuffer<N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.append(s.as_bytes());
        Ok(())
    }
}

impl<const N: usize> fmt::Debug for FixedBuffer<N> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FixedBuffer")
            .field("cookie", &self.cookie)
            .field("capacity", &N)
            .field("len", &self.cur)
            .finish()
    }
}

impl<const N: usize> From<&str> for FixedBuffer<N> {
    fn from(value: &str) -> Self {
        let mut buffer = Self::new();
        buffer.append(value.as_bytes());
        buffer
    }
}

impl<const N: usize> From<String> for FixedBuffer<N> {
    fn from(value: String) -> Self {
        value.as_str().into()
    }
}

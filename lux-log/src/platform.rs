use std::io::{self, Write};
use std::time::SystemTime;

/// Returns the current SystemTime
#[inline]
pub fn current_system_time() -> SystemTime {
    SystemTime::now()
}

/// Writes a formatted record to the standard out
#[inline]
pub fn print(data: &[u8]) -> io::Result<()> {
    io::stdout().lock().write_all(data)
}

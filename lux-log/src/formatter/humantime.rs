use std::fmt;
use std::time::SystemTime;

use humantime::format_rfc3339_nanos;

use crate::platform;

/// An [RFC3339] timestamp with nanosecond precision, written into record headers.
///
/// [RFC3339]: https://www.ietf.org/rfc/rfc3339.txt
#[derive(Debug, Clone, Copy)]
pub struct Rfc3339Timestamp {
    time: SystemTime,
}

impl Rfc3339Timestamp {
    pub fn now() -> Self {
        Self::at(platform::current_system_time())
    }

    pub fn at(time: SystemTime) -> Self {
        Rfc3339Timestamp { time }
    }
}

impl fmt::Display for Rfc3339Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&format_rfc3339_nanos(self.time), f)
    }
}

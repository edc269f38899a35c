pub use lux_log;
pub use lux_log::{format_iec, format_si, FixedBuffer, Fmt, LogSettings, LogStream};

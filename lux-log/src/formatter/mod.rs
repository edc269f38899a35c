//! Layout of log records.
//!
//! Records are rendered into the thread's [`LogStream`] with the typed append
//! operations, so formatting a record never allocates. The default layout is
//!
//! ```text
//! [2024-01-01T00:00:00.000000000Z INFO  my_crate::module target] message
//! ```
//!
//! with every header part switchable through the [`Builder`](crate::Builder).
//! Messages spanning several lines can be indented so the continuation lines
//! stand apart from the next header.

use std::fmt::{self, Display, Write};

mod humantime;
use log::Record;

use self::humantime::Rfc3339Timestamp;
use crate::stream::LogStream;

pub(crate) type FormatFn = Box<dyn Fn(&mut LogStream, &Record) -> fmt::Result + Sync + Send>;

pub(crate) struct Builder {
    pub timestamp: bool,
    pub format_module_path: bool,
    pub format_target: bool,
    pub format_level: bool,
    pub format_indent: Option<usize>,
    pub custom_format: Option<FormatFn>,
    pub format_suffix: &'static str,
}

impl Default for Builder {
    fn default() -> Self {
        Builder {
            timestamp: true,
            format_module_path: false,
            format_target: true,
            format_level: true,
            format_indent: Some(4),
            custom_format: None,
            format_suffix: "\n",
        }
    }
}

impl Builder {
    /// Convert the format into a callable function.
    ///
    /// If the `custom_format` is `Some`, then any `default_format` switches are ignored.
    /// If the `custom_format` is `None`, then a default format is returned.
    /// Any `default_format` switches set to `false` won't be written by the format.
    pub fn build(self) -> FormatFn {
        if let Some(fmt) = self.custom_format {
            fmt
        } else {
            Box::new(move |stream, record| {
                let fmt = DefaultFormat {
                    timestamp: self.timestamp,
                    module_path: self.format_module_path,
                    target: self.format_target,
                    level: self.format_level,
                    written_header_value: false,
                    indent: self.format_indent,
                    suffix: self.format_suffix,
                    stream,
                };

                fmt.write(record)
            })
        }
    }
}

/// The default format.
struct DefaultFormat<'a> {
    timestamp: bool,
    module_path: bool,
    target: bool,
    level: bool,
    written_header_value: bool,
    indent: Option<usize>,
    stream: &'a mut LogStream,
    suffix: &'a str,
}

impl DefaultFormat<'_> {
    fn write(mut self, record: &Record) -> fmt::Result {
        self.write_timestamp()?;
        self.write_level(record)?;
        self.write_module_path(record)?;
        self.write_target(record)?;
        self.finish_header();

        self.write_args(record)
    }

    fn open_header_value(&mut self) {
        if !self.written_header_value {
            self.written_header_value = true;
            self.stream.append_char('[');
        } else {
            self.stream.append_char(' ');
        }
    }

    fn write_header_value<T>(&mut self, value: T) -> fmt::Result
    where
        T: Display,
    {
        self.open_header_value();
        write!(self.stream, "{}", value)
    }

    fn write_level(&mut self, record: &Record) -> fmt::Result {
        if !self.level {
            return Ok(());
        }

        self.write_header_value(format_args!("{:<5}", record.level()))
    }

    fn write_timestamp(&mut self) -> fmt::Result {
        if !self.timestamp {
            return Ok(());
        }

        let timestamp = Rfc3339Timestamp::now();
        self.write_header_value(timestamp)
    }

    fn write_module_path(&mut self, record: &Record) -> fmt::Result {
        if !self.module_path {
            return Ok(());
        }

        if let Some(module_path) = record.module_path() {
            self.open_header_value();
            self.stream.append_str(module_path);
        }
        Ok(())
    }

    fn write_target(&mut self, record: &Record) -> fmt::Result {
        if !self.target {
            return Ok(());
        }

        match record.target() {
            "" => {}
            target => {
                self.open_header_value();
                self.stream.append_str(target);
            }
        }
        Ok(())
    }

    fn finish_header(&mut self) {
        if self.written_header_value {
            self.stream.append_str("] ");
        }
    }

    fn write_args(&mut self, record: &Record) -> fmt::Result {
        match self.indent {
            // Fast path for no indentation
            None => {
                write!(self.stream, "{}", record.args())?;
                self.stream.append_str(self.suffix);
                Ok(())
            }

            Some(indent_count) => {
                struct IndentWrapper<'a, 'b: 'a> {
                    fmt: &'a mut DefaultFormat<'b>,
                    indent_count: usize,
                }

                impl Write for IndentWrapper<'_, '_> {
                    fn write_str(&mut self, s: &str) -> fmt::Result {
                        let mut first = true;
                        for chunk in s.split('\n') {
                            if !first {
                                self.fmt.stream.append_str(self.fmt.suffix);
                                for _ in 0..self.indent_count {
                                    self.fmt.stream.append_char(' ');
                                }
                            }
                            self.fmt.stream.append_str(chunk);
                            first = false;
                        }

                        Ok(())
                    }
                }

                {
                    let mut wrapper = IndentWrapper {
                        fmt: self,
                        indent_count,
                    };
                    write!(wrapper, "{}", record.args())?;
                }

                self.stream.append_str(self.suffix);

                Ok(())
            }
        }
    }
}

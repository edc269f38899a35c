//! Allocation-free log formatting.
//!
//! The core of the crate is [`LogStream`], a stream of typed values formatted into a
//! [`FixedBuffer`] without touching the heap, together with the numeric helpers it is
//! built on ([`format_si`], [`format_iec`] and the [`numeric`] conversions).
//!
//! On top of it sits a [`Logger`] for the [`log`][log-crate-url] facade: every record
//! is rendered into a thread-local `LogStream` and the resulting line is handed to
//! one or more [`Writer`]s.
//!
//! [log-crate-url]: https://docs.rs/log/

use formatter::FormatFn;
use writer::{ConsoleWriter, InMemoryWriter, Logs, MultiWriter, Writer};

mod error;
mod formatter;
mod platform;
pub mod settings;
pub mod stream;
pub mod writer;

use std::cell::RefCell;
use std::sync::Arc;

use arc_swap::{ArcSwap, ArcSwapAny};
use env_filter::Filter;
use log::{LevelFilter, Log, Metadata, Record};

pub use self::error::{Error, Result};
pub use self::settings::LogSettings;
pub use self::stream::buffer::{
    Cookie, FixedBuffer, LargeBuffer, SmallBuffer, LARGE_BUFFER, SMALL_BUFFER,
};
pub use self::stream::numeric::{self, MAX_NUMERIC_SIZE};
pub use self::stream::quantity::{format_iec, format_si};
pub use self::stream::{Fmt, LogStream, Streamable};

/// The logger.
///
/// This struct implements the `Log` trait from the [`log` crate][log-crate-url],
/// which allows it to act as a logger.
///
/// The [`Builder::try_init()`] method and [`init_log()`] construct a `Logger` and
/// immediately initialize it as the default global logger.
///
/// If you'd instead need access to the constructed `Logger`, you can use
/// [`Builder::build()`] and install it with the [`log` crate][log-crate-url] directly.
///
/// [log-crate-url]: https://docs.rs/log/
pub struct Logger {
    writer: Box<dyn Writer>,
    filter: Arc<ArcSwapAny<Arc<Filter>>>,
    format: FormatFn,
}

/// `Builder` acts as builder for initializing a `Logger`.
///
/// It can be used to customize the log format, the log filters and the writers
/// receiving the formatted lines.
///
/// # Examples
///
/// ```
/// use lux_log::Builder;
///
/// let (logger, _config) = Builder::new()
///     .parse_filters("debug,crate1::mod1=error,crate2=info")
///     .build();
///
/// assert_eq!(logger.filter(), log::LevelFilter::Debug);
/// ```
#[derive(Default)]
pub struct Builder {
    filter: env_filter::Builder,
    writer: MultiWriter,
    format: formatter::Builder,
}

impl Builder {
    /// Initializes the log builder with defaults.
    pub fn new() -> Builder {
        Default::default()
    }

    /// Whether or not to write the timestamp in the default format.
    pub fn format_timestamp(mut self, write: bool) -> Self {
        self.format.timestamp = write;
        self
    }

    /// Whether or not to write the level in the default format.
    pub fn format_level(mut self, write: bool) -> Self {
        self.format.format_level = write;
        self
    }

    /// Whether or not to write the module path in the default format.
    pub fn format_module_path(mut self, write: bool) -> Self {
        self.format.format_module_path = write;
        self
    }

    /// Whether or not to write the target in the default format.
    pub fn format_target(mut self, write: bool) -> Self {
        self.format.format_target = write;
        self
    }

    /// Configures the amount of spaces to use to indent multiline log records.
    /// A value of `None` disables any kind of indentation.
    pub fn format_indent(mut self, indent: Option<usize>) -> Self {
        self.format.format_indent = indent;
        self
    }

    /// Configures the end of line suffix.
    pub fn format_suffix(mut self, suffix: &'static str) -> Self {
        self.format.format_suffix = suffix;
        self
    }

    /// Replaces the default format with a custom one.
    ///
    /// The function writes the record into the given stream; the stream is handed
    /// to the writers once the function returns.
    ///
    /// # Examples
    ///
    /// ```
    /// use lux_log::Builder;
    ///
    /// let builder = Builder::new().format(|stream, record| {
    ///     stream.push(record.level().as_str()).push(' ').push(record.line().unwrap_or(0));
    ///     Ok(())
    /// });
    /// ```
    pub fn format<F>(mut self, format: F) -> Self
    where
        F: Fn(&mut LogStream, &Record) -> std::fmt::Result + Sync + Send + 'static,
    {
        self.format.custom_format = Some(Box::new(format));
        self
    }

    /// Sets the level of `module` and its submodules.
    pub fn filter_module(mut self, module: &str, level: LevelFilter) -> Self {
        self.filter.filter_module(module, level);
        self
    }

    /// Sets the level of every module without a directive of its own.
    pub fn filter_level(mut self, level: LevelFilter) -> Self {
        self.filter.filter_level(level);
        self
    }

    /// Same as [`filter_module`](Self::filter_module), or
    /// [`filter_level`](Self::filter_level) when `module` is `None`.
    pub fn filter(mut self, module: Option<&str>, level: LevelFilter) -> Self {
        self.filter.filter(module, level);
        self
    }

    /// Adds `RUST_LOG`-style directives, e.g. `"info,lux_log::writer=debug"`.
    ///
    /// A module named without a level, like `"info,app::db"`, is enabled at `trace`.
    pub fn parse_filters(mut self, filters: &str) -> Self {
        self.filter.parse(filters);
        self
    }

    /// Append a new writer.
    pub fn add_writer(mut self, writer: Box<dyn Writer>) -> Self {
        self.writer.add(writer);
        self
    }

    /// Initializes the global logger with the built logger.
    ///
    /// This should be called early in the execution of a Rust program. Any log
    /// events that occur before initialization will be ignored.
    ///
    /// # Errors
    ///
    /// This function will fail if it is called more than once, or if another
    /// library has already initialized a global logger.
    pub fn try_init(self) -> Result<LoggerConfig> {
        let (logger, config) = self.build();

        let max_level = logger.filter();
        log::set_boxed_logger(Box::new(logger))?;
        log::set_max_level(max_level);
        Ok(config)
    }

    /// Build a logger.
    ///
    /// The returned logger implements the `Log` trait and can be installed manually
    /// or nested within another logger.
    pub fn build(mut self) -> (Logger, LoggerConfig) {
        let filter = Arc::new(ArcSwap::from_pointee(self.filter.build()));

        let writer: Box<dyn Writer> = if self.writer.writers.len() == 1 {
            self.writer.writers.remove(0)
        } else {
            Box::new(self.writer)
        };

        (
            Logger {
                writer,
                filter: filter.clone(),
                format: self.format.build(),
            },
            LoggerConfig { filter },
        )
    }
}

/// Handle to the filter of a built [`Logger`].
pub struct LoggerConfig {
    filter: Arc<ArcSwapAny<Arc<Filter>>>,
}

impl LoggerConfig {
    /// Replaces the filter of the logger with `filters`, parsed like
    /// [`Builder::parse_filters`], and raises or lowers the global max level to match.
    pub fn update_filters(&self, filters: &str) {
        let new_filter = env_filter::Builder::default().parse(filters).build();
        let max_level = new_filter.filter();
        self.filter.swap(Arc::new(new_filter));
        log::set_max_level(max_level);
    }
}

impl Logger {
    /// Returns the maximum `LevelFilter` that this logger instance is
    /// configured to output.
    pub fn filter(&self) -> LevelFilter {
        self.filter.load().filter()
    }

    /// Checks if this record matches the configured filter.
    pub fn matches(&self, record: &Record) -> bool {
        self.filter.load().matches(record)
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.filter.load().enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if self.matches(record) {
            // Each thread formats into its own stream. A record logged while another
            // one is being formatted on the same thread (from a `Display` impl, say)
            // gets a stream of its own on the stack.
            thread_local! {
                static STREAM: RefCell<LogStream> = RefCell::new(LogStream::new());
            }

            // A record whose format fails is not printed.
            let print = |stream: &mut LogStream, record: &Record| {
                if (self.format)(stream, record).is_ok() {
                    let _ = self.writer.print(stream.buffer());
                }

                // Always clear the buffer afterwards
                stream.reset_buffer();
            };

            let printed = STREAM
                .try_with(|tl_stream| match tl_stream.try_borrow_mut() {
                    Ok(ref mut stream) => print(stream, record),
                    Err(_) => print(&mut LogStream::new(), record),
                })
                .is_ok();

            if !printed {
                // The thread-local storage was not available (because its
                // destructor has already run).
                print(&mut LogStream::new(), record);
            }
        }
    }

    fn flush(&self) {}
}

mod std_fmt_impls {
    use std::fmt;

    use super::*;

    impl fmt::Debug for Logger {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.debug_struct("Logger")
                .field("filter", &self.filter)
                .finish()
        }
    }

    impl fmt::Debug for Builder {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.debug_struct("Builder")
                .field("filter", &self.filter)
                .finish()
        }
    }
}

/// Builds and initialize a logger based on the settings
pub fn init_log(settings: &LogSettings) -> Result<LoggerConfig> {
    let mut builder = Builder::default().parse_filters(&settings.log_filter);

    if settings.enable_console {
        builder = builder.add_writer(Box::new(ConsoleWriter {}));
    }

    let in_memory = settings.in_memory_records > 0;
    if in_memory {
        builder = builder.add_writer(Box::new(InMemoryWriter {}));
    }

    let config = builder.try_init()?;
    if in_memory {
        InMemoryWriter::init_buffer(settings.in_memory_records);
    }

    Ok(config)
}

/// Take the log memory records for the circular buffer.
pub fn take_memory_records(max_count: usize, from_offset: usize) -> Logs {
    InMemoryWriter::take_records(max_count, from_offset)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use log::*;

    use super::*;

    /// Collects every printed line, shared across the test threads.
    #[derive(Clone, Default)]
    struct Collect(Arc<Mutex<Vec<String>>>);

    impl Writer for Collect {
        fn print(&self, buf: &SmallBuffer) -> std::io::Result<()> {
            self.0.lock().unwrap().push(buf.to_string_lossy());
            Ok(())
        }
    }

    fn log_with(logger: &Logger, level: Level, message: &str) {
        logger.log(
            &Record::builder()
                .args(format_args!("{message}"))
                .level(level)
                .target("app")
                .module_path(Some("app::module"))
                .build(),
        );
    }

    #[test]
    fn logger_writes_formatted_lines() {
        let lines = Collect::default();
        let (logger, _) = Builder::new()
            .filter_level(LevelFilter::Info)
            .format_timestamp(false)
            .format_module_path(true)
            .add_writer(Box::new(lines.clone()))
            .build();

        log_with(&logger, Level::Info, "first");
        log_with(&logger, Level::Debug, "filtered out");
        log_with(&logger, Level::Error, "second\nline");

        assert_eq!(
            *lines.0.lock().unwrap(),
            [
                "[INFO  app::module app] first\n",
                "[ERROR app::module app] second\n    line\n",
            ]
        );
    }

    #[test]
    fn logger_with_custom_format_and_two_writers() {
        let first = Collect::default();
        let second = Collect::default();
        let (logger, _) = Builder::new()
            .filter_level(LevelFilter::Trace)
            .format(|stream, record| {
                stream
                    .push(record.level().as_str())
                    .push(':')
                    .push(record.target());
                Ok(())
            })
            .add_writer(Box::new(first.clone()))
            .add_writer(Box::new(second.clone()))
            .build();

        log_with(&logger, Level::Trace, "ignored");

        assert_eq!(*first.0.lock().unwrap(), ["TRACE:app"]);
        assert_eq!(*second.0.lock().unwrap(), ["TRACE:app"]);
    }

    #[test]
    fn failed_format_is_not_printed() {
        let lines = Collect::default();
        let (logger, _) = Builder::new()
            .filter_level(LevelFilter::Info)
            .format(|stream, record| {
                stream.push("partial ");
                if record.level() == Level::Error {
                    return Err(std::fmt::Error);
                }
                stream.push(record.target());
                Ok(())
            })
            .add_writer(Box::new(lines.clone()))
            .build();

        log_with(&logger, Level::Error, "broken");
        log_with(&logger, Level::Info, "fine");

        assert_eq!(*lines.0.lock().unwrap(), ["partial app"]);
    }

    #[test]
    fn builder_filter_directives() {
        let (logger, _) = Builder::new()
            .parse_filters("debug,crate1::mod1=error,crate2=info")
            .build();
        assert_eq!(logger.filter(), LevelFilter::Debug);

        let (logger, _) = Builder::new().parse_filters("info,app::db").build();
        assert_eq!(logger.filter(), LevelFilter::Trace);

        let (logger, _) = Builder::new()
            .filter(None, LevelFilter::Warn)
            .filter_module("app", LevelFilter::Info)
            .build();
        assert_eq!(logger.filter(), LevelFilter::Info);
    }

    #[test]
    fn config_swaps_filter_of_built_logger() {
        let lines = Collect::default();
        let (logger, config) = Builder::new()
            .parse_filters("error")
            .format_timestamp(false)
            .format_target(false)
            .add_writer(Box::new(lines.clone()))
            .build();

        log_with(&logger, Level::Warn, "dropped");
        config.update_filters("warn");
        log_with(&logger, Level::Warn, "kept");

        assert_eq!(logger.filter(), LevelFilter::Warn);
        assert_eq!(*lines.0.lock().unwrap(), ["[WARN ] kept\n"]);
    }

    #[test]
    fn update_filter_at_runtime() {
        let config = init_log(&LogSettings {
            enable_console: true,
            in_memory_records: 0,
            log_filter: "debug".to_string(),
        })
        .unwrap();

        debug!("This one should be printed");
        info!("This one should be printed");

        config.update_filters("error");

        debug!("This one should NOT be printed");
        info!("This one should NOT be printed");

        config.update_filters("info");

        debug!("This one should NOT be printed");
        info!("This one should be printed");

        assert!(init_log(&LogSettings::default()).is_err());
    }
}

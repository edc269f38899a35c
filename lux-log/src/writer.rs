use std::sync::{Mutex, MutexGuard, PoisonError};

use ringbuffer::{AllocRingBuffer, RingBuffer};
use serde::Serialize;

use crate::platform;
use crate::stream::buffer::SmallBuffer;

/// A trait for the object that consumes already formatted log line.
///
/// The buffer is only lent for the duration of the call: it is reset as soon
/// as every writer has seen it.
pub trait Writer: Send + Sync {
    fn print(&self, buf: &SmallBuffer) -> std::io::Result<()>;
}

/// Writer implementation that forwards every line to each of its writers
#[derive(Default)]
pub struct MultiWriter {
    pub(crate) writers: Vec<Box<dyn Writer>>,
}

impl MultiWriter {
    /// Add a new writer
    pub fn add(&mut self, writer: Box<dyn Writer>) {
        self.writers.push(writer)
    }
}

impl Writer for MultiWriter {
    fn print(&self, buf: &SmallBuffer) -> std::io::Result<()> {
        for writer in &self.writers {
            writer.print(buf)?;
        }
        Ok(())
    }
}

/// Writer implementation that prints the given data to the console
pub struct ConsoleWriter {}

impl Writer for ConsoleWriter {
    fn print(&self, buf: &SmallBuffer) -> std::io::Result<()> {
        platform::print(buf.data())
    }
}

const INIT_LOG_CAPACITY: usize = 128;

type LogRecordsBuffer = AllocRingBuffer<String>;

struct LogRecords {
    capacity: usize,
    /// Number of records written since the buffer was (re)initialized
    count: usize,
    /// Allocated on the first stored line, never while `capacity` is 0
    records: Option<LogRecordsBuffer>,
}

impl LogRecords {
    const fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            count: 0,
            records: None,
        }
    }

    fn push(&mut self, line: String) {
        if self.capacity == 0 {
            return;
        }

        let capacity = self.capacity;
        self.records
            .get_or_insert_with(|| LogRecordsBuffer::new(capacity))
            .push(line);
        self.count += 1;
    }
}

/// One store for the whole process, whichever thread logs.
static LOG_RECORDS: Mutex<LogRecords> = Mutex::new(LogRecords::with_capacity(INIT_LOG_CAPACITY));

fn log_records() -> MutexGuard<'static, LogRecords> {
    LOG_RECORDS.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Writer that stores lines in a process-wide circular buffer.
///
/// Once the buffer is full the oldest line is dropped for every new one.
/// Lines written on any thread are read back through [`take_records`](Self::take_records).
pub struct InMemoryWriter {}

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct Logs {
    /// the list of logs
    pub logs: Vec<Log>,
    /// the count of logs written so far
    pub all_logs_count: usize,
}

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct Log {
    /// the log text
    pub log: String,
    /// the offset of the log
    pub offset: usize,
}

impl InMemoryWriter {
    /// Replaces the buffer with an empty one holding up to `capacity` lines.
    pub fn init_buffer(capacity: usize) {
        *log_records() = LogRecords::with_capacity(capacity);
    }

    /// Returns up to `max_count` lines starting at `from_offset`.
    ///
    /// Offsets count every line ever written. Lines already evicted from the
    /// buffer are skipped, so the first returned offset may be larger than
    /// `from_offset`.
    pub fn take_records(max_count: usize, from_offset: usize) -> Logs {
        let records = log_records();
        let all_logs_count = records.count;

        let stored = match &records.records {
            Some(stored) if from_offset < all_logs_count => stored,
            _ => {
                return Logs {
                    all_logs_count,
                    logs: vec![],
                }
            }
        };

        let first_offset = all_logs_count - stored.len();
        let start = from_offset.max(first_offset);

        let logs = stored
            .iter()
            .skip(start - first_offset)
            .take(max_count)
            .enumerate()
            .map(|(index, log)| Log {
                log: log.clone(),
                offset: start + index,
            })
            .collect();

        Logs {
            all_logs_count,
            logs,
        }
    }
}

impl Writer for InMemoryWriter {
    fn print(&self, buf: &SmallBuffer) -> std::io::Result<()> {
        let line = buf.to_string_lossy();
        log_records().push(line);
        Ok(())
    }
}

#[cfg(test)]
pub mod tests {
    use std::thread;

    use super::*;

    const LOG_RECORDS_MAX_COUNT: usize = 8;

    /// Serializes the tests sharing the process-wide store.
    static STORE: Mutex<()> = Mutex::new(());

    fn lock_store(capacity: usize) -> MutexGuard<'static, ()> {
        let guard = STORE.lock().unwrap_or_else(PoisonError::into_inner);
        InMemoryWriter::init_buffer(capacity);
        guard
    }

    fn clear_memory_records() -> MutexGuard<'static, ()> {
        lock_store(LOG_RECORDS_MAX_COUNT)
    }

    fn stored_records() -> Vec<String> {
        log_records()
            .records
            .as_ref()
            .map(|stored| stored.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn log(text: &str, offset: usize) -> Log {
        Log {
            log: text.to_string(),
            offset,
        }
    }

    #[test]
    fn test_memory_writer_append() {
        let _store = clear_memory_records();

        let writer = InMemoryWriter {};
        writer.print(&"some data".into()).unwrap();

        assert_eq!(stored_records(), ["some data"]);
        assert_eq!(InMemoryWriter::take_records(10, 0).all_logs_count, 1);

        writer.print(&"some more data".into()).unwrap();

        assert_eq!(stored_records(), ["some data", "some more data"]);
        assert_eq!(InMemoryWriter::take_records(10, 0).all_logs_count, 2);
    }

    #[test]
    fn test_memory_writer_take_data_with_empty_buffer() {
        let _store = clear_memory_records();

        for (max_count, from_offset) in [
            (0, 0),
            (1, 0),
            (0, 3),
            (2, LOG_RECORDS_MAX_COUNT),
            (3, LOG_RECORDS_MAX_COUNT + 1),
        ] {
            assert_eq!(
                InMemoryWriter::take_records(max_count, from_offset),
                Logs {
                    logs: vec![],
                    all_logs_count: 0,
                }
            );
        }
    }

    #[test]
    fn test_memory_writer_take_data_with_two_entries_in_buffer() {
        let _store = clear_memory_records();

        let writer = InMemoryWriter {};
        writer.print(&"some data 1".into()).unwrap();
        writer.print(&"some data 2".into()).unwrap();

        let take = InMemoryWriter::take_records;

        assert!(take(0, 0).logs.is_empty());
        assert_eq!(take(1, 0).logs, vec![log("some data 1", 0)]);
        assert_eq!(take(1, 1).logs, vec![log("some data 2", 1)]);
        assert_eq!(
            take(2, 0).logs,
            vec![log("some data 1", 0), log("some data 2", 1)]
        );
        assert!(take(0, 3).logs.is_empty());
        assert!(take(2, LOG_RECORDS_MAX_COUNT).logs.is_empty());
        assert_eq!(take(2, 0).all_logs_count, 2);
    }

    #[test]
    fn test_memory_writer_take_data_with_full_buffer() {
        let _store = clear_memory_records();
        let writer = InMemoryWriter {};

        for i in 0..LOG_RECORDS_MAX_COUNT {
            writer.print(&format!("{i}").into()).unwrap();
        }

        let res = InMemoryWriter::take_records(2, 1);
        assert_eq!(
            res,
            Logs {
                logs: vec![log("1", 1), log("2", 2)],
                all_logs_count: LOG_RECORDS_MAX_COUNT,
            }
        );
    }

    #[test]
    fn test_circular_overwrite() {
        let _store = clear_memory_records();

        let writer = InMemoryWriter {};
        for i in 0..(LOG_RECORDS_MAX_COUNT + 2) {
            writer.print(&format!("{i}").into()).unwrap();
        }

        let expected: Vec<String> = (2..(LOG_RECORDS_MAX_COUNT + 2))
            .map(|i| format!("{i}"))
            .collect();
        assert_eq!(stored_records(), expected);

        // Evicted offsets are skipped.
        let res = InMemoryWriter::take_records(2, 0);
        assert_eq!(res.logs, vec![log("2", 2), log("3", 3)]);
        assert_eq!(res.all_logs_count, LOG_RECORDS_MAX_COUNT + 2);
    }

    #[test]
    fn test_disabled_buffer_keeps_nothing() {
        let _store = lock_store(0);

        let writer = InMemoryWriter {};
        writer.print(&"dropped".into()).unwrap();

        assert_eq!(InMemoryWriter::take_records(10, 0), Logs::default());
    }

    #[test]
    fn test_multi_writer_forwards_to_every_writer() {
        let _store = clear_memory_records();

        let mut writer = MultiWriter::default();
        writer.add(Box::new(InMemoryWriter {}));
        writer.add(Box::new(InMemoryWriter {}));
        writer.print(&"twice".into()).unwrap();

        assert_eq!(stored_records(), ["twice", "twice"]);
    }

    #[test]
    fn test_lines_from_other_threads_share_the_store() {
        let _store = lock_store(4);

        thread::spawn(|| {
            let writer = InMemoryWriter {};
            for i in 0..10 {
                writer.print(&format!("worker {i}").into()).unwrap();
            }
        })
        .join()
        .unwrap();

        let res = InMemoryWriter::take_records(10, 0);
        assert_eq!(res.all_logs_count, 10);
        assert_eq!(
            res.logs,
            vec![
                log("worker 6", 6),
                log("worker 7", 7),
                log("worker 8", 8),
                log("worker 9", 9),
            ]
        );
    }
}

use serde::{Deserialize, Serialize};

const DEFAULT_IN_MEMORY_RECORDS: usize = 1024;

/// Log settings to initialize the logger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Enable logging to the standard out
    pub enable_console: bool,
    /// Number of records to be stored in the circular memory buffer.
    /// Zero disables storing records.
    pub in_memory_records: usize,
    /// Log configuration as combination of filters.
    /// Example of valid configurations:
    /// - info
    /// - debug,crate1::mod1=error,crate1::mod2,crate2=debug
    pub log_filter: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            enable_console: true,
            in_memory_records: DEFAULT_IN_MEMORY_RECORDS,
            log_filter: "debug".to_string(),
        }
    }
}

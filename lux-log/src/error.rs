use log::SetLoggerError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to install the global logger: {0}")]
    SetLogger(#[from] SetLoggerError),
}

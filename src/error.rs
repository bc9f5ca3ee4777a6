use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StatsError>;

#[derive(Debug, Error)]
pub enum StatsError {
    /// Rejected before touching the store; never retried.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("data source error: {context}")]
    DataSource {
        context: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed {field} in row: {detail}")]
    Malformed { field: &'static str, detail: String },

    #[error("query timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

impl StatsError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn is_data_fault(&self) -> bool {
        !matches!(self, Self::InvalidInput(_))
    }
}

pub(crate) trait DataContext<T> {
    fn data_context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> DataContext<T> for std::result::Result<T, std::io::Error> {
    fn data_context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|source| StatsError::Io {
            context: context.into(),
            source,
        })
    }
}

impl<T> DataContext<T> for std::result::Result<T, rusqlite::Error> {
    fn data_context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|source| StatsError::DataSource {
            context: context.into(),
            source,
        })
    }
}

//! Persistence error taxonomy.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type PersistResult<T> = Result<T, PersistError>;

/// Failure raised by a persistence channel.
#[derive(Debug)]
pub enum PersistError {
    /// Durable write or read failed (quota, locked slot, unreachable file).
    Storage(String),
    /// Content is not a well-formed task list.
    Format(String),
    Db(DbError),
    Io(std::io::Error),
}

impl PersistError {
    /// Returns whether this is a storage-class failure rather than bad content.
    pub fn is_storage(&self) -> bool {
        !matches!(self, Self::Format(_))
    }
}

impl Display for PersistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(message) => write!(f, "storage failure: {message}"),
            Self::Format(message) => write!(f, "invalid task data: {message}"),
            Self::Db(err) => write!(f, "storage failure: {err}"),
            Self::Io(err) => write!(f, "file access failed: {err}"),
        }
    }
}

impl Error for PersistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Storage(_) | Self::Format(_) => None,
        }
    }
}

impl From<DbError> for PersistError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for PersistError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<std::io::Error> for PersistError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

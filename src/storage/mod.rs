mod db;
mod queries;
mod types;

use std::io;
use std::path::PathBuf;

use rusqlite::Connection;
use tokio::sync::{mpsc, oneshot};

pub use types::{Preference, USERNAME_KEY};

pub enum StorageLocation {
    Path(PathBuf),
    #[cfg(test)]
    InMemory,
}

#[derive(Debug)]
pub enum StorageError {
    Sqlite(rusqlite::Error),
    Channel(String),
    NoDbPathParent,
    IO(io::Error),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Sqlite(e) => write!(f, "Database error: {}", e),
            StorageError::Channel(msg) => write!(f, "Channel error: {}", msg),
            StorageError::NoDbPathParent => write!(f, "db path did not have a parent dir"),
            StorageError::IO(e) => write!(f, "io: {e}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::Sqlite(e)
    }
}

impl<T> From<mpsc::error::SendError<T>> for StorageError {
    fn from(e: mpsc::error::SendError<T>) -> Self {
        StorageError::Channel(e.to_string())
    }
}

impl<T> From<mpsc::error::TrySendError<T>> for StorageError {
    fn from(e: mpsc::error::TrySendError<T>) -> Self {
        StorageError::Channel(e.to_string())
    }
}

impl From<oneshot::error::RecvError> for StorageError {
    fn from(e: oneshot::error::RecvError) -> Self {
        StorageError::Channel(e.to_string())
    }
}

pub(crate) enum StorageCommand {
    GetPreference {
        key: String,
        reply: oneshot::Sender<Result<Option<Preference>, StorageError>>,
    },
    SetPreference {
        key: String,
        value: String,
        /// `None` when the caller does not wait for the write.
        reply: Option<oneshot::Sender<Result<Preference, StorageError>>>,
    },
    DeletePreference {
        key: String,
        reply: oneshot::Sender<Result<bool, StorageError>>,
    },
}

/// Handle to the preference store. Queries run on a dedicated thread.
#[derive(Clone)]
pub struct Storage {
    cmd_tx: mpsc::Sender<StorageCommand>,
}

impl Storage {
    pub fn open(location: StorageLocation) -> Result<Self, StorageError> {
        let (cmd_tx, cmd_rx) = mpsc::channel(64);

        let conn = match location {
            StorageLocation::Path(path) => {
                let parent = path.parent().ok_or(StorageError::NoDbPathParent)?;
                if !parent.exists() {
                    std::fs::create_dir_all(parent).map_err(StorageError::IO)?;
                }
                Connection::open(&path)?
            }
            #[cfg(test)]
            StorageLocation::InMemory => Connection::open_in_memory()?,
        };

        db::create_schema(&conn)?;
        std::thread::spawn(move || {
            db::run_worker(conn, cmd_rx);
        });

        Ok(Self { cmd_tx })
    }

    pub async fn get_preference(&self, key: &str) -> Result<Option<Preference>, StorageError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(StorageCommand::GetPreference {
                key: key.to_string(),
                reply: tx,
            })
            .await?;
        rx.await?
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub async fn set_preference(&self, key: &str, value: &str) -> Result<Preference, StorageError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(StorageCommand::SetPreference {
                key: key.to_string(),
                value: value.to_string(),
                reply: Some(tx),
            })
            .await?;
        rx.await?
    }

    /// Enqueue a write without waiting for it. Writes apply in call order.
    pub fn queue_preference(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.cmd_tx.try_send(StorageCommand::SetPreference {
            key: key.to_string(),
            value: value.to_string(),
            reply: None,
        })?;
        Ok(())
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub async fn delete_preference(&self, key: &str) -> Result<bool, StorageError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(StorageCommand::DeletePreference {
                key: key.to_string(),
                reply: tx,
            })
            .await?;
        rx.await?
    }

    /// The remembered display name, if one was ever committed.
    pub async fn username(&self) -> Result<Option<String>, StorageError> {
        Ok(self
            .get_preference(USERNAME_KEY)
            .await?
            .map(|preference| preference.value))
    }
}

use rusqlite::Connection;
use tokio::sync::mpsc;

use super::StorageCommand;
use super::StorageError;
use super::queries;

const SCHEMA: &str = include_str!("sql/schema.sql");

/// Create the preference table if this database has never been opened.
pub fn create_schema(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Serve commands until every `Storage` handle is dropped.
pub fn run_worker(conn: Connection, mut cmd_rx: mpsc::Receiver<StorageCommand>) {
    while let Some(cmd) = cmd_rx.blocking_recv() {
        match cmd {
            StorageCommand::GetPreference { key, reply } => {
                let result = queries::get_preference(&conn, &key);
                let _ = reply.send(result);
            }
            StorageCommand::SetPreference { key, value, reply } => {
                let result = queries::set_preference(&conn, &key, &value);
                if let Err(e) = &result {
                    tracing::warn!(%key, error = %e, "failed to save preference");
                }
                if let Some(reply) = reply {
                    let _ = reply.send(result);
                }
            }
            StorageCommand::DeletePreference { key, reply } => {
                let result = queries::delete_preference(&conn, &key);
                let _ = reply.send(result);
            }
        }
    }
    tracing::trace!("storage worker stopped");
}

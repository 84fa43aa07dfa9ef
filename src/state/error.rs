use crate::db::DbError;

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("settings database: {0}")]
    Db(#[from] DbError),
    #[error("snapshot encoding: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("settings backend: {0}")]
    Backend(String),
}

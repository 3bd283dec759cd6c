use chatfold_core::FolderId;
use thiserror::Error;

/// Failure of the key-value persistence boundary.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Invalid folder/chat input, rejected before the store is touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FolderError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("name is longer than {max} characters")]
    NameTooLong { max: usize },

    #[error("no folder with id {0}")]
    FolderNotFound(FolderId),

    #[error("select a folder first")]
    NoFolderSelected,
}

pub mod context;
pub mod error;
pub mod folders;
pub mod kv;
pub mod paths;

pub use context::NavigationContext;
pub use error::{FolderError, StorageError};
pub use folders::FolderStore;
pub use kv::{write_atomic, FileKvStore, KvStore, MemoryKvStore};
pub use paths::StorePaths;

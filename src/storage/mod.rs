mod kv_storage;
mod local_storage;
mod memory_storage;
mod s3_storage;
mod sqlite_storage;
mod storage_url;

pub use kv_storage::{ArcStorage, KvStorage};
pub use local_storage::LocalStorage;
pub use memory_storage::InMemoryStorage;
pub use s3_storage::S3Storage;
pub use sqlite_storage::SqliteStorage;
pub use storage_url::open_url;

pub mod db;
pub mod error;
pub mod job_store;
pub mod memory;
pub mod mention_store;
pub mod traits;

pub use db::init_pg_pool;
pub use error::StoreError;
pub use job_store::PgJobStore;
pub use memory::{MemoryJobStore, MemoryMentionStore};
pub use mention_store::PgMentionStore;
pub use traits::{JobStore, MentionStore};

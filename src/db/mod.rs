pub mod error;
pub mod migrations;
pub mod repository;
pub mod store;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use store::{SqliteStore, StoreOptions};
pub use traits::{HabitStore, RecordStore};

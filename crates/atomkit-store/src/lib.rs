//! Record store seam for atomkit.
//!
//! [`RecordStore`] is the boundary between the transaction coordinator and
//! whatever actually holds the records. Two implementations ship here:
//! [`MemoryStore`] and [`JsonFileStore`].

mod error;
mod file;
mod memory;
mod store;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{Result, StoreError};
pub use file::JsonFileStore;
pub use memory::{DEFAULT_ID_FIELD, MemoryStore};
pub use store::{RecordStore, StoreMethod};

//! Storage abstractions and backends.
//!
//! - **traits**: the `CustodyStore` trait consumed by the custody service
//! - **types**: samples, transfers, and query builders
//! - **sqlite**: the SQLite implementation

pub mod sqlite;
pub mod traits;
pub mod types;

pub use sqlite::SqliteStore;
pub use traits::CustodyStore;
pub use types::{CustodyTransfer, Location, NewSample, Sample, SampleFilter, StatusUpdate};

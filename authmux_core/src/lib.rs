pub mod adapters;
pub mod core;
pub mod storage;
pub mod utils;

// re‑export ergonomic entry points
pub use self::core::errors::{Error, Result};
pub use self::core::manager::{DoctorReport, Manager, StatusRow};
pub use self::storage::state::{Profile, RegistryState, Tool};
pub use self::storage::store::RegistryStore;

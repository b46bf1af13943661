pub mod state;
pub mod store;

// Re-export the modules here for easy import elsewhere.
pub use state::*;
pub use store::*;

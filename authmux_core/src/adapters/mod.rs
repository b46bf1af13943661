pub mod adapter;
pub mod claude;
pub mod codex;

// Re-export the modules here for easy import elsewhere.
pub use adapter::{Adapter, AdapterSet, ToolStatus};
pub use claude::ClaudeAdapter;
pub use codex::CodexAdapter;

pub mod config;
pub mod library;
pub mod prompt;
pub mod text;
pub mod types;

// Keep the public surface small and intentional.
pub use config::*;
pub use library::*;
pub use prompt::*;
pub use text::*;
pub use types::*;

pub mod coordinator;
pub mod error;
pub mod images;
pub mod library;
pub mod poll;
pub mod session;
pub mod stream;
pub mod traits;
pub mod translation;
pub mod video;

pub use coordinator::{CoordinatorEvent, EngineConfig, GenerationCoordinator, JobHandle, StartOutcome};
pub use error::{ErrorKind, GenerationError};
pub use library::SavedStories;
pub use poll::PollPolicy;
pub use session::*;
pub use video::{VideoEvent, VideoSettings};

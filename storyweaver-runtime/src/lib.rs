pub mod config_store;
pub mod defaults;
pub mod files;
pub mod gemini_backend;
pub mod library_store;
pub mod media;
pub mod runtime_engine;
pub mod secrets;

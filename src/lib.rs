pub mod config;
pub mod error;
pub mod intent;
pub mod kernel;
pub mod outputs;
pub mod registry;
pub mod tools;

// Re-export specific items if needed for convenient access
pub use config::EngineConfig;
pub use kernel::engine::Engine;
pub use kernel::reply::Reply;
pub use registry::ToolRegistry;

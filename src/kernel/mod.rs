pub mod dialogue;
pub mod dispatcher;
pub mod engine;
pub mod reply;
pub mod telemetry;
pub mod time;

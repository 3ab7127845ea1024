// Library interface for pitchside modules
// This allows tests and the binary to import modules

pub mod llm;
pub mod news;
pub mod server;
pub mod storage;
pub mod subscriptions;

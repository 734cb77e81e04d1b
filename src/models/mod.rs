//! Domain models for topics, commands, and delivered messages.

pub mod command;
pub mod message;
pub mod topic;

pub use command::{Command, CommandKind};
pub use message::Message;
pub use topic::Topic;

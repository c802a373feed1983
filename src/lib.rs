//! Human-in-the-loop tool execution for chat agents
//!
//! Tool calls that need a person's consent are paused in the conversation
//! until the user approves or denies them. A resolution pass then runs the
//! approved executors, records denials, and streams each outcome back to
//! the client.

pub mod api;
pub mod channel;
pub mod config;
pub mod conversation;
pub mod resolver;
pub mod tools;

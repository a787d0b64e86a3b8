//! Command parsing and dispatch, independent of any chat transport

pub mod command;
pub mod dispatcher;
pub mod mention;

pub use command::Command;
pub use dispatcher::Dispatcher;
pub use mention::{strip_mention, unescape};

//! Small platform helpers used by the commands.

pub mod clipboard;

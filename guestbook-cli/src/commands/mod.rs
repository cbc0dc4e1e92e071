//! Subcommand implementations.

pub mod delete;
pub mod list;
pub mod publish;
pub mod watch;
pub mod whoami;

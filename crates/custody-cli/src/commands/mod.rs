//! Command handlers, one module per command group.

pub mod codec;
pub mod init;
pub mod maintenance;
pub mod samples;
pub mod transfers;

//! CLI command modules.

pub mod blocks;
pub mod http;
pub mod sessions;
pub mod status;

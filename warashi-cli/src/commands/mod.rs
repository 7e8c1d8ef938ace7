//! CLI subcommands.

pub mod config;
pub mod perf;
pub mod simulate;
mod world;

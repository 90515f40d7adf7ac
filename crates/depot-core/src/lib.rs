//! depot-core — wire protocol text and configuration.
//! Both depot binaries depend on this one.

pub mod config;
pub mod wire;

pub use wire::Command;

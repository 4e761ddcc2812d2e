//! Command-line interface for running the proxy and inspecting its configuration

pub mod server;

pub use server::*;

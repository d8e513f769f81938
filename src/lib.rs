//! Control and observability dashboard for an external traffic generator.
//!
//! The generator communicates only through files (two line-oriented config
//! files it reads, a stats snapshot and a log it writes) and its service
//! manager. This crate mirrors that on-disk state over a small JSON API and
//! renders it in a browser or terminal.

pub mod cli;
pub mod client;
pub mod config;
pub mod logging;
pub mod probe;
pub mod store;
pub mod telemetry;
pub mod utils;
pub mod web;

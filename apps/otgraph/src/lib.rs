//! # otgraph
//!
//! Library half of the otgraph binary: HTTP API, CLI and configuration
//! wrapped around [`otgraph_core`].

pub mod api;
pub mod cli;
pub mod config;

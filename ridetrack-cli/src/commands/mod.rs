//! CLI command implementations.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (init, show, path)
//! - [`maps`] - One-shot mapping queries (search, place, geocode, eta, route, decode)
//! - [`track`] - Live tracking session

pub mod common;
pub mod config;
pub mod maps;
pub mod track;

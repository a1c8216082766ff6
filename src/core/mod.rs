// ZoneLens - core/mod.rs
//
// Core business logic layer.
// Dependencies: standard library, regex, serde derives.
// Must NOT depend on: app, platform, or any I/O crate directly.

pub mod model;
pub mod pattern;
pub mod provider;
pub mod resolver;
pub mod tree;

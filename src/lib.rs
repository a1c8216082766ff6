// ZoneLens - lib.rs
//
// Library entry point, exposing the zone engine, backends, and controllers
// for integration testing and programmatic use.
//
// The command-line front end lives in `main.rs` / `cli.rs` and is not part of
// the library surface.

pub mod app;
pub mod core;
pub mod platform;
pub mod util;

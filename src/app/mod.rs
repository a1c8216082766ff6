// ZoneLens - app/mod.rs
//
// Application layer: controllers that drive the core engine from an event
// loop, and persisted preferences.
// Dependencies: core layer, provider trait, util.
// Must NOT depend on: concrete backends (tests excepted).

pub mod debounce;
pub mod settings;
pub mod store;

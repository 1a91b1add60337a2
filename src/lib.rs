// Library target for benchmarks and integration tests.
// The binary entry point is main.rs; this file re-declares the module tree so
// that harnesses can import types via `codetype::engine::*`, `codetype::sync::*`, etc.
// The UI and app controller are only driven by the binary.
#![allow(dead_code)]

pub mod api;
pub mod config;
pub mod engine;
pub mod session;
pub mod store;
pub mod sync;

mod app;
mod event;
mod telemetry;
mod ui;

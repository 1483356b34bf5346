//! Nameplate bot library
//!
//! The deliverable is the bot binary in `main.rs`; the library target exposes
//! the processing modules so integration tests and benchmarks can reach them.

pub mod config;
pub mod imaging;
pub mod nameplate;
pub mod ocr;
pub mod pipeline;
pub mod registry;
pub mod report;
pub mod routes;
pub mod state;
pub mod telegram;

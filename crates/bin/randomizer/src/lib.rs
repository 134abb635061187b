//! # randomizer
//!
//! Composition root. Parses the command line and configuration, picks the
//! Hue bridge or the virtual one, and runs the effect service.
//!
//! ## Dependency rule
//! This is the **only** crate that depends on every adapter. Effect logic
//! lives in `randomizer-app`; this crate only wires and renders.

pub mod cli;
pub mod config;
pub mod runner;

//! # randomizer-domain
//!
//! Pure domain model for the light randomizer effect.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Groups** (rooms and zones that own a set of lights)
//! - Define **Colors** and the conversions that make every color mode comparable
//! - Define **Light state** (reported, desired, and captured before an effect)
//! - Define the **Effect session** lifecycle and its reports
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod color;
pub mod effect;
pub mod group;
pub mod light;
pub mod snapshot;

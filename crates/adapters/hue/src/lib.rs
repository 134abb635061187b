//! # randomizer-adapter-hue
//!
//! Philips Hue adapter. Implements the
//! [`DeviceGateway`](randomizer_app::ports::DeviceGateway) and
//! [`GroupCatalog`](randomizer_app::ports::GroupCatalog) ports over the
//! bridge's CLIP v2 HTTPS API.
//!
//! ## Resources used
//!
//! | Method | Path                                   | Purpose                      |
//! |--------|----------------------------------------|------------------------------|
//! | GET    | `/clip/v2/resource/light[/{id}]`       | Read light state             |
//! | PUT    | `/clip/v2/resource/light/{id}`         | Write one light              |
//! | PUT    | `/clip/v2/resource/grouped_light/{id}` | Write every light of a group |
//! | GET    | `/clip/v2/resource/{room,zone}[/{id}]` | List and look up groups      |
//!
//! Every request carries the `hue-application-key` header.

pub mod client;
pub mod config;
pub mod error;
mod wire;

pub use client::HueBridge;
pub use config::HueConfig;
pub use error::HueError;

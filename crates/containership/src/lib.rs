// crates/containership/src/lib.rs
// ContainerShip - streaming Dockerfile analysis client

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod config;
pub mod document;
pub mod error;
pub mod http;
pub mod ingest;
pub mod stream;
pub mod transport;
pub use error::{ContainershipError, Result};

#![no_std]

#[cfg(any(feature = "alloc", test))]
extern crate alloc;

// Shared telemetry logic for the ground station and its bench tooling.
//
// Framing, parsing, simulation and the source traits stay free of the Rust
// standard library so the same code can run on a receiver MCU. The rolling
// window and the ingestion pipeline need a heap and sit behind `alloc`.

pub mod config;
pub mod fields;
pub mod framing;
#[cfg(feature = "alloc")]
pub mod pipeline;
pub mod record;
pub mod simulation;
pub mod source;
pub mod stats;
pub mod status;
#[cfg(feature = "alloc")]
pub mod window;
pub mod wire;

//! Infrastructure adapters: external tools, HTTP surface, telemetry.

pub mod error;
pub mod http;
pub mod telemetry;
pub mod toolchain;

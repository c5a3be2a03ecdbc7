//! Application services orchestrating domain rules and infrastructure ports.

pub mod compile;
pub mod error;

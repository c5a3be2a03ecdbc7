//! Core request and artifact types, independent of HTTP and process plumbing.

pub mod document;
pub mod error;

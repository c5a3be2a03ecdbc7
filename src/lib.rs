//! LaTeX to PDF compilation service.
//!
//! Markup posted to `/compile` is staged into a throwaway directory, run
//! through `pdflatex` a fixed number of times, checked with `pdfinfo`, and
//! returned as a PDF download.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;

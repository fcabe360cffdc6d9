//! Distillation pipeline for fetched pages.
//!
//! Ties together main-content cleaning, Markdown generation with citations,
//! chunking, and relevance ranking (see [`Distiller`]).

pub mod pipeline;

pub use pipeline::{DistillConfig, DistilledPage, Distiller, compute_hash};

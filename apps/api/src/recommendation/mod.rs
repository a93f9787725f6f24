//! Candidate recommendation pipeline.
//!
//! prompt_builder → provider (via orchestrator fallback) → extractor →
//! normalizer → evidence → contact_link.

pub mod contact_link;
pub mod error;
pub mod evidence;
pub mod extractor;
pub mod handlers;
pub mod models;
pub mod normalizer;
pub mod orchestrator;
pub mod prompt_builder;
pub mod prompts;

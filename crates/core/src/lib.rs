//! Core generation machinery for the coursecraft service.
//!
//! This crate knows nothing about HTTP. It provides the LLM client
//! abstraction, the incremental stage pipeline, and the three concrete
//! course-authoring stages that the API service composes into endpoints.

pub mod llm_client;
pub mod pipeline;
pub mod stages;

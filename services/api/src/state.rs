//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds all shared,
//! clonable resources: the session store and the three stage pipelines.

use crate::store::SessionStore;
use coursecraft_core::{
    pipeline::StagePipeline,
    stages::{LessonsStage, OutlineStage, RefineStage},
};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<dyn SessionStore>,
    pub outline_pipeline: Arc<StagePipeline<OutlineStage>>,
    pub lessons_pipeline: Arc<StagePipeline<LessonsStage>>,
    pub refine_pipeline: Arc<StagePipeline<RefineStage>>,
}

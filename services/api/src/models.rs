//! API Models
//!
//! Request payloads and the stored session record, shared between the
//! handlers and the OpenAPI documentation generated with `utoipa`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A course-authoring session and its committed artifacts.
///
/// `outline` and `lessons` start unset; each streaming stage overwrites its
/// field as fragments arrive, so after a clean stream the stored value is
/// the full generated text.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct Session {
    #[schema(value_type = String, format = Uuid)]
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub outline: Option<String>,
    pub lessons: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, ToSchema)]
pub struct CourseInput {
    #[schema(example = "Quantum Mechanics")]
    pub title: String,
    #[schema(example = "An introductory course covering wave functions and operators.")]
    pub description: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RefinementInput {
    #[schema(value_type = String, format = Uuid)]
    pub session_id: Uuid,
    #[schema(example = "Make the lessons shorter.")]
    pub feedback: String,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

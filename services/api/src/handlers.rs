//! Axum Handlers for the Streaming Endpoints
//!
//! Each streaming handler validates its input up front and answers with a
//! server-sent event stream. Once the stream is open, response headers are
//! committed: a generation failure can only surface as an abnormal
//! connection close, and frames already delivered are not retracted.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        IntoResponse, Json, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use coursecraft_core::{
    pipeline::{GenerationError, StageEvent},
    stages::{LessonsInput, OutlineInput, RefineInput},
};
use futures_util::{Stream, StreamExt, stream};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    models::{CourseInput, ErrorResponse, RefinementInput, Session},
    protocol::{LessonsPayload, OutlinePayload, StreamFrame},
    state::AppState,
};

/// Upper bound on the course description, in whitespace-separated words.
const MAX_DESCRIPTION_WORDS: usize = 200;

pub enum ApiError {
    /// Bad input shape or size. Rejected before any stream opens.
    Validation(String),
    /// A required prior-stage artifact is missing.
    Precondition(String),
    NotFound(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(message) | ApiError::Precondition(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { message })).into_response()
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse { message })).into_response()
            }
            ApiError::Internal(err) => {
                error!("Internal Server Error: {:?}", err);
                let message = "An internal server error occurred.".to_string();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse { message }),
                )
                    .into_response()
            }
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Internal(err.into())
    }
}

/// Wraps a frame stream as an SSE response.
///
/// A frame that fails to serialize becomes an empty object rather than
/// killing the stream; a generation error terminates the connection.
fn sse_response<S>(frames: S) -> Sse<impl Stream<Item = Result<Event, GenerationError>>>
where
    S: Stream<Item = Result<StreamFrame, GenerationError>>,
{
    let events = frames.map(|frame| {
        frame.map(|frame| {
            let data = serde_json::to_string(&frame).unwrap_or_else(|_| "{}".to_string());
            Event::default().data(data)
        })
    });
    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Create a session and stream the generated course outline.
#[utoipa::path(
    post,
    path = "/stream_outline",
    request_body = CourseInput,
    responses(
        (status = 200, description = "SSE stream: a session-id preamble, then accumulated outline frames"),
        (status = 400, description = "Description too long", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn stream_outline(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CourseInput>,
) -> Result<impl IntoResponse, ApiError> {
    let word_count = payload.description.split_whitespace().count();
    if word_count > MAX_DESCRIPTION_WORDS {
        return Err(ApiError::Validation(format!(
            "Description is too long ({} words). Maximum allowed is {}.",
            word_count, MAX_DESCRIPTION_WORDS
        )));
    }

    let session_id = state.sessions.create(&payload.title, &payload.description);
    info!(%session_id, title = %payload.title, "Created session, streaming outline");

    let input = OutlineInput {
        title: payload.title,
        description: payload.description,
    };
    let frames = outline_frames(state, session_id, input).await?;
    Ok(sse_response(frames))
}

/// Stream detailed lessons generated from the session's stored outline.
#[utoipa::path(
    get,
    path = "/stream_lessons/{session_id}",
    responses(
        (status = 200, description = "SSE stream of accumulated lessons frames"),
        (status = 400, description = "No outline stored yet", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("session_id" = Uuid, Path, description = "Session ID")
    )
)]
pub async fn stream_lessons(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .sessions
        .get(session_id)
        .ok_or_else(|| ApiError::NotFound("Session not found.".to_string()))?;
    let outline = session
        .outline
        .ok_or_else(|| ApiError::Precondition("No outline found for this session.".to_string()))?;

    info!(%session_id, "Streaming lessons");
    let frames = lessons_frames(state, session_id, LessonsInput { outline }).await?;
    Ok(sse_response(frames))
}

/// Stream a refined version of the session's stored lessons.
#[utoipa::path(
    post,
    path = "/stream_refine_lessons",
    request_body = RefinementInput,
    responses(
        (status = 200, description = "SSE stream of accumulated refined-lessons frames"),
        (status = 400, description = "No lessons stored yet", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn stream_refine_lessons(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RefinementInput>,
) -> Result<impl IntoResponse, ApiError> {
    let session_id = payload.session_id;
    let session = state
        .sessions
        .get(session_id)
        .ok_or_else(|| ApiError::NotFound("Session not found.".to_string()))?;
    let lessons = session
        .lessons
        .ok_or_else(|| ApiError::Precondition("No lessons found to refine.".to_string()))?;

    info!(%session_id, "Streaming lesson refinement");
    let input = RefineInput {
        lessons,
        feedback: payload.feedback,
    };
    let frames = refine_frames(state, session_id, input).await?;
    Ok(sse_response(frames))
}

/// Fetch a session's committed artifacts.
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    responses(
        (status = 200, description = "Session details", body = Session),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "Session ID")
    )
)]
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .sessions
        .get(id)
        .ok_or_else(|| ApiError::NotFound(format!("Session with id '{}' not found", id)))?;

    Ok((StatusCode::OK, Json(session)))
}

/// Builds the outline event stream: a session-id preamble followed by one
/// frame per accumulation step. Every partial text is mirrored into the
/// store as it is emitted, so the stored outline always reflects the last
/// frame the client received.
async fn outline_frames(
    state: Arc<AppState>,
    session_id: Uuid,
    input: OutlineInput,
) -> Result<impl Stream<Item = Result<StreamFrame, GenerationError>>, GenerationError> {
    let updates = state.outline_pipeline.run(input).await?;
    let sessions = state.sessions.clone();

    let preamble = stream::once(async move { Ok(StreamFrame::SessionCreated { session_id }) });
    let frames = updates.filter_map(move |update| {
        let sessions = sessions.clone();
        async move {
            match update {
                Ok(StageEvent::Partial(snapshot)) => {
                    sessions.set_outline(session_id, snapshot.outline.clone());
                    Some(Ok(StreamFrame::Outline {
                        generate_outline: OutlinePayload {
                            outline: snapshot.outline,
                        },
                    }))
                }
                Ok(StageEvent::Complete(snapshot)) => {
                    sessions.set_outline(session_id, snapshot.outline);
                    info!(%session_id, "Outline generation complete");
                    None
                }
                Err(err) => Some(Err(err)),
            }
        }
    });
    Ok(preamble.chain(frames))
}

/// Builds the lessons event stream, mirroring each partial text into the store.
async fn lessons_frames(
    state: Arc<AppState>,
    session_id: Uuid,
    input: LessonsInput,
) -> Result<impl Stream<Item = Result<StreamFrame, GenerationError>>, GenerationError> {
    let updates = state.lessons_pipeline.run(input).await?;
    let sessions = state.sessions.clone();

    Ok(updates.filter_map(move |update| {
        let sessions = sessions.clone();
        async move {
            match update {
                Ok(StageEvent::Partial(snapshot)) => {
                    sessions.set_lessons(session_id, snapshot.lessons.clone());
                    Some(Ok(StreamFrame::Lessons {
                        generate_lessons: LessonsPayload {
                            lessons: snapshot.lessons,
                        },
                    }))
                }
                Ok(StageEvent::Complete(snapshot)) => {
                    sessions.set_lessons(session_id, snapshot.lessons);
                    info!(%session_id, "Lessons generation complete");
                    None
                }
                Err(err) => Some(Err(err)),
            }
        }
    }))
}

/// Builds the refinement event stream. The refined text overwrites the
/// stored lessons; the previous lessons are discarded, not appended to.
async fn refine_frames(
    state: Arc<AppState>,
    session_id: Uuid,
    input: RefineInput,
) -> Result<impl Stream<Item = Result<StreamFrame, GenerationError>>, GenerationError> {
    let updates = state.refine_pipeline.run(input).await?;
    let sessions = state.sessions.clone();

    Ok(updates.filter_map(move |update| {
        let sessions = sessions.clone();
        async move {
            match update {
                Ok(StageEvent::Partial(snapshot)) => {
                    sessions.set_lessons(session_id, snapshot.refined_lessons.clone());
                    Some(Ok(StreamFrame::Refined {
                        refine_lessons: LessonsPayload {
                            lessons: snapshot.refined_lessons,
                        },
                    }))
                }
                Ok(StageEvent::Complete(snapshot)) => {
                    sessions.set_lessons(session_id, snapshot.refined_lessons);
                    info!(%session_id, "Lesson refinement complete");
                    None
                }
                Err(err) => Some(Err(err)),
            }
        }
    }))
}

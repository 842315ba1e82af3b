//! Incremental Stage Pipeline
//!
//! A stage run renders a prompt template, opens a streaming backend call,
//! and folds the incoming text fragments into an accumulator. Every
//! fragment yields an immutable snapshot combining the stage's fixed inputs
//! with the text generated so far, and the end of the backend stream yields
//! one explicit `Complete` event carrying the canonical final snapshot.

use crate::llm_client::{LLMClient, LLMStream, LLMStreamEvent};
use async_openai::error::OpenAIError;
use futures::{Stream, StreamExt, stream};
use std::{marker::PhantomData, pin::Pin, sync::Arc};
use tracing::debug;

/// Raised when the generation backend fails. The upstream cause is
/// preserved; the whole stage run aborts, no retry is attempted here.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The backend call could not be started (network, auth, rate limit).
    #[error("failed to start generation: {0}")]
    Connect(#[source] anyhow::Error),
    /// The backend stream failed after it was opened.
    #[error("generation stream failed: {0}")]
    Stream(#[from] OpenAIError),
}

/// Describes one generation stage: its input shape, the snapshot it emits,
/// and how its prompt template is filled in.
pub trait Stage: Send + Sync + 'static {
    /// The fixed inputs for one run.
    type Input: Send + 'static;
    /// The immutable state emitted after each appended fragment.
    type Snapshot: Send + 'static;

    /// The stage's wire name, used as the event key by the API layer.
    const NAME: &'static str;

    /// Fills the stage's prompt template with the input fields.
    /// Pure string substitution, no validation beyond placeholder presence.
    fn render_prompt(template: &str, input: &Self::Input) -> String;

    /// Combines the fixed inputs with the accumulated output so far.
    fn snapshot(input: &Self::Input, accumulated: &str) -> Self::Snapshot;
}

/// An update emitted by a running stage.
#[derive(Debug, Clone)]
pub enum StageEvent<S> {
    /// A snapshot with one more fragment appended.
    Partial(S),
    /// The canonical final snapshot, emitted exactly once after the backend
    /// signals completion. Consumers commit on this event rather than
    /// inferring finality from stream termination.
    Complete(S),
}

impl<S> StageEvent<S> {
    /// Returns the snapshot carried by this event.
    pub fn snapshot(&self) -> &S {
        match self {
            StageEvent::Partial(snapshot) | StageEvent::Complete(snapshot) => snapshot,
        }
    }

    /// True for the terminal `Complete` event.
    pub fn is_complete(&self) -> bool {
        matches!(self, StageEvent::Complete(_))
    }
}

/// A lazy, finite sequence of accumulation updates for one stage run.
pub type StageStream<S> =
    Pin<Box<dyn Stream<Item = Result<StageEvent<S>, GenerationError>> + Send>>;

/// Drives one generation stage against an `LLMClient`.
///
/// Each `run` call is independent; the pipeline holds no mutable state
/// across calls beyond its prompt template.
pub struct StagePipeline<S: Stage> {
    llm: Arc<dyn LLMClient>,
    template: String,
    _stage: PhantomData<S>,
}

impl<S: Stage> StagePipeline<S> {
    /// Creates a pipeline from a client and the stage's prompt template.
    pub fn new(llm: Arc<dyn LLMClient>, template: String) -> Self {
        Self {
            llm,
            template,
            _stage: PhantomData,
        }
    }

    /// Starts a stage run.
    ///
    /// Fragments are consumed in emission order and appended to an
    /// accumulator that starts empty. Every fragment yields a `Partial`
    /// snapshot; the end of the backend stream yields a single `Complete`
    /// snapshot holding the full text. A backend failure yields the error
    /// and ends the sequence.
    pub async fn run(&self, input: S::Input) -> Result<StageStream<S::Snapshot>, GenerationError> {
        let prompt = S::render_prompt(&self.template, &input);
        debug!(stage = S::NAME, "starting generation");
        let inner = self
            .llm
            .stream_completion(prompt)
            .await
            .map_err(GenerationError::Connect)?;
        Ok(Box::pin(accumulate::<S>(inner, input)))
    }
}

enum AccumulateState<S: Stage> {
    Streaming {
        inner: LLMStream,
        input: S::Input,
        accumulated: String,
    },
    Done,
}

/// Folds raw backend fragments into `StageEvent`s carrying growing snapshots.
fn accumulate<S: Stage>(
    inner: LLMStream,
    input: S::Input,
) -> impl Stream<Item = Result<StageEvent<S::Snapshot>, GenerationError>> {
    stream::unfold(
        AccumulateState::<S>::Streaming {
            inner,
            input,
            accumulated: String::new(),
        },
        |state| async move {
            match state {
                AccumulateState::Streaming {
                    mut inner,
                    input,
                    mut accumulated,
                } => match inner.next().await {
                    Some(Ok(LLMStreamEvent::TextChunk(chunk))) => {
                        accumulated.push_str(&chunk);
                        let snapshot = S::snapshot(&input, &accumulated);
                        Some((
                            Ok(StageEvent::Partial(snapshot)),
                            AccumulateState::Streaming {
                                inner,
                                input,
                                accumulated,
                            },
                        ))
                    }
                    Some(Err(err)) => {
                        Some((Err(GenerationError::Stream(err)), AccumulateState::Done))
                    }
                    None => {
                        debug!(
                            stage = S::NAME,
                            chars = accumulated.len(),
                            "generation finished"
                        );
                        let snapshot = S::snapshot(&input, &accumulated);
                        Some((Ok(StageEvent::Complete(snapshot)), AccumulateState::Done))
                    }
                },
                AccumulateState::Done => None,
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::MockLLMClient;
    use crate::stages::{OutlineInput, OutlineStage};
    use anyhow::anyhow;

    fn chunked(chunks: &[&str]) -> LLMStream {
        let items: Vec<Result<LLMStreamEvent, OpenAIError>> = chunks
            .iter()
            .map(|c| Ok(LLMStreamEvent::TextChunk(c.to_string())))
            .collect();
        Box::pin(stream::iter(items))
    }

    fn pipeline_with(chunks: Vec<&'static str>) -> StagePipeline<OutlineStage> {
        let mut llm = MockLLMClient::new();
        llm.expect_stream_completion()
            .returning(move |_| Ok(chunked(&chunks)));
        StagePipeline::new(
            Arc::new(llm),
            "Outline for {title}: {description}".to_string(),
        )
    }

    fn input() -> OutlineInput {
        OutlineInput {
            title: "AI".to_string(),
            description: "Intro to AI".to_string(),
        }
    }

    #[tokio::test]
    async fn run_renders_the_template_into_the_prompt() {
        let mut llm = MockLLMClient::new();
        llm.expect_stream_completion()
            .withf(|prompt| prompt == "Outline for AI: Intro to AI")
            .returning(|_| Ok(chunked(&[])));
        let pipeline: StagePipeline<OutlineStage> = StagePipeline::new(
            Arc::new(llm),
            "Outline for {title}: {description}".to_string(),
        );

        pipeline.run(input()).await.unwrap();
    }

    #[tokio::test]
    async fn snapshots_grow_by_prefix_extension() {
        let pipeline = pipeline_with(vec!["Module 1", "\nModule 2", "\nModule 3"]);
        let mut updates = pipeline.run(input()).await.unwrap();

        let mut partials = Vec::new();
        let mut finals = Vec::new();
        while let Some(event) = updates.next().await {
            match event.unwrap() {
                StageEvent::Partial(snapshot) => partials.push(snapshot.outline),
                StageEvent::Complete(snapshot) => finals.push(snapshot.outline),
            }
        }

        assert_eq!(partials.len(), 3);
        for pair in partials.windows(2) {
            assert!(pair[1].starts_with(&pair[0]));
        }
        assert_eq!(finals, vec!["Module 1\nModule 2\nModule 3"]);
    }

    #[tokio::test]
    async fn complete_snapshot_carries_the_fixed_inputs() {
        let pipeline = pipeline_with(vec!["text"]);
        let mut updates = pipeline.run(input()).await.unwrap();

        let mut last = None;
        while let Some(event) = updates.next().await {
            last = Some(event.unwrap());
        }
        let last = last.unwrap();
        assert!(last.is_complete());
        let snapshot = last.snapshot();
        assert_eq!(snapshot.title, "AI");
        assert_eq!(snapshot.description, "Intro to AI");
        assert_eq!(snapshot.outline, "text");
    }

    #[tokio::test]
    async fn empty_backend_stream_yields_one_empty_complete() {
        let pipeline = pipeline_with(vec![]);
        let mut updates = pipeline.run(input()).await.unwrap();

        match updates.next().await.unwrap().unwrap() {
            StageEvent::Complete(snapshot) => assert_eq!(snapshot.outline, ""),
            StageEvent::Partial(_) => panic!("expected a Complete event"),
        }
        assert!(updates.next().await.is_none());
    }

    #[tokio::test]
    async fn mid_stream_failure_aborts_the_run() {
        let mut llm = MockLLMClient::new();
        llm.expect_stream_completion().returning(|_| {
            Ok(Box::pin(stream::iter(vec![
                Ok(LLMStreamEvent::TextChunk("partial".to_string())),
                Err(OpenAIError::StreamError("connection reset".to_string())),
            ])))
        });
        let pipeline: StagePipeline<OutlineStage> =
            StagePipeline::new(Arc::new(llm), "{title} {description}".to_string());
        let mut updates = pipeline.run(input()).await.unwrap();

        match updates.next().await.unwrap().unwrap() {
            StageEvent::Partial(snapshot) => assert_eq!(snapshot.outline, "partial"),
            StageEvent::Complete(_) => panic!("expected a Partial event"),
        }
        assert!(matches!(
            updates.next().await.unwrap(),
            Err(GenerationError::Stream(_))
        ));
        // No Complete event follows a failure.
        assert!(updates.next().await.is_none());
    }

    #[tokio::test]
    async fn connect_failure_surfaces_before_any_event() {
        let mut llm = MockLLMClient::new();
        llm.expect_stream_completion()
            .returning(|_| Err(anyhow!("rate limited")));
        let pipeline: StagePipeline<OutlineStage> =
            StagePipeline::new(Arc::new(llm), "{title} {description}".to_string());

        let err = pipeline.run(input()).await.err().unwrap();
        assert!(matches!(err, GenerationError::Connect(_)));
    }
}

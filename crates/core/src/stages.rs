//! The three course-authoring stages.
//!
//! Each stage pairs a fixed-input struct with the snapshot type its runs
//! emit. Snapshots repeat the inputs alongside the monotonically growing
//! output field.

use crate::pipeline::Stage;
use serde::{Deserialize, Serialize};

// --- Outline ---

/// Fixed inputs for one outline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineInput {
    pub title: String,
    pub description: String,
}

/// Snapshot of an outline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineState {
    pub title: String,
    pub description: String,
    pub outline: String,
}

/// Generates a course outline from a title and description.
pub struct OutlineStage;

impl Stage for OutlineStage {
    type Input = OutlineInput;
    type Snapshot = OutlineState;

    const NAME: &'static str = "generate_outline";

    fn render_prompt(template: &str, input: &Self::Input) -> String {
        template
            .replace("{title}", &input.title)
            .replace("{description}", &input.description)
    }

    fn snapshot(input: &Self::Input, accumulated: &str) -> Self::Snapshot {
        OutlineState {
            title: input.title.clone(),
            description: input.description.clone(),
            outline: accumulated.to_string(),
        }
    }
}

// --- Lessons ---

/// Fixed inputs for one lessons run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonsInput {
    pub outline: String,
}

/// Snapshot of a lessons run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonsState {
    pub outline: String,
    pub lessons: String,
}

/// Expands a stored outline into detailed lessons.
pub struct LessonsStage;

impl Stage for LessonsStage {
    type Input = LessonsInput;
    type Snapshot = LessonsState;

    const NAME: &'static str = "generate_lessons";

    fn render_prompt(template: &str, input: &Self::Input) -> String {
        template.replace("{outline}", &input.outline)
    }

    fn snapshot(input: &Self::Input, accumulated: &str) -> Self::Snapshot {
        LessonsState {
            outline: input.outline.clone(),
            lessons: accumulated.to_string(),
        }
    }
}

// --- Refinement ---

/// Fixed inputs for one refinement run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefineInput {
    pub lessons: String,
    pub feedback: String,
}

/// Snapshot of a refinement run. The refined text replaces the stored
/// lessons; it does not append to them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefineState {
    pub lessons: String,
    pub feedback: String,
    pub refined_lessons: String,
}

/// Rewrites stored lessons according to user feedback.
pub struct RefineStage;

impl Stage for RefineStage {
    type Input = RefineInput;
    type Snapshot = RefineState;

    const NAME: &'static str = "refine_lessons";

    fn render_prompt(template: &str, input: &Self::Input) -> String {
        template
            .replace("{lessons}", &input.lessons)
            .replace("{feedback}", &input.feedback)
    }

    fn snapshot(input: &Self::Input, accumulated: &str) -> Self::Snapshot {
        RefineState {
            lessons: input.lessons.clone(),
            feedback: input.feedback.clone(),
            refined_lessons: accumulated.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outline_prompt_substitutes_title_and_description() {
        let input = OutlineInput {
            title: "Rust".to_string(),
            description: "Systems programming".to_string(),
        };
        let prompt = OutlineStage::render_prompt("Course {title}: {description}", &input);
        assert_eq!(prompt, "Course Rust: Systems programming");
    }

    #[test]
    fn lessons_prompt_substitutes_outline() {
        let input = LessonsInput {
            outline: "1. Ownership".to_string(),
        };
        let prompt = LessonsStage::render_prompt("Expand:\n{outline}", &input);
        assert_eq!(prompt, "Expand:\n1. Ownership");
    }

    #[test]
    fn refine_prompt_substitutes_lessons_and_feedback() {
        let input = RefineInput {
            lessons: "Lesson text".to_string(),
            feedback: "make it shorter".to_string(),
        };
        let prompt = RefineStage::render_prompt("{lessons} | {feedback}", &input);
        assert_eq!(prompt, "Lesson text | make it shorter");
    }

    #[test]
    fn snapshots_carry_inputs_and_accumulated_text() {
        let input = RefineInput {
            lessons: "old".to_string(),
            feedback: "shorter".to_string(),
        };
        let snapshot = RefineStage::snapshot(&input, "new text");
        assert_eq!(snapshot.lessons, "old");
        assert_eq!(snapshot.feedback, "shorter");
        assert_eq!(snapshot.refined_lessons, "new text");
    }

    #[test]
    fn stage_names_match_the_wire_keys() {
        assert_eq!(OutlineStage::NAME, "generate_outline");
        assert_eq!(LessonsStage::NAME, "generate_lessons");
        assert_eq!(RefineStage::NAME, "refine_lessons");
    }
}

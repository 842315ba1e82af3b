//! Defines the SSE frame format streamed to clients.
//!
//! Every frame is one `data:` line carrying a JSON object. The enum is
//! untagged so each variant serializes to exactly the object shape the
//! client expects.

use serde::Serialize;
use uuid::Uuid;

/// A single frame on the event stream.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum StreamFrame {
    /// One-time preamble on the outline endpoint.
    SessionCreated { session_id: Uuid },
    /// Accumulated outline text so far.
    Outline { generate_outline: OutlinePayload },
    /// Accumulated lessons text so far.
    Lessons { generate_lessons: LessonsPayload },
    /// Accumulated refined lessons text so far.
    Refined { refine_lessons: LessonsPayload },
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct OutlinePayload {
    pub outline: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct LessonsPayload {
    pub lessons: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn session_preamble_frame_shape() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let frame = StreamFrame::SessionCreated { session_id: id };

        assert_eq!(
            serde_json::to_value(&frame).unwrap(),
            json!({"session_id": "550e8400-e29b-41d4-a716-446655440000"})
        );
    }

    #[test]
    fn outline_frame_shape() {
        let frame = StreamFrame::Outline {
            generate_outline: OutlinePayload {
                outline: "1. Intro".to_string(),
            },
        };

        assert_eq!(
            serde_json::to_value(&frame).unwrap(),
            json!({"generate_outline": {"outline": "1. Intro"}})
        );
    }

    #[test]
    fn lessons_frame_shape() {
        let frame = StreamFrame::Lessons {
            generate_lessons: LessonsPayload {
                lessons: "Lesson 1".to_string(),
            },
        };

        assert_eq!(
            serde_json::to_value(&frame).unwrap(),
            json!({"generate_lessons": {"lessons": "Lesson 1"}})
        );
    }

    #[test]
    fn refined_frame_is_keyed_refine_lessons_with_a_lessons_field() {
        let frame = StreamFrame::Refined {
            refine_lessons: LessonsPayload {
                lessons: "Shorter lesson".to_string(),
            },
        };

        assert_eq!(
            serde_json::to_value(&frame).unwrap(),
            json!({"refine_lessons": {"lessons": "Shorter lesson"}})
        );
    }
}

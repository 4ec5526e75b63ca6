//! Feedback synthesis
//!
//! Turns a finished transcript into a persisted [`Feedback`] record:
//! normalize, request a structured assessment, stamp the record, upsert.
//!
//! The write only happens once a fully validated [`FeedbackAssessment`]
//! exists, so a failed call never leaves a partial record behind. Without an
//! existing feedback id every call creates a new document; concurrent calls
//! for the same interview can therefore produce duplicates.

use crate::error::{FeedbackError, Result};
use crate::services::completion::{complete_structured, CompletionClient, SchemaDescriptor, StructuredOutput};
use crate::storage::{to_document_data, DocumentStore, FEEDBACK};
use crate::transcript;
use crate::types::{
    Category, CategoryScores, Feedback, FeedbackId, InterviewId, Score, TranscriptEntry, UserId,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, error, info};

/// System instruction sent with every evaluation
pub const EVALUATOR_INSTRUCTION: &str = "You are a professional interviewer analyzing a mock interview. \
Your task is to evaluate the candidate based on structured categories.";

/// Structured assessment requested from the completion client
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackAssessment {
    pub total_score: Score,
    pub category_scores: CategoryScores,
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub final_assessment: String,
}

impl StructuredOutput for FeedbackAssessment {
    fn schema() -> SchemaDescriptor {
        let score = json!({"type": "integer", "minimum": 0, "maximum": 100});
        let strings = json!({"type": "array", "items": {"type": "string"}});

        let mut categories = Map::new();
        for category in Category::ALL {
            categories.insert(category.name().to_string(), score.clone());
        }
        let category_names: Vec<&str> = Category::ALL.iter().map(|c| c.name()).collect();

        SchemaDescriptor::new(
            "interview_feedback",
            "Structured evaluation of a mock interview candidate",
            json!({
                "type": "object",
                "properties": {
                    "totalScore": score,
                    "categoryScores": {
                        "type": "object",
                        "properties": Value::Object(categories),
                        "required": category_names,
                        "additionalProperties": false
                    },
                    "strengths": strings,
                    "areasForImprovement": strings,
                    "finalAssessment": {"type": "string"}
                },
                "required": [
                    "totalScore",
                    "categoryScores",
                    "strengths",
                    "areasForImprovement",
                    "finalAssessment"
                ]
            }),
        )
    }
}

/// Build the evaluation prompt around a normalized transcript
pub fn evaluation_prompt(formatted_transcript: &str) -> String {
    let rubric: String = Category::ALL
        .iter()
        .map(|c| format!("- **{}**: {}\n", c.name(), c.rubric()))
        .collect();

    format!(
        "You are an AI interviewer analyzing a mock interview. Your task is to evaluate the \
candidate based on structured categories. Be thorough and detailed in your analysis. Don't be \
lenient with the candidate. If there are mistakes or areas for improvement, point them out.\n\
Transcript:\n{}\n\
Please score the candidate from 0 to 100 in the following areas. Do not add categories other \
than the ones provided:\n{}",
        formatted_transcript, rubric
    )
}

/// Input to a single synthesis call
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub interview_id: InterviewId,

    /// Already authenticated caller
    pub user_id: UserId,

    pub transcript: Vec<TranscriptEntry>,

    /// Overwrite this record instead of creating a new one
    pub existing_feedback_id: Option<FeedbackId>,
}

/// Orchestrates transcript → assessment → persisted feedback
#[derive(Clone)]
pub struct FeedbackSynthesizer {
    completion: Arc<dyn CompletionClient>,
    store: Arc<dyn DocumentStore>,
}

impl FeedbackSynthesizer {
    pub fn new(completion: Arc<dyn CompletionClient>, store: Arc<dyn DocumentStore>) -> Self {
        Self { completion, store }
    }

    /// Generate and upsert feedback, returning the document id
    ///
    /// Every failure is reported as [`FeedbackError::SynthesisFailed`].
    pub async fn synthesize(&self, request: SynthesisRequest) -> Result<FeedbackId> {
        let interview_id = request.interview_id.clone();
        self.try_synthesize(request).await.map_err(|e| {
            error!("Error saving feedback for interview {}: {}", interview_id, e);
            FeedbackError::SynthesisFailed(e.to_string())
        })
    }

    async fn try_synthesize(&self, request: SynthesisRequest) -> Result<FeedbackId> {
        let formatted = transcript::normalize(&request.transcript);
        debug!(
            "Synthesizing feedback for interview {} from {} transcript entries",
            request.interview_id,
            request.transcript.len()
        );

        let assessment: FeedbackAssessment = complete_structured(
            self.completion.as_ref(),
            EVALUATOR_INSTRUCTION,
            &evaluation_prompt(&formatted),
        )
        .await?;

        let feedback_id = match request.existing_feedback_id {
            Some(id) => id,
            None => FeedbackId::new(self.store.new_id(FEEDBACK)),
        };

        let feedback = build_feedback(
            feedback_id.clone(),
            request.interview_id,
            request.user_id,
            assessment,
        );

        self.store
            .set(FEEDBACK, feedback_id.as_str(), to_document_data(&feedback)?)
            .await?;

        info!(
            "Saved feedback {} for interview {} (total score {})",
            feedback_id, feedback.interview_id, feedback.total_score
        );
        Ok(feedback_id)
    }
}

fn build_feedback(
    id: FeedbackId,
    interview_id: InterviewId,
    user_id: UserId,
    assessment: FeedbackAssessment,
) -> Feedback {
    Feedback {
        id,
        interview_id,
        user_id,
        total_score: assessment.total_score,
        category_scores: assessment.category_scores,
        strengths: assessment.strengths,
        areas_for_improvement: assessment.areas_for_improvement,
        final_assessment: assessment.final_assessment,
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::completion::conform;

    fn assessment_json() -> Value {
        json!({
            "totalScore": 74,
            "categoryScores": {
                "Communication Skills": 80,
                "Technical Knowledge": 70,
                "Problem-Solving": 68,
                "Cultural & Role Fit": 85,
                "Confidence & Clarity": 66
            },
            "strengths": ["Clear structure"],
            "areasForImprovement": ["Go deeper on trade-offs"],
            "finalAssessment": "Solid candidate."
        })
    }

    #[test]
    fn test_schema_requires_every_category() {
        let schema = FeedbackAssessment::schema();
        let required = schema.schema["properties"]["categoryScores"]["required"]
            .as_array()
            .unwrap()
            .clone();
        assert_eq!(required.len(), 5);
        for category in Category::ALL {
            assert!(required.contains(&json!(category.name())));
        }
        assert_eq!(schema.required_fields().len(), 5);
    }

    #[test]
    fn test_prompt_embeds_transcript_and_rubric() {
        let prompt = evaluation_prompt("- candidate: hello\n");
        assert!(prompt.contains("Transcript:\n- candidate: hello\n"));
        for category in Category::ALL {
            assert!(prompt.contains(category.name()));
        }
    }

    #[test]
    fn test_assessment_conforms() {
        let assessment: FeedbackAssessment = conform(assessment_json()).unwrap();
        assert_eq!(assessment.total_score.value(), 74);
        assert_eq!(
            assessment
                .category_scores
                .get(Category::CulturalAndRoleFit)
                .value(),
            85
        );
    }

    #[test]
    fn test_assessment_rejects_out_of_range_total() {
        let mut value = assessment_json();
        value["totalScore"] = json!(140);
        assert!(conform::<FeedbackAssessment>(value).is_err());
    }

    #[test]
    fn test_build_feedback_copies_assessment() {
        let assessment: FeedbackAssessment = conform(assessment_json()).unwrap();
        let feedback = build_feedback(
            FeedbackId::from("f1"),
            InterviewId::from("i1"),
            UserId::from("u1"),
            assessment.clone(),
        );

        assert_eq!(feedback.id, FeedbackId::from("f1"));
        assert_eq!(feedback.category_scores, assessment.category_scores);
        assert_eq!(feedback.strengths, vec!["Clear structure".to_string()]);
    }
}

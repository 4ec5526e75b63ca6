//! Core data types for interview feedback
//!
//! Defines interviews, transcript entries and feedback records together with
//! the closed set of evaluation categories and the bounded [`Score`] type.
//! Field names serialize in camelCase to match the persisted documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! document_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

document_id!(
    /// Document id of an interview
    InterviewId
);

document_id!(
    /// Identity of an already authenticated user
    UserId
);

document_id!(
    /// Document id of a feedback record
    FeedbackId
);

/// Speaker of a transcript turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeakerRole {
    Interviewer,
    Candidate,
}

impl SpeakerRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeakerRole::Interviewer => "interviewer",
            SpeakerRole::Candidate => "candidate",
        }
    }
}

impl fmt::Display for SpeakerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One turn of a finished interview conversation
///
/// Only ever used as synthesizer input; never persisted verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: SpeakerRole,
    pub content: String,
}

impl TranscriptEntry {
    pub fn interviewer(content: impl Into<String>) -> Self {
        Self {
            role: SpeakerRole::Interviewer,
            content: content.into(),
        }
    }

    pub fn candidate(content: impl Into<String>) -> Self {
        Self {
            role: SpeakerRole::Candidate,
            content: content.into(),
        }
    }
}

/// Evaluation category
///
/// The set is closed: every feedback record scores exactly these five.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    CommunicationSkills,
    TechnicalKnowledge,
    ProblemSolving,
    CulturalAndRoleFit,
    ConfidenceAndClarity,
}

impl Category {
    /// All categories in canonical order
    pub const ALL: [Category; 5] = [
        Category::CommunicationSkills,
        Category::TechnicalKnowledge,
        Category::ProblemSolving,
        Category::CulturalAndRoleFit,
        Category::ConfidenceAndClarity,
    ];

    /// Display and wire name of the category
    pub fn name(&self) -> &'static str {
        match self {
            Category::CommunicationSkills => "Communication Skills",
            Category::TechnicalKnowledge => "Technical Knowledge",
            Category::ProblemSolving => "Problem-Solving",
            Category::CulturalAndRoleFit => "Cultural & Role Fit",
            Category::ConfidenceAndClarity => "Confidence & Clarity",
        }
    }

    /// What the evaluator is asked to judge for this category
    pub fn rubric(&self) -> &'static str {
        match self {
            Category::CommunicationSkills => "Clarity, articulation, structured responses.",
            Category::TechnicalKnowledge => "Understanding of key concepts for the role.",
            Category::ProblemSolving => "Ability to analyze problems and propose solutions.",
            Category::CulturalAndRoleFit => "Alignment with company values and job role.",
            Category::ConfidenceAndClarity => {
                "Confidence in responses, engagement, and clarity."
            }
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Integer score in `0..=100`
///
/// Deserialization rejects anything that is not an integer in range, so a
/// `Score` in hand is always valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Score(u8);

impl Score {
    pub const MAX: u8 = 100;

    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::MAX).then_some(Self(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Score {
    type Error = String;

    fn try_from(value: i64) -> std::result::Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .and_then(Score::new)
            .ok_or_else(|| format!("score {} is outside 0..=100", value))
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-category scores, keyed on the wire by category name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryScores {
    #[serde(rename = "Communication Skills")]
    pub communication_skills: Score,

    #[serde(rename = "Technical Knowledge")]
    pub technical_knowledge: Score,

    #[serde(rename = "Problem-Solving")]
    pub problem_solving: Score,

    #[serde(rename = "Cultural & Role Fit")]
    pub cultural_and_role_fit: Score,

    #[serde(rename = "Confidence & Clarity")]
    pub confidence_and_clarity: Score,
}

impl CategoryScores {
    pub fn get(&self, category: Category) -> Score {
        match category {
            Category::CommunicationSkills => self.communication_skills,
            Category::TechnicalKnowledge => self.technical_knowledge,
            Category::ProblemSolving => self.problem_solving,
            Category::CulturalAndRoleFit => self.cultural_and_role_fit,
            Category::ConfidenceAndClarity => self.confidence_and_clarity,
        }
    }

    /// Scores in canonical category order
    pub fn iter(&self) -> impl Iterator<Item = (Category, Score)> + '_ {
        Category::ALL.into_iter().map(move |c| (c, self.get(c)))
    }
}

/// Interview created by the external generation flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interview {
    pub id: InterviewId,

    /// Owner of the interview
    pub user_id: UserId,

    /// Job role being interviewed for
    pub role: String,

    /// Seniority level, e.g. "Junior"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Interview style, e.g. "Technical" or "Behavioural"
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub interview_type: Option<String>,

    #[serde(default)]
    pub tech_stack: Vec<String>,

    #[serde(default)]
    pub questions: Vec<String>,

    /// Only finalized interviews are visible to other users
    pub finalized: bool,

    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
}

/// Structured evaluation of one interview attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: FeedbackId,
    pub interview_id: InterviewId,

    /// Owner; expected to match the interview's owner
    pub user_id: UserId,

    pub total_score: Score,
    pub category_scores: CategoryScores,
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub final_assessment: String,

    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Fixed-width UTC timestamps
///
/// Stored as `YYYY-MM-DDTHH:MM:SS.mmmZ` so that string order equals time
/// order inside the document store. Stored documents may also carry bare
/// `YYYY-MM-DD` dates (midnight UTC), which sort consistently with the full
/// form. Anything else is rejected on decode; [`parse`] is the lenient entry
/// point for external input that gets rewritten with [`format`].
pub mod timestamp {
    use chrono::{DateTime, NaiveDate, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";
    const DATE_FORMAT: &str = "%Y-%m-%d";

    pub fn format(dt: &DateTime<Utc>) -> String {
        dt.format(FORMAT).to_string()
    }

    pub fn parse(s: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        parse_date(s)
    }

    /// Accept only the stored forms: canonical timestamps and bare dates
    pub fn parse_stored(s: &str) -> Option<DateTime<Utc>> {
        if let Some(dt) = parse_date(s) {
            return Some(dt);
        }
        DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
            .filter(|dt| format(dt) == s)
    }

    fn parse_date(s: &str) -> Option<DateTime<Utc>> {
        NaiveDate::parse_from_str(s, DATE_FORMAT)
            .ok()
            .filter(|d| d.format(DATE_FORMAT).to_string() == s)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(dt))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_stored(&s).ok_or_else(|| {
            de::Error::custom(format!(
                "non-canonical timestamp {:?}, expected YYYY-MM-DDTHH:MM:SS.mmmZ",
                s
            ))
        })
    }
}

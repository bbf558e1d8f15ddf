//! Core data types for quiz documents, sync outcomes, and errors.

use serde::{Deserialize, Deserializer, Serialize};

/// Top-level versioned payload holding every category and quiz.
///
/// A document is replaced wholesale by a newer one; it is never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizDocument {
    pub version: u64,
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub quizzes: Vec<Quiz>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    pub title: String,
    pub questions: Vec<Question>,
}

/// A multiple-choice question.
///
/// `correct_answer` is kept signed so that a negative index in the payload
/// surfaces as an integrity issue instead of failing the whole parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub text: String,
    #[serde(deserialize_with = "deserialize_options")]
    pub options: Vec<String>,
    pub correct_answer: i64,
}

/// Result of answering a quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizScore {
    pub correct: usize,
    pub total: usize,
}

impl QuizDocument {
    /// Parse a raw payload into a document.
    ///
    /// Malformed JSON and structural mismatches both map to `QuizError::Parse`.
    pub fn from_json(raw: &str) -> QuizResult<Self> {
        serde_json::from_str(raw).map_err(|e| QuizError::Parse(e.to_string()))
    }

    /// Find a category by name, ignoring case.
    pub fn category(&self, name: &str) -> Option<&Category> {
        let wanted = name.to_lowercase();
        self.categories
            .iter()
            .find(|c| c.name.to_lowercase() == wanted)
    }

    /// Total number of quizzes across all categories.
    pub fn quiz_count(&self) -> usize {
        self.categories.iter().map(|c| c.quizzes.len()).sum()
    }
}

impl Quiz {
    /// A quiz can be played when it has questions and none of them is blank.
    pub fn is_playable(&self) -> bool {
        !self.questions.is_empty() && self.questions.iter().all(|q| !q.text.trim().is_empty())
    }

    /// Score a set of answers. `None` marks a question left unanswered when time ran out.
    pub fn score(&self, answers: &[Option<usize>]) -> QuizScore {
        let correct = self
            .questions
            .iter()
            .zip(answers.iter())
            .filter(|(q, a)| a.is_some_and(|choice| q.is_correct(choice)))
            .count();

        QuizScore {
            correct,
            total: self.questions.len(),
        }
    }
}

impl Question {
    pub fn is_correct(&self, choice: usize) -> bool {
        usize::try_from(self.correct_answer).is_ok_and(|answer| answer == choice && choice < self.options.len())
    }

    /// The text of the correct option, if the index is in range.
    pub fn correct_option(&self) -> Option<&str> {
        usize::try_from(self.correct_answer)
            .ok()
            .and_then(|i| self.options.get(i))
            .map(String::as_str)
    }
}

impl QuizScore {
    pub fn percentage(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f32 * 100.0 / self.total as f32
    }
}

/// `options` arrives either as `"A, B, C"` or as `["A", "B", "C"]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawOptions {
    Joined(String),
    List(Vec<String>),
}

fn deserialize_options<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = RawOptions::deserialize(deserializer).map_err(|_| {
        serde::de::Error::custom("options must be a comma-separated string or an array of strings")
    })?;
    Ok(normalize_options(raw))
}

fn normalize_options(raw: RawOptions) -> Vec<String> {
    match raw {
        RawOptions::Joined(joined) if joined.trim().is_empty() => Vec::new(),
        RawOptions::Joined(joined) => joined.split(',').map(|s| s.trim().to_string()).collect(),
        RawOptions::List(list) => list.into_iter().map(|s| s.trim().to_string()).collect(),
    }
}

/// Why a sync did not update the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncReason {
    UpToDate,
    NetworkError,
    ParseError,
    StorageError,
    Cancelled,
}

/// Typed outcome of a sync attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    pub updated: bool,
    /// Persisted version once the attempt finished.
    pub version: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<SyncReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl SyncOutcome {
    pub fn updated(version: u64) -> Self {
        Self {
            updated: true,
            version,
            reason: None,
            detail: None,
        }
    }

    pub fn skipped(reason: SyncReason, version: u64, detail: Option<String>) -> Self {
        Self {
            updated: false,
            version,
            reason: Some(reason),
            detail,
        }
    }
}

/// Errors that can occur while reading, fetching, or persisting quiz data.
#[derive(thiserror::Error, Debug)]
pub enum QuizError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Sync cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl QuizError {
    /// The outcome reason reported to callers for this error.
    pub fn reason(&self) -> SyncReason {
        match self {
            QuizError::Network(_) => SyncReason::NetworkError,
            QuizError::Parse(_) | QuizError::DataIntegrity(_) | QuizError::Json(_) => {
                SyncReason::ParseError
            }
            QuizError::Storage(_) | QuizError::Io(_) | QuizError::InvalidConfig(_) => {
                SyncReason::StorageError
            }
            QuizError::Cancelled => SyncReason::Cancelled,
        }
    }
}

/// Convenience result type.
pub type QuizResult<T> = Result<T, QuizError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn question(options: &str) -> QuizResult<Question> {
        let raw = format!(r#"{{"text": "Pick one", "options": {options}, "correctAnswer": 0}}"#);
        serde_json::from_str(&raw).map_err(QuizError::from)
    }

    #[test]
    fn test_options_string_and_array_normalize_alike() {
        let joined = question(r#""A, B, C""#).unwrap();
        let list = question(r#"["A","B","C"]"#).unwrap();
        assert_eq!(joined.options, vec!["A", "B", "C"]);
        assert_eq!(joined.options, list.options);
    }

    #[test]
    fn test_options_array_entries_are_trimmed() {
        let q = question(r#"["  Mars ", "Venus"]"#).unwrap();
        assert_eq!(q.options, vec!["Mars", "Venus"]);
    }

    #[test]
    fn test_blank_options_string_is_empty() {
        let q = question(r#""   ""#).unwrap();
        assert!(q.options.is_empty());
    }

    #[test]
    fn test_options_of_wrong_type_rejected() {
        assert!(question("42").is_err());
        assert!(question("[1, 2]").is_err());
    }

    #[test]
    fn test_serialize_writes_array_form() {
        let q = question(r#""Yes,No""#).unwrap();
        let value = serde_json::to_value(&q).unwrap();
        assert_eq!(value["options"], serde_json::json!(["Yes", "No"]));
        assert_eq!(value["correctAnswer"], 0);
    }

    #[test]
    fn test_missing_version_is_parse_error() {
        let err = QuizDocument::from_json(r#"{"categories": []}"#).unwrap_err();
        assert_eq!(err.reason(), SyncReason::ParseError);
    }

    #[test]
    fn test_missing_categories_is_parse_error() {
        assert!(matches!(
            QuizDocument::from_json(r#"{"version": 3}"#),
            Err(QuizError::Parse(_))
        ));
    }

    #[test]
    fn test_negative_version_rejected() {
        assert!(QuizDocument::from_json(r#"{"version": -1, "categories": []}"#).is_err());
    }

    #[test]
    fn test_negative_answer_parses_but_never_correct() {
        let raw = r#"{"text": "Q", "options": ["A", "B"], "correctAnswer": -1}"#;
        let q: Question = serde_json::from_str(raw).unwrap();
        assert!(!q.is_correct(0));
        assert_eq!(q.correct_option(), None);
    }

    #[test]
    fn test_category_lookup_ignores_case() {
        let doc = QuizDocument::from_json(
            r#"{"version": 1, "categories": [{"name": "Math Fun", "quizzes": []}]}"#,
        )
        .unwrap();
        assert!(doc.category("math fun").is_some());
        assert!(doc.category("MATH FUN").is_some());
        assert!(doc.category("Math").is_none());
    }

    #[test]
    fn test_score_counts_unanswered_as_wrong() {
        let quiz = Quiz {
            id: "q1".into(),
            title: "Science".into(),
            questions: vec![
                question(r#""H2O, CO2""#).unwrap(),
                question(r#""Sun, Moon""#).unwrap(),
                question(r#""Iron, Gold""#).unwrap(),
            ],
        };
        let score = quiz.score(&[Some(0), None, Some(1)]);
        assert_eq!(score, QuizScore { correct: 1, total: 3 });
        assert!((score.percentage() - 33.333).abs() < 0.01);
    }

    #[test]
    fn test_empty_score_percentage() {
        assert_eq!(QuizScore { correct: 0, total: 0 }.percentage(), 0.0);
    }
}

//! Integrity checks for parsed quiz documents.
//!
//! A document that parses can still carry questions nobody can answer:
//! blank text, no options, or a correct answer pointing outside the option
//! list. Such questions are excluded from the usable set; they never abort
//! a sync.

use std::fmt;

use serde::Serialize;

use crate::types::{Category, Question, Quiz, QuizDocument};

/// A single integrity violation on a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityIssue {
    EmptyText,
    EmptyOptions,
    AnswerOutOfRange { answer: i64, options: usize },
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityIssue::EmptyText => write!(f, "question text is empty"),
            IntegrityIssue::EmptyOptions => write!(f, "question has no options"),
            IntegrityIssue::AnswerOutOfRange { answer, options } => {
                write!(f, "correct answer {answer} is outside 0..{options}")
            }
        }
    }
}

/// Where an issue was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionIssue {
    pub category: String,
    pub quiz_id: String,
    pub question_index: usize,
    pub issue: IntegrityIssue,
}

/// Summary of what `QuizDocument::usable` removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    pub excluded_questions: usize,
    pub dropped_quizzes: usize,
    pub issues: Vec<QuestionIssue>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty() && self.dropped_quizzes == 0
    }
}

/// Every integrity issue carried by a question.
pub fn check_question(question: &Question) -> Vec<IntegrityIssue> {
    let mut issues = Vec::new();

    if question.text.trim().is_empty() {
        issues.push(IntegrityIssue::EmptyText);
    }

    if question.options.is_empty() {
        issues.push(IntegrityIssue::EmptyOptions);
    } else if question.correct_option().is_none() {
        issues.push(IntegrityIssue::AnswerOutOfRange {
            answer: question.correct_answer,
            options: question.options.len(),
        });
    }

    issues
}

pub fn is_valid_question(question: &Question) -> bool {
    check_question(question).is_empty()
}

/// Collect every issue in the document without modifying it.
pub fn audit(document: &QuizDocument) -> Vec<QuestionIssue> {
    let mut found = Vec::new();
    for category in &document.categories {
        for quiz in &category.quizzes {
            for (index, question) in quiz.questions.iter().enumerate() {
                for issue in check_question(question) {
                    found.push(QuestionIssue {
                        category: category.name.clone(),
                        quiz_id: quiz.id.clone(),
                        question_index: index,
                        issue,
                    });
                }
            }
        }
    }
    found
}

impl QuizDocument {
    /// A copy of the document containing only valid questions.
    ///
    /// Quizzes left without questions are dropped; categories are kept even
    /// when empty so the category list stays stable.
    pub fn usable(&self) -> (QuizDocument, IntegrityReport) {
        let issues = audit(self);
        let mut report = IntegrityReport::default();

        let categories = self
            .categories
            .iter()
            .map(|category| {
                let quizzes = category
                    .quizzes
                    .iter()
                    .filter_map(|quiz| {
                        let questions: Vec<Question> = quiz
                            .questions
                            .iter()
                            .filter(|q| is_valid_question(q))
                            .cloned()
                            .collect();
                        report.excluded_questions += quiz.questions.len() - questions.len();

                        if questions.is_empty() {
                            report.dropped_quizzes += 1;
                            return None;
                        }
                        Some(Quiz {
                            id: quiz.id.clone(),
                            title: quiz.title.clone(),
                            questions,
                        })
                    })
                    .collect();

                Category {
                    name: category.name.clone(),
                    quizzes,
                }
            })
            .collect();

        report.issues = issues;
        (
            QuizDocument {
                version: self.version,
                categories,
            },
            report,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(text: &str, options: &[&str], answer: i64) -> Question {
        Question {
            text: text.to_string(),
            options: options.iter().map(|s| s.to_string()).collect(),
            correct_answer: answer,
        }
    }

    #[test]
    fn test_valid_question_has_no_issues() {
        assert!(check_question(&q("Largest planet?", &["Jupiter", "Mars"], 0)).is_empty());
    }

    #[test]
    fn test_out_of_range_answer() {
        let issues = check_question(&q("Q", &["A", "B"], 2));
        assert_eq!(
            issues,
            vec![IntegrityIssue::AnswerOutOfRange { answer: 2, options: 2 }]
        );
        assert!(!is_valid_question(&q("Q", &["A"], -1)));
    }

    #[test]
    fn test_blank_text_and_no_options() {
        let issues = check_question(&q("  ", &[], 0));
        assert_eq!(
            issues,
            vec![IntegrityIssue::EmptyText, IntegrityIssue::EmptyOptions]
        );
    }

    #[test]
    fn test_usable_excludes_bad_questions_and_empty_quizzes() {
        let doc = QuizDocument {
            version: 4,
            categories: vec![Category {
                name: "Science".into(),
                quizzes: vec![
                    Quiz {
                        id: "q1".into(),
                        title: "Science".into(),
                        questions: vec![q("Good", &["A", "B"], 1), q("Bad", &["A", "B"], 5)],
                    },
                    Quiz {
                        id: "q2".into(),
                        title: "Science".into(),
                        questions: vec![q("", &["A"], 0)],
                    },
                ],
            }],
        };

        let (usable, report) = doc.usable();
        assert_eq!(usable.version, 4);
        assert_eq!(usable.categories[0].quizzes.len(), 1);
        assert_eq!(usable.categories[0].quizzes[0].questions.len(), 1);
        assert_eq!(report.excluded_questions, 2);
        assert_eq!(report.dropped_quizzes, 1);
        assert_eq!(report.issues.len(), 2);
        assert_eq!(report.issues[0].quiz_id, "q1");
        assert_eq!(report.issues[0].question_index, 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_issue_display() {
        let text = IntegrityIssue::AnswerOutOfRange { answer: 3, options: 2 }.to_string();
        assert_eq!(text, "correct answer 3 is outside 0..2");
    }
}

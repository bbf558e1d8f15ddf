//! Category catalog built from the cached document.
//!
//! Every quiz is tagged with the name of the category it came from; category
//! lookups are case-insensitive and only ever return playable quizzes.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::types::{Quiz, QuizDocument, SyncReason};
use crate::validate::IntegrityReport;

/// Categories shown when no quiz data is available yet.
const DEFAULT_CATEGORIES: [&str; 8] = [
    "Animals",
    "Sports",
    "Science",
    "Riddles",
    "Geography",
    "Math Fun",
    "Video Games",
    "GK",
];

/// A quiz together with the category it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub category: String,
    pub quiz: Quiz,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct QuizCatalog {
    version: u64,
    categories: Vec<String>,
    entries: Vec<CatalogEntry>,
    integrity: IntegrityReport,
}

impl QuizCatalog {
    /// Build a catalog from the usable part of a document.
    pub fn from_document(document: &QuizDocument) -> Self {
        let (usable, integrity) = document.usable();
        if !integrity.is_clean() {
            tracing::warn!(
                "Excluded {} invalid questions and {} empty quizzes from version {}",
                integrity.excluded_questions,
                integrity.dropped_quizzes,
                document.version
            );
        }

        let categories = usable.categories.iter().map(|c| c.name.clone()).collect();
        let entries = usable
            .categories
            .into_iter()
            .flat_map(|category| {
                let name = category.name;
                category.quizzes.into_iter().map(move |quiz| CatalogEntry {
                    category: name.clone(),
                    quiz,
                })
            })
            .collect();

        Self {
            version: document.version,
            categories,
            entries,
            integrity,
        }
    }

    pub fn default_categories() -> Vec<String> {
        DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Category names in document order.
    pub fn category_names(&self) -> &[String] {
        &self.categories
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn integrity(&self) -> &IntegrityReport {
        &self.integrity
    }

    /// Playable quizzes whose category matches `name`, ignoring case.
    pub fn quizzes_in(&self, name: &str) -> Vec<&Quiz> {
        let wanted = name.trim().to_lowercase();
        self.entries
            .iter()
            .filter(|e| e.category.to_lowercase() == wanted)
            .map(|e| &e.quiz)
            .filter(|q| q.is_playable())
            .collect()
    }

    /// A uniformly random playable quiz from the category.
    pub fn random_quiz(&self, name: &str) -> Option<&Quiz> {
        self.random_quiz_with(name, &mut rand::thread_rng())
    }

    pub fn random_quiz_with<R: Rng + ?Sized>(&self, name: &str, rng: &mut R) -> Option<&Quiz> {
        let candidates = self.quizzes_in(name);
        let picked = candidates.choose(rng).copied();
        if picked.is_none() {
            tracing::debug!("No playable quiz found for category {name:?}");
        }
        picked
    }
}

/// What the caller can show right now.
#[derive(Debug, Clone)]
pub enum LibraryState {
    Ready(QuizCatalog),
    /// Neither a cache nor a successful fetch is available.
    NoData { reason: Option<SyncReason> },
}

impl LibraryState {
    pub fn catalog(&self) -> Option<&QuizCatalog> {
        match self {
            LibraryState::Ready(catalog) => Some(catalog),
            LibraryState::NoData { .. } => None,
        }
    }

    /// Category names to display, falling back to the built-in list.
    pub fn category_names(&self) -> Vec<String> {
        match self {
            LibraryState::Ready(catalog) if !catalog.category_names().is_empty() => {
                catalog.category_names().to_vec()
            }
            _ => QuizCatalog::default_categories(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, Question};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn valid_question(text: &str) -> Question {
        Question {
            text: text.to_string(),
            options: vec!["A".into(), "B".into()],
            correct_answer: 1,
        }
    }

    fn quiz(id: &str, title: &str, questions: Vec<Question>) -> Quiz {
        Quiz {
            id: id.to_string(),
            title: title.to_string(),
            questions,
        }
    }

    fn science_doc() -> QuizDocument {
        QuizDocument {
            version: 3,
            categories: vec![
                Category {
                    name: "Science".into(),
                    quizzes: vec![quiz("q1", "Science", vec![valid_question("Boiling point?")])],
                },
                Category {
                    name: "science".into(),
                    quizzes: vec![quiz("q2", "science", vec![])],
                },
            ],
        }
    }

    #[test]
    fn test_lookup_only_returns_playable_quiz() {
        let catalog = QuizCatalog::from_document(&science_doc());
        for _ in 0..50 {
            assert_eq!(catalog.random_quiz("Science").unwrap().id, "q1");
        }
        assert_eq!(catalog.quizzes_in("SCIENCE").len(), 1);
    }

    #[test]
    fn test_unknown_category_is_none() {
        let catalog = QuizCatalog::from_document(&science_doc());
        assert!(catalog.random_quiz("Sports").is_none());
    }

    #[test]
    fn test_random_pick_covers_all_candidates() {
        let doc = QuizDocument {
            version: 1,
            categories: vec![Category {
                name: "GK".into(),
                quizzes: vec![
                    quiz("a", "GK", vec![valid_question("1")]),
                    quiz("b", "GK", vec![valid_question("2")]),
                    quiz("c", "GK", vec![valid_question("3")]),
                ],
            }],
        };
        let catalog = QuizCatalog::from_document(&doc);
        let mut rng = StdRng::seed_from_u64(7);

        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(catalog.random_quiz_with("gk", &mut rng).unwrap().id.clone());
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_invalid_questions_excluded_from_catalog() {
        let mut bad = valid_question("Broken");
        bad.correct_answer = 9;
        let doc = QuizDocument {
            version: 2,
            categories: vec![Category {
                name: "Riddles".into(),
                quizzes: vec![quiz("r1", "Riddles", vec![bad, valid_question("Fine")])],
            }],
        };
        let catalog = QuizCatalog::from_document(&doc);
        let picked = catalog.random_quiz("riddles").unwrap();
        assert_eq!(picked.questions.len(), 1);
        assert_eq!(catalog.integrity().excluded_questions, 1);
    }

    #[test]
    fn test_category_names_keep_document_order() {
        let catalog = QuizCatalog::from_document(&science_doc());
        assert_eq!(catalog.category_names(), ["Science", "science"]);
        assert_eq!(catalog.version(), 3);
    }

    #[test]
    fn test_no_data_falls_back_to_default_categories() {
        let state = LibraryState::NoData {
            reason: Some(SyncReason::NetworkError),
        };
        assert!(state.catalog().is_none());
        assert_eq!(state.category_names().len(), 8);
        assert_eq!(state.category_names()[2], "Science");
    }
}

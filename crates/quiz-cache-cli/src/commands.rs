//! Subcommand implementations. Each returns the text destined for stdout.

use std::fmt::Write as _;
use std::time::Duration;

use anyhow::{bail, Result};

use quiz_cache::{
    CancelToken, LibraryState, Quiz, QuizCacheSync, QuizCatalog, SyncOutcome, SyncReason,
};

/// Run one sync. Storage failures are fatal; everything else is reported.
pub async fn sync(service: &QuizCacheSync, timeout: Duration, cancel: &CancelToken) -> Result<String> {
    let outcome = service.sync_with_cancel(timeout, cancel).await;
    let rendered = render_outcome(&outcome)?;
    if outcome.reason == Some(SyncReason::StorageError) {
        bail!(
            "failed to persist quiz data: {}",
            outcome.detail.unwrap_or_default()
        );
    }
    Ok(rendered)
}

pub fn render_outcome(outcome: &SyncOutcome) -> Result<String> {
    Ok(serde_json::to_string_pretty(outcome)?)
}

pub async fn version(service: &QuizCacheSync) -> Result<String> {
    Ok(service.get_version().await?.to_string())
}

pub async fn show(service: &QuizCacheSync) -> Result<String> {
    let Some(doc) = service.load_cached().await? else {
        let state = LibraryState::NoData { reason: None };
        return Ok(format!(
            "no cached quiz data\navailable categories: {}",
            state.category_names().join(", ")
        ));
    };

    let catalog = QuizCatalog::from_document(&doc);
    let mut out = format!("quiz data version {}\n", doc.version);
    for category in &doc.categories {
        let playable = catalog.quizzes_in(&category.name).len();
        let _ = writeln!(
            out,
            "  {:<16} {} quizzes ({} playable)",
            category.name,
            category.quizzes.len(),
            playable
        );
    }
    Ok(out.trim_end().to_string())
}

pub async fn pick(service: &QuizCacheSync, category: &str) -> Result<String> {
    let Some(doc) = service.load_cached().await? else {
        return Ok("no cached quiz data".to_string());
    };

    let catalog = QuizCatalog::from_document(&doc);
    Ok(match catalog.random_quiz(category) {
        Some(quiz) => render_quiz(category, quiz),
        None => format!("no playable quiz in category {category:?}"),
    })
}

pub async fn inspect(service: &QuizCacheSync) -> Result<String> {
    let report = service.inspect().await?;
    Ok(serde_json::to_string_pretty(&report)?)
}

fn render_quiz(category: &str, quiz: &Quiz) -> String {
    let mut out = format!("{category}: {} ({} questions)\n", quiz.id, quiz.questions.len());
    for (i, question) in quiz.questions.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, question.text);
        for (letter, option) in ('a'..='z').zip(&question.options) {
            let _ = writeln!(out, "   {letter}) {option}");
        }
    }
    out.trim_end().to_string()
}

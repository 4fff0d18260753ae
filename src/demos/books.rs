//! A book list loaded from a repository.

use crate::builder::{BuildError, OrchestratorBuilder};
use crate::config::OrchestratorConfig;
use crate::core::{Effect, PerformContext, PerformResult, Performer, StateExt};
use crate::named_variants;
use crate::orchestrator::Orchestrator;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    pub year: String,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum BooksState {
    Empty,
    Loading,
    Content(Vec<Book>),
    Error(String),
}

named_variants! {
    State for BooksState { Empty, Loading, Content, Error }
    error: [Error]
}

#[derive(Debug)]
pub enum BooksIntent {
    Load,
    Loaded(Vec<Book>),
    Failed(String),
    Clear,
}

named_variants! {
    Intent for BooksIntent { Load, Loaded, Failed, Clear }
}

#[derive(Debug, PartialEq, Eq)]
pub enum BooksAction {
    Load,
}

named_variants! {
    Action for BooksAction { Load }
}

pub fn reduce(state: &BooksState, intent: BooksIntent) -> Effect<BooksState, BooksAction> {
    match (state, intent) {
        (BooksState::Loading, BooksIntent::Load) => state.clone().state_only(),
        (_, BooksIntent::Load) => BooksState::Loading.with(BooksAction::Load),
        (BooksState::Loading, BooksIntent::Loaded(books)) if books.is_empty() => {
            BooksState::Empty.state_only()
        }
        (BooksState::Loading, BooksIntent::Loaded(books)) => BooksState::Content(books).state_only(),
        (BooksState::Loading, BooksIntent::Failed(message)) => {
            BooksState::Error(message).state_only()
        }
        // Results that arrive after a clear are stale.
        (_, BooksIntent::Loaded(_) | BooksIntent::Failed(_)) => state.clone().state_only(),
        (_, BooksIntent::Clear) => BooksState::Empty.state_only(),
    }
}

#[derive(Debug, Error)]
pub enum BooksError {
    #[error("Books unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed book list: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[async_trait]
pub trait BooksRepository: Send + Sync + 'static {
    async fn load_books(&self) -> Result<Vec<Book>, BooksError>;
}

/// Repository serving a JSON array of books.
pub struct JsonBooksRepository {
    source: String,
}

impl JsonBooksRepository {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

#[async_trait]
impl BooksRepository for JsonBooksRepository {
    async fn load_books(&self) -> Result<Vec<Book>, BooksError> {
        Ok(serde_json::from_str(&self.source)?)
    }
}

pub struct BooksPerformer<R> {
    repository: R,
}

impl<R: BooksRepository> BooksPerformer<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<R: BooksRepository> Performer<BooksAction, BooksIntent> for BooksPerformer<R> {
    async fn perform(
        &self,
        action: BooksAction,
        _ctx: &PerformContext<BooksIntent>,
    ) -> PerformResult<BooksIntent> {
        match action {
            BooksAction::Load => match self.repository.load_books().await {
                Ok(books) => Ok(Some(BooksIntent::Loaded(books))),
                Err(err) => {
                    tracing::warn!(error = %err, "loading books failed");
                    Ok(Some(BooksIntent::Failed(err.to_string())))
                }
            },
        }
    }
}

/// Stopped book list orchestrator backed by `repository`.
pub fn books<R: BooksRepository>(
    repository: R,
) -> Result<Orchestrator<BooksState, BooksIntent, BooksAction>, BuildError> {
    OrchestratorBuilder::new()
        .config(OrchestratorConfig {
            history_capacity: 16,
            ..OrchestratorConfig::named("books")
        })
        .initial(BooksState::Empty)
        .reducer(reduce)
        .performer(BooksPerformer::new(repository))
        .build()
}

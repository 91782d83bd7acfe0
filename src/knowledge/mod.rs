//! Knowledge lookup collaborator.
//!
//! The orchestrator only sees [`KnowledgeLookup`]. The built-in
//! [`StaticKnowledgeBase`] scores a small article and FAQ corpus by keyword;
//! a vector-search backend can implement the same trait.

pub mod catalog;
pub mod flows;

use crate::error::Result;
use serde::Serialize;

pub use catalog::{Software, StaticKnowledgeBase, find_software};
pub use flows::{Flow, FlowStep, StepKind, find_flow, flow_ids};

/// Namespace holding knowledge-base articles.
pub const KB_ARTICLES: &str = "kb_articles";

/// Namespace holding FAQ entries.
pub const FAQS: &str = "faqs";

/// One ranked search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snippet {
    /// Source document id.
    pub id: String,

    /// Title (or FAQ question).
    pub title: String,

    /// Body text (or FAQ answer).
    pub text: String,

    /// Category metadata.
    pub category: String,

    /// Namespace the hit came from.
    pub namespace: &'static str,

    /// Relevance; higher is better.
    pub relevance: f64,
}

/// Ranked snippet search over a knowledge corpus.
pub trait KnowledgeLookup: Send + Sync {
    /// Search for `query`, optionally restricted to one namespace.
    ///
    /// An empty result is not an error.
    ///
    /// # Errors
    ///
    /// Returns `Error::Knowledge` if the lookup fails or the namespace is unknown.
    fn search(
        &self,
        query: &str,
        namespace: Option<&str>,
        max_results: usize,
    ) -> Result<Vec<Snippet>>;
}

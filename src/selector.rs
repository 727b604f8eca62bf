//! Weighted CSS selectors for rule matching
//!
//! A [`Selector`] pairs its source text with a specificity weight and a
//! match strategy. Matching asks the node's document for every element the
//! selector selects and tests membership; the cached strategy keeps that
//! set for as long as the same document keeps coming back.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dom::{DocumentId, Node, NodeId};
use crate::error::Result;

const UNIVERSAL: &str = "*";

/// How a selector decides whether it matches a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    /// Query the document on every match attempt.
    Direct,
    /// Query once per document and keep the matching set.
    #[default]
    Cached,
}

struct CachedMatches {
    document: DocumentId,
    nodes: HashSet<NodeId>,
}

pub struct Selector {
    text: String,
    weight: u64,
    strategy: MatchStrategy,
    cache: RefCell<Option<CachedMatches>>,
}

impl Selector {
    /// Compile with the default (cached) strategy.
    pub fn new(text: &str) -> Self {
        Self::with_strategy(text, MatchStrategy::default())
    }

    pub fn with_strategy(text: &str, strategy: MatchStrategy) -> Self {
        Self {
            text: text.to_string(),
            weight: weight_of(text),
            strategy,
            cache: RefCell::new(None),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn weight(&self) -> u64 {
        self.weight
    }

    pub fn strategy(&self) -> MatchStrategy {
        self.strategy
    }

    /// Whether `node` is among the elements this selector selects in the
    /// node's own document. An absent node never matches.
    pub fn matches<'d>(&self, node: impl Into<Option<Node<'d>>>) -> Result<bool> {
        let Some(node) = node.into() else {
            return Ok(false);
        };
        if self.text == UNIVERSAL {
            return Ok(true);
        }

        match self.strategy {
            MatchStrategy::Direct => Ok(node.document().query(&self.text)?.contains(&node.id())),
            MatchStrategy::Cached => {
                let document = node.document();
                let mut cache = self.cache.borrow_mut();
                let stale = cache
                    .as_ref()
                    .is_none_or(|cached| cached.document != document.id());
                if stale {
                    debug!("Caching matches for '{}' in {:?}", self.text, document.id());
                    *cache = Some(CachedMatches {
                        document: document.id(),
                        nodes: document.query(&self.text)?,
                    });
                }
                Ok(cache
                    .as_ref()
                    .is_some_and(|cached| cached.nodes.contains(&node.id())))
            }
        }
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selector")
            .field("text", &self.text)
            .field("weight", &self.weight)
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}

/// Approximate CSS specificity: per whitespace-separated part, an id
/// counts 1,000,000, a class or tag name 1,000, anything else 1.
pub fn weight_of(text: &str) -> u64 {
    text.split_whitespace()
        .map(|part| {
            if part.contains('#') {
                1_000_000
            } else if part.contains('.') || part.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
                1_000
            } else {
                1
            }
        })
        .sum()
}

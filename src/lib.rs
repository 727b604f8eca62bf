//! Tree Projector - rule-driven projection of markup trees into data
//!
//! A [`RuleSet`] maps weighted CSS selectors to actions. Transforming a
//! document walks its elements, runs the heaviest matching rule for each
//! node on the way in and on the way out, and collects whatever the actions
//! write into nested list-or-map [`Container`]s.
//!
//! ```no_run
//! use tree_projector::{Document, Helper, RuleSet};
//!
//! # fn main() -> tree_projector::Result<()> {
//! let mut rules = RuleSet::new("Titles");
//! rules
//!     .add_helper(Helper::text())
//!     .on("*", |_| Ok(()))
//!     .on("h1", |ctx| {
//!         let title = ctx.call("text", &[])?;
//!         ctx.get("document")?.child("titles")?.append(title)
//!     });
//!
//! let document = Document::parse_html("<h1>One</h1><h1>Two</h1>");
//! let output = rules.transform(&document)?.to_plain();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod container;
pub mod context;
pub mod dom;
pub mod error;
pub mod helpers;
pub mod logging;
pub mod presets;
pub mod rule_set;
pub mod scope;
pub mod selector;
mod transform;

pub use config::{AppConfig, LoggingConfig, RuleSetConfig};
pub use container::{Container, Item, Key, Shape};
pub use context::{Action, Context, Resolved};
pub use dom::{Child, Document, DocumentId, Node};
pub use error::{Error, Result};
pub use helpers::{Helper, HelperArg, HelperTable};
pub use rule_set::{Mode, Rule, RuleSet, SelectorList};
pub use scope::Scope;
pub use selector::{MatchStrategy, Selector};

//! Helper function bundles callable from rule actions
//!
//! A rule set carries an ordered list of [`Helper`] bundles. Before the
//! first traversal they are merged into one [`HelperTable`]; rule actions
//! reach the functions by name through [`Context::call`].
//!
//! [`Context::call`]: crate::context::Context::call

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::context::Context;
use crate::dom::Node;
use crate::error::{Error, Result};

/// Left-to-right mark, common noise in scraped listings.
const LEFT_TO_RIGHT_MARK: char = '\u{200e}';

pub type HelperFn = Rc<dyn Fn(&Context<'_>, &[HelperArg<'_>]) -> Result<Value>>;

/// Argument passed to a helper function.
#[derive(Debug, Clone)]
pub enum HelperArg<'a> {
    Node(Node<'a>),
    Value(Value),
}

impl<'a> From<Node<'a>> for HelperArg<'a> {
    fn from(node: Node<'a>) -> Self {
        Self::Node(node)
    }
}

impl From<Value> for HelperArg<'_> {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for HelperArg<'_> {
    fn from(value: &str) -> Self {
        Self::Value(Value::String(value.to_string()))
    }
}

/// A named bundle of helper functions.
#[derive(Clone)]
pub struct Helper {
    name: String,
    functions: Vec<(String, HelperFn)>,
}

impl Helper {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            functions: Vec::new(),
        }
    }

    /// Adds (or replaces) a function in this bundle.
    #[must_use]
    pub fn function<F>(mut self, name: &str, function: F) -> Self
    where
        F: Fn(&Context<'_>, &[HelperArg<'_>]) -> Result<Value> + 'static,
    {
        self.functions.retain(|(existing, _)| existing != name);
        self.functions.push((name.to_string(), Rc::new(function)));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.iter().map(|(name, _)| name.as_str())
    }

    /// Text cleanup bundle: `text(node)` returns the node's text without
    /// left-to-right marks and surrounding whitespace. Without an argument
    /// it cleans the current node.
    pub fn text() -> Self {
        Self::new("text").function("text", |ctx, args| {
            let node = match args {
                [] => ctx.node(),
                [HelperArg::Node(node)] => *node,
                _ => return Err(Error::helper_arguments("text", "expected a single node")),
            };
            Ok(Value::String(clean_text(&node.text())))
        })
    }
}

impl fmt::Debug for Helper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Helper")
            .field("name", &self.name)
            .field("functions", &self.function_names().collect::<Vec<_>>())
            .finish()
    }
}

pub fn clean_text(text: &str) -> String {
    text.replace(LEFT_TO_RIGHT_MARK, "").trim().to_string()
}

/// Helper functions of all bundles, merged by name. When two bundles
/// define the same name, the one registered first wins.
#[derive(Default, Clone)]
pub struct HelperTable {
    functions: HashMap<String, HelperFn>,
}

impl HelperTable {
    pub fn from_helpers(helpers: &[Helper]) -> Self {
        let mut functions = HashMap::new();
        for helper in helpers {
            for (name, function) in &helper.functions {
                functions
                    .entry(name.clone())
                    .or_insert_with(|| Rc::clone(function));
            }
        }
        Self { functions }
    }

    pub fn get(&self, name: &str) -> Option<&HelperFn> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

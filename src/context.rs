//! Execution context handed to rule actions
//!
//! A [`Context`] wraps the scope of the node being visited. Through it an
//! action reads and writes output, looks up ancestor scopes by name,
//! stops the walk from descending, defers work until the node's children
//! are done, and calls helper functions.

use std::rc::Rc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::container::{Container, Item};
use crate::dom::Node;
use crate::error::{Error, Result};
use crate::helpers::{HelperArg, HelperTable};
use crate::scope::Scope;

/// A rule action or deferred callback.
pub type Action = Rc<dyn Fn(&mut Context<'_>) -> Result<()>>;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z_0-9]*$").expect("valid identifier pattern")
});

/// What a bare name resolved to.
#[derive(Debug)]
pub enum Resolved<'s> {
    /// An enclosing scope (or the current one) answering to the name.
    Scope(&'s Scope<'s>),
    /// An attribute of the current scope's container.
    Attribute(Item),
}

impl Resolved<'_> {
    /// The container behind the resolution.
    pub fn into_container(self, name: &str) -> Result<Container> {
        match self {
            Self::Scope(scope) => Ok(scope.data().clone()),
            Self::Attribute(Item::Container(container)) => Ok(container),
            Self::Attribute(Item::Value(_)) => Err(Error::not_a_container(name)),
        }
    }
}

pub struct Context<'s> {
    scope: &'s Scope<'s>,
    helpers: &'s HelperTable,
    skip_children: bool,
    deferred: Option<Action>,
}

impl<'s> Context<'s> {
    pub fn new(scope: &'s Scope<'s>, helpers: &'s HelperTable) -> Self {
        Self {
            scope,
            helpers,
            skip_children: false,
            deferred: None,
        }
    }

    pub fn scope(&self) -> &'s Scope<'s> {
        self.scope
    }

    pub fn node(&self) -> Node<'s> {
        self.scope.node()
    }

    /// The current scope's own container.
    pub fn data(&self) -> &'s Container {
        self.scope.data()
    }

    /// Do not descend into this node's children.
    pub fn skip_children(&mut self) {
        self.skip_children = true;
    }

    pub fn skips_children(&self) -> bool {
        self.skip_children
    }

    /// Run `action` once this node's children are done. A later call
    /// replaces an action that has not run yet.
    pub fn defer<F>(&mut self, action: F)
    where
        F: Fn(&mut Context<'_>) -> Result<()> + 'static,
    {
        self.deferred = Some(Rc::new(action));
    }

    pub fn deferred(&self) -> Option<&Action> {
        self.deferred.as_ref()
    }

    pub(crate) fn take_deferred(&mut self) -> Option<Action> {
        self.deferred.take()
    }

    /// Resolves a bare name: the nearest scope in the chain (this one
    /// included) whose node has that tag or class, else an attribute of
    /// this scope's container (created on first read).
    pub fn resolve(&self, name: &str) -> Result<Resolved<'s>> {
        if IDENTIFIER.is_match(name) {
            if let Some(scope) = self.scope.find_named(name) {
                return Ok(Resolved::Scope(scope));
            }
        }
        self.scope.data().attr(name).map(Resolved::Attribute)
    }

    /// [`resolve`](Self::resolve), requiring a container.
    pub fn get(&self, name: &str) -> Result<Container> {
        self.resolve(name)?.into_container(name)
    }

    /// Writes to this scope's own container; never looks at ancestors.
    pub fn set(&self, name: &str, value: impl Into<Item>) -> Result<()> {
        self.scope.data().set_attr(name, value)
    }

    pub fn has_helper(&self, name: &str) -> bool {
        self.helpers.contains(name)
    }

    /// Calls a helper function by name.
    pub fn call(&self, name: &str, args: &[HelperArg<'_>]) -> Result<Value> {
        let function = self.helpers.get(name).ok_or_else(|| Error::UnknownHelper {
            name: name.to_string(),
        })?;
        function(self, args)
    }
}

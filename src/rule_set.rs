//! Rule registry
//!
//! A [`RuleSet`] keeps, per traversal [`Mode`], the rules registered for
//! each selector text in registration order, along with the helper bundles
//! its actions may call. [`RuleSet::best_rule`] picks the heaviest
//! matching selector for a node.

use std::fmt;
use std::rc::Rc;

use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::RuleSetConfig;
use crate::context::{Action, Context};
use crate::dom::Node;
use crate::error::Result;
use crate::helpers::{Helper, HelperTable};
use crate::selector::Selector;

/// Traversal pass a rule fires in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Before the node's children are visited.
    Enter,
    /// After the node's children are visited.
    After,
}

impl Mode {
    /// Both modes in traversal order.
    pub const ALL: [Mode; 2] = [Mode::Enter, Mode::After];
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Enter => write!(f, "enter"),
            Mode::After => write!(f, "after"),
        }
    }
}

/// A selector paired with the action to run for nodes it matches.
#[derive(Clone)]
pub struct Rule {
    selector: Rc<Selector>,
    action: Action,
}

impl Rule {
    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn action(&self) -> &Action {
        &self.action
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("selector", &self.selector.text())
            .field("weight", &self.selector.weight())
            .finish_non_exhaustive()
    }
}

/// One or more selector texts, each of which may itself be a
/// comma-separated list.
pub trait SelectorList {
    fn selector_texts(self) -> Vec<String>;
}

fn split_selectors<'t>(texts: impl IntoIterator<Item = &'t str>) -> Vec<String> {
    texts
        .into_iter()
        .flat_map(|text| text.split(','))
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .collect()
}

impl SelectorList for &str {
    fn selector_texts(self) -> Vec<String> {
        split_selectors([self])
    }
}

impl SelectorList for String {
    fn selector_texts(self) -> Vec<String> {
        split_selectors([self.as_str()])
    }
}

impl SelectorList for &[&str] {
    fn selector_texts(self) -> Vec<String> {
        split_selectors(self.iter().copied())
    }
}

impl<const N: usize> SelectorList for [&str; N] {
    fn selector_texts(self) -> Vec<String> {
        split_selectors(self)
    }
}

impl SelectorList for Vec<&str> {
    fn selector_texts(self) -> Vec<String> {
        split_selectors(self)
    }
}

impl SelectorList for Vec<String> {
    fn selector_texts(self) -> Vec<String> {
        split_selectors(self.iter().map(String::as_str))
    }
}

pub struct RuleSet {
    name: String,
    config: RuleSetConfig,
    enter: Vec<Rule>,
    after: Vec<Rule>,
    helpers: Vec<Helper>,
    helper_table: OnceCell<HelperTable>,
}

impl RuleSet {
    pub fn new(name: &str) -> Self {
        Self::with_config(name, RuleSetConfig::default())
    }

    pub fn with_config(name: &str, config: RuleSetConfig) -> Self {
        Self {
            name: name.to_string(),
            config,
            enter: Vec::new(),
            after: Vec::new(),
            helpers: Vec::new(),
            helper_table: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &RuleSetConfig {
        &self.config
    }

    /// Registers `action` for every selector in `selectors` under `mode`.
    ///
    /// A selector already registered in the same mode is replaced in place
    /// (keeping its position), with a warning.
    pub fn register<S, F>(&mut self, mode: Mode, selectors: S, action: F) -> &mut Self
    where
        S: SelectorList,
        F: Fn(&mut Context<'_>) -> Result<()> + 'static,
    {
        let action: Action = Rc::new(action);
        let strategy = self.config.match_strategy;
        let warn_redefined = self.config.warn_redefined;

        for text in selectors.selector_texts() {
            let rule = Rule {
                selector: Rc::new(Selector::with_strategy(&text, strategy)),
                action: Rc::clone(&action),
            };
            let position = self
                .rules(mode)
                .iter()
                .position(|existing| existing.selector.text() == text);
            match position {
                Some(index) => {
                    if warn_redefined {
                        warn!("{}, in mode {}: redefining rule for {}", self.name, mode, text);
                    }
                    self.rules_mut(mode)[index] = rule;
                }
                None => self.rules_mut(mode).push(rule),
            }
        }
        self
    }

    pub fn on_enter<S, F>(&mut self, selectors: S, action: F) -> &mut Self
    where
        S: SelectorList,
        F: Fn(&mut Context<'_>) -> Result<()> + 'static,
    {
        self.register(Mode::Enter, selectors, action)
    }

    pub fn on_after<S, F>(&mut self, selectors: S, action: F) -> &mut Self
    where
        S: SelectorList,
        F: Fn(&mut Context<'_>) -> Result<()> + 'static,
    {
        self.register(Mode::After, selectors, action)
    }

    /// Same as [`on_enter`](Self::on_enter).
    pub fn on<S, F>(&mut self, selectors: S, action: F) -> &mut Self
    where
        S: SelectorList,
        F: Fn(&mut Context<'_>) -> Result<()> + 'static,
    {
        self.on_enter(selectors, action)
    }

    /// Same as [`on_after`](Self::on_after).
    pub fn after<S, F>(&mut self, selectors: S, action: F) -> &mut Self
    where
        S: SelectorList,
        F: Fn(&mut Context<'_>) -> Result<()> + 'static,
    {
        self.on_after(selectors, action)
    }

    pub fn rules(&self, mode: Mode) -> &[Rule] {
        match mode {
            Mode::Enter => &self.enter,
            Mode::After => &self.after,
        }
    }

    fn rules_mut(&mut self, mode: Mode) -> &mut Vec<Rule> {
        match mode {
            Mode::Enter => &mut self.enter,
            Mode::After => &mut self.after,
        }
    }

    /// Selector texts registered under `mode`, in registration order.
    pub fn selectors(&self, mode: Mode) -> Vec<&str> {
        self.rules(mode).iter().map(|rule| rule.selector.text()).collect()
    }

    /// The matching rule with the heaviest selector. Among equally heavy
    /// matches the one registered last wins.
    pub fn best_rule(&self, mode: Mode, node: Node<'_>) -> Result<Option<&Rule>> {
        let mut best: Option<&Rule> = None;
        for rule in self.rules(mode) {
            if !rule.selector.matches(node)? {
                continue;
            }
            if best.is_none_or(|current| rule.selector.weight() >= current.selector.weight()) {
                best = Some(rule);
            }
        }

        if let Some(rule) = best {
            debug!("{} {}: '{}' matches {:?}", self.name, mode, rule.selector.text(), node);
        }
        Ok(best)
    }

    pub fn add_helper(&mut self, helper: Helper) -> &mut Self {
        self.helpers.push(helper);
        self.helper_table = OnceCell::new();
        self
    }

    pub fn helpers(&self) -> &[Helper] {
        &self.helpers
    }

    /// Helper functions of all bundles merged into one lookup table,
    /// built on first use.
    pub fn helper_table(&self) -> &HelperTable {
        self.helper_table
            .get_or_init(|| HelperTable::from_helpers(&self.helpers))
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet")
            .field("name", &self.name)
            .field("enter", &self.selectors(Mode::Enter))
            .field("after", &self.selectors(Mode::After))
            .field("helpers", &self.helpers)
            .finish()
    }
}

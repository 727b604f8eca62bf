//! Two-pass tree walk
//!
//! For every visited node the walk creates a scope and one context, then
//! runs the best enter rule, the children (unless skipped), and the best
//! after rule. A deferred action runs at the end of the pass that set it.

use tracing::{debug, warn};

use crate::context::Context;
use crate::dom::{Child, Node};
use crate::error::Result;
use crate::helpers::HelperTable;
use crate::rule_set::{Mode, RuleSet};
use crate::scope::Scope;

impl RuleSet {
    /// Transforms `target` (a node, or a whole document meaning its root)
    /// and returns the root scope holding the output.
    pub fn transform<'a>(&self, target: impl Into<Node<'a>>) -> Result<Scope<'a>> {
        let node = target.into();
        debug!("{}: transforming {:?}", self.name(), node);
        let scope = Scope::new(node, None);
        self.visit(&scope, self.helper_table())?;
        Ok(scope)
    }

    /// Transforms `node` in a scope nested under `parent`, so its rules can
    /// reach the scopes above by name.
    pub fn transform_within<'a>(&self, node: Node<'a>, parent: &'a Scope<'a>) -> Result<Scope<'a>> {
        let scope = Scope::new(node, Some(parent));
        self.visit(&scope, self.helper_table())?;
        Ok(scope)
    }

    fn visit(&self, scope: &Scope<'_>, helpers: &HelperTable) -> Result<()> {
        let node = scope.node();
        let mut ctx = Context::new(scope, helpers);
        let mut matched = false;

        for mode in Mode::ALL {
            if let Some(rule) = self.best_rule(mode, node)? {
                matched = true;
                (rule.action())(&mut ctx)?;
            }

            if mode == Mode::Enter && !ctx.skips_children() {
                for child in node.children() {
                    if let Child::Element(child) = child {
                        let child_scope = Scope::new(child, Some(scope));
                        self.visit(&child_scope, helpers)?;
                    }
                }
            }

            if let Some(deferred) = ctx.take_deferred() {
                deferred(&mut ctx)?;
            }
        }

        if !matched && self.config().warn_unmatched {
            warn!("no rule registered: {}", node.path());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleSetConfig;
    use crate::container::Shape;
    use crate::dom::Document;
    use crate::error::Error;
    use serde_json::json;

    const DATA: &str = "<top><mid><bot/></mid><side/></top>";

    #[test]
    fn skipped_children_are_not_visited() {
        let document = Document::parse_xml(DATA).unwrap();
        let mut rules = RuleSet::new("Skip");
        rules
            .on("mid", |ctx| {
                ctx.skip_children();
                Ok(())
            })
            .on("bot, side", |ctx| {
                let name = ctx.node().tag_name();
                ctx.get("document")?.child("seen")?.append(name)
            });

        let scope = rules.transform(&document).unwrap();
        assert_eq!(scope.to_plain(), json!({ "seen": ["side"] }));
    }

    #[test]
    fn enter_defer_runs_once_after_children() {
        let document = Document::parse_xml(DATA).unwrap();
        let mut rules = RuleSet::new("Defer");
        rules
            .on("top", |ctx| {
                ctx.data().child("log")?.append("enter")?;
                ctx.defer(|ctx| ctx.data().child("log")?.append("deferred"));
                Ok(())
            })
            .after("top", |ctx| ctx.data().child("log")?.append("after"))
            .on("mid, bot, side", |ctx| {
                let name = ctx.node().tag_name();
                ctx.get("top")?.child("log")?.append(name)
            });

        let scope = rules.transform(&document).unwrap();
        assert_eq!(
            scope.to_plain(),
            json!({ "log": ["enter", "mid", "bot", "side", "deferred", "after"] })
        );
    }

    #[test]
    fn after_defer_runs_after_the_after_rule() {
        let document = Document::parse_xml("<top/>").unwrap();
        let mut rules = RuleSet::new("Defer");
        rules.after("top", |ctx| {
            ctx.defer(|ctx| ctx.data().child("log")?.append("deferred"));
            ctx.data().child("log")?.append("after")
        });

        let scope = rules.transform(&document).unwrap();
        assert_eq!(scope.to_plain(), json!({ "log": ["after", "deferred"] }));
    }

    #[test]
    fn unmatched_subtrees_do_not_stop_siblings() {
        let document = Document::parse_xml("<top><lost><deeper/></lost><found>x</found></top>").unwrap();
        let mut rules = RuleSet::new("Partial");
        rules.on("found", |ctx| {
            let text = ctx.node().text();
            ctx.get("document")?.set_attr("found", text)
        });

        let scope = rules.transform(&document).unwrap();
        assert_eq!(scope.to_plain(), json!({ "found": "x" }));
    }

    #[test]
    fn type_conflicts_abort_the_transform() {
        let document = Document::parse_xml(DATA).unwrap();
        let mut rules = RuleSet::new("Conflict");
        rules
            .on("top", |ctx| ctx.data().append(1))
            .on("mid", |ctx| ctx.get("top")?.set_attr("name", "mid"));

        let err = rules.transform(&document).unwrap_err();
        assert!(matches!(
            err,
            Error::TypeConflict { current: Shape::List, requested: Shape::Map }
        ));
    }

    #[test]
    fn bad_selectors_abort_the_transform() {
        let document = Document::parse_xml(DATA).unwrap();
        let mut rules = RuleSet::with_config(
            "Broken",
            RuleSetConfig {
                warn_unmatched: false,
                ..RuleSetConfig::default()
            },
        );
        rules.on("top >", |_| Ok(()));

        assert!(matches!(
            rules.transform(&document),
            Err(Error::UnknownSelectorSyntax { .. })
        ));
    }

    #[test]
    fn transform_within_reaches_outer_scopes() {
        let document = Document::parse_xml(DATA).unwrap();
        let outer = Scope::new(document.root(), None);

        let mut rules = RuleSet::new("Nested");
        rules.on("bot", |ctx| {
            let bot = ctx.data().clone();
            ctx.get("document")?.child("bots")?.append(bot)?;
            ctx.set("depth", 2)
        });

        let bot = document.select_first("bot").unwrap().unwrap();
        let scope = rules.transform_within(bot, &outer).unwrap();
        assert_eq!(scope.to_plain(), json!({ "depth": 2 }));
        assert_eq!(outer.to_plain(), json!({ "bots": [{ "depth": 2 }] }));
    }
}

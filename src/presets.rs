//! Ready-made rule sets

use crate::config::RuleSetConfig;
use crate::container::Container;
use crate::context::Context;
use crate::error::Result;
use crate::helpers::Helper;
use crate::rule_set::RuleSet;

/// The `name` entry of the nearest scope called `name`.
///
/// Records are collected one level below the scope that owns them, so a
/// feed ends up as `{"rss": {...}}` rather than as a bare map.
fn section(ctx: &Context<'_>, name: &str) -> Result<Container> {
    ctx.get(name)?.child(name)
}

/// RSS 2.0 feeds: channel fields plus an `items` list, one map per `<item>`.
pub fn rss() -> RuleSet {
    rss_with_config(RuleSetConfig::default())
}

pub fn rss_with_config(config: RuleSetConfig) -> RuleSet {
    let mut rules = RuleSet::with_config("SimpleRss", config);
    rules
        .add_helper(Helper::text())
        .on("*", |_| Ok(()))
        .on("rss channel *", |ctx| {
            let text = ctx.call("text", &[ctx.node().into()])?;
            section(ctx, "rss")?.set_attr(ctx.node().tag_name(), text)
        })
        .on("rss channel item", |ctx| {
            let item = section(ctx, "item")?;
            section(ctx, "rss")?.child("items")?.append(item)
        })
        .on("rss channel item *", |ctx| {
            let text = ctx.call("text", &[ctx.node().into()])?;
            section(ctx, "item")?.set_attr(ctx.node().tag_name(), text)
        });
    rules
}

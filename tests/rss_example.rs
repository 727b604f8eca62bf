//! End-to-end projection of an RSS feed
use serde_json::json;
use tree_projector::{presets, Document, Helper, RuleSet};

const FEED: &str = include_str!("fixtures/simple.rss");

fn expected() -> serde_json::Value {
    json!({
        "rss": {
            "title": "The Title",
            "link": "http://the.link",
            "description": "The description",
            "language": "de-de",
            "pubDate": "1363099965",
            "items": [
                { "title": "Item 1", "description": "description 1", "link": "http://the.first.link" },
                { "title": "Item 2", "description": "description 2", "link": "http://the.second.link" }
            ]
        }
    })
}

#[test]
fn rss_preset_projects_the_feed() {
    let document = Document::parse_xml(FEED).expect("feed parses");
    let scope = presets::rss().transform(&document).expect("transform succeeds");
    assert_eq!(scope.to_plain(), expected());
}

#[test]
fn rules_written_against_scope_names() {
    // The same feed, written straight into the named scopes: channel fields
    // go on the root, items are collected from their own scopes.
    let mut rules = RuleSet::new("FlatRss");
    rules
        .add_helper(Helper::text())
        .on("*", |_| Ok(()))
        .on("rss channel *", |ctx| {
            let text = ctx.call("text", &[])?;
            ctx.get("rss")?.set_attr(ctx.node().tag_name(), text)
        })
        .on("rss channel item", |ctx| {
            let item = ctx.get("item")?;
            ctx.get("rss")?.child("items")?.append(item)
        })
        .on("rss channel item *", |ctx| {
            let text = ctx.call("text", &[])?;
            ctx.get("item")?.set_attr(ctx.node().tag_name(), text)
        });

    let document = Document::parse_xml(FEED).unwrap();
    let scope = rules.transform(&document).unwrap();
    assert_eq!(scope.to_plain(), expected()["rss"]);
}

//! Visit order, skipping and deferral across whole documents
use rstest::rstest;
use serde_json::{json, Value};
use tree_projector::{Context, Document, MatchStrategy, Result, RuleSet, RuleSetConfig};

const TREE: &str = r#"
    <a>
      <b>
        <c/>
        <!-- ignored -->
        text is ignored too
        <d/>
      </b>
      <e><f/></e>
    </a>
"#;

fn log(ctx: &Context<'_>, event: &str) -> Result<()> {
    let entry = format!("{event} {}", ctx.node().tag_name());
    ctx.get("document")?.child("log")?.append(entry)
}

fn logging_rules(strategy: MatchStrategy) -> RuleSet {
    let config = RuleSetConfig {
        match_strategy: strategy,
        ..RuleSetConfig::default()
    };
    let mut rules = RuleSet::with_config("Logger", config);
    rules
        .on("*", |ctx| log(ctx, "enter"))
        .after("*", |ctx| log(ctx, "after"));
    rules
}

fn events(output: &Value) -> Vec<&str> {
    output["log"]
        .as_array()
        .map(|log| log.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

#[rstest]
#[case::direct(MatchStrategy::Direct)]
#[case::cached(MatchStrategy::Cached)]
fn visits_elements_depth_first(#[case] strategy: MatchStrategy) {
    let document = Document::parse_xml(TREE).unwrap();
    let output = logging_rules(strategy).transform(&document).unwrap().to_plain();

    assert_eq!(
        events(&output),
        [
            "enter a", "enter b", "enter c", "after c", "enter d", "after d", "after b",
            "enter e", "enter f", "after f", "after e", "after a",
        ]
    );
}

#[rstest]
#[case::direct(MatchStrategy::Direct)]
#[case::cached(MatchStrategy::Cached)]
fn heavier_rules_take_over_and_skip(#[case] strategy: MatchStrategy) {
    let document = Document::parse_xml(TREE).unwrap();
    let mut rules = logging_rules(strategy);
    rules.on("a > b", |ctx| {
        ctx.skip_children();
        log(ctx, "skip")
    });

    let output = rules.transform(&document).unwrap().to_plain();
    assert_eq!(
        events(&output),
        ["enter a", "skip b", "after b", "enter e", "enter f", "after f", "after e", "after a"]
    );
}

#[test]
fn deferred_actions_see_finished_children() {
    let document = Document::parse_xml(TREE).unwrap();
    let mut rules = logging_rules(MatchStrategy::Cached);
    rules.on("e", |ctx| {
        log(ctx, "enter")?;
        ctx.defer(|ctx| {
            let entries = ctx.get("document")?.child("log")?;
            let seen = entries.to_plain().as_array().map_or(0, Vec::len);
            ctx.set("seen_before_defer", seen as i64)?;
            log(ctx, "defer")
        });
        Ok(())
    });

    let output = rules.transform(&document).unwrap().to_plain();
    let events = events(&output);
    let defer = events.iter().position(|e| *e == "defer e").unwrap();
    assert_eq!(&events[defer - 2..=defer + 1], ["enter f", "after f", "defer e", "after e"]);
    assert_eq!(events.iter().filter(|e| **e == "defer e").count(), 1);
}

#[test]
fn a_whole_document_starts_at_its_root() {
    let document = Document::parse_xml(TREE).unwrap();
    let from_document = logging_rules(MatchStrategy::Cached).transform(&document).unwrap();
    let from_root = logging_rules(MatchStrategy::Cached)
        .transform(document.root())
        .unwrap();

    assert_eq!(from_document.to_plain(), from_root.to_plain());
    assert_eq!(from_document.node(), document.root());
    assert_eq!(from_document.to_plain()["log"][0], json!("enter a"));
}

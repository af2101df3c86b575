//! End-to-end runs through the full pipeline: suspension and resumption,
//! incremental re-runs, cycle detection, and interrupted-run durability.

use std::collections::BTreeMap;
use std::path::Path;

use strata_common::Interner;
use strata_compile::{
    CompileError, Compiler, Filter, FilterContext, FilterRegistry, FilterRunError, Notification,
    NotificationSink, RunSummary, StaticActionProvider,
};
use strata_deps::DependencyStore;
use strata_model::{
    action::ActionParams, ActionSequence, Attributes, Configuration, Content, Item,
    ItemCollection, LayoutCollection, ObjectId, RepId, Site,
};
use strata_store::{CompiledContentCache, OutdatednessStore};

/// Replaces `{{<glob>}}` references with the matching item's compiled
/// `last` snapshot. Unmet dependencies propagate so the scheduler can
/// suspend.
struct Embed;

impl Filter for Embed {
    fn apply(
        &self,
        input: &Content,
        _params: &ActionParams,
        ctx: &mut FilterContext<'_>,
    ) -> Result<Content, FilterRunError> {
        let text = input.as_str().ok_or_else(|| FilterRunError::Failed {
            message: "cannot embed into binary content".to_string(),
        })?;

        let mut out = String::new();
        let mut rest = text;
        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after.find("}}").ok_or_else(|| FilterRunError::Failed {
                message: "unclosed reference".to_string(),
            })?;
            let embedded = ctx.compiled_content_matching(&after[..end])?;
            out.push_str(embedded.as_str().unwrap_or_default());
            rest = &after[end + 2..];
        }
        out.push_str(rest);
        Ok(Content::textual(out))
    }
}

fn registry() -> FilterRegistry {
    let mut registry = FilterRegistry::new();
    registry.register("embed", Embed);
    registry
}

fn embed_sequence() -> ActionSequence {
    ActionSequence::new()
        .add_filter("embed", BTreeMap::new())
        .add_snapshot("last", vec![])
}

fn build_site(interner: &Interner, items: &[(&str, &str)]) -> Site {
    Site::new(
        Configuration::default(),
        ItemCollection::new(
            items
                .iter()
                .map(|(id, content)| {
                    Item::new(interner.get_or_intern(id), *content, Attributes::new())
                })
                .collect(),
        ),
        LayoutCollection::default(),
    )
}

fn run(
    site: &Site,
    interner: &Interner,
    state_dir: &Path,
    provider: &StaticActionProvider,
    filters: &FilterRegistry,
) -> (RunSummary, Vec<Notification>) {
    let sink = NotificationSink::new();
    let compiler = Compiler::new(site, interner, state_dir, filters, provider, &sink);
    let summary = compiler.run().expect("run succeeds");
    (summary, sink.take_all())
}

fn rep(interner: &Interner, item: &str) -> RepId {
    RepId::new(
        interner.get_or_intern(item),
        interner.get_or_intern("default"),
    )
}

/// Events without the dependency-created noise, for order assertions.
fn lifecycle(events: &[Notification]) -> Vec<Notification> {
    events
        .iter()
        .filter(|e| !matches!(e, Notification::DependencyCreated { .. }))
        .cloned()
        .collect()
}

fn cached_last_snapshot(state_dir: &Path, site: &Site, interner: &Interner, item: &str) -> Content {
    let mut reps = strata_model::RepCollection::new();
    for i in site.items.iter() {
        reps.push(strata_model::ItemRep::new(
            i.identifier,
            interner.get_or_intern("default"),
        ));
    }
    let mut cache = CompiledContentCache::open(state_dir);
    cache.prefetch(&reps, interner).unwrap();
    cache
        .snapshots_for(rep(interner, item), interner)
        .expect("cached snapshots")
        .get("last")
        .expect("last snapshot")
        .clone()
}

#[test]
fn suspension_links_cross_representation_content() {
    let dir = tempfile::tempdir().unwrap();
    let interner = Interner::new();
    let site = build_site(
        &interner,
        &[("/hi.md", "other={{/other.*}}"), ("/other.md", "other content")],
    );

    let mut provider = StaticActionProvider::new();
    provider.set_sequence("/hi.md", "default", embed_sequence());
    provider.set_sequence("/other.md", "default", embed_sequence());
    let filters = registry();

    let (summary, events) = run(&site, &interner, dir.path(), &provider, &filters);

    assert_eq!(summary.compiled_reps, 2);
    assert_eq!(
        cached_last_snapshot(dir.path(), &site, &interner, "/hi.md"),
        Content::textual("other=other content")
    );

    // A compiled-content edge from /hi.md to /other.md was recorded
    let deps = DependencyStore::load(dir.path(), &interner).unwrap();
    let hi = ObjectId::Item(interner.get_or_intern("/hi.md"));
    let other = ObjectId::Item(interner.get_or_intern("/other.md"));
    let edges = deps.dependencies_causing_outdatedness_of(hi);
    let edge = edges
        .iter()
        .find(|e| e.to == other)
        .expect("edge to /other.md");
    assert!(edge.props.compiled_content);

    // The dependency was recorded before the suspension
    let dep_pos = events
        .iter()
        .position(|e| matches!(e, Notification::DependencyCreated { to, .. } if *to == other))
        .expect("dependency notification");
    let suspend_pos = events
        .iter()
        .position(|e| matches!(e, Notification::CompilationSuspended { .. }))
        .expect("suspension notification");
    assert!(dep_pos < suspend_pos);

    let hi_rep = rep(&interner, "/hi.md");
    let other_rep = rep(&interner, "/other.md");
    let embed = "embed".to_string();
    assert_eq!(
        lifecycle(&events),
        vec![
            Notification::CompilationStarted { rep: hi_rep },
            Notification::FilteringStarted {
                rep: hi_rep,
                filter: embed.clone()
            },
            Notification::CompilationSuspended {
                rep: hi_rep,
                waiting_on: other_rep
            },
            Notification::CompilationStarted { rep: other_rep },
            Notification::FilteringStarted {
                rep: other_rep,
                filter: embed.clone()
            },
            Notification::FilteringEnded {
                rep: other_rep,
                filter: embed.clone()
            },
            Notification::CompilationEnded { rep: other_rep },
            Notification::CompilationStarted { rep: hi_rep },
            Notification::FilteringStarted {
                rep: hi_rep,
                filter: embed.clone()
            },
            Notification::FilteringEnded {
                rep: hi_rep,
                filter: embed
            },
            Notification::CompilationEnded { rep: hi_rep },
        ]
    );
}

#[test]
fn second_run_without_changes_compiles_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let filters = registry();

    let mut provider = StaticActionProvider::new();
    provider.set_sequence("/hi.md", "default", embed_sequence());
    provider.set_sequence("/other.md", "default", embed_sequence());

    let items = [("/hi.md", "other={{/other.*}}"), ("/other.md", "other content")];

    {
        let interner = Interner::new();
        let site = build_site(&interner, &items);
        run(&site, &interner, dir.path(), &provider, &filters);
    }

    // Fresh interner and site, as a new process would have
    let interner = Interner::new();
    let site = build_site(&interner, &items);
    let (summary, events) = run(&site, &interner, dir.path(), &provider, &filters);

    assert!(summary.outdated_items.is_empty());
    assert_eq!(summary.compiled_reps, 0);
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, Notification::FilteringStarted { .. })),
        "no filter may run on an unchanged site"
    );
}

#[test]
fn dependency_content_change_recompiles_the_reader() {
    let dir = tempfile::tempdir().unwrap();
    let filters = registry();

    let mut provider = StaticActionProvider::new();
    provider.set_sequence("/hi.md", "default", embed_sequence());
    provider.set_sequence("/other.md", "default", embed_sequence());

    {
        let interner = Interner::new();
        let site = build_site(
            &interner,
            &[("/hi.md", "other={{/other.*}}"), ("/other.md", "other content")],
        );
        run(&site, &interner, dir.path(), &provider, &filters);
    }

    let interner = Interner::new();
    let site = build_site(
        &interner,
        &[
            ("/hi.md", "other={{/other.*}}"),
            ("/other.md", "brand new content"),
        ],
    );
    let (summary, _) = run(&site, &interner, dir.path(), &provider, &filters);

    let hi = interner.get_or_intern("/hi.md");
    let other = interner.get_or_intern("/other.md");
    assert!(summary.outdated_items.contains(&hi));
    assert!(summary.outdated_items.contains(&other));
    assert_eq!(summary.compiled_reps, 2);
    assert_eq!(
        cached_last_snapshot(dir.path(), &site, &interner, "/hi.md"),
        Content::textual("other=brand new content")
    );
}

#[test]
fn rules_change_recompiles_with_rules_modified_reason() {
    let dir = tempfile::tempdir().unwrap();
    let filters = registry();

    let items = [("/hi.md", "other={{/other.*}}"), ("/other.md", "other content")];

    let mut provider = StaticActionProvider::new();
    provider.set_sequence("/hi.md", "default", embed_sequence());
    provider.set_sequence("/other.md", "default", embed_sequence());

    {
        let interner = Interner::new();
        let site = build_site(&interner, &items);
        run(&site, &interner, dir.path(), &provider, &filters);
    }

    // One changed parameter on one filter is a rule change
    let mut provider = StaticActionProvider::new();
    provider.set_sequence(
        "/hi.md",
        "default",
        ActionSequence::new()
            .add_filter(
                "embed",
                [("flavor".to_string(), serde_json::json!("spicy"))].into(),
            )
            .add_snapshot("last", vec![]),
    );
    provider.set_sequence("/other.md", "default", embed_sequence());

    let interner = Interner::new();
    let site = build_site(&interner, &items);
    let (summary, _) = run(&site, &interner, dir.path(), &provider, &filters);

    let hi_rep = rep(&interner, "/hi.md");
    assert!(summary
        .outdated_reasons
        .iter()
        .any(|(r, reason)| *r == hi_rep
            && matches!(
                reason,
                strata_outdated::OutdatednessReason::RulesModified { .. }
            )));
    // /hi.md recompiled, blocking on the cached /other.md rep worked
    assert_eq!(summary.compiled_reps, 1);
}

#[test]
fn new_matching_item_outdates_the_pattern_reader() {
    let dir = tempfile::tempdir().unwrap();
    let filters = registry();

    let mut provider = StaticActionProvider::new();
    provider.set_sequence("/hi.md", "default", embed_sequence());
    provider.set_sequence("/other.md", "default", embed_sequence());

    {
        let interner = Interner::new();
        let site = build_site(
            &interner,
            &[("/hi.md", "other={{/other.*}}"), ("/other.md", "other content")],
        );
        run(&site, &interner, dir.path(), &provider, &filters);
    }

    // An added item matching /other.* invalidates the lookup
    let mut provider = StaticActionProvider::new();
    provider.set_sequence("/hi.md", "default", embed_sequence());
    provider.set_sequence("/other.md", "default", embed_sequence());
    provider.set_sequence("/other.txt", "default", embed_sequence());

    let interner = Interner::new();
    let site = build_site(
        &interner,
        &[
            ("/hi.md", "other={{/other.*}}"),
            ("/other.md", "other content"),
            ("/other.txt", "textual other"),
        ],
    );
    let (summary, _) = run(&site, &interner, dir.path(), &provider, &filters);

    let hi = interner.get_or_intern("/hi.md");
    assert!(summary.outdated_items.contains(&hi));
}

#[test]
fn dependency_cycle_is_a_fatal_error() {
    let dir = tempfile::tempdir().unwrap();
    let filters = registry();
    let interner = Interner::new();
    let site = build_site(
        &interner,
        &[("/a.md", "a={{/b.*}}"), ("/b.md", "b={{/a.*}}")],
    );

    let mut provider = StaticActionProvider::new();
    provider.set_sequence("/a.md", "default", embed_sequence());
    provider.set_sequence("/b.md", "default", embed_sequence());

    let sink = NotificationSink::new();
    let compiler = Compiler::new(&site, &interner, dir.path(), &filters, &provider, &sink);
    match compiler.run() {
        Err(CompileError::DependencyCycle { stack }) => {
            assert_eq!(
                stack,
                vec![
                    "/a.md#default".to_string(),
                    "/b.md#default".to_string(),
                    "/a.md#default".to_string(),
                ]
            );
        }
        other => panic!("expected DependencyCycle, got {other:?}"),
    }
}

#[test]
fn unknown_filter_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let filters = registry();
    let interner = Interner::new();
    let site = build_site(&interner, &[("/hi.md", "stuff")]);

    let mut provider = StaticActionProvider::new();
    provider.set_sequence(
        "/hi.md",
        "default",
        ActionSequence::new()
            .add_filter("donkey", BTreeMap::new())
            .add_snapshot("last", vec![]),
    );

    let sink = NotificationSink::new();
    let compiler = Compiler::new(&site, &interner, dir.path(), &filters, &provider, &sink);
    match compiler.run() {
        Err(CompileError::UnknownFilter { name }) => assert_eq!(name, "donkey"),
        other => panic!("expected UnknownFilter, got {other:?}"),
    }
}

#[test]
fn suspension_edges_survive_an_aborted_run() {
    let dir = tempfile::tempdir().unwrap();
    let filters = registry();
    let interner = Interner::new();
    let site = build_site(
        &interner,
        &[("/hi.md", "other={{/other.*}}"), ("/other.md", "other content")],
    );

    let mut provider = StaticActionProvider::new();
    provider.set_sequence("/hi.md", "default", embed_sequence());
    // The blocker aborts the run after /hi.md suspends
    provider.set_sequence(
        "/other.md",
        "default",
        ActionSequence::new()
            .add_filter("donkey", BTreeMap::new())
            .add_snapshot("last", vec![]),
    );

    let sink = NotificationSink::new();
    let compiler = Compiler::new(&site, &interner, dir.path(), &filters, &provider, &sink);
    assert!(matches!(
        compiler.run(),
        Err(CompileError::UnknownFilter { .. })
    ));

    // The suspension's dependency edge made it to disk before the abort
    let deps = DependencyStore::load(dir.path(), &interner).unwrap();
    let hi = ObjectId::Item(interner.get_or_intern("/hi.md"));
    let other = ObjectId::Item(interner.get_or_intern("/other.md"));
    assert!(deps
        .dependencies_causing_outdatedness_of(hi)
        .iter()
        .any(|e| e.to == other && e.props.compiled_content));

    // Both reps are still pending for the next run
    let pending = OutdatednessStore::load(dir.path(), &interner).unwrap();
    assert!(pending.include(rep(&interner, "/hi.md")));
    assert!(pending.include(rep(&interner, "/other.md")));
}

#[test]
fn binary_items_compile_and_cache() {
    let dir = tempfile::tempdir().unwrap();
    let filters = registry();

    let mut provider = StaticActionProvider::new();
    provider.set_sequence(
        "/logo.png",
        "default",
        ActionSequence::new().add_snapshot("last", vec![]),
    );

    let make_site = |interner: &Interner| {
        Site::new(
            Configuration::default(),
            ItemCollection::new(vec![Item::new(
                interner.get_or_intern("/logo.png"),
                Content::binary(vec![137u8, 80, 78, 71]),
                Attributes::new(),
            )]),
            LayoutCollection::default(),
        )
    };

    {
        let interner = Interner::new();
        let site = make_site(&interner);
        let (summary, _) = run(&site, &interner, dir.path(), &provider, &filters);
        assert_eq!(summary.compiled_reps, 1);
    }

    let interner = Interner::new();
    let site = make_site(&interner);
    let (summary, _) = run(&site, &interner, dir.path(), &provider, &filters);
    assert_eq!(summary.compiled_reps, 0);
    assert_eq!(
        cached_last_snapshot(dir.path(), &site, &interner, "/logo.png"),
        Content::binary(vec![137u8, 80, 78, 71])
    );
}

#[test]
fn layouts_wrap_content_and_record_dependencies() {
    struct Template;

    impl Filter for Template {
        fn apply(
            &self,
            input: &Content,
            params: &ActionParams,
            _ctx: &mut FilterContext<'_>,
        ) -> Result<Content, FilterRunError> {
            let template = input.as_str().ok_or_else(|| FilterRunError::Failed {
                message: "binary template".to_string(),
            })?;
            let content = params
                .get("content")
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            Ok(Content::textual(template.replace("{content}", content)))
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let mut filters = registry();
    filters.register("template", Template);

    let interner = Interner::new();
    let mut site = build_site(&interner, &[("/hi.md", "hello")]);
    site.layouts.push(strata_model::Layout::new(
        interner.get_or_intern("/default.tmpl"),
        "<main>{content}</main>",
        Attributes::new(),
    ));

    let mut provider = StaticActionProvider::new();
    provider.set_sequence(
        "/hi.md",
        "default",
        ActionSequence::new()
            .add_layout("/default.*", "template", BTreeMap::new())
            .add_snapshot("last", vec![]),
    );

    let (summary, events) = run(&site, &interner, dir.path(), &provider, &filters);
    assert_eq!(summary.compiled_reps, 1);
    assert_eq!(
        cached_last_snapshot(dir.path(), &site, &interner, "/hi.md"),
        Content::textual("<main>hello</main>")
    );

    // The layout read was dependency-tracked
    let hi = ObjectId::Item(interner.get_or_intern("/hi.md"));
    let layout = ObjectId::Layout(interner.get_or_intern("/default.tmpl"));
    assert!(events.iter().any(
        |e| matches!(e, Notification::DependencyCreated { from, to } if *from == hi && *to == layout)
    ));

    let deps = DependencyStore::load(dir.path(), &interner).unwrap();
    let targets = deps.objects_causing_outdatedness_of(hi);
    assert!(targets.contains(&layout));
    assert!(targets.contains(&ObjectId::LayoutCollection));
}

#[test]
fn multiple_reps_per_item_compile_independently() {
    let dir = tempfile::tempdir().unwrap();
    let filters = registry();
    let interner = Interner::new();
    let site = build_site(&interner, &[("/hi.md", "stuff")]);

    let mut provider = StaticActionProvider::new();
    provider.set_sequence("/hi.md", "woof", embed_sequence());
    provider.set_sequence("/hi.md", "bark", embed_sequence());

    let (summary, _) = run(&site, &interner, dir.path(), &provider, &filters);
    assert_eq!(summary.compiled_reps, 2);
    assert_eq!(summary.outdated_items.len(), 1);
}

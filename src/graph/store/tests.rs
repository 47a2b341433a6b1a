use std::collections::HashSet;

use serde_json::json;

use super::*;
use crate::graph::connector::MatchStrategy;
use crate::graph::error::GraphError;

fn fields(paths: &[&str]) -> Vec<Field> {
    paths.iter().map(|path| Field::new(*path)).collect()
}

fn merge(store: &mut GraphStore, search_id: &str, records: Vec<Record>) -> Vec<GraphEvent> {
    store
        .apply(Action::MergeResults {
            search: Search::new(search_id, "q"),
            records,
        })
        .unwrap()
}

fn client_server_store() -> GraphStore {
    let mut store = GraphStore::new(StoreConfig::default());
    store
        .apply(Action::SetFields(fields(&["client", "server"])))
        .unwrap();
    merge(
        &mut store,
        "s1",
        vec![
            Record::new("r1", "", json!({ "client": "a", "server": "b" })),
            Record::new("r2", "", json!({ "client": "b", "server": "c" })),
        ],
    );
    store
}

fn ids(view: &GraphView) -> Vec<&str> {
    view.nodes.iter().map(|node| node.id.as_str()).collect()
}

fn strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|item| (*item).to_owned()).collect()
}

#[test]
fn merging_the_same_record_twice_is_idempotent() {
    let mut store = GraphStore::new(StoreConfig::default());
    store
        .apply(Action::SetFields(fields(&["client", "server"])))
        .unwrap();
    let record = Record::new("1", "", json!({ "client": 1, "server": 2 }));

    let events = merge(&mut store, "s1", vec![record.clone()]);
    assert_eq!(events, vec![GraphEvent::TopologyChanged]);
    merge(&mut store, "s1", vec![record]);

    let view = store.view();
    assert_eq!(view.nodes.len(), 2);
    assert_eq!(view.links.len(), 1);
    assert_eq!(view.links.as_slice()[0].item_ids.len(), 1);
    assert_eq!(store.state().records().len(), 1);
    assert_eq!(store.state().version(), 3);
}

#[test]
fn rejected_actions_keep_the_previous_state() {
    let mut store = client_server_store();
    let version = store.state().version();
    let view = store.view().clone();

    assert_eq!(
        store.apply(Action::Select(strings(&["a", "missing"]))),
        Err(GraphError::UnknownNode("missing".to_owned()))
    );
    assert_eq!(
        store.apply(Action::DeleteSearch("nope".to_owned())),
        Err(GraphError::UnknownSearch("nope".to_owned()))
    );
    assert_eq!(
        store.apply(Action::RemoveVia("v9".to_owned())),
        Err(GraphError::UnknownVia("v9".to_owned()))
    );

    assert_eq!(store.state().version(), version);
    assert_eq!(store.view(), &view);
    assert!(store.state().selected().is_empty());
}

#[test]
fn selection_is_idempotent_and_reflected_in_flags() {
    let mut store = client_server_store();
    store.apply(Action::Select(strings(&["a"]))).unwrap();
    let events = store.apply(Action::Select(strings(&["a", "b"]))).unwrap();

    assert_eq!(events, vec![GraphEvent::SelectionChanged(strings(&["a", "b"]))]);
    assert!(store.view().nodes.get("a").unwrap().selected);
    assert!(!store.view().nodes.get("c").unwrap().selected);

    store.apply(Action::Deselect(strings(&["a", "b"]))).unwrap();
    assert!(store.state().selected().is_empty());
}

#[test]
fn select_field_nodes_toggles() {
    let mut store = client_server_store();
    store
        .apply(Action::SelectFieldNodes("client".to_owned()))
        .unwrap();
    assert_eq!(store.state().selected(), strings(&["a", "b"]).as_slice());

    store
        .apply(Action::SelectFieldNodes("client".to_owned()))
        .unwrap();
    assert!(store.state().selected().is_empty());
}

#[test]
fn highlight_replaces_previous_set() {
    let mut store = client_server_store();
    store.apply(Action::Highlight(strings(&["a"]))).unwrap();
    store.apply(Action::Highlight(strings(&["c"]))).unwrap();

    assert_eq!(store.state().highlighted(), strings(&["c"]).as_slice());
    assert!(store.view().nodes.get("c").unwrap().highlighted);

    store
        .apply(Action::HighlightFieldNodes("server".to_owned()))
        .unwrap();
    assert_eq!(store.state().highlighted(), strings(&["b", "c"]).as_slice());
    let link = store.view().links.get("b", "c").unwrap();
    assert!(link.highlighted);
}

#[test]
fn fuzzy_highlight_matches_names() {
    let mut store = GraphStore::new(StoreConfig::default());
    store.apply(Action::SetFields(fields(&["host"]))).unwrap();
    merge(
        &mut store,
        "s1",
        vec![
            Record::new("1", "", json!({ "host": "mail.example.com" })),
            Record::new("2", "", json!({ "host": "db.internal" })),
        ],
    );

    store
        .apply(Action::HighlightMatching("MAIL".to_owned()))
        .unwrap();
    assert_eq!(store.state().highlighted(), strings(&["mail.example.com"]).as_slice());

    store.apply(Action::HighlightMatching("  ".to_owned())).unwrap();
    assert!(store.state().highlighted().is_empty());
}

#[test]
fn deleted_nodes_stay_deleted() {
    let mut store = client_server_store();
    store.apply(Action::Select(strings(&["b"]))).unwrap();
    let events = store.apply(Action::Delete(strings(&["b"]))).unwrap();

    assert!(events.contains(&GraphEvent::TopologyChanged));
    assert!(!store.view().nodes.contains("b"));
    assert!(store.view().links.is_empty());
    assert!(store.state().selected().is_empty());
    assert!(store.state().deleted_node_ids().contains("b"));

    merge(
        &mut store,
        "s1",
        vec![Record::new("r3", "", json!({ "client": "b", "server": "d" }))],
    );
    store
        .apply(Action::SetFields(fields(&["client", "server"])))
        .unwrap();

    assert!(!store.view().nodes.contains("b"));
    assert!(!store.state().canonical().nodes.contains("b"));
    assert!(store.view().nodes.contains("d"));
}

#[test]
fn connector_nodes_are_protected_from_deletion() {
    let mut store = GraphStore::new(StoreConfig::default());
    store
        .apply(Action::SetFields(vec![
            Field::new("last_name"),
            Field::new("first_name").child_of("last_name"),
            Field::new("organisation"),
        ]))
        .unwrap();
    merge(
        &mut store,
        "s1",
        vec![Record::new(
            "1",
            "",
            json!({ "first_name": "Thomas", "last_name": "Kuipers", "organisation": "DutchSec" }),
        )],
    );

    let events = store
        .apply(Action::Delete(strings(&["Kuipers"])))
        .unwrap();
    assert!(events.is_empty());
    assert!(store.view().nodes.contains("Kuipers"));

    store
        .apply(Action::Delete(strings(&["Kuipers", "DutchSec"])))
        .unwrap();
    assert_eq!(ids(store.view()), vec!["Kuipers"]);
}

#[test]
fn deleting_a_search_keeps_shared_nodes() {
    let mut store = client_server_store();
    merge(
        &mut store,
        "s2",
        vec![Record::new("r9", "", json!({ "client": "c", "server": "d" }))],
    );

    store.apply(Action::DeleteSearch("s1".to_owned())).unwrap();

    let view = store.view();
    assert_eq!(ids(view), vec!["c", "d"]);
    let shared = view.nodes.get("c").unwrap();
    assert_eq!(shared.search_ids, vec!["s2"]);
    assert_eq!(shared.items, vec!["r9"]);
    assert_eq!(view.links.len(), 1);
    assert!(view.links.contains("c", "d"));
    assert!(store.state().search("s1").is_none());
    assert!(store.state().records().iter().all(|record| record.search_id == "s2"));

    store
        .apply(Action::SetFields(fields(&["client", "server"])))
        .unwrap();
    assert!(!store.view().nodes.contains("a"));
}

#[test]
fn normalization_round_trips() {
    let mut store = GraphStore::new(StoreConfig::default());
    store
        .apply(Action::SetFields(fields(&["host", "port"])))
        .unwrap();
    merge(
        &mut store,
        "s1",
        vec![
            Record::new("1", "", json!({ "host": "www.a.com", "port": 80 })),
            Record::new("2", "", json!({ "host": "WWW.B.COM", "port": 443 })),
            Record::new("3", "", json!({ "host": "c.org", "port": 80 })),
        ],
    );
    let before = store.view().clone();

    store
        .apply(Action::AddNormalization {
            regex: r"^www\.".to_owned(),
            replace_with: "web".to_owned(),
        })
        .unwrap();

    let view = store.view();
    assert!(view.nodes.contains("web"));
    assert!(!view.nodes.contains("www.a.com"));
    assert!(view.links.contains("web", "80"));
    assert!(view.links.contains("web", "443"));
    assert_eq!(view.nodes.get("web").unwrap().items, vec!["1", "2"]);

    assert_eq!(
        store.apply(Action::AddNormalization {
            regex: "x".to_owned(),
            replace_with: "web".to_owned(),
        }),
        Err(GraphError::DuplicateNormalization("web".to_owned()))
    );
    assert!(matches!(
        store.apply(Action::AddNormalization {
            regex: "(".to_owned(),
            replace_with: "other".to_owned(),
        }),
        Err(GraphError::InvalidRegex { .. })
    ));

    let id = store.state().normalizations()[0].id.clone();
    store.apply(Action::RemoveNormalization(id)).unwrap();
    assert_eq!(store.view(), &before);
}

#[test]
fn normalization_parent_cannot_be_deleted() {
    let mut store = client_server_store();
    store
        .apply(Action::AddNormalization {
            regex: "^[ab]$".to_owned(),
            replace_with: "ab".to_owned(),
        })
        .unwrap();

    store.apply(Action::Delete(strings(&["ab"]))).unwrap();
    assert!(store.view().nodes.contains("ab"));
    assert_eq!(
        store.apply(Action::Delete(strings(&["a"]))),
        Err(GraphError::UnknownNode("a".to_owned()))
    );
}

#[test]
fn via_rule_reroutes_and_restores() {
    let mut store = GraphStore::new(StoreConfig::default());
    store
        .apply(Action::SetFields(fields(&["client", "server", "proxy"])))
        .unwrap();
    merge(
        &mut store,
        "s1",
        vec![
            Record::new("1", "", json!({ "client": "A", "server": "B" })),
            Record::new("2", "", json!({ "proxy": "V" })),
        ],
    );
    let before = store.view().clone();

    store
        .apply(Action::AddVia {
            from: "A".to_owned(),
            via: "V".to_owned(),
            to: "B".to_owned(),
        })
        .unwrap();
    let view = store.view();
    assert!(!view.links.contains("A", "B"));
    assert!(view.links.contains("A", "V"));
    assert!(view.links.contains("V", "B"));

    let duplicate = store
        .apply(Action::AddVia {
            from: "A".to_owned(),
            via: "V".to_owned(),
            to: "B".to_owned(),
        })
        .unwrap();
    assert!(duplicate.is_empty());
    assert_eq!(store.state().vias().len(), 1);

    let id = store.state().vias()[0].id.clone();
    store.apply(Action::RemoveVia(id)).unwrap();
    assert_eq!(store.view(), &before);
    assert!(store.view().links.contains("A", "B"));
}

#[test]
fn via_rule_needs_known_distinct_nodes() {
    let mut store = client_server_store();
    assert_eq!(
        store.apply(Action::AddVia {
            from: "a".to_owned(),
            via: "zz".to_owned(),
            to: "b".to_owned(),
        }),
        Err(GraphError::UnknownNode("zz".to_owned()))
    );
    assert!(matches!(
        store.apply(Action::AddVia {
            from: "a".to_owned(),
            via: "a".to_owned(),
            to: "b".to_owned(),
        }),
        Err(GraphError::InvalidVia(_))
    ));
}

#[test]
fn display_limit_hides_overflow_nodes_and_their_links() {
    let mut store = client_server_store();
    store
        .apply(Action::SetDisplayLimit {
            search_id: "s1".to_owned(),
            limit: 2,
        })
        .unwrap();

    let view = store.view();
    let displayed = view
        .displayed_nodes()
        .map(|node| node.id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(displayed, vec!["a", "b"]);
    assert!(view.links.get("a", "b").unwrap().display);
    assert!(!view.links.get("b", "c").unwrap().display);
}

#[test]
fn notes_and_importance_decorate_nodes() {
    let mut store = client_server_store();
    store
        .apply(Action::SetNote {
            node_id: "a".to_owned(),
            note: "gateway".to_owned(),
        })
        .unwrap();
    let events = store
        .apply(Action::SetImportant {
            node_id: "a".to_owned(),
            important: true,
        })
        .unwrap();

    assert_eq!(events, vec![GraphEvent::NodeUpdated("a".to_owned())]);
    let node = store.view().nodes.get("a").unwrap();
    assert_eq!(node.description, "gateway");
    assert!(node.important);
}

#[test]
fn connector_actions_report_changes() {
    let mut store = client_server_store();
    let events = store
        .apply(Action::CreateConnector(strings(&["client"])))
        .unwrap();
    assert_eq!(events, vec![GraphEvent::ConnectorsChanged]);

    let name = store.state().connectors().iter().next().unwrap().name.clone();
    store
        .apply(Action::SetStrategy {
            connector: name.clone(),
            strategy: MatchStrategy::Or,
        })
        .unwrap();
    assert!(
        store
            .state()
            .connectors()
            .matching(store.view().nodes.get("a").unwrap())
            .is_some()
    );

    assert_eq!(
        store.apply(Action::DeleteConnector("ghost".to_owned())),
        Err(GraphError::UnknownConnector("ghost".to_owned()))
    );
    store.apply(Action::DeleteConnector(name)).unwrap();
    assert!(store.state().connectors().is_empty());
}

#[test]
fn around_search_needs_an_existing_anchor() {
    let mut store = client_server_store();
    let result = store.apply(Action::MergeResults {
        search: Search::new("s2", "q").around("zz"),
        records: Vec::new(),
    });
    assert_eq!(result, Err(GraphError::UnknownNode("zz".to_owned())));

    store
        .apply(Action::MergeResults {
            search: Search::new("s2", "q").around("a"),
            records: vec![
                Record::new("r5", "", json!({ "client": "a", "server": "x" })),
                Record::new("r6", "", json!({ "client": "q", "server": "y" })),
            ],
        })
        .unwrap();
    assert!(store.view().nodes.contains("x"));
    assert!(!store.view().nodes.contains("y"));
}

#[test]
fn labels_and_map_mode_emit_events() {
    let mut store = client_server_store();
    assert_eq!(
        store.apply(Action::ToggleLabels(true)).unwrap(),
        vec![GraphEvent::LabelsToggled(true)]
    );
    assert_eq!(
        store.apply(Action::SetMapActive(true)).unwrap(),
        vec![GraphEvent::MapModeChanged(true)]
    );
    assert!(store.state().show_labels());
    assert!(store.state().map_active());
}

#[test]
fn deleting_one_of_two_searches_sharing_a_record_keeps_it() {
    let mut store = GraphStore::new(StoreConfig::default());
    store
        .apply(Action::SetFields(fields(&["client", "server"])))
        .unwrap();
    let record = Record::new("r1", "", json!({ "client": 1, "server": 2 }));
    merge(&mut store, "s1", vec![record.clone()]);
    merge(&mut store, "s2", vec![record]);
    assert_eq!(store.state().records().len(), 2);
    assert_eq!(store.state().record_count(), 1);

    store.apply(Action::DeleteSearch("s1".to_owned())).unwrap();

    let view = store.view();
    assert_eq!(ids(view), vec!["1", "2"]);
    for id in ["1", "2"] {
        let node = view.nodes.get(id).unwrap();
        assert_eq!(node.items, vec!["r1"]);
        assert_eq!(node.search_ids, vec!["s2"]);
    }
    assert_eq!(view.links.get("1", "2").unwrap().item_ids, vec!["r1"]);

    store.apply(Action::DeleteSearch("s2".to_owned())).unwrap();
    assert!(store.view().nodes.is_empty());
    assert!(store.view().links.is_empty());
    assert_eq!(store.state().record_count(), 0);
}

fn via_store() -> GraphStore {
    let mut store = GraphStore::new(StoreConfig::default());
    store
        .apply(Action::SetFields(fields(&["client", "server", "proxy"])))
        .unwrap();
    merge(
        &mut store,
        "s1",
        vec![
            Record::new("1", "", json!({ "client": "A", "server": "B" })),
            Record::new("2", "", json!({ "proxy": "V", "server": "W" })),
        ],
    );
    store
        .apply(Action::AddVia {
            from: "A".to_owned(),
            via: "V".to_owned(),
            to: "B".to_owned(),
        })
        .unwrap();
    assert!(!store.view().links.contains("A", "B"));
    store
}

fn assert_links_have_endpoints(view: &GraphView) {
    for link in view.links.iter() {
        assert!(view.nodes.contains(&link.source), "dangling {}", link.source);
        assert!(view.nodes.contains(&link.target), "dangling {}", link.target);
    }
}

#[test]
fn deleting_the_via_node_restores_the_direct_link() {
    let mut store = via_store();

    store.apply(Action::Delete(strings(&["V"]))).unwrap();

    let view = store.view();
    assert!(view.links.contains("A", "B"));
    assert!(!view.links.contains("A", "V"));
    assert!(!view.links.contains("V", "B"));
    assert_links_have_endpoints(view);
    assert_eq!(store.state().vias().len(), 1);
}

#[test]
fn normalizing_the_via_node_away_restores_the_direct_link() {
    let mut store = via_store();

    store
        .apply(Action::AddNormalization {
            regex: "^[VW]$".to_owned(),
            replace_with: "edge".to_owned(),
        })
        .unwrap();

    let view = store.view();
    assert!(view.links.contains("A", "B"));
    assert!(view.links.iter().all(|link| link.via_id.is_none()));
    assert_links_have_endpoints(view);

    let id = store.state().normalizations()[0].id.clone();
    store.apply(Action::RemoveNormalization(id)).unwrap();
    assert!(!store.view().links.contains("A", "B"));
    assert!(store.view().links.contains("A", "V"));
}

#[test]
fn colliding_value_hashes_get_distinct_wire_hashes() {
    assert_eq!(crate::util::value_hash("Aa"), crate::util::value_hash("BB"));

    let mut store = client_server_store();
    merge(
        &mut store,
        "s2",
        vec![Record::new("r3", "", json!({ "client": "Aa", "server": "BB" }))],
    );

    let view = store.view();
    let hashes = view.nodes.iter().map(|node| node.hash).collect::<HashSet<_>>();
    assert_eq!(hashes.len(), view.nodes.len());
    let link_hashes = view.links.iter().map(|link| link.hash).collect::<HashSet<_>>();
    assert_eq!(link_hashes.len(), view.links.len());
    assert_ne!(
        view.nodes.get("Aa").unwrap().hash,
        view.nodes.get("BB").unwrap().hash
    );

    let hash = view.nodes.get("BB").unwrap().hash;
    store.apply(Action::Highlight(strings(&["a"]))).unwrap();
    assert_eq!(store.view().nodes.get("BB").unwrap().hash, hash);
}

#[test]
fn links_folded_by_normalization_count_what_they_merge() {
    let mut store = GraphStore::new(StoreConfig::default());
    store
        .apply(Action::SetFields(fields(&["host", "port"])))
        .unwrap();
    merge(
        &mut store,
        "s1",
        vec![
            Record::new("1", "", json!({ "host": "www.a.com", "port": 80 })),
            Record::new("2", "", json!({ "host": "www.b.com", "port": 80 })),
            Record::new("3", "", json!({ "host": "c.org", "port": 80 })),
        ],
    );
    assert!(store.view().links.iter().all(|link| link.total == 1));

    store
        .apply(Action::AddNormalization {
            regex: r"^www\.".to_owned(),
            replace_with: "web".to_owned(),
        })
        .unwrap();

    let view = store.view();
    let merged = view.links.get("web", "80").unwrap();
    assert_eq!(merged.total, 2);
    assert_eq!(merged.item_ids, vec!["1", "2"]);
    assert_eq!(view.links.get("c.org", "80").unwrap().total, 1);
}

#[test]
fn flag_only_actions_keep_topology_and_refresh_flags() {
    let mut store = client_server_store();
    store
        .apply(Action::SetNote {
            node_id: "a".to_owned(),
            note: "gateway".to_owned(),
        })
        .unwrap();
    let before = store.view().clone();

    store.apply(Action::Highlight(strings(&["a", "b"]))).unwrap();
    store
        .apply(Action::SetNote {
            node_id: "a".to_owned(),
            note: String::new(),
        })
        .unwrap();

    let view = store.view();
    assert_eq!(ids(view), ids(&before));
    assert_eq!(view.links.len(), before.links.len());
    assert!(view.nodes.get("a").unwrap().highlighted);
    assert!(view.links.get("a", "b").unwrap().highlighted);
    assert!(!view.links.get("b", "c").unwrap().highlighted);
    assert_eq!(view.nodes.get("a").unwrap().description, "");
}

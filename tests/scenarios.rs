use std::collections::HashSet;

use record_graph::config::EngineConfig;
use record_graph::dataset::Dataset;
use record_graph::graph::{
    Action, BuildInput, Field, GraphEvent, GraphParts, GraphStore, Record, Search, StoreConfig,
    ValueNormalizer, build,
};
use serde_json::json;

fn client_server() -> Vec<Field> {
    vec![Field::new("client"), Field::new("server")]
}

fn store() -> GraphStore {
    let mut store = GraphStore::new(StoreConfig::default());
    store.apply(Action::SetFields(client_server())).unwrap();
    store
}

fn merge(store: &mut GraphStore, search_id: &str, records: Vec<Record>) -> Vec<GraphEvent> {
    store
        .apply(Action::MergeResults {
            search: Search::new(search_id, "q"),
            records,
        })
        .unwrap()
}

fn link_between<'a>(parts: &'a GraphParts, a: &str, b: &str) -> Option<&'a record_graph::graph::Link> {
    parts.links.get(a, b)
}

#[test]
fn one_record_twice_keeps_a_single_attribution() {
    let mut store = store();
    let record = Record::new("r1", "s1", json!({ "client": 1, "server": 2 }));

    merge(&mut store, "s1", vec![record.clone()]);
    merge(&mut store, "s1", vec![record]);

    let view = store.view();
    assert_eq!(view.nodes.len(), 2);
    assert_eq!(view.links.len(), 1);
    assert_eq!(view.links.as_slice()[0].item_ids, vec!["r1"]);
}

#[test]
fn array_values_fan_out_to_the_single_value() {
    let mut store = store();
    merge(
        &mut store,
        "s1",
        vec![Record::new(
            "r1",
            "s1",
            json!({ "client": [1, 2, 3], "server": 4 }),
        )],
    );

    let view = store.view();
    assert_eq!(view.nodes.len(), 4);
    assert_eq!(view.links.len(), 3);
    for value in ["1", "2", "3"] {
        assert!(view.links.contains(value, "4"));
    }
    assert!(!view.links.contains("1", "2"));
    assert!(!view.links.contains("2", "3"));
    assert!(!view.links.contains("1", "3"));
}

#[test]
fn identical_values_collapse_into_one_node() {
    let mut store = GraphStore::new(StoreConfig::default());
    store
        .apply(Action::SetFields(vec![Field::new("name")]))
        .unwrap();
    merge(
        &mut store,
        "s1",
        vec![
            Record::new("r1", "s1", json!({ "name": "same" })),
            Record::new("r2", "s1", json!({ "name": "same" })),
        ],
    );

    let view = store.view();
    assert_eq!(view.nodes.len(), 1);
    assert_eq!(view.nodes.as_slice()[0].items, vec!["r1", "r2"]);
}

#[test]
fn removing_a_via_rule_restores_the_direct_link() {
    let mut store = GraphStore::new(StoreConfig::default());
    store
        .apply(Action::SetFields(vec![
            Field::new("from"),
            Field::new("to"),
            Field::new("hop"),
        ]))
        .unwrap();
    merge(
        &mut store,
        "s1",
        vec![
            Record::new("r1", "s1", json!({ "from": "A", "to": "B" })),
            Record::new("r2", "s1", json!({ "hop": "V", "to": "B" })),
        ],
    );
    let before = store.view().clone();
    assert!(before.links.contains("A", "B"));

    store
        .apply(Action::AddVia {
            from: "A".to_owned(),
            via: "V".to_owned(),
            to: "B".to_owned(),
        })
        .unwrap();
    let routed = store.view();
    assert!(!routed.links.contains("A", "B"));
    assert!(routed.links.contains("A", "V"));
    assert!(routed.links.contains("V", "B"));

    let via_id = store.state().vias()[0].id.clone();
    store.apply(Action::RemoveVia(via_id)).unwrap();

    assert_eq!(store.view(), &before);
}

#[test]
fn a_deleted_node_is_not_rebuilt_by_later_merges() {
    let mut store = store();
    let records = vec![Record::new("r1", "s1", json!({ "client": "x", "server": "y" }))];
    merge(&mut store, "s1", records.clone());

    store.apply(Action::Delete(vec!["x".to_owned()])).unwrap();
    merge(&mut store, "s1", records);
    merge(
        &mut store,
        "s2",
        vec![Record::new("r2", "s2", json!({ "client": "x", "server": "z" }))],
    );

    let view = store.view();
    assert!(!view.nodes.contains("x"));
    assert!(view.nodes.contains("y"));
    assert!(view.nodes.contains("z"));
    assert!(view.links.iter().all(|link| !link.touches("x")));
}

#[test]
fn builder_rerun_is_a_fixed_point() {
    let records = [
        Record::new("r1", "s1", json!({ "client": 1, "server": 2 })),
        Record::new("r2", "s1", json!({ "client": [1, 3], "server": 2 })),
    ];
    let fields = client_server();
    let normalizer = ValueNormalizer::new();
    let deleted = HashSet::new();
    let input = BuildInput {
        fields: &fields,
        search_id: "s1",
        normalizer: &normalizer,
        around_node_id: None,
        deleted: &deleted,
        abbreviate_length: 40,
    };

    let once = build(GraphParts::default(), &records, &input);
    let twice = build(once.clone(), &records, &input);

    assert_eq!(once, twice);
    let link = link_between(&once, "1", "2").unwrap();
    assert_eq!(link.item_ids, vec!["r1"]);
}

#[test]
fn dataset_and_config_drive_the_store() {
    let dataset = Dataset::parse(
        r##"{
            "fields": [
                { "path": "user", "type": "keyword" },
                { "path": "host", "type": "keyword" }
            ],
            "searches": [ { "searchId": "s1", "q": "logins", "color": "#00ff00" } ],
            "records": [
                { "id": "r1", "searchId": "s1", "fields": { "user": " Alice ", "host": "web-1" } },
                { "id": "r2", "searchId": "s1", "fields": { "user": "ALICE", "host": "web-2" } }
            ]
        }"##,
        500,
    )
    .unwrap();
    let config = EngineConfig::parse(r#"{ "normalizer": { "fold_case": true } }"#).unwrap();

    let mut store = GraphStore::new(config.store_config().unwrap());
    store
        .apply(Action::SetFields(dataset.fields.clone()))
        .unwrap();
    for search in &dataset.searches {
        store
            .apply(Action::MergeResults {
                search: search.clone(),
                records: dataset.records_for(&search.search_id),
            })
            .unwrap();
    }

    let view = store.view();
    assert_eq!(view.nodes.len(), 3);
    assert_eq!(view.nodes.get("alice").map(|node| node.count()), Some(2));
    assert!(view.links.contains("alice", "web-1"));
    assert!(view.links.contains("alice", "web-2"));
    assert_eq!(store.state().search("s1").map(|search| search.color.as_str()), Some("#00ff00"));
}

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use super::link::LinkArena;
use super::model::{Field, Record};
use super::node::{Node, NodeArena, NodeKind};
use super::normalize::ValueNormalizer;

pub const DEFAULT_ABBREVIATE_LENGTH: usize = 40;

/// Canonical node and link collections, in upsert order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GraphParts {
    pub nodes: NodeArena,
    pub links: LinkArena,
}

pub struct BuildInput<'a> {
    pub fields: &'a [Field],
    /// Attribution for records that do not carry their own search id.
    pub search_id: &'a str,
    pub normalizer: &'a ValueNormalizer,
    pub around_node_id: Option<&'a str>,
    pub deleted: &'a HashSet<String>,
    pub abbreviate_length: usize,
}

struct ResolvedField<'f> {
    field: &'f Field,
    raw_count: usize,
    values: Vec<String>,
}

/// Folds `records` into `previous`. Running it twice over the same records
/// leaves the second result equal to the first.
pub fn build(previous: GraphParts, records: &[Record], input: &BuildInput) -> GraphParts {
    let GraphParts {
        mut nodes,
        mut links,
    } = previous;
    let nodes_before = nodes.len();
    let links_before = links.len();

    let parent_paths = input
        .fields
        .iter()
        .filter_map(|field| field.child_of.as_deref())
        .collect::<HashSet<_>>();
    let top_level = input
        .fields
        .iter()
        .filter(|field| field.child_of.is_none())
        .collect::<Vec<_>>();

    for record in records {
        let search_id = if record.search_id.is_empty() {
            input.search_id
        } else {
            record.search_id.as_str()
        };
        let attribution = Attribution {
            record,
            search_id,
            input,
            parent_paths: &parent_paths,
        };

        let resolved = top_level
            .iter()
            .filter_map(|field| resolve(record, field, input))
            .collect::<Vec<_>>();

        for source in &resolved {
            for source_value in &source.values {
                if let Some(around) = input.around_node_id
                    && around != source_value.as_str()
                {
                    continue;
                }

                attribution.upsert(&mut nodes, source_value, source.field);

                for target in &resolved {
                    for target_value in &target.values {
                        attribution.upsert(&mut nodes, target_value, target.field);

                        if source.raw_count > 1 || source_value == target_value {
                            continue;
                        }

                        links.upsert(source_value, target_value).add_item(&record.id);
                    }
                }
            }
        }

        collect_child_data(&mut nodes, record, input);
    }

    link_shared_children(&nodes, &mut links, input.deleted);

    debug!(
        records = records.len(),
        nodes_created = nodes.len() - nodes_before,
        links_created = links.len() - links_before,
        "graph build finished"
    );

    GraphParts { nodes, links }
}

fn resolve<'f>(record: &Record, field: &'f Field, input: &BuildInput) -> Option<ResolvedField<'f>> {
    let raw = record.values_at(&field.path)?;
    let values = raw
        .iter()
        .map(|value| input.normalizer.normalize(value))
        .filter(|value| !value.is_empty() && !input.deleted.contains(value))
        .collect::<Vec<_>>();

    Some(ResolvedField {
        field,
        raw_count: raw.len(),
        values,
    })
}

struct Attribution<'a> {
    record: &'a Record,
    search_id: &'a str,
    input: &'a BuildInput<'a>,
    parent_paths: &'a HashSet<&'a str>,
}

impl Attribution<'_> {
    fn upsert(&self, nodes: &mut NodeArena, id: &str, field: &Field) {
        let is_parent = self.parent_paths.contains(field.path.as_str());
        let kind = if is_parent {
            NodeKind::Connector
        } else {
            NodeKind::Item
        };

        let node = nodes.upsert_with(id, || {
            Node::new(id, field.display_icon(), kind, self.input.abbreviate_length)
        });
        if is_parent {
            node.kind = NodeKind::Connector;
        }
        node.attribute(&self.record.id, &field.path, self.search_id);
    }
}

/// Stores the values of child fields on the node of their parent field.
fn collect_child_data(nodes: &mut NodeArena, record: &Record, input: &BuildInput) {
    for child in input.fields {
        let Some(parent_path) = child.child_of.as_deref() else {
            continue;
        };
        let Some(child_values) = record.values_at(&child.path) else {
            continue;
        };
        let Some(parent_values) = record.values_at(parent_path) else {
            continue;
        };

        for parent_value in parent_values {
            let parent_id = input.normalizer.normalize(&parent_value);
            let Some(parent) = nodes.get_mut(&parent_id) else {
                continue;
            };

            for value in &child_values {
                let value = input.normalizer.normalize(value);
                if !value.is_empty() {
                    parent.add_child_value(&child.path, &value);
                }
            }
        }
    }
}

/// Links distinct parent nodes that carry the same value under the same child
/// path. Such a link is attributed to the records of both endpoints.
fn link_shared_children(nodes: &NodeArena, links: &mut LinkArena, deleted: &HashSet<String>) {
    let mut holders = BTreeMap::<(&str, &str), Vec<&Node>>::new();
    for node in nodes.iter() {
        if deleted.contains(&node.id) {
            continue;
        }
        for (path, values) in &node.child_data {
            for value in values {
                holders
                    .entry((path.as_str(), value.as_str()))
                    .or_default()
                    .push(node);
            }
        }
    }

    for group in holders.values() {
        for (position, first) in group.iter().enumerate() {
            for second in &group[position + 1..] {
                let link = links.upsert(&first.id, &second.id);
                for item in first.items.iter().chain(&second.items) {
                    link.add_item(item);
                }
            }
        }
    }
}

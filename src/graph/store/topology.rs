use std::collections::HashSet;
use std::sync::Arc;

use super::{GraphEvent, GraphState};
use crate::graph::build::{BuildInput, GraphParts, build};
use crate::graph::error::{GraphError, GraphResult};
use crate::graph::model::{Field, Record, Search};
use crate::graph::node::Node;

impl GraphState {
    pub(super) fn merge_results(
        &mut self,
        search: Search,
        records: Vec<Record>,
    ) -> GraphResult<Vec<GraphEvent>> {
        if let Some(around) = search.around_node_id.as_deref()
            && !self.view.nodes.contains(around)
        {
            return Err(GraphError::UnknownNode(around.to_owned()));
        }

        let search_id = search.search_id.clone();
        if self.search(&search_id).is_none() {
            self.searches.push(search.clone());
        }

        let mut seen = HashSet::new();
        let batch = records
            .into_iter()
            .filter(|record| seen.insert(record.id.clone()))
            .map(|mut record| {
                record.search_id = search_id.clone();
                record
            })
            .collect::<Vec<_>>();

        // One cached copy per search that returned the record.
        let known = self
            .records
            .iter()
            .filter(|record| record.search_id == search_id)
            .map(|record| record.id.clone())
            .collect::<HashSet<_>>();
        let cached = Arc::make_mut(&mut self.records);
        cached.extend(
            batch
                .iter()
                .filter(|record| !known.contains(&record.id))
                .cloned(),
        );

        let graph = Arc::make_mut(&mut self.graph);
        *graph = build(
            std::mem::take(graph),
            &batch,
            &BuildInput {
                fields: &self.fields,
                search_id: &search_id,
                normalizer: &self.config.normalizer,
                around_node_id: search.around_node_id.as_deref(),
                deleted: &self.deleted,
                abbreviate_length: self.config.abbreviate_length,
            },
        );

        Ok(vec![GraphEvent::TopologyChanged])
    }

    /// Replaces the fields of interest and rebuilds every search from the
    /// cached records, in the order the searches arrived.
    pub(super) fn set_fields(&mut self, fields: Vec<Field>) -> GraphResult<Vec<GraphEvent>> {
        self.fields = fields;

        let mut graph = GraphParts::default();
        for search in &self.searches {
            let records = self
                .records
                .iter()
                .filter(|record| record.search_id == search.search_id)
                .cloned()
                .collect::<Vec<_>>();
            graph = build(
                graph,
                &records,
                &BuildInput {
                    fields: &self.fields,
                    search_id: &search.search_id,
                    normalizer: &self.config.normalizer,
                    around_node_id: search.around_node_id.as_deref(),
                    deleted: &self.deleted,
                    abbreviate_length: self.config.abbreviate_length,
                },
            );
        }
        self.graph = Arc::new(graph);

        Ok(vec![GraphEvent::TopologyChanged])
    }

    /// Removes the search with its records. Nodes and links attributed only to
    /// this search disappear; shared ones lose the search and the record ids
    /// no surviving search returned.
    pub(super) fn delete_search(&mut self, search_id: &str) -> GraphResult<Vec<GraphEvent>> {
        let position = self
            .searches
            .iter()
            .position(|search| search.search_id == search_id)
            .ok_or_else(|| GraphError::UnknownSearch(search_id.to_owned()))?;
        self.searches.remove(position);

        let mut removed = self
            .records
            .iter()
            .filter(|record| record.search_id == search_id)
            .map(|record| record.id.clone())
            .collect::<HashSet<_>>();
        let records = Arc::make_mut(&mut self.records);
        records.retain(|record| record.search_id != search_id);
        for record in records.iter() {
            removed.remove(&record.id);
        }

        let graph = Arc::make_mut(&mut self.graph);
        graph
            .nodes
            .retain(|node| node.search_ids.iter().any(|search| search != search_id));
        for node in graph.nodes.iter_mut() {
            node.search_ids.retain(|search| search != search_id);
            node.items.retain(|item| !removed.contains(item));
        }

        for link in graph.links.iter_mut() {
            link.item_ids.retain(|item| !removed.contains(item));
        }
        let nodes = &graph.nodes;
        graph.links.retain(|link| {
            !link.item_ids.is_empty() && nodes.contains(&link.source) && nodes.contains(&link.target)
        });

        Ok(vec![GraphEvent::TopologyChanged])
    }

    pub(super) fn set_display_limit(
        &mut self,
        search_id: &str,
        limit: usize,
    ) -> GraphResult<Vec<GraphEvent>> {
        let search = self
            .searches
            .iter_mut()
            .find(|search| search.search_id == search_id)
            .ok_or_else(|| GraphError::UnknownSearch(search_id.to_owned()))?;
        search.display_nodes = limit;

        Ok(vec![GraphEvent::TopologyChanged])
    }

    /// Soft-deletes the given nodes. Protected kinds are skipped without
    /// error; ids the view does not show are rejected.
    pub(super) fn delete_nodes(&mut self, ids: Vec<String>) -> GraphResult<Vec<GraphEvent>> {
        self.require_visible(&ids)?;

        let deletable = ids
            .into_iter()
            .filter(|id| self.view.nodes.get(id).is_some_and(Node::is_deletable))
            .collect::<HashSet<_>>();
        if deletable.is_empty() {
            return Ok(Vec::new());
        }

        self.deleted.extend(deletable.iter().cloned());
        self.selected.retain(|id| !deletable.contains(id));
        self.highlighted.retain(|id| !deletable.contains(id));
        self.tooltip.retain(|id| !deletable.contains(id));

        Ok(vec![
            GraphEvent::TopologyChanged,
            GraphEvent::SelectionChanged(self.selected.clone()),
        ])
    }

    pub(super) fn set_important(
        &mut self,
        node_id: String,
        important: bool,
    ) -> GraphResult<Vec<GraphEvent>> {
        self.require_visible(std::slice::from_ref(&node_id))?;
        if important {
            self.important.insert(node_id.clone());
        } else {
            self.important.remove(&node_id);
        }

        Ok(vec![GraphEvent::NodeUpdated(node_id)])
    }

    pub(super) fn set_note(&mut self, node_id: String, note: String) -> GraphResult<Vec<GraphEvent>> {
        self.require_visible(std::slice::from_ref(&node_id))?;
        if note.trim().is_empty() {
            self.notes.remove(&node_id);
        } else {
            self.notes.insert(node_id.clone(), note);
        }

        Ok(vec![GraphEvent::NodeUpdated(node_id)])
    }
}

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use super::{GraphEvent, GraphState};
use crate::graph::error::{GraphError, GraphResult};
use crate::util::push_unique;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

impl GraphState {
    pub(super) fn require_visible(&self, ids: &[String]) -> GraphResult<()> {
        match ids.iter().find(|id| !self.view.nodes.contains(id)) {
            Some(missing) => Err(GraphError::UnknownNode(missing.clone())),
            None => Ok(()),
        }
    }

    fn field_node_ids(&self, path: &str) -> Vec<String> {
        self.view
            .nodes
            .iter()
            .filter(|node| node.fields.iter().any(|field| field == path))
            .map(|node| node.id.clone())
            .collect()
    }

    pub(super) fn select(&mut self, ids: Vec<String>) -> GraphResult<Vec<GraphEvent>> {
        self.require_visible(&ids)?;
        for id in ids {
            push_unique(&mut self.selected, id);
        }
        Ok(vec![GraphEvent::SelectionChanged(self.selected.clone())])
    }

    pub(super) fn deselect(&mut self, ids: &[String]) -> GraphResult<Vec<GraphEvent>> {
        self.require_visible(ids)?;
        self.selected.retain(|id| !ids.contains(id));
        Ok(vec![GraphEvent::SelectionChanged(self.selected.clone())])
    }

    pub(super) fn clear_selection(&mut self) -> Vec<GraphEvent> {
        self.selected.clear();
        vec![GraphEvent::SelectionChanged(Vec::new())]
    }

    pub(super) fn select_field_nodes(&mut self, path: &str) -> Vec<GraphEvent> {
        let field_nodes = self.field_node_ids(path);
        let all_selected = field_nodes.iter().all(|id| self.selected.contains(id));

        if all_selected {
            self.selected.retain(|id| !field_nodes.contains(id));
        } else {
            for id in field_nodes {
                push_unique(&mut self.selected, id);
            }
        }
        vec![GraphEvent::SelectionChanged(self.selected.clone())]
    }

    pub(super) fn highlight(&mut self, ids: Vec<String>) -> GraphResult<Vec<GraphEvent>> {
        self.require_visible(&ids)?;
        self.highlighted.clear();
        for id in ids {
            push_unique(&mut self.highlighted, id);
        }
        Ok(vec![GraphEvent::HighlightChanged(self.highlighted.clone())])
    }

    pub(super) fn highlight_field_nodes(&mut self, path: &str) -> Vec<GraphEvent> {
        self.highlighted = self.field_node_ids(path);
        vec![GraphEvent::HighlightChanged(self.highlighted.clone())]
    }

    /// Highlights nodes whose name fuzzy-matches `query`; a blank query
    /// clears the highlight.
    pub(super) fn highlight_matching(&mut self, query: &str) -> Vec<GraphEvent> {
        let query = query.trim();
        self.highlighted = if query.is_empty() {
            Vec::new()
        } else {
            let matcher = SkimMatcherV2::default();
            self.view
                .nodes
                .iter()
                .filter(|node| fuzzy_match_score(&matcher, &node.name, query).is_some())
                .map(|node| node.id.clone())
                .collect()
        };
        vec![GraphEvent::HighlightChanged(self.highlighted.clone())]
    }

    pub(super) fn show_tooltip(&mut self, ids: Vec<String>) -> GraphResult<Vec<GraphEvent>> {
        self.require_visible(&ids)?;
        self.tooltip = ids;
        Ok(vec![GraphEvent::TooltipChanged(self.tooltip.clone())])
    }
}

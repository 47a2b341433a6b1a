use super::{GraphEvent, GraphState};
use crate::graph::error::{GraphError, GraphResult};
use crate::graph::normalization::Normalization;
use crate::graph::via::ViaRule;

impl GraphState {
    pub(super) fn add_normalization(
        &mut self,
        regex: &str,
        replace_with: &str,
    ) -> GraphResult<Vec<GraphEvent>> {
        if self
            .normalizations
            .iter()
            .any(|normalization| normalization.replace_with == replace_with)
        {
            return Err(GraphError::DuplicateNormalization(replace_with.to_owned()));
        }

        let id = self.next_id("n");
        self.normalizations
            .push(Normalization::new(id, regex, replace_with)?);
        Ok(vec![GraphEvent::TopologyChanged])
    }

    pub(super) fn remove_normalization(&mut self, id: &str) -> GraphResult<Vec<GraphEvent>> {
        let position = self
            .normalizations
            .iter()
            .position(|normalization| normalization.id == id)
            .ok_or_else(|| GraphError::UnknownNormalization(id.to_owned()))?;
        self.normalizations.remove(position);
        Ok(vec![GraphEvent::TopologyChanged])
    }

    /// Adding a route that already exists is accepted and changes nothing.
    pub(super) fn add_via(&mut self, from: &str, via: &str, to: &str) -> GraphResult<Vec<GraphEvent>> {
        let rule = ViaRule::new(String::new(), from, via, to)?;
        self.require_visible(&[rule.from.clone(), rule.via.clone(), rule.to.clone()])?;
        if self.vias.iter().any(|existing| existing.same_route(&rule)) {
            return Ok(Vec::new());
        }

        let rule = ViaRule {
            id: self.next_id("v"),
            ..rule
        };
        self.vias.push(rule);
        Ok(vec![GraphEvent::TopologyChanged])
    }

    pub(super) fn remove_via(&mut self, id: &str) -> GraphResult<Vec<GraphEvent>> {
        let position = self
            .vias
            .iter()
            .position(|rule| rule.id == id)
            .ok_or_else(|| GraphError::UnknownVia(id.to_owned()))?;
        self.vias.remove(position);
        Ok(vec![GraphEvent::TopologyChanged])
    }

    pub(super) fn create_connector(&mut self, field_paths: &[String]) -> Vec<GraphEvent> {
        if field_paths.is_empty() {
            return Vec::new();
        }
        self.connectors.create(field_paths);
        vec![GraphEvent::ConnectorsChanged]
    }
}

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};

use super::build::{DEFAULT_ABBREVIATE_LENGTH, GraphParts};
use super::connector::ConnectorSet;
use super::error::GraphResult;
use super::model::{Field, Record, Search};
use super::normalization::Normalization;
use super::normalize::ValueNormalizer;
use super::via::ViaRule;

mod action;
mod rules;
mod selection;
mod topology;
mod view;

pub use action::{Action, GraphEvent};
pub use view::GraphView;

#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub normalizer: ValueNormalizer,
    pub abbreviate_length: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            normalizer: ValueNormalizer::default(),
            abbreviate_length: DEFAULT_ABBREVIATE_LENGTH,
        }
    }
}

/// Canonical graph state. Cloning is cheap for the large parts (records and
/// the canonical graph are shared until a transition changes them).
#[derive(Clone, Debug)]
pub struct GraphState {
    config: Arc<StoreConfig>,
    graph: Arc<GraphParts>,
    records: Arc<Vec<Record>>,
    fields: Vec<Field>,
    searches: Vec<Search>,
    deleted: HashSet<String>,
    normalizations: Vec<Normalization>,
    vias: Vec<ViaRule>,
    connectors: ConnectorSet,
    selected: Vec<String>,
    highlighted: Vec<String>,
    tooltip: Vec<String>,
    important: HashSet<String>,
    notes: HashMap<String, String>,
    show_labels: bool,
    map_active: bool,
    next_rule_id: u64,
    version: u64,
    view: Arc<GraphView>,
}

impl GraphState {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config: Arc::new(config),
            graph: Arc::default(),
            records: Arc::default(),
            fields: Vec::new(),
            searches: Vec::new(),
            deleted: HashSet::new(),
            normalizations: Vec::new(),
            vias: Vec::new(),
            connectors: ConnectorSet::default(),
            selected: Vec::new(),
            highlighted: Vec::new(),
            tooltip: Vec::new(),
            important: HashSet::new(),
            notes: HashMap::new(),
            show_labels: false,
            map_active: false,
            next_rule_id: 0,
            version: 0,
            view: Arc::default(),
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn view(&self) -> &GraphView {
        &self.view
    }

    /// Canonical nodes and links before deletions, rules and flags.
    pub fn canonical(&self) -> &GraphParts {
        &self.graph
    }

    /// Cached records, one entry per search that returned them.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of distinct record ids across all searches.
    pub fn record_count(&self) -> usize {
        self.records
            .iter()
            .map(|record| record.id.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn searches(&self) -> &[Search] {
        &self.searches
    }

    pub fn deleted_node_ids(&self) -> &HashSet<String> {
        &self.deleted
    }

    pub fn normalizations(&self) -> &[Normalization] {
        &self.normalizations
    }

    pub fn vias(&self) -> &[ViaRule] {
        &self.vias
    }

    pub fn connectors(&self) -> &ConnectorSet {
        &self.connectors
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn highlighted(&self) -> &[String] {
        &self.highlighted
    }

    pub fn show_labels(&self) -> bool {
        self.show_labels
    }

    pub fn map_active(&self) -> bool {
        self.map_active
    }

    pub fn search(&self, search_id: &str) -> Option<&Search> {
        self.searches.iter().find(|search| search.search_id == search_id)
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.next_rule_id += 1;
        format!("{prefix}{}", self.next_rule_id)
    }

    fn transition(&mut self, action: Action) -> GraphResult<Vec<GraphEvent>> {
        match action {
            Action::MergeResults { search, records } => self.merge_results(search, records),
            Action::SetFields(fields) => self.set_fields(fields),
            Action::DeleteSearch(search_id) => self.delete_search(&search_id),
            Action::SetDisplayLimit { search_id, limit } => self.set_display_limit(&search_id, limit),
            Action::Select(ids) => self.select(ids),
            Action::Deselect(ids) => self.deselect(&ids),
            Action::ClearSelection => Ok(self.clear_selection()),
            Action::SelectFieldNodes(path) => Ok(self.select_field_nodes(&path)),
            Action::Highlight(ids) => self.highlight(ids),
            Action::HighlightFieldNodes(path) => Ok(self.highlight_field_nodes(&path)),
            Action::HighlightMatching(query) => Ok(self.highlight_matching(&query)),
            Action::Tooltip(ids) => self.show_tooltip(ids),
            Action::Delete(ids) => self.delete_nodes(ids),
            Action::SetImportant { node_id, important } => self.set_important(node_id, important),
            Action::SetNote { node_id, note } => self.set_note(node_id, note),
            Action::AddNormalization {
                regex,
                replace_with,
            } => self.add_normalization(&regex, &replace_with),
            Action::RemoveNormalization(id) => self.remove_normalization(&id),
            Action::AddVia { from, via, to } => self.add_via(&from, &via, &to),
            Action::RemoveVia(id) => self.remove_via(&id),
            Action::CreateConnector(paths) => Ok(self.create_connector(&paths)),
            Action::MoveRule { from, to, rule_id } => {
                self.connectors.move_rule(&from, &to, &rule_id)?;
                Ok(vec![GraphEvent::ConnectorsChanged])
            }
            Action::MoveRuleToNew { from, rule_id } => {
                self.connectors.move_rule_to_new(&from, &rule_id)?;
                Ok(vec![GraphEvent::ConnectorsChanged])
            }
            Action::DeleteRule { connector, rule_id } => {
                self.connectors.delete_rule(&connector, &rule_id)?;
                Ok(vec![GraphEvent::ConnectorsChanged])
            }
            Action::DeleteConnector(name) => {
                self.connectors.delete(&name)?;
                Ok(vec![GraphEvent::ConnectorsChanged])
            }
            Action::SetStrategy { connector, strategy } => {
                self.connectors.set_strategy(&connector, strategy)?;
                Ok(vec![GraphEvent::ConnectorsChanged])
            }
            Action::UpdateConnector { connector, update } => {
                self.connectors.update(&connector, update)?;
                Ok(vec![GraphEvent::ConnectorsChanged])
            }
            Action::ToggleLabels(show) => {
                self.show_labels = show;
                Ok(vec![GraphEvent::LabelsToggled(show)])
            }
            Action::SetMapActive(active) => {
                self.map_active = active;
                Ok(vec![GraphEvent::MapModeChanged(active)])
            }
        }
    }

    /// Drops selection, highlight and tooltip ids the view no longer shows.
    fn prune_flags(&mut self, events: &mut Vec<GraphEvent>) {
        let view = Arc::clone(&self.view);
        let before = self.selected.len();
        self.selected.retain(|id| view.nodes.contains(id));
        if self.selected.len() != before
            && !events.iter().any(|event| matches!(event, GraphEvent::SelectionChanged(_)))
        {
            events.push(GraphEvent::SelectionChanged(self.selected.clone()));
        }

        let before = self.highlighted.len();
        self.highlighted.retain(|id| view.nodes.contains(id));
        if self.highlighted.len() != before
            && !events.iter().any(|event| matches!(event, GraphEvent::HighlightChanged(_)))
        {
            events.push(GraphEvent::HighlightChanged(self.highlighted.clone()));
        }

        self.tooltip.retain(|id| view.nodes.contains(id));
    }
}

/// Applies one action to a copy of `state`. On error the input state is the
/// state to keep; nothing is partially applied.
pub fn reduce(state: &GraphState, action: Action) -> GraphResult<(GraphState, Vec<GraphEvent>)> {
    let mut next = state.clone();
    let mut events = next.transition(action)?;

    next.version += 1;
    next.view = if events.contains(&GraphEvent::TopologyChanged) {
        Arc::new(view::derive_view(&next))
    } else {
        Arc::new(view::refresh_flags(&next, &state.view))
    };
    next.prune_flags(&mut events);

    Ok((next, events))
}

/// Single-writer owner of the graph state.
pub struct GraphStore {
    state: GraphState,
}

impl GraphStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            state: GraphState::new(config),
        }
    }

    pub fn apply(&mut self, action: Action) -> GraphResult<Vec<GraphEvent>> {
        let name = action.name();
        match reduce(&self.state, action) {
            Ok((next, events)) => {
                debug!(
                    action = name,
                    version = next.version,
                    nodes = next.view.nodes.len(),
                    links = next.view.links.len(),
                    "applied graph action"
                );
                self.state = next;
                Ok(events)
            }
            Err(error) => {
                warn!(action = name, %error, "rejected graph action");
                Err(error)
            }
        }
    }

    pub fn state(&self) -> &GraphState {
        &self.state
    }

    pub fn view(&self) -> &GraphView {
        self.state.view()
    }
}

#[cfg(test)]
mod tests;

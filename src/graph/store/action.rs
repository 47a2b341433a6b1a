use crate::graph::connector::{ConnectorUpdate, MatchStrategy};
use crate::graph::model::{Field, Record, Search};

/// User intents and data arrivals the store folds into its state, strictly in
/// the order they are applied.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    MergeResults {
        search: Search,
        records: Vec<Record>,
    },
    SetFields(Vec<Field>),
    DeleteSearch(String),
    SetDisplayLimit {
        search_id: String,
        limit: usize,
    },

    Select(Vec<String>),
    Deselect(Vec<String>),
    ClearSelection,
    /// Selects every node seen under the field, or deselects them all when
    /// they already are selected.
    SelectFieldNodes(String),
    Highlight(Vec<String>),
    HighlightFieldNodes(String),
    HighlightMatching(String),
    Tooltip(Vec<String>),

    Delete(Vec<String>),
    SetImportant {
        node_id: String,
        important: bool,
    },
    SetNote {
        node_id: String,
        note: String,
    },

    AddNormalization {
        regex: String,
        replace_with: String,
    },
    RemoveNormalization(String),
    AddVia {
        from: String,
        via: String,
        to: String,
    },
    RemoveVia(String),

    CreateConnector(Vec<String>),
    MoveRule {
        from: String,
        to: String,
        rule_id: String,
    },
    MoveRuleToNew {
        from: String,
        rule_id: String,
    },
    DeleteRule {
        connector: String,
        rule_id: String,
    },
    DeleteConnector(String),
    SetStrategy {
        connector: String,
        strategy: MatchStrategy,
    },
    UpdateConnector {
        connector: String,
        update: ConnectorUpdate,
    },

    ToggleLabels(bool),
    SetMapActive(bool),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::MergeResults { .. } => "merge_results",
            Self::SetFields(_) => "set_fields",
            Self::DeleteSearch(_) => "delete_search",
            Self::SetDisplayLimit { .. } => "set_display_limit",
            Self::Select(_) => "select",
            Self::Deselect(_) => "deselect",
            Self::ClearSelection => "clear_selection",
            Self::SelectFieldNodes(_) => "select_field_nodes",
            Self::Highlight(_) => "highlight",
            Self::HighlightFieldNodes(_) => "highlight_field_nodes",
            Self::HighlightMatching(_) => "highlight_matching",
            Self::Tooltip(_) => "tooltip",
            Self::Delete(_) => "delete",
            Self::SetImportant { .. } => "set_important",
            Self::SetNote { .. } => "set_note",
            Self::AddNormalization { .. } => "add_normalization",
            Self::RemoveNormalization(_) => "remove_normalization",
            Self::AddVia { .. } => "add_via",
            Self::RemoveVia(_) => "remove_via",
            Self::CreateConnector(_) => "create_connector",
            Self::MoveRule { .. } => "move_rule",
            Self::MoveRuleToNew { .. } => "move_rule_to_new",
            Self::DeleteRule { .. } => "delete_rule",
            Self::DeleteConnector(_) => "delete_connector",
            Self::SetStrategy { .. } => "set_strategy",
            Self::UpdateConnector { .. } => "update_connector",
            Self::ToggleLabels(_) => "toggle_labels",
            Self::SetMapActive(_) => "set_map_active",
        }
    }
}

/// What changed in a successful transition. Collaborators use these to decide
/// what to refresh; the layout worker only needs `TopologyChanged`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphEvent {
    TopologyChanged,
    SelectionChanged(Vec<String>),
    HighlightChanged(Vec<String>),
    TooltipChanged(Vec<String>),
    NodeUpdated(String),
    ConnectorsChanged,
    LabelsToggled(bool),
    MapModeChanged(bool),
}

use serde::{Deserialize, Serialize};

use super::error::{GraphError, GraphResult};
use super::model::Field;
use super::node::Node;

const PALETTE: [&str; 8] = [
    "#52657a", "#e27b58", "#57a773", "#d4a72c", "#6b8dd6", "#b36bd6", "#d66b8d", "#4fb3bf",
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MatchStrategy {
    #[default]
    And,
    Or,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorRule {
    pub id: String,
    pub field_path: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connector {
    pub name: String,
    pub rules: Vec<ConnectorRule>,
    pub strategy: MatchStrategy,
    pub color: String,
    pub icon: String,
}

impl Connector {
    pub fn matches(&self, node: &Node) -> bool {
        if self.rules.is_empty() {
            return false;
        }

        let has = |rule: &ConnectorRule| node.fields.iter().any(|field| *field == rule.field_path);
        match self.strategy {
            MatchStrategy::And => self.rules.iter().all(has),
            MatchStrategy::Or => self.rules.iter().any(has),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectorUpdate {
    pub color: Option<String>,
    pub icon: Option<String>,
}

/// User-managed connectors. Every operation validates before it mutates, so
/// an error leaves the set untouched. Connectors left without rules are
/// removed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectorSet {
    connectors: Vec<Connector>,
    next_id: u64,
}

impl ConnectorSet {
    pub fn iter(&self) -> impl Iterator<Item = &Connector> {
        self.connectors.iter()
    }

    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Connector> {
        self.connectors.iter().find(|connector| connector.name == name)
    }

    /// First connector, in creation order, whose rules match the node.
    pub fn matching(&self, node: &Node) -> Option<&Connector> {
        self.connectors.iter().find(|connector| connector.matches(node))
    }

    pub fn create(&mut self, field_paths: &[String]) -> String {
        let rules = field_paths
            .iter()
            .map(|path| self.new_rule(path))
            .collect::<Vec<_>>();
        self.push(rules)
    }

    pub fn move_rule(&mut self, from: &str, to: &str, rule_id: &str) -> GraphResult<()> {
        let from_index = self.index_of(from)?;
        self.index_of(to)?;
        let rule_index = self.rule_index(from_index, rule_id)?;
        if from == to {
            return Ok(());
        }

        let rule = self.connectors[from_index].rules.remove(rule_index);
        if let Some(target) = self.connectors.iter_mut().find(|connector| connector.name == to) {
            target.rules.push(rule);
        }
        self.drop_empty();
        Ok(())
    }

    /// Moves a rule out of `from` into a fresh connector and returns its name.
    pub fn move_rule_to_new(&mut self, from: &str, rule_id: &str) -> GraphResult<String> {
        let from_index = self.index_of(from)?;
        let rule_index = self.rule_index(from_index, rule_id)?;

        let rule = self.connectors[from_index].rules.remove(rule_index);
        self.drop_empty();
        Ok(self.push(vec![rule]))
    }

    pub fn delete_rule(&mut self, connector: &str, rule_id: &str) -> GraphResult<()> {
        let index = self.index_of(connector)?;
        let rule_index = self.rule_index(index, rule_id)?;
        self.connectors[index].rules.remove(rule_index);
        self.drop_empty();
        Ok(())
    }

    pub fn delete(&mut self, name: &str) -> GraphResult<()> {
        let index = self.index_of(name)?;
        self.connectors.remove(index);
        Ok(())
    }

    pub fn set_strategy(&mut self, name: &str, strategy: MatchStrategy) -> GraphResult<()> {
        let index = self.index_of(name)?;
        self.connectors[index].strategy = strategy;
        Ok(())
    }

    pub fn update(&mut self, name: &str, update: ConnectorUpdate) -> GraphResult<()> {
        let index = self.index_of(name)?;
        let connector = &mut self.connectors[index];
        if let Some(color) = update.color {
            connector.color = color;
        }
        if let Some(icon) = update.icon {
            connector.icon = icon;
        }
        Ok(())
    }

    fn index_of(&self, name: &str) -> GraphResult<usize> {
        self.connectors
            .iter()
            .position(|connector| connector.name == name)
            .ok_or_else(|| GraphError::UnknownConnector(name.to_owned()))
    }

    fn rule_index(&self, connector_index: usize, rule_id: &str) -> GraphResult<usize> {
        let connector = &self.connectors[connector_index];
        connector
            .rules
            .iter()
            .position(|rule| rule.id == rule_id)
            .ok_or_else(|| GraphError::UnknownRule {
                connector: connector.name.clone(),
                rule: rule_id.to_owned(),
            })
    }

    fn new_rule(&mut self, path: &str) -> ConnectorRule {
        self.next_id += 1;
        ConnectorRule {
            id: format!("r{}", self.next_id),
            field_path: path.to_owned(),
        }
    }

    fn push(&mut self, rules: Vec<ConnectorRule>) -> String {
        let mut number = self.connectors.len() + 1;
        while self.get(&format!("Connector {number}")).is_some() {
            number += 1;
        }
        let name = format!("Connector {number}");

        let icon = rules
            .first()
            .map(|rule| Field::new(rule.field_path.as_str()).display_icon())
            .unwrap_or_else(|| "?".to_owned());
        let color = PALETTE[self.connectors.len() % PALETTE.len()].to_owned();

        self.connectors.push(Connector {
            name: name.clone(),
            rules,
            strategy: MatchStrategy::And,
            color,
            icon,
        });
        self.drop_empty();
        name
    }

    fn drop_empty(&mut self) {
        self.connectors.retain(|connector| !connector.rules.is_empty());
    }
}

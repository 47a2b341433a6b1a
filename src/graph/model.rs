use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_DISPLAY_NODES: usize = 500;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Boolean,
    Date,
    #[default]
    Text,
    Keyword,
    Number,
    GeoPoint,
    #[serde(other)]
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub path: String,
    #[serde(rename = "type", default)]
    pub kind: FieldType,
    #[serde(default)]
    pub datasource_id: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub child_of: Option<String>,
}

impl Field {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: FieldType::Text,
            datasource_id: String::new(),
            icon: None,
            child_of: None,
        }
    }

    pub fn child_of(mut self, parent: impl Into<String>) -> Self {
        self.child_of = Some(parent.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_kind(mut self, kind: FieldType) -> Self {
        self.kind = kind;
        self
    }

    /// Icon to stamp on nodes from this field: the configured one, else the
    /// upper-cased first letter of the last path segment.
    pub fn display_icon(&self) -> String {
        if let Some(icon) = self.icon.as_deref()
            && !icon.is_empty()
        {
            return icon.to_owned();
        }

        self.path
            .rsplit('.')
            .next()
            .and_then(|segment| segment.chars().next())
            .map(|first| first.to_uppercase().collect())
            .unwrap_or_else(|| "?".to_owned())
    }
}

/// One search hit: a bag of field values attributed to the search that
/// produced it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    #[serde(default)]
    pub search_id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(id: impl Into<String>, search_id: impl Into<String>, fields: Value) -> Self {
        let fields = match fields {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        Self {
            id: id.into(),
            search_id: search_id.into(),
            fields,
        }
    }

    /// Resolves a dotted path. A literal key containing dots wins over
    /// descending into nested objects; numeric segments index into arrays.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        if let Some(value) = self.fields.get(path) {
            return Some(value);
        }

        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.fields.get(first)?;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Raw string values at `path`, one per array element (scalars become a
    /// single entry). `None` when the path is absent or null. Elements that
    /// cannot carry a value come back as empty strings so the caller still
    /// sees how many raw values the record had.
    pub fn values_at(&self, path: &str) -> Option<Vec<String>> {
        match self.lookup(path)? {
            Value::Null => None,
            Value::Array(items) => Some(items.iter().map(value_to_key).collect()),
            scalar => Some(vec![value_to_key(scalar)]),
        }
    }
}

fn value_to_key(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "true".to_owned(),
        Value::Bool(false) => "false".to_owned(),
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        nested => nested.to_string(),
    }
}

/// Provenance descriptor for a batch of records. The query itself is opaque
/// to the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Search {
    pub search_id: String,
    #[serde(default)]
    pub q: String,
    #[serde(default = "default_search_color")]
    pub color: String,
    #[serde(default)]
    pub datasources: Vec<String>,
    #[serde(default = "default_display_nodes")]
    pub display_nodes: usize,
    #[serde(default)]
    pub around_node_id: Option<String>,
}

fn default_search_color() -> String {
    "#de79f2".to_owned()
}

fn default_display_nodes() -> usize {
    DEFAULT_DISPLAY_NODES
}

impl Search {
    pub fn new(search_id: impl Into<String>, q: impl Into<String>) -> Self {
        Self {
            search_id: search_id.into(),
            q: q.into(),
            color: default_search_color(),
            datasources: Vec::new(),
            display_nodes: DEFAULT_DISPLAY_NODES,
            around_node_id: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn around(mut self, node_id: impl Into<String>) -> Self {
        self.around_node_id = Some(node_id.into());
        self
    }
}

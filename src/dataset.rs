use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

use crate::graph::{Field, Record, Search};

/// Fields, searches and their records as produced by the search backend.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    pub fields: Vec<Field>,
    pub searches: Vec<Search>,
    pub records: Vec<Record>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSearch {
    search_id: String,
    #[serde(default)]
    q: String,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    datasources: Vec<String>,
    #[serde(default)]
    display_nodes: Option<usize>,
}

#[derive(Deserialize)]
struct RawDataset {
    #[serde(default)]
    fields: Vec<Field>,
    #[serde(default)]
    searches: Vec<RawSearch>,
    #[serde(default)]
    records: Vec<Record>,
}

impl Dataset {
    pub fn load(path: &Path, default_display_nodes: usize) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read dataset {}", path.display()))?;
        Self::parse(&raw, default_display_nodes)
            .with_context(|| format!("invalid dataset {}", path.display()))
    }

    pub fn parse(raw: &str, default_display_nodes: usize) -> Result<Self> {
        let parsed: RawDataset = serde_json::from_str(raw).context("dataset is not valid JSON")?;
        if parsed.fields.is_empty() {
            return Err(anyhow!("dataset defines no fields"));
        }

        let mut searches = parsed
            .searches
            .into_iter()
            .map(|raw| {
                let mut search = Search::new(raw.search_id, raw.q);
                if let Some(color) = raw.color {
                    search.color = color;
                }
                search.datasources = raw.datasources;
                search.display_nodes = raw.display_nodes.unwrap_or(default_display_nodes);
                search
            })
            .collect::<Vec<_>>();

        // Records may name searches the file never declared.
        for record in &parsed.records {
            if record.search_id.is_empty()
                || searches
                    .iter()
                    .any(|search| search.search_id == record.search_id)
            {
                continue;
            }
            let mut search = Search::new(record.search_id.clone(), String::new());
            search.display_nodes = default_display_nodes;
            searches.push(search);
        }

        Ok(Self {
            fields: parsed.fields,
            searches,
            records: parsed.records,
        })
    }

    /// Records of one search, in file order.
    pub fn records_for(&self, search_id: &str) -> Vec<Record> {
        self.records
            .iter()
            .filter(|record| record.search_id == search_id)
            .cloned()
            .collect()
    }
}

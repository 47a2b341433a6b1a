use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::util::{pair_hash, push_unique};

/// Unordered endpoint pair; at most one link exists per key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkKey {
    low: String,
    high: String,
}

impl LinkKey {
    pub fn new(a: &str, b: &str) -> Self {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        Self {
            low: low.to_owned(),
            high: high.to_owned(),
        }
    }

    pub fn touches(&self, id: &str) -> bool {
        self.low == id || self.high == id
    }

    pub fn low(&self) -> &str {
        &self.low
    }

    pub fn high(&self) -> &str {
        &self.high
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub source: String,
    pub target: String,
    pub hash: i32,
    pub item_ids: Vec<String>,
    /// Canonical links this one stands for. Above 1 only in the view, where
    /// links that normalization folds onto one endpoint pair merge.
    pub total: u32,
    pub via_id: Option<String>,
    pub display: bool,
    pub highlighted: bool,
}

impl Link {
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            source: source.to_owned(),
            target: target.to_owned(),
            hash: pair_hash(source, target),
            item_ids: Vec::new(),
            total: 1,
            via_id: None,
            display: true,
            highlighted: false,
        }
    }

    pub fn key(&self) -> LinkKey {
        LinkKey::new(&self.source, &self.target)
    }

    pub fn touches(&self, id: &str) -> bool {
        self.source == id || self.target == id
    }

    pub fn add_item(&mut self, item_id: &str) -> bool {
        push_unique(&mut self.item_ids, item_id.to_owned())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkArena {
    links: Vec<Link>,
    index_by_key: HashMap<LinkKey, usize>,
}

impl LinkArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn get(&self, a: &str, b: &str) -> Option<&Link> {
        self.index_by_key
            .get(&LinkKey::new(a, b))
            .map(|&index| &self.links[index])
    }

    pub fn get_mut(&mut self, a: &str, b: &str) -> Option<&mut Link> {
        self.index_by_key
            .get(&LinkKey::new(a, b))
            .copied()
            .map(move |index| &mut self.links[index])
    }

    pub fn contains(&self, a: &str, b: &str) -> bool {
        self.index_by_key.contains_key(&LinkKey::new(a, b))
    }

    /// Returns the link between `source` and `target` in either orientation,
    /// creating it on first sight. Callers must not pass a self-link.
    pub fn upsert(&mut self, source: &str, target: &str) -> &mut Link {
        debug_assert_ne!(source, target, "self-links are not allowed");
        let key = LinkKey::new(source, target);
        let index = match self.index_by_key.get(&key) {
            Some(&index) => index,
            None => {
                let index = self.links.len();
                self.links.push(Link::new(source, target));
                self.index_by_key.insert(key, index);
                index
            }
        };
        &mut self.links[index]
    }

    pub fn insert(&mut self, link: Link) {
        let key = link.key();
        match self.index_by_key.get(&key) {
            Some(&index) => self.links[index] = link,
            None => {
                self.index_by_key.insert(key, self.links.len());
                self.links.push(link);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Link> {
        self.links.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Link> {
        self.links.iter_mut()
    }

    pub fn as_slice(&self) -> &[Link] {
        &self.links
    }

    pub fn retain(&mut self, keep: impl FnMut(&Link) -> bool) {
        self.links.retain(keep);
        self.index_by_key.clear();
        for (index, link) in self.links.iter().enumerate() {
            self.index_by_key.insert(link.key(), index);
        }
    }

    pub fn into_vec(self) -> Vec<Link> {
        self.links
    }
}

impl FromIterator<Link> for LinkArena {
    fn from_iter<T: IntoIterator<Item = Link>>(iter: T) -> Self {
        let mut arena = Self::new();
        for link in iter {
            arena.insert(link);
        }
        arena
    }
}

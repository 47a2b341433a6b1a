use std::collections::HashMap;
use std::f32::consts::TAU;

use eframe::egui::{Color32, ColorImage};
use tracing::debug;

use super::geometry::parse_hex_color;
use crate::graph::{ConnectorSet, Node, NodeKind, Search};

pub const DEFAULT_CONNECTOR_COLOR: &str = "#52657a";
const FALLBACK_SEARCH_COLOR: Color32 = Color32::from_rgb(0xde, 0x79, 0xf2);
const SELECTION_COLOR: Color32 = Color32::from_rgb(0xfa, 0xc0, 0x4b);
const SELECTION_RING: u32 = 3;

fn normalize_log(value: usize, min: usize, max: usize) -> f32 {
    let min = min.max(1) as f64;
    let max = (max as f64).max(min);
    let value = value.max(1) as f64;

    let denominator = max.ln() - min.ln();
    if denominator.abs() < f64::EPSILON {
        return 0.5;
    }

    ((value.ln() - min.ln()) / denominator).clamp(0.0, 1.0) as f32
}

/// World radius of a node given its record count and the count range of the
/// displayed graph.
pub fn node_radius(count: usize, min: usize, max: usize) -> f32 {
    6.0 + (normalize_log(count, min, max) * 26.0)
}

/// The visually relevant attributes of a node. Nodes with equal appearances
/// share one texture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeAppearance {
    pub icon: String,
    pub radius: u32,
    pub count: usize,
    pub kind: NodeKind,
    pub colors: Vec<Color32>,
    pub selected: bool,
}

impl NodeAppearance {
    /// Item nodes are split into one segment per originating search colour.
    /// Nodes claimed by a connector take the connector's colour and icon.
    pub fn resolve(node: &Node, radius: f32, searches: &[Search], connectors: &ConnectorSet) -> Self {
        let connector = connectors.matching(node);
        let colors = match (connector, node.kind) {
            (Some(connector), _) => vec![color_or(&connector.color, DEFAULT_CONNECTOR_COLOR)],
            (None, NodeKind::Connector) => {
                vec![color_or(DEFAULT_CONNECTOR_COLOR, DEFAULT_CONNECTOR_COLOR)]
            }
            (None, NodeKind::Item) => {
                let colors = node
                    .search_ids
                    .iter()
                    .map(|search_id| {
                        searches
                            .iter()
                            .find(|search| search.search_id == *search_id)
                            .and_then(|search| parse_hex_color(&search.color))
                            .unwrap_or(FALLBACK_SEARCH_COLOR)
                    })
                    .collect::<Vec<_>>();
                if colors.is_empty() {
                    vec![FALLBACK_SEARCH_COLOR]
                } else {
                    colors
                }
            }
        };
        let icon = connector
            .map(|connector| connector.icon.as_str())
            .filter(|icon| !icon.is_empty())
            .unwrap_or(&node.icon)
            .to_owned();

        Self {
            icon,
            radius: radius.round().max(1.0) as u32,
            count: node.count(),
            kind: node.kind,
            colors,
            selected: node.selected,
        }
    }

    pub fn key(&self) -> String {
        let colors = self
            .colors
            .iter()
            .map(|color| format!("{:02x}{:02x}{:02x}", color.r(), color.g(), color.b()))
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "{}|{}|{}|{}|{}|{}",
            self.icon,
            self.radius,
            self.count,
            self.kind.label(),
            colors,
            u8::from(self.selected)
        )
    }
}

fn color_or(value: &str, fallback: &str) -> Color32 {
    parse_hex_color(value)
        .or_else(|| parse_hex_color(fallback))
        .unwrap_or(Color32::GRAY)
}

/// Rasterizes a node disc: pie segments starting at six o'clock going
/// clockwise, plus a ring when selected.
pub fn rasterize(appearance: &NodeAppearance) -> ColorImage {
    let radius = appearance.radius.max(1) as f32;
    let padding = SELECTION_RING + 1;
    let side = (appearance.radius.max(1) + padding) as usize * 2;
    let center = side as f32 * 0.5;
    let segments = appearance.colors.len().max(1);
    let per_segment = TAU / segments as f32;
    let start = TAU * 0.25;

    let mut rgba = Vec::with_capacity(side * side * 4);
    for y in 0..side {
        for x in 0..side {
            let dx = x as f32 + 0.5 - center;
            let dy = y as f32 + 0.5 - center;
            let distance = (dx * dx + dy * dy).sqrt();

            let fill = (radius - distance + 0.5).clamp(0.0, 1.0);
            let (color, coverage) = if fill > 0.0 {
                let angle = (dy.atan2(dx) - start).rem_euclid(TAU);
                let segment = ((angle / per_segment) as usize).min(segments - 1);
                let color = appearance
                    .colors
                    .get(segment)
                    .copied()
                    .unwrap_or(FALLBACK_SEARCH_COLOR);
                (color, fill)
            } else if appearance.selected {
                let outer = radius + SELECTION_RING as f32;
                (SELECTION_COLOR, (outer - distance + 0.5).clamp(0.0, 1.0))
            } else {
                (Color32::TRANSPARENT, 0.0)
            };
            rgba.extend(with_coverage(color, coverage));
        }
    }

    ColorImage::from_rgba_unmultiplied([side, side], &rgba)
}

fn with_coverage(color: Color32, coverage: f32) -> [u8; 4] {
    if coverage <= 0.0 {
        return [0; 4];
    }
    [
        color.r(),
        color.g(),
        color.b(),
        (f32::from(color.a()) * coverage) as u8,
    ]
}

/// Lazily filled, never evicted texture store keyed by
/// [`NodeAppearance::key`].
pub struct TextureCache<T> {
    entries: HashMap<String, T>,
    misses: usize,
}

impl<T> Default for TextureCache<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            misses: 0,
        }
    }
}

impl<T> TextureCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries.get(key)
    }

    pub fn get_or_insert_with(&mut self, key: String, create: impl FnOnce() -> T) -> &T {
        if !self.entries.contains_key(&key) {
            debug!(key = %key, cached = self.entries.len(), "rasterizing node texture");
            self.misses += 1;
        }
        self.entries.entry(key).or_insert_with(create)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ConnectorUpdate, Node};

    fn item(id: &str, searches: &[&str]) -> Node {
        let mut node = Node::new(id, "*".to_owned(), NodeKind::Item, 40);
        node.search_ids = searches.iter().map(|search| (*search).to_owned()).collect();
        node.items = vec!["r1".to_owned()];
        node.fields = vec!["client".to_owned()];
        node
    }

    fn searches() -> Vec<Search> {
        vec![
            Search::new("s1", "first").with_color("#ff0000"),
            Search::new("s2", "second").with_color("#0000ff"),
        ]
    }

    #[test]
    fn identical_looking_nodes_share_a_key() {
        let connectors = ConnectorSet::default();
        let a = NodeAppearance::resolve(&item("a", &["s1"]), 10.2, &searches(), &connectors);
        let b = NodeAppearance::resolve(&item("b", &["s1"]), 9.8, &searches(), &connectors);
        assert_eq!(a.key(), b.key());

        let mut selected = item("c", &["s1"]);
        selected.selected = true;
        let c = NodeAppearance::resolve(&selected, 10.0, &searches(), &connectors);
        assert_ne!(a.key(), c.key());
    }

    #[test]
    fn item_colors_follow_searches() {
        let connectors = ConnectorSet::default();
        let appearance =
            NodeAppearance::resolve(&item("a", &["s1", "s2"]), 10.0, &searches(), &connectors);
        assert_eq!(appearance.colors, vec![Color32::RED, Color32::BLUE]);
    }

    #[test]
    fn connector_color_overrides_search_colors() {
        let mut connectors = ConnectorSet::default();
        let name = connectors.create(&["client".to_owned()]);
        connectors
            .update(
                &name,
                ConnectorUpdate {
                    color: Some("#00ff00".to_owned()),
                    icon: Some("C".to_owned()),
                },
            )
            .unwrap();

        let appearance = NodeAppearance::resolve(&item("a", &["s1"]), 10.0, &searches(), &connectors);
        assert_eq!(appearance.colors, vec![Color32::GREEN]);
        assert_eq!(appearance.icon, "C");

        let composite = Node::new("x", "*".to_owned(), NodeKind::Connector, 40);
        let plain = NodeAppearance::resolve(&composite, 10.0, &searches(), &ConnectorSet::default());
        assert_eq!(plain.colors, vec![Color32::from_rgb(0x52, 0x65, 0x7a)]);
    }

    #[test]
    fn rasterized_disc_has_segments_and_ring() {
        let appearance = NodeAppearance {
            icon: String::new(),
            radius: 10,
            count: 1,
            kind: NodeKind::Item,
            colors: vec![Color32::RED, Color32::BLUE],
            selected: true,
        };
        let image = rasterize(&appearance);
        let side = image.size[0];
        assert_eq!(side, (10 + SELECTION_RING as usize + 1) * 2);

        let at = |x: usize, y: usize| image.pixels[y * side + x];
        let middle = side / 2;
        // Below the centre lies the start of the first segment, above it the second.
        assert_eq!(at(middle - 3, middle + 5), Color32::RED);
        assert_eq!(at(middle + 3, middle - 5), Color32::BLUE);
        assert_eq!(at(middle, middle - 12).r(), SELECTION_COLOR.r());
        assert_eq!(at(0, 0), Color32::TRANSPARENT);
    }

    #[test]
    fn cache_rasterizes_once_per_key() {
        let mut cache = TextureCache::new();
        let mut created = 0;
        for _ in 0..3 {
            cache.get_or_insert_with("k".to_owned(), || {
                created += 1;
                created
            });
        }
        cache.get_or_insert_with("other".to_owned(), || 10);

        assert_eq!(created, 1);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.misses(), 2);
        assert_eq!(cache.get("k"), Some(&1));
    }
}

use crate::graph::GraphEvent;

/// Something that can change between frames and forces some layers to be
/// redrawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Aspect {
    Positions,
    Transform,
    Colors,
    Selection,
    Tooltip,
    Labels,
}

impl Aspect {
    pub const ALL: [Aspect; 6] = [
        Aspect::Positions,
        Aspect::Transform,
        Aspect::Colors,
        Aspect::Selection,
        Aspect::Tooltip,
        Aspect::Labels,
    ];

    fn slot(self) -> usize {
        self as usize
    }

    /// Aspects a store event invalidates.
    pub fn touched_by(event: &GraphEvent) -> &'static [Aspect] {
        match event {
            GraphEvent::TopologyChanged | GraphEvent::MapModeChanged(_) => &Self::ALL,
            GraphEvent::SelectionChanged(_) => &[Aspect::Selection, Aspect::Colors],
            GraphEvent::HighlightChanged(_) | GraphEvent::ConnectorsChanged => &[Aspect::Colors],
            GraphEvent::TooltipChanged(_) => &[Aspect::Tooltip],
            GraphEvent::NodeUpdated(_) => &[Aspect::Colors, Aspect::Labels, Aspect::Tooltip],
            GraphEvent::LabelsToggled(_) => &[Aspect::Labels],
        }
    }
}

/// Drawing layers of the canvas, back to front.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layer {
    Links,
    Nodes,
    Labels,
    Selection,
    Tooltip,
}

impl Layer {
    pub const ALL: [Layer; 5] = [
        Layer::Links,
        Layer::Nodes,
        Layer::Labels,
        Layer::Selection,
        Layer::Tooltip,
    ];

    pub fn depends_on(self, aspect: Aspect) -> bool {
        match self {
            Layer::Links | Layer::Nodes => matches!(
                aspect,
                Aspect::Positions | Aspect::Transform | Aspect::Colors
            ),
            Layer::Labels => matches!(
                aspect,
                Aspect::Positions | Aspect::Transform | Aspect::Labels
            ),
            Layer::Selection => matches!(
                aspect,
                Aspect::Positions | Aspect::Transform | Aspect::Selection
            ),
            Layer::Tooltip => matches!(
                aspect,
                Aspect::Positions | Aspect::Transform | Aspect::Tooltip
            ),
        }
    }
}

/// One "rendered since last change" flag per aspect. Everything starts dirty
/// so the first frame draws the whole scene.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirtyFlags {
    rendered: [bool; Aspect::ALL.len()],
}

impl Default for DirtyFlags {
    fn default() -> Self {
        Self {
            rendered: [false; Aspect::ALL.len()],
        }
    }
}

impl DirtyFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, aspect: Aspect) {
        self.rendered[aspect.slot()] = false;
    }

    pub fn mark_all(&mut self) {
        self.rendered = [false; Aspect::ALL.len()];
    }

    pub fn mark_event(&mut self, event: &GraphEvent) {
        for &aspect in Aspect::touched_by(event) {
            self.mark(aspect);
        }
    }

    pub fn is_dirty(&self, aspect: Aspect) -> bool {
        !self.rendered[aspect.slot()]
    }

    pub fn any_dirty(&self) -> bool {
        self.rendered.iter().any(|rendered| !rendered)
    }

    /// Layers that must be redrawn this frame.
    pub fn dirty_layers(&self) -> Vec<Layer> {
        Layer::ALL
            .into_iter()
            .filter(|layer| {
                Aspect::ALL
                    .into_iter()
                    .any(|aspect| self.is_dirty(aspect) && layer.depends_on(aspect))
            })
            .collect()
    }

    /// Called after the dirty layers were redrawn.
    pub fn finish_frame(&mut self) {
        self.rendered = [true; Aspect::ALL.len()];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_draws_everything() {
        let flags = DirtyFlags::new();
        assert!(flags.any_dirty());
        assert_eq!(flags.dirty_layers(), Layer::ALL.to_vec());
    }

    #[test]
    fn clean_frames_draw_nothing() {
        let mut flags = DirtyFlags::new();
        flags.finish_frame();
        assert!(!flags.any_dirty());
        assert!(flags.dirty_layers().is_empty());
    }

    #[test]
    fn tooltip_change_redraws_only_the_tooltip() {
        let mut flags = DirtyFlags::new();
        flags.finish_frame();
        flags.mark_event(&GraphEvent::TooltipChanged(vec!["a".to_owned()]));

        assert_eq!(flags.dirty_layers(), vec![Layer::Tooltip]);
        flags.finish_frame();
        assert!(!flags.is_dirty(Aspect::Tooltip));
    }

    #[test]
    fn label_toggle_redraws_labels() {
        let mut flags = DirtyFlags::new();
        flags.finish_frame();
        flags.mark_event(&GraphEvent::LabelsToggled(false));
        assert_eq!(flags.dirty_layers(), vec![Layer::Labels]);
    }

    #[test]
    fn panning_redraws_every_layer() {
        let mut flags = DirtyFlags::new();
        flags.finish_frame();
        flags.mark(Aspect::Transform);
        assert_eq!(flags.dirty_layers(), Layer::ALL.to_vec());
    }

    #[test]
    fn highlight_redraws_links_and_nodes() {
        let mut flags = DirtyFlags::new();
        flags.finish_frame();
        flags.mark_event(&GraphEvent::HighlightChanged(Vec::new()));
        assert_eq!(flags.dirty_layers(), vec![Layer::Links, Layer::Nodes]);
    }
}

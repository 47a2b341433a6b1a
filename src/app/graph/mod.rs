mod interaction;
mod scene;
mod view;

pub(in crate::app) use interaction::DragState;
pub(in crate::app) use scene::Scene;
pub(in crate::app) use view::LayerCache;

pub mod dirty;
pub mod geometry;
pub mod hit;
pub mod textures;

pub use dirty::{Aspect, DirtyFlags, Layer};
pub use hit::{MAX_ZOOM, MIN_ZOOM, ViewTransform, hit_test, nodes_in_rect};
pub use textures::{NodeAppearance, TextureCache, node_radius, rasterize};

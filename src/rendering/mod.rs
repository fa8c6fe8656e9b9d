pub mod export;
pub mod labels;
pub mod painter;
pub mod primitives;
pub mod scene;
pub mod style;

// Re-export the pieces the render entry point and the CLI need
pub use export::{render_scene_png, render_structure_png};
pub use labels::LabelOptions;
pub use painter::{Canvas, Projection, RenderResult};
pub use primitives::{Scene, SceneNode};
pub use style::{Color, ColorScheme, Legend, RadiusScheme, RenderStyle};

//! Offline crystal structure rendering.
//!
//! A structure file goes through cell preparation (cell mode, supercell
//! repeat, periodic images), bond generation, view orientation from a
//! Miller plane and a depth-sorted 2D rasterization into a PNG.

pub mod config;
pub mod error;
pub mod io;
pub mod model;
pub mod physics;
pub mod render;
pub mod rendering;
pub mod utils;

pub use config::Config;
pub use error::{RenderError, Result};
pub use model::{Lattice, Site, Structure};
pub use render::{render_batch, render_structure, RenderJob, RenderOptions};

// src/rendering/export.rs
// Headless PNG export of scene documents and structures.

use super::painter::{drawable_bounds, Canvas, Projection, RenderResult};
use super::primitives::{flatten_primitives, Primitive, Scene};
use super::scene::{rotate_bonds, rotate_structure, scene_from_structure};
use super::style::{Color, Legend, RenderStyle};
use crate::error::Result;
use crate::model::Structure;
use crate::physics::bonding::Bond;
use crate::physics::orientation::direction_to_rotation;
use crate::utils::geometry::{self, Point3};

/// Rasterizes a scene document. Only spheres and cylinders are drawn.
pub fn render_scene_png(
    scene: &Scene,
    legend: Option<&Legend>,
    image_size: (u32, u32),
    background: Color,
    include_legend: bool,
) -> Result<RenderResult> {
    let canvas = Canvas::new(image_size, background)?;

    let primitives = flatten_primitives(scene);
    if !primitives.is_empty() {
        let origin = scene.origin.unwrap_or([0.0; 3]);
        let frame = frame_points(scene, &primitives);
        let projection = Projection::for_primitives(&primitives, frame, image_size, origin);
        canvas.draw_primitives(&primitives, &projection)?;
    }

    if include_legend {
        if let Some(legend) = legend {
            canvas.draw_legend(legend)?;
        }
    }

    canvas.finish()
}

/// What a lone sphere is scaled against: the scene's cell box when it
/// carries three lattice rows, otherwise the drawn extents themselves.
fn frame_points(scene: &Scene, primitives: &[&Primitive]) -> Vec<Point3> {
    match scene.lattice.as_deref() {
        Some([a, b, c]) => {
            let rows = [*a, *b, *c];
            (0..8)
                .map(|i| {
                    let f = [(i & 1) as f64, ((i >> 1) & 1) as f64, ((i >> 2) & 1) as f64];
                    geometry::combine(f, &rows)
                })
                .collect()
        }
        _ => drawable_bounds(primitives).collect(),
    }
}

/// Renders a structure looking down `view_direction` (lattice coordinates,
/// turned onto +Z without twist control).
pub fn render_structure_png(
    structure: &Structure,
    bonds: &[Bond],
    view_direction: Option<Point3>,
    style: &RenderStyle,
    image_size: (u32, u32),
    background: Color,
    include_legend: bool,
) -> Result<RenderResult> {
    let legend = Legend::from_structure(structure, style.colors);

    let (placed, placed_bonds) = match view_direction {
        Some(direction) => {
            let rotation = direction_to_rotation(direction, Some(&structure.lattice), [0.0, 0.0, 1.0])?;
            (rotate_structure(structure, &rotation)?, rotate_bonds(bonds, &rotation))
        }
        None => (structure.clone(), bonds.to_vec()),
    };

    let scene = scene_from_structure(&placed, &placed_bonds, style, true, true);
    render_scene_png(&scene, Some(&legend), image_size, background, include_legend)
}

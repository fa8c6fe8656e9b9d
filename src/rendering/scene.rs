// src/rendering/scene.rs

use super::primitives::{Bezier, Ellipsoids, PairSet, PointSet, Primitive, Scene, SceneNode};
use super::style::RenderStyle;
use crate::error::Result;
use crate::model::{Lattice, Site, Structure};
use crate::physics::bonding::Bond;
use crate::physics::orientation::apply_rotation;
use crate::utils::geometry::{self, Point3};
use crate::utils::linalg::Mat3;

// --- Direct path -----------------------------------------------------------

pub fn rotate_lattice(lattice: &Lattice, rotation: &Mat3) -> Result<Lattice> {
    Lattice::new(lattice.matrix().map(|row| apply_rotation(row, rotation)))
}

/// Rotates sites and lattice together, so fractional coordinates are kept.
pub fn rotate_structure(structure: &Structure, rotation: &Mat3) -> Result<Structure> {
    let lattice = rotate_lattice(&structure.lattice, rotation)?;
    let sites = structure
        .iter()
        .map(|site| Site {
            species: site.species.clone(),
            coords: apply_rotation(site.coords, rotation),
            frac_coords: site.frac_coords,
        })
        .collect();
    Ok(Structure::from_sites(lattice, sites))
}

pub fn rotate_bonds(bonds: &[Bond], rotation: &Mat3) -> Vec<Bond> {
    bonds
        .iter()
        .map(|bond| Bond {
            start: apply_rotation(bond.start, rotation),
            end: apply_rotation(bond.end, rotation),
            elements: bond.elements.clone(),
        })
        .collect()
}

/// The 12 edges of the cell box spanned by the lattice rows.
pub fn unit_cell_edges(lattice: &Lattice) -> Vec<(Point3, Point3)> {
    let [a, b, c] = *lattice.matrix();
    let corners = [
        [0.0; 3],
        a,
        b,
        c,
        geometry::add(a, b),
        geometry::add(a, c),
        geometry::add(b, c),
        geometry::add(geometry::add(a, b), c),
    ];
    let edges = [
        (0, 1),
        (0, 2),
        (0, 3),
        (1, 4),
        (1, 5),
        (2, 4),
        (2, 6),
        (3, 5),
        (3, 6),
        (4, 7),
        (5, 7),
        (6, 7),
    ];
    edges.iter().map(|&(i, j)| (corners[i], corners[j])).collect()
}

/// Scene document for already-oriented atoms and bonds. Every atom and
/// bond is its own primitive, ordered back to front along Z.
pub fn scene_from_structure(
    structure: &Structure,
    bonds: &[Bond],
    style: &RenderStyle,
    show_atoms: bool,
    show_bonds: bool,
) -> Scene {
    let mut items: Vec<(f64, Primitive)> = Vec::new();

    if show_bonds {
        for bond in bonds {
            if bond.length() == 0.0 {
                continue;
            }
            let color = style.bond_rgb((&bond.elements.0, &bond.elements.1));
            let depth = (bond.start[2] + bond.end[2]) / 2.0;
            items.push((
                depth,
                Primitive::Cylinders(PairSet {
                    position_pairs: vec![[bond.start, bond.end]],
                    color: Some(color.to_hex()),
                    radius: Some(style.bond_radius),
                    ..PairSet::default()
                }),
            ));
        }
    }

    if show_atoms {
        for site in structure {
            items.push((
                site.coords[2],
                Primitive::Spheres(PointSet {
                    positions: vec![site.coords],
                    color: Some(style.atom_color(&site.species).to_hex()),
                    radius: Some(style.atom_radius(&site.species)),
                    ..PointSet::default()
                }),
            ));
        }
    }

    // Stable: at equal depth bonds stay under atoms
    items.sort_by(|a, b| a.0.total_cmp(&b.0));

    Scene {
        name: Some(structure.formula()),
        origin: None,
        lattice: Some(structure.lattice.matrix().to_vec()),
        contents: items.into_iter().map(|(_, p)| SceneNode::Primitive(p)).collect(),
        ..Scene::default()
    }
}

// --- Generic scene-graph path ----------------------------------------------

/// Copy of `scene` with every coordinate-bearing field rotated.
pub fn rotate_scene(scene: &Scene, rotation: &Mat3) -> Scene {
    let mut out = scene.clone();
    rotate_group(&mut out, rotation);
    out
}

fn rotate_points(points: &mut [Point3], rotation: &Mat3) {
    for p in points.iter_mut() {
        *p = apply_rotation(*p, rotation);
    }
}

fn rotate_group(group: &mut Scene, rotation: &Mat3) {
    rotate_origin(&mut group.origin, rotation);
    if let Some(lattice) = group.lattice.as_mut() {
        rotate_points(lattice, rotation);
    }
    rotate_nodes(&mut group.contents, rotation);
}

fn rotate_nodes(nodes: &mut [SceneNode], rotation: &Mat3) {
    for node in nodes.iter_mut() {
        match node {
            SceneNode::Primitive(p) => rotate_primitive(p, rotation),
            SceneNode::Group(group) => rotate_group(group, rotation),
            SceneNode::Other(_) => {}
        }
    }
}

fn rotate_origin(origin: &mut Option<Point3>, rotation: &Mat3) {
    if let Some(origin) = origin.as_mut() {
        *origin = apply_rotation(*origin, rotation);
    }
}

fn rotate_primitive(primitive: &mut Primitive, rotation: &Mat3) {
    match primitive {
        Primitive::Spheres(PointSet { positions, origin, contents, .. })
        | Primitive::Lines(PointSet { positions, origin, contents, .. })
        | Primitive::Cubes(PointSet { positions, origin, contents, .. })
        | Primitive::Surface(PointSet { positions, origin, contents, .. })
        | Primitive::Convex(PointSet { positions, origin, contents, .. }) => {
            rotate_points(positions, rotation);
            rotate_origin(origin, rotation);
            rotate_nodes(contents, rotation);
        }
        Primitive::Cylinders(PairSet { position_pairs, origin, contents, .. })
        | Primitive::Arrows(PairSet { position_pairs, origin, contents, .. }) => {
            for pair in position_pairs.iter_mut() {
                rotate_points(pair, rotation);
            }
            rotate_origin(origin, rotation);
            rotate_nodes(contents, rotation);
        }
        Primitive::Ellipsoids(Ellipsoids { positions, rotate_to, origin, contents, .. }) => {
            rotate_points(positions, rotation);
            if let Some(targets) = rotate_to.as_mut() {
                rotate_points(targets, rotation);
            }
            rotate_origin(origin, rotation);
            rotate_nodes(contents, rotation);
        }
        Primitive::Bezier(Bezier { control_points, origin, contents, .. }) => {
            for curve in control_points.iter_mut() {
                rotate_points(curve, rotation);
            }
            rotate_origin(origin, rotation);
            rotate_nodes(contents, rotation);
        }
    }
}

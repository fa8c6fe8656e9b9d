// src/render.rs
//
// File-to-file pipeline: load → prepare → orient → bond → rotate → rasterize.

use crate::error::Result;
use crate::io::load_structure;
use crate::model::Structure;
use crate::physics::bonding::{generate_bonds, BondingOptions};
use crate::physics::cell::{prepare_structure, CellSettings};
use crate::physics::orientation::{rotation_from_orientation, Orientation};
use crate::rendering::labels::LabelOptions;
use crate::rendering::painter::{Canvas, Projection, RenderResult};
use crate::rendering::primitives::flatten_primitives;
use crate::rendering::scene::{rotate_bonds, rotate_structure, scene_from_structure, unit_cell_edges};
use crate::rendering::style::{Color, Legend, RenderStyle};
use crate::utils::{geometry, report};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    pub show_atoms: bool,
    pub show_bonds: bool,
    pub show_unit_cell: bool,
    pub include_legend: bool,
    pub background: Color,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 1600,
            height: 1200,
            show_atoms: true,
            show_bonds: true,
            show_unit_cell: false,
            include_legend: false,
            background: Color::WHITE,
        }
    }
}

/// Loads, prepares and renders one structure file to a PNG file.
///
/// The image is encoded in memory first, so a failure never leaves a
/// partial output file behind.
#[allow(clippy::too_many_arguments)]
pub fn render_structure(
    structure_path: &Path,
    output_path: &Path,
    cell_settings: &CellSettings,
    bonding_options: &BondingOptions,
    style: &RenderStyle,
    orientation: &Orientation,
    labels: &LabelOptions,
    render_options: &RenderOptions,
) -> Result<()> {
    let structure = load_structure(structure_path)?;
    log::debug!(
        "\n{}",
        report::structure_summary(&structure, &structure_path.display().to_string())
    );
    let result = render_loaded(
        &structure,
        cell_settings,
        bonding_options,
        style,
        orientation,
        labels,
        render_options,
    )?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(output_path, &result.image_bytes)?;
    log::info!(
        "Wrote {}x{} image to {}",
        result.size.0,
        result.size.1,
        output_path.display()
    );
    Ok(())
}

/// Everything after loading; returns the encoded image.
pub fn render_loaded(
    structure: &Structure,
    cell_settings: &CellSettings,
    bonding_options: &BondingOptions,
    style: &RenderStyle,
    orientation: &Orientation,
    labels: &LabelOptions,
    render_options: &RenderOptions,
) -> Result<RenderResult> {
    let size = (render_options.width, render_options.height);
    // Fail on a bad size before any geometry work
    let canvas = Canvas::new(size, render_options.background)?;

    let prepared = prepare_structure(structure, cell_settings)?;
    let rotation = rotation_from_orientation(&prepared.lattice, orientation)?;

    let bonds = if render_options.show_bonds {
        generate_bonds(&prepared, bonding_options)
    } else {
        Vec::new()
    };
    log::debug!("{}", report::bond_summary(&bonds));

    let placed = rotate_structure(&prepared, &rotation)?;
    let placed_bonds = rotate_bonds(&bonds, &rotation);

    let scene = scene_from_structure(
        &placed,
        &placed_bonds,
        style,
        render_options.show_atoms,
        render_options.show_bonds,
    );
    let primitives = flatten_primitives(&scene);
    let edges = unit_cell_edges(&placed.lattice);

    // A lone atom, or nothing at all, is framed by the cell box
    let corners = edges.iter().flat_map(|(a, b)| [*a, *b]);
    let projection = Projection::for_primitives(&primitives, corners, size, [0.0; 3]);

    if render_options.show_unit_cell {
        canvas.draw_unit_cell(&edges, &projection)?;
    }
    canvas.draw_primitives(&primitives, &projection)?;

    if labels.show {
        let texts: Vec<_> = placed
            .iter()
            .filter(|site| labels.should_label(&site.species))
            .map(|site| (geometry::add(site.coords, labels.offset), site.species.clone()))
            .collect();
        canvas.draw_labels(&texts, labels, &projection)?;
    }

    if render_options.include_legend {
        canvas.draw_legend(&Legend::from_structure(&placed, style.colors))?;
    }

    canvas.finish()
}

/// One input/output pair of a batch render.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub structure_path: PathBuf,
    pub output_path: PathBuf,
}

/// Renders independent jobs in parallel with shared, read-only options.
/// Results are in job order.
pub fn render_batch(
    jobs: &[RenderJob],
    cell_settings: &CellSettings,
    bonding_options: &BondingOptions,
    style: &RenderStyle,
    orientation: &Orientation,
    labels: &LabelOptions,
    render_options: &RenderOptions,
) -> Vec<Result<PathBuf>> {
    jobs.par_iter()
        .map(|job| {
            render_structure(
                &job.structure_path,
                &job.output_path,
                cell_settings,
                bonding_options,
                style,
                orientation,
                labels,
                render_options,
            )
            .map(|_| job.output_path.clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use crate::io::save_structure;
    use crate::model::Lattice;
    use crate::physics::bonding::BondMethod;
    use cairo::ImageSurface;

    fn write_si(dir: &Path) -> PathBuf {
        let path = dir.join("Si.json");
        let s = Structure::new(Lattice::cubic(3.5).unwrap(), &["Si"], &[[0.0; 3]], false);
        save_structure(&path, &s).unwrap();
        path
    }

    const ZNO_CIF: &str = "data_ZnO
_cell_length_a 3.25
_cell_length_b 3.25
_cell_length_c 5.21
_cell_angle_alpha 90
_cell_angle_beta 90
_cell_angle_gamma 120
loop_
_symmetry_equiv_pos_as_xyz
'x, y, z'
'-y, x-y, z'
'-x+y, -x, z'
'-x, -y, z+1/2'
'y, -x+y, z+1/2'
'x-y, x, z+1/2'
loop_
_atom_site_label
_atom_site_type_symbol
_atom_site_fract_x
_atom_site_fract_y
_atom_site_fract_z
Zn1 Zn 0.33333 0.66667 0.0
O1 O 0.33333 0.66667 0.382
";

    fn pixel(image: &mut ImageSurface, x: usize, y: usize) -> [u8; 4] {
        let stride = image.stride() as usize;
        let data = image.data().unwrap();
        let i = y * stride + x * 4;
        [data[i], data[i + 1], data[i + 2], data[i + 3]]
    }

    fn small() -> RenderOptions {
        RenderOptions {
            width: 200,
            height: 150,
            ..RenderOptions::default()
        }
    }

    #[test]
    fn test_single_site_renders_nonempty_png() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_si(dir.path());
        let output = dir.path().join("out").join("si.png");

        render_structure(
            &input,
            &output,
            &CellSettings::default(),
            &BondingOptions::default(),
            &RenderStyle::default(),
            &Orientation::default(),
            &LabelOptions::default(),
            &small(),
        )
        .unwrap();

        let bytes = fs::read(&output).unwrap();
        let mut image = ImageSurface::create_from_png(&mut std::io::Cursor::new(bytes)).unwrap();
        assert_eq!((image.width(), image.height()), (200, 150));

        // Si disc in the middle, background in the corners
        assert_ne!(pixel(&mut image, 100, 75), [0xff; 4]);
        assert_eq!(pixel(&mut image, 3, 3), [0xff; 4]);
        assert_eq!(pixel(&mut image, 196, 146), [0xff; 4]);
    }

    #[test]
    fn test_cif_input_renders_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("ZnO.cif");
        fs::write(&input, ZNO_CIF).unwrap();
        let output = dir.path().join("zno.png");
        let orientation = Orientation {
            miller: Some([1, 0, 0]),
            in_plane: None,
        };
        let opts = RenderOptions {
            show_unit_cell: true,
            ..small()
        };

        render_structure(
            &input,
            &output,
            &CellSettings::default(),
            &BondingOptions::default(),
            &RenderStyle::default(),
            &orientation,
            &LabelOptions::default(),
            &opts,
        )
        .unwrap();

        let bytes = fs::read(&output).unwrap();
        let mut image = ImageSurface::create_from_png(&mut std::io::Cursor::new(bytes)).unwrap();
        assert_eq!((image.width(), image.height()), (200, 150));
        // stride is exactly 4 × width at this size
        let data = image.data().unwrap();
        let drawn = data.chunks_exact(4).filter(|px| px.iter().any(|&b| b != 0xff)).count();
        assert!(drawn > 500, "only {} pixels drawn", drawn);
        assert!(drawn < 200 * 150);
    }

    #[test]
    fn test_all_options_enabled() {
        let s = Structure::new(
            Lattice::cubic(2.5).unwrap(),
            &["Na", "Cl"],
            &[[0.0; 3], [0.5, 0.5, 0.5]],
            false,
        );
        let cell = CellSettings {
            repeat: [2, 2, 2],
            show_boundary_images: true,
            ..CellSettings::default()
        };
        let bonding = BondingOptions {
            method: BondMethod::Cutoff,
            ..BondingOptions::default()
        };
        let labels = LabelOptions {
            show: true,
            ..LabelOptions::default()
        };
        let opts = RenderOptions {
            show_unit_cell: true,
            include_legend: true,
            ..small()
        };
        let orientation = Orientation {
            miller: Some([1, 1, 1]),
            in_plane: Some([1, -1, 0]),
        };
        let result = render_loaded(&s, &cell, &bonding, &RenderStyle::default(), &orientation, &labels, &opts).unwrap();
        assert_eq!(result.size, (200, 150));
    }

    #[test]
    fn test_fatal_errors_write_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_si(dir.path());
        let output = dir.path().join("bad.png");
        let orientation = Orientation {
            miller: Some([0, 0, 0]),
            in_plane: None,
        };

        let err = render_structure(
            &input,
            &output,
            &CellSettings::default(),
            &BondingOptions::default(),
            &RenderStyle::default(),
            &orientation,
            &LabelOptions::default(),
            &small(),
        )
        .unwrap_err();
        assert!(matches!(err, RenderError::ZeroNormal { .. }));
        assert!(!output.exists());

        let missing = render_structure(
            &dir.path().join("nope.cif"),
            &output,
            &CellSettings::default(),
            &BondingOptions::default(),
            &RenderStyle::default(),
            &Orientation::default(),
            &LabelOptions::default(),
            &small(),
        )
        .unwrap_err();
        assert!(matches!(missing, RenderError::NotFound { .. }));
    }

    #[test]
    fn test_batch_keeps_job_order() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_si(dir.path());
        let jobs = vec![
            RenderJob {
                structure_path: input.clone(),
                output_path: dir.path().join("a.png"),
            },
            RenderJob {
                structure_path: dir.path().join("missing.cif"),
                output_path: dir.path().join("b.png"),
            },
        ];
        let results = render_batch(
            &jobs,
            &CellSettings::default(),
            &BondingOptions::default(),
            &RenderStyle::default(),
            &Orientation::default(),
            &LabelOptions::default(),
            &small(),
        );
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap(), &dir.path().join("a.png"));
        assert!(results[1].is_err());
    }
}

// src/physics/cell.rs
//
// Cell preparation: unit-cell transform, supercell repetition and the
// cosmetic periodic-image duplicates. Every stage returns a new Structure.

use crate::error::{RenderError, Result};
use crate::model::{MoyoReducer, Site, Structure, SymmetryReducer};
use crate::physics::neighbors::{CoordinationFinder, CovalentNN};
use crate::utils::geometry;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CellMode {
    #[default]
    Input,
    Conventional,
    Primitive,
}

impl FromStr for CellMode {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "input" => Ok(CellMode::Input),
            "conventional" => Ok(CellMode::Conventional),
            "primitive" => Ok(CellMode::Primitive),
            _ => Err(RenderError::unsupported("unit cell mode", s)),
        }
    }
}

impl TryFrom<String> for CellMode {
    type Error = RenderError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl fmt::Display for CellMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CellMode::Input => "input",
            CellMode::Conventional => "conventional",
            CellMode::Primitive => "primitive",
        };
        f.write_str(name)
    }
}

impl From<CellMode> for String {
    fn from(mode: CellMode) -> Self {
        mode.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellSettings {
    pub mode: CellMode,
    pub repeat: [u32; 3],
    pub show_boundary_images: bool,
    pub show_bonded_outside: bool,
    pub boundary_tolerance: f64,
}

impl Default for CellSettings {
    fn default() -> Self {
        Self {
            mode: CellMode::Input,
            repeat: [1, 1, 1],
            show_boundary_images: false,
            show_bonded_outside: false,
            boundary_tolerance: 1e-3,
        }
    }
}

pub fn transform_unit_cell(
    structure: &Structure,
    mode: CellMode,
    reducer: &dyn SymmetryReducer,
) -> Result<Structure> {
    match mode {
        CellMode::Input => Ok(structure.clone()),
        CellMode::Conventional => reducer.conventional(structure),
        CellMode::Primitive => reducer.primitive(structure),
    }
}

/// Tiles the structure `nx × ny × nz` times. Sites are emitted cell by
/// cell, so the first `len()` sites of the result are the input sites.
pub fn apply_repeat(structure: &Structure, repeat: [u32; 3]) -> Result<Structure> {
    if repeat.contains(&0) {
        return Err(RenderError::unsupported(
            "repeat",
            format!("{}x{}x{}", repeat[0], repeat[1], repeat[2]),
        ));
    }
    if repeat == [1, 1, 1] {
        return Ok(structure.clone());
    }

    let [nx, ny, nz] = repeat;
    let lattice = structure.lattice.scaled(repeat)?;
    let mut sites = Vec::with_capacity(structure.len() * (nx * ny * nz) as usize);

    for x in 0..nx {
        for y in 0..ny {
            for z in 0..nz {
                let translation = structure.lattice.translation([x as i32, y as i32, z as i32]);
                for site in structure {
                    let coords = geometry::add(site.coords, translation);
                    sites.push(Site::from_cartesian(site.species.clone(), coords, &lattice));
                }
            }
        }
    }

    Ok(Structure::from_sites(lattice, sites))
}

/// Appends the periodic images of bonded neighbors that sit outside the
/// cell, so every bond of an in-cell atom ends on a drawn atom.
pub fn bonded_outside_images(structure: &Structure, finder: &dyn CoordinationFinder) -> Structure {
    let mut extra = Vec::new();
    for index in 0..structure.len() {
        for neighbor in finder.neighbors(structure, index) {
            if neighbor.image == [0, 0, 0] {
                continue;
            }
            let species = structure.sites()[neighbor.site_index].species.clone();
            extra.push(Site::from_cartesian(species, neighbor.coords, &structure.lattice));
        }
    }
    log::debug!("Bonded-outside images: {} appended", extra.len());
    structure.with_appended(extra)
}

/// Duplicates sites that lie within `tolerance` of a cell face, one copy
/// per violated axis: `-1` lattice vector below `tolerance`, `+1` above
/// `1 - tolerance`.
pub fn boundary_images(structure: &Structure, tolerance: f64) -> Structure {
    let lattice = &structure.lattice;
    let mut extra = Vec::new();

    for site in structure {
        for (axis, &value) in site.frac_coords.iter().enumerate() {
            let mut shifts = Vec::with_capacity(2);
            if value < tolerance {
                shifts.push(-1);
            }
            if value > 1.0 - tolerance {
                shifts.push(1);
            }
            for shift in shifts {
                let mut image = [0; 3];
                image[axis] = shift;
                let coords = geometry::add(site.coords, lattice.translation(image));
                extra.push(Site::from_cartesian(site.species.clone(), coords, lattice));
            }
        }
    }
    log::debug!("Boundary images: {} appended", extra.len());
    structure.with_appended(extra)
}

/// Runs the preparation stages with the default collaborators.
pub fn prepare_structure(structure: &Structure, settings: &CellSettings) -> Result<Structure> {
    prepare_with(structure, settings, &MoyoReducer::default(), &CovalentNN::default())
}

pub fn prepare_with(
    structure: &Structure,
    settings: &CellSettings,
    reducer: &dyn SymmetryReducer,
    finder: &dyn CoordinationFinder,
) -> Result<Structure> {
    let mut updated = transform_unit_cell(structure, settings.mode, reducer)?;
    log::info!("Unit cell ({}): {} sites", settings.mode, updated.len());

    updated = apply_repeat(&updated, settings.repeat)?;

    // Supercells already show their neighbors
    if settings.show_bonded_outside && settings.repeat == [1, 1, 1] {
        updated = bonded_outside_images(&updated, finder);
    } else if settings.show_bonded_outside {
        log::debug!("Bonded-outside images skipped for repeat {:?}", settings.repeat);
    }

    if settings.show_boundary_images {
        updated = boundary_images(&updated, settings.boundary_tolerance);
    }

    log::info!("Prepared structure: {} sites", updated.len());
    Ok(updated)
}

/// Same-species test under the minimum-image convention, with the
/// distance tolerance scaled by the mean site spacing `(V / n)^(1/3)`.
#[derive(Debug, Clone, Copy)]
pub struct SiteMatcher {
    pub stol: f64,
}

impl Default for SiteMatcher {
    fn default() -> Self {
        Self { stol: 1e-3 }
    }
}

impl SiteMatcher {
    pub fn fits(&self, structure: &Structure, a: &Site, b: &Site) -> bool {
        if a.species != b.species {
            return false;
        }
        let n = structure.len().max(1) as f64;
        let limit = self.stol * (structure.lattice.volume() / n).cbrt();

        let delta = geometry::sub(a.frac_coords, b.frac_coords).map(|d| d - d.round());
        let cart = structure.lattice.cartesian(delta);
        geometry::norm(cart) < limit
    }
}

/// Keeps the first site of every equivalence class, in input order.
///
/// Pairwise against the accepted set, O(n²). Fine for the few hundred
/// sites cell preparation produces; large supercells would want bucketing
/// by rounded fractional coordinate.
pub fn ensure_unique_sites(structure: &Structure, matcher: &SiteMatcher) -> Structure {
    let mut unique: Vec<Site> = Vec::with_capacity(structure.len());
    for site in structure {
        if !unique.iter().any(|kept| matcher.fits(structure, kept, site)) {
            unique.push(site.clone());
        }
    }
    Structure::from_sites(structure.lattice.clone(), unique)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Lattice;
    use crate::physics::neighbors::NeighborInfo;

    fn nacl_pair() -> Structure {
        Structure::new(
            Lattice::cubic(2.5).unwrap(),
            &["Na", "Cl"],
            &[[0.0, 0.0, 0.0], [0.5, 0.5, 0.5]],
            false,
        )
    }

    /// Reports one fixed out-of-cell neighbor for site 0.
    struct OneImage;

    impl CoordinationFinder for OneImage {
        fn neighbors(&self, structure: &Structure, index: usize) -> Vec<NeighborInfo> {
            if index != 0 {
                return Vec::new();
            }
            let image = [-1, 0, 0];
            let coords = geometry::add(structure.sites()[1].coords, structure.lattice.translation(image));
            vec![
                NeighborInfo { site_index: 1, coords: structure.sites()[1].coords, image: [0, 0, 0] },
                NeighborInfo { site_index: 1, coords, image },
            ]
        }
    }

    #[test]
    fn test_mode_parsing_is_case_insensitive() {
        assert_eq!("Primitive".parse::<CellMode>().unwrap(), CellMode::Primitive);
        let err = "niggli".parse::<CellMode>().unwrap_err();
        assert!(matches!(err, RenderError::UnsupportedOption { .. }));
        let bad: std::result::Result<CellSettings, _> = serde_json::from_str(r#"{"mode":"bogus"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_default_prepare_is_identity() {
        let s = nacl_pair();
        let out = prepare_structure(&s, &CellSettings::default()).unwrap();
        assert_eq!(out, s);
    }

    #[test]
    fn test_repeat_tiles_sites_and_lattice() {
        let s = nacl_pair();
        let big = apply_repeat(&s, [2, 1, 3]).unwrap();
        assert_eq!(big.len(), 12);
        assert!((big.lattice.volume() - 6.0 * s.lattice.volume()).abs() < 1e-9);
        assert_eq!(big.sites()[0].coords, s.sites()[0].coords);
        assert!(apply_repeat(&s, [0, 1, 1]).is_err());
    }

    #[test]
    fn test_boundary_images_one_copy_per_axis() {
        let s = nacl_pair();
        let out = boundary_images(&s, 1e-3);
        // corner site touches three faces, center site none
        assert_eq!(out.len(), 5);
        assert_eq!(&out.sites()[..2], s.sites());
        assert!((out.sites()[2].coords[0] + 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_boundary_images_noop_away_from_faces() {
        let s = Structure::new(
            Lattice::cubic(4.0).unwrap(),
            &["Fe", "O"],
            &[[0.2, 0.3, 0.4], [0.6, 0.7, 0.8]],
            false,
        );
        assert_eq!(boundary_images(&s, 1e-3).len(), 2);
    }

    #[test]
    fn test_upper_face_gets_positive_shift_copy() {
        let s = Structure::new(Lattice::cubic(4.0).unwrap(), &["Fe"], &[[0.9999, 0.5, 0.5]], false);
        let out = boundary_images(&s, 1e-3);
        assert_eq!(out.len(), 2);
        // frac > 1 - tol is copied one lattice vector further along +a
        assert!((out.sites()[1].coords[0] - (0.9999 * 4.0 + 4.0)).abs() < 1e-9);
        assert!((out.sites()[1].frac_coords[0] - 1.9999).abs() < 1e-9);
    }

    #[test]
    fn test_bonded_outside_applied_at_unit_repeat() {
        let s = nacl_pair();
        let settings = CellSettings {
            show_bonded_outside: true,
            ..CellSettings::default()
        };
        let out = prepare_with(&s, &settings, &MoyoReducer::default(), &OneImage).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out.sites()[2].species, "Cl");
        assert!((out.sites()[2].coords[0] - (1.25 - 2.5)).abs() < 1e-12);
    }

    #[test]
    fn test_bonded_outside_suppressed_for_supercell() {
        let s = nacl_pair();
        let settings = CellSettings {
            repeat: [2, 1, 1],
            show_bonded_outside: true,
            ..CellSettings::default()
        };
        let out = prepare_with(&s, &settings, &MoyoReducer::default(), &OneImage).unwrap();
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn test_unique_sites_across_cell_faces() {
        let lattice = Lattice::cubic(3.0).unwrap();
        let s = Structure::new(
            lattice,
            &["Na", "Na", "Cl", "Na"],
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.5, 0.5, 0.5]],
            false,
        );
        let out = ensure_unique_sites(&s, &SiteMatcher::default());
        assert_eq!(out.len(), 3);
        let species: Vec<&str> = out.iter().map(|s| s.species.as_str()).collect();
        assert_eq!(species, vec!["Na", "Cl", "Na"]);
    }
}

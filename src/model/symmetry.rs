// src/model/symmetry.rs

use crate::error::{RenderError, Result};
use crate::model::{Lattice, Site, Structure};
use crate::utils::linalg;
use moyo::base::{AngleTolerance, Cell, Lattice as MoyoLattice};
use moyo::data::Setting;
use moyo::MoyoDataset;
use nalgebra::Vector3;

/// Reduces a structure to one of its standard cells.
pub trait SymmetryReducer {
    fn conventional(&self, structure: &Structure) -> Result<Structure>;
    fn primitive(&self, structure: &Structure) -> Result<Structure>;
}

/// Spglib-setting standardization through moyo.
#[derive(Debug, Clone, Copy)]
pub struct MoyoReducer {
    pub symprec: f64,
}

impl Default for MoyoReducer {
    fn default() -> Self {
        Self { symprec: 1e-4 }
    }
}

impl MoyoReducer {
    fn dataset(&self, structure: &Structure) -> Result<(MoyoDataset, Vec<String>)> {
        if structure.is_empty() {
            return Err(RenderError::Symmetry("structure contains no atoms".to_string()));
        }

        // Species → 1-based type ids, keeping a reverse map for the way back.
        let mut unique_elements: Vec<String> = Vec::new();
        let mut numbers = Vec::with_capacity(structure.len());
        let mut positions = Vec::with_capacity(structure.len());

        for site in structure {
            let id = match unique_elements.iter().position(|e| *e == site.species) {
                Some(id) => id,
                None => {
                    unique_elements.push(site.species.clone());
                    unique_elements.len() - 1
                }
            };
            numbers.push(id as i32 + 1);
            positions.push(Vector3::from(site.frac_coords));
        }

        let lattice = MoyoLattice::new(linalg::to_matrix(structure.lattice.matrix()));
        let cell = Cell::new(lattice, positions, numbers);

        let dataset = MoyoDataset::new(&cell, self.symprec, AngleTolerance::Default, Setting::Spglib, true)
            .map_err(|e| RenderError::Symmetry(format!("{:?}", e)))?;

        log::debug!(
            "Space group #{} detected for {} ({} sites)",
            dataset.number,
            structure.formula(),
            structure.len()
        );
        Ok((dataset, unique_elements))
    }
}

/// Converts a moyo cell (column basis, fractional positions) back to a Structure.
fn from_moyo_cell(cell: &Cell, unique_elements: &[String]) -> Result<Structure> {
    let basis = cell.lattice.basis;
    let rows = [
        [basis[(0, 0)], basis[(1, 0)], basis[(2, 0)]],
        [basis[(0, 1)], basis[(1, 1)], basis[(2, 1)]],
        [basis[(0, 2)], basis[(1, 2)], basis[(2, 2)]],
    ];
    let lattice = Lattice::new(rows)?;

    let sites = cell
        .positions
        .iter()
        .zip(cell.numbers.iter())
        .map(|(pos, &type_id)| {
            let element = usize::try_from(type_id - 1)
                .ok()
                .and_then(|i| unique_elements.get(i))
                .cloned()
                .unwrap_or_else(|| "X".to_string());
            Site::from_fractional(element, [pos.x, pos.y, pos.z], &lattice)
        })
        .collect();

    Ok(Structure::from_sites(lattice, sites))
}

impl SymmetryReducer for MoyoReducer {
    fn conventional(&self, structure: &Structure) -> Result<Structure> {
        let (dataset, elements) = self.dataset(structure)?;
        from_moyo_cell(&dataset.std_cell, &elements)
    }

    fn primitive(&self, structure: &Structure) -> Result<Structure> {
        let (dataset, elements) = self.dataset(structure)?;
        from_moyo_cell(&dataset.prim_std_cell, &elements)
    }
}

/// Crystal system name for an international space-group number.
pub fn crystal_system(number: i32) -> &'static str {
    match number {
        1..=2 => "Triclinic",
        3..=15 => "Monoclinic",
        16..=74 => "Orthorhombic",
        75..=142 => "Tetragonal",
        143..=167 => "Trigonal",
        168..=194 => "Hexagonal",
        195..=230 => "Cubic",
        _ => "Unknown",
    }
}

/// One-line space-group summary, e.g. "space group #225 (Cubic)".
pub fn describe(structure: &Structure, symprec: f64) -> Option<String> {
    let reducer = MoyoReducer { symprec };
    let (dataset, _) = reducer.dataset(structure).ok()?;
    Some(format!(
        "space group #{} ({})",
        dataset.number,
        crystal_system(dataset.number)
    ))
}

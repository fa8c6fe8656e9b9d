// src/physics/bonding.rs

use crate::error::{RenderError, Result};
use crate::model::Structure;
use crate::physics::neighbors::{neighbors_within, CoordinationFinder, CovalentNN};
use crate::utils::geometry::{self, Point3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Endpoints closer than this are treated as the same point (Å)
const COINCIDENT: f64 = 1e-8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BondMethod {
    #[default]
    CrystalNN,
    Cutoff,
}

impl FromStr for BondMethod {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "crystalnn" => Ok(BondMethod::CrystalNN),
            "cutoff" => Ok(BondMethod::Cutoff),
            _ => Err(RenderError::unsupported("bonding method", s)),
        }
    }
}

impl TryFrom<String> for BondMethod {
    type Error = RenderError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl fmt::Display for BondMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BondMethod::CrystalNN => f.write_str("CrystalNN"),
            BondMethod::Cutoff => f.write_str("cutoff"),
        }
    }
}

impl From<BondMethod> for String {
    fn from(method: BondMethod) -> Self {
        method.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BondingOptions {
    pub method: BondMethod,
    /// Search radius of the cutoff method (Å)
    pub cutoff: f64,
    pub tolerance: f64,
    pub hide_bonds_to_hidden: bool,
}

impl Default for BondingOptions {
    fn default() -> Self {
        Self {
            method: BondMethod::CrystalNN,
            cutoff: 3.0,
            tolerance: 0.1,
            hide_bonds_to_hidden: true,
        }
    }
}

/// A drawn bond. Endpoints are the image-shifted positions returned by the
/// neighbor search, not the in-cell sites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bond {
    pub start: Point3,
    pub end: Point3,
    pub elements: (String, String),
}

impl Bond {
    pub fn length(&self) -> f64 {
        geometry::distance(self.start, self.end)
    }
}

fn push_bond(bonds: &mut Vec<Bond>, start: Point3, end: Point3, a: &str, b: &str) {
    if geometry::distance(start, end) < COINCIDENT {
        log::debug!("Skipping zero-length bond {}-{}", a, b);
        return;
    }
    bonds.push(Bond {
        start,
        end,
        elements: (a.to_string(), b.to_string()),
    });
}

/// Every pair within `cutoff`, each unordered index pair visited from its
/// lower index only. A site may bond to several images of a higher-indexed
/// neighbor.
pub fn bonds_cutoff(structure: &Structure, cutoff: f64) -> Vec<Bond> {
    let sites = structure.sites();
    let mut bonds = Vec::new();

    for (index, site) in sites.iter().enumerate() {
        for hit in neighbors_within(structure, site.coords, cutoff) {
            if hit.index <= index {
                continue;
            }
            push_bond(&mut bonds, site.coords, hit.coords, &site.species, &sites[hit.index].species);
        }
    }
    bonds
}

/// Bonds from a coordination finder. Neighbors with a lower index are
/// skipped; images of the site itself are kept.
pub fn bonds_coordination(structure: &Structure, finder: &dyn CoordinationFinder) -> Vec<Bond> {
    let sites = structure.sites();
    let mut bonds = Vec::new();

    for (index, site) in sites.iter().enumerate() {
        for neighbor in finder.neighbors(structure, index) {
            if neighbor.site_index < index {
                continue;
            }
            push_bond(
                &mut bonds,
                site.coords,
                neighbor.coords,
                &site.species,
                &sites[neighbor.site_index].species,
            );
        }
    }
    bonds
}

pub fn generate_bonds(structure: &Structure, options: &BondingOptions) -> Vec<Bond> {
    let bonds = match options.method {
        BondMethod::CrystalNN => bonds_coordination(structure, &CovalentNN::default()),
        BondMethod::Cutoff => bonds_cutoff(structure, options.cutoff),
    };
    log::info!("{} bonds ({})", bonds.len(), options.method);
    bonds
}

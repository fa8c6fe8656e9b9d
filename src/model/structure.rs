// src/model/structure.rs

use crate::error::{RenderError, Result};
use crate::utils::geometry::{self, Point3};
use crate::utils::linalg::{self, Mat3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lattice vectors as rows: `[a_vec, b_vec, c_vec]`.
///
/// Immutable once built; the inverse used for Cartesian → fractional
/// conversion is computed on construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Mat3", into = "Mat3")]
pub struct Lattice {
    matrix: Mat3,
    #[serde(skip)]
    inv_t: Mat3,
}

impl TryFrom<Mat3> for Lattice {
    type Error = RenderError;

    fn try_from(matrix: Mat3) -> Result<Self> {
        Lattice::new(matrix)
    }
}

impl From<Lattice> for Mat3 {
    fn from(lattice: Lattice) -> Self {
        lattice.matrix
    }
}

impl Lattice {
    pub fn new(matrix: Mat3) -> Result<Self> {
        if !matrix.iter().flatten().all(|v| v.is_finite())
            || linalg::determinant(&matrix).abs() < 1e-8
        {
            return Err(RenderError::SingularLattice);
        }
        let inv_t = linalg::to_matrix(&matrix)
            .transpose()
            .try_inverse()
            .ok_or(RenderError::SingularLattice)?;
        Ok(Self {
            matrix,
            inv_t: linalg::from_matrix(&inv_t),
        })
    }

    pub fn cubic(a: f64) -> Result<Self> {
        Self::new([[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]])
    }

    /// Builds the standard setting (a along x, b in the xy plane) from
    /// lengths in Angstroms and angles in degrees.
    pub fn from_parameters(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Result<Self> {
        let (alpha_r, beta_r, gamma_r) = (alpha.to_radians(), beta.to_radians(), gamma.to_radians());
        let (ca, cb, cg) = (alpha_r.cos(), beta_r.cos(), gamma_r.cos());
        let sg = gamma_r.sin();
        if sg.abs() < 1e-12 {
            return Err(RenderError::SingularLattice);
        }
        let v = (1.0 - ca * ca - cb * cb - cg * cg + 2.0 * ca * cb * cg).max(0.0).sqrt();

        Self::new([
            [a, 0.0, 0.0],
            [b * cg, b * sg, 0.0],
            [c * cb, c * (ca - cb * cg) / sg, c * v / sg],
        ])
    }

    pub fn matrix(&self) -> &Mat3 {
        &self.matrix
    }

    pub fn cartesian(&self, frac: Point3) -> Point3 {
        linalg::frac_to_cart(frac, &self.matrix)
    }

    pub fn fractional(&self, cart: Point3) -> Point3 {
        linalg::rotate(cart, &self.inv_t)
    }

    /// Rows b1, b2, b3 with `a_i · b_j = δ_ij` (no 2π factor).
    ///
    /// `(Lᵗ)⁻¹` holds exactly these rows, so the stored inverse is returned.
    pub fn reciprocal(&self) -> Mat3 {
        self.inv_t
    }

    pub fn abc(&self) -> [f64; 3] {
        [
            geometry::norm(self.matrix[0]),
            geometry::norm(self.matrix[1]),
            geometry::norm(self.matrix[2]),
        ]
    }

    /// (alpha, beta, gamma) in degrees
    pub fn angles(&self) -> [f64; 3] {
        let [a, b, c] = self.matrix;
        [
            geometry::angle_between(b, c),
            geometry::angle_between(a, c),
            geometry::angle_between(a, b),
        ]
    }

    pub fn volume(&self) -> f64 {
        linalg::determinant(&self.matrix).abs()
    }

    /// Lattice vector combination `u*a + v*b + w*c`.
    pub fn translation(&self, image: [i32; 3]) -> Point3 {
        self.cartesian([image[0] as f64, image[1] as f64, image[2] as f64])
    }

    pub fn scaled(&self, n: [u32; 3]) -> Result<Self> {
        let m = self.matrix;
        Self::new([
            geometry::scale(m[0], n[0] as f64),
            geometry::scale(m[1], n[1] as f64),
            geometry::scale(m[2], n[2] as f64),
        ])
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub species: String,
    /// Cartesian position in Angstroms
    pub coords: Point3,
    /// Position in units of a, b, c
    pub frac_coords: Point3,
}

impl Site {
    pub fn from_cartesian(species: impl Into<String>, coords: Point3, lattice: &Lattice) -> Self {
        Self {
            species: species.into(),
            coords,
            frac_coords: lattice.fractional(coords),
        }
    }

    pub fn from_fractional(species: impl Into<String>, frac_coords: Point3, lattice: &Lattice) -> Self {
        Self {
            species: species.into(),
            coords: lattice.cartesian(frac_coords),
            frac_coords,
        }
    }
}

/// Largest allowed gap (Å) between stored Cartesian coordinates and the
/// ones implied by the fractional coordinates of a deserialized site
const SITE_CONSISTENCY_TOL: f64 = 1e-4;

/// A lattice plus an ordered list of sites. Site order is insertion order;
/// bond indices downstream depend on it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StructureDoc")]
pub struct Structure {
    pub lattice: Lattice,
    sites: Vec<Site>,
}

impl Structure {
    /// Builds a structure from species labels and positions, either
    /// Cartesian or fractional.
    pub fn new<S: AsRef<str>>(
        lattice: Lattice,
        species: &[S],
        coords: &[Point3],
        coords_are_cartesian: bool,
    ) -> Self {
        let sites = species
            .iter()
            .zip(coords.iter())
            .map(|(sp, &p)| {
                if coords_are_cartesian {
                    Site::from_cartesian(sp.as_ref(), p, &lattice)
                } else {
                    Site::from_fractional(sp.as_ref(), p, &lattice)
                }
            })
            .collect();
        Self { lattice, sites }
    }

    pub fn from_sites(lattice: Lattice, sites: Vec<Site>) -> Self {
        Self { lattice, sites }
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Site> {
        self.sites.iter()
    }

    /// New structure with `extra` appended after the existing sites.
    pub fn with_appended(&self, extra: impl IntoIterator<Item = Site>) -> Self {
        let mut sites = self.sites.clone();
        sites.extend(extra);
        Self {
            lattice: self.lattice.clone(),
            sites,
        }
    }

    /// Distinct species in first-appearance order.
    pub fn composition(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for site in &self.sites {
            if !seen.contains(&site.species) {
                seen.push(site.species.clone());
            }
        }
        seen
    }

    /// Reduced-count formula sorted by element, e.g. "Cl4Na4".
    pub fn formula(&self) -> String {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for site in &self.sites {
            *counts.entry(site.species.as_str()).or_insert(0) += 1;
        }
        let mut parts: Vec<_> = counts.into_iter().collect();
        parts.sort_by(|a, b| a.0.cmp(b.0));
        parts
            .into_iter()
            .map(|(el, count)| if count > 1 { format!("{}{}", el, count) } else { el.to_string() })
            .collect()
    }
}

/// Serialized form of a site: either coordinate set may be omitted.
#[derive(Deserialize)]
struct SiteDoc {
    species: String,
    #[serde(default)]
    coords: Option<Point3>,
    #[serde(default)]
    frac_coords: Option<Point3>,
}

#[derive(Deserialize)]
struct StructureDoc {
    lattice: Lattice,
    sites: Vec<SiteDoc>,
}

impl TryFrom<StructureDoc> for Structure {
    type Error = RenderError;

    fn try_from(doc: StructureDoc) -> Result<Self> {
        let lattice = doc.lattice;
        let mut sites = Vec::with_capacity(doc.sites.len());
        for (i, site) in doc.sites.into_iter().enumerate() {
            let built = match (site.coords, site.frac_coords) {
                (Some(coords), Some(frac)) => {
                    let expected = lattice.cartesian(frac);
                    if geometry::distance(coords, expected) > SITE_CONSISTENCY_TOL {
                        return Err(RenderError::parse(
                            "<structure>",
                            format!(
                                "site {} ({}): coords {:?} disagree with frac_coords {:?}",
                                i, site.species, coords, frac
                            ),
                        ));
                    }
                    Site::from_fractional(site.species, frac, &lattice)
                }
                (None, Some(frac)) => Site::from_fractional(site.species, frac, &lattice),
                (Some(coords), None) => Site::from_cartesian(site.species, coords, &lattice),
                (None, None) => {
                    return Err(RenderError::parse(
                        "<structure>",
                        format!("site {} ({}) has no coordinates", i, site.species),
                    ))
                }
            };
            sites.push(built);
        }
        Ok(Self { lattice, sites })
    }
}

impl<'a> IntoIterator for &'a Structure {
    type Item = &'a Site;
    type IntoIter = std::slice::Iter<'a, Site>;

    fn into_iter(self) -> Self::IntoIter {
        self.sites.iter()
    }
}

// src/physics/neighbors.rs

use crate::model::elements::get_atom_cov;
use crate::model::Structure;
use crate::utils::geometry::{self, Point3};

/// Covalent radius used for elements missing from the table (Å)
const DEFAULT_COVALENT: f64 = 1.5;

/// One periodic image of a site inside a search sphere.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborHit {
    pub index: usize,
    /// Cartesian position of the image (not the in-cell site)
    pub coords: Point3,
    pub distance: f64,
    /// Lattice translation applied to the in-cell site
    pub image: [i32; 3],
}

/// All site images within `radius` of `center`, sorted by (distance, index).
///
/// Each site contributes every image that falls inside the sphere, so a
/// small cell reports the same index several times.
pub fn neighbors_within(structure: &Structure, center: Point3, radius: f64) -> Vec<NeighborHit> {
    let lattice = &structure.lattice;
    let fc = lattice.fractional(center);

    // Interplanar spacing along axis i is 1/|b_i|
    let reach: Vec<f64> = lattice
        .reciprocal()
        .iter()
        .map(|b| radius * geometry::norm(*b))
        .collect();

    let mut hits = Vec::new();
    for (index, site) in structure.iter().enumerate() {
        let range = |i: usize| {
            let d = fc[i] - site.frac_coords[i];
            ((d - reach[i]).floor() as i32)..=((d + reach[i]).ceil() as i32)
        };
        for u in range(0) {
            for v in range(1) {
                for w in range(2) {
                    let image = [u, v, w];
                    let coords = geometry::add(site.coords, lattice.translation(image));
                    let distance = geometry::distance(center, coords);
                    if distance <= radius {
                        hits.push(NeighborHit {
                            index,
                            coords,
                            distance,
                            image,
                        });
                    }
                }
            }
        }
    }

    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.index.cmp(&b.index)));
    hits
}

/// A bonded neighbor of one site.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborInfo {
    pub site_index: usize,
    pub coords: Point3,
    pub image: [i32; 3],
}

/// Infers the bonded neighbors of a site from the local environment.
pub trait CoordinationFinder {
    fn neighbors(&self, structure: &Structure, index: usize) -> Vec<NeighborInfo>;
}

/// Covalent-radius criterion: bonded when
/// `min_distance < d < (r_cov(i) + r_cov(j)) * tolerance`.
#[derive(Debug, Clone, Copy)]
pub struct CovalentNN {
    pub tolerance: f64,
    pub min_distance: f64,
}

impl Default for CovalentNN {
    fn default() -> Self {
        Self {
            tolerance: 1.15,
            min_distance: 0.4,
        }
    }
}

fn covalent(element: &str) -> f64 {
    get_atom_cov(element).unwrap_or_else(|| {
        log::debug!("No covalent radius for '{}', using {}", element, DEFAULT_COVALENT);
        DEFAULT_COVALENT
    })
}

impl CoordinationFinder for CovalentNN {
    fn neighbors(&self, structure: &Structure, index: usize) -> Vec<NeighborInfo> {
        let Some(site) = structure.sites().get(index) else {
            return Vec::new();
        };
        let r_i = covalent(&site.species);
        let r_max = structure
            .composition()
            .iter()
            .map(|el| covalent(el))
            .fold(0.0, f64::max);

        neighbors_within(structure, site.coords, (r_i + r_max) * self.tolerance)
            .into_iter()
            .filter(|hit| {
                let other = &structure.sites()[hit.index].species;
                let limit = (r_i + covalent(other)) * self.tolerance;
                hit.distance > self.min_distance && hit.distance < limit
            })
            .map(|hit| NeighborInfo {
                site_index: hit.index,
                coords: hit.coords,
                image: hit.image,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Lattice;

    #[test]
    fn test_simple_cubic_shell() {
        let s = Structure::new(Lattice::cubic(2.0).unwrap(), &["Po"], &[[0.0; 3]], false);
        let hits = neighbors_within(&s, [0.0; 3], 2.1);
        // the atom itself plus its 6 face neighbors
        assert_eq!(hits.len(), 7);
        assert_eq!(hits[0].image, [0, 0, 0]);
        assert!(hits[0].distance < 1e-12);
        assert!(hits[1..].iter().all(|h| (h.distance - 2.0).abs() < 1e-12));
    }

    #[test]
    fn test_oblique_cell_finds_all_images() {
        // 60° cell: the shortest a+b combination is not the naive one
        let lattice = Lattice::from_parameters(3.0, 3.0, 3.0, 60.0, 60.0, 60.0).unwrap();
        let s = Structure::new(lattice, &["Cu"], &[[0.0; 3]], false);
        let hits = neighbors_within(&s, [0.0; 3], 3.01);
        // fcc primitive cell: 12 nearest neighbors + self
        assert_eq!(hits.len(), 13);
    }

    #[test]
    fn test_sheared_cell_matches_brute_force() {
        // Flat, strongly sheared cell: the image range must come from the
        // true interplanar spacings
        let lattice = Lattice::new([[3.0, 0.0, 0.0], [2.9, 0.8, 0.0], [2.5, 0.6, 0.7]]).unwrap();
        let s = Structure::new(lattice, &["C", "O"], &[[0.0; 3], [0.3, 0.6, 0.45]], false);
        let center = s.lattice.cartesian([0.1, 0.2, 0.3]);
        let radius = 3.0;

        let mut expected = Vec::new();
        for (index, site) in s.iter().enumerate() {
            for u in -10..=10 {
                for v in -10..=10 {
                    for w in -10..=10 {
                        let image = [u, v, w];
                        let p = geometry::add(site.coords, s.lattice.translation(image));
                        if geometry::distance(center, p) <= radius {
                            expected.push((index, image));
                        }
                    }
                }
            }
        }
        expected.sort();

        let mut found: Vec<_> = neighbors_within(&s, center, radius)
            .into_iter()
            .map(|h| (h.index, h.image))
            .collect();
        found.sort();

        assert_eq!(expected.len(), 133);
        assert_eq!(found, expected);
    }

    #[test]
    fn test_hexagonal_cutoff_shell() {
        // Six in-plane neighbors at a; c is longer than the radius
        let lattice = Lattice::from_parameters(3.2, 3.2, 5.2, 90.0, 90.0, 120.0).unwrap();
        let s = Structure::new(lattice, &["Mg"], &[[0.0; 3]], false);
        let hits = neighbors_within(&s, [0.0; 3], 3.3);
        assert_eq!(hits.len(), 7);
        assert!(hits[1..].iter().all(|h| (h.distance - 3.2).abs() < 1e-9));
    }

    #[test]
    fn test_covalent_neighbors_in_silicon() {
        let lattice = Lattice::cubic(5.43).unwrap();
        let frac = [
            [0.0, 0.0, 0.0],
            [0.0, 0.5, 0.5],
            [0.5, 0.0, 0.5],
            [0.5, 0.5, 0.0],
            [0.25, 0.25, 0.25],
            [0.25, 0.75, 0.75],
            [0.75, 0.25, 0.75],
            [0.75, 0.75, 0.25],
        ];
        let s = Structure::new(lattice, &["Si"; 8], &frac, false);
        let nn = CovalentNN::default();
        for i in 0..s.len() {
            let found = nn.neighbors(&s, i);
            assert_eq!(found.len(), 4, "site {}", i);
            assert!(found.iter().all(|n| n.site_index != i));
        }
        // the corner atom bonds to three images outside the cell
        let corner = nn.neighbors(&s, 0);
        assert_eq!(corner.iter().filter(|n| n.image != [0, 0, 0]).count(), 3);
    }
}

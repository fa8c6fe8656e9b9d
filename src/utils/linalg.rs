// src/utils/linalg.rs

use nalgebra::{Matrix3, Vector3};

pub type Mat3 = [[f64; 3]; 3];

pub const IDENTITY: Mat3 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// Row-major lattice `[[ax, ay, az], [bx, by, bz], [cx, cy, cz]]` as a nalgebra matrix
pub fn to_matrix(m: &Mat3) -> Matrix3<f64> {
    Matrix3::new(
        m[0][0], m[0][1], m[0][2], m[1][0], m[1][1], m[1][2], m[2][0], m[2][1], m[2][2],
    )
}

pub fn from_matrix(m: &Matrix3<f64>) -> Mat3 {
    [
        [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
        [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
        [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
    ]
}

/// Convert fractional coordinates to Cartesian using lattice matrix
///
/// # Formula
/// ```text
/// Cartesian = Lattice^T × Fractional
/// ```
pub fn frac_to_cart(frac: [f64; 3], lattice: &Mat3) -> [f64; 3] {
    let cart_vec = to_matrix(lattice).transpose() * Vector3::from(frac);
    [cart_vec.x, cart_vec.y, cart_vec.z]
}

/// Convert Cartesian coordinates to fractional using lattice matrix
///
/// Returns `None` if the lattice is singular.
///
/// # Formula
/// ```text
/// Fractional = (Lattice^T)^-1 × Cartesian
/// ```
pub fn cart_to_frac(cart: [f64; 3], lattice: &Mat3) -> Option<[f64; 3]> {
    let inv_lat = to_matrix(lattice).transpose().try_inverse()?;
    let frac_vec = inv_lat * Vector3::from(cart);
    Some([frac_vec.x, frac_vec.y, frac_vec.z])
}

/// Inverse-transpose of the lattice, rows are b1, b2, b3 (no 2π factor)
pub fn reciprocal(lattice: &Mat3) -> Option<Mat3> {
    let inv = to_matrix(lattice).try_inverse()?;
    Some(from_matrix(&inv.transpose()))
}

pub fn determinant(m: &Mat3) -> f64 {
    to_matrix(m).determinant()
}

/// Row-vector rotation `p' = p · Rᵗ` (equivalently `R p`)
pub fn rotate(p: [f64; 3], rotation: &Mat3) -> [f64; 3] {
    let r = to_matrix(rotation) * Vector3::from(p);
    [r.x, r.y, r.z]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cubic_lattice() {
        // Simple cubic lattice 5.0 Å
        let lattice = [[5.0, 0.0, 0.0], [0.0, 5.0, 0.0], [0.0, 0.0, 5.0]];

        let cart = frac_to_cart([0.5, 0.5, 0.5], &lattice);

        assert!((cart[0] - 2.5).abs() < 1e-10);
        assert!((cart[1] - 2.5).abs() < 1e-10);
        assert!((cart[2] - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_roundtrip() {
        // Non-orthogonal lattice
        let lattice = [[4.0, 0.0, 0.0], [2.0, 3.46, 0.0], [0.0, 0.0, 5.0]];

        let frac_orig = [0.333, 0.667, 0.25];
        let cart = frac_to_cart(frac_orig, &lattice);
        let frac_back = cart_to_frac(cart, &lattice).unwrap();

        for i in 0..3 {
            assert!((frac_back[i] - frac_orig[i]).abs() < 1e-10);
        }
    }

    #[test]
    fn test_reciprocal_is_dual_basis() {
        let lattice = [[4.0, 0.0, 0.0], [2.0, 3.46, 0.0], [0.5, 0.3, 5.0]];
        let rec = reciprocal(&lattice).unwrap();

        // a_i · b_j = δ_ij
        for i in 0..3 {
            for j in 0..3 {
                let d: f64 = (0..3).map(|k| lattice[i][k] * rec[j][k]).sum();
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((d - expected).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn test_singular_lattice_has_no_fractional() {
        let flat = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]];
        assert!(cart_to_frac([0.1, 0.2, 0.3], &flat).is_none());
        assert!(reciprocal(&flat).is_none());
    }
}

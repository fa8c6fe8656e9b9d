// src/physics/orientation.rs

use crate::error::{RenderError, Result};
use crate::model::Lattice;
use crate::utils::geometry::{self, Point3};
use crate::utils::linalg::{self, Mat3, IDENTITY};
use serde::{Deserialize, Serialize};

/// Residual length below which an in-plane vector counts as parallel
const PARALLEL_EPS: f64 = 1e-6;

/// Viewing direction: the Miller plane normal is turned onto +Z and the
/// optional in-plane direction fixes the twist about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Orientation {
    pub miller: Option<[i32; 3]>,
    pub in_plane: Option<[i32; 3]>,
}

/// Unit normal of the (hkl) plane: `h·b1 + k·b2 + l·b3`.
pub fn miller_normal(lattice: &Lattice, miller: [i32; 3]) -> Result<Point3> {
    // Same as h(b×c) + k(c×a) + l(a×b) up to the cell volume
    let coeffs = miller.map(|v| v as f64);
    let normal = geometry::combine(coeffs, &lattice.reciprocal());
    geometry::normalize(normal).ok_or(RenderError::ZeroNormal { miller })
}

/// Unit Cartesian vector of the direct-lattice direction `[uvw]`.
pub fn in_plane_direction(lattice: &Lattice, direction: [i32; 3]) -> Result<Point3> {
    let coeffs = direction.map(|v| v as f64);
    let vec = geometry::combine(coeffs, lattice.matrix());
    geometry::normalize(vec).ok_or(RenderError::ZeroDirection { direction: coeffs })
}

/// Component of `v` orthogonal to the unit vector `normal`, if not degenerate.
fn project_out(v: Point3, normal: Point3) -> Option<Point3> {
    let residual = geometry::sub(v, geometry::scale(normal, geometry::dot(v, normal)));
    if geometry::norm(residual) < PARALLEL_EPS {
        None
    } else {
        geometry::normalize(residual)
    }
}

/// Rotation whose rows are `(x, y, normal)`; maps world coordinates into a
/// frame where the Miller normal is +Z. Identity without a Miller index.
///
/// The in-plane reference falls back to +Y, then +X, whenever it is
/// parallel to the normal.
pub fn rotation_from_orientation(lattice: &Lattice, orientation: &Orientation) -> Result<Mat3> {
    let Some(miller) = orientation.miller else {
        return Ok(IDENTITY);
    };
    let normal = miller_normal(lattice, miller)?;

    let requested = match orientation.in_plane {
        Some(direction) => Some(in_plane_direction(lattice, direction)?),
        None => None,
    };

    let plane_vec = requested
        .into_iter()
        .chain([[0.0, 1.0, 0.0], [1.0, 0.0, 0.0]])
        .find_map(|v| project_out(v, normal))
        .ok_or(RenderError::ZeroDirection { direction: normal })?;

    let x_axis = geometry::normalize(geometry::cross(plane_vec, normal))
        .ok_or(RenderError::ZeroDirection { direction: plane_vec })?;
    let y_axis = geometry::cross(normal, x_axis);

    log::debug!("Orientation {:?}: normal {:?}", miller, normal);
    Ok([x_axis, y_axis, normal])
}

/// Axis-angle rotation turning the Cartesian form of the lattice direction
/// `direction` onto `target`. Leaves the twist about `target` free.
///
/// Identity when the two are parallel or antiparallel.
pub fn direction_to_rotation(direction: Point3, lattice: Option<&Lattice>, target: Point3) -> Result<Mat3> {
    let vec = match lattice {
        Some(lattice) => geometry::combine(direction, lattice.matrix()),
        None => direction,
    };
    let a = geometry::normalize(vec).ok_or(RenderError::ZeroDirection { direction })?;
    let b = geometry::normalize(target).ok_or(RenderError::ZeroDirection { direction: target })?;

    let Some(axis) = geometry::normalize(geometry::cross(a, b)) else {
        return Ok(IDENTITY);
    };
    let angle = geometry::dot(a, b).clamp(-1.0, 1.0).acos();

    // Rodrigues: R = I + sin θ K + (1 - cos θ) K²
    let [kx, ky, kz] = axis;
    let k = nalgebra::Matrix3::new(0.0, -kz, ky, kz, 0.0, -kx, -ky, kx, 0.0);
    let r = nalgebra::Matrix3::identity() + k * angle.sin() + k * k * (1.0 - angle.cos());
    Ok(linalg::from_matrix(&r))
}

/// `p' = p · Rᵗ`
pub fn apply_rotation(point: Point3, rotation: &Mat3) -> Point3 {
    linalg::rotate(point, rotation)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point3, b: Point3, tol: f64) -> bool {
        (0..3).all(|i| (a[i] - b[i]).abs() < tol)
    }

    #[test]
    fn test_cubic_miller_normals() {
        let lattice = Lattice::cubic(3.5).unwrap();
        assert!(close(miller_normal(&lattice, [1, 0, 0]).unwrap(), [1.0, 0.0, 0.0], 1e-12));
        let s = 0.5f64.sqrt();
        assert!(close(miller_normal(&lattice, [1, 1, 0]).unwrap(), [s, s, 0.0], 1e-12));
        assert!(matches!(
            miller_normal(&lattice, [0, 0, 0]),
            Err(RenderError::ZeroNormal { .. })
        ));
    }

    #[test]
    fn test_hexagonal_normal_is_unit_and_orthogonal_to_plane() {
        let lattice = Lattice::from_parameters(3.2, 3.2, 5.2, 90.0, 90.0, 120.0).unwrap();
        let n = miller_normal(&lattice, [1, 0, 0]).unwrap();
        assert!((geometry::norm(n) - 1.0).abs() < 1e-12);
        // b and c lie in the (100) plane
        assert!(geometry::dot(n, lattice.matrix()[1]).abs() < 1e-9);
        assert!(geometry::dot(n, lattice.matrix()[2]).abs() < 1e-9);
        // and a lies off it, at 30° from the normal
        let a = geometry::normalize(lattice.matrix()[0]).unwrap();
        assert!((geometry::dot(n, a) - 0.75f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_triclinic_normal_is_orthogonal_to_plane() {
        let lattice = Lattice::from_parameters(4.1, 5.3, 6.2, 80.0, 100.0, 115.0).unwrap();
        let [a, b, c] = *lattice.matrix();
        // (111) contains a−b and b−c; (210) contains a−2b and c
        let cases = [
            ([1, 1, 1], geometry::sub(a, b), geometry::sub(b, c)),
            ([2, 1, 0], geometry::sub(a, geometry::scale(b, 2.0)), c),
        ];
        for (miller, u, v) in cases {
            let n = miller_normal(&lattice, miller).unwrap();
            assert!(geometry::dot(n, u).abs() < 1e-9, "{:?}", miller);
            assert!(geometry::dot(n, v).abs() < 1e-9, "{:?}", miller);
        }
    }

    #[test]
    fn test_rotation_maps_normal_to_z() {
        let lattice = Lattice::from_parameters(4.1, 5.3, 6.2, 80.0, 100.0, 115.0).unwrap();
        let cases = [
            ([1, 0, 0], None),
            ([0, 1, 0], None),
            ([1, 1, 1], Some([1, -1, 0])),
            ([2, -1, 3], Some([0, 0, 1])),
            ([0, 0, 1], Some([0, 0, 1])),
        ];
        for (miller, in_plane) in cases {
            let orientation = Orientation { miller: Some(miller), in_plane };
            let r = rotation_from_orientation(&lattice, &orientation).unwrap();
            let n = miller_normal(&lattice, miller).unwrap();
            assert!(close(apply_rotation(n, &r), [0.0, 0.0, 1.0], 1e-6), "{:?}", miller);
            assert!((linalg::determinant(&r) - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_in_plane_parallel_to_normal_falls_back() {
        let lattice = Lattice::cubic(3.0).unwrap();
        // normal is +Y and the in-plane direction is +Y too
        let orientation = Orientation {
            miller: Some([0, 1, 0]),
            in_plane: Some([0, 2, 0]),
        };
        let r = rotation_from_orientation(&lattice, &orientation).unwrap();
        assert!(close(apply_rotation([0.0, 1.0, 0.0], &r), [0.0, 0.0, 1.0], 1e-6));
    }

    #[test]
    fn test_in_plane_direction_sets_twist() {
        let lattice = Lattice::cubic(3.0).unwrap();
        let orientation = Orientation {
            miller: Some([0, 0, 1]),
            in_plane: Some([1, 0, 0]),
        };
        let r = rotation_from_orientation(&lattice, &orientation).unwrap();
        // the in-plane direction ends up along screen +Y
        assert!(close(apply_rotation([1.0, 0.0, 0.0], &r), [0.0, 1.0, 0.0], 1e-12));
    }

    #[test]
    fn test_no_miller_is_identity() {
        let lattice = Lattice::cubic(3.0).unwrap();
        let r = rotation_from_orientation(&lattice, &Orientation::default()).unwrap();
        assert_eq!(r, IDENTITY);
        let bad = Orientation { miller: Some([1, 0, 0]), in_plane: Some([0, 0, 0]) };
        assert!(matches!(
            rotation_from_orientation(&lattice, &bad),
            Err(RenderError::ZeroDirection { .. })
        ));
    }

    #[test]
    fn test_rodrigues_aligns_direction() {
        let lattice = Lattice::from_parameters(3.0, 4.0, 5.0, 90.0, 90.0, 120.0).unwrap();
        let target = [0.0, 0.0, 1.0];
        for dir in [[1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [1.0, 2.0, 3.0]] {
            let r = direction_to_rotation(dir, Some(&lattice), target).unwrap();
            let v = geometry::normalize(geometry::combine(dir, lattice.matrix())).unwrap();
            assert!(close(apply_rotation(v, &r), target, 1e-6), "{:?}", dir);
        }
        // already aligned, and antiparallel
        assert_eq!(direction_to_rotation([0.0, 0.0, 2.0], None, target).unwrap(), IDENTITY);
        assert_eq!(direction_to_rotation([0.0, 0.0, -1.0], None, target).unwrap(), IDENTITY);
    }
}

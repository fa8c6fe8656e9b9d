// src/utils/geometry.rs

pub type Point3 = [f64; 3];

/// Distance between two points (Angstroms)
pub fn distance(p1: Point3, p2: Point3) -> f64 {
    norm(sub(p1, p2))
}

/// Angle between two vectors in degrees
pub fn angle_between(v1: Point3, v2: Point3) -> f64 {
    match (normalize(v1), normalize(v2)) {
        (Some(a), Some(b)) => dot(a, b).clamp(-1.0, 1.0).acos().to_degrees(),
        _ => 0.0,
    }
}

pub fn add(a: Point3, b: Point3) -> Point3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

pub fn sub(a: Point3, b: Point3) -> Point3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub fn scale(a: Point3, s: f64) -> Point3 {
    [a[0] * s, a[1] * s, a[2] * s]
}

pub fn dot(a: Point3, b: Point3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub fn cross(a: Point3, b: Point3) -> Point3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub fn norm(a: Point3) -> f64 {
    dot(a, a).sqrt()
}

/// Unit vector along `a`, or `None` for the zero vector.
pub fn normalize(a: Point3) -> Option<Point3> {
    let l = norm(a);
    if l == 0.0 || !l.is_finite() {
        None
    } else {
        Some([a[0] / l, a[1] / l, a[2] / l])
    }
}

/// Integer combination `u*a + v*b + w*c` of three basis rows.
pub fn combine(coeffs: [f64; 3], rows: &[[f64; 3]; 3]) -> Point3 {
    let mut out = [0.0; 3];
    for (c, row) in coeffs.iter().zip(rows.iter()) {
        out = add(out, scale(*row, *c));
    }
    out
}

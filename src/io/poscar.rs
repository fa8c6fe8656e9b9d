// src/io/poscar.rs

use crate::error::{RenderError, Result};
use crate::model::{normalize_symbol, Lattice, Structure};
use std::fmt::Write as _;
use std::path::Path;

fn floats(line: &str, count: usize, what: &str, path: &Path) -> Result<Vec<f64>> {
    let values: Vec<f64> = line
        .split_whitespace()
        .take(count)
        .map(|t| t.parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| RenderError::parse(path, format!("Invalid {}: '{}'", what, line.trim())))?;
    if values.len() < count {
        return Err(RenderError::parse(path, format!("Invalid {}: '{}'", what, line.trim())));
    }
    Ok(values)
}

pub fn parse_str(text: &str, path: &Path) -> Result<Structure> {
    let mut lines = text.lines();
    let mut next = |what: &str| {
        lines
            .next()
            .ok_or_else(|| RenderError::parse(path, format!("Unexpected EOF: missing {}", what)))
    };

    let comment = next("comment")?.to_string();

    // Scale (negative means target volume)
    let scale = floats(next("scale")?, 1, "scale", path)?[0];

    // Lattice
    let mut lattice = [[0.0; 3]; 3];
    for row in lattice.iter_mut() {
        let v = floats(next("lattice")?, 3, "lattice line", path)?;
        row.copy_from_slice(&v);
    }
    let raw = Lattice::new(lattice)?;
    let factor = if scale < 0.0 {
        (-scale / raw.volume()).cbrt()
    } else {
        scale
    };
    for row in lattice.iter_mut() {
        for v in row.iter_mut() {
            *v *= factor;
        }
    }
    let lattice = Lattice::new(lattice)?;

    // Elements & Counts (VASP 4 files have no element line)
    let line6 = next("element counts")?.to_string();
    let starts_alpha = line6.trim().chars().next().map(|c| c.is_alphabetic()).unwrap_or(false);
    let (element_names, counts_line): (Vec<String>, String) = if starts_alpha {
        let names = line6.split_whitespace().map(normalize_symbol).collect();
        (names, next("element counts")?.to_string())
    } else {
        // Fall back to symbols listed on the comment line
        let names = comment.split_whitespace().map(normalize_symbol).collect();
        (names, line6)
    };

    let counts: Vec<usize> = counts_line
        .split_whitespace()
        .map(|x| x.parse())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| RenderError::parse(path, format!("Invalid counts: '{}'", counts_line.trim())))?;

    // Mode, with optional Selective dynamics line first
    let mut mode_line = next("coordinate mode")?.trim().to_lowercase();
    if mode_line.starts_with('s') {
        mode_line = next("coordinate mode")?.trim().to_lowercase();
    }
    let is_direct = !(mode_line.starts_with('c') || mode_line.starts_with('k'));

    // Atoms
    let mut species = Vec::new();
    let mut coords = Vec::new();
    for (elem_idx, &count) in counts.iter().enumerate() {
        let elem_name = element_names
            .get(elem_idx)
            .cloned()
            .unwrap_or_else(|| "X".to_string());
        for _ in 0..count {
            let v = floats(next("atom position")?, 3, "atom position", path)?;
            let mut p = [v[0], v[1], v[2]];
            if !is_direct {
                p = [p[0] * factor, p[1] * factor, p[2] * factor];
            }
            species.push(elem_name.clone());
            coords.push(p);
        }
    }

    if species.is_empty() {
        return Err(RenderError::parse(path, "POSCAR contains no atoms"));
    }

    Ok(Structure::new(lattice, &species, &coords, !is_direct))
}

pub fn to_string(structure: &Structure) -> String {
    let mut out = String::new();

    // 1. Header
    let _ = writeln!(out, "{}", structure.formula());
    let _ = writeln!(out, "1.0"); // Universal scaling factor

    // 2. Lattice Vectors
    for vec in structure.lattice.matrix() {
        let _ = writeln!(out, " {:12.8} {:12.8} {:12.8}", vec[0], vec[1], vec[2]);
    }

    // 3. Group sites by element, keeping first-appearance order
    let groups: Vec<(String, Vec<[f64; 3]>)> = structure
        .composition()
        .into_iter()
        .map(|el| {
            let positions = structure
                .iter()
                .filter(|s| s.species == el)
                .map(|s| s.frac_coords)
                .collect();
            (el, positions)
        })
        .collect();

    for (label, _) in &groups {
        let _ = write!(out, " {:<4}", label);
    }
    let _ = writeln!(out);
    for (_, positions) in &groups {
        let _ = write!(out, " {:<4}", positions.len());
    }
    let _ = writeln!(out);

    // 4. Atomic Positions (Direct/Fractional)
    let _ = writeln!(out, "Direct");
    for (_, positions) in &groups {
        for p in positions {
            let _ = writeln!(out, " {:12.8} {:12.8} {:12.8}", p[0], p[1], p[2]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const NACL: &str = "NaCl rocksalt
1.0
 5.64 0.0 0.0
 0.0 5.64 0.0
 0.0 0.0 5.64
 Na Cl
 1 1
Direct
 0.0 0.0 0.0
 0.5 0.5 0.5
";

    #[test]
    fn test_parse_direct() {
        let s = parse_str(NACL, Path::new("POSCAR")).unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s.sites()[1].species, "Cl");
        assert!((s.sites()[1].coords[0] - 2.82).abs() < 1e-10);
    }

    #[test]
    fn test_parse_cartesian_with_scale() {
        let text = "Si
2.0
 1.0 0.0 0.0
 0.0 1.0 0.0
 0.0 0.0 1.0
 Si
 1
Selective dynamics
Cartesian
 0.5 0.5 0.5 T T T
";
        let s = parse_str(text, Path::new("POSCAR")).unwrap();
        assert!((s.lattice.abc()[0] - 2.0).abs() < 1e-12);
        assert!((s.sites()[0].coords[0] - 1.0).abs() < 1e-12);
        assert!((s.sites()[0].frac_coords[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_truncated_file_is_parse_error() {
        let text = "broken\n1.0\n 1 0 0\n";
        let err = parse_str(text, Path::new("POSCAR")).unwrap_err();
        assert!(matches!(err, RenderError::Parse { .. }));
    }

    #[test]
    fn test_writer_output_parses_back() {
        let s = parse_str(NACL, Path::new("POSCAR")).unwrap();
        let again = parse_str(&to_string(&s), Path::new("POSCAR")).unwrap();
        assert_eq!(again.len(), 2);
        assert_eq!(again.composition(), s.composition());
    }
}

// src/io/cif.rs

use crate::error::{RenderError, Result};
use crate::model::{normalize_symbol, Lattice, Site, Structure};
use crate::physics::cell::{ensure_unique_sites, SiteMatcher};
use std::fmt::Write as _;
use std::path::Path;

const WRAP_EPS: f64 = 1e-8;

const SYMOP_TAGS: [&str; 2] = ["_symmetry_equiv_pos_as_xyz", "_space_group_symop_operation_xyz"];

/// Splits a CIF data line into values, keeping quoted strings together.
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => {
                tokens.push(std::mem::take(&mut current));
                quote = None;
            }
            Some(_) => current.push(c),
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            None => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

#[derive(Default)]
struct Loop {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Loop {
    fn column(&self, tag: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.eq_ignore_ascii_case(tag))
    }
}

pub fn parse_str(text: &str, path: &Path) -> Result<Structure> {
    let mut cell: [Option<f64>; 6] = [None; 6];
    let cell_tags = [
        "_cell_length_a",
        "_cell_length_b",
        "_cell_length_c",
        "_cell_angle_alpha",
        "_cell_angle_beta",
        "_cell_angle_gamma",
    ];

    let mut loops: Vec<Loop> = Vec::new();
    let mut current: Option<Loop> = None;
    let mut single_ops: Vec<String> = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        // 1. Loop Detection
        if trimmed.starts_with("loop_") {
            if let Some(done) = current.take() {
                loops.push(done);
            }
            current = Some(Loop::default());
            continue;
        }

        // 2. Header Parsing (only before the first row)
        if trimmed.starts_with('_') {
            if let Some(lp) = current.as_mut() {
                if lp.rows.is_empty() {
                    lp.headers.push(trimmed.split_whitespace().next().unwrap_or("").to_string());
                    continue;
                }
            }
            if let Some(done) = current.take() {
                loops.push(done);
            }

            // 3. Single key/value items
            let tokens = tokenize(trimmed);
            if let (Some(tag), Some(value)) = (tokens.first(), tokens.get(1)) {
                if let Some(i) = cell_tags.iter().position(|t| tag.eq_ignore_ascii_case(t)) {
                    cell[i] = parse_cif_float(value);
                } else if SYMOP_TAGS.iter().any(|t| tag.eq_ignore_ascii_case(t)) {
                    single_ops.push(tokens[1..].concat());
                }
            }
            continue;
        }

        if trimmed.starts_with("data_") {
            if let Some(done) = current.take() {
                loops.push(done);
            }
            continue;
        }

        // 4. Data rows; values may wrap over several lines
        if let Some(lp) = current.as_mut() {
            let tokens = tokenize(trimmed);
            match lp.rows.last_mut() {
                Some(row) if row.len() < lp.headers.len() => row.extend(tokens),
                _ => lp.rows.push(tokens),
            }
        }
    }
    if let Some(done) = current.take() {
        loops.push(done);
    }

    let [a, b, c, alpha, beta, gamma] = cell;
    let (Some(a), Some(b), Some(c)) = (a, b, c) else {
        return Err(RenderError::parse(path, "missing _cell_length_a/b/c"));
    };
    let lattice = Lattice::from_parameters(
        a,
        b,
        c,
        alpha.unwrap_or(90.0),
        beta.unwrap_or(90.0),
        gamma.unwrap_or(90.0),
    )?;

    // Symmetry operations
    let mut ops = single_ops;
    for lp in &loops {
        if let Some(col) = SYMOP_TAGS.iter().find_map(|t| lp.column(t)) {
            let last = col + 1 == lp.headers.len();
            for row in lp.rows.iter().filter(|row| row.len() > col) {
                // Unquoted "x, y, z" in the last column spans several tokens
                let op = if last { row[col..].concat() } else { row[col].clone() };
                ops.push(op.replace(' ', ""));
            }
        }
    }
    if ops.is_empty() {
        ops.push("x,y,z".to_string());
    }
    let ops: Vec<SymOp> = ops
        .iter()
        .map(|op| SymOp::parse(op).ok_or_else(|| RenderError::parse(path, format!("invalid symmetry operation '{}'", op))))
        .collect::<Result<_>>()?;

    // Asymmetric unit
    let atom_loop = loops
        .iter()
        .find(|lp| lp.column("_atom_site_fract_x").is_some())
        .ok_or_else(|| RenderError::parse(path, "no _atom_site_fract_x loop"))?;
    let cols = [
        atom_loop.column("_atom_site_fract_x"),
        atom_loop.column("_atom_site_fract_y"),
        atom_loop.column("_atom_site_fract_z"),
    ];
    let [Some(cx), Some(cy), Some(cz)] = cols else {
        return Err(RenderError::parse(path, "incomplete fractional coordinate columns"));
    };
    let species_col = atom_loop
        .column("_atom_site_type_symbol")
        .or_else(|| atom_loop.column("_atom_site_label"))
        .ok_or_else(|| RenderError::parse(path, "no _atom_site_type_symbol or _atom_site_label"))?;

    let mut sites = Vec::new();
    for row in &atom_loop.rows {
        let get = |i: usize| row.get(i).and_then(|v| parse_cif_float(v));
        let (Some(x), Some(y), Some(z), Some(label)) = (get(cx), get(cy), get(cz), row.get(species_col)) else {
            log::warn!("Skipping malformed atom row in {}: {:?}", path.display(), row);
            continue;
        };
        let species = normalize_symbol(label);
        for op in &ops {
            let p = op.apply([x, y, z]);
            let wrapped = p.map(wrap_unit);
            sites.push(Site::from_fractional(species.clone(), wrapped, &lattice));
        }
    }

    if sites.is_empty() {
        return Err(RenderError::parse(path, "CIF contains no atoms"));
    }

    let expanded = Structure::from_sites(lattice, sites);
    // CIF coordinates are often rounded to four decimals
    let unique = ensure_unique_sites(&expanded, &SiteMatcher { stol: 1e-2 });
    log::debug!(
        "CIF {}: {} symmetry ops, {} expanded sites, {} unique",
        path.display(),
        ops.len(),
        expanded.len(),
        unique.len()
    );
    Ok(unique)
}

/// Fractional coordinate folded into [0, 1). `rem_euclid` of a tiny
/// negative value rounds up to exactly 1.0, which is snapped back to 0.
fn wrap_unit(x: f64) -> f64 {
    let w = x.rem_euclid(1.0);
    if w >= 1.0 - WRAP_EPS {
        0.0
    } else {
        w
    }
}

/// Affine operation `p' = R p + t` in fractional coordinates.
#[derive(Debug, Clone, PartialEq)]
struct SymOp {
    rows: [([f64; 3], f64); 3],
}

impl SymOp {
    fn parse(op: &str) -> Option<Self> {
        let parts: Vec<&str> = op.split(',').collect();
        if parts.len() != 3 {
            return None;
        }
        Some(Self {
            rows: [
                evaluate_expr(parts[0])?,
                evaluate_expr(parts[1])?,
                evaluate_expr(parts[2])?,
            ],
        })
    }

    fn apply(&self, p: [f64; 3]) -> [f64; 3] {
        self.rows.map(|(coeffs, shift)| coeffs[0] * p[0] + coeffs[1] * p[1] + coeffs[2] * p[2] + shift)
    }
}

/// One component such as "-x+1/2" into coefficients and translation.
fn evaluate_expr(expr: &str) -> Option<([f64; 3], f64)> {
    let s = expr.replace(' ', "").to_lowercase();
    let mut coeffs = [0.0; 3];
    let mut shift = 0.0;
    let mut current_term = String::new();

    // Split by + or - but keep the delimiter
    for c in s.chars() {
        if (c == '+' || c == '-') && !current_term.is_empty() {
            evaluate_term(&current_term, &mut coeffs, &mut shift)?;
            current_term.clear();
        }
        current_term.push(c);
    }
    if !current_term.is_empty() {
        evaluate_term(&current_term, &mut coeffs, &mut shift)?;
    }
    Some((coeffs, shift))
}

fn evaluate_term(term: &str, coeffs: &mut [f64; 3], shift: &mut f64) -> Option<()> {
    let (sign, t) = match term.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, term.strip_prefix('+').unwrap_or(term)),
    };

    for (axis, var) in ['x', 'y', 'z'].iter().enumerate() {
        if let Some(factor) = t.strip_suffix(*var) {
            // "2x" and "x" both allowed, with an optional '*'
            let factor = factor.trim_end_matches('*');
            let k = if factor.is_empty() { 1.0 } else { parse_number(factor)? };
            coeffs[axis] += sign * k;
            return Some(());
        }
    }

    *shift += sign * parse_number(t)?;
    Some(())
}

fn parse_number(t: &str) -> Option<f64> {
    match t.split_once('/') {
        Some((num, den)) => {
            let den: f64 = den.parse().ok()?;
            if den == 0.0 {
                return None;
            }
            Some(num.parse::<f64>().ok()? / den)
        }
        None => t.parse().ok(),
    }
}

/// Numeric value with the standard uncertainty "(3)" stripped.
fn parse_cif_float(s: &str) -> Option<f64> {
    let clean: String = s.chars().take_while(|c| *c != '(').collect();
    clean.parse().ok()
}

pub fn to_string(structure: &Structure) -> String {
    let mut out = String::new();
    let [a, b, c] = structure.lattice.abc();
    let [alpha, beta, gamma] = structure.lattice.angles();

    let _ = writeln!(out, "data_{}", structure.formula());
    let _ = writeln!(out, "_symmetry_space_group_name_H-M 'P 1'");
    let _ = writeln!(out, "_symmetry_Int_Tables_number 1");
    let _ = writeln!(out, "_cell_length_a    {:.6}", a);
    let _ = writeln!(out, "_cell_length_b    {:.6}", b);
    let _ = writeln!(out, "_cell_length_c    {:.6}", c);
    let _ = writeln!(out, "_cell_angle_alpha {:.6}", alpha);
    let _ = writeln!(out, "_cell_angle_beta  {:.6}", beta);
    let _ = writeln!(out, "_cell_angle_gamma {:.6}", gamma);
    let _ = writeln!(out, "loop_");
    let _ = writeln!(out, " _symmetry_equiv_pos_as_xyz");
    let _ = writeln!(out, " 'x, y, z'");

    let _ = writeln!(out, "loop_");
    let _ = writeln!(out, " _atom_site_label");
    let _ = writeln!(out, " _atom_site_type_symbol");
    let _ = writeln!(out, " _atom_site_fract_x");
    let _ = writeln!(out, " _atom_site_fract_y");
    let _ = writeln!(out, " _atom_site_fract_z");
    for (i, site) in structure.iter().enumerate() {
        let [u, v, w] = site.frac_coords;
        // Unique label e.g. Fe1, Fe2
        let _ = writeln!(out, " {}{} {} {:.6} {:.6} {:.6}", site.species, i + 1, site.species, u, v, w);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const NACL_FM3M: &str = "data_NaCl
_cell_length_a 5.64(1)
_cell_length_b 5.64
_cell_length_c 5.64
_cell_angle_alpha 90
_cell_angle_beta 90
_cell_angle_gamma 90
loop_
 _symmetry_equiv_pos_as_xyz
 'x, y, z'
 'x, y+1/2, z+1/2'
 'x+1/2, y, z+1/2'
 'x+1/2, y+1/2, z'
 '-x, -y, -z'
loop_
 _atom_site_label
 _atom_site_type_symbol
 _atom_site_fract_x
 _atom_site_fract_y
 _atom_site_fract_z
 Na1 Na+ 0.0 0.0 0.0
 Cl1 Cl- 0.5 0.5 0.5
";

    #[test]
    fn test_symmetry_expansion_and_dedup() {
        let s = parse_str(NACL_FM3M, Path::new("nacl.cif")).unwrap();
        // 4 Na + 4 Cl; the inversion only produces duplicates
        assert_eq!(s.len(), 8);
        assert_eq!(s.composition(), vec!["Na".to_string(), "Cl".to_string()]);
        assert!((s.lattice.abc()[0] - 5.64).abs() < 1e-12);
        for site in &s {
            assert!(site.frac_coords.iter().all(|&f| (0.0..1.0).contains(&f)));
        }
    }

    #[test]
    fn test_symop_parsing() {
        let op = SymOp::parse("-x+1/2,y-z,0.25+z").unwrap();
        let p = op.apply([0.1, 0.2, 0.3]);
        assert!((p[0] - 0.4).abs() < 1e-12);
        assert!((p[1] + 0.1).abs() < 1e-12);
        assert!((p[2] - 0.55).abs() < 1e-12);
        assert!(SymOp::parse("x,y").is_none());
        assert!(SymOp::parse("x,y,q").is_none());
    }

    #[test]
    fn test_wrap_stays_below_one() {
        assert_eq!((-1e-17f64).rem_euclid(1.0), 1.0);
        assert_eq!(wrap_unit(-1e-17), 0.0);
        assert_eq!(wrap_unit(1.0), 0.0);
        assert!((wrap_unit(-0.25) - 0.75).abs() < 1e-15);
        assert!((wrap_unit(1.5) - 0.5).abs() < 1e-15);
    }

    #[test]
    fn test_inverted_origin_site_wraps_to_zero() {
        let text = "data_x
_cell_length_a 4.0
_cell_length_b 4.0
_cell_length_c 4.0
loop_
_symmetry_equiv_pos_as_xyz
x,y,z
-x,-y,-z
loop_
_atom_site_label
_atom_site_fract_x
_atom_site_fract_y
_atom_site_fract_z
Fe1 1e-17 0.0 0.5
";
        let s = parse_str(text, Path::new("x.cif")).unwrap();
        assert_eq!(s.len(), 1);
        for site in &s {
            assert!(site.frac_coords.iter().all(|&f| (0.0..1.0).contains(&f)));
        }
    }

    #[test]
    fn test_missing_cell_is_parse_error() {
        let text = "data_x\nloop_\n_atom_site_label\n_atom_site_fract_x\n_atom_site_fract_y\n_atom_site_fract_z\nSi 0 0 0\n";
        let err = parse_str(text, Path::new("x.cif")).unwrap_err();
        assert!(matches!(err, RenderError::Parse { .. }));
    }

    #[test]
    fn test_writer_output_parses_back() {
        let s = parse_str(NACL_FM3M, Path::new("nacl.cif")).unwrap();
        let again = parse_str(&to_string(&s), Path::new("nacl.cif")).unwrap();
        assert_eq!(again.len(), s.len());
        assert_eq!(again.formula(), "Cl4Na4");
    }
}

// src/utils/report.rs

use crate::model::Structure;
use crate::physics::bonding::Bond;
use std::collections::BTreeMap;

const MAX_ROWS: usize = 20;

/// Plain-text overview of a loaded structure, for `-vv` logs.
pub fn structure_summary(structure: &Structure, name: &str) -> String {
    let [a, b, c] = structure.lattice.abc();
    let [alpha, beta, gamma] = structure.lattice.angles();

    let mut out = String::new();
    out.push_str(&format!("File: {}\n", name));
    out.push_str(&format!("Formula: {} ({} sites)\n", structure.formula(), structure.len()));
    out.push_str(&format!("Cell: a={:.4} b={:.4} c={:.4} Å\n", a, b, c));
    out.push_str(&format!(
        "      α={:.2}° β={:.2}° γ={:.2}°  V={:.3} Å³\n",
        alpha,
        beta,
        gamma,
        structure.lattice.volume()
    ));
    out.push_str("--------------------------------------------------\n");
    out.push_str(&format!(
        "{:<8} {:<8} {:<10} {:<10} {:<10}\n",
        "Index", "Element", "a", "b", "c"
    ));
    out.push_str("--------------------------------------------------\n");

    for (i, site) in structure.iter().take(MAX_ROWS).enumerate() {
        let f = site.frac_coords;
        out.push_str(&format!(
            "{:<8} {:<8} {:<10.4} {:<10.4} {:<10.4}\n",
            i, site.species, f[0], f[1], f[2]
        ));
    }

    if structure.len() > MAX_ROWS {
        out.push_str(&format!("... and {} more sites.\n", structure.len() - MAX_ROWS));
    }

    out
}

/// Bond counts and length ranges per element pair.
pub fn bond_summary(bonds: &[Bond]) -> String {
    if bonds.is_empty() {
        return "No bonds.".to_string();
    }

    let mut pairs: BTreeMap<(String, String), (usize, f64, f64)> = BTreeMap::new();
    for bond in bonds {
        let (x, y) = &bond.elements;
        let key = if x <= y {
            (x.clone(), y.clone())
        } else {
            (y.clone(), x.clone())
        };
        let d = bond.length();
        let entry = pairs.entry(key).or_insert((0, f64::INFINITY, 0.0));
        entry.0 += 1;
        entry.1 = entry.1.min(d);
        entry.2 = entry.2.max(d);
    }

    let mut out = format!("{} bonds\n", bonds.len());
    for ((x, y), (n, lo, hi)) in pairs {
        out.push_str(&format!("  {}-{}: {} ({:.3} – {:.3} Å)\n", x, y, n, lo, hi));
    }
    out
}

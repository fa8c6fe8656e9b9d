// src/model/elements.rs

use std::collections::HashMap;
use std::sync::OnceLock;

pub type Rgb8 = (u8, u8, u8);

#[derive(Debug, Clone, Copy)]
pub struct ElementData {
    pub symbol: &'static str,
    pub number: u32,
    /// Covalent radius (Å), Cordero et al. 2008
    pub covalent: f64,
    /// Average ionic radius over common oxidation states (Å)
    pub ionic: Option<f64>,
    pub vesta: Rgb8,
    pub jmol: Rgb8,
}

const fn el(
    symbol: &'static str,
    number: u32,
    covalent: f64,
    ionic: Option<f64>,
    vesta: Rgb8,
    jmol: Rgb8,
) -> ElementData {
    ElementData { symbol, number, covalent, ionic, vesta, jmol }
}

#[rustfmt::skip]
static ELEMENTS: &[ElementData] = &[
    // --- Period 1 ---
    el("H",  1,  0.31, None,       (255, 204, 204), (255, 255, 255)),
    el("He", 2,  0.28, None,       (252, 232, 206), (217, 255, 255)),
    // --- Period 2 ---
    el("Li", 3,  1.28, Some(0.90), (134, 224, 116), (204, 128, 255)),
    el("Be", 4,  0.96, Some(0.59), ( 94, 215, 123), (194, 255,   0)),
    el("B",  5,  0.84, Some(0.41), ( 31, 162,  15), (255, 181, 181)),
    el("C",  6,  0.76, Some(0.30), (128,  73,  41), (144, 144, 144)),
    el("N",  7,  0.71, Some(1.32), (176, 185, 230), ( 48,  80, 248)),
    el("O",  8,  0.66, Some(1.26), (254,   3,   0), (255,  13,  13)),
    el("F",  9,  0.57, Some(1.19), (176, 185, 230), (144, 224,  80)),
    el("Ne", 10, 0.58, None,       (254,  55, 181), (179, 227, 245)),
    // --- Period 3 ---
    el("Na", 11, 1.66, Some(1.16), (249, 220,  60), (171,  92, 242)),
    el("Mg", 12, 1.41, Some(0.86), (251, 123,  21), (138, 255,   0)),
    el("Al", 13, 1.21, Some(0.675),(129, 178, 214), (191, 166, 166)),
    el("Si", 14, 1.11, Some(0.54), ( 27,  59, 250), (240, 200, 160)),
    el("P",  15, 1.07, Some(0.52), (192, 156, 194), (255, 128,   0)),
    el("S",  16, 1.05, Some(1.07), (255, 250,   0), (255, 255,  48)),
    el("Cl", 17, 1.02, Some(1.67), ( 49, 252,   2), ( 31, 240,  31)),
    el("Ar", 18, 1.06, None,       (207, 254, 196), (128, 209, 227)),
    // --- Period 4 ---
    el("K",  19, 2.03, Some(1.52), (161,  33, 246), (143,  64, 212)),
    el("Ca", 20, 1.76, Some(1.14), ( 90, 150, 189), ( 61, 255,   0)),
    el("Sc", 21, 1.70, Some(0.885),(181,  99, 171), (230, 230, 230)),
    el("Ti", 22, 1.60, Some(0.76), (120, 202, 255), (191, 194, 199)),
    el("V",  23, 1.53, Some(0.73), (229,  25,   0), (166, 166, 171)),
    el("Cr", 24, 1.39, Some(0.72), (  0,   0, 158), (138, 153, 199)),
    el("Mn", 25, 1.39, Some(0.72), (168,   8, 158), (156, 122, 199)),
    el("Fe", 26, 1.32, Some(0.72), (181, 113,   0), (224, 102,  51)),
    el("Co", 27, 1.26, Some(0.74), (  0,   0, 175), (240, 144, 160)),
    el("Ni", 28, 1.24, Some(0.74), (183, 187, 189), ( 80, 208,  80)),
    el("Cu", 29, 1.32, Some(0.79), ( 34,  71, 220), (200, 128,  51)),
    el("Zn", 30, 1.22, Some(0.88), (143, 143, 129), (125, 128, 176)),
    el("Ga", 31, 1.22, Some(0.76), (158, 227, 115), (194, 143, 143)),
    el("Ge", 32, 1.20, Some(0.73), (126, 110, 166), (102, 143, 143)),
    el("As", 33, 1.19, Some(0.62), (116, 208,  87), (189, 128, 227)),
    el("Se", 34, 1.20, Some(1.10), (154, 239,  15), (255, 161,   0)),
    el("Br", 35, 1.20, Some(1.82), (126,  49,   2), (166,  41,  41)),
    el("Kr", 36, 1.16, None,       (250, 193, 243), ( 92, 184, 209)),
    // --- Period 5 ---
    el("Rb", 37, 2.20, Some(1.66), (255,   0, 153), (112,  46, 176)),
    el("Sr", 38, 1.95, Some(1.32), (  0, 255,  39), (  0, 255,   0)),
    el("Y",  39, 1.90, Some(1.04), (103, 152, 142), (148, 255, 255)),
    el("Zr", 40, 1.75, Some(0.86), (  0, 255,   0), (148, 224, 224)),
    el("Nb", 41, 1.64, Some(0.78), ( 76, 178, 118), (115, 194, 201)),
    el("Mo", 42, 1.54, Some(0.75), (180, 134, 175), ( 84, 181, 181)),
    el("Tc", 43, 1.47, Some(0.72), (205, 175, 202), ( 59, 158, 158)),
    el("Ru", 44, 1.46, Some(0.74), (207, 183, 173), ( 36, 143, 143)),
    el("Rh", 45, 1.42, Some(0.76), (205, 209, 171), ( 10, 125, 140)),
    el("Pd", 46, 1.39, Some(0.82), (193, 195, 184), (  0, 105, 133)),
    el("Ag", 47, 1.45, Some(1.08), (183, 187, 189), (192, 192, 192)),
    el("Cd", 48, 1.44, Some(1.09), (242,  30, 220), (255, 217, 143)),
    el("In", 49, 1.42, Some(0.94), (215, 128, 187), (166, 117, 115)),
    el("Sn", 50, 1.39, Some(0.83), (154, 142, 185), (102, 128, 128)),
    el("Sb", 51, 1.39, Some(0.79), (215, 131,  79), (158,  99, 181)),
    el("Te", 52, 1.38, Some(1.07), (173, 162,  81), (212, 122,   0)),
    el("I",  53, 1.39, Some(1.40), (142,  31, 138), (148,   0, 148)),
    el("Xe", 54, 1.40, None,       (154, 161, 248), ( 66, 158, 176)),
    // --- Period 6 (selected) ---
    el("Cs", 55, 2.44, Some(1.81), ( 14, 254, 185), ( 87,  23, 143)),
    el("Ba", 56, 2.15, Some(1.49), ( 30, 239,  44), (  0, 201,   0)),
    el("La", 57, 2.07, Some(1.17), ( 90, 196,  73), (112, 212, 255)),
    el("Ce", 58, 2.04, Some(1.07), (209, 252,   6), (255, 255, 199)),
    el("Nd", 60, 2.01, Some(1.12), (255, 111, 200), (199, 255, 199)),
    el("Gd", 64, 1.96, Some(1.08), (144, 111, 159), ( 69, 255, 199)),
    el("Hf", 72, 1.75, Some(0.85), (180, 180, 180), ( 77, 194, 255)),
    el("Ta", 73, 1.70, Some(0.79), (183, 154,  86), ( 77, 166, 255)),
    el("W",  74, 1.62, Some(0.73), (141, 138, 127), ( 33, 148, 214)),
    el("Re", 75, 1.51, Some(0.69), (179, 176, 142), ( 38, 125, 171)),
    el("Os", 76, 1.44, Some(0.70), (200, 177, 120), ( 38, 102, 150)),
    el("Ir", 77, 1.41, Some(0.76), (201, 206, 114), ( 23,  84, 135)),
    el("Pt", 78, 1.36, Some(0.77), (203, 197, 191), (208, 208, 224)),
    el("Au", 79, 1.36, Some(1.01), (254, 178,  56), (255, 209,  35)),
    el("Hg", 80, 1.32, Some(1.10), (211, 184, 204), (184, 184, 208)),
    el("Tl", 81, 1.45, Some(1.21), (150, 137, 108), (166,  84,  77)),
    el("Pb", 82, 1.46, Some(1.05), ( 82,  83,  91), ( 87,  89,  97)),
    el("Bi", 83, 1.48, Some(1.02), (210,  47, 247), (158,  79, 181)),
    // --- Actinides (selected) ---
    el("Th", 90, 2.06, Some(1.08), (  0, 186, 255), (  0, 186, 255)),
    el("U",  92, 1.96, Some(0.92), (121, 162, 255), (  0, 143, 255)),
];

static LOOKUP: OnceLock<HashMap<&'static str, ElementData>> = OnceLock::new();

fn table() -> &'static HashMap<&'static str, ElementData> {
    LOOKUP.get_or_init(|| ELEMENTS.iter().map(|e| (e.symbol, *e)).collect())
}

/// Strips oxidation-state decorations ("Fe2+", "O2-", "Na1") down to the
/// element symbol.
pub fn normalize_symbol(label: &str) -> String {
    let letters: String = label.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    let mut chars = letters.chars();
    match chars.next() {
        Some(first) => {
            let mut out = first.to_ascii_uppercase().to_string();
            // Two-letter symbols only when the pair is a known element.
            if let Some(second) = chars.next() {
                let candidate = format!("{}{}", out, second.to_ascii_lowercase());
                if table().contains_key(candidate.as_str()) {
                    out = candidate;
                }
            }
            out
        }
        None => "X".to_string(),
    }
}

pub fn element_data(symbol: &str) -> Option<&'static ElementData> {
    table().get(symbol)
}

/// Returns the Atomic Number (Z) for a given element symbol, 0 if unknown
pub fn get_atomic_number(element: &str) -> u32 {
    element_data(element).map(|e| e.number).unwrap_or(0)
}

pub fn get_atom_cov(element: &str) -> Option<f64> {
    element_data(element).map(|e| e.covalent)
}

pub fn get_atom_ionic_radius(element: &str) -> Option<f64> {
    element_data(element).and_then(|e| e.ionic)
}

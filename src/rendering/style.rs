// src/rendering/style.rs

use crate::error::{RenderError, Result};
use crate::model::elements::{element_data, get_atom_cov, get_atom_ionic_radius};
use crate::model::Structure;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// sRGB color, channels in 0..=1 as cairo expects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0 };
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0 };
    /// Fallback for unknown elements and unstyled primitives (#808080)
    pub const GRAY: Color = Color {
        r: 128.0 / 255.0,
        g: 128.0 / 255.0,
        b: 128.0 / 255.0,
    };

    pub fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
        }
    }

    pub fn mix(self, other: Color) -> Color {
        Color {
            r: (self.r + other.r) / 2.0,
            g: (self.g + other.g) / 2.0,
            b: (self.b + other.b) / 2.0,
        }
    }

    pub fn to_hex(self) -> String {
        let c = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", c(self.r), c(self.g), c(self.b))
    }
}

fn named(name: &str) -> Option<Color> {
    let (r, g, b) = match name {
        "white" => (255, 255, 255),
        "black" => (0, 0, 0),
        "gray" | "grey" => (128, 128, 128),
        "lightgray" | "lightgrey" => (211, 211, 211),
        "darkgray" | "darkgrey" => (169, 169, 169),
        "red" => (255, 0, 0),
        "green" => (0, 128, 0),
        "blue" => (0, 0, 255),
        "yellow" => (255, 255, 0),
        "orange" => (255, 165, 0),
        "purple" => (128, 0, 128),
        "cyan" => (0, 255, 255),
        "magenta" => (255, 0, 255),
        "brown" => (165, 42, 42),
        "pink" => (255, 192, 203),
        "navy" => (0, 0, 128),
        _ => return None,
    };
    Some(Color::rgb8(r, g, b))
}

impl FromStr for Color {
    type Err = RenderError;

    /// `#rgb`, `#rrggbb` or a basic color name.
    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        let bad = || RenderError::unsupported("color", s);

        let Some(hex) = lower.strip_prefix('#') else {
            return named(&lower).ok_or_else(bad);
        };
        if !hex.is_ascii() {
            return Err(bad());
        }
        let channel = |h: &str| u8::from_str_radix(h, 16).map_err(|_| bad());
        match hex.len() {
            3 => {
                let mut out = [0u8; 3];
                for (i, c) in hex.chars().enumerate() {
                    let v = c.to_digit(16).ok_or_else(bad)? as u8;
                    out[i] = v * 17;
                }
                Ok(Color::rgb8(out[0], out[1], out[2]))
            }
            6 => Ok(Color::rgb8(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            _ => Err(bad()),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = RenderError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ColorScheme {
    #[default]
    Vesta,
    Jmol,
}

impl ColorScheme {
    pub fn get_color(self, element: &str) -> Color {
        match element_data(element) {
            Some(data) => {
                let (r, g, b) = match self {
                    ColorScheme::Vesta => data.vesta,
                    ColorScheme::Jmol => data.jmol,
                };
                Color::rgb8(r, g, b)
            }
            None => {
                log::debug!("No {} color for '{}', using gray", self, element);
                Color::GRAY
            }
        }
    }
}

impl FromStr for ColorScheme {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "vesta" => Ok(ColorScheme::Vesta),
            "jmol" => Ok(ColorScheme::Jmol),
            _ => Err(RenderError::unsupported("color scheme", s)),
        }
    }
}

impl TryFrom<String> for ColorScheme {
    type Error = RenderError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ColorScheme::Vesta => "VESTA",
            ColorScheme::Jmol => "Jmol",
        })
    }
}

impl From<ColorScheme> for String {
    fn from(scheme: ColorScheme) -> Self {
        scheme.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RadiusScheme {
    Uniform,
    #[default]
    Covalent,
    Ionic,
}

impl FromStr for RadiusScheme {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "uniform" => Ok(RadiusScheme::Uniform),
            "covalent" => Ok(RadiusScheme::Covalent),
            "ionic" => Ok(RadiusScheme::Ionic),
            _ => Err(RenderError::unsupported("radius scheme", s)),
        }
    }
}

impl TryFrom<String> for RadiusScheme {
    type Error = RenderError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl fmt::Display for RadiusScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RadiusScheme::Uniform => "uniform",
            RadiusScheme::Covalent => "covalent",
            RadiusScheme::Ionic => "ionic",
        })
    }
}

impl From<RadiusScheme> for String {
    fn from(scheme: RadiusScheme) -> Self {
        scheme.to_string()
    }
}

/// Element colors, atom radii and bond appearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderStyle {
    pub colors: ColorScheme,
    pub radii: RadiusScheme,
    /// Used by the uniform scheme and when an element has no tabulated radius
    pub uniform_radius: f64,
    pub bond_radius: f64,
    /// Fixed bond color; endpoint colors are averaged when unset
    pub bond_color: Option<Color>,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            colors: ColorScheme::Vesta,
            radii: RadiusScheme::Covalent,
            uniform_radius: 0.5,
            bond_radius: 0.1,
            bond_color: None,
        }
    }
}

impl RenderStyle {
    pub fn atom_color(&self, element: &str) -> Color {
        self.colors.get_color(element)
    }

    pub fn atom_radius(&self, element: &str) -> f64 {
        let radius = match self.radii {
            RadiusScheme::Uniform => None,
            RadiusScheme::Covalent => get_atom_cov(element),
            RadiusScheme::Ionic => get_atom_ionic_radius(element),
        };
        radius.unwrap_or(self.uniform_radius)
    }

    pub fn bond_rgb(&self, elements: (&str, &str)) -> Color {
        match self.bond_color {
            Some(color) => color,
            None => self.atom_color(elements.0).mix(self.atom_color(elements.1)),
        }
    }
}

/// Color key: one swatch per element, in first-appearance order.
#[derive(Debug, Clone, PartialEq)]
pub struct Legend {
    pub entries: Vec<(String, Color)>,
}

impl Legend {
    pub fn from_structure(structure: &Structure, scheme: ColorScheme) -> Self {
        let entries = structure
            .composition()
            .into_iter()
            .map(|el| {
                let color = scheme.get_color(&el);
                (el, color)
            })
            .collect();
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

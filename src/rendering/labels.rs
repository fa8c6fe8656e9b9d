// src/rendering/labels.rs

use crate::rendering::style::Color;
use crate::utils::geometry::Point3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelOptions {
    pub show: bool,
    /// Restrict labels to these elements; all elements when `None`
    pub elements: Option<Vec<String>>,
    pub font_size: u32,
    /// Cartesian offset (Å) added to the atom before projection
    pub offset: Point3,
    pub text_color: Color,
    pub shadow: bool,
}

impl Default for LabelOptions {
    fn default() -> Self {
        Self {
            show: false,
            elements: None,
            font_size: 12,
            offset: [0.0; 3],
            text_color: Color::BLACK,
            shadow: true,
        }
    }
}

impl LabelOptions {
    pub fn should_label(&self, element: &str) -> bool {
        if !self.show {
            return false;
        }
        match &self.elements {
            None => true,
            Some(list) => list.iter().any(|e| e == element),
        }
    }
}

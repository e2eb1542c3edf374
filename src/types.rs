use geo::Geometry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type ColorIndex = u8;

/// One colorable area of a map: a country or a ward.
#[derive(Debug, Clone)]
pub struct Region {
    pub id: String,
    pub geometry: Geometry<f64>,
}

impl Region {
    pub fn new(id: impl Into<String>, geometry: impl Into<Geometry<f64>>) -> Self {
        Self {
            id: id.into(),
            geometry: geometry.into(),
        }
    }
}

/// Partial mapping from region id to palette index. A missing entry means unpainted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorAssignment(HashMap<String, ColorIndex>);

impl ColorAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn color_of(&self, id: &str) -> Option<ColorIndex> {
        self.0.get(id).copied()
    }

    pub fn paint(&mut self, id: impl Into<String>, color: ColorIndex) {
        self.0.insert(id.into(), color);
    }

    pub fn erase(&mut self, id: &str) -> Option<ColorIndex> {
        self.0.remove(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ColorIndex)> {
        self.0.iter().map(|(id, c)| (id.as_str(), *c))
    }
}

impl FromIterator<(String, ColorIndex)> for ColorAssignment {
    fn from_iter<I: IntoIterator<Item = (String, ColorIndex)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub colors: Vec<String>, // Hex codes
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: ["#FF4444", "#4488FF", "#44DD44", "#FFDD44"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}

impl Palette {
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn contains(&self, color: ColorIndex) -> bool {
        (color as usize) < self.colors.len()
    }
}

/// Two adjacent regions carrying the same color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub first: String,
    pub second: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub unpainted_count: usize,
    // Outer index ascending, then inner index ascending.
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// True when every region is painted and no violation was found.
    pub fn is_complete_coloring(&self) -> bool {
        self.unpainted_count == 0 && self.is_valid()
    }
}

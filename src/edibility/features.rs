//! Categorical mushroom attributes used by the edibility rules.
//!
//! Every attribute has a fixed alphabet of single-character codes (the
//! encoding used by the UCI mushroom dataset) and a human-readable label.
//! Parsing accepts either form, case-insensitively.

use crate::error::{LabError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Shared behaviour of the six categorical attributes.
pub trait CategoricalFeature: Sized + Copy + 'static {
    /// Attribute name as used in error messages and requests
    const NAME: &'static str;

    /// Every value of the alphabet, in display order
    fn all() -> &'static [Self];

    /// Single-character dataset code
    fn code(self) -> char;

    /// Human-readable label
    fn label(self) -> &'static str;

    /// Extra spellings accepted by the parser besides code and label
    fn aliases(self) -> &'static [&'static str] {
        &[]
    }
}

/// Resolve a token against an attribute alphabet.
///
/// Single-character tokens are matched against codes first, everything else
/// against labels and aliases.
pub fn parse_token<T: CategoricalFeature>(token: &str) -> Result<T> {
    let trimmed = token.trim();
    let lower = trimmed.to_ascii_lowercase();

    let mut chars = lower.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if let Some(value) = T::all().iter().copied().find(|v| v.code() == c) {
            return Ok(value);
        }
    }

    T::all()
        .iter()
        .copied()
        .find(|v| {
            v.label().eq_ignore_ascii_case(&lower)
                || v.aliases().iter().any(|a| a.eq_ignore_ascii_case(&lower))
        })
        .ok_or_else(|| {
            LabError::InvalidInput(format!(
                "unknown {} value '{}' (expected one of: {})",
                T::NAME,
                trimmed,
                T::all()
                    .iter()
                    .map(|v| format!("{}={}", v.label(), v.code()))
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })
}

/// Odor of the mushroom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Odor {
    Almond,
    Anise,
    Creosote,
    Fishy,
    Foul,
    Musty,
    None,
    Pungent,
    Spicy,
}

impl CategoricalFeature for Odor {
    const NAME: &'static str = "odor";

    fn all() -> &'static [Self] {
        &[
            Odor::Almond,
            Odor::Anise,
            Odor::Creosote,
            Odor::Fishy,
            Odor::Foul,
            Odor::Musty,
            Odor::None,
            Odor::Pungent,
            Odor::Spicy,
        ]
    }

    fn code(self) -> char {
        match self {
            Odor::Almond => 'a',
            Odor::Anise => 'l',
            Odor::Creosote => 'c',
            Odor::Fishy => 'y',
            Odor::Foul => 'f',
            Odor::Musty => 'm',
            Odor::None => 'n',
            Odor::Pungent => 'p',
            Odor::Spicy => 's',
        }
    }

    fn label(self) -> &'static str {
        match self {
            Odor::Almond => "Almond",
            Odor::Anise => "Anise",
            Odor::Creosote => "Creosote",
            Odor::Fishy => "Fishy",
            Odor::Foul => "Foul",
            Odor::Musty => "Musty",
            Odor::None => "None",
            Odor::Pungent => "Pungent",
            Odor::Spicy => "Spicy",
        }
    }
}

/// Whether the mushroom bruises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bruises {
    Yes,
    No,
}

impl CategoricalFeature for Bruises {
    const NAME: &'static str = "bruises";

    fn all() -> &'static [Self] {
        &[Bruises::Yes, Bruises::No]
    }

    fn code(self) -> char {
        match self {
            Bruises::Yes => 't',
            Bruises::No => 'f',
        }
    }

    fn label(self) -> &'static str {
        match self {
            Bruises::Yes => "Yes",
            Bruises::No => "No",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            Bruises::Yes => &["bruises", "true"],
            Bruises::No => &["no bruises", "false"],
        }
    }
}

/// Gill color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GillColor {
    Black,
    Brown,
    Buff,
    Chocolate,
    Gray,
    Green,
    Orange,
    Pink,
    Purple,
    Red,
    White,
    Yellow,
}

impl CategoricalFeature for GillColor {
    const NAME: &'static str = "gill_color";

    fn all() -> &'static [Self] {
        &[
            GillColor::Black,
            GillColor::Brown,
            GillColor::Buff,
            GillColor::Chocolate,
            GillColor::Gray,
            GillColor::Green,
            GillColor::Orange,
            GillColor::Pink,
            GillColor::Purple,
            GillColor::Red,
            GillColor::White,
            GillColor::Yellow,
        ]
    }

    fn code(self) -> char {
        match self {
            GillColor::Black => 'k',
            GillColor::Brown => 'n',
            GillColor::Buff => 'b',
            GillColor::Chocolate => 'h',
            GillColor::Gray => 'g',
            GillColor::Green => 'r',
            GillColor::Orange => 'o',
            GillColor::Pink => 'p',
            GillColor::Purple => 'u',
            GillColor::Red => 'e',
            GillColor::White => 'w',
            GillColor::Yellow => 'y',
        }
    }

    fn label(self) -> &'static str {
        match self {
            GillColor::Black => "Black",
            GillColor::Brown => "Brown",
            GillColor::Buff => "Buff",
            GillColor::Chocolate => "Chocolate",
            GillColor::Gray => "Gray",
            GillColor::Green => "Green",
            GillColor::Orange => "Orange",
            GillColor::Pink => "Pink",
            GillColor::Purple => "Purple",
            GillColor::Red => "Red",
            GillColor::White => "White",
            GillColor::Yellow => "Yellow",
        }
    }
}

/// Cap shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapShape {
    Bell,
    Conical,
    Flat,
    Knobbed,
    Sunken,
    Convex,
}

impl CategoricalFeature for CapShape {
    const NAME: &'static str = "cap_shape";

    fn all() -> &'static [Self] {
        &[
            CapShape::Bell,
            CapShape::Conical,
            CapShape::Flat,
            CapShape::Knobbed,
            CapShape::Sunken,
            CapShape::Convex,
        ]
    }

    fn code(self) -> char {
        match self {
            CapShape::Bell => 'b',
            CapShape::Conical => 'c',
            CapShape::Flat => 'f',
            CapShape::Knobbed => 'k',
            CapShape::Sunken => 's',
            CapShape::Convex => 'x',
        }
    }

    fn label(self) -> &'static str {
        match self {
            CapShape::Bell => "Bell",
            CapShape::Conical => "Conical",
            CapShape::Flat => "Flat",
            CapShape::Knobbed => "Knobbed",
            CapShape::Sunken => "Sunken",
            CapShape::Convex => "Convex",
        }
    }
}

/// Cap surface texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapSurface {
    Fibrous,
    Grooves,
    Smooth,
    Scaly,
}

impl CategoricalFeature for CapSurface {
    const NAME: &'static str = "cap_surface";

    fn all() -> &'static [Self] {
        &[
            CapSurface::Fibrous,
            CapSurface::Grooves,
            CapSurface::Smooth,
            CapSurface::Scaly,
        ]
    }

    fn code(self) -> char {
        match self {
            CapSurface::Fibrous => 'f',
            CapSurface::Grooves => 'g',
            CapSurface::Smooth => 's',
            CapSurface::Scaly => 'y',
        }
    }

    fn label(self) -> &'static str {
        match self {
            CapSurface::Fibrous => "Fibrous",
            CapSurface::Grooves => "Grooves",
            CapSurface::Smooth => "Smooth",
            CapSurface::Scaly => "Scaly",
        }
    }
}

/// Cap color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapColor {
    Brown,
    Buff,
    Cinnamon,
    Gray,
    Green,
    Pink,
    Purple,
    Red,
    White,
    Yellow,
}

impl CategoricalFeature for CapColor {
    const NAME: &'static str = "cap_color";

    fn all() -> &'static [Self] {
        &[
            CapColor::Brown,
            CapColor::Buff,
            CapColor::Cinnamon,
            CapColor::Gray,
            CapColor::Green,
            CapColor::Pink,
            CapColor::Purple,
            CapColor::Red,
            CapColor::White,
            CapColor::Yellow,
        ]
    }

    fn code(self) -> char {
        match self {
            CapColor::Brown => 'n',
            CapColor::Buff => 'b',
            CapColor::Cinnamon => 'c',
            CapColor::Gray => 'g',
            CapColor::Green => 'r',
            CapColor::Pink => 'p',
            CapColor::Purple => 'u',
            CapColor::Red => 'e',
            CapColor::White => 'w',
            CapColor::Yellow => 'y',
        }
    }

    fn label(self) -> &'static str {
        match self {
            CapColor::Brown => "Brown",
            CapColor::Buff => "Buff",
            CapColor::Cinnamon => "Cinnamon",
            CapColor::Gray => "Gray",
            CapColor::Green => "Green",
            CapColor::Pink => "Pink",
            CapColor::Purple => "Purple",
            CapColor::Red => "Red",
            CapColor::White => "White",
            CapColor::Yellow => "Yellow",
        }
    }
}

impl FromStr for Odor {
    type Err = LabError;
    fn from_str(s: &str) -> Result<Self> {
        parse_token(s)
    }
}

impl FromStr for Bruises {
    type Err = LabError;
    fn from_str(s: &str) -> Result<Self> {
        parse_token(s)
    }
}

impl FromStr for GillColor {
    type Err = LabError;
    fn from_str(s: &str) -> Result<Self> {
        parse_token(s)
    }
}

impl FromStr for CapShape {
    type Err = LabError;
    fn from_str(s: &str) -> Result<Self> {
        parse_token(s)
    }
}

impl FromStr for CapSurface {
    type Err = LabError;
    fn from_str(s: &str) -> Result<Self> {
        parse_token(s)
    }
}

impl FromStr for CapColor {
    type Err = LabError;
    fn from_str(s: &str) -> Result<Self> {
        parse_token(s)
    }
}

/// The six attributes the decision list looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MushroomFeatureSet {
    pub odor: Odor,
    pub bruises: Bruises,
    pub gill_color: GillColor,
    pub cap_shape: CapShape,
    pub cap_surface: CapSurface,
    pub cap_color: CapColor,
}

impl MushroomFeatureSet {
    pub fn new(
        odor: Odor,
        bruises: Bruises,
        gill_color: GillColor,
        cap_shape: CapShape,
        cap_surface: CapSurface,
        cap_color: CapColor,
    ) -> Self {
        Self {
            odor,
            bruises,
            gill_color,
            cap_shape,
            cap_surface,
            cap_color,
        }
    }

    /// Build a feature set from six raw tokens (codes or labels).
    pub fn from_tokens(
        odor: &str,
        bruises: &str,
        gill_color: &str,
        cap_shape: &str,
        cap_surface: &str,
        cap_color: &str,
    ) -> Result<Self> {
        Ok(Self {
            odor: odor.parse()?,
            bruises: bruises.parse()?,
            gill_color: gill_color.parse()?,
            cap_shape: cap_shape.parse()?,
            cap_surface: cap_surface.parse()?,
            cap_color: cap_color.parse()?,
        })
    }

    /// Dataset codes in attribute order
    pub fn codes(&self) -> [char; 6] {
        [
            self.odor.code(),
            self.bruises.code(),
            self.gill_color.code(),
            self.cap_shape.code(),
            self.cap_surface.code(),
            self.cap_color.code(),
        ]
    }
}

impl fmt::Display for MushroomFeatureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "odor={} bruises={} gill_color={} cap_shape={} cap_surface={} cap_color={}",
            self.odor.label(),
            self.bruises.label(),
            self.gill_color.label(),
            self.cap_shape.label(),
            self.cap_surface.label(),
            self.cap_color.label(),
        )
    }
}

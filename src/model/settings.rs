//! Modification settings consumed by `apply`.
//!
//! Every field is optional; an absent field leaves the corresponding
//! document property untouched.

use crate::error::{Error, Result};
use crate::units::inches_to_twips_checked;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Smallest accepted font size, in points.
pub const MIN_FONT_SIZE: f64 = 6.0;
/// Largest accepted font size, in points.
pub const MAX_FONT_SIZE: f64 = 72.0;
/// Smallest accepted line-spacing multiplier.
pub const MIN_LINE_SPACING: f64 = 0.5;
/// Largest accepted line-spacing multiplier.
pub const MAX_LINE_SPACING: f64 = 5.0;

/// How close, in inches, a page must be to a preset to be reported as it.
const PRESET_TOLERANCE: f64 = 0.1;

/// Partial set of document changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModificationSettings {
    /// New page size for every section
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<PageSize>,

    /// Margins to change; absent sides are kept
    #[serde(default, skip_serializing_if = "MarginSettings::is_empty")]
    pub margins: MarginSettings,

    /// Document-wide font override
    #[serde(default, skip_serializing_if = "FontSettings::is_empty")]
    pub font: FontSettings,

    /// Line spacing multiplier (1.0 = single)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_spacing: Option<f64>,
}

impl ModificationSettings {
    /// Create empty settings (a no-op modification).
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse settings from their JSON form.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidSettings(e.to_string()))
    }

    /// Set the page size in inches.
    pub fn with_page_size(mut self, width: f64, height: f64) -> Self {
        self.page_size = Some(PageSize { width, height });
        self
    }

    /// Set the page size to a named paper size.
    pub fn with_page_preset(self, preset: PagePreset) -> Self {
        let size = preset.dimensions();
        self.with_page_size(size.width, size.height)
    }

    /// Set one margin in inches.
    pub fn with_margin(mut self, side: MarginSide, inches: f64) -> Self {
        self.margins.set(side, inches);
        self
    }

    /// Set the font family.
    pub fn with_font_family(mut self, family: impl Into<String>) -> Self {
        self.font.family = Some(family.into());
        self
    }

    /// Set the font size in points.
    pub fn with_font_size(mut self, points: f64) -> Self {
        self.font.size = Some(points);
        self
    }

    /// Set the line spacing multiplier.
    pub fn with_line_spacing(mut self, multiplier: f64) -> Self {
        self.line_spacing = Some(multiplier);
        self
    }

    /// Overlay every field present in `other` on top of `self`.
    pub fn merge(mut self, other: ModificationSettings) -> Self {
        if other.page_size.is_some() {
            self.page_size = other.page_size;
        }
        for side in MarginSide::ALL {
            if let Some(value) = other.margins.get(side) {
                self.margins.set(side, value);
            }
        }
        if other.font.family.is_some() {
            self.font.family = other.font.family;
        }
        if other.font.size.is_some() {
            self.font.size = other.font.size;
        }
        if other.line_spacing.is_some() {
            self.line_spacing = other.line_spacing;
        }
        self
    }

    /// Whether no change is requested at all.
    pub fn is_empty(&self) -> bool {
        self.page_size.is_none()
            && self.margins.is_empty()
            && self.font.is_empty()
            && self.line_spacing.is_none()
    }

    /// Whether page size or any margin is requested.
    pub fn touches_layout(&self) -> bool {
        self.page_size.is_some() || !self.margins.is_empty()
    }

    /// Check every present value against its allowed range.
    pub fn validate(&self) -> Result<()> {
        if let Some(size) = self.page_size {
            require_length("page width", size.width)?;
            require_length("page height", size.height)?;
        }
        for (side, value) in self.margins.iter() {
            require_length(side.name(), value)?;
        }
        if let Some(family) = &self.font.family {
            if family.trim().is_empty() {
                return Err(Error::InvalidSettings(
                    "font family must not be empty".to_string(),
                ));
            }
        }
        if let Some(size) = self.font.size {
            require_range("font size", size, MIN_FONT_SIZE, MAX_FONT_SIZE)?;
        }
        if let Some(spacing) = self.line_spacing {
            require_range("line spacing", spacing, MIN_LINE_SPACING, MAX_LINE_SPACING)?;
        }
        Ok(())
    }
}

/// A length in inches must be positive and representable as 32-bit twips.
fn require_length(what: &str, value: f64) -> Result<()> {
    if !(value.is_finite() && value > 0.0) {
        return Err(Error::InvalidSettings(format!(
            "{what} must be a positive number, got {value}"
        )));
    }
    if inches_to_twips_checked(value).is_none() {
        return Err(Error::InvalidSettings(format!(
            "{what} of {value} inches is too large"
        )));
    }
    Ok(())
}

fn require_range(what: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidSettings(format!(
            "{what} must be between {min} and {max}, got {value}"
        )))
    }
}

/// Page size in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

/// Named paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PagePreset {
    A4,
    Letter,
    Legal,
}

impl PagePreset {
    pub const ALL: [PagePreset; 3] = [PagePreset::A4, PagePreset::Letter, PagePreset::Legal];

    pub fn name(self) -> &'static str {
        match self {
            PagePreset::A4 => "A4",
            PagePreset::Letter => "Letter",
            PagePreset::Legal => "Legal",
        }
    }

    /// Width and height in inches.
    pub fn dimensions(self) -> PageSize {
        let (width, height) = match self {
            PagePreset::A4 => (8.27, 11.69),
            PagePreset::Letter => (8.5, 11.0),
            PagePreset::Legal => (8.5, 14.0),
        };
        PageSize { width, height }
    }

    /// Preset within 0.1 inch of `width` x `height` on both sides.
    ///
    /// Only portrait orientation is matched.
    pub fn detect(width: f64, height: f64) -> Option<Self> {
        Self::ALL.into_iter().find(|preset| {
            let size = preset.dimensions();
            (width - size.width).abs() < PRESET_TOLERANCE
                && (height - size.height).abs() < PRESET_TOLERANCE
        })
    }
}

impl fmt::Display for PagePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Common line-spacing multipliers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineSpacingPreset {
    Single,
    Relaxed,
    OneAndHalf,
    Double,
}

impl LineSpacingPreset {
    pub const ALL: [LineSpacingPreset; 4] = [
        LineSpacingPreset::Single,
        LineSpacingPreset::Relaxed,
        LineSpacingPreset::OneAndHalf,
        LineSpacingPreset::Double,
    ];

    pub fn multiplier(self) -> f64 {
        match self {
            LineSpacingPreset::Single => 1.0,
            LineSpacingPreset::Relaxed => 1.15,
            LineSpacingPreset::OneAndHalf => 1.5,
            LineSpacingPreset::Double => 2.0,
        }
    }

    /// Name as typed on the command line.
    pub fn name(self) -> &'static str {
        match self {
            LineSpacingPreset::Single => "single",
            LineSpacingPreset::Relaxed => "1.15",
            LineSpacingPreset::OneAndHalf => "1.5",
            LineSpacingPreset::Double => "double",
        }
    }

    /// Look up a preset by name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|preset| preset.name().eq_ignore_ascii_case(name))
    }
}

/// One side of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarginSide {
    Top,
    Bottom,
    Left,
    Right,
}

impl MarginSide {
    pub const ALL: [MarginSide; 4] = [
        MarginSide::Top,
        MarginSide::Bottom,
        MarginSide::Left,
        MarginSide::Right,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MarginSide::Top => "top margin",
            MarginSide::Bottom => "bottom margin",
            MarginSide::Left => "left margin",
            MarginSide::Right => "right margin",
        }
    }
}

/// Requested margins in inches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarginSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<f64>,
}

impl MarginSettings {
    pub fn get(&self, side: MarginSide) -> Option<f64> {
        match side {
            MarginSide::Top => self.top,
            MarginSide::Bottom => self.bottom,
            MarginSide::Left => self.left,
            MarginSide::Right => self.right,
        }
    }

    pub fn set(&mut self, side: MarginSide, inches: f64) {
        let slot = match side {
            MarginSide::Top => &mut self.top,
            MarginSide::Bottom => &mut self.bottom,
            MarginSide::Left => &mut self.left,
            MarginSide::Right => &mut self.right,
        };
        *slot = Some(inches);
    }

    /// Present sides with their values, in top/bottom/left/right order.
    pub fn iter(&self) -> impl Iterator<Item = (MarginSide, f64)> + '_ {
        MarginSide::ALL
            .into_iter()
            .filter_map(|side| self.get(side).map(|value| (side, value)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

/// Requested font override.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FontSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,

    /// Size in points
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
}

impl FontSettings {
    pub fn is_empty(&self) -> bool {
        self.family.is_none() && self.size.is_none()
    }
}

//! Unit conversions shared by both format adapters.
//!
//! Both formats store lengths as twips (1/1440 inch). Font sizes are stored
//! as half-points and line spacing as 240ths of a line.

pub const TWIPS_PER_INCH: f64 = 1440.0;
pub const HALF_POINTS_PER_POINT: f64 = 2.0;
pub const LINE_UNITS_PER_LINE: f64 = 240.0;

/// US Letter width in inches.
pub const LETTER_WIDTH_IN: f64 = 8.5;
/// US Letter height in inches.
pub const LETTER_HEIGHT_IN: f64 = 11.0;
/// Default margin on every side, in inches.
pub const DEFAULT_MARGIN_IN: f64 = 1.0;

#[inline]
pub fn inches_to_twips(inches: f64) -> i64 {
    (inches * TWIPS_PER_INCH).round() as i64
}

/// Convert inches to twips, or `None` when the result does not fit the
/// 32-bit range both formats store.
pub fn inches_to_twips_checked(inches: f64) -> Option<i64> {
    let twips = (inches * TWIPS_PER_INCH).round();
    if twips.is_finite() && twips >= f64::from(i32::MIN) && twips <= f64::from(i32::MAX) {
        Some(twips as i64)
    } else {
        None
    }
}

#[inline]
pub fn twips_to_inches(twips: i64) -> f64 {
    twips as f64 / TWIPS_PER_INCH
}

#[inline]
pub fn points_to_half_points(points: f64) -> i64 {
    (points * HALF_POINTS_PER_POINT).round() as i64
}

/// Convert a line-spacing multiplier (1.0 = single) to 240ths of a line.
#[inline]
pub fn multiplier_to_line_units(multiplier: f64) -> i64 {
    (multiplier * LINE_UNITS_PER_LINE).round() as i64
}

/// Parse a twip measurement as written in package XML.
///
/// Word occasionally writes fractional or unit-suffixed values
/// (`"1440.0"`, `"1in"`); both are accepted.
pub fn parse_twips(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(v) = value.parse::<i64>() {
        return Some(v);
    }
    if let Ok(v) = value.parse::<f64>() {
        return Some(v.round() as i64);
    }

    let (number, factor) = if let Some(n) = value.strip_suffix("in") {
        (n, TWIPS_PER_INCH)
    } else if let Some(n) = value.strip_suffix("pt") {
        (n, 20.0)
    } else if let Some(n) = value.strip_suffix("cm") {
        (n, TWIPS_PER_INCH / 2.54)
    } else if let Some(n) = value.strip_suffix("mm") {
        (n, TWIPS_PER_INCH / 25.4)
    } else {
        return None;
    };
    number
        .trim()
        .parse::<f64>()
        .ok()
        .map(|n| (n * factor).round() as i64)
}

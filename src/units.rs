//! Length and size conversions shared by every pipeline stage.
//!
//! OOXML measures in twips (1/20 pt), half-points, eighth-points and EMU;
//! the editor side speaks CSS lengths.

use lazy_static::lazy_static;
use regex::Regex;

pub const TWIPS_PER_PT: f64 = 20.0;
pub const TWIPS_PER_CM: f64 = 567.0;
pub const EMU_PER_PX: i64 = 9525;
pub const EMU_PER_PT: f64 = 12700.0;
pub const PT_PER_PX: f64 = 0.75;

lazy_static! {
    static ref LENGTH: Regex =
        Regex::new(r"^\s*(-?\d+(?:\.\d+)?|-?\.\d+)\s*([a-zA-Z%]*)\s*$").unwrap();
    static ref LEADING_NUMBER: Regex = Regex::new(r"-?\d+(?:\.\d+)?").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Unit {
    Px,
    Pt,
    Cm,
    Mm,
    In,
    Em,
    Percent,
    /// No unit given.
    Bare,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length {
    pub value: f64,
    pub unit: Unit,
}

impl Length {
    pub fn parse(s: &str) -> Option<Length> {
        let caps = LENGTH.captures(s)?;
        let value: f64 = caps.get(1)?.as_str().parse().ok()?;
        let unit = match caps.get(2).map(|m| m.as_str().to_ascii_lowercase()).as_deref() {
            Some("") | None => Unit::Bare,
            Some("px") => Unit::Px,
            Some("pt") => Unit::Pt,
            Some("cm") => Unit::Cm,
            Some("mm") => Unit::Mm,
            Some("in") => Unit::In,
            Some("em") | Some("rem") => Unit::Em,
            Some("%") => Unit::Percent,
            Some(_) => return None,
        };
        Some(Length { value, unit })
    }

    /// Points, treating bare numbers as points. Percentages have no absolute size.
    pub fn to_pt(self) -> Option<f64> {
        let pt = match self.unit {
            Unit::Px => self.value * PT_PER_PX,
            Unit::Pt | Unit::Bare => self.value,
            Unit::Cm => self.value * 28.3465,
            Unit::Mm => self.value * 2.83465,
            Unit::In => self.value * 72.0,
            Unit::Em => self.value * 12.0,
            Unit::Percent => return None,
        };
        Some(pt)
    }
}

/// CSS length to points; `auto`, percentages and garbage yield `None`.
pub fn length_to_pt(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("auto") {
        return None;
    }
    Length::parse(s)?.to_pt()
}

/// Font sizes: `px` converts, anything else numeric is already points.
pub fn font_size_to_pt(s: &str) -> Option<f64> {
    let len = Length::parse(s)?;
    match len.unit {
        Unit::Px => Some(len.value * PT_PER_PX),
        Unit::Percent => None,
        _ => len.to_pt(),
    }
}

/// First number found anywhere in the string (`"14px"` → 14, `"width: 3.5em"` → 3.5).
pub fn leading_number(s: &str) -> Option<f64> {
    LEADING_NUMBER.find(s)?.as_str().parse().ok()
}

pub fn pt_to_twips(pt: f64) -> i64 {
    (pt * TWIPS_PER_PT).round() as i64
}

pub fn twips_to_pt(twips: f64) -> f64 {
    twips / TWIPS_PER_PT
}

pub fn cm_to_twips(cm: f64) -> i64 {
    (cm * TWIPS_PER_CM).round() as i64
}

pub fn twips_to_cm(twips: f64) -> f64 {
    twips / TWIPS_PER_CM
}

pub fn px_to_twips(px: f64) -> i64 {
    pt_to_twips(px * PT_PER_PX)
}

pub fn px_to_emu(px: f64) -> i64 {
    (px * EMU_PER_PX as f64).round() as i64
}

pub fn emu_to_px(emu: i64) -> i64 {
    ((emu as f64) / EMU_PER_PX as f64).round() as i64
}

pub fn emu_to_pt(emu: i64) -> f64 {
    emu as f64 / EMU_PER_PT
}

/// Run sizes in WordprocessingML are half-points.
pub fn pt_to_half_points(pt: f64) -> i64 {
    (pt * 2.0).round() as i64
}

pub fn half_points_to_pt(hp: f64) -> f64 {
    hp / 2.0
}

/// Border widths are eighths of a point.
pub fn eighth_points_to_pt(v: f64) -> f64 {
    v / 8.0
}

pub fn pt_to_eighth_points(pt: f64) -> i64 {
    (pt * 8.0).round() as i64
}

/// `12.0` → `"12"`, `10.5` → `"10.5"`.
pub fn format_number(v: f64) -> String {
    let rounded = (v * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        let s = format!("{:.2}", rounded);
        s.trim_end_matches('0').to_string()
    }
}

pub fn format_pt(v: f64) -> String {
    format!("{}pt", format_number(v))
}

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// WCAG AA threshold for normal text.
pub const WCAG_AA: f64 = 4.5;
/// WCAG AAA threshold for normal text.
pub const WCAG_AAA: f64 = 7.0;

/// Document-level color palette. Colors are free-form strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreground: Option<String>,
}

/// Contrast of one color pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContrastCheck {
    pub foreground: String,
    pub background: String,
    pub ratio: f64,
}

impl ContrastCheck {
    pub fn passes_aa(&self) -> bool {
        passes_wcag_aa(self.ratio)
    }

    pub fn passes_aaa(&self) -> bool {
        passes_wcag_aaa(self.ratio)
    }
}

impl Palette {
    /// Create a new empty palette
    pub fn new() -> Self {
        Self::default()
    }

    /// Foreground-on-background contrast, when both colors are set.
    pub fn text_contrast(&self) -> Option<ContrastCheck> {
        let fg = self.foreground.as_ref()?;
        let bg = self.background.as_ref()?;
        Some(ContrastCheck {
            foreground: fg.clone(),
            background: bg.clone(),
            ratio: contrast_ratio(fg, bg),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_none()
            && self.secondary.is_none()
            && self.background.is_none()
            && self.foreground.is_none()
    }
}

/// Parse `#rrggbb` (leading `#` optional) into RGB components.
pub fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    static HEX_COLOR_REGEX: OnceLock<Regex> = OnceLock::new();
    let re = HEX_COLOR_REGEX.get_or_init(|| {
        Regex::new(r"^#?([0-9a-fA-F]{2})([0-9a-fA-F]{2})([0-9a-fA-F]{2})$").unwrap()
    });
    let caps = re.captures(color.trim())?;
    let channel = |i: usize| u8::from_str_radix(&caps[i], 16).ok();
    Some((channel(1)?, channel(2)?, channel(3)?))
}

/// Relative luminance per WCAG 2.x.
pub fn relative_luminance(r: u8, g: u8, b: u8) -> f64 {
    let lin = |c: u8| {
        let c = c as f64 / 255.0;
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    0.2126 * lin(r) + 0.7152 * lin(g) + 0.0722 * lin(b)
}

/// Contrast ratio between two hex colors. Unparseable colors yield 1.0.
pub fn contrast_ratio(a: &str, b: &str) -> f64 {
    let (Some(ca), Some(cb)) = (parse_hex_color(a), parse_hex_color(b)) else {
        return 1.0;
    };
    let la = relative_luminance(ca.0, ca.1, ca.2);
    let lb = relative_luminance(cb.0, cb.1, cb.2);
    let (hi, lo) = if la >= lb { (la, lb) } else { (lb, la) };
    (hi + 0.05) / (lo + 0.05)
}

pub fn passes_wcag_aa(ratio: f64) -> bool {
    ratio >= WCAG_AA
}

pub fn passes_wcag_aaa(ratio: f64) -> bool {
    ratio >= WCAG_AAA
}

//! Color resolution - turns a color specification into a reusable fill prefix.
//!
//! The render pass builds one fill-style string per painted cell, so the
//! expensive part (parsing the configured color) happens once at attach
//! time. The result is a `"rgba(r,g,b,"` prefix; the hot path only appends
//! the per-cell alpha and the closing paren.
//!
//! Resolution accepts hex (`#RGB`, `#RRGGBB`, `#RRGGBBAA`), functional
//! notation (`rgb(...)`, `rgba(...)`) and a small set of named colors.
//! An unresolvable specification falls back to opaque black; the engine
//! never surfaces a color error to the caller.

use log::warn;

// =============================================================================
// RgbaPrefix
// =============================================================================

/// A resolved color, stored as the reusable `"rgba(r,g,b,"` prefix.
///
/// # Example
///
/// ```
/// use flicker_grid::color::RgbaPrefix;
///
/// let teal = RgbaPrefix::new(0, 128, 128);
/// assert_eq!(teal.fill(0.5), "rgba(0,128,128,0.5)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaPrefix {
    prefix: String,
}

impl RgbaPrefix {
    /// Build a prefix from 8-bit channels.
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self {
            prefix: format!("rgba({r},{g},{b},"),
        }
    }

    /// The opaque-black fallback used when resolution fails.
    pub fn fallback() -> Self {
        Self::new(0, 0, 0)
    }

    /// Complete the prefix into a full fill-style string.
    #[inline]
    pub fn fill(&self, alpha: f32) -> String {
        format!("{}{})", self.prefix, alpha)
    }

    /// The raw `"rgba(r,g,b,"` prefix.
    pub fn as_prefix(&self) -> &str {
        &self.prefix
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Resolve a color specification into an [`RgbaPrefix`].
///
/// Returns `None` for specifications that cannot be parsed.
pub fn resolve(spec: &str) -> Option<RgbaPrefix> {
    let spec = spec.trim();
    if spec.is_empty() {
        return None;
    }
    if spec.starts_with('#') {
        return parse_hex(spec);
    }
    let lower = spec.to_ascii_lowercase();
    if lower.starts_with("rgb(") || lower.starts_with("rgba(") {
        return parse_functional(&lower);
    }
    named(&lower).or_else(|| parse_hex(spec))
}

/// Resolve a color specification, falling back to opaque black on failure.
///
/// The fallback is logged but never reported to the caller; a bad color
/// spec degrades the effect to black flicker, it does not break it.
pub fn resolve_or_fallback(spec: &str) -> RgbaPrefix {
    match resolve(spec) {
        Some(prefix) => prefix,
        None => {
            warn!("unresolvable color spec {spec:?}, using opaque black");
            RgbaPrefix::fallback()
        }
    }
}

/// Parse hex notation: `#RGB`, `#RRGGBB`, `#RRGGBBAA` (leading `#` optional).
///
/// Alpha digits are accepted and ignored; the engine owns per-cell alpha.
fn parse_hex(hex: &str) -> Option<RgbaPrefix> {
    let hex = hex.trim().trim_start_matches('#');

    fn hex_digit(c: u8) -> Option<u8> {
        match c {
            b'0'..=b'9' => Some(c - b'0'),
            b'a'..=b'f' => Some(c - b'a' + 10),
            b'A'..=b'F' => Some(c - b'A' + 10),
            _ => None,
        }
    }

    fn hex_byte(s: &[u8], i: usize) -> Option<u8> {
        let high = hex_digit(s[i])?;
        let low = hex_digit(s[i + 1])?;
        Some((high << 4) | low)
    }

    let bytes = hex.as_bytes();
    match bytes.len() {
        // #RGB -> expand each digit
        3 => {
            let r = hex_digit(bytes[0])?;
            let g = hex_digit(bytes[1])?;
            let b = hex_digit(bytes[2])?;
            Some(RgbaPrefix::new((r << 4) | r, (g << 4) | g, (b << 4) | b))
        }
        6 => Some(RgbaPrefix::new(
            hex_byte(bytes, 0)?,
            hex_byte(bytes, 2)?,
            hex_byte(bytes, 4)?,
        )),
        8 => {
            // Alpha byte is validated but dropped.
            hex_byte(bytes, 6)?;
            Some(RgbaPrefix::new(
                hex_byte(bytes, 0)?,
                hex_byte(bytes, 2)?,
                hex_byte(bytes, 4)?,
            ))
        }
        _ => None,
    }
}

/// Parse functional notation: `rgb(r, g, b)` or `rgba(r, g, b, a)`.
///
/// Expects a lowercased input. The alpha component, when present, is
/// validated and ignored.
fn parse_functional(spec: &str) -> Option<RgbaPrefix> {
    let content = spec
        .strip_prefix("rgba(")
        .or_else(|| spec.strip_prefix("rgb("))?
        .strip_suffix(')')?;

    let parts: Vec<&str> = content.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }

    let channel = |s: &str| -> Option<u8> {
        let v = s.parse::<f32>().ok()?;
        if !(0.0..=255.0).contains(&v) {
            return None;
        }
        Some(v.round() as u8)
    };

    let r = channel(parts[0])?;
    let g = channel(parts[1])?;
    let b = channel(parts[2])?;
    if let Some(alpha) = parts.get(3) {
        let a = alpha.parse::<f32>().ok()?;
        if !(0.0..=1.0).contains(&a) {
            return None;
        }
    }
    Some(RgbaPrefix::new(r, g, b))
}

/// Named colors. Expects a lowercased input.
fn named(name: &str) -> Option<RgbaPrefix> {
    let (r, g, b) = match name {
        "black" => (0, 0, 0),
        "white" => (255, 255, 255),
        "red" => (255, 0, 0),
        "green" => (0, 255, 0),
        "blue" => (0, 0, 255),
        "yellow" => (255, 255, 0),
        "cyan" => (0, 255, 255),
        "magenta" => (255, 0, 255),
        "gray" | "grey" => (128, 128, 128),
        "orange" => (255, 165, 0),
        "purple" => (128, 0, 128),
        _ => return None,
    };
    Some(RgbaPrefix::new(r, g, b))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_appends_alpha() {
        let prefix = RgbaPrefix::new(10, 20, 30);
        assert_eq!(prefix.fill(0.25), "rgba(10,20,30,0.25)");
        assert_eq!(prefix.as_prefix(), "rgba(10,20,30,");
    }

    #[test]
    fn test_hex_full() {
        assert_eq!(resolve("#ff0000"), Some(RgbaPrefix::new(255, 0, 0)));
        assert_eq!(resolve("00ff00"), Some(RgbaPrefix::new(0, 255, 0)));
    }

    #[test]
    fn test_hex_shorthand_expands() {
        assert_eq!(resolve("#fff"), Some(RgbaPrefix::new(255, 255, 255)));
        assert_eq!(resolve("#a3c"), Some(RgbaPrefix::new(0xaa, 0x33, 0xcc)));
    }

    #[test]
    fn test_hex_alpha_ignored() {
        assert_eq!(resolve("#ff000080"), Some(RgbaPrefix::new(255, 0, 0)));
        // Invalid alpha digits still fail the parse
        assert_eq!(resolve("#ff0000gg"), None);
    }

    #[test]
    fn test_functional() {
        assert_eq!(resolve("rgb(1, 2, 3)"), Some(RgbaPrefix::new(1, 2, 3)));
        assert_eq!(
            resolve("RGBA(255, 128, 0, 0.5)"),
            Some(RgbaPrefix::new(255, 128, 0))
        );
        assert_eq!(resolve("rgb(300, 0, 0)"), None);
        assert_eq!(resolve("rgba(0, 0, 0, 2.0)"), None);
    }

    #[test]
    fn test_named() {
        assert_eq!(resolve("teal"), None);
        assert_eq!(resolve("Cyan"), Some(RgbaPrefix::new(0, 255, 255)));
        assert_eq!(resolve("grey"), resolve("gray"));
    }

    #[test]
    fn test_fallback_is_opaque_black() {
        assert_eq!(resolve_or_fallback("not-a-color"), RgbaPrefix::new(0, 0, 0));
        assert_eq!(resolve_or_fallback(""), RgbaPrefix::fallback());
    }
}

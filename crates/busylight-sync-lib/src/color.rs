//! RGB color value, parsing and formatting.

use std::fmt;
use std::str::FromStr;

/// A solid LED color, one byte per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    /// All channels dark.
    pub const OFF: Color = Color::new(0, 0, 0);
    pub const RED: Color = Color::new(0xFF, 0, 0);
    pub const GREEN: Color = Color::new(0, 0xFF, 0);

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Color { red, green, blue }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_color(*self))
    }
}

impl FromStr for Color {
    type Err = crate::BusylightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_color(s)
    }
}

/// Parse a color string.
///
/// Accepts:
/// - Hex: `"#FF0000"`, `"FF0000"`, `"#ff0000"`
/// - Named: `"red"`, `"green"`, `"blue"`, `"white"`, `"orange"`, `"yellow"`, `"purple"`, `"cyan"`, `"off"`
pub fn parse_color(s: &str) -> crate::error::Result<Color> {
    let s = s.trim();

    match s.to_lowercase().as_str() {
        "red" => return Ok(Color::RED),
        "green" => return Ok(Color::GREEN),
        "blue" => return Ok(Color::new(0, 0, 0xFF)),
        "white" => return Ok(Color::new(0xFF, 0xFF, 0xFF)),
        "orange" => return Ok(Color::new(0xFF, 0x80, 0)),
        "yellow" => return Ok(Color::new(0xFF, 0xFF, 0)),
        "purple" => return Ok(Color::new(0x80, 0, 0xFF)),
        "cyan" => return Ok(Color::new(0, 0xFF, 0xFF)),
        "off" | "black" => return Ok(Color::OFF),
        _ => {}
    }

    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(crate::BusylightError::Color(format!(
            "Invalid color: {s} (use #RRGGBB or a color name)"
        )));
    }
    let val = u32::from_str_radix(hex, 16)
        .map_err(|_| crate::BusylightError::Color(format!("Invalid hex color: {s}")))?;
    let [_, red, green, blue] = val.to_be_bytes();
    Ok(Color::new(red, green, blue))
}

/// Format a color as `#RRGGBB`.
pub fn format_color(color: Color) -> String {
    format!("#{:02X}{:02X}{:02X}", color.red, color.green, color.blue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_named_colors() {
        assert_eq!(parse_color("red").unwrap(), Color::RED);
        assert_eq!(parse_color("green").unwrap(), Color::GREEN);
        assert_eq!(parse_color("blue").unwrap(), Color::new(0, 0, 255));
        assert_eq!(parse_color("off").unwrap(), Color::OFF);
        assert_eq!(parse_color("black").unwrap(), Color::OFF);
    }

    #[test]
    fn parse_named_case_insensitive() {
        assert_eq!(parse_color("RED").unwrap(), Color::RED);
        assert_eq!(parse_color("  Red  ").unwrap(), Color::RED);
    }

    #[test]
    fn parse_hex_with_and_without_hash() {
        assert_eq!(parse_color("#123456").unwrap(), Color::new(0x12, 0x34, 0x56));
        assert_eq!(parse_color("abcdef").unwrap(), Color::new(0xAB, 0xCD, 0xEF));
    }

    #[test]
    fn parse_invalid_lengths() {
        assert!(parse_color("#FFF").is_err());
        assert!(parse_color("#FF000000").is_err());
    }

    #[test]
    fn parse_invalid_name_or_chars() {
        assert!(parse_color("chartreuse").is_err());
        assert!(parse_color("#GGHHII").is_err());
        // six bytes but not six ASCII characters
        assert!(parse_color("ééé").is_err());
        // from_str_radix alone would accept a sign
        assert!(parse_color("+FFFFF").is_err());
        assert!(parse_color("#-00000").is_err());
    }

    #[test]
    fn format_pads_channels() {
        assert_eq!(format_color(Color::new(0xFF, 0x08, 0)), "#FF0800");
        assert_eq!(Color::OFF.to_string(), "#000000");
    }

    #[test]
    fn from_str_matches_parse_color() {
        let c: Color = "orange".parse().unwrap();
        assert_eq!(c, Color::new(0xFF, 0x80, 0));
    }

    #[test]
    fn default_is_off() {
        assert_eq!(Color::default(), Color::OFF);
    }
}

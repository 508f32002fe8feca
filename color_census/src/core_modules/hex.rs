// Hex codes carry a leading '#' for display. Outgoing queries send the bare
// lowercase digits, so both spellings of the same color hit the same URL.

use palette::Srgb;

/// Formats a color as a lowercase `#rrggbb` hex code.
pub fn rgb_to_hex(color: &Srgb<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", color.red, color.green, color.blue)
}

/// Strips an optional leading '#' and lowercases the digits.
pub fn clean_hex(hex: &str) -> String {
    hex.strip_prefix('#').unwrap_or(hex).to_ascii_lowercase()
}

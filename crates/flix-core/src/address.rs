//! Account address normalisation.

/// Lower-cases, `0x`-prefixes and left-pads a hex address to 8 bytes.
/// Non-hex values (placeholders such as `0xFLOWTOKENADDRESS`) are only prefixed.
pub fn normalize_address(address: &str) -> String {
    let trimmed = address.trim();
    let raw = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if !raw.is_empty() && raw.len() <= 16 && raw.chars().all(|c| c.is_ascii_hexdigit()) {
        format!("0x{:0>16}", raw.to_ascii_lowercase())
    } else {
        format!("0x{}", raw)
    }
}

/// Address without its `0x` prefix, as used in fully-qualified identifiers.
pub fn bare_address(address: &str) -> String {
    normalize_address(address).trim_start_matches("0x").to_string()
}

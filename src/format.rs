/// Shorten an address to `first6...last4` for display. Empty input stays empty.
pub fn shorten_address(address: &str) -> String {
    if address.is_empty() {
        return String::new();
    }
    let chars: Vec<char> = address.chars().collect();
    let head: String = chars.iter().take(6).collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Shortened address, or "Unknown" when it is missing.
pub fn display_address(address: Option<&str>) -> String {
    match address {
        Some(addr) if !addr.is_empty() => shorten_address(addr),
        _ => "Unknown".to_string(),
    }
}

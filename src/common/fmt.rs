//! Number formatting used by progress lines.

/// Group digits by thousands with commas: `1234567` -> `1,234,567`.
pub fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Render a byte count with binary (IEC) units.
pub fn human_bytes(bytes: usize) -> String {
    humansize::format_size(bytes as u64, humansize::BINARY)
}

//! `interfaces.txt`: one interface identifier per line.

/// Interface names in file order. Comment and blank lines are dropped.
pub fn parse(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// File content for a full replacement. Non-empty lists end with a newline
/// so line-oriented readers see the last entry.
pub fn render(interfaces: &[String]) -> String {
    if interfaces.is_empty() {
        return String::new();
    }
    let mut out = interfaces.join("\n");
    out.push('\n');
    out
}

//! Announcement text to tokens.

/// Lower-cases, drops `.` and `,`, splits on whitespace and explodes every
/// all-digit word into single-digit tokens ("123" -> "1", "2", "3").
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '.' | ','))
        .collect();

    let mut tokens = Vec::new();
    for word in cleaned.split_whitespace() {
        if word.chars().all(|c| c.is_ascii_digit()) {
            tokens.extend(word.chars().map(String::from));
        } else {
            tokens.push(word.to_string());
        }
    }
    tokens
}

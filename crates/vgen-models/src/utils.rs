//! Prompt batch parsing.

/// Split a block of text into prompts, one per non-empty line.
///
/// Lines are trimmed of surrounding whitespace; blank lines produce no prompt.
/// Both `\n` and `\r\n` line endings are accepted.
pub fn parse_prompts(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

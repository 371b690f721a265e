pub const DELIMITER: char = ',';

/// Splits one CSV line into trimmed field values.
///
/// A `"` opens or closes a quoted section; delimiters inside quotes are kept
/// as text. Inside a quoted section `""` stands for a literal quote. An
/// unterminated quote is closed implicitly at the end of the line. The result
/// always has one more field than there are unquoted delimiters.
pub fn tokenize_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                chars.next();
                current.push('"');
            }
            '"' => in_quotes = !in_quotes,
            DELIMITER if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            other => current.push(other),
        }
    }
    fields.push(current.trim().to_string());

    fields
}

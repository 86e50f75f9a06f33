use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

pub const C_KEYWORDS: [&str; 37] = [
    "auto", "break", "case", "char", "const", "continue", "default", "do",
    "double", "else", "enum", "extern", "float", "for", "goto", "if",
    "inline", "int", "long", "register", "restrict", "return", "short",
    "signed", "sizeof", "static", "struct", "switch", "typedef", "union",
    "unsigned", "void", "volatile", "while", "_Bool", "_Complex", "_Imaginary",
];

pub fn quote(text: &str) -> String {
    format!("{:?}", text)
}

/// True when `name` can be used verbatim as a C identifier.
pub fn is_c_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name) && !C_KEYWORDS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers() {
        assert!(is_c_identifier("x"));
        assert!(is_c_identifier("_private9"));
        assert!(!is_c_identifier("9lives"));
        assert!(!is_c_identifier("has-dash"));
        assert!(!is_c_identifier(""));
        assert!(!is_c_identifier("struct"));
    }
}

//! Source validation and formatting
//!
//! Every generated file goes through `syn` before it is written: once per
//! template while composing, and once more over the whole buffer before
//! `prettyplease` lays it out.

/// Parse `source` as a Rust file.
///
/// # Errors
///
/// Returns the parser message with the position it refers to.
pub fn validate(source: &str) -> Result<syn::File, String> {
    syn::parse_file(source).map_err(|e| {
        let start = e.span().start();
        format!("{e} (at {}:{})", start.line, start.column + 1)
    })
}

/// Validate `source` and return it laid out by `prettyplease`.
///
/// # Errors
///
/// Returns the parser message if `source` is not a well-formed Rust file.
pub fn format(source: &str) -> Result<String, String> {
    validate(source).map(|file| prettyplease::unparse(&file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_lays_out_tokens() {
        let formatted = format("pub struct A { pub b : u8 , }").unwrap();
        assert_eq!(formatted, "pub struct A {\n    pub b: u8,\n}\n");
    }

    #[test]
    fn test_validate_reports_position() {
        let err = validate("pub struct A {\n    b: ,\n}").unwrap_err();
        assert!(err.contains("(at 2:"), "{err}");
    }

    #[test]
    fn test_format_is_stable() {
        let once = format("fn a() -> u8 { 1 }").unwrap();
        assert_eq!(format(&once).unwrap(), once);
    }
}

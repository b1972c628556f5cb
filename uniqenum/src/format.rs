//! Templates for macro names and assertion messages, and C string literal escaping.
//!
//! A template is text with `{name}` references, e.g. `areuniq{n}` or
//! `duplicate enum values: {name} {type}`. Templates are rendered either as plain text or as a
//! C string literal expression, where references to macro parameters become `#param`
//! stringizing operators.

use crate::errors::GenerationError;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref REFERENCE_RE: Regex = Regex::new(r"\{[A-Za-z_][A-Za-z0-9_]*\}").unwrap();
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Part {
    Literal(String),
    Ref(String),
}

/// Value bound to a template reference.
#[derive(Clone, Copy, Debug)]
pub enum Arg<'a> {
    /// Plain text. Escaped when rendered inside a C string literal.
    Text(&'a str),

    /// Name of a macro parameter. Stringized with `#` when rendered inside a C string literal.
    Param(&'a str),
}

impl<'a> Arg<'a> {
    fn text(&self) -> &'a str {
        match *self {
            Arg::Text(text) | Arg::Param(text) => text,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    source: String,
    parts: Vec<Part>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Template, GenerationError> {
        let mut template = Template {
            source: source.to_string(),
            parts: Vec::new(),
        };

        let mut last = 0;
        for reference in REFERENCE_RE.find_iter(source) {
            template.push_literal(&source[last..reference.start()])?;
            let name = &reference.as_str()[1..reference.as_str().len() - 1];
            template.parts.push(Part::Ref(name.to_string()));
            last = reference.end();
        }
        template.push_literal(&source[last..])?;

        Ok(template)
    }

    fn push_literal(&mut self, text: &str) -> Result<(), GenerationError> {
        if text.contains(|c: char| c == '{' || c == '}') {
            return Err(GenerationError::malformed_template(
                &self.source,
                "unmatched `{` or `}`: references look like `{n}`",
            ));
        }
        if !text.is_empty() {
            self.parts.push(Part::Literal(text.to_string()));
        }
        Ok(())
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|part| match part {
            Part::Ref(name) => Some(name.as_str()),
            Part::Literal(_) => None,
        })
    }

    /// Checks that the template only refers to `allowed` values.
    pub fn validate(&self, allowed: &[&str]) -> Result<(), GenerationError> {
        match self.references().find(|r| !allowed.contains(r)) {
            Some(unknown) => Err(GenerationError::unknown_template_reference(
                &self.source,
                unknown,
                allowed,
            )),
            None => Ok(()),
        }
    }

    /// Renders the template as plain text. Unbound references are kept verbatim.
    pub fn render(&self, args: &[(&str, Arg)]) -> String {
        let mut result = String::new();
        for part in &self.parts {
            match part {
                Part::Literal(text) => result.push_str(text),
                Part::Ref(name) => match lookup(args, name) {
                    Some(arg) => result.push_str(arg.text()),
                    None => {
                        result.push('{');
                        result.push_str(name);
                        result.push('}');
                    }
                },
            }
        }
        result
    }

    /// Renders the template as a C string literal expression, usable as the message of a
    /// `_Static_assert` inside a macro body.
    pub fn render_c_string(&self, args: &[(&str, Arg)]) -> String {
        let mut builder = CStringBuilder::new();
        for part in &self.parts {
            match part {
                Part::Literal(text) => builder.text(text),
                Part::Ref(name) => match lookup(args, name) {
                    Some(Arg::Text(text)) => builder.text(text),
                    Some(Arg::Param(param)) => builder.param(param),
                    None => builder.text(&format!("{{{}}}", name)),
                },
            }
        }
        builder.finish()
    }
}

fn lookup<'a>(args: &[(&str, Arg<'a>)], name: &str) -> Option<Arg<'a>> {
    args.iter().find(|(key, _)| *key == name).map(|(_, arg)| *arg)
}

/// Builds a sequence of adjacent string literals and stringized parameters, e.g.
/// `"duplicate enum values: "#a" and "#b`.
struct CStringBuilder {
    code: String,
    in_string: bool,
}

impl CStringBuilder {
    fn new() -> CStringBuilder {
        CStringBuilder {
            code: String::new(),
            in_string: false,
        }
    }

    fn text(&mut self, text: &str) {
        if !self.in_string {
            self.code.push('"');
            self.in_string = true;
        }
        self.code.push_str(&escape_c_string(text));
    }

    fn param(&mut self, param: &str) {
        if self.in_string {
            self.code.push('"');
            self.in_string = false;
        }
        self.code.push('#');
        self.code.push_str(param);
    }

    fn finish(mut self) -> String {
        if self.in_string {
            self.code.push('"');
        }
        if self.code.is_empty() {
            self.code.push_str("\"\"");
        }
        self.code
    }
}

fn is_hex_digit(unit: u16) -> bool {
    matches!(unit, 0x30..=0x39 | 0x41..=0x46 | 0x61..=0x66)
}

fn is_octal_digit(unit: u16) -> bool {
    matches!(unit, 0x30..=0x37)
}

/// Escapes `src` for use inside a C string literal, picking the shortest escape for every
/// UTF-16 code unit:
///
/// * named escapes for common control characters, `"` and `\`;
/// * octal for codes up to `0o777`, padded to three digits when an octal digit follows;
/// * `\x` for larger codes, or `\u` when a hex digit follows (which `\x` would swallow).
///
/// Characters outside the BMP are escaped as their two surrogates.
pub fn escape_c_string(src: &str) -> String {
    let units: Vec<u16> = src.encode_utf16().collect();
    let mut escaped = String::with_capacity(units.len());

    for (i, &unit) in units.iter().enumerate() {
        let next = units.get(i + 1).copied();
        match unit {
            7 => escaped.push_str("\\a"),
            8 => escaped.push_str("\\b"),
            9 => escaped.push_str("\\t"),
            10 => escaped.push_str("\\n"),
            11 => escaped.push_str("\\v"),
            12 => escaped.push_str("\\f"),
            13 => escaped.push_str("\\r"),
            34 => escaped.push_str("\\\""),
            92 => escaped.push_str("\\\\"),
            32..=126 => escaped.push(unit as u8 as char),
            0..=0o777 => {
                if next.map_or(false, is_octal_digit) {
                    escaped.push_str(&format!("\\{:03o}", unit));
                } else {
                    escaped.push_str(&format!("\\{:o}", unit));
                }
            }
            _ => {
                if next.map_or(false, is_hex_digit) {
                    escaped.push_str(&format!("\\u{:04x}", unit));
                } else {
                    escaped.push_str(&format!("\\x{:x}", unit));
                }
            }
        }
    }

    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_escapes_and_printable_ascii() {
        assert_eq!(escape_c_string("\"\\Hello\n\r\t"), "\\\"\\\\Hello\\n\\r\\t");
        assert_eq!(escape_c_string("\x07\x08\x0b\x0c"), "\\a\\b\\v\\f");
    }

    #[test]
    fn octal_is_padded_before_octal_digits() {
        assert_eq!(escape_c_string("\x0123"), "\\00123");
        assert_eq!(escape_c_string("\x018"), "\\18");
        assert_eq!(escape_c_string("\x1fA"), "\\37A");
        assert_eq!(escape_c_string("\u{ff}x"), "\\377x");
        assert_eq!(escape_c_string("\x059"), "\\59");
        assert_eq!(escape_c_string("\x053"), "\\0053");
    }

    #[test]
    fn hex_or_unicode_above_octal_range() {
        assert_eq!(escape_c_string("\u{200}G"), "\\x200G");
        assert_eq!(escape_c_string("\u{200}A"), "\\u0200A");
        assert_eq!(escape_c_string("\u{200}F"), "\\u0200F");
        assert_eq!(escape_c_string("\u{200}"), "\\x200");
    }

    #[test]
    fn astral_characters_are_split_into_surrogates() {
        assert_eq!(escape_c_string("\u{100000}G"), "\\xdbc0\\xdc00G");
        assert_eq!(escape_c_string("\u{100000}f"), "\\xdbc0\\udc00f");
    }

    #[test]
    fn mixed_input() {
        let src = "\x0123\"\u{200}F\u{100000}G";
        assert_eq!(escape_c_string(src), "\\00123\\\"\\u0200F\\xdbc0\\xdc00G");
    }

    #[test]
    fn parses_references() {
        let template = Template::parse("areuniq{n}").unwrap();
        assert_eq!(
            template.parts(),
            &[
                Part::Literal("areuniq".to_string()),
                Part::Ref("n".to_string())
            ]
        );
        assert_eq!(template.render(&[("n", Arg::Text("12"))]), "areuniq12");
    }

    #[test]
    fn rejects_unmatched_braces() {
        let error = Template::parse("areuniq{n").unwrap_err();
        assert_eq!(error.code, "E0006");
        assert!(Template::parse("x}").is_err());
        assert!(Template::parse("{1}").is_err());
    }

    #[test]
    fn validates_references() {
        let template = Template::parse("{name}_{n}").unwrap();
        assert!(template.validate(&["n", "name", "type"]).is_ok());
        let error = template.validate(&["n"]).unwrap_err();
        assert_eq!(error.code, "E0006");
    }

    #[test]
    fn renders_c_string_with_stringized_params() {
        let template = Template::parse("duplicate enum values: {name} {type}").unwrap();
        let rendered =
            template.render_c_string(&[("name", Arg::Param("f")), ("type", Arg::Param("g"))]);
        assert_eq!(rendered, "\"duplicate enum values: \"#f\" \"#g");
    }

    #[test]
    fn renders_c_string_with_text_args() {
        let template = Template::parse("{name} has \"{n}\" values").unwrap();
        let rendered =
            template.render_c_string(&[("n", Arg::Text("3")), ("name", Arg::Param("h"))]);
        assert_eq!(rendered, "#h\" has \\\"3\\\" values\"");
    }

    #[test]
    fn empty_c_string() {
        let template = Template::parse("").unwrap();
        assert_eq!(template.render_c_string(&[]), "\"\"");
    }
}

use std::borrow::Cow;
use std::cell::Cell;

use ahash::HashMap;

use crate::error::ParseError;

// Deepest chain of entity references we are willing to follow.
const MAX_EXPANSION_DEPTH: usize = 32;
// Declared entity references expanded per document, nested ones included.
const MAX_EXPANSIONS: usize = 64_000;
// Longest text a single run of content may grow to through expansion.
const MAX_EXPANDED_LENGTH: usize = 1 << 24;

/// Entities declared in a document type definition.
///
/// The five predefined entities and character references are always
/// available and cannot be overridden. Declared entities are expanded
/// within a budget shared by the whole document.
#[derive(Debug, Clone, Default)]
pub(crate) struct EntityTable {
    entities: HashMap<String, String>,
    expansions: Cell<usize>,
}

impl EntityTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Declare an internal entity. The first declaration of a name is binding.
    pub(crate) fn declare(&mut self, name: &str, replacement: &str) {
        self.entities
            .entry(name.to_string())
            .or_insert_with(|| replacement.to_string());
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    /// Replace every entity and character reference in `content`.
    pub(crate) fn expand<'a>(&self, content: &'a str) -> Result<Cow<'a, str>, ParseError> {
        if !content.contains('&') {
            return Ok(Cow::Borrowed(content));
        }
        let mut result = String::with_capacity(content.len());
        let mut active = Vec::new();
        self.expand_into(content, &mut result, &mut active)?;
        Ok(Cow::Owned(result))
    }

    /// Normalize an attribute value and expand its references.
    ///
    /// Literal tabs, carriage returns and newlines become spaces. Character
    /// references to those are kept as the character they refer to.
    pub(crate) fn expand_attribute<'a>(&self, raw: &'a str) -> Result<Cow<'a, str>, ParseError> {
        let normalized = normalize_attribute_whitespace(raw);
        match normalized {
            Cow::Borrowed(s) => self.expand(s),
            Cow::Owned(s) => Ok(Cow::Owned(self.expand(&s)?.into_owned())),
        }
    }

    fn expand_into<'n>(
        &'n self,
        content: &str,
        result: &mut String,
        active: &mut Vec<&'n str>,
    ) -> Result<(), ParseError> {
        let mut rest = content;
        while let Some(amp) = rest.find('&') {
            result.push_str(&rest[..amp]);
            let after = &rest[amp + 1..];
            let semicolon = after
                .find(';')
                .ok_or_else(|| ParseError::UnclosedEntity(after.to_string()))?;
            let reference = &after[..semicolon];
            rest = &after[semicolon + 1..];

            if let Some(number) = reference.strip_prefix('#') {
                result.push(parse_character_reference(number)?);
                continue;
            }
            if let Some(c) = predefined(reference) {
                result.push(c);
                continue;
            }
            let (name, replacement) = self
                .entities
                .get_key_value(reference)
                .ok_or_else(|| {
                    if is_name(reference) {
                        ParseError::UndeclaredEntity(reference.to_string())
                    } else {
                        ParseError::InvalidEntity(reference.to_string())
                    }
                })?;
            if active.contains(&name.as_str()) || active.len() >= MAX_EXPANSION_DEPTH {
                return Err(ParseError::EntityRecursion(reference.to_string()));
            }
            if replacement.contains('<') {
                return Err(ParseError::EntityMarkup(reference.to_string()));
            }
            let expansions = self.expansions.get() + 1;
            if expansions > MAX_EXPANSIONS || result.len() > MAX_EXPANDED_LENGTH {
                return Err(ParseError::EntityExpansionLimit(reference.to_string()));
            }
            self.expansions.set(expansions);
            active.push(name.as_str());
            self.expand_into(replacement, result, active)?;
            active.pop();
        }
        result.push_str(rest);
        if result.len() > MAX_EXPANDED_LENGTH {
            let entity = active.last().copied().unwrap_or_default();
            return Err(ParseError::EntityExpansionLimit(entity.to_string()));
        }
        Ok(())
    }
}

fn predefined(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "apos" => Some('\''),
        "gt" => Some('>'),
        "lt" => Some('<'),
        "quot" => Some('"'),
        _ => None,
    }
}

fn parse_character_reference(number: &str) -> Result<char, ParseError> {
    let invalid = || ParseError::InvalidCharacterReference(format!("#{}", number));
    let code = match number.strip_prefix('x') {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => number.parse::<u32>(),
    }
    .map_err(|_| invalid())?;
    match char::from_u32(code) {
        Some(c) if is_xml_char(c) => Ok(c),
        _ => Err(invalid()),
    }
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\u{9}' | '\u{A}' | '\u{D}' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

fn is_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.'))
}

fn normalize_attribute_whitespace(raw: &str) -> Cow<str> {
    if raw.contains(['\t', '\r', '\n']) {
        Cow::Owned(
            raw.chars()
                .map(|c| if matches!(c, '\t' | '\r' | '\n') { ' ' } else { c })
                .collect(),
        )
    } else {
        Cow::Borrowed(raw)
    }
}

/// Escape character data for use as element content.
pub(crate) fn escape_text(content: &str) -> Cow<str> {
    escape(content, |c| match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        _ => None,
    })
}

/// Escape character data for use inside a double quoted attribute value.
///
/// Whitespace other than the plain space is written as a character
/// reference so that it survives attribute value normalization.
pub(crate) fn escape_attribute(content: &str) -> Cow<str> {
    escape(content, |c| match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '"' => Some("&quot;"),
        '\t' => Some("&#9;"),
        '\n' => Some("&#10;"),
        '\r' => Some("&#13;"),
        _ => None,
    })
}

fn escape(content: &str, replacement: impl Fn(char) -> Option<&'static str>) -> Cow<str> {
    let Some(first) = content.find(|c| replacement(c).is_some()) else {
        return Cow::Borrowed(content);
    };
    let mut result = String::with_capacity(content.len() + 8);
    result.push_str(&content[..first]);
    for c in content[first..].chars() {
        match replacement(c) {
            Some(escaped) => result.push_str(escaped),
            None => result.push(c),
        }
    }
    Cow::Owned(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("A &amp; B", "A & B")]
    #[case("&amp;&apos;&gt;&lt;&quot;", "&'><\"")]
    #[case("&#65;&#x42;", "AB")]
    #[case("caf&#xE9;", "café")]
    fn test_expand_builtin(#[case] raw: &str, #[case] expected: &str) {
        let table = EntityTable::new();
        assert_eq!(table.expand(raw).unwrap(), expected);
    }

    #[test]
    fn test_expand_no_references_borrows() {
        let table = EntityTable::new();
        let text = "hello";
        let result = table.expand(text).unwrap();
        assert!(std::ptr::eq(text, result.as_ref()));
    }

    #[test]
    fn test_expand_declared_nested() {
        let mut table = EntityTable::new();
        table.declare("name", "Nasse");
        table.declare("greeting", "Hello &name;!");
        assert_eq!(table.expand("&greeting;").unwrap(), "Hello Nasse!");
    }

    #[test]
    fn test_first_declaration_wins() {
        let mut table = EntityTable::new();
        table.declare("e", "first");
        table.declare("e", "second");
        assert_eq!(table.expand("&e;").unwrap(), "first");
    }

    #[test]
    fn test_recursive_entity() {
        let mut table = EntityTable::new();
        table.declare("a", "&b;");
        table.declare("b", "&a;");
        assert!(matches!(
            table.expand("&a;"),
            Err(ParseError::EntityRecursion(_))
        ));
    }

    #[test]
    fn test_exponential_expansion_is_cut_off() {
        let mut table = EntityTable::new();
        table.declare("l0", "ha");
        for level in 1..8 {
            let fan_out = format!("&l{};", level - 1).repeat(10);
            table.declare(&format!("l{}", level), &fan_out);
        }
        assert!(matches!(
            table.expand("&l7;"),
            Err(ParseError::EntityExpansionLimit(_))
        ));
    }

    #[test]
    fn test_expansion_budget_is_per_document() {
        let mut table = EntityTable::new();
        table.declare("e", "x");
        for _ in 0..MAX_EXPANSIONS {
            table.expand("&e;").unwrap();
        }
        assert!(matches!(
            table.expand("&e;"),
            Err(ParseError::EntityExpansionLimit(entity)) if entity == "e"
        ));
    }

    #[test]
    fn test_long_replacement_is_cut_off() {
        let mut table = EntityTable::new();
        table.declare("big", &"x".repeat(MAX_EXPANDED_LENGTH / 4));
        assert!(table.expand(&"&big;".repeat(5)).is_err());
        assert!(table.expand(&"&big;".repeat(2)).is_ok());
    }

    #[test]
    fn test_markup_in_replacement_is_rejected() {
        let mut table = EntityTable::new();
        table.declare("e", "<b>x</b>");
        table.declare("escaped", "&lt;b&gt;");
        assert!(matches!(
            table.expand("&e;"),
            Err(ParseError::EntityMarkup(entity)) if entity == "e"
        ));
        assert_eq!(table.expand("&escaped;").unwrap(), "<b>");
    }

    #[test]
    fn test_undeclared_entity() {
        let table = EntityTable::new();
        let err = table.expand("&unknown;").unwrap_err();
        assert_eq!(
            err.to_string(),
            "the entity \"unknown\" was referenced, but not declared"
        );
    }

    #[test]
    fn test_unclosed_entity() {
        let table = EntityTable::new();
        assert!(matches!(
            table.expand("&amp"),
            Err(ParseError::UnclosedEntity(entity)) if entity == "amp"
        ));
    }

    #[rstest]
    #[case("&#0;")]
    #[case("&#xD800;")]
    #[case("&#xZZ;")]
    fn test_invalid_character_reference(#[case] raw: &str) {
        let table = EntityTable::new();
        assert!(matches!(
            table.expand(raw),
            Err(ParseError::InvalidCharacterReference(_))
        ));
    }

    #[test]
    fn test_attribute_normalization() {
        let table = EntityTable::new();
        assert_eq!(
            table.expand_attribute("a\tb\nc&#10;d").unwrap(),
            "a b c\nd"
        );
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a < b & c > d \"q\""), "a &lt; b &amp; c &gt; d \"q\"");
        let text = "plain";
        assert!(std::ptr::eq(text, escape_text(text).as_ref()));
    }

    #[test]
    fn test_escape_attribute() {
        assert_eq!(
            escape_attribute("say \"hi\"\n\tnow"),
            "say &quot;hi&quot;&#10;&#9;now"
        );
    }
}

//! Parser for the parenthesised list values embedded in the dump.
//!
//! Several field values in `Docs.json` are not JSON but a nested,
//! comma-separated, parenthesis-delimited mini format, e.g.
//! `((ItemClass="...Desc_OreIron.Desc_OreIron_C'",Amount=1),(...))`.
//! This module turns such a value into a token tree and provides the
//! extractors that pull class names and amounts back out of the tokens.

use thiserror::Error;

macro_rules! regex {
    ($pattern:expr) => {{
        use std::sync::OnceLock;
        static REGEX: OnceLock<regex::Regex> = OnceLock::new();
        REGEX.get_or_init(|| regex::Regex::new($pattern).unwrap_or_else(|e| panic!("{}", e)))
    }};
}

/// Byte width of the `),` separator between sibling groups.
const GROUP_SEPARATOR: usize = 2;

#[derive(Debug, Error)]
pub enum StructureError {
    /// The value does not begin with an opening parenthesis.
    #[error("value does not start with '(': {0:?}")]
    NotAGroup(String),

    /// The input ended while a group was still open.
    #[error("unbalanced parentheses, group opened at byte {opened_at} never closes")]
    Unbalanced { opened_at: usize },
}

/// One element of a parsed group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A flat fragment, usually a `key=value` pair or a class path.
    Text(String),
    /// A nested group, along with any `key=` text that preceded it.
    Group { prefix: String, items: Vec<Token> },
}

impl Token {
    /// The flat text of this element, or `None` for a nested group.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Token::Text(text) => Some(text),
            Token::Group { .. } => None,
        }
    }

    /// The nested elements of this group, or `None` for a flat fragment.
    pub fn as_group(&self) -> Option<&[Token]> {
        match self {
            Token::Text(_) => None,
            Token::Group { items, .. } => Some(items),
        }
    }
}

/// Parse a complete parenthesised value into its top-level elements.
///
/// An empty value parses to an empty list, since the dump writes `""` for
/// absent lists. Sibling groups at the top level (`(...),(...)`) are merged
/// into one element list, matching how the dump writes list-valued fields.
pub fn parse_value(raw: &str) -> Result<Vec<Token>, StructureError> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    if !raw.starts_with('(') {
        return Err(StructureError::NotAGroup(preview(raw)));
    }

    let bytes = raw.as_bytes();
    let (mut elements, mut pos) = parse_group(raw, 1)?;
    while pos + 1 < bytes.len() && bytes[pos] == b',' && bytes[pos + 1] == b'(' {
        let (more, next) = parse_group(raw, pos + GROUP_SEPARATOR)?;
        elements.extend(more);
        pos = next;
    }
    Ok(elements)
}

/// Parse one group whose opening parenthesis sits at `start - 1`.
///
/// Returns the group's elements and the index just past its closing
/// parenthesis, so a calling invocation can resume scanning its own level
/// exactly there. Elements are split at this depth's commas; a nested
/// opening parenthesis recurses and the nested group becomes one element
/// together with whatever `key=` text preceded it.
fn parse_group(raw: &str, start: usize) -> Result<(Vec<Token>, usize), StructureError> {
    let bytes = raw.as_bytes();
    let mut elements = Vec::new();
    let mut fragment = start;
    let mut pos = start;

    while pos < bytes.len() {
        match bytes[pos] {
            b'(' => {
                let prefix = raw[fragment..pos].to_string();
                let (items, after) = parse_group(raw, pos + 1)?;
                elements.push(Token::Group { prefix, items });
                pos = after;
                // a comma here separates the group from its next sibling
                if bytes.get(pos) == Some(&b',') {
                    pos += 1;
                }
                fragment = pos;
            }
            b')' => {
                if fragment < pos {
                    elements.push(Token::Text(raw[fragment..pos].to_string()));
                }
                return Ok((elements, pos + 1));
            }
            b',' => {
                if fragment < pos {
                    elements.push(Token::Text(raw[fragment..pos].to_string()));
                }
                pos += 1;
                fragment = pos;
            }
            _ => pos += 1,
        }
    }

    Err(StructureError::Unbalanced { opened_at: start - 1 })
}

/// Extract the class name from a qualified reference.
///
/// Handles both bare object paths
/// (`/Game/.../Build_SmelterMk1.Build_SmelterMk1_C`) and keyed references
/// (`ItemClass="/Script/Engine.BlueprintGeneratedClass'/Game/....Desc_OreIron_C'"`):
/// the class name is the segment after the last `.`, with any quoting
/// stripped. Returns `None` if the text has no namespace separator.
pub fn class_name(reference: &str) -> Option<&str> {
    let captures = regex!(r#"\.(\w+)['"]*$"#).captures(reference)?;
    captures.get(1).map(|m| m.as_str())
}

/// Extract the integer from an `Amount=<n>` fragment.
pub fn amount(fragment: &str) -> Option<i64> {
    let captures = regex!(r"^Amount=(-?\d+)$").captures(fragment.trim())?;
    captures[1].parse().ok()
}

fn preview(raw: &str) -> String {
    const MAX: usize = 40;
    if raw.len() <= MAX {
        raw.to_string()
    } else {
        let head: String = raw.chars().take(MAX).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Token {
        Token::Text(s.to_string())
    }

    #[test]
    fn flat_group() {
        let tokens = parse_value("(A=1,B=2,C=3)").unwrap();
        assert_eq!(tokens, vec![text("A=1"), text("B=2"), text("C=3")]);
    }

    #[test]
    fn single_element() {
        let tokens = parse_value("(hello)").unwrap();
        assert_eq!(tokens, vec![text("hello")]);
    }

    #[test]
    fn nested_group_keeps_prefix_and_siblings() {
        let tokens = parse_value("(A=1,B=(C=2,D=3),E=4)").unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].as_text(), Some("A=1"));
        match &tokens[1] {
            Token::Group { prefix, items } => {
                assert_eq!(prefix, "B=");
                assert_eq!(items, &[text("C=2"), text("D=3")]);
            }
            other => panic!("expected group, got {other:?}"),
        }
        assert_eq!(tokens[2].as_text(), Some("E=4"));
    }

    #[test]
    fn deeply_nested() {
        let tokens = parse_value("(A=(B=(C=1)))").unwrap();
        let inner = tokens[0].as_group().unwrap();
        let innermost = inner[0].as_group().unwrap();
        assert_eq!(innermost, &[text("C=1")]);
    }

    #[test]
    fn list_of_groups() {
        let tokens = parse_value("((ItemClass=a.X_C,Amount=1),(ItemClass=b.Y_C,Amount=3))").unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(
            tokens[0].as_group().unwrap(),
            &[text("ItemClass=a.X_C"), text("Amount=1")]
        );
        assert_eq!(
            tokens[1].as_group().unwrap(),
            &[text("ItemClass=b.Y_C"), text("Amount=3")]
        );
    }

    #[test]
    fn sibling_top_level_groups_merge() {
        let tokens = parse_value("(a,b),(c)").unwrap();
        assert_eq!(tokens, vec![text("a"), text("b"), text("c")]);
    }

    #[test]
    fn empty_value_and_empty_group() {
        assert_eq!(parse_value("").unwrap(), Vec::new());
        assert_eq!(parse_value("()").unwrap(), Vec::new());
    }

    #[test]
    fn unbalanced_is_an_error() {
        assert!(matches!(
            parse_value("(A=1,(B=2)"),
            Err(StructureError::Unbalanced { opened_at: 0 })
        ));
        assert!(matches!(
            parse_value("(A=1"),
            Err(StructureError::Unbalanced { .. })
        ));
    }

    #[test]
    fn non_group_is_an_error() {
        assert!(matches!(
            parse_value("A=1"),
            Err(StructureError::NotAGroup(_))
        ));
    }

    #[test]
    fn class_name_from_bare_path() {
        assert_eq!(
            class_name("/Game/FactoryGame/Buildable/Factory/SmelterMk1/Build_SmelterMk1.Build_SmelterMk1_C"),
            Some("Build_SmelterMk1_C")
        );
    }

    #[test]
    fn class_name_from_keyed_reference() {
        let reference = r#"ItemClass="/Script/Engine.BlueprintGeneratedClass'/Game/FactoryGame/Resource/RawResources/OreIron/Desc_OreIron.Desc_OreIron_C'""#;
        assert_eq!(class_name(reference), Some("Desc_OreIron_C"));
    }

    #[test]
    fn class_name_needs_a_separator() {
        assert_eq!(class_name("Amount=1"), None);
        assert_eq!(class_name("NoDotsHere"), None);
    }

    #[test]
    fn amount_field() {
        assert_eq!(amount("Amount=4"), Some(4));
        assert_eq!(amount("Amount=-2"), Some(-2));
        assert_eq!(amount("ItemClass=foo"), None);
        assert_eq!(amount("Amount=1.5"), None);
    }
}

#![forbid(unsafe_code)]

//! CSS-like selector engine.
//!
//! Supports exactly the grammar the modal manager needs: compound
//! selectors built from a tag name, `#id`, `.class`, `[attr]`,
//! `[attr="value"]`, and `:not(<compound>)`, joined into alternatives by
//! commas. There are no combinators; matching is always per-element,
//! with tree traversal handled by [`crate::Document`].
//!
//! # Invariants
//!
//! - Parsing is a single pass; a [`Selector`] never fails at match time.
//! - A selector list matches when any of its compounds matches.
//! - `:not()` accepts one compound and may not nest.

use ahash::AHashMap;

/// Parse failure for a selector string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorParseError {
    /// The input (or one comma alternative) was empty.
    Empty,
    /// A character that fits no production.
    UnexpectedChar(char),
    /// An identifier was required but missing.
    EmptyName,
    /// `[` without a closing `]`.
    UnterminatedAttribute,
    /// `:not(` without a closing `)`, or a nested `:not`.
    InvalidNot,
}

impl std::fmt::Display for SelectorParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty selector"),
            Self::UnexpectedChar(c) => write!(f, "unexpected character '{c}' in selector"),
            Self::EmptyName => write!(f, "expected an identifier"),
            Self::UnterminatedAttribute => write!(f, "unterminated attribute test"),
            Self::InvalidNot => write!(f, "malformed :not() clause"),
        }
    }
}

impl std::error::Error for SelectorParseError {}

/// An attribute test inside a compound selector.
#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrTest {
    /// `[name]`: attribute present.
    Present(String),
    /// `[name="value"]`: attribute equals value.
    Equals(String, String),
}

impl AttrTest {
    fn matches(&self, attrs: &AHashMap<String, String>) -> bool {
        match self {
            Self::Present(name) => attrs.contains_key(name),
            Self::Equals(name, value) => attrs.get(name).is_some_and(|v| v == value),
        }
    }
}

/// One compound selector: every part must match the same element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
    not: Vec<Compound>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attrs.is_empty()
            && self.not.is_empty()
    }

    fn matches(&self, tag: &str, attrs: &AHashMap<String, String>, classes: &[String]) -> bool {
        if let Some(t) = &self.tag
            && t != tag
        {
            return false;
        }
        if let Some(id) = &self.id
            && attrs.get("id").map(String::as_str) != Some(id.as_str())
        {
            return false;
        }
        if !self
            .classes
            .iter()
            .all(|c| classes.iter().any(|have| have == c))
        {
            return false;
        }
        if !self.attrs.iter().all(|t| t.matches(attrs)) {
            return false;
        }
        self.not.iter().all(|n| !n.matches(tag, attrs, classes))
    }
}

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    compounds: Vec<Compound>,
}

impl Selector {
    /// Parse a selector string.
    pub fn parse(input: &str) -> Result<Self, SelectorParseError> {
        let mut compounds = Vec::new();
        for part in split_top_level(input) {
            let part = part.trim();
            if part.is_empty() {
                return Err(SelectorParseError::Empty);
            }
            compounds.push(parse_compound(part, true)?);
        }
        if compounds.is_empty() {
            return Err(SelectorParseError::Empty);
        }
        Ok(Self { compounds })
    }

    /// Whether an element with the given tag, attributes, and classes
    /// matches any alternative of this selector.
    pub fn matches(
        &self,
        tag: &str,
        attrs: &AHashMap<String, String>,
        classes: &[String],
    ) -> bool {
        self.compounds
            .iter()
            .any(|c| c.matches(tag, attrs, classes))
    }
}

/// Split on commas that are not inside `[...]` or `(...)`.
fn split_top_level(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in input.char_indices() {
        match c {
            '[' | '(' => depth += 1,
            ']' | ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn take_ident(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut ident = String::new();
    while let Some(&c) = chars.peek() {
        if is_ident_char(c) {
            ident.push(c);
            chars.next();
        } else {
            break;
        }
    }
    ident
}

fn parse_compound(input: &str, allow_not: bool) -> Result<Compound, SelectorParseError> {
    let mut compound = Compound::default();
    let mut chars = input.chars().peekable();

    // Optional leading tag name.
    if chars.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
        compound.tag = Some(take_ident(&mut chars).to_ascii_lowercase());
    }

    while let Some(&c) = chars.peek() {
        match c {
            '#' => {
                chars.next();
                let id = take_ident(&mut chars);
                if id.is_empty() {
                    return Err(SelectorParseError::EmptyName);
                }
                compound.id = Some(id);
            }
            '.' => {
                chars.next();
                let class = take_ident(&mut chars);
                if class.is_empty() {
                    return Err(SelectorParseError::EmptyName);
                }
                compound.classes.push(class);
            }
            '[' => {
                chars.next();
                compound.attrs.push(parse_attr_test(&mut chars)?);
            }
            ':' => {
                chars.next();
                let name = take_ident(&mut chars);
                if name != "not" || !allow_not {
                    return Err(SelectorParseError::InvalidNot);
                }
                if chars.next() != Some('(') {
                    return Err(SelectorParseError::InvalidNot);
                }
                let mut inner = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == ')' {
                        closed = true;
                        break;
                    }
                    inner.push(c);
                }
                if !closed {
                    return Err(SelectorParseError::InvalidNot);
                }
                let inner = parse_compound(inner.trim(), false)?;
                compound.not.push(inner);
            }
            other => return Err(SelectorParseError::UnexpectedChar(other)),
        }
    }

    if compound.is_empty() {
        return Err(SelectorParseError::Empty);
    }
    Ok(compound)
}

fn parse_attr_test(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> Result<AttrTest, SelectorParseError> {
    let name = take_ident(chars);
    if name.is_empty() {
        return Err(SelectorParseError::EmptyName);
    }
    match chars.next() {
        Some(']') => Ok(AttrTest::Present(name)),
        Some('=') => {
            let quote = match chars.peek() {
                Some(&q @ ('"' | '\'')) => {
                    chars.next();
                    Some(q)
                }
                _ => None,
            };
            let mut value = String::new();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match quote {
                    Some(q) if c == q => {
                        // Expect the closing bracket right after the quote.
                        if chars.next() == Some(']') {
                            closed = true;
                        }
                        break;
                    }
                    None if c == ']' => {
                        closed = true;
                        break;
                    }
                    _ => value.push(c),
                }
            }
            if !closed {
                return Err(SelectorParseError::UnterminatedAttribute);
            }
            Ok(AttrTest::Equals(name, value))
        }
        _ => Err(SelectorParseError::UnterminatedAttribute),
    }
}

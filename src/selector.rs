//! CSS selector subset used to locate widget elements.
//!
//! Supported syntax: type selectors (`input`), ids (`#ai`), classes
//! (`.subject-card`), attribute presence and equality (`[type]`,
//! `[type="text"]`), compounds of those (`div.flex.justify-end`), and the
//! descendant combinator (whitespace).

use std::fmt;
use std::iter::Peekable;
use std::str::{CharIndices, FromStr};

use thiserror::Error;

use crate::dom::{Element, ElementId, Page};

/// Errors produced while parsing a selector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,

    #[error("unexpected character `{ch}` at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unexpected end of selector")]
    UnexpectedEnd,

    #[error("unterminated attribute selector")]
    Unterminated,
}

/// A parsed selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    compounds: Vec<Compound>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, Option<String>)>,
}

impl Compound {
    fn matches(&self, el: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if !el.tag().eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if el.id() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| el.has_class(c)) {
            return false;
        }
        self.attributes
            .iter()
            .all(|(name, expected)| match (el.attribute(name), expected) {
                (Some(actual), Some(expected)) => actual == expected,
                (Some(_), None) => true,
                (None, _) => false,
            })
    }
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        input.parse()
    }

    /// The selector text as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether `id` matches, checking ancestors for descendant combinators.
    #[must_use]
    pub fn matches(&self, page: &Page, id: ElementId) -> bool {
        let mut compounds = self.compounds.iter().rev();
        let Some(subject) = compounds.next() else {
            return false;
        };
        if !subject.matches(&page[id]) {
            return false;
        }

        // Matching each remaining compound against the nearest qualifying
        // ancestor is complete when the only combinator is "descendant".
        let mut current = page[id].parent();
        for compound in compounds {
            loop {
                let Some(ancestor) = current else {
                    return false;
                };
                current = page[ancestor].parent();
                if compound.matches(&page[ancestor]) {
                    break;
                }
            }
        }
        true
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compounds = Parser::new(s).parse()?;
        Ok(Self {
            source: s.trim().to_string(),
            compounds,
        })
    }
}

fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '-' || ch == '_'
}

struct Parser<'a> {
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.char_indices().peekable(),
        }
    }

    fn parse(mut self) -> Result<Vec<Compound>, SelectorError> {
        let mut compounds = Vec::new();
        loop {
            self.skip_whitespace();
            if self.chars.peek().is_none() {
                break;
            }
            compounds.push(self.compound()?);
        }
        if compounds.is_empty() {
            Err(SelectorError::Empty)
        } else {
            Ok(compounds)
        }
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|&(_, ch)| ch.is_whitespace()).is_some() {}
    }

    fn compound(&mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();
        let mut first = true;

        while let Some(&(pos, ch)) = self.chars.peek() {
            match ch {
                c if c.is_whitespace() => break,
                '#' => {
                    self.chars.next();
                    compound.id = Some(self.ident()?);
                }
                '.' => {
                    self.chars.next();
                    compound.classes.push(self.ident()?);
                }
                '[' => {
                    self.chars.next();
                    compound.attributes.push(self.attribute()?);
                }
                '*' if first => {
                    self.chars.next();
                }
                c if first && is_ident_char(c) => {
                    compound.tag = Some(self.ident()?);
                }
                _ => return Err(SelectorError::UnexpectedChar { ch, pos }),
            }
            first = false;
        }

        Ok(compound)
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        let mut out = String::new();
        while let Some((_, ch)) = self.chars.next_if(|&(_, ch)| is_ident_char(ch)) {
            out.push(ch);
        }
        if out.is_empty() {
            return Err(match self.chars.peek() {
                Some(&(pos, ch)) => SelectorError::UnexpectedChar { ch, pos },
                None => SelectorError::UnexpectedEnd,
            });
        }
        Ok(out)
    }

    fn attribute(&mut self) -> Result<(String, Option<String>), SelectorError> {
        self.skip_whitespace();
        let name = self.ident().map_err(unterminated_at_end)?;
        self.skip_whitespace();

        let value = match self.chars.next() {
            Some((_, ']')) => return Ok((name, None)),
            Some((_, '=')) => {
                self.skip_whitespace();
                self.attribute_value()?
            }
            Some((pos, ch)) => return Err(SelectorError::UnexpectedChar { ch, pos }),
            None => return Err(SelectorError::Unterminated),
        };

        self.skip_whitespace();
        match self.chars.next() {
            Some((_, ']')) => Ok((name, Some(value))),
            Some((pos, ch)) => Err(SelectorError::UnexpectedChar { ch, pos }),
            None => Err(SelectorError::Unterminated),
        }
    }

    fn attribute_value(&mut self) -> Result<String, SelectorError> {
        match self.chars.peek() {
            Some(&(_, quote @ ('"' | '\''))) => {
                self.chars.next();
                let mut out = String::new();
                for (_, ch) in self.chars.by_ref() {
                    if ch == quote {
                        return Ok(out);
                    }
                    out.push(ch);
                }
                Err(SelectorError::Unterminated)
            }
            Some(_) => self.ident(),
            None => Err(SelectorError::Unterminated),
        }
    }
}

fn unterminated_at_end(err: SelectorError) -> SelectorError {
    match err {
        SelectorError::UnexpectedEnd => SelectorError::Unterminated,
        other => other,
    }
}

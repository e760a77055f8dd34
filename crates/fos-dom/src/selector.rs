//! Selector Engine
//!
//! The subset of CSS selectors needed by `querySelector`/`closest`:
//! type, universal, `#id`, `.class`, `[attr]`, `[attr=value]`, the
//! descendant and child combinators, and comma-separated lists.

use crate::{DomTree, ElementData, NodeId};

/// Selector parse error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("Empty selector")]
    Empty,

    #[error("Unexpected character '{found}' at offset {offset} in selector")]
    Unexpected { found: char, offset: usize },

    #[error("Unterminated {0} in selector")]
    Unterminated(&'static str),
}

/// Attribute condition inside `[...]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrSelector {
    Exists(String),
    Equals(String, String),
}

/// One compound selector, e.g. `main.content[data-x]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compound {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<AttrSelector>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none() && self.id.is_none() && self.classes.is_empty() && self.attrs.is_empty()
    }

    /// Match against a single element, ignoring ancestry
    pub fn matches(&self, elem: &ElementData) -> bool {
        if let Some(tag) = &self.tag {
            if tag != "*" && !elem.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if elem.id() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| elem.classes().any(|have| have == c)) {
            return false;
        }
        self.attrs.iter().all(|attr| match attr {
            AttrSelector::Exists(name) => elem.has_attr(name),
            AttrSelector::Equals(name, value) => elem.get_attr(name) == Some(value.as_str()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
}

/// Compounds joined by combinators, matched right to left
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    compounds: Vec<Compound>,
    /// `combinators[i]` sits between `compounds[i]` and `compounds[i + 1]`
    combinators: Vec<Combinator>,
}

impl ComplexSelector {
    fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        self.match_at(tree, node, self.compounds.len() - 1)
    }

    fn match_at(&self, tree: &DomTree, node: NodeId, idx: usize) -> bool {
        let Some(elem) = tree.get(node).and_then(|n| n.as_element()) else {
            return false;
        };
        if !self.compounds[idx].matches(elem) {
            return false;
        }
        if idx == 0 {
            return true;
        }
        match self.combinators[idx - 1] {
            Combinator::Child => {
                let parent = tree.parent(node);
                parent.is_valid() && self.match_at(tree, parent, idx - 1)
            }
            Combinator::Descendant => tree
                .ancestors(node)
                .any(|ancestor| self.match_at(tree, ancestor, idx - 1)),
        }
    }
}

/// Parsed selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<ComplexSelector>,
}

impl Selector {
    /// Parse a selector list such as `h1, h2, [role=heading]`
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let mut parser = Parser { input, pos: 0 };
        let mut alternatives = Vec::new();
        loop {
            alternatives.push(parser.complex()?);
            parser.skip_ws();
            match parser.peek() {
                None => break,
                Some(',') => parser.pos += 1,
                Some(found) => return Err(SelectorError::Unexpected { found, offset: parser.pos }),
            }
        }
        Ok(Self { alternatives })
    }

    /// Check whether `node` matches any alternative
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        self.alternatives.iter().any(|alt| alt.matches(tree, node))
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
        self.pos > start
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(match self.peek() {
                Some(found) => SelectorError::Unexpected { found, offset: self.pos },
                None => SelectorError::Empty,
            });
        }
        Ok(self.input[start..self.pos].to_string())
    }

    fn complex(&mut self) -> Result<ComplexSelector, SelectorError> {
        self.skip_ws();
        let mut compounds = vec![self.compound()?];
        let mut combinators = Vec::new();
        loop {
            let had_ws = self.skip_ws();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.pos += 1;
                    self.skip_ws();
                    Combinator::Child
                }
                Some(_) if had_ws => Combinator::Descendant,
                Some(found) => return Err(SelectorError::Unexpected { found, offset: self.pos }),
            };
            combinators.push(combinator);
            compounds.push(self.compound()?);
        }
        Ok(ComplexSelector { compounds, combinators })
    }

    fn compound(&mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();
        match self.peek() {
            Some('*') => {
                self.pos += 1;
                compound.tag = Some("*".to_string());
            }
            Some(c) if c.is_alphabetic() => {
                compound.tag = Some(self.ident()?.to_ascii_lowercase());
            }
            _ => {}
        }
        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.id = Some(self.ident()?);
                }
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.ident()?);
                }
                Some('[') => {
                    self.pos += 1;
                    compound.attrs.push(self.attribute()?);
                }
                _ => break,
            }
        }
        if compound.is_empty() {
            return Err(match self.peek() {
                Some(found) => SelectorError::Unexpected { found, offset: self.pos },
                None => SelectorError::Empty,
            });
        }
        Ok(compound)
    }

    fn attribute(&mut self) -> Result<AttrSelector, SelectorError> {
        self.skip_ws();
        let name = self.ident()?.to_ascii_lowercase();
        self.skip_ws();
        let selector = match self.peek() {
            Some(']') => AttrSelector::Exists(name),
            Some('=') => {
                self.pos += 1;
                self.skip_ws();
                let value = match self.peek() {
                    Some(quote @ ('"' | '\'')) => {
                        self.pos += 1;
                        let rest = &self.input[self.pos..];
                        let end = rest.find(quote).ok_or(SelectorError::Unterminated("string"))?;
                        let value = rest[..end].to_string();
                        self.pos += end + 1;
                        value
                    }
                    _ => self.ident()?,
                };
                self.skip_ws();
                AttrSelector::Equals(name, value)
            }
            Some(found) => return Err(SelectorError::Unexpected { found, offset: self.pos }),
            None => return Err(SelectorError::Unterminated("attribute selector")),
        };
        match self.peek() {
            Some(']') => {
                self.pos += 1;
                Ok(selector)
            }
            Some(found) => Err(SelectorError::Unexpected { found, offset: self.pos }),
            None => Err(SelectorError::Unterminated("attribute selector")),
        }
    }
}

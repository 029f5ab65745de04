//! Sequence tags: alternating literal residue runs and unknown-mass gaps.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};

/// One tag component. Serialized as `{"literalSequence": "..."}` or `{"gapMass": 123.4}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TagElement {
    #[serde(rename = "literalSequence")]
    Sequence(String),
    #[serde(rename = "gapMass")]
    MassGap(f64),
}

impl TagElement {
    /// Fails on anything the search cannot consume.
    pub fn validate(&self) -> Result<()> {
        match self {
            TagElement::Sequence(s) if s.is_empty() => {
                Err(IndexError::UnsupportedTag("empty literal sequence".to_string()))
            }
            TagElement::Sequence(s) if !s.bytes().all(|b| b.is_ascii_alphabetic()) => {
                Err(IndexError::UnsupportedTag(format!("literal {:?} contains non-residue characters", s)))
            }
            TagElement::MassGap(m) if !m.is_finite() || *m <= 0.0 => {
                Err(IndexError::UnsupportedTag(format!("mass gap {} is not a positive mass", m)))
            }
            _ => Ok(()),
        }
    }
}

/// An ordered tag, parsed from text such as `[97.05]TIDE[156.10]` or from JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(pub Vec<TagElement>);

impl Tag {
    pub fn elements(&self) -> &[TagElement] {
        &self.0
    }
}

impl FromStr for Tag {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.starts_with('{') || s.starts_with("[{") {
            return serde_json::from_str(s).map_err(|e| IndexError::UnsupportedTag(e.to_string()));
        }

        let mut elements = Vec::new();
        let mut literal = String::new();
        let mut chars = s.chars();
        while let Some(ch) = chars.next() {
            match ch {
                '[' => {
                    if !literal.is_empty() {
                        elements.push(TagElement::Sequence(std::mem::take(&mut literal)));
                    }
                    let body: String = chars.by_ref().take_while(|&c| c != ']').collect();
                    let mass: f64 = body
                        .trim()
                        .parse()
                        .map_err(|_| IndexError::UnsupportedTag(format!("bad mass gap [{}]", body)))?;
                    elements.push(TagElement::MassGap(mass));
                }
                c if c.is_ascii_alphabetic() => literal.push(c.to_ascii_uppercase()),
                c if c.is_whitespace() => {}
                c => return Err(IndexError::UnsupportedTag(format!("unexpected character {:?}", c))),
            }
        }
        if !literal.is_empty() {
            elements.push(TagElement::Sequence(literal));
        }
        Ok(Tag(elements))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for element in &self.0 {
            match element {
                TagElement::Sequence(s) => write!(f, "{}", s)?,
                TagElement::MassGap(m) => write!(f, "[{}]", m)?,
            }
        }
        Ok(())
    }
}

//! Block catalogue: the immutable set of macros a floorplan places.
//!
//! Each block carries one or more allowed shape variants. Blocks are
//! identified by a stable integer index assigned in file order; a name map
//! is kept for lookups and for the name-ordered INL/output sequence.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::io::BufRead;

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single allowed shape for a block.
///
/// The column/row multiplicities are carried through to the output file
/// verbatim; they play no role in the search itself.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ShapeVariant {
    pub width: f64,
    pub height: f64,
    pub col_multiple: u32,
    pub row_multiple: u32,
}

/// A hard macro with its allowed shapes.
#[derive(Debug, Clone)]
pub struct Block {
    pub name: String,
    pub variants: Vec<ShapeVariant>,
}

/// Immutable catalogue of blocks, indexed by insertion order.
#[derive(Debug, Clone, Default)]
pub struct BlockCatalog {
    blocks: Vec<Block>,
    index: HashMap<String, usize>,
}

impl BlockCatalog {
    /// Parses a `.block` stream.
    ///
    /// One block per line: a name followed by one or more parenthesised
    /// `(w h c r)` tuples. Whitespace between tokens is arbitrary; every
    /// `(` must have a matching `)` and every block needs at least one
    /// variant. Blank lines are skipped.
    pub fn from_reader(reader: impl BufRead) -> Result<Self> {
        let mut catalog = Self::default();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            let lineno = lineno + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let name_end = trimmed
                .find(char::is_whitespace)
                .unwrap_or(trimmed.len());
            let name = &trimmed[..name_end];
            let mut rest = &trimmed[name_end..];

            let mut variants = Vec::new();
            while let Some(open) = rest.find('(') {
                let close = rest[open..].find(')').map(|c| open + c).ok_or_else(|| {
                    Error::Parse {
                        line: lineno,
                        message: format!("unmatched '(' in block '{name}'"),
                    }
                })?;
                variants.push(parse_variant(&rest[open + 1..close], name, lineno)?);
                rest = &rest[close + 1..];
            }

            if variants.is_empty() {
                return Err(Error::Parse {
                    line: lineno,
                    message: format!("block '{name}' has no shape variants"),
                });
            }

            catalog.index.insert(name.to_string(), catalog.blocks.len());
            catalog.blocks.push(Block {
                name: name.to_string(),
                variants,
            });
        }
        Ok(catalog)
    }

    /// Number of blocks in the catalogue.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns true if the catalogue holds no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Block record for the given index.
    pub fn get(&self, idx: usize) -> &Block {
        &self.blocks[idx]
    }

    /// Index of the block with the given name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Iterates blocks in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }
}

fn parse_variant(segment: &str, name: &str, lineno: usize) -> Result<ShapeVariant> {
    let mut tokens = segment.split_whitespace();
    let mut next_f64 = |what: &str| -> Result<f64> {
        tokens
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| Error::Parse {
                line: lineno,
                message: format!("block '{name}': bad or missing {what}"),
            })
    };
    let width = next_f64("width")?;
    let height = next_f64("height")?;
    let col_multiple = next_f64("column multiplicity")? as u32;
    let row_multiple = next_f64("row multiplicity")? as u32;
    Ok(ShapeVariant {
        width,
        height,
        col_multiple,
        row_multiple,
    })
}

/// Orders block names by non-digit prefix, then by the numeric suffix.
///
/// `MM2` sorts before `MM10`; a name without digits gets suffix value 0.
pub fn compare_block_names(a: &str, b: &str) -> Ordering {
    let (prefix_a, num_a) = split_name(a);
    let (prefix_b, num_b) = split_name(b);
    prefix_a.cmp(prefix_b).then(num_a.cmp(&num_b))
}

fn split_name(name: &str) -> (&str, u64) {
    let digit_start = name
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(name.len());
    let digits: String = name[digit_start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    (&name[..digit_start], digits.parse().unwrap_or(0))
}

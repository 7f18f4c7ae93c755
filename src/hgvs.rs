//! Adapter around the HGVS grammar.
//!
//! The rest of the crate never sees the grammar library's data model: a
//! descriptor string goes in, a [`ParsedHgvs`] comes out. The grammar itself
//! sits behind the [`Grammar`] trait so it can be swapped without touching
//! the region or criteria logic, and the [`PositionResolver`] memoizes
//! parses by the full descriptor string (many criteria and variants refer to
//! the same transcript positions over and over).

use std::str::FromStr;

use hgvs::parser::{CdsFrom, CdsPos, HgvsVariant, NaEdit, ProtLocEdit};
use quick_cache::sync::Cache;

use crate::error::Error;
use crate::region::{Position, Region};

/// Number of parsed descriptors to keep around.
const CACHE_CAPACITY: usize = 100_000;

/// Coordinate system of an HGVS descriptor.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, parse_display::Display, parse_display::FromStr,
)]
pub enum Coordinate {
    #[display("c")]
    Coding,
    #[display("g")]
    Genomic,
    #[display("p")]
    Protein,
}

/// Classification of the single edit a descriptor carries, with the counts
/// needed to derive the net size change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    /// Substitution or deletion-insertion with an explicit deleted sequence.
    Substitution { deleted: i32, inserted: i32 },
    /// Plain deletion of `span` bases.
    Deletion { span: i32 },
    /// Insertion between two neighbouring bases.
    Insertion { inserted: i32 },
    /// Deletion-insertion where only the replaced location is known.
    DeletionInsertion { span: i32, inserted: i32 },
    Duplication { span: i32 },
    Inversion,
    /// No change (`=`).
    Identity,
    /// Protein-level edit; has a location but no base-level size.
    Protein,
}

/// The parts of a parsed descriptor the matching logic needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedHgvs {
    pub coordinate: Coordinate,
    /// Location in the natural 5'→3' order the grammar produced. Never
    /// reordered, so size and frame computations stay directional.
    pub region: Region,
    pub edit: Edit,
}

/// A grammar turns an HGVS descriptor into a [`ParsedHgvs`], or fails.
pub trait Grammar: Send + Sync {
    fn parse(&self, hgvs: &str) -> Result<ParsedHgvs, Error>;
}

/// Split a full descriptor into its coordinate letter, without invoking the
/// grammar. Only `c`, `g` and `p` descriptors are supported.
pub fn coordinate_letter(hgvs: &str) -> Result<&str, Error> {
    let (_, change) = hgvs
        .split_once(':')
        .ok_or_else(|| Error::parse(hgvs, "missing ':' separator"))?;
    let (coordinate, _) = change
        .split_once('.')
        .ok_or_else(|| Error::parse(hgvs, "missing coordinate system"))?;
    Ok(coordinate)
}

/// Grammar implementation backed by the `hgvs` crate parser.
#[derive(Debug, Default)]
pub struct HgvsGrammar;

impl Grammar for HgvsGrammar {
    fn parse(&self, hgvs: &str) -> Result<ParsedHgvs, Error> {
        let coordinate: Coordinate = coordinate_letter(hgvs)?
            .parse()
            .map_err(|_| Error::parse(hgvs, "unsupported coordinate system"))?;

        let variant =
            HgvsVariant::from_str(hgvs).map_err(|e| Error::parse(hgvs, e.to_string()))?;

        match variant {
            HgvsVariant::CdsVariant { loc_edit, .. } => {
                let loc = loc_edit.loc.inner();
                let start = cds_position(&loc.start);
                let end = cds_position(&loc.end);
                let region = Region::new(start, end);
                let span = end.position - start.position + 1;
                let edit = na_edit(loc_edit.edit.inner(), span);
                Ok(ParsedHgvs {
                    coordinate,
                    region,
                    edit,
                })
            }
            HgvsVariant::GenomeVariant { loc_edit, .. } => {
                let loc = loc_edit.loc.inner();
                let start = loc
                    .start
                    .ok_or_else(|| Error::parse(hgvs, "uncertain start position"))?;
                let end = loc
                    .end
                    .ok_or_else(|| Error::parse(hgvs, "uncertain end position"))?;
                let region = Region::new(Position::exonic(start), Position::exonic(end));
                let edit = na_edit(loc_edit.edit.inner(), end - start + 1);
                Ok(ParsedHgvs {
                    coordinate,
                    region,
                    edit,
                })
            }
            HgvsVariant::ProtVariant { loc_edit, .. } => match loc_edit {
                ProtLocEdit::Ordinary { loc, .. } => {
                    let loc = loc.inner();
                    let region = Region::new(
                        Position::exonic(loc.start.number),
                        Position::exonic(loc.end.number),
                    );
                    Ok(ParsedHgvs {
                        coordinate,
                        region,
                        edit: Edit::Protein,
                    })
                }
                _ => Err(Error::parse(hgvs, "protein descriptor without a location")),
            },
            _ => Err(Error::parse(hgvs, "unsupported coordinate system")),
        }
    }
}

/// Convert a parsed CDS point into a [`Position`].
fn cds_position(pos: &CdsPos) -> Position {
    Position {
        downstream: pos.cds_from == CdsFrom::End,
        position: pos.base,
        offset: pos.offset.unwrap_or(0),
    }
}

/// Classify a nucleic acid edit. `span` is the number of bases the location
/// covers and is used when the grammar did not spell out the sequences.
fn na_edit(edit: &NaEdit, span: i32) -> Edit {
    match edit {
        NaEdit::RefAlt {
            reference,
            alternative,
        } => {
            if reference.is_empty() && alternative.is_empty() {
                Edit::Identity
            } else if reference.is_empty() {
                // bare delins: only the replaced location is known
                Edit::DeletionInsertion {
                    span,
                    inserted: alternative.len() as i32,
                }
            } else {
                Edit::Substitution {
                    deleted: reference.len() as i32,
                    inserted: alternative.len() as i32,
                }
            }
        }
        NaEdit::NumAlt { count, alternative } => Edit::DeletionInsertion {
            span: *count,
            inserted: alternative.len() as i32,
        },
        NaEdit::DelRef { reference } => Edit::Deletion {
            span: if reference.is_empty() {
                span
            } else {
                reference.len() as i32
            },
        },
        NaEdit::DelNum { count } => Edit::Deletion { span: *count },
        NaEdit::Ins { alternative } => Edit::Insertion {
            inserted: alternative.len() as i32,
        },
        NaEdit::Dup { reference } => Edit::Duplication {
            span: if reference.is_empty() {
                span
            } else {
                reference.len() as i32
            },
        },
        NaEdit::InvRef { .. } | NaEdit::InvNum { .. } => Edit::Inversion,
    }
}

/// Memoizing front for a [`Grammar`].
///
/// The cache is owned here rather than being global state: tests construct
/// a fresh resolver, and entries are idempotent so the resolver can be
/// shared across threads.
pub struct PositionResolver {
    grammar: Box<dyn Grammar>,
    cache: Cache<String, ParsedHgvs>,
}

impl Default for PositionResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionResolver {
    pub fn new() -> Self {
        Self::with_grammar(Box::new(HgvsGrammar))
    }

    pub fn with_grammar(grammar: Box<dyn Grammar>) -> Self {
        PositionResolver {
            grammar,
            cache: Cache::new(CACHE_CAPACITY),
        }
    }

    /// Parse a descriptor, memoized by the full HGVS string.
    pub fn parse(&self, hgvs: &str) -> Result<ParsedHgvs, Error> {
        if let Some(hit) = self.cache.get(hgvs) {
            return Ok(hit);
        }
        let parsed = self.grammar.parse(hgvs)?;
        self.cache.insert(hgvs.to_string(), parsed.clone());
        Ok(parsed)
    }

    /// The location a descriptor refers to.
    pub fn region(&self, hgvs: &str) -> Result<Region, Error> {
        Ok(self.parse(hgvs)?.region)
    }
}

//! Declarative inclusion/annotation criteria and the files they are read
//! from.
//!
//! A criterion constrains transcript identity (with version), coordinate
//! system, and optionally a consequence term, a region and a reading frame.
//! Criteria are kept in file order: the first matching criterion decides the
//! annotation.

use indexmap::IndexMap;
use itertools::Itertools;

use crate::common::open_read_maybe_gz;
use crate::error::Error;
use crate::hgvs::{coordinate_letter, PositionResolver};
use crate::region::{region_contains, Region};
use crate::variant::Variant;

/// Previously curated variants, coding HGVS string to annotation, in file
/// order. These always win over criteria.
pub type KnownVariants = IndexMap<String, String>;

#[derive(Debug, Clone, PartialEq)]
pub struct Criterion {
    pub identifier: String,
    pub coordinate: String,
    pub consequence: Option<String>,
    pub region: Option<Region>,
    pub frame: Option<u8>,
}

/// Split a versioned identifier into base and version; identifiers without
/// a version (e.g. `chr5`) get version `"0"`.
fn split_version(identifier: &str) -> (&str, &str) {
    identifier.split_once('.').unwrap_or((identifier, "0"))
}

impl Criterion {
    /// A criterion constraining only the transcript identifier, in coding
    /// coordinates.
    pub fn new(identifier: impl Into<String>) -> Self {
        Criterion {
            identifier: identifier.into(),
            coordinate: String::from("c"),
            consequence: None,
            region: None,
            frame: None,
        }
    }

    pub fn with_coordinate(mut self, coordinate: impl Into<String>) -> Self {
        self.coordinate = coordinate.into();
        self
    }

    pub fn with_consequence(mut self, consequence: impl Into<String>) -> Self {
        self.consequence = Some(consequence.into());
        self
    }

    pub fn with_frame(mut self, frame: u8) -> Self {
        self.frame = Some(frame);
        self
    }

    /// Constrain the criterion to a region, given as HGVS position tokens
    /// (e.g. `"100"`, `"-5"`, `"*20-5"`). A missing end bound means the
    /// region covers just the start position. The resolved region must have
    /// `start <= end`; criterion bounds are never silently swapped.
    pub fn with_region(
        mut self,
        start: &str,
        end: Option<&str>,
        resolver: &PositionResolver,
    ) -> Result<Self, Error> {
        // The grammar only accepts complete descriptors, so the bounds are
        // wrapped in a synthetic deletion and only the location is kept.
        let end = end.unwrap_or(start);
        let hgvs = if start == end {
            format!("{}:{}.{}del", self.identifier, self.coordinate, start)
        } else {
            format!("{}:{}.{}_{}del", self.identifier, self.coordinate, start, end)
        };
        let region = resolver.region(&hgvs)?;
        if region.start > region.end {
            return Err(Error::Region {
                message: format!("start {start:?} cannot be after end {end:?}"),
            });
        }
        self.region = Some(region);
        Ok(self)
    }

    /// Whether the variant satisfies all constraints of this criterion.
    pub fn matches(&self, variant: &Variant, resolver: &PositionResolver) -> Result<bool, Error> {
        Ok(self.match_id(variant)?
            && self.match_coordinate(variant)?
            && self.match_consequence(variant)
            && self.match_region(variant, resolver)?
            && self.match_frame(variant, resolver)?)
    }

    /// Identifier match. Bases must be equal; equal bases with differing
    /// versions indicate criteria and variants from incompatible reference
    /// builds and abort the run.
    pub fn match_id(&self, variant: &Variant) -> Result<bool, Error> {
        let (variant_base, variant_version) = split_version(variant.identifier());
        let (base, version) = split_version(&self.identifier);

        if variant_base != base {
            return Ok(false);
        }
        if variant_version == version {
            Ok(true)
        } else {
            Err(Error::VersionMismatch {
                left: variant.hgvs.clone(),
                right: self.identifier.clone(),
            })
        }
    }

    /// The coordinate letter of the variant descriptor must equal the
    /// criterion's coordinate system exactly.
    pub fn match_coordinate(&self, variant: &Variant) -> Result<bool, Error> {
        Ok(coordinate_letter(&variant.hgvs)? == self.coordinate)
    }

    /// Unconstrained, or the consequence term occurs in the variant's terms.
    pub fn match_consequence(&self, variant: &Variant) -> bool {
        match &self.consequence {
            None => true,
            Some(consequence) => variant.consequences.iter().any(|c| c == consequence),
        }
    }

    /// Unconstrained, or the variant's location overlaps the region
    /// (inclusive: touching in a single coordinate counts).
    pub fn match_region(
        &self,
        variant: &Variant,
        resolver: &PositionResolver,
    ) -> Result<bool, Error> {
        match &self.region {
            None => Ok(true),
            Some(region) => Ok(resolver.region(&variant.hgvs)?.overlaps(region)),
        }
    }

    /// Unconstrained, or the variant's reading frame equals the criterion's.
    /// Requesting the frame of a variant outside the CDS is an error that
    /// propagates.
    pub fn match_frame(
        &self,
        variant: &Variant,
        resolver: &PositionResolver,
    ) -> Result<bool, Error> {
        match self.frame {
            None => Ok(true),
            Some(frame) => Ok(variant.frame(resolver)? == frame),
        }
    }

    /// Whether any variant matching `other` would also match `self`. Used by
    /// the consistency check to verify every annotation rule is reachable
    /// through the inclusion rules.
    pub fn contains(&self, other: &Criterion) -> Result<bool, Error> {
        let (base, version) = split_version(&self.identifier);
        let (other_base, other_version) = split_version(&other.identifier);
        if base != other_base {
            return Ok(false);
        }
        if version != other_version {
            return Err(Error::VersionMismatch {
                left: self.identifier.clone(),
                right: other.identifier.clone(),
            });
        }

        if self.coordinate != other.coordinate {
            return Ok(false);
        }

        if let Some(consequence) = &self.consequence {
            if other.consequence.as_ref() != Some(consequence) {
                return Ok(false);
            }
        }

        // A criterion without a region contains any region; a region
        // constraint never contains an unconstrained criterion.
        if self.region.is_some()
            && !region_contains(self.region.as_ref(), other.region.as_ref())
        {
            return Ok(false);
        }

        if let Some(frame) = self.frame {
            if other.frame != Some(frame) {
                return Ok(false);
            }
        }

        Ok(true)
    }
}

/// Criteria with their annotations, in file order. The order is the
/// tie-break rule: the first matching criterion wins.
#[derive(Debug, Default)]
pub struct CriteriaList {
    entries: Vec<(Criterion, String)>,
}

impl CriteriaList {
    pub fn new(entries: Vec<(Criterion, String)>) -> Self {
        CriteriaList { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Criterion, &str)> {
        self.entries
            .iter()
            .map(|(criterion, annotation)| (criterion, annotation.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read criteria from a TSV file. `#`-prefixed lines are comments; the
    /// header must contain `transcript_id` and may contain `consequence`,
    /// `start`, `end`, `frame` and `annotation`. Empty cells leave the field
    /// unconstrained; a missing `annotation` column yields empty annotations.
    pub fn load(path: &str, resolver: &PositionResolver) -> Result<Self, Error> {
        let reader = open_read_maybe_gz(path).map_err(|e| Error::config(path, e.to_string()))?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .comment(Some(b'#'))
            .flexible(true)
            .from_reader(reader);

        let headers = header_columns(&mut reader, path)?;
        let transcript_id = require_column(&headers, "transcript_id", path)?;
        let consequence = column(&headers, "consequence");
        let start = column(&headers, "start");
        let end = column(&headers, "end");
        let frame = column(&headers, "frame");
        let annotation = column(&headers, "annotation");

        let mut entries = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| Error::config(path, e.to_string()))?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            let cell =
                |idx: Option<usize>| idx.and_then(|i| record.get(i)).filter(|v| !v.is_empty());

            let identifier = cell(Some(transcript_id)).ok_or_else(|| {
                Error::config(path, format!("line {line}: transcript_id must be set"))
            })?;
            let mut criterion = Criterion::new(identifier);

            if let Some(consequence) = cell(consequence) {
                criterion = criterion.with_consequence(consequence);
            }

            match (cell(start), cell(end)) {
                (Some(start), end) => {
                    criterion = criterion.with_region(start, end, resolver).map_err(|e| {
                        Error::config(path, format!("line {line}: {e}"))
                    })?;
                }
                (None, Some(_)) => {
                    return Err(Error::config(
                        path,
                        format!("line {line}: end specified without start"),
                    ));
                }
                (None, None) => (),
            }

            if let Some(value) = cell(frame) {
                let frame: u8 = value.parse().map_err(|_| {
                    Error::config(path, format!("line {line}: invalid frame {value:?}"))
                })?;
                if frame > 2 {
                    return Err(Error::config(
                        path,
                        format!("line {line}: frame must be 0, 1 or 2, not {frame}"),
                    ));
                }
                criterion = criterion.with_frame(frame);
            }

            let annotation = cell(annotation).unwrap_or_default().to_string();
            entries.push((criterion, annotation));
        }

        tracing::debug!("loaded {} criteria from {}", entries.len(), path);
        Ok(CriteriaList::new(entries))
    }
}

/// Read known variants from a TSV file with `variant` and `annotation`
/// columns, both required per row.
pub fn read_known_variants(path: &str) -> Result<KnownVariants, Error> {
    let reader = open_read_maybe_gz(path).map_err(|e| Error::config(path, e.to_string()))?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .comment(Some(b'#'))
        .flexible(true)
        .from_reader(reader);

    let headers = header_columns(&mut reader, path)?;
    let variant = require_column(&headers, "variant", path)?;
    let annotation = require_column(&headers, "annotation", path)?;

    let mut known_variants = KnownVariants::new();
    for result in reader.records() {
        let record = result.map_err(|e| Error::config(path, e.to_string()))?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let cell = |i: usize| record.get(i).filter(|v| !v.is_empty());

        let variant = cell(variant)
            .ok_or_else(|| Error::config(path, format!("line {line}: variant must be set")))?;
        let annotation = cell(annotation)
            .ok_or_else(|| Error::config(path, format!("line {line}: annotation must be set")))?;
        known_variants.insert(variant.to_string(), annotation.to_string());
    }

    tracing::debug!("loaded {} known variants from {}", known_variants.len(), path);
    Ok(known_variants)
}

/// Read the header row and reject duplicate column names.
fn header_columns<R: std::io::Read>(
    reader: &mut csv::Reader<R>,
    path: &str,
) -> Result<Vec<String>, Error> {
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| Error::config(path, e.to_string()))?
        .iter()
        .map(String::from)
        .collect();
    let duplicates: Vec<&String> = headers.iter().duplicates().collect();
    if !duplicates.is_empty() {
        return Err(Error::config(
            path,
            format!("duplicate header column(s) {duplicates:?}"),
        ));
    }
    Ok(headers)
}

fn column(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

fn require_column(headers: &[String], name: &str, path: &str) -> Result<usize, Error> {
    column(headers, name)
        .ok_or_else(|| Error::config(path, format!("missing required column {name:?}")))
}

//! An observed variant: one HGVS descriptor plus the consequence terms the
//! effect predictor assigned to it.

use crate::error::Error;
use crate::hgvs::{Coordinate, Edit, PositionResolver};
use crate::vep::VepRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub hgvs: String,
    pub consequences: Vec<String>,
}

impl Variant {
    pub fn new(hgvs: impl Into<String>, consequences: Vec<String>) -> Self {
        Variant {
            hgvs: hgvs.into(),
            consequences,
        }
    }

    /// All variants of a VEP record: one per present HGVS descriptor among
    /// `hgvsg`, `hgvsc`, `hgvsp` (in that order) of every transcript
    /// consequence.
    pub fn from_record(record: &VepRecord) -> Vec<Variant> {
        let mut variants = Vec::new();
        for tc in &record.transcript_consequences {
            for hgvs in [&tc.hgvsg, &tc.hgvsc, &tc.hgvsp].into_iter().flatten() {
                variants.push(Variant::new(hgvs.clone(), tc.consequence_terms.clone()));
            }
        }
        variants
    }

    /// The identifier part of the descriptor, before the `:`.
    pub fn identifier(&self) -> &str {
        self.hgvs.split(':').next().unwrap_or(&self.hgvs)
    }

    /// Net change in base count, inserted minus deleted.
    pub fn size(&self, resolver: &PositionResolver) -> Result<i32, Error> {
        let parsed = resolver.parse(&self.hgvs)?;
        match parsed.edit {
            Edit::Substitution { deleted, inserted } => Ok(inserted - deleted),
            Edit::Deletion { span } => Ok(-span),
            Edit::Insertion { inserted } => Ok(inserted),
            Edit::DeletionInsertion { span, inserted } => Ok(inserted - span),
            Edit::Duplication { span } => Ok(span),
            Edit::Inversion | Edit::Identity => Ok(0),
            Edit::Protein => Err(Error::parse(
                &self.hgvs,
                "size is not defined for protein descriptors",
            )),
        }
    }

    /// Reading frame shift, `size() mod 3`.
    ///
    /// Only defined for coding descriptors whose location lies fully inside
    /// the CDS; anything intronic, 5'-UTR or downstream of the stop codon
    /// has no defined frame.
    pub fn frame(&self, resolver: &PositionResolver) -> Result<u8, Error> {
        let parsed = resolver.parse(&self.hgvs)?;
        if parsed.coordinate != Coordinate::Coding {
            return Err(Error::frame_undefined(
                &self.hgvs,
                "only coding (c.) descriptors have a frame",
            ));
        }
        if parsed.region.start.outside_cds() || parsed.region.end.outside_cds() {
            return Err(Error::frame_undefined(
                &self.hgvs,
                "location lies outside the coding sequence",
            ));
        }
        Ok(self.size(resolver)?.rem_euclid(3) as u8)
    }
}

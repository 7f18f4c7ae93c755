//! The VEP record data model and the annotation resolver.
//!
//! A record is one line of VEP JSON output. Only the fields the resolver
//! touches are modeled explicitly; everything else rides along in `extra`
//! maps so records round-trip unchanged.

use std::collections::BTreeMap;

use crate::consequence::Consequence;
use crate::criteria::{CriteriaList, KnownVariants};
use crate::error::Error;
use crate::hgvs::PositionResolver;
use crate::variant::Variant;

/// Population frequencies of a colocated variant: allele to population to
/// allele frequency.
pub type Frequencies = BTreeMap<String, BTreeMap<String, f64>>;

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TranscriptConsequence {
    pub hgvsg: Option<String>,
    pub hgvsc: Option<String>,
    pub hgvsp: Option<String>,
    #[serde(default)]
    pub consequence_terms: Vec<String>,
    /// Curation annotation, set by the resolver.
    pub annotation: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ColocatedVariant {
    pub frequencies: Option<Frequencies>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VepRecord {
    /// The raw input line VEP was given, e.g. a VCF line.
    pub input: Option<String>,
    pub most_severe_consequence: Option<String>,
    #[serde(default)]
    pub transcript_consequences: Vec<TranscriptConsequence>,
    pub colocated_variants: Option<Vec<ColocatedVariant>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl VepRecord {
    /// A readable genomic location for error messages, derived from the
    /// input line.
    pub fn location(&self) -> String {
        match self.input.as_deref() {
            Some(input) => {
                let mut fields = input.split('\t');
                match (fields.next(), fields.next()) {
                    (Some(chrom), Some(pos)) => format!("{chrom}:{pos}"),
                    _ => String::from("unknown location"),
                }
            }
            None => String::from("unknown location"),
        }
    }

    /// Filter the transcript consequences and annotate the survivors.
    ///
    /// Consequences without a coding descriptor (`hgvsc`) cannot be matched
    /// and are dropped. Known variants always win over criteria; otherwise
    /// the first matching criterion in file order decides the annotation,
    /// and consequences matching nothing are dropped. Afterwards the
    /// most-severe-consequence field is recomputed from the survivors.
    pub fn filter_annotate(
        &mut self,
        known_variants: &KnownVariants,
        criteria: &CriteriaList,
        resolver: &PositionResolver,
    ) -> Result<(), Error> {
        let mut filtered = Vec::new();
        for mut tc in std::mem::take(&mut self.transcript_consequences) {
            let Some(hgvsc) = tc.hgvsc.clone() else {
                continue;
            };

            if let Some(annotation) = known_variants.get(&hgvsc) {
                tc.annotation = Some(annotation.clone());
                filtered.push(tc);
                continue;
            }

            let variant = Variant::new(hgvsc, tc.consequence_terms.clone());
            for (criterion, annotation) in criteria.iter() {
                if criterion.matches(&variant, resolver)? {
                    tc.annotation = Some(annotation.to_string());
                    filtered.push(tc);
                    break;
                }
            }
        }

        self.transcript_consequences = filtered;
        self.update_most_severe();
        Ok(())
    }

    /// Recompute the most severe consequence over all remaining transcript
    /// consequences. If no ranked term remains the field is left untouched.
    pub fn update_most_severe(&mut self) {
        let most_severe = Consequence::most_severe(
            self.transcript_consequences
                .iter()
                .flat_map(|tc| tc.consequence_terms.iter())
                .map(String::as_str),
        );
        if let Some(consequence) = most_severe {
            self.most_severe_consequence = Some(consequence.to_string());
        }
    }

    /// Extract the population frequencies from the colocated variants.
    ///
    /// Multiple colocated variants may carry a frequencies block as long as
    /// the blocks are identical; differing blocks, or a block with more than
    /// one allele key, violate the assumed record shape and are fatal.
    fn extract_frequencies(&self) -> Result<Frequencies, Error> {
        let mut frequencies = Frequencies::new();
        for colocated in self.colocated_variants.iter().flatten() {
            if let Some(block) = &colocated.frequencies {
                if frequencies.is_empty() {
                    frequencies = block.clone();
                } else if block != &frequencies {
                    return Err(Error::AmbiguousFrequency {
                        location: self.location(),
                        reason: String::from(
                            "multiple colocated variants with differing 'frequencies'",
                        ),
                    });
                }
            }
        }

        if frequencies.len() > 1 {
            return Err(Error::AmbiguousFrequency {
                location: self.location(),
                reason: String::from("'frequencies' entry with multiple allele keys"),
            });
        }

        Ok(frequencies)
    }

    /// The allele frequency of the given population, 0 if the record has no
    /// frequency data or the population is missing.
    pub fn population_frequency(&self, population: &str) -> Result<f64, Error> {
        let frequencies = self.extract_frequencies()?;
        Ok(frequencies
            .values()
            .next()
            .and_then(|populations| populations.get(population))
            .copied()
            .unwrap_or(0.0))
    }

    /// Whether the population allele frequency is strictly above the
    /// threshold.
    pub fn above_population_threshold(
        &self,
        population: &str,
        threshold: f64,
    ) -> Result<bool, Error> {
        Ok(self.population_frequency(population)? > threshold)
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::VepRecord;
    use crate::criteria::{CriteriaList, Criterion, KnownVariants};
    use crate::error::Error;
    use crate::hgvs::PositionResolver;

    /// One record with three transcript consequences, each matchable by one
    /// of the criteria from `criteria()` and one of the known variants.
    fn record() -> VepRecord {
        serde_json::from_str(
            r#"{
                "transcript_consequences": [
                    {"hgvsc": "ENST1.1:c.100del", "consequence_terms": ["frameshift"]},
                    {"hgvsc": "ENST2.1:c.100A>T", "consequence_terms": ["missense", "splice site"]},
                    {"hgvsc": "ENST3.1:c.100+100A>T", "consequence_terms": []}
                ]
            }"#,
        )
        .unwrap()
    }

    fn criteria(resolver: &PositionResolver, indices: &[usize], annotation: &str) -> CriteriaList {
        let all = vec![
            Criterion::new("ENST1.1").with_consequence("frameshift"),
            Criterion::new("ENST2.1")
                .with_consequence("splice site")
                .with_region("1", Some("200"), resolver)
                .unwrap(),
            Criterion::new("ENST3.1")
                .with_region("100+20", Some("101-20"), resolver)
                .unwrap(),
        ];
        let entries = indices
            .iter()
            .map(|&i| (all[i].clone(), annotation.to_string()))
            .collect();
        CriteriaList::new(entries)
    }

    fn known(indices: &[usize]) -> KnownVariants {
        let all = [
            "ENST1.1:c.100del",
            "ENST2.1:c.100A>T",
            "ENST3.1:c.100+100A>T",
        ];
        indices
            .iter()
            .map(|&i| (all[i].to_string(), "var".to_string()))
            .collect()
    }

    fn annotations(record: &VepRecord) -> Vec<String> {
        record
            .transcript_consequences
            .iter()
            .map(|tc| tc.annotation.clone().unwrap_or_default())
            .collect()
    }

    #[test]
    fn filter_annotate_empty() {
        let resolver = PositionResolver::new();
        let mut record = record();
        record
            .filter_annotate(&KnownVariants::new(), &CriteriaList::default(), &resolver)
            .unwrap();
        assert!(record.transcript_consequences.is_empty());
    }

    #[rstest]
    // all three criteria set: all annotated from criteria
    #[case(&[0, 1, 2], &[], vec!["crit", "crit", "crit"])]
    #[case(&[0, 1], &[], vec!["crit", "crit"])]
    #[case(&[0], &[], vec!["crit"])]
    // known variants win over criteria, unconditionally
    #[case(&[0, 1, 2], &[0, 1, 2], vec!["var", "var", "var"])]
    // known variants survive even without a matching criterion
    #[case(&[], &[0, 1, 2], vec!["var", "var", "var"])]
    #[case(&[0], &[1, 2], vec!["crit", "var", "var"])]
    // the second consequence is not a known variant, falls through to criteria
    #[case(&[0, 1, 2], &[0, 2], vec!["var", "crit", "var"])]
    fn filter_annotate_precedence(
        #[case] criteria_indices: &[usize],
        #[case] known_indices: &[usize],
        #[case] expected: Vec<&str>,
    ) {
        let resolver = PositionResolver::new();
        let criteria = criteria(&resolver, criteria_indices, "crit");
        let known_variants = known(known_indices);

        let mut record = record();
        record
            .filter_annotate(&known_variants, &criteria, &resolver)
            .unwrap();
        assert_eq!(annotations(&record), expected);
    }

    #[test]
    fn known_variant_survives_without_criteria() {
        let resolver = PositionResolver::new();
        let mut record = record();
        record
            .filter_annotate(&known(&[1]), &CriteriaList::default(), &resolver)
            .unwrap();
        assert_eq!(annotations(&record), vec!["var"]);
    }

    #[test]
    fn first_match_wins() {
        let resolver = PositionResolver::new();
        // two criteria both match the first consequence; the broader one is
        // listed second and must lose regardless of specificity
        let criteria = CriteriaList::new(vec![
            (
                Criterion::new("ENST1.1").with_consequence("frameshift"),
                String::from("specific"),
            ),
            (Criterion::new("ENST1.1"), String::from("broad")),
        ]);
        let mut specific_first = record();
        specific_first
            .filter_annotate(&KnownVariants::new(), &criteria, &resolver)
            .unwrap();
        assert_eq!(annotations(&specific_first)[0], "specific");

        let criteria = CriteriaList::new(vec![
            (Criterion::new("ENST1.1"), String::from("broad")),
            (
                Criterion::new("ENST1.1").with_consequence("frameshift"),
                String::from("specific"),
            ),
        ]);
        let mut broad_first = record();
        broad_first
            .filter_annotate(&KnownVariants::new(), &criteria, &resolver)
            .unwrap();
        assert_eq!(annotations(&broad_first)[0], "broad");
    }

    #[test]
    fn consequences_without_hgvsc_are_dropped() {
        let resolver = PositionResolver::new();
        let mut record: VepRecord = serde_json::from_str(
            r#"{
                "transcript_consequences": [
                    {"hgvsg": "chr1:g.100del", "consequence_terms": ["frameshift"]}
                ]
            }"#,
        )
        .unwrap();
        let criteria = CriteriaList::new(vec![(Criterion::new("chr1"), String::new())]);
        record
            .filter_annotate(&KnownVariants::new(), &criteria, &resolver)
            .unwrap();
        assert!(record.transcript_consequences.is_empty());
    }

    #[test]
    fn update_most_severe() {
        let mut record: VepRecord = serde_json::from_str(
            r#"{
                "transcript_consequences": [
                    {"consequence_terms": ["transcript_ablation"]},
                    {"consequence_terms": ["missense_variant"]}
                ]
            }"#,
        )
        .unwrap();

        record.update_most_severe();
        assert_eq!(
            record.most_severe_consequence.as_deref(),
            Some("transcript_ablation")
        );

        record.transcript_consequences.remove(0);
        record.update_most_severe();
        assert_eq!(
            record.most_severe_consequence.as_deref(),
            Some("missense_variant")
        );

        // no ranked terms left: the field is left untouched
        record.transcript_consequences.clear();
        record.update_most_severe();
        assert_eq!(
            record.most_severe_consequence.as_deref(),
            Some("missense_variant")
        );
    }

    #[test]
    fn empty_record_does_not_crash() {
        let resolver = PositionResolver::new();
        let mut record = VepRecord::default();
        let criteria = CriteriaList::new(vec![(Criterion::new("ENST1.1"), String::new())]);
        record
            .filter_annotate(&KnownVariants::new(), &criteria, &resolver)
            .unwrap();
        record.update_most_severe();
        assert!(record.transcript_consequences.is_empty());
        assert!(record.most_severe_consequence.is_none());
    }

    #[rstest]
    // no colocated variants at all
    #[case(r#"{}"#, 0.0)]
    #[case(r#"{"colocated_variants": []}"#, 0.0)]
    // frequency block in any position
    #[case(
        r#"{"colocated_variants": [{"frequencies": {"T": {"gnomAD": 0.42}}}]}"#,
        0.42
    )]
    #[case(
        r#"{"colocated_variants": [{}, {"some": "nonsense"}, {"frequencies": {"T": {"gnomAD": 0.42}}}]}"#,
        0.42
    )]
    // identical duplicate blocks are tolerated
    #[case(
        r#"{"colocated_variants": [{"frequencies": {"T": {"gnomAD": 0.5}}}, {"frequencies": {"T": {"gnomAD": 0.5}}}]}"#,
        0.5
    )]
    // population missing from the block
    #[case(r#"{"colocated_variants": [{"frequencies": {"T": {}}}]}"#, 0.0)]
    fn population_frequency(#[case] json: &str, #[case] expected: f64) {
        let record: VepRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.population_frequency("gnomAD").unwrap(), expected);
    }

    #[rstest]
    // differing frequency blocks
    #[case(
        r#"{"colocated_variants": [{"frequencies": {"T": {"af": 0.9}}}, {"frequencies": {"T": {"af": 0.8}}}]}"#
    )]
    // a single block with multiple allele keys
    #[case(r#"{"colocated_variants": [{"frequencies": {"T": {}, "A": {}}}]}"#)]
    fn ambiguous_frequencies(#[case] json: &str) {
        let record: VepRecord = serde_json::from_str(json).unwrap();
        assert!(matches!(
            record.population_frequency("gnomAD"),
            Err(Error::AmbiguousFrequency { .. })
        ));
    }

    #[rstest]
    #[case("gnomAD", 0.41999, true)]
    #[case("gnomAD", 0.42, false)]
    #[case("gnomAD", 0.43, false)]
    // missing population counts as frequency 0
    #[case("Missing", 1.0, false)]
    fn above_population_threshold(
        #[case] population: &str,
        #[case] threshold: f64,
        #[case] expected: bool,
    ) {
        let record: VepRecord = serde_json::from_str(
            r#"{"colocated_variants": [{"frequencies": {"T": {"gnomAD": 0.42}}}]}"#,
        )
        .unwrap();
        assert_eq!(
            record
                .above_population_threshold(population, threshold)
                .unwrap(),
            expected
        );
    }

    #[test]
    fn location() {
        let record: VepRecord = serde_json::from_str(
            r#"{"input": "chr13\t28034118\t.\tA\tT\t.\t.\t."}"#,
        )
        .unwrap();
        assert_eq!(record.location(), "chr13:28034118");
        assert_eq!(VepRecord::default().location(), "unknown location");
    }

    #[test]
    fn extra_fields_round_trip() {
        let json = r#"{"assembly_name":"GRCh38","most_severe_consequence":"missense_variant","transcript_consequences":[{"consequence_terms":["missense_variant"],"gene_id":"gene1","hgvsc":"ENST1.1:c.100A>T"}]}"#;
        let record: VepRecord = serde_json::from_str(json).unwrap();
        assert_eq!(
            record.extra.get("assembly_name"),
            Some(&serde_json::json!("GRCh38"))
        );
        assert_eq!(
            record.transcript_consequences[0].extra.get("gene_id"),
            Some(&serde_json::json!("gene1"))
        );

        // unmodeled keys survive a round trip, keys sorted
        let value = serde_json::to_value(&record).unwrap();
        let round_trip: VepRecord = serde_json::from_value(value).unwrap();
        assert_eq!(round_trip, record);
    }
}

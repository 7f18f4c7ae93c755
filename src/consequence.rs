//! Severity-ranked consequence terms.
//!
//! The ranking is the Ensembl VEP ordering, most severe first; see
//! https://www.ensembl.org/info/genome/variation/prediction/predicted_data.html
//! The derived `Ord` follows declaration order, so the minimum of a set of
//! consequences is the most severe one.

use parse_display::{Display, FromStr};
use strum::IntoEnumIterator;

#[derive(
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Clone,
    Copy,
    Display,
    FromStr,
    strum::EnumIter,
)]
#[display(style = "snake_case")]
pub enum Consequence {
    TranscriptAblation,
    SpliceAcceptorVariant,
    SpliceDonorVariant,
    StopGained,
    FrameshiftVariant,
    StopLost,
    StartLost,
    TranscriptAmplification,
    InframeInsertion,
    InframeDeletion,
    MissenseVariant,
    ProteinAlteringVariant,
    SpliceRegionVariant,
    #[display("splice_donor_5th_base_variant")]
    SpliceDonorFifthBaseVariant,
    SpliceDonorRegionVariant,
    SplicePolypyrimidineTractVariant,
    IncompleteTerminalCodonVariant,
    StartRetainedVariant,
    StopRetainedVariant,
    SynonymousVariant,
    CodingSequenceVariant,
    #[display("mature_miRNA_variant")]
    MatureMirnaVariant,
    #[display("5_prime_UTR_variant")]
    FivePrimeUtrVariant,
    #[display("3_prime_UTR_variant")]
    ThreePrimeUtrVariant,
    NonCodingTranscriptExonVariant,
    IntronVariant,
    #[display("NMD_transcript_variant")]
    NmdTranscriptVariant,
    NonCodingTranscriptVariant,
    UpstreamGeneVariant,
    DownstreamGeneVariant,
    #[display("TFBS_ablation")]
    TfbsAblation,
    #[display("TFBS_amplification")]
    TfbsAmplification,
    #[display("TF_binding_site_variant")]
    TfBindingSiteVariant,
    RegulatoryRegionAblation,
    RegulatoryRegionAmplification,
    FeatureElongation,
    RegulatoryRegionVariant,
    FeatureTruncation,
    IntergenicVariant,
}

impl Consequence {
    /// Return vector of all values of `Consequence`, most severe first.
    pub fn all() -> Vec<Self> {
        Self::iter().collect()
    }

    /// The most severe of a set of terms; terms outside the ranking are
    /// ignored.
    pub fn most_severe<'a>(terms: impl IntoIterator<Item = &'a str>) -> Option<Consequence> {
        terms
            .into_iter()
            .filter_map(|term| term.parse::<Consequence>().ok())
            .min()
    }
}

//! Implementation of the `check` subcommand: verify the internal
//! consistency of filter criteria, annotation criteria and known variants.

use clap::Parser;

use crate::criteria::{read_known_variants, CriteriaList};
use crate::hgvs::PositionResolver;
use crate::variant::Variant;

/// Command line arguments for `check` sub command.
#[derive(Parser, Debug)]
#[command(about = "Check consistency of filter and annotation criteria", long_about = None)]
pub struct Args {
    /// Path to the filter criteria TSV file.
    #[arg(long)]
    pub path_filter_criteria: String,
    /// Path to the annotation criteria TSV file.
    #[arg(long)]
    pub path_annotation_criteria: String,
    /// Path to the known variants TSV file.
    #[arg(long)]
    pub path_known_variants: Option<String>,
}

/// Main entry point for the `check` sub command.
///
/// Every annotation criterion must be contained in at least one filter
/// criterion, otherwise it can never be applied. Every known variant must
/// match at least one filter criterion, otherwise it can never be reported.
pub fn run(_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    let resolver = PositionResolver::new();
    let filter_criteria = CriteriaList::load(&args.path_filter_criteria, &resolver)?;
    let annotation_criteria = CriteriaList::load(&args.path_annotation_criteria, &resolver)?;

    let known_variants = match &args.path_known_variants {
        Some(path) => read_known_variants(path)?
            .into_iter()
            .map(|(hgvs, _)| Variant::new(hgvs, Vec::new()))
            .collect(),
        None => Vec::new(),
    };

    let mut errors = 0;

    for (annotation, _) in annotation_criteria.iter() {
        let mut contained = false;
        for (filter, _) in filter_criteria.iter() {
            if filter.contains(annotation)? {
                tracing::debug!("annotation criterion {:?} contained in {:?}", annotation, filter);
                contained = true;
                break;
            }
        }
        if !contained {
            tracing::error!("annotation criterion can never be met: {:?}", annotation);
            errors += 1;
        }
    }

    for variant in &known_variants {
        let mut matched = false;
        for (filter, _) in filter_criteria.iter() {
            if filter.matches(variant, &resolver)? {
                tracing::debug!("known variant {:?} matches {:?}", variant, filter);
                matched = true;
                break;
            }
        }
        if !matched {
            tracing::error!("known variant can never be found: {:?}", variant);
            errors += 1;
        }
    }

    if errors > 0 {
        anyhow::bail!("found {} consistency error(s)", errors);
    }
    tracing::info!(
        "all {} annotation criteria and {} known variants are consistent",
        annotation_criteria.len(),
        known_variants.len()
    );
    Ok(())
}

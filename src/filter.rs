//! Implementation of the `filter` subcommand: filter and annotate VEP
//! transcript consequences using curated criteria and known variants.

use std::io::{BufRead, Write};

use clap::Parser;

use crate::common::open_read_maybe_gz;
use crate::criteria::{read_known_variants, CriteriaList, KnownVariants};
use crate::hgvs::PositionResolver;
use crate::vep::VepRecord;

/// Command line arguments for `filter` sub command.
#[derive(Parser, Debug)]
#[command(about = "Filter and annotate VEP output records", long_about = None)]
pub struct Args {
    /// Path to the input VEP JSON file (plain text or gzip, one record per
    /// line).
    #[arg(long)]
    pub path_input: String,
    /// Path to the output file, default is to write to stdout.
    #[arg(long)]
    pub path_output: Option<String>,
    /// Path to the criteria TSV file.
    #[arg(long)]
    pub path_criteria: String,
    /// Path to the known variants TSV file.
    #[arg(long)]
    pub path_known_variants: Option<String>,
    /// Name of the population to use for the frequency filter.
    #[arg(long, default_value = "gnomAD")]
    pub population: String,
    /// Records with a population allele frequency above this threshold are
    /// excluded.
    #[arg(long, default_value_t = 0.05)]
    pub frequency: f64,
    /// Also write records for which no transcript consequence survived.
    #[arg(long, default_value_t = false)]
    pub keep_empty: bool,
}

/// Main entry point for the `filter` sub command.
pub fn run(_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!("loading criteria from {}", args.path_criteria);
    let resolver = PositionResolver::new();
    let criteria = CriteriaList::load(&args.path_criteria, &resolver)?;
    tracing::info!("loaded {} criteria", criteria.len());

    let known_variants = match &args.path_known_variants {
        Some(path) => {
            tracing::info!("loading known variants from {}", path);
            read_known_variants(path)?
        }
        None => KnownVariants::new(),
    };

    let reader = open_read_maybe_gz(&args.path_input)?;
    let mut writer: Box<dyn Write> = match &args.path_output {
        Some(path) => Box::new(std::io::BufWriter::new(std::fs::File::create(path)?)),
        None => Box::new(std::io::stdout().lock()),
    };

    let stats = filter_records(
        reader,
        &mut writer,
        &known_variants,
        &criteria,
        &resolver,
        args,
    )?;
    writer.flush()?;
    tracing::info!(
        "processed {} records, wrote {}, {} above frequency threshold, {} left empty",
        stats.total,
        stats.written,
        stats.above_threshold,
        stats.emptied
    );

    Ok(())
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Stats {
    total: usize,
    written: usize,
    above_threshold: usize,
    emptied: usize,
}

/// Process all records from `reader`, writing survivors to `writer` as one
/// JSON object per line with sorted keys.
fn filter_records(
    reader: Box<dyn BufRead>,
    writer: &mut dyn Write,
    known_variants: &KnownVariants,
    criteria: &CriteriaList,
    resolver: &PositionResolver,
    args: &Args,
) -> Result<Stats, anyhow::Error> {
    let mut stats = Stats::default();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        stats.total += 1;

        let mut record: VepRecord = serde_json::from_str(&line).map_err(|e| {
            anyhow::anyhow!("{}: line {}: invalid record: {}", args.path_input, lineno + 1, e)
        })?;

        if record.above_population_threshold(&args.population, args.frequency)? {
            tracing::debug!(
                "dropping {}: {} frequency above {}",
                record.location(),
                args.population,
                args.frequency
            );
            stats.above_threshold += 1;
            continue;
        }

        record.filter_annotate(known_variants, criteria, resolver)?;
        if record.transcript_consequences.is_empty() {
            stats.emptied += 1;
            if !args.keep_empty {
                tracing::trace!("dropping {}: no consequence survived", record.location());
                continue;
            }
        }

        // `to_value` rebuilds the maps, which sorts the keys.
        let value = serde_json::to_value(&record)?;
        serde_json::to_writer(&mut *writer, &value)?;
        writer.write_all(b"\n")?;
        stats.written += 1;
    }

    Ok(stats)
}

#[cfg(test)]
mod test {
    use std::io::BufRead;

    use pretty_assertions::assert_eq;

    use super::{filter_records, Args, Stats};
    use crate::criteria::{CriteriaList, Criterion, KnownVariants};
    use crate::hgvs::PositionResolver;

    fn args() -> Args {
        Args {
            path_input: String::from("test.json"),
            path_output: None,
            path_criteria: String::new(),
            path_known_variants: None,
            population: String::from("gnomAD"),
            frequency: 0.05,
            keep_empty: false,
        }
    }

    fn reader(lines: &str) -> Box<dyn BufRead> {
        Box::new(std::io::Cursor::new(lines.as_bytes().to_vec()))
    }

    #[test]
    fn filter_records_end_to_end() -> Result<(), anyhow::Error> {
        let input = concat!(
            // matches the criterion, survives annotated
            r#"{"transcript_consequences": [{"hgvsc": "ENST1.1:c.100del", "consequence_terms": ["frameshift_variant"]}]}"#,
            "\n",
            // too frequent in gnomAD, dropped before matching
            r#"{"colocated_variants": [{"frequencies": {"T": {"gnomAD": 0.9}}}], "transcript_consequences": [{"hgvsc": "ENST1.1:c.100del", "consequence_terms": ["frameshift_variant"]}]}"#,
            "\n",
            // no matching criterion, record left empty and dropped
            r#"{"transcript_consequences": [{"hgvsc": "ENST9.1:c.100del", "consequence_terms": []}]}"#,
            "\n",
        );

        let resolver = PositionResolver::new();
        let criteria = CriteriaList::new(vec![(
            Criterion::new("ENST1.1").with_consequence("frameshift_variant"),
            String::from("curated"),
        )]);

        let mut output = Vec::new();
        let stats = filter_records(
            reader(input),
            &mut output,
            &KnownVariants::new(),
            &criteria,
            &resolver,
            &args(),
        )?;

        assert_eq!(
            stats,
            Stats {
                total: 3,
                written: 1,
                above_threshold: 1,
                emptied: 1
            }
        );
        let output = String::from_utf8(output)?;
        assert_eq!(
            output,
            concat!(
                r#"{"most_severe_consequence":"frameshift_variant","transcript_consequences":"#,
                r#"[{"annotation":"curated","consequence_terms":["frameshift_variant"],"hgvsc":"ENST1.1:c.100del"}]}"#,
                "\n"
            )
        );

        Ok(())
    }

    #[test]
    fn keep_empty_records() -> Result<(), anyhow::Error> {
        let input = r#"{"transcript_consequences": [{"hgvsc": "ENST9.1:c.100del", "consequence_terms": []}]}"#;

        let resolver = PositionResolver::new();
        let mut output = Vec::new();
        let stats = filter_records(
            reader(input),
            &mut output,
            &KnownVariants::new(),
            &CriteriaList::default(),
            &resolver,
            &Args {
                keep_empty: true,
                ..args()
            },
        )?;

        assert_eq!(stats.written, 1);
        assert_eq!(
            String::from_utf8(output)?,
            "{\"transcript_consequences\":[]}\n"
        );

        Ok(())
    }

    #[test]
    fn blank_lines_are_skipped() -> Result<(), anyhow::Error> {
        let resolver = PositionResolver::new();
        let mut output = Vec::new();
        let stats = filter_records(
            reader("\n\n"),
            &mut output,
            &KnownVariants::new(),
            &CriteriaList::default(),
            &resolver,
            &args(),
        )?;
        assert_eq!(stats, Stats::default());
        assert!(output.is_empty());
        Ok(())
    }
}

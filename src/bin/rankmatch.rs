use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use u_rankmatch::engine::RankMaximalSolver;
use u_rankmatch::evaluate::evaluate;
use u_rankmatch::export::{write_json, write_matching_csv, write_signature_csv};
use u_rankmatch::instance::{normalize, NormalizeConfig, RawInstance};
use u_rankmatch::lexi::LexiConfig;

#[derive(Parser)]
#[command(
    name = "rankmatch",
    about = "Rank-maximal resident/hospital assignment",
    version
)]
struct Cli {
    /// JSON file with `residents` and `hospitals` arrays.
    #[arg(long)]
    input: PathBuf,
    #[arg(long = "matching-out")]
    matching_out: Option<PathBuf>,
    #[arg(long = "signature-out")]
    signature_out: Option<PathBuf>,
    /// Zero-pad hospital identifiers to this width.
    #[arg(long = "pad-width")]
    pad_width: Option<usize>,
    #[arg(long, default_value = "None")]
    sentinel: String,
    #[arg(long = "pass-timeout-ms")]
    pass_timeout_ms: Option<u64>,
    #[arg(long = "time-budget-ms")]
    time_budget_ms: Option<u64>,
    /// Print evaluation statistics.
    #[arg(long)]
    report: bool,
    /// Print the outcome as JSON instead of text.
    #[arg(long)]
    json: bool,
}

fn main() {
    env_logger::init();
    if let Err(err) = run(Cli::parse()) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let file = File::open(&cli.input)
        .with_context(|| format!("opening {}", cli.input.display()))?;
    let raw: RawInstance = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", cli.input.display()))?;

    let mut normalize_config = NormalizeConfig::default().with_sentinel_name(&cli.sentinel);
    if let Some(width) = cli.pad_width {
        normalize_config = normalize_config.with_id_pad_width(width);
    }
    let instance = normalize(&raw, &normalize_config)?;
    info!(
        "loaded {} residents, {} hospitals, {} edges",
        instance.agent_count(),
        instance.slot_count() - 1,
        instance.edge_count()
    );

    let mut config = LexiConfig::default();
    if let Some(ms) = cli.pass_timeout_ms {
        config = config.with_pass_time_limit_ms(ms);
    }
    if let Some(ms) = cli.time_budget_ms {
        config = config.with_total_time_limit_ms(ms);
    }
    let outcome = RankMaximalSolver::new().with_config(config).solve(&instance)?;

    if let Some(path) = &cli.matching_out {
        write_matching_csv(&outcome.matching, create_output(path)?, false)?;
    }
    if let Some(path) = &cli.signature_out {
        write_signature_csv(&outcome.signature, create_output(path)?)?;
    }

    let report = cli.report.then(|| evaluate(&instance, &outcome.matching));
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if cli.json {
        match &report {
            Some(report) => write_json(
                &serde_json::json!({ "outcome": &outcome, "report": report }),
                &mut out,
            )?,
            None => write_json(&outcome, &mut out)?,
        }
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "Total matches: {}", outcome.total())?;
    writeln!(out, "Unmatched: {}", outcome.matching.unmatched(&instance).len())?;
    for (rank, count) in outcome.signature.iter() {
        writeln!(out, "Rank {rank}: {count}")?;
    }

    if let Some(report) = report {
        writeln!(out)?;
        writeln!(out, "First choice matches: {}", report.first_choice_matches)?;
        writeln!(out, "First choice rate: {:.2}%", report.first_choice_rate * 100.0)?;
        writeln!(out, "Weighted score: {:.3}", report.weighted_score)?;
        match report.average_rank {
            Some(avg) => writeln!(out, "Average rank: {avg:.3}")?,
            None => writeln!(out, "Average rank: n/a")?,
        }
        for (label, count) in report.histogram_rows() {
            writeln!(out, "{label}: {count}")?;
        }
    }
    Ok(())
}

fn create_output(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    Ok(BufWriter::new(file))
}

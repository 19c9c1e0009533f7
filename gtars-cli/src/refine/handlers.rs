use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::ArgMatches;
use log::info;

use gtars_refine::{
    BiasCurve, CoverageTrack, GcType, GenomeAssembly, PeakSet, RefineConfig, RefineInputs,
    refine_peaks,
};

/// Settings file first, command line flags on top.
fn build_config(matches: &ArgMatches) -> Result<RefineConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => RefineConfig::from_path(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config file: {}", e))?,
        None => RefineConfig::default(),
    };

    if let Some(b) = matches.get_one::<u32>("bind-width") {
        config.bind_width = Some(*b);
    }
    if let Some(p) = matches.get_one::<u32>("half-width") {
        config.peak_half_width = Some(*p);
    }
    if let Some(f) = matches.get_one::<u32>("flank") {
        config.flank = Some(*f);
    }
    if let Some(n) = matches.get_one::<u32>("permute") {
        config.permute = *n;
    }
    if let Some(gc_type) = matches.get_one::<String>("gc-type") {
        config.gc_type = GcType::from_str(gc_type)?;
    }
    if let Some(seed) = matches.get_one::<u64>("seed") {
        config.seed = Some(*seed);
    }
    if let Some(threads) = matches.get_one::<usize>("threads") {
        config.threads = Some(*threads);
    }
    config.progress = !matches.get_flag("no-progress");

    Ok(config)
}

pub fn run_refine(matches: &ArgMatches) -> Result<()> {
    let peaks_path = matches
        .get_one::<String>("peaks")
        .expect("--peaks is required");
    let forward_path = matches
        .get_one::<String>("forward")
        .expect("--forward is required");
    let reverse_path = matches
        .get_one::<String>("reverse")
        .expect("--reverse is required");
    let bias_path = matches
        .get_one::<String>("bias")
        .expect("--bias is required");
    let fasta_path = matches
        .get_one::<String>("fasta")
        .expect("--fasta is required");
    let output_path = matches.get_one::<String>("output");
    let summary_path = matches.get_one::<String>("summary");

    let config = build_config(matches)?;
    let params = config
        .resolve()
        .map_err(|e| anyhow::anyhow!("Invalid refine settings: {}", e))?;

    if let Some(threads) = config.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to set up the thread pool")?;
    }

    // Load inputs
    let peaks = PeakSet::try_from(Path::new(peaks_path))
        .map_err(|e| anyhow::anyhow!("Failed to load peaks: {}", e))?;
    let forward = CoverageTrack::try_from(Path::new(forward_path))
        .map_err(|e| anyhow::anyhow!("Failed to load forward coverage: {}", e))?;
    let reverse = CoverageTrack::try_from(Path::new(reverse_path))
        .map_err(|e| anyhow::anyhow!("Failed to load reverse coverage: {}", e))?;
    let bias = BiasCurve::try_from(Path::new(bias_path))
        .map_err(|e| anyhow::anyhow!("Failed to load bias curve: {}", e))?;
    info!("Loading genome from {}", fasta_path);
    let genome = GenomeAssembly::try_from(Path::new(fasta_path))
        .map_err(|e| anyhow::anyhow!("Failed to load genome: {}", e))?;

    let inputs = RefineInputs {
        forward: &forward,
        reverse: &reverse,
        bias: &bias,
        genome: &genome,
    };
    let result = refine_peaks(&peaks, &inputs, &params)
        .map_err(|e| anyhow::anyhow!("Refinement failed: {}", e))?;

    match output_path {
        Some(path) => {
            result
                .peaks
                .to_bed(path)
                .with_context(|| format!("Failed to write {}", path))?;
            info!("Wrote {} peaks to {}", result.peaks.len(), path);
        }
        None => {
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            result.peaks.write(&mut writer)?;
            writer.flush()?;
        }
    }

    if let Some(path) = summary_path {
        let file = File::create(path).with_context(|| format!("Failed to create {}", path))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &result.summary)
            .context("Failed to write run summary")?;
    }

    Ok(())
}

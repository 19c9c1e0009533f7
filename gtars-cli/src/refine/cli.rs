use clap::{Arg, ArgAction, Command, arg, value_parser};

pub const REFINE_CMD: &str = "refine";

pub fn create_refine_cli() -> Command {
    Command::new(REFINE_CMD)
        .about("Re-score peaks with a GC-corrected enrichment statistic and attach permutation p-values.")
        .arg(
            arg!(--peaks <PEAKS>)
                .required(true)
                .help("Path to the candidate peaks (BED, optionally gzipped)"),
        )
        .arg(
            arg!(--forward <FORWARD>)
                .required(true)
                .help("Forward strand 5' end coverage (bedGraph)"),
        )
        .arg(
            arg!(--reverse <REVERSE>)
                .required(true)
                .help("Reverse strand 5' end coverage (bedGraph)"),
        )
        .arg(
            arg!(--bias <BIAS>)
                .required(true)
                .help("GC bias curve with 1001 values (one per line, or `gc bias` columns)"),
        )
        .arg(
            arg!(--fasta <FASTA>)
                .required(true)
                .help("Reference genome (FASTA, optionally gzipped)"),
        )
        .arg(
            Arg::new("bind-width")
                .long("bind-width")
                .value_parser(value_parser!(u32))
                .help("Estimated binding width. Required unless set in --config"),
        )
        .arg(
            Arg::new("half-width")
                .long("half-width")
                .value_parser(value_parser!(u32))
                .help("Estimated peak half width, used to derive the flank"),
        )
        .arg(
            arg!(--flank <FLANK>)
                .value_parser(value_parser!(u32))
                .help("Flank width. Takes precedence over --half-width"),
        )
        .arg(
            arg!(--permute <PERMUTE>)
                .value_parser(value_parser!(u32))
                .help("Number of permutation rounds [default: 5]"),
        )
        .arg(
            Arg::new("gc-type")
                .long("gc-type")
                .value_parser(["ladder", "tricube"])
                .help("Kernel used to smooth GC content [default: ladder]"),
        )
        .arg(
            arg!(--seed <SEED>)
                .value_parser(value_parser!(u64))
                .help("Seed for reproducible permutations"),
        )
        .arg(
            arg!(--threads <THREADS>)
                .value_parser(value_parser!(usize))
                .help("Number of worker threads (default: all cores)"),
        )
        .arg(
            arg!(--config <CONFIG>)
                .required(false)
                .help("TOML or YAML file with refine settings. Flags override it"),
        )
        .arg(
            arg!(--output <OUTPUT>)
                .required(false)
                .help("Output BED path (default: stdout)"),
        )
        .arg(
            arg!(--summary <SUMMARY>)
                .required(false)
                .help("Write a JSON run summary to this path"),
        )
        .arg(
            Arg::new("no-progress")
                .long("no-progress")
                .action(ArgAction::SetTrue)
                .help("Hide the permutation progress bar"),
        )
}

mod refine;

use anyhow::Result;
use clap::Command;
use env_logger::Env;

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const BIN_NAME: &str = "gtars";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .author("Databio")
        .about("GC-aware refinement of peak calls with permutation based p-values.")
        .subcommand_required(true)
        .subcommand(refine::cli::create_refine_cli())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let app = build_parser();
    let matches = app.get_matches();

    match matches.subcommand() {
        //
        // REFINE
        //
        Some((refine::cli::REFINE_CMD, matches)) => {
            refine::handlers::run_refine(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}

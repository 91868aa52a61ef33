use std::process::ExitCode;

use clap::Parser;
use godep_scout::cli::WhitesourceCli;
use godep_scout::{logging, run};

fn main() -> ExitCode {
    let cli = WhitesourceCli::parse();
    logging::init(cli.common.debug);

    match run::run_whitesource(&cli) {
        Ok(status) => status.into(),
        Err(err) => {
            eprintln!("エラー: {err:#}");
            ExitCode::FAILURE
        }
    }
}

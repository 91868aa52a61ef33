use std::process::ExitCode;

use clap::Parser;
use godep_scout::cli::LicensesCli;
use godep_scout::{logging, run};

fn main() -> ExitCode {
    let cli = LicensesCli::parse();
    logging::init(cli.common.debug);

    match run::run_licenses(&cli) {
        Ok(status) => status.into(),
        Err(err) => {
            eprintln!("エラー: {err:#}");
            ExitCode::FAILURE
        }
    }
}

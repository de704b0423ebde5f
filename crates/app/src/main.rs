use std::process::ExitCode;

use clap::Parser;

mod headless;

fn main() -> ExitCode {
    let options = headless::Options::parse();

    match headless::run(&options) {
        Ok(report) => match serde_json::to_string_pretty(&report) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Cannot encode report: {e}");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

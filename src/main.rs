//! tl - branch and multi-file commit orchestration for GitHub

use std::process::ExitCode;

fn main() -> ExitCode {
    match treeline::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            treeline::ui::output::error(format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

use std::process;

use uniqenum_cli::{init_logging, report_errors, run, Config, RunResult};

fn main() {
    let result = match Config::new() {
        Ok(config) => {
            init_logging(config.verbose);
            run(config)
        }
        Err(error) => {
            report_errors(&[error], false);
            RunResult::UsageError
        }
    };

    if result != RunResult::Ok {
        process::exit(1);
    }
}

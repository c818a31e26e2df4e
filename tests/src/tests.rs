//! Trellis's fixture test runner.

mod args;
mod collect;
mod report;
mod run;

use std::sync::LazyLock;

use clap::Parser;
use parking_lot::Mutex;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::args::CliArguments;
use crate::report::Report;

/// The parsed command line arguments.
static ARGS: LazyLock<CliArguments> = LazyLock::new(CliArguments::parse);

/// The directory where the test suite is located.
const SUITE_PATH: &str = "tests/suite";

fn main() {
    setup();
    test();
}

fn setup() {
    // Make all paths relative to the workspace. That's nicer for IDEs when
    // clicking on paths printed to the terminal.
    std::env::set_current_dir("..").unwrap();

    if let Some(num_threads) = ARGS.num_threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .unwrap();
    }
}

fn test() {
    let (tests, skipped) = match crate::collect::collect() {
        Ok(output) => output,
        Err(errors) => {
            eprintln!("failed to collect tests");
            for error in errors {
                eprintln!("❌ {error}");
            }
            std::process::exit(1);
        }
    };

    if tests.is_empty() {
        eprintln!("no test selected");
        return;
    }

    if ARGS.list {
        for test in &tests {
            println!("{test}");
        }
        eprintln!("{} selected, {skipped} skipped", tests.len());
        return;
    }

    let report = Mutex::new(Report::new(tests.len(), skipped));
    tests.par_iter().for_each(|test| {
        let outcome = std::panic::catch_unwind(|| run::run(test));
        report.lock().record(test, outcome);
    });

    let passed = report.into_inner().finish();
    if !passed {
        std::process::exit(1);
    }
}

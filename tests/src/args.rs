use clap::Parser;
use regex::Regex;

/// Trellis's fixture test runner.
#[derive(Debug, Clone, Parser)]
#[command(bin_name = "cargo test --workspace --test tests --")]
#[clap(name = "trellis-test", author)]
pub struct CliArguments {
    /// All the tests whose names match the test name pattern will be run.
    #[arg(value_parser = Regex::new)]
    pub pattern: Vec<Regex>,
    /// Only selects the test that matches with the test name verbatim.
    #[arg(short, long)]
    pub exact: bool,
    /// Lists what tests will be run, without actually running them.
    #[arg(long, group = "action")]
    pub list: bool,
    /// Updates the expected output of non-passing tests.
    #[arg(short, long, group = "action")]
    pub update: bool,
    /// Displays only one line per test, hiding details about failures.
    #[arg(short, long)]
    pub compact: bool,
    /// Also lists passing tests.
    #[arg(short, long)]
    pub verbose: bool,
    /// How many threads to spawn when running the tests.
    #[arg(short = 'j', long)]
    pub num_threads: Option<usize>,
}

impl CliArguments {
    /// Whether a test with this name was selected.
    pub fn selects(&self, name: &str) -> bool {
        if self.pattern.is_empty() {
            return true;
        }
        self.pattern.iter().any(|re| {
            if self.exact { re.as_str() == name } else { re.is_match(name) }
        })
    }
}

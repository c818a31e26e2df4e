use std::fmt::Write;

use crate::ARGS;
use crate::collect::{Kind, Test};

/// How a single fixture went.
#[derive(Default)]
pub struct Outcome {
    /// What went wrong: an error or an output diff. Empty if it passed.
    pub problems: String,
    /// Anything else worth reporting, like a rewritten fixture.
    pub notes: String,
    /// Whether the output differed from `expected`.
    pub mismatch: bool,
}

/// Collects fixture outcomes and prints failures as they come in.
pub struct Report {
    selected: usize,
    skipped: usize,
    /// Passed and failed fixtures per kind, in the order kinds first finish.
    tally: Vec<(Kind, usize, usize)>,
    mismatch: bool,
}

impl Report {
    pub fn new(selected: usize, skipped: usize) -> Self {
        Self { selected, skipped, tally: vec![], mismatch: false }
    }

    /// Record a finished fixture. A panic counts as a failure.
    pub fn record(&mut self, test: &Test, outcome: std::thread::Result<Outcome>) {
        let outcome = outcome.unwrap_or_else(|_| Outcome {
            problems: "panicked".into(),
            ..Default::default()
        });

        let passed = outcome.problems.is_empty();
        let index = match self.tally.iter().position(|(kind, ..)| *kind == test.kind) {
            Some(index) => index,
            None => {
                self.tally.push((test.kind, 0, 0));
                self.tally.len() - 1
            }
        };
        let entry = &mut self.tally[index];
        if passed {
            entry.1 += 1;
        } else {
            entry.2 += 1;
        }
        self.mismatch |= outcome.mismatch;

        let mut out = String::new();
        if !passed {
            writeln!(out, "❌ {test}").unwrap();
            if !ARGS.compact {
                indent(&mut out, &outcome.problems);
            }
        } else if ARGS.verbose || !outcome.notes.is_empty() {
            writeln!(out, "✅ {test}").unwrap();
        }
        indent(&mut out, &outcome.notes);
        eprint!("{out}");
    }

    /// Print per-kind counts and return whether every fixture passed.
    pub fn finish(self) -> bool {
        let (mut passed, mut failed) = (0, 0);
        for (kind, p, f) in &self.tally {
            eprintln!("  {:<18} {p} passed, {f} failed", kind.name());
            passed += p;
            failed += f;
        }
        eprintln!("{passed} passed, {failed} failed, {} skipped", self.skipped);
        assert_eq!(self.selected, passed + failed, "not every fixture reported back");

        if self.mismatch {
            eprintln!("  rerun with --update to accept the actual output");
        }
        failed == 0
    }
}

fn indent(out: &mut String, text: &str) {
    for line in text.lines() {
        writeln!(out, "  {line}").unwrap();
    }
}

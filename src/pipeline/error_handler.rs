//! Per-part outcomes: one failed part never stops the others, failures are reported by name.

use log::error;

use crate::engine::tools::sort_by_part_name;
use crate::error::ArchiveError;

/// Result of running one stage (or all stages) for one part.
#[derive(Debug)]
pub struct PartOutcome {
    pub name: String,
    pub result: Result<(), ArchiveError>,
}

impl PartOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcomes of one pipeline run, in natural part order.
#[derive(Debug, Default)]
pub struct PipelineSummary {
    pub outcomes: Vec<PartOutcome>,
}

impl PipelineSummary {
    pub fn new(mut outcomes: Vec<PartOutcome>) -> Self {
        sort_by_part_name(&mut outcomes, |o| o.name.as_str());
        PipelineSummary { outcomes }
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(PartOutcome::is_ok)
    }

    /// Names of the failed parts.
    pub fn failed(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_ok())
            .map(|o| o.name.as_str())
            .collect()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }
}

/// Log every failed part with its error. Returns the number of failures.
pub fn report_part_failures(summary: &PipelineSummary) -> usize {
    let mut failures = 0;
    for outcome in &summary.outcomes {
        if let Err(e) = &outcome.result {
            error!("{}: {e}", outcome.name);
            failures += 1;
        }
    }
    failures
}

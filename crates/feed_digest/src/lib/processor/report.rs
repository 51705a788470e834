use chrono::NaiveDate;

/// Why a candidate was dropped without being marked processed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    DedupCheckFailed,
    NoContent,
    SummaryFailed,
    EmailFailed,
}

impl SkipReason {
    pub fn message(&self) -> &'static str {
        match self {
            SkipReason::DedupCheckFailed => "Could not check processed items.",
            SkipReason::NoContent => "No content available.",
            SkipReason::SummaryFailed => "AI generation failed.",
            SkipReason::EmailFailed => "Email delivery failed.",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunTally {
    /// Ids that were summarized and emailed during this run
    pub processed: Vec<String>,
    pub already_processed: Vec<String>,
    pub skipped: Vec<(String, SkipReason)>,
    /// Candidates left for the next run once the per-run cap was reached
    pub deferred: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    NothingFound,
    NothingEligible { target_date: Option<NaiveDate> },
    Finished {
        target_date: Option<NaiveDate>,
        tally: RunTally,
    },
}

/// Terminal result of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: RunOutcome,
}

impl RunReport {
    pub fn new(outcome: RunOutcome) -> Self {
        Self { outcome }
    }

    pub fn tally(&self) -> Option<&RunTally> {
        match &self.outcome {
            RunOutcome::Finished { tally, .. } => Some(tally),
            _ => None,
        }
    }

    /// A run only fails when something was attempted and nothing made it through
    pub fn is_success(&self) -> bool {
        match self.tally() {
            Some(tally) => !tally.processed.is_empty() || tally.skipped.is_empty(),
            None => true,
        }
    }

    pub fn status_code(&self) -> u16 {
        if self.is_success() {
            200
        } else {
            500
        }
    }

    pub fn message(&self) -> String {
        match &self.outcome {
            RunOutcome::NothingFound => "No items found.".into(),
            RunOutcome::NothingEligible {
                target_date: Some(date),
            } => format!("No items published on {date}."),
            RunOutcome::NothingEligible { target_date: None } => "No eligible items.".into(),
            RunOutcome::Finished { tally, .. } => Self::tally_message(tally),
        }
    }

    fn tally_message(tally: &RunTally) -> String {
        if !tally.processed.is_empty() {
            let mut message = format!("Processed {} item(s).", tally.processed.len());
            if tally.deferred > 0 {
                message.push_str(&format!(" {} deferred to the next run.", tally.deferred));
            }
            return message;
        }

        if let Some((_, reason)) = tally.skipped.first() {
            return reason.message().into();
        }

        match tally.already_processed.len() {
            0 => "Processed 0 item(s).".into(),
            1 => "Item already processed.".into(),
            n => format!("All {n} items already processed."),
        }
    }
}

use crate::engine::{Bracket, RosterEntry};
use crate::error::BracketError;
use crate::types::MatchResult;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Append only record of accepted results, in report order.
///
/// The bracket tree is always reproducible from the roster plus this
/// ledger, which is what gets persisted and what the backend replays.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultLedger {
    entries: Vec<MatchResult>,
}

impl ResultLedger {
    pub fn new() -> ResultLedger {
        ResultLedger::default()
    }

    pub fn from_entries(entries: Vec<MatchResult>) -> ResultLedger {
        ResultLedger { entries }
    }

    /// Record one accepted result. Only call after the engine has taken it.
    pub fn push(&mut self, result: MatchResult) {
        self.entries.push(result);
    }

    pub fn entries(&self) -> &[MatchResult] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Rebuild a bracket from scratch by replaying every ledger entry against
/// a fresh tree. Any entry the engine now refuses fails the whole replay.
pub fn replay(roster: &[RosterEntry], ledger: &ResultLedger) -> Result<Bracket, BracketError> {
    let mut bracket = Bracket::new(roster)?;
    for entry in ledger.entries() {
        bracket = bracket.with_result(entry.p1_id, entry.p2_id, entry.score_p1, entry.score_p2)?;
    }
    Ok(bracket)
}

/// Check that replaying the ledger reproduces `bracket` exactly. Used as a
/// guard before persisting, so a live tree that drifted from its ledger is
/// caught instead of saved.
pub fn verify(
    bracket: &Bracket,
    roster: &[RosterEntry],
    ledger: &ResultLedger,
) -> Result<(), BracketError> {
    let replayed = replay(roster, ledger)?;
    if &replayed != bracket {
        warn!(
            entries = ledger.len(),
            "ledger replay diverged from the live bracket"
        );
        return Err(BracketError::ReplayDivergence);
    }
    Ok(())
}

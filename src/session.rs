use crate::display;
use crate::engine::{Bracket, RosterEntry};
use crate::error::BracketError;
use crate::ledger::{self, ResultLedger};
use crate::types::{BracketState, BracketView, MatchResult, PlayerId, PlayerRef};
use tracing::info;

/// One bracket being run locally: the live tree, its ledger and where it
/// is (or is not yet) persisted. This is the unit the UI talks to.
#[derive(Clone, Debug)]
pub struct BracketSession {
    name: String,
    roster: Vec<RosterEntry>,
    bracket: Bracket,
    ledger: ResultLedger,
    persisted_id: Option<String>,
}

impl BracketSession {
    pub fn new(name: &str, roster: Vec<RosterEntry>) -> Result<BracketSession, BracketError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BracketError::InvalidRoster("empty bracket name".to_string()));
        }
        let bracket = Bracket::new(&roster)?;
        info!(name, players = roster.len(), "bracket session created");
        Ok(BracketSession {
            name: name.to_string(),
            roster,
            bracket,
            ledger: ResultLedger::new(),
            persisted_id: None,
        })
    }

    /// Rebuild a session from a persisted state by replaying its results.
    /// Player order in the state is seed order; ids are roster positions.
    pub fn from_state(state: &BracketState) -> Result<BracketSession, BracketError> {
        let mut roster = vec![None; state.players.len()];
        for (rank, player) in state.players.iter().enumerate() {
            let idx = player.id as usize;
            if idx == 0 || idx > roster.len() {
                return Err(BracketError::InvalidRoster(format!(
                    "player id {} out of range",
                    player.id
                )));
            }
            if roster[idx - 1].is_some() {
                return Err(BracketError::InvalidRoster(format!(
                    "duplicate player id {}",
                    player.id
                )));
            }
            roster[idx - 1] = Some(RosterEntry {
                name: player.name.clone(),
                seed: Some((rank + 1) as u32),
            });
        }
        let roster: Vec<RosterEntry> = roster
            .into_iter()
            .map(|entry| {
                entry.ok_or_else(|| BracketError::InvalidRoster("missing player id".to_string()))
            })
            .collect::<Result<_, _>>()?;
        let ledger = ResultLedger::from_entries(state.results.clone());
        let bracket = ledger::replay(&roster, &ledger)?;
        Ok(BracketSession {
            name: state.bracket_name.clone(),
            roster,
            bracket,
            ledger,
            persisted_id: None,
        })
    }

    /// Apply one result. The ledger entry is appended only once the engine
    /// has accepted the report, so a rejected report changes nothing.
    pub fn report(
        &mut self,
        p1_id: PlayerId,
        p2_id: PlayerId,
        score_p1: u8,
        score_p2: u8,
    ) -> Result<(), BracketError> {
        let next = self.bracket.with_result(p1_id, p2_id, score_p1, score_p2)?;
        self.bracket = next;
        self.ledger.push(MatchResult {
            p1_id,
            p2_id,
            score_p1,
            score_p2,
        });
        info!(
            name = %self.name,
            p1_id,
            p2_id,
            score_p1,
            score_p2,
            "result accepted"
        );
        Ok(())
    }

    pub fn view(&self) -> BracketView {
        display::view(&self.bracket)
    }

    /// Roster and results in the shape the backend replays to persist this
    /// bracket. Fails with `ReplayDivergence` rather than shipping a state
    /// the backend could not reproduce.
    pub fn save_payload(&self) -> Result<BracketState, BracketError> {
        ledger::verify(&self.bracket, &self.roster, &self.ledger)?;
        let players = self
            .bracket
            .participants()
            .iter()
            .map(|p| PlayerRef {
                id: p.id,
                name: p.name.clone(),
            })
            .collect();
        Ok(BracketState {
            bracket_name: self.name.clone(),
            players,
            results: self.ledger.entries().to_vec(),
        })
    }

    pub fn mark_saved(&mut self, id: String) {
        info!(name = %self.name, id = %id, "bracket persisted");
        self.persisted_id = Some(id);
    }

    /// Running without a backend record yet.
    pub fn is_guest(&self) -> bool {
        self.persisted_id.is_none()
    }

    pub fn persisted_id(&self) -> Option<&str> {
        self.persisted_id.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bracket(&self) -> &Bracket {
        &self.bracket
    }

    pub fn results(&self) -> &[MatchResult] {
        self.ledger.entries()
    }
}

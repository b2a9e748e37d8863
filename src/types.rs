use crate::engine::Bracket;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable identifier of a match inside one bracket.
pub type MatchId = u64;
/// Identifier of a participant inside one bracket.
pub type PlayerId = u32;

/// Participant reference as shown in match slots.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRef {
    pub id: PlayerId,
    pub name: String,
}

/// One match shaped for display. Empty slots (byes, undecided feeders)
/// keep a zero id and an empty name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewMatch {
    pub id: MatchId,
    pub players: [PlayerRef; 2],
    pub seeds: [u32; 2],
    pub score: [u8; 2],
    pub row_hint: Option<usize>,
}

/// Connector geometry between two rounds: a grid of boxes where only the
/// visible borders are flagged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineBox {
    pub left_border: bool,
    pub bottom_border: bool,
}

impl LineBox {
    pub const fn empty() -> LineBox {
        LineBox {
            left_border: false,
            bottom_border: false,
        }
    }

    pub const fn bottom() -> LineBox {
        LineBox {
            left_border: false,
            bottom_border: true,
        }
    }

    pub const fn left() -> LineBox {
        LineBox {
            left_border: true,
            bottom_border: false,
        }
    }
}

/// Bracket broken down for display, plus the raw tree to send back with
/// the next reported result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BracketView {
    pub winner_bracket: Vec<Vec<ViewMatch>>,
    pub winner_bracket_lines: Vec<Vec<LineBox>>,
    pub loser_bracket: Vec<Vec<ViewMatch>>,
    pub loser_bracket_lines: Vec<Vec<LineBox>>,
    pub grand_finals: Option<ViewMatch>,
    pub grand_finals_reset: Option<ViewMatch>,
    pub bracket: Bracket,
}

// ── REST payloads (field names as the backend expects them) ────────────

/// One reported result, in the order it was accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub p1_id: PlayerId,
    pub p2_id: PlayerId,
    pub score_p1: u8,
    pub score_p2: u8,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateBracketForm {
    pub bracket_name: String,
    pub player_names: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReportResultInput {
    pub bracket: Bracket,
    pub p1_id: PlayerId,
    pub p2_id: PlayerId,
    pub score_p1: u8,
    pub score_p2: u8,
}

/// Roster plus ordered results, the unit the backend replays to persist a
/// guest bracket.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BracketState {
    pub bracket_name: String,
    pub players: Vec<PlayerRef>,
    pub results: Vec<MatchResult>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreatedBracket {
    pub id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BracketSummary {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaginatedBrackets {
    pub total: u64,
    pub data: Vec<BracketSummary>,
}

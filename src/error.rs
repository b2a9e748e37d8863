use crate::types::PlayerId;
use thiserror::Error;

/// Failures raised by the bracket progression engine and the ledger.
///
/// Every invalid transition is surfaced as a typed error; the engine never
/// silently ignores a bad report. Callers decide how to present these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BracketError {
    #[error("invalid roster: {0}")]
    InvalidRoster(String),

    #[error("no match pairs players {p1_id} and {p2_id}")]
    MatchNotFound { p1_id: PlayerId, p2_id: PlayerId },

    #[error("match between players {p1_id} and {p2_id} already has a reported result")]
    AlreadyReported { p1_id: PlayerId, p2_id: PlayerId },

    #[error("invalid score {score_p1}-{score_p2}: a match cannot end in a draw")]
    InvalidScore { score_p1: u8, score_p2: u8 },

    #[error("ledger replay does not reproduce the current bracket")]
    ReplayDivergence,
}

/// Failures raised by the backend REST client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// 401 from the backend. Callers are expected to force a logout.
    #[error("session expired or invalid")]
    Unauthorized,

    #[error("backend error {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Decode(String),
}

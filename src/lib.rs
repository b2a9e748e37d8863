pub mod client;
pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod session;
pub mod types;

use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub use client::{BackendClient, SortOrder};
pub use config::AppConfig;
pub use display::view;
pub use engine::{Bracket, BracketMatch, Participant, Progress, RosterEntry, SlotSource, Stage};
pub use error::{BracketError, ClientError};
pub use ledger::ResultLedger;
pub use session::BracketSession;
pub use types::{
    BracketState, BracketView, CreateBracketForm, LineBox, MatchId, MatchResult,
    PaginatedBrackets, PlayerId, PlayerRef, ReportResultInput, ViewMatch,
};

/// Initialize tracing with file + stderr output. The returned guard must
/// be held for the lifetime of the process or buffered log lines are lost.
pub fn init_tracing(config: &AppConfig) -> tracing_appender::non_blocking::WorkerGuard {
    let logs_dir = config::logs_dir(config);
    fs::create_dir_all(&logs_dir).ok();
    let file_appender = tracing_appender::rolling::daily(&logs_dir, "bracket.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();
    info!("bracket organiser starting");
    guard
}

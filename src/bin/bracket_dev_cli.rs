//! Dev harness: run a whole bracket with random results and dump the
//! final state. Useful for eyeballing layouts and exercising the replay
//! path without a backend.
//!
//! Usage: bracket_dev_cli [player_count] [rng_seed]

use bracket_organiser::{
  config, init_tracing, BracketSession, Progress, RosterEntry,
};
use std::env;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone, Debug)]
struct SimRng {
  state: u64,
}

impl SimRng {
  fn new(seed: u64) -> Self {
    let mut state = seed;
    if state == 0 {
      state = 0x9E37_79B9_7F4A_7C15;
    }
    SimRng { state }
  }

  fn next_u64(&mut self) -> u64 {
    let mut x = self.state;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    self.state = x;
    x
  }

  fn gen_range_u32(&mut self, min: u32, max_inclusive: u32) -> u32 {
    if max_inclusive <= min {
      return min;
    }
    let span = (max_inclusive - min + 1) as u64;
    min + (self.next_u64() % span) as u32
  }
}

fn main() -> Result<(), String> {
  config::load_env_file();
  let app_config = config::load_config()?;
  let _guard = init_tracing(&app_config);

  let mut args = env::args().skip(1);
  let player_count: usize = match args.next() {
    Some(raw) => raw.parse().map_err(|_| format!("bad player count {raw}"))?,
    None => 8,
  };
  let seed: u64 = match args.next() {
    Some(raw) => raw.parse().map_err(|_| format!("bad rng seed {raw}"))?,
    None => SystemTime::now()
      .duration_since(UNIX_EPOCH)
      .map(|d| d.as_millis() as u64)
      .unwrap_or(1),
  };
  let mut rng = SimRng::new(seed);

  let roster: Vec<RosterEntry> = (1..=player_count)
    .map(|i| RosterEntry::unseeded(&format!("Player {i}")))
    .collect();
  let mut session =
    BracketSession::new("dev bracket", roster).map_err(|e| e.to_string())?;
  println!("running {player_count} players, rng seed {seed}");

  loop {
    let Some((p1, p2)) = next_playable(&session) else { break };
    // slight upset chance keeps the loser bracket interesting
    let winner_first = rng.gen_range_u32(0, 9) < 7;
    let games = rng.gen_range_u32(0, 2) as u8;
    let (s1, s2) = if winner_first { (2, games) } else { (games, 2) };
    session.report(p1, p2, s1, s2).map_err(|e| e.to_string())?;
    let name = |id| {
      session
        .bracket()
        .player(id)
        .map(|p| p.name.clone())
        .unwrap_or_default()
    };
    println!("  {} {s1} - {s2} {}", name(p1), name(p2));
  }

  let champion = session
    .bracket()
    .champion()
    .ok_or("bracket finished without a champion")?;
  println!("champion: {} (seed {})", champion.name, champion.seed);

  let state = session.save_payload().map_err(|e| e.to_string())?;
  let payload = serde_json::to_string_pretty(&state).map_err(|e| e.to_string())?;
  println!("{payload}");
  Ok(())
}

/// First pending match with both players known, in bracket order.
fn next_playable(session: &BracketSession) -> Option<(u32, u32)> {
  let bracket = session.bracket();
  let winner_rounds = bracket.winner_rounds();
  let loser_rounds = bracket.loser_rounds();
  let next = winner_rounds
    .iter()
    .flatten()
    .chain(loser_rounds.iter().flatten())
    .chain([&bracket.grand_finals(), &bracket.grand_finals_reset()])
    .find(|m| {
      m.progress == Progress::Pending
        && m.slots[0].player.is_some()
        && m.slots[1].player.is_some()
    })
    .and_then(|m| match (m.slots[0].player, m.slots[1].player) {
      (Some(a), Some(b)) => Some((a, b)),
      _ => None,
    });
  next
}

#[cfg(test)]
mod tests {
  use super::*;

  fn session(n: usize) -> BracketSession {
    let roster: Vec<RosterEntry> = (1..=n)
      .map(|i| RosterEntry::unseeded(&format!("p{i}")))
      .collect();
    BracketSession::new("dev", roster).expect("session")
  }

  fn seed_of(s: &BracketSession, id: u32) -> u32 {
    s.bracket().player(id).expect("player").seed
  }

  #[test]
  fn next_playable_walks_the_bracket_in_order() {
    let mut s = session(4);
    let (a, b) = next_playable(&s).expect("round one pending");
    assert_eq!([seed_of(&s, a), seed_of(&s, b)], [1, 4]);
    s.report(a, b, 2, 0).expect("report");
    let (c, d) = next_playable(&s).expect("second round one match");
    assert_eq!([seed_of(&s, c), seed_of(&s, d)], [2, 3]);
  }

  #[test]
  fn driving_next_playable_to_exhaustion_completes_the_bracket() {
    let mut s = session(6);
    while let Some((a, b)) = next_playable(&s) {
      s.report(a, b, 2, 1).expect("report");
    }
    assert!(s.bracket().is_complete());
    assert!(s.bracket().champion().is_some());
  }
}

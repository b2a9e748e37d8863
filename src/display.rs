use crate::engine::{Bracket, BracketMatch, Progress};
use crate::types::{BracketView, LineBox, PlayerRef, ViewMatch};

// ── View assembly ──────────────────────────────────────────────────────

/// Break a bracket down for display: rounds of view matches with row
/// hints, plus connector lines. All of it is derived from the tree and
/// recomputed on every call, never stored.
pub fn view(bracket: &Bracket) -> BracketView {
  let mut winner_bracket = rounds_view(bracket, &bracket.winner_rounds());
  reorder(bracket, &mut winner_bracket);
  let winner_bracket_lines = winner_lines(&winner_bracket);

  let mut loser_bracket = rounds_view(bracket, &bracket.loser_rounds());
  reorder(bracket, &mut loser_bracket);
  let loser_bracket_lines = loser_lines(&loser_bracket);

  let grand_finals = Some(view_match(bracket, bracket.grand_finals()));
  // the reset exists structurally but is only shown once the loser
  // bracket finalist has taken grand finals
  let reset = bracket.grand_finals_reset();
  let grand_finals_reset = match reset.progress {
    Progress::Decided { .. } => Some(view_match(bracket, reset)),
    Progress::Pending if reset.slots.iter().all(|s| s.player.is_some()) => {
      Some(view_match(bracket, reset))
    }
    _ => None,
  };

  BracketView {
    winner_bracket,
    winner_bracket_lines,
    loser_bracket,
    loser_bracket_lines,
    grand_finals,
    grand_finals_reset,
    bracket: bracket.clone(),
  }
}

fn rounds_view(bracket: &Bracket, rounds: &[Vec<&BracketMatch>]) -> Vec<Vec<ViewMatch>> {
  rounds
    .iter()
    .map(|round| round.iter().map(|m| view_match(bracket, m)).collect())
    .collect()
}

fn view_match(bracket: &Bracket, m: &BracketMatch) -> ViewMatch {
  let player = |slot: usize| {
    m.slots[slot]
      .player
      .and_then(|id| bracket.player(id))
      .map(|p| PlayerRef {
        id: p.id,
        name: p.name.clone(),
      })
      .unwrap_or_default()
  };
  ViewMatch {
    id: m.id,
    players: [player(0), player(1)],
    seeds: m.seeds,
    score: m.score(),
    row_hint: None,
  }
}

// ── Row hints ──────────────────────────────────────────────────────────

/// Assign positional hints within each round. The arena is built in seed
/// position order, so a match sits at the row of its index; structural
/// byes act as padding (no hint, sorted to the top of the round).
fn reorder(bracket: &Bracket, rounds: &mut [Vec<ViewMatch>]) {
  let n = bracket.participants().len() as u32;
  for round in rounds.iter_mut() {
    for (i, m) in round.iter_mut().enumerate() {
      let bye = m.seeds[0] > n || m.seeds[1] > n;
      m.row_hint = if bye { None } else { Some(i) };
    }
    round.sort_by_key(|m| m.row_hint);
  }
}

// ── Connector lines ────────────────────────────────────────────────────

/// Lines flowing from each winner bracket round into the next. One column
/// of boxes per transition, left half flowing out of matches and right
/// half flowing into the next round.
pub fn winner_lines(rounds: &[Vec<ViewMatch>]) -> Vec<Vec<LineBox>> {
  if rounds.len() < 2 {
    return Vec::new();
  }
  let total_matches = rounds.iter().flatten().count();
  let boxes_in_column = (total_matches + 1).next_power_of_two();
  let column = vec![LineBox::empty(); boxes_in_column];

  let mut lines = Vec::new();
  for round_index in (0..rounds.len() - 1).rev() {
    let round = &rounds[round_index];
    let matches_in_round = round.len().next_power_of_two();
    let gap = boxes_in_column / matches_in_round;
    let offset = 2usize.pow(round_index as u32);

    let mut flow_out = column.clone();
    let mut flow_in = column.clone();
    for m in round {
      let Some(row) = m.row_hint else { continue };
      // horizontal line out of the match
      flow_out[row * gap + offset - 1].bottom_border = true;
      // vertical run towards the next match
      for j in 0..offset {
        if row % 2 == 1 {
          flow_in[row * gap + 3 * offset - 1 - j - gap].left_border = true;
        } else {
          flow_in[row * gap + 2 * offset - 1 - j].left_border = true;
        }
      }
      // horizontal line into the next match, drawn once per pair
      if row % 2 == 1 {
        flow_in[row * gap + offset - 1 - gap / 2].bottom_border = true;
      }
    }
    lines.push([flow_out, flow_in].concat());
  }
  lines.reverse();
  lines
}

/// Loser bracket variant: rounds alternate between keeping and halving
/// their match count, so transitions are either straight horizontal lines
/// or the same merge geometry as the winner bracket.
pub fn loser_lines(rounds: &[Vec<ViewMatch>]) -> Vec<Vec<LineBox>> {
  if rounds.len() < 2 {
    return Vec::new();
  }
  let total_matches = rounds.iter().flatten().count();
  let boxes_in_column = (total_matches + 1).next_power_of_two() / 2;
  let column = vec![LineBox::empty(); boxes_in_column];

  let mut lines = Vec::new();
  for round_index in 0..rounds.len() - 1 {
    let round = &rounds[round_index];
    let next_round = &rounds[round_index + 1];
    let matches_in_round = round.len().next_power_of_two();
    let gap = boxes_in_column / matches_in_round;
    let offset = 2usize.pow((round_index / 2) as u32);

    let mut flow_out = column.clone();
    let mut flow_in = column.clone();
    for m in round {
      let Some(row) = m.row_hint else { continue };
      if round.len() == next_round.len() {
        // survivors carry straight across to meet the next drop
        flow_out[row * gap + offset - 1].bottom_border = true;
        flow_in[row * gap + offset - 1].bottom_border = true;
      } else {
        flow_out[row * gap + offset - 1].bottom_border = true;
        for j in 0..offset {
          if row % 2 == 1 {
            flow_in[row * gap + 3 * offset - 1 - j - gap].left_border = true;
          } else {
            flow_in[row * gap + 2 * offset - 1 - j].left_border = true;
          }
        }
        if row % 2 == 1 {
          flow_in[row * gap + offset - 1 - gap / 2].bottom_border = true;
        }
      }
    }
    lines.push([flow_out, flow_in].concat());
  }
  lines
}

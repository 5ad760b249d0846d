use std::collections::BTreeMap;

use super::config::Tariff;
use super::engine::compute_round_score_with;
use crate::round::{Player, PlayerId, Round, Transfer};

/// Label reported when no round has recorded the counted event yet.
pub const NONE_YET: &str = "none yet";

/// Players tied for the highest count of some event across a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopStat {
    pub names: Vec<String>,
    pub count: u32,
}

#[derive(Debug, Clone)]
pub struct SessionSummary {
    /// Widened so long sessions of extreme rounds cannot overflow
    pub totals: BTreeMap<PlayerId, i64>,
    pub grand_total: i64,
    pub top_burned: TopStat,
    pub top_manually_transferred_from: TopStat,
    /// Zero-based indices of rounds that settled with warnings
    pub rounds_with_warnings: Vec<usize>,
}

impl SessionSummary {
    pub fn total(&self, player: PlayerId) -> i64 {
        self.totals.get(&player).copied().unwrap_or(0)
    }
}

/// Roll every round of a session into totals with the standard tariff.
pub fn aggregate(rounds: &[Round], players: &[Player; 4]) -> SessionSummary {
    aggregate_with(rounds, players, &Tariff::default())
}

pub fn aggregate_with(rounds: &[Round], players: &[Player; 4], tariff: &Tariff) -> SessionSummary {
    let mut totals: BTreeMap<PlayerId, i64> = players.iter().map(|p| (p.id, 0)).collect();
    let mut rounds_with_warnings = Vec::new();

    for (index, round) in rounds.iter().enumerate() {
        let result = compute_round_score_with(round, players, tariff);
        for (player, delta) in &result.deltas {
            *totals.entry(*player).or_insert(0) += i64::from(*delta);
        }
        if !result.is_complete() {
            rounds_with_warnings.push(index);
        }
    }

    let grand_total = totals.values().sum();
    SessionSummary {
        totals,
        grand_total,
        top_burned: top_payers(rounds.iter().flat_map(|r| &r.burns), players),
        top_manually_transferred_from: top_payers(
            rounds.iter().flat_map(|r| &r.manual_transfers),
            players,
        ),
        rounds_with_warnings,
    }
}

/// Count how often each player is the paying side and keep everyone tied at the top.
fn top_payers<'a>(entries: impl Iterator<Item = &'a Transfer>, players: &[Player; 4]) -> TopStat {
    let mut counts: BTreeMap<PlayerId, u32> = players.iter().map(|p| (p.id, 0)).collect();
    for from in entries.filter_map(|t| t.from) {
        if let Some(count) = counts.get_mut(&from) {
            *count += 1;
        }
    }

    let max = counts.values().copied().max().unwrap_or(0);
    if max == 0 {
        return TopStat {
            names: vec![NONE_YET.to_string()],
            count: 0,
        };
    }

    let names = players
        .iter()
        .filter(|p| counts.get(&p.id) == Some(&max))
        .map(|p| p.name.clone())
        .collect();
    TopStat { names, count: max }
}

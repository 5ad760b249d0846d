use std::collections::BTreeMap;
use std::fmt;

use super::config::Tariff;
use crate::round::{Player, PlayerId, Place, Round};

/// Why a round could not be fully settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    NoSelfWinPlayer,
    BurnsIgnoredInSelfWin,
    WinnerRequiredForBurns,
    WinnerBurned,
    BurnWithoutPlayer { id: u32 },
    MissingSecondPlace,
    MissingThirdPlace,
    RankingIncomplete,
    InvalidTransfer { id: u32 },
    PointsOutOfRange,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::NoSelfWinPlayer => f.write_str("no self-win player chosen"),
            Warning::BurnsIgnoredInSelfWin => f.write_str("burns ignored in self-win mode"),
            Warning::WinnerRequiredForBurns => f.write_str("winner required to score burns"),
            Warning::WinnerBurned => f.write_str("winner cannot be burned"),
            Warning::BurnWithoutPlayer { id } => write!(f, "burn entry has no player (#{})", id),
            Warning::MissingSecondPlace => f.write_str("missing second place"),
            Warning::MissingThirdPlace => f.write_str("missing third place"),
            Warning::RankingIncomplete => f.write_str("ranking incomplete"),
            Warning::InvalidTransfer { id } => write!(f, "invalid transfer (#{})", id),
            Warning::PointsOutOfRange => f.write_str("tariff points out of range"),
        }
    }
}

/// Which rule set settled the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringMode {
    SelfWin,
    Burn,
    Ranking,
}

impl fmt::Display for ScoringMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringMode::SelfWin => f.write_str("self-win"),
            ScoringMode::Burn => f.write_str("burn"),
            ScoringMode::Ranking => f.write_str("ranking"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreLine {
    pub label: String, // e.g. "first place", "burn -> P1", "transfer #2"
    pub player: PlayerId,
    pub points: i32,
}

#[derive(Debug, Clone)]
pub struct ScoreResult {
    pub mode: ScoringMode,
    pub deltas: BTreeMap<PlayerId, i32>,
    pub total: i32,
    pub warnings: Vec<Warning>,
    pub breakdown: Vec<ScoreLine>,
}

impl ScoreResult {
    /// A round without warnings is fully settled
    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn delta(&self, player: PlayerId) -> i32 {
        self.deltas.get(&player).copied().unwrap_or(0)
    }
}

/// Running point movements for one round
struct Ledger {
    deltas: BTreeMap<PlayerId, i32>,
    breakdown: Vec<ScoreLine>,
    /// Set when a tariff movement was dropped because it would overflow
    overflowed: bool,
}

impl Ledger {
    fn new(players: &[Player; 4]) -> Self {
        Self {
            deltas: players.iter().map(|p| (p.id, 0)).collect(),
            breakdown: Vec::new(),
            overflowed: false,
        }
    }

    /// Ids outside the session's seats count as empty
    fn known(&self, player: Option<PlayerId>) -> Option<PlayerId> {
        player.filter(|p| self.deltas.contains_key(p))
    }

    fn fits(&self, player: PlayerId, points: i32) -> bool {
        self.deltas
            .get(&player)
            .is_some_and(|delta| delta.checked_add(points).is_some())
    }

    /// Returns false, leaving the ledger untouched, if the delta would overflow
    fn credit(&mut self, player: PlayerId, points: i32, label: String) -> bool {
        if !self.fits(player, points) {
            return false;
        }
        if let Some(delta) = self.deltas.get_mut(&player) {
            *delta += points;
        }
        self.breakdown.push(ScoreLine {
            label,
            player,
            points,
        });
        true
    }

    /// Move points between two players. Either both sides move or neither does.
    fn pay(&mut self, from: PlayerId, to: PlayerId, amount: i32, label: &str) -> bool {
        let Some(owed) = amount.checked_neg() else {
            return false;
        };
        if !self.fits(from, owed) || !self.fits(to, amount) {
            return false;
        }
        self.credit(from, owed, format!("{} -> {}", label, to));
        self.credit(to, amount, format!("{} <- {}", label, from));
        true
    }

    /// Tariff movements that cannot be applied are reported once per round
    fn settle(&mut self, from: PlayerId, to: PlayerId, amount: i32, label: &str) {
        if !self.pay(from, to, amount, label) {
            self.overflowed = true;
        }
    }
}

/// Settle a round with the standard tariff.
pub fn compute_round_score(round: &Round, players: &[Player; 4]) -> ScoreResult {
    compute_round_score_with(round, players, &Tariff::default())
}

/// Settle a round: the mode-specific distribution first, then manual transfers.
pub fn compute_round_score_with(round: &Round, players: &[Player; 4], tariff: &Tariff) -> ScoreResult {
    let mut ledger = Ledger::new(players);
    let mut warnings = Vec::new();

    let mode = if round.self_win {
        score_self_win(round, tariff, &mut ledger, &mut warnings);
        ScoringMode::SelfWin
    } else if !round.burns.is_empty() {
        score_burns(round, tariff, &mut ledger, &mut warnings);
        ScoringMode::Burn
    } else {
        score_ranking(round, tariff, &mut ledger, &mut warnings);
        ScoringMode::Ranking
    };
    if ledger.overflowed {
        warnings.push(Warning::PointsOutOfRange);
    }

    for transfer in &round.manual_transfers {
        let applied = match (ledger.known(transfer.from), ledger.known(transfer.to)) {
            (Some(from), Some(to)) if from != to => {
                ledger.pay(from, to, transfer.amount, &format!("transfer #{}", transfer.id))
            }
            _ => false,
        };
        if !applied {
            warnings.push(Warning::InvalidTransfer { id: transfer.id });
        }
    }

    let total = ledger
        .deltas
        .values()
        .fold(0i32, |sum, &delta| sum.saturating_add(delta));
    ScoreResult {
        mode,
        deltas: ledger.deltas,
        total,
        warnings,
        breakdown: ledger.breakdown,
    }
}

fn score_self_win(round: &Round, tariff: &Tariff, ledger: &mut Ledger, warnings: &mut Vec<Warning>) {
    if !round.burns.is_empty() {
        warnings.push(Warning::BurnsIgnoredInSelfWin);
    }

    let Some(winner) = ledger.known(round.winner()) else {
        warnings.push(Warning::NoSelfWinPlayer);
        return;
    };

    let losers: Vec<PlayerId> = ledger.deltas.keys().copied().filter(|&p| p != winner).collect();
    for loser in losers {
        ledger.settle(loser, winner, tariff.self_win_stake, "self-win");
    }
}

fn score_burns(round: &Round, tariff: &Tariff, ledger: &mut Ledger, warnings: &mut Vec<Warning>) {
    let Some(winner) = ledger.known(round.winner()) else {
        warnings.push(Warning::WinnerRequiredForBurns);
        return;
    };

    // Duplicate entries for the same player collapse to one burn
    let mut burned: Vec<PlayerId> = Vec::new();
    for burn in &round.burns {
        match ledger.known(burn.from) {
            Some(player) if !burned.contains(&player) => burned.push(player),
            Some(_) => {}
            None => warnings.push(Warning::BurnWithoutPlayer { id: burn.id }),
        }
    }

    if burned.contains(&winner) {
        warnings.push(Warning::WinnerBurned);
        return;
    }
    if burned.is_empty() {
        return;
    }

    for &player in &burned {
        ledger.settle(player, winner, tariff.burn_penalty, "burn");
    }

    let eligible = |p: &PlayerId| *p != winner && !burned.contains(p);

    let second = ledger.known(round.ranking.get(Place::Second)).filter(eligible);
    if let Some(second) = second {
        ledger.settle(second, winner, tariff.second_bonus, "second place");
    }

    let third = ledger
        .known(round.ranking.get(Place::Third))
        .filter(eligible)
        .filter(|&p| Some(p) != round.ranking.get(Place::Second));
    if let Some(third) = third {
        ledger.settle(third, winner, tariff.third_bonus, "third place");
    }

    // Second place is only contested between two or more unburned losers;
    // third place counts the winner among the players still in the hand
    let standing = ledger.deltas.len() - burned.len();
    let others = standing - 1;
    if others >= 2 && second.is_none() {
        warnings.push(Warning::MissingSecondPlace);
    }
    if standing >= 3 && third.is_none() {
        warnings.push(Warning::MissingThirdPlace);
    }
}

fn score_ranking(round: &Round, tariff: &Tariff, ledger: &mut Ledger, warnings: &mut Vec<Warning>) {
    let mut order: Vec<PlayerId> = Vec::with_capacity(4);
    for place in Place::ALL {
        match ledger.known(round.ranking.get(place)) {
            Some(player) if !order.contains(&player) => order.push(player),
            _ => {
                warnings.push(Warning::RankingIncomplete);
                return;
            }
        }
    }

    for (place, player) in Place::ALL.into_iter().zip(order) {
        if !ledger.credit(player, tariff.ranking[place.index()], format!("{} place", place)) {
            ledger.overflowed = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::round::Transfer;

    const P1: PlayerId = PlayerId(1);
    const P2: PlayerId = PlayerId(2);
    const P3: PlayerId = PlayerId(3);
    const P4: PlayerId = PlayerId(4);

    fn players() -> [Player; 4] {
        PlayerId::ALL.map(|id| Player {
            id,
            name: format!("Player {}", id.seat()),
        })
    }

    fn ranked(first: PlayerId, second: PlayerId, third: PlayerId, fourth: PlayerId) -> Round {
        let mut round = Round::new();
        round.ranking.first = Some(first);
        round.ranking.second = Some(second);
        round.ranking.third = Some(third);
        round.ranking.fourth = Some(fourth);
        round
    }

    fn transfer(id: u32, from: Option<PlayerId>, to: Option<PlayerId>, amount: i32) -> Transfer {
        Transfer { id, from, to, amount }
    }

    fn burn(id: u32, from: PlayerId, to: Option<PlayerId>) -> Transfer {
        transfer(id, Some(from), to, 4)
    }

    fn deltas(result: &ScoreResult) -> [i32; 4] {
        PlayerId::ALL.map(|p| result.delta(p))
    }

    #[test]
    fn test_ranking_tariff() {
        let result = compute_round_score(&ranked(P1, P2, P3, P4), &players());

        assert_eq!(result.mode, ScoringMode::Ranking);
        assert_eq!(deltas(&result), [6, -1, -2, -3]);
        assert_eq!(result.total, 0);
        assert!(result.warnings.is_empty());
        assert!(result.is_complete());
    }

    #[test]
    fn test_ranking_tariff_follows_slots_not_seats() {
        let result = compute_round_score(&ranked(P4, P3, P1, P2), &players());
        assert_eq!(deltas(&result), [-2, -3, -1, 6]);
    }

    #[test]
    fn test_ranking_incomplete() {
        let mut round = ranked(P1, P2, P3, P4);
        round.ranking.fourth = None;

        let result = compute_round_score(&round, &players());
        assert_eq!(deltas(&result), [0, 0, 0, 0]);
        assert_eq!(result.warnings, vec![Warning::RankingIncomplete]);
    }

    #[test]
    fn test_ranking_duplicate_player_rejected() {
        // Built directly, bypassing the editor that keeps slots exclusive
        let round = ranked(P1, P2, P2, P4);

        let result = compute_round_score(&round, &players());
        assert_eq!(deltas(&result), [0, 0, 0, 0]);
        assert_eq!(result.warnings, vec![Warning::RankingIncomplete]);
    }

    #[test]
    fn test_ranking_unknown_player_rejected() {
        let round = ranked(P1, P2, P3, PlayerId(9));
        let result = compute_round_score(&round, &players());
        assert_eq!(result.warnings, vec![Warning::RankingIncomplete]);
    }

    #[test]
    fn test_blank_round_warns() {
        let result = compute_round_score(&Round::new(), &players());
        assert_eq!(result.mode, ScoringMode::Ranking);
        assert_eq!(result.total, 0);
        assert!(!result.is_complete());
    }

    #[test]
    fn test_self_win() {
        let mut round = Round::new();
        round.self_win = true;
        round.ranking.first = Some(P3);

        let result = compute_round_score(&round, &players());
        assert_eq!(result.mode, ScoringMode::SelfWin);
        assert_eq!(deltas(&result), [-5, -5, 15, -5]);
        assert_eq!(result.total, 0);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_self_win_ignores_rest_of_ranking() {
        let mut round = ranked(P2, P1, P4, P3);
        round.self_win = true;

        let result = compute_round_score(&round, &players());
        assert_eq!(deltas(&result), [-5, 15, -5, -5]);
    }

    #[test]
    fn test_self_win_without_winner() {
        let mut round = Round::new();
        round.self_win = true;

        let result = compute_round_score(&round, &players());
        assert_eq!(deltas(&result), [0, 0, 0, 0]);
        assert_eq!(result.warnings, vec![Warning::NoSelfWinPlayer]);
        assert_eq!(result.warnings[0].to_string(), "no self-win player chosen");
    }

    #[test]
    fn test_self_win_with_stray_burns() {
        let mut round = Round::new();
        round.self_win = true;
        round.ranking.first = Some(P1);
        round.burns.push(burn(0, P2, Some(P1)));

        let result = compute_round_score(&round, &players());
        assert_eq!(deltas(&result), [15, -5, -5, -5]);
        assert_eq!(result.warnings, vec![Warning::BurnsIgnoredInSelfWin]);
    }

    #[test]
    fn test_self_win_still_applies_manual_transfers() {
        let mut round = Round::new();
        round.self_win = true;
        round.ranking.first = Some(P1);
        round.manual_transfers.push(transfer(0, Some(P2), Some(P4), 3));

        let result = compute_round_score(&round, &players());
        assert_eq!(deltas(&result), [15, -8, -5, -2]);
        assert_eq!(result.total, 0);
    }

    #[test]
    fn test_burn_with_second_and_third() {
        let mut round = Round::new();
        round.ranking.first = Some(P1);
        round.ranking.second = Some(P3);
        round.ranking.third = Some(P4);
        round.burns.push(burn(0, P2, Some(P1)));

        let result = compute_round_score(&round, &players());
        assert_eq!(result.mode, ScoringMode::Burn);
        assert_eq!(deltas(&result), [7, -4, -1, -2]);
        assert_eq!(result.total, 0);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_two_burns_pay_winner() {
        let mut round = Round::new();
        round.ranking.first = Some(P3);
        round.ranking.second = Some(P1);
        round.burns.push(burn(0, P2, Some(P3)));
        round.burns.push(burn(1, P4, Some(P3)));

        let result = compute_round_score(&round, &players());
        // 8 from burns, 1 from second place
        assert_eq!(deltas(&result), [-1, -4, 9, -4]);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_three_burns_need_no_places() {
        let mut round = Round::new();
        round.ranking.first = Some(P1);
        for (id, player) in [(0, P2), (1, P3), (2, P4)] {
            round.burns.push(burn(id, player, Some(P1)));
        }

        let result = compute_round_score(&round, &players());
        assert_eq!(deltas(&result), [12, -4, -4, -4]);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_duplicate_burns_collapse() {
        let mut round = Round::new();
        round.ranking.first = Some(P1);
        round.ranking.second = Some(P3);
        round.ranking.third = Some(P4);
        round.burns.push(burn(0, P2, Some(P1)));
        round.burns.push(burn(1, P2, Some(P1)));

        let result = compute_round_score(&round, &players());
        assert_eq!(deltas(&result), [7, -4, -1, -2]);
    }

    #[test]
    fn test_burn_without_winner() {
        let mut round = Round::new();
        round.ranking.second = Some(P3);
        round.burns.push(burn(0, P2, None));
        round.manual_transfers.push(transfer(1, Some(P3), Some(P4), 2));

        let result = compute_round_score(&round, &players());
        // Burn scoring skipped, manual transfer still applied
        assert_eq!(deltas(&result), [0, 0, -2, 2]);
        assert_eq!(result.warnings, vec![Warning::WinnerRequiredForBurns]);
        assert_eq!(result.warnings[0].to_string(), "winner required to score burns");
    }

    #[test]
    fn test_winner_burned() {
        let mut round = Round::new();
        round.ranking.first = Some(P2);
        round.burns.push(burn(0, P2, Some(P2)));

        let result = compute_round_score(&round, &players());
        assert_eq!(deltas(&result), [0, 0, 0, 0]);
        assert_eq!(result.warnings, vec![Warning::WinnerBurned]);
    }

    #[test]
    fn test_burn_entry_without_player() {
        let mut round = Round::new();
        round.ranking.first = Some(P1);
        round.burns.push(transfer(5, None, Some(P1), 4));

        let result = compute_round_score(&round, &players());
        assert_eq!(deltas(&result), [0, 0, 0, 0]);
        assert_eq!(result.warnings, vec![Warning::BurnWithoutPlayer { id: 5 }]);
    }

    #[test]
    fn test_burn_missing_places_warns() {
        let mut round = Round::new();
        round.ranking.first = Some(P1);
        round.burns.push(burn(0, P2, Some(P1)));

        let result = compute_round_score(&round, &players());
        assert_eq!(deltas(&result), [4, -4, 0, 0]);
        assert_eq!(
            result.warnings,
            vec![Warning::MissingSecondPlace, Warning::MissingThirdPlace]
        );
    }

    #[test]
    fn test_burned_second_place_earns_no_bonus() {
        let mut round = Round::new();
        round.ranking.first = Some(P1);
        round.ranking.second = Some(P2);
        round.ranking.third = Some(P3);
        round.burns.push(burn(0, P2, Some(P1)));

        let result = compute_round_score(&round, &players());
        // P2 pays the burn only; P3 still pays the third-place bonus
        assert_eq!(deltas(&result), [6, -4, -2, 0]);
        assert_eq!(result.warnings, vec![Warning::MissingSecondPlace]);
    }

    fn burn_round(winner: PlayerId, burned: &[PlayerId]) -> Round {
        let mut round = Round::new();
        round.ranking.first = Some(winner);
        for (id, &player) in (0..).zip(burned) {
            round.burns.push(burn(id, player, Some(winner)));
        }
        round
    }

    #[test]
    fn test_two_burns_need_no_places() {
        // Only one unburned loser is left, so there is no second place to contest
        let round = burn_round(P1, &[P2, P3]);

        let result = compute_round_score(&round, &players());
        assert_eq!(deltas(&result), [8, -4, -4, 0]);
        assert!(result.warnings.is_empty());
        assert!(result.is_complete());
    }

    #[test]
    fn test_two_burns_with_second_collects_bonus() {
        let mut round = burn_round(P1, &[P2, P3]);
        round.ranking.second = Some(P4);

        let result = compute_round_score(&round, &players());
        assert_eq!(deltas(&result), [9, -4, -4, -1]);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_one_burn_place_thresholds() {
        let only_second = {
            let mut round = burn_round(P1, &[P2]);
            round.ranking.second = Some(P3);
            round
        };
        let only_third = {
            let mut round = burn_round(P1, &[P2]);
            round.ranking.third = Some(P4);
            round
        };

        assert_eq!(
            compute_round_score(&only_second, &players()).warnings,
            vec![Warning::MissingThirdPlace]
        );
        assert_eq!(
            compute_round_score(&only_third, &players()).warnings,
            vec![Warning::MissingSecondPlace]
        );
    }

    #[test]
    fn test_three_burns_ignore_stray_places() {
        let mut round = burn_round(P1, &[P2, P3, P4]);
        round.ranking.second = Some(P2);

        let result = compute_round_score(&round, &players());
        // A burned second earns the winner nothing extra
        assert_eq!(deltas(&result), [12, -4, -4, -4]);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_extreme_transfer_amounts_rejected() {
        let mut round = ranked(P1, P2, P3, P4);
        round.manual_transfers.push(transfer(0, Some(P1), Some(P2), i32::MIN));
        round.manual_transfers.push(transfer(1, Some(P1), Some(P2), i32::MAX));
        round.manual_transfers.push(transfer(2, Some(P3), Some(P2), 5));

        let result = compute_round_score(&round, &players());
        // i32::MIN cannot be negated, and P2 cannot take 5 more after i32::MAX
        assert_eq!(deltas(&result), [6 - i32::MAX, i32::MAX - 1, -2, -3]);
        assert_eq!(
            result.warnings,
            vec![Warning::InvalidTransfer { id: 0 }, Warning::InvalidTransfer { id: 2 }]
        );
        assert_eq!(result.total, 0);
    }

    #[test]
    fn test_oversized_tariff_reports_out_of_range() {
        let tariff = Tariff {
            self_win_stake: i32::MAX,
            ..Tariff::default()
        };
        let mut round = Round::new();
        round.self_win = true;
        round.ranking.first = Some(P1);

        let result = compute_round_score_with(&round, &players(), &tariff);
        // The first stake fits, the other two would push the winner past i32::MAX
        assert_eq!(deltas(&result), [i32::MAX, -i32::MAX, 0, 0]);
        assert_eq!(result.warnings, vec![Warning::PointsOutOfRange]);
    }

    #[test]
    fn test_manual_transfer_applied_after_ranking() {
        let mut round = ranked(P1, P2, P3, P4);
        round.manual_transfers.push(transfer(0, Some(P4), Some(P2), 5));

        let result = compute_round_score(&round, &players());
        assert_eq!(deltas(&result), [6, 4, -2, -8]);
        assert_eq!(result.total, 0);
    }

    #[test]
    fn test_self_transfer_rejected() {
        let mut round = ranked(P1, P2, P3, P4);
        round.manual_transfers.push(transfer(3, Some(P2), Some(P2), 5));

        let result = compute_round_score(&round, &players());
        assert_eq!(deltas(&result), [6, -1, -2, -3]);
        assert_eq!(result.warnings, vec![Warning::InvalidTransfer { id: 3 }]);
    }

    #[test]
    fn test_transfer_with_empty_endpoint_rejected() {
        let mut round = ranked(P1, P2, P3, P4);
        round.manual_transfers.push(transfer(0, None, Some(P2), 5));
        round.manual_transfers.push(transfer(1, Some(P1), Some(PlayerId(7)), 5));

        let result = compute_round_score(&round, &players());
        assert_eq!(deltas(&result), [6, -1, -2, -3]);
        assert_eq!(result.warnings.len(), 2);
    }

    #[test]
    fn test_transfers_applied_in_order() {
        let mut round = ranked(P1, P2, P3, P4);
        round.manual_transfers.push(transfer(0, Some(P1), Some(P2), 2));
        round.manual_transfers.push(transfer(1, Some(P2), Some(P3), 1));

        let result = compute_round_score(&round, &players());
        assert_eq!(deltas(&result), [4, 0, -1, -3]);

        let labels: Vec<&str> = result
            .breakdown
            .iter()
            .skip(4)
            .map(|line| line.label.as_str())
            .collect();
        assert_eq!(
            labels,
            vec!["transfer #0 -> P2", "transfer #0 <- P1", "transfer #1 -> P3", "transfer #1 <- P2"]
        );
    }

    #[test]
    fn test_custom_tariff() {
        let tariff = Tariff {
            self_win_stake: 10,
            ..Tariff::default()
        };
        let mut round = Round::new();
        round.self_win = true;
        round.ranking.first = Some(P4);

        let result = compute_round_score_with(&round, &players(), &tariff);
        assert_eq!(deltas(&result), [-10, -10, -10, 30]);
    }

    #[test]
    fn test_breakdown_sums_to_deltas() {
        let mut round = Round::new();
        round.ranking.first = Some(P1);
        round.ranking.second = Some(P3);
        round.ranking.third = Some(P4);
        round.burns.push(burn(0, P2, Some(P1)));

        let result = compute_round_score(&round, &players());
        for player in PlayerId::ALL {
            let from_lines: i32 = result
                .breakdown
                .iter()
                .filter(|line| line.player == player)
                .map(|line| line.points)
                .sum();
            assert_eq!(from_lines, result.delta(player));
        }
    }
}

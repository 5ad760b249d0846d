use serde::{Deserialize, Serialize};

/// Point tariff used to settle a round.
///
/// Every field is optional in YAML and falls back to the standard table:
/// ```yaml
/// scoring:
///   self_win_stake: 5          # each loser pays the self-win winner 5
///   ranking: [6, -1, -2, -3]   # first, second, third, fourth
///   burn_penalty: 4            # each burned player pays the winner 4
///   second_bonus: 1            # second pays the winner 1 in a burn round
///   third_bonus: 2             # third pays the winner 2 in a burn round
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Tariff {
    /// Paid by each of the three losers to a self-win winner
    pub self_win_stake: i32,

    /// Points for first through fourth place in a plain ranked round
    pub ranking: [i32; 4],

    /// Paid by each burned player to the winner
    pub burn_penalty: i32,

    /// Paid by second place to the winner in a round with burns
    pub second_bonus: i32,

    /// Paid by third place to the winner in a round with burns
    pub third_bonus: i32,
}

impl Default for Tariff {
    fn default() -> Self {
        Self {
            self_win_stake: 5,
            ranking: [6, -1, -2, -3],
            burn_penalty: 4,
            second_bonus: 1,
            third_bonus: 2,
        }
    }
}

impl Tariff {
    /// What a self-win winner collects from the whole table
    pub fn self_win_total(&self) -> i32 {
        self.self_win_stake.saturating_mul(3)
    }
}

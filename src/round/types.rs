use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Seat identity of a player. Seats are numbered 1 through 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u8);

impl PlayerId {
    pub const ALL: [PlayerId; 4] = [PlayerId(1), PlayerId(2), PlayerId(3), PlayerId(4)];

    /// Seat number as shown to users (1-based)
    pub fn seat(self) -> u8 {
        self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
}

/// Finishing position within a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Place {
    First,
    Second,
    Third,
    Fourth,
}

impl Place {
    pub const ALL: [Place; 4] = [Place::First, Place::Second, Place::Third, Place::Fourth];

    /// Zero-based index, used to look up tariff values
    pub fn index(self) -> usize {
        match self {
            Place::First => 0,
            Place::Second => 1,
            Place::Third => 2,
            Place::Fourth => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Place::First => "first",
            Place::Second => "second",
            Place::Third => "third",
            Place::Fourth => "fourth",
        }
    }
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Place {
    type Err = String;

    /// Accepts "1".."4", "1st".."4th" or the place name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "1st" | "first" | "winner" => Ok(Place::First),
            "2" | "2nd" | "second" => Ok(Place::Second),
            "3" | "3rd" | "third" => Ok(Place::Third),
            "4" | "4th" | "fourth" | "last" => Ok(Place::Fourth),
            other => Err(format!(
                "unknown place '{}' (expected 1-4 or first/second/third/fourth)",
                other
            )),
        }
    }
}

/// Finishing order of a round. Slots are empty until assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ranking {
    #[serde(default)]
    pub first: Option<PlayerId>,
    #[serde(default)]
    pub second: Option<PlayerId>,
    #[serde(default)]
    pub third: Option<PlayerId>,
    #[serde(default)]
    pub fourth: Option<PlayerId>,
}

impl Ranking {
    pub fn get(&self, place: Place) -> Option<PlayerId> {
        match place {
            Place::First => self.first,
            Place::Second => self.second,
            Place::Third => self.third,
            Place::Fourth => self.fourth,
        }
    }

    pub fn slot_mut(&mut self, place: Place) -> &mut Option<PlayerId> {
        match place {
            Place::First => &mut self.first,
            Place::Second => &mut self.second,
            Place::Third => &mut self.third,
            Place::Fourth => &mut self.fourth,
        }
    }

    /// First place holding the given player, if any
    pub fn place_of(&self, player: PlayerId) -> Option<Place> {
        Place::ALL
            .into_iter()
            .find(|&place| self.get(place) == Some(player))
    }

    /// Remove the player from every slot except `keep`
    pub fn clear_player_except(&mut self, player: PlayerId, keep: Option<Place>) {
        for place in Place::ALL {
            if Some(place) == keep {
                continue;
            }
            let slot = self.slot_mut(place);
            if *slot == Some(player) {
                *slot = None;
            }
        }
    }
}

/// A point movement between two players: a burn entry or a manual transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: u32,
    pub from: Option<PlayerId>,
    pub to: Option<PlayerId>,
    pub amount: i32,
}

/// One played hand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    #[serde(default)]
    pub self_win: bool,
    #[serde(default)]
    pub ranking: Ranking,
    #[serde(default)]
    pub burns: Vec<Transfer>,
    #[serde(default)]
    pub manual_transfers: Vec<Transfer>,
    /// Next id handed out to a burn or manual transfer of this round
    #[serde(default)]
    pub(crate) next_transfer_id: u32,
}

impl Round {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.ranking.first
    }

    pub fn is_burned(&self, player: PlayerId) -> bool {
        self.burns.iter().any(|b| b.from == Some(player))
    }

    /// Distinct burned players, in the order they were first recorded
    pub fn burned_players(&self) -> Vec<PlayerId> {
        let mut burned = Vec::new();
        for player in self.burns.iter().filter_map(|b| b.from) {
            if !burned.contains(&player) {
                burned.push(player);
            }
        }
        burned
    }

    /// True when nothing has been recorded for this round yet
    pub fn is_blank(&self) -> bool {
        !self.self_win
            && self.ranking == Ranking::default()
            && self.burns.is_empty()
            && self.manual_transfers.is_empty()
    }

    pub(crate) fn allocate_transfer_id(&mut self) -> u32 {
        let used: Vec<u32> = self
            .burns
            .iter()
            .chain(self.manual_transfers.iter())
            .map(|t| t.id)
            .collect();
        // Rounds loaded from older files may carry ids without a counter
        if let Some(&highest) = used.iter().max() {
            self.next_transfer_id = self.next_transfer_id.max(highest.saturating_add(1));
        }
        if used.contains(&self.next_transfer_id) {
            // Counter exhausted by an id at u32::MAX: reuse the lowest free id
            return (0..=u32::MAX).find(|id| !used.contains(id)).unwrap_or_default();
        }
        let id = self.next_transfer_id;
        self.next_transfer_id = self.next_transfer_id.saturating_add(1);
        id
    }
}

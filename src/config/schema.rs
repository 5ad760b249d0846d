use serde::{Deserialize, Serialize};

use crate::scoring::Tariff;

/// Contents of config.yaml. Every key is optional.
///
/// ```yaml
/// players: ["An", "Binh", "Chi", "Dung"]
/// store: "~/games/phom.json"
/// scoring:
///   self_win_stake: 5
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Default names for the four seats of a new session
    #[serde(default)]
    pub players: Option<Vec<String>>,

    /// Session store location (defaults to ~/.config/phom-score/sessions.json)
    #[serde(default)]
    pub store: Option<String>,

    #[serde(default)]
    pub scoring: Option<Tariff>,
}

impl Config {
    /// Names for a new session, falling back to "Player N"
    pub fn player_names(&self) -> [String; 4] {
        let configured = self.players.as_deref().unwrap_or_default();
        std::array::from_fn(|i| {
            configured
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("Player {}", i + 1))
        })
    }

    pub fn tariff(&self) -> Tariff {
        self.scoring.clone().unwrap_or_default()
    }
}

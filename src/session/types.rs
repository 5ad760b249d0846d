use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::round::{Player, PlayerId, Round, RoundEdit};
use crate::scoring::{aggregate_with, compute_round_score_with, ScoreResult, SessionSummary, Tariff};

pub type SessionId = u64;

/// A multi-round game between four fixed players.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub players: [Player; 4],
    #[serde(default)]
    pub rounds: Vec<Round>,
    #[serde(default)]
    pub current_round_index: usize,
}

impl Session {
    /// Create a session with one blank round and the cursor on it
    pub fn new(id: SessionId, name: String, player_names: [String; 4]) -> Self {
        let mut names = player_names.into_iter();
        let players = PlayerId::ALL.map(|id| Player {
            id,
            name: names.next().unwrap_or_else(|| format!("Player {}", id.seat())),
        });
        Self {
            id,
            name,
            created_at: Utc::now(),
            players,
            rounds: vec![Round::new()],
            current_round_index: 0,
        }
    }

    /// Repair a session read from disk so the cursor always points at a round
    pub(crate) fn normalize(&mut self) {
        if self.rounds.is_empty() {
            self.rounds.push(Round::new());
        }
        self.current_round_index = self.current_round_index.min(self.rounds.len() - 1);
    }

    pub fn current_round(&self) -> &Round {
        &self.rounds[self.current_round_index]
    }

    pub fn round_count(&self) -> usize {
        self.rounds.len()
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Display name for a seat, falling back to the seat label
    pub fn player_name(&self, id: PlayerId) -> String {
        self.player(id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Find a player by seat number ("2"), seat label ("P2") or name (case-insensitive)
    pub fn resolve_player(&self, text: &str) -> Option<PlayerId> {
        let text = text.trim();
        let seat = text
            .strip_prefix(['P', 'p'])
            .unwrap_or(text)
            .parse::<u8>()
            .ok();
        if let Some(seat) = seat {
            if let Some(player) = self.players.iter().find(|p| p.id.seat() == seat) {
                return Some(player.id);
            }
        }
        self.players
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(text))
            .map(|p| p.id)
    }

    pub fn rename_player(&mut self, id: PlayerId, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            bail!("Player name cannot be empty");
        }
        match self.players.iter_mut().find(|p| p.id == id) {
            Some(player) => {
                player.name = name.to_string();
                Ok(())
            }
            None => bail!("No player {} in session {}", id, self.id),
        }
    }

    /// Apply an edit to the round under the cursor. Returns true if it changed.
    pub fn edit_current_round(&mut self, edit: RoundEdit) -> bool {
        let index = self.current_round_index;
        self.rounds[index].apply(edit)
    }

    /// Move to the next round, opening a blank one after the last
    pub fn next_round(&mut self) {
        if self.current_round_index + 1 >= self.rounds.len() {
            self.rounds.push(Round::new());
        }
        self.current_round_index += 1;
    }

    pub fn previous_round(&mut self) {
        self.current_round_index = self.current_round_index.saturating_sub(1);
    }

    /// Move the cursor to a zero-based round index
    pub fn go_to_round(&mut self, index: usize) -> Result<()> {
        if index >= self.rounds.len() {
            bail!(
                "Round {} does not exist (session has {} rounds)",
                index + 1,
                self.rounds.len()
            );
        }
        self.current_round_index = index;
        Ok(())
    }

    /// Delete a round by zero-based index. The last remaining round cannot be deleted.
    pub fn delete_round(&mut self, index: usize) -> Result<Round> {
        if index >= self.rounds.len() {
            bail!(
                "Round {} does not exist (session has {} rounds)",
                index + 1,
                self.rounds.len()
            );
        }
        if self.rounds.len() == 1 {
            bail!("Cannot delete the only round of a session");
        }
        let removed = self.rounds.remove(index);
        if self.current_round_index > index || self.current_round_index >= self.rounds.len() {
            self.current_round_index = self.current_round_index.saturating_sub(1);
        }
        Ok(removed)
    }

    pub fn score_round(&self, index: usize, tariff: &Tariff) -> Option<ScoreResult> {
        self.rounds
            .get(index)
            .map(|round| compute_round_score_with(round, &self.players, tariff))
    }

    pub fn score_current_round(&self, tariff: &Tariff) -> ScoreResult {
        compute_round_score_with(self.current_round(), &self.players, tariff)
    }

    pub fn summary(&self, tariff: &Tariff) -> SessionSummary {
        aggregate_with(&self.rounds, &self.players, tariff)
    }
}

use super::types::{Place, PlayerId, Round, Transfer};

/// A single change to a round. All round mutation goes through [`Round::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundEdit {
    /// Put a player in a ranking slot, evicting them from any other slot
    Assign { place: Place, player: PlayerId },
    ClearSlot(Place),
    SetSelfWin(bool),
    /// Record that a player burned; `amount` is the penalty shown for the entry
    AddBurn { player: PlayerId, amount: i32 },
    RemoveBurn(PlayerId),
    AddTransfer {
        from: PlayerId,
        to: PlayerId,
        amount: i32,
    },
    RemoveTransfer(u32),
}

impl Round {
    /// Apply an edit and restore the round invariants.
    ///
    /// Returns true if the round changed. No-op edits (burning the winner,
    /// burning in self-win mode, removing a missing entry) return false.
    pub fn apply(&mut self, edit: RoundEdit) -> bool {
        let before = self.clone();

        match edit {
            RoundEdit::Assign { place, player } => {
                // A burned player placed in the ranking is no longer burned
                self.burns.retain(|b| b.from != Some(player));
                self.ranking.clear_player_except(player, None);
                *self.ranking.slot_mut(place) = Some(player);
            }
            RoundEdit::ClearSlot(place) => {
                *self.ranking.slot_mut(place) = None;
            }
            RoundEdit::SetSelfWin(enabled) => {
                self.self_win = enabled;
                if enabled {
                    self.burns.clear();
                }
            }
            RoundEdit::AddBurn { player, amount } => {
                if !self.self_win && !self.is_burned(player) && self.winner() != Some(player) {
                    self.ranking.clear_player_except(player, Some(Place::First));
                    let id = self.allocate_transfer_id();
                    self.burns.push(Transfer {
                        id,
                        from: Some(player),
                        to: self.winner(),
                        amount,
                    });
                }
            }
            RoundEdit::RemoveBurn(player) => {
                self.burns.retain(|b| b.from != Some(player));
            }
            RoundEdit::AddTransfer { from, to, amount } => {
                let id = self.allocate_transfer_id();
                self.manual_transfers.push(Transfer {
                    id,
                    from: Some(from),
                    to: Some(to),
                    amount,
                });
            }
            RoundEdit::RemoveTransfer(id) => {
                self.manual_transfers.retain(|t| t.id != id);
            }
        }

        self.sync_burn_targets();
        // The id counter alone moving is not a change worth saving
        if self.burns == before.burns
            && self.manual_transfers == before.manual_transfers
            && self.ranking == before.ranking
            && self.self_win == before.self_win
        {
            self.next_transfer_id = before.next_transfer_id;
            return false;
        }
        true
    }

    /// Every burn pays the current winner.
    fn sync_burn_targets(&mut self) {
        let winner = self.winner();
        for burn in &mut self.burns {
            burn.to = winner;
        }
    }
}

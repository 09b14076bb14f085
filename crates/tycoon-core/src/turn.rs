//! Turn counter and round-robin seat.
//!
//! The turn number is the single source of truth for time. It starts at 0
//! with seat 0 and grows by exactly one per advance, so every deadline
//! value is reached on some turn.

use crate::error::TurnError;

/// The state after one advance, computed by [`TurnState::peek`] and applied
/// by [`TurnState::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advance {
    /// The new turn number.
    pub turn: u64,
    /// The new current seat.
    pub seat: usize,
    /// Whether the seat wrapped back to 0.
    pub round_completed: bool,
    /// Rounds completed once this advance is applied.
    pub rounds: u64,
}

/// Turn number, current seat and completed-round count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnState {
    turn: u64,
    seat: usize,
    players: usize,
    rounds: u64,
}

impl TurnState {
    /// Start at turn 0, seat 0, for `players` seats.
    pub const fn new(players: usize) -> Result<Self, TurnError> {
        if players == 0 {
            return Err(TurnError::NoPlayers);
        }
        Ok(Self {
            turn: 0,
            seat: 0,
            players,
            rounds: 0,
        })
    }

    /// Move to the next turn and seat.
    pub fn advance(&mut self) -> Result<Advance, TurnError> {
        let next = self.peek()?;
        self.commit(next);
        Ok(next)
    }

    /// Compute the next turn and seat without moving.
    pub fn peek(&self) -> Result<Advance, TurnError> {
        let turn = self.turn.checked_add(1).ok_or(TurnError::TurnOverflow)?;
        let seat = self
            .seat
            .checked_add(1)
            .and_then(|s| s.checked_rem(self.players))
            .ok_or(TurnError::NoPlayers)?;
        let round_completed = seat == 0;
        let rounds = if round_completed {
            self.rounds.checked_add(1).ok_or(TurnError::TurnOverflow)?
        } else {
            self.rounds
        };

        Ok(Advance {
            turn,
            seat,
            round_completed,
            rounds,
        })
    }

    /// Apply an advance obtained from [`peek`](Self::peek).
    pub(crate) const fn commit(&mut self, next: Advance) {
        self.turn = next.turn;
        self.seat = next.seat;
        self.rounds = next.rounds;
    }

    /// Current turn number.
    pub const fn turn(&self) -> u64 {
        self.turn
    }

    /// Index of the seat whose turn it is.
    pub const fn seat(&self) -> usize {
        self.seat
    }

    /// Number of seats.
    pub const fn players(&self) -> usize {
        self.players
    }

    /// Rounds completed so far.
    pub const fn rounds(&self) -> u64 {
        self.rounds
    }
}

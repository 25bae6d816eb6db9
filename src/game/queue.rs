//! Matchmaking Queue
//!
//! Strict FIFO pairing of waiting players. No skill or preference logic;
//! the two longest-waiting players are matched as soon as the queue holds
//! at least two. All operations are total.

use std::collections::VecDeque;

use crate::game::session::PlayerId;

/// A player waiting to be matched. The queue owns the player until a
/// pair is dequeued; after that the session owns it.
#[derive(Clone, Debug)]
pub struct QueuedPlayer {
    /// Player identifier.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
}

/// FIFO queue of players waiting for an opponent.
#[derive(Debug, Default)]
pub struct MatchQueue {
    waiting: VecDeque<QueuedPlayer>,
}

impl MatchQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a player at the tail and return their 1-based position.
    /// The caller notifies the player of the position.
    pub fn enqueue(&mut self, player: QueuedPlayer) -> usize {
        self.waiting.push_back(player);
        self.waiting.len()
    }

    /// Remove and return the two longest-waiting players, in arrival
    /// order, when the queue holds at least two.
    pub fn dequeue_pair(&mut self) -> Option<(QueuedPlayer, QueuedPlayer)> {
        if self.waiting.len() < 2 {
            return None;
        }
        let first = self.waiting.pop_front()?;
        let second = self.waiting.pop_front()?;
        Some((first, second))
    }

    /// Drop a waiting player (disconnect before matching). Returns true
    /// if the player was queued.
    pub fn remove(&mut self, player_id: &PlayerId) -> bool {
        let before = self.waiting.len();
        self.waiting.retain(|p| p.id != *player_id);
        self.waiting.len() != before
    }

    /// Number of players still waiting.
    pub fn len(&self) -> usize {
        self.waiting.len()
    }

    /// Whether nobody is waiting.
    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty()
    }
}

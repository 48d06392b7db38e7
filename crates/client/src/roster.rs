// Local roster cache.
//
// The coordinator owns the roster; this is a disposable read-through
// cache rebuilt from every full snapshot it broadcasts. Snapshots are
// never deltas, which sidesteps ordering bugs from interleaved
// individual join events.

use coderoom_common::types::Participant;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct Roster {
    participants: Vec<Participant>,
}

impl Roster {
    /// Replace the entire roster with the coordinator's snapshot.
    pub fn apply_snapshot(&mut self, clients: Vec<Participant>) {
        self.participants = clients;
    }

    /// Remove exactly one entry matching `socket_id`. No-op when
    /// absent, so duplicate or delayed disconnect notices are harmless.
    pub fn remove(&mut self, socket_id: Uuid) -> Option<Participant> {
        let position =
            self.participants.iter().position(|participant| participant.socket_id == socket_id)?;
        Some(self.participants.remove(position))
    }

    pub fn clear(&mut self) {
        self.participants.clear();
    }

    /// Participants in snapshot order.
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn contains(&self, socket_id: Uuid) -> bool {
        self.participants.iter().any(|participant| participant.socket_id == socket_id)
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}

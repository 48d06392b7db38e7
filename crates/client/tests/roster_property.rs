// Property: for any interleaving of full roster snapshots and
// disconnect notices applied in arrival order, the locally observed
// roster equals the last snapshot minus the disconnects received after
// it.

use coderoom_client::Roster;
use coderoom_common::types::Participant;
use proptest::prelude::*;
use std::collections::BTreeSet;
use uuid::Uuid;

#[derive(Debug, Clone)]
enum RosterEvent {
    Snapshot(BTreeSet<u8>),
    Disconnect(u8),
}

fn participant(id: u8) -> Participant {
    Participant { socket_id: Uuid::from_u128(id as u128), username: format!("user-{id}") }
}

fn event_strategy() -> impl Strategy<Value = RosterEvent> {
    prop_oneof![
        prop::collection::btree_set(0u8..8, 0..6).prop_map(RosterEvent::Snapshot),
        (0u8..8).prop_map(RosterEvent::Disconnect),
    ]
}

proptest! {
    #[test]
    fn roster_is_last_snapshot_minus_subsequent_disconnects(
        events in prop::collection::vec(event_strategy(), 0..40),
    ) {
        let mut roster = Roster::default();
        let mut expected: Vec<u8> = Vec::new();

        for event in &events {
            match event {
                RosterEvent::Snapshot(ids) => {
                    roster.apply_snapshot(ids.iter().map(|id| participant(*id)).collect());
                    expected = ids.iter().copied().collect();
                }
                RosterEvent::Disconnect(id) => {
                    roster.remove(Uuid::from_u128(*id as u128));
                    expected.retain(|present| present != id);
                }
            }
        }

        let observed: Vec<u8> = roster
            .participants()
            .iter()
            .map(|p| p.socket_id.as_u128() as u8)
            .collect();
        prop_assert_eq!(observed, expected);
    }

    #[test]
    fn disconnects_without_a_snapshot_leave_the_roster_empty(
        ids in prop::collection::vec(0u8..8, 0..10),
    ) {
        let mut roster = Roster::default();
        for id in ids {
            roster.remove(Uuid::from_u128(id as u128));
        }
        prop_assert!(roster.is_empty());
    }
}

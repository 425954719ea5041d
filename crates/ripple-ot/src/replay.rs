//! Replaying server acknowledgements onto locally applied ops.
//!
//! A client applies its own ops right away with provisional contexts
//! ([`LocalContextFactory`](crate::LocalContextFactory): no timestamp, no
//! version movement). When the server acknowledges the delta, the client
//! applies one version update per op so its wavelet lands on the real
//! resulting version and hash without re-running any content op.

use ripple_types::HashedVersion;

use crate::WaveletOperation;

/// One version update per acknowledged op, in op order.
///
/// Each moves the version by one; the last stamps `resulting_version`.
pub fn version_updates_for_ack(
    ops: &[WaveletOperation],
    resulting_version: &HashedVersion,
) -> Vec<WaveletOperation> {
    let last = ops.len().saturating_sub(1);
    ops.iter()
        .enumerate()
        .map(|(i, op)| op.create_version_update_op(1, (i == last).then(|| resulting_version.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use ripple_doc::DocOpBuilder;
    use ripple_types::{ItemId, ParticipantId};

    use super::*;
    use crate::{ItemState, LocalContextFactory, OpBuilder, WaveletData, WaveletState};

    #[test]
    fn test_ack_moves_local_state_to_server_version() {
        let alice = ParticipantId::parse("alice@x.com").unwrap();
        let builder = OpBuilder::new(LocalContextFactory::new(alice.clone()));
        let mut wavelet = WaveletData::new(HashedVersion::new(3, vec![3]), 100);

        let ops = vec![
            builder.add_participant(alice.clone()),
            builder.edit_item("b+1", DocOpBuilder::new().characters("hi").build()),
        ];
        for op in &ops {
            op.apply(&mut wavelet).unwrap();
        }
        assert_eq!(wavelet.version(), 3);
        assert_eq!(wavelet.item(&ItemId::from("b+1")).unwrap().last_modified_version(), 3);

        let acked = HashedVersion::new(5, vec![5, 5]);
        let updates = version_updates_for_ack(&ops, &acked);
        assert_eq!(updates.len(), 2);
        assert!(updates[0].context().hashed_version().is_none());
        for update in &updates {
            update.apply(&mut wavelet).unwrap();
        }

        assert_eq!(wavelet.version(), 5);
        assert_eq!(wavelet.hashed_version(), &acked);
        assert_eq!(wavelet.last_modified_time(), 100);
        assert_eq!(wavelet.item(&ItemId::from("b+1")).unwrap().last_modified_version(), 5);
    }

    #[test]
    fn test_empty_ack() {
        assert!(version_updates_for_ack(&[], &HashedVersion::unsigned(1)).is_empty());
    }
}

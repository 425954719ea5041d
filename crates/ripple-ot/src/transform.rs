//! Jupiter transform over wavelet operations.
//!
//! [`transform`] takes a client op and a server op that both apply to the
//! same state and returns `(client', server')` such that applying `server`
//! then `client'` converges with applying `client` then `server'`.
//!
//! Dispatch, in order:
//!
//! 1. Version updates are never transformed.
//! 2. Two item ops on the same item transform their inner ops. Two content
//!    edits go through the [`ContentTransformer`]; every other pairing is
//!    left unchanged.
//! 3. Participant races: a concurrent removal of the client op's creator
//!    fails with [`TransformError::RemovedAuthor`], matching add/add or
//!    remove/remove pairs collapse to no-ops, and add/remove of the same
//!    participant fails with [`TransformError::ParticipantConflict`].
//! 4. Everything else commutes as is.

use ripple_doc::ContentTransformer;

use crate::{Delta, ItemOp, OpKind, TransformError, TransformedDelta, WaveletOperation};

type OpPair = (WaveletOperation, WaveletOperation);

/// Transform one concurrent pair.
pub fn transform<T: ContentTransformer + ?Sized>(
    client: &WaveletOperation,
    server: &WaveletOperation,
    content: &T,
) -> Result<OpPair, TransformError> {
    match (client.kind(), server.kind()) {
        (OpKind::VersionUpdate { .. }, _) | (_, OpKind::VersionUpdate { .. }) => {
            Ok(identity(client, server))
        }
        (
            OpKind::Item {
                item_id: client_item,
                op: client_op,
            },
            OpKind::Item {
                item_id: server_item,
                op: server_op,
            },
        ) if client_item == server_item => {
            let (client_op, server_op) = transform_item_ops(client_op, server_op, content)?;
            Ok((
                WaveletOperation::item(client.context().clone(), client_item.clone(), client_op),
                WaveletOperation::item(server.context().clone(), server_item.clone(), server_op),
            ))
        }
        _ => transform_membership(client, server),
    }
}

/// Transform a client op sequence against a server op sequence.
///
/// Each server op is pushed through every client op in order, so the
/// returned client ops apply after all of `server_ops` and the returned
/// server ops apply after all of `client_ops`.
pub fn transform_ops<T: ContentTransformer + ?Sized>(
    client_ops: &[WaveletOperation],
    server_ops: &[WaveletOperation],
    content: &T,
) -> Result<(Vec<WaveletOperation>, Vec<WaveletOperation>), TransformError> {
    let mut client = client_ops.to_vec();
    let mut server_out = Vec::with_capacity(server_ops.len());

    for server_op in server_ops {
        let mut server_op = server_op.clone();
        let mut next = Vec::with_capacity(client.len());
        for client_op in &client {
            let (client_op, transformed_server) = transform(client_op, &server_op, content)?;
            next.push(client_op);
            server_op = transformed_server;
        }
        client = next;
        server_out.push(server_op);
    }

    Ok((client, server_out))
}

/// Rebase `client` over an applied server delta.
///
/// The result targets the server delta's resulting version.
pub fn transform_delta<T: ContentTransformer + ?Sized>(
    client: &Delta,
    server: &TransformedDelta,
    content: &T,
) -> Result<Delta, TransformError> {
    let (ops, _) = transform_ops(client.ops(), server.ops(), content)?;
    Ok(Delta::new(
        client.author().clone(),
        server.resulting_version().clone(),
        ops,
    ))
}

fn identity(client: &WaveletOperation, server: &WaveletOperation) -> OpPair {
    (client.clone(), server.clone())
}

fn noop_pair(client: &WaveletOperation, server: &WaveletOperation) -> OpPair {
    (
        WaveletOperation::noop(client.context().clone()),
        WaveletOperation::noop(server.context().clone()),
    )
}

fn transform_item_ops<T: ContentTransformer + ?Sized>(
    client: &ItemOp,
    server: &ItemOp,
    content: &T,
) -> Result<(ItemOp, ItemOp), TransformError> {
    match (client, server) {
        (
            ItemOp::ContentEdit {
                content_op: client_op,
                attribution: client_attribution,
                restore: client_restore,
                contributor_index: client_index,
            },
            ItemOp::ContentEdit {
                content_op: server_op,
                attribution: server_attribution,
                restore: server_restore,
                contributor_index: server_index,
            },
        ) => {
            let (client_op, server_op) = content.transform(client_op, server_op)?;
            Ok((
                ItemOp::ContentEdit {
                    content_op: client_op,
                    attribution: *client_attribution,
                    restore: *client_restore,
                    contributor_index: *client_index,
                },
                ItemOp::ContentEdit {
                    content_op: server_op,
                    attribution: *server_attribution,
                    restore: *server_restore,
                    contributor_index: *server_index,
                },
            ))
        }
        _ => Ok((client.clone(), server.clone())),
    }
}

fn transform_membership(
    client: &WaveletOperation,
    server: &WaveletOperation,
) -> Result<OpPair, TransformError> {
    match server.kind() {
        OpKind::RemoveParticipant { participant } => {
            if client.creator() == participant {
                tracing::debug!(author = %participant, "client op author removed concurrently");
                return Err(TransformError::RemovedAuthor(participant.clone()));
            }
            match client.kind() {
                OpKind::RemoveParticipant { participant: other } if other == participant => {
                    tracing::debug!(participant = %participant, "collapsing concurrent removals");
                    Ok(noop_pair(client, server))
                }
                OpKind::AddParticipant { participant: other, .. } if other == participant => {
                    tracing::debug!(participant = %participant, "client add races server remove");
                    Err(TransformError::ParticipantConflict(participant.clone()))
                }
                _ => Ok(identity(client, server)),
            }
        }
        OpKind::AddParticipant { participant, .. } => match client.kind() {
            OpKind::AddParticipant { participant: other, .. } if other == participant => {
                tracing::debug!(participant = %participant, "collapsing concurrent adds");
                Ok(noop_pair(client, server))
            }
            OpKind::RemoveParticipant { participant: other } if other == participant => {
                tracing::debug!(participant = %participant, "client remove races server add");
                Err(TransformError::ParticipantConflict(participant.clone()))
            }
            _ => Ok(identity(client, server)),
        },
        _ => Ok(identity(client, server)),
    }
}

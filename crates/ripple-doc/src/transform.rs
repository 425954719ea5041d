//! Pairwise transform of concurrent content ops.

use crate::{Component, ContentTransformError, DocOp, DocOpBuilder};

/// Transforms two concurrent content ops into a commuting pair.
///
/// For ops `client` and `server` that apply to the same document, the result
/// `(client', server')` must satisfy: applying `server` then `client'` yields
/// the same document as applying `client` then `server'`.
pub trait ContentTransformer: Send + Sync {
    fn transform(
        &self,
        client: &DocOp,
        server: &DocOp,
    ) -> Result<(DocOp, DocOp), ContentTransformError>;
}

/// Transformer for ops made of retains, insertions, and deletions.
///
/// Treats the document as a linear item sequence. When both sides insert at
/// the same position the server's insertion goes first. Attribute and
/// annotation components are rejected.
#[derive(Clone, Copy, Debug, Default)]
pub struct LinearTransformer;

impl LinearTransformer {
    pub fn new() -> Self {
        Self
    }
}

fn check_supported(op: &DocOp) -> Result<(), ContentTransformError> {
    match op.iter().find(|c| !(matches!(c, Component::Retain(_)) || c.is_insertion() || c.is_deletion())) {
        Some(c) => Err(ContentTransformError::Unsupported(c.kind())),
        None => Ok(()),
    }
}

impl ContentTransformer for LinearTransformer {
    fn transform(
        &self,
        client: &DocOp,
        server: &DocOp,
    ) -> Result<(DocOp, DocOp), ContentTransformError> {
        check_supported(client)?;
        check_supported(server)?;
        if client.input_len() != server.input_len() {
            return Err(ContentTransformError::LengthMismatch {
                client: client.input_len(),
                server: server.input_len(),
            });
        }

        let client = client.normalized();
        let server = server.normalized();
        let mut client_iter = client.components().iter().cloned();
        let mut server_iter = server.components().iter().cloned();
        let mut client_cur = client_iter.next();
        let mut server_cur = server_iter.next();

        let mut client_out = DocOpBuilder::new();
        let mut server_out = DocOpBuilder::new();

        loop {
            match (client_cur.take(), server_cur.take()) {
                (None, None) => break,
                // Server insertions win ties: the client skips over them.
                (c, Some(s)) if s.is_insertion() => {
                    client_out.retain(s.output_len());
                    server_out.push(s);
                    client_cur = c;
                    server_cur = server_iter.next();
                }
                (Some(c), s) if c.is_insertion() => {
                    server_out.retain(c.output_len());
                    client_out.push(c);
                    client_cur = client_iter.next();
                    server_cur = s;
                }
                (Some(c), Some(s)) => {
                    let k = c.input_len().min(s.input_len());
                    let (c_head, c_rest) = c.split_at(k);
                    let (s_head, s_rest) = s.split_at(k);
                    match (c_head, s_head) {
                        (Component::Retain(_), Component::Retain(_)) => {
                            client_out.retain(k);
                            server_out.retain(k);
                        }
                        // Server deleted what the client kept.
                        (Component::Retain(_), deletion) => {
                            server_out.push(deletion);
                        }
                        (deletion, Component::Retain(_)) => {
                            client_out.push(deletion);
                        }
                        // Both deleted the same items.
                        (_, _) => {}
                    }
                    client_cur = c_rest.or_else(|| client_iter.next());
                    server_cur = s_rest.or_else(|| server_iter.next());
                }
                (c, s) => {
                    let remaining = |cur: Option<Component>| cur.map(|x| x.input_len()).unwrap_or(0);
                    return Err(ContentTransformError::LengthMismatch {
                        client: remaining(c),
                        server: remaining(s),
                    });
                }
            }
        }

        Ok((client_out.build(), server_out.build()))
    }
}

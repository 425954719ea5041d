//! Whether a content edit deserves attribution.
//!
//! Selection ranges, spell-check marks, auto-links, translation and language
//! tags, and inline reply anchors change a document without changing what
//! anyone wrote. Edits made only of those don't bump contributors or
//! last-modified metadata.
//!
//! Scanning stops at the first worthy component.

use ripple_doc::{AnnotationBoundary, Component, DocOp};
use ripple_types::ItemId;

/// Tag of the element anchoring an inline reply thread.
pub const INLINE_REPLY_ANCHOR_TAG: &str = "reply";

/// Annotation key prefixes that never make an edit worthy.
pub const EXEMPT_ANNOTATION_PREFIXES: &[&str] = &["user/", "spell", "link/auto", "tr/", "lang"];

/// Item id prefix for attachment-backed items.
pub const ATTACHMENT_ITEM_PREFIX: &str = "attach+";

/// Fixed id of the per-user mini item.
pub const MINI_ITEM_ID: &str = "mini";

/// Item id prefix for transient items.
pub const TRANSIENT_ITEM_PREFIX: &str = "tr+";

/// True if any component of `op` is a worthy change.
pub fn is_worthy(op: &DocOp) -> bool {
    let mut scan = Scan::default();
    op.iter().any(|c| scan.is_worthy(c))
}

/// False for reserved item ids whose edits are never worthy.
pub fn is_item_id_worthy(id: &ItemId) -> bool {
    let id = id.as_str();
    !(id.starts_with(ATTACHMENT_ITEM_PREFIX)
        || id == MINI_ITEM_ID
        || id.starts_with(TRANSIENT_ITEM_PREFIX))
}

fn is_exempt_key(key: &str) -> bool {
    EXEMPT_ANNOTATION_PREFIXES
        .iter()
        .any(|prefix| key.starts_with(prefix))
}

fn is_worthy_boundary(boundary: &AnnotationBoundary) -> bool {
    boundary.keys().any(|key| !is_exempt_key(key))
}

/// Element ends carry no tag, so track whether each open start was an anchor.
#[derive(Default)]
struct Scan {
    inserted_anchor: Vec<bool>,
    deleted_anchor: Vec<bool>,
}

impl Scan {
    fn is_worthy(&mut self, component: &Component) -> bool {
        match component {
            Component::Retain(_) => false,
            Component::Characters(_) | Component::DeleteCharacters(_) => true,
            Component::ElementStart { tag, .. } => {
                let anchor = tag == INLINE_REPLY_ANCHOR_TAG;
                self.inserted_anchor.push(anchor);
                !anchor
            }
            Component::DeleteElementStart { tag, .. } => {
                let anchor = tag == INLINE_REPLY_ANCHOR_TAG;
                self.deleted_anchor.push(anchor);
                !anchor
            }
            // An end whose start lies outside the op is treated as worthy.
            Component::ElementEnd => !self.inserted_anchor.pop().unwrap_or(false),
            Component::DeleteElementEnd => !self.deleted_anchor.pop().unwrap_or(false),
            Component::ReplaceAttributes { .. } | Component::UpdateAttributes(_) => true,
            Component::AnnotationBoundary(boundary) => is_worthy_boundary(boundary),
        }
    }
}

#[cfg(test)]
mod tests {
    use ripple_doc::{AnnotationChange, Attributes, DocOpBuilder};

    use super::*;

    fn change(key: &str) -> AnnotationBoundary {
        AnnotationBoundary {
            ends: vec![],
            changes: vec![AnnotationChange {
                key: key.into(),
                old: None,
                new: Some("x".into()),
            }],
        }
    }

    fn end(key: &str) -> AnnotationBoundary {
        AnnotationBoundary {
            ends: vec![key.into()],
            changes: vec![],
        }
    }

    #[test]
    fn test_retain_only_is_not_worthy() {
        assert!(!is_worthy(&DocOpBuilder::new().retain(10).build()));
        assert!(!is_worthy(&DocOp::default()));
    }

    #[test]
    fn test_exempt_annotation_not_worthy_until_text_added() {
        let mut b = DocOpBuilder::new();
        b.retain(3)
            .annotation_boundary(change("spell"))
            .retain(2)
            .annotation_boundary(end("spell"))
            .retain(1);
        let exempt = b.build();
        assert!(!is_worthy(&exempt));

        let mut with_text = exempt.components().to_vec();
        with_text.push(Component::Characters("a".into()));
        assert!(is_worthy(&DocOp::new(with_text)));
    }

    #[test]
    fn test_every_exempt_prefix() {
        for key in ["user/d/abc", "spell", "link/auto", "tr/en", "lang"] {
            let op = DocOpBuilder::new()
                .annotation_boundary(change(key))
                .retain(1)
                .annotation_boundary(end(key))
                .build();
            assert!(!is_worthy(&op), "{key} should be exempt");
        }
    }

    #[test]
    fn test_other_annotations_are_worthy() {
        let op = DocOpBuilder::new()
            .annotation_boundary(change("style/fontWeight"))
            .retain(1)
            .annotation_boundary(end("style/fontWeight"))
            .build();
        assert!(is_worthy(&op));

        // An end alone for a non-exempt key counts too.
        let op = DocOpBuilder::new().retain(1).annotation_boundary(end("link/manual")).build();
        assert!(is_worthy(&op));
    }

    #[test]
    fn test_reply_anchor_insert_and_delete_not_worthy() {
        let insert = DocOpBuilder::new()
            .retain(4)
            .element_start(INLINE_REPLY_ANCHOR_TAG, Attributes::new())
            .element_end()
            .retain(2)
            .build();
        assert!(!is_worthy(&insert));
        assert!(!is_worthy(&insert.invert()));
    }

    #[test]
    fn test_other_elements_are_worthy() {
        let op = DocOpBuilder::new()
            .element_start("line", Attributes::new())
            .element_end()
            .build();
        assert!(is_worthy(&op));

        // Anchor end closes the anchor; a following paragraph end is worthy.
        let op = DocOpBuilder::new()
            .element_start(INLINE_REPLY_ANCHOR_TAG, Attributes::new())
            .element_end()
            .element_end()
            .build();
        assert!(is_worthy(&op));
    }

    #[test]
    fn test_attribute_changes_are_worthy() {
        let op = DocOp::new(vec![
            Component::ReplaceAttributes {
                old: Attributes::new(),
                new: Attributes::new(),
            },
        ]);
        assert!(is_worthy(&op));
        let op = DocOp::new(vec![Component::UpdateAttributes(vec![])]);
        assert!(is_worthy(&op));
    }

    #[test]
    fn test_reserved_item_ids() {
        assert!(is_item_id_worthy(&ItemId::from("b+abc")));
        assert!(!is_item_id_worthy(&ItemId::from("attach+photo")));
        assert!(!is_item_id_worthy(&ItemId::from("mini")));
        assert!(!is_item_id_worthy(&ItemId::from("tr+123")));
        assert!(is_item_id_worthy(&ItemId::from("minibar")));
    }
}

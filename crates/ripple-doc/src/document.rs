//! In-memory document content.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{AttributeChange, Attributes, Component, DocOp, DocOpError};

/// What a document item is.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Char(char),
    ElementStart { tag: String, attributes: Attributes },
    ElementEnd,
}

/// One position in a document.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocItem {
    pub kind: ItemKind,
    pub annotations: BTreeMap<String, String>,
}

impl DocItem {
    fn new(kind: ItemKind, annotations: BTreeMap<String, String>) -> Self {
        Self { kind, annotations }
    }
}

/// A document: a flat item sequence.
///
/// Element nesting is not validated here; ops are trusted to keep starts and
/// ends balanced.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Document {
    items: Vec<DocItem>,
}

/// Open annotation change: (old, new).
type OpenAnnotations = BTreeMap<String, (Option<String>, Option<String>)>;

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// A document holding plain characters, unannotated.
    pub fn from_text(text: &str) -> Self {
        Self {
            items: text
                .chars()
                .map(|c| DocItem::new(ItemKind::Char(c), BTreeMap::new()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[DocItem] {
        &self.items
    }

    /// Character content with markup dropped.
    pub fn text(&self) -> String {
        self.items
            .iter()
            .filter_map(|item| match item.kind {
                ItemKind::Char(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    /// Apply `op`. On error the document is left untouched.
    pub fn apply(&mut self, op: &DocOp) -> Result<(), DocOpError> {
        let mut out = Vec::with_capacity(self.items.len());
        let mut open = OpenAnnotations::new();
        let mut pos = 0;

        for component in op {
            match component {
                Component::Retain(n) => {
                    for _ in 0..*n {
                        let mut item = self.item_at(pos)?.clone();
                        annotate_existing(&mut item, &open, pos)?;
                        out.push(item);
                        pos += 1;
                    }
                }
                Component::Characters(s) => {
                    for c in s.chars() {
                        out.push(DocItem::new(ItemKind::Char(c), inserted_annotations(&open)));
                    }
                }
                Component::ElementStart { tag, attributes } => {
                    out.push(DocItem::new(
                        ItemKind::ElementStart {
                            tag: tag.clone(),
                            attributes: attributes.clone(),
                        },
                        inserted_annotations(&open),
                    ));
                }
                Component::ElementEnd => {
                    out.push(DocItem::new(ItemKind::ElementEnd, inserted_annotations(&open)));
                }
                Component::DeleteCharacters(s) => {
                    for c in s.chars() {
                        if self.item_at(pos)?.kind != ItemKind::Char(c) {
                            return Err(DocOpError::DeletionMismatch { pos });
                        }
                        pos += 1;
                    }
                }
                Component::DeleteElementStart { tag, attributes } => {
                    let expected = ItemKind::ElementStart {
                        tag: tag.clone(),
                        attributes: attributes.clone(),
                    };
                    if self.item_at(pos)?.kind != expected {
                        return Err(DocOpError::DeletionMismatch { pos });
                    }
                    pos += 1;
                }
                Component::DeleteElementEnd => {
                    if self.item_at(pos)?.kind != ItemKind::ElementEnd {
                        return Err(DocOpError::DeletionMismatch { pos });
                    }
                    pos += 1;
                }
                Component::ReplaceAttributes { old, new } => {
                    let mut item = self.item_at(pos)?.clone();
                    match &mut item.kind {
                        ItemKind::ElementStart { attributes, .. } => {
                            if attributes != old {
                                return Err(DocOpError::AttributeMismatch { pos, key: None });
                            }
                            *attributes = new.clone();
                        }
                        _ => return Err(DocOpError::NotAnElement { pos }),
                    }
                    annotate_existing(&mut item, &open, pos)?;
                    out.push(item);
                    pos += 1;
                }
                Component::UpdateAttributes(changes) => {
                    let mut item = self.item_at(pos)?.clone();
                    match &mut item.kind {
                        ItemKind::ElementStart { attributes, .. } => {
                            update_attributes(attributes, changes, pos)?;
                        }
                        _ => return Err(DocOpError::NotAnElement { pos }),
                    }
                    annotate_existing(&mut item, &open, pos)?;
                    out.push(item);
                    pos += 1;
                }
                Component::AnnotationBoundary(boundary) => {
                    for key in &boundary.ends {
                        open.remove(key);
                    }
                    for change in &boundary.changes {
                        open.insert(change.key.clone(), (change.old.clone(), change.new.clone()));
                    }
                }
            }
        }

        if pos != self.items.len() {
            return Err(DocOpError::LengthMismatch {
                consumed: pos,
                len: self.items.len(),
            });
        }
        if let Some(key) = open.keys().next() {
            return Err(DocOpError::UnclosedAnnotation(key.clone()));
        }

        self.items = out;
        Ok(())
    }

    fn item_at(&self, pos: usize) -> Result<&DocItem, DocOpError> {
        self.items.get(pos).ok_or(DocOpError::LengthMismatch {
            consumed: pos + 1,
            len: self.items.len(),
        })
    }
}

fn inserted_annotations(open: &OpenAnnotations) -> BTreeMap<String, String> {
    open.iter()
        .filter_map(|(key, (_, new))| new.as_ref().map(|v| (key.clone(), v.clone())))
        .collect()
}

fn annotate_existing(item: &mut DocItem, open: &OpenAnnotations, pos: usize) -> Result<(), DocOpError> {
    for (key, (old, new)) in open {
        if item.annotations.get(key) != old.as_ref() {
            return Err(DocOpError::AnnotationMismatch {
                pos,
                key: key.clone(),
            });
        }
        match new {
            Some(v) => {
                item.annotations.insert(key.clone(), v.clone());
            }
            None => {
                item.annotations.remove(key);
            }
        }
    }
    Ok(())
}

fn update_attributes(
    attributes: &mut Attributes,
    changes: &[AttributeChange],
    pos: usize,
) -> Result<(), DocOpError> {
    for change in changes {
        if attributes.get(&change.key) != change.old.as_ref() {
            return Err(DocOpError::AttributeMismatch {
                pos,
                key: Some(change.key.clone()),
            });
        }
        match &change.new {
            Some(v) => {
                attributes.insert(change.key.clone(), v.clone());
            }
            None => {
                attributes.remove(&change.key);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AnnotationBoundary, AnnotationChange, DocOpBuilder};

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_insert_and_delete_text() {
        let mut doc = Document::from_text("hello");
        doc.apply(&DocOpBuilder::new().retain(5).characters(" world").build())
            .unwrap();
        assert_eq!(doc.text(), "hello world");

        doc.apply(&DocOpBuilder::new().delete_characters("hello").retain(6).build())
            .unwrap();
        assert_eq!(doc.text(), " world");
    }

    #[test]
    fn test_length_mismatch_leaves_document_untouched() {
        let mut doc = Document::from_text("abc");
        let before = doc.clone();

        let short = DocOpBuilder::new().retain(2).characters("x").build();
        assert!(matches!(
            doc.apply(&short),
            Err(DocOpError::LengthMismatch { consumed: 2, len: 3 })
        ));
        let long = DocOpBuilder::new().retain(4).build();
        assert!(matches!(doc.apply(&long), Err(DocOpError::LengthMismatch { .. })));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_deletion_must_match_content() {
        let mut doc = Document::from_text("abc");
        let op = DocOpBuilder::new().delete_characters("ax").retain(1).build();
        assert_eq!(doc.apply(&op), Err(DocOpError::DeletionMismatch { pos: 1 }));
        assert_eq!(doc.text(), "abc");
    }

    #[test]
    fn test_elements_and_attributes() {
        let mut doc = Document::new();
        doc.apply(
            &DocOpBuilder::new()
                .element_start("p", attrs(&[("a", "1")]))
                .characters("hi")
                .element_end()
                .build(),
        )
        .unwrap();
        assert_eq!(doc.len(), 4);
        assert_eq!(doc.text(), "hi");

        let update = DocOp::new(vec![
            Component::UpdateAttributes(vec![AttributeChange {
                key: "a".into(),
                old: Some("1".into()),
                new: Some("2".into()),
            }]),
            Component::Retain(3),
        ]);
        doc.apply(&update).unwrap();
        assert_eq!(
            doc.items()[0].kind,
            ItemKind::ElementStart {
                tag: "p".into(),
                attributes: attrs(&[("a", "2")])
            }
        );

        // Replaying the same update now has a stale old value.
        assert!(matches!(
            doc.apply(&update),
            Err(DocOpError::AttributeMismatch { pos: 0, .. })
        ));

        let replace_on_char = DocOp::new(vec![
            Component::Retain(1),
            Component::ReplaceAttributes {
                old: Attributes::new(),
                new: Attributes::new(),
            },
            Component::Retain(2),
        ]);
        assert_eq!(doc.apply(&replace_on_char), Err(DocOpError::NotAnElement { pos: 1 }));
    }

    #[test]
    fn test_annotations_apply_and_close() {
        let mut doc = Document::from_text("abc");
        let op = DocOpBuilder::new()
            .annotation_boundary(AnnotationBoundary {
                ends: vec![],
                changes: vec![AnnotationChange {
                    key: "style/bold".into(),
                    old: None,
                    new: Some("true".into()),
                }],
            })
            .retain(2)
            .annotation_boundary(AnnotationBoundary {
                ends: vec!["style/bold".into()],
                changes: vec![],
            })
            .retain(1)
            .build();
        doc.apply(&op).unwrap();
        assert_eq!(doc.items()[0].annotations.get("style/bold").map(String::as_str), Some("true"));
        assert_eq!(doc.items()[1].annotations.get("style/bold").map(String::as_str), Some("true"));
        assert!(doc.items()[2].annotations.is_empty());

        // Inverse removes the annotation again.
        doc.apply(&op.invert()).unwrap();
        assert_eq!(doc, Document::from_text("abc"));
    }

    #[test]
    fn test_unclosed_annotation_rejected() {
        let mut doc = Document::from_text("a");
        let op = DocOpBuilder::new()
            .annotation_boundary(AnnotationBoundary {
                ends: vec![],
                changes: vec![AnnotationChange {
                    key: "k".into(),
                    old: None,
                    new: Some("v".into()),
                }],
            })
            .retain(1)
            .build();
        assert_eq!(doc.apply(&op), Err(DocOpError::UnclosedAnnotation("k".into())));
        assert_eq!(doc, Document::from_text("a"));
    }

    #[test]
    fn test_invert_restores_document() {
        let original = Document::from_text("kitten");
        let op = DocOpBuilder::new()
            .delete_characters("k")
            .characters("s")
            .retain(4)
            .delete_characters("n")
            .characters("ng")
            .build();
        let mut doc = original.clone();
        doc.apply(&op).unwrap();
        assert_eq!(doc.text(), "sitteng");
        doc.apply(&op.invert()).unwrap();
        assert_eq!(doc, original);
    }
}

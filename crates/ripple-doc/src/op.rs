//! Document operation components.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Element attributes, ordered by key.
pub type Attributes = BTreeMap<String, String>;

/// One key of an attribute update. `None` means absent.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeChange {
    pub key: String,
    pub old: Option<String>,
    pub new: Option<String>,
}

/// Opens (or re-opens) an annotation change for `key` from this point on.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnnotationChange {
    pub key: String,
    pub old: Option<String>,
    pub new: Option<String>,
}

/// Annotation boundary: closes the keys in `ends`, opens the keys in `changes`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnnotationBoundary {
    pub ends: Vec<String>,
    pub changes: Vec<AnnotationChange>,
}

impl AnnotationBoundary {
    /// Every key this boundary touches, ends first.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.ends
            .iter()
            .map(String::as_str)
            .chain(self.changes.iter().map(|c| c.key.as_str()))
    }

    fn inverted(&self) -> Self {
        Self {
            ends: self.ends.clone(),
            changes: self
                .changes
                .iter()
                .map(|c| AnnotationChange {
                    key: c.key.clone(),
                    old: c.new.clone(),
                    new: c.old.clone(),
                })
                .collect(),
        }
    }
}

/// A single step of a document operation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Component {
    Retain(usize),
    Characters(String),
    DeleteCharacters(String),
    ElementStart { tag: String, attributes: Attributes },
    ElementEnd,
    DeleteElementStart { tag: String, attributes: Attributes },
    DeleteElementEnd,
    ReplaceAttributes { old: Attributes, new: Attributes },
    UpdateAttributes(Vec<AttributeChange>),
    AnnotationBoundary(AnnotationBoundary),
}

/// Discriminant of a [`Component`], for errors and logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ComponentKind {
    Retain,
    Characters,
    DeleteCharacters,
    ElementStart,
    ElementEnd,
    DeleteElementStart,
    DeleteElementEnd,
    ReplaceAttributes,
    UpdateAttributes,
    AnnotationBoundary,
}

impl Component {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Retain(_) => ComponentKind::Retain,
            Component::Characters(_) => ComponentKind::Characters,
            Component::DeleteCharacters(_) => ComponentKind::DeleteCharacters,
            Component::ElementStart { .. } => ComponentKind::ElementStart,
            Component::ElementEnd => ComponentKind::ElementEnd,
            Component::DeleteElementStart { .. } => ComponentKind::DeleteElementStart,
            Component::DeleteElementEnd => ComponentKind::DeleteElementEnd,
            Component::ReplaceAttributes { .. } => ComponentKind::ReplaceAttributes,
            Component::UpdateAttributes(_) => ComponentKind::UpdateAttributes,
            Component::AnnotationBoundary(_) => ComponentKind::AnnotationBoundary,
        }
    }

    /// Number of document items this component consumes.
    pub fn input_len(&self) -> usize {
        match self {
            Component::Retain(n) => *n,
            Component::DeleteCharacters(s) => s.chars().count(),
            Component::DeleteElementStart { .. }
            | Component::DeleteElementEnd
            | Component::ReplaceAttributes { .. }
            | Component::UpdateAttributes(_) => 1,
            Component::Characters(_)
            | Component::ElementStart { .. }
            | Component::ElementEnd
            | Component::AnnotationBoundary(_) => 0,
        }
    }

    /// Number of document items this component produces.
    pub fn output_len(&self) -> usize {
        match self {
            Component::Retain(n) => *n,
            Component::Characters(s) => s.chars().count(),
            Component::ElementStart { .. }
            | Component::ElementEnd
            | Component::ReplaceAttributes { .. }
            | Component::UpdateAttributes(_) => 1,
            Component::DeleteCharacters(_)
            | Component::DeleteElementStart { .. }
            | Component::DeleteElementEnd
            | Component::AnnotationBoundary(_) => 0,
        }
    }

    pub fn is_insertion(&self) -> bool {
        matches!(
            self,
            Component::Characters(_) | Component::ElementStart { .. } | Component::ElementEnd
        )
    }

    pub fn is_deletion(&self) -> bool {
        matches!(
            self,
            Component::DeleteCharacters(_)
                | Component::DeleteElementStart { .. }
                | Component::DeleteElementEnd
        )
    }

    /// The component that undoes this one.
    pub fn inverted(&self) -> Component {
        match self {
            Component::Retain(n) => Component::Retain(*n),
            Component::Characters(s) => Component::DeleteCharacters(s.clone()),
            Component::DeleteCharacters(s) => Component::Characters(s.clone()),
            Component::ElementStart { tag, attributes } => Component::DeleteElementStart {
                tag: tag.clone(),
                attributes: attributes.clone(),
            },
            Component::ElementEnd => Component::DeleteElementEnd,
            Component::DeleteElementStart { tag, attributes } => Component::ElementStart {
                tag: tag.clone(),
                attributes: attributes.clone(),
            },
            Component::DeleteElementEnd => Component::ElementEnd,
            Component::ReplaceAttributes { old, new } => Component::ReplaceAttributes {
                old: new.clone(),
                new: old.clone(),
            },
            Component::UpdateAttributes(changes) => Component::UpdateAttributes(
                changes
                    .iter()
                    .map(|c| AttributeChange {
                        key: c.key.clone(),
                        old: c.new.clone(),
                        new: c.old.clone(),
                    })
                    .collect(),
            ),
            Component::AnnotationBoundary(b) => Component::AnnotationBoundary(b.inverted()),
        }
    }

    /// Split a splittable component after `k` items.
    ///
    /// Only retains and character runs split; everything else has length one
    /// and comes back whole.
    pub(crate) fn split_at(self, k: usize) -> (Component, Option<Component>) {
        match self {
            Component::Retain(n) if k < n => (Component::Retain(k), Some(Component::Retain(n - k))),
            Component::Characters(s) if k < s.chars().count() => {
                let (head, tail) = split_chars(&s, k);
                (Component::Characters(head), Some(Component::Characters(tail)))
            }
            Component::DeleteCharacters(s) if k < s.chars().count() => {
                let (head, tail) = split_chars(&s, k);
                (
                    Component::DeleteCharacters(head),
                    Some(Component::DeleteCharacters(tail)),
                )
            }
            other => (other, None),
        }
    }
}

fn split_chars(s: &str, k: usize) -> (String, String) {
    let idx = s.char_indices().nth(k).map(|(i, _)| i).unwrap_or(s.len());
    (s[..idx].to_string(), s[idx..].to_string())
}

/// An ordered sequence of components spanning a whole document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocOp {
    components: Vec<Component>,
}

impl DocOp {
    pub fn new(components: Vec<Component>) -> Self {
        Self { components }
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Component> {
        self.components.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Length of the document this op applies to.
    pub fn input_len(&self) -> usize {
        self.components.iter().map(Component::input_len).sum()
    }

    /// Length of the document this op produces.
    pub fn output_len(&self) -> usize {
        self.components.iter().map(Component::output_len).sum()
    }

    /// The op that undoes this one when applied to its output.
    pub fn invert(&self) -> DocOp {
        DocOp::new(self.components.iter().map(Component::inverted).collect())
    }

    /// Same op with adjacent runs merged and empty components dropped.
    pub fn normalized(&self) -> DocOp {
        let mut b = DocOpBuilder::new();
        for c in &self.components {
            b.push(c.clone());
        }
        b.build()
    }
}

impl<'a> IntoIterator for &'a DocOp {
    type Item = &'a Component;
    type IntoIter = std::slice::Iter<'a, Component>;

    fn into_iter(self) -> Self::IntoIter {
        self.components.iter()
    }
}

/// Builds normalized ops: adjacent retains and character runs merge, empty
/// components are dropped.
#[derive(Debug, Default)]
pub struct DocOpBuilder {
    components: Vec<Component>,
}

impl DocOpBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn retain(&mut self, n: usize) -> &mut Self {
        self.push(Component::Retain(n))
    }

    pub fn characters(&mut self, s: impl Into<String>) -> &mut Self {
        self.push(Component::Characters(s.into()))
    }

    pub fn delete_characters(&mut self, s: impl Into<String>) -> &mut Self {
        self.push(Component::DeleteCharacters(s.into()))
    }

    pub fn element_start(&mut self, tag: impl Into<String>, attributes: Attributes) -> &mut Self {
        self.push(Component::ElementStart {
            tag: tag.into(),
            attributes,
        })
    }

    pub fn element_end(&mut self) -> &mut Self {
        self.push(Component::ElementEnd)
    }

    pub fn delete_element_start(
        &mut self,
        tag: impl Into<String>,
        attributes: Attributes,
    ) -> &mut Self {
        self.push(Component::DeleteElementStart {
            tag: tag.into(),
            attributes,
        })
    }

    pub fn delete_element_end(&mut self) -> &mut Self {
        self.push(Component::DeleteElementEnd)
    }

    pub fn annotation_boundary(&mut self, boundary: AnnotationBoundary) -> &mut Self {
        self.push(Component::AnnotationBoundary(boundary))
    }

    pub fn push(&mut self, component: Component) -> &mut Self {
        let absorbed = match (self.components.last_mut(), &component) {
            (_, Component::Retain(0)) => true,
            (_, Component::Characters(s) | Component::DeleteCharacters(s)) if s.is_empty() => true,
            (Some(Component::Retain(a)), Component::Retain(b)) => {
                *a += b;
                true
            }
            (Some(Component::Characters(a)), Component::Characters(b))
            | (Some(Component::DeleteCharacters(a)), Component::DeleteCharacters(b)) => {
                a.push_str(b);
                true
            }
            _ => false,
        };
        if !absorbed {
            self.components.push(component);
        }
        self
    }

    pub fn build(&mut self) -> DocOp {
        DocOp::new(std::mem::take(&mut self.components))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_merges_runs() {
        let op = DocOpBuilder::new()
            .retain(2)
            .retain(3)
            .characters("ab")
            .characters("c")
            .retain(0)
            .delete_characters("")
            .delete_characters("x")
            .delete_characters("y")
            .build();
        assert_eq!(
            op.components(),
            &[
                Component::Retain(5),
                Component::Characters("abc".into()),
                Component::DeleteCharacters("xy".into()),
            ]
        );
    }

    #[test]
    fn test_lengths() {
        let op = DocOpBuilder::new()
            .retain(2)
            .characters("héllo")
            .delete_characters("ab")
            .element_start("p", Attributes::new())
            .element_end()
            .build();
        assert_eq!(op.input_len(), 4);
        assert_eq!(op.output_len(), 9);
    }

    #[test]
    fn test_invert_swaps_insert_and_delete() {
        let mut attrs = Attributes::new();
        attrs.insert("id".into(), "1".into());
        let op = DocOp::new(vec![
            Component::Characters("a".into()),
            Component::DeleteElementStart {
                tag: "p".into(),
                attributes: attrs.clone(),
            },
            Component::UpdateAttributes(vec![AttributeChange {
                key: "k".into(),
                old: None,
                new: Some("v".into()),
            }]),
        ]);
        let inv = op.invert();
        assert_eq!(inv.components()[0], Component::DeleteCharacters("a".into()));
        assert_eq!(
            inv.components()[1],
            Component::ElementStart {
                tag: "p".into(),
                attributes: attrs
            }
        );
        assert_eq!(
            inv.components()[2],
            Component::UpdateAttributes(vec![AttributeChange {
                key: "k".into(),
                old: Some("v".into()),
                new: None,
            }])
        );
        assert_eq!(inv.invert(), op);
    }

    #[test]
    fn test_split_multibyte() {
        let (head, tail) = Component::Characters("añb".into()).split_at(2);
        assert_eq!(head, Component::Characters("añ".into()));
        assert_eq!(tail, Some(Component::Characters("b".into())));

        let (whole, rest) = Component::ElementEnd.split_at(1);
        assert_eq!(whole, Component::ElementEnd);
        assert!(rest.is_none());
    }

    #[test]
    fn test_component_kind_display() {
        assert_eq!(ComponentKind::AnnotationBoundary.to_string(), "annotation_boundary");
        assert_eq!(
            Component::Retain(1).kind().to_string().parse::<ComponentKind>().unwrap(),
            ComponentKind::Retain
        );
    }

    #[test]
    fn test_serde_roundtrip() {
        let op = DocOpBuilder::new().retain(1).characters("hi").build();
        let json = serde_json::to_string(&op).unwrap();
        let parsed: DocOp = serde_json::from_str(&json).unwrap();
        assert_eq!(op, parsed);
    }
}

use std::fmt;

use super::handle::ObjectRef;

/// Tag of a heap object. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Scalar,
    Pair,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Scalar => write!(f, "scalar"),
            ObjectKind::Pair => write!(f, "pair"),
        }
    }
}

/// Which half of a pair a write targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairField {
    First,
    Second,
}

/// A heap value.
///
/// Pair fields may point at any live object, the pair itself included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Object {
    Scalar(i64),
    Pair { first: ObjectRef, second: ObjectRef },
}

impl Object {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Object::Scalar(_) => ObjectKind::Scalar,
            Object::Pair { .. } => ObjectKind::Pair,
        }
    }

    pub fn as_scalar(&self) -> Option<i64> {
        match self {
            Object::Scalar(value) => Some(*value),
            Object::Pair { .. } => None,
        }
    }

    pub fn as_pair(&self) -> Option<(ObjectRef, ObjectRef)> {
        match self {
            Object::Pair { first, second } => Some((*first, *second)),
            Object::Scalar(_) => None,
        }
    }

    /// Outgoing references, in field order
    pub fn children(&self) -> impl Iterator<Item = ObjectRef> {
        self.as_pair()
            .into_iter()
            .flat_map(|(first, second)| [first, second])
    }
}

#[cfg(test)]
mod tests {
    use super::super::handle::Generation;
    use super::*;

    #[test]
    fn test_scalar_has_no_children() {
        let object = Object::Scalar(7);
        assert_eq!(object.kind(), ObjectKind::Scalar);
        assert_eq!(object.as_scalar(), Some(7));
        assert_eq!(object.children().count(), 0);
    }

    #[test]
    fn test_pair_children_in_field_order() {
        let a = ObjectRef::new(0, Generation(0));
        let b = ObjectRef::new(1, Generation(0));
        let object = Object::Pair {
            first: a,
            second: b,
        };
        assert_eq!(object.kind(), ObjectKind::Pair);
        assert_eq!(object.as_scalar(), None);
        assert_eq!(object.children().collect::<Vec<_>>(), vec![a, b]);
    }
}

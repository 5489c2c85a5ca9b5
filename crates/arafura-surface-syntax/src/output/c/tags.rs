//! Tag-name pre-pass.
//!
//! One walk over the top-level definitions before any lowering. Records
//! which names are composite tags and whether each is typedef'd; emits
//! nothing and never fails, so it is order-independent by construction.

use super::WILDCARD;
use crate::ast::{ClassDef, Module, StmtKind};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Struct,
    Union,
    Enum,
}

impl TagKind {
    pub fn keyword(self) -> &'static str {
        match self {
            TagKind::Struct => "struct",
            TagKind::Union => "union",
            TagKind::Enum => "enum",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TagInfo {
    pub kind: TagKind,
    pub typedefd: bool,
}

/// The set of user-declared composite tag names.
#[derive(Debug, Default)]
pub struct TagSet {
    map: HashMap<String, TagInfo>,
}

impl TagSet {
    pub fn collect(module: &Module) -> Self {
        let mut map = HashMap::new();
        for stmt in &module.body {
            if let StmtKind::Class(class) = &stmt.kind {
                // Anonymous aggregates have no tag to record
                if class.name == WILDCARD {
                    continue;
                }
                map.insert(
                    class.name.clone(),
                    TagInfo {
                        kind: base_kind(class),
                        typedefd: class.decorators.iter().any(|d| d.name == "Typedef"),
                    },
                );
            }
        }
        Self { map }
    }

    pub fn get(&self, name: &str) -> Option<TagInfo> {
        self.map.get(name).copied()
    }
}

/// Composite kind from the base list. Lenient here; the declaration
/// emitter validates bases properly.
pub(crate) fn base_kind(class: &ClassDef) -> TagKind {
    match class.bases.as_slice() {
        [b] if b == "Union" => TagKind::Union,
        [b] if b == "Enum" => TagKind::Enum,
        _ => TagKind::Struct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::read_python;

    #[test]
    fn records_typedef_status() {
        let module = read_python(
            "@Typedef(List)\nclass List:\n    head: int\n\nclass Node:\n    data: int",
        )
        .unwrap();
        let tags = TagSet::collect(&module);

        assert!(tags.get("List").unwrap().typedefd);
        assert!(!tags.get("Node").unwrap().typedefd);
    }

    #[test]
    fn records_composite_kind() {
        let module = read_python(
            "class S:\n    a: int\n\nclass U(Union):\n    a: int\n\nclass E(Enum):\n    A = 0",
        )
        .unwrap();
        let tags = TagSet::collect(&module);

        assert_eq!(tags.get("S").unwrap().kind, TagKind::Struct);
        assert_eq!(tags.get("U").unwrap().kind, TagKind::Union);
        assert_eq!(tags.get("E").unwrap().kind, TagKind::Enum);
    }

    #[test]
    fn anonymous_classes_are_not_recorded() {
        let module = read_python("@Var(v)\nclass W:\n    a: int").unwrap();
        let tags = TagSet::collect(&module);
        assert!(tags.get("W").is_none());
    }
}

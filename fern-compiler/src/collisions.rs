//! Detects top-level names introduced more than once in a module.

use serde::{Deserialize, Serialize};

use crate::ast::Block;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collision {
    pub name: String,
    /// Indexes of every block introducing `name`, in order.
    pub indexes: Vec<usize>,
}

/// Declarations count once each. An import introduces its local name plus every
/// exposed name, deduplicated per module.
pub fn collisions(blocks: &[Block]) -> Vec<Collision> {
    let mut seen: Vec<Collision> = Vec::new();
    let mut record = |name: &str, index: usize| {
        match seen.iter_mut().find(|collision| collision.name == name) {
            Some(collision) => collision.indexes.push(index),
            None => seen.push(Collision {
                name: name.to_string(),
                indexes: vec![index],
            }),
        }
    };

    for (index, block) in blocks.iter().enumerate() {
        if let Block::Import(import) = block {
            for module in &import.modules {
                let mut names = vec![module.local_name()];
                for exposed in &module.exposing {
                    if !names.contains(&exposed.as_str()) {
                        names.push(exposed.as_str());
                    }
                }
                for name in names {
                    record(name, index);
                }
            }
        } else if let Some(name) = block.declared_name() {
            record(name, index);
        }
    }

    seen.retain(|collision| collision.indexes.len() > 1);
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Import, ImportModule, ImportNamespace};

    fn import(name: &str, exposing: &[&str]) -> Block {
        Block::Import(Import {
            modules: vec![ImportModule {
                name: name.to_string(),
                alias: None,
                exposing: exposing.iter().map(|name| name.to_string()).collect(),
                namespace: ImportNamespace::Global,
            }],
        })
    }

    #[test]
    fn an_import_exposing_its_own_name_counts_once() {
        let blocks = vec![import("Maybe", &["Maybe"])];
        assert!(collisions(&blocks).is_empty());
    }

    #[test]
    fn two_imports_of_the_same_name_collide() {
        let blocks = vec![import("List", &[]), Block::Comment, import("Maybe", &["List"])];
        let found = collisions(&blocks);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "List");
        assert_eq!(found[0].indexes, vec![0, 2]);
    }
}

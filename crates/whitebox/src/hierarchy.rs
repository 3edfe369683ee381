//! Type-hierarchy walker
//!
//! Produces the ancestor chain of a class: the class itself first, then each
//! successive parent up to the root.

use rustc_hash::FxHashSet;
use whitebox_runtime::{ClassId, ClassInfo, TypeEnv};

/// Self-first sequence of class descriptors ending at the root
#[derive(Debug, Clone)]
pub struct AncestorChain<'env> {
    levels: Vec<&'env ClassInfo>,
}

/// Get the ancestor chain of a class.
///
/// Never fails: an unknown class yields an empty chain, and a dangling parent
/// link ends the chain at the last known level.
pub fn chain_of(env: &dyn TypeEnv, class: ClassId) -> AncestorChain<'_> {
    let mut levels = Vec::new();
    let mut seen = FxHashSet::default();
    let mut current = Some(class);

    while let Some(id) = current {
        if !seen.insert(id) {
            break;
        }
        let Some(info) = env.class(id) else {
            break;
        };
        levels.push(info);
        current = info.parent;
    }

    tracing::trace!(class = %class, depth = levels.len(), "walked ancestor chain");
    AncestorChain { levels }
}

impl<'env> AncestorChain<'env> {
    /// Levels, self first
    pub fn iter(&self) -> impl Iterator<Item = &'env ClassInfo> + '_ {
        self.levels.iter().copied()
    }

    /// The class the chain was built for
    pub fn start(&self) -> Option<&'env ClassInfo> {
        self.levels.first().copied()
    }

    /// The root ancestor
    pub fn root(&self) -> Option<&'env ClassInfo> {
        self.levels.last().copied()
    }

    /// Number of levels
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Check if the chain is empty
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Position of a class in the chain (0 = self)
    pub fn position_of(&self, class: ClassId) -> Option<usize> {
        self.levels.iter().position(|c| c.id == class)
    }

    /// Whether `class` is one of the levels
    pub fn contains(&self, class: ClassId) -> bool {
        self.position_of(class).is_some()
    }

    /// The level for `class`, if it is part of the chain
    pub fn level(&self, class: ClassId) -> Option<&'env ClassInfo> {
        self.position_of(class).map(|idx| self.levels[idx])
    }

    /// The suffix of the chain beginning at `class`; empty when `class` is not a level
    pub fn starting_at(&self, class: ClassId) -> AncestorChain<'env> {
        let levels = match self.position_of(class) {
            Some(idx) => self.levels[idx..].to_vec(),
            None => Vec::new(),
        };
        AncestorChain { levels }
    }

    /// Class names, self first
    pub fn names(&self) -> Vec<&'env str> {
        self.levels.iter().map(|c| c.name.as_str()).collect()
    }
}

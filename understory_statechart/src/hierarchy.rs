// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Static state tree: parent lookup, ancestor walks, and paths.
//!
//! ## Overview
//!
//! The tree is stored as a table from state index to parent id, so it can be checked and
//! tested on its own, independent of any handler tables. Roots have [`StateId::NONE`] as
//! their parent, and the sentinel is its own parent.
//!
//! ```
//! use understory_statechart::hierarchy::StateHierarchy;
//! use understory_statechart::types::StateId;
//!
//! let h = StateHierarchy::from_parents(&[("Root", None), ("A", Some("Root")), ("B", Some("A"))])
//!     .unwrap();
//! let b = h.find("B").unwrap();
//! let names: Vec<&str> = h.ancestors(b).map(|s| h.name(s)).collect();
//! assert_eq!(names, ["B", "A", "Root"]);
//! assert_eq!(h.depth(b), 3);
//! assert_eq!(h.parent_state(h.find("Root").unwrap()), StateId::NONE);
//! ```

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::error::BuildError;
use crate::types::StateId;

/// Immutable parent-of relation over the declared states.
#[derive(Clone, Debug)]
pub struct StateHierarchy {
    names: Vec<String>,
    parents: Vec<StateId>,
    depths: Vec<u32>,
    by_name: BTreeMap<String, StateId>,
}

impl StateHierarchy {
    /// Build a hierarchy from `(name, parent)` pairs in declaration order.
    ///
    /// Parents may be declared after their children. Fails on duplicate names, unknown
    /// parents, and parent cycles.
    pub fn from_parents(entries: &[(&str, Option<&str>)]) -> Result<Self, BuildError> {
        if u32::try_from(entries.len()).map_or(true, |n| n == u32::MAX) {
            return Err(BuildError::TooLarge("states"));
        }

        let mut by_name = BTreeMap::new();
        let mut names = Vec::with_capacity(entries.len());
        for (idx, &(name, _)) in entries.iter().enumerate() {
            if by_name.insert(name.to_string(), StateId::new(idx)).is_some() {
                return Err(BuildError::DuplicateState(name.to_string()));
            }
            names.push(name.to_string());
        }

        // Parenthood is resolved on a second pass so declaration order does not matter.
        let mut parents = Vec::with_capacity(entries.len());
        for &(name, parent) in entries {
            let parent_id = match parent {
                None => StateId::NONE,
                Some(p) => *by_name.get(p).ok_or_else(|| BuildError::UnknownParent {
                    state: name.to_string(),
                    parent: p.to_string(),
                })?,
            };
            parents.push(parent_id);
        }

        // A walk longer than the number of states must revisit one of them.
        let mut depths = Vec::with_capacity(entries.len());
        for (idx, name) in names.iter().enumerate() {
            let mut depth = 0_u32;
            let mut cur = StateId::new(idx);
            while !cur.is_none() {
                depth += 1;
                if depth as usize > parents.len() {
                    return Err(BuildError::ParentCycle(name.clone()));
                }
                cur = parents[cur.index()];
            }
            depths.push(depth);
        }

        Ok(Self {
            names,
            parents,
            depths,
            by_name,
        })
    }

    /// Number of declared states (the sentinel is not counted).
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    /// Whether no state is declared.
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Whether `state` is a declared state of this hierarchy.
    pub fn contains(&self, state: StateId) -> bool {
        state.index() < self.parents.len()
    }

    /// Look up a state by name.
    pub fn find(&self, name: &str) -> Option<StateId> {
        self.by_name.get(name).copied()
    }

    /// Name of a declared state, or `"None"` for the sentinel.
    pub fn name(&self, state: StateId) -> &str {
        if state.is_none() {
            return "None";
        }
        self.check(state);
        &self.names[state.index()]
    }

    /// Parent of `state`; [`StateId::NONE`] for roots and for the sentinel itself.
    ///
    /// Panics if `state` is neither declared nor the sentinel.
    pub fn parent_state(&self, state: StateId) -> StateId {
        if state.is_none() {
            return StateId::NONE;
        }
        self.check(state);
        self.parents[state.index()]
    }

    /// Number of parent steps from `state` to the sentinel (roots are at depth 1).
    pub fn depth(&self, state: StateId) -> usize {
        if state.is_none() {
            return 0;
        }
        self.check(state);
        self.depths[state.index()] as usize
    }

    /// Walk from `state` (inclusive) up to its root. The sentinel is not yielded.
    pub fn ancestors(&self, state: StateId) -> Ancestors<'_> {
        if !state.is_none() {
            self.check(state);
        }
        Ancestors {
            hierarchy: self,
            next: state,
        }
    }

    /// Root→`state` path (inclusive).
    pub fn path(&self, state: StateId) -> Vec<StateId> {
        let mut out: Vec<StateId> = self.ancestors(state).collect();
        out.reverse();
        out
    }

    /// Whether `ancestor` is `state` or one of its ancestors.
    pub fn is_ancestor_of(&self, ancestor: StateId, state: StateId) -> bool {
        self.ancestors(state).any(|s| s == ancestor)
    }

    /// Lowest common ancestor of `a` and `b` (either may be the answer), or
    /// [`StateId::NONE`] when they sit under different roots.
    pub fn common_ancestor(&self, a: StateId, b: StateId) -> StateId {
        let (mut a, mut b) = (a, b);
        let (mut da, mut db) = (self.depth(a), self.depth(b));
        while da > db {
            a = self.parents[a.index()];
            da -= 1;
        }
        while db > da {
            b = self.parents[b.index()];
            db -= 1;
        }
        while a != b {
            a = self.parents[a.index()];
            b = self.parents[b.index()];
        }
        a
    }

    /// States exited and entered when moving the active state from `from` to `to`.
    ///
    /// Exits are ordered inner→outer and entries outer→inner; both stop at the lowest common
    /// ancestor. When `to` is `from` or one of its ancestors the transition is external:
    /// `to` itself is exited and re-entered.
    pub fn transition_path(&self, from: StateId, to: StateId) -> (Vec<StateId>, Vec<StateId>) {
        let old = self.path(from);
        let new = self.path(to);

        // Length of the shared root prefix, i.e. the depth of the LCA.
        let mut lca = 0;
        while lca < old.len() && lca < new.len() && old[lca] == new[lca] {
            lca += 1;
        }
        if lca == new.len() && lca > 0 {
            lca -= 1;
        }

        let exits = old[lca..].iter().rev().copied().collect();
        let entries = new[lca..].to_vec();
        (exits, entries)
    }

    /// All declared states in declaration order.
    pub fn states(&self) -> impl Iterator<Item = StateId> + '_ {
        (0..self.parents.len()).map(StateId::new)
    }

    /// States whose parent is the sentinel.
    pub fn roots(&self) -> impl Iterator<Item = StateId> + '_ {
        self.children(StateId::NONE)
    }

    /// Direct children of `parent` in declaration order.
    pub fn children(&self, parent: StateId) -> impl Iterator<Item = StateId> + '_ {
        self.parents
            .iter()
            .enumerate()
            .filter(move |&(_, &p)| p == parent)
            .map(|(i, _)| StateId::new(i))
    }

    #[inline]
    fn check(&self, state: StateId) {
        assert!(
            self.contains(state),
            "invalid state {state:?}: not declared in this hierarchy"
        );
    }
}

/// Iterator over a state and its ancestors, innermost first.
///
/// Returned by [`StateHierarchy::ancestors`].
#[derive(Clone, Debug)]
pub struct Ancestors<'a> {
    hierarchy: &'a StateHierarchy,
    next: StateId,
}

impl Iterator for Ancestors<'_> {
    type Item = StateId;

    fn next(&mut self) -> Option<StateId> {
        if self.next.is_none() {
            return None;
        }
        let cur = self.next;
        self.next = self.hierarchy.parents[cur.index()];
        Some(cur)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.hierarchy.depth(self.next);
        (n, Some(n))
    }
}

impl ExactSizeIterator for Ancestors<'_> {}

impl core::iter::FusedIterator for Ancestors<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn sample() -> StateHierarchy {
        // Root
        // ├── A
        // │   ├── B
        // │   └── C
        // └── D
        // Other (second root)
        StateHierarchy::from_parents(&[
            ("B", Some("A")),
            ("Root", None),
            ("A", Some("Root")),
            ("C", Some("A")),
            ("D", Some("Root")),
            ("Other", None),
        ])
        .unwrap()
    }

    fn id(h: &StateHierarchy, name: &str) -> StateId {
        h.find(name).unwrap()
    }

    #[test]
    fn parent_walk_reaches_sentinel_in_depth_steps() {
        let h = sample();
        for s in h.states() {
            let mut cur = s;
            let mut steps = 0;
            while !cur.is_none() {
                cur = h.parent_state(cur);
                steps += 1;
            }
            assert_eq!(steps, h.depth(s), "state {}", h.name(s));
        }
        assert_eq!(h.parent_state(StateId::NONE), StateId::NONE);
        assert_eq!(h.depth(StateId::NONE), 0);
    }

    #[test]
    fn ancestors_are_innermost_first() {
        let h = sample();
        let chain: Vec<&str> = h.ancestors(id(&h, "C")).map(|s| h.name(s)).collect();
        assert_eq!(chain, vec!["C", "A", "Root"]);
        assert_eq!(h.ancestors(id(&h, "C")).len(), 3);
        assert_eq!(h.ancestors(StateId::NONE).count(), 0);
    }

    #[test]
    fn path_is_root_first() {
        let h = sample();
        assert_eq!(
            h.path(id(&h, "B")),
            vec![id(&h, "Root"), id(&h, "A"), id(&h, "B")]
        );
        assert_eq!(h.path(id(&h, "Other")), vec![id(&h, "Other")]);
    }

    #[test]
    fn common_ancestor_cases() {
        let h = sample();
        assert_eq!(h.common_ancestor(id(&h, "B"), id(&h, "C")), id(&h, "A"));
        assert_eq!(h.common_ancestor(id(&h, "B"), id(&h, "D")), id(&h, "Root"));
        assert_eq!(h.common_ancestor(id(&h, "B"), id(&h, "A")), id(&h, "A"));
        assert_eq!(h.common_ancestor(id(&h, "B"), id(&h, "B")), id(&h, "B"));
        assert_eq!(
            h.common_ancestor(id(&h, "B"), id(&h, "Other")),
            StateId::NONE
        );
    }

    #[test]
    fn transition_path_between_siblings() {
        let h = sample();
        let (exits, entries) = h.transition_path(id(&h, "B"), id(&h, "D"));
        assert_eq!(exits, vec![id(&h, "B"), id(&h, "A")]);
        assert_eq!(entries, vec![id(&h, "D")]);
    }

    #[test]
    fn transition_path_into_descendant_keeps_source() {
        let h = sample();
        let (exits, entries) = h.transition_path(id(&h, "Root"), id(&h, "C"));
        assert!(exits.is_empty());
        assert_eq!(entries, vec![id(&h, "A"), id(&h, "C")]);
    }

    #[test]
    fn transition_path_to_self_or_ancestor_is_external() {
        let h = sample();
        let (exits, entries) = h.transition_path(id(&h, "B"), id(&h, "B"));
        assert_eq!(exits, vec![id(&h, "B")]);
        assert_eq!(entries, vec![id(&h, "B")]);

        let (exits, entries) = h.transition_path(id(&h, "B"), id(&h, "A"));
        assert_eq!(exits, vec![id(&h, "B"), id(&h, "A")]);
        assert_eq!(entries, vec![id(&h, "A")]);
    }

    #[test]
    fn transition_path_across_roots() {
        let h = sample();
        let (exits, entries) = h.transition_path(id(&h, "C"), id(&h, "Other"));
        assert_eq!(exits, vec![id(&h, "C"), id(&h, "A"), id(&h, "Root")]);
        assert_eq!(entries, vec![id(&h, "Other")]);
    }

    #[test]
    fn roots_and_children() {
        let h = sample();
        let roots: Vec<&str> = h.roots().map(|s| h.name(s)).collect();
        assert_eq!(roots, vec!["Root", "Other"]);
        let kids: Vec<&str> = h.children(id(&h, "A")).map(|s| h.name(s)).collect();
        assert_eq!(kids, vec!["B", "C"]);
        assert!(h.is_ancestor_of(id(&h, "Root"), id(&h, "C")));
        assert!(h.is_ancestor_of(id(&h, "C"), id(&h, "C")));
        assert!(!h.is_ancestor_of(id(&h, "D"), id(&h, "C")));
    }

    #[test]
    fn rejects_duplicates_unknown_parents_and_cycles() {
        assert_eq!(
            StateHierarchy::from_parents(&[("A", None), ("A", None)]).unwrap_err(),
            BuildError::DuplicateState("A".into())
        );
        assert_eq!(
            StateHierarchy::from_parents(&[("A", Some("Nope"))]).unwrap_err(),
            BuildError::UnknownParent {
                state: "A".into(),
                parent: "Nope".into()
            }
        );
        assert!(matches!(
            StateHierarchy::from_parents(&[("A", Some("B")), ("B", Some("A"))]).unwrap_err(),
            BuildError::ParentCycle(_)
        ));
        assert!(matches!(
            StateHierarchy::from_parents(&[("A", Some("A"))]).unwrap_err(),
            BuildError::ParentCycle(_)
        ));
    }

    #[test]
    #[should_panic(expected = "invalid state")]
    fn parent_of_undeclared_state_panics() {
        let h = sample();
        let _ = h.parent_state(StateId::new(42));
    }
}

//! Sort engine: pluggable three-way comparator over sibling chains.
//!
//! Sorting re-orders one sibling chain at a time by repeatedly extracting
//! the comparator-greatest remaining node and re-linking it in front of the
//! previously placed one. That is a selection sort, O(n²) over the chain
//! length rather than n log n, which matches the relink-based structure:
//! every placement is a single unlink/link pair, and the flat list stays
//! consistent after each step.

use std::cmp::Ordering;
use std::rc::Rc;

use crate::tree::{NodeId, TreeList};

/// Three-way row comparator. `Ordering::Greater` sorts `a` after `b`.
pub type NodeCompare = dyn Fn(&TreeList, NodeId, NodeId) -> Ordering;

/// The default comparator: lexical comparison of the tree-column text.
pub(crate) fn default_compare(list: &TreeList, a: NodeId, b: NodeId) -> Ordering {
    list.tree_cell_text(a).cmp(list.tree_cell_text(b))
}

impl TreeList {
    /// Replace the comparator used by [`sort`](Self::sort) and auto-sort.
    pub fn set_compare<F>(&mut self, compare: F)
    where
        F: Fn(&TreeList, NodeId, NodeId) -> Ordering + 'static,
    {
        self.compare = Rc::new(compare);
    }

    /// Restore the default tree-column-text comparator.
    pub fn reset_compare(&mut self) {
        self.compare = Rc::new(default_compare);
    }

    /// Whether inserts and moves place nodes at their comparator position.
    pub fn auto_sort(&self) -> bool {
        self.auto_sort
    }

    /// Enable or disable auto-sort. Enabling sorts the whole forest once so
    /// the ordering invariant holds from here on.
    pub fn set_auto_sort(&mut self, auto_sort: bool) {
        if self.auto_sort == auto_sort {
            return;
        }
        self.auto_sort = auto_sort;

        if auto_sort {
            self.sort_recursive(None);
        }
    }

    /// Sort the child chain of `node` (the root chain when `None`). Only
    /// that one level is re-ordered; descendants keep their order.
    pub fn sort(&mut self, node: Option<NodeId>) {
        if let Some(n) = node {
            if !self.arena.contains_key(n) {
                tracing::warn!(target: "trellis::sort", "sort: stale node handle");
                return;
            }
        }

        let thaw = !self.is_frozen();
        if thaw {
            self.freeze();
        }
        self.sort_chain(node);
        if thaw {
            self.thaw();
        }
    }

    /// Sort every sibling chain in the subtree rooted at `node` (the whole
    /// forest when `None`), deepest chains first.
    pub fn sort_recursive(&mut self, node: Option<NodeId>) {
        if let Some(n) = node {
            if !self.arena.contains_key(n) {
                tracing::warn!(target: "trellis::sort", "sort_recursive: stale node handle");
                return;
            }
        }

        let thaw = !self.is_frozen();
        if thaw {
            self.freeze();
        }
        for id in self.collect_post_order(node) {
            self.sort_chain(Some(id));
        }
        if node.is_none() {
            self.sort_chain(None);
        }
        if thaw {
            self.thaw();
        }
    }

    /// Selection sort over one sibling chain: extract the greatest
    /// remaining node and link it in front of the previously placed one.
    fn sort_chain(&mut self, node: Option<NodeId>) {
        let compare = Rc::clone(&self.compare);

        let mut list_start = self.chain_head(node);
        let mut list_end = list_start;

        while let Some(start) = list_start {
            let mut max = start;
            let mut work = self.arena[max].sibling;
            while let Some(w) = work {
                if compare(self, w, max) == Ordering::Greater {
                    max = w;
                }
                work = self.arena[w].sibling;
            }
            if max == start {
                list_start = self.arena[max].sibling;
            }
            if Some(max) != list_end {
                self.unlink(max);
                self.link(max, node, list_end);
                list_end = Some(max);
            }
        }
    }

    /// The sibling a node belongs in front of under the current comparator:
    /// the first child of `parent` that does not sort before `node`.
    /// `None` means append.
    pub(crate) fn sorted_position(&self, node: NodeId, parent: Option<NodeId>) -> Option<NodeId> {
        let mut sibling = self.chain_head(parent);
        while let Some(s) = sibling {
            if (self.compare)(self, node, s) != Ordering::Greater {
                break;
            }
            sibling = self.arena[s].sibling;
        }
        sibling
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeInfo;

    fn names(list: &TreeList) -> Vec<String> {
        list.visible_nodes()
            .map(|n| list.tree_cell_text(n).to_string())
            .collect()
    }

    fn child_names(list: &TreeList, node: Option<NodeId>) -> Vec<String> {
        let mut out = Vec::new();
        let mut cur = list.chain_head(node);
        while let Some(c) = cur {
            out.push(list.tree_cell_text(c).to_string());
            cur = list.next_sibling(c);
        }
        out
    }

    #[test]
    fn test_sort_roots_lexically() {
        let mut list = TreeList::new(1, 0).unwrap();
        for name in ["pear", "apple", "quince", "banana"] {
            list.insert(None, None, NodeInfo::leaf(name)).unwrap();
        }

        list.sort(None);
        assert_eq!(names(&list), vec!["apple", "banana", "pear", "quince"]);
    }

    #[test]
    fn test_sort_single_level_only() {
        let mut list = TreeList::new(1, 0).unwrap();
        let b = list.insert(None, None, NodeInfo::branch("b")).unwrap();
        list.insert(Some(b), None, NodeInfo::leaf("z")).unwrap();
        list.insert(Some(b), None, NodeInfo::leaf("y")).unwrap();
        list.insert(None, None, NodeInfo::leaf("a")).unwrap();

        list.sort(None);
        // Roots re-ordered, b's children untouched.
        assert_eq!(names(&list), vec!["a", "b", "z", "y"]);
    }

    #[test]
    fn test_sort_recursive_orders_every_chain() {
        let mut list = TreeList::new(1, 0).unwrap();
        let b = list.insert(None, None, NodeInfo::branch("b")).unwrap();
        list.insert(Some(b), None, NodeInfo::leaf("z")).unwrap();
        let m = list.insert(Some(b), None, NodeInfo::branch("m")).unwrap();
        list.insert(Some(m), None, NodeInfo::leaf("2")).unwrap();
        list.insert(Some(m), None, NodeInfo::leaf("1")).unwrap();
        list.insert(Some(b), None, NodeInfo::leaf("y")).unwrap();
        list.insert(None, None, NodeInfo::leaf("a")).unwrap();

        list.sort_recursive(None);
        assert_eq!(names(&list), vec!["a", "b", "m", "1", "2", "y", "z"]);
        assert_eq!(child_names(&list, Some(b)), vec!["m", "y", "z"]);
    }

    #[test]
    fn test_sort_subtree_leaves_roots_alone() {
        let mut list = TreeList::new(1, 0).unwrap();
        let z = list.insert(None, None, NodeInfo::branch("z")).unwrap();
        list.insert(Some(z), None, NodeInfo::leaf("c")).unwrap();
        list.insert(Some(z), None, NodeInfo::leaf("a")).unwrap();
        list.insert(None, None, NodeInfo::leaf("m")).unwrap();

        list.sort_recursive(Some(z));
        assert_eq!(names(&list), vec!["z", "a", "c", "m"]);
    }

    #[test]
    fn test_sort_collapsed_chain() {
        // Sorting re-orders detached runs just as well.
        let mut list = TreeList::new(1, 0).unwrap();
        let b = list.insert(None, None, NodeInfo::branch("b")).unwrap();
        list.insert(Some(b), None, NodeInfo::leaf("z")).unwrap();
        list.insert(Some(b), None, NodeInfo::leaf("y")).unwrap();
        list.collapse(b);

        list.sort_recursive(None);
        assert_eq!(child_names(&list, Some(b)), vec!["y", "z"]);

        list.expand(b);
        assert_eq!(names(&list), vec!["b", "y", "z"]);
    }

    #[test]
    fn test_custom_comparator() {
        let mut list = TreeList::new(1, 0).unwrap();
        for name in ["bb", "a", "cccc", "ddd"] {
            list.insert(None, None, NodeInfo::leaf(name)).unwrap();
        }

        // Sort by text length, descending.
        list.set_compare(|list, a, b| {
            list.tree_cell_text(b)
                .len()
                .cmp(&list.tree_cell_text(a).len())
        });
        list.sort(None);
        assert_eq!(names(&list), vec!["cccc", "ddd", "bb", "a"]);

        list.reset_compare();
        list.sort(None);
        assert_eq!(names(&list), vec!["a", "bb", "cccc", "ddd"]);
    }

    #[test]
    fn test_auto_sort_insert_position() {
        let mut list = TreeList::new(1, 0).unwrap();
        list.set_auto_sort(true);
        let root = list.insert(None, None, NodeInfo::branch("fruit")).unwrap();
        list.insert(Some(root), None, NodeInfo::leaf("banana"))
            .unwrap();
        list.insert(Some(root), None, NodeInfo::leaf("apple"))
            .unwrap();
        list.insert(Some(root), None, NodeInfo::leaf("cherry"))
            .unwrap();

        assert_eq!(
            child_names(&list, Some(root)),
            vec!["apple", "banana", "cherry"]
        );
    }

    #[test]
    fn test_auto_sort_ignores_sibling_hint() {
        let mut list = TreeList::new(1, 0).unwrap();
        list.set_auto_sort(true);
        let b = list.insert(None, None, NodeInfo::leaf("b")).unwrap();
        // Hint says "before b", the comparator says after.
        list.insert(None, Some(b), NodeInfo::leaf("c")).unwrap();
        assert_eq!(names(&list), vec!["b", "c"]);
    }

    #[test]
    fn test_enabling_auto_sort_sorts_existing_rows() {
        let mut list = TreeList::new(1, 0).unwrap();
        for name in ["c", "a", "b"] {
            list.insert(None, None, NodeInfo::leaf(name)).unwrap();
        }
        list.set_auto_sort(true);
        assert_eq!(names(&list), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_auto_sort_move_same_parent_is_noop() {
        let mut list = TreeList::new(1, 0).unwrap();
        list.set_auto_sort(true);
        let root = list.insert(None, None, NodeInfo::branch("root")).unwrap();
        let a = list.insert(Some(root), None, NodeInfo::leaf("a")).unwrap();
        let b = list.insert(Some(root), None, NodeInfo::leaf("b")).unwrap();

        list.move_node(b, Some(root), Some(a));
        assert_eq!(child_names(&list, Some(root)), vec!["a", "b"]);
    }

    #[test]
    fn test_auto_sort_move_across_parents_uses_comparator() {
        let mut list = TreeList::new(1, 0).unwrap();
        list.set_auto_sort(true);
        let p = list.insert(None, None, NodeInfo::branch("p")).unwrap();
        let q = list.insert(None, None, NodeInfo::branch("q")).unwrap();
        list.insert(Some(q), None, NodeInfo::leaf("a")).unwrap();
        list.insert(Some(q), None, NodeInfo::leaf("c")).unwrap();
        let b = list.insert(Some(p), None, NodeInfo::leaf("b")).unwrap();

        // Sibling hint is ignored; the comparator slots b between a and c.
        list.move_node(b, Some(q), None);
        assert_eq!(child_names(&list, Some(q)), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_sort_emits_one_refresh() {
        let mut list = TreeList::new(1, 0).unwrap();
        for name in ["c", "a", "b"] {
            list.insert(None, None, NodeInfo::leaf(name)).unwrap();
        }

        let count = std::rc::Rc::new(std::cell::Cell::new(0));
        let count_clone = count.clone();
        list.refresh.connect(move |_| {
            count_clone.set(count_clone.get() + 1);
        });

        list.sort(None);
        assert_eq!(count.get(), 1);
    }
}

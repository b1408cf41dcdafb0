/*!
  Adapted from https://github.com/SimonSapin/rust-forest, MIT licensed.

  A DOM-like tree data structure based on `&Node` references.

  Any non-trivial tree involves reference cycles (e.g. if a node has a first
  child, the parent of the child is that node). To enable this, nodes need to
  live in an arena allocator such as [`typed_arena::Arena`].

  If you need mutability in the node's `data`, make it a cell (`Cell` or
  `RefCell`) or use cells inside of it.
*/

#![allow(dead_code)]

use std::cell::Cell;
use std::fmt;

/// A node inside a tree, allocated in an arena and linked to its parent,
/// siblings and children via interior-mutable references (spec §3's
/// "common node fields", minus the payload, which lives in `T`).
pub struct Node<'a, T: 'a> {
    parent: Cell<Option<&'a Node<'a, T>>>,
    previous_sibling: Cell<Option<&'a Node<'a, T>>>,
    next_sibling: Cell<Option<&'a Node<'a, T>>>,
    first_child: Cell<Option<&'a Node<'a, T>>>,
    last_child: Cell<Option<&'a Node<'a, T>>>,
    pub data: T,
}

impl<'a, T: 'a> fmt::Debug for Node<'a, T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let mut children = vec![];
        let mut child = self.first_child.get();
        while let Some(inner_child) = child {
            children.push(inner_child);
            child = inner_child.next_sibling.get();
        }

        f.debug_struct("Node")
            .field("data", &self.data)
            .field("children", &children)
            .finish()
    }
}

fn same_ref<T>(a: &T, b: &T) -> bool {
    let a: *const T = a;
    let b: *const T = b;
    a == b
}

fn same_ref_opt<'a, T>(a: Option<&'a Node<'a, T>>, b: Option<&'a Node<'a, T>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => same_ref(a, b),
        (None, None) => true,
        _ => false,
    }
}

impl<'a, T> Node<'a, T> {
    /// Create a new node from its associated data. It must be moved into an
    /// arena allocator before it can be linked into a tree.
    pub fn new(data: T) -> Node<'a, T> {
        Node {
            parent: Cell::new(None),
            first_child: Cell::new(None),
            last_child: Cell::new(None),
            previous_sibling: Cell::new(None),
            next_sibling: Cell::new(None),
            data,
        }
    }

    pub fn parent(&self) -> Option<&'a Node<'a, T>> {
        self.parent.get()
    }

    pub fn first_child(&self) -> Option<&'a Node<'a, T>> {
        self.first_child.get()
    }

    pub fn last_child(&self) -> Option<&'a Node<'a, T>> {
        self.last_child.get()
    }

    pub fn previous_sibling(&self) -> Option<&'a Node<'a, T>> {
        self.previous_sibling.get()
    }

    pub fn next_sibling(&self) -> Option<&'a Node<'a, T>> {
        self.next_sibling.get()
    }

    pub fn same_node(&self, other: &Node<'a, T>) -> bool {
        same_ref(self, other)
    }

    /// Whether `self` is an ancestor of, or identical to, `other`. Used to
    /// reject operations that would create a cycle (spec §4.5, rule 3).
    pub fn is_ancestor_of(&'a self, other: &'a Node<'a, T>) -> bool {
        let mut cur = Some(other);
        while let Some(n) = cur {
            if n.same_node(self) {
                return true;
            }
            cur = n.parent();
        }
        false
    }

    pub fn ancestors(&'a self) -> Ancestors<'a, T> {
        Ancestors(Some(self))
    }

    pub fn children(&'a self) -> Children<'a, T> {
        Children(self.first_child.get())
    }

    pub fn reverse_children(&'a self) -> ReverseChildren<'a, T> {
        ReverseChildren(self.last_child.get())
    }

    /// Return an iterator of the start/end edges of this node and its
    /// descendants, in tree order. This realizes the ENTER/EXIT traversal of
    /// spec §4.6 for non-leaf-aware callers; `crate::iter::NodeIter` wraps it
    /// with leaf-skip and `reset` semantics.
    pub fn traverse(&'a self) -> Traverse<'a, T> {
        Traverse {
            root: self,
            next: Some(NodeEdge::Start(self)),
        }
    }

    /// Detach a node from its parent and siblings. Children are unaffected.
    pub fn detach(&self) {
        let parent = self.parent.take();
        let previous_sibling = self.previous_sibling.take();
        let next_sibling = self.next_sibling.take();

        if let Some(next_sibling) = next_sibling {
            next_sibling.previous_sibling.set(previous_sibling);
        } else if let Some(parent) = parent {
            parent.last_child.set(previous_sibling);
        }

        if let Some(previous_sibling) = previous_sibling {
            previous_sibling.next_sibling.set(next_sibling);
        } else if let Some(parent) = parent {
            parent.first_child.set(next_sibling);
        }
    }

    /// Append a new child to this node, after existing children.
    pub fn append(&'a self, new_child: &'a Node<'a, T>) {
        new_child.detach();
        new_child.parent.set(Some(self));
        if let Some(last_child) = self.last_child.take() {
            new_child.previous_sibling.set(Some(last_child));
            debug_assert!(last_child.next_sibling.get().is_none());
            last_child.next_sibling.set(Some(new_child));
        } else {
            debug_assert!(self.first_child.get().is_none());
            self.first_child.set(Some(new_child));
        }
        self.last_child.set(Some(new_child));
    }

    /// Prepend a new child to this node, before existing children.
    pub fn prepend(&'a self, new_child: &'a Node<'a, T>) {
        new_child.detach();
        new_child.parent.set(Some(self));
        if let Some(first_child) = self.first_child.take() {
            debug_assert!(first_child.previous_sibling.get().is_none());
            first_child.previous_sibling.set(Some(new_child));
            new_child.next_sibling.set(Some(first_child));
        } else {
            debug_assert!(self.first_child.get().is_none());
            self.last_child.set(Some(new_child));
        }
        self.first_child.set(Some(new_child));
    }

    /// Insert a new sibling after this node.
    pub fn insert_after(&'a self, new_sibling: &'a Node<'a, T>) {
        new_sibling.detach();
        new_sibling.parent.set(self.parent.get());
        new_sibling.previous_sibling.set(Some(self));
        if let Some(next_sibling) = self.next_sibling.take() {
            debug_assert!(same_ref(next_sibling.previous_sibling.get().unwrap(), self));
            next_sibling.previous_sibling.set(Some(new_sibling));
            new_sibling.next_sibling.set(Some(next_sibling));
        } else if let Some(parent) = self.parent.get() {
            debug_assert!(same_ref(parent.last_child.get().unwrap(), self));
            parent.last_child.set(Some(new_sibling));
        }
        self.next_sibling.set(Some(new_sibling));
    }

    /// Insert a new sibling before this node.
    pub fn insert_before(&'a self, new_sibling: &'a Node<'a, T>) {
        new_sibling.detach();
        new_sibling.parent.set(self.parent.get());
        new_sibling.next_sibling.set(Some(self));
        if let Some(previous_sibling) = self.previous_sibling.take() {
            new_sibling.previous_sibling.set(Some(previous_sibling));
            debug_assert!(same_ref(previous_sibling.next_sibling.get().unwrap(), self));
            previous_sibling.next_sibling.set(Some(new_sibling));
        } else if let Some(parent) = self.parent.get() {
            debug_assert!(same_ref(parent.first_child.get().unwrap(), self));
            parent.first_child.set(Some(new_sibling));
        }
        self.previous_sibling.set(Some(new_sibling));
    }

    /// Walk the subtree rooted at `self` and repair any `parent`,
    /// `previous_sibling`, or `last_child` link that doesn't match what the
    /// `first_child`/`next_sibling` chain implies, calling `sink` once per
    /// repaired node. Returns the number of repairs.
    ///
    /// `append`/`prepend`/`insert_before`/`insert_after`/`detach` always
    /// leave these links consistent, so a tree built only through this
    /// module's safe API always reports zero repairs here.
    pub fn consistency_check(&'a self, sink: &mut dyn FnMut(&'a Node<'a, T>)) -> usize {
        let mut repairs = 0;
        let mut prev: Option<&'a Node<'a, T>> = None;
        let mut child = self.first_child.get();

        while let Some(node) = child {
            let mut repaired = false;
            if !same_ref_opt(node.parent.get(), Some(self)) {
                node.parent.set(Some(self));
                repaired = true;
            }
            if !same_ref_opt(node.previous_sibling.get(), prev) {
                node.previous_sibling.set(prev);
                repaired = true;
            }
            if repaired {
                sink(node);
                repairs += 1;
            }

            repairs += node.consistency_check(sink);

            prev = Some(node);
            child = node.next_sibling.get();
        }

        if !same_ref_opt(self.last_child.get(), prev) {
            self.last_child.set(prev);
            sink(self);
            repairs += 1;
        }

        repairs
    }
}

macro_rules! axis_iterator {
    (#[$attr:meta] $name: ident: $next: ident) => {
        #[$attr]
        #[derive(Debug)]
        pub struct $name<'a, T: 'a>(Option<&'a Node<'a, T>>);

        impl<'a, T> Iterator for $name<'a, T> {
            type Item = &'a Node<'a, T>;

            fn next(&mut self) -> Option<&'a Node<'a, T>> {
                match self.0.take() {
                    Some(node) => {
                        self.0 = node.$next.get();
                        Some(node)
                    }
                    None => None,
                }
            }
        }
    };
}

axis_iterator! {
    #[doc = "An iterator of references to the ancestors a given node."]
    Ancestors: parent
}

axis_iterator! {
    #[doc = "An iterator of references to the children of a given node."]
    Children: next_sibling
}

axis_iterator! {
    #[doc = "An iterator of references to the children of a given node, in reverse order."]
    ReverseChildren: previous_sibling
}

#[derive(Debug, Clone)]
pub enum NodeEdge<T> {
    Start(T),
    End(T),
}

/// An iterator of the start and end edges of a node and its descendants, in
/// tree order.
#[derive(Debug)]
pub struct Traverse<'a, T: 'a> {
    root: &'a Node<'a, T>,
    next: Option<NodeEdge<&'a Node<'a, T>>>,
}

impl<'a, T> Iterator for Traverse<'a, T> {
    type Item = NodeEdge<&'a Node<'a, T>>;

    fn next(&mut self) -> Option<NodeEdge<&'a Node<'a, T>>> {
        match self.next.take() {
            Some(item) => {
                self.next = match item {
                    NodeEdge::Start(node) => match node.first_child.get() {
                        Some(child) => Some(NodeEdge::Start(child)),
                        None => Some(NodeEdge::End(node)),
                    },
                    NodeEdge::End(node) => {
                        if node.same_node(self.root) {
                            None
                        } else {
                            match node.next_sibling.get() {
                                Some(sibling) => Some(NodeEdge::Start(sibling)),
                                None => node.parent.get().map(NodeEdge::End),
                            }
                        }
                    }
                };
                Some(item)
            }
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell as StdCell;
    use typed_arena::Arena;

    #[test]
    fn append_prepend_and_detach() {
        let arena = Arena::new();
        let mut new = || arena.alloc(Node::new(StdCell::new(0)));

        let root = new();
        let a = new();
        let b = new();
        root.append(a);
        root.append(b);
        assert!(root.first_child().unwrap().same_node(a));
        assert!(root.last_child().unwrap().same_node(b));

        let c = new();
        root.prepend(c);
        assert!(root.first_child().unwrap().same_node(c));

        b.detach();
        assert!(root.last_child().unwrap().same_node(a));
    }

    #[test]
    fn traverse_yields_start_and_end_in_order() {
        let arena = Arena::new();
        let mut new = || arena.alloc(Node::new(StdCell::new(0)));

        let root = new();
        let a = new();
        let b = new();
        root.append(a);
        root.append(b);

        let events: Vec<bool> = root
            .traverse()
            .map(|e| matches!(e, NodeEdge::Start(_)))
            .collect();
        assert_eq!(events, vec![true, true, false, true, false, false]);
    }

    #[test]
    fn consistency_check_is_zero_on_a_tree_built_through_the_safe_api() {
        let arena = Arena::new();
        let mut new = || arena.alloc(Node::new(StdCell::new(0)));

        let root = new();
        let a = new();
        let b = new();
        root.append(a);
        root.append(b);

        let mut repaired = vec![];
        assert_eq!(root.consistency_check(&mut |_| repaired.push(())), 0);
        assert!(repaired.is_empty());
    }

    #[test]
    fn consistency_check_repairs_a_corrupted_previous_sibling_link() {
        let arena = Arena::new();
        let mut new = || arena.alloc(Node::new(StdCell::new(0)));

        let root = new();
        let a = new();
        let b = new();
        root.append(a);
        root.append(b);

        // Corrupt b's previous_sibling link directly; only possible from
        // within this module, since the field is private.
        b.previous_sibling.set(None);

        let mut repaired = 0;
        let count = root.consistency_check(&mut |_| repaired += 1);
        assert_eq!(count, 1);
        assert_eq!(repaired, 1);
        assert!(b.previous_sibling().unwrap().same_node(a));

        assert_eq!(root.consistency_check(&mut |_| ()), 0);
    }

    #[test]
    fn consistency_check_repairs_a_corrupted_last_child_link() {
        let arena = Arena::new();
        let mut new = || arena.alloc(Node::new(StdCell::new(0)));

        let root = new();
        let a = new();
        let b = new();
        root.append(a);
        root.append(b);

        root.last_child.set(Some(a));

        let count = root.consistency_check(&mut |_| ());
        assert_eq!(count, 1);
        assert!(root.last_child().unwrap().same_node(b));
    }

    #[test]
    fn is_ancestor_of_detects_self_and_descendants() {
        let arena = Arena::new();
        let mut new = || arena.alloc(Node::new(StdCell::new(0)));

        let root = new();
        let child = new();
        root.append(child);

        assert!(root.is_ancestor_of(child));
        assert!(root.is_ancestor_of(root));
        assert!(!child.is_ancestor_of(root));
    }
}

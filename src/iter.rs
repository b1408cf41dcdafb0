//! Depth-first ENTER/EXIT/DONE traversal over the AST (spec §4.6).
//!
//! Grounded on `cssg_iter_next`/`cssg_iter_reset`/`cssg_consolidate_text_nodes`
//! (`original_source/src/iterator.c`): a node is entered, then either
//! descended into (first child), exited immediately (leaf kinds never emit
//! EXIT), or followed to its next sibling, bubbling up through parents when
//! siblings are exhausted. The root's EXIT is never emitted; traversal ends
//! with `Done` once the root itself would be left.

use crate::nodes::AstNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Enter,
    Exit,
    Done,
}

pub struct NodeIter<'a> {
    root: &'a AstNode<'a>,
    next: Option<(EventType, &'a AstNode<'a>)>,
}

impl<'a> NodeIter<'a> {
    pub fn new(root: &'a AstNode<'a>) -> Self {
        NodeIter {
            root,
            next: Some((EventType::Enter, root)),
        }
    }

    /// Reposition the iterator so the next call to `next()` yields
    /// `(event_type, current)`. `current` must be `root` or a descendant.
    pub fn reset(&mut self, current: &'a AstNode<'a>, event_type: EventType) {
        self.next = Some((event_type, current));
    }

    pub fn root(&self) -> &'a AstNode<'a> {
        self.root
    }

    fn is_leaf(node: &'a AstNode<'a>) -> bool {
        node.data.borrow().value.is_leaf_for_iteration()
    }
}

impl<'a> Iterator for NodeIter<'a> {
    type Item = (EventType, &'a AstNode<'a>);

    fn next(&mut self) -> Option<(EventType, &'a AstNode<'a>)> {
        let (ev_type, node) = self.next?;

        self.next = if ev_type == EventType::Enter && !Self::is_leaf(node) {
            match node.first_child() {
                Some(child) => Some((EventType::Enter, child)),
                None => Some((EventType::Exit, node)),
            }
        } else if node.same_node(self.root) {
            None
        } else if let Some(sibling) = node.next_sibling() {
            Some((EventType::Enter, sibling))
        } else {
            node.parent().map(|parent| (EventType::Exit, parent))
        };

        Some((ev_type, node))
    }
}

/// Merge runs of adjacent `Text` siblings into a single node, as the inline
/// parser can leave consecutive text nodes behind (e.g. after entity
/// decoding splits a run across calls).
pub fn consolidate_text_nodes<'a>(root: &'a AstNode<'a>) {
    use crate::nodes::NodeValue;

    let mut iter = NodeIter::new(root);
    while let Some((ev_type, node)) = iter.next() {
        if ev_type != EventType::Enter {
            continue;
        }
        let is_text = matches!(node.data.borrow().value, NodeValue::Text(_));
        if !is_text {
            continue;
        }
        loop {
            let next = node.next_sibling();
            let next_is_text = next
                .map(|n| matches!(n.data.borrow().value, NodeValue::Text(_)))
                .unwrap_or(false);
            if !next_is_text {
                break;
            }
            let next = next.unwrap();
            let appended = match next.data.borrow().value {
                NodeValue::Text(ref t) => t.clone(),
                _ => unreachable!(),
            };
            if let NodeValue::Text(ref mut t) = node.data.borrow_mut().value {
                t.extend_from_slice(&appended);
            }
            node.data.borrow_mut().end_line = next.data.borrow().end_line;
            node.data.borrow_mut().end_column = next.data.borrow().end_column;
            next.detach();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{make_block, NodeValue};
    use std::cell::RefCell;
    use typed_arena::Arena;

    fn block<'a>(arena: &'a Arena<AstNode<'a>>, v: NodeValue) -> &'a AstNode<'a> {
        arena.alloc(AstNode::new(RefCell::new(make_block(v, 1, 1))))
    }

    #[test]
    fn emits_enter_exit_in_tree_order() {
        let arena = Arena::new();
        let root = block(&arena, NodeValue::Document);
        let para = block(&arena, NodeValue::Paragraph);
        let text = block(&arena, NodeValue::Text(b"hi".to_vec()));
        root.append(para);
        para.append(text);

        let events: Vec<(EventType, bool)> = NodeIter::new(root)
            .map(|(ev, n)| (ev, matches!(n.data.borrow().value, NodeValue::Text(_))))
            .collect();

        assert_eq!(
            events,
            vec![
                (EventType::Enter, false),
                (EventType::Enter, false),
                (EventType::Enter, true),
                (EventType::Exit, false),
                (EventType::Exit, false),
            ]
        );
    }

    #[test]
    fn leaf_kinds_never_emit_exit() {
        let arena = Arena::new();
        let root = block(&arena, NodeValue::Document);
        let thematic = block(&arena, NodeValue::ThematicBreak);
        root.append(thematic);

        let exits: Vec<bool> = NodeIter::new(root)
            .filter(|(ev, n)| *ev == EventType::Exit && !n.same_node(root))
            .map(|_| true)
            .collect();
        assert!(exits.is_empty());
    }

    #[test]
    fn consolidate_merges_adjacent_text_runs() {
        let arena = Arena::new();
        let root = block(&arena, NodeValue::Document);
        let para = block(&arena, NodeValue::Paragraph);
        root.append(para);
        para.append(block(&arena, NodeValue::Text(b"foo".to_vec())));
        para.append(block(&arena, NodeValue::Text(b"bar".to_vec())));

        consolidate_text_nodes(root);

        let mut children = para.children();
        let only = children.next().unwrap();
        assert!(children.next().is_none());
        match only.data.borrow().value {
            NodeValue::Text(ref t) => assert_eq!(t, b"foobar"),
            _ => panic!("expected text"),
        }
    }
}

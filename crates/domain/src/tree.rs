use serde::Serialize;
use std::collections::HashMap;

use crate::models::{Comment, CommentId, CommentView};

/// Replies shown under each comment before "show N more replies".
pub const DEFAULT_VISIBLE_REPLIES: usize = 1;

/// Anything that can be threaded by id/parent id.
pub trait Threaded {
    fn comment_id(&self) -> &CommentId;
    fn parent_comment_id(&self) -> Option<&CommentId>;
}

impl Threaded for Comment {
    fn comment_id(&self) -> &CommentId {
        &self.id
    }

    fn parent_comment_id(&self) -> Option<&CommentId> {
        self.parent_id.as_ref()
    }
}

impl Threaded for CommentView {
    fn comment_id(&self) -> &CommentId {
        &self.id
    }

    fn parent_comment_id(&self) -> Option<&CommentId> {
        self.parent_id.as_ref()
    }
}

#[derive(Debug, Clone)]
pub struct TreeNode<T> {
    pub comment: T,
    pub parent: Option<usize>,
    pub replies: Vec<usize>,
}

/// Arena of comments linked by index.
///
/// Roots and reply lists keep the order of the input sequence. A comment whose
/// parent is absent from the input, is itself, or would close a parent cycle
/// becomes a root.
#[derive(Debug, Clone)]
pub struct CommentTree<T> {
    nodes: Vec<TreeNode<T>>,
    roots: Vec<usize>,
}

impl<T: Threaded> CommentTree<T> {
    pub fn build(flat: Vec<T>) -> Self {
        let mut index: HashMap<CommentId, usize> = HashMap::with_capacity(flat.len());
        for (i, c) in flat.iter().enumerate() {
            index.entry(c.comment_id().clone()).or_insert(i);
        }

        let parents: Vec<Option<usize>> = flat
            .iter()
            .map(|c| c.parent_comment_id().and_then(|p| index.get(p).copied()))
            .collect();

        let mut nodes: Vec<TreeNode<T>> = flat
            .into_iter()
            .map(|comment| TreeNode {
                comment,
                parent: None,
                replies: Vec::new(),
            })
            .collect();
        let mut roots = Vec::new();

        for (i, parent) in parents.into_iter().enumerate() {
            match parent {
                Some(p) if !closes_cycle(&nodes, p, i) => {
                    nodes[i].parent = Some(p);
                    nodes[p].replies.push(i);
                }
                _ => roots.push(i),
            }
        }

        Self { nodes, roots }
    }
}

// Walks the links made so far; they always form a forest, so this terminates.
fn closes_cycle<T>(nodes: &[TreeNode<T>], parent: usize, child: usize) -> bool {
    let mut cursor = Some(parent);
    while let Some(at) = cursor {
        if at == child {
            return true;
        }
        cursor = nodes[at].parent;
    }
    false
}

impl<T> CommentTree<T> {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub fn node(&self, idx: usize) -> Option<&TreeNode<T>> {
        self.nodes.get(idx)
    }

    pub fn replies(&self, idx: usize) -> &[usize] {
        self.nodes
            .get(idx)
            .map(|n| n.replies.as_slice())
            .unwrap_or(&[])
    }

    pub fn depth(&self, idx: usize) -> usize {
        let mut depth = 0;
        let mut cursor = self.nodes.get(idx).and_then(|n| n.parent);
        while let Some(at) = cursor {
            depth += 1;
            cursor = self.nodes[at].parent;
        }
        depth
    }

    /// Replies to show for `idx` and how many stay folded.
    pub fn visible_replies(&self, idx: usize, expanded: bool) -> (&[usize], usize) {
        let all = self.replies(idx);
        if expanded || all.len() <= DEFAULT_VISIBLE_REPLIES {
            return (all, 0);
        }
        (
            &all[..DEFAULT_VISIBLE_REPLIES],
            all.len() - DEFAULT_VISIBLE_REPLIES,
        )
    }

    /// Nested owned form for serialization. Every reply is included, with
    /// `hidden_replies` carrying the collapsed count for the default view.
    pub fn into_threads(self) -> Vec<Thread<T>> {
        // pre-order: parents are visited before their replies
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        while let Some(at) = stack.pop() {
            order.push(at);
            stack.extend(self.nodes[at].replies.iter().rev().copied());
        }

        let hidden: Vec<usize> = (0..self.nodes.len())
            .map(|i| self.visible_replies(i, false).1)
            .collect();
        let reply_lists: Vec<Vec<usize>> =
            self.nodes.iter().map(|n| n.replies.clone()).collect();

        let mut slots: Vec<Option<T>> = self.nodes.into_iter().map(|n| Some(n.comment)).collect();
        let mut built: Vec<Option<Thread<T>>> = (0..slots.len()).map(|_| None).collect();

        for &at in order.iter().rev() {
            let replies = reply_lists[at]
                .iter()
                .filter_map(|&r| built[r].take())
                .collect();
            if let Some(comment) = slots[at].take() {
                built[at] = Some(Thread {
                    comment,
                    replies,
                    hidden_replies: hidden[at],
                });
            }
        }

        self.roots
            .iter()
            .filter_map(|&r| built[r].take())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread<T> {
    #[serde(flatten)]
    pub comment: T,
    pub replies: Vec<Thread<T>>,
    pub hidden_replies: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Stub {
        id: CommentId,
        parent: Option<CommentId>,
    }

    impl Threaded for Stub {
        fn comment_id(&self) -> &CommentId {
            &self.id
        }

        fn parent_comment_id(&self) -> Option<&CommentId> {
            self.parent.as_ref()
        }
    }

    fn stub(id: &str, parent: Option<&str>) -> Stub {
        Stub {
            id: CommentId::new_unchecked(id.to_string()),
            parent: parent.map(|p| CommentId::new_unchecked(p.to_string())),
        }
    }

    fn id_of(tree: &CommentTree<Stub>, idx: usize) -> &str {
        tree.node(idx).unwrap().comment.id.as_str()
    }

    #[test]
    fn unresolved_parent_becomes_root() {
        let tree = CommentTree::build(vec![
            stub("1", None),
            stub("2", Some("1")),
            stub("3", Some("99")),
        ]);

        assert_eq!(tree.roots().len(), 2);
        assert_eq!(id_of(&tree, tree.roots()[0]), "1");
        assert_eq!(id_of(&tree, tree.roots()[1]), "3");

        let replies = tree.replies(tree.roots()[0]);
        assert_eq!(replies.len(), 1);
        assert_eq!(id_of(&tree, replies[0]), "2");
        assert!(tree.replies(tree.roots()[1]).is_empty());
    }

    #[test]
    fn order_follows_input() {
        let tree = CommentTree::build(vec![
            stub("c", Some("p")),
            stub("p", None),
            stub("b", Some("p")),
            stub("a", Some("p")),
        ]);
        let ids: Vec<&str> = tree
            .replies(tree.roots()[0])
            .iter()
            .map(|&i| id_of(&tree, i))
            .collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn self_parent_is_root() {
        let tree = CommentTree::build(vec![stub("1", Some("1"))]);
        assert_eq!(tree.roots(), &[0]);
        assert_eq!(tree.depth(0), 0);
    }

    #[test]
    fn cycle_is_broken_at_closing_link() {
        let tree = CommentTree::build(vec![
            stub("1", Some("3")),
            stub("2", Some("1")),
            stub("3", Some("2")),
        ]);
        // 1 -> 3 and 2 -> 1 attach; 3 -> 2 would close the loop
        assert_eq!(tree.roots().len(), 1);
        assert_eq!(id_of(&tree, tree.roots()[0]), "3");
        assert_eq!(tree.depth(1), 2);

        let threads = tree.into_threads();
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].replies[0].comment.id.as_str(), "1");
        assert_eq!(threads[0].replies[0].replies[0].comment.id.as_str(), "2");
    }

    #[test]
    fn only_first_reply_visible_by_default() {
        let tree = CommentTree::build(vec![
            stub("p", None),
            stub("r1", Some("p")),
            stub("r2", Some("p")),
            stub("r3", Some("p")),
        ]);
        let (shown, hidden) = tree.visible_replies(0, false);
        assert_eq!(shown.len(), 1);
        assert_eq!(hidden, 2);

        let (shown, hidden) = tree.visible_replies(0, true);
        assert_eq!(shown.len(), 3);
        assert_eq!(hidden, 0);
    }

    #[test]
    fn threads_keep_every_reply() {
        let tree = CommentTree::build(vec![
            stub("p", None),
            stub("r1", Some("p")),
            stub("r2", Some("p")),
            stub("rr", Some("r1")),
            stub("q", None),
        ]);
        let threads = tree.into_threads();
        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].replies.len(), 2);
        assert_eq!(threads[0].hidden_replies, 1);
        assert_eq!(threads[0].replies[0].replies[0].comment.id.as_str(), "rr");
        assert_eq!(threads[1].comment.id.as_str(), "q");
    }

    #[test]
    fn empty_input() {
        let tree: CommentTree<Stub> = CommentTree::build(Vec::new());
        assert!(tree.is_empty());
        assert!(tree.into_threads().is_empty());
    }
}

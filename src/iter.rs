use core::ptr::NonNull;

use crate::{Dir, Link, Links, LlrbTree, TreeNode};

/// An in-order iterator over the elements of an [`LlrbTree`].
///
/// Yields elements in ascending key order by walking the parent links; no
/// allocation or tree mutation is involved.
pub struct Iter<'tree, T: TreeNode<Links<T>> + ?Sized> {
    tree: &'tree LlrbTree<T>,
    next: Link<T>,
    remaining: usize,
}

impl<'tree, T: TreeNode<Links<T>> + ?Sized> Iter<'tree, T> {
    pub(crate) fn new(tree: &'tree LlrbTree<T>) -> Self {
        let next = tree.root.map(|root| unsafe { tree.min_in_subtree(root).0 });

        Iter {
            tree,
            next,
            remaining: tree.len(),
        }
    }
}

impl<'tree, T: TreeNode<Links<T>> + ?Sized> Iterator for Iter<'tree, T> {
    type Item = &'tree T;

    fn next(&mut self) -> Option<Self::Item> {
        let cur = self.next?;

        unsafe {
            self.next = successor(self.tree, cur);
            self.remaining -= 1;

            Some(cur.as_ref())
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'tree, T: TreeNode<Links<T>> + ?Sized> ExactSizeIterator for Iter<'tree, T> {}

// Returns the node holding the smallest key greater than `node`'s.
unsafe fn successor<T>(tree: &LlrbTree<T>, node: NonNull<T>) -> Link<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    unsafe {
        // The successor of a node with a right subtree is that subtree's
        // minimum.
        if let Some(right) = T::links(node).as_ref().right() {
            return Some(tree.min_in_subtree(right).0);
        }

        // Otherwise, climb until we step up out of a left subtree.
        let mut cur = node;
        while let Some(parent) = T::links(cur).as_ref().parent() {
            if tree.which_child(parent, Some(cur)) == Dir::Left {
                return Some(parent);
            }

            cur = parent;
        }

        None
    }
}

//! An intrusive left-leaning red-black tree, or LLRB tree.

// Conventions used in comments follow Sedgewick's "Left-Leaning Red-Black
// Trees" (2008):
// - A node is red if the link from its parent is red; the color is stored
//   on the node itself.
// - A 3-node is a black node with a red left child.
// - A 4-node is a black node with two red children.
//
// The fundamental invariants of an LLRB tree in the 2-3 arrangement are:
// 1. No node has a red right child (red links lean left).
// 2. No red node has a red child (4-nodes are split as soon as they form).
// 3. Every path from the root to a missing child passes through the same
//    number of black nodes.
// 4. The root is black.
//
// Insertion and deletion restore these invariants on the way back out of
// the recursion; mid-operation the tree may briefly hold right-leaning or
// doubled red links.
//
// Rotations and the color flip preserve (3) on their own, so the fix-up
// passes only ever need to repair (1), (2) and (4).

use core::{
    cell::UnsafeCell, cmp::Ordering, fmt, marker::PhantomPinned, mem, ops::Not, pin::Pin,
    ptr::NonNull,
};
use std::borrow::Borrow;

use cordyceps::Linked;
use derive_more::{Display, Error};

mod debug;
mod iter;
pub mod map;
#[cfg(any(test, feature = "model"))]
pub mod model;
#[cfg(test)]
mod tests;

pub use iter::Iter;

pub trait TreeNode<L>: Linked<L> {
    type Key: Ord + fmt::Debug;

    fn key(&self) -> &Self::Key;
}

/// An intrusive left-leaning red-black tree, or LLRB tree.
///
/// Implementation based on Robert Sedgewick's paper [Left-Leaning Red-Black
/// Trees], maintaining the 2-3 arrangement: red links only ever lean left,
/// and 4-nodes are split eagerly.
///
/// The tree stores caller-allocated nodes and attaches no meaning to them
/// beyond their key: a node's handle is surrendered on [`insert`] and handed
/// back by [`remove`], [`pop_first`] and [`clear`].
///
/// [Left-Leaning Red-Black Trees]: https://sedgewick.io/wp-content/themes/sedgewick/papers/2008LLRB.pdf
/// [`insert`]: LlrbTree::insert
/// [`remove`]: LlrbTree::remove
/// [`pop_first`]: LlrbTree::pop_first
/// [`clear`]: LlrbTree::clear
pub struct LlrbTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    root: Link<T>,
    len: usize,
}

pub struct Links<T: ?Sized> {
    inner: UnsafeCell<LinksInner<T>>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Dir {
    Left = 0,
    Right = 1,
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

impl Color {
    fn flip(self) -> Color {
        match self {
            Color::Red => Color::Black,
            Color::Black => Color::Red,
        }
    }
}

#[repr(C)]
struct LinksInner<T: ?Sized> {
    parent: Link<T>,
    children: [Link<T>; 2],
    color: Color,
    _unpin: PhantomPinned,
}

type Link<T> = Option<NonNull<T>>;

/// A structural defect found by [`LlrbTree::check_invariants`].
///
/// Any of these indicates a bug in the tree implementation itself; they are
/// never produced by correct use of the public API. Keys are reported
/// pre-rendered in their `Debug` form.
#[derive(Clone, Debug, Display, Error, PartialEq, Eq)]
pub enum IntegrityError {
    #[display("root node is red")]
    RedRoot,

    #[display("node {key} has a red right child")]
    RedRightChild { key: String },

    #[display("red node {key} has a red left child")]
    RedRedViolation { key: String },

    #[display("node {key} is out of order with an ancestor")]
    OrderViolation { key: String },

    #[display("black height is not uniform below {key}: left {left}, right {right}")]
    BlackHeightMismatch {
        key: String,
        left: usize,
        right: usize,
    },

    #[display("node {key} has a stale parent link")]
    BadParentLink { key: String },
}

impl<T> LlrbTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Returns a new empty tree.
    pub const fn new() -> LlrbTree<T> {
        LlrbTree { root: None, len: 0 }
    }

    /// Returns `true` if the tree contains no elements.
    pub const fn is_empty(&self) -> bool {
        let empty = self.len() == 0;

        if cfg!(debug_assertions) {
            // Can't use assert_eq!() in const fn.
            assert!(empty == self.root.is_none());
        }

        empty
    }

    /// Returns the number of elements in the tree.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Verifies the structural invariants of the tree, reporting the first
    /// violation found.
    ///
    /// This walks the entire tree and is intended for tests and debugging,
    /// not for the operational path.
    pub fn check_invariants(&self) -> Result<(), IntegrityError> {
        let Some(root) = self.root else {
            return Ok(());
        };

        unsafe {
            if T::links(root).as_ref().color() == Color::Red {
                return Err(IntegrityError::RedRoot);
            }

            if T::links(root).as_ref().parent().is_some() {
                return Err(IntegrityError::BadParentLink {
                    key: format!("{:?}", root.as_ref().key()),
                });
            }

            self.check_invariants_at(root, None, None, false)?;
        }

        Ok(())
    }

    // Returns the black height of the subtree on success.
    unsafe fn check_invariants_at(
        &self,
        node: NonNull<T>,
        lower: Option<&T::Key>,
        upper: Option<&T::Key>,
        parent_is_red: bool,
    ) -> Result<usize, IntegrityError> {
        unsafe {
            let key = node.as_ref().key();

            if lower.is_some_and(|lo| key <= lo) || upper.is_some_and(|hi| key >= hi) {
                return Err(IntegrityError::OrderViolation {
                    key: format!("{key:?}"),
                });
            }

            let red = T::links(node).as_ref().color() == Color::Red;

            if red && parent_is_red {
                return Err(IntegrityError::RedRedViolation {
                    key: format!("{key:?}"),
                });
            }

            if self.is_red(T::links(node).as_ref().right()) {
                return Err(IntegrityError::RedRightChild {
                    key: format!("{key:?}"),
                });
            }

            // Ensure both children point back at this node.
            for dir in [Dir::Left, Dir::Right] {
                if let Some(child) = T::links(node).as_ref().child(dir) {
                    if T::links(child).as_ref().parent() != Some(node) {
                        return Err(IntegrityError::BadParentLink {
                            key: format!("{:?}", child.as_ref().key()),
                        });
                    }
                }
            }

            let left = match T::links(node).as_ref().left() {
                Some(child) => self.check_invariants_at(child, lower, Some(key), red)?,
                None => 0,
            };

            let right = match T::links(node).as_ref().right() {
                Some(child) => self.check_invariants_at(child, Some(key), upper, red)?,
                None => 0,
            };

            if left != right {
                return Err(IntegrityError::BlackHeightMismatch {
                    key: format!("{key:?}"),
                    left,
                    right,
                });
            }

            Ok(left + usize::from(!red))
        }
    }

    /// Panics if the tree's invariants do not hold.
    #[doc(hidden)]
    #[track_caller]
    pub fn assert_invariants(&self) {
        if let Err(err) = self.check_invariants() {
            panic!("llrb invariant violated: {err}");
        }
    }

    /// Returns a reference to the node corresponding to `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<Pin<&T>>
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        let ptr = self.get_raw(key)?;
        unsafe { Some(Pin::new_unchecked(ptr.as_ref())) }
    }

    /// Returns a mutable reference to the node corresponding to `key`.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<Pin<&mut T>>
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        let mut ptr = self.get_raw(key)?;
        unsafe { Some(Pin::new_unchecked(ptr.as_mut())) }
    }

    /// Returns `true` if the tree contains a node with the given key.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        self.get_raw(key).is_some()
    }

    fn get_raw<Q>(&self, key: &Q) -> Link<T>
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        let mut opt_cur = self.root;

        loop {
            let cur = opt_cur?;

            unsafe {
                match key.cmp(cur.as_ref().key().borrow()) {
                    Ordering::Less => opt_cur = T::links(cur).as_ref().left(),
                    Ordering::Equal => return Some(cur),
                    Ordering::Greater => opt_cur = T::links(cur).as_ref().right(),
                }
            }
        }
    }

    /// Returns the structural parent of the node corresponding to `key`.
    ///
    /// Returns `None` if the key is absent or its node is the tree root.
    /// The parent of a given key is a byproduct of the balancing passes, so
    /// this is a diagnostic operation: it reports the shape the fix-up rules
    /// happened to produce, and that shape changes as the tree changes.
    pub fn parent_of<Q>(&self, key: &Q) -> Option<Pin<&T>>
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        let node = self.get_raw(key)?;
        let parent = unsafe { T::links(node).as_ref().parent() }?;
        unsafe { Some(Pin::new_unchecked(parent.as_ref())) }
    }

    /// Returns the minimum element of the tree.
    pub fn first(&self) -> Option<Pin<&T>> {
        let mut cur = self.root?;

        unsafe {
            while let Some(left) = T::links(cur).as_ref().left() {
                cur = left;
            }

            Some(Pin::new_unchecked(cur.as_ref()))
        }
    }

    /// Returns the maximum element of the tree.
    pub fn last(&self) -> Option<Pin<&T>> {
        let mut cur = self.root?;

        unsafe {
            while let Some(right) = T::links(cur).as_ref().right() {
                cur = right;
            }

            Some(Pin::new_unchecked(cur.as_ref()))
        }
    }

    /// Returns an iterator over the tree's elements in ascending key order.
    ///
    /// The iterator borrows the tree and may be created any number of times;
    /// iteration does not mutate the tree.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }

    /// Returns the number of nodes on the longest path from the root to a
    /// missing child, or `0` if the tree is empty.
    ///
    /// The red-black balance bounds this by `2 * log2(len + 1)`.
    pub fn height(&self) -> usize {
        unsafe { self.height_at(self.root) }
    }

    unsafe fn height_at(&self, node: Link<T>) -> usize {
        let Some(node) = node else { return 0 };

        unsafe {
            let left = self.height_at(T::links(node).as_ref().left());
            let right = self.height_at(T::links(node).as_ref().right());

            1 + left.max(right)
        }
    }

    /// Inserts an item into the tree.
    ///
    /// If the tree already contains a node with the same key, the tree is
    /// left untouched and `item` is handed back as `Some(item)`; a
    /// successful insert returns `None`.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn insert(&mut self, item: T::Handle) -> Option<T::Handle> {
        let ptr = T::into_ptr(item);

        unsafe {
            // A node enters the tree red, with no children.
            let links = T::links(ptr).as_mut();
            links.set_parent(None);
            links.set_left(None);
            links.set_right(None);
            links.set_color(Color::Red);

            let (new_root, rejected) = self.insert_at(self.root, ptr);

            self.root = Some(new_root);
            T::links(new_root).as_mut().set_parent(None);
            T::links(new_root).as_mut().set_color(Color::Black);

            if rejected.is_none() {
                self.len += 1;
            }

            rejected.map(|ptr| T::from_ptr(ptr))
        }
    }

    // Recursively inserts `new` below `link`, returning the rebalanced
    // subtree root and the rejected node if the key was already present.
    //
    // The returned root's parent link is stale; the caller reattaches it.
    unsafe fn insert_at(
        &mut self,
        link: Link<T>,
        new: NonNull<T>,
    ) -> (NonNull<T>, Option<NonNull<T>>) {
        let Some(node) = link else {
            // Bottom of the tree; the caller links the new leaf in place.
            return (new, None);
        };

        unsafe {
            let ordering = new.as_ref().key().cmp(node.as_ref().key());

            let rejected = match ordering {
                Ordering::Less => {
                    let left = T::links(node).as_ref().left();
                    let (child, rejected) = self.insert_at(left, new);
                    self.attach(node, Dir::Left, Some(child));
                    rejected
                }

                Ordering::Greater => {
                    let right = T::links(node).as_ref().right();
                    let (child, rejected) = self.insert_at(right, new);
                    self.attach(node, Dir::Right, Some(child));
                    rejected
                }

                // Duplicate key: the tree is unchanged and the new node
                // goes back to the caller.
                Ordering::Equal => Some(new),
            };

            (self.fix_inserted(node), rejected)
        }
    }

    // Restores the left-leaning invariants at `node` after an insertion
    // into one of its subtrees.
    unsafe fn fix_inserted(&mut self, mut node: NonNull<T>) -> NonNull<T> {
        unsafe {
            // A red right child below a non-red left child leans the wrong
            // way; rotate it over to the left.
            if self.is_red(T::links(node).as_ref().right())
                && !self.is_red(T::links(node).as_ref().left())
            {
                node = self.rotate_left(node);
            }

            // Two reds in a row down the left spine become the left and
            // right children of the middle key.
            let left = T::links(node).as_ref().left();
            if self.is_red(left) && self.is_red(left.and_then(|l| T::links(l).as_ref().left())) {
                node = self.rotate_right(node);
            }

            // Split 4-nodes, pushing the red link up one level.
            if self.is_red(T::links(node).as_ref().left())
                && self.is_red(T::links(node).as_ref().right())
            {
                self.color_flip(node);
            }

            node
        }
    }

    /// Removes the node with the given key from the tree, returning its
    /// handle.
    ///
    /// Returns `None` if the key is not present. The search path may still
    /// be locally restructured in that case; the tree's contents and
    /// invariants are unaffected.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<T::Handle>
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        let root = self.root?;

        let detached = unsafe {
            let (new_root, detached) = self.remove_at(root, key);

            self.root = new_root;
            if let Some(root) = new_root {
                T::links(root).as_mut().set_parent(None);
                T::links(root).as_mut().set_color(Color::Black);
            }

            detached
        };

        detached.map(|node| {
            self.len -= 1;
            unsafe { T::from_ptr(node) }
        })
    }

    // Recursively removes `key` from the subtree rooted at `node`.
    //
    // Red links are pushed down ahead of the descent so that the removal
    // always lands on a red link, then `fix_up` repairs leftover
    // right-leaning and doubled reds on the way back out.
    //
    // Returns the rebalanced subtree root (stale parent link; the caller
    // reattaches it) and the detached node, if the key was found.
    unsafe fn remove_at<Q>(
        &mut self,
        mut node: NonNull<T>,
        key: &Q,
    ) -> (Link<T>, Option<NonNull<T>>)
    where
        T::Key: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        let mut detached = None;

        unsafe {
            if key.cmp(node.as_ref().key().borrow()) == Ordering::Less {
                if let Some(left) = T::links(node).as_ref().left() {
                    // Descending into a subtree whose top two levels are
                    // black would strand the search below a 2-node; borrow
                    // a red link first.
                    if !self.is_red(Some(left)) && !self.is_red(T::links(left).as_ref().left()) {
                        node = self.move_red_left(node);
                    }

                    let left = T::links(node)
                        .as_ref()
                        .left()
                        .expect("move_red_left keeps a left child");
                    let (new_left, d) = self.remove_at(left, key);
                    self.attach(node, Dir::Left, new_left);
                    detached = d;
                }
                // No left subtree: the key is not in the tree.
            } else {
                if self.is_red(T::links(node).as_ref().left()) {
                    node = self.rotate_right(node);
                }

                if key == node.as_ref().key().borrow()
                    && T::links(node).as_ref().right().is_none()
                {
                    // Matched a node at the bottom of the tree. The
                    // left-leaning arrangement guarantees it has no left
                    // child either, so it unlinks cleanly.
                    debug_assert!(T::links(node).as_ref().left().is_none());
                    return (None, Some(node));
                }

                if let Some(right) = T::links(node).as_ref().right() {
                    if !self.is_red(Some(right)) && !self.is_red(T::links(right).as_ref().left()) {
                        node = self.move_red_right(node);
                    }

                    let right = T::links(node)
                        .as_ref()
                        .right()
                        .expect("move_red_right keeps a right child");

                    if key == node.as_ref().key().borrow() {
                        // Matched an internal node. It cannot be unlinked
                        // where it stands, so the minimum of its right
                        // subtree is detached and spliced into its place,
                        // taking over its color and both subtrees.
                        let (new_right, successor) = self.remove_min_at(right);

                        let left = T::links(node).as_ref().left();
                        let color = T::links(node).as_ref().color();

                        self.attach(successor, Dir::Left, left);
                        self.attach(successor, Dir::Right, new_right);
                        T::links(successor).as_mut().set_color(color);

                        detached = Some(node);
                        node = successor;
                    } else {
                        let (new_right, d) = self.remove_at(right, key);
                        self.attach(node, Dir::Right, new_right);
                        detached = d;
                    }
                }
                // No right subtree and no match: the key is not in the tree.
            }

            (Some(self.fix_up(node)), detached)
        }
    }

    /// Removes the minimum node from the tree, returning its handle.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn pop_first(&mut self) -> Option<T::Handle> {
        let root = self.root?;

        let min = unsafe {
            let (new_root, min) = self.remove_min_at(root);

            self.root = new_root;
            if let Some(root) = new_root {
                T::links(root).as_mut().set_parent(None);
                T::links(root).as_mut().set_color(Color::Black);
            }

            min
        };

        self.len -= 1;
        Some(unsafe { T::from_ptr(min) })
    }

    // Detaches the bottom node of the left spine while keeping the subtree
    // balanced, maintaining the invariant that the current node or its left
    // child is red.
    //
    // Returns the rebalanced subtree root (stale parent link) and the
    // detached minimum.
    unsafe fn remove_min_at(&mut self, mut node: NonNull<T>) -> (Link<T>, NonNull<T>) {
        unsafe {
            if T::links(node).as_ref().left().is_none() {
                // The left-leaning arrangement guarantees this node has no
                // right child.
                debug_assert!(T::links(node).as_ref().right().is_none());
                return (None, node);
            }

            {
                let left = T::links(node).as_ref().left().unwrap();
                if !self.is_red(Some(left)) && !self.is_red(T::links(left).as_ref().left()) {
                    node = self.move_red_left(node);
                }
            }

            let left = T::links(node)
                .as_ref()
                .left()
                .expect("move_red_left keeps a left child");
            let (new_left, min) = self.remove_min_at(left);
            self.attach(node, Dir::Left, new_left);

            (Some(self.fix_up(node)), min)
        }
    }

    /// Clears the tree, removing all elements.
    ///
    /// Every node's handle is reconstituted and dropped. Clearing an empty
    /// tree is a no-op.
    pub fn clear(&mut self) {
        let mut opt_cur = self.root;

        while let Some(cur) = opt_cur {
            unsafe {
                // Descend to the minimum node.
                let (cur, parent) = self.min_in_subtree(cur);
                let parent = parent.or_else(|| T::links(cur).as_ref().parent());

                let right = T::links(cur).as_ref().right();

                // Elevate the node's right child (which may be None).
                self.replace_child_or_set_root(parent, cur, right);
                self.maybe_set_parent(right, parent);

                // Drop the node.
                drop(T::from_ptr(cur));
                self.len -= 1;

                // If the node had no right child, climb to the parent. If
                // the node had no parent, the tree is empty.
                opt_cur = right.or(parent);
            }
        }

        debug_assert!(self.root.is_none());
        debug_assert_eq!(self.len(), 0);
    }

    // Support methods ========================================================

    // Returns the minimum node in the subtree.
    //
    // If the subtree root is not the minimum, also returns the minimum
    // node's parent.
    #[inline]
    unsafe fn min_in_subtree(&self, root: NonNull<T>) -> (NonNull<T>, Option<NonNull<T>>) {
        let mut parent = None;
        let mut cur = root;

        while let Some(left) = unsafe { T::links(cur).as_ref().left() } {
            parent = Some(cur);
            cur = left;
        }

        (cur, parent)
    }

    unsafe fn maybe_set_parent(&mut self, opt_node: Link<T>, parent: Link<T>) {
        let Some(node) = opt_node else {
            return;
        };

        unsafe { T::links(node).as_mut().set_parent(parent) };
    }

    // Links `child` as the `dir` child of `parent`, fixing the child's
    // parent pointer.
    #[inline]
    unsafe fn attach(&mut self, parent: NonNull<T>, dir: Dir, child: Link<T>) {
        unsafe {
            T::links(parent).as_mut().set_child(dir, child);
            self.maybe_set_parent(child, Some(parent));
        }
    }

    #[inline]
    unsafe fn replace_child_or_set_root(
        &mut self,
        parent: Link<T>,
        old_child: NonNull<T>,
        new_child: Link<T>,
    ) {
        match parent {
            Some(parent) => unsafe { self.replace_child(parent, old_child, new_child) },
            None => self.root = new_child,
        }
    }

    // Replaces the child pointer of `parent` pointing at `old_child` with
    // `new_child`.
    //
    // `new_child`'s parent pointer is not updated.
    //
    // # Safety
    //
    // The caller must ensure that `old_child` is a child node of `parent`
    // and that `new_child` is not.
    #[inline]
    unsafe fn replace_child(
        &mut self,
        parent: NonNull<T>,
        old_child: NonNull<T>,
        new_child: Link<T>,
    ) {
        unsafe {
            if T::links(parent).as_ref().child(Dir::Left) == Some(old_child) {
                T::links(parent).as_mut().set_child(Dir::Left, new_child);
            } else {
                T::links(parent).as_mut().set_child(Dir::Right, new_child);
            }
        }
    }

    // Rotates the subtree rooted at `node` to the left:
    //
    //    4            6
    //   / \          /
    //  2   6  -->   4
    //              /
    //             2
    //
    // The new subtree root takes over `node`'s color, and `node` becomes
    // red. The returned root's parent link is stale; the caller must
    // reattach it.
    unsafe fn rotate_left(&mut self, node: NonNull<T>) -> NonNull<T> {
        unsafe {
            let up = T::links(node)
                .as_ref()
                .right()
                .expect("rotate_left requires a right child");
            let across = T::links(up).as_ref().left();

            self.attach(node, Dir::Right, across);
            self.attach(up, Dir::Left, Some(node));

            let color = T::links(node).as_ref().color();
            T::links(up).as_mut().set_color(color);
            T::links(node).as_mut().set_color(Color::Red);

            up
        }
    }

    // Rotates the subtree rooted at `node` to the right:
    //
    //    4        2
    //   / \        \
    //  2   6  -->   4
    //                \
    //                 6
    //
    // The new subtree root takes over `node`'s color, and `node` becomes
    // red. The returned root's parent link is stale; the caller must
    // reattach it.
    unsafe fn rotate_right(&mut self, node: NonNull<T>) -> NonNull<T> {
        unsafe {
            let up = T::links(node)
                .as_ref()
                .left()
                .expect("rotate_right requires a left child");
            let across = T::links(up).as_ref().right();

            self.attach(node, Dir::Left, across);
            self.attach(up, Dir::Right, Some(node));

            let color = T::links(node).as_ref().color();
            T::links(up).as_mut().set_color(color);
            T::links(node).as_mut().set_color(Color::Red);

            up
        }
    }

    // Flips the color of `node` and both of its children.
    //
    // A flip may leave `node` holding a color that is invalid relative to
    // its parent; some fix-up is required after this is called.
    unsafe fn color_flip(&mut self, node: NonNull<T>) {
        unsafe {
            T::links(node).as_mut().flip_color();

            for dir in [Dir::Left, Dir::Right] {
                if let Some(child) = T::links(node).as_ref().child(dir) {
                    T::links(child).as_mut().flip_color();
                }
            }
        }
    }

    // Borrows a red link for the left subtree ahead of a leftward descent.
    //
    // Assumes `node` or its left child is red on entry.
    unsafe fn move_red_left(&mut self, mut node: NonNull<T>) -> NonNull<T> {
        unsafe {
            // The flip may turn `node` into a 4-node with both children
            // red.
            self.color_flip(node);

            // If the right child now holds a red left grandchild, a pair of
            // rotations and a second flip make `node` red with two black
            // children, and the borrowed red ends up on the left.
            if let Some(right) = T::links(node).as_ref().right() {
                if self.is_red(T::links(right).as_ref().left()) {
                    let new_right = self.rotate_right(right);
                    self.attach(node, Dir::Right, Some(new_right));

                    node = self.rotate_left(node);
                    self.color_flip(node);
                }
            }

            node
        }
    }

    // Borrows a red link for the right subtree ahead of a rightward
    // descent.
    //
    // Assumes `node` or its right child is red on entry.
    unsafe fn move_red_right(&mut self, mut node: NonNull<T>) -> NonNull<T> {
        unsafe {
            self.color_flip(node);

            // If the flip stacked two reds down the left, a rotation and a
            // second flip carry the spare red over to the right.
            if let Some(left) = T::links(node).as_ref().left() {
                if self.is_red(T::links(left).as_ref().left()) {
                    node = self.rotate_right(node);
                    self.color_flip(node);
                }
            }

            node
        }
    }

    // Repairs right-leaning red links and splits 4-nodes while backing out
    // of a deletion.
    //
    // Searches must never terminate on an unsplit 4-node, or they can miss
    // the intended key.
    unsafe fn fix_up(&mut self, mut node: NonNull<T>) -> NonNull<T> {
        unsafe {
            if self.is_red(T::links(node).as_ref().right()) {
                node = self.rotate_left(node);
            }

            let left = T::links(node).as_ref().left();
            if self.is_red(left) && self.is_red(left.and_then(|l| T::links(l).as_ref().left())) {
                node = self.rotate_right(node);
            }

            if self.is_red(T::links(node).as_ref().left())
                && self.is_red(T::links(node).as_ref().right())
            {
                self.color_flip(node);
            }

            node
        }
    }

    // A missing child counts as black.
    unsafe fn is_red(&self, node: Link<T>) -> bool {
        node.map(|n| unsafe { T::links(n).as_ref().color() } == Color::Red)
            .unwrap_or(false)
    }

    unsafe fn which_child(&self, parent: NonNull<T>, child: Link<T>) -> Dir {
        if unsafe { T::links(parent).as_ref().left() } == child {
            Dir::Left
        } else {
            Dir::Right
        }
    }
}

impl<T> Drop for LlrbTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: ?Sized> Links<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: UnsafeCell::new(LinksInner {
                parent: None,
                children: [None; 2],
                // A node is born red; the balancing passes recolor it.
                color: Color::Red,
                _unpin: PhantomPinned,
            }),
        }
    }

    #[inline]
    fn color(&self) -> Color {
        unsafe { (*self.inner.get()).color }
    }

    #[inline]
    fn parent(&self) -> Link<T> {
        unsafe { (*self.inner.get()).parent }
    }

    #[inline]
    fn child(&self, dir: Dir) -> Link<T> {
        unsafe { (*self.inner.get()).children[dir as usize] }
    }

    #[inline]
    fn left(&self) -> Link<T> {
        self.child(Dir::Left)
    }

    #[inline]
    fn right(&self) -> Link<T> {
        self.child(Dir::Right)
    }

    #[inline]
    fn set_parent(&mut self, parent: Link<T>) -> Link<T> {
        mem::replace(&mut self.inner.get_mut().parent, parent)
    }

    #[inline]
    fn set_child(&mut self, dir: Dir, child: Link<T>) -> Link<T> {
        mem::replace(&mut self.inner.get_mut().children[dir as usize], child)
    }

    #[inline]
    fn set_left(&mut self, left: Link<T>) -> Link<T> {
        self.set_child(Dir::Left, left)
    }

    #[inline]
    fn set_right(&mut self, right: Link<T>) -> Link<T> {
        self.set_child(Dir::Right, right)
    }

    #[inline]
    fn set_color(&mut self, color: Color) {
        self.inner.get_mut().color = color;
    }

    #[inline]
    fn flip_color(&mut self) {
        let inner = self.inner.get_mut();
        inner.color = inner.color.flip();
    }
}

impl<T: ?Sized> fmt::Debug for Links<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Links")
            .field("parent", &self.parent())
            .field("left", &self.left())
            .field("right", &self.right())
            .field("color", &self.color())
            .finish()
    }
}

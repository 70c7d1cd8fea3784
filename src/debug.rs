use core::{fmt, ptr::NonNull};

use crate::{Color, Dir, Links, LlrbTree, TreeNode};

impl<T> LlrbTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Renders the tree as a Graphviz digraph, one vertex per key, with
    /// vertices drawn in their node's color.
    ///
    /// Diagnostic only; handy for eyeballing the shape the balancing
    /// passes produced.
    pub fn dotgraph<W: fmt::Write>(&self, name: &str, w: &mut W) -> fmt::Result {
        writeln!(w, "digraph \"{name}\" {{")?;

        if let Some(root) = self.root {
            unsafe { self.dot_node(root, w)? };
        }

        writeln!(w, "}}")
    }

    unsafe fn dot_node<W: fmt::Write>(&self, node: NonNull<T>, w: &mut W) -> fmt::Result {
        unsafe {
            let key = node.as_ref().key();
            let color = match T::links(node).as_ref().color() {
                Color::Red => "red",
                Color::Black => "black",
            };

            writeln!(w, "  \"{key:?}\" [color={color}, fontcolor={color}];")?;

            for dir in [Dir::Left, Dir::Right] {
                if let Some(child) = T::links(node).as_ref().child(dir) {
                    writeln!(w, "  \"{key:?}\" -> \"{:?}\";", child.as_ref().key())?;
                    self.dot_node(child, w)?;
                }
            }

            Ok(())
        }
    }
}

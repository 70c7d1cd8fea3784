use std::ptr::NonNull;

use cordyceps::Linked;
use cordyceps_llrb::{Links, LlrbTree, TreeNode};

#[derive(Debug)]
#[repr(C)]
struct DemoNode {
    links: Links<DemoNode>,
    key: u32,
}

impl DemoNode {
    fn new(key: u32) -> Box<DemoNode> {
        Box::new(DemoNode {
            links: Links::new(),
            key,
        })
    }
}

unsafe impl Linked<Links<DemoNode>> for DemoNode {
    type Handle = Box<DemoNode>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        NonNull::new(Box::into_raw(r)).unwrap()
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<DemoNode>> {
        // SAFETY: Self is #[repr(C)] and `links` is first field
        ptr.cast()
    }
}

impl TreeNode<Links<DemoNode>> for DemoNode {
    type Key = u32;

    fn key(&self) -> &Self::Key {
        &self.key
    }
}

fn main() {
    let keys = [50, 30, 70, 20, 40, 60, 80, 10];

    let mut tree: LlrbTree<DemoNode> = LlrbTree::new();

    for key in keys {
        tree.insert(DemoNode::new(key));
        tree.assert_invariants();

        match tree.parent_of(&key) {
            Some(parent) => println!("inserted {key} under {}", parent.key),
            None => println!("inserted {key} at the root"),
        }
    }

    println!(
        "in order: {:?}",
        tree.iter().map(|node| node.key).collect::<Vec<_>>()
    );

    let mut dot = String::new();
    tree.dotgraph("demo", &mut dot).unwrap();
    println!("{dot}");

    let removed = tree.remove(&40).unwrap();
    tree.assert_invariants();
    println!("removed {}", removed.key);

    let min = tree.pop_first().unwrap();
    tree.assert_invariants();
    println!("popped minimum {}", min.key);

    println!(
        "in order: {:?}",
        tree.iter().map(|node| node.key).collect::<Vec<_>>()
    );

    tree.clear();
    assert!(tree.is_empty());

    drop(tree);
}

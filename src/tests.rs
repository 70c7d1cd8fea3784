extern crate std;

use std::{ops::Range, prelude::v1::*};

use proptest::prelude::*;

use crate::map::LlrbMap;
use crate::model::{self, TestNode};

use super::*;

fn insert_find_all(keys: &[u32]) {
    let mut tree: LlrbTree<TestNode> = LlrbTree::new();

    for &key in keys {
        tree.insert(TestNode::new(key));
        tree.assert_invariants();
    }

    for key in keys {
        let node = tree.get_raw(key).expect("item not found");
        assert_eq!(unsafe { node.as_ref().key() }, key);
    }
}

#[test]
fn zero_elems_find() {
    insert_find_all(&[]);
}

#[test]
fn single_elem_find() {
    insert_find_all(&[0]);
}

#[test]
fn two_elems_find() {
    insert_find_all(&[0, 1]);
    insert_find_all(&[1, 0]);
}

#[test]
fn three_elems_find() {
    insert_find_all(&[0, 1, 2]);
    insert_find_all(&[0, 2, 1]);
    insert_find_all(&[1, 0, 2]);
    insert_find_all(&[1, 2, 0]);
    insert_find_all(&[2, 0, 1]);
    insert_find_all(&[2, 1, 0]);
}

#[test]
fn four_elems_find() {
    insert_find_all(&[0, 1, 2, 3]);
    insert_find_all(&[0, 1, 3, 2]);
    insert_find_all(&[0, 2, 1, 3]);
    insert_find_all(&[0, 2, 3, 1]);
    insert_find_all(&[0, 3, 1, 2]);
    insert_find_all(&[0, 3, 2, 1]);

    insert_find_all(&[1, 0, 2, 3]);
    insert_find_all(&[1, 0, 3, 2]);
    insert_find_all(&[1, 2, 0, 3]);
    insert_find_all(&[1, 2, 3, 0]);
    insert_find_all(&[1, 3, 0, 2]);
    insert_find_all(&[1, 3, 2, 0]);

    insert_find_all(&[2, 0, 1, 3]);
    insert_find_all(&[2, 0, 3, 1]);
    insert_find_all(&[2, 1, 0, 3]);
    insert_find_all(&[2, 1, 3, 0]);
    insert_find_all(&[2, 3, 0, 1]);
    insert_find_all(&[2, 3, 1, 0]);

    insert_find_all(&[3, 0, 1, 2]);
    insert_find_all(&[3, 0, 2, 1]);
    insert_find_all(&[3, 1, 0, 2]);
    insert_find_all(&[3, 1, 2, 0]);
    insert_find_all(&[3, 2, 0, 1]);
    insert_find_all(&[3, 2, 1, 0]);
}

fn insert_remove_all(keys: &[u32]) {
    let mut tree: LlrbTree<TestNode> = LlrbTree::new();

    for &key in keys {
        tree.insert(TestNode::new(key));
        tree.assert_invariants();
    }

    for key in keys {
        let node = tree.remove(key).expect("item not found");
        assert_eq!(node.key, *key);
        tree.assert_invariants();
    }

    for &key in keys {
        tree.insert(TestNode::new(key));
        tree.assert_invariants();
    }

    for key in keys.iter().rev() {
        let node = tree.remove(key).expect("item not found");
        assert_eq!(node.key, *key);
        tree.assert_invariants();
    }
}

#[test]
fn remove_one() {
    insert_remove_all(&[0]);
}

#[test]
fn remove_two() {
    insert_remove_all(&[0, 1]);
    insert_remove_all(&[1, 0]);
}

#[test]
fn remove_three() {
    insert_remove_all(&[0, 1, 2]);
    insert_remove_all(&[0, 2, 1]);
    insert_remove_all(&[1, 0, 2]);
    insert_remove_all(&[1, 2, 0]);
    insert_remove_all(&[2, 0, 1]);
    insert_remove_all(&[2, 1, 0]);
}

#[test]
fn remove_four() {
    insert_remove_all(&[0, 1, 2, 3]);
    insert_remove_all(&[0, 1, 3, 2]);
    insert_remove_all(&[0, 2, 1, 3]);
    insert_remove_all(&[0, 2, 3, 1]);
    insert_remove_all(&[0, 3, 1, 2]);
    insert_remove_all(&[0, 3, 2, 1]);

    insert_remove_all(&[1, 0, 2, 3]);
    insert_remove_all(&[1, 0, 3, 2]);
    insert_remove_all(&[1, 2, 0, 3]);
    insert_remove_all(&[1, 2, 3, 0]);
    insert_remove_all(&[1, 3, 0, 2]);
    insert_remove_all(&[1, 3, 2, 0]);

    insert_remove_all(&[2, 0, 1, 3]);
    insert_remove_all(&[2, 0, 3, 1]);
    insert_remove_all(&[2, 1, 0, 3]);
    insert_remove_all(&[2, 1, 3, 0]);
    insert_remove_all(&[2, 3, 0, 1]);
    insert_remove_all(&[2, 3, 1, 0]);

    insert_remove_all(&[3, 0, 1, 2]);
    insert_remove_all(&[3, 0, 2, 1]);
    insert_remove_all(&[3, 1, 0, 2]);
    insert_remove_all(&[3, 1, 2, 0]);
    insert_remove_all(&[3, 2, 0, 1]);
    insert_remove_all(&[3, 2, 1, 0]);
}

const MIXED_KEYS: [u32; 8] = [50, 30, 70, 20, 40, 60, 80, 10];

fn mixed_tree() -> LlrbTree<TestNode> {
    let mut tree = LlrbTree::new();

    for key in MIXED_KEYS {
        assert!(tree.insert(TestNode::new(key)).is_none());
        tree.assert_invariants();
    }

    tree
}

fn keys_of(tree: &LlrbTree<TestNode>) -> Vec<u32> {
    tree.iter().map(|node| node.key).collect()
}

#[test]
fn iter_yields_sorted_keys() {
    let tree = mixed_tree();

    assert_eq!(keys_of(&tree), [10, 20, 30, 40, 50, 60, 70, 80]);
}

#[test]
fn iter_is_restartable() {
    let tree = mixed_tree();

    let first = keys_of(&tree);
    let second = keys_of(&tree);

    assert_eq!(first, second);
    assert_eq!(tree.len(), MIXED_KEYS.len());
}

#[test]
fn remove_interior_key() {
    let mut tree = mixed_tree();

    let node = tree.remove(&40).expect("item not found");
    assert_eq!(node.key, 40);
    tree.assert_invariants();

    assert_eq!(tree.len(), 7);
    assert_eq!(keys_of(&tree), [10, 20, 30, 50, 60, 70, 80]);
}

#[test]
fn get_absent_key() {
    let tree = mixed_tree();

    assert!(tree.get(&999).is_none());
    assert!(!tree.contains_key(&999));
    assert_eq!(tree.len(), MIXED_KEYS.len());
}

#[test]
fn remove_absent_key() {
    let mut tree = mixed_tree();

    assert!(tree.remove(&999).is_none());
    tree.assert_invariants();
    assert_eq!(tree.len(), MIXED_KEYS.len());
    assert_eq!(keys_of(&tree), [10, 20, 30, 40, 50, 60, 70, 80]);
}

#[test]
fn duplicate_insert_rejected() {
    let mut tree: LlrbTree<TestNode> = LlrbTree::new();

    assert!(tree.insert(TestNode::new(7)).is_none());
    let rejected = tree.insert(TestNode::new(7)).expect("duplicate accepted");

    assert_eq!(rejected.key, 7);
    assert_eq!(tree.len(), 1);
    tree.assert_invariants();
}

#[test]
fn parent_links_reflect_structure() {
    let tree = mixed_tree();

    // Final shape, derived by hand:
    //
    //             50
    //          /      \
    //        30        70
    //       /  \      /  \
    //      20   40   60   80
    //     /
    //    10
    let parent = |key: u32| tree.parent_of(&key).map(|node| node.key);

    assert_eq!(parent(30), Some(50));
    assert_eq!(parent(70), Some(50));
    assert_eq!(parent(20), Some(30));
    assert_eq!(parent(40), Some(30));
    assert_eq!(parent(10), Some(20));
    assert_eq!(parent(50), None);
    assert_eq!(parent(999), None);
}

#[test]
fn first_last() {
    let tree = mixed_tree();

    assert_eq!(tree.first().map(|node| node.key), Some(10));
    assert_eq!(tree.last().map(|node| node.key), Some(80));

    let empty: LlrbTree<TestNode> = LlrbTree::new();
    assert!(empty.first().is_none());
    assert!(empty.last().is_none());
}

#[test]
fn pop_first_drains_in_order() {
    let mut tree = mixed_tree();

    let mut drained = Vec::new();
    while let Some(node) = tree.pop_first() {
        drained.push(node.key);
        tree.assert_invariants();
    }

    assert_eq!(drained, [10, 20, 30, 40, 50, 60, 70, 80]);
    assert!(tree.is_empty());
}

#[test]
fn clear_is_idempotent() {
    let mut tree = mixed_tree();

    tree.clear();
    assert!(tree.is_empty());
    assert_eq!(tree.iter().count(), 0);

    tree.clear();
    assert!(tree.is_empty());

    // The tree is usable after clearing.
    tree.insert(TestNode::new(1));
    tree.assert_invariants();
    assert_eq!(tree.len(), 1);
}

#[test]
fn height_stays_logarithmic() {
    let mut tree: LlrbTree<TestNode> = LlrbTree::new();

    // An odd multiplier makes the mapping injective, so the keys are 1000
    // distinct values in no particular order.
    for i in 0..1000u32 {
        let key = i.wrapping_mul(2654435761);
        assert!(tree.insert(TestNode::new(key)).is_none());
    }

    tree.assert_invariants();
    assert_eq!(tree.len(), 1000);

    // Red-black balance bounds the height by 2 * log2(n + 1).
    let log2 = usize::BITS - (tree.len() + 1).leading_zeros();
    assert!(tree.height() <= 2 * log2 as usize);

    for i in 0..1000u32 {
        let key = i.wrapping_mul(2654435761);
        assert!(tree.remove(&key).is_some());
        tree.assert_invariants();
    }

    assert!(tree.is_empty());
}

#[test]
fn check_invariants_reports_red_right_child() {
    let mut tree: LlrbTree<TestNode> = LlrbTree::new();

    for key in [2, 1, 3] {
        tree.insert(TestNode::new(key));
    }
    assert_eq!(tree.check_invariants(), Ok(()));

    // Sabotage the tree by recoloring the root's right child.
    let node = tree.get_raw(&3).expect("item not found");
    unsafe { TestNode::links(node).as_mut().set_color(Color::Red) };

    assert!(matches!(
        tree.check_invariants(),
        Err(IntegrityError::RedRightChild { .. })
    ));
}

#[test]
fn dotgraph_smoke() {
    let tree = mixed_tree();

    let mut out = String::new();
    tree.dotgraph("mixed", &mut out).unwrap();

    assert!(out.starts_with("digraph \"mixed\" {"));
    assert!(out.contains("\"50\" [color=black"));
    assert!(out.contains("\"10\" [color=red"));
    assert!(out.contains("\"50\" -> \"30\";"));
}

#[test]
fn map_basic_ops() {
    let mut map: LlrbMap<u32, &str> = LlrbMap::new();

    assert!(map.insert(50, "fifty").is_none());
    assert!(map.insert(30, "thirty").is_none());
    assert!(map.insert(70, "seventy").is_none());
    assert_eq!(map.len(), 3);

    assert_eq!(map.insert(30, "thirty again"), Some("thirty again"));
    assert_eq!(map.len(), 3);
    assert_eq!(map.get(&30), Some(&"thirty"));

    assert!(map.contains_key(&70));
    assert!(!map.contains_key(&71));

    if let Some(value) = map.get_mut(&70) {
        *value = "seventy!";
    }
    assert_eq!(map.get(&70), Some(&"seventy!"));

    assert_eq!(map.parent_key(&30), Some(&50));
    assert_eq!(map.parent_key(&50), None);

    assert_eq!(map.first_key_value(), Some((&30, &"thirty")));
    assert_eq!(map.last_key_value(), Some((&70, &"seventy!")));

    let entries: Vec<_> = map.iter().map(|(&k, &v)| (k, v)).collect();
    assert_eq!(entries, [(30, "thirty"), (50, "fifty"), (70, "seventy!")]);

    assert_eq!(map.remove(&50), Some("fifty"));
    assert_eq!(map.remove(&50), None);
    assert_eq!(map.pop_first(), Some((30, "thirty")));
    assert_eq!(map.len(), 1);

    map.clear();
    assert!(map.is_empty());
}

#[cfg(miri)]
const FUZZ_RANGE: Range<usize> = 0..10;

#[cfg(not(miri))]
const FUZZ_RANGE: Range<usize> = 0..1000;

proptest::proptest! {
    #![proptest_config(ProptestConfig {
        max_shrink_iters: 65536,
        .. ProptestConfig::default()
    })]

    #[test]
    fn btree_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_btree_equivalence(ops);
    }
}

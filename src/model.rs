//! Model-testing support: drives an [`LlrbTree`] and a [`BTreeSet`] with the
//! same operation sequence and checks that they never disagree.
//!
//! Shared between the proptest suite and the fuzz targets.

use std::{collections::BTreeSet, ptr::NonNull};

use arbitrary::Arbitrary;
use cordyceps::Linked;
use proptest::strategy::{Just, Strategy};

use crate::{Links, LlrbTree, TreeNode};

#[derive(Debug)]
#[repr(C)]
pub struct TestNode {
    pub links: Links<TestNode>,
    pub key: u32,
}

impl TestNode {
    pub(crate) fn new(key: u32) -> Box<TestNode> {
        Box::new(TestNode {
            links: Links::new(),
            key,
        })
    }
}

unsafe impl Linked<Links<TestNode>> for TestNode {
    type Handle = Box<TestNode>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        NonNull::new(Box::into_raw(r)).unwrap()
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<TestNode>> {
        // SAFETY: Self is #[repr(C)] and `links` is first field
        ptr.cast()
    }
}

impl TreeNode<Links<TestNode>> for TestNode {
    type Key = u32;

    fn key(&self) -> &Self::Key {
        &self.key
    }
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum ItemValue {
    Index(usize),
    Random(u32),
}

proptest::prop_compose! {
    fn index_strategy()(
        index in 0usize..1000,
    ) -> ItemValue {
        ItemValue::Index(index)
    }
}

proptest::prop_compose! {
    fn random_strategy()(
        random in 0u32..1000,
    ) -> ItemValue {
        ItemValue::Random(random)
    }
}

fn value_strategy() -> impl Strategy<Value = ItemValue> {
    proptest::prop_oneof![index_strategy(), random_strategy()]
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum Op {
    Insert(ItemValue),
    Get(ItemValue),
    Remove(ItemValue),
    ParentOf(ItemValue),
    First,
    PopFirst,
    Last,
}

impl Op {
    fn finalize(self, sorted: &[u32]) -> FinalOp {
        fn get_value(v: &[u32], i: ItemValue) -> u32 {
            match i {
                ItemValue::Index(idx) => {
                    if v.is_empty() {
                        idx as u32
                    } else {
                        v[idx % v.len().max(1)]
                    }
                }
                ItemValue::Random(v) => v,
            }
        }

        match self {
            Op::Insert(item) => FinalOp::Insert(get_value(sorted, item)),
            Op::Get(item) => FinalOp::Get(get_value(sorted, item)),
            Op::Remove(item) => FinalOp::Remove(get_value(sorted, item)),
            Op::ParentOf(item) => FinalOp::ParentOf(get_value(sorted, item)),
            Op::First => FinalOp::First,
            Op::PopFirst => FinalOp::PopFirst,
            Op::Last => FinalOp::Last,
        }
    }
}

#[derive(Copy, Clone, Debug)]
enum FinalOp {
    Insert(u32),
    Get(u32),
    Remove(u32),
    ParentOf(u32),
    First,
    PopFirst,
    Last,
}

pub fn op_strategy() -> impl Strategy<Value = Op> {
    proptest::prop_oneof![
        value_strategy().prop_map(Op::Insert),
        value_strategy().prop_map(Op::Get),
        value_strategy().prop_map(Op::Remove),
        value_strategy().prop_map(Op::ParentOf),
        Just(Op::First),
        Just(Op::PopFirst),
        Just(Op::Last),
    ]
}

pub fn run_btree_equivalence(ops: Vec<Op>) {
    let mut sorted_values = Vec::with_capacity(ops.len());
    let mut btree = BTreeSet::new();
    let mut llrb: LlrbTree<TestNode> = LlrbTree::new();

    fn insert_sorted(v: &mut Vec<u32>, value: u32) {
        if let Err(idx) = v.binary_search(&value) {
            v.insert(idx, value);
        }
    }

    fn remove_sorted(v: &mut Vec<u32>, value: u32) {
        if let Ok(idx) = v.binary_search(&value) {
            v.remove(idx);
        }
    }

    #[inline]
    #[allow(clippy::boxed_local)]
    fn node_key(node: Box<TestNode>) -> u32 {
        node.key
    }

    let mut final_ops = Vec::with_capacity(ops.len());
    for (op_id, op) in ops.into_iter().enumerate() {
        let final_op = op.finalize(&sorted_values);
        final_ops.push(final_op);

        match final_op {
            FinalOp::Insert(value) => {
                insert_sorted(&mut sorted_values, value);

                let from_btree = if btree.insert(value) {
                    None
                } else {
                    Some(value)
                };
                let from_llrb = llrb.insert(TestNode::new(value)).map(node_key);

                assert_eq!(from_btree, from_llrb, "FinalOp #{op_id}: {op:?}");
            }

            FinalOp::Get(value) => {
                let from_btree = btree.get(&value).copied();
                let from_llrb = llrb.get(&value).map(|node| node.key);

                assert_eq!(from_btree, from_llrb, "FinalOp #{op_id}: {op:?}");
            }

            FinalOp::Remove(value) => {
                remove_sorted(&mut sorted_values, value);

                let from_btree = btree.remove(&value).then_some(value);
                let from_llrb = llrb.remove(&value).map(node_key);

                assert_eq!(from_btree, from_llrb, "FinalOp #{op_id}: {op:?}");
            }

            FinalOp::ParentOf(value) => {
                // The reference set has no notion of shape, so the parent
                // is checked for consistency rather than equality: it must
                // be a different, present key, and an absent key has no
                // parent.
                match llrb.parent_of(&value).map(|node| node.key) {
                    Some(parent) => {
                        assert_ne!(parent, value, "FinalOp #{op_id}: {op:?}");
                        assert!(btree.contains(&value), "FinalOp #{op_id}: {op:?}");
                        assert!(btree.contains(&parent), "FinalOp #{op_id}: {op:?}");
                    }
                    None => {
                        // Root or absent; nothing further to check.
                    }
                }
            }

            FinalOp::First => {
                let from_btree = btree.first().copied();
                let from_llrb = llrb.first().map(|node| node.key);

                assert_eq!(from_btree, from_llrb, "FinalOp #{op_id}: {op:?}");
            }

            FinalOp::PopFirst => {
                let from_btree = btree.pop_first();
                let from_llrb = llrb.pop_first().map(node_key);

                assert_eq!(from_btree, from_llrb, "FinalOp #{op_id}: {op:?}");

                if let Some(value) = from_btree {
                    remove_sorted(&mut sorted_values, value);
                }
            }

            FinalOp::Last => {
                let from_btree = btree.last().copied();
                let from_llrb = llrb.last().map(|node| node.key);

                assert_eq!(from_btree, from_llrb, "FinalOp #{op_id}: {op:?}");
            }
        }

        llrb.assert_invariants();
        assert_eq!(btree.len(), llrb.len());
        assert!(btree.iter().zip(llrb.iter()).all(|(&a, b)| a == b.key));
    }
}

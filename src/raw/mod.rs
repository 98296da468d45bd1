mod arena;
mod handle;
mod node;
mod raw_llrb_tree;

pub(crate) use raw_llrb_tree::{RawLLRBTree, TraversalStack};

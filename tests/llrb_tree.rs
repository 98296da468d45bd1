use llrb_tree::LLRBTree;
use proptest::prelude::*;

/// The number of operations to replay in each proptest case.
const TEST_SIZE: usize = 2_000;

/// Values drawn from a narrow range so that duplicate insertions happen.
fn value_strategy() -> impl Strategy<Value = i64> {
    -500i64..500i64
}

// ─── Operations enum for driving randomized tests ────────────────────────────

#[derive(Debug, Clone)]
enum TreeOp {
    Insert(i64),
    Remove(i64),
    Contains(i64),
    Get(i64),
    First,
    Last,
    PopFirst,
    PopLast,
}

fn tree_op_strategy() -> impl Strategy<Value = TreeOp> {
    prop_oneof![
        6 => value_strategy().prop_map(TreeOp::Insert),
        3 => value_strategy().prop_map(TreeOp::Remove),
        2 => value_strategy().prop_map(TreeOp::Contains),
        2 => value_strategy().prop_map(TreeOp::Get),
        1 => Just(TreeOp::First),
        1 => Just(TreeOp::Last),
        1 => Just(TreeOp::PopFirst),
        1 => Just(TreeOp::PopLast),
    ]
}

/// Sorted-Vec multiset used as the reference model. Duplicates are kept, so
/// this models the tree exactly, unlike `BTreeSet`.
#[derive(Debug, Default)]
struct Model {
    items: Vec<i64>,
}

impl Model {
    fn insert(&mut self, value: i64) {
        let at = self.items.partition_point(|&existing| existing <= value);
        self.items.insert(at, value);
    }

    fn remove(&mut self, value: i64) -> Option<i64> {
        let at = self.items.iter().position(|&existing| existing == value)?;
        Some(self.items.remove(at))
    }

    fn pop_first(&mut self) -> Option<i64> {
        if self.items.is_empty() { None } else { Some(self.items.remove(0)) }
    }
}

// ─── Core CRUD operations ────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    /// Replays a random operation sequence against the sorted-Vec model and
    /// asserts identical results at every step.
    #[test]
    fn tree_ops_match_multiset_model(ops in proptest::collection::vec(tree_op_strategy(), TEST_SIZE)) {
        let mut tree: LLRBTree<i64> = LLRBTree::new();
        let mut model = Model::default();

        for op in &ops {
            match op {
                TreeOp::Insert(v) => {
                    tree.insert(*v);
                    model.insert(*v);
                }
                TreeOp::Remove(v) => {
                    prop_assert_eq!(tree.remove(v), model.remove(*v), "remove({})", v);
                }
                TreeOp::Contains(v) => {
                    prop_assert_eq!(tree.contains(v), model.items.contains(v), "contains({})", v);
                }
                TreeOp::Get(v) => {
                    prop_assert_eq!(tree.get(v), model.items.iter().find(|&&x| x == *v), "get({})", v);
                }
                TreeOp::First => {
                    prop_assert_eq!(tree.first(), model.items.first(), "first()");
                }
                TreeOp::Last => {
                    prop_assert_eq!(tree.last(), model.items.last(), "last()");
                }
                TreeOp::PopFirst => {
                    prop_assert_eq!(tree.pop_first(), model.pop_first(), "pop_first()");
                }
                TreeOp::PopLast => {
                    prop_assert_eq!(tree.pop_last(), model.items.pop(), "pop_last()");
                }
            }
            prop_assert_eq!(tree.len(), model.items.len(), "len mismatch after {:?}", op);
            prop_assert_eq!(tree.is_empty(), model.items.is_empty(), "is_empty mismatch after {:?}", op);
        }

        let items: Vec<i64> = tree.iter().copied().collect();
        prop_assert_eq!(&items, &model.items, "final in-order contents mismatch");
    }

    /// Iteration yields sorted order with duplicates preserved, in every
    /// iterator form.
    #[test]
    fn iteration_yields_sorted_multiset(values in proptest::collection::vec(value_strategy(), TEST_SIZE)) {
        let tree: LLRBTree<i64> = values.iter().copied().collect();

        let mut expected = values.clone();
        expected.sort_unstable();

        let borrowed: Vec<i64> = tree.iter().copied().collect();
        prop_assert_eq!(&borrowed, &expected, "iter() mismatch");

        let via_ref: Vec<i64> = (&tree).into_iter().copied().collect();
        prop_assert_eq!(&via_ref, &expected, "(&tree).into_iter() mismatch");

        let owned: Vec<i64> = tree.clone().into_iter().collect();
        prop_assert_eq!(&owned, &expected, "into_iter() mismatch");

        prop_assert_eq!(tree.iter().len(), tree.len(), "ExactSizeIterator mismatch");
    }

    /// Clones are deep: mutating the original never shows through.
    #[test]
    fn clone_is_independent(values in proptest::collection::vec(value_strategy(), 1..200usize)) {
        let mut tree: LLRBTree<i64> = values.iter().copied().collect();
        let snapshot = tree.clone();
        prop_assert_eq!(&tree, &snapshot);

        tree.insert(1_000);
        tree.pop_first();
        prop_assert_eq!(snapshot.len(), values.len());
        let items: Vec<i64> = snapshot.iter().copied().collect();
        let mut expected = values.clone();
        expected.sort_unstable();
        prop_assert_eq!(&items, &expected);
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[test]
fn new_tree_is_empty() {
    let tree: LLRBTree<i32> = LLRBTree::new();
    assert!(tree.is_empty());
    assert_eq!(tree.len(), 0);
    assert_eq!(tree.first(), None);
    assert_eq!(tree.last(), None);
    assert_eq!(tree.iter().next(), None);
}

#[test]
fn default_matches_new() {
    let tree: LLRBTree<i32> = LLRBTree::default();
    assert!(tree.is_empty());
}

#[test]
fn with_capacity_preallocates() {
    let tree: LLRBTree<i32> = LLRBTree::with_capacity(32);
    assert!(tree.capacity() >= 32);
    assert!(tree.is_empty());
}

#[test]
fn duplicates_accumulate_and_remove_one_at_a_time() {
    let mut tree = LLRBTree::new();
    tree.insert(7);
    tree.insert(7);
    tree.insert(7);
    assert_eq!(tree.len(), 3);

    assert_eq!(tree.remove(&7), Some(7));
    assert_eq!(tree.len(), 2);
    assert!(tree.contains(&7));

    assert_eq!(tree.remove(&7), Some(7));
    assert_eq!(tree.remove(&7), Some(7));
    assert_eq!(tree.remove(&7), None);
    assert!(tree.is_empty());
}

#[test]
fn clear_empties_the_tree() {
    let mut tree = LLRBTree::from([1, 2, 3]);
    tree.clear();
    assert!(tree.is_empty());
    assert_eq!(tree.iter().next(), None);

    // The tree is reusable afterwards.
    tree.insert(9);
    assert_eq!(tree.get(&9), Some(&9));
}

#[test]
fn equality_compares_contents() {
    let a = LLRBTree::from([3, 1, 2]);
    let b = LLRBTree::from([1, 2, 3]);
    let c = LLRBTree::from([1, 2, 3, 3]);
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn debug_renders_in_order() {
    let tree = LLRBTree::from([2, 1, 3]);
    assert_eq!(format!("{tree:?}"), "[1, 2, 3]");
}

#[test]
fn extend_adds_items() {
    let mut tree = LLRBTree::from([5]);
    tree.extend([3, 9]);
    let items: Vec<i32> = tree.iter().copied().collect();
    assert_eq!(items, [3, 5, 9]);
}

#[test]
fn borrowed_key_lookups() {
    let mut tree: LLRBTree<String> = LLRBTree::new();
    tree.insert("apple".to_string());
    tree.insert("pear".to_string());

    // `Borrow<str>` lets `&str` probe a tree of `String`s.
    assert!(tree.contains("apple"));
    assert_eq!(tree.get("pear").map(String::as_str), Some("pear"));
    assert_eq!(tree.remove("apple"), Some("apple".to_string()));
    assert!(!tree.contains("apple"));
}

use core::borrow::Borrow;
use core::cmp::Ordering;
use core::mem;

use smallvec::SmallVec;

use super::arena::Arena;
use super::handle::Handle;
use super::node::{Color, Node};

/// Scratch stack for the in-order traversal engines.
///
/// The inline capacity covers the ancestor path of a balanced tree holding
/// millions of items; degenerate shapes spill to the heap and stay correct.
pub(crate) type TraversalStack = SmallVec<[Handle; 48]>;

/// The core left-leaning red-black tree backing `LLRBTree`.
///
/// Mutating operations rebalance on the unwind of their recursion. The
/// ordered-query operations are pure reads: they touch only items and child
/// links, never colors, and work on any valid binary-search-tree shape.
pub(crate) struct RawLLRBTree<T> {
    /// Arena storing all tree nodes. Every item is exactly one node, so the
    /// arena's live-slot count is the tree's length.
    nodes: Arena<Node<T>>,
    /// Handle to the root node, if the tree is non-empty.
    root: Option<Handle>,
}

impl<T> Clone for RawLLRBTree<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        // Cloning the arena clones slots in place, so every handle in the
        // copied nodes still addresses the same logical node.
        Self {
            nodes: self.nodes.clone(),
            root: self.root,
        }
    }
}

impl<T> RawLLRBTree<T> {
    pub(crate) const fn new() -> Self {
        Self {
            nodes: Arena::new(),
            root: None,
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Arena::with_capacity(capacity),
            root: None,
        }
    }

    pub(crate) const fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    #[inline]
    pub(crate) fn node(&self, handle: Handle) -> &Node<T> {
        self.nodes.get(handle)
    }

    #[inline]
    fn node_mut(&mut self, handle: Handle) -> &mut Node<T> {
        self.nodes.get_mut(handle)
    }

    /// Removes a node from the arena, invalidating its handle. Used by the
    /// owning iterator, which never revisits a handle.
    pub(crate) fn take_node(&mut self, handle: Handle) -> Node<T> {
        self.nodes.take(handle)
    }

    fn is_red(&self, link: Option<Handle>) -> bool {
        link.is_some_and(|handle| self.node(handle).color == Color::Red)
    }

    fn left_of(&self, link: Option<Handle>) -> Option<Handle> {
        link.and_then(|handle| self.node(handle).left)
    }

    // -- Traversal engine -------------------------------------------------
    //
    // An in-order walk is a stack of handles: the top is the next item to
    // yield, and the entries below it are the ancestors still owing a visit.
    // Seeding the stack is where pruning happens; advancing never needs the
    // pivot again because everything reachable from the stack is in range
    // (for `ascend_range`, the caller checks the upper bound on each pop).

    /// Pushes `link` and its left spine.
    pub(crate) fn push_left_spine(&self, mut link: Option<Handle>, stack: &mut TraversalStack) {
        while let Some(handle) = link {
            stack.push(handle);
            link = self.node(handle).left;
        }
    }

    /// Pushes `link` and its right spine.
    fn push_right_spine(&self, mut link: Option<Handle>, stack: &mut TraversalStack) {
        while let Some(handle) = link {
            stack.push(handle);
            link = self.node(handle).right;
        }
    }

    /// Seeds `stack` for a full ascending walk.
    pub(crate) fn seek_first(&self, stack: &mut TraversalStack) {
        self.push_left_spine(self.root, stack);
    }

    /// Pops the next handle of an ascending walk and queues its right
    /// subtree's smallest descendants.
    pub(crate) fn ascend_advance(&self, stack: &mut TraversalStack) -> Option<Handle> {
        let handle = stack.pop()?;
        self.push_left_spine(self.node(handle).right, stack);
        Some(handle)
    }

    /// Pops the next handle of a descending walk.
    pub(crate) fn descend_advance(&self, stack: &mut TraversalStack) -> Option<Handle> {
        let handle = stack.pop()?;
        self.push_right_spine(self.node(handle).left, stack);
        Some(handle)
    }
}

impl<T: Ord> RawLLRBTree<T> {
    // -- Point lookups ----------------------------------------------------

    pub(crate) fn get<Q>(&self, item: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut current = self.root;
        while let Some(handle) = current {
            let node = self.node(handle);
            match node.item.borrow().cmp(item) {
                Ordering::Less => current = node.right,
                Ordering::Greater => current = node.left,
                Ordering::Equal => return Some(&node.item),
            }
        }
        None
    }

    pub(crate) fn min(&self) -> Option<&T> {
        let mut handle = self.root?;
        while let Some(left) = self.node(handle).left {
            handle = left;
        }
        Some(&self.node(handle).item)
    }

    pub(crate) fn max(&self) -> Option<&T> {
        let mut handle = self.root?;
        while let Some(right) = self.node(handle).right {
            handle = right;
        }
        Some(&self.node(handle).item)
    }

    // -- Neighbor finder --------------------------------------------------

    /// The smallest item strictly greater than `pivot`.
    ///
    /// Single root-to-leaf descent: a node above the pivot is the tightest
    /// candidate so far and anything tighter must sit in its left subtree; a
    /// node at or below the pivot rules out itself and its whole left
    /// subtree.
    pub(crate) fn successor<Q>(&self, pivot: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut current = self.root;
        let mut candidate = None;
        while let Some(handle) = current {
            let node = self.node(handle);
            if node.item.borrow().cmp(pivot) == Ordering::Greater {
                candidate = Some(handle);
                current = node.left;
            } else {
                current = node.right;
            }
        }
        candidate.map(|handle| &self.node(handle).item)
    }

    /// The largest item strictly less than `pivot`. Mirror of
    /// [`successor`](Self::successor).
    pub(crate) fn predecessor<Q>(&self, pivot: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut current = self.root;
        let mut candidate = None;
        while let Some(handle) = current {
            let node = self.node(handle);
            if node.item.borrow().cmp(pivot) == Ordering::Less {
                candidate = Some(handle);
                current = node.right;
            } else {
                current = node.left;
            }
        }
        candidate.map(|handle| &self.node(handle).item)
    }

    // -- Pruned traversal seeks -------------------------------------------

    /// Seeds `stack` with the ancestor path of the smallest item `>= pivot`.
    ///
    /// A node below the pivot is skipped together with its entire left
    /// subtree (everything there is below the pivot too); a node at or above
    /// the pivot is queued and the search continues left for something
    /// smaller that still qualifies.
    pub(crate) fn seek_ascend<Q>(&self, pivot: &Q, stack: &mut TraversalStack)
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut current = self.root;
        while let Some(handle) = current {
            let node = self.node(handle);
            if node.item.borrow().cmp(pivot) == Ordering::Less {
                current = node.right;
            } else {
                stack.push(handle);
                current = node.left;
            }
        }
    }

    /// Seeds `stack` with the ancestor path of the largest item `<= pivot`.
    /// Mirror of [`seek_ascend`](Self::seek_ascend).
    pub(crate) fn seek_descend<Q>(&self, pivot: &Q, stack: &mut TraversalStack)
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut current = self.root;
        while let Some(handle) = current {
            let node = self.node(handle);
            if node.item.borrow().cmp(pivot) == Ordering::Greater {
                current = node.left;
            } else {
                stack.push(handle);
                current = node.right;
            }
        }
    }

    // -- Insertion --------------------------------------------------------

    pub(crate) fn insert(&mut self, item: T) {
        let root = match self.root {
            Some(root) => self.insert_at(root, item),
            None => self.nodes.alloc(Node::new(item)),
        };
        self.root = Some(root);
        self.node_mut(root).color = Color::Black;
    }

    fn insert_at(&mut self, handle: Handle, item: T) -> Handle {
        if item < self.node(handle).item {
            let link = match self.node(handle).left {
                Some(left) => self.insert_at(left, item),
                None => self.nodes.alloc(Node::new(item)),
            };
            self.node_mut(handle).left = Some(link);
        } else {
            // Order-equivalent items descend right and accumulate.
            let link = match self.node(handle).right {
                Some(right) => self.insert_at(right, item),
                None => self.nodes.alloc(Node::new(item)),
            };
            self.node_mut(handle).right = Some(link);
        }
        self.fixup(handle)
    }

    // -- Removal ----------------------------------------------------------

    /// Removes and returns one item equivalent to `item`, if any is stored.
    pub(crate) fn remove<Q>(&mut self, item: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        // The descent below assumes an equivalent item exists in whichever
        // subtree it recurses into; establish that up front.
        self.get(item)?;

        let root = self.root.expect("`RawLLRBTree::remove()` - no root after a successful search!");
        if !self.is_red(self.node(root).left) && !self.is_red(self.node(root).right) {
            self.node_mut(root).color = Color::Red;
        }
        let (link, removed) = self.remove_at(root, item);
        self.root = link;
        if let Some(root) = self.root {
            self.node_mut(root).color = Color::Black;
        }
        Some(removed)
    }

    fn remove_at<Q>(&mut self, mut handle: Handle, item: &Q) -> (Option<Handle>, T)
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        if self.node(handle).item.borrow().cmp(item) == Ordering::Greater {
            // Target is in the left subtree.
            if !self.is_red(self.node(handle).left) && !self.is_red(self.left_of(self.node(handle).left)) {
                handle = self.move_red_left(handle);
            }
            let left = self.node(handle).left.expect("`RawLLRBTree::remove_at()` - left subtree vanished!");
            let (link, removed) = self.remove_at(left, item);
            self.node_mut(handle).left = link;
            (Some(self.fixup(handle)), removed)
        } else {
            if self.is_red(self.node(handle).left) {
                handle = self.rotate_right(handle);
            }
            if self.node(handle).item.borrow().cmp(item) == Ordering::Equal && self.node(handle).right.is_none()
            {
                return (None, self.nodes.take(handle).item);
            }
            if !self.is_red(self.node(handle).right) && !self.is_red(self.left_of(self.node(handle).right)) {
                handle = self.move_red_right(handle);
            }
            // The rotations above may have replaced `handle`; re-compare.
            if self.node(handle).item.borrow().cmp(item) == Ordering::Equal {
                // Splice the in-order successor into this node.
                let right = self.node(handle).right.expect("`RawLLRBTree::remove_at()` - match without right subtree!");
                let (link, successor) = self.remove_min_at(right);
                self.node_mut(handle).right = link;
                let removed = mem::replace(&mut self.node_mut(handle).item, successor);
                (Some(self.fixup(handle)), removed)
            } else {
                let right = self.node(handle).right.expect("`RawLLRBTree::remove_at()` - right subtree vanished!");
                let (link, removed) = self.remove_at(right, item);
                self.node_mut(handle).right = link;
                (Some(self.fixup(handle)), removed)
            }
        }
    }

    pub(crate) fn pop_min(&mut self) -> Option<T> {
        let root = self.root?;
        if !self.is_red(self.node(root).left) && !self.is_red(self.node(root).right) {
            self.node_mut(root).color = Color::Red;
        }
        let (link, removed) = self.remove_min_at(root);
        self.root = link;
        if let Some(root) = self.root {
            self.node_mut(root).color = Color::Black;
        }
        Some(removed)
    }

    pub(crate) fn pop_max(&mut self) -> Option<T> {
        let root = self.root?;
        if !self.is_red(self.node(root).left) && !self.is_red(self.node(root).right) {
            self.node_mut(root).color = Color::Red;
        }
        let (link, removed) = self.remove_max_at(root);
        self.root = link;
        if let Some(root) = self.root {
            self.node_mut(root).color = Color::Black;
        }
        Some(removed)
    }

    fn remove_min_at(&mut self, mut handle: Handle) -> (Option<Handle>, T) {
        if self.node(handle).left.is_none() {
            // A left-leaning node without a left child has no right child
            // either; the whole subtree is this node.
            return (None, self.nodes.take(handle).item);
        }
        if !self.is_red(self.node(handle).left) && !self.is_red(self.left_of(self.node(handle).left)) {
            handle = self.move_red_left(handle);
        }
        let left = self.node(handle).left.expect("`RawLLRBTree::remove_min_at()` - left subtree vanished!");
        let (link, removed) = self.remove_min_at(left);
        self.node_mut(handle).left = link;
        (Some(self.fixup(handle)), removed)
    }

    fn remove_max_at(&mut self, mut handle: Handle) -> (Option<Handle>, T) {
        if self.is_red(self.node(handle).left) {
            handle = self.rotate_right(handle);
        }
        if self.node(handle).right.is_none() {
            return (None, self.nodes.take(handle).item);
        }
        if !self.is_red(self.node(handle).right) && !self.is_red(self.left_of(self.node(handle).right)) {
            handle = self.move_red_right(handle);
        }
        let right = self.node(handle).right.expect("`RawLLRBTree::remove_max_at()` - right subtree vanished!");
        let (link, removed) = self.remove_max_at(right);
        self.node_mut(handle).right = link;
        (Some(self.fixup(handle)), removed)
    }

    // -- Balancing primitives ---------------------------------------------

    /// Restores the left-leaning invariants for the subtree rooted at
    /// `handle` on the way back up from an insertion or removal.
    fn fixup(&mut self, mut handle: Handle) -> Handle {
        if self.is_red(self.node(handle).right) && !self.is_red(self.node(handle).left) {
            handle = self.rotate_left(handle);
        }
        if self.is_red(self.node(handle).left) && self.is_red(self.left_of(self.node(handle).left)) {
            handle = self.rotate_right(handle);
        }
        if self.is_red(self.node(handle).left) && self.is_red(self.node(handle).right) {
            self.flip_colors(handle);
        }
        handle
    }

    fn rotate_left(&mut self, handle: Handle) -> Handle {
        let pivot = self.node(handle).right.expect("`RawLLRBTree::rotate_left()` - no right child to lift!");
        let color = self.node(handle).color;
        let inner = self.node(pivot).left;
        {
            let node = self.node_mut(handle);
            node.right = inner;
            node.color = Color::Red;
        }
        {
            let node = self.node_mut(pivot);
            node.left = Some(handle);
            node.color = color;
        }
        pivot
    }

    fn rotate_right(&mut self, handle: Handle) -> Handle {
        let pivot = self.node(handle).left.expect("`RawLLRBTree::rotate_right()` - no left child to lift!");
        let color = self.node(handle).color;
        let inner = self.node(pivot).right;
        {
            let node = self.node_mut(handle);
            node.left = inner;
            node.color = Color::Red;
        }
        {
            let node = self.node_mut(pivot);
            node.right = Some(handle);
            node.color = color;
        }
        pivot
    }

    /// Inverts the colors of `handle` and both of its children. Callers
    /// guarantee both children exist.
    fn flip_colors(&mut self, handle: Handle) {
        let left = self.node(handle).left.expect("`RawLLRBTree::flip_colors()` - missing left child!");
        let right = self.node(handle).right.expect("`RawLLRBTree::flip_colors()` - missing right child!");
        for h in [handle, left, right] {
            let color = self.node(h).color.flipped();
            self.node_mut(h).color = color;
        }
    }

    fn move_red_left(&mut self, mut handle: Handle) -> Handle {
        self.flip_colors(handle);
        if self.is_red(self.left_of(self.node(handle).right)) {
            let right = self.node(handle).right.expect("`RawLLRBTree::move_red_left()` - missing right child!");
            let rotated = self.rotate_right(right);
            self.node_mut(handle).right = Some(rotated);
            handle = self.rotate_left(handle);
            self.flip_colors(handle);
        }
        handle
    }

    fn move_red_right(&mut self, mut handle: Handle) -> Handle {
        self.flip_colors(handle);
        if self.is_red(self.left_of(self.node(handle).left)) {
            handle = self.rotate_right(handle);
            self.flip_colors(handle);
        }
        handle
    }
}

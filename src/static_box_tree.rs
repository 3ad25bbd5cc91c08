use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::borrow::{Borrow, BorrowMut};
use std::cmp::Ordering;
use std::fmt;

use crate::{try_control, BoxLimits, ControlFlow, IndexableNum, QueryVisitor, AABB};

/// Error type for errors that may be returned in attempting to build the tree.
#[derive(Debug, PartialEq)]
pub enum StaticBoxTreeBuildError {
    /// Error for the case when the number of items added does not match the size given at
    /// construction.
    ItemCountError {
        /// The number of items that were added.
        added: usize,
        /// The number of items that were expected (set at construction).
        expected: usize,
    },
    /// Error for the case when bounds validation is enabled and a box has a lower bound greater
    /// than its upper bound on some axis (or the bounds are not comparable, e.g. NaN).
    InvalidBoxError {
        /// The position the invalid box was added at.
        index: usize,
    },
}

impl std::error::Error for StaticBoxTreeBuildError {}

impl fmt::Display for StaticBoxTreeBuildError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StaticBoxTreeBuildError::ItemCountError { added, expected } => write!(
                f,
                "added item count should equal static size given to builder \
                (added: {}, expected: {})",
                added, expected
            ),
            StaticBoxTreeBuildError::InvalidBoxError { index } => write!(
                f,
                "box added at position {} has a lower bound greater than its upper bound",
                index
            ),
        }
    }
}

/// A single box stored in the [`StaticBoxTree`] array.
///
/// Alongside the box bounds each node holds the position the box had in the input and the
/// maximum upper bound found in the node's subtree (the node itself included) on the axis the
/// node splits on.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TreeNode<T = f64>
where
    T: IndexableNum,
{
    lower: [T; 2],
    upper: [T; 2],
    max: T,
    index: usize,
}

impl<T> TreeNode<T>
where
    T: IndexableNum,
{
    #[inline]
    fn new(lower: [T; 2], upper: [T; 2], index: usize) -> Self {
        TreeNode {
            lower,
            upper,
            max: upper[0],
            index,
        }
    }

    /// Lower corner point (min x, min y) of the box.
    #[inline]
    pub fn lower(&self) -> [T; 2] {
        self.lower
    }

    /// Upper corner point (max x, max y) of the box.
    #[inline]
    pub fn upper(&self) -> [T; 2] {
        self.upper
    }

    /// Maximum upper bound of the node's subtree on the axis the node splits on.
    #[inline]
    pub fn max(&self) -> T {
        self.max
    }

    /// Position of the box in the input the tree was built from.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The node's box as an [`AABB`].
    #[inline]
    pub fn aabb(&self) -> AABB<T> {
        AABB::from_corners(self.lower, self.upper)
    }

    #[inline]
    fn is_valid(&self) -> bool {
        self.aabb().is_valid()
    }
}

/// Used to build a [`StaticBoxTree`].
#[derive(Debug, Clone)]
pub struct StaticBoxTreeBuilder<T = f64>
where
    T: IndexableNum,
{
    num_items: usize,
    nodes: Vec<TreeNode<T>>,
    pos: usize,
    validate_bounds: bool,
    first_invalid: Option<usize>,
    invalid_count: usize,
}

/// Static/fixed size tree of two dimensional axis aligned boxes answering which boxes contain a
/// point.
///
/// The boxes are laid out in a single array as an implicit balanced binary tree: the root of any
/// range of the array is the element at its midpoint and the axis compared alternates with depth
/// (x at the root, y for its children, and so on). Every node additionally caches the maximum
/// upper bound of its subtree which lets queries skip subtrees that end before the query point.
///
/// The tree cannot be modified after creation. Build it with [`StaticBoxTree::from_boxes`] or a
/// [`StaticBoxTreeBuilder`].
///
/// # Examples
/// ```
/// use static_box_tree::*;
/// // create builder for a tree containing 4 boxes
/// // the tree also supports integers and custom types that implement the IndexableNum trait
/// let mut builder: StaticBoxTreeBuilder<f64> = StaticBoxTreeBuilder::new(4);
/// // add takes in (min_x, min_y, max_x, max_y) of the box
/// builder.add(0.0, 0.0, 2.0, 2.0);
/// builder.add(-1.0, -1.0, 3.0, 3.0);
/// builder.add(0.0, 0.0, 1.0, 3.0);
/// builder.add(4.0, 2.0, 16.0, 8.0);
/// // note build returns an error if the number of added boxes does not equal the static size
/// // given at the time the builder was created
/// let tree: StaticBoxTree<f64> = builder.build().unwrap();
/// // query_results holds the positions (order added to the builder) of the boxes that contain
/// // the point given, in no particular order
/// let mut query_results = tree.query(-0.5, -0.5);
/// assert_eq!(query_results, vec![1]);
/// query_results = tree.query(0.5, 2.5);
/// query_results.sort();
/// assert_eq!(query_results, vec![1, 2]);
/// // the query may also be done with a visiting function that can stop the query early
/// let mut visited_results: Vec<usize> = Vec::new();
/// let mut visitor = |box_added_pos: usize| -> Control<()> {
///     visited_results.push(box_added_pos);
///     // return continue to continue visiting results, break to stop early
///     Control::Continue
/// };
///
/// tree.visit_query(-0.5, -0.5, &mut visitor);
/// assert_eq!(visited_results, vec![1]);
/// ```
#[derive(Debug, Clone)]
pub struct StaticBoxTree<T = f64>
where
    T: IndexableNum,
{
    nodes: Box<[TreeNode<T>]>,
    bounds: Option<AABB<T>>,
}

// Helper function to toggle bounds checking. NOTE: the function is not marked unsafe to facilitate
// easy usage since we never rely on it throwing a panic (with unsafe_optimizations feature on we
// assume correct bounds).
#[cfg(not(feature = "unsafe_optimizations"))]
#[inline(always)]
fn get_at_index<T>(container: &[T], index: usize) -> &T {
    &container[index]
}

#[cfg(feature = "unsafe_optimizations")]
#[inline(always)]
fn get_at_index<T>(container: &[T], index: usize) -> &T {
    unsafe { container.get_unchecked(index) }
}

// NaN is the only value of the supported types that is not comparable with itself.
#[inline(always)]
fn is_unordered<T>(value: T) -> bool
where
    T: IndexableNum,
{
    value.partial_cmp(&value).is_none()
}

// Total order over coordinates, incomparable values sort after every comparable one.
#[inline(always)]
fn cmp_coord<T>(a: T, b: T) -> Ordering
where
    T: IndexableNum,
{
    a.partial_cmp(&b)
        .unwrap_or_else(|| is_unordered(a).cmp(&is_unordered(b)))
}

// Min/max over comparable values, an incomparable value is only kept if both are.
#[inline(always)]
fn min_coord<T>(a: T, b: T) -> T
where
    T: IndexableNum,
{
    if is_unordered(b) {
        a
    } else if is_unordered(a) {
        b
    } else {
        T::min(a, b)
    }
}

#[inline(always)]
fn max_coord<T>(a: T, b: T) -> T
where
    T: IndexableNum,
{
    if is_unordered(b) {
        a
    } else if is_unordered(a) {
        b
    } else {
        T::max(a, b)
    }
}

#[inline(always)]
fn next_axis(axis: usize) -> usize {
    (axis + 1) % 2
}

// Work stacks hold flattened (start, end, axis) frames over half open ranges of the node array.
#[inline(always)]
fn push_frame(stack: &mut Vec<usize>, start: usize, end: usize, axis: usize) {
    stack.push(start);
    stack.push(end);
    stack.push(axis);
}

#[inline(always)]
fn pop_frame(stack: &mut Vec<usize>) -> Option<(usize, usize, usize)> {
    let axis = stack.pop()?;
    let end = stack.pop()?;
    let start = stack.pop()?;
    Some((start, end, axis))
}

impl<T> StaticBoxTreeBuilder<T>
where
    T: IndexableNum,
{
    /// Construct a new [`StaticBoxTreeBuilder`] to fit exactly the specified `count` number of
    /// items.
    #[inline]
    pub fn new(count: usize) -> Self {
        StaticBoxTreeBuilder {
            num_items: count,
            nodes: Vec::with_capacity(count),
            pos: 0,
            validate_bounds: false,
            first_invalid: None,
            invalid_count: 0,
        }
    }

    /// Set whether [`StaticBoxTreeBuilder::build`] rejects boxes with a lower bound greater than
    /// the upper bound on either axis. Off by default, in which case such boxes are accepted and
    /// simply never (or unpredictably) match queries.
    #[inline]
    pub fn validate_bounds(mut self, validate: bool) -> Self {
        self.validate_bounds = validate;
        self
    }

    /// Add an axis aligned box with the extent points (`min_x`, `min_y`), (`max_x`, `max_y`) to
    /// the tree.
    #[inline]
    pub fn add(&mut self, min_x: T, min_y: T, max_x: T, max_y: T) -> &mut Self {
        self.push([min_x, min_y], [max_x, max_y])
    }

    /// Add any [`BoxLimits`] implementor to the tree.
    #[inline]
    pub fn add_box<B>(&mut self, item: &B) -> &mut Self
    where
        B: BoxLimits<T> + ?Sized,
    {
        self.push(item.lower(), item.upper())
    }

    fn push(&mut self, lower: [T; 2], upper: [T; 2]) -> &mut Self {
        // catch adding past num_items (error will be returned when build is called)
        if self.pos >= self.num_items {
            self.pos += 1;
            return self;
        }

        let node = TreeNode::new(lower, upper, self.pos);
        if !node.is_valid() {
            self.first_invalid.get_or_insert(self.pos);
            self.invalid_count += 1;
        }

        self.nodes.push(node);
        self.pos += 1;
        self
    }

    /// Build the [`StaticBoxTree`] with the boxes that have been added, using the thread local
    /// random generator for pivot selection.
    ///
    /// If the number of added items does not match the count given at the time the builder was
    /// created then a [`StaticBoxTreeBuildError::ItemCountError`] will be returned.
    ///
    /// If bounds validation is enabled and a box with inverted bounds was added then a
    /// [`StaticBoxTreeBuildError::InvalidBoxError`] will be returned.
    pub fn build(self) -> Result<StaticBoxTree<T>, StaticBoxTreeBuildError> {
        self.build_with_rng(&mut rand::rng())
    }

    /// Same as [`StaticBoxTreeBuilder::build`] but pivots are drawn from a [`StdRng`] seeded with
    /// `seed`, making the resulting layout reproducible.
    pub fn build_with_seed(self, seed: u64) -> Result<StaticBoxTree<T>, StaticBoxTreeBuildError> {
        self.build_with_rng(&mut StdRng::seed_from_u64(seed))
    }

    /// Same as [`StaticBoxTreeBuilder::build`] but pivots are drawn from `rng`.
    pub fn build_with_rng<R>(
        self,
        rng: &mut R,
    ) -> Result<StaticBoxTree<T>, StaticBoxTreeBuildError>
    where
        R: Rng,
    {
        if self.pos != self.num_items {
            return Err(StaticBoxTreeBuildError::ItemCountError {
                added: self.pos,
                expected: self.num_items,
            });
        }

        if let (true, Some(index)) = (self.validate_bounds, self.first_invalid) {
            return Err(StaticBoxTreeBuildError::InvalidBoxError { index });
        }

        Ok(StaticBoxTree::from_nodes(self.nodes, self.invalid_count, rng))
    }
}

/// Selects the element belonging at position `k` of `nodes` when ordered by `lower[axis]`, leaving
/// every element before `k` less than or equal to it and every element after greater than or
/// equal to it.
///
/// Randomized quickselect with a three way partition so runs of equal coordinates do not degrade
/// to quadratic time. Incomparable coordinates (NaN) are ordered after all others.
fn select_nth<T, R>(nodes: &mut [TreeNode<T>], k: usize, axis: usize, rng: &mut R)
where
    T: IndexableNum,
    R: Rng,
{
    debug_assert!(k < nodes.len());
    let mut left = 0;
    let mut right = nodes.len();

    while right - left > 1 {
        let pivot = nodes[rng.random_range(left..right)].lower[axis];

        // [left, lt) < pivot, [lt, i) == pivot, [gt, right) > pivot
        let mut lt = left;
        let mut i = left;
        let mut gt = right;
        while i < gt {
            match cmp_coord(nodes[i].lower[axis], pivot) {
                Ordering::Less => {
                    nodes.swap(lt, i);
                    lt += 1;
                    i += 1;
                }
                Ordering::Greater => {
                    gt -= 1;
                    nodes.swap(i, gt);
                }
                Ordering::Equal => i += 1,
            }
        }

        if k < lt {
            right = lt;
        } else if k >= gt {
            left = gt;
        } else {
            return;
        }
    }
}

// Orders every range of the array around its midpoint, alternating the axis with depth.
fn partition_tree<T, R>(nodes: &mut [TreeNode<T>], rng: &mut R)
where
    T: IndexableNum,
    R: Rng,
{
    let mut stack: Vec<usize> = Vec::with_capacity(3 * 16);
    if nodes.len() > 1 {
        push_frame(&mut stack, 0, nodes.len(), 0);
    }

    while let Some((start, end, axis)) = pop_frame(&mut stack) {
        let mid = start + (end - start) / 2;
        select_nth(&mut nodes[start..end], mid - start, axis, rng);

        let child_axis = next_axis(axis);
        if mid - start > 1 {
            push_frame(&mut stack, start, mid, child_axis);
        }
        if end - (mid + 1) > 1 {
            push_frame(&mut stack, mid + 1, end, child_axis);
        }
    }
}

// Writes the subtree maximum upper bound on `axis` into each range's mid node and returns the
// subtree maxima for both axes. Incomparable upper bounds are skipped. Recursion depth is the tree
// height.
fn augment<T>(nodes: &mut [TreeNode<T>], axis: usize) -> Option<[T; 2]>
where
    T: IndexableNum,
{
    if nodes.is_empty() {
        return None;
    }

    let mid = nodes.len() / 2;
    let (left, rest) = nodes.split_at_mut(mid);
    let (node, right) = rest.split_first_mut()?;

    let child_axis = next_axis(axis);
    let mut max = node.upper;
    for child_max in [augment(left, child_axis), augment(right, child_axis)]
        .into_iter()
        .flatten()
    {
        max[0] = max_coord(max[0], child_max[0]);
        max[1] = max_coord(max[1], child_max[1]);
    }

    node.max = max[axis];
    Some(max)
}

fn total_bounds<T>(nodes: &[TreeNode<T>]) -> Option<AABB<T>>
where
    T: IndexableNum,
{
    let mut nodes_iter = nodes.iter();
    // initialize values with first box
    let first = nodes_iter.next()?;
    let mut min_x = first.lower[0];
    let mut min_y = first.lower[1];
    let mut max_x = first.upper[0];
    let mut max_y = first.upper[1];
    nodes_iter.for_each(|node| {
        min_x = min_coord(min_x, node.lower[0]);
        min_y = min_coord(min_y, node.lower[1]);
        max_x = max_coord(max_x, node.upper[0]);
        max_y = max_coord(max_y, node.upper[1]);
    });

    Some(AABB::new(min_x, min_y, max_x, max_y))
}

struct QueryIterator<'a, T, S>
where
    T: IndexableNum,
    S: BorrowMut<Vec<usize>>,
{
    tree: &'a StaticBoxTree<T>,
    stack: S,
    point: [T; 2],
}

impl<'a, T, S> QueryIterator<'a, T, S>
where
    T: IndexableNum,
    S: BorrowMut<Vec<usize>>,
{
    #[inline]
    fn new(tree: &'a StaticBoxTree<T>, mut stack: S, x: T, y: T) -> Self {
        let frames: &mut Vec<usize> = BorrowMut::borrow_mut(&mut stack);
        // ensure the stack is empty for use
        frames.clear();
        if !tree.is_empty() {
            push_frame(frames, 0, tree.nodes.len(), 0);
        }

        QueryIterator {
            tree,
            stack,
            point: [x, y],
        }
    }
}

impl<T, S> Iterator for QueryIterator<'_, T, S>
where
    T: IndexableNum,
    S: BorrowMut<Vec<usize>>,
{
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        let stack: &mut Vec<usize> = BorrowMut::borrow_mut(&mut self.stack);
        while let Some((start, end, axis)) = pop_frame(stack) {
            if let Some(index) = tree.visit_frame(start, end, axis, self.point, stack) {
                return Some(index);
            }
        }

        None
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let stack: &Vec<usize> = Borrow::borrow(&self.stack);
        if stack.is_empty() {
            // iterator exhausted
            (0, Some(0))
        } else {
            // never yields more than the number of items in the tree
            (0, Some(self.tree.count()))
        }
    }
}

impl<T> StaticBoxTree<T>
where
    T: IndexableNum,
{
    /// Build a tree from `boxes`, using the thread local random generator for pivot selection.
    ///
    /// Result indices of queries are positions in the order `boxes` yields items. An empty input
    /// gives an empty tree. Boxes with inverted bounds are accepted, use
    /// [`StaticBoxTreeBuilder::validate_bounds`] to reject them instead.
    ///
    /// # Examples
    /// ```
    /// use static_box_tree::*;
    /// let boxes = [([0.0, 0.0], [1.0, 1.0]), ([0.5, 0.5], [3.0, 3.0])];
    /// let tree = StaticBoxTree::from_boxes(boxes);
    /// assert_eq!(tree.count(), 2);
    /// assert_eq!(tree.query(2.0, 2.0), vec![1]);
    /// ```
    pub fn from_boxes<I, B>(boxes: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: BoxLimits<T>,
    {
        Self::from_boxes_with_rng(boxes, &mut rand::rng())
    }

    /// Same as [`StaticBoxTree::from_boxes`] but pivots are drawn from `rng`.
    pub fn from_boxes_with_rng<I, B, R>(boxes: I, rng: &mut R) -> Self
    where
        I: IntoIterator<Item = B>,
        B: BoxLimits<T>,
        R: Rng,
    {
        let mut invalid_count = 0;
        let nodes = boxes
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                let node = TreeNode::new(item.lower(), item.upper(), index);
                if !node.is_valid() {
                    invalid_count += 1;
                }
                node
            })
            .collect();

        Self::from_nodes(nodes, invalid_count, rng)
    }

    fn from_nodes<R>(mut nodes: Vec<TreeNode<T>>, invalid_count: usize, rng: &mut R) -> Self
    where
        R: Rng,
    {
        if invalid_count > 0 {
            warn!(
                "accepted {} boxes with a lower bound greater than the upper bound",
                invalid_count
            );
        }

        let bounds = total_bounds(&nodes);
        partition_tree(&mut nodes, rng);
        augment(&mut nodes, 0);

        let tree = StaticBoxTree {
            nodes: nodes.into_boxed_slice(),
            bounds,
        };

        debug!(
            "built static box tree with {} items (height {})",
            tree.count(),
            tree.height()
        );

        tree
    }

    /// Gets the total bounds of all the items that were added to the tree or `None` if the tree
    /// had no items added in construction (item count is 0).
    #[inline]
    pub fn bounds(&self) -> Option<AABB<T>> {
        self.bounds
    }

    /// Gets the total count of items that were added to the tree during construction.
    #[inline]
    pub fn count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree holds no items.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of levels in the tree, `ceil(log2(count + 1))`.
    #[inline]
    pub fn height(&self) -> usize {
        (usize::BITS - self.nodes.len().leading_zeros()) as usize
    }

    /// Gets all the nodes of the tree in array order.
    ///
    /// The root of the array range `[start, end)` is at `start + (end - start) / 2`, with its left
    /// subtree before it and its right subtree after it. Use [`TreeNode::index`] to map a node back
    /// to the position its box was added.
    #[inline]
    pub fn nodes(&self) -> &[TreeNode<T>] {
        &self.nodes
    }

    /// Queries the tree, returning a collection of indices to items that contain the point
    /// (`x`, `y`). Box edges are inclusive.
    ///
    /// Indexes returned match with the order items were given to the tree and are in no
    /// particular order.
    #[inline]
    pub fn query(&self, x: T, y: T) -> Vec<usize> {
        let mut results = Vec::new();
        let mut visitor = |i| {
            results.push(i);
        };
        self.visit_query(x, y, &mut visitor);
        results
    }

    /// Same as [`StaticBoxTree::query`] but allows using an existing buffer for stack traversal.
    /// This is useful for performance when many queries will be done repeatedly to avoid
    /// allocating a new stack for each query (this is for performance benefit only).
    #[inline]
    pub fn query_with_stack(&self, x: T, y: T, stack: &mut Vec<usize>) -> Vec<usize> {
        let mut results = Vec::new();
        let mut visitor = |i| {
            results.push(i);
        };
        self.visit_query_with_stack(x, y, &mut visitor, stack);
        results
    }

    /// The same as [`StaticBoxTree::query`] but instead of returning a [`Vec`] of results an
    /// iterator is returned which yields the results by lazily querying the tree.
    ///
    /// # Examples
    /// ```
    /// use static_box_tree::*;
    /// let mut builder = StaticBoxTreeBuilder::new(4);
    /// builder
    ///     .add(0.0, 0.0, 2.0, 2.0)
    ///     .add(-1.0, -1.0, 3.0, 3.0)
    ///     .add(0.0, 0.0, 1.0, 3.0)
    ///     .add(4.0, 2.0, 16.0, 8.0);
    /// let tree = builder.build().unwrap();
    /// let query_results = tree.query_iter(-0.5, -0.5).collect::<Vec<usize>>();
    /// assert_eq!(query_results, vec![1]);
    /// ```
    #[inline]
    pub fn query_iter<'a>(&'a self, x: T, y: T) -> impl Iterator<Item = usize> + 'a {
        QueryIterator::new(self, Vec::with_capacity(3 * 16), x, y)
    }

    /// The same as [`StaticBoxTree::query_iter`] but allows using an existing buffer for stack
    /// traversal.
    #[inline]
    pub fn query_iter_with_stack<'a>(
        &'a self,
        x: T,
        y: T,
        stack: &'a mut Vec<usize>,
    ) -> impl Iterator<Item = usize> + 'a {
        QueryIterator::new(self, stack, x, y)
    }

    /// Same as [`StaticBoxTree::query`] but instead of returning a collection of indices a
    /// `visitor` function is called for each index that would be returned. The `visitor` returns a
    /// control flow indicating whether to continue visiting or break.
    ///
    /// The [`ControlFlow`] and [`QueryVisitor`] traits are implemented to allow passing in a
    /// function [`FnMut`] visitor that returns no value (all results will be visited) or a
    /// [`ControlFlow`] to break early.
    #[inline]
    pub fn visit_query<V, C>(&self, x: T, y: T, visitor: &mut V) -> C
    where
        C: ControlFlow,
        V: QueryVisitor<C>,
    {
        if self.is_empty() {
            // empty tree, return early since no results to visit (avoid allocating for stack)
            return C::continuing();
        }
        let mut stack: Vec<usize> = Vec::with_capacity(3 * 16);
        self.visit_query_with_stack_impl(x, y, visitor, &mut stack)
    }

    /// Same as [`StaticBoxTree::visit_query`] but allows using an existing buffer for stack
    /// traversal.
    #[inline]
    pub fn visit_query_with_stack<V, C>(
        &self,
        x: T,
        y: T,
        visitor: &mut V,
        stack: &mut Vec<usize>,
    ) -> C
    where
        C: ControlFlow,
        V: QueryVisitor<C>,
    {
        if self.is_empty() {
            return C::continuing();
        }
        self.visit_query_with_stack_impl(x, y, visitor, stack)
    }

    // Implementation function which assumes the tree is not empty.
    fn visit_query_with_stack_impl<V, C>(
        &self,
        x: T,
        y: T,
        visitor: &mut V,
        stack: &mut Vec<usize>,
    ) -> C
    where
        C: ControlFlow,
        V: QueryVisitor<C>,
    {
        let point = [x, y];
        // ensure the stack is empty for use
        stack.clear();
        push_frame(stack, 0, self.nodes.len(), 0);

        while let Some((start, end, axis)) = pop_frame(stack) {
            if let Some(index) = self.visit_frame(start, end, axis, point, stack) {
                try_control!(visitor.visit(index))
            }
        }

        C::continuing()
    }

    // Visits the root of the non empty range [start, end), pushing the child ranges which may hold
    // a box containing `point` and returning the root's item index if its box contains `point`.
    #[inline]
    fn visit_frame(
        &self,
        start: usize,
        end: usize,
        axis: usize,
        point: [T; 2],
        stack: &mut Vec<usize>,
    ) -> Option<usize> {
        let mid = start + (end - start) / 2;
        let node = get_at_index(&self.nodes, mid);
        let child_axis = next_axis(axis);

        // some box in the subtree extends far enough to reach the point
        if point[axis] <= node.max && start < mid {
            push_frame(stack, start, mid, child_axis);
        }

        // boxes after mid start at or after node.lower[axis]
        if node.lower[axis] > point[axis] {
            return None;
        }

        if mid + 1 < end {
            push_frame(stack, mid + 1, end, child_axis);
        }

        if point[axis] <= node.upper[axis]
            && node.lower[child_axis] <= point[child_axis]
            && point[child_axis] <= node.upper[child_axis]
        {
            return Some(node.index);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes_from<T: IndexableNum>(boxes: &[AABB<T>]) -> Vec<TreeNode<T>> {
        boxes
            .iter()
            .enumerate()
            .map(|(i, b)| TreeNode::new(b.lower(), b.upper(), i))
            .collect()
    }

    // Checks the split ordering and augmented maxima of every range, returning the subtree maxima.
    fn check_range<T>(nodes: &[TreeNode<T>], axis: usize) -> Option<[T; 2]>
    where
        T: IndexableNum,
    {
        if nodes.is_empty() {
            return None;
        }

        let mid = nodes.len() / 2;
        let node = &nodes[mid];
        assert!(nodes[..mid]
            .iter()
            .all(|n| cmp_coord(n.lower[axis], node.lower[axis]) != Ordering::Greater));
        assert!(nodes[mid + 1..]
            .iter()
            .all(|n| cmp_coord(n.lower[axis], node.lower[axis]) != Ordering::Less));

        let mut max = node.upper;
        for child in [
            check_range(&nodes[..mid], next_axis(axis)),
            check_range(&nodes[mid + 1..], next_axis(axis)),
        ]
        .into_iter()
        .flatten()
        {
            max[0] = max_coord(max[0], child[0]);
            max[1] = max_coord(max[1], child[1]);
        }

        assert_eq!(cmp_coord(node.max, max[axis]), Ordering::Equal);
        Some(max)
    }

    fn build_and_check<T>(boxes: &[AABB<T>], seed: u64) -> Vec<TreeNode<T>>
    where
        T: IndexableNum,
    {
        let mut nodes = nodes_from(boxes);
        let mut rng = StdRng::seed_from_u64(seed);
        partition_tree(&mut nodes, &mut rng);
        augment(&mut nodes, 0);
        check_range(&nodes, 0);

        let mut indices: Vec<usize> = nodes.iter().map(|n| n.index).collect();
        indices.sort();
        assert_eq!(indices, (0..boxes.len()).collect::<Vec<_>>());
        nodes
    }

    fn pseudo_random_boxes(count: usize, seed: u64) -> Vec<AABB<i32>> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count)
            .map(|_| {
                let x = rng.random_range(0..100);
                let y = rng.random_range(0..100);
                AABB::new(x, y, x + rng.random_range(0..20), y + rng.random_range(0..20))
            })
            .collect()
    }

    #[test]
    fn select_nth_places_kth_element() {
        let boxes = pseudo_random_boxes(101, 7);
        let mut rng = StdRng::seed_from_u64(1);
        for k in [0, 1, 50, 99, 100] {
            let mut nodes = nodes_from(&boxes);
            select_nth(&mut nodes, k, 1, &mut rng);

            let mut sorted: Vec<i32> = boxes.iter().map(|b| b.min_y).collect();
            sorted.sort();
            assert_eq!(nodes[k].lower[1], sorted[k]);
            assert!(nodes[..k].iter().all(|n| n.lower[1] <= nodes[k].lower[1]));
            assert!(nodes[k + 1..].iter().all(|n| n.lower[1] >= nodes[k].lower[1]));
        }
    }

    #[test]
    fn select_nth_orders_nan_last() {
        let mut boxes: Vec<AABB<f64>> = (0..40)
            .map(|i| AABB::new(f64::from(i % 9), 0.0, 10.0, 1.0))
            .collect();
        boxes[3].min_x = f64::NAN;
        boxes[17].min_x = f64::NAN;
        boxes[30].min_x = f64::NAN;

        // every pivot choice, including a NaN one, must leave the NaN boxes after k
        for seed in 0..50 {
            let mut nodes = nodes_from(&boxes);
            let mut rng = StdRng::seed_from_u64(seed);
            select_nth(&mut nodes, 20, 0, &mut rng);
            assert!(nodes[..20].iter().all(|n| nodes[20].lower[0] >= n.lower[0]));
            assert!(nodes[..=20].iter().all(|n| !n.lower[0].is_nan()));
        }
    }

    #[test]
    fn partition_and_augment_hold_invariants() {
        for count in [0, 1, 2, 3, 7, 8, 100, 257] {
            build_and_check(&pseudo_random_boxes(count, count as u64), 11);
        }
    }

    #[test]
    fn partition_and_augment_hold_invariants_with_duplicates() {
        let all_equal = vec![AABB::new(3, 3, 4, 4); 1000];
        let shared_lower: Vec<AABB<i32>> = (0..1000)
            .map(|i| AABB::new(5, 5, 5 + i % 7, 5 + i % 3))
            .collect();
        let mixed_ties: Vec<AABB<i32>> = (0..600)
            .map(|i| AABB::new(i % 3, (i / 3) % 2, i % 3 + i % 5, (i / 3) % 2 + i % 4))
            .collect();

        for seed in 0..5 {
            build_and_check(&all_equal, seed);
            build_and_check(&shared_lower, seed);
            build_and_check(&mixed_ties, seed);
        }
    }

    #[test]
    fn partition_and_augment_hold_invariants_with_nan() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut boxes: Vec<AABB<f64>> = (0..200)
            .map(|_| {
                let x = rng.random_range(0.0..100.0);
                let y = rng.random_range(0.0..100.0);
                AABB::new(x, y, x + 5.0, y + 5.0)
            })
            .collect();
        boxes[0].min_x = f64::NAN;
        boxes[50].max_x = f64::NAN;
        boxes[100].min_y = f64::NAN;
        boxes[150].max_y = f64::NAN;

        for seed in 0..20 {
            build_and_check(&boxes, seed);
        }
    }

    #[test]
    fn augment_includes_own_upper_bound() {
        let mut nodes = nodes_from(&[AABB::new(0, 0, 9, 1)]);
        augment(&mut nodes, 0);
        assert_eq!(nodes[0].max, 9);
    }

    #[test]
    fn augment_skips_nan_upper_bounds() {
        let mut nodes = nodes_from(&[
            AABB::new(0.0, 0.0, 4.0, 1.0),
            AABB::new(1.0, 0.0, f64::NAN, 1.0),
            AABB::new(2.0, 0.0, 3.0, 1.0),
        ]);
        augment(&mut nodes, 0);
        assert_eq!(nodes[1].max, 4.0);
    }

    #[test]
    fn builder_counts_invalid_boxes_as_they_are_added() {
        let mut builder = StaticBoxTreeBuilder::new(4);
        builder
            .add(0.0, 0.0, 1.0, 1.0)
            .add(2.0, 0.0, 1.0, 1.0)
            .add(0.0, f64::NAN, 1.0, 1.0)
            .add(0.0, 0.0, 1.0, 1.0);
        assert_eq!(builder.invalid_count, 2);
        assert_eq!(builder.first_invalid, Some(1));

        // adds past the declared count are not stored or counted
        builder.add(3.0, 3.0, 0.0, 0.0);
        assert_eq!(builder.invalid_count, 2);
    }

    #[test]
    fn frames_round_trip_through_stack() {
        let mut stack = Vec::new();
        push_frame(&mut stack, 1, 5, 0);
        push_frame(&mut stack, 6, 9, 1);
        assert_eq!(pop_frame(&mut stack), Some((6, 9, 1)));
        assert_eq!(pop_frame(&mut stack), Some((1, 5, 0)));
        assert_eq!(pop_frame(&mut stack), None);
    }
}

use num_traits::Num;

/// Trait used by the [StaticBoxTree](crate::StaticBoxTree) that is required to be implemented for
/// the coordinate type T. It is blanket implemented for all supported primitive numeric types.
pub trait IndexableNum: Copy + Num + PartialOrd + Default {
    /// Simple default min implementation for [PartialOrd] types.
    #[inline]
    fn min(self, other: Self) -> Self {
        if self < other {
            return self;
        }

        other
    }

    /// Simple default max implementation for [PartialOrd] types.
    #[inline]
    fn max(self, other: Self) -> Self {
        if self > other {
            return self;
        }

        other
    }
}

impl IndexableNum for i16 {}
impl IndexableNum for u16 {}
impl IndexableNum for i32 {}
impl IndexableNum for u32 {}
impl IndexableNum for i64 {}
impl IndexableNum for u64 {}
impl IndexableNum for i128 {}
impl IndexableNum for u128 {}
impl IndexableNum for isize {}
impl IndexableNum for usize {}
impl IndexableNum for f32 {}
impl IndexableNum for f64 {}

/// Simple 2D axis aligned bounding box which holds the extents of a 2D box.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct AABB<T = f64> {
    /// Min x extent of the axis aligned bounding box.
    pub min_x: T,
    /// Min y extent of the axis aligned bounding box.
    pub min_y: T,
    /// Max x extent of the axis aligned bounding box.
    pub max_x: T,
    /// Max y extent of the axis aligned bounding box.
    pub max_y: T,
}

impl<T> Default for AABB<T>
where
    T: IndexableNum,
{
    #[inline]
    fn default() -> Self {
        AABB {
            min_x: T::zero(),
            min_y: T::zero(),
            max_x: T::zero(),
            max_y: T::zero(),
        }
    }
}

impl<T> AABB<T>
where
    T: IndexableNum,
{
    #[inline]
    pub fn new(min_x: T, min_y: T, max_x: T, max_y: T) -> AABB<T> {
        AABB {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Construct from the lower and upper corner points.
    #[inline]
    pub fn from_corners(lower: [T; 2], upper: [T; 2]) -> AABB<T> {
        AABB::new(lower[0], lower[1], upper[0], upper[1])
    }

    /// Tests if the point (`x`, `y`) is inside this AABB (inclusive of edges and corners).
    ///
    /// # Examples
    /// ```
    /// use static_box_tree::AABB;
    /// let aabb = AABB::new(0, 0, 2, 2);
    /// assert!(aabb.contains_point(1, 1));
    /// // note: containment check is inclusive of edges/corners
    /// assert!(aabb.contains_point(2, 0));
    /// assert!(!aabb.contains_point(3, 1));
    /// ```
    #[inline]
    pub fn contains_point(&self, x: T, y: T) -> bool {
        self.min_x <= x && x <= self.max_x && self.min_y <= y && y <= self.max_y
    }

    /// Returns true if `min_x <= max_x` and `min_y <= max_y`. Incomparable values (NaN) are
    /// not valid.
    ///
    /// # Examples
    /// ```
    /// use static_box_tree::AABB;
    /// assert!(AABB::new(0.0, 0.0, 0.0, 1.0).is_valid());
    /// assert!(!AABB::new(0.0, 2.0, 1.0, 1.0).is_valid());
    /// assert!(!AABB::new(f64::NAN, 0.0, 1.0, 1.0).is_valid());
    /// ```
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }
}

/// Capability required of the items a [StaticBoxTree](crate::StaticBoxTree) is built from:
/// access to the lower and upper corner points of a box, indexed by axis (0 = x, 1 = y).
///
/// # Examples
/// ```
/// use static_box_tree::*;
/// struct Room {
///     corner: (f64, f64),
///     size: (f64, f64),
/// }
///
/// impl BoxLimits<f64> for Room {
///     fn lower(&self) -> [f64; 2] {
///         [self.corner.0, self.corner.1]
///     }
///
///     fn upper(&self) -> [f64; 2] {
///         [self.corner.0 + self.size.0, self.corner.1 + self.size.1]
///     }
/// }
///
/// let rooms = vec![
///     Room { corner: (0.0, 0.0), size: (4.0, 3.0) },
///     Room { corner: (4.0, 0.0), size: (2.0, 3.0) },
/// ];
/// let tree = StaticBoxTree::from_boxes(&rooms);
/// let mut results = tree.query(4.0, 1.0);
/// results.sort();
/// assert_eq!(results, vec![0, 1]);
/// ```
pub trait BoxLimits<T> {
    /// Lower corner point (min x, min y).
    fn lower(&self) -> [T; 2];
    /// Upper corner point (max x, max y).
    fn upper(&self) -> [T; 2];
}

impl<T> BoxLimits<T> for AABB<T>
where
    T: IndexableNum,
{
    #[inline]
    fn lower(&self) -> [T; 2] {
        [self.min_x, self.min_y]
    }

    #[inline]
    fn upper(&self) -> [T; 2] {
        [self.max_x, self.max_y]
    }
}

impl<T> BoxLimits<T> for ([T; 2], [T; 2])
where
    T: Copy,
{
    #[inline]
    fn lower(&self) -> [T; 2] {
        self.0
    }

    #[inline]
    fn upper(&self) -> [T; 2] {
        self.1
    }
}

impl<T, B> BoxLimits<T> for &B
where
    B: BoxLimits<T> + ?Sized,
{
    #[inline]
    fn lower(&self) -> [T; 2] {
        (**self).lower()
    }

    #[inline]
    fn upper(&self) -> [T; 2] {
        (**self).upper()
    }
}

/// Basic control flow enum that can be used when visiting query results.
#[derive(Debug)]
pub enum Control<B> {
    /// Indicates to the query function to continue visiting results.
    Continue,
    /// Indicates to the query function to stop visiting results and return a value.
    Break(B),
}

impl<B> Default for Control<B> {
    fn default() -> Self {
        Control::Continue
    }
}

/// Trait for control flow inside query functions.
pub trait ControlFlow {
    /// Constructs state indicating to continue.
    fn continuing() -> Self;
    /// Should return true if control flow should break.
    fn should_break(&self) -> bool;
}

impl<B> ControlFlow for Control<B> {
    #[inline]
    fn continuing() -> Self {
        Control::Continue
    }

    #[inline]
    fn should_break(&self) -> bool {
        matches!(*self, Control::Break(_))
    }
}

impl ControlFlow for () {
    #[inline]
    fn continuing() -> Self {}

    #[inline]
    fn should_break(&self) -> bool {
        false
    }
}

impl<C, E> ControlFlow for Result<C, E>
where
    C: ControlFlow,
{
    fn continuing() -> Self {
        Ok(C::continuing())
    }

    fn should_break(&self) -> bool {
        matches!(self, Err(_))
    }
}

/// Visitor trait used to visit the results of a StaticBoxTree point query.
///
/// This trait is blanket implemented for FnMut(usize) -> impl ControlFlow.
pub trait QueryVisitor<C>
where
    C: ControlFlow,
{
    /// Visit the original index position of a box containing the query point.
    fn visit(&mut self, index_pos: usize) -> C;
}

impl<C, F> QueryVisitor<C> for F
where
    C: ControlFlow,
    F: FnMut(usize) -> C,
{
    #[inline]
    fn visit(&mut self, index_pos: usize) -> C {
        self(index_pos)
    }
}

#[macro_export]
macro_rules! try_control {
    ($e:expr) => {
        match $e {
            x => {
                if x.should_break() {
                    return x;
                }
            }
        }
    };
}

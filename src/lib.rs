//! Static augmented box tree for fast point containment queries over 2D axis aligned boxes.
//!
//! The boxes are stored in a single flat array ordered as an implicit balanced binary tree
//! (alternating x and y at each level, like a k-d tree) with each node caching its subtree's
//! maximum upper bound. Queries walk the tree with an explicit stack, pruning subtrees that end
//! before or start after the query point.
//!
//! # Examples
//! ```
//! use static_box_tree::*;
//! use rand::SeedableRng;
//! let boxes = vec![
//!     AABB::new(4.0, 6.0, 8.0, 10.0),
//!     AABB::new(5.0, 5.0, 11.0, 9.0),
//!     AABB::new(1.0, 4.0, 4.0, 7.0),
//!     AABB::new(2.0, 3.0, 3.0, 4.0),
//! ];
//! // seeding makes the tree layout reproducible, query results never depend on it
//! let mut rng = rand::rngs::StdRng::seed_from_u64(1);
//! let tree = StaticBoxTree::from_boxes_with_rng(&boxes, &mut rng);
//! let mut results = tree.query(3.2, 6.3);
//! results.sort();
//! assert_eq!(results, vec![2]);
//! ```

mod core;
mod static_box_tree;

pub use crate::core::*;
pub use static_box_tree::*;

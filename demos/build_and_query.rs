use static_box_tree::{Control, StaticBoxTree, StaticBoxTreeBuilder};

fn main() {
    // create builder for a tree containing 7 boxes
    // the tree also supports integers and custom types that implement the IndexableNum trait
    let mut builder: StaticBoxTreeBuilder<f64> = StaticBoxTreeBuilder::new(7);
    // add takes in (min_x, min_y, max_x, max_y) of the box
    builder
        .add(4.0, 6.0, 8.0, 10.0)
        .add(5.0, 5.0, 11.0, 9.0)
        .add(1.0, 4.0, 4.0, 7.0)
        .add(2.0, 3.0, 3.0, 4.0)
        .add(4.0, 6.0, 8.0, 10.0)
        .add(6.0, 3.0, 8.0, 8.0)
        .add(2.0, 6.0, 7.0, 7.0);
    // note build may return an error if the number of added boxes does not equal the static size
    // given at the time the builder was created, seeding makes the tree layout reproducible
    let tree: StaticBoxTree<f64> = builder.build_with_seed(7).unwrap();
    // query the tree with a point (x, y)
    let mut query_results = tree.query(3.2, 6.3);
    // query_results holds the index positions of the boxes that contain the point
    // (positions are according to the order boxes were added to the builder, results are unordered)
    query_results.sort();
    assert_eq!(query_results, vec![2, 6]);
    println!("boxes containing (3.2, 6.3): {:?}", query_results);

    // the query may also be done with a visiting function that can stop the query early
    let mut visited_results: Vec<usize> = Vec::new();
    // no early break (all boxes visited)
    let mut visitor = |box_added_pos: usize| {
        visited_results.push(box_added_pos);
    };

    tree.visit_query(6.5, 7.0, &mut visitor);
    assert_eq!(visited_results.len(), 5);

    visited_results.clear();

    // using early control flow break in the visitor to only yield the first N boxes
    let max_results = 2;
    let mut visitor = |box_added_pos: usize| {
        visited_results.push(box_added_pos);
        if visited_results.len() == max_results {
            // stop visiting after adding max_results number of box index positions
            return Control::Break(());
        }
        Control::Continue
    };

    tree.visit_query(6.5, 7.0, &mut visitor);
    // only 2 results since we stopped the visitor after adding max_results
    assert_eq!(visited_results.len(), 2);
    println!("first two boxes containing (6.5, 7.0): {:?}", visited_results);
}

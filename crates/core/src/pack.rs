//! B*-tree packer: turns tree topology into block coordinates.
//!
//! Pre-order DFS from the root. A left child sits flush to the right of its
//! parent, a right child shares its parent's x; the resting y is read from
//! the contour. The traversal uses an explicit stack so that a degenerate
//! left-spine of a few thousand nodes cannot overflow the call stack.

use crate::contour::Contour;
use crate::tree::FloorTree;

/// Assigns coordinates to every node and updates the chip extents.
///
/// Packing is deterministic: identical trees with identical variant
/// selections produce bit-identical coordinates.
pub fn pack(tree: &mut FloorTree) {
    let Some(root) = tree.root else {
        tree.chip_width = 0.0;
        tree.chip_height = 0.0;
        tree.chip_area = 0.0;
        return;
    };

    let mut contour = Contour::new();
    let mut stack = Vec::with_capacity(tree.nodes.len());
    stack.push(root);

    while let Some(id) = stack.pop() {
        let x = match tree.nodes[id].parent {
            Some(p) if tree.nodes[p].left == Some(id) => {
                tree.nodes[p].x + tree.nodes[p].width
            }
            Some(p) => tree.nodes[p].x,
            None => 0.0,
        };
        let node = &mut tree.nodes[id];
        node.x = x;
        node.y = contour.place(x, node.width, node.height);

        // Right pushed first so the whole left subtree packs before it.
        if let Some(r) = tree.nodes[id].right {
            stack.push(r);
        }
        if let Some(l) = tree.nodes[id].left {
            stack.push(l);
        }
    }

    let mut chip_width = 0.0f64;
    let mut chip_height = 0.0f64;
    for node in &tree.nodes {
        chip_width = chip_width.max(node.x + node.width);
        chip_height = chip_height.max(node.y + node.height);
    }
    tree.chip_width = chip_width;
    tree.chip_height = chip_height;
    tree.chip_area = chip_width * chip_height;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BlockCatalog;
    use crate::tree::FloorTree;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Cursor;

    fn catalog(input: &str) -> BlockCatalog {
        BlockCatalog::from_reader(Cursor::new(input)).unwrap()
    }

    #[test]
    fn test_single_node_chip_equals_block() {
        let catalog = catalog("M1 (10 20 1 1)\n");
        let mut rng = StdRng::seed_from_u64(0);
        let mut tree = FloorTree::random(&catalog, &mut rng);
        pack(&mut tree);

        assert_eq!(tree.nodes[0].x, 0.0);
        assert_eq!(tree.nodes[0].y, 0.0);
        assert_eq!(tree.chip_width, 10.0);
        assert_eq!(tree.chip_height, 20.0);
        assert_eq!(tree.chip_area, 200.0);
    }

    #[test]
    fn test_empty_tree_packs_to_zero() {
        let catalog = BlockCatalog::default();
        let mut rng = StdRng::seed_from_u64(0);
        let mut tree = FloorTree::random(&catalog, &mut rng);
        pack(&mut tree);
        assert_eq!(tree.chip_area, 0.0);
    }

    #[test]
    fn test_left_spine_lays_out_in_a_row() {
        let catalog = catalog("A1 (10 10 1 1)\nA2 (10 10 1 1)\nA3 (10 10 1 1)\n");
        let mut rng = StdRng::seed_from_u64(3);
        let mut tree = FloorTree::random(&catalog, &mut rng);
        pack(&mut tree);

        // Left spine: every node to the right of its parent, all on the floor.
        let xs: Vec<f64> = tree.nodes.iter().map(|n| n.x).collect();
        assert_eq!(xs, vec![0.0, 10.0, 20.0]);
        assert!(tree.nodes.iter().all(|n| n.y == 0.0));
        assert_eq!(tree.chip_width, 30.0);
        assert_eq!(tree.chip_height, 10.0);
    }

    #[test]
    fn test_right_child_stacks_above_parent() {
        let catalog = catalog("A1 (10 10 1 1)\nA2 (10 10 1 1)\n");
        let mut rng = StdRng::seed_from_u64(0);
        let mut tree = FloorTree::random(&catalog, &mut rng);
        // Rewire: node 1 becomes the right child of node 0.
        tree.nodes[0].left = None;
        tree.nodes[0].right = Some(1);
        pack(&mut tree);

        assert_eq!(tree.nodes[1].x, 0.0);
        assert_eq!(tree.nodes[1].y, 10.0);
        assert_eq!(tree.chip_width, 10.0);
        assert_eq!(tree.chip_height, 20.0);
    }

    #[test]
    fn test_pack_is_deterministic() {
        let catalog = catalog(
            "B1 (7 3 1 1) (3 7 1 1)\nB2 (4 4 1 1)\nB3 (2 9 1 1)\nB4 (5 5 1 1)\n",
        );
        let mut rng = StdRng::seed_from_u64(42);
        let mut a = FloorTree::random(&catalog, &mut rng);
        let mut b = a.clone();
        pack(&mut a);
        pack(&mut b);
        for (na, nb) in a.nodes.iter().zip(&b.nodes) {
            assert_eq!(na.x, nb.x);
            assert_eq!(na.y, nb.y);
        }
        assert_eq!(a.chip_width, b.chip_width);
        assert_eq!(a.chip_height, b.chip_height);
    }
}

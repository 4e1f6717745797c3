//! B*-tree floorplan state.
//!
//! The tree is stored as a dense array of node records with integer links,
//! never as a pointer graph: cloning a whole state is a contiguous buffer
//! copy, which the annealer does on every proposal.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::catalog::BlockCatalog;
use crate::cost::COST_SENTINEL;

/// One node of the placement tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    /// Index of the block this node places.
    pub block: usize,
    pub parent: Option<usize>,
    pub left: Option<usize>,
    pub right: Option<usize>,
    /// Currently selected shape variant of the block.
    pub variant: usize,
    /// Cached dimensions of the selected variant.
    pub width: f64,
    pub height: f64,
    /// Placed coordinates, valid after a successful pack.
    pub x: f64,
    pub y: f64,
}

/// A full floorplan state: tree topology plus cached packing totals.
#[derive(Debug, Clone)]
pub struct FloorTree {
    pub nodes: Vec<Node>,
    pub root: Option<usize>,
    pub chip_width: f64,
    pub chip_height: f64,
    pub chip_area: f64,
    pub inl: f64,
    pub cost: f64,
}

impl FloorTree {
    /// Builds an initial tree: a uniform random permutation of the blocks
    /// chained as a left spine, with a uniformly random variant per node.
    pub fn random(catalog: &BlockCatalog, rng: &mut impl Rng) -> Self {
        let n = catalog.len();
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);

        let mut nodes = Vec::with_capacity(n);
        for (i, &block) in order.iter().enumerate() {
            let variants = &catalog.get(block).variants;
            let variant = rng.gen_range(0..variants.len());
            nodes.push(Node {
                block,
                parent: if i == 0 { None } else { Some(i - 1) },
                left: if i + 1 < n { Some(i + 1) } else { None },
                right: None,
                variant,
                width: variants[variant].width,
                height: variants[variant].height,
                x: 0.0,
                y: 0.0,
            });
        }

        Self {
            nodes,
            root: if n > 0 { Some(0) } else { None },
            chip_width: 0.0,
            chip_height: 0.0,
            chip_area: 0.0,
            inl: 0.0,
            cost: COST_SENTINEL,
        }
    }

    /// Number of placed blocks.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Re-copies every node's cached dimensions from its selected variant.
    pub fn refresh_dims(&mut self, catalog: &BlockCatalog) {
        for node in &mut self.nodes {
            let shape = catalog.get(node.block).variants[node.variant];
            node.width = shape.width;
            node.height = shape.height;
        }
    }

    /// Structural validity: every block exactly once, links form a rooted
    /// binary tree, cached dimensions match the selected variants.
    pub fn is_valid(&self, catalog: &BlockCatalog) -> bool {
        let n = self.nodes.len();
        if n != catalog.len() {
            return false;
        }
        if n == 0 {
            return self.root.is_none();
        }

        let mut block_seen = vec![false; n];
        for node in &self.nodes {
            if node.block >= n || block_seen[node.block] {
                return false;
            }
            block_seen[node.block] = true;
            let shape = catalog.get(node.block).variants.get(node.variant);
            match shape {
                Some(s) if s.width == node.width && s.height == node.height => {}
                _ => return false,
            }
        }

        // Walk from the root; every node must be reached exactly once and
        // child/parent links must agree.
        let Some(root) = self.root else { return false };
        if self.nodes[root].parent.is_some() {
            return false;
        }
        let mut visited = vec![false; n];
        let mut stack = vec![root];
        let mut count = 0;
        while let Some(id) = stack.pop() {
            if id >= n || visited[id] {
                return false;
            }
            visited[id] = true;
            count += 1;
            for child in [self.nodes[id].left, self.nodes[id].right].into_iter().flatten() {
                if child >= n || self.nodes[child].parent != Some(id) {
                    return false;
                }
                stack.push(child);
            }
        }
        count == n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Cursor;

    fn catalog(input: &str) -> BlockCatalog {
        BlockCatalog::from_reader(Cursor::new(input)).unwrap()
    }

    #[test]
    fn test_random_tree_is_left_spine() {
        let catalog = catalog("A1 (1 1 1 1)\nA2 (2 2 1 1)\nA3 (3 3 1 1)\n");
        let mut rng = StdRng::seed_from_u64(7);
        let tree = FloorTree::random(&catalog, &mut rng);

        assert_eq!(tree.len(), 3);
        assert_eq!(tree.root, Some(0));
        assert_eq!(tree.nodes[0].left, Some(1));
        assert_eq!(tree.nodes[1].left, Some(2));
        assert_eq!(tree.nodes[2].left, None);
        assert!(tree.nodes.iter().all(|n| n.right.is_none()));
        assert!(tree.is_valid(&catalog));
    }

    #[test]
    fn test_random_tree_uses_every_block_once() {
        let catalog = catalog("B1 (1 1 1 1)\nB2 (1 2 1 1)\nB3 (1 3 1 1)\nB4 (1 4 1 1)\n");
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let tree = FloorTree::random(&catalog, &mut rng);
            let mut blocks: Vec<usize> = tree.nodes.iter().map(|n| n.block).collect();
            blocks.sort_unstable();
            assert_eq!(blocks, vec![0, 1, 2, 3]);
        }
    }

    #[test]
    fn test_empty_catalog_gives_empty_tree() {
        let catalog = BlockCatalog::default();
        let mut rng = StdRng::seed_from_u64(0);
        let tree = FloorTree::random(&catalog, &mut rng);
        assert!(tree.is_empty());
        assert_eq!(tree.root, None);
        assert!(tree.is_valid(&catalog));
    }

    #[test]
    fn test_refresh_dims_follows_variant() {
        let catalog = catalog("B1 (10 40 1 1) (40 10 1 1)\n");
        let mut rng = StdRng::seed_from_u64(1);
        let mut tree = FloorTree::random(&catalog, &mut rng);
        tree.nodes[0].variant = 1;
        tree.refresh_dims(&catalog);
        assert_eq!(tree.nodes[0].width, 40.0);
        assert_eq!(tree.nodes[0].height, 10.0);
    }
}

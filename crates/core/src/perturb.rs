//! Randomised tree mutations for the annealer.
//!
//! One of three operators per call, drawn from a fixed distribution over
//! 0..=10:
//!
//! - **reshape** (op <= 3): re-pick one node's shape variant
//! - **swap** (op <= 7): exchange the contents of two nodes
//! - **move** (otherwise): detach a node and re-attach it elsewhere
//!
//! Moves and swaps together reach any labelled binary tree on n nodes.

use rand::Rng;

use crate::catalog::BlockCatalog;
use crate::tree::FloorTree;

/// Applies one random perturbation and refreshes cached dimensions.
pub fn perturb(tree: &mut FloorTree, catalog: &BlockCatalog, rng: &mut impl Rng) {
    if tree.len() <= 1 {
        return;
    }
    let n = tree.len();
    let op = rng.gen_range(0..=10);

    if op <= 3 {
        let id = rng.gen_range(0..n);
        let variants = catalog.get(tree.nodes[id].block).variants.len();
        if variants > 1 {
            tree.nodes[id].variant = rng.gen_range(0..variants);
        }
    } else if op <= 7 {
        let a = rng.gen_range(0..n);
        let b = loop {
            let b = rng.gen_range(0..n);
            if b != a {
                break b;
            }
        };
        let (block_a, variant_a) = (tree.nodes[a].block, tree.nodes[a].variant);
        tree.nodes[a].block = tree.nodes[b].block;
        tree.nodes[a].variant = tree.nodes[b].variant;
        tree.nodes[b].block = block_a;
        tree.nodes[b].variant = variant_a;
    } else {
        let u = rng.gen_range(0..n);
        let p = loop {
            let p = rng.gen_range(0..n);
            if p != u {
                break p;
            }
        };
        detach(tree, u);
        attach(tree, u, p, rng.gen_bool(0.5));
    }

    tree.refresh_dims(catalog);
}

/// Removes node `u` from the tree, grafting its children back in.
///
/// If `u` has two children, the right subtree is hung off the rightmost
/// descendant of the left one; the surviving child is promoted into `u`'s
/// slot (or becomes the new root). Returns the promoted child.
pub fn detach(tree: &mut FloorTree, u: usize) -> Option<usize> {
    let parent = tree.nodes[u].parent;
    let left = tree.nodes[u].left;
    let right = tree.nodes[u].right;

    if let (Some(l), Some(r)) = (left, right) {
        let mut rightmost = l;
        while let Some(next) = tree.nodes[rightmost].right {
            rightmost = next;
        }
        tree.nodes[rightmost].right = Some(r);
        tree.nodes[r].parent = Some(rightmost);
    }

    let promoted = left.or(right);

    match parent {
        Some(p) => {
            if tree.nodes[p].left == Some(u) {
                tree.nodes[p].left = promoted;
            } else {
                tree.nodes[p].right = promoted;
            }
            if let Some(c) = promoted {
                tree.nodes[c].parent = Some(p);
            }
        }
        None => {
            tree.root = promoted;
            if let Some(c) = promoted {
                tree.nodes[c].parent = None;
            }
        }
    }

    tree.nodes[u].parent = None;
    tree.nodes[u].left = None;
    tree.nodes[u].right = None;
    promoted
}

/// Attaches detached node `u` as the left or right child of `p`.
///
/// `p`'s previous child on that side becomes `u`'s child on the same side,
/// so `u` inherits the subtree rather than displacing it.
pub fn attach(tree: &mut FloorTree, u: usize, p: usize, is_left: bool) {
    tree.nodes[u].parent = Some(p);
    if is_left {
        let old = tree.nodes[p].left;
        tree.nodes[u].left = old;
        if let Some(c) = old {
            tree.nodes[c].parent = Some(u);
        }
        tree.nodes[p].left = Some(u);
    } else {
        let old = tree.nodes[p].right;
        tree.nodes[u].right = old;
        if let Some(c) = old {
            tree.nodes[c].parent = Some(u);
        }
        tree.nodes[p].right = Some(u);
    }
}

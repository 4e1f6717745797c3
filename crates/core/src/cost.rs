//! Cost model: chip area, aspect-ratio penalty and INL regularity.

use crate::catalog::{compare_block_names, BlockCatalog};
use crate::tree::FloorTree;

/// Weight of the area/aspect term in the combined cost.
pub const AREA_AR_WEIGHT: f64 = 0.8;
/// Weight of the INL term in the combined cost.
pub const INL_WEIGHT: f64 = 0.2;
/// Cost assigned to degenerate (near-zero-area) layouts.
pub const COST_SENTINEL: f64 = 1e18;

/// Penalty for aspect ratios outside [0.5, 2].
pub fn aspect_penalty(ar: f64) -> f64 {
    if ar < 0.5 {
        2.0 * (0.5 - ar)
    } else if ar > 2.0 {
        ar - 2.0
    } else {
        0.0
    }
}

/// Scores a packed tree, updating its cached `inl` and `cost`.
pub fn evaluate(tree: &mut FloorTree, catalog: &BlockCatalog) {
    if tree.chip_area < 1e-9 {
        tree.inl = 0.0;
        tree.cost = COST_SENTINEL;
        return;
    }

    let ar = if tree.chip_height > 1e-9 {
        (tree.chip_width / tree.chip_height).max(tree.chip_height / tree.chip_width)
    } else {
        1e9
    };
    let area_ar = tree.chip_area * (1.0 + aspect_penalty(ar));

    tree.inl = compute_inl(tree, catalog);
    tree.cost = AREA_AR_WEIGHT * area_ar + INL_WEIGHT * tree.inl;
}

/// Integral non-linearity of the name-ordered cumulative distance curve.
///
/// For each block, the squared distance from its centre to the chip centre
/// is taken; distances are ordered by block name, summed cumulatively, and
/// the cumulative curve is fitted by ordinary least squares over k = 1..n.
/// INL is the maximum absolute deviation from that fit.
pub fn compute_inl(tree: &FloorTree, catalog: &BlockCatalog) -> f64 {
    let center_x = tree.chip_width / 2.0;
    let center_y = tree.chip_height / 2.0;

    let mut dists: Vec<(&str, f64)> = tree
        .nodes
        .iter()
        .map(|node| {
            let dx = node.x + node.width / 2.0 - center_x;
            let dy = node.y + node.height / 2.0 - center_y;
            (catalog.get(node.block).name.as_str(), dx * dx + dy * dy)
        })
        .collect();
    dists.sort_by(|a, b| compare_block_names(a.0, b.0));

    let n = dists.len();
    if n < 2 {
        return 0.0;
    }

    let mut cumulative = Vec::with_capacity(n);
    let mut sum = 0.0;
    for &(_, d) in &dists {
        sum += d;
        cumulative.push(sum);
    }

    let mut sum_k = 0.0;
    let mut sum_s = 0.0;
    let mut sum_ks = 0.0;
    let mut sum_k2 = 0.0;
    for (i, &s) in cumulative.iter().enumerate() {
        let k = (i + 1) as f64;
        sum_k += k;
        sum_s += s;
        sum_ks += k * s;
        sum_k2 += k * k;
    }

    let den = n as f64 * sum_k2 - sum_k * sum_k;
    if den.abs() < 1e-9 {
        return 0.0;
    }
    let slope = (n as f64 * sum_ks - sum_k * sum_s) / den;
    let intercept = (sum_s - slope * sum_k) / n as f64;

    cumulative
        .iter()
        .enumerate()
        .map(|(i, &s)| (s - (slope * (i + 1) as f64 + intercept)).abs())
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::pack;
    use crate::tree::FloorTree;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Cursor;

    fn catalog(input: &str) -> BlockCatalog {
        BlockCatalog::from_reader(Cursor::new(input)).unwrap()
    }

    #[test]
    fn test_aspect_penalty_shape() {
        assert_eq!(aspect_penalty(1.0), 0.0);
        assert_eq!(aspect_penalty(0.5), 0.0);
        assert_eq!(aspect_penalty(2.0), 0.0);
        assert!((aspect_penalty(0.25) - 0.5).abs() < 1e-12);
        assert!((aspect_penalty(10.0) - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_block_has_zero_inl() {
        let catalog = catalog("M1 (10 20 1 1)\n");
        let mut rng = StdRng::seed_from_u64(0);
        let mut tree = FloorTree::random(&catalog, &mut rng);
        pack(&mut tree);
        evaluate(&mut tree, &catalog);

        assert_eq!(tree.inl, 0.0);
        // AR = 2 exactly, no penalty: cost = 0.8 * 200.
        assert!((tree.cost - 160.0).abs() < 1e-9);
    }

    #[test]
    fn test_two_blocks_inl_exact_fit() {
        // Two points are fitted exactly, so the deviation is zero.
        let catalog = catalog("A1 (10 10 1 1)\nA2 (10 10 1 1)\n");
        let mut rng = StdRng::seed_from_u64(0);
        let mut tree = FloorTree::random(&catalog, &mut rng);
        pack(&mut tree);
        evaluate(&mut tree, &catalog);

        assert_eq!(tree.chip_area, 200.0);
        assert!(tree.inl.abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_area_gets_sentinel() {
        let catalog = BlockCatalog::default();
        let mut rng = StdRng::seed_from_u64(0);
        let mut tree = FloorTree::random(&catalog, &mut rng);
        pack(&mut tree);
        evaluate(&mut tree, &catalog);
        assert_eq!(tree.cost, COST_SENTINEL);
        assert_eq!(tree.inl, 0.0);
    }

    #[test]
    fn test_tall_thin_chip_pays_aspect_penalty() {
        // Three stacked 10-wide blocks force a 10 x 100 chip: AR = 10,
        // f(AR) = 8, area_ar = 1000 * 9 = 9000.
        let catalog = catalog("S1 (10 40 1 1)\nS2 (10 30 1 1)\nS3 (10 30 1 1)\n");
        let mut rng = StdRng::seed_from_u64(0);
        let mut tree = FloorTree::random(&catalog, &mut rng);
        // Chain as right children: every node stacks on its parent.
        tree.nodes[0].left = None;
        tree.nodes[0].right = Some(1);
        tree.nodes[1].left = None;
        tree.nodes[1].right = Some(2);
        tree.nodes[2].left = None;
        pack(&mut tree);
        evaluate(&mut tree, &catalog);

        assert_eq!(tree.chip_width, 10.0);
        assert_eq!(tree.chip_height, 100.0);
        let expected = 0.8 * 9000.0 + 0.2 * tree.inl;
        assert!((tree.cost - expected).abs() < 1e-9);
    }

    #[test]
    fn test_inl_uses_numeric_name_order() {
        // Eleven unit blocks in a row. A lexicographic ordering would put
        // MM10 before MM2 and change the cumulative curve.
        let input: String = (1..=11).map(|i| format!("MM{i} (1 1 1 1)\n")).collect();
        let catalog = catalog(&input);
        let mut rng = StdRng::seed_from_u64(0);
        let mut tree = FloorTree::random(&catalog, &mut rng);
        pack(&mut tree);

        // Squared distances in numeric name order: block MMk sits at the
        // node whose block index is k-1.
        let cx = tree.chip_width / 2.0;
        let cy = tree.chip_height / 2.0;
        let mut by_block = vec![0.0; 11];
        for node in &tree.nodes {
            let dx = node.x + node.width / 2.0 - cx;
            let dy = node.y + node.height / 2.0 - cy;
            by_block[node.block] = dx * dx + dy * dy;
        }
        let mut cumulative = Vec::new();
        let mut sum = 0.0;
        for d in by_block {
            sum += d;
            cumulative.push(sum);
        }
        let n = cumulative.len() as f64;
        let sum_k: f64 = (1..=11).map(|k| k as f64).sum();
        let sum_s: f64 = cumulative.iter().sum();
        let sum_ks: f64 = cumulative
            .iter()
            .enumerate()
            .map(|(i, s)| (i + 1) as f64 * s)
            .sum();
        let sum_k2: f64 = (1..=11).map(|k| (k * k) as f64).sum();
        let den = n * sum_k2 - sum_k * sum_k;
        let a = (n * sum_ks - sum_k * sum_s) / den;
        let b = (sum_s - a * sum_k) / n;
        let expected = cumulative
            .iter()
            .enumerate()
            .map(|(i, s)| (s - (a * (i + 1) as f64 + b)).abs())
            .fold(0.0, f64::max);

        assert!((compute_inl(&tree, &catalog) - expected).abs() < 1e-9);
    }
}

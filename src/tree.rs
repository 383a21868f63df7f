// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! Level-order indexing arithmetic for the full binary tree of buckets.
//!
//! Root is index `0`; node `i`'s children are `2i+1` and `2i+2`; leaf `ℓ`
//! (`0 <= ℓ < num_leaves`) sits at index `num_leaves - 1 + ℓ`.

use rand::{CryptoRng, Rng, RngCore};

/// A leaf identifier in `0..num_leaves`, as distinct from a node index.
pub type Leaf = usize;

/// Derived tree shape for a given block capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tree {
    /// `ceil(log2(num_blocks))`.
    pub height: u32,
    /// `2^height`.
    pub num_leaves: usize,
    /// `2 * num_leaves - 1`.
    pub num_nodes: usize,
}

impl Tree {
    /// Derives the tree shape that holds at least `num_blocks` leaves.
    pub fn for_capacity(num_blocks: usize) -> Self {
        debug_assert!(num_blocks >= 1);
        let height = (num_blocks as f64).log2().ceil() as u32;
        let num_leaves = 1usize << height;
        Self {
            height,
            num_leaves,
            num_nodes: 2 * num_leaves - 1,
        }
    }

    /// The node index of leaf `leaf`.
    fn leaf_node_index(&self, leaf: Leaf) -> usize {
        self.num_leaves - 1 + leaf
    }

    /// The root-to-leaf path for `leaf`, as a list of `height + 1` node
    /// indices, root first.
    pub fn path(&self, leaf: Leaf) -> Vec<usize> {
        let mut node = self.leaf_node_index(leaf);
        let mut path = vec![node];
        while node != 0 {
            node = (node - 1) / 2;
            path.push(node);
        }
        path.reverse();
        path
    }

    /// Draws a uniformly random leaf in `0..num_leaves`.
    pub fn random_leaf<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Leaf {
        rng.gen_range(0..self.num_leaves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn single_block_tree_is_a_single_root_bucket() {
        let tree = Tree::for_capacity(1);
        assert_eq!(tree.height, 0);
        assert_eq!(tree.num_leaves, 1);
        assert_eq!(tree.num_nodes, 1);
        assert_eq!(tree.path(0), vec![0]);
    }

    #[test]
    fn pads_non_power_of_two_capacity_up() {
        let tree = Tree::for_capacity(5);
        assert_eq!(tree.num_leaves, 8);
        assert_eq!(tree.height, 3);
        assert_eq!(tree.num_nodes, 15);
    }

    #[test]
    fn path_is_root_first_and_leaf_last() {
        let tree = Tree::for_capacity(16);
        let path = tree.path(0);
        assert_eq!(path.first(), Some(&0));
        assert_eq!(path.last(), Some(&(tree.num_leaves - 1)));
        assert_eq!(path.len(), tree.height as usize + 1);
    }

    #[test]
    fn children_indices_match_level_order_convention() {
        let tree = Tree::for_capacity(16);
        // Every non-root node on any path must be 2*parent+1 or 2*parent+2.
        for leaf in 0..tree.num_leaves {
            let path = tree.path(leaf);
            for window in path.windows(2) {
                let (parent, child) = (window[0], window[1]);
                assert!(child == 2 * parent + 1 || child == 2 * parent + 2);
            }
        }
    }

    #[test]
    fn random_leaf_stays_in_range() {
        let tree = Tree::for_capacity(64);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            assert!(tree.random_leaf(&mut rng) < tree.num_leaves);
        }
    }
}

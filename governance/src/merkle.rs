//! Transaction merkle roots.
//!
//! Leaves are transaction hashes. Each level pairs adjacent nodes left to right and
//! hashes them as `sha256(sha256(left ‖ right))`. A level with an odd number of nodes
//! carries its last node up unpaired. The root of no leaves is the all-zero digest and
//! the root of a single leaf is that leaf.

use vigil_cryptography::{hash, sha256::Digest, Hasher, Sha256};

/// Computes the root over `leaves`, in order.
pub fn root(leaves: &[Digest]) -> Digest {
    let mut builder = Builder::new(leaves.len());
    for leaf in leaves {
        builder.add(leaf);
    }
    builder.build()
}

/// Accumulates leaves and computes their root.
pub struct Builder {
    hasher: Sha256,
    leaves: Vec<Digest>,
}

impl Builder {
    /// Creates a builder expecting roughly `capacity` leaves.
    pub fn new(capacity: usize) -> Self {
        Self {
            hasher: Sha256::new(),
            leaves: Vec::with_capacity(capacity),
        }
    }

    /// Adds a leaf, returning its position.
    pub fn add(&mut self, leaf: &Digest) -> usize {
        self.leaves.push(*leaf);
        self.leaves.len() - 1
    }

    /// Computes the root.
    pub fn build(mut self) -> Digest {
        if self.leaves.is_empty() {
            return Digest::zero();
        }
        let mut level = std::mem::take(&mut self.leaves);
        while level.len() > 1 {
            let mut next = Vec::with_capacity(level.len().div_ceil(2));
            for pair in level.chunks(2) {
                match pair {
                    [left, right] => next.push(self.node(left, right)),
                    [odd] => next.push(*odd),
                    _ => unreachable!("chunks yields one or two nodes"),
                }
            }
            level = next;
        }
        level[0]
    }

    fn node(&mut self, left: &Digest, right: &Digest) -> Digest {
        self.hasher.update(left);
        self.hasher.update(right);
        let inner = self.hasher.finalize();
        hash(&inner)
    }
}

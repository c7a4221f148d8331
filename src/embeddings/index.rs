//! Vector index for nearest neighbor search
//!
//! Flat index over squared Euclidean distance. Positions are assigned in
//! insertion order, so position `i` is the `i`-th vector passed to `build`.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use thiserror::Error;

/// Failure while building or querying the index
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("vector dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// A search hit
#[derive(Debug, Clone, Copy)]
pub struct Neighbor {
    /// Position of the matched vector in build order
    pub position: usize,
    /// Squared Euclidean distance to the query
    pub distance: f32,
}

// Equality must agree with `Ord`, which compares distances with `total_cmp`
impl PartialEq for Neighbor {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Neighbor {}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Neighbor {
    // Nearer first, then lower position. The heap in `search` is a max-heap,
    // so its top is always the worst hit kept so far.
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.position.cmp(&other.position))
    }
}

/// Vector index for nearest neighbor search
#[derive(Debug, Clone)]
pub struct VectorIndex {
    /// Embedding vectors (flattened)
    vectors: Vec<f32>,
    /// Dimensions per vector
    dimensions: usize,
}

impl VectorIndex {
    /// Create a new empty index
    pub fn new(dimensions: usize) -> Self {
        Self {
            vectors: Vec::new(),
            dimensions,
        }
    }

    /// Build an index from vectors, in order
    pub fn build(dimensions: usize, vectors: &[Vec<f32>]) -> Result<Self, IndexError> {
        let mut index = Self::new(dimensions);
        index.vectors.reserve(vectors.len() * dimensions);
        for vector in vectors {
            index.add(vector)?;
        }
        Ok(index)
    }

    /// Get the number of vectors in the index
    pub fn len(&self) -> usize {
        if self.dimensions == 0 {
            0
        } else {
            self.vectors.len() / self.dimensions
        }
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Get the dimensions of vectors in this index
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Append a vector; its position is the previous `len()`
    pub fn add(&mut self, vector: &[f32]) -> Result<usize, IndexError> {
        if vector.len() != self.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimensions,
                got: vector.len(),
            });
        }

        let position = self.len();
        self.vectors.extend_from_slice(vector);
        Ok(position)
    }

    /// Search for the k nearest neighbors, nearest first
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError> {
        if query.len() != self.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimensions,
                got: query.len(),
            });
        }
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut heap: BinaryHeap<Neighbor> = BinaryHeap::with_capacity(k + 1);

        for (position, vec) in self.vectors.chunks_exact(self.dimensions).enumerate() {
            let candidate = Neighbor {
                position,
                distance: squared_euclidean(query, vec),
            };

            if heap.len() < k {
                heap.push(candidate);
            } else if let Some(worst) = heap.peek() {
                if candidate < *worst {
                    heap.pop();
                    heap.push(candidate);
                }
            }
        }

        Ok(heap.into_sorted_vec())
    }

    /// Get index size in bytes (approximate)
    pub fn size_bytes(&self) -> u64 {
        (self.vectors.len() * std::mem::size_of::<f32>()) as u64
    }
}

/// Squared Euclidean distance between equal-length vectors
pub fn squared_euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn random_vector(dim: usize, seed: u64) -> Vec<f32> {
        let mut v = vec![0.0; dim];
        let mut state = seed;
        for x in &mut v {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            *x = ((state as f32) / (u64::MAX as f32)) * 2.0 - 1.0;
        }
        v
    }

    #[test]
    fn test_build_and_search() {
        let index = VectorIndex::build(4, &[
            vec![1.0, 0.0, 0.0, 0.0],
            vec![0.9, 0.1, 0.0, 0.0],
            vec![0.0, 1.0, 0.0, 0.0],
        ]).unwrap();

        let results = index.search(&[1.0, 0.0, 0.0, 0.0], 2).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].position, 0); // Exact match
        assert_eq!(results[0].distance, 0.0);
        assert_eq!(results[1].position, 1); // Close match
        assert!((results[1].distance - 0.02).abs() < 1e-6);
    }

    #[test]
    fn test_empty_index_returns_nothing() {
        let index = VectorIndex::new(3);
        assert!(index.search(&[0.0, 0.0, 0.0], 20).unwrap().is_empty());
    }

    #[test]
    fn test_k_larger_than_index() {
        let index = VectorIndex::build(2, &[vec![0.0, 0.0], vec![1.0, 1.0]]).unwrap();
        let results = index.search(&[0.0, 0.0], 20).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let index = VectorIndex::build(2, &[vec![0.0, 0.0]]).unwrap();
        let err = index.search(&[0.0, 0.0, 0.0], 1).unwrap_err();
        assert_eq!(err, IndexError::DimensionMismatch { expected: 2, got: 3 });
    }

    #[test]
    fn test_build_rejects_wrong_dimension() {
        let err = VectorIndex::build(2, &[vec![0.0, 0.0], vec![1.0]]).unwrap_err();
        assert_eq!(err, IndexError::DimensionMismatch { expected: 2, got: 1 });
    }

    #[test]
    fn test_ties_break_by_position() {
        let index = VectorIndex::build(1, &[vec![2.0], vec![0.0], vec![2.0]]).unwrap();
        let results = index.search(&[1.0], 3).unwrap();
        let positions: Vec<usize> = results.iter().map(|n| n.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn test_search_large() {
        let vectors: Vec<Vec<f32>> = (0..1000).map(|i| random_vector(64, i)).collect();
        let index = VectorIndex::build(64, &vectors).unwrap();
        assert_eq!(index.len(), 1000);

        let query = random_vector(64, 42);
        let results = index.search(&query, 10).unwrap();

        assert_eq!(results.len(), 10);
        for pair in results.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }

        // Matches a full scan
        let best = (0..vectors.len())
            .min_by(|&a, &b| {
                squared_euclidean(&query, &vectors[a])
                    .total_cmp(&squared_euclidean(&query, &vectors[b]))
            })
            .unwrap();
        assert_eq!(results[0].position, best);
    }

    #[test]
    fn test_neighbor_equality_matches_ordering() {
        let nan = Neighbor { position: 1, distance: f32::NAN };
        assert_eq!(nan, nan);
        assert_eq!(nan.cmp(&nan), Ordering::Equal);

        let zero = Neighbor { position: 1, distance: 0.0 };
        let neg_zero = Neighbor { position: 1, distance: -0.0 };
        assert_ne!(zero, neg_zero);
        assert_eq!(neg_zero.cmp(&zero), Ordering::Less);
    }
}

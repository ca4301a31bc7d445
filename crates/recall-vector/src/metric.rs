//! Distance metrics.
//!
//! A metric is fixed when an index is created; mixing metrics within
//! one index is not permitted. Distances order the proximity graph
//! internally (lower is closer); the public API converts them to
//! similarities in [0, 1] at the boundary.

use serde::{Deserialize, Serialize};

/// Distance metric for a vector index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    /// Cosine distance: `1 - cos(a, b)`
    Cosine,
    /// Euclidean (L2) distance
    Euclidean,
}

impl Metric {
    /// Distance between two vectors of equal dimension.
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Metric::Cosine => {
                let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
                let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
                let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
                if norm_a == 0.0 || norm_b == 0.0 {
                    // Zero vectors are maximally distant from everything
                    return 1.0;
                }
                1.0 - dot / (norm_a * norm_b)
            }
            Metric::Euclidean => a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt(),
        }
    }

    /// Convert a distance into a similarity in [0, 1], higher is better.
    pub fn similarity(&self, distance: f32) -> f32 {
        match self {
            Metric::Cosine => (1.0 - distance).clamp(0.0, 1.0),
            Metric::Euclidean => 1.0 / (1.0 + distance.max(0.0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_identical_vectors() {
        let d = Metric::Cosine.distance(&[1.0, 2.0], &[2.0, 4.0]);
        assert!(d.abs() < 1e-5);
        assert!((Metric::Cosine.similarity(d) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_cosine_orthogonal_vectors() {
        let d = Metric::Cosine.distance(&[1.0, 0.0], &[0.0, 1.0]);
        assert!((d - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_cosine_zero_vector() {
        let d = Metric::Cosine.distance(&[0.0, 0.0], &[1.0, 0.0]);
        assert_eq!(d, 1.0);
    }

    #[test]
    fn test_euclidean_distance() {
        let d = Metric::Euclidean.distance(&[0.0, 0.0], &[3.0, 4.0]);
        assert!((d - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_euclidean_similarity_decreasing() {
        let near = Metric::Euclidean.similarity(0.5);
        let far = Metric::Euclidean.similarity(5.0);
        assert!(near > far);
        assert!(near <= 1.0 && far > 0.0);
    }

    #[test]
    fn test_opposite_cosine_clamps_to_zero_similarity() {
        let d = Metric::Cosine.distance(&[1.0, 0.0], &[-1.0, 0.0]);
        assert!((d - 2.0).abs() < 1e-5);
        assert_eq!(Metric::Cosine.similarity(d), 0.0);
    }
}

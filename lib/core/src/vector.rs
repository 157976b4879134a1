use serde::{Deserialize, Serialize};

/// A dense embedding vector
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Vector {
    data: Vec<f32>,
}

impl Vector {
    #[inline]
    #[must_use]
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    #[inline]
    #[must_use]
    pub fn from_slice(data: &[f32]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Vec<f32> {
        self.data
    }

    /// Euclidean norm
    #[inline]
    pub fn norm(&self) -> f32 {
        dot(&self.data, &self.data).sqrt() as f32
    }

    /// Compute cosine similarity with another vector.
    ///
    /// Mismatched dimensions and zero-magnitude vectors score 0.0; callers that
    /// need to reject mismatches check `dim()` first.
    #[inline]
    pub fn cosine_similarity(&self, other: &Vector) -> f32 {
        if self.dim() != other.dim() {
            return 0.0;
        }

        // accumulated in f64: f32 squares of large or tiny entries overflow or vanish
        let norm_a = dot(&self.data, &self.data).sqrt();
        let norm_b = dot(&other.data, &other.data).sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        let similarity = dot(&self.data, &other.data) / (norm_a * norm_b);
        // rounding can push parallel vectors a hair past 1.0
        (similarity as f32).clamp(-1.0, 1.0)
    }
}

impl From<Vec<f32>> for Vector {
    fn from(data: Vec<f32>) -> Self {
        Self::new(data)
    }
}

#[inline]
fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| f64::from(x) * f64::from(y))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let v1 = Vector::new(vec![1.0, 0.0]);
        let v2 = Vector::new(vec![1.0, 0.0]);
        assert!((v1.cosine_similarity(&v2) - 1.0).abs() < 1e-6);

        let v3 = Vector::new(vec![1.0, 0.0]);
        let v4 = Vector::new(vec![0.0, 1.0]);
        assert!((v3.cosine_similarity(&v4) - 0.0).abs() < 1e-6);

        let v5 = Vector::new(vec![-1.0, 0.0]);
        assert!((v1.cosine_similarity(&v5) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_scores_zero() {
        let zero = Vector::new(vec![0.0, 0.0]);
        let v = Vector::new(vec![0.3, 0.4]);
        assert_eq!(zero.cosine_similarity(&v), 0.0);
    }

    #[test]
    fn test_extreme_magnitudes_stay_exact() {
        let huge = Vector::new(vec![1e20, 1e20]);
        assert!((huge.cosine_similarity(&huge) - 1.0).abs() < 1e-6);

        let tiny = Vector::new(vec![1e-25, 1e-25]);
        assert!((tiny.cosine_similarity(&tiny) - 1.0).abs() < 1e-6);

        let unit = Vector::new(vec![1.0, 0.0]);
        let parallel = Vector::new(vec![1e20, 0.0]);
        assert!((unit.cosine_similarity(&parallel) - 1.0).abs() < 1e-6);
        assert!((huge.norm() - 1.414_213_6e20).abs() < 1e14);
    }

    #[test]
    fn test_norm() {
        let v = Vector::new(vec![3.0, 4.0]);
        assert!((v.norm() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let v = Vector::new(vec![0.5, -0.25]);
        assert_eq!(serde_json::to_string(&v).unwrap(), "[0.5,-0.25]");
        let back: Vector = serde_json::from_str("[0.5,-0.25]").unwrap();
        assert_eq!(back, v);
    }
}

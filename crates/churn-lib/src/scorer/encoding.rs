//! Trained preprocessing applied before every estimator
//!
//! Mirrors the column transformer the models were fitted with: numeric
//! columns min-max scaled, categorical columns one-hot encoded, interaction
//! flags passed through unchanged at the end.

use crate::models::FeatureVector;
use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Min-max scaling parameters for one numeric column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMaxRange {
    pub min: f64,
    pub max: f64,
}

impl MinMaxRange {
    pub fn scale(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        // constant training column
        let span = if span == 0.0 { 1.0 } else { span };
        (value - self.min) / span
    }
}

/// One-hot vocabulary for one categorical column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryVocabulary {
    pub column: String,
    pub categories: Vec<String>,
    #[serde(default)]
    pub drop_first: bool,
}

impl CategoryVocabulary {
    pub fn width(&self) -> usize {
        self.categories.len() - usize::from(self.drop_first)
    }

    /// Unknown values and the dropped category encode as all zeros
    fn encode_into(&self, value: &str, out: &mut Vec<f64>) {
        let start = out.len();
        out.resize(start + self.width(), 0.0);

        let offset = usize::from(self.drop_first);
        if let Some(pos) = self.categories.iter().position(|c| c == value) {
            if pos >= offset {
                out[start + pos - offset] = 1.0;
            }
        }
    }
}

/// Preprocessing stage of a scorer artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessing {
    pub numeric: Vec<MinMaxRange>,
    pub categorical: Vec<CategoryVocabulary>,
}

impl Preprocessing {
    /// Check the stage against the feature vector layout
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.numeric.len() == FeatureVector::NUMERIC_COLUMNS.len(),
            "expected {} numeric ranges, found {}",
            FeatureVector::NUMERIC_COLUMNS.len(),
            self.numeric.len()
        );
        for (range, column) in self.numeric.iter().zip(FeatureVector::NUMERIC_COLUMNS) {
            ensure!(
                range.min.is_finite() && range.max.is_finite() && range.max >= range.min,
                "invalid range for '{}': [{}, {}]",
                column,
                range.min,
                range.max
            );
        }

        ensure!(
            self.categorical.len() == FeatureVector::CATEGORICAL_COLUMNS.len(),
            "expected {} categorical vocabularies, found {}",
            FeatureVector::CATEGORICAL_COLUMNS.len(),
            self.categorical.len()
        );
        for (vocab, column) in self.categorical.iter().zip(FeatureVector::CATEGORICAL_COLUMNS) {
            ensure!(
                vocab.column == column,
                "categorical column out of order: expected '{}', found '{}'",
                column,
                vocab.column
            );
            ensure!(!vocab.categories.is_empty(), "empty vocabulary for '{}'", column);
            let unique: HashSet<&str> = vocab.categories.iter().map(String::as_str).collect();
            ensure!(
                unique.len() == vocab.categories.len(),
                "duplicate categories for '{}'",
                column
            );
        }
        Ok(())
    }

    /// Length of the encoded vector
    pub fn width(&self) -> usize {
        self.numeric.len()
            + self.categorical.iter().map(CategoryVocabulary::width).sum::<usize>()
            + FeatureVector::INTERACTION_COLUMNS.len()
    }

    pub fn encode(&self, features: &FeatureVector) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.width());

        for (range, value) in self.numeric.iter().zip(features.numeric_values()) {
            out.push(range.scale(value));
        }
        for (vocab, value) in self.categorical.iter().zip(features.categorical_values()) {
            vocab.encode_into(value, &mut out);
        }
        out.extend(features.interaction_flags().iter().map(|&f| f as f64));

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::fixtures::{sample_features, sample_preprocessing};

    #[test]
    fn test_sample_preprocessing_is_valid() {
        let prep = sample_preprocessing();
        prep.validate().unwrap();
        assert_eq!(prep.width(), 16);
    }

    #[test]
    fn test_encoding_layout() {
        let prep = sample_preprocessing();
        let encoded = prep.encode(&sample_features());
        assert_eq!(encoded.len(), prep.width());

        // age 30 in [10, 60]
        assert!((encoded[0] - 0.4).abs() < 1e-12);
        // listening_time 5 in [0, 100]
        assert!((encoded[1] - 0.05).abs() < 1e-12);
        // songs 10 in [0, 100]
        assert!((encoded[2] - 0.1).abs() < 1e-12);
        // skip_rate 0.9 in [0, 1]
        assert!((encoded[3] - 0.9).abs() < 1e-12);

        // gender Male: [Female dropped, Male, Other]
        assert_eq!(&encoded[4..6], &[1.0, 0.0]);
        // country US: [CA dropped, DE, US]
        assert_eq!(&encoded[6..8], &[0.0, 1.0]);
        // subscription Free: [Family dropped, Free, Premium, Student]
        assert_eq!(&encoded[8..11], &[1.0, 0.0, 0.0]);
        // device Mobile: [Desktop dropped, Mobile, Web]
        assert_eq!(&encoded[11..13], &[1.0, 0.0]);
        // interaction flags pass through
        assert_eq!(&encoded[13..16], &[1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_unknown_and_dropped_categories_encode_as_zero() {
        let prep = sample_preprocessing();
        let mut features = sample_features();
        features.country = "BR".to_string();
        assert_eq!(&prep.encode(&features)[6..8], &[0.0, 0.0]);

        features.country = "CA".to_string();
        assert_eq!(&prep.encode(&features)[6..8], &[0.0, 0.0]);
    }

    #[test]
    fn test_constant_column_scales_by_one() {
        let range = MinMaxRange { min: 3.0, max: 3.0 };
        assert_eq!(range.scale(5.0), 2.0);
    }

    #[test]
    fn test_validate_rejects_reordered_columns() {
        let mut prep = sample_preprocessing();
        prep.categorical.swap(0, 1);
        assert!(prep.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_missing_numeric_range() {
        let mut prep = sample_preprocessing();
        prep.numeric.pop();
        assert!(prep.validate().is_err());
    }
}

//! Categorical factorization with an explicit, reusable codebook

use crate::edibility::Verdict;
use crate::error::{LabError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::Serialize;
use std::collections::HashMap;

/// Token used for missing cells
pub const MISSING_TOKEN: &str = "";

/// Category-to-code mapping for one column, in first-occurrence order
#[derive(Debug, Clone, Serialize)]
pub struct ColumnCodebook {
    name: String,
    categories: Vec<String>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl ColumnCodebook {
    /// Assign codes 0, 1, 2, ... to distinct tokens in order of first appearance.
    pub fn fit<'a, I>(name: impl Into<String>, tokens: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut categories = Vec::new();
        let mut index = HashMap::new();
        for token in tokens {
            if !index.contains_key(token) {
                index.insert(token.to_string(), categories.len());
                categories.push(token.to_string());
            }
        }
        Self {
            name: name.into(),
            categories,
            index,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn code(&self, token: &str) -> Option<usize> {
        self.index.get(token).copied()
    }

    pub fn token(&self, code: usize) -> Option<&str> {
        self.categories.get(code).map(String::as_str)
    }
}

/// Numeric view of an upload: codes for every feature column and the label
#[derive(Debug, Clone)]
pub struct EncodedDataset {
    pub x: Array2<f64>,
    pub y: Array1<f64>,
    pub feature_names: Vec<String>,
}

impl EncodedDataset {
    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }
}

/// Encoder fitted once per upload; the same codebooks serve the training
/// split and the full-table prediction.
#[derive(Debug, Clone, Serialize)]
pub struct CategoricalEncoder {
    target: String,
    features: Vec<ColumnCodebook>,
    label: ColumnCodebook,
}

impl CategoricalEncoder {
    /// Fit codebooks for every column of `df`, using `target` as the label.
    pub fn fit(df: &DataFrame, target: &str) -> Result<Self> {
        if df.column(target).is_err() {
            return Err(LabError::InputValidation(format!(
                "target column '{}' not found",
                target
            )));
        }

        let mut features = Vec::with_capacity(df.width().saturating_sub(1));
        let mut label = None;

        for name in df.get_column_names() {
            let tokens = column_tokens(df, name.as_str())?;
            let codebook = ColumnCodebook::fit(name.as_str(), tokens.iter().map(String::as_str));
            if name.as_str() == target {
                label = Some(codebook);
            } else {
                features.push(codebook);
            }
        }

        let label = label.ok_or_else(|| {
            LabError::InputValidation(format!("target column '{}' not found", target))
        })?;

        Ok(Self {
            target: target.to_string(),
            features,
            label,
        })
    }

    /// Encode `df` with the fitted codebooks. Unseen tokens are rejected.
    pub fn transform(&self, df: &DataFrame) -> Result<EncodedDataset> {
        let n_rows = df.height();
        let n_features = self.features.len();
        let mut x = Array2::<f64>::zeros((n_rows, n_features));

        for (j, codebook) in self.features.iter().enumerate() {
            let tokens = column_tokens(df, codebook.name())?;
            for (i, token) in tokens.iter().enumerate() {
                x[[i, j]] = encode_token(codebook, token)? as f64;
            }
        }

        let label_tokens = column_tokens(df, &self.target)?;
        let y = label_tokens
            .iter()
            .map(|t| encode_token(&self.label, t).map(|c| c as f64))
            .collect::<Result<Vec<_>>>()?;

        Ok(EncodedDataset {
            x,
            y: Array1::from_vec(y),
            feature_names: self.feature_names(),
        })
    }

    pub fn fit_transform(df: &DataFrame, target: &str) -> Result<(Self, EncodedDataset)> {
        let encoder = Self::fit(df, target)?;
        let encoded = encoder.transform(df)?;
        Ok((encoder, encoded))
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.features.iter().map(|c| c.name().to_string()).collect()
    }

    pub fn feature_codebooks(&self) -> &[ColumnCodebook] {
        &self.features
    }

    pub fn label_codebook(&self) -> &ColumnCodebook {
        &self.label
    }

    pub fn n_classes(&self) -> usize {
        self.label.len()
    }

    /// Map a predicted label code to an edibility verdict.
    ///
    /// Label tokens `e`/`edible` and `p`/`poisonous` (any case) map directly.
    /// Any other label alphabet maps code 0 to Edible and everything else to
    /// Poisonous.
    pub fn verdict_for(&self, code: usize) -> Verdict {
        let token = self.label.token(code).map(|t| t.trim().to_ascii_lowercase());
        match token.as_deref() {
            Some("e") | Some("edible") => Verdict::Edible,
            Some("p") | Some("poisonous") => Verdict::Poisonous,
            _ if code == 0 => Verdict::Edible,
            _ => Verdict::Poisonous,
        }
    }
}

fn encode_token(codebook: &ColumnCodebook, token: &str) -> Result<usize> {
    codebook.code(token).ok_or_else(|| {
        LabError::InvalidInput(format!(
            "unseen category '{}' in column '{}'",
            token,
            codebook.name()
        ))
    })
}

/// Read a column as string tokens, mapping nulls to [`MISSING_TOKEN`].
pub fn column_tokens(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let column = df
        .column(name)
        .map_err(|_| LabError::InputValidation(format!("column '{}' not found", name)))?;
    let series = column.as_materialized_series().cast(&DataType::String)?;
    let ca = series.str()?;
    Ok(ca
        .into_iter()
        .map(|v| v.unwrap_or(MISSING_TOKEN).to_string())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_df() -> DataFrame {
        df! {
            "odor" => ["p", "a", "l", "p", "n"],
            "cap-color" => ["n", "y", "w", "w", "g"],
            "class" => ["p", "e", "e", "p", "e"],
        }
        .unwrap()
    }

    #[test]
    fn test_codebook_first_occurrence_order() {
        let cb = ColumnCodebook::fit("odor", ["p", "a", "l", "p", "n"]);
        assert_eq!(cb.categories(), &["p", "a", "l", "n"]);
        assert_eq!(cb.code("l"), Some(2));
        assert_eq!(cb.token(3), Some("n"));
        assert_eq!(cb.code("x"), None);
    }

    #[test]
    fn test_fit_transform() {
        let df = sample_df();
        let (encoder, data) = CategoricalEncoder::fit_transform(&df, "class").unwrap();
        assert_eq!(encoder.feature_names(), vec!["odor", "cap-color"]);
        assert_eq!(data.x.shape(), &[5, 2]);
        assert_eq!(data.x.column(0).to_vec(), vec![0.0, 1.0, 2.0, 0.0, 3.0]);
        assert_eq!(data.y.to_vec(), vec![0.0, 1.0, 1.0, 0.0, 1.0]);
        assert_eq!(encoder.n_classes(), 2);
    }

    #[test]
    fn test_verdict_follows_label_token() {
        let df = sample_df();
        let encoder = CategoricalEncoder::fit(&df, "class").unwrap();
        // "p" appears first, so code 0 is poisonous here.
        assert_eq!(encoder.verdict_for(0), Verdict::Poisonous);
        assert_eq!(encoder.verdict_for(1), Verdict::Edible);
    }

    #[test]
    fn test_verdict_for_unknown_alphabet() {
        let df = df! {
            "f" => ["a", "b", "c"],
            "label" => ["yes", "no", "yes"],
        }
        .unwrap();
        let encoder = CategoricalEncoder::fit(&df, "label").unwrap();
        assert_eq!(encoder.verdict_for(0), Verdict::Edible);
        assert_eq!(encoder.verdict_for(1), Verdict::Poisonous);
    }

    #[test]
    fn test_missing_cells_are_a_category() {
        let df = df! {
            "f" => [Some("a"), None, Some("a"), None],
            "class" => ["e", "p", "e", "p"],
        }
        .unwrap();
        let (encoder, data) = CategoricalEncoder::fit_transform(&df, "class").unwrap();
        assert_eq!(encoder.feature_codebooks()[0].categories(), &["a", ""]);
        assert_eq!(data.x.column(0).to_vec(), vec![0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_unseen_token_rejected() {
        let encoder = CategoricalEncoder::fit(&sample_df(), "class").unwrap();
        let other = df! {
            "odor" => ["s"],
            "cap-color" => ["n"],
            "class" => ["p"],
        }
        .unwrap();
        assert!(matches!(
            encoder.transform(&other),
            Err(LabError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_missing_target() {
        assert!(matches!(
            CategoricalEncoder::fit(&sample_df(), "type"),
            Err(LabError::InputValidation(_))
        ));
    }
}

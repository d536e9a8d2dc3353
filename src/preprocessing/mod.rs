//! Data preprocessing module
//!
//! Turns an uploaded all-string table into model inputs:
//! - Target column resolution by name priority with a last-column fallback
//! - Categorical factorization through a codebook fitted once per upload
//! - Deterministic, seeded 70/30 train/test split

mod encoder;
mod split;
mod target;

pub use encoder::{column_tokens, CategoricalEncoder, ColumnCodebook, EncodedDataset, MISSING_TOKEN};
pub use split::{TrainTestSplit, DEFAULT_TEST_FRACTION};
pub use target::{resolve_target, TargetResolution, TARGET_PRIORITY};

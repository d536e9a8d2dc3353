//! Model evaluation
//!
//! Scalar metrics for the held-out split plus opt-in diagnostic charts
//! (confusion matrix, ROC, precision-recall and threshold sweeps).

pub mod curves;
pub mod diagnostics;
pub mod metrics;

pub use curves::{
    auc, f1_threshold_curve, precision_recall_curve, recall_threshold_curve, roc_curve,
    PrecisionRecallCurve, RocCurve, ThresholdCurve,
};
pub use diagnostics::{
    compute_diagnostics, Diagnostic, DiagnosticChart, DiagnosticInputs, DiagnosticsOutcome,
    MetricNotice,
};
pub use metrics::{round2, Averaging, ClassificationMetrics, ConfusionMatrix};

//! Rule-based edibility checker
//!
//! A fixed decision list over six categorical attributes. Explainable and
//! deterministic; when no rule applies the verdict defaults to poisonous.

pub mod features;
pub mod rules;

pub use features::{
    Bruises, CapColor, CapShape, CapSurface, CategoricalFeature, GillColor, MushroomFeatureSet,
    Odor,
};
pub use rules::{classify, decision_list, Classification, DecidedBy, Rule, RuleId, Verdict};

use crate::error::Result;

/// Parse six raw tokens (dataset codes or labels) and classify them.
pub fn classify_codes(
    odor: &str,
    bruises: &str,
    gill_color: &str,
    cap_shape: &str,
    cap_surface: &str,
    cap_color: &str,
) -> Result<Classification> {
    let features =
        MushroomFeatureSet::from_tokens(odor, bruises, gill_color, cap_shape, cap_surface, cap_color)?;
    let result = classify(&features);
    tracing::debug!(
        %features,
        verdict = %result.verdict,
        fallback = result.is_fallback(),
        "Classified mushroom"
    );
    Ok(result)
}

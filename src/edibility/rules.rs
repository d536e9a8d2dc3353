//! Ordered decision list for edibility verdicts.
//!
//! Rules are evaluated top to bottom and the first match decides. The order
//! is significant: several inputs satisfy more than one antecedent (an
//! odorless mushroom with buff gills and a smooth convex cap matches rules
//! 3 and 5), and rule 1 must pre-empt every edible rule.

use super::features::{
    Bruises, CapColor, CapShape, CapSurface, GillColor, MushroomFeatureSet, Odor,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Edibility verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Edible,
    Poisonous,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Edible => "Edible",
            Verdict::Poisonous => "Poisonous",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of an explicit rule in the decision list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    OffensiveOdor,
    OdorlessBruisedPaleCap,
    OdorlessPaleGills,
    AlmondPaleGills,
    OdorlessSmoothRoundCap,
    UnbruisedRoughPointedCap,
}

/// What produced a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "rule", rename_all = "snake_case")]
pub enum DecidedBy {
    /// An explicit rule matched
    Rule(RuleId),
    /// Nothing matched; the fail-safe default applied
    FallbackDefault,
}

/// Result of running the decision list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub verdict: Verdict,
    pub decided_by: DecidedBy,
}

impl Classification {
    pub fn is_fallback(&self) -> bool {
        self.decided_by == DecidedBy::FallbackDefault
    }
}

/// A single (predicate, verdict) entry
pub struct Rule {
    pub id: RuleId,
    pub description: &'static str,
    pub verdict: Verdict,
    predicate: fn(&MushroomFeatureSet) -> bool,
}

impl Rule {
    pub fn matches(&self, features: &MushroomFeatureSet) -> bool {
        (self.predicate)(features)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("verdict", &self.verdict)
            .finish()
    }
}

/// Verdict used when no rule matches
pub const DEFAULT_VERDICT: Verdict = Verdict::Poisonous;

fn offensive_odor(f: &MushroomFeatureSet) -> bool {
    matches!(
        f.odor,
        Odor::Foul | Odor::Fishy | Odor::Creosote | Odor::Musty | Odor::Pungent | Odor::Spicy
    )
}

fn pale_gills(gill_color: GillColor) -> bool {
    matches!(gill_color, GillColor::Buff | GillColor::Pink | GillColor::Purple)
}

fn odorless_bruised_pale_cap(f: &MushroomFeatureSet) -> bool {
    f.odor == Odor::None
        && f.bruises == Bruises::Yes
        && matches!(f.cap_color, CapColor::White | CapColor::Gray | CapColor::Brown)
}

fn odorless_pale_gills(f: &MushroomFeatureSet) -> bool {
    f.odor == Odor::None && pale_gills(f.gill_color)
}

fn almond_pale_gills(f: &MushroomFeatureSet) -> bool {
    f.odor == Odor::Almond && pale_gills(f.gill_color)
}

fn odorless_smooth_round_cap(f: &MushroomFeatureSet) -> bool {
    f.odor == Odor::None
        && matches!(f.cap_shape, CapShape::Convex | CapShape::Flat)
        && f.cap_surface == CapSurface::Smooth
}

fn unbruised_rough_pointed_cap(f: &MushroomFeatureSet) -> bool {
    f.bruises == Bruises::No
        && matches!(f.cap_shape, CapShape::Bell | CapShape::Conical)
        && matches!(f.cap_surface, CapSurface::Scaly | CapSurface::Fibrous)
}

static DECISION_LIST: [Rule; 6] = [
    Rule {
        id: RuleId::OffensiveOdor,
        description: "odor is foul, fishy, creosote, musty, pungent or spicy",
        verdict: Verdict::Poisonous,
        predicate: offensive_odor,
    },
    Rule {
        id: RuleId::OdorlessBruisedPaleCap,
        description: "no odor, bruises, cap white, gray or brown",
        verdict: Verdict::Edible,
        predicate: odorless_bruised_pale_cap,
    },
    Rule {
        id: RuleId::OdorlessPaleGills,
        description: "no odor, gills buff, pink or purple",
        verdict: Verdict::Edible,
        predicate: odorless_pale_gills,
    },
    Rule {
        id: RuleId::AlmondPaleGills,
        description: "almond odor, gills buff, pink or purple",
        verdict: Verdict::Edible,
        predicate: almond_pale_gills,
    },
    Rule {
        id: RuleId::OdorlessSmoothRoundCap,
        description: "no odor, convex or flat cap with smooth surface",
        verdict: Verdict::Edible,
        predicate: odorless_smooth_round_cap,
    },
    Rule {
        id: RuleId::UnbruisedRoughPointedCap,
        description: "no bruises, bell or conical cap with scaly or fibrous surface",
        verdict: Verdict::Poisonous,
        predicate: unbruised_rough_pointed_cap,
    },
];

/// The ordered rules, first entry evaluated first.
pub fn decision_list() -> &'static [Rule] {
    &DECISION_LIST
}

/// Run the decision list. Never fails; unmatched inputs get the default.
pub fn classify(features: &MushroomFeatureSet) -> Classification {
    decision_list()
        .iter()
        .find(|rule| rule.matches(features))
        .map(|rule| Classification {
            verdict: rule.verdict,
            decided_by: DecidedBy::Rule(rule.id),
        })
        .unwrap_or(Classification {
            verdict: DEFAULT_VERDICT,
            decided_by: DecidedBy::FallbackDefault,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(
        odor: Odor,
        bruises: Bruises,
        gill_color: GillColor,
        cap_shape: CapShape,
        cap_surface: CapSurface,
        cap_color: CapColor,
    ) -> MushroomFeatureSet {
        MushroomFeatureSet::new(odor, bruises, gill_color, cap_shape, cap_surface, cap_color)
    }

    #[test]
    fn test_rule_order_is_fixed() {
        let ids: Vec<RuleId> = decision_list().iter().map(|r| r.id).collect();
        assert_eq!(
            ids,
            vec![
                RuleId::OffensiveOdor,
                RuleId::OdorlessBruisedPaleCap,
                RuleId::OdorlessPaleGills,
                RuleId::AlmondPaleGills,
                RuleId::OdorlessSmoothRoundCap,
                RuleId::UnbruisedRoughPointedCap,
            ]
        );
    }

    #[test]
    fn test_overlapping_antecedents_take_first_rule() {
        // Matches rules 2, 3 and 5; rule 2 is listed first.
        let f = features(
            Odor::None,
            Bruises::Yes,
            GillColor::Buff,
            CapShape::Convex,
            CapSurface::Smooth,
            CapColor::White,
        );
        let result = classify(&f);
        assert_eq!(result.verdict, Verdict::Edible);
        assert_eq!(result.decided_by, DecidedBy::Rule(RuleId::OdorlessBruisedPaleCap));
    }

    #[test]
    fn test_smooth_round_cap_rule() {
        let f = features(
            Odor::None,
            Bruises::No,
            GillColor::Black,
            CapShape::Flat,
            CapSurface::Smooth,
            CapColor::Red,
        );
        let result = classify(&f);
        assert_eq!(result.decided_by, DecidedBy::Rule(RuleId::OdorlessSmoothRoundCap));
        assert_eq!(result.verdict, Verdict::Edible);
    }

    #[test]
    fn test_rough_pointed_cap_rule() {
        let f = features(
            Odor::Anise,
            Bruises::No,
            GillColor::Black,
            CapShape::Conical,
            CapSurface::Scaly,
            CapColor::Yellow,
        );
        let result = classify(&f);
        assert_eq!(result.decided_by, DecidedBy::Rule(RuleId::UnbruisedRoughPointedCap));
        assert_eq!(result.verdict, Verdict::Poisonous);
        assert!(!result.is_fallback());
    }

    #[test]
    fn test_fallback_is_distinct_from_rule_one() {
        let fallback = classify(&features(
            Odor::Anise,
            Bruises::Yes,
            GillColor::Green,
            CapShape::Sunken,
            CapSurface::Grooves,
            CapColor::Green,
        ));
        let rule_one = classify(&features(
            Odor::Foul,
            Bruises::Yes,
            GillColor::Green,
            CapShape::Sunken,
            CapSurface::Grooves,
            CapColor::Green,
        ));
        assert_eq!(fallback.verdict, rule_one.verdict);
        assert!(fallback.is_fallback());
        assert_eq!(rule_one.decided_by, DecidedBy::Rule(RuleId::OffensiveOdor));
    }

    #[test]
    fn test_verdict_display() {
        assert_eq!(Verdict::Edible.to_string(), "Edible");
        assert_eq!(Verdict::Poisonous.as_str(), "Poisonous");
    }
}

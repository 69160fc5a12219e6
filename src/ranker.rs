use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use crate::config::{ScoringConfig, SignalWeights};
use crate::error::{Result, ScoringError};
use crate::types::{RankedClassification, Signal, Subject, SurpriseScore};

/// `Σ weight[signal] * components[signal]`. Missing components count as 0.
pub fn weighted_score(components: &BTreeMap<Signal, f64>, weights: &SignalWeights) -> f64 {
    Signal::ALL
        .iter()
        .map(|s| weights.get(*s) * components.get(s).copied().unwrap_or(0.0))
        .sum()
}

/// Breakout order: higher score first, then higher positions gained, then
/// identifier, then driver before team.
pub fn breakout_order(a: &SurpriseScore, b: &SurpriseScore) -> Ordering {
    b.weighted_score
        .total_cmp(&a.weighted_score)
        .then_with(|| {
            b.component(Signal::PositionsGained)
                .total_cmp(&a.component(Signal::PositionsGained))
        })
        .then_with(|| a.subject_id.cmp(&b.subject_id))
        .then_with(|| a.subject_kind.cmp(&b.subject_kind))
}

/// Bust order: lower score first, then lower positions gained, then
/// identifier, then driver before team.
pub fn bust_order(a: &SurpriseScore, b: &SurpriseScore) -> Ordering {
    a.weighted_score
        .total_cmp(&b.weighted_score)
        .then_with(|| {
            a.component(Signal::PositionsGained)
                .total_cmp(&b.component(Signal::PositionsGained))
        })
        .then_with(|| a.subject_id.cmp(&b.subject_id))
        .then_with(|| a.subject_kind.cmp(&b.subject_kind))
}

/// Ranks drivers and teams together and picks the top-N breakouts and
/// bottom-N busts.
///
/// With fewer than `2 * N` subjects both sets shrink to `total / 2` so they
/// can never overlap.
pub fn rank_surprise(
    event_id: &str,
    scores: &[SurpriseScore],
    cfg: &ScoringConfig,
) -> Result<RankedClassification> {
    if scores.is_empty() {
        return Err(ScoringError::EmptyInput);
    }

    let size = cfg.classification_size.min(scores.len() / 2);
    if size < cfg.classification_size {
        tracing::info!(
            event = event_id,
            subjects = scores.len(),
            configured = cfg.classification_size,
            effective = size,
            "shrinking classification to fit the field"
        );
    }

    let mut by_breakout: Vec<&SurpriseScore> = scores.iter().collect();
    by_breakout.sort_by(|a, b| breakout_order(a, b));
    let breakouts: Vec<Subject> = by_breakout.iter().take(size).map(|s| s.subject()).collect();

    // Skipping chosen breakouts keeps the sets disjoint even when every
    // score and tie-break component is equal.
    let taken: HashSet<&Subject> = breakouts.iter().collect();
    let mut by_bust: Vec<&SurpriseScore> = scores.iter().collect();
    by_bust.sort_by(|a, b| bust_order(a, b));
    let busts: Vec<Subject> = by_bust
        .iter()
        .map(|s| s.subject())
        .filter(|s| !taken.contains(s))
        .take(size)
        .collect();

    Ok(RankedClassification {
        event_id: event_id.to_string(),
        breakouts,
        busts,
    })
}

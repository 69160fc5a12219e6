use serde::{Deserialize, Serialize};

use crate::award::calculate_award;
use crate::config::ScoringConfig;
use crate::error::{Result, ScoringError};
use crate::grader::{chaser_of, grade_prediction};
use crate::ranker::rank_surprise;
use crate::signals::extract_signals;
use crate::types::{AwardResult, DriverId, EventResult, Prediction, RankedClassification};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chaser {
    pub driver: DriverId,
    pub positions_gained: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PredictionAward {
    pub user_id: String,
    pub award: AwardResult,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoringSummary {
    pub total_predictions: usize,
    pub predictions_scored: usize,
    pub total_points_awarded: u64,
}

/// Everything produced by scoring one finalized event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventScoring {
    pub event_id: String,
    pub classification: RankedClassification,
    pub chaser: Option<Chaser>,
    /// One entry per prediction, in input order.
    pub awards: Vec<PredictionAward>,
    pub summary: ScoringSummary,
}

impl EventScoring {
    /// Awards ordered by total points, best first; ties by user id.
    pub fn standings(&self) -> Vec<&PredictionAward> {
        let mut out: Vec<&PredictionAward> = self.awards.iter().collect();
        out.sort_by(|a, b| {
            b.award
                .total_points
                .cmp(&a.award.total_points)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        out
    }
}

/// Scores every prediction for one event.
///
/// Extraction and ranking run once; the classification is then shared
/// read-only by every grading. Any failure aborts the whole event.
pub fn score_event(
    event: &EventResult,
    predictions: &[Prediction],
    cfg: &ScoringConfig,
) -> Result<EventScoring> {
    if !event.results_processed {
        return Err(ScoringError::NotReady { event_id: event.event_id.clone() });
    }

    let scores = extract_signals(event, cfg)?;
    let classification = rank_surprise(&event.event_id, &scores, cfg)?;

    let awards = predictions
        .iter()
        .map(|p| -> Result<PredictionAward> {
            let points = grade_prediction(p, event, &classification)?;
            let award = calculate_award(&points, p.full_send_category);
            tracing::debug!(
                event = %event.event_id,
                user = %p.user_id,
                points = award.total_points,
                "scored prediction"
            );
            Ok(PredictionAward { user_id: p.user_id.clone(), award })
        })
        .collect::<Result<Vec<_>>>()?;

    let summary = ScoringSummary {
        total_predictions: predictions.len(),
        predictions_scored: awards.len(),
        total_points_awarded: awards.iter().map(|a| a.award.total_points as u64).sum(),
    };

    tracing::info!(
        event = %event.event_id,
        predictions = summary.predictions_scored,
        points = summary.total_points_awarded,
        breakouts = classification.breakouts.len(),
        busts = classification.busts.len(),
        "event scored"
    );

    Ok(EventScoring {
        event_id: event.event_id.clone(),
        chaser: chaser_of(event).map(|(driver, positions_gained)| Chaser {
            driver: driver.to_string(),
            positions_gained,
        }),
        classification,
        awards,
        summary,
    })
}

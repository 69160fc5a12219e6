//! Scoring engine for the Gridcall race-weekend prediction game.
//!
//! Pipeline per finalized event: [`extract_signals`] → [`rank_surprise`] once,
//! then [`grade_prediction`] → [`calculate_award`] per prediction.
//! [`score_event`] runs the whole batch.

pub mod award;
pub mod config;
pub mod error;
pub mod grader;
pub mod ranker;
pub mod readiness;
pub mod scoring;
pub mod signals;
pub mod types;

pub use award::calculate_award;
pub use config::{ScoringConfig, SignalWeights};
pub use error::ScoringError;
pub use grader::{chaser_of, grade_prediction};
pub use ranker::rank_surprise;
pub use readiness::{scoring_deadline, ReadinessStatus};
pub use scoring::{score_event, EventScoring, PredictionAward, ScoringSummary};
pub use signals::extract_signals;
pub use types::*;

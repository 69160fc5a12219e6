//! Signal extraction: turns a finalized event result into normalized
//! per-driver and per-team surprise signals.
//!
//! Every signal lands in [0,1] through a fixed linear map with clamping:
//! - `qualifying_strength`: `((n - q) / (n - 1) + bonus) / (1 + cutoff_bonus)`,
//!   where `bonus = cutoff_bonus` when `q <= cutoff_position`.
//! - `teammate_quali_delta` / `teammate_race_delta`: `(teammate - own) / (n - 1)`
//!   clamped to [-1,1], then rescaled with `(x + 1) / 2`. No teammate gives 0.5.
//! - `positions_gained`: gain clipped to `[-clip, clip]`, then `(g + clip) / (2 * clip)`.
//! - `competitiveness_adjusted_finish`: `(expected - finish) / (n - 1)` clamped
//!   to [-1,1], then rescaled.
//!
//! Teams take the mean of their drivers' components.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::config::ScoringConfig;
use crate::error::{Result, ScoringError};
use crate::ranker::weighted_score;
use crate::types::{EventResult, Signal, SubjectKind, SurpriseScore};

/// Positional lookups built from a validated event result.
struct Field<'a> {
    quali_pos: HashMap<&'a str, usize>,
    finish_pos: HashMap<&'a str, usize>,
    /// Team id -> drivers, drivers in qualifying order.
    roster: BTreeMap<&'a str, Vec<&'a str>>,
}

impl<'a> Field<'a> {
    fn size(&self) -> usize {
        self.quali_pos.len()
    }

    fn teammates(&self, team: &str, driver: &str) -> Vec<&'a str> {
        self.roster
            .get(team)
            .map(|ds| ds.iter().copied().filter(|d| *d != driver).collect())
            .unwrap_or_default()
    }
}

fn integrity(msg: impl Into<String>) -> ScoringError {
    ScoringError::DataIntegrity(msg.into())
}

fn positions<'a>(order: &'a [String], label: &str) -> Result<HashMap<&'a str, usize>> {
    let mut out = HashMap::with_capacity(order.len());
    for (idx, driver) in order.iter().enumerate() {
        if out.insert(driver.as_str(), idx + 1).is_some() {
            return Err(integrity(format!("{} lists driver {} more than once", label, driver)));
        }
    }
    Ok(out)
}

/// Checks the event-result invariants and builds the positional lookups.
fn validate(event: &EventResult) -> Result<Field<'_>> {
    let quali_pos = positions(&event.qualifying_order, "qualifying order")?;
    let finish_pos = positions(&event.race_finish_order, "race finish order")?;

    if let Some(d) = event.race_finish_order.iter().find(|d| !quali_pos.contains_key(d.as_str())) {
        return Err(integrity(format!("race finish order has unknown driver {}", d)));
    }
    if let Some(d) = event.qualifying_order.iter().find(|d| !finish_pos.contains_key(d.as_str())) {
        return Err(integrity(format!("driver {} is missing from race finish order", d)));
    }

    let mut roster: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for driver in &event.qualifying_order {
        let team = event
            .team_of
            .get(driver)
            .ok_or_else(|| integrity(format!("driver {} has no team", driver)))?;
        roster.entry(team.as_str()).or_default().push(driver.as_str());
    }

    if !quali_pos.contains_key(event.pole_driver.as_str()) {
        return Err(integrity(format!("pole driver {} is not an entrant", event.pole_driver)));
    }

    let mut seen = HashSet::new();
    for driver in &event.podium {
        if !quali_pos.contains_key(driver.as_str()) {
            return Err(integrity(format!("podium driver {} is not an entrant", driver)));
        }
        if !seen.insert(driver.as_str()) {
            return Err(integrity(format!("podium lists driver {} more than once", driver)));
        }
    }

    if let Some(d) = event.grid_to_finish.keys().find(|d| !quali_pos.contains_key(d.as_str())) {
        return Err(integrity(format!("positions gained has unknown driver {}", d)));
    }

    if let Some((team, v)) = event
        .team_competitiveness_baseline
        .iter()
        .find(|(_, v)| !v.is_finite())
    {
        return Err(integrity(format!("team {} has a non-finite baseline {}", team, v)));
    }

    Ok(Field { quali_pos, finish_pos, roster })
}

// ---------- Normalization ----------

/// Maps a delta in [-1,1] to [0,1].
fn rescale(x: f64) -> f64 {
    ((x.clamp(-1.0, 1.0) + 1.0) / 2.0).clamp(0.0, 1.0)
}

fn qualifying_strength(pos: usize, n: usize, cfg: &ScoringConfig) -> f64 {
    let base = if n > 1 {
        (n - pos) as f64 / (n - 1) as f64
    } else {
        1.0
    };
    let bonus = if pos <= cfg.cutoff_position { cfg.cutoff_bonus } else { 0.0 };
    ((base + bonus) / (1.0 + cfg.cutoff_bonus)).clamp(0.0, 1.0)
}

/// Positive when `own` is ahead of (numerically lower than) `teammate`.
fn position_delta(own: usize, teammate: Option<f64>, span: f64) -> f64 {
    match teammate {
        Some(t) => rescale((t - own as f64) / span),
        None => 0.5,
    }
}

fn positions_gained(gained: i32, clip: i32) -> f64 {
    let g = gained.clamp(-clip, clip) as f64;
    let c = clip as f64;
    ((g + c) / (2.0 * c)).clamp(0.0, 1.0)
}

fn competitiveness_adjusted_finish(finish: usize, expected: f64, span: f64) -> f64 {
    rescale((expected - finish as f64) / span)
}

fn mean_position(drivers: &[&str], lookup: &HashMap<&str, usize>) -> Option<f64> {
    if drivers.is_empty() {
        return None;
    }
    let sum: usize = drivers.iter().filter_map(|d| lookup.get(d)).sum();
    Some(sum as f64 / drivers.len() as f64)
}

// ---------- Extraction ----------

/// Computes a `SurpriseScore` for every driver (in qualifying order) followed
/// by every team (in id order).
///
/// Fails with `InvalidConfig` on a config that could push a signal outside
/// [0,1], and with `DataIntegrity` on any inconsistency in the event. Nothing
/// is emitted for the event in either case.
pub fn extract_signals(event: &EventResult, cfg: &ScoringConfig) -> Result<Vec<SurpriseScore>> {
    cfg.validate()?;
    let field = validate(event)?;
    let n = field.size();
    let span = n.saturating_sub(1).max(1) as f64;
    let midfield = (n as f64 + 1.0) / 2.0;

    let mut driver_components: HashMap<&str, BTreeMap<Signal, f64>> = HashMap::with_capacity(n);
    let mut scores = Vec::with_capacity(n + field.roster.len());

    for driver in &event.qualifying_order {
        let driver = driver.as_str();
        let team = event.team_of[driver].as_str();
        let q = field.quali_pos[driver];
        let f = field.finish_pos[driver];
        let mates = field.teammates(team, driver);

        let expected = match event.team_competitiveness_baseline.get(team) {
            Some(v) => *v,
            None => {
                tracing::warn!(
                    event = %event.event_id,
                    team,
                    "no competitiveness baseline; assuming midfield"
                );
                midfield
            }
        };
        let gained = event.grid_to_finish.get(driver).copied().unwrap_or(0);

        let mut components = BTreeMap::new();
        components.insert(Signal::QualifyingStrength, qualifying_strength(q, n, cfg));
        components.insert(
            Signal::TeammateQualiDelta,
            position_delta(q, mean_position(&mates, &field.quali_pos), span),
        );
        components.insert(
            Signal::TeammateRaceDelta,
            position_delta(f, mean_position(&mates, &field.finish_pos), span),
        );
        components.insert(
            Signal::PositionsGained,
            positions_gained(gained, cfg.positions_gained_clip),
        );
        components.insert(
            Signal::CompetitivenessAdjustedFinish,
            competitiveness_adjusted_finish(f, expected, span),
        );

        scores.push(SurpriseScore {
            subject_id: driver.to_string(),
            subject_kind: SubjectKind::Driver,
            weighted_score: weighted_score(&components, &cfg.weights),
            components: components.clone(),
        });
        driver_components.insert(driver, components);
    }

    for (team, drivers) in &field.roster {
        let mut components = BTreeMap::new();
        for signal in Signal::ALL {
            let sum: f64 = drivers
                .iter()
                .filter_map(|d| driver_components.get(d).and_then(|c| c.get(&signal)))
                .sum();
            components.insert(signal, sum / drivers.len() as f64);
        }
        scores.push(SurpriseScore {
            subject_id: team.to_string(),
            subject_kind: SubjectKind::Team,
            weighted_score: weighted_score(&components, &cfg.weights),
            components,
        });
    }

    tracing::debug!(
        event = %event.event_id,
        drivers = n,
        teams = field.roster.len(),
        "extracted surprise signals"
    );
    Ok(scores)
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type DriverId = String;
pub type TeamId = String;

// ---------- Inputs ----------

/// Finalized result of one race weekend. Immutable once handed to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventResult {
    pub event_id: String,
    /// Set by the event-completion workflow once results are final.
    #[serde(default)]
    pub results_processed: bool,
    pub pole_driver: DriverId,
    /// P1, P2, P3 in order.
    pub podium: [DriverId; 3],
    /// Positions gained per driver (grid minus finish; positive = gained).
    #[serde(default)]
    pub grid_to_finish: BTreeMap<DriverId, i32>,
    pub qualifying_order: Vec<DriverId>,
    pub race_finish_order: Vec<DriverId>,
    pub team_of: BTreeMap<DriverId, TeamId>,
    /// Expected finish position per team, supplied by an external feed.
    #[serde(default)]
    pub team_competitiveness_baseline: BTreeMap<TeamId, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Driver,
    Team,
}

/// A breakout or bust pick: the kind must match the classified subject's kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pick {
    pub kind: SubjectKind,
    pub id: String,
}

impl Pick {
    pub fn driver(id: &str) -> Self {
        Self { kind: SubjectKind::Driver, id: id.to_string() }
    }

    pub fn team(id: &str) -> Self {
        Self { kind: SubjectKind::Team, id: id.to_string() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Pole,
    Podium,
    Chaser,
    Breakout,
    Bust,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Pole,
        Category::Podium,
        Category::Chaser,
        Category::Breakout,
        Category::Bust,
    ];
}

/// One user's locked prediction for one event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub user_id: String,
    pub event_id: String,
    pub pole_driver: DriverId,
    pub podium_p1: DriverId,
    pub podium_p2: DriverId,
    pub podium_p3: DriverId,
    /// Captured at event start, later than the rest of the prediction.
    #[serde(default)]
    pub chaser_driver: Option<DriverId>,
    pub breakout_pick: Pick,
    pub bust_pick: Pick,
    #[serde(default)]
    pub full_send_category: Option<Category>,
}

impl Prediction {
    pub fn podium_guesses(&self) -> [&str; 3] {
        [self.podium_p1.as_str(), self.podium_p2.as_str(), self.podium_p3.as_str()]
    }
}

// ---------- Derived ----------

/// Normalized per-subject signals, each in [0,1].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    QualifyingStrength,
    TeammateQualiDelta,
    TeammateRaceDelta,
    PositionsGained,
    CompetitivenessAdjustedFinish,
}

impl Signal {
    pub const ALL: [Signal; 5] = [
        Signal::QualifyingStrength,
        Signal::TeammateQualiDelta,
        Signal::TeammateRaceDelta,
        Signal::PositionsGained,
        Signal::CompetitivenessAdjustedFinish,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Subject {
    pub kind: SubjectKind,
    pub id: String,
}

impl Subject {
    pub fn matches(&self, pick: &Pick) -> bool {
        self.kind == pick.kind && self.id == pick.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurpriseScore {
    pub subject_id: String,
    pub subject_kind: SubjectKind,
    pub components: BTreeMap<Signal, f64>,
    pub weighted_score: f64,
}

impl SurpriseScore {
    pub fn subject(&self) -> Subject {
        Subject { kind: self.subject_kind, id: self.subject_id.clone() }
    }

    pub fn component(&self, signal: Signal) -> f64 {
        self.components.get(&signal).copied().unwrap_or(0.0)
    }
}

/// Authoritative breakout/bust classification for one event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankedClassification {
    pub event_id: String,
    /// Best first.
    pub breakouts: Vec<Subject>,
    /// Worst first.
    pub busts: Vec<Subject>,
}

impl RankedClassification {
    pub fn is_breakout(&self, pick: &Pick) -> bool {
        self.breakouts.iter().any(|s| s.matches(pick))
    }

    pub fn is_bust(&self, pick: &Pick) -> bool {
        self.busts.iter().any(|s| s.matches(pick))
    }
}

pub type PerCategoryPoints = BTreeMap<Category, u32>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardResult {
    pub per_category_points: PerCategoryPoints,
    pub full_send_applied: bool,
    pub total_points: u32,
}

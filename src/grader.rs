use crate::error::{Result, ScoringError};
use crate::types::{
    Category, EventResult, Pick, PerCategoryPoints, Prediction, RankedClassification, SubjectKind,
};

pub const POLE_POINTS: u32 = 1;
pub const PODIUM_ANY_SLOT_POINTS: u32 = 1;
pub const PODIUM_EXACT_SLOT_POINTS: u32 = 2;
pub const CHASER_POINTS: u32 = 1;

/// Breakout/bust pick value; team picks carry the 2x multiplier.
pub fn pick_points(kind: SubjectKind) -> u32 {
    match kind {
        SubjectKind::Driver => 1,
        SubjectKind::Team => 2,
    }
}

/// Entrant with the most positions gained and how many. Drivers absent from
/// `grid_to_finish` count as 0 gained. Ties go to the lowest identifier.
pub fn chaser_of(event: &EventResult) -> Option<(&str, i32)> {
    let mut best: Option<(&str, i32)> = None;
    for driver in &event.qualifying_order {
        let gained = event.grid_to_finish.get(driver).copied().unwrap_or(0);
        let better = match best {
            None => true,
            Some((id, top)) => gained > top || (gained == top && driver.as_str() < id),
        };
        if better {
            best = Some((driver.as_str(), gained));
        }
    }
    best
}

/// Each slot is scored on its own: exact slot 2, elsewhere on the podium 1.
fn podium_points(guesses: [&str; 3], podium: &[String; 3]) -> u32 {
    guesses
        .iter()
        .zip(podium.iter())
        .map(|(guess, actual)| {
            if *guess == actual.as_str() {
                PODIUM_EXACT_SLOT_POINTS
            } else if podium.iter().any(|d| d == guess) {
                PODIUM_ANY_SLOT_POINTS
            } else {
                0
            }
        })
        .sum()
}

fn classified_points(hit: bool, pick: &Pick) -> u32 {
    if hit {
        pick_points(pick.kind)
    } else {
        0
    }
}

/// Grades one prediction against the finalized result and classification.
///
/// Every category is present in the output, zero when missed.
pub fn grade_prediction(
    prediction: &Prediction,
    event: &EventResult,
    classification: &RankedClassification,
) -> Result<PerCategoryPoints> {
    if prediction.event_id != event.event_id {
        return Err(ScoringError::Mismatch {
            input: "prediction",
            found: prediction.event_id.clone(),
            expected: event.event_id.clone(),
        });
    }
    if classification.event_id != event.event_id {
        return Err(ScoringError::Mismatch {
            input: "classification",
            found: classification.event_id.clone(),
            expected: event.event_id.clone(),
        });
    }
    if !event.results_processed {
        return Err(ScoringError::NotReady { event_id: event.event_id.clone() });
    }

    let mut points = PerCategoryPoints::new();

    let pole = if prediction.pole_driver == event.pole_driver { POLE_POINTS } else { 0 };
    points.insert(Category::Pole, pole);

    points.insert(Category::Podium, podium_points(prediction.podium_guesses(), &event.podium));

    let chaser = match (prediction.chaser_driver.as_deref(), chaser_of(event)) {
        (Some(guess), Some((actual, _))) if guess == actual => CHASER_POINTS,
        _ => 0,
    };
    points.insert(Category::Chaser, chaser);

    let breakout = &prediction.breakout_pick;
    points.insert(
        Category::Breakout,
        classified_points(classification.is_breakout(breakout), breakout),
    );
    let bust = &prediction.bust_pick;
    points.insert(Category::Bust, classified_points(classification.is_bust(bust), bust));

    Ok(points)
}

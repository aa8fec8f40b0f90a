use crate::domain::risk::Classification;
use serde::{Deserialize, Serialize};

const MIN_SAFE_MINUTES: i32 = 10;
const EVENING_UV_THRESHOLD: f64 = 8.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayPlan {
    pub day: Weekday,
    pub sun_exposure_minutes: i32,
    pub sun_exposure: String,
    pub activity: String,
    pub note: String,
}

/// Seven entries, Mon..Sun. Stored as a snapshot alongside the response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct WeeklyPlan(pub Vec<DayPlan>);

impl WeeklyPlan {
    #[allow(dead_code)]
    pub fn days(&self) -> &[DayPlan] {
        &self.0
    }
}

/// Higher UV shortens the window; the same UV snapshot applies to the whole week.
pub fn safe_minutes(classification: Classification, uv_index: f64) -> i32 {
    let base = match classification {
        Classification::Inadequate => 20,
        Classification::Adequate | Classification::Borderline => 15,
    };
    let uv = sanitize_uv(uv_index);
    let reduction = (uv / 2.0).ceil() as i32;
    (base - reduction).max(MIN_SAFE_MINUTES)
}

pub fn activity_for(uv_index: f64) -> &'static str {
    if sanitize_uv(uv_index) < EVENING_UV_THRESHOLD {
        "Morning walk"
    } else {
        "Evening stroll"
    }
}

pub fn diet_note(eats_vitd_foods: bool) -> &'static str {
    if eats_vitd_foods {
        "Maintain healthy diet"
    } else {
        "Include fish/eggs for extra vitamin D"
    }
}

pub fn generate_plan(classification: Classification, uv_index: f64, eats_vitd_foods: bool) -> WeeklyPlan {
    let minutes = safe_minutes(classification, uv_index);
    let activity = activity_for(uv_index);
    let note = diet_note(eats_vitd_foods);

    WeeklyPlan(
        Weekday::ALL
            .iter()
            .map(|day| DayPlan {
                day: *day,
                sun_exposure_minutes: minutes,
                sun_exposure: format!("{minutes} min outdoor"),
                activity: activity.to_string(),
                note: note.to_string(),
            })
            .collect(),
    )
}

fn sanitize_uv(uv_index: f64) -> f64 {
    if uv_index.is_finite() {
        uv_index.max(0.0)
    } else if uv_index == f64::INFINITY {
        f64::MAX
    } else {
        0.0
    }
}

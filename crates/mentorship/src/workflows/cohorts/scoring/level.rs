use super::super::domain::Tier;

pub const SCALE_THRESHOLD: f64 = 70.0;
pub const GROWTH_THRESHOLD: f64 = 40.0;

/// Tier implied by a score when no explicit assignment exists.
///
/// Scores outside 0..=100 are not rejected; they simply land in the nearest band.
pub fn classify(score: f64) -> Tier {
    if score >= SCALE_THRESHOLD {
        Tier::Scale
    } else if score >= GROWTH_THRESHOLD {
        Tier::Growth
    } else {
        Tier::Starter
    }
}

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::error::Result;
use crate::store::StatStore;
use crate::store::schema::DailyStat;

/// Read-back figures shown on the home and statistics screens.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Statistics {
    pub today: DailyStat,
    pub today_accuracy: f64,
    pub total_learned: u64,
    pub total_days: u32,
    pub streak_days: u32,
}

/// Percentage of correct answers; 0 when nothing was answered.
pub fn accuracy(correct: u32, wrong: u32) -> f64 {
    let total = correct + wrong;
    if total == 0 {
        return 0.0;
    }
    correct as f64 / total as f64 * 100.0
}

/// Count consecutive active days ending at `today`. The first day without
/// learned words, today included, ends the streak.
pub fn streak_days<F>(today: NaiveDate, mut learned_on: F) -> Result<u32>
where
    F: FnMut(NaiveDate) -> Result<u32>,
{
    let mut streak = 0;
    let mut day = today;
    while learned_on(day)? > 0 {
        streak += 1;
        day -= Duration::days(1);
    }
    Ok(streak)
}

pub fn collect<S: StatStore>(store: &S, today: NaiveDate) -> Result<Statistics> {
    let today_stat = store.day(today)?;
    let cumulative = store.cumulative()?;
    let streak = streak_days(today, |day| Ok(store.day(day)?.learned))?;

    Ok(Statistics {
        today_accuracy: accuracy(today_stat.correct, today_stat.wrong),
        today: today_stat,
        total_learned: cumulative.total_learned,
        total_days: cumulative.total_days,
        streak_days: streak,
    })
}

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::engine::stats::Statistics;
use crate::store::schema::AchievementRecord;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum Rule {
    /// Cumulative learned words across all days.
    LearnedWords(u64),
    StreakDays(u32),
    /// Today's accuracy, in percent.
    DailyAccuracy(f64),
}

impl Rule {
    pub fn is_met(&self, stats: &Statistics) -> bool {
        match *self {
            Rule::LearnedWords(n) => stats.total_learned >= n,
            Rule::StreakDays(n) => stats.streak_days >= n,
            Rule::DailyAccuracy(pct) => stats.today_accuracy >= pct,
        }
    }
}

#[derive(Debug, PartialEq, Serialize)]
pub struct AchievementDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub rule: Rule,
}

pub const CATALOG: &[AchievementDef] = &[
    AchievementDef {
        id: "first_word",
        name: "First Steps",
        description: "Learn your first word",
        rule: Rule::LearnedWords(1),
    },
    AchievementDef {
        id: "ten_words",
        name: "Getting Somewhere",
        description: "Learn 10 words in total",
        rule: Rule::LearnedWords(10),
    },
    AchievementDef {
        id: "hundred_words",
        name: "Centurion",
        description: "Learn 100 words in total",
        rule: Rule::LearnedWords(100),
    },
    AchievementDef {
        id: "thousand_words",
        name: "Lexicon",
        description: "Learn 1000 words in total",
        rule: Rule::LearnedWords(1000),
    },
    AchievementDef {
        id: "streak_3",
        name: "Three in a Row",
        description: "Study 3 days in a row",
        rule: Rule::StreakDays(3),
    },
    AchievementDef {
        id: "streak_7",
        name: "Full Week",
        description: "Study 7 days in a row",
        rule: Rule::StreakDays(7),
    },
    AchievementDef {
        id: "streak_30",
        name: "Habit Formed",
        description: "Study 30 days in a row",
        rule: Rule::StreakDays(30),
    },
    AchievementDef {
        id: "accuracy_90",
        name: "Sharpshooter",
        description: "Reach 90% accuracy in a day",
        rule: Rule::DailyAccuracy(90.0),
    },
];

pub fn find(id: &str) -> Option<&'static AchievementDef> {
    CATALOG.iter().find(|def| def.id == id)
}

/// Catalog entries whose rule now holds but whose record is still locked.
pub fn newly_unlocked(
    stats: &Statistics,
    records: &[AchievementRecord],
) -> Vec<&'static AchievementDef> {
    CATALOG
        .iter()
        .filter(|def| {
            let unlocked = records.iter().any(|r| r.id == def.id && r.unlocked);
            !unlocked && def.rule.is_met(stats)
        })
        .collect()
}

#[derive(Clone, Debug, Serialize)]
pub struct Achievement {
    pub def: &'static AchievementDef,
    pub unlocked: bool,
    pub unlocked_at: Option<NaiveDateTime>,
}

/// Join the static catalog with stored unlock state, in catalog order.
pub fn with_state(records: &[AchievementRecord]) -> Vec<Achievement> {
    CATALOG
        .iter()
        .map(|def| {
            let record = records.iter().find(|r| r.id == def.id);
            Achievement {
                def,
                unlocked: record.is_some_and(|r| r.unlocked),
                unlocked_at: record.and_then(|r| r.unlocked_at),
            }
        })
        .collect()
}

//! Level and title lookup.
//!
//! Levels are a pure function of total XP, recomputed on read rather
//! than persisted, so they can never drift from the XP total.

/// Level definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelInfo {
    pub level: u32,
    pub xp_required: i64,
    pub title: &'static str,
}

/// Level thresholds, sorted ascending by XP.
pub static LEVELS: &[LevelInfo] = &[
    LevelInfo { level: 1, xp_required: 0, title: "Newcomer" },
    LevelInfo { level: 2, xp_required: 100, title: "Learner" },
    LevelInfo { level: 3, xp_required: 300, title: "Learner" },
    LevelInfo { level: 4, xp_required: 600, title: "Apprentice" },
    LevelInfo { level: 5, xp_required: 1000, title: "Apprentice" },
    LevelInfo { level: 6, xp_required: 1500, title: "Practitioner" },
    LevelInfo { level: 7, xp_required: 2200, title: "Practitioner" },
    LevelInfo { level: 8, xp_required: 3000, title: "Specialist" },
    LevelInfo { level: 9, xp_required: 4000, title: "Specialist" },
    LevelInfo { level: 10, xp_required: 5500, title: "Expert" },
    LevelInfo { level: 11, xp_required: 7500, title: "Expert" },
    LevelInfo { level: 12, xp_required: 10000, title: "Master" },
];

/// Highest level whose threshold the XP total meets.
pub fn level_for_xp(xp: i64) -> LevelInfo {
    let mut current = LEVELS[0];
    for info in LEVELS {
        if xp >= info.xp_required {
            current = *info;
        } else {
            break;
        }
    }
    current
}

/// XP required for the next level, if any.
pub fn next_level_xp(xp: i64) -> Option<i64> {
    LEVELS
        .iter()
        .find(|info| info.xp_required > xp)
        .map(|info| info.xp_required)
}

//! Pure achievement rules.
//!
//! Nothing here touches storage. Callers gather the three inputs (catalog,
//! unlocked ids, stats snapshot) into an [`EvaluationContext`], ask which
//! entries became eligible, and persist those unlocks themselves.

use std::collections::{HashMap, HashSet};

use super::types::{Achievement, AchievementState, AchievementStatus, UserAchievement, UserStats};

/// Achievement ids already recorded for a user.
pub type UnlockedSet = HashSet<String>;

/// Inputs for one evaluation pass.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    /// `None` when the user has no stats row yet.
    pub stats: Option<&'a UserStats>,
    /// Ordered by ascending `target_count`.
    pub catalog: &'a [Achievement],
    pub unlocked: &'a UnlockedSet,
}

/// Fraction of the way to `achievement`'s target, in `[0, 1]`.
///
/// Absent stats and unknown types give 0. A non-positive target counts as
/// already met.
pub fn progress_of(achievement: &Achievement, stats: Option<&UserStats>) -> f64 {
    let Some(stats) = stats else {
        return 0.0;
    };
    let Some(value) = achievement.stat_value(stats) else {
        return 0.0;
    };
    if achievement.target_count <= 0 {
        return 1.0;
    }
    (f64::from(value) / achievement.target_count as f64).min(1.0)
}

pub fn is_unlocked(achievement_id: &str, unlocked: &UnlockedSet) -> bool {
    unlocked.contains(achievement_id)
}

/// Whether the counter has reached the target. Unknown types never qualify.
fn is_satisfied(achievement: &Achievement, stats: &UserStats) -> bool {
    achievement
        .stat_value(stats)
        .is_some_and(|value| i64::from(value) >= achievement.target_count)
}

/// Catalog entries that are satisfied but not yet unlocked, in catalog order.
///
/// Side-effect free: evaluating the same context twice yields the same list.
pub fn evaluate<'a>(ctx: &EvaluationContext<'a>) -> Vec<&'a Achievement> {
    let Some(stats) = ctx.stats else {
        return Vec::new();
    };
    ctx.catalog
        .iter()
        .filter(|a| !is_unlocked(&a.id, ctx.unlocked))
        .filter(|a| is_satisfied(a, stats))
        .collect()
}

/// State of every catalog entry for display.
pub fn statuses(
    catalog: &[Achievement],
    stats: Option<&UserStats>,
    unlocks: &[UserAchievement],
) -> Vec<AchievementStatus> {
    let unlocked_at: HashMap<&str, &str> = unlocks
        .iter()
        .map(|u| (u.achievement_id.as_str(), u.unlocked_at.as_str()))
        .collect();

    catalog
        .iter()
        .map(|achievement| {
            let (state, display_progress) = match unlocked_at.get(achievement.id.as_str()) {
                Some(at) => (
                    AchievementState::Unlocked {
                        unlocked_at: (*at).to_string(),
                    },
                    1.0,
                ),
                None => {
                    let progress = progress_of(achievement, stats);
                    (AchievementState::Locked { progress }, progress)
                }
            };
            AchievementStatus {
                achievement: achievement.clone(),
                state,
                display_progress,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn achievement(id: &str, kind: &str, target: i64) -> Achievement {
        Achievement {
            id: id.into(),
            name: format!("{id} name"),
            description: String::new(),
            icon: "*".into(),
            achievement_type: kind.into(),
            target_count: target,
        }
    }

    fn unlocked(ids: &[&str]) -> UnlockedSet {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn worked_example_entries_and_streak() {
        let catalog = vec![achievement("A", "entries", 5), achievement("B", "streak", 3)];
        let stats = UserStats {
            total_entries: 7,
            current_streak: 2,
            ..Default::default()
        };
        let set = UnlockedSet::new();
        let ctx = EvaluationContext {
            stats: Some(&stats),
            catalog: &catalog,
            unlocked: &set,
        };

        let ids: Vec<&str> = evaluate(&ctx).iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["A"]);
        assert!((progress_of(&catalog[1], Some(&stats)) - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(progress_of(&catalog[0], Some(&stats)), 1.0);
    }

    #[test]
    fn absent_stats_mean_no_progress_and_no_unlocks() {
        let catalog = vec![
            achievement("A", "entries", 1),
            achievement("B", "streak", 3),
            achievement("C", "questions", 10),
        ];
        for a in &catalog {
            assert_eq!(progress_of(a, None), 0.0);
        }
        let set = UnlockedSet::new();
        let ctx = EvaluationContext {
            stats: None,
            catalog: &catalog,
            unlocked: &set,
        };
        assert!(evaluate(&ctx).is_empty());
    }

    #[test]
    fn zero_target_is_already_met() {
        let a = achievement("Z", "events", 0);
        assert_eq!(progress_of(&a, Some(&UserStats::default())), 1.0);

        let negative = achievement("N", "events", -3);
        assert_eq!(progress_of(&negative, Some(&UserStats::default())), 1.0);
    }

    #[test]
    fn unknown_type_never_progresses_or_unlocks() {
        let catalog = vec![achievement("M", "mood", 0), achievement("W", "words", 1)];
        let stats = UserStats {
            total_entries: 100,
            ..Default::default()
        };
        for a in &catalog {
            assert_eq!(progress_of(a, Some(&stats)), 0.0);
        }
        let set = UnlockedSet::new();
        let ctx = EvaluationContext {
            stats: Some(&stats),
            catalog: &catalog,
            unlocked: &set,
        };
        assert!(evaluate(&ctx).is_empty());
    }

    #[test]
    fn progress_stays_in_unit_interval_and_is_monotonic() {
        let a = achievement("A", "entries", 7);
        let mut previous = 0.0;
        for n in 0..30u32 {
            let stats = UserStats {
                total_entries: n,
                ..Default::default()
            };
            let p = progress_of(&a, Some(&stats));
            assert!((0.0..=1.0).contains(&p), "progress {p} out of range");
            assert!(p >= previous, "progress regressed at {n}");
            if i64::from(n) >= a.target_count {
                assert_eq!(p, 1.0);
            }
            previous = p;
        }
    }

    #[test]
    fn evaluate_is_idempotent_until_unlocks_are_recorded() {
        let catalog = vec![achievement("A", "entries", 1), achievement("B", "entries", 2)];
        let stats = UserStats {
            total_entries: 2,
            ..Default::default()
        };
        let mut set = UnlockedSet::new();

        let first: Vec<String> = {
            let ctx = EvaluationContext {
                stats: Some(&stats),
                catalog: &catalog,
                unlocked: &set,
            };
            evaluate(&ctx).iter().map(|a| a.id.clone()).collect()
        };
        let second: Vec<String> = {
            let ctx = EvaluationContext {
                stats: Some(&stats),
                catalog: &catalog,
                unlocked: &set,
            };
            evaluate(&ctx).iter().map(|a| a.id.clone()).collect()
        };
        assert_eq!(first, second);
        assert_eq!(first, vec!["A", "B"]);

        set.extend(first);
        let ctx = EvaluationContext {
            stats: Some(&stats),
            catalog: &catalog,
            unlocked: &set,
        };
        assert!(evaluate(&ctx).is_empty());
    }

    #[test]
    fn unlocked_entries_are_never_returned_again() {
        let catalog = vec![achievement("A", "events", 1)];
        let set = unlocked(&["A"]);
        for n in [1u32, 10, 1000] {
            let stats = UserStats {
                total_events: n,
                ..Default::default()
            };
            let ctx = EvaluationContext {
                stats: Some(&stats),
                catalog: &catalog,
                unlocked: &set,
            };
            assert!(evaluate(&ctx).is_empty());
        }
        assert!(is_unlocked("A", &set));
        assert!(!is_unlocked("B", &set));
    }

    #[test]
    fn output_preserves_catalog_order() {
        let catalog = vec![
            achievement("q1", "questions", 1),
            achievement("e3", "entries", 3),
            achievement("s5", "streak", 5),
            achievement("e10", "entries", 10),
        ];
        let stats = UserStats {
            total_entries: 12,
            current_streak: 6,
            total_questions: 1,
            ..Default::default()
        };
        let set = UnlockedSet::new();
        let ctx = EvaluationContext {
            stats: Some(&stats),
            catalog: &catalog,
            unlocked: &set,
        };
        let ids: Vec<&str> = evaluate(&ctx).iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["q1", "e3", "s5", "e10"]);
    }

    #[test]
    fn unlocked_status_shows_full_progress_after_streak_drops() {
        let catalog = vec![achievement("S", "streak", 3), achievement("E", "entries", 4)];
        let stats = UserStats {
            current_streak: 0,
            total_entries: 1,
            longest_streak: 5,
            ..Default::default()
        };
        let unlocks = vec![UserAchievement {
            id: "u1".into(),
            user_id: "me".into(),
            achievement_id: "S".into(),
            unlocked_at: "2026-01-03T10:00:00+00:00".into(),
        }];

        let out = statuses(&catalog, Some(&stats), &unlocks);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].display_progress, 1.0);
        assert!(matches!(out[0].state, AchievementState::Unlocked { .. }));
        assert_eq!(out[1].display_progress, 0.25);
        assert_eq!(out[1].state, AchievementState::Locked { progress: 0.25 });
    }
}

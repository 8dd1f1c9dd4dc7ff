//! One evaluate → persist → notify pass.
//!
//! The pass gathers every input before evaluating, so it never acts on a
//! stale unlocked set. Notifications fire only for unlocks this pass actually
//! inserted; a row another session wrote first is not announced twice.
//! Nothing here returns an error: a failed fetch skips the pass and a failed
//! insert is retried next time, because the achievement is still eligible.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::engine::{self, EvaluationContext};
use super::store::{AchievementStore, UnlockOutcome};
use super::types::{AchievementStatus, UserStats};

/// A freshly recorded unlock, as shown in a toast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnlockNotice {
    pub achievement_id: String,
    pub icon: String,
    pub name: String,
}

/// What one pass did.
#[derive(Debug, Default, Serialize)]
pub struct PassOutcome {
    /// Inserted by this pass, in catalog order.
    pub unlocked: Vec<UnlockNotice>,
    /// Eligible but not persisted; retried on the next pass.
    pub failed: Vec<String>,
    /// `true` if inputs could not be fetched and nothing was evaluated.
    pub skipped: bool,
}

/// Run a pass for `user_id`, calling `notify(icon, name)` once per new unlock.
pub fn run_pass<S, F>(store: &S, user_id: &str, mut notify: F) -> PassOutcome
where
    S: AchievementStore + ?Sized,
    F: FnMut(&str, &str),
{
    let inputs = store.fetch_catalog().and_then(|catalog| {
        let unlocked = store.fetch_unlocked_set(user_id)?;
        let stats = store.fetch_stats(user_id)?;
        Ok((catalog, unlocked, stats))
    });
    let (catalog, unlocked, stats) = match inputs {
        Ok(inputs) => inputs,
        Err(e) => {
            warn!(user = %user_id, error = %e, "achievement inputs unavailable, skipping pass");
            return PassOutcome {
                skipped: true,
                ..Default::default()
            };
        }
    };

    let ctx = EvaluationContext {
        stats: stats.as_ref(),
        catalog: &catalog,
        unlocked: &unlocked,
    };
    let eligible = engine::evaluate(&ctx);
    if eligible.is_empty() {
        return PassOutcome::default();
    }

    let mut outcome = PassOutcome::default();
    for achievement in eligible {
        match store.persist_unlock(user_id, &achievement.id) {
            Ok(UnlockOutcome::Inserted) => {
                info!(user = %user_id, achievement = %achievement.id, "achievement unlocked");
                notify(&achievement.icon, &achievement.name);
                outcome.unlocked.push(UnlockNotice {
                    achievement_id: achievement.id.clone(),
                    icon: achievement.icon.clone(),
                    name: achievement.name.clone(),
                });
            }
            Ok(UnlockOutcome::AlreadyExists) => {
                debug!(user = %user_id, achievement = %achievement.id, "unlock already recorded");
            }
            Err(e) => {
                warn!(user = %user_id, achievement = %achievement.id, error = %e, "failed to record unlock");
                outcome.failed.push(achievement.id.clone());
            }
        }
    }
    outcome
}

/// Achievement panel for one user.
#[derive(Debug, Serialize)]
pub struct AchievementOverview {
    pub stats: UserStats,
    pub achievements: Vec<AchievementStatus>,
    /// Unlocked by the pass that ran while building this overview.
    pub just_unlocked: Vec<UnlockNotice>,
}

/// Run a pass, then report the state of every catalog entry. Unlocks made by
/// the pass go through `notify` exactly as in [`run_pass`].
pub fn overview<S, F>(
    store: &S,
    user_id: &str,
    notify: F,
) -> anyhow::Result<AchievementOverview>
where
    S: AchievementStore + ?Sized,
    F: FnMut(&str, &str),
{
    let pass = run_pass(store, user_id, notify);

    let catalog = store.fetch_catalog()?;
    let unlocks = store.fetch_unlocks(user_id)?;
    let stats = store.fetch_stats(user_id)?;

    Ok(AchievementOverview {
        achievements: engine::statuses(&catalog, stats.as_ref(), &unlocks),
        stats: stats.unwrap_or_default(),
        just_unlocked: pass.unlocked,
    })
}

//! # Closed set of task kinds.
//!
//! [`TaskKind`] discriminates which automation behaviour a task runs. The set
//! is closed: concrete behaviours are looked up by kind in a
//! [`TaskTable`](crate::TaskTable) built once at startup.

use std::fmt;

/// Discriminator selecting which automation behaviour a task runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskKind {
    /// Re-establishes a known navigational state (home screen).
    ///
    /// Always sorts first in the queue regardless of its delay.
    Initialize,
    /// Claims daily-mission progress rewards.
    DailyMissions,
    /// Sends marches to gather a resource (distinct key = resource type).
    Gather,
    /// Queues troop training.
    TrainTroops,
    /// Heals injured troops in the hospital.
    HealInjured,
    /// Donates to alliance technology.
    AllianceDonation,
    /// Collects mail and event rewards.
    CollectRewards,
    /// Spends arena challenge attempts.
    Arena,
}

impl TaskKind {
    /// Every kind, in declaration order.
    pub const ALL: [TaskKind; 8] = [
        TaskKind::Initialize,
        TaskKind::DailyMissions,
        TaskKind::Gather,
        TaskKind::TrainTroops,
        TaskKind::HealInjured,
        TaskKind::AllianceDonation,
        TaskKind::CollectRewards,
        TaskKind::Arena,
    ];

    /// Stable snake_case key (settings keys, logs).
    pub fn key(self) -> &'static str {
        match self {
            TaskKind::Initialize => "initialize",
            TaskKind::DailyMissions => "daily_missions",
            TaskKind::Gather => "gather",
            TaskKind::TrainTroops => "train_troops",
            TaskKind::HealInjured => "heal_injured",
            TaskKind::AllianceDonation => "alliance_donation",
            TaskKind::CollectRewards => "collect_rewards",
            TaskKind::Arena => "arena",
        }
    }

    /// Human-readable name used in status lines.
    pub fn display_name(self) -> &'static str {
        match self {
            TaskKind::Initialize => "Initialize",
            TaskKind::DailyMissions => "Daily Missions",
            TaskKind::Gather => "Gather Resources",
            TaskKind::TrainTroops => "Train Troops",
            TaskKind::HealInjured => "Heal Injured",
            TaskKind::AllianceDonation => "Alliance Donation",
            TaskKind::CollectRewards => "Collect Rewards",
            TaskKind::Arena => "Arena",
        }
    }

    /// True for the initialization kind.
    #[inline]
    pub fn is_initialization(self) -> bool {
        matches!(self, TaskKind::Initialize)
    }

    /// Whether running this kind advances daily-mission progress.
    pub fn contributes_to_daily_missions(self) -> bool {
        matches!(
            self,
            TaskKind::Gather
                | TaskKind::TrainTroops
                | TaskKind::HealInjured
                | TaskKind::AllianceDonation
                | TaskKind::Arena
        )
    }

    /// Queue rank: lower sorts first.
    #[inline]
    pub(crate) fn priority_rank(self) -> u8 {
        if self.is_initialization() { 0 } else { 1 }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_initialize_has_top_rank() {
        for kind in TaskKind::ALL {
            assert_eq!(kind.priority_rank() == 0, kind.is_initialization(), "{kind:?}");
        }
    }

    #[test]
    fn recovery_and_missions_do_not_feed_missions() {
        assert!(!TaskKind::Initialize.contributes_to_daily_missions());
        assert!(!TaskKind::DailyMissions.contributes_to_daily_missions());
        assert!(TaskKind::Gather.contributes_to_daily_missions());
    }

    #[test]
    fn keys_are_unique() {
        let mut keys: Vec<_> = TaskKind::ALL.iter().map(|k| k.key()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), TaskKind::ALL.len());
    }
}

use crate::level::Level;
use crate::runtime::Stats;

/// How a completed run measures up against a level's challenges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Score {
    pub stats: Stats,
    /// Program is no larger than the size challenge.
    pub size_met: bool,
    /// Run took no more steps than the speed challenge.
    pub speed_met: bool,
}

impl Score {
    pub fn evaluate(level: &Level, stats: Stats) -> Self {
        Score {
            stats,
            size_met: stats.commands_used <= level.expected_command_count,
            speed_met: stats.instructions_executed <= level.expected_execute_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level;

    #[test]
    fn thresholds_are_inclusive() {
        let level = level::find("mail-room").unwrap();
        let score = Score::evaluate(
            level,
            Stats {
                instructions_executed: 6,
                commands_used: 6,
            },
        );
        assert!(score.size_met);
        assert!(score.speed_met);

        let score = Score::evaluate(
            level,
            Stats {
                instructions_executed: 7,
                commands_used: 4,
            },
        );
        assert!(score.size_met);
        assert!(!score.speed_met);
    }
}

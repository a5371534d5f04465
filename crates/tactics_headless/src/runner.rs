//! Auto-played battle runs.
//!
//! Both sides are driven by the built-in AI: the player phase goes through
//! the same click path a human would use, the enemy phase through the enemy
//! turn driver. A run stops when one side is wiped out or the round limit
//! is reached.

use serde::{Deserialize, Serialize};
use tactics_core::prelude::*;

use crate::encounter::HeadlessError;

/// Options for a single run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunConfig {
    /// Difficulty override. Falls back to the encounter's own.
    pub difficulty: Option<Difficulty>,
    /// Round limit override. Falls back to the encounter's own.
    pub max_rounds: Option<u32>,
}

impl RunConfig {
    /// Set the difficulty.
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    /// Set the round limit.
    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = Some(max_rounds);
        self
    }
}

/// JSON result of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleReport {
    /// Encounter name.
    pub encounter: String,
    /// Difficulty the enemies were scaled with.
    pub difficulty: Difficulty,
    /// Winner, or `None` if the round limit ran out.
    pub outcome: Option<BattleOutcome>,
    /// Rounds actually played.
    pub rounds: u32,
    /// Round limit in force.
    pub max_rounds: u32,
    /// Units defeated on each side as (player, enemy).
    pub defeated: (u32, u32),
    /// Number of battle events emitted.
    pub events: usize,
    /// Final state hash, for determinism checks.
    pub final_hash: u64,
    /// Survivors at the end of the run.
    pub survivors: Vec<UnitSnapshot>,
}

/// Play an encounter to completion.
pub fn run_battle(encounter: &EncounterData, config: &RunConfig) -> std::result::Result<BattleReport, HeadlessError> {
    let difficulty = config.difficulty.unwrap_or(encounter.difficulty);
    let max_rounds = config.max_rounds.unwrap_or(encounter.max_rounds);

    let mut battle = Battle::from_encounter(encounter, difficulty)?;
    let mut rounds = 0;
    let mut events = 0;

    while !battle.is_over() && rounds < max_rounds {
        battle.autoplay_player_turn();
        battle.end_turn();
        battle.run_enemy_turn();
        rounds += 1;

        events += battle.drain_events().len();
        // Removal is skipped once the battle has ended, so survivors are
        // filtered on HP below.
        battle.cleanup_dead();
        tracing::debug!(round = rounds, phase = ?battle.phase(), "Round complete");
    }

    let survivors: Vec<UnitSnapshot> = battle.unit_snapshots().into_iter().filter(|u| u.hp > 0).collect();
    let standing = |faction: Faction| survivors.iter().filter(|u| u.faction == faction).count();
    let defeated = (
        (encounter.players.len() - standing(Faction::Player)) as u32,
        (encounter.enemies.len() - standing(Faction::Enemy)) as u32,
    );

    let report = BattleReport {
        encounter: encounter.name.clone(),
        difficulty,
        outcome: battle.outcome(),
        rounds,
        max_rounds,
        defeated,
        events,
        final_hash: battle.state_hash(),
        survivors,
    };

    tracing::info!(
        encounter = %report.encounter,
        %difficulty,
        outcome = ?report.outcome,
        rounds = report.rounds,
        "Run finished"
    );
    Ok(report)
}

/// Run the same encounter twice and compare the final state hashes.
pub fn verify_determinism(encounter: &EncounterData, config: &RunConfig) -> std::result::Result<bool, HeadlessError> {
    let first = run_battle(encounter, config)?;
    let second = run_battle(encounter, config)?;
    let matches = first == second;
    if !matches {
        tracing::warn!(
            first = first.final_hash,
            second = second.final_hash,
            "Runs diverged"
        );
    }
    Ok(matches)
}

/// Render a battle as ASCII: terrain glyphs with `P` for player units and
/// `E` for enemy units, followed by one line per living unit.
pub fn render_battle(battle: &Battle) -> String {
    let mut rows: Vec<Vec<char>> = battle
        .battlefield()
        .render_rows()
        .iter()
        .map(|row| row.chars().collect())
        .collect();

    let living: Vec<&Unit> = battle.roster().iter().filter(|u| u.is_alive()).collect();
    for unit in &living {
        let (x, y) = (unit.position.x as usize, unit.position.y as usize);
        if let Some(cell) = rows.get_mut(y).and_then(|row| row.get_mut(x)) {
            *cell = match unit.faction {
                Faction::Player => 'P',
                Faction::Enemy => 'E',
            };
        }
    }

    let mut output = String::new();
    for row in rows {
        output.extend(row);
        output.push('\n');
    }
    for unit in living {
        output.push_str(&format!(
            "{} #{} {} at {} hp {}/{}\n",
            unit.faction.label(),
            unit.id,
            unit.name,
            unit.position,
            unit.current_hp(),
            unit.stats.max_hp
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactics_test_utils::fixtures::{knight, skirmish_battle, skirmish_encounter, template};

    #[test]
    fn test_run_skirmish_terminates() {
        let report = run_battle(&skirmish_encounter(), &RunConfig::default()).unwrap();
        assert!(report.rounds <= report.max_rounds);
        assert_eq!(report.max_rounds, 30);
        assert!(report.outcome.is_some() || report.rounds == report.max_rounds);
        assert!(report.survivors.iter().all(|u| u.hp > 0));
    }

    #[test]
    fn test_overrides_apply() {
        let config = RunConfig::default().with_difficulty(Difficulty::Hard).with_max_rounds(2);
        let report = run_battle(&skirmish_encounter(), &config).unwrap();
        assert_eq!(report.difficulty, Difficulty::Hard);
        assert_eq!(report.max_rounds, 2);
        assert!(report.rounds <= 2);
    }

    #[test]
    fn test_zero_round_limit_plays_nothing() {
        let report = run_battle(&skirmish_encounter(), &RunConfig::default().with_max_rounds(0)).unwrap();
        assert_eq!(report.rounds, 0);
        assert_eq!(report.outcome, None);
        assert_eq!(report.survivors.len(), 5);
    }

    #[test]
    fn test_lopsided_battle_is_won() {
        let mut encounter = skirmish_encounter();
        encounter.players = vec![Placement {
            at: (4, 1),
            unit: UnitTemplate {
                max_hp: 200,
                attack_power: 30,
                ..knight()
            },
        }];
        encounter.enemies = vec![Placement {
            at: (6, 1),
            unit: template("Straggler", 3, 1, 0),
        }];
        let report = run_battle(&encounter, &RunConfig::default()).unwrap();
        assert_eq!(report.outcome, Some(BattleOutcome::PlayerVictory));
        assert_eq!(report.defeated, (0, 1));
    }

    #[test]
    fn test_runs_are_deterministic() {
        assert!(verify_determinism(&skirmish_encounter(), &RunConfig::default()).unwrap());
    }

    #[test]
    fn test_render_marks_units() {
        let battle = skirmish_battle();
        let text = render_battle(&battle);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 8 + 5);
        assert_eq!(lines[6].chars().nth(1), Some('P'));
        assert_eq!(lines[1].chars().nth(6), Some('E'));
        assert_eq!(lines[3], "...~~...");
    }
}

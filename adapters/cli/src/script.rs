//! Scripted command logs replayed by the `run` subcommand.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use tower_defense_core::PlayerCommand;

/// One command queued before the given tick is simulated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub(crate) struct ScriptStep {
    #[serde(default)]
    pub(crate) tick: u64,
    #[serde(flatten)]
    pub(crate) command: PlayerCommand,
}

/// Command log ordered by tick, preserving file order within a tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Script {
    steps: Vec<ScriptStep>,
    cursor: usize,
}

impl Script {
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid script {}", path.display()))
    }

    pub(crate) fn parse(text: &str) -> Result<Self> {
        let mut steps: Vec<ScriptStep> = serde_json::from_str(text)?;
        steps.sort_by_key(|step| step.tick);
        Ok(Self { steps, cursor: 0 })
    }

    /// Commands scheduled at or before `tick` that have not been handed out yet.
    pub(crate) fn due(&mut self, tick: u64) -> &[ScriptStep] {
        let start = self.cursor;
        while self
            .steps
            .get(self.cursor)
            .is_some_and(|step| step.tick <= tick)
        {
            self.cursor += 1;
        }
        &self.steps[start..self.cursor]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_defense_core::{CellCoord, TowerKind};

    #[test]
    fn steps_flatten_the_command_tag() {
        let mut script = Script::parse(
            r#"[
                { "tick": 4, "command": "start_wave" },
                { "command": "place_tower", "kind": "ARCHER", "cell": { "column": 2, "row": 0 } },
                { "tick": 4, "command": "pause" }
            ]"#,
        )
        .expect("parse");

        assert_eq!(
            script.due(0),
            &[ScriptStep {
                tick: 0,
                command: PlayerCommand::PlaceTower {
                    kind: TowerKind::Archer,
                    cell: CellCoord::new(2, 0),
                },
            }]
        );
        assert!(script.due(3).is_empty());
        let commands: Vec<PlayerCommand> = script.due(4).iter().map(|step| step.command).collect();
        assert_eq!(commands, vec![PlayerCommand::StartWave, PlayerCommand::Pause]);
        assert!(script.due(100).is_empty());
    }

    #[test]
    fn unknown_commands_are_rejected() {
        assert!(Script::parse(r#"[{ "command": "teleport" }]"#).is_err());
    }
}

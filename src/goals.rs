//! Goal tallies and victory rules

use crate::board::Block;
use crate::powers::Inventory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a goal set is won
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VictoryRule {
    /// Every goal must reach its target
    AllGoals,
    /// Reward room: the first goal to reach its target is granted as a
    /// reward, provided the inventory has room for it
    FirstGoal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalVerdict {
    Pending,
    Complete,
    Reward(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoalProgress {
    pub key: String,
    pub target: u32,
    pub collected: u32,
}

impl GoalProgress {
    pub fn is_met(&self) -> bool {
        self.collected >= self.target
    }
}

/// Targets and collected counts for one session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GoalLedger {
    targets: BTreeMap<String, u32>,
    collected: BTreeMap<String, u32>,
    /// Keys in the order they reached their target
    completed: Vec<String>,
}

impl GoalLedger {
    pub fn new(targets: BTreeMap<String, u32>) -> Self {
        let targets: BTreeMap<String, u32> = targets
            .into_iter()
            .map(|(key, target)| (key.to_ascii_lowercase(), target))
            .collect();
        let collected = targets.keys().map(|key| (key.clone(), 0)).collect();
        let mut ledger = Self {
            targets,
            collected,
            completed: Vec::new(),
        };
        ledger.complete_free_goals();
        ledger
    }

    /// Goals with a zero target are met before anything is collected
    fn complete_free_goals(&mut self) {
        self.completed = self
            .targets
            .iter()
            .filter(|&(_, &target)| target == 0)
            .map(|(key, _)| key.clone())
            .collect();
    }

    /// Count one collected item. Untracked keys are ignored.
    pub fn collect_key(&mut self, key: &str) -> bool {
        let key = key.to_ascii_lowercase();
        let Some(&target) = self.targets.get(&key) else {
            return false;
        };
        let count = self.collected.entry(key.clone()).or_insert(0);
        *count += 1;
        if *count >= target && !self.completed.contains(&key) {
            self.completed.push(key);
        }
        true
    }

    /// Count a cleared block if it is a tracked item
    pub fn collect(&mut self, block: &Block) -> bool {
        match block {
            Block::Item { key, .. } => self.collect_key(key),
            _ => false,
        }
    }

    pub fn collected(&self, key: &str) -> u32 {
        self.collected
            .get(&key.to_ascii_lowercase())
            .copied()
            .unwrap_or(0)
    }

    pub fn targets(&self) -> &BTreeMap<String, u32> {
        &self.targets
    }

    pub fn collected_counts(&self) -> &BTreeMap<String, u32> {
        &self.collected
    }

    pub fn progress(&self) -> Vec<GoalProgress> {
        self.targets
            .iter()
            .map(|(key, &target)| GoalProgress {
                key: key.clone(),
                target,
                collected: self.collected(key),
            })
            .collect()
    }

    /// Every goal met. An empty goal set is never complete.
    pub fn is_complete(&self) -> bool {
        !self.targets.is_empty()
            && self
                .targets
                .iter()
                .all(|(key, &target)| self.collected(key) >= target)
    }

    /// Decide the goal outcome after a full clearing and collection pass
    pub fn verdict(&self, rule: VictoryRule, inventory: &Inventory) -> GoalVerdict {
        match rule {
            VictoryRule::AllGoals => {
                if self.is_complete() {
                    GoalVerdict::Complete
                } else {
                    GoalVerdict::Pending
                }
            }
            VictoryRule::FirstGoal => {
                // When every reward type is capped the caps stop blocking,
                // otherwise the room could never be won
                let caps_block = !inventory.uniformly_full(self.targets.keys().map(String::as_str));
                self.completed
                    .iter()
                    .find(|key| !caps_block || !inventory.is_full(key))
                    .map_or(GoalVerdict::Pending, |key| GoalVerdict::Reward(key.clone()))
            }
        }
    }

    /// Zero every tally, keeping the targets
    pub fn reset(&mut self) {
        for count in self.collected.values_mut() {
            *count = 0;
        }
        self.complete_free_goals();
    }
}

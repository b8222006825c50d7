//! Clear conditions for one mission and the latch that fires "cleared" once per attempt.
//! Evaluation is a pure function of the progress it is handed.

use std::mem;

use serde::{Deserialize, Serialize};

use crate::content::LevelDef;
use crate::level::Inventory;
use crate::types::ItemKind;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClearLogic {
    #[default]
    #[serde(rename = "AND", alias = "and")]
    And,
    #[serde(rename = "OR", alias = "or")]
    Or,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionKind {
    Obtain,
    Reach,
    #[serde(rename = "life0", alias = "life-above-zero")]
    LifeAboveZero,
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CutscenePaths {
    pub success: Option<String>,
    pub fail: Option<String>,
}

impl CutscenePaths {
    pub fn pick(&self, success: bool) -> Option<&str> {
        if success { self.success.as_deref() } else { self.fail.as_deref() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ConditionKind,
    #[serde(default)]
    pub item: Option<ItemKind>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub requires: Vec<ItemKind>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub cutscenes: CutscenePaths,
}

impl Condition {
    pub fn new(id: &str, kind: ConditionKind) -> Self {
        Self {
            id: id.to_string(),
            kind,
            item: None,
            count: None,
            requires: Vec::new(),
            text: String::new(),
            cutscenes: CutscenePaths::default(),
        }
    }

    pub fn obtain(id: &str, item: ItemKind, count: u32) -> Self {
        Self { item: Some(item), count: Some(count), ..Self::new(id, ConditionKind::Obtain) }
    }

    pub fn is_satisfied(&self, progress: &MissionProgress<'_>) -> bool {
        match self.kind {
            ConditionKind::Obtain => {
                let Some(item) = self.item else {
                    return false;
                };
                let prerequisites_held =
                    self.requires.iter().all(|required| progress.inventory.count(*required) > 0);
                prerequisites_held && progress.inventory.count(item) >= self.count.unwrap_or(1)
            }
            ConditionKind::Reach => progress.reached_goal,
            ConditionKind::LifeAboveZero => progress.life > 0,
            ConditionKind::Unknown => false,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct MissionProgress<'a> {
    pub inventory: &'a Inventory,
    pub reached_goal: bool,
    pub life: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConditionStatus {
    pub id: String,
    pub kind: ConditionKind,
    pub satisfied: bool,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Evaluation {
    pub done: bool,
    pub conditions: Vec<ConditionStatus>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Mission {
    logic: ClearLogic,
    conditions: Vec<Condition>,
    cleared_fired: bool,
}

impl Mission {
    pub fn new(logic: ClearLogic, conditions: Vec<Condition>) -> Self {
        Self { logic, conditions, cleared_fired: false }
    }

    pub fn from_level(level: &LevelDef) -> Self {
        Self::new(level.clear.logic, level.clear.conditions.clone())
    }

    pub fn logic(&self) -> ClearLogic {
        self.logic
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// With no conditions, AND is vacuously done and OR is not.
    pub fn evaluate(&self, progress: &MissionProgress<'_>) -> Evaluation {
        let conditions: Vec<ConditionStatus> = self
            .conditions
            .iter()
            .map(|condition| ConditionStatus {
                id: condition.id.clone(),
                kind: condition.kind,
                satisfied: condition.is_satisfied(progress),
                text: condition.text.clone(),
            })
            .collect();

        let done = match self.logic {
            ClearLogic::And => conditions.iter().all(|status| status.satisfied),
            ClearLogic::Or => conditions.iter().any(|status| status.satisfied),
        };
        Evaluation { done, conditions }
    }

    pub fn is_done(&self, progress: &MissionProgress<'_>) -> bool {
        self.evaluate(progress).done
    }

    /// Latches the cleared signal. Returns `true` only the first time per attempt.
    pub fn fire_cleared(&mut self) -> bool {
        !mem::replace(&mut self.cleared_fired, true)
    }
}

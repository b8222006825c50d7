use std::time::Duration;

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    pub struct EnemyId;
    pub struct PickupId;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub y: i32,
    pub x: i32,
}

impl Pos {
    pub fn manhattan(self, other: Pos) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// Playfield bounds. Cells are `[0, width) x [0, height)`, y grows downward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Grid {
    pub width: i32,
    pub height: i32,
}

impl Grid {
    pub const MIN_SIDE: i32 = 4;
    pub const MAX_SIDE: i32 = 20;
    pub const DEFAULT_SIDE: i32 = 10;

    pub fn contains(self, pos: Pos) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    pub fn clamp(self, pos: Pos) -> Pos {
        Pos { y: pos.y.clamp(0, self.height - 1), x: pos.x.clamp(0, self.width - 1) }
    }

    pub fn cells(self) -> impl Iterator<Item = Pos> {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| Pos { y, x }))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn step_from(self, pos: Pos) -> Pos {
        let (dx, dy) = self.delta();
        Pos { y: pos.y + dy, x: pos.x + dx }
    }
}

/// A single movement instruction delivered to the level once per tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Command {
    #[serde(rename = "up")]
    MoveUp,
    #[serde(rename = "down")]
    MoveDown,
    #[serde(rename = "left")]
    MoveLeft,
    #[serde(rename = "right")]
    MoveRight,
}

struct CommandSpelling {
    command: Command,
    code: &'static str,
    symbol: &'static str,
    kana: &'static str,
}

const COMMAND_TABLE: [CommandSpelling; 4] = [
    CommandSpelling { command: Command::MoveUp, code: "up", symbol: "↑", kana: "まえ" },
    CommandSpelling { command: Command::MoveDown, code: "down", symbol: "↓", kana: "うしろ" },
    CommandSpelling { command: Command::MoveLeft, code: "left", symbol: "←", kana: "ひだり" },
    CommandSpelling { command: Command::MoveRight, code: "right", symbol: "→", kana: "みぎ" },
];

impl Command {
    pub const ALL: [Command; 4] =
        [Command::MoveUp, Command::MoveDown, Command::MoveLeft, Command::MoveRight];

    fn spelling(self) -> &'static CommandSpelling {
        match self {
            Command::MoveUp => &COMMAND_TABLE[0],
            Command::MoveDown => &COMMAND_TABLE[1],
            Command::MoveLeft => &COMMAND_TABLE[2],
            Command::MoveRight => &COMMAND_TABLE[3],
        }
    }

    pub fn code(self) -> &'static str {
        self.spelling().code
    }

    pub fn symbol(self) -> &'static str {
        self.spelling().symbol
    }

    /// Accepts the internal code, the arrow symbol, or the kana label.
    pub fn parse(text: &str) -> Option<Command> {
        let text = text.trim();
        COMMAND_TABLE
            .iter()
            .find(|entry| entry.code == text || entry.symbol == text || entry.kana == text)
            .map(|entry| entry.command)
    }

    pub fn direction(self) -> Direction {
        match self {
            Command::MoveUp => Direction::Up,
            Command::MoveDown => Direction::Down,
            Command::MoveLeft => Direction::Left,
            Command::MoveRight => Direction::Right,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Weapon,
    Key,
    #[serde(alias = "portal_key", alias = "portal-key")]
    PortalKey,
    Blueprint,
    #[serde(other)]
    Unknown,
}

impl ItemKind {
    pub fn code(self) -> &'static str {
        match self {
            ItemKind::Weapon => "weapon",
            ItemKind::Key => "key",
            ItemKind::PortalKey => "portalkey",
            ItemKind::Blueprint => "blueprint",
            ItemKind::Unknown => "unknown",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObstacleKind {
    Rock,
    Wall,
    Gate,
    #[serde(rename = "portalgate", alias = "portal")]
    Portal,
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PassRule {
    #[serde(rename = "always")]
    Always,
    #[default]
    #[serde(rename = "never")]
    Never,
    #[serde(rename = "need_item", alias = "need-item", alias = "needItem")]
    NeedItem,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailCause {
    CombatLost,
    WarpRequirementUnmet,
    GoalConditionsUnmet,
    LifeExhausted,
}

/// Classified result of feeding one token to the level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The level is already cleared or halted; nothing changed.
    Ignored,
    Blocked { at: Pos },
    Moved { to: Pos },
    PickedUp { item: ItemKind },
    CombatWon { enemy: EnemyId },
    Warped { from: Pos, to: Pos },
    GoalReached,
    Fatal(FailCause),
}

/// State changes recorded while resolving a single tick, in the order they happened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LevelEvent {
    Moved { to: Pos },
    Bumped { from: Pos, toward: Pos },
    ItemPicked { item: ItemKind, pos: Pos },
    EnemyDown { kind: String, pos: Pos },
    GateChanged { pos: Pos, open: bool },
    BlueprintsComplete,
    Warped { from: Pos, to: Pos },
    ReachGoal { pos: Pos },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Animation {
    Idle,
    Walk,
    Bump,
    Sad,
    Cheer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CutscenePurpose {
    BattleWon,
    BattleLost,
    BlueprintsComplete,
    MissionSuccess,
    MissionFailed,
}

/// Everything the presentation layer can observe. Drained with `Session::drain_events`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineEvent {
    MissionStart { index: usize, level_id: String, announce: bool },
    Limits { command_cap: usize, repeat_inner_cap: usize },
    NoLevelData { index: usize },
    ShowDirection { command: Command, cell: Pos },
    PlayAnimation(Animation),
    Moved { to: Pos },
    ItemPicked { item: ItemKind },
    EnemyDown { kind: String },
    GateChanged { pos: Pos, open: bool },
    BlueprintsComplete,
    Warped { from: Pos, to: Pos },
    ReachGoal { pos: Pos },
    PlayCutscene { path: String, purpose: CutscenePurpose },
    InputLocked,
    InputUnlocked,
    MissionCleared { index: usize },
    CampaignComplete,
    MissionFailed { cause: FailCause },
    LifeChanged { life: u32 },
    LifeZero,
}

impl From<LevelEvent> for EngineEvent {
    fn from(event: LevelEvent) -> Self {
        match event {
            LevelEvent::Moved { to } => EngineEvent::Moved { to },
            LevelEvent::Bumped { .. } => EngineEvent::PlayAnimation(Animation::Bump),
            LevelEvent::ItemPicked { item, .. } => EngineEvent::ItemPicked { item },
            LevelEvent::EnemyDown { kind, .. } => EngineEvent::EnemyDown { kind },
            LevelEvent::GateChanged { pos, open } => EngineEvent::GateChanged { pos, open },
            LevelEvent::BlueprintsComplete => EngineEvent::BlueprintsComplete,
            LevelEvent::Warped { from, to } => EngineEvent::Warped { from, to },
            LevelEvent::ReachGoal { pos } => EngineEvent::ReachGoal { pos },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackStop {
    /// Nothing is scheduled and no sequence is pending.
    Idle,
    /// The sequence ran out on this advance.
    Finished,
    /// A pause lock is held; playback resumes on the final unlock.
    Paused,
    /// Still running; the next token fires at `next_due` on the virtual clock.
    Waiting { next_due: Duration },
    /// A tick handler asked playback to stop.
    Stopped,
    /// A newer interpreter generation exists; this one no longer fires.
    Stale,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaybackReport {
    pub delivered: u32,
    pub stop_reason: PlaybackStop,
}

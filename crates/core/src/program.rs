//! Editable command program: leaf tokens plus flat repeat groups.
//! This module exists to keep editing rules and flattening pure and synchronous.
//! It does not own playback timing or level interpretation.

use serde::{Deserialize, Serialize};

use crate::types::Command;

pub const REPEAT_MIN: u8 = 2;
pub const REPEAT_MAX: u8 = 10;
pub const DEFAULT_REPEAT_COUNT: u8 = 2;
pub const DEFAULT_COMMAND_CAP: usize = 20;
pub const DEFAULT_REPEAT_INNER_CAP: usize = 12;

const REPEAT_OPS: [&str; 2] = ["repeat", "くり返し"];
const END_REPEAT_OPS: [&str; 2] = ["end", "おわり"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramLimits {
    /// Leaves allowed in the whole program, including leaves inside repeat groups.
    pub command_cap: usize,
    /// Leaves allowed inside a single repeat group.
    pub repeat_inner_cap: usize,
}

impl Default for ProgramLimits {
    fn default() -> Self {
        Self { command_cap: DEFAULT_COMMAND_CAP, repeat_inner_cap: DEFAULT_REPEAT_INNER_CAP }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProgramNode {
    Leaf(Command),
    Repeat(RepeatGroup),
}

impl ProgramNode {
    fn leaf_cost(&self) -> usize {
        match self {
            ProgramNode::Leaf(_) => 1,
            ProgramNode::Repeat(group) => group.body.iter().map(ProgramNode::leaf_cost).sum(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepeatGroup {
    count: u8,
    body: Vec<ProgramNode>,
}

impl RepeatGroup {
    pub fn new(count: u8, body: impl IntoIterator<Item = Command>) -> Self {
        Self {
            count: clamp_repeat_count(count),
            body: body.into_iter().map(ProgramNode::Leaf).collect(),
        }
    }

    /// Builds a group without any shape checks. Flattening skips groups that nest repeats.
    pub fn from_nodes(count: u8, body: Vec<ProgramNode>) -> Self {
        Self { count, body }
    }

    pub fn count(&self) -> u8 {
        self.count
    }

    pub fn body(&self) -> &[ProgramNode] {
        &self.body
    }

    fn contains_repeat(&self) -> bool {
        self.body.iter().any(|node| matches!(node, ProgramNode::Repeat(_)))
    }
}

pub fn clamp_repeat_count(count: u8) -> u8 {
    count.clamp(REPEAT_MIN, REPEAT_MAX)
}

/// Addresses a node for removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeRef {
    Top(usize),
    Inner { group: usize, index: usize },
}

/// The program a learner edits. Every operation either applies or is silently ignored;
/// the returned `bool` reports whether anything changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Program {
    nodes: Vec<ProgramNode>,
    open_group: Option<usize>,
    limits: ProgramLimits,
}

impl Program {
    pub fn new(limits: ProgramLimits) -> Self {
        Self { nodes: Vec::new(), open_group: None, limits }
    }

    /// Wraps already-built nodes as a closed program. No validation is done here.
    pub fn from_nodes(nodes: Vec<ProgramNode>, limits: ProgramLimits) -> Self {
        Self { nodes, open_group: None, limits }
    }

    pub fn nodes(&self) -> &[ProgramNode] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn limits(&self) -> ProgramLimits {
        self.limits
    }

    pub fn set_limits(&mut self, limits: ProgramLimits) {
        self.limits = limits;
    }

    pub fn open_group(&self) -> Option<usize> {
        self.open_group
    }

    pub fn is_recording_repeat(&self) -> bool {
        self.open_group.is_some()
    }

    pub fn used(&self) -> usize {
        self.nodes.iter().map(ProgramNode::leaf_cost).sum()
    }

    pub fn remaining(&self) -> usize {
        self.limits.command_cap.saturating_sub(self.used())
    }

    pub fn append_leaf(&mut self, command: Command) -> bool {
        if self.used() + 1 > self.limits.command_cap {
            return false;
        }

        let inner_cap = self.limits.repeat_inner_cap;
        match self.open_group_mut() {
            Some(group) => {
                if group.body.len() + 1 > inner_cap {
                    return false;
                }
                group.body.push(ProgramNode::Leaf(command));
            }
            None => self.nodes.push(ProgramNode::Leaf(command)),
        }
        true
    }

    pub fn begin_repeat(&mut self, count: u8) -> bool {
        if self.open_group.is_some() || self.remaining() == 0 {
            return false;
        }
        let group = RepeatGroup { count: clamp_repeat_count(count), body: Vec::new() };
        self.nodes.push(ProgramNode::Repeat(group));
        self.open_group = Some(self.nodes.len() - 1);
        true
    }

    pub fn end_repeat(&mut self) -> bool {
        let Some(index) = self.open_group.take() else {
            return false;
        };
        if self.group_is_empty(index) {
            self.nodes.remove(index);
        }
        true
    }

    pub fn set_repeat_count(&mut self, group: usize, count: u8) -> bool {
        let Some(ProgramNode::Repeat(repeat)) = self.nodes.get_mut(group) else {
            return false;
        };
        let clamped = clamp_repeat_count(count);
        if repeat.count == clamped {
            return false;
        }
        repeat.count = clamped;
        true
    }

    pub fn remove_node(&mut self, node: NodeRef) -> bool {
        let cancel_open = self.open_group.is_some_and(|index| self.group_is_empty(index));

        let removed = match node {
            NodeRef::Top(index) => self.remove_top(index),
            NodeRef::Inner { group, index } => self.remove_inner(group, index),
        };

        if cancel_open && let Some(index) = self.open_group.take() {
            self.remove_top(index);
            return true;
        }
        removed
    }

    pub fn clear(&mut self) -> bool {
        let changed = !self.nodes.is_empty() || self.open_group.is_some();
        self.nodes.clear();
        self.open_group = None;
        changed
    }

    /// Palette entry point: a repeat or end marker, or any spelling of a command token.
    pub fn press(&mut self, op: &str) -> bool {
        let op = op.trim();
        if REPEAT_OPS.contains(&op) {
            return self.begin_repeat(DEFAULT_REPEAT_COUNT);
        }
        if END_REPEAT_OPS.contains(&op) {
            return self.end_repeat();
        }
        match Command::parse(op) {
            Some(command) => self.append_leaf(command),
            None => false,
        }
    }

    pub fn flatten(&self) -> Vec<Command> {
        flatten(&self.nodes)
    }

    fn open_group_mut(&mut self) -> Option<&mut RepeatGroup> {
        let index = self.open_group?;
        match self.nodes.get_mut(index) {
            Some(ProgramNode::Repeat(group)) => Some(group),
            _ => None,
        }
    }

    fn group_is_empty(&self, index: usize) -> bool {
        matches!(self.nodes.get(index), Some(ProgramNode::Repeat(group)) if group.body.is_empty())
    }

    fn remove_top(&mut self, index: usize) -> bool {
        if index >= self.nodes.len() {
            return false;
        }
        self.nodes.remove(index);
        self.open_group = match self.open_group {
            Some(open) if open == index => None,
            Some(open) if open > index => Some(open - 1),
            other => other,
        };
        true
    }

    fn remove_inner(&mut self, group: usize, index: usize) -> bool {
        let Some(ProgramNode::Repeat(repeat)) = self.nodes.get_mut(group) else {
            return false;
        };
        if index >= repeat.body.len() {
            return false;
        }
        repeat.body.remove(index);

        // A closed group never stays empty.
        if repeat.body.is_empty() && self.open_group != Some(group) {
            self.remove_top(group);
        }
        true
    }
}

/// Expands repeat groups left to right. A group that nests another repeat is skipped whole.
pub fn flatten(nodes: &[ProgramNode]) -> Vec<Command> {
    let mut sequence = Vec::new();
    for node in nodes {
        match node {
            ProgramNode::Leaf(command) => sequence.push(*command),
            ProgramNode::Repeat(group) => {
                if group.contains_repeat() {
                    continue;
                }
                let body: Vec<Command> = group
                    .body
                    .iter()
                    .filter_map(|inner| match inner {
                        ProgramNode::Leaf(command) => Some(*command),
                        ProgramNode::Repeat(_) => None,
                    })
                    .collect();
                for _ in 0..clamp_repeat_count(group.count) {
                    sequence.extend_from_slice(&body);
                }
            }
        }
    }
    sequence
}

#[cfg(test)]
mod tests {
    use super::*;
    use Command::{MoveDown, MoveLeft, MoveRight, MoveUp};

    fn unlimited() -> Program {
        Program::new(ProgramLimits { command_cap: 100, repeat_inner_cap: 100 })
    }

    #[test]
    fn repeat_expands_in_place() {
        let mut program = unlimited();
        program.append_leaf(MoveUp);
        program.begin_repeat(3);
        program.append_leaf(MoveRight);
        program.end_repeat();

        assert_eq!(program.flatten(), vec![MoveUp, MoveRight, MoveRight, MoveRight]);
    }

    #[test]
    fn repeat_count_is_clamped_on_creation_and_edit() {
        let mut program = unlimited();
        program.begin_repeat(0);
        program.append_leaf(MoveLeft);
        program.end_repeat();
        let ProgramNode::Repeat(group) = &program.nodes()[0] else {
            panic!("expected repeat group, got {:?}", program.nodes()[0]);
        };
        assert_eq!(group.count(), REPEAT_MIN);

        assert!(program.set_repeat_count(0, 200));
        assert_eq!(program.flatten().len(), usize::from(REPEAT_MAX));
        assert!(!program.set_repeat_count(0, 11), "already clamped to the maximum");
    }

    #[test]
    fn repeat_inside_open_group_is_ignored() {
        let mut program = unlimited();
        assert!(program.begin_repeat(2));
        assert!(!program.begin_repeat(4));
        assert!(!program.press("repeat"));
        program.append_leaf(MoveDown);
        program.end_repeat();

        assert_eq!(program.nodes().len(), 1);
        assert_eq!(program.flatten(), vec![MoveDown, MoveDown]);
    }

    #[test]
    fn closing_empty_group_discards_it() {
        let mut program = unlimited();
        program.begin_repeat(5);
        assert!(program.end_repeat());
        assert!(program.is_empty());
        assert!(!program.end_repeat(), "nothing is open any more");
    }

    #[test]
    fn malformed_nested_group_is_skipped_when_flattening() {
        let nested = RepeatGroup::from_nodes(
            3,
            vec![
                ProgramNode::Leaf(MoveUp),
                ProgramNode::Repeat(RepeatGroup::new(2, [MoveLeft])),
            ],
        );
        let program = Program::from_nodes(
            vec![
                ProgramNode::Leaf(MoveRight),
                ProgramNode::Repeat(nested),
                ProgramNode::Leaf(MoveDown),
            ],
            ProgramLimits::default(),
        );

        assert_eq!(program.flatten(), vec![MoveRight, MoveDown]);
    }

    #[test]
    fn command_cap_counts_leaves_inside_groups_but_not_the_group() {
        let mut program = Program::new(ProgramLimits { command_cap: 3, repeat_inner_cap: 12 });
        program.append_leaf(MoveUp);
        assert!(program.begin_repeat(2));
        program.append_leaf(MoveRight);
        program.append_leaf(MoveRight);
        assert!(!program.append_leaf(MoveRight), "cap of three leaves reached");
        program.end_repeat();

        assert_eq!(program.used(), 3);
        assert_eq!(program.remaining(), 0);
        assert!(!program.begin_repeat(2), "no room for even one more leaf");
    }

    #[test]
    fn repeat_inner_cap_limits_one_group_body() {
        let mut program = Program::new(ProgramLimits { command_cap: 20, repeat_inner_cap: 2 });
        program.begin_repeat(2);
        assert!(program.append_leaf(MoveUp));
        assert!(program.append_leaf(MoveUp));
        assert!(!program.append_leaf(MoveUp));
        program.end_repeat();
        assert!(program.append_leaf(MoveUp), "top level is not bound by the inner cap");
    }

    #[test]
    fn removing_last_leaf_of_closed_group_drops_the_group() {
        let mut program = unlimited();
        program.append_leaf(MoveUp);
        program.begin_repeat(2);
        program.append_leaf(MoveLeft);
        program.end_repeat();

        assert!(program.remove_node(NodeRef::Inner { group: 1, index: 0 }));
        assert_eq!(program.nodes(), &[ProgramNode::Leaf(MoveUp)]);
    }

    #[test]
    fn deleting_while_open_group_is_empty_cancels_recording() {
        let mut program = unlimited();
        program.append_leaf(MoveUp);
        program.append_leaf(MoveDown);
        program.begin_repeat(2);

        assert!(program.remove_node(NodeRef::Top(0)));
        assert!(!program.is_recording_repeat());
        assert_eq!(program.nodes(), &[ProgramNode::Leaf(MoveDown)]);

        assert!(program.append_leaf(MoveLeft));
        assert_eq!(program.flatten(), vec![MoveDown, MoveLeft]);
    }

    #[test]
    fn removing_before_open_group_keeps_recording_into_it() {
        let mut program = unlimited();
        program.append_leaf(MoveUp);
        program.begin_repeat(2);
        program.append_leaf(MoveRight);

        assert!(program.remove_node(NodeRef::Top(0)));
        assert_eq!(program.open_group(), Some(0));
        program.append_leaf(MoveDown);
        program.end_repeat();
        assert_eq!(program.flatten(), vec![MoveRight, MoveDown, MoveRight, MoveDown]);
    }

    #[test]
    fn press_accepts_every_spelling_and_ignores_unknown_ops() {
        let mut program = unlimited();
        assert!(program.press("up"));
        assert!(program.press("→"));
        assert!(program.press("ひだり"));
        assert!(!program.press("jump"));
        assert!(program.press("くり返し"));
        assert!(program.press("うしろ"));
        assert!(program.press("end"));

        assert_eq!(program.flatten(), vec![MoveUp, MoveRight, MoveLeft, MoveDown, MoveDown]);
    }

    #[test]
    fn out_of_range_removal_is_a_no_op() {
        let mut program = unlimited();
        program.append_leaf(MoveUp);
        assert!(!program.remove_node(NodeRef::Top(4)));
        assert!(!program.remove_node(NodeRef::Inner { group: 0, index: 0 }));
        assert_eq!(program.used(), 1);
    }
}

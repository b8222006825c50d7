//! Tests for linked portals, grouped portal gates and the warp cooldown.

use super::support::*;
use crate::content::PortalDef;

#[test]
fn linked_portal_moves_the_actor_both_ways_after_cooldown() {
    let a = Pos { y: 0, x: 1 };
    let b = Pos { y: 2, x: 2 };
    let mut def = open_def(4, 4, Pos { y: 3, x: 0 });
    def.portals.push(portal(a, b, &[]));
    let mut level = build(&def);
    let mission = reach_only();
    let at = Duration::from_millis;

    let hop = level.apply(Command::MoveRight, &mission, at(300));
    assert_eq!(hop.outcome, TickOutcome::Warped { from: a, to: b });
    assert_eq!(level.actor(), b);

    level.apply(Command::MoveLeft, &mission, at(350));
    let cooling = level.apply(Command::MoveRight, &mission, at(400));
    assert_eq!(cooling.outcome, TickOutcome::Moved { to: b });

    level.apply(Command::MoveLeft, &mission, at(700));
    let back = level.apply(Command::MoveRight, &mission, at(1000));
    assert_eq!(back.outcome, TickOutcome::Warped { from: b, to: a });
}

#[test]
fn link_with_missing_requirement_is_fatal() {
    let mut def = open_def(4, 4, Pos { y: 3, x: 0 });
    def.portals.push(portal(Pos { y: 0, x: 1 }, Pos { y: 2, x: 2 }, &[ItemKind::PortalKey]));
    let mut level = build(&def);

    let report = level.apply(Command::MoveRight, &reach_only(), Duration::ZERO);
    assert_eq!(report.outcome, TickOutcome::Fatal(FailCause::WarpRequirementUnmet));
    assert_eq!(level.halted(), Some(FailCause::WarpRequirementUnmet));
}

#[test]
fn link_requiring_portal_key_consumes_it() {
    let mut def = open_def(4, 4, Pos { y: 3, x: 0 });
    def.pickups.push(pickup(1, 0, ItemKind::PortalKey));
    def.portals.push(portal(Pos { y: 1, x: 1 }, Pos { y: 2, x: 3 }, &[ItemKind::PortalKey]));
    let mut level = build(&def);

    let outcomes = drive(&mut level, &reach_only(), &[Command::MoveDown, Command::MoveRight]);
    assert_eq!(outcomes[0], TickOutcome::PickedUp { item: ItemKind::PortalKey });
    assert_eq!(outcomes[1], TickOutcome::Warped { from: Pos { y: 1, x: 1 }, to: Pos { y: 2, x: 3 } });
    assert!(!level.inventory().has(ItemKind::PortalKey));
}

#[test]
fn one_way_link_does_not_warp_from_its_exit() {
    let a = Pos { y: 2, x: 2 };
    let b = Pos { y: 0, x: 1 };
    let mut def = open_def(4, 4, Pos { y: 3, x: 0 });
    def.portals.push(PortalDef { bidirectional: false, ..portal(a, b, &[]) });
    let mut level = build(&def);

    let report = level.apply(Command::MoveRight, &reach_only(), Duration::ZERO);
    assert_eq!(report.outcome, TickOutcome::Moved { to: b });
}

#[test]
fn grouped_portal_gates_cycle_in_authoring_order() {
    let mut def = open_def(4, 4, Pos { y: 3, x: 0 });
    def.obstacles.push(portal_gate(0, 3, "g"));
    def.obstacles.push(portal_gate(0, 1, "g"));
    let mut level = build(&def);

    let report = level.apply(Command::MoveRight, &reach_only(), Duration::ZERO);
    assert_eq!(report.outcome, TickOutcome::Warped { from: Pos { y: 0, x: 1 }, to: Pos { y: 0, x: 3 } });
}

#[test]
fn lone_portal_gate_is_just_a_passable_cell() {
    let mut def = open_def(4, 4, Pos { y: 3, x: 0 });
    def.obstacles.push(portal_gate(0, 1, "solo"));
    let mut level = build(&def);

    let report = level.apply(Command::MoveRight, &reach_only(), Duration::ZERO);
    assert_eq!(report.outcome, TickOutcome::Moved { to: Pos { y: 0, x: 1 } });
}

#[test]
fn keyed_portal_gate_spends_the_portal_key() {
    let mut def = open_def(4, 4, Pos { y: 3, x: 0 });
    def.pickups.push(pickup(1, 0, ItemKind::PortalKey));
    let mut keyed = portal_gate(1, 1, "g");
    keyed.pass = PassRule::NeedItem;
    keyed.item = Some(ItemKind::PortalKey);
    def.obstacles.push(keyed);
    def.obstacles.push(portal_gate(3, 3, "g"));
    let mut level = build(&def);
    assert!(!level.can_enter(Pos { y: 1, x: 1 }));

    let outcomes = drive(&mut level, &reach_only(), &[Command::MoveDown, Command::MoveRight]);
    assert_eq!(outcomes[1], TickOutcome::Warped { from: Pos { y: 1, x: 1 }, to: Pos { y: 3, x: 3 } });
    assert!(!level.inventory().has(ItemKind::PortalKey));
}

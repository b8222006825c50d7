//! Portal resolution. Explicit portal links win; grouped portal gates are the fallback
//! when a level declares no links at all.

use tracing::debug;

use super::*;

impl Level {
    pub(super) fn try_warp(
        &mut self,
        here: Pos,
        now: Duration,
        events: &mut Vec<LevelEvent>,
    ) -> Option<TickOutcome> {
        if let Some(last) = self.last_warp_at
            && now.saturating_sub(last) < self.warp_cooldown
        {
            return None;
        }

        if !self.portals.is_empty() {
            return self.warp_through_link(here, now, events);
        }
        self.warp_through_group(here, now, events)
    }

    fn warp_through_link(
        &mut self,
        here: Pos,
        now: Duration,
        events: &mut Vec<LevelEvent>,
    ) -> Option<TickOutcome> {
        let (link, destination) = self.portals.iter().find_map(|link| {
            if link.a == here {
                Some((link, link.b))
            } else if link.bidirectional && link.b == here {
                Some((link, link.a))
            } else {
                None
            }
        })?;

        if !link.requires.iter().all(|item| self.inventory.has(*item)) {
            return Some(TickOutcome::Fatal(FailCause::WarpRequirementUnmet));
        }
        let consumes_portal_key = link.requires.contains(&ItemKind::PortalKey);

        if consumes_portal_key {
            self.inventory.take_all(ItemKind::PortalKey);
            self.refresh_gates(events);
        }
        Some(self.warp_to(here, destination, now, events))
    }

    fn warp_through_group(
        &mut self,
        here: Pos,
        now: Duration,
        events: &mut Vec<LevelEvent>,
    ) -> Option<TickOutcome> {
        let gate = self.obstacles.get(&here).filter(|gate| gate.kind == ObstacleKind::Portal)?;

        let mut ring: Vec<&Obstacle> = self
            .obstacles
            .values()
            .filter(|other| other.kind == ObstacleKind::Portal && other.group == gate.group)
            .collect();
        if ring.len() <= 1 {
            return None;
        }
        ring.sort_by_key(|other| other.order);
        let index = ring.iter().position(|other| other.pos == here)?;
        let destination = ring[(index + 1) % ring.len()].pos;
        let consumes_portal_key =
            gate.pass == PassRule::NeedItem && gate.item == Some(ItemKind::PortalKey);

        if consumes_portal_key && self.inventory.take_all(ItemKind::PortalKey) > 0 {
            self.refresh_gates(events);
        }
        Some(self.warp_to(here, destination, now, events))
    }

    fn warp_to(
        &mut self,
        from: Pos,
        to: Pos,
        now: Duration,
        events: &mut Vec<LevelEvent>,
    ) -> TickOutcome {
        let to = self.grid.clamp(to);
        debug!(from_x = from.x, from_y = from.y, to_x = to.x, to_y = to.y, "warp");
        self.actor = to;
        self.last_warp_at = Some(now);
        events.push(LevelEvent::Warped { from, to });
        TickOutcome::Warped { from, to }
    }
}

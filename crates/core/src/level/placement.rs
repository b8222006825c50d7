//! Build-time cell allocation: the occupancy set, free-cell search and goal patterns.
//! This module exists so that placement randomness stays behind one seeded stream.
//! It does not know about obstacles, pickups or enemies as such.

use std::collections::BTreeSet;

use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::Rng;

use crate::content::{GoalPattern, GoalSpec};
use crate::types::{Grid, Pos};

const RANDOM_TRIES: usize = 100;

pub(super) fn random_index(rng: &mut ChaCha8Rng, len: usize) -> usize {
    debug_assert!(len > 0);
    (rng.next_u64() % len as u64) as usize
}

/// Cells already claimed by a blocking entity, the start, or the goal.
pub(super) struct Occupancy {
    grid: Grid,
    taken: BTreeSet<Pos>,
}

impl Occupancy {
    pub(super) fn new(grid: Grid) -> Self {
        Self { grid, taken: BTreeSet::new() }
    }

    pub(super) fn is_free(&self, pos: Pos) -> bool {
        self.grid.contains(pos) && !self.taken.contains(&pos)
    }

    /// Claims `pos` if it is inside the grid and unclaimed.
    pub(super) fn claim(&mut self, pos: Pos) -> bool {
        self.is_free(pos) && self.taken.insert(pos)
    }

    /// Random tries first, then a row-major scan. `None` once the grid is full.
    pub(super) fn claim_free_cell(&mut self, rng: &mut ChaCha8Rng) -> Option<Pos> {
        for _ in 0..RANDOM_TRIES {
            let pos = Pos {
                y: random_index(rng, self.grid.height as usize) as i32,
                x: random_index(rng, self.grid.width as usize) as i32,
            };
            if self.claim(pos) {
                return Some(pos);
            }
        }
        let pos = self.grid.cells().find(|pos| !self.taken.contains(pos))?;
        self.taken.insert(pos);
        Some(pos)
    }

    /// Uses `preferred` when it is free, otherwise any free cell.
    pub(super) fn claim_preferred(
        &mut self,
        preferred: Option<Pos>,
        rng: &mut ChaCha8Rng,
    ) -> Option<Pos> {
        if let Some(pos) = preferred
            && self.claim(pos)
        {
            return Some(pos);
        }
        self.claim_free_cell(rng)
    }
}

/// Candidate goal cells for a pattern, excluding the start cell.
pub(super) fn goal_candidates(grid: Grid, start: Pos, pattern: GoalPattern) -> Vec<Pos> {
    let Grid { width, height } = grid;
    let mut candidates: Vec<Pos> = match pattern {
        GoalPattern::Line => (0..width).map(|x| Pos { y: height / 2, x }).collect(),
        GoalPattern::Zigzag => {
            (0..width).map(|x| Pos { y: if x % 2 == 0 { 0 } else { 1.min(height - 1) }, x }).collect()
        }
        GoalPattern::Perimeter => {
            let mut ring = Vec::new();
            for x in 0..width {
                ring.push(Pos { y: 0, x });
                ring.push(Pos { y: height - 1, x });
            }
            for y in 1..height - 1 {
                ring.push(Pos { y, x: 0 });
                ring.push(Pos { y, x: width - 1 });
            }
            ring
        }
        GoalPattern::Diagonal => (0..width.min(height)).map(|i| Pos { y: i, x: i }).collect(),
        GoalPattern::Random => grid.cells().collect(),
    };
    candidates.retain(|pos| *pos != start && grid.contains(*pos));
    candidates
}

/// Picks a goal from the pattern, preferring cells at least `min_distance` from start.
pub(super) fn pick_goal(grid: Grid, start: Pos, spec: &GoalSpec, rng: &mut ChaCha8Rng) -> Pos {
    let candidates = goal_candidates(grid, start, spec.pattern);
    let far_enough: Vec<Pos> =
        candidates.iter().copied().filter(|pos| pos.manhattan(start) >= spec.min_distance).collect();
    let pool = if far_enough.is_empty() { &candidates } else { &far_enough };

    if pool.is_empty() {
        return grid.clamp(Pos { y: grid.height - 1, x: grid.width - 1 });
    }
    pool[random_index(rng, pool.len())]
}

#[cfg(test)]
mod tests {
    use rand_chacha::rand_core::SeedableRng;

    use super::*;

    const GRID: Grid = Grid { width: 6, height: 5 };

    #[test]
    fn patterns_never_offer_the_start_cell() {
        let start = Pos { y: 0, x: 0 };
        for pattern in [
            GoalPattern::Line,
            GoalPattern::Zigzag,
            GoalPattern::Perimeter,
            GoalPattern::Diagonal,
            GoalPattern::Random,
        ] {
            let candidates = goal_candidates(GRID, start, pattern);
            assert!(!candidates.is_empty(), "{pattern:?} produced no candidates");
            assert!(!candidates.contains(&start), "{pattern:?} offered the start cell");
        }
    }

    #[test]
    fn line_and_diagonal_follow_their_shape() {
        let start = Pos { y: 4, x: 5 };
        assert!(goal_candidates(GRID, start, GoalPattern::Line).iter().all(|pos| pos.y == 2));
        assert!(goal_candidates(GRID, start, GoalPattern::Diagonal).iter().all(|pos| pos.x == pos.y));
        assert_eq!(goal_candidates(GRID, start, GoalPattern::Perimeter).len(), 17);
    }

    #[test]
    fn pick_goal_respects_min_distance_when_possible() {
        let start = Pos { y: 0, x: 0 };
        let spec = GoalSpec { pattern: GoalPattern::Random, min_distance: 8 };
        for seed in 0..32 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let goal = pick_goal(GRID, start, &spec, &mut rng);
            assert!(goal.manhattan(start) >= 8, "seed {seed} picked {goal:?}");
        }

        let unreachable = GoalSpec { pattern: GoalPattern::Line, min_distance: 100 };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let goal = pick_goal(GRID, start, &unreachable, &mut rng);
        assert_eq!(goal.y, 2, "falls back to the unfiltered pattern");
    }

    #[test]
    fn free_cell_search_fills_the_grid_then_gives_up() {
        let grid = Grid { width: 4, height: 4 };
        let mut occupancy = Occupancy::new(grid);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut claimed = BTreeSet::new();
        for _ in 0..16 {
            let pos = occupancy.claim_free_cell(&mut rng).unwrap();
            assert!(claimed.insert(pos), "cell {pos:?} handed out twice");
        }
        assert_eq!(occupancy.claim_free_cell(&mut rng), None);
    }

    #[test]
    fn preferred_cell_is_used_only_when_free() {
        let mut occupancy = Occupancy::new(GRID);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let wanted = Pos { y: 1, x: 1 };
        assert_eq!(occupancy.claim_preferred(Some(wanted), &mut rng), Some(wanted));
        let second = occupancy.claim_preferred(Some(wanted), &mut rng).unwrap();
        assert_ne!(second, wanted);
        let outside = occupancy.claim_preferred(Some(Pos { y: 9, x: 9 }), &mut rng).unwrap();
        assert!(GRID.contains(outside));
    }
}

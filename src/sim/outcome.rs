//! Win-condition evaluation

use serde::{Deserialize, Serialize};

use super::state::{Ball, BallId, Side};

/// Terminal outcome of a battle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleResult {
    pub seed: u64,
    /// Winning ball. Set for double-KO draws too (tie-break); `None` only on timeout.
    pub winner: Option<BallId>,
    pub winner_side: Option<Side>,
    pub is_draw: bool,
    /// Force-terminated at the tick cap
    pub timed_out: bool,
    pub ticks: u64,
    pub left_weapon: String,
    pub right_weapon: String,
}

impl BattleResult {
    /// Weapon kind of the winning side, if any
    pub fn winner_weapon(&self) -> Option<&str> {
        match self.winner_side? {
            Side::Left => Some(&self.left_weapon),
            Side::Right => Some(&self.right_weapon),
        }
    }
}

/// Verdict after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Continue,
    Victory(BallId),
    /// Both sides fell this tick; the ball is the tie-break winner
    DoubleKo(BallId),
}

/// A side is dead once its king dies, or once it has no living balls at all
pub fn side_dead(balls: &[Ball], side: Side) -> bool {
    let mut members = balls.iter().filter(|b| b.side == side).peekable();
    if members.peek().is_none() {
        return true;
    }
    let mut any_alive = false;
    for ball in members {
        if ball.is_original && !ball.alive {
            return true;
        }
        any_alive |= ball.alive;
    }
    !any_alive
}

fn representative(balls: &[Ball], side: Side) -> Option<&Ball> {
    balls
        .iter()
        .find(|b| b.side == side && b.is_original)
        .or_else(|| balls.iter().find(|b| b.side == side))
}

/// Decide whether the battle is over
///
/// Double KO: higher current hp wins the tie-break, then higher hp at the
/// start of the tick, then the left side.
pub fn evaluate(balls: &[Ball]) -> Verdict {
    let left_dead = side_dead(balls, Side::Left);
    let right_dead = side_dead(balls, Side::Right);

    match (left_dead, right_dead) {
        (false, false) => Verdict::Continue,
        (true, true) => {
            let winner = match (representative(balls, Side::Left), representative(balls, Side::Right)) {
                (Some(left), Some(right)) => tie_break(left, right),
                (Some(only), None) | (None, Some(only)) => only.id,
                (None, None) => BallId(0),
            };
            Verdict::DoubleKo(winner)
        }
        (true, false) => Verdict::Victory(survivor(balls, Side::Right)),
        (false, true) => Verdict::Victory(survivor(balls, Side::Left)),
    }
}

fn tie_break(left: &Ball, right: &Ball) -> BallId {
    if left.hp != right.hp {
        return if left.hp > right.hp { left.id } else { right.id };
    }
    if right.hp_at_tick_start > left.hp_at_tick_start {
        right.id
    } else {
        left.id
    }
}

/// The king if alive, else the first living member
fn survivor(balls: &[Ball], side: Side) -> BallId {
    balls
        .iter()
        .find(|b| b.side == side && b.is_original && b.alive)
        .or_else(|| balls.iter().find(|b| b.side == side && b.alive))
        .map_or(BallId(0), |b| b.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::state::configure;

    fn balls() -> Vec<Ball> {
        configure("duplicator", "sword", 5, Settings::default()).unwrap().balls
    }

    #[test]
    fn test_both_alive_continues() {
        assert_eq!(evaluate(&balls()), Verdict::Continue);
    }

    #[test]
    fn test_single_death_victory() {
        let mut balls = balls();
        balls[1].take_damage(1000.0);
        assert_eq!(evaluate(&balls), Verdict::Victory(BallId(0)));
    }

    #[test]
    fn test_double_ko_prefers_higher_hp_before_zero() {
        let mut balls = balls();
        balls[0].hp_at_tick_start = 4.0;
        balls[1].hp_at_tick_start = 9.0;
        balls[0].take_damage(1000.0);
        balls[1].take_damage(1000.0);
        assert_eq!(evaluate(&balls), Verdict::DoubleKo(BallId(1)));
    }

    #[test]
    fn test_double_ko_exact_tie_goes_left() {
        let mut balls = balls();
        balls[0].take_damage(1000.0);
        balls[1].take_damage(1000.0);
        assert_eq!(evaluate(&balls), Verdict::DoubleKo(BallId(0)));
    }

    #[test]
    fn test_king_death_ends_side_despite_clones() {
        let mut state = configure("duplicator", "sword", 5, Settings::default()).unwrap();
        state.spawn_clone(BallId(0), 0.0).unwrap();
        state.balls[0].take_damage(1000.0);
        assert!(state.balls[2].alive);
        assert!(side_dead(&state.balls, Side::Left));
        assert_eq!(evaluate(&state.balls), Verdict::Victory(BallId(1)));
    }

    #[test]
    fn test_clone_death_does_not_end_side() {
        let mut state = configure("duplicator", "sword", 5, Settings::default()).unwrap();
        state.spawn_clone(BallId(0), 0.0).unwrap();
        state.balls[2].take_damage(1000.0);
        assert!(!side_dead(&state.balls, Side::Left));
    }
}

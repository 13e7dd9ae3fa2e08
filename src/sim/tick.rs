//! Fixed timestep battle tick
//!
//! Advances a battle by one logical frame. Steps run in a fixed order and
//! each one only mutates what it owns; reordering them changes which hits land
//! when ball-ball and weapon-ball contact coincide.

use std::f32::consts::PI;

use glam::Vec2;

use super::arena::Wall;
use super::collision::{circle_circle, line_circle, resolve_circle_circle, separate_circles, tip_wall_impulse};
use super::events::{HitSource, TickEvent, TickEvents};
use super::hazard::Hazard;
use super::outcome::{evaluate, BattleResult, Verdict};
use super::state::{Ball, BallId, BattleState, Body, Side};
use super::weapon::{Action, HitReport, Weapon, WeaponCtx};
use crate::consts::*;
use crate::normalize_angle;

/// Ball-ball closing speed that triggers a hit-stop
const HEAVY_IMPACT_SPEED: f32 = 5.0;
/// Wall speed that triggers a hit-stop
const HEAVY_WALL_SPEED: f32 = 7.0;
const PARRY_HIT_STOP: u32 = 4;
const SUPER_HIT_STOP: u32 = 4;
/// Color reported for status-effect damage
const STATUS_COLOR: u32 = 0x7FFF7F;

/// Advance the battle by one fixed timestep
pub fn tick(state: &mut BattleState) -> TickEvents {
    let mut events = TickEvents::new();
    if state.result.is_some() {
        return events;
    }
    state.tick += 1;

    // 1. Hit-stop freezes physics but still counts toward the tick cap
    if state.hit_stop > 0 {
        state.hit_stop -= 1;
    } else {
        for ball in &mut state.balls {
            ball.hp_at_tick_start = ball.hp;
        }
        advance_balls(state, &mut events);
        weapon_wall_bounces(state, &mut events);
        ball_collisions(state, &mut events);
        contact_auras(state, &mut events);
        melee_reach(state, &mut events);
        parries(state, &mut events);
        update_projectiles(state, &mut events);
        update_hazards(state, &mut events);
        settle(state, &mut events);
    }

    if state.result.is_none() && state.tick >= state.settings.max_ticks {
        log::info!(
            "Battle timed out after {} ticks (seed {})",
            state.tick,
            state.seed
        );
        finish(state, None, true, true, &mut events);
    }
    events
}

/// Terminal result, once the battle has one
pub fn is_terminal(state: &BattleState) -> Option<&BattleResult> {
    state.result.as_ref()
}

// === 2. Ball physics, weapon updates, status effects ===

fn advance_balls(state: &mut BattleState, events: &mut TickEvents) {
    let count = state.balls.len();
    for i in 0..count {
        if !state.balls[i].alive {
            continue;
        }

        let ball = &mut state.balls[i];
        if let Some(wall) = ball.integrate(&state.settings) {
            let speed = ball.speed();
            let pos = wall_contact(ball.pos, ball.radius, wall);
            events.push(TickEvent::WallImpact {
                ball: ball.id,
                pos,
                speed,
            });
            if speed >= HEAVY_WALL_SPEED {
                hit_stop(state, 2);
            }
        }

        let bodies = state.bodies();
        let ((), actions) = with_weapon(state, i, &bodies, |weapon, ctx| weapon.update(ctx));
        apply_actions(state, BallId(i), actions, events);

        let damage = state.balls[i].tick_status();
        if damage > 0.0 {
            deal_damage(state, BallId(i), damage, None, HitSource::Status, STATUS_COLOR, events);
        }
    }
}

fn wall_contact(pos: Vec2, radius: f32, wall: Wall) -> Vec2 {
    match wall {
        Wall::Left => pos - Vec2::X * radius,
        Wall::Right => pos + Vec2::X * radius,
        Wall::Top => pos - Vec2::Y * radius,
        Wall::Bottom => pos + Vec2::Y * radius,
    }
}

// === 3. Weapon tips against walls ===

fn weapon_wall_bounces(state: &mut BattleState, events: &mut TickEvents) {
    let settings = &state.settings;
    if !settings.weapon_wall_bounce {
        return;
    }
    for ball in state.balls.iter_mut().filter(|b| b.alive) {
        let stats = &ball.weapon.stats;
        if stats.is_ranged || stats.reach <= ball.radius {
            continue;
        }
        let mut strength = settings.weapon_wall_bounce_strength;
        if settings.weapon_wall_damage_bounce {
            strength *= 1.0 + stats.current_damage * 0.1;
        }
        let tip = stats.tip(ball.pos);
        if let Some((_, impulse)) = tip_wall_impulse(tip, &settings.arena, strength) {
            ball.vel += impulse;
            events.push(TickEvent::WeaponWallImpact {
                ball: ball.id,
                pos: settings.arena.clamp_point(tip),
                speed: ball.vel.length(),
            });
        }
    }
}

// === 4. Ball-ball overlap and body contact ===

fn ball_collisions(state: &mut BattleState, events: &mut TickEvents) {
    let restitution = state.settings.ball_restitution;
    let n = state.balls.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let (a, b) = state.pair_mut(i, j);
            if !a.alive || !b.alive || !circle_circle(a.pos, a.radius, b.pos, b.radius) {
                continue;
            }
            let speed = (a.vel - b.vel).length();
            let normal = (b.pos - a.pos).normalize_or_zero();
            let pos = a.pos + normal * a.radius;
            separate_circles(a, b);
            resolve_circle_circle(a, b, restitution);
            let cross_side = a.side != b.side;
            let (a_id, b_id) = (a.id, b.id);

            events.push(TickEvent::BallImpact {
                a: a_id,
                b: b_id,
                pos,
                speed,
            });
            if speed >= HEAVY_IMPACT_SPEED {
                hit_stop(state, 2 + (speed / 5.0) as u32);
            }

            if cross_side {
                for (attacker, target) in [(i, j), (j, i)] {
                    if is_body_weapon(&state.balls[attacker].weapon)
                        && state.balls[attacker].alive
                        && state.balls[target].alive
                    {
                        land_contact_hit(state, attacker, target, HitSource::Body, events);
                    }
                }
            }
        }
    }
}

fn is_body_weapon(weapon: &Weapon) -> bool {
    weapon.stats.reach <= 0.0 && weapon.can_hit()
}

// === 5. Contact aura ===

fn contact_auras(state: &mut BattleState, events: &mut TickEvents) {
    let n = state.balls.len();
    for attacker in 0..n {
        for target in 0..n {
            let (a, t) = (&state.balls[attacker], &state.balls[target]);
            if !a.alive || !t.alive || a.side == t.side {
                continue;
            }
            let aura = a.weapon.stats.contact_aura;
            if aura <= 0.0 || !is_body_weapon(&a.weapon) {
                continue;
            }
            // exact overlaps were settled in step 4
            if circle_circle(a.pos, a.radius, t.pos, t.radius) {
                continue;
            }
            if circle_circle(a.pos, a.radius + aura, t.pos, t.radius) {
                land_contact_hit(state, attacker, target, HitSource::Aura, events);
            }
        }
    }
}

// === 6. Melee reach ===

fn melee_reach(state: &mut BattleState, events: &mut TickEvents) {
    let tip_distance = state.settings.parry_tip_distance;
    let n = state.balls.len();
    for attacker in 0..n {
        let a = &state.balls[attacker];
        if !a.alive || a.weapon.stats.reach <= 0.0 || !a.weapon.can_hit() {
            continue;
        }
        for target in 0..n {
            let (a, t) = (&state.balls[attacker], &state.balls[target]);
            if !t.alive || a.side == t.side {
                continue;
            }
            let (start, tip) = a.weapon.stats.blade(a.pos);
            if !line_circle(start, tip, t.pos, t.radius) {
                continue;
            }
            // parry wins over a simultaneous hit; step 7 resolves it
            if weapons_clash(a, t, tip_distance) {
                continue;
            }
            land_contact_hit(state, attacker, target, HitSource::Melee, events);
            break;
        }
    }
}

// === 7. Parries ===

/// Tips close together, or one blade crossing the other's tip
fn weapons_clash(a: &Ball, b: &Ball, tip_distance: f32) -> bool {
    if !a.weapon.can_parry() || !b.weapon.can_parry() {
        return false;
    }
    let (a_start, a_tip) = a.weapon.stats.blade(a.pos);
    let (b_start, b_tip) = b.weapon.stats.blade(b.pos);
    if a_tip.distance_squared(b_tip) < tip_distance * tip_distance {
        return true;
    }
    let tip_radius = tip_distance * 0.5;
    line_circle(a_start, a_tip, b_tip, tip_radius) || line_circle(b_start, b_tip, a_tip, tip_radius)
}

fn parries(state: &mut BattleState, events: &mut TickEvents) {
    let tip_distance = state.settings.parry_tip_distance;
    let cooldown = state.settings.parry_cooldown;
    let n = state.balls.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let (a, b) = (&state.balls[i], &state.balls[j]);
            if !a.alive || !b.alive || a.side == b.side || !weapons_clash(a, b, tip_distance) {
                continue;
            }
            let pos = (a.weapon.stats.tip(a.pos) + b.weapon.stats.tip(b.pos)) / 2.0;
            let deflect_a = (state.rng.next_f32() - 0.3) * PI * 0.4;
            let deflect_b = (state.rng.next_f32() - 0.3) * PI * 0.4;

            let (a, b) = state.pair_mut(i, j);
            a.weapon.stats.angle = normalize_angle(a.weapon.stats.angle + deflect_a);
            b.weapon.stats.angle = normalize_angle(b.weapon.stats.angle - deflect_b);
            for stats in [&mut a.weapon.stats, &mut b.weapon.stats] {
                stats.parry_cooldown = cooldown;
                stats.deflect_reverse = PARRY_REVERSE_TICKS;
            }
            let (a_id, b_id) = (a.id, b.id);

            state.stats.parries += 1;
            events.push(TickEvent::Parry { a: a_id, b: b_id, pos });
            hit_stop(state, PARRY_HIT_STOP);
        }
    }
}

// === 8. Projectiles ===

fn update_projectiles(state: &mut BattleState, events: &mut TickEvents) {
    let arena = state.settings.arena;
    let gravity = state.settings.gravity_vector();
    let bodies = state.bodies();

    let count = state.projectiles.len();
    for idx in 0..count {
        let step = state.projectiles[idx].update(&arena, gravity, &bodies);
        if let Some(pos) = step.bounced_at {
            let p = &state.projectiles[idx];
            events.push(TickEvent::ProjectileBounce {
                pos,
                speed: p.vel.length(),
                color: p.color,
            });
        }

        if state.projectiles[idx].alive {
            for t in 0..state.balls.len() {
                let target = state.balls[t].body();
                let projectile = &mut state.projectiles[idx];
                if !projectile.can_hit(&target) {
                    continue;
                }
                let (owner, damage, color) = (projectile.owner, projectile.damage, projectile.color);
                projectile.register_hit(target.id);
                credit_owner(state, owner, target.id, damage, HitSource::Projectile, color, events);
                break;
            }
        }

        if let Some(hazard) = state.projectiles[idx].take_miss_hazard() {
            spawn_hazard(state, hazard, events);
        }
    }

    state.projectiles.retain(|p| p.alive);
    let cap = state.settings.max_projectiles;
    if state.projectiles.len() > cap {
        let excess = state.projectiles.len() - cap;
        state.projectiles.drain(..excess);
        state.stats.projectiles_evicted += excess as u32;
        log::debug!("Projectile cap {} reached, evicted {} oldest", cap, excess);
    }
}

// === 9. Hazards ===

fn update_hazards(state: &mut BattleState, events: &mut TickEvents) {
    let arena = state.settings.arena;
    let count = state.hazards.len();
    for h in 0..count {
        if !state.hazards[h].update(&arena) {
            continue;
        }
        let hazard = &state.hazards[h];
        let targets: Vec<BallId> = state
            .balls
            .iter()
            .filter(|b| hazard.affects(&b.body()))
            .map(|b| b.id)
            .collect();
        let (owner, damage, color, status) = (hazard.owner, hazard.damage, hazard.color, hazard.status);
        for target in targets {
            if let Some(effect) = status {
                state.balls[target.0].apply_status(effect);
            }
            credit_owner(state, owner, target, damage, HitSource::Hazard, color, events);
        }
    }
    state.hazards.retain(|h| h.alive);
}

// === 10. Win condition ===

fn settle(state: &mut BattleState, events: &mut TickEvents) {
    let left_hp = state.representative(Side::Left).map_or(0.0, |b| b.hp);
    let right_hp = state.representative(Side::Right).map_or(0.0, |b| b.hp);
    state
        .excitement
        .record_frame(left_hp, right_hp, state.settings.ball_max_hp);

    match evaluate(&state.balls) {
        Verdict::Continue => {}
        Verdict::Victory(winner) => finish(state, Some(winner), false, false, events),
        Verdict::DoubleKo(winner) => finish(state, Some(winner), true, false, events),
    }
}

fn finish(
    state: &mut BattleState,
    winner: Option<BallId>,
    is_draw: bool,
    timed_out: bool,
    events: &mut TickEvents,
) {
    let winner_side = winner.and_then(|id| state.ball(id)).map(|b| b.side);

    // Whatever is left of the losing side falls with its king
    if let (Some(side), false) = (winner_side, is_draw) {
        for ball in state.balls.iter_mut().filter(|b| b.side != side) {
            let pos = ball.pos;
            if ball.kill() {
                events.push(TickEvent::Death {
                    ball: ball.id,
                    side: ball.side,
                    pos,
                });
            }
        }
    }

    let result = BattleResult {
        seed: state.seed,
        winner,
        winner_side,
        is_draw,
        timed_out,
        ticks: state.tick,
        left_weapon: state.weapon_kind(Side::Left).to_string(),
        right_weapon: state.weapon_kind(Side::Right).to_string(),
    };

    match (winner, winner_side, is_draw) {
        (Some(id), Some(side), false) => {
            log::info!(
                "{} ({}) wins after {} ticks (seed {})",
                result.winner_weapon().unwrap_or(""),
                side.as_str(),
                state.tick,
                state.seed
            );
            events.push(TickEvent::Victory { winner: id, side });
        }
        _ => {
            log::info!("Draw after {} ticks (seed {})", state.tick, state.seed);
            events.push(TickEvent::Draw { winner, timed_out });
        }
    }
    state.result = Some(result);
}

// === Shared hit plumbing ===

fn hit_stop(state: &mut BattleState, ticks: u32) {
    if state.settings.hit_stop {
        state.hit_stop = state.hit_stop.max(ticks);
    }
}

/// Run a weapon hook for ball `owner` with a fresh context
fn with_weapon<R>(
    state: &mut BattleState,
    owner: usize,
    bodies: &[Body],
    f: impl FnOnce(&mut Weapon, &mut WeaponCtx<'_>) -> R,
) -> (R, Vec<Action>) {
    let mut actions = Vec::new();
    let ball = &mut state.balls[owner];
    let mut ctx = WeaponCtx {
        owner: ball.body(),
        bodies,
        settings: &state.settings,
        rng: &mut state.rng,
        actions: &mut actions,
    };
    let result = f(&mut ball.weapon, &mut ctx);
    (result, actions)
}

fn deal_damage(
    state: &mut BattleState,
    target: BallId,
    amount: f32,
    attacker: Option<BallId>,
    source: HitSource,
    color: u32,
    events: &mut TickEvents,
) {
    let Some(ball) = state.balls.get_mut(target.0) else {
        return;
    };
    if !ball.alive {
        return;
    }
    let pos = ball.pos;
    let died = ball.take_damage(amount);
    events.push(TickEvent::Hit {
        attacker,
        target,
        damage: amount,
        pos,
        color,
        source,
    });
    if died {
        events.push(TickEvent::Death {
            ball: target,
            side: ball.side,
            pos,
        });
    }
}

/// Melee, body or aura hit from `attacker`'s weapon
fn land_contact_hit(
    state: &mut BattleState,
    attacker: usize,
    target: usize,
    source: HitSource,
    events: &mut TickEvents,
) {
    let bodies = state.bodies();
    let target_body = bodies[target];
    let (report, actions) = with_weapon(state, attacker, &bodies, |weapon, ctx| weapon.on_hit(&target_body, ctx));
    let color = state.balls[attacker].weapon.stats.color;
    deal_damage(state, target_body.id, report.damage, Some(BallId(attacker)), source, color, events);
    record_hit(state, BallId(attacker), report, events);
    apply_actions(state, BallId(attacker), actions, events);
}

/// Projectile or hazard damage, credited to the owning weapon when there is one
fn credit_owner(
    state: &mut BattleState,
    owner: Option<BallId>,
    target: BallId,
    damage: f32,
    source: HitSource,
    color: u32,
    events: &mut TickEvents,
) {
    deal_damage(state, target, damage, owner, source, color, events);
    let Some(owner) = owner.filter(|id| id.0 < state.balls.len()) else {
        return;
    };
    let bodies = state.bodies();
    let target_body = bodies[target.0];
    let from_projectile = source == HitSource::Projectile;
    let (report, actions) = with_weapon(state, owner.0, &bodies, |weapon, ctx| {
        weapon.credit_hit(damage, &target_body, from_projectile, ctx)
    });
    record_hit(state, owner, report, events);
    apply_actions(state, owner, actions, events);
}

fn record_hit(state: &mut BattleState, attacker: BallId, report: HitReport, events: &mut TickEvents) {
    state.stats.total_hits += 1;
    state.excitement.record_hit();
    if !report.super_activated {
        return;
    }
    let ball = &state.balls[attacker.0];
    log::info!(
        "{} super activated (ball {:?}, tick {})",
        ball.weapon.kind(),
        attacker,
        state.tick
    );
    events.push(TickEvent::SuperActivated {
        ball: attacker,
        weapon: ball.weapon.kind(),
        pos: ball.pos,
        color: ball.weapon.stats.color,
    });
    state.stats.supers += 1;
    state.excitement.record_super();
    hit_stop(state, SUPER_HIT_STOP);
}

fn spawn_hazard(state: &mut BattleState, hazard: Hazard, events: &mut TickEvents) {
    events.push(TickEvent::HazardSpawned {
        pos: hazard.pos,
        radius: hazard.radius,
        color: hazard.color,
    });
    state.stats.hazards_spawned += 1;
    state.hazards.push(hazard);
}

/// Apply what a weapon hook queued
fn apply_actions(state: &mut BattleState, owner: BallId, actions: Vec<Action>, events: &mut TickEvents) {
    for action in actions {
        match action {
            Action::Fire(projectile) => {
                events.push(TickEvent::ProjectileFired {
                    owner,
                    pos: projectile.pos,
                    color: projectile.color,
                });
                state.stats.projectiles_fired += 1;
                state.projectiles.push(projectile);
            }
            Action::SpawnHazard(hazard) => spawn_hazard(state, hazard, events),
            Action::Status { target, effect } => {
                if let Some(ball) = state.balls.get_mut(target.0) {
                    ball.apply_status(effect);
                }
            }
            Action::Knockback { target, impulse } => {
                if let Some(ball) = state.balls.get_mut(target.0).filter(|b| b.alive) {
                    ball.vel += impulse;
                }
            }
            Action::Damage { target, amount } => {
                let color = state.balls[owner.0].weapon.stats.color;
                deal_damage(state, target, amount, None, HitSource::Effect, color, events);
            }
            Action::SetOwnerVelocity(vel) => state.balls[owner.0].vel = vel,
            Action::SetOwnerMaxSpeed(max_speed) => state.balls[owner.0].max_speed = max_speed,
            Action::Split { bonus_hp } => split_side(state, owner, bonus_hp, events),
        }
    }
}

/// Clone every living ball on `owner`'s side
fn split_side(state: &mut BattleState, owner: BallId, bonus_hp: f32, events: &mut TickEvents) {
    let side = state.balls[owner.0].side;
    let parents: Vec<BallId> = state.living(side).map(|b| b.id).collect();
    for parent in parents {
        match state.spawn_clone(parent, bonus_hp) {
            Ok(Some(clone)) => events.push(TickEvent::Split { parent, clone }),
            Ok(None) => {}
            Err(err) => log::warn!("Split of {:?} failed: {}", parent, err),
        }
    }
    log::debug!(
        "{} side split to {} balls at tick {}",
        side.as_str(),
        state.side_balls(side).count(),
        state.tick
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::state::configure;
    use proptest::prelude::*;

    fn still(left: &str, right: &str, seed: u64) -> BattleState {
        let mut state = configure(left, right, seed, Settings::default()).unwrap();
        for ball in &mut state.balls {
            ball.vel = Vec2::ZERO;
        }
        state
    }

    fn run_to_end(state: &mut BattleState) -> Vec<TickEvent> {
        let mut all = Vec::new();
        while is_terminal(state).is_none() {
            all.extend(tick(state));
        }
        all
    }

    #[test]
    fn test_determinism() {
        let mut a = configure("spear", "shuriken", 99999, Settings::default()).unwrap();
        let mut b = configure("spear", "shuriken", 99999, Settings::default()).unwrap();
        while is_terminal(&a).is_none() {
            let ea = tick(&mut a);
            let eb = tick(&mut b);
            assert_eq!(ea, eb);
            for (x, y) in a.balls.iter().zip(&b.balls) {
                assert_eq!(x.pos, y.pos);
                assert_eq!(x.hp, y.hp);
            }
        }
        assert_eq!(is_terminal(&a), is_terminal(&b));
    }

    #[test]
    fn test_timeout_is_draw() {
        let settings = Settings {
            max_ticks: 5,
            ..Default::default()
        };
        let mut state = configure("bow", "bow", 1, settings).unwrap();
        let events = run_to_end(&mut state);
        let result = is_terminal(&state).unwrap();
        assert!(result.is_draw && result.timed_out);
        assert_eq!(result.winner, None);
        assert_eq!(result.ticks, 5);
        assert!(matches!(events.last(), Some(TickEvent::Draw { winner: None, timed_out: true })));
    }

    #[test]
    fn test_terminal_state_is_frozen() {
        let settings = Settings {
            max_ticks: 3,
            ..Default::default()
        };
        let mut state = configure("sword", "dagger", 1, settings).unwrap();
        run_to_end(&mut state);
        let positions: Vec<Vec2> = state.balls.iter().map(|b| b.pos).collect();
        assert!(tick(&mut state).is_empty());
        assert_eq!(state.tick, 3);
        assert_eq!(positions, state.balls.iter().map(|b| b.pos).collect::<Vec<_>>());
    }

    #[test]
    fn test_hit_stop_freezes_physics() {
        let mut state = configure("sword", "dagger", 7, Settings::default()).unwrap();
        state.hit_stop = 2;
        let before: Vec<Vec2> = state.balls.iter().map(|b| b.pos).collect();
        assert!(tick(&mut state).is_empty());
        assert!(tick(&mut state).is_empty());
        assert_eq!(state.tick, 2);
        assert_eq!(before, state.balls.iter().map(|b| b.pos).collect::<Vec<_>>());
        tick(&mut state);
        assert_ne!(before, state.balls.iter().map(|b| b.pos).collect::<Vec<_>>());
    }

    #[test]
    fn test_victory_kills_losing_side() {
        let mut state = still("sword", "sword", 3);
        state.balls[1].hp = 0.5;
        state.balls[1].apply_status(crate::sim::status::StatusEffect::burn(5.0, 10, 1));
        let events = tick(&mut state);
        let result = is_terminal(&state).unwrap();
        assert_eq!(result.winner, Some(BallId(0)));
        assert_eq!(result.winner_side, Some(Side::Left));
        assert!(!result.is_draw);
        assert_eq!(result.winner_weapon(), Some("sword"));
        assert!(events.iter().any(|e| matches!(e, TickEvent::Death { ball: BallId(1), .. })));
        assert!(matches!(events.last(), Some(TickEvent::Victory { winner: BallId(0), .. })));
    }

    #[test]
    fn test_simultaneous_hazard_double_ko() {
        let mut state = still("sword", "sword", 42);
        state.balls[0].hp = 3.0;
        state.balls[1].hp = 5.0;
        let center = state.settings.arena.center();
        state.hazards.push(Hazard::new(center, 400.0, 10.0, 30, 100));
        tick(&mut state);
        let result = is_terminal(&state).unwrap();
        assert!(result.is_draw);
        assert!(!result.timed_out);
        assert_eq!(result.winner, Some(BallId(1)));
        assert!(state.balls.iter().all(|b| !b.alive && b.hp == 0.0));
    }

    #[test]
    fn test_body_contact_hits_once_per_pair() {
        let mut state = still("unarmed", "unarmed", 5);
        state.balls[0].pos = Vec2::new(250.0, 270.0);
        state.balls[1].pos = Vec2::new(290.0, 270.0);
        state.balls[0].vel = Vec2::new(4.0, 0.0);
        state.balls[1].vel = Vec2::new(-4.0, 0.0);
        let events = tick(&mut state);
        let hits: Vec<(Option<BallId>, BallId)> = events
            .iter()
            .filter_map(|e| match e {
                TickEvent::Hit { attacker, target, .. } => Some((*attacker, *target)),
                _ => None,
            })
            .collect();
        assert_eq!(hits.len(), 2);
        assert!(hits.contains(&(Some(BallId(0)), BallId(1))));
        assert!(hits.contains(&(Some(BallId(1)), BallId(0))));
        assert_eq!(state.balls[0].weapon.stats.hit_count, 1);
        assert_eq!(state.balls[1].weapon.stats.hit_count, 1);
    }

    fn hits_by_source(events: &[TickEvent], wanted: HitSource) -> Vec<(Option<BallId>, BallId)> {
        events
            .iter()
            .filter_map(|e| match e {
                TickEvent::Hit {
                    attacker,
                    target,
                    source,
                    ..
                } if *source == wanted => Some((*attacker, *target)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_aura_reaches_past_the_rim() {
        let mut state = still("duplicator", "unarmed", 5);
        // 55 apart: clear of the 50 unit overlap, inside the aura
        state.balls[0].pos = Vec2::new(250.0, 270.0);
        state.balls[1].pos = Vec2::new(305.0, 270.0);
        let events = tick(&mut state);
        assert_eq!(hits_by_source(&events, HitSource::Aura), vec![(Some(BallId(0)), BallId(1))]);
        assert!(hits_by_source(&events, HitSource::Body).is_empty());
        assert_eq!(state.balls[0].weapon.stats.hit_count, 1);
        assert_eq!(state.balls[1].weapon.stats.hit_count, 0);
        assert!(state.balls[1].hp < state.balls[1].max_hp);
    }

    #[test]
    fn test_overlap_is_not_hit_again_by_aura() {
        let mut state = still("duplicator", "unarmed", 5);
        state.balls[0].pos = Vec2::new(250.0, 270.0);
        state.balls[1].pos = Vec2::new(290.0, 270.0);
        let events = tick(&mut state);
        let body = hits_by_source(&events, HitSource::Body);
        assert!(body.contains(&(Some(BallId(0)), BallId(1))));
        assert!(hits_by_source(&events, HitSource::Aura).is_empty());
        assert_eq!(state.balls[0].weapon.stats.hit_count, 1);
    }

    #[test]
    fn test_tips_touching_parry_without_damage() {
        let mut state = still("sword", "sword", 11);
        state.balls[0].pos = Vec2::new(200.0, 270.0);
        state.balls[1].pos = Vec2::new(360.0, 270.0);
        state.balls[0].weapon.stats.angle = 0.0;
        state.balls[1].weapon.stats.angle = PI;
        let events = tick(&mut state);
        assert!(events.iter().any(|e| matches!(e, TickEvent::Parry { .. })));
        assert!(!events.iter().any(|e| matches!(e, TickEvent::Hit { .. })));
        assert_eq!(state.stats.parries, 1);
        for ball in &state.balls {
            assert_eq!(ball.weapon.stats.parry_cooldown, state.settings.parry_cooldown);
            assert_eq!(ball.weapon.stats.deflect_reverse, PARRY_REVERSE_TICKS);
            assert!(!ball.weapon.can_hit());
        }
    }

    #[test]
    fn test_sword_super_latches_at_threshold() {
        let mut state = still("sword", "unarmed", 42);
        state.balls[0].pos = Vec2::new(220.0, 270.0);
        state.balls[1].pos = Vec2::new(320.0, 270.0);
        state.balls[0].weapon.stats.base_damage = 5.0;
        state.balls[0].weapon.apply_scaling();
        state.balls[1].max_hp = 1.0e6;
        state.balls[1].hp = 1.0e6;

        let mut latched_at = None;
        for _ in 0..3000 {
            tick(&mut state);
            let stats = &state.balls[0].weapon.stats;
            if stats.super_active && latched_at.is_none() {
                assert!(stats.hit_count >= 10);
                latched_at = Some(state.tick);
            }
            if latched_at.is_some() {
                assert!(stats.super_active);
            }
        }
        assert!(latched_at.is_some());
        assert_eq!(state.stats.supers, 1);
        assert!(is_terminal(&state).is_none());
    }

    #[test]
    fn test_projectile_cap_evicts_oldest() {
        let settings = Settings {
            max_projectiles: 4,
            ..Default::default()
        };
        let mut state = configure("bow", "bow", 2, settings).unwrap();
        for ball in &mut state.balls {
            ball.weapon.stats.hit_count = 11;
            ball.weapon.apply_scaling();
        }
        for _ in 0..200 {
            tick(&mut state);
            assert!(state.projectiles.len() <= 4);
        }
    }

    #[test]
    fn test_duplicator_splits_side() {
        let mut state = still("duplicator", "unarmed", 8);
        state.balls[1].max_hp = 1.0e6;
        state.balls[1].hp = 1.0e6;
        let mut split_events = 0;
        for _ in 0..crate::sim::weapon::SPLIT_INTERVAL {
            split_events += tick(&mut state)
                .iter()
                .filter(|e| matches!(e, TickEvent::Split { .. }))
                .count();
        }
        assert_eq!(split_events, 1);
        assert_eq!(state.side_balls(Side::Left).count(), 2);
        assert!(!state.balls[2].is_original);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(12))]

        #[test]
        fn prop_battles_terminate_with_bounded_hp(seed in 0u64..10_000, l in 0usize..15, r in 0usize..15) {
            let kinds = crate::sim::weapon::kinds(None);
            let mut state = configure(kinds[l], kinds[r], seed, Settings::default()).unwrap();
            let mut hit_counts: Vec<u32> = state.balls.iter().map(|b| b.weapon.stats.hit_count).collect();
            while is_terminal(&state).is_none() {
                tick(&mut state);
                prop_assert!(state.tick <= state.settings.max_ticks);
                hit_counts.resize(state.balls.len(), 0);
                for (ball, last) in state.balls.iter().zip(hit_counts.iter_mut()) {
                    prop_assert!(ball.hp >= 0.0 && ball.hp <= ball.max_hp);
                    prop_assert!(ball.weapon.stats.hit_count >= *last);
                    *last = ball.weapon.stats.hit_count;
                }
            }
        }
    }
}

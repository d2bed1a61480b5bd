//! Fixed timestep battle tick
//!
//! Moves the paddle, balls and projectiles, feeds every contact with the boss
//! through the boss's collision entry points, then advances the boss itself.

use glam::Vec2;

use super::boss::Boss;
use super::collision::{circle_level_collision, reflect_velocity};
use super::error::BossError;
use super::state::{BattlePhase, BossBattle, GameBall, GameEvent, GameModel, Projectile};
use crate::consts::*;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Where the paddle should slide to (level units)
    pub target_paddle_x: Option<f32>,
    /// Launch the ball waiting on the paddle
    pub launch: bool,
    /// Pause toggle
    pub pause: bool,
}

/// Advance the battle by one fixed timestep
pub fn tick(battle: &mut BossBattle, input: &TickInput, dt: f32) -> Result<(), BossError> {
    if input.pause {
        match battle.phase {
            BattlePhase::Playing | BattlePhase::Serve => {
                battle.phase = BattlePhase::Paused;
                return Ok(());
            }
            BattlePhase::Paused => {
                battle.phase = if battle.model.balls.iter().all(|b| b.vel == Vec2::ZERO) {
                    BattlePhase::Serve
                } else {
                    BattlePhase::Playing
                };
            }
            BattlePhase::BossDefeated => {}
        }
    }
    if battle.phase == BattlePhase::Paused {
        return Ok(());
    }

    let BossBattle {
        model,
        boss,
        phase,
        time_ticks,
    } = battle;
    *time_ticks += 1;

    // The boss keeps animating its death after the fight is over
    if *phase == BattlePhase::BossDefeated {
        return boss.tick(dt, model);
    }

    if let Some(target_x) = input.target_paddle_x {
        let level = model.level;
        model
            .paddle
            .move_toward(target_x, dt, PADDLE_DEFAULT_MAX_SPEED, &level);
    }

    match *phase {
        BattlePhase::Serve => {
            let rest = model.paddle.center + Vec2::new(0.0, model.paddle.half_height + BALL_RADIUS);
            for ball in &mut model.balls {
                ball.pos = rest;
            }
            if input.launch {
                let dir = Vec2::new(0.3, 1.0).normalize();
                for ball in &mut model.balls {
                    ball.vel = dir * BALL_DEFAULT_SPEED;
                }
                *phase = BattlePhase::Playing;
            }
        }
        BattlePhase::Playing => {
            update_balls(model, boss, dt)?;
            update_projectiles(model, boss, dt)?;

            if boss.can_hurt_paddle_with_body() {
                if let Some(part) = boss.collision_check_aabb(&model.paddle.bounds()) {
                    boss.collision_occurred_with_paddle(model, part)?;
                }
            }

            if model.balls.is_empty() {
                model.spawn_ball_on_paddle();
                *phase = BattlePhase::Serve;
            }
        }
        BattlePhase::Paused | BattlePhase::BossDefeated => {}
    }

    boss.tick(dt, model)?;

    if boss.is_state_machine_finished() {
        log::info!("Boss defeated after {} ticks", time_ticks);
        *phase = BattlePhase::BossDefeated;
    }
    Ok(())
}

fn update_balls(model: &mut GameModel, boss: &mut Boss, dt: f32) -> Result<(), BossError> {
    let mut balls = std::mem::take(&mut model.balls);

    for ball in &mut balls {
        ball.pos += ball.vel * dt;

        let wall = circle_level_collision(ball.pos, ball.radius, &model.level);
        if wall.hit {
            ball.pos += wall.normal * wall.penetration;
            if ball.vel.dot(wall.normal) < 0.0 {
                ball.vel = reflect_velocity(ball.vel, wall.normal);
            }
        }

        if ball.vel.y < 0.0 && model.paddle.bounds().overlaps_circle(ball.pos, ball.radius) {
            bounce_off_paddle(ball, model);
        }

        if let Some((part, hit)) = boss.collision_check_circle(ball.pos, ball.radius) {
            ball.pos += hit.normal * hit.penetration;
            if ball.vel.dot(hit.normal) < 0.0 {
                ball.vel = reflect_velocity(ball.vel, hit.normal);
            }
            if ball.last_thing_collided_with() != Some(part) {
                boss.collision_occurred_with_ball(model, ball, part)?;
            }
        }
    }

    balls.retain(|ball| {
        let lost = ball.pos.y + ball.radius < 0.0;
        if lost {
            model.push_event(GameEvent::BallLost { id: ball.id });
        }
        !lost
    });
    model.balls = balls;
    Ok(())
}

/// Steer the ball by where it landed on the paddle
fn bounce_off_paddle(ball: &mut GameBall, model: &GameModel) {
    let paddle = &model.paddle;
    let offset = ((ball.pos.x - paddle.center.x) / paddle.half_width).clamp(-1.0, 1.0);
    let speed = ball.vel.length().max(BALL_DEFAULT_SPEED);
    ball.vel = Vec2::new(0.75 * offset, 1.0).normalize() * speed;
    ball.pos.y = paddle.center.y + paddle.half_height + ball.radius;
    ball.set_last_thing_collided_with(None);
}

fn update_projectiles(model: &mut GameModel, boss: &mut Boss, dt: f32) -> Result<(), BossError> {
    let projectiles = std::mem::take(&mut model.projectiles);
    let mut kept = Vec::with_capacity(projectiles.len());

    for mut projectile in projectiles {
        projectile.pos += projectile.vel * dt;

        let level = model.level;
        let p = projectile.pos;
        if p.x < 0.0 || p.x > level.width || p.y < 0.0 || p.y > level.height {
            continue;
        }

        if projectile.kind.is_boss_projectile() {
            if model.paddle.bounds().overlaps_circle(p, projectile.radius) {
                model.paddle.times_hurt += 1;
                model.push_event(GameEvent::PaddleHitByBoss);
                continue;
            }
            kept.push(projectile);
            continue;
        }

        if !projectile_hits_boss(model, boss, &mut projectile)? {
            kept.push(projectile);
        }
    }

    // Anything the boss fired during this pass was appended to the model
    kept.append(&mut model.projectiles);
    model.projectiles = kept;
    Ok(())
}

/// True when the projectile was used up on the boss
fn projectile_hits_boss(model: &mut GameModel, boss: &mut Boss, projectile: &mut Projectile) -> Result<bool, BossError> {
    if boss.projectile_passes_through(projectile) {
        return Ok(false);
    }
    let Some((part, _)) = boss.collision_check_circle(projectile.pos, projectile.radius) else {
        return Ok(false);
    };

    if projectile.kind.is_mine() {
        boss.mine_explosion_occurred(model, projectile.pos, MINE_EXPLOSION_RADIUS)?;
    } else if projectile.kind.is_rocket() {
        boss.rocket_explosion_occurred(model, projectile.pos, ROCKET_EXPLOSION_RADIUS)?;
    } else if projectile.last_thing_collided_with() != Some(part) {
        boss.collision_occurred_with_projectile(model, projectile, part)?;
    }
    Ok(true)
}

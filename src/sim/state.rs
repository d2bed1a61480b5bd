//! Game model types the boss interacts with
//!
//! The level, paddle, balls and projectiles are deliberately thin: the boss
//! only reads their positions, spawns projectiles, and reports events.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::body_part::PartId;
use super::boss::{Boss, WorldStyle};
use super::bounds::Aabb2;
use super::error::BossError;
use crate::consts::*;
use crate::tuning::BossTuning;

/// Current phase of a boss battle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattlePhase {
    /// Ball waiting on the paddle for launch input
    Serve,
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
    /// Boss state machine has finished
    BossDefeated,
}

/// Rectangular play area with its origin at the bottom-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameLevel {
    pub width: f32,
    pub height: f32,
}

impl Default for GameLevel {
    fn default() -> Self {
        Self::new(
            BOSS_LEVEL_WIDTH_IN_PIECES as f32 * PIECE_WIDTH,
            BOSS_LEVEL_HEIGHT_IN_PIECES as f32 * PIECE_HEIGHT,
        )
    }
}

impl GameLevel {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn level_unit_width(&self) -> f32 {
        self.width
    }

    pub fn level_unit_height(&self) -> f32 {
        self.height
    }

    /// Correction that pushes a boss box back inside the level.
    ///
    /// Returns `None` when the box is inside or exactly touching the walls.
    pub fn collide_boss_with_level(&self, boss_aabb: &Aabb2) -> Option<Vec2> {
        if boss_aabb.is_empty() {
            return None;
        }

        let mut correction = Vec2::ZERO;
        if boss_aabb.min.x < 0.0 {
            correction.x = -boss_aabb.min.x;
        } else if boss_aabb.max.x > self.width {
            correction.x = self.width - boss_aabb.max.x;
        }
        if boss_aabb.max.y > self.height {
            correction.y = self.height - boss_aabb.max.y;
        } else if boss_aabb.min.y < 0.0 {
            correction.y = -boss_aabb.min.y;
        }

        (correction != Vec2::ZERO).then_some(correction)
    }
}

/// The player's paddle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerPaddle {
    pub center: Vec2,
    pub half_width: f32,
    pub half_height: f32,
    pub vel: Vec2,
    /// Number of times the boss has struck the paddle
    pub times_hurt: u32,
}

impl PlayerPaddle {
    pub fn new(center: Vec2) -> Self {
        Self {
            center,
            half_width: PADDLE_HALF_WIDTH,
            half_height: PADDLE_HALF_HEIGHT,
            vel: Vec2::ZERO,
            times_hurt: 0,
        }
    }

    pub fn center_position(&self) -> Vec2 {
        self.center
    }

    pub fn bounds(&self) -> Aabb2 {
        let half = Vec2::new(self.half_width, self.half_height);
        Aabb2::new(self.center - half, self.center + half)
    }

    /// Slide toward `target_x`, clamped to the level walls
    pub fn move_toward(&mut self, target_x: f32, dt: f32, max_speed: f32, level: &GameLevel) {
        let max_delta = max_speed * dt;
        let delta = (target_x - self.center.x).clamp(-max_delta, max_delta);
        let new_x = (self.center.x + delta).clamp(self.half_width, level.width - self.half_width);
        self.vel = if dt > 0.0 {
            Vec2::new((new_x - self.center.x) / dt, 0.0)
        } else {
            Vec2::ZERO
        };
        self.center.x = new_x;
    }
}

/// A ball entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameBall {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Last boss part hit, so one contact is not counted twice
    last_thing_collided_with: Option<PartId>,
}

impl GameBall {
    pub fn new(id: u32, pos: Vec2, vel: Vec2) -> Self {
        Self {
            id,
            pos,
            vel,
            radius: BALL_RADIUS,
            last_thing_collided_with: None,
        }
    }

    pub fn last_thing_collided_with(&self) -> Option<PartId> {
        self.last_thing_collided_with
    }

    pub fn set_last_thing_collided_with(&mut self, part: Option<PartId>) {
        self.last_thing_collided_with = part;
    }
}

/// Projectile types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileKind {
    PaddleLaserBullet,
    BallLaserBullet,
    LaserTurretBullet,
    CollateralBlock,
    PaddleRocketBullet,
    PaddleRemoteCtrlRocketBullet,
    RocketTurretBullet,
    FireGlob,
    PaddleMineBullet,
    MineTurretBullet,
    PaddleFlameBlast,
    PaddleIceBlast,
    BossLaserBullet,
    BossRocketBullet,
    BossOrbBullet,
    BossLightningBoltBullet,
}

impl ProjectileKind {
    /// Fired by a boss
    pub fn is_boss_projectile(self) -> bool {
        matches!(
            self,
            ProjectileKind::BossLaserBullet
                | ProjectileKind::BossRocketBullet
                | ProjectileKind::BossOrbBullet
                | ProjectileKind::BossLightningBoltBullet
        )
    }

    /// Mines only hurt through their explosion
    pub fn is_mine(self) -> bool {
        matches!(self, ProjectileKind::PaddleMineBullet | ProjectileKind::MineTurretBullet)
    }

    /// Blows up on contact instead of dealing direct damage
    pub fn is_rocket(self) -> bool {
        matches!(
            self,
            ProjectileKind::PaddleRocketBullet
                | ProjectileKind::PaddleRemoteCtrlRocketBullet
                | ProjectileKind::RocketTurretBullet
        )
    }

    pub fn damages_boss_on_contact(self) -> bool {
        !self.is_boss_projectile() && !self.is_mine()
    }

    pub fn default_damage(self) -> f32 {
        match self {
            ProjectileKind::PaddleRocketBullet
            | ProjectileKind::PaddleRemoteCtrlRocketBullet
            | ProjectileKind::RocketTurretBullet => 2.0 * DEFAULT_DAMAGE_ON_BALL_HIT,
            ProjectileKind::PaddleLaserBullet
            | ProjectileKind::BallLaserBullet
            | ProjectileKind::LaserTurretBullet => 0.5 * DEFAULT_DAMAGE_ON_BALL_HIT,
            _ => DEFAULT_DAMAGE_ON_BALL_HIT,
        }
    }
}

/// A projectile in flight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub kind: ProjectileKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub damage: f32,
    last_thing_collided_with: Option<PartId>,
}

impl Projectile {
    pub fn new(id: u32, kind: ProjectileKind, pos: Vec2, vel: Vec2) -> Self {
        Self {
            id,
            kind,
            pos,
            vel,
            radius: 0.2,
            damage: kind.default_damage(),
            last_thing_collided_with: None,
        }
    }

    pub fn last_thing_collided_with(&self) -> Option<PartId> {
        self.last_thing_collided_with
    }

    pub fn set_last_thing_collided_with(&mut self, part: Option<PartId>) {
        self.last_thing_collided_with = part;
    }
}

/// Notable things that happened during a tick, for audio/effects layers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GameEvent {
    BossHurt { part: PartId },
    BossWeakpointDestroyed { part: PartId },
    BossAngry,
    BossStageChanged { stage: &'static str },
    BossLaserSpray { shots: u32 },
    BossFinalDeath,
    PaddleHitByBoss,
    BallLost { id: u32 },
}

/// Everything outside the boss that the boss reads or writes
#[derive(Debug, Clone)]
pub struct GameModel {
    pub level: GameLevel,
    pub paddle: PlayerPaddle,
    /// Active balls (sorted by id for determinism)
    pub balls: Vec<GameBall>,
    /// Active projectiles (sorted by id for determinism)
    pub projectiles: Vec<Projectile>,
    pub events: Vec<GameEvent>,
    /// Seeded source for every random decision the boss makes
    pub rng: Pcg32,
    next_id: u32,
}

impl GameModel {
    pub fn new(seed: u64, level: GameLevel) -> Self {
        Self {
            level,
            paddle: PlayerPaddle::new(Vec2::new(level.width / 2.0, 2.0 * PIECE_HEIGHT)),
            balls: Vec::new(),
            projectiles: Vec::new(),
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn add_projectile(&mut self, kind: ProjectileKind, pos: Vec2, vel: Vec2) -> u32 {
        let id = self.next_entity_id();
        self.projectiles.push(Projectile::new(id, kind, pos, vel));
        id
    }

    /// Place a ball just above the paddle
    pub fn spawn_ball_on_paddle(&mut self) -> u32 {
        let id = self.next_entity_id();
        let pos = self.paddle.center + Vec2::new(0.0, self.paddle.half_height + BALL_RADIUS);
        self.balls.push(GameBall::new(id, pos, Vec2::ZERO));
        id
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

/// A boss fight: the boss plus the game model around it
#[derive(Debug)]
pub struct BossBattle {
    pub model: GameModel,
    pub boss: Boss,
    pub phase: BattlePhase,
    /// Simulation tick counter
    pub time_ticks: u64,
}

impl BossBattle {
    /// Build the boss for `style`, centred horizontally near the top of the level
    pub fn new(seed: u64, style: WorldStyle, tuning: &BossTuning) -> Result<Self, BossError> {
        let model = GameModel::new(seed, GameLevel::default());
        let mut boss = Boss::build_style_boss(style, tuning)?;

        let start = Vec2::new(
            model.level.width / 2.0,
            model.level.height - 1.25 * boss.alive_height(),
        );
        boss.translate(start.extend(0.0));

        let mut battle = Self {
            model,
            boss,
            phase: BattlePhase::Serve,
            time_ticks: 0,
        };
        battle.model.spawn_ball_on_paddle();
        Ok(battle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collide_boss_with_level_corrections() {
        let level = GameLevel::new(20.0, 30.0);

        let inside = Aabb2::new(Vec2::new(1.0, 1.0), Vec2::new(5.0, 5.0));
        assert_eq!(level.collide_boss_with_level(&inside), None);

        let touching = Aabb2::new(Vec2::new(15.0, 1.0), Vec2::new(20.0, 30.0));
        assert_eq!(level.collide_boss_with_level(&touching), None);

        let past_right = Aabb2::new(Vec2::new(17.0, 1.0), Vec2::new(21.5, 5.0));
        assert_eq!(level.collide_boss_with_level(&past_right), Some(Vec2::new(-1.5, 0.0)));

        let past_left_and_top = Aabb2::new(Vec2::new(-2.0, 26.0), Vec2::new(3.0, 31.0));
        assert_eq!(
            level.collide_boss_with_level(&past_left_and_top),
            Some(Vec2::new(2.0, -1.0))
        );
    }

    #[test]
    fn test_projectile_kinds() {
        assert!(ProjectileKind::BossLaserBullet.is_boss_projectile());
        assert!(!ProjectileKind::BossLaserBullet.damages_boss_on_contact());
        assert!(!ProjectileKind::MineTurretBullet.damages_boss_on_contact());
        assert!(ProjectileKind::PaddleRocketBullet.damages_boss_on_contact());
    }

    #[test]
    fn test_paddle_move_clamps_to_walls() {
        let level = GameLevel::new(20.0, 30.0);
        let mut paddle = PlayerPaddle::new(Vec2::new(10.0, 1.0));
        for _ in 0..200 {
            paddle.move_toward(-50.0, 0.1, 30.0, &level);
        }
        assert!((paddle.center.x - paddle.half_width).abs() < 0.001);
    }

    #[test]
    fn test_entity_ids_increase() {
        let mut model = GameModel::new(7, GameLevel::default());
        let a = model.add_projectile(ProjectileKind::BossLaserBullet, Vec2::ZERO, Vec2::Y);
        let b = model.spawn_ball_on_paddle();
        assert!(b > a);
        assert_eq!(model.projectiles.len(), 1);
        assert_eq!(model.balls.len(), 1);
    }

    #[test]
    fn test_seed_drives_rng() {
        use rand::Rng;

        let draws = |seed| {
            let mut model = GameModel::new(seed, GameLevel::default());
            (0..8).map(|_| model.rng.random::<u32>()).collect::<Vec<_>>()
        };
        assert_eq!(draws(11), draws(11));
        assert_ne!(draws(11), draws(12));
    }
}

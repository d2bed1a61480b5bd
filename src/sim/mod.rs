//! Deterministic simulation module
//!
//! All boss logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only (`GameModel::rng`)
//! - Stable iteration order (part registry order, entity IDs)
//! - No rendering or platform dependencies

pub mod ai;
pub mod animation;
pub mod body_part;
pub mod body_tree;
pub mod boss;
pub mod boss_anims;
pub mod bounds;
pub mod classical;
pub mod classical_ai;
pub mod collision;
pub mod composite;
pub mod error;
pub mod state;
pub mod tick;
pub mod weakpoint;

pub use ai::{AiContext, BossAi, BossAiCore, BossAiState};
pub use animation::AnimationMultiLerp;
pub use body_part::{BodyPart, PartId, PartKind};
pub use body_tree::BodyTree;
pub use boss::{Boss, BossBody, PartSnapshot, WorldStyle};
pub use bounds::{Aabb2, BoundLine, BoundingLines};
pub use classical_ai::{ArmsBodyHeadAi, ArmsBodyHeadState, BodyHeadAi, BodyHeadState, HeadAi, HeadState};
pub use collision::CollisionResult;
pub use error::BossError;
pub use state::{
    BattlePhase, BossBattle, GameBall, GameEvent, GameLevel, GameModel, PlayerPaddle, Projectile, ProjectileKind,
};
pub use tick::{TickInput, tick};
pub use weakpoint::{DamageOutcome, Weakpoint};

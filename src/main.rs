//! Breakout Boss headless runner
//!
//! Plays a scripted boss battle at a fixed timestep and logs how it went.
//!
//! ```text
//! breakout-boss [TUNING_JSON] [--seed N] [--seconds S] [--dump SNAPSHOT_JSON]
//! ```

use std::error::Error;
use std::fs;

use breakout_boss::BossTuning;
use breakout_boss::consts::*;
use breakout_boss::sim::{BattlePhase, BossBattle, GameEvent, TickInput, WorldStyle, tick};

/// Simulated display refresh feeding the accumulator
const FRAME_DT: f32 = 1.0 / 60.0;

#[derive(Debug)]
struct RunArgs {
    tuning_path: Option<String>,
    seed: u64,
    seconds: f32,
    dump_path: Option<String>,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            tuning_path: None,
            seed: 12345,
            seconds: 180.0,
            dump_path: None,
        }
    }
}

fn parse_args() -> Result<RunArgs, Box<dyn Error>> {
    let mut args = RunArgs::default();
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--seed" => args.seed = iter.next().ok_or("--seed needs a value")?.parse()?,
            "--seconds" => args.seconds = iter.next().ok_or("--seconds needs a value")?.parse()?,
            "--dump" => args.dump_path = Some(iter.next().ok_or("--dump needs a path")?),
            _ => args.tuning_path = Some(arg),
        }
    }
    Ok(args)
}

/// Paddle AI: track the lowest ball with a slow wobble so it does not loop
fn scripted_input(battle: &BossBattle) -> TickInput {
    let time_factor = battle.time_ticks as f32 * 0.01;
    let wobble = time_factor.sin() * 0.6 + (time_factor * 0.7).sin() * 0.3;

    let target = battle
        .model
        .balls
        .iter()
        .min_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
        .map(|ball| ball.pos.x + wobble);

    TickInput {
        target_paddle_x: target,
        launch: battle.phase == BattlePhase::Serve,
        ..Default::default()
    }
}

#[derive(Debug, Default)]
struct BattleStats {
    hurts: u32,
    weakpoints_destroyed: u32,
    laser_sprays: u32,
    balls_lost: u32,
}

impl BattleStats {
    fn record(&mut self, event: &GameEvent) {
        match event {
            GameEvent::BossHurt { .. } => self.hurts += 1,
            GameEvent::BossWeakpointDestroyed { part } => {
                self.weakpoints_destroyed += 1;
                log::info!("Weakpoint {part} destroyed");
            }
            GameEvent::BossStageChanged { stage } => log::info!("Boss entered stage {stage}"),
            GameEvent::BossLaserSpray { .. } => self.laser_sprays += 1,
            GameEvent::BallLost { .. } => self.balls_lost += 1,
            GameEvent::BossAngry | GameEvent::BossFinalDeath | GameEvent::PaddleHitByBoss => {}
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let args = parse_args()?;
    let tuning = match &args.tuning_path {
        Some(path) => {
            log::info!("Loading tuning from {path}");
            BossTuning::from_json(&fs::read_to_string(path)?)?
        }
        None => BossTuning::default(),
    };

    let mut battle = BossBattle::new(args.seed, WorldStyle::Classical, &tuning)?;
    log::info!(
        "Classical boss built with {} parts (seed {})",
        battle.boss.body_part_count(),
        args.seed
    );

    let mut stats = BattleStats::default();
    let mut accumulator = 0.0;
    let frames = (args.seconds / FRAME_DT) as u32;
    for _ in 0..frames {
        accumulator += FRAME_DT;

        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let input = scripted_input(&battle);
            tick(&mut battle, &input, SIM_DT)?;
            accumulator -= SIM_DT;
            substeps += 1;
        }

        for event in battle.model.drain_events() {
            stats.record(&event);
        }
        let body = battle.boss.body();
        if battle.phase == BattlePhase::BossDefeated && body.tree().children(body.alive_parts_root()).is_empty() {
            break;
        }
    }

    let stage = battle
        .boss
        .current_ai_state()
        .map_or("none", |ai| ai.as_ai().stage_name());
    log::info!(
        "Battle ended after {:.1}s in {:?}: stage {}, {} hurts, {} weakpoints destroyed, {} laser sprays, {} balls lost, paddle struck {} times",
        battle.time_ticks as f32 * SIM_DT,
        battle.phase,
        stage,
        stats.hurts,
        stats.weakpoints_destroyed,
        stats.laser_sprays,
        stats.balls_lost,
        battle.model.paddle.times_hurt,
    );

    if let Some(path) = &args.dump_path {
        fs::write(path, serde_json::to_string_pretty(&battle.boss.render_snapshot())?)?;
        log::info!("Boss snapshot written to {path}");
    }
    Ok(())
}

fn main() {
    env_logger::init();
    log::info!("Breakout Boss (headless) starting...");

    if let Err(e) = run() {
        log::error!("Battle failed: {e}");
        std::process::exit(1);
    }
}

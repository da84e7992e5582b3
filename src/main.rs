use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use gridsim::callbacks::CallbackHandler;
use gridsim::config::{SimConfig, load_config};
use gridsim::layout::{Layout, Rotation};
use gridsim::{EntityId, Grid, prefabs};
use gridsim_navigation::{DiscretePoint, Pose};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// How often the runner logs a status line, in ticks.
const STATUS_INTERVAL: u64 = 50;

/// Headings for the player's wander steps: (dx, dy, theta).
const STEPS: [(f64, f64, f64); 4] = [
    (0.0, 1.0, 0.0),
    (-1.0, 0.0, -90.0),
    (0.0, -1.0, 180.0),
    (1.0, 0.0, 90.0),
];

struct Scenario {
    grid: Grid,
    player: EntityId,
}

fn at(x: i32, y: i32) -> Pose {
    Pose::from_discrete_point(DiscretePoint::new(x, y))
}

fn build_scenario(config: &SimConfig, rng: &mut StdRng) -> Result<Scenario> {
    let mut grid = Grid::new(config.grid.width, config.grid.height)?;

    if let Some(path) = &config.map.layout {
        let layout = Layout::from_file(path)?;
        let rotation = if config.map.random_rotation {
            Rotation::RandomQuarterTurns
        } else {
            Rotation::Fixed
        };
        let walls = layout.populate(&mut grid, prefabs::wall, rotation, rng);
        info!(walls, "Placed layout walls");
    }

    let player = grid
        .add(prefabs::player(at(2, 2)))
        .context("placing the player")?;
    grid.add(prefabs::spike(at(5, 2), 10.0))
        .context("placing the spike")?;
    grid.add(prefabs::healing_pad(at(2, 9), 10.0))
        .context("placing the healing pad")?;

    // up and down the corridor along y = 9
    let mut patrol: Vec<Pose> = (8..=13).map(|x| at(x, 9)).collect();
    patrol.extend((9..13).rev().map(|x| at(x, 9)));
    grid.add(prefabs::patrol_drone(at(8, 9), patrol, true))
        .context("placing the patrol drone")?;

    let hunter = grid
        .add(prefabs::drone(at(13, 2)))
        .context("placing the hunter drone")?;
    grid.actively_path_find(hunter, player)
        .context("pointing the hunter at the player")?;

    info!(entities = grid.len(), "Scenario ready");
    Ok(Scenario { grid, player })
}

/// Stands in for keyboard input: a step in a random direction, now and then.
fn wander(grid: &mut Grid, player: EntityId, rng: &mut StdRng) {
    if !rng.random_bool(0.5) {
        return;
    }
    let Some(entity) = grid.entity(player) else {
        return;
    };
    let (dx, dy, theta) = STEPS[rng.random_range(0..STEPS.len())];
    let mut target = *entity.pose() + Pose::new(dx, dy, 0.0);
    target.set_theta(theta);
    grid.move_to_position(player, target);
}

async fn run(scenario: Scenario, config: &SimConfig, mut rng: StdRng) -> Result<()> {
    let Scenario { mut grid, player } = scenario;

    let player_down = Rc::new(Cell::new(false));
    let mut callbacks = CallbackHandler::<Grid>::new();
    let flag = Rc::clone(&player_down);
    callbacks.add(
        move |grid: &Grid| {
            grid.entity(player)
                .and_then(|entity| entity.health())
                .is_none_or(|health| health.is_dead())
        },
        move |_| {
            warn!("Player is down");
            flag.set(true);
        },
        true,
    );

    let mut interval = time::interval(Duration::from_millis(config.sim.tick_ms));
    let mut last_tick = Instant::now();
    let mut tick: u64 = 0;

    loop {
        interval.tick().await;
        let dt = last_tick.elapsed().as_secs_f64();
        last_tick = Instant::now();
        tick += 1;

        wander(&mut grid, player, &mut rng);
        grid.update(dt);
        callbacks.check(&grid);

        for (id, pose) in grid.updated_poses() {
            debug!(%id, %pose, updates = ?pose.updates(), "Pose changed");
        }
        grid.reset_updates();

        if tick % STATUS_INTERVAL == 0 {
            let health = grid
                .entity(player)
                .and_then(|entity| entity.health())
                .map_or(0.0, |health| health.health());
            info!(tick, health, "Status");
        }
        if player_down.get() {
            info!(tick, "Simulation over");
            break;
        }
        if config.sim.max_ticks.is_some_and(|max| tick >= max) {
            info!(tick, "Tick limit reached");
            break;
        }
    }

    grid.check_invariants()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = load_config(config_path.as_deref()).context("loading configuration")?;

    let mut rng = match config.sim.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let scenario = build_scenario(&config, &mut rng)?;
    run(scenario, &config, rng).await
}

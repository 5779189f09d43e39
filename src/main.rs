//! Deepchase headless runner
//!
//! Loads a level and tuning, then plays a scripted session at 60 fps: the
//! player circles the arena, dashes now and then and periodically ducks into
//! a hide-out. Contact with the enemy is reported as an overlap.

use std::error::Error as _;
use std::path::PathBuf;

use clap::Parser;
use glam::Vec2;

use deepchase::sim::{PlayerInput, SimEvent, Simulation, advance_frame};
use deepchase::{Level, Tuning, logging};

const FRAME_DT: f32 = 1.0 / 60.0;
/// Enemy-player distance that counts as touching
const CONTACT_RADIUS: f32 = 0.5;
/// Angular speed of the scripted input (rad/s)
const CIRCLE_RATE: f32 = 0.75;
const DASH_EVERY: f32 = 3.0;
/// The script hides for `HIDE_FOR` seconds out of every `HIDE_EVERY`
const HIDE_EVERY: f32 = 20.0;
const HIDE_FOR: f32 = 4.0;

/// Run a scripted stealth-chase session without a window
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Level JSON file (built-in demo ring when absent)
    #[arg(short, long)]
    level: Option<PathBuf>,

    /// Tuning JSON file (defaults when absent)
    #[arg(short, long)]
    tuning: Option<PathBuf>,

    /// RNG seed for patrol choices
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Simulated session length in seconds
    #[arg(long, default_value_t = 60.0)]
    seconds: f32,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Default)]
struct Summary {
    frames: u32,
    dashes: u32,
    chases: u32,
    catches: u32,
}

fn main() {
    let args = Args::parse();
    logging::init(args.verbose);

    if let Err(err) = run(&args) {
        log::error!("{err}");
        let mut source = err.source();
        while let Some(cause) = source {
            log::error!("  caused by: {cause}");
            source = cause.source();
        }
        std::process::exit(1);
    }
}

fn run(args: &Args) -> deepchase::Result<()> {
    let level = match &args.level {
        Some(path) => Level::load(path)?,
        None => Level::demo(),
    };
    let tuning = match &args.tuning {
        Some(path) => Tuning::load(path)?,
        None => Tuning::default(),
    };

    let mut sim = Simulation::new(&level, tuning, args.seed)?;
    let mut summary = Summary::default();
    let total_frames = (args.seconds.max(0.0) / FRAME_DT).round() as u32;

    for frame in 0..total_frames {
        let t = frame as f32 * FRAME_DT;
        let hiding = t % HIDE_EVERY >= HIDE_EVERY - HIDE_FOR;
        if hiding {
            sim.enter_hide_out();
        } else {
            sim.exit_hide_out();
        }

        let input = scripted_input(t, hiding);
        advance_frame(&mut sim, &input, FRAME_DT);

        if sim.enemy().position().distance(sim.player().position()) <= CONTACT_RADIUS {
            sim.report_overlap();
        }

        for event in sim.drain_events() {
            record(&mut summary, event, t);
        }
        summary.frames += 1;

        if sim.is_over() {
            break;
        }
    }

    log::info!(
        "Done after {:.1}s: {} fixed ticks, {} dashes, {} chases, {} catches, {} lives left{}",
        summary.frames as f32 * FRAME_DT,
        sim.time_ticks(),
        summary.dashes,
        summary.chases,
        summary.catches,
        sim.player().lives().max(0),
        if sim.is_over() { ", session over" } else { "" }
    );
    Ok(())
}

fn scripted_input(t: f32, hiding: bool) -> PlayerInput {
    if hiding {
        return PlayerInput::default();
    }
    let angle = t * CIRCLE_RATE;
    let dash_frame = (t % DASH_EVERY) < FRAME_DT;
    PlayerInput {
        movement: Vec2::from_angle(angle),
        dash: dash_frame && t > 0.0,
    }
}

fn record(summary: &mut Summary, event: SimEvent, t: f32) {
    match event {
        SimEvent::DashStarted => summary.dashes += 1,
        SimEvent::ChaseStarted => {
            summary.chases += 1;
            log::info!("[{t:6.2}s] enemy gives chase");
        }
        SimEvent::Caught { lives_left } => {
            summary.catches += 1;
            log::info!("[{t:6.2}s] caught ({} lives left)", lives_left.max(0));
        }
        other => log::debug!("[{t:6.2}s] {other:?}"),
    }
}

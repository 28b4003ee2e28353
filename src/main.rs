//! Console front end: play moves against a UCI engine, or against yourself.
//!
//! Usage: `kibitz [ENGINE_PATH] [DEPTH]`

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use tracing::info;

use kibitz_uci::{CoordinatorConfig, ExternalMover, MoveOutcome, TurnCoordinator, UciProcess};

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let mut args = std::env::args().skip(1);
    let engine_path = args.next();
    let mut config = CoordinatorConfig::default();
    if let Some(depth) = args.next() {
        config.search_depth = depth
            .parse()
            .with_context(|| format!("invalid search depth: {depth}"))?;
    }

    let coordinator = match engine_path {
        Some(path) => {
            let engine = UciProcess::spawn(&path, config.search_depth)
                .with_context(|| format!("failed to start engine {path}"))?;
            let engine: Box<dyn ExternalMover> = Box::new(engine);
            TurnCoordinator::with_mover(config, engine)
        }
        None => TurnCoordinator::new(config),
    };
    info!("kibitz starting");

    run(&coordinator)?;

    coordinator.shutdown().context("failed to stop engine")?;
    info!("kibitz shutting down");
    Ok(())
}

fn run(coordinator: &TurnCoordinator) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    println!("{}", coordinator.board_snapshot().pretty());
    prompt(coordinator, &mut stdout)?;

    for line in stdin.lock().lines() {
        let line = line.context("failed to read stdin")?;
        match line.trim() {
            "" => {}
            "quit" => break,
            "fen" => println!("{}", coordinator.position_notation()),
            "board" => println!("{}", coordinator.board_snapshot().pretty()),
            "go" => match coordinator.request_move_now() {
                Ok(MoveOutcome::Applied(mv)) => println!("engine plays {mv}"),
                Ok(MoveOutcome::Rejected(mv)) => println!("engine proposed {mv}, which is not playable"),
                Ok(MoveOutcome::NoMove) => println!("engine has no move"),
                Ok(MoveOutcome::Stale) => println!("engine reply arrived too late"),
                Err(err) => println!("engine error: {err}"),
            },
            token => {
                if coordinator.apply_move(token) {
                    coordinator.wait_for_pending();
                    println!("{}", coordinator.board_snapshot().pretty());
                    println!("{}", coordinator.position_notation());
                } else {
                    println!("illegal move: {token}");
                }
            }
        }
        prompt(coordinator, &mut stdout)?;
    }
    Ok(())
}

fn prompt(coordinator: &TurnCoordinator, stdout: &mut io::Stdout) -> Result<()> {
    let side = if coordinator.is_white_to_move() {
        "white"
    } else {
        "black"
    };
    write!(stdout, "{side}> ")?;
    stdout.flush()?;
    Ok(())
}

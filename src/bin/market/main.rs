// Commodity Market Runner
// Live engine on a file-backed store, or a fast seeded simulation with JSONL output
//
// Usage:
//   cargo run --bin market -- run                            # Tick every 60s, state in ./market-state
//   cargo run --bin market -- run --state-dir /tmp/m --ticks 5
//   cargo run --bin market -- simulate --ticks 1440          # One simulated day
//   cargo run --bin market -- simulate --seed 42 --start-hour 6 --time-series out/day.jsonl

mod report;
mod time_series;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use commodity_market::{
    EngineConfig, FileStore, ListenerError, ManualClock, MarketEngine, MarketState, MemoryStore,
    SystemClock,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{error, info};

use time_series::TimeSeriesRecorder;

// ─── CLI Parsing ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Run,
    Simulate,
}

struct CliArgs {
    mode: Mode,
    state_dir: PathBuf,
    ticks: Option<u64>,
    seed: Option<u64>,
    start_hour: u32,
    interval_ms: Option<u64>,
    time_series: Option<PathBuf>,
}

fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut cli = CliArgs {
        mode: Mode::Run,
        state_dir: PathBuf::from("market-state"),
        ticks: None,
        seed: None,
        start_hour: 0,
        interval_ms: None,
        time_series: None,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "run" => cli.mode = Mode::Run,
            "simulate" => cli.mode = Mode::Simulate,
            flag @ ("--state-dir" | "--ticks" | "--seed" | "--start-hour" | "--interval-ms"
            | "--time-series") => {
                i += 1;
                let value = args.get(i).ok_or_else(|| format!("{} needs a value", flag))?;
                match flag {
                    "--state-dir" => cli.state_dir = PathBuf::from(value),
                    "--time-series" => cli.time_series = Some(PathBuf::from(value)),
                    "--ticks" => cli.ticks = Some(parse_num(flag, value)?),
                    "--seed" => cli.seed = Some(parse_num(flag, value)?),
                    "--interval-ms" => cli.interval_ms = Some(parse_num(flag, value)?),
                    _ => {
                        let hour: u32 = parse_num(flag, value)?;
                        if hour > 23 {
                            return Err(format!("--start-hour must be 0-23, got {}", hour));
                        }
                        cli.start_hour = hour;
                    }
                }
            }
            other => return Err(format!("unknown argument: {}", other)),
        }
        i += 1;
    }

    Ok(cli)
}

fn parse_num<T: std::str::FromStr>(flag: &str, value: &str) -> Result<T, String> {
    value.parse().map_err(|_| format!("{} expects a number, got {:?}", flag, value))
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "commodity_market=info,market=info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    let mut config = match EngineConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "bad market configuration");
            std::process::exit(2);
        }
    };
    if let Some(ms) = cli.interval_ms {
        config.tick_interval_ms = ms.max(1);
    }

    let rng = match cli.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    match cli.mode {
        Mode::Run => run_live(&cli, config, rng),
        Mode::Simulate => simulate(&cli, config, rng),
    }
}

// ─── Live Mode ──────────────────────────────────────────────────────────────

fn run_live(cli: &CliArgs, config: EngineConfig, rng: ChaCha8Rng) {
    let interval_ms = config.tick_interval_ms;
    let store = FileStore::new(&cli.state_dir);
    info!(dir = %store.dir().display(), interval_ms, "starting live market");

    let mut engine = MarketEngine::new(config, store, SystemClock, rng);
    engine.subscribe(|state: &MarketState| -> Result<(), ListenerError> {
        report::print_prices(state);
        Ok(())
    });
    let init = engine.ensure_initialized();
    info!(outcome = ?init.outcome, "market initialized");

    loop {
        let wait = engine.millis_until_next_tick().unwrap_or(interval_ms);
        std::thread::sleep(Duration::from_millis(wait.max(1)));
        engine.run_due();
        if cli.ticks.is_some_and(|max| engine.tick_count() >= max) {
            break;
        }
    }
}

// ─── Simulation Mode ────────────────────────────────────────────────────────

fn simulate(cli: &CliArgs, config: EngineConfig, rng: ChaCha8Rng) {
    let ticks = cli.ticks.unwrap_or(24 * 60);
    let interval_ms = config.tick_interval_ms;
    let clock = ManualClock::at_hour(cli.start_hour);

    println!("\n  Commodity Market Simulation");
    println!("  PRNG: ChaCha8Rng | Seed: {} | Ticks: {} | Start hour: {:02}:00\n",
        cli.seed.map_or("entropy".to_string(), |s| s.to_string()),
        ticks,
        cli.start_hour,
    );

    let started = Instant::now();
    let mut engine = MarketEngine::new(config, MemoryStore::new(), clock.clone(), rng);
    engine.ensure_initialized();

    let mut recorder = TimeSeriesRecorder::new();
    while engine.tick_count() < ticks {
        clock.advance(interval_ms);
        for result in engine.run_due() {
            recorder.record(&result);
        }
    }

    let summaries = report::summarize(recorder.snapshots(), engine.state());
    report::print_summary(&summaries);
    println!("  {} ticks in {:.1}ms\n", recorder.len(), started.elapsed().as_secs_f64() * 1000.0);

    if let Some(path) = &cli.time_series {
        match recorder.write_jsonl(path) {
            Ok(()) => println!("  Time series saved to: {}\n", path.display()),
            Err(e) => {
                error!(error = %e, path = %path.display(), "failed to write time series");
                std::process::exit(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_simulation_flags() {
        let cli = parse_args(&args(&[
            "simulate", "--ticks", "10", "--seed", "42", "--start-hour", "6",
            "--time-series", "out/day.jsonl",
        ]))
        .unwrap();
        assert_eq!(cli.mode, Mode::Simulate);
        assert_eq!(cli.ticks, Some(10));
        assert_eq!(cli.seed, Some(42));
        assert_eq!(cli.start_hour, 6);
        assert_eq!(cli.time_series, Some(PathBuf::from("out/day.jsonl")));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_args(&args(&["--ticks"])).is_err());
        assert!(parse_args(&args(&["--start-hour", "24"])).is_err());
        assert!(parse_args(&args(&["--seed", "abc"])).is_err());
        assert!(parse_args(&args(&["--frobnicate"])).is_err());
    }

    #[test]
    fn defaults_to_live_mode() {
        let cli = parse_args(&[]).unwrap();
        assert_eq!(cli.mode, Mode::Run);
        assert_eq!(cli.state_dir, PathBuf::from("market-state"));
        assert!(cli.ticks.is_none());
    }
}

//! skirmish-headless: run a scenario without a renderer and dump the result.
//!
//! Usage:
//!   skirmish-headless --scenario squadron --ticks 1800 --seed 7
//!   skirmish-headless --config tuning.json --every 60

use std::fs;
use std::process;

use skirmish_core::constants::TICK_RATE;
use skirmish_core::state::BattleSnapshot;
use skirmish_sim::scenario::SCENARIOS;
use skirmish_sim::{SimConfig, SimulationEngine};
use tracing::info;

struct Options {
    scenario: String,
    ticks: u64,
    seed: Option<u64>,
    config: Option<String>,
    every: Option<u64>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h" || a == "help") {
        print_usage();
        return;
    }
    let options = match parse_options(&args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{message}");
            print_usage();
            process::exit(1);
        }
    };

    let mut config = match &options.config {
        Some(path) => load_config(path),
        None => SimConfig::default(),
    };
    if let Some(seed) = options.seed {
        config.seed = seed;
    }

    let mut engine = match SimulationEngine::with_scenario(&options.scenario, config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Known scenarios: {}", SCENARIOS.join(", "));
            process::exit(1);
        }
    };

    let mut snapshot = BattleSnapshot::default();
    for _ in 0..options.ticks {
        snapshot = engine.tick();
        if let Some(every) = options.every {
            if every > 0 && snapshot.time.tick % every == 0 {
                summarize(&snapshot);
            }
        }
    }

    match serde_json::to_string_pretty(&snapshot) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error serializing snapshot: {e}");
            process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!(
        "skirmish-headless: run a SKIRMISH scenario and print the final snapshot\n\
         \n\
           --scenario <name>  Scenario to run (default: duel)\n\
           --ticks <N>        Ticks to simulate (default: {} = 30 s)\n\
           --seed <N>         RNG seed (overrides the config file)\n\
           --config <path>    JSON SimConfig; missing fields keep their defaults\n\
           --every <N>        Log a one-line summary every N ticks\n\
         \n\
         Scenarios: {}\n",
        u64::from(TICK_RATE) * 30,
        SCENARIOS.join(", ")
    );
}

fn parse_options(args: &[String]) -> Result<Options, String> {
    let mut options = Options {
        scenario: "duel".to_string(),
        ticks: u64::from(TICK_RATE) * 30,
        seed: None,
        config: None,
        every: None,
    };
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        let value = args
            .get(i + 1)
            .ok_or_else(|| format!("Missing value for {flag}"))?;
        match flag {
            "--scenario" => options.scenario = value.clone(),
            "--ticks" => options.ticks = parse_number(flag, value)?,
            "--seed" => options.seed = Some(parse_number(flag, value)?),
            "--config" => options.config = Some(value.clone()),
            "--every" => options.every = Some(parse_number(flag, value)?),
            other => return Err(format!("Unknown option: {other}")),
        }
        i += 2;
    }
    Ok(options)
}

fn parse_number(flag: &str, value: &str) -> Result<u64, String> {
    value
        .parse()
        .map_err(|_| format!("{flag} expects a number, got '{value}'"))
}

fn load_config(path: &str) -> SimConfig {
    let text = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading {path}: {e}");
        process::exit(1);
    });
    SimConfig::from_json(&text).unwrap_or_else(|e| {
        eprintln!("Error in {path}: {e}");
        process::exit(1);
    })
}

fn summarize(snapshot: &BattleSnapshot) {
    let states: Vec<String> = snapshot
        .agents
        .iter()
        .map(|a| format!("{}:{:?}", a.id, a.state))
        .collect();
    info!(
        tick = snapshot.time.tick,
        agents = snapshot.agents.len(),
        events = snapshot.events.len(),
        "{}",
        states.join(" ")
    );
}

//! Pong RL entry point
//!
//! `pong-rl [agent] [episodes] [settings.json] [scores.json]`
//!
//! Trains (or runs) one agent for a number of episodes and logs the bounce
//! count of each. Agents: `monte-carlo` (default), `td`, `tracker`.

use std::process::ExitCode;

#[cfg(not(target_arch = "wasm32"))]
fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    let mut args = std::env::args().skip(1);
    let agent_name = args.next().unwrap_or_else(|| "monte-carlo".to_string());
    let episodes: u64 = match args.next().map(|s| s.parse()) {
        None => 100,
        Some(Ok(n)) => n,
        Some(Err(e)) => {
            log::error!("Invalid episode count: {e}");
            return ExitCode::FAILURE;
        }
    };
    let settings = match args.next() {
        None => pong_rl::Settings::default(),
        Some(path) => match pong_rl::Settings::load(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("{e}");
                return ExitCode::FAILURE;
            }
        },
    };
    let scores_path = args.next();

    let mut agent: Box<dyn pong_rl::Agent> = match agent_name.as_str() {
        "monte-carlo" | "mc" => Box::new(pong_rl::MonteCarlo::new(&settings)),
        "td" => Box::new(pong_rl::TemporalDifference::new(&settings)),
        "tracker" => Box::new(pong_rl::Tracker::new(settings.paddle_half_length)),
        other => {
            log::error!("Unknown agent `{other}`; expected monte-carlo, td or tracker");
            return ExitCode::FAILURE;
        }
    };

    log::info!("Pong RL starting: {agent_name} for {episodes} episodes");
    let mut session = pong_rl::Session::new(settings);
    // An existing scores file is extended rather than overwritten
    let mut scores = match &scores_path {
        Some(path) if std::path::Path::new(path).exists() => {
            match pong_rl::Scoreboard::load(path) {
                Ok(scores) => scores,
                Err(e) => {
                    log::error!("{e}");
                    return ExitCode::FAILURE;
                }
            }
        }
        _ => pong_rl::Scoreboard::new(),
    };

    let offset = scores.episodes();
    for _ in 0..episodes {
        let bounces = session.play_episode(agent.as_mut());
        if let Some(rank) = scores.record(bounces) {
            log::debug!("Episode {} ranks #{rank}", scores.episodes());
        }
        if (scores.episodes() - offset) % 10 == 0 {
            log::info!(
                "{} episodes, mean of last 10: {:.2}",
                scores.episodes(),
                scores.mean_recent(10).unwrap_or_default()
            );
        }
    }

    if let Some(top) = scores.top() {
        log::info!("Best episode: #{} with {} bounces", top.episode, top.bounces);
    }
    if let Some(path) = scores_path {
        if let Err(e) = scores.save(&path) {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}

#[cfg(target_arch = "wasm32")]
fn main() -> ExitCode {
    // No native runtime on wasm; the library is usable on its own
    ExitCode::SUCCESS
}

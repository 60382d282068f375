//! Block Stacker headless runner
//!
//! Drives the engine at a fixed timestep with no renderer: either the
//! self-playing demo loop, or paid/free runs stopped by a simple bot.

use anyhow::{Context, Result, bail};
use clap::Parser;

use block_stacker::consts::SIM_DT;
use block_stacker::{
    ConfigPreset, Credits, Game, GameConfig, GameEvent, GamePhase, HighScores, MemoryWallet,
    ScoreSink, Stake, Wallet,
};

/// Ticks before a run is considered stuck (10 minutes of game time)
const MAX_TICKS_PER_RUN: u32 = 60 * 600;

#[derive(Debug, Parser)]
#[command(name = "block-stacker", about = "Headless stacking game runner")]
struct Args {
    /// Run seed
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Number of runs to play
    #[arg(long, default_value_t = 5)]
    runs: u32,
    /// Stake per run: "free" or an amount such as "0.50" or "5"
    #[arg(long, default_value = "free", value_parser = parse_stake)]
    stake: Stake,
    /// Starting wallet balance in whole credits
    #[arg(long, default_value_t = 100)]
    balance: u64,
    /// Play the self-stopping demo instead of bot runs
    #[arg(long)]
    demo: bool,
    /// Bot stops when the block is within this many columns of alignment
    #[arg(long, default_value_t = 0.2)]
    aim: f32,
    /// JSON config file
    #[arg(long)]
    config: Option<std::path::PathBuf>,
    /// Config preset applied on top of the config file
    #[arg(long, value_parser = parse_preset)]
    preset: Option<ConfigPreset>,
}

fn parse_stake(s: &str) -> Result<Stake, String> {
    if s.eq_ignore_ascii_case("free") {
        return Ok(Stake::Free);
    }
    let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
    if frac.len() > 2 {
        return Err(format!("stake {s} has more than two decimals"));
    }
    let whole: u64 = whole.parse().map_err(|e| format!("bad stake {s}: {e}"))?;
    let frac: u64 = if frac.is_empty() {
        0
    } else {
        format!("{frac:0<2}")
            .parse()
            .map_err(|e| format!("bad stake {s}: {e}"))?
    };
    let cents = whole
        .checked_mul(Credits::SCALE)
        .and_then(|c| c.checked_add(frac))
        .ok_or_else(|| format!("stake {s} is too large"))?;
    Ok(Stake::Amount(Credits::from_cents(cents)))
}

fn parse_preset(s: &str) -> Result<ConfigPreset, String> {
    ConfigPreset::from_str(s).ok_or_else(|| format!("unknown preset {s}"))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => GameConfig::default(),
    };
    if let Some(preset) = args.preset {
        config.apply_preset(preset);
        log::info!("Using {} preset", preset.as_str());
    }

    let balance = args
        .balance
        .checked_mul(Credits::SCALE)
        .context("starting balance is too large")?;
    let wallet = MemoryWallet::new(Credits::from_cents(balance));
    let mut game = Game::with_seed(config, wallet, args.seed)
        .context("invalid game config")?
        .with_score_sink(HighScores::new());

    if args.demo {
        run_demo(&mut game, args.runs)?;
    } else {
        for _ in 0..args.runs {
            if let Err(err) = game.start(args.stake) {
                log::warn!("Stopping early: {}", err);
                break;
            }
            play_bot_run(&mut game, args.aim)?;
            game.restart();
        }
    }

    log::info!(
        "Wallet: {} credits, {} points",
        game.wallet().balance(),
        game.wallet().points()
    );
    for (rank, entry) in game.scores().entries.iter().enumerate() {
        log::info!(
            "#{:<2} run {:<3} {:>6} pts  row {:>2}  {} blocks",
            rank + 1,
            entry.run_id,
            entry.score,
            entry.highest_row,
            entry.blocks_stacked
        );
    }
    Ok(())
}

fn run_demo<W: Wallet, S: ScoreSink>(game: &mut Game<W, S>, runs: u32) -> Result<()> {
    game.start_demo()?;
    let mut finished = 0;
    let mut ticks = 0u64;
    while finished < runs {
        game.tick(SIM_DT);
        ticks += 1;
        for event in game.drain_events() {
            if let GameEvent::RunEnded(summary) = event {
                finished += 1;
                println!(
                    "demo run {}: row {}, score {}, {:?}",
                    summary.run_id, summary.highest_row, summary.score, summary.reason
                );
            }
        }
        if ticks > u64::from(MAX_TICKS_PER_RUN) * u64::from(runs.max(1)) {
            bail!("demo stalled after {finished} runs");
        }
    }
    Ok(())
}

fn play_bot_run<W: Wallet, S: ScoreSink>(game: &mut Game<W, S>, aim: f32) -> Result<()> {
    for _ in 0..MAX_TICKS_PER_RUN {
        game.tick(SIM_DT);

        if let Some(moving) = game.state().current
            && moving.motion.position.abs() <= aim
        {
            game.stop_block();
        }

        for event in game.drain_events() {
            match event {
                GameEvent::RunEnded(summary) => println!(
                    "run {}: stake {}, row {}, score {}, prize {} {:?}",
                    summary.run_id,
                    summary.stake,
                    summary.highest_row,
                    summary.score,
                    summary.prize.amount,
                    summary.prize.kind
                ),
                GameEvent::Settled(_) => return Ok(()),
                _ => {}
            }
        }
        if game.state().phase == GamePhase::Ready {
            return Ok(());
        }
    }
    bail!("run {} did not finish", game.state().run_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stake_parsing() {
        assert_eq!(parse_stake("free"), Ok(Stake::Free));
        assert_eq!(parse_stake("5"), Ok(Stake::whole(5)));
        assert_eq!(parse_stake("0.5"), Ok(Stake::Amount(Credits::from_cents(50))));
        assert_eq!(parse_stake("0.05"), Ok(Stake::Amount(Credits::from_cents(5))));
        assert!(parse_stake("1.234").is_err());
        assert!(parse_stake("abc").is_err());
        assert!(parse_stake("184467440737095517").is_err());
        assert!(parse_stake("184467440737095516.16").is_err());
        assert_eq!(
            parse_stake("184467440737095516.15"),
            Ok(Stake::Amount(Credits::from_cents(u64::MAX)))
        );
    }
}

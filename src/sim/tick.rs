//! Phase controller and per-frame tick
//!
//! [`Game`] owns the state record and is the only thing that mutates it.
//! Hosts drive it with `tick(dt)` once per frame and feed it commands;
//! renderers read [`GameState`] through `state()` or a subscription.

use serde::{Deserialize, Serialize};

use super::autoplay::plan_auto_stop;
use super::combo::score_placement;
use super::motion::{integrate, travel_range};
use super::placement::{Placement, resolve};
use super::prize::{Prize, calculate_prize};
use super::rng::{SeededRng, UniformSource};
use super::spawn::{base_block, plan_spawn};
use super::state::{Block, Direction, EndReason, GamePhase, GameState};
use super::timers::{TaskHandle, TaskKind, TaskQueue};
use crate::consts::MAX_TASKS_PER_TICK;
use crate::error::{CommandError, ConfigError, LedgerError, RngError, StartError};
use crate::ledger::{ScoreSink, ScoreSubmission, Wallet};
use crate::settings::GameConfig;
use crate::stake::Stake;

/// Commands accepted through [`Game::dispatch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SetStake(Stake),
    CycleStake,
    Start(Stake),
    StartDemo,
    StopBlock,
    Restart,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::SetStake(_) => "set_stake",
            Command::CycleStake => "cycle_stake",
            Command::Start(_) => "start",
            Command::StartDemo => "start_demo",
            Command::StopBlock => "stop_block",
            Command::Restart => "restart",
        }
    }
}

/// Final numbers of a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: u64,
    pub demo: bool,
    pub reason: EndReason,
    pub stake: Stake,
    pub highest_row: u32,
    pub blocks_stacked: u32,
    pub score: u64,
    pub bonus_points: u64,
    pub prize: Prize,
}

/// A prize waiting to be paid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub run_id: u64,
    pub stake: Stake,
    pub prize: Prize,
    pub submission: ScoreSubmission,
}

/// Things that happened, for hosts that want more than state diffs
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    RunStarted {
        run_id: u64,
        phase: GamePhase,
        stake: Stake,
    },
    BlockSpawned {
        row: u32,
        speed: f32,
    },
    BlockPlaced {
        row: u32,
        active_count: usize,
        perfect: bool,
        streak: u32,
        multiplier: f32,
        awarded: u64,
        bonus: u64,
    },
    RunEnded(RunSummary),
    Settled(Settlement),
    CommandRejected {
        command: &'static str,
        phase: GamePhase,
    },
}

/// Handle returned by [`Game::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&GameState)>;

/// The stacking game engine
pub struct Game<W: Wallet, S: ScoreSink = ()> {
    config: GameConfig,
    state: GameState,
    rng: Box<dyn UniformSource>,
    tasks: TaskQueue,
    wallet: W,
    scores: S,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
    events: Vec<GameEvent>,
    /// Heading of the last stopped block, `None` before the first stop of a run
    last_direction: Option<Direction>,
    pending_settlement: Option<Settlement>,
}

impl<W: Wallet> Game<W, ()> {
    /// Build an engine. The config is validated up front; speeds, delays and
    /// tables are trusted from then on.
    pub fn new(
        config: GameConfig,
        wallet: W,
        rng: Box<dyn UniformSource>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let state = GameState::new(rng.rng_state());
        Ok(Self {
            config,
            state,
            rng,
            tasks: TaskQueue::new(),
            wallet,
            scores: (),
            listeners: Vec::new(),
            next_subscription: 0,
            events: Vec::new(),
            last_direction: None,
            pending_settlement: None,
        })
    }

    /// Engine backed by a seeded PCG source
    pub fn with_seed(config: GameConfig, wallet: W, seed: u64) -> Result<Self, ConfigError> {
        Self::new(config, wallet, Box::new(SeededRng::new(seed)))
    }

    /// Attach score persistence
    pub fn with_score_sink<S: ScoreSink>(self, scores: S) -> Game<W, S> {
        Game {
            config: self.config,
            state: self.state,
            rng: self.rng,
            tasks: self.tasks,
            wallet: self.wallet,
            scores,
            listeners: self.listeners,
            next_subscription: self.next_subscription,
            events: self.events,
            last_direction: self.last_direction,
            pending_settlement: self.pending_settlement,
        }
    }
}

impl<W: Wallet, S: ScoreSink> Game<W, S> {
    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    pub fn scores(&self) -> &S {
        &self.scores
    }

    pub fn tasks(&self) -> &TaskQueue {
        &self.tasks
    }

    /// Call `listener` with the state after every change
    pub fn subscribe(&mut self, listener: impl FnMut(&GameState) + 'static) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn notify(&mut self) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&self.state);
        }
    }

    fn reject(&mut self, command: &'static str) {
        let phase = self.state.phase;
        log::warn!("Ignoring {} in phase {:?}", command, phase);
        self.events.push(GameEvent::CommandRejected { command, phase });
    }

    /// Run a command, reporting no-ops as errors
    pub fn dispatch(&mut self, command: Command) -> Result<(), CommandError> {
        let done = match command {
            Command::SetStake(stake) => self.set_stake(stake),
            Command::CycleStake => self.cycle_stake().is_some(),
            Command::Start(stake) => return self.start(stake).map_err(CommandError::from),
            Command::StartDemo => return self.start_demo().map_err(CommandError::from),
            Command::StopBlock => self.stop_block().is_some(),
            Command::Restart => self.restart(),
        };
        if done {
            Ok(())
        } else {
            Err(CommandError::Ignored {
                command: command.name(),
                phase: self.state.phase,
            })
        }
    }

    // === Stake selection (ready only) ===

    pub fn set_stake(&mut self, stake: Stake) -> bool {
        if self.state.phase != GamePhase::Ready || !self.config.stakes.contains(stake) {
            self.reject("set_stake");
            return false;
        }
        self.state.stake = stake;
        self.notify();
        true
    }

    pub fn cycle_stake(&mut self) -> Option<Stake> {
        if self.state.phase != GamePhase::Ready {
            self.reject("cycle_stake");
            return None;
        }
        let next = self.config.stakes.cycle(self.state.stake);
        self.state.stake = next;
        self.notify();
        Some(next)
    }

    // === Phase transitions ===

    /// Ready -> Playing. Debits the stake; on failure nothing changes.
    pub fn start(&mut self, stake: Stake) -> Result<(), StartError> {
        if self.state.phase != GamePhase::Ready {
            self.reject("start");
            return Err(StartError::InvalidPhase(self.state.phase));
        }
        if !self.config.stakes.contains(stake) {
            log::warn!("Rejecting start with unknown stake {}", stake);
            return Err(StartError::UnknownStake(stake));
        }
        if let Some(amount) = stake.amount() {
            self.wallet.debit(amount).map_err(|err| {
                let LedgerError::InsufficientFunds { balance, .. } = err;
                log::warn!("Rejecting start: stake {} exceeds balance {}", amount, balance);
                StartError::InsufficientFunds {
                    stake: amount,
                    balance,
                }
            })?;
        }

        self.state.stake = stake;
        self.begin_run(GamePhase::Playing);
        self.notify();
        Ok(())
    }

    /// Ready -> Demo. No stake, no funds check.
    pub fn start_demo(&mut self) -> Result<(), StartError> {
        if self.state.phase != GamePhase::Ready {
            self.reject("start_demo");
            return Err(StartError::InvalidPhase(self.state.phase));
        }
        self.begin_run(GamePhase::Demo);
        self.notify();
        Ok(())
    }

    /// Back to Ready from Ended, Ready or Demo. A pending payout is settled
    /// first. Refused while a paid run is in play.
    pub fn restart(&mut self) -> bool {
        if self.state.phase == GamePhase::Playing {
            self.reject("restart");
            return false;
        }
        if self.pending_settlement.is_some() {
            self.settle();
        }
        self.tasks.cancel_all();
        self.state.clear_run();
        self.state.phase = GamePhase::Ready;
        self.last_direction = None;
        log::info!("Back to ready");
        self.notify();
        true
    }

    fn run_stake(&self) -> Stake {
        match self.state.phase {
            GamePhase::Demo => Stake::Free,
            _ => self.state.stake,
        }
    }

    fn begin_run(&mut self, phase: GamePhase) {
        self.tasks.cancel_all();
        self.pending_settlement = None;
        self.last_direction = None;

        let base = base_block(&self.config, self.rng.as_mut());
        let rng_failed = base.is_err();
        let base = base.unwrap_or_else(|_| Block::centered(0, self.config.first_block_width));
        self.state.begin_run(phase, base);

        log::info!(
            "Run {} started ({:?}, stake {})",
            self.state.run_id,
            phase,
            self.state.stake
        );
        self.events.push(GameEvent::RunStarted {
            run_id: self.state.run_id,
            phase,
            stake: self.run_stake(),
        });

        if rng_failed {
            log::error!("Random source failed while dealing the base block");
            self.end_run(EndReason::RngFailure);
        } else {
            self.schedule(TaskKind::Spawn, self.config.spawn_delay, None);
        }
    }

    fn schedule(&mut self, kind: TaskKind, delay: f32, row: Option<u32>) -> TaskHandle {
        self.tasks
            .schedule(kind, self.state.clock, delay, self.state.run_id, row)
    }

    fn spawn_next(&mut self) {
        let stake = self.run_stake();
        let planned = plan_spawn(
            self.state.top_block(),
            self.last_direction,
            stake,
            &self.config,
            self.rng.as_mut(),
        );
        let moving = match planned {
            Ok(moving) => moving,
            Err(err) => return self.fail_rng(err),
        };

        self.state.current = Some(moving);
        self.events.push(GameEvent::BlockSpawned {
            row: moving.block.row,
            speed: moving.motion.speed,
        });

        if self.state.phase == GamePhase::Demo {
            match plan_auto_stop(&moving, &self.config.autoplay, self.rng.as_mut()) {
                Ok(plan) => {
                    log::trace!(
                        "Demo will stop row {} near {:.2} in {:.2}s",
                        moving.block.row,
                        plan.target,
                        plan.delay
                    );
                    self.schedule(TaskKind::AutoStop, plan.delay, Some(moving.block.row));
                }
                Err(err) => self.fail_rng(err),
            }
        }
    }

    fn fail_rng(&mut self, err: RngError) {
        log::error!("Random source failed: {}", err);
        self.end_run(EndReason::RngFailure);
    }

    // === Motion ===

    /// Advance the moving block by `dt` seconds. No-op unless a block is in flight.
    pub fn update_block_position(&mut self, dt: f32) {
        if !self.state.phase.is_active() {
            return;
        }
        if let Some(moving) = self.state.current.as_mut() {
            let range = travel_range(&moving.block);
            integrate(&mut moving.motion, dt, range);
        }
    }

    /// Per-frame entry point: move the block, then fire due tasks
    pub fn tick(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        self.state.clock += f64::from(dt);
        self.update_block_position(dt);

        let mut fired = 0;
        while let Some(handle) = self.tasks.peek_due(self.state.clock) {
            if fired >= MAX_TASKS_PER_TICK {
                log::warn!("Deferring remaining tasks to next tick");
                break;
            }
            self.fire(handle);
            fired += 1;
        }

        self.notify();
    }

    /// Run a deferred task. Handles that were cancelled or belong to an
    /// earlier run are ignored.
    pub fn fire(&mut self, handle: TaskHandle) {
        if !self.tasks.take(&handle) {
            log::warn!(
                "Ignoring stale {} task (gen {})",
                handle.kind.as_str(),
                handle.generation
            );
            return;
        }
        if handle.run_id != self.state.run_id {
            log::warn!("Ignoring {} task from run {}", handle.kind.as_str(), handle.run_id);
            return;
        }

        let phase = self.state.phase;
        match handle.kind {
            TaskKind::Spawn => {
                if phase.is_active() && self.state.current.is_none() {
                    self.spawn_next();
                }
            }
            TaskKind::AutoStop => {
                let row = self.state.current.map(|m| m.block.row);
                if phase == GamePhase::Demo && row.is_some() && row == handle.row {
                    self.place();
                }
            }
            TaskKind::DemoRestart => {
                if phase == GamePhase::Ended {
                    self.begin_run(GamePhase::Demo);
                }
            }
            TaskKind::Settlement => {
                if phase == GamePhase::Ended {
                    self.settle();
                }
            }
        }
    }

    // === Placement ===

    /// Stop the moving block where it is. Returns `None` (and changes
    /// nothing) when no block is in flight.
    pub fn stop_block(&mut self) -> Option<Placement> {
        if !self.state.phase.is_active() || self.state.current.is_none() {
            self.reject("stop_block");
            return None;
        }
        let placement = self.place();
        self.notify();
        placement
    }

    fn place(&mut self) -> Option<Placement> {
        let moving = self.state.current.take()?;
        self.tasks.cancel(TaskKind::AutoStop);
        self.last_direction = Some(moving.motion.direction);

        let previous = *self.state.top_block()?;
        let placement = resolve(&moving.block, moving.motion.position, &previous);
        self.state.last_placement = Some(placement);

        if !placement.has_overlap {
            log::debug!(
                "Row {} missed at {:.2}",
                moving.block.row,
                moving.motion.position
            );
            self.end_run(EndReason::Missed);
            return Some(placement);
        }

        let perfect = self
            .state
            .combo
            .register(placement.active_count, previous.active_count());
        let row = placement.block.row;
        let points = score_placement(
            placement.active_count,
            self.state.combo.multiplier,
            row,
            self.config.scoring_row,
            self.config.bonus_requires_scoring_row,
        );

        let progress = &mut self.state.progress;
        progress.highest_row = progress.highest_row.max(row);
        progress.blocks_stacked += 1;
        progress.score += points.awarded;
        progress.bonus_points += points.bonus;
        self.state.stack.push(placement.block);

        log::debug!(
            "Row {} placed: {} columns{} (+{} score, +{} bonus)",
            row,
            placement.active_count,
            if perfect { ", perfect" } else { "" },
            points.awarded,
            points.bonus
        );
        self.events.push(GameEvent::BlockPlaced {
            row,
            active_count: placement.active_count,
            perfect,
            streak: self.state.combo.streak,
            multiplier: self.state.combo.multiplier,
            awarded: points.awarded,
            bonus: points.bonus,
        });

        if self.state.progress.highest_row >= self.config.terminal_row {
            self.end_run(EndReason::TopReached);
        } else {
            self.schedule(TaskKind::Spawn, self.config.spawn_delay, None);
        }
        Some(placement)
    }

    // === End of run ===

    fn end_run(&mut self, reason: EndReason) {
        let demo = self.state.phase == GamePhase::Demo;
        let stake = self.run_stake();
        self.tasks.cancel(TaskKind::Spawn);
        self.tasks.cancel(TaskKind::AutoStop);

        let progress = self.state.progress;
        let prize = calculate_prize(
            &self.config.prizes,
            progress.highest_row,
            stake,
            self.config.scoring_row,
            &self.config.stakes,
        );

        self.state.phase = GamePhase::Ended;
        self.state.current = None;
        self.state.end_reason = Some(reason);
        self.state.prize = Some(prize);

        let summary = RunSummary {
            run_id: self.state.run_id,
            demo,
            reason,
            stake,
            highest_row: progress.highest_row,
            blocks_stacked: progress.blocks_stacked,
            score: progress.score,
            bonus_points: progress.bonus_points,
            prize,
        };
        log::info!(
            "Run {} ended ({:?}) at row {}: score {}, prize {} {:?}",
            summary.run_id,
            reason,
            summary.highest_row,
            summary.score,
            prize.amount,
            prize.kind
        );
        self.events.push(GameEvent::RunEnded(summary));

        if demo {
            if reason != EndReason::RngFailure {
                self.schedule(TaskKind::DemoRestart, self.config.demo_restart_delay, None);
            }
            return;
        }

        self.pending_settlement = Some(Settlement {
            run_id: summary.run_id,
            stake,
            prize,
            submission: ScoreSubmission {
                run_id: summary.run_id,
                score: summary.score,
                blocks_stacked: summary.blocks_stacked,
                highest_row: summary.highest_row,
            },
        });
        self.schedule(TaskKind::Settlement, self.config.settlement_delay, None);
    }

    fn settle(&mut self) {
        self.tasks.cancel(TaskKind::Settlement);
        let Some(settlement) = self.pending_settlement.take() else {
            return;
        };
        if !settlement.prize.is_nothing() {
            self.wallet.credit(settlement.prize);
        }
        self.scores
            .submit_score(settlement.submission, self.state.clock);
        log::info!(
            "Run {} settled: {} {:?}",
            settlement.run_id,
            settlement.prize.amount,
            settlement.prize.kind
        );
        self.events.push(GameEvent::Settled(settlement));
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::consts::SIM_DT;
    use crate::highscores::HighScores;
    use crate::ledger::MemoryWallet;
    use crate::sim::prize::PrizeKind;
    use crate::sim::rng::ScriptedRng;
    use crate::sim::state::{MotionState, MovingBlock};
    use crate::stake::Credits;

    fn wallet(whole: u64) -> MemoryWallet {
        MemoryWallet::new(Credits::from_whole(whole))
    }

    fn seeded(whole: u64) -> Game<MemoryWallet> {
        Game::with_seed(GameConfig::default(), wallet(whole), 12345).unwrap()
    }

    /// Tick until a block is in flight (or the run ends)
    fn until_spawned<W: Wallet, S: ScoreSink>(game: &mut Game<W, S>) {
        for _ in 0..600 {
            if game.state().current.is_some() || game.state().phase == GamePhase::Ended {
                return;
            }
            game.tick(SIM_DT);
        }
        panic!("no block spawned");
    }

    /// Put the moving block exactly at `position`
    fn park<W: Wallet, S: ScoreSink>(game: &mut Game<W, S>, position: f32) {
        let moving = game.state.current.as_mut().expect("block in flight");
        moving.motion.position = position;
    }

    #[test]
    fn start_debits_and_spawns_after_delay() {
        let mut game = seeded(10);
        game.start(Stake::whole(5)).unwrap();
        assert_eq!(game.state().phase, GamePhase::Playing);
        assert_eq!(game.wallet().balance(), Credits::from_whole(5));
        assert_eq!(game.state().stack.len(), 1);
        assert!(game.state().current.is_none());

        until_spawned(&mut game);
        let current = game.state().current.unwrap();
        assert_eq!(current.block.row, 1);
        assert_eq!(current.block.occupied, game.state().stack[0].occupied);
    }

    #[test]
    fn insufficient_funds_changes_nothing() {
        let mut game = seeded(2);
        let err = game.start(Stake::whole(5)).unwrap_err();
        assert_eq!(
            err,
            StartError::InsufficientFunds {
                stake: Credits::from_whole(5),
                balance: Credits::from_whole(2),
            }
        );
        assert_eq!(game.state().phase, GamePhase::Ready);
        assert_eq!(game.state().run_id, 0);
        assert!(game.state().stack.is_empty());
        assert!(game.tasks().is_empty());
    }

    #[test]
    fn unknown_stake_is_rejected() {
        let mut game = seeded(100);
        assert_eq!(
            game.start(Stake::whole(7)),
            Err(StartError::UnknownStake(Stake::whole(7)))
        );
    }

    #[test]
    fn perfect_stop_scores_combo() {
        let mut game = seeded(10);
        game.start(Stake::whole(1)).unwrap();
        until_spawned(&mut game);
        park(&mut game, 0.0);

        let placement = game.stop_block().unwrap();
        assert!(placement.has_overlap);
        assert_eq!(placement.active_count, 3);
        assert_eq!(game.state().combo.streak, 1);
        assert_eq!(game.state().combo.multiplier, 1.5);
        assert_eq!(game.state().progress.highest_row, 1);
        assert_eq!(game.state().progress.blocks_stacked, 1);
        // row 1 is below the scoring row
        assert_eq!(game.state().progress.score, 0);
        assert_eq!(game.state().phase, GamePhase::Playing);
    }

    #[test]
    fn miss_ends_run_and_settles() {
        let mut game = seeded(10);
        game.start(Stake::whole(1)).unwrap();
        until_spawned(&mut game);
        park(&mut game, 2.0);
        // mask {2,3,4} at +2 -> {4,5,6}: column 4 still overlaps
        assert_eq!(game.stop_block().unwrap().active_count, 1);

        until_spawned(&mut game);
        park(&mut game, -2.0);
        // {4} at -2 -> {2}, not on top of {4}
        let placement = game.stop_block().unwrap();
        assert!(!placement.has_overlap);
        assert_eq!(game.state().phase, GamePhase::Ended);
        assert_eq!(game.state().end_reason, Some(EndReason::Missed));
        assert_eq!(game.state().prize, Some(Prize::NOTHING));
        assert!(game.tasks().pending(TaskKind::Settlement).is_some());

        for _ in 0..120 {
            game.tick(SIM_DT);
        }
        assert!(game.tasks().is_empty());
        let events = game.drain_events();
        assert!(events.iter().any(|e| matches!(e, GameEvent::Settled(_))));
    }

    #[test]
    fn stop_without_block_is_noop() {
        let mut game = seeded(10);
        assert!(game.stop_block().is_none());
        game.start(Stake::Free).unwrap();
        // spawn delay not elapsed yet
        assert!(game.stop_block().is_none());
        assert_eq!(game.state().stack.len(), 1);
        assert_eq!(
            game.dispatch(Command::StopBlock),
            Err(CommandError::Ignored {
                command: "stop_block",
                phase: GamePhase::Playing
            })
        );
    }

    #[test]
    fn stake_only_changes_while_ready() {
        let mut game = seeded(10);
        assert!(game.set_stake(Stake::whole(2)));
        assert_eq!(game.cycle_stake(), Some(Stake::whole(5)));
        game.start(Stake::whole(1)).unwrap();
        assert!(!game.set_stake(Stake::whole(2)));
        assert_eq!(game.cycle_stake(), None);
        assert_eq!(game.state().stake, Stake::whole(1));
    }

    #[test]
    fn reaching_terminal_row_pays_top_tier() {
        let config = GameConfig::default();
        let terminal = config.terminal_row;
        let mut game = Game::with_seed(config, wallet(5), 777)
            .unwrap()
            .with_score_sink(HighScores::new());
        game.start(Stake::whole(5)).unwrap();
        assert_eq!(game.wallet().balance(), Credits::ZERO);

        for _ in 0..terminal {
            until_spawned(&mut game);
            park(&mut game, 0.0);
            game.stop_block().unwrap();
        }
        assert_eq!(game.state().phase, GamePhase::Ended);
        assert_eq!(game.state().end_reason, Some(EndReason::TopReached));
        assert_eq!(game.state().progress.highest_row, 13);
        assert_eq!(game.state().prize, Some(Prize::cash(Credits::from_whole(500))));

        // paid when the settlement task fires
        assert_eq!(game.wallet().balance(), Credits::ZERO);
        for _ in 0..120 {
            game.tick(SIM_DT);
        }
        assert_eq!(game.wallet().balance(), Credits::from_whole(500));
        assert_eq!(game.scores().top_score(), Some(game.state().progress.score));
        assert!(game.state().progress.score > 0);
    }

    #[test]
    fn restart_flushes_pending_settlement() {
        let mut game = Game::with_seed(GameConfig::default(), wallet(5), 9).unwrap();
        game.start(Stake::whole(5)).unwrap();
        for _ in 0..13 {
            until_spawned(&mut game);
            park(&mut game, 0.0);
            game.stop_block().unwrap();
        }
        assert!(game.restart());
        assert_eq!(game.wallet().balance(), Credits::from_whole(500));
        assert_eq!(game.state().phase, GamePhase::Ready);
        assert!(game.state().stack.is_empty());
        assert!(game.tasks().is_empty());
    }

    #[test]
    fn restart_refused_mid_run() {
        let mut game = seeded(10);
        game.start(Stake::Free).unwrap();
        assert!(!game.restart());
        assert_eq!(game.state().phase, GamePhase::Playing);
    }

    #[test]
    fn demo_auto_stop_fires_once() {
        let mut game = seeded(0);
        game.start_demo().unwrap();
        assert_eq!(game.state().phase, GamePhase::Demo);
        until_spawned(&mut game);
        let row = game.state().current.unwrap().block.row;
        assert!(game.tasks().pending(TaskKind::AutoStop).is_some());

        // let the auto-stop fire without touching input
        for _ in 0..6000 {
            game.tick(SIM_DT);
            if game.state().current.is_none() {
                break;
            }
        }
        assert!(game.state().current.is_none());
        assert!(game.state().last_placement.is_some());
        assert!(game.tasks().pending(TaskKind::AutoStop).is_none());
        assert_eq!(game.state().last_placement.unwrap().block.row, row);

        // manual stop afterwards has nothing to stop
        let stack_len = game.state().stack.len();
        assert!(game.stop_block().is_none());
        assert_eq!(game.state().stack.len(), stack_len);
    }

    #[test]
    fn manual_stop_cancels_auto_stop() {
        let mut game = seeded(0);
        game.start_demo().unwrap();
        until_spawned(&mut game);
        let handle = *game.tasks().pending(TaskKind::AutoStop).unwrap();
        park(&mut game, 0.0);
        game.stop_block().unwrap();
        assert!(!game.tasks().is_live(&handle));

        // a late fire of the cancelled handle does nothing
        let placed = game.state().stack.len();
        game.fire(handle);
        assert_eq!(game.state().stack.len(), placed);
    }

    #[test]
    fn demo_loops_after_ending() {
        let mut game = seeded(0);
        game.start_demo().unwrap();
        until_spawned(&mut game);
        park(&mut game, 3.0);
        // {2,3,4} shifted to {5,6,7}: nothing lands
        game.stop_block().unwrap();
        assert_eq!(game.state().phase, GamePhase::Ended);
        assert!(game.tasks().pending(TaskKind::DemoRestart).is_some());
        assert!(game.tasks().pending(TaskKind::Settlement).is_none());

        let ticks = (game.config().demo_restart_delay / SIM_DT) as usize + 2;
        for _ in 0..ticks {
            game.tick(SIM_DT);
        }
        assert_eq!(game.state().phase, GamePhase::Demo);
        assert_eq!(game.state().run_id, 2);
        assert_eq!(game.wallet().history().len(), 0);
    }

    #[test]
    fn rng_failure_ends_run() {
        // enough samples for nothing: the first spawn fails
        let mut game =
            Game::new(GameConfig::default(), wallet(10), Box::new(ScriptedRng::new([]))).unwrap();
        game.start(Stake::Free).unwrap();
        for _ in 0..120 {
            game.tick(SIM_DT);
        }
        assert_eq!(game.state().phase, GamePhase::Ended);
        assert_eq!(game.state().end_reason, Some(EndReason::RngFailure));
        assert!(game.state().current.is_none());
    }

    #[test]
    fn demo_rng_failure_does_not_loop() {
        // position, direction and speed succeed; the auto-stop roll runs dry
        let rng = ScriptedRng::new([0.5, 0.5, 0.5]);
        let mut game = Game::new(GameConfig::default(), wallet(0), Box::new(rng)).unwrap();
        game.start_demo().unwrap();
        let ticks = ((game.config().spawn_delay + game.config().demo_restart_delay) / SIM_DT) as usize;
        for _ in 0..ticks * 2 {
            game.tick(SIM_DT);
        }
        assert_eq!(game.state().phase, GamePhase::Ended);
        assert_eq!(game.state().end_reason, Some(EndReason::RngFailure));
        assert_eq!(game.state().run_id, 1);
        assert!(game.tasks().pending(TaskKind::DemoRestart).is_none());
        assert!(game.tasks().is_empty());
    }

    #[test]
    fn zero_base_speed_is_refused() {
        let config = GameConfig {
            base_speed: 0.0,
            ..GameConfig::default()
        };
        let err = Game::with_seed(config, wallet(0), 1).err().unwrap();
        assert!(matches!(err, ConfigError::Invalid { field: "base_speed", .. }));

        let config = GameConfig {
            base_speed: f32::NAN,
            ..GameConfig::default()
        };
        assert!(Game::new(config, wallet(0), Box::new(SeededRng::new(1))).is_err());
    }

    #[test]
    fn tasks_past_the_cap_fire_next_tick() {
        // Every spawn lands exactly aligned with a zero auto-stop delay, so
        // spawn and auto-stop keep rescheduling each other at the same instant.
        let mut config = GameConfig::default();
        config.spawn_delay = 0.0;
        config.autoplay.jitter = 0.0;
        config.autoplay.min_delay = 0.0;
        let rng = ScriptedRng::new([]).then_repeat(0.5);
        let mut game = Game::new(config, wallet(0), Box::new(rng)).unwrap();
        game.start_demo().unwrap();

        let per_tick = (MAX_TASKS_PER_TICK / 2) as usize;
        game.tick(SIM_DT);
        assert_eq!(game.state().stack.len(), 1 + per_tick);
        assert!(game.state().current.is_none());
        let spawn = *game.tasks().pending(TaskKind::Spawn).unwrap();
        assert!(spawn.due <= game.state().clock);

        game.tick(SIM_DT);
        assert_eq!(game.state().stack.len(), 1 + 2 * per_tick);
        assert_eq!(game.state().phase, GamePhase::Demo);
        assert!(!game.tasks().is_live(&spawn));
    }

    #[test]
    fn rejected_command_is_reported_as_event() {
        let mut game = seeded(10);
        assert!(game.stop_block().is_none());
        assert_eq!(
            game.drain_events(),
            vec![GameEvent::CommandRejected {
                command: "stop_block",
                phase: GamePhase::Ready,
            }]
        );
        assert!(game.drain_events().is_empty());
    }

    #[test]
    fn motion_only_while_active() {
        let mut game = seeded(10);
        game.start(Stake::Free).unwrap();
        until_spawned(&mut game);
        game.state.current = Some(MovingBlock {
            block: game.state.current.unwrap().block,
            motion: MotionState {
                position: 0.0,
                direction: Direction::Right,
                speed: 1.0,
            },
        });
        game.update_block_position(0.5);
        assert_eq!(game.state().current.unwrap().motion.position, 0.5);

        game.state.phase = GamePhase::Ready;
        game.update_block_position(0.5);
        assert_eq!(game.state().current.unwrap().motion.position, 0.5);
    }

    #[test]
    fn subscribers_see_every_tick() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut game = seeded(10);
        let id = game.subscribe(move |state| sink.borrow_mut().push(state.phase));
        game.start(Stake::Free).unwrap();
        game.tick(SIM_DT);
        assert_eq!(*seen.borrow(), vec![GamePhase::Playing, GamePhase::Playing]);

        assert!(game.unsubscribe(id));
        game.tick(SIM_DT);
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn free_play_run_earns_points_not_cash() {
        let mut game = seeded(0);
        game.start(Stake::Free).unwrap();
        for _ in 0..6 {
            until_spawned(&mut game);
            park(&mut game, 0.0);
            game.stop_block().unwrap();
        }
        until_spawned(&mut game);
        park(&mut game, 3.0);
        game.stop_block().unwrap();
        let prize = game.state().prize.unwrap();
        assert_eq!(prize.kind, PrizeKind::Points);
        assert_eq!(prize.amount, 100);
        for _ in 0..120 {
            game.tick(SIM_DT);
        }
        assert_eq!(game.wallet().points(), 100);
        assert_eq!(game.wallet().balance(), Credits::ZERO);
    }

    #[test]
    fn same_seed_same_run() {
        let run = |seed| {
            let mut game = Game::with_seed(GameConfig::default(), wallet(0), seed).unwrap();
            game.start_demo().unwrap();
            for _ in 0..3000 {
                game.tick(SIM_DT);
            }
            (game.state().run_id, game.state().progress, game.state().stack.clone())
        };
        assert_eq!(run(42), run(42));
    }
}

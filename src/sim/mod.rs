//! Deterministic simulation module
//!
//! All gameplay logic lives here:
//! - Seeded or injected RNG only
//! - Time advances only through `Game::tick`
//! - No rendering, wallet or storage dependencies beyond the collaborator traits

pub mod autoplay;
pub mod combo;
pub mod motion;
pub mod placement;
pub mod prize;
pub mod rng;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod timers;

pub use autoplay::{AutoStopPlan, plan_auto_stop};
pub use combo::{ComboState, PlacementScore, is_perfect, multiplier_for, score_placement};
pub use motion::{TravelRange, integrate, travel_distance, travel_range};
pub use placement::{Placement, resolve, snap_column};
pub use prize::{PointsPolicy, Prize, PrizeKind, PrizeTable, PrizeTier, TierReward, calculate_prize};
pub use rng::{ScriptedRng, SeededRng, UniformSource};
pub use spawn::{base_block, block_speed, plan_spawn};
pub use state::{
    Block, Direction, EndReason, GamePhase, GameState, MotionState, MovingBlock, ProgressState,
    RngState,
};
pub use tick::{Command, Game, GameEvent, RunSummary, Settlement, SubscriptionId};
pub use timers::{TaskHandle, TaskKind, TaskQueue};

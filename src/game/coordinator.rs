//! Game Coordinator
//!
//! Authoritative owner of the player registry and coin field.
//!
//! Every mutation runs under one write lock covering registry, coins and
//! RNG, so a name is claimed at most once, a coin is collected at most once,
//! and repopulation never interleaves with another move's collection.
//! Snapshots take the read lock and always see a whole move or none of it.

use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::core::grid::{Cell, Direction};
use crate::core::rng::{entropy_seed, DeterministicRng};
use crate::game::board::BoardConfig;
use crate::game::coins::{CoinField, CoinValue};
use crate::game::error::GameError;
use crate::game::registry::{PlayerId, PlayerRegistry};
use crate::game::snapshot::{project, GameState};

/// Result of a single applied move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Cell the player now occupies.
    pub position: Cell,
    /// Coin picked up on arrival, if any.
    pub collected: Option<CoinValue>,
    /// Player's score after the move.
    pub score: u32,
    /// Whether this move emptied the field and triggered a fresh batch.
    pub repopulated: bool,
}

/// Mutable state behind the coordinator lock.
struct World {
    players: PlayerRegistry,
    coins: CoinField,
    rng: DeterministicRng,
}

/// Shared game coordinator.
///
/// Construct once at startup and share as `Arc<GameCoordinator>`.
pub struct GameCoordinator {
    board: BoardConfig,
    seed: u64,
    world: RwLock<World>,
}

impl GameCoordinator {
    /// Create a coordinator with a fresh random seed.
    pub fn new(board: BoardConfig) -> Self {
        Self::with_seed(board, entropy_seed())
    }

    /// Create a coordinator with a fixed seed.
    ///
    /// The first coin batch is laid out immediately.
    pub fn with_seed(board: BoardConfig, seed: u64) -> Self {
        let mut rng = DeterministicRng::new(seed);
        let mut coins = CoinField::new(board);
        coins.repopulate(&mut rng);

        info!(
            "Board {}x{} ready with {} coins (seed {})",
            board.width,
            board.height,
            coins.len(),
            hex::encode(seed.to_be_bytes())
        );

        Self {
            board,
            seed,
            world: RwLock::new(World {
                players: PlayerRegistry::new(),
                coins,
                rng,
            }),
        }
    }

    /// Board configuration.
    pub fn board(&self) -> &BoardConfig {
        &self.board
    }

    /// Seed the board was built from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Register a new player.
    ///
    /// The only entry point that creates players. Names are taken verbatim;
    /// trimming is the caller's job.
    #[instrument(skip(self))]
    pub async fn register_player(&self, name: &str) -> Result<PlayerId, GameError> {
        let mut world = self.world.write().await;
        let World { players, rng, .. } = &mut *world;

        let id = players.register(name, rng, &self.board)?;
        if let Some(player) = players.get(name) {
            info!("Player {:?} registered as #{} at {}", name, id.as_u32(), player.position);
        }
        Ok(id)
    }

    /// Move a player one step and collect any coin on the landing cell.
    #[instrument(skip(self))]
    pub async fn apply_move(&self, name: &str, direction: Direction) -> Result<MoveOutcome, GameError> {
        let mut world = self.world.write().await;
        let World { players, coins, rng } = &mut *world;

        let current = players
            .position_of(name)
            .ok_or_else(|| GameError::UnknownPlayer(name.to_string()))?;

        // Walls clamp per axis
        let target = current.step(direction, self.board.width, self.board.height);

        let collected = coins.collect_at(target);
        let score = match collected {
            Some(value) => players.add_score(name, value.points())?,
            None => players.score_of(name).unwrap_or_default(),
        };

        players.update_position(name, target)?;

        let repopulated = collected.is_some() && coins.is_empty();
        if repopulated {
            coins.repopulate(rng);
            info!("Coin field cleared by {:?}; laid out {} new coins", name, coins.len());
        }

        if let Some(value) = collected {
            debug!("{:?} collected {} at {} (score {})", name, value.points(), target, score);
        }

        Ok(MoveOutcome {
            position: target,
            collected,
            score,
            repopulated,
        })
    }

    /// Apply a move given as a wire code (`"U"`, `"D"`, `"L"`, `"R"`).
    ///
    /// Unrecognized codes change nothing and return `Ok(None)`.
    pub async fn apply_move_code(&self, name: &str, code: &str) -> Result<Option<MoveOutcome>, GameError> {
        match Direction::from_code(code) {
            Some(direction) => self.apply_move(name, direction).await.map(Some),
            None => {
                debug!("Ignoring unrecognized direction {:?} from {:?}", code, name);
                Ok(None)
            }
        }
    }

    /// Consistent view of the whole game.
    pub async fn snapshot(&self) -> GameState {
        let world = self.world.read().await;
        project(&world.players, &world.coins)
    }

    /// Number of registered players.
    pub async fn player_count(&self) -> usize {
        self.world.read().await.players.len()
    }

    /// Number of uncollected coins.
    pub async fn coin_count(&self) -> usize {
        self.world.read().await.coins.len()
    }
}

use crate::entities::{
    Ant, AntKind, Bee, BeeStatus, Boost, BUG_SPRAY_DAMAGE, DIGESTION_TURNS, FLYING_LEAF_RANGE,
    LEAF_DAMAGE, THROW_RANGE,
};
use crate::map::{AntId, BeeId, PlaceId, Tunnels};
use crate::replay::{create_replay_logger, ReplayLogger};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use regex::Regex;
use std::collections::BTreeMap;
use thiserror::Error;

/// The outcome of every player-facing command that can fail. The display
/// strings are the textual failure reasons shown to the player; the game
/// state is left untouched whenever one of these is returned.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("unknown ant type")]
    UnknownAntType,
    #[error("illegal location")]
    IllegalLocation,
    #[error("not enough food")]
    NotEnoughFood,
    #[error("tunnel already occupied")]
    TunnelOccupied,
    #[error("no such boost")]
    UnknownBoost,
    #[error("no ant at location")]
    NoAntAtLocation,
}

/// Terminal evaluation of the game. Losing takes priority: a bee at the
/// queen's place loses the game even if it were somehow also the last one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStatus {
    InProgress,
    Won,
    Lost,
}

/// The ant colony: the tunnel network, the food supply, and the boost
/// inventory, plus the per-phase resolution of everything placed in it.
pub struct AntColony {
    food: usize,
    boosts: BTreeMap<Boost, usize>,
    tunnels: Tunnels,
}

impl AntColony {
    /// Creates a colony with a fresh tunnel grid.
    ///
    /// # Arguments
    /// * `starting_food` - The food available before any grower produces.
    /// * `num_tunnels` - The number of independent tunnels (grid rows).
    /// * `tunnel_length` - Steps between the hive side and the queen.
    /// * `moat_frequency` - Every nth step is water; 0 disables moats.
    pub fn new(
        starting_food: usize,
        num_tunnels: usize,
        tunnel_length: usize,
        moat_frequency: usize,
    ) -> AntColony {
        let mut boosts = BTreeMap::new();
        boosts.insert(Boost::FlyingLeaf, 1);
        boosts.insert(Boost::StickyLeaf, 1);
        boosts.insert(Boost::IcyLeaf, 1);
        boosts.insert(Boost::BugSpray, 0);

        AntColony {
            food: starting_food,
            boosts,
            tunnels: Tunnels::new(num_tunnels, tunnel_length, moat_frequency),
        }
    }

    pub fn food(&self) -> usize {
        self.food
    }

    /// Names of the boosts with at least one unit in stock, in a fixed
    /// order.
    pub fn boost_names(&self) -> Vec<String> {
        self.boosts
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(boost, _)| boost.name().to_string())
            .collect()
    }

    pub fn queen_has_bees(&self) -> bool {
        self.tunnels.queen_has_bees()
    }

    pub(crate) fn place_at(&self, row: usize, col: usize) -> Option<PlaceId> {
        self.tunnels.at(row, col)
    }

    pub(crate) fn entrances(&self) -> &[PlaceId] {
        self.tunnels.entrances()
    }

    pub(crate) fn grid_bee_count(&self) -> usize {
        self.tunnels.grid_bee_count()
    }

    fn place_name(&self, id: PlaceId) -> String {
        self.tunnels.place(id).name().to_string()
    }

    fn increase_food(&mut self, amount: usize) {
        self.food += amount;
    }

    fn add_boost(&mut self, boost: Boost, turn: usize, logger: &mut dyn ReplayLogger) {
        *self.boosts.entry(boost).or_insert(0) += 1;
        logger.log_boost_found(turn, boost.name().to_string());
    }

    /// Deploys an ant, deducting its food cost. Food is only spent once
    /// placement has succeeded, so a failed deploy never consumes anything.
    pub(crate) fn deploy_ant(
        &mut self,
        ant: Ant,
        place_id: PlaceId,
        turn: usize,
        logger: &mut dyn ReplayLogger,
    ) -> Result<AntId, GameError> {
        let cost = ant.food_cost();
        if self.food < cost {
            return Err(GameError::NotEnoughFood);
        }

        let uuid = ant.id().to_string();
        let name = ant.name().to_string();
        match self.tunnels.add_ant(ant, place_id) {
            Some(id) => {
                self.food -= cost;
                logger.log_deploy_ant(turn, uuid, name, self.place_name(place_id));
                Ok(id)
            }
            None => Err(GameError::TunnelOccupied),
        }
    }

    /// Removes the defender at a place, the guard going first when both
    /// slots are occupied.
    pub(crate) fn remove_ant(
        &mut self,
        place_id: PlaceId,
        turn: usize,
        logger: &mut dyn ReplayLogger,
    ) {
        let name = self.place_name(place_id);
        if let Some(ant) = self.tunnels.remove_ant(place_id) {
            logger.log_remove_ant(turn, ant.id().to_string(), ant.name().to_string(), Some(name));
        }
    }

    /// Hands a boost token to the effective defender at a place. The
    /// inventory is only decremented once the ant actually spends the
    /// boost; applying again before then simply overwrites the pending
    /// token.
    pub(crate) fn apply_boost(
        &mut self,
        boost: Boost,
        place_id: PlaceId,
        turn: usize,
        logger: &mut dyn ReplayLogger,
    ) -> Result<(), GameError> {
        if self.boosts.get(&boost).copied().unwrap_or(0) < 1 {
            return Err(GameError::UnknownBoost);
        }

        let place_name = self.place_name(place_id);
        let Some(ant_id) = self.tunnels.place(place_id).ant() else {
            return Err(GameError::NoAntAtLocation);
        };
        if let Some(ant) = self.tunnels.ant_mut(ant_id) {
            ant.set_boost(boost);
        }
        logger.log_boost_given(turn, boost.name().to_string(), place_name);
        Ok(())
    }

    fn consume_boost(&mut self, id: AntId, boost: Boost) {
        if let Some(ant) = self.tunnels.ant_mut(id) {
            ant.take_boost();
        }
        // Two ants armed from the same last token may both fire; the count
        // saturates rather than going negative.
        if let Some(count) = self.boosts.get_mut(&boost) {
            *count = count.saturating_sub(1);
        }
    }

    /// Phase 1: every deployed ant acts, row-major, column ascending. A
    /// guarded primary still acts even though the guard is the effective
    /// blocker; the guard's own action is a no-op.
    pub(crate) fn ants_act(&mut self, turn: usize, rng: &mut StdRng, logger: &mut dyn ReplayLogger) {
        for place_id in self.tunnels.grid_places() {
            let place = self.tunnels.place(place_id);
            let primary = place.guarded_ant();
            let guard = place.guard();

            if let Some(id) = primary {
                self.ant_act(id, turn, rng, logger);
            }
            if let Some(id) = guard {
                self.ant_act(id, turn, rng, logger);
            }
        }
    }

    /// Phase 2: every bee on the grid acts, in resolution order captured
    /// before the phase starts so that an advancing bee acts exactly once.
    pub(crate) fn bees_act(&mut self, turn: usize, logger: &mut dyn ReplayLogger) {
        for bee_id in self.tunnels.grid_bees() {
            self.bee_act(bee_id, turn, logger);
        }
    }

    /// Phase 3: water places shed their occupants. Guards never tolerate
    /// water; a primary survives submersion only if it is a scuba ant.
    pub(crate) fn places_act(&mut self, turn: usize, logger: &mut dyn ReplayLogger) {
        for place_id in self.tunnels.grid_places() {
            if !self.tunnels.place(place_id).is_water() {
                continue;
            }

            let name = self.place_name(place_id);
            if let Some(guard) = self.tunnels.remove_guard(place_id) {
                logger.log_remove_ant(
                    turn,
                    guard.id().to_string(),
                    guard.name().to_string(),
                    Some(name.clone()),
                );
            }

            let submersible = self
                .tunnels
                .place(place_id)
                .guarded_ant()
                .and_then(|id| self.tunnels.ant(id))
                .is_some_and(|ant| ant.kind() == AntKind::Scuba);
            if !submersible {
                if let Some(ant) = self.tunnels.remove_primary(place_id) {
                    logger.log_remove_ant(
                        turn,
                        ant.id().to_string(),
                        ant.name().to_string(),
                        Some(name),
                    );
                }
            }
        }
    }

    fn ant_act(&mut self, id: AntId, turn: usize, rng: &mut StdRng, logger: &mut dyn ReplayLogger) {
        let Some(ant) = self.tunnels.ant(id) else {
            return;
        };
        match ant.kind() {
            AntKind::Grower => self.grower_act(turn, rng, logger),
            AntKind::Thrower | AntKind::Scuba => self.thrower_act(id, turn, logger),
            AntKind::Eater => self.eater_act(id, turn, logger),
            AntKind::Guard => {}
        }
    }

    /// One uniform roll, five disjoint bands: 60% food, 10% each for the
    /// three leaf boosts, 5% bug spray, and the remaining 5% nothing.
    fn grower_act(&mut self, turn: usize, rng: &mut StdRng, logger: &mut dyn ReplayLogger) {
        let roll: f64 = rng.gen();
        if roll < 0.6 {
            self.increase_food(1);
        } else if roll < 0.7 {
            self.add_boost(Boost::FlyingLeaf, turn, logger);
        } else if roll < 0.8 {
            self.add_boost(Boost::StickyLeaf, turn, logger);
        } else if roll < 0.9 {
            self.add_boost(Boost::IcyLeaf, turn, logger);
        } else if roll < 0.95 {
            self.add_boost(Boost::BugSpray, turn, logger);
        }
    }

    fn thrower_act(&mut self, id: AntId, turn: usize, logger: &mut dyn ReplayLogger) {
        let Some(ant) = self.tunnels.ant(id) else {
            return;
        };
        let Some(place_id) = ant.place() else {
            return;
        };
        let boost = ant.boost();
        let uuid = ant.id().to_string();
        let name = ant.name().to_string();
        let place_name = self.place_name(place_id);

        if boost == Some(Boost::BugSpray) {
            // One-time area effect: clear every bee sharing the place, then
            // the sprayer expires from its own spray.
            self.consume_boost(id, Boost::BugSpray);
            logger.log_attack(turn, name, uuid, place_name.clone(), place_name);
            while let Some(target) = self.tunnels.closest_bee(place_id, 0, 0) {
                self.reduce_bee_armor(target, BUG_SPRAY_DAMAGE, turn, logger);
            }
            self.reduce_ant_armor(id, BUG_SPRAY_DAMAGE, turn, logger);
            return;
        }

        let range = if boost == Some(Boost::FlyingLeaf) {
            FLYING_LEAF_RANGE
        } else {
            THROW_RANGE
        };
        if let Some(target) = self.tunnels.closest_bee(place_id, range, 0) {
            let target_place = self
                .tunnels
                .bee(target)
                .and_then(|bee| bee.place())
                .map_or_else(String::new, |p| self.place_name(p));
            logger.log_attack(turn, name, uuid, place_name, target_place);
            self.reduce_bee_armor(target, LEAF_DAMAGE, turn, logger);

            match boost {
                Some(Boost::StickyLeaf) => {
                    if let Some(bee) = self.tunnels.bee_mut(target) {
                        bee.set_status(Some(BeeStatus::Stuck));
                    }
                }
                Some(Boost::IcyLeaf) => {
                    if let Some(bee) = self.tunnels.bee_mut(target) {
                        bee.set_status(Some(BeeStatus::Cold));
                    }
                }
                _ => {}
            }
            // A leaf boost is spent only when there was a target to use it
            // on.
            if let Some(boost) = boost {
                self.consume_boost(id, boost);
            }
        }
    }

    fn eater_act(&mut self, id: AntId, turn: usize, logger: &mut dyn ReplayLogger) {
        let Some(ant) = self.tunnels.ant(id) else {
            return;
        };
        let Some(place_id) = ant.place() else {
            return;
        };
        let turns = ant.turns_eating();

        if turns == 0 {
            if let Some(target) = self.tunnels.closest_bee(place_id, 0, 0) {
                let uuid = self
                    .tunnels
                    .bee(target)
                    .map_or_else(String::new, |bee| bee.id().to_string());
                self.tunnels.detach_bee(target);
                if let Some(ant) = self.tunnels.ant_mut(id) {
                    ant.set_stomach(Some(target));
                    ant.set_turns_eating(1);
                }
                logger.log_swallow_bee(turn, uuid, self.place_name(place_id));
            }
        } else if turns > DIGESTION_TURNS {
            // Digestion complete: the held bee is gone for good.
            let held = self.tunnels.ant_mut(id).and_then(Ant::take_stomach);
            if let Some(bee_id) = held {
                if let Some(bee) = self.tunnels.remove_dead_bee(bee_id) {
                    logger.log_remove_bee(turn, bee.id().to_string(), None);
                }
            }
            if let Some(ant) = self.tunnels.ant_mut(id) {
                ant.set_turns_eating(0);
            }
        } else if let Some(ant) = self.tunnels.ant_mut(id) {
            ant.set_turns_eating(turns + 1);
        }
    }

    fn bee_act(&mut self, id: BeeId, turn: usize, logger: &mut dyn ReplayLogger) {
        let Some(bee) = self.tunnels.bee(id) else {
            return;
        };
        let Some(place_id) = bee.place() else {
            return;
        };
        let status = bee.status();
        let damage = bee.damage();
        let armor = bee.armor();
        let uuid = bee.id().to_string();

        if let Some(blocker) = self.tunnels.place(place_id).ant() {
            if status != Some(BeeStatus::Cold) {
                let place_name = self.place_name(place_id);
                logger.log_attack(turn, "Bee".to_string(), uuid, place_name.clone(), place_name);
                self.reduce_ant_armor(blocker, damage, turn, logger);
            }
        } else if armor > 0 && status != Some(BeeStatus::Stuck) {
            let from = self.place_name(place_id);
            if let Some(dest) = self.tunnels.exit_bee(id) {
                logger.log_move_bee(turn, uuid, from, self.place_name(dest));
            }
        }

        // A status suppresses exactly one action; it clears whether or not
        // it was consulted.
        if let Some(bee) = self.tunnels.bee_mut(id) {
            bee.set_status(None);
        }
    }

    /// Applies damage to an ant; expiry removes exactly the dying unit.
    /// The sole death path for ants, eater regurgitation included.
    fn reduce_ant_armor(
        &mut self,
        id: AntId,
        amount: i32,
        turn: usize,
        logger: &mut dyn ReplayLogger,
    ) -> bool {
        let Some(ant) = self.tunnels.ant_mut(id) else {
            return false;
        };
        let expired = ant.apply_damage(amount);
        let kind = ant.kind();
        let turns = ant.turns_eating();

        if kind == AntKind::Eater {
            if !expired {
                // A fresh hit forces the meal back out, but only in the
                // earliest digestion phase; jumping the countdown forward
                // blocks a second regurgitation from the same meal.
                if turns == 1 {
                    self.regurgitate(id, turn, logger);
                    if let Some(ant) = self.tunnels.ant_mut(id) {
                        ant.set_turns_eating(DIGESTION_TURNS);
                    }
                }
                return false;
            }
            if (1..=2).contains(&turns) {
                self.regurgitate(id, turn, logger);
            }
        } else if !expired {
            return false;
        }

        let place_name = self
            .tunnels
            .ant(id)
            .and_then(Ant::place)
            .map(|p| self.place_name(p));
        if let Some(ant) = self.tunnels.remove_dead_ant(id) {
            logger.log_remove_ant(turn, ant.id().to_string(), ant.name().to_string(), place_name);
        }
        true
    }

    fn regurgitate(&mut self, id: AntId, turn: usize, logger: &mut dyn ReplayLogger) {
        let held = self
            .tunnels
            .ant_mut(id)
            .map(|ant| (ant.take_stomach(), ant.place()));
        if let Some((Some(bee_id), Some(place_id))) = held {
            self.tunnels.attach_bee(bee_id, place_id);
            let uuid = self
                .tunnels
                .bee(bee_id)
                .map_or_else(String::new, |bee| bee.id().to_string());
            logger.log_regurgitate_bee(turn, uuid, self.place_name(place_id));
        }
    }

    fn reduce_bee_armor(
        &mut self,
        id: BeeId,
        amount: i32,
        turn: usize,
        logger: &mut dyn ReplayLogger,
    ) -> bool {
        let Some(bee) = self.tunnels.bee_mut(id) else {
            return false;
        };
        if !bee.apply_damage(amount) {
            return false;
        }

        let place_name = self
            .tunnels
            .bee(id)
            .and_then(Bee::place)
            .map(|p| self.place_name(p));
        if let Some(bee) = self.tunnels.remove_dead_bee(id) {
            logger.log_remove_bee(turn, bee.id().to_string(), place_name);
        }
        true
    }

    /// Admits a bee released by the hive at an entrance place.
    pub(crate) fn admit_bee(&mut self, bee: Bee, entrance: PlaceId) -> BeeId {
        let id = self.tunnels.insert_bee(bee);
        self.tunnels.attach_bee(id, entrance);
        id
    }

    pub(crate) fn tunnels(&self) -> &Tunnels {
        &self.tunnels
    }
}

/// The bees' hive: manufactures waves of bees and releases each wave on
/// its scheduled turn.
pub struct Hive {
    bee_armor: i32,
    bee_damage: i32,
    waves: BTreeMap<usize, Vec<Bee>>,
}

impl Hive {
    pub fn new(bee_armor: i32, bee_damage: i32) -> Hive {
        Hive {
            bee_armor,
            bee_damage,
            waves: BTreeMap::new(),
        }
    }

    /// Manufactures `num_bees` bees and schedules them for `attack_turn`.
    /// Returns the hive so wave definitions can be chained.
    pub fn add_wave(mut self, attack_turn: usize, num_bees: usize) -> Hive {
        let wave = (0..num_bees)
            .map(|_| Bee::new(self.bee_armor, self.bee_damage))
            .collect();
        self.waves.insert(attack_turn, wave);
        self
    }

    /// Bees manufactured but not yet released.
    pub fn bees_count(&self) -> usize {
        self.waves.values().map(Vec::len).sum()
    }

    /// Releases the wave scheduled for `current_turn`, if any, placing
    /// each bee at an entrance chosen uniformly at random. A bee is
    /// released exactly once, on its scheduled turn.
    pub(crate) fn invade(
        &mut self,
        colony: &mut AntColony,
        current_turn: usize,
        rng: &mut StdRng,
        logger: &mut dyn ReplayLogger,
    ) -> Vec<BeeId> {
        let Some(wave) = self.waves.remove(&current_turn) else {
            return Vec::new();
        };

        let mut released = Vec::with_capacity(wave.len());
        for bee in wave {
            let Some(&entrance) = colony.entrances().choose(rng) else {
                break;
            };
            let uuid = bee.id().to_string();
            let id = colony.admit_bee(bee, entrance);
            logger.log_release_bee(current_turn, uuid, colony.place_name(entrance));
            released.push(id);
        }
        released
    }
}

/// A snapshot of an insect for state queries.
#[derive(Clone)]
pub struct StateInsect {
    /// The unique identifier of the insect.
    pub id: String,
    /// The display name, e.g. "Thrower" or "Bee".
    pub name: String,
    /// Remaining armor.
    pub armor: i32,
}

/// A snapshot of one grid place.
#[derive(Clone)]
pub struct StateCell {
    /// The tunnel (grid row).
    pub row: usize,
    /// The step along the tunnel (grid column).
    pub col: usize,
    /// Whether the place is water.
    pub water: bool,
    /// The primary defender, if any.
    pub ant: Option<StateInsect>,
    /// The guard, if any.
    pub guard: Option<StateInsect>,
    /// The bees at the place, in arrival order.
    pub bees: Vec<StateInsect>,
}

/// Represents the state of the game.
#[derive(Clone)]
pub struct GameState {
    /// The current turn.
    pub turn: usize,
    /// The colony's food supply.
    pub food: usize,
    /// Bees still waiting in the hive.
    pub hive_bees: usize,
    /// Names of the boosts currently in stock.
    pub boosts: Vec<String>,
    /// Win/loss/in-progress evaluation.
    pub status: GameStatus,
    /// The grid, row-major.
    pub cells: Vec<StateCell>,
}

/// The Ants vs Bees game.
/// Main entry point for driving the simulation.
pub struct Game {
    colony: AntColony,
    hive: Hive,
    turn: usize,
    ended: bool,
    rng: StdRng,
    replay_logger: Box<dyn ReplayLogger>,
}

impl Game {
    /// Creates a new game.
    ///
    /// # Arguments
    /// * `colony` - The colony under attack.
    /// * `hive` - The hive with its scheduled waves.
    /// * `seed` - The seed for the random number generator.
    /// * `replay_filename` - The filename to save the replay of the game
    ///   to. If `None`, no replay will be saved.
    pub fn new(colony: AntColony, hive: Hive, seed: u64, replay_filename: Option<String>) -> Game {
        let replay_logger = create_replay_logger(
            replay_filename,
            colony.tunnels().num_tunnels(),
            colony.tunnels().tunnel_length(),
        );

        Game {
            colony,
            hive,
            turn: 0,
            ended: false,
            rng: StdRng::seed_from_u64(seed),
            replay_logger,
        }
    }

    /// Resolves one full turn in fixed phase order: ants act, bees act,
    /// places resolve water, the hive releases this turn's wave, and the
    /// turn counter advances.
    pub fn take_turn(&mut self) {
        self.colony
            .ants_act(self.turn, &mut self.rng, self.replay_logger.as_mut());
        self.colony.bees_act(self.turn, self.replay_logger.as_mut());
        self.colony.places_act(self.turn, self.replay_logger.as_mut());
        self.hive.invade(
            &mut self.colony,
            self.turn,
            &mut self.rng,
            self.replay_logger.as_mut(),
        );

        self.replay_logger.log_turn(
            self.turn,
            self.colony.tunnels().grid_ant_count(),
            self.colony.grid_bee_count(),
            self.colony.food(),
        );
        self.turn += 1;

        if !self.ended {
            match self.status() {
                GameStatus::InProgress => {}
                status => {
                    self.ended = true;
                    self.replay_logger.log_end_game(format!("{:?}", status));
                    self.replay_logger.save();
                }
            }
        }
    }

    pub fn turn(&self) -> usize {
        self.turn
    }

    /// Pure evaluation of the terminal conditions. The queen's place is
    /// checked first, so losing wins any tie.
    pub fn status(&self) -> GameStatus {
        if self.colony.queen_has_bees() {
            GameStatus::Lost
        } else if self.colony.grid_bee_count() + self.hive.bees_count() == 0 {
            GameStatus::Won
        } else {
            GameStatus::InProgress
        }
    }

    /// Deploys an ant of the named kind at `"row,col"`.
    pub fn deploy_ant(&mut self, ant_type: &str, place_coordinates: &str) -> Result<(), GameError> {
        let kind = AntKind::parse(ant_type).ok_or(GameError::UnknownAntType)?;
        let place = self.parse_coordinates(place_coordinates)?;
        self.colony
            .deploy_ant(Ant::new(kind), place, self.turn, self.replay_logger.as_mut())?;
        Ok(())
    }

    /// Removes the defender at `"row,col"`; succeeds even when the place
    /// is empty.
    pub fn remove_ant(&mut self, place_coordinates: &str) -> Result<(), GameError> {
        let place = self.parse_coordinates(place_coordinates)?;
        self.colony
            .remove_ant(place, self.turn, self.replay_logger.as_mut());
        Ok(())
    }

    /// Hands the named boost to the defender at `"row,col"`.
    pub fn boost_ant(&mut self, boost_type: &str, place_coordinates: &str) -> Result<(), GameError> {
        let boost = Boost::parse(boost_type).ok_or(GameError::UnknownBoost)?;
        let place = self.parse_coordinates(place_coordinates)?;
        self.colony
            .apply_boost(boost, place, self.turn, self.replay_logger.as_mut())
    }

    pub fn food(&self) -> usize {
        self.colony.food()
    }

    pub fn hive_bees_count(&self) -> usize {
        self.hive.bees_count()
    }

    pub fn boost_names(&self) -> Vec<String> {
        self.colony.boost_names()
    }

    /// Builds a full snapshot of the observable game state.
    pub fn state(&self) -> GameState {
        let tunnels = self.colony.tunnels();
        let mut cells = Vec::new();

        for row in 0..tunnels.num_tunnels() {
            for col in 0..tunnels.tunnel_length() {
                let id = match tunnels.at(row, col) {
                    Some(id) => id,
                    None => continue,
                };
                let place = tunnels.place(id);
                cells.push(StateCell {
                    row,
                    col,
                    water: place.is_water(),
                    ant: place
                        .guarded_ant()
                        .and_then(|a| tunnels.ant(a))
                        .map(|ant| StateInsect {
                            id: ant.id().to_string(),
                            name: ant.name().to_string(),
                            armor: ant.armor(),
                        }),
                    guard: place
                        .guard()
                        .and_then(|a| tunnels.ant(a))
                        .map(|ant| StateInsect {
                            id: ant.id().to_string(),
                            name: ant.name().to_string(),
                            armor: ant.armor(),
                        }),
                    bees: place
                        .bees()
                        .iter()
                        .filter_map(|&b| tunnels.bee(b))
                        .map(|bee| StateInsect {
                            id: bee.id().to_string(),
                            name: "Bee".to_string(),
                            armor: bee.armor(),
                        })
                        .collect(),
                });
            }
        }

        GameState {
            turn: self.turn,
            food: self.colony.food(),
            hive_bees: self.hive.bees_count(),
            boosts: self.colony.boost_names(),
            status: self.status(),
            cells,
        }
    }

    /// Draws the game to the console.
    pub fn draw(&self) {
        self.colony.tunnels().draw(
            self.turn,
            self.colony.food(),
            self.hive.bees_count(),
            &self.colony.boost_names(),
        );
    }

    fn parse_coordinates(&self, place_coordinates: &str) -> Result<PlaceId, GameError> {
        let captures = Regex::new(r"^\s*(\d+)\s*,\s*(\d+)\s*$")
            .unwrap()
            .captures(place_coordinates)
            .ok_or(GameError::IllegalLocation)?;

        let row: usize = captures[1].parse().map_err(|_| GameError::IllegalLocation)?;
        let col: usize = captures[2].parse().map_err(|_| GameError::IllegalLocation)?;
        self.colony
            .place_at(row, col)
            .ok_or(GameError::IllegalLocation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::NoOpReplayLogger;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn deploy(colony: &mut AntColony, kind: AntKind, row: usize, col: usize) -> AntId {
        let place = colony.place_at(row, col).unwrap();
        colony
            .deploy_ant(Ant::new(kind), place, 0, &mut NoOpReplayLogger)
            .unwrap()
    }

    fn admit(colony: &mut AntColony, row: usize, col: usize, armor: i32, damage: i32) -> BeeId {
        let place = colony.place_at(row, col).unwrap();
        colony.admit_bee(Bee::new(armor, damage), place)
    }

    #[test]
    fn when_deploying_an_ant_its_food_cost_is_deducted() {
        let mut colony = AntColony::new(10, 1, 5, 0);

        deploy(&mut colony, AntKind::Thrower, 0, 0);

        assert_eq!(colony.food(), 6);
        assert_eq!(colony.tunnels().grid_ant_count(), 1);
    }

    #[test]
    fn when_deploying_without_enough_food_nothing_changes() {
        let mut colony = AntColony::new(3, 1, 5, 0);
        let place = colony.place_at(0, 0).unwrap();

        let result = colony.deploy_ant(Ant::new(AntKind::Thrower), place, 0, &mut NoOpReplayLogger);

        assert_eq!(result, Err(GameError::NotEnoughFood));
        assert_eq!(colony.food(), 3);
        assert_eq!(colony.tunnels().grid_ant_count(), 0);
    }

    #[test]
    fn when_deploying_into_an_occupied_place_no_food_is_spent() {
        let mut colony = AntColony::new(10, 1, 5, 0);
        deploy(&mut colony, AntKind::Grower, 0, 0);
        let place = colony.place_at(0, 0).unwrap();

        let result = colony.deploy_ant(Ant::new(AntKind::Thrower), place, 0, &mut NoOpReplayLogger);

        assert_eq!(result, Err(GameError::TunnelOccupied));
        assert_eq!(colony.food(), 9);
    }

    #[test]
    fn when_deploying_with_an_unknown_ant_type_the_command_fails() {
        let colony = AntColony::new(10, 1, 5, 0);
        let mut game = Game::new(colony, Hive::new(3, 1), 7, None);

        assert_eq!(game.deploy_ant("Wasp", "0,0"), Err(GameError::UnknownAntType));
    }

    #[test]
    fn when_the_coordinates_are_malformed_or_out_of_range_the_command_fails() {
        let colony = AntColony::new(10, 2, 5, 0);
        let mut game = Game::new(colony, Hive::new(3, 1), 7, None);

        assert_eq!(game.deploy_ant("Thrower", "nope"), Err(GameError::IllegalLocation));
        assert_eq!(game.deploy_ant("Thrower", "0,"), Err(GameError::IllegalLocation));
        assert_eq!(game.deploy_ant("Thrower", "-1,2"), Err(GameError::IllegalLocation));
        assert_eq!(game.deploy_ant("Thrower", "2,0"), Err(GameError::IllegalLocation));
        assert_eq!(game.deploy_ant("Thrower", "0,5"), Err(GameError::IllegalLocation));
        assert_eq!(game.deploy_ant("Thrower", " 0 , 4 "), Ok(()));
    }

    #[test]
    fn when_a_thrower_acts_it_hits_the_closest_bee_within_range() {
        let mut colony = AntColony::new(10, 1, 8, 0);
        deploy(&mut colony, AntKind::Thrower, 0, 0);
        let near = admit(&mut colony, 0, 3, 3, 1);
        let far = admit(&mut colony, 0, 4, 3, 1);

        colony.ants_act(0, &mut rng(), &mut NoOpReplayLogger);

        assert_eq!(colony.tunnels().bee(near).unwrap().armor(), 2);
        assert_eq!(colony.tunnels().bee(far).unwrap().armor(), 3);
    }

    #[test]
    fn when_the_closest_bee_is_out_of_range_the_thrower_does_nothing() {
        let mut colony = AntColony::new(10, 1, 8, 0);
        deploy(&mut colony, AntKind::Thrower, 0, 0);
        let bee = admit(&mut colony, 0, 4, 3, 1);

        colony.ants_act(0, &mut rng(), &mut NoOpReplayLogger);

        assert_eq!(colony.tunnels().bee(bee).unwrap().armor(), 3);
    }

    #[test]
    fn when_a_thrower_has_a_flying_leaf_its_range_is_extended() {
        let mut colony = AntColony::new(10, 1, 8, 0);
        let thrower = deploy(&mut colony, AntKind::Thrower, 0, 0);
        let bee = admit(&mut colony, 0, 5, 3, 1);
        let place = colony.place_at(0, 0).unwrap();
        colony
            .apply_boost(Boost::FlyingLeaf, place, 0, &mut NoOpReplayLogger)
            .unwrap();

        colony.ants_act(0, &mut rng(), &mut NoOpReplayLogger);

        assert_eq!(colony.tunnels().bee(bee).unwrap().armor(), 2);
        // The leaf is spent, and the inventory with it.
        assert!(colony.tunnels().ant(thrower).unwrap().boost().is_none());
        assert_eq!(colony.boosts[&Boost::FlyingLeaf], 0);
    }

    #[test]
    fn when_a_boosted_thrower_finds_no_target_the_boost_is_kept() {
        let mut colony = AntColony::new(10, 1, 8, 0);
        let thrower = deploy(&mut colony, AntKind::Thrower, 0, 0);
        let place = colony.place_at(0, 0).unwrap();
        colony
            .apply_boost(Boost::FlyingLeaf, place, 0, &mut NoOpReplayLogger)
            .unwrap();

        colony.ants_act(0, &mut rng(), &mut NoOpReplayLogger);

        assert_eq!(colony.tunnels().ant(thrower).unwrap().boost(), Some(Boost::FlyingLeaf));
        assert_eq!(colony.boosts[&Boost::FlyingLeaf], 1);
    }

    #[test]
    fn when_applying_a_boost_with_no_stock_the_command_fails() {
        let mut colony = AntColony::new(10, 1, 5, 0);
        deploy(&mut colony, AntKind::Thrower, 0, 0);
        let place = colony.place_at(0, 0).unwrap();

        let result = colony.apply_boost(Boost::BugSpray, place, 0, &mut NoOpReplayLogger);

        assert_eq!(result, Err(GameError::UnknownBoost));
    }

    #[test]
    fn when_applying_a_boost_to_an_empty_place_the_command_fails() {
        let mut colony = AntColony::new(10, 1, 5, 0);
        let place = colony.place_at(0, 2).unwrap();

        let result = colony.apply_boost(Boost::IcyLeaf, place, 0, &mut NoOpReplayLogger);

        assert_eq!(result, Err(GameError::NoAntAtLocation));
    }

    #[test]
    fn when_a_sticky_leaf_lands_the_bee_misses_one_move() {
        let mut colony = AntColony::new(10, 1, 5, 0);
        deploy(&mut colony, AntKind::Thrower, 0, 0);
        let bee = admit(&mut colony, 0, 3, 5, 1);
        let place = colony.place_at(0, 0).unwrap();
        colony
            .apply_boost(Boost::StickyLeaf, place, 0, &mut NoOpReplayLogger)
            .unwrap();

        colony.ants_act(0, &mut rng(), &mut NoOpReplayLogger);
        colony.bees_act(0, &mut NoOpReplayLogger);

        // Stuck on the turn it was hit.
        let at = colony.tunnels().bee(bee).unwrap().place().unwrap();
        assert_eq!(at, colony.place_at(0, 3).unwrap());
        assert!(colony.tunnels().bee(bee).unwrap().status().is_none());

        colony.bees_act(1, &mut NoOpReplayLogger);
        let at = colony.tunnels().bee(bee).unwrap().place().unwrap();
        assert_eq!(at, colony.place_at(0, 2).unwrap());
    }

    #[test]
    fn when_an_icy_leaf_lands_the_bee_misses_one_sting() {
        let mut colony = AntColony::new(10, 1, 5, 0);
        let thrower = deploy(&mut colony, AntKind::Thrower, 0, 2);
        let bee = admit(&mut colony, 0, 2, 5, 1);
        let place = colony.place_at(0, 2).unwrap();
        colony
            .apply_boost(Boost::IcyLeaf, place, 0, &mut NoOpReplayLogger)
            .unwrap();

        colony.ants_act(0, &mut rng(), &mut NoOpReplayLogger);
        colony.bees_act(0, &mut NoOpReplayLogger);

        assert_eq!(colony.tunnels().ant(thrower).unwrap().armor(), 1);
        assert!(colony.tunnels().bee(bee).unwrap().status().is_none());

        colony.bees_act(1, &mut NoOpReplayLogger);
        assert!(colony.tunnels().ant(thrower).is_none());
    }

    #[test]
    fn when_bug_spray_goes_off_every_bee_at_the_place_and_the_sprayer_expire() {
        let mut colony = AntColony::new(10, 1, 5, 0);
        let thrower = deploy(&mut colony, AntKind::Thrower, 0, 2);
        let first = admit(&mut colony, 0, 2, 3, 1);
        let second = admit(&mut colony, 0, 2, 3, 1);
        let bystander = admit(&mut colony, 0, 3, 3, 1);
        colony.boosts.insert(Boost::BugSpray, 1);
        let place = colony.place_at(0, 2).unwrap();
        colony
            .apply_boost(Boost::BugSpray, place, 0, &mut NoOpReplayLogger)
            .unwrap();

        colony.ants_act(0, &mut rng(), &mut NoOpReplayLogger);

        assert!(colony.tunnels().bee(first).is_none());
        assert!(colony.tunnels().bee(second).is_none());
        assert!(colony.tunnels().bee(bystander).is_some());
        assert!(colony.tunnels().ant(thrower).is_none());
        assert_eq!(colony.boosts[&Boost::BugSpray], 0);
    }

    #[test]
    fn when_a_place_is_guarded_the_bee_stings_the_guard_first() {
        let mut colony = AntColony::new(10, 1, 5, 0);
        let grower = deploy(&mut colony, AntKind::Grower, 0, 2);
        let guard = deploy(&mut colony, AntKind::Guard, 0, 2);
        admit(&mut colony, 0, 2, 5, 1);

        colony.bees_act(0, &mut NoOpReplayLogger);
        assert_eq!(colony.tunnels().ant(guard).unwrap().armor(), 1);
        assert_eq!(colony.tunnels().ant(grower).unwrap().armor(), 1);

        colony.bees_act(1, &mut NoOpReplayLogger);
        assert!(colony.tunnels().ant(guard).is_none());
        assert_eq!(colony.tunnels().ant(grower).unwrap().armor(), 1);

        colony.bees_act(2, &mut NoOpReplayLogger);
        assert!(colony.tunnels().ant(grower).is_none());
    }

    #[test]
    fn when_a_guarded_ant_acts_it_still_performs_its_behavior() {
        let mut colony = AntColony::new(10, 1, 5, 0);
        deploy(&mut colony, AntKind::Thrower, 0, 0);
        deploy(&mut colony, AntKind::Guard, 0, 0);
        let bee = admit(&mut colony, 0, 2, 3, 1);

        colony.ants_act(0, &mut rng(), &mut NoOpReplayLogger);

        assert_eq!(colony.tunnels().bee(bee).unwrap().armor(), 2);
    }

    #[test]
    fn when_an_unblocked_bee_acts_it_advances_toward_the_queen() {
        let mut colony = AntColony::new(10, 1, 3, 0);
        let bee = admit(&mut colony, 0, 2, 3, 1);

        colony.bees_act(0, &mut NoOpReplayLogger);
        colony.bees_act(1, &mut NoOpReplayLogger);
        colony.bees_act(2, &mut NoOpReplayLogger);

        // Two hops to the first cell, one more into the queen's place.
        assert_eq!(
            colony.tunnels().bee(bee).unwrap().place(),
            Some(colony.tunnels().queen())
        );
        assert!(colony.queen_has_bees());

        // At the queen there is nowhere further to go.
        colony.bees_act(3, &mut NoOpReplayLogger);
        assert!(colony.queen_has_bees());
    }

    #[test]
    fn when_an_eater_acts_next_to_a_bee_it_swallows_it() {
        let mut colony = AntColony::new(10, 1, 5, 0);
        let eater = deploy(&mut colony, AntKind::Eater, 0, 2);
        let bee = admit(&mut colony, 0, 2, 3, 1);

        colony.ants_act(0, &mut rng(), &mut NoOpReplayLogger);

        assert_eq!(colony.grid_bee_count(), 0);
        assert!(colony.tunnels().bee(bee).unwrap().place().is_none());
        let ant = colony.tunnels().ant(eater).unwrap();
        assert_eq!(ant.stomach(), Some(bee));
        assert_eq!(ant.turns_eating(), 1);
    }

    #[test]
    fn when_digestion_completes_the_swallowed_bee_is_gone_for_good() {
        let mut colony = AntColony::new(10, 1, 5, 0);
        let eater = deploy(&mut colony, AntKind::Eater, 0, 2);
        let bee = admit(&mut colony, 0, 2, 3, 1);

        for turn in 0..5 {
            colony.ants_act(turn, &mut rng(), &mut NoOpReplayLogger);
        }

        assert!(colony.tunnels().bee(bee).is_none());
        let ant = colony.tunnels().ant(eater).unwrap();
        assert!(ant.stomach().is_none());
        assert_eq!(ant.turns_eating(), 0);
    }

    #[test]
    fn when_a_digesting_eater_is_hit_early_it_regurgitates_once() {
        let mut colony = AntColony::new(10, 1, 5, 0);
        let eater = deploy(&mut colony, AntKind::Eater, 0, 2);
        let bee = admit(&mut colony, 0, 2, 3, 1);
        colony.ants_act(0, &mut rng(), &mut NoOpReplayLogger);

        let expired = colony.reduce_ant_armor(eater, 1, 0, &mut NoOpReplayLogger);

        assert!(!expired);
        let place = colony.place_at(0, 2).unwrap();
        assert_eq!(colony.tunnels().bee(bee).unwrap().place(), Some(place));
        // The countdown jumps forward so the same meal cannot come back
        // out twice.
        assert_eq!(colony.tunnels().ant(eater).unwrap().turns_eating(), 3);

        let expired = colony.reduce_ant_armor(eater, 1, 0, &mut NoOpReplayLogger);
        assert!(expired);
        assert!(colony.tunnels().bee(bee).is_some());
    }

    #[test]
    fn when_an_eater_dies_early_in_digestion_the_bee_comes_back_out() {
        let mut colony = AntColony::new(10, 1, 5, 0);
        let eater = deploy(&mut colony, AntKind::Eater, 0, 2);
        let bee = admit(&mut colony, 0, 2, 3, 1);
        colony.ants_act(0, &mut rng(), &mut NoOpReplayLogger);

        let expired = colony.reduce_ant_armor(eater, 2, 0, &mut NoOpReplayLogger);

        assert!(expired);
        assert!(colony.tunnels().ant(eater).is_none());
        let place = colony.place_at(0, 2).unwrap();
        assert_eq!(colony.tunnels().bee(bee).unwrap().place(), Some(place));
    }

    #[test]
    fn when_an_eater_dies_late_in_digestion_the_bee_perishes_with_it() {
        let mut colony = AntColony::new(10, 1, 5, 0);
        let eater = deploy(&mut colony, AntKind::Eater, 0, 2);
        let bee = admit(&mut colony, 0, 2, 3, 1);
        colony.ants_act(0, &mut rng(), &mut NoOpReplayLogger);
        colony.ants_act(1, &mut rng(), &mut NoOpReplayLogger);
        colony.ants_act(2, &mut rng(), &mut NoOpReplayLogger);

        colony.reduce_ant_armor(eater, 2, 3, &mut NoOpReplayLogger);

        assert!(colony.tunnels().ant(eater).is_none());
        assert!(colony.tunnels().bee(bee).is_none());
    }

    #[test]
    fn when_water_resolves_only_a_scuba_ant_survives() {
        let mut colony = AntColony::new(20, 1, 6, 3);
        let thrower = deploy(&mut colony, AntKind::Thrower, 0, 2);
        let guard = deploy(&mut colony, AntKind::Guard, 0, 2);
        let scuba = deploy(&mut colony, AntKind::Scuba, 0, 5);
        let dry = deploy(&mut colony, AntKind::Grower, 0, 3);

        colony.places_act(0, &mut NoOpReplayLogger);

        assert!(colony.tunnels().ant(thrower).is_none());
        assert!(colony.tunnels().ant(guard).is_none());
        assert!(colony.tunnels().ant(scuba).is_some());
        assert!(colony.tunnels().ant(dry).is_some());
    }

    #[test]
    fn when_a_grower_acts_it_changes_at_most_one_resource() {
        let mut colony = AntColony::new(0, 1, 5, 0);
        deploy(&mut colony, AntKind::Grower, 0, 0);
        let mut rng = rng();

        let mut previous_food = colony.food();
        let mut previous_boosts: usize = colony.boosts.values().sum();
        for turn in 0..100 {
            colony.ants_act(turn, &mut rng, &mut NoOpReplayLogger);

            let food = colony.food();
            let boosts: usize = colony.boosts.values().sum();
            let delta = (food - previous_food) + (boosts - previous_boosts);
            assert!(delta <= 1);
            previous_food = food;
            previous_boosts = boosts;
        }
        // With 100 rolls the common case must have happened at least once.
        assert!(colony.food() > 0);
    }

    #[test]
    fn when_a_wave_is_scheduled_it_is_released_exactly_on_its_turn() {
        let mut colony = AntColony::new(10, 2, 5, 0);
        let mut hive = Hive::new(3, 1).add_wave(2, 3);
        let mut rng = rng();
        assert_eq!(hive.bees_count(), 3);

        assert!(hive.invade(&mut colony, 0, &mut rng, &mut NoOpReplayLogger).is_empty());
        assert!(hive.invade(&mut colony, 1, &mut rng, &mut NoOpReplayLogger).is_empty());

        let released = hive.invade(&mut colony, 2, &mut rng, &mut NoOpReplayLogger);
        assert_eq!(released.len(), 3);
        assert_eq!(hive.bees_count(), 0);
        assert_eq!(colony.grid_bee_count(), 3);
        for id in released {
            let place = colony.tunnels().bee(id).unwrap().place().unwrap();
            assert!(colony.entrances().contains(&place));
        }

        // A wave is released once.
        assert!(hive.invade(&mut colony, 2, &mut rng, &mut NoOpReplayLogger).is_empty());
    }

    #[test]
    fn when_a_bee_reaches_the_queen_the_game_is_lost() {
        let mut colony = AntColony::new(10, 1, 3, 0);
        let bee = colony.tunnels.insert_bee(Bee::new(3, 1));
        colony.tunnels.attach_bee(bee, colony.tunnels.queen());
        let game = Game::new(colony, Hive::new(3, 1), 7, None);

        assert_eq!(game.status(), GameStatus::Lost);
    }

    #[test]
    fn when_no_bees_remain_anywhere_the_game_is_won() {
        let colony = AntColony::new(10, 1, 3, 0);
        let game = Game::new(colony, Hive::new(3, 1), 7, None);

        assert_eq!(game.status(), GameStatus::Won);
    }

    #[test]
    fn when_bees_are_still_waiting_in_the_hive_the_game_is_in_progress() {
        let colony = AntColony::new(10, 1, 3, 0);
        let game = Game::new(colony, Hive::new(3, 1).add_wave(5, 2), 7, None);

        assert_eq!(game.status(), GameStatus::InProgress);
    }

    #[test]
    fn when_taking_turns_a_thrower_clears_the_wave_and_wins_the_game() {
        let colony = AntColony::new(10, 1, 3, 0);
        let hive = Hive::new(1, 1).add_wave(0, 1);
        let mut game = Game::new(colony, hive, 7, None);
        game.deploy_ant("Thrower", "0,0").unwrap();

        // Turn 0: nothing to throw at yet; the wave lands at the entrance.
        game.take_turn();
        assert_eq!(game.turn(), 1);
        assert_eq!(game.hive_bees_count(), 0);
        assert_eq!(game.status(), GameStatus::InProgress);

        // Turn 1: the entrance is two steps away, well within range.
        game.take_turn();
        assert_eq!(game.turn(), 2);
        assert_eq!(game.status(), GameStatus::Won);
    }

    #[test]
    fn when_querying_the_state_it_mirrors_the_grid() {
        let colony = AntColony::new(10, 2, 4, 2);
        let hive = Hive::new(3, 1).add_wave(0, 2);
        let mut game = Game::new(colony, hive, 7, None);
        game.deploy_ant("Grower", "0,0").unwrap();
        game.deploy_ant("Guard", "0,0").unwrap();
        game.take_turn();

        let state = game.state();

        assert_eq!(state.turn, 1);
        assert_eq!(state.cells.len(), 8);
        assert_eq!(state.hive_bees, 0);
        assert!(state.boosts.contains(&"StickyLeaf".to_string()));

        let cell = state
            .cells
            .iter()
            .find(|c| c.row == 0 && c.col == 0)
            .unwrap();
        assert_eq!(cell.ant.as_ref().unwrap().name, "Grower");
        assert_eq!(cell.guard.as_ref().unwrap().name, "Guard");
        assert!(!cell.water);
        assert!(state.cells.iter().any(|c| c.water));
        let on_grid: usize = state.cells.iter().map(|c| c.bees.len()).sum();
        assert_eq!(on_grid, 2);
    }

    #[test]
    fn when_removing_an_ant_by_command_an_empty_place_is_not_an_error() {
        let colony = AntColony::new(10, 1, 3, 0);
        let mut game = Game::new(colony, Hive::new(3, 1), 7, None);
        game.deploy_ant("Grower", "0,1").unwrap();

        assert_eq!(game.remove_ant("0,1"), Ok(()));
        assert_eq!(game.remove_ant("0,1"), Ok(()));
        assert_eq!(game.remove_ant("9,9"), Err(GameError::IllegalLocation));
    }

    #[test]
    fn when_boosting_by_command_the_boost_name_must_be_exact() {
        let colony = AntColony::new(10, 1, 3, 0);
        let mut game = Game::new(colony, Hive::new(3, 1), 7, None);
        game.deploy_ant("Thrower", "0,0").unwrap();

        assert_eq!(game.boost_ant("flyingleaf", "0,0"), Err(GameError::UnknownBoost));
        assert_eq!(game.boost_ant("FlyingLeaf", "0,0"), Ok(()));
    }
}

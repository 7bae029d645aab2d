use crate::entities::{Ant, AntKind, Bee};
use crossterm::{
    cursor::Hide,
    execute,
    style::{Color, Print, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use std::io::{stdout, Write};

/// Non-owning handle to a place in the tunnel network.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaceId(pub(crate) usize);

/// Non-owning handle to an ant. Slots are tombstoned on death and ids are
/// never reused, so a stale handle can only ever resolve to nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AntId(pub(crate) usize);

/// Non-owning handle to a bee.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BeeId(pub(crate) usize);

/// One node of the tunnel network. A place holds at most one primary ant,
/// at most one guard, and an ordered list of bees where index 0 is the
/// longest resident.
pub struct Place {
    name: String,
    water: bool,
    exit: Option<PlaceId>,
    entrance: Option<PlaceId>,
    ant: Option<AntId>,
    guard: Option<AntId>,
    bees: Vec<BeeId>,
}

impl Place {
    fn new(name: String, water: bool) -> Place {
        Place {
            name,
            water,
            exit: None,
            entrance: None,
            ant: None,
            guard: None,
            bees: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_water(&self) -> bool {
        self.water
    }

    pub fn exit(&self) -> Option<PlaceId> {
        self.exit
    }

    pub fn entrance(&self) -> Option<PlaceId> {
        self.entrance
    }

    /// The effective blocker: the guard when present, else the primary.
    pub fn ant(&self) -> Option<AntId> {
        self.guard.or(self.ant)
    }

    /// The primary occupant, regardless of any guard shielding it.
    pub fn guarded_ant(&self) -> Option<AntId> {
        self.ant
    }

    pub fn guard(&self) -> Option<AntId> {
        self.guard
    }

    pub fn bees(&self) -> &[BeeId] {
        &self.bees
    }
}

/// The tunnel network: a grid of places, the queen they all drain into,
/// and the arenas owning every insect currently in play.
pub struct Tunnels {
    places: Vec<Place>,
    grid: Vec<Vec<PlaceId>>,
    entrances: Vec<PlaceId>,
    ants: Vec<Option<Ant>>,
    bees: Vec<Option<Bee>>,
}

impl Tunnels {
    /// Builds the grid endpoint-first: each tunnel starts at the queen and
    /// grows toward the hive, so every place's `exit` is known at creation
    /// and its `entrance` is wired as the next place is added. Every
    /// `moat_frequency`-th step is water (0 disables moats).
    pub fn new(num_tunnels: usize, tunnel_length: usize, moat_frequency: usize) -> Tunnels {
        let mut places = vec![Place::new("Ant Queen".to_string(), false)];
        let mut grid = Vec::with_capacity(num_tunnels);
        let mut entrances = Vec::with_capacity(num_tunnels);

        for tunnel in 0..num_tunnels {
            let mut row = Vec::with_capacity(tunnel_length);
            let mut prev = PlaceId(0);
            for step in 0..tunnel_length {
                let water = moat_frequency != 0 && (step + 1) % moat_frequency == 0;
                let kind = if water { "water" } else { "tunnel" };
                let name = format!("{}[{},{}]", kind, tunnel, step);

                let id = PlaceId(places.len());
                let mut place = Place::new(name, water);
                place.exit = Some(prev);
                places.push(place);
                places[prev.0].entrance = Some(id);

                row.push(id);
                prev = id;
            }
            entrances.push(prev);
            grid.push(row);
        }

        Tunnels {
            places,
            grid,
            entrances,
            ants: Vec::new(),
            bees: Vec::new(),
        }
    }

    pub fn queen(&self) -> PlaceId {
        PlaceId(0)
    }

    pub fn num_tunnels(&self) -> usize {
        self.grid.len()
    }

    pub fn tunnel_length(&self) -> usize {
        self.grid.first().map_or(0, |row| row.len())
    }

    pub fn entrances(&self) -> &[PlaceId] {
        &self.entrances
    }

    /// Looks up the place at grid coordinates, if they are in range.
    pub fn at(&self, row: usize, col: usize) -> Option<PlaceId> {
        self.grid.get(row)?.get(col).copied()
    }

    pub fn place(&self, id: PlaceId) -> &Place {
        &self.places[id.0]
    }

    pub fn ant(&self, id: AntId) -> Option<&Ant> {
        self.ants.get(id.0).and_then(|slot| slot.as_ref())
    }

    pub fn ant_mut(&mut self, id: AntId) -> Option<&mut Ant> {
        self.ants.get_mut(id.0).and_then(|slot| slot.as_mut())
    }

    pub fn bee(&self, id: BeeId) -> Option<&Bee> {
        self.bees.get(id.0).and_then(|slot| slot.as_ref())
    }

    pub fn bee_mut(&mut self, id: BeeId) -> Option<&mut Bee> {
        self.bees.get_mut(id.0).and_then(|slot| slot.as_mut())
    }

    /// Adds an ant to a place. Guards take the guard slot, every other
    /// kind the primary slot; the add fails if that slot is taken.
    pub fn add_ant(&mut self, mut ant: Ant, place_id: PlaceId) -> Option<AntId> {
        let id = AntId(self.ants.len());
        let place = &mut self.places[place_id.0];
        let slot = if ant.kind() == AntKind::Guard {
            &mut place.guard
        } else {
            &mut place.ant
        };
        if slot.is_some() {
            return None;
        }

        *slot = Some(id);
        ant.set_place(Some(place_id));
        self.ants.push(Some(ant));
        Some(id)
    }

    /// Removes an ant from a place, the guard taking priority over the
    /// primary when both are present. Returns the removed ant.
    pub fn remove_ant(&mut self, place_id: PlaceId) -> Option<Ant> {
        let place = &mut self.places[place_id.0];
        let id = place.guard.take().or_else(|| place.ant.take())?;
        self.discard_ant(id)
    }

    /// Removes specifically the guard at a place.
    pub fn remove_guard(&mut self, place_id: PlaceId) -> Option<Ant> {
        let id = self.places[place_id.0].guard.take()?;
        self.discard_ant(id)
    }

    /// Removes specifically the primary occupant at a place.
    pub fn remove_primary(&mut self, place_id: PlaceId) -> Option<Ant> {
        let id = self.places[place_id.0].ant.take()?;
        self.discard_ant(id)
    }

    /// Removes a specific dead ant, clearing whichever slot holds it. This
    /// keeps the dying unit and the removed unit the same even when a
    /// guarded primary expires.
    pub fn remove_dead_ant(&mut self, id: AntId) -> Option<Ant> {
        if let Some(place_id) = self.ants.get(id.0).and_then(|a| a.as_ref()).and_then(Ant::place) {
            let place = &mut self.places[place_id.0];
            if place.guard == Some(id) {
                place.guard = None;
            } else if place.ant == Some(id) {
                place.ant = None;
            }
        }
        self.discard_ant(id)
    }

    fn discard_ant(&mut self, id: AntId) -> Option<Ant> {
        let mut ant = self.ants.get_mut(id.0).and_then(|slot| slot.take())?;
        ant.set_place(None);
        // A bee still held in the stomach perishes with its eater.
        if let Some(bee) = ant.take_stomach() {
            self.bees[bee.0] = None;
        }
        Some(ant)
    }

    /// Registers a bee without placing it anywhere yet.
    pub fn insert_bee(&mut self, bee: Bee) -> BeeId {
        let id = BeeId(self.bees.len());
        self.bees.push(Some(bee));
        id
    }

    /// Appends a bee to a place's arrival order and binds its back
    /// reference.
    pub fn attach_bee(&mut self, id: BeeId, place_id: PlaceId) {
        self.places[place_id.0].bees.push(id);
        if let Some(bee) = self.bee_mut(id) {
            bee.set_place(Some(place_id));
        }
    }

    /// Removes a bee from its current place, preserving the relative order
    /// of the remaining bees. The bee itself stays registered.
    pub fn detach_bee(&mut self, id: BeeId) {
        let place_id = self.bee_mut(id).and_then(|bee| {
            let place = bee.place();
            bee.set_place(None);
            place
        });
        if let Some(place_id) = place_id {
            self.places[place_id.0].bees.retain(|b| *b != id);
        }
    }

    /// Removes a dead bee from play entirely.
    pub fn remove_dead_bee(&mut self, id: BeeId) -> Option<Bee> {
        self.detach_bee(id);
        self.bees.get_mut(id.0).and_then(|slot| slot.take())
    }

    /// Moves a bee forward through its place's exit, toward the queen.
    /// Returns the destination, or nothing when there is no exit to take.
    pub fn exit_bee(&mut self, id: BeeId) -> Option<PlaceId> {
        let place_id = self.bee(id)?.place()?;
        let exit = self.places[place_id.0].exit?;
        self.detach_bee(id);
        self.attach_bee(id, exit);
        Some(exit)
    }

    /// Walks backward from a place through successive entrance links,
    /// stepping distance 0, 1, 2, ... up to and including `max_distance`,
    /// and returns the frontmost bee at the first in-window step that has
    /// one. Distance is hops along the entrance chain.
    pub fn closest_bee(
        &self,
        from: PlaceId,
        max_distance: usize,
        min_distance: usize,
    ) -> Option<BeeId> {
        let mut current = Some(from);
        for dist in 0..=max_distance {
            let place = &self.places[current?.0];
            if dist >= min_distance {
                if let Some(&bee) = place.bees.first() {
                    return Some(bee);
                }
            }
            current = place.entrance;
        }
        None
    }

    /// All grid places in row-major, column-ascending order. The queen's
    /// place is not part of the grid.
    pub fn grid_places(&self) -> Vec<PlaceId> {
        self.grid.iter().flatten().copied().collect()
    }

    /// All bees on the grid, in resolution order: row-major by place,
    /// arrival order within a place. Bees at the queen, in the hive, or in
    /// a stomach are not on the grid.
    pub fn grid_bees(&self) -> Vec<BeeId> {
        self.grid_places()
            .into_iter()
            .flat_map(|id| self.places[id.0].bees.iter().copied().collect::<Vec<BeeId>>())
            .collect()
    }

    pub fn grid_bee_count(&self) -> usize {
        self.grid_places()
            .into_iter()
            .map(|id| self.places[id.0].bees.len())
            .sum()
    }

    /// Count of deployed ants, guards included.
    pub fn grid_ant_count(&self) -> usize {
        self.grid_places()
            .into_iter()
            .map(|id| {
                let place = &self.places[id.0];
                usize::from(place.ant.is_some()) + usize::from(place.guard.is_some())
            })
            .sum()
    }

    pub fn queen_has_bees(&self) -> bool {
        !self.places[0].bees.is_empty()
    }

    /// Draws the tunnel network to the console. Each cell shows the
    /// primary ant (or `~`/`.` for empty water/land), an `x` when a guard
    /// is present, and the number of bees waiting there.
    pub fn draw(&self, turn: usize, food: usize, hive_bees: usize, boosts: &[String]) {
        let mut stdout = stdout();

        execute!(
            stdout,
            Clear(ClearType::All),
            Hide,
            Print("Turn: "),
            Print(turn.to_string()),
            Print("  Food: "),
            Print(food.to_string()),
            Print("  Hive: "),
            Print(hive_bees.to_string()),
            Print("\nBoosts: "),
            Print(boosts.join(", ")),
            Print("\n\n")
        )
        .unwrap();

        for row in &self.grid {
            execute!(stdout, SetForegroundColor(Color::Grey), Print("Queen |")).unwrap();
            for id in row {
                let place = &self.places[id.0];
                let (ant_char, ant_color) = match place.ant.and_then(|a| self.ant(a)) {
                    Some(ant) => (ant.kind().char(), ant.kind().color()),
                    None if place.water => ('~', Color::DarkBlue),
                    None => ('.', Color::Grey),
                };
                let guard_char = if place.guard.is_some() { 'x' } else { ' ' };
                let bees = place.bees.len();
                let (bee_char, bee_color) = if bees == 0 {
                    (' ', Color::Reset)
                } else {
                    (char::from_digit(bees.min(9) as u32, 10).unwrap(), Color::DarkYellow)
                };

                execute!(
                    stdout,
                    SetForegroundColor(ant_color),
                    Print(ant_char),
                    SetForegroundColor(Color::Yellow),
                    Print(guard_char),
                    SetForegroundColor(bee_color),
                    Print(bee_char),
                    SetForegroundColor(Color::Grey),
                    Print("|")
                )
                .unwrap();
            }
            execute!(stdout, Print(" Hive\n"), SetForegroundColor(Color::Reset)).unwrap();
        }

        stdout.flush().unwrap();
    }
}

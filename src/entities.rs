use crate::map::{BeeId, PlaceId};
use crossterm::style::Color;
use uuid::Uuid;

/// Base damage dealt by a thrower or scuba leaf throw.
pub const LEAF_DAMAGE: i32 = 1;
/// Default leaf-throw range, measured in hops along the entrance chain.
pub const THROW_RANGE: usize = 3;
/// Extended range while a `FlyingLeaf` boost is pending.
pub const FLYING_LEAF_RANGE: usize = 5;
/// Damage dealt by a bug spray to every bee it reaches, and to the sprayer.
pub const BUG_SPRAY_DAMAGE: i32 = 10;
/// Digestion counter value past which a swallowed bee is gone for good.
pub const DIGESTION_TURNS: usize = 3;

/// The kinds of ants a player can deploy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AntKind {
    Grower,
    Thrower,
    Eater,
    Scuba,
    Guard,
}

impl AntKind {
    /// Parses a kind from a player-facing name, ignoring case.
    pub fn parse(name: &str) -> Option<AntKind> {
        match name.to_lowercase().as_str() {
            "grower" => Some(AntKind::Grower),
            "thrower" => Some(AntKind::Thrower),
            "eater" => Some(AntKind::Eater),
            "scuba" => Some(AntKind::Scuba),
            "guard" => Some(AntKind::Guard),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AntKind::Grower => "Grower",
            AntKind::Thrower => "Thrower",
            AntKind::Eater => "Eater",
            AntKind::Scuba => "Scuba",
            AntKind::Guard => "Guard",
        }
    }

    pub fn armor(&self) -> i32 {
        match self {
            AntKind::Grower => 1,
            AntKind::Thrower => 1,
            AntKind::Eater => 2,
            AntKind::Scuba => 1,
            AntKind::Guard => 2,
        }
    }

    pub fn food_cost(&self) -> usize {
        match self {
            AntKind::Grower => 1,
            AntKind::Thrower => 4,
            AntKind::Eater => 4,
            AntKind::Scuba => 5,
            AntKind::Guard => 4,
        }
    }

    pub fn char(&self) -> char {
        match self {
            AntKind::Grower => 'G',
            AntKind::Thrower => 'T',
            AntKind::Eater => 'E',
            AntKind::Scuba => 'S',
            AntKind::Guard => 'X',
        }
    }

    pub fn color(&self) -> Color {
        match self {
            AntKind::Grower => Color::Green,
            AntKind::Thrower => Color::Red,
            AntKind::Eater => Color::Magenta,
            AntKind::Scuba => Color::Cyan,
            AntKind::Guard => Color::Yellow,
        }
    }
}

/// Single-use modifiers a grower can find and an ant can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Boost {
    FlyingLeaf,
    StickyLeaf,
    IcyLeaf,
    BugSpray,
}

impl Boost {
    /// Parses a boost from its inventory name. Names are exact, as they
    /// appear in the boost inventory.
    pub fn parse(name: &str) -> Option<Boost> {
        match name {
            "FlyingLeaf" => Some(Boost::FlyingLeaf),
            "StickyLeaf" => Some(Boost::StickyLeaf),
            "IcyLeaf" => Some(Boost::IcyLeaf),
            "BugSpray" => Some(Boost::BugSpray),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Boost::FlyingLeaf => "FlyingLeaf",
            Boost::StickyLeaf => "StickyLeaf",
            Boost::IcyLeaf => "IcyLeaf",
            Boost::BugSpray => "BugSpray",
        }
    }
}

/// A one-turn condition on a bee, cleared after each of its actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BeeStatus {
    Stuck,
    Cold,
}

/// A deployed defender. One struct covers every kind; the kind drives the
/// behavior table in the colony, and the digestion fields are only touched
/// for eaters.
pub struct Ant {
    id: String,
    kind: AntKind,
    armor: i32,
    boost: Option<Boost>,
    place: Option<PlaceId>,
    turns_eating: usize,
    stomach: Option<BeeId>,
}

impl Ant {
    pub fn new(kind: AntKind) -> Ant {
        Ant {
            id: Uuid::new_v4().to_string(),
            kind,
            armor: kind.armor(),
            boost: None,
            place: None,
            turns_eating: 0,
            stomach: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> AntKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn armor(&self) -> i32 {
        self.armor
    }

    pub fn food_cost(&self) -> usize {
        self.kind.food_cost()
    }

    pub fn place(&self) -> Option<PlaceId> {
        self.place
    }

    pub fn set_place(&mut self, place: Option<PlaceId>) {
        self.place = place;
    }

    pub fn boost(&self) -> Option<Boost> {
        self.boost
    }

    pub fn set_boost(&mut self, boost: Boost) {
        self.boost = Some(boost);
    }

    pub fn take_boost(&mut self) -> Option<Boost> {
        self.boost.take()
    }

    /// Subtracts armor and reports whether the ant has expired.
    pub fn apply_damage(&mut self, amount: i32) -> bool {
        self.armor -= amount;
        self.armor <= 0
    }

    pub fn turns_eating(&self) -> usize {
        self.turns_eating
    }

    pub fn set_turns_eating(&mut self, turns: usize) {
        self.turns_eating = turns;
    }

    pub fn stomach(&self) -> Option<BeeId> {
        self.stomach
    }

    pub fn set_stomach(&mut self, bee: Option<BeeId>) {
        self.stomach = bee;
    }

    pub fn take_stomach(&mut self) -> Option<BeeId> {
        self.stomach.take()
    }
}

/// An attacker manufactured by the hive.
pub struct Bee {
    id: String,
    armor: i32,
    damage: i32,
    status: Option<BeeStatus>,
    place: Option<PlaceId>,
}

impl Bee {
    pub fn new(armor: i32, damage: i32) -> Bee {
        Bee {
            id: Uuid::new_v4().to_string(),
            armor,
            damage,
            status: None,
            place: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn armor(&self) -> i32 {
        self.armor
    }

    pub fn damage(&self) -> i32 {
        self.damage
    }

    pub fn status(&self) -> Option<BeeStatus> {
        self.status
    }

    pub fn set_status(&mut self, status: Option<BeeStatus>) {
        self.status = status;
    }

    pub fn place(&self) -> Option<PlaceId> {
        self.place
    }

    pub fn set_place(&mut self, place: Option<PlaceId>) {
        self.place = place;
    }

    /// Subtracts armor and reports whether the bee has expired.
    pub fn apply_damage(&mut self, amount: i32) -> bool {
        self.armor -= amount;
        self.armor <= 0
    }
}

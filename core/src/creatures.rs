//! Closed table of creature archetypes.

use serde::{Deserialize, Serialize};

use crate::{TerrainKind, TerrainSet};

/// Archetypes a creature can be instantiated from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreatureKind {
    /// The basic origami crane.
    Crane,
    /// Seabound carrier.
    Turtle,
    /// Versatile land carrier.
    Horse,
    /// Uproots and moves trees.
    Elephant,
    /// Basic enemy.
    Crab,
    /// Land fighter.
    Wolf,
    /// Stationary healer.
    Flower,
    /// Moves land tiles.
    Beaver,
    /// Fast seabound fighter.
    Dolphin,
    /// Waterbound enemy.
    Alligator,
    /// Toughest enemy.
    Lion,
    /// Large land carrier.
    Camel,
}

impl CreatureKind {
    /// Every archetype in declaration order.
    pub const ALL: [CreatureKind; 12] = [
        Self::Crane,
        Self::Turtle,
        Self::Horse,
        Self::Elephant,
        Self::Crab,
        Self::Wolf,
        Self::Flower,
        Self::Beaver,
        Self::Dolphin,
        Self::Alligator,
        Self::Lion,
        Self::Camel,
    ];

    /// Static definition record of the archetype.
    #[must_use]
    pub fn definition(self) -> &'static CreatureDefinition {
        match self {
            Self::Crane => &CRANE,
            Self::Turtle => &TURTLE,
            Self::Horse => &HORSE,
            Self::Elephant => &ELEPHANT,
            Self::Crab => &CRAB,
            Self::Wolf => &WOLF,
            Self::Flower => &FLOWER,
            Self::Beaver => &BEAVER,
            Self::Dolphin => &DOLPHIN,
            Self::Alligator => &ALLIGATOR,
            Self::Lion => &LION,
            Self::Camel => &CAMEL,
        }
    }
}

/// Immutable per-archetype data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreatureDefinition {
    /// Player-facing description.
    pub description: &'static str,
    /// Terrain the creature may stand on. Never empty.
    pub allowed_terrain: TerrainSet,
    /// How quickly presentation layers should animate the creature.
    pub speed: SpeedRule,
    /// Special ability granted to the archetype.
    pub ability: Ability,
    /// Whether the creature opposes the player.
    pub is_enemy: bool,
}

/// Relative movement pace used by presentation layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CreatureSpeed {
    /// Does not walk.
    Idle,
    /// Slow pace.
    Slow,
    /// Medium pace.
    Medium,
    /// Fast pace.
    Fast,
}

/// Rule deriving a creature's pace from its circumstances.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpeedRule {
    /// Always the same pace.
    Fixed(CreatureSpeed),
    /// Pace depends on the terrain underfoot.
    ByTerrain {
        /// Pace while standing in water.
        water: CreatureSpeed,
        /// Pace on any other terrain.
        otherwise: CreatureSpeed,
    },
    /// Pace depends on whether the creature is carrying something.
    ByLoad {
        /// Pace with empty hands.
        empty: CreatureSpeed,
        /// Pace while carrying.
        loaded: CreatureSpeed,
    },
}

impl SpeedRule {
    /// Resolves the pace for a creature standing on `terrain`.
    #[must_use]
    pub const fn resolve(self, terrain: TerrainKind, loaded: bool) -> CreatureSpeed {
        match self {
            Self::Fixed(speed) => speed,
            Self::ByTerrain { water, otherwise } => match terrain {
                TerrainKind::Water => water,
                _ => otherwise,
            },
            Self::ByLoad { empty, loaded: full } => {
                if loaded {
                    full
                } else {
                    empty
                }
            }
        }
    }
}

/// Ability tag attached to an archetype. Effects live outside the core.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ability {
    /// No special ability.
    None,
    /// Carries resources.
    CarryResources {
        /// Number of resources carried at once.
        capacity: u32,
    },
    /// Picks up one terrain type and leaves another behind.
    ChangeTerrain {
        /// Terrain the creature picks up.
        carry: TerrainKind,
        /// Terrain left in its place.
        leave: TerrainKind,
    },
    /// Fights hostile creatures.
    Fight {
        /// Attack strength.
        attack: u32,
        /// Defense strength.
        defense: u32,
    },
    /// Heals adjacent creatures.
    Heal {
        /// Health restored per step.
        power: u32,
    },
}

const LAND: TerrainSet = TerrainSet::of(&[TerrainKind::Land]);
const WATER: TerrainSet = TerrainSet::of(&[TerrainKind::Water]);
const LAND_AND_WATER: TerrainSet = TerrainSet::of(&[TerrainKind::Land, TerrainKind::Water]);
const LAND_AND_ROCK: TerrainSet = TerrainSet::of(&[TerrainKind::Land, TerrainKind::Rock]);

static CRANE: CreatureDefinition = CreatureDefinition {
    description: "The basic origami crane",
    allowed_terrain: LAND_AND_WATER,
    speed: SpeedRule::Fixed(CreatureSpeed::Medium),
    ability: Ability::None,
    is_enemy: false,
};

static TURTLE: CreatureDefinition = CreatureDefinition {
    description: "A seabound unit that can carry resources",
    allowed_terrain: LAND_AND_WATER,
    speed: SpeedRule::ByTerrain {
        water: CreatureSpeed::Medium,
        otherwise: CreatureSpeed::Slow,
    },
    ability: Ability::CarryResources { capacity: 5 },
    is_enemy: false,
};

static HORSE: CreatureDefinition = CreatureDefinition {
    description: "A versatile land unit that can carry resources",
    allowed_terrain: LAND_AND_ROCK,
    speed: SpeedRule::ByLoad {
        empty: CreatureSpeed::Fast,
        loaded: CreatureSpeed::Medium,
    },
    ability: Ability::CarryResources { capacity: 5 },
    is_enemy: false,
};

static ELEPHANT: CreatureDefinition = CreatureDefinition {
    description: "A large unit that can uproot and move trees",
    allowed_terrain: LAND,
    speed: SpeedRule::Fixed(CreatureSpeed::Slow),
    ability: Ability::ChangeTerrain {
        carry: TerrainKind::Tree,
        leave: TerrainKind::Land,
    },
    is_enemy: false,
};

static CRAB: CreatureDefinition = CreatureDefinition {
    description: "A basic enemy creature",
    allowed_terrain: LAND,
    speed: SpeedRule::Fixed(CreatureSpeed::Slow),
    ability: Ability::Fight {
        attack: 10,
        defense: 5,
    },
    is_enemy: true,
};

static WOLF: CreatureDefinition = CreatureDefinition {
    description: "Can fight enemies",
    allowed_terrain: LAND_AND_ROCK,
    speed: SpeedRule::Fixed(CreatureSpeed::Fast),
    ability: Ability::Fight {
        attack: 10,
        defense: 7,
    },
    is_enemy: false,
};

static FLOWER: CreatureDefinition = CreatureDefinition {
    description: "Can heal other creatures",
    allowed_terrain: LAND,
    speed: SpeedRule::Fixed(CreatureSpeed::Idle),
    ability: Ability::Heal { power: 1 },
    is_enemy: false,
};

// Walks faster once it has something to carry back.
static BEAVER: CreatureDefinition = CreatureDefinition {
    description: "Can move land tiles",
    allowed_terrain: LAND,
    speed: SpeedRule::ByLoad {
        empty: CreatureSpeed::Slow,
        loaded: CreatureSpeed::Fast,
    },
    ability: Ability::ChangeTerrain {
        carry: TerrainKind::Land,
        leave: TerrainKind::Water,
    },
    is_enemy: false,
};

static DOLPHIN: CreatureDefinition = CreatureDefinition {
    description: "A fast seabound fighter",
    allowed_terrain: WATER,
    speed: SpeedRule::Fixed(CreatureSpeed::Fast),
    ability: Ability::Fight {
        attack: 15,
        defense: 8,
    },
    is_enemy: false,
};

static ALLIGATOR: CreatureDefinition = CreatureDefinition {
    description: "A waterbound enemy creature",
    allowed_terrain: WATER,
    speed: SpeedRule::Fixed(CreatureSpeed::Medium),
    ability: Ability::Fight {
        attack: 13,
        defense: 7,
    },
    is_enemy: true,
};

static LION: CreatureDefinition = CreatureDefinition {
    description: "The king of the jungle; your toughest enemy",
    allowed_terrain: LAND_AND_ROCK,
    speed: SpeedRule::Fixed(CreatureSpeed::Medium),
    ability: Ability::Fight {
        attack: 17,
        defense: 10,
    },
    is_enemy: true,
};

static CAMEL: CreatureDefinition = CreatureDefinition {
    description: "A land unit that can carry a lot of stuff",
    allowed_terrain: LAND,
    speed: SpeedRule::Fixed(CreatureSpeed::Slow),
    ability: Ability::CarryResources { capacity: 10 },
    is_enemy: false,
};

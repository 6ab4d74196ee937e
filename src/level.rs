use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::command::{Opcode, Value};

/// Static description of a puzzle.
///
/// Generators are plain functions selected by level id, never code loaded at runtime. Both
/// functions are handed an RNG seeded identically, so the expected output always belongs to the
/// generated input.
pub struct Level {
    pub id: &'static str,
    pub name: &'static str,
    /// Commands the player may use. Labels are always available.
    pub toolbox: &'static [Opcode],
    pub construction_slots: usize,
    /// Slots which hold a value before the run starts.
    pub initial_memory: &'static [(usize, Value)],
    pub generator: fn(&mut StdRng) -> Vec<Value>,
    pub expected: fn(&mut StdRng) -> Vec<Value>,
    /// Size challenge.
    pub expected_command_count: usize,
    /// Speed challenge.
    pub expected_execute_count: u64,
    /// Use this seed for every run, instead of the run's own.
    pub fixed_seed: Option<u64>,
}

/// Input and expected output for a single run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Workload {
    pub seed: u64,
    pub input: Vec<Value>,
    pub expected: Vec<Value>,
}

impl Level {
    pub fn workload(&self, seed: u64) -> Workload {
        let seed = self.fixed_seed.unwrap_or(seed);
        let input = (self.generator)(&mut StdRng::seed_from_u64(seed));
        let expected = (self.expected)(&mut StdRng::seed_from_u64(seed));
        Workload {
            seed,
            input,
            expected,
        }
    }

    /// Construction slots as they are at the start of a run.
    pub fn memory(&self) -> Vec<Option<Value>> {
        let mut memory = vec![None; self.construction_slots];
        for &(slot, value) in self.initial_memory {
            if let Some(cell) = memory.get_mut(slot) {
                *cell = Some(value);
            }
        }
        memory
    }
}

/// Look up a level by its id.
pub fn find(id: &str) -> Option<&'static Level> {
    LEVELS.iter().find(|level| level.id == id)
}

/// Seed for a run whose caller did not ask for a particular one.
pub fn fresh_seed() -> u64 {
    rand::random()
}

const BASIC: &[Opcode] = &[Opcode::Input, Opcode::Output];
const LOOPING: &[Opcode] = &[Opcode::Input, Opcode::Output, Opcode::Jump];
const FLOOR: &[Opcode] = &[
    Opcode::Input,
    Opcode::Output,
    Opcode::CopyFrom,
    Opcode::CopyTo,
    Opcode::Jump,
];
const ADDING: &[Opcode] = &[
    Opcode::Input,
    Opcode::Output,
    Opcode::CopyFrom,
    Opcode::CopyTo,
    Opcode::Add,
    Opcode::Jump,
];
const BRANCHING: &[Opcode] = &[
    Opcode::Input,
    Opcode::Output,
    Opcode::CopyFrom,
    Opcode::CopyTo,
    Opcode::Jump,
    Opcode::JumpIfZero,
];
const EVERYTHING: &[Opcode] = &[
    Opcode::Input,
    Opcode::Output,
    Opcode::CopyFrom,
    Opcode::CopyTo,
    Opcode::Add,
    Opcode::Sub,
    Opcode::Jump,
    Opcode::JumpIfZero,
];

pub static LEVELS: &[Level] = &[
    Level {
        id: "mail-room",
        name: "Mail Room",
        toolbox: BASIC,
        construction_slots: 0,
        initial_memory: &[],
        generator: mail_room_input,
        expected: mail_room_input,
        expected_command_count: 6,
        expected_execute_count: 6,
        fixed_seed: None,
    },
    Level {
        id: "busy-mail-room",
        name: "Busy Mail Room",
        toolbox: LOOPING,
        construction_slots: 0,
        initial_memory: &[],
        generator: busy_mail_room_input,
        expected: busy_mail_room_input,
        expected_command_count: 3,
        expected_execute_count: 36,
        fixed_seed: None,
    },
    Level {
        id: "copy-floor",
        name: "Copy Floor",
        toolbox: FLOOR,
        construction_slots: 3,
        initial_memory: &[(0, 4), (1, 7), (2, 1)],
        generator: copy_floor_input,
        expected: copy_floor_expected,
        expected_command_count: 6,
        expected_execute_count: 6,
        fixed_seed: Some(0),
    },
    Level {
        id: "rainy-summer",
        name: "Rainy Summer",
        toolbox: ADDING,
        construction_slots: 3,
        initial_memory: &[],
        generator: pairs_input,
        expected: rainy_summer_expected,
        expected_command_count: 6,
        expected_execute_count: 24,
        fixed_seed: None,
    },
    Level {
        id: "zero-exterminator",
        name: "Zero Exterminator",
        toolbox: BRANCHING,
        construction_slots: 9,
        initial_memory: &[],
        generator: zero_exterminator_input,
        expected: zero_exterminator_expected,
        expected_command_count: 4,
        expected_execute_count: 23,
        fixed_seed: None,
    },
    Level {
        id: "tripler-room",
        name: "Tripler Room",
        toolbox: ADDING,
        construction_slots: 3,
        initial_memory: &[],
        generator: tripler_room_input,
        expected: tripler_room_expected,
        expected_command_count: 6,
        expected_execute_count: 24,
        fixed_seed: None,
    },
    Level {
        id: "subtract-room",
        name: "Subtract Room",
        toolbox: EVERYTHING,
        construction_slots: 3,
        initial_memory: &[],
        generator: pairs_input,
        expected: subtract_room_expected,
        expected_command_count: 10,
        expected_execute_count: 40,
        fixed_seed: None,
    },
    Level {
        id: "equalization-room",
        name: "Equalization Room",
        toolbox: EVERYTHING,
        construction_slots: 3,
        initial_memory: &[],
        generator: equalization_room_input,
        expected: equalization_room_expected,
        expected_command_count: 9,
        expected_execute_count: 27,
        fixed_seed: None,
    },
];

fn values(rng: &mut StdRng, count: usize) -> Vec<Value> {
    (0..count).map(|_| rng.gen_range(-9..=9)).collect()
}

fn mail_room_input(rng: &mut StdRng) -> Vec<Value> {
    (0..3).map(|_| rng.gen_range(1..=9)).collect()
}

fn busy_mail_room_input(rng: &mut StdRng) -> Vec<Value> {
    values(rng, 12)
}

fn copy_floor_input(rng: &mut StdRng) -> Vec<Value> {
    values(rng, 4)
}

fn copy_floor_expected(_rng: &mut StdRng) -> Vec<Value> {
    vec![1, 4, 7]
}

/// Eight values, consumed two at a time.
fn pairs_input(rng: &mut StdRng) -> Vec<Value> {
    values(rng, 8)
}

fn rainy_summer_expected(rng: &mut StdRng) -> Vec<Value> {
    pairs_input(rng)
        .chunks_exact(2)
        .map(|pair| pair[0] + pair[1])
        .collect()
}

fn zero_exterminator_input(rng: &mut StdRng) -> Vec<Value> {
    (0..8)
        .map(|_| {
            if rng.gen_bool(0.35) {
                0
            } else {
                let magnitude = rng.gen_range(1..=9);
                if rng.gen_bool(0.5) {
                    magnitude
                } else {
                    -magnitude
                }
            }
        })
        .collect()
}

fn zero_exterminator_expected(rng: &mut StdRng) -> Vec<Value> {
    zero_exterminator_input(rng)
        .into_iter()
        .filter(|value| *value != 0)
        .collect()
}

fn tripler_room_input(rng: &mut StdRng) -> Vec<Value> {
    values(rng, 5)
}

fn tripler_room_expected(rng: &mut StdRng) -> Vec<Value> {
    tripler_room_input(rng)
        .into_iter()
        .map(|value| value * 3)
        .collect()
}

/// For each pair `a, b`: first `b - a`, then `a - b`.
fn subtract_room_expected(rng: &mut StdRng) -> Vec<Value> {
    pairs_input(rng)
        .chunks_exact(2)
        .flat_map(|pair| [pair[1] - pair[0], pair[0] - pair[1]])
        .collect()
}

fn equalization_room_input(rng: &mut StdRng) -> Vec<Value> {
    (0..4)
        .flat_map(|_| {
            let first = rng.gen_range(-9..=9);
            let second = if rng.gen_bool(0.5) {
                first
            } else {
                rng.gen_range(-9..=9)
            };
            [first, second]
        })
        .collect()
}

/// One value of each pair whose values are equal.
fn equalization_room_expected(rng: &mut StdRng) -> Vec<Value> {
    equalization_room_input(rng)
        .chunks_exact(2)
        .filter(|pair| pair[0] == pair[1])
        .map(|pair| pair[0])
        .collect()
}

use crate::fault::Fault;
use crate::runtime::{Effect, Stats};

/// Everything the engine tells the surrounding application.
///
/// Passed explicitly to each run; there is no process-wide event bus.
pub trait Channel {
    /// A fault occurred. Called once per occurrence.
    fn report(&mut self, fault: Fault);

    /// Output matched the expected output. Called at most once per run.
    fn completed(&mut self, _stats: Stats) {}

    /// An instruction finished and wants this effect shown.
    ///
    /// The next instruction is not fetched until this returns, so a host may block here for as
    /// long as its presentation takes.
    fn effect(&mut self, _effect: &Effect) {}
}

/// Ignores everything.
#[derive(Debug, Default)]
pub struct Silent;

impl Channel for Silent {
    fn report(&mut self, _fault: Fault) {}
}

/// Keeps everything it is told, in order.
#[derive(Debug, Default)]
pub struct Recorder {
    pub faults: Vec<Fault>,
    pub completions: Vec<Stats>,
    pub effects: Vec<Effect>,
    record_effects: bool,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also record effects. Leave this off for long running loops.
    pub fn with_effects() -> Self {
        Self {
            record_effects: true,
            ..Self::default()
        }
    }
}

impl Channel for Recorder {
    fn report(&mut self, fault: Fault) {
        self.faults.push(fault);
    }

    fn completed(&mut self, stats: Stats) {
        self.completions.push(stats);
    }

    fn effect(&mut self, effect: &Effect) {
        if self.record_effects {
            self.effects.push(*effect);
        }
    }
}

use tracing::debug;

use crate::channel::Channel;
use crate::command::CommandList;
use crate::level::{self, Level};
use crate::program::{BuildError, Program};
use crate::runtime::{RunOptions, RunState, StopSignal};

/// Input to use when a run is reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reseed {
    /// Same input as before.
    Replay,
    /// New random input, unless the level has a fixed seed.
    Fresh,
    Seed(u64),
}

/// A player working on one level. At most one run is active at a time.
pub struct Session {
    level: &'static Level,
    seed: u64,
    options: RunOptions,
    /// Stop handle of the most recently started run.
    active: Option<StopSignal>,
}

impl Session {
    pub fn new(level: &'static Level, seed: u64, options: RunOptions) -> Self {
        Self {
            level,
            seed,
            options,
            active: None,
        }
    }

    pub fn level(&self) -> &'static Level {
        self.level
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Build the player's commands into a fresh run.
    ///
    /// Any previous run is asked to stop first. If the program cannot be built, the fault is
    /// reported on `channel` and no run is started.
    pub fn start(
        &mut self,
        commands: &CommandList,
        channel: &mut dyn Channel,
    ) -> Result<RunState, BuildError> {
        self.stop();

        let program = self.build(commands).inspect_err(|error| {
            debug!(%error, "program rejected");
            channel.report(error.fault());
        })?;

        let workload = self.level.workload(self.seed);
        debug!(level = self.level.id, seed = workload.seed, "starting run");
        let state = RunState::new(program, self.level.memory(), workload, self.options);
        self.active = Some(state.stop_signal());
        Ok(state)
    }

    /// Resolve the commands and check them against this level.
    pub fn build(&self, commands: &CommandList) -> Result<Program, BuildError> {
        let program = Program::build(commands)?;
        program.check_toolbox(self.level.toolbox)?;
        program.check_slots(self.level.construction_slots)?;
        Ok(program)
    }

    /// Ask the active run, if any, to stop before its next instruction.
    pub fn stop(&mut self) {
        if let Some(stop) = self.active.take() {
            stop.request();
        }
    }

    /// Rewind a run to its beginning. The run becomes the active one, and any other active run
    /// is asked to stop.
    pub fn reset(&mut self, state: &mut RunState, reseed: Reseed) {
        // Resetting clears the stop request if `state` was the active run
        self.stop();
        match reseed {
            Reseed::Replay => state.reset(),
            Reseed::Fresh => {
                self.seed = level::fresh_seed();
                state.reset_with(self.level.workload(self.seed));
            }
            Reseed::Seed(seed) => {
                self.seed = seed;
                state.reset_with(self.level.workload(seed));
            }
        }
        debug!(seed = state.seed(), "run reset");
        self.active = Some(state.stop_signal());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{Recorder, Silent};
    use crate::command::{Arg, Opcode};
    use crate::fault::Fault;
    use crate::runtime::Status;

    fn subtract_program() -> CommandList {
        // For each pair `a, b`: outputs `b - a`, then `a - b`
        let mut list = CommandList::new();
        let start = list.push(Opcode::Label, None);
        list.push(Opcode::Input, None);
        list.push(Opcode::CopyTo, Some(Arg::Slot(0)));
        list.push(Opcode::Input, None);
        list.push(Opcode::CopyTo, Some(Arg::Slot(1)));
        list.push(Opcode::Sub, Some(Arg::Slot(0)));
        list.push(Opcode::Output, None);
        list.push(Opcode::CopyFrom, Some(Arg::Slot(0)));
        list.push(Opcode::Sub, Some(Arg::Slot(1)));
        list.push(Opcode::Output, None);
        list.push(Opcode::Jump, Some(Arg::Target(start)));
        list
    }

    #[test]
    fn subtract_room_matches_own_expected_output() {
        let level = level::find("subtract-room").unwrap();
        for seed in [0, 1, 7, 1234] {
            let mut session = Session::new(
                level,
                seed,
                RunOptions {
                    halt_on_success: true,
                    ..RunOptions::default()
                },
            );
            let mut channel = Recorder::new();
            let mut state = session.start(&subtract_program(), &mut channel).unwrap();
            assert_eq!(state.run(&mut channel), Status::HaltedSuccess, "seed {seed}");
            assert_eq!(state.outbox(), level.workload(seed).expected.as_slice());
            assert!(channel.faults.is_empty());
        }
    }

    #[test]
    fn same_seed_same_run() {
        let level = level::find("subtract-room").unwrap();
        let options = RunOptions {
            step_limit: Some(200),
            ..RunOptions::default()
        };
        let mut first = Session::new(level, 99, options);
        let mut second = Session::new(level, 99, options);

        let mut a = first.start(&subtract_program(), &mut Silent).unwrap();
        let mut b = second.start(&subtract_program(), &mut Silent).unwrap();
        a.run(&mut Silent);
        b.run(&mut Silent);
        assert_eq!(a.outbox(), b.outbox());
        assert_eq!(a.instructions_executed(), b.instructions_executed());
    }

    #[test]
    fn unresolved_jump_prevents_run() {
        let level = level::find("busy-mail-room").unwrap();
        let mut session = Session::new(level, 0, RunOptions::default());
        let mut list = CommandList::new();
        let label = list.push(Opcode::Label, None);
        list.push(Opcode::Input, None);
        list.push(Opcode::Output, None);
        list.push(Opcode::Jump, Some(Arg::Target(label)));
        list.remove(label);

        let mut channel = Recorder::new();
        let error = session.start(&list, &mut channel).unwrap_err();
        assert!(matches!(error, BuildError::UnresolvedJumpTarget { index: 2, .. }));
        assert_eq!(channel.faults, vec![Fault::UnresolvedJumpTarget { index: 2 }]);
    }

    #[test]
    fn rejects_commands_outside_toolbox() {
        let level = level::find("mail-room").unwrap();
        let mut session = Session::new(level, 0, RunOptions::default());
        let mut list = CommandList::new();
        list.push(Opcode::Input, None);
        list.push(Opcode::CopyTo, Some(Arg::Slot(0)));

        let mut channel = Recorder::new();
        let error = session.start(&list, &mut channel).unwrap_err();
        assert_eq!(
            error,
            BuildError::OpcodeNotAvailable {
                index: 1,
                opcode: Opcode::CopyTo
            }
        );
        assert_eq!(channel.faults.len(), 1);
        assert!(!channel.faults[0].is_fatal());
    }

    #[test]
    fn starting_again_stops_previous_run() {
        let level = level::find("busy-mail-room").unwrap();
        let mut session = Session::new(level, 3, RunOptions::default());
        let mut list = CommandList::new();
        let start = list.push(Opcode::Input, None);
        list.push(Opcode::Output, None);
        list.push(Opcode::Jump, Some(Arg::Target(start)));

        let mut old = session.start(&list, &mut Silent).unwrap();
        old.step(&mut Silent);
        let _new = session.start(&list, &mut Silent).unwrap();
        assert_eq!(old.run(&mut Silent), Status::HaltedStopped);
        assert_eq!(old.instructions_executed(), 1);
    }

    #[test]
    fn resetting_old_run_stops_current_one() {
        let level = level::find("busy-mail-room").unwrap();
        let mut session = Session::new(level, 3, RunOptions::default());
        let mut list = CommandList::new();
        let start = list.push(Opcode::Input, None);
        list.push(Opcode::Output, None);
        list.push(Opcode::Jump, Some(Arg::Target(start)));

        let mut old = session.start(&list, &mut Silent).unwrap();
        let mut new = session.start(&list, &mut Silent).unwrap();
        session.reset(&mut old, Reseed::Replay);
        let _third = session.start(&list, &mut Silent).unwrap();

        assert_eq!(new.run(&mut Silent), Status::HaltedStopped);
        assert_eq!(new.instructions_executed(), 0);
        assert_eq!(old.run(&mut Silent), Status::HaltedStopped);
        assert_eq!(old.instructions_executed(), 0);
    }

    #[test]
    fn reset_keeps_active_run_going() {
        let level = level::find("copy-floor").unwrap();
        let mut session = Session::new(level, 0, RunOptions::default());
        let mut list = CommandList::new();
        list.push(Opcode::Input, None);
        list.push(Opcode::Output, None);

        let mut state = session.start(&list, &mut Silent).unwrap();
        state.run(&mut Silent);
        session.reset(&mut state, Reseed::Replay);
        assert_eq!(state.run(&mut Silent), Status::HaltedStopped);
        assert_eq!(state.instructions_executed(), 2);

        session.stop();
        session.reset(&mut state, Reseed::Replay);
        state.run(&mut Silent);
        assert_eq!(state.instructions_executed(), 2);
    }

    #[test]
    fn reset_with_fresh_seed() {
        let level = level::find("subtract-room").unwrap();
        let mut session = Session::new(level, 5, RunOptions::default());
        let mut state = session.start(&subtract_program(), &mut Silent).unwrap();

        session.reset(&mut state, Reseed::Fresh);
        assert_eq!(state.seed(), session.seed());
        assert_eq!(*state.inbox(), level.workload(session.seed()).input);
        assert_eq!(state.status(), Status::Idle);
    }

    #[test]
    fn fresh_seed_ignored_by_fixed_level() {
        let level = level::find("copy-floor").unwrap();
        let mut session = Session::new(level, 5, RunOptions::default());
        let mut list = CommandList::new();
        list.push(Opcode::Input, None);
        let mut state = session.start(&list, &mut Silent).unwrap();
        state.run(&mut Silent);

        session.reset(&mut state, Reseed::Fresh);
        assert_eq!(state.seed(), 0);
        assert_eq!(*state.inbox(), level.workload(0).input);
        assert_eq!(state.expected(), level.workload(0).expected.as_slice());
    }

    #[test]
    fn reset_with_new_seed() {
        let level = level::find("rainy-summer").unwrap();
        let mut session = Session::new(level, 5, RunOptions::default());
        let mut list = CommandList::new();
        list.push(Opcode::Input, None);
        let mut state = session.start(&list, &mut Silent).unwrap();
        state.run(&mut Silent);

        session.reset(&mut state, Reseed::Replay);
        assert_eq!(state.seed(), 5);
        assert_eq!(state.inbox().len(), 8);

        session.reset(&mut state, Reseed::Seed(6));
        assert_eq!(session.seed(), 6);
        assert_eq!(state.expected(), level.workload(6).expected.as_slice());
        assert_eq!(state.status(), Status::Idle);
    }
}

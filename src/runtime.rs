use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, trace};

use crate::channel::Channel;
use crate::command::{Opcode, Value};
use crate::fault::Fault;
use crate::level::Workload;
use crate::program::{Instruction, Program};
use crate::validate::{validate, Verdict};

/// Policy knobs for a single run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Halt with [`Status::HaltedError`] once this many runtime faults have occurred.
    /// `None` never halts on faults.
    pub fault_limit: Option<u32>,
    /// Halt with [`Status::HaltedSuccess`] as soon as the output matches, rather than letting the
    /// program carry on.
    pub halt_on_success: bool,
    /// Stop the run after this many executed instructions.
    pub step_limit: Option<u64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Idle,
    Running,
    HaltedSuccess,
    HaltedStopped,
    HaltedError,
}

impl Status {
    pub fn is_halted(self) -> bool {
        matches!(
            self,
            Status::HaltedSuccess | Status::HaltedStopped | Status::HaltedError
        )
    }
}

/// What the worker visibly does for one instruction.
///
/// Purely advisory; a headless host ignores these.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Walk to the inbox and pick up `value`.
    PickUp { value: Value },
    /// Walk to the outbox and drop `value`.
    Drop { value: Value },
    /// Walk to a construction slot.
    Visit { slot: usize, opcode: Opcode },
    /// Jump instruction, `taken` is false when a conditional jump fell through.
    Jump { target: usize, taken: bool },
    /// The instruction faulted and was skipped.
    Stumble { opcode: Opcode },
    /// Label. Nothing to show.
    Pass,
    /// No instruction was executed.
    Halt(Status),
}

/// Counters used to score a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub instructions_executed: u64,
    pub commands_used: usize,
}

/// Cooperative stop request for a run.
///
/// Cloned handles share the same flag, so any thread may request a stop. The run checks the flag
/// before each instruction; an instruction is never interrupted halfway.
#[derive(Clone, Debug, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Withdraw a request, for every handle sharing this flag.
    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Represents complete program state during a run.
///
/// Owned exclusively by the run; the host only ever reads it.
#[derive(Debug)]
pub struct RunState {
    program: Program,
    /// Program counter
    pc: usize,
    /// What the worker is holding
    accumulator: Option<Value>,
    /// Construction slots
    memory: Vec<Option<Value>>,
    /// Slots as they were before the run. Restored on reset.
    initial_memory: Vec<Option<Value>>,
    inbox: VecDeque<Value>,
    outbox: Vec<Value>,
    workload: Workload,

    instructions_executed: u64,
    faults: u32,
    /// Output has matched at some point during this run.
    completed: bool,
    status: Status,
    options: RunOptions,
    stop: StopSignal,
}

impl RunState {
    pub fn new(
        program: Program,
        memory: Vec<Option<Value>>,
        workload: Workload,
        options: RunOptions,
    ) -> RunState {
        RunState {
            program,
            pc: 0,
            accumulator: None,
            initial_memory: memory.clone(),
            memory,
            inbox: workload.input.iter().copied().collect(),
            outbox: Vec::new(),
            workload,
            instructions_executed: 0,
            faults: 0,
            completed: false,
            status: Status::Idle,
            options,
            stop: StopSignal::new(),
        }
    }

    /// Rewind to the start of the run, replaying the same input.
    pub fn reset(&mut self) {
        self.pc = 0;
        self.accumulator = None;
        self.memory.clone_from(&self.initial_memory);
        self.inbox = self.workload.input.iter().copied().collect();
        self.outbox.clear();
        self.instructions_executed = 0;
        self.faults = 0;
        self.completed = false;
        self.status = Status::Idle;
        self.stop.clear();
    }

    /// Rewind to the start of the run, with a different input.
    pub fn reset_with(&mut self, workload: Workload) {
        self.workload = workload;
        self.reset();
    }

    /// Handle which stops this run when requested.
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Step until the program halts or a stop is requested.
    pub fn run(&mut self, channel: &mut dyn Channel) -> Status {
        while !self.status.is_halted() {
            if self.stop.is_requested() {
                debug!(pc = self.pc, "stop requested");
                self.status = Status::HaltedStopped;
                break;
            }
            if self.step_limit_reached() {
                debug!(limit = ?self.options.step_limit, "step limit reached");
                self.status = Status::HaltedStopped;
                break;
            }
            let effect = self.step(channel);
            channel.effect(&effect);
        }
        self.status
    }

    /// Execute a single instruction.
    pub fn step(&mut self, channel: &mut dyn Channel) -> Effect {
        if self.status.is_halted() {
            return Effect::Halt(self.status);
        }
        let Some(instr) = self.program.get(self.pc) else {
            // Ran off the end of the program
            self.status = if self.completed {
                Status::HaltedSuccess
            } else {
                Status::HaltedStopped
            };
            debug!(pc = self.pc, status = ?self.status, "reached end of program");
            return Effect::Halt(self.status);
        };
        self.status = Status::Running;
        trace!(pc = self.pc, %instr, "execute");

        let effect = match self.execute(instr, channel) {
            Ok(effect) => effect,
            Err(fault) => {
                self.fault(fault, channel);
                self.pc += 1;
                Effect::Stumble {
                    opcode: instr.opcode(),
                }
            }
        };
        self.instructions_executed += 1;

        if self.step_limit_reached() && !self.status.is_halted() {
            debug!(limit = ?self.options.step_limit, "step limit reached");
            self.status = Status::HaltedStopped;
        }
        effect
    }

    fn step_limit_reached(&self) -> bool {
        self.options
            .step_limit
            .is_some_and(|limit| self.instructions_executed >= limit)
    }

    /// Apply the effect of an instruction and move the program counter.
    ///
    /// On error, nothing has been changed.
    fn execute(&mut self, instr: Instruction, channel: &mut dyn Channel) -> Result<Effect, Fault> {
        let effect = match instr {
            Instruction::Input => self.input()?,
            Instruction::Output => self.output(channel)?,
            Instruction::CopyFrom(slot) => self.copy_from(slot)?,
            Instruction::CopyTo(slot) => self.copy_to(slot)?,
            Instruction::Add(slot) => self.arith(Opcode::Add, slot, Value::checked_add)?,
            Instruction::Sub(slot) => self.arith(Opcode::Sub, slot, Value::checked_sub)?,
            Instruction::Jump(target) => {
                self.pc = target;
                return Ok(Effect::Jump {
                    target,
                    taken: true,
                });
            }
            Instruction::JumpIfZero(target) => {
                let taken = self.accumulator == Some(0);
                if taken {
                    self.pc = target;
                } else {
                    self.pc += 1;
                }
                return Ok(Effect::Jump { target, taken });
            }
            Instruction::Label => Effect::Pass,
        };
        self.pc += 1;
        Ok(effect)
    }

    fn fault(&mut self, fault: Fault, channel: &mut dyn Channel) {
        self.faults += 1;
        debug!(pc = self.pc, code = %fault.code(), "{}", fault);
        channel.report(fault);
        if let Some(limit) = self.options.fault_limit {
            if self.faults >= limit {
                debug!(limit, "fault limit reached");
                self.status = Status::HaltedError;
            }
        }
    }

    fn input(&mut self) -> Result<Effect, Fault> {
        let value = self.inbox.pop_front().ok_or(Fault::EmptyInput)?;
        self.accumulator = Some(value);
        Ok(Effect::PickUp { value })
    }

    fn output(&mut self, channel: &mut dyn Channel) -> Result<Effect, Fault> {
        let value = self.accumulator.take().ok_or(Fault::WorkerNotCarrying {
            opcode: Opcode::Output,
        })?;
        self.outbox.push(value);
        self.check_output(channel);
        Ok(Effect::Drop { value })
    }

    fn copy_from(&mut self, slot: usize) -> Result<Effect, Fault> {
        let value = self.read_slot(Opcode::CopyFrom, slot)?;
        self.accumulator = Some(value);
        Ok(Effect::Visit {
            slot,
            opcode: Opcode::CopyFrom,
        })
    }

    fn copy_to(&mut self, slot: usize) -> Result<Effect, Fault> {
        let value = self.carried(Opcode::CopyTo)?;
        let cell = self.slot_mut(slot)?;
        *cell = Some(value);
        Ok(Effect::Visit {
            slot,
            opcode: Opcode::CopyTo,
        })
    }

    fn arith(
        &mut self,
        opcode: Opcode,
        slot: usize,
        op: fn(Value, Value) -> Option<Value>,
    ) -> Result<Effect, Fault> {
        let carried = self.carried(opcode)?;
        let stored = self.read_slot(opcode, slot)?;
        let value = op(carried, stored).ok_or_else(|| {
            Fault::unexpected(format!(
                "{} of {} and {} is too large to carry",
                opcode, carried, stored
            ))
        })?;
        self.accumulator = Some(value);
        Ok(Effect::Visit { slot, opcode })
    }

    fn carried(&self, opcode: Opcode) -> Result<Value, Fault> {
        self.accumulator.ok_or(Fault::WorkerNotCarrying { opcode })
    }

    fn read_slot(&mut self, opcode: Opcode, slot: usize) -> Result<Value, Fault> {
        let cell = self.slot_mut(slot)?;
        (*cell).ok_or(Fault::SlotEmpty { opcode, slot })
    }

    fn slot_mut(&mut self, slot: usize) -> Result<&mut Option<Value>, Fault> {
        let slot_count = self.memory.len();
        self.memory.get_mut(slot).ok_or_else(|| {
            Fault::unexpected(format!(
                "There is no slot {}, the floor has {} slots",
                slot, slot_count
            ))
        })
    }

    /// Validate after every value put into the outbox.
    fn check_output(&mut self, channel: &mut dyn Channel) {
        if self.completed || !validate(&self.outbox, &self.workload.expected) {
            return;
        }
        self.completed = true;
        // The outbox instruction itself has not been counted yet
        let stats = Stats {
            instructions_executed: self.instructions_executed + 1,
            commands_used: self.program.commands_used(),
        };
        info!(
            executed = stats.instructions_executed,
            commands = stats.commands_used,
            "level completed"
        );
        channel.completed(stats);
        if self.options.halt_on_success {
            self.status = Status::HaltedSuccess;
        }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn accumulator(&self) -> Option<Value> {
        self.accumulator
    }

    pub fn memory(&self) -> &[Option<Value>] {
        &self.memory
    }

    pub fn slot(&self, slot: usize) -> Option<Value> {
        self.memory.get(slot).copied().flatten()
    }

    /// Values not yet taken from the inbox.
    pub fn inbox(&self) -> &VecDeque<Value> {
        &self.inbox
    }

    pub fn outbox(&self) -> &[Value] {
        &self.outbox
    }

    pub fn expected(&self) -> &[Value] {
        &self.workload.expected
    }

    pub fn seed(&self) -> u64 {
        self.workload.seed
    }

    pub fn instructions_executed(&self) -> u64 {
        self.instructions_executed
    }

    pub fn commands_used(&self) -> usize {
        self.program.commands_used()
    }

    pub fn stats(&self) -> Stats {
        Stats {
            instructions_executed: self.instructions_executed,
            commands_used: self.program.commands_used(),
        }
    }

    pub fn faults(&self) -> u32 {
        self.faults
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn verdict(&self) -> Verdict {
        Verdict::of(&self.outbox, &self.workload.expected)
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn options(&self) -> RunOptions {
        self.options
    }
}

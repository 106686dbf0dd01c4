use log::{debug, trace, warn};
use rand::{SeedableRng, rngs::StdRng};

use crate::display::DisplayBuffer;
use crate::error::Chip8Error;
use crate::instruction::{Instruction, decode};
use crate::state::{Address, Chip8State, Key, NUM_KEYS, Register, RunState};

/// What a single call to [`Machine::step`] did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Executed(Instruction),
    /// The opcode has no meaning; it was skipped.
    Unknown(u16),
    /// Still blocked on Fx0A, nothing was fetched.
    AwaitingKey,
    /// Fx0A finished: the key was written to its register.
    KeyReceived(Key),
}

/// A self-contained CHIP-8 machine. The host owns it and drives it one instruction at a
/// time, ticking the timers once per frame.
pub struct Machine {
    state: Chip8State,
    rng: StdRng,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine {
    pub fn new() -> Self {
        Machine {
            state: Chip8State::new(),
            rng: StdRng::from_os_rng(),
        }
    }

    /// A machine whose `Cxkk` results are reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Machine {
            state: Chip8State::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Copies `rom` to the program area. Oversized programs are rejected untouched.
    pub fn load(&mut self, rom: &[u8]) -> Result<usize, Chip8Error> {
        let loaded = self.state.memory.load_rom(rom)?;
        debug!("loaded {loaded} byte program");
        Ok(loaded)
    }

    pub fn reset(&mut self) {
        self.state.reset();
        debug!("machine reset");
    }

    /// Executes exactly one instruction, or polls the keypad while Fx0A is pending.
    ///
    /// Stack faults leave PC past the offending opcode; the caller decides whether to go on.
    pub fn step(&mut self) -> Result<Step, Chip8Error> {
        if let RunState::AwaitingKey(reg) = self.state.run_state {
            return Ok(self.poll_key(reg));
        }

        let pc = self.state.pc;
        let raw = self.state.memory.read_word(pc);
        self.state.pc = pc.wrapping_add(2);

        let Some(instruction) = decode(raw) else {
            warn!("unknown opcode {raw:#06X} at {pc:#05X}");
            return Ok(Step::Unknown(raw));
        };
        trace!("{pc:#05X}: {raw:04X} {instruction}");
        instruction.execute(&mut self.state, &mut self.rng)?;
        if let RunState::AwaitingKey(reg) = self.state.run_state {
            debug!("waiting for a key press into {reg:?}");
        }
        Ok(Step::Executed(instruction))
    }

    fn poll_key(&mut self, reg: Register) -> Step {
        match self.state.keypad.first_pressed() {
            Some(key) => {
                self.state.registers.write(reg, key.index());
                self.state.run_state = RunState::Running;
                debug!("{key:?} pressed, resuming");
                Step::KeyReceived(key)
            }
            None => Step::AwaitingKey,
        }
    }

    /// One 60 Hz timer tick.
    pub fn tick_timers(&mut self) {
        self.state.timers.tick();
    }

    pub fn display_snapshot(&self) -> &DisplayBuffer {
        &self.state.display
    }

    /// True once after any change to the display.
    pub fn take_draw_flag(&mut self) -> bool {
        std::mem::take(&mut self.state.draw_flag)
    }

    pub fn set_key(&mut self, key: Key, pressed: bool) {
        self.state.keypad.set_key(key, pressed);
    }

    pub fn set_keys(&mut self, pressed: [bool; NUM_KEYS]) {
        self.state.keypad.set_all(pressed);
    }

    pub fn sound_active(&self) -> bool {
        self.state.timers.sound > 0
    }

    pub fn run_state(&self) -> RunState {
        self.state.run_state
    }

    pub fn register(&self, reg: Register) -> u8 {
        self.state.registers.read(reg)
    }

    pub fn pc(&self) -> Address {
        self.state.pc
    }

    pub fn index(&self) -> Address {
        self.state.index
    }

    pub fn state(&self) -> &Chip8State {
        &self.state
    }

    /// Direct access for debuggers and tests.
    pub fn state_mut(&mut self) -> &mut Chip8State {
        &mut self.state
    }
}

//! A CHIP-8 virtual machine.
//!
//! [`Machine`] owns memory, registers, timers, keypad and display. A host loads a ROM,
//! calls [`Machine::step`] some number of times per frame (or lets a [`Scheduler`] do it),
//! ticks the timers once per frame, then renders [`Machine::display_snapshot`] and beeps
//! while [`Machine::sound_active`] holds.

pub mod display;
pub mod error;
pub mod instruction;
pub mod machine;
pub mod scheduler;
pub mod state;

pub use display::{DISPLAY_HEIGHT, DISPLAY_WIDTH, DisplayBuffer};
pub use error::Chip8Error;
pub use instruction::{Instruction, decode};
pub use machine::{Machine, Step};
pub use scheduler::{FrameReport, Scheduler};
pub use state::{Key, NUM_KEYS, Register, RunState};

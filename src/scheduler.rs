use crate::error::Chip8Error;
use crate::machine::{Machine, Step};

/// Tally of one frame's worth of steps.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub executed: u32,
    pub unknown: u32,
    /// The frame ended early because Fx0A is still waiting for a key.
    pub awaiting_key: bool,
}

/// Runs a fixed number of instructions per frame followed by a single timer tick, so the
/// timers keep 60 Hz pacing however fast the CPU is clocked.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Scheduler {
    instructions_per_frame: u32,
}

impl Scheduler {
    pub fn new(instructions_per_frame: u32) -> Self {
        Scheduler {
            instructions_per_frame: instructions_per_frame.max(1),
        }
    }

    /// Derives the per-frame budget from a target clock; at least one instruction runs.
    pub fn from_rates(instructions_per_second: u64, frame_rate: u64) -> Self {
        let per_frame = instructions_per_second / frame_rate.max(1);
        Self::new(u32::try_from(per_frame).unwrap_or(u32::MAX))
    }

    pub fn instructions_per_frame(&self) -> u32 {
        self.instructions_per_frame
    }

    /// Steps `machine` for one frame and ticks its timers exactly once, even when a fault
    /// ends the frame early.
    pub fn run_frame(&self, machine: &mut Machine) -> Result<FrameReport, Chip8Error> {
        let mut report = FrameReport::default();
        let result = self.run_steps(machine, &mut report);
        machine.tick_timers();
        result.map(|()| report)
    }

    fn run_steps(&self, machine: &mut Machine, report: &mut FrameReport) -> Result<(), Chip8Error> {
        for _ in 0..self.instructions_per_frame {
            match machine.step()? {
                Step::Executed(_) | Step::KeyReceived(_) => report.executed += 1,
                Step::Unknown(_) => report.unknown += 1,
                Step::AwaitingKey => {
                    report.awaiting_key = true;
                    break;
                }
            }
        }
        Ok(())
    }
}

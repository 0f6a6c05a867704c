use crate::{Chip8, Chip8Error, CycleResult, u4};

/// Default interpreter cycle rate in Hz. The host may pick any cadence; the
/// machine itself has no notion of real time.
pub const DEFAULT_CYCLE_HZ: f32 = 500.0;

/// Paces interpreter cycles against host wall-clock time.
///
/// The host feeds in elapsed time; the runner executes however many cycles
/// that covers at the configured rate.
pub struct Runner {
    chip8: Chip8,
    time_step: f32,
    dt_accumulator: f32,
}

impl Runner {
    pub fn new(chip8: Chip8, cycle_hz: f32) -> Self {
        Self {
            chip8,
            time_step: 1.0 / cycle_hz,
            dt_accumulator: 0.0,
        }
    }

    /// Advances the machine by `dt` seconds of host time.
    ///
    /// Stops the batch early once a cycle produces a frame, clearing the
    /// accumulator so the machine does not catch up in a burst afterwards.
    pub fn update(&mut self, dt: f32) -> Result<(), Chip8Error> {
        self.dt_accumulator += dt;

        while self.dt_accumulator >= self.time_step {
            self.dt_accumulator -= self.time_step;

            match self.chip8.cycle()? {
                CycleResult::FrameReady => {
                    self.dt_accumulator = 0.0;
                    break;
                }
                CycleResult::Continue => {}
            }
        }

        Ok(())
    }

    /// Records a key press or release on the hex keypad.
    pub fn set_key(&mut self, key: u4, pressed: bool) {
        self.chip8.set_key(key, pressed)
    }

    /// Returns true while the sound timer is running.
    pub fn should_beep(&self) -> bool {
        self.chip8.should_beep()
    }

    pub fn chip8(&self) -> &Chip8 {
        &self.chip8
    }

    pub fn chip8_mut(&mut self) -> &mut Chip8 {
        &mut self.chip8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// An infinite `jump 0x200` loop; each cycle ticks the timers once.
    const SPIN_ROM: [u8; 2] = [0x12, 0x00];

    fn runner_with(rom: &[u8], cycle_hz: f32) -> Runner {
        let mut chip8 = Chip8::with_seed(0);
        chip8.load(rom).unwrap();
        chip8.set_delay_timer(255);
        Runner::new(chip8, cycle_hz)
    }

    #[test]
    fn update_runs_cycles_to_match_elapsed_time() {
        let mut runner = runner_with(&SPIN_ROM, 10.0);

        runner.update(0.35).unwrap();

        // 0.35s at 10Hz covers three cycles, each ticking the delay timer.
        assert_eq!(runner.chip8().delay_timer(), 252);
    }

    #[test]
    fn update_below_one_time_step_runs_nothing() {
        let mut runner = runner_with(&SPIN_ROM, 10.0);

        runner.update(0.05).unwrap();

        assert_eq!(runner.chip8().delay_timer(), 255);
    }

    #[test]
    fn a_drawn_frame_ends_the_batch() {
        // Draw, then spin. The draw on the first cycle stops the batch even
        // though the elapsed time covers many more cycles.
        let rom = [0xD0, 0x11, 0x12, 0x00];
        let mut runner = runner_with(&rom, 100.0);

        runner.update(1.0).unwrap();

        assert_eq!(runner.chip8().delay_timer(), 254);
    }
}

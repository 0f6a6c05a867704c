use rand::{SeedableRng, rngs::StdRng};

use crate::{
    Chip8Error, CycleResult, FrameBuffer, Opcode, SCREEN_HEIGHT, SCREEN_WIDTH,
    font::{FONT, FONT_START_ADDRESS},
    u4,
};

pub(crate) const ROM_START_ADDRESS: usize = 0x200;
pub(crate) const MEMORY_SIZE: usize = 4096;

/// The complete CHIP-8 machine state.
///
/// One instance per emulated program. The host writes the keypad between
/// cycles and samples the framebuffer after them; everything else is
/// mutated only by the interpreter itself.
pub struct Chip8 {
    /// 4KB memory. 0x000-0x1FF is the reserved interpreter area, the font
    /// lives at 0x050 and the program at 0x200.
    pub(crate) memory: [u8; MEMORY_SIZE],
    /// 64x32 monochrome display buffer.
    pub(crate) framebuffer: FrameBuffer,

    /// Program counter, stepped by 2 at every fetch.
    pub(crate) pc: u16,
    /// Index register, the memory pointer used by sprite/BCD/register-block
    /// instructions.
    pub(crate) i: u16,
    /// General-purpose registers V0-VF. VF doubles as the carry, borrow and
    /// collision flag.
    pub(crate) v: [u8; 16],
    /// Subroutine call stack. The original machine had 16 slots with an
    /// unchecked stack pointer; here depth is unbounded and underflow is a
    /// reported error.
    pub(crate) stack: Vec<u16>,

    /// Decremented once per cycle while nonzero.
    pub(crate) delay_timer: u8,
    /// Decremented once per cycle while nonzero; audible while nonzero.
    pub(crate) sound_timer: u8,

    /// Keypad snapshot, one flag per hex key 0x0-0xF. Written by the host,
    /// read-only to the interpreter.
    pub(crate) keypad: [bool; 16],

    /// Random byte source for Cxkk, owned by the machine so runs can be
    /// made deterministic with [`Chip8::with_seed`].
    pub(crate) rng: StdRng,
}

impl Chip8 {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// A machine whose Cxkk instruction draws from a seeded generator,
    /// for reproducible runs and tests.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        let mut memory = [0; MEMORY_SIZE];
        memory[FONT_START_ADDRESS..FONT_START_ADDRESS + FONT.len()].copy_from_slice(&FONT);

        Chip8 {
            memory,
            framebuffer: [[false; SCREEN_WIDTH]; SCREEN_HEIGHT],
            pc: ROM_START_ADDRESS as u16,
            i: 0,
            v: [0; 16],
            stack: Vec::new(),
            delay_timer: 0,
            sound_timer: 0,
            keypad: [false; 16],
            rng,
        }
    }

    /// Copies a ROM into memory at 0x200 and rewinds the program counter.
    ///
    /// A ROM larger than the 3584 available bytes is rejected rather than
    /// silently truncated.
    pub fn load(&mut self, rom: &[u8]) -> Result<(), Chip8Error> {
        let rom_end = ROM_START_ADDRESS + rom.len();
        self.memory
            .get_mut(ROM_START_ADDRESS..rom_end)
            .ok_or(Chip8Error::RomTooLarge {
                size: rom.len(),
                max_size: MEMORY_SIZE - ROM_START_ADDRESS,
            })?
            .copy_from_slice(rom);

        self.pc = ROM_START_ADDRESS as u16;

        Ok(())
    }

    /// Runs one interpreter cycle: fetch, decode, execute, then tick both
    /// timers down by one if nonzero.
    pub fn cycle(&mut self) -> Result<CycleResult, Chip8Error> {
        let word = self.fetch()?;
        let opcode = Opcode::decode(word);
        let result = self.execute(opcode)?;
        self.tick_timers();

        Ok(result)
    }

    /// Returns true while the sound timer is running, i.e. while a host
    /// that plays audio should beep.
    pub fn should_beep(&self) -> bool {
        self.sound_timer > 0
    }

    /// Records a key press or release on the hex keypad.
    pub fn set_key(&mut self, key: u4, pressed: bool) {
        self.keypad[key] = pressed;
    }

    /// The display for the rendering host to sample after a cycle.
    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.framebuffer
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn set_delay_timer(&mut self, value: u8) {
        self.delay_timer = value;
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    pub fn set_sound_timer(&mut self, value: u8) {
        self.sound_timer = value;
    }

    /// Fetches the instruction word at the program counter (high byte
    /// first) and advances the counter past it.
    fn fetch(&mut self) -> Result<u16, Chip8Error> {
        let high = *self.mem_get(self.pc)?;
        let low = *self.mem_get(self.pc.wrapping_add(1))?;
        self.pc = self.pc.wrapping_add(2);

        Ok(u16::from_be_bytes([high, low]))
    }

    fn tick_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    /// Bounds-checked access to a memory cell.
    pub(crate) fn mem_get(&mut self, addr: u16) -> Result<&mut u8, Chip8Error> {
        self.memory
            .get_mut(addr as usize)
            .ok_or(Chip8Error::MemoryOutOfBounds { address: addr })
    }
}

impl Default for Chip8 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_on_state() {
        let chip = Chip8::with_seed(0);

        assert_eq!(chip.pc, 0x200);
        assert_eq!(chip.i, 0);
        assert_eq!(chip.v, [0; 16]);
        assert!(chip.stack.is_empty());
        assert_eq!(chip.delay_timer, 0);
        assert_eq!(chip.sound_timer, 0);
        assert!(chip.framebuffer.iter().flatten().all(|&px| !px));
    }

    #[test]
    fn font_is_loaded_at_construction() {
        let chip = Chip8::with_seed(0);

        // First byte of glyph 0 and last byte of glyph F.
        assert_eq!(chip.memory[0x50], 0xF0);
        assert_eq!(chip.memory[0x9F], 0x80);
        assert_eq!(&chip.memory[0x50..0xA0], &FONT);
    }

    #[test]
    fn load_copies_rom_to_0x200() {
        let mut chip = Chip8::with_seed(0);
        chip.load(&[0x12, 0x34, 0x56]).unwrap();

        assert_eq!(&chip.memory[0x200..0x203], &[0x12, 0x34, 0x56]);
        assert_eq!(chip.pc, 0x200);
    }

    #[test]
    fn load_rejects_oversized_rom() {
        let mut chip = Chip8::with_seed(0);
        let rom = vec![0; MEMORY_SIZE - ROM_START_ADDRESS + 1];

        assert!(matches!(
            chip.load(&rom),
            Err(Chip8Error::RomTooLarge { size: 3585, .. })
        ));
    }

    #[test]
    fn fetch_is_big_endian_and_advances_pc() {
        let mut chip = Chip8::with_seed(0);
        chip.load(&[0xA1, 0x23]).unwrap();
        chip.cycle().unwrap();

        assert_eq!(chip.i, 0x123);
        assert_eq!(chip.pc, 0x202);
    }

    #[test]
    fn fetch_past_memory_end_errors() {
        let mut chip = Chip8::with_seed(0);
        chip.pc = MEMORY_SIZE as u16;

        assert!(matches!(
            chip.cycle(),
            Err(Chip8Error::MemoryOutOfBounds { address: 4096 })
        ));
    }

    #[test]
    fn timers_count_down_and_hold_at_zero() {
        let mut chip = Chip8::with_seed(0);
        // Zeroed memory decodes to 0x0000 (clear screen), a harmless cycle.
        chip.set_delay_timer(5);
        chip.set_sound_timer(3);

        for _ in 0..1000 {
            chip.cycle().unwrap();
        }

        assert_eq!(chip.delay_timer(), 0);
        assert_eq!(chip.sound_timer(), 0);
    }

    #[test]
    fn beeps_only_while_sound_timer_runs() {
        let mut chip = Chip8::with_seed(0);
        assert!(!chip.should_beep());

        chip.set_sound_timer(2);
        assert!(chip.should_beep());

        chip.cycle().unwrap();
        assert!(chip.should_beep());

        chip.cycle().unwrap();
        assert!(!chip.should_beep());
    }

    #[test]
    fn set_key_updates_the_keypad() {
        let mut chip = Chip8::with_seed(0);

        chip.set_key(u4::new(0xB), true);
        assert!(chip.keypad[0xB]);

        chip.set_key(u4::new(0xB), false);
        assert!(!chip.keypad[0xB]);
    }
}

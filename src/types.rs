pub const SCREEN_WIDTH: usize = 64;
pub const SCREEN_HEIGHT: usize = 32;

/// The 64x32 monochrome display, one flag per pixel (true = lit).
pub type FrameBuffer = [[bool; SCREEN_WIDTH]; SCREEN_HEIGHT];

/// Outcome of a single interpreter cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleResult {
    /// The machine is ready for the next cycle.
    Continue,
    /// The cycle produced visible output (a draw) or is polling for input,
    /// so the host should render a frame before running more cycles.
    FrameReady,
}

/// Errors surfaced by the interpreter.
///
/// Malformed opcodes are deliberately absent: unmapped encodings execute as
/// no-ops instead of failing, so a ROM full of garbage bytes still runs.
#[derive(Debug, thiserror::Error)]
pub enum Chip8Error {
    #[error("ROM is too large ({size} bytes), max size is {max_size} bytes")]
    RomTooLarge { size: usize, max_size: usize },

    #[error("memory access out of bounds at address {address:#06X}")]
    MemoryOutOfBounds { address: u16 },

    #[error("attempted to return from a subroutine with an empty call stack")]
    StackUnderflow,
}

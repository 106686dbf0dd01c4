use crate::display::{DisplayBuffer, FontSprite};
use crate::error::Chip8Error;

pub type Timer = u8;
pub type Address = u16;

pub const MEM_SIZE: usize = 4096;
pub const ADDRESS_MASK: Address = 0x0FFF;
pub const FONT_ADDR: Address = 0x000;
pub const PC_START_ADDR: Address = 0x200;
pub const MAX_PROGRAM_SIZE: usize = MEM_SIZE - PC_START_ADDR as usize;
pub const NUM_REGISTERS: usize = 16;
pub const STACK_DEPTH: usize = 16;
pub const NUM_KEYS: usize = 16;
pub const DEFAULT_FRAME_RATE: u64 = 60;
pub const DEFAULT_INSTRUCTIONS_PER_SECOND: u64 = 700;

/// The 4 KiB address space. Addresses wrap at 12 bits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Memory {
    data: [u8; MEM_SIZE],
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory {
    pub fn new() -> Self {
        let mut memory = Memory {
            data: [0; MEM_SIZE],
        };
        memory.load_font();
        memory
    }

    fn load_font(&mut self) {
        for (digit, sprite) in FontSprite::ALL.iter().enumerate() {
            let start = usize::from(FONT_ADDR) + digit * FontSprite::HEIGHT;
            self.data[start..start + FontSprite::HEIGHT].copy_from_slice(sprite.as_bytes());
        }
    }

    /// Zeroes everything and writes the font set back.
    pub fn clear(&mut self) {
        self.data.fill(0);
        self.load_font();
    }

    pub fn read(&self, addr: Address) -> u8 {
        self.data[usize::from(addr & ADDRESS_MASK)]
    }

    pub fn write(&mut self, addr: Address, value: u8) {
        self.data[usize::from(addr & ADDRESS_MASK)] = value;
    }

    /// Big-endian 16-bit word at `addr`.
    pub fn read_word(&self, addr: Address) -> u16 {
        u16::from_be_bytes([self.read(addr), self.read(addr.wrapping_add(1))])
    }

    pub fn load_rom(&mut self, rom: &[u8]) -> Result<usize, Chip8Error> {
        if rom.len() > MAX_PROGRAM_SIZE {
            return Err(Chip8Error::ProgramTooLarge {
                size: rom.len(),
                max: MAX_PROGRAM_SIZE,
            });
        }
        let start = usize::from(PC_START_ADDR);
        self.data[start..start + rom.len()].copy_from_slice(rom);
        Ok(rom.len())
    }

    pub fn read_sprite(&self, index: Address, rows: u8) -> impl Iterator<Item = u8> + '_ {
        (0..Address::from(rows)).map(move |row| self.read(index.wrapping_add(row)))
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Register {
    V0,
    V1,
    V2,
    V3,
    V4,
    V5,
    V6,
    V7,
    V8,
    V9,
    VA,
    VB,
    VC,
    VD,
    VE,
    VF,
}

impl Register {
    pub const ALL: [Register; NUM_REGISTERS] = [
        Register::V0,
        Register::V1,
        Register::V2,
        Register::V3,
        Register::V4,
        Register::V5,
        Register::V6,
        Register::V7,
        Register::V8,
        Register::V9,
        Register::VA,
        Register::VB,
        Register::VC,
        Register::VD,
        Register::VE,
        Register::VF,
    ];

    /// Register named by the low nibble of `value`.
    pub fn from_nibble(value: u8) -> Self {
        Self::ALL[usize::from(value & 0x0F)]
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegisterBank {
    registers: [u8; NUM_REGISTERS],
}

impl RegisterBank {
    pub fn new() -> Self {
        RegisterBank {
            registers: [0; NUM_REGISTERS],
        }
    }

    pub fn read(&self, reg: Register) -> u8 {
        self.registers[reg.index()]
    }

    pub fn write(&mut self, reg: Register, value: u8) {
        self.registers[reg.index()] = value;
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.registers
    }
}

/// Fixed-depth return address stack. `sp` counts the occupied levels.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallStack {
    frames: [Address; STACK_DEPTH],
    sp: usize,
}

impl CallStack {
    pub fn new() -> Self {
        CallStack {
            frames: [0; STACK_DEPTH],
            sp: 0,
        }
    }

    pub fn sp(&self) -> usize {
        self.sp
    }

    pub fn is_empty(&self) -> bool {
        self.sp == 0
    }

    /// Occupied levels, oldest first.
    pub fn frames(&self) -> &[Address] {
        &self.frames[..self.sp]
    }

    /// Returns false, leaving the stack untouched, when every level is in use.
    pub fn push(&mut self, addr: Address) -> bool {
        if self.sp == STACK_DEPTH {
            return false;
        }
        self.frames[self.sp] = addr;
        self.sp += 1;
        true
    }

    pub fn pop(&mut self) -> Option<Address> {
        if self.sp == 0 {
            return None;
        }
        self.sp -= 1;
        Some(self.frames[self.sp])
    }
}

/// Delay and sound countdowns, both driven at 60 Hz by the host.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Timers {
    pub delay: Timer,
    pub sound: Timer,
}

impl Timers {
    pub fn tick(&mut self) {
        self.delay = self.delay.saturating_sub(1);
        self.sound = self.sound.saturating_sub(1);
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Key {
    Key0,
    Key1,
    Key2,
    Key3,
    Key4,
    Key5,
    Key6,
    Key7,
    Key8,
    Key9,
    KeyA,
    KeyB,
    KeyC,
    KeyD,
    KeyE,
    KeyF,
}

impl Key {
    pub const ALL: [Key; NUM_KEYS] = [
        Key::Key0,
        Key::Key1,
        Key::Key2,
        Key::Key3,
        Key::Key4,
        Key::Key5,
        Key::Key6,
        Key::Key7,
        Key::Key8,
        Key::Key9,
        Key::KeyA,
        Key::KeyB,
        Key::KeyC,
        Key::KeyD,
        Key::KeyE,
        Key::KeyF,
    ];

    pub fn from_index(index: u8) -> Result<Key, Chip8Error> {
        Self::ALL
            .get(usize::from(index))
            .copied()
            .ok_or(Chip8Error::InvalidKey(index))
    }

    /// Key named by the low nibble of `value`, as Ex9E/ExA1 read it out of a register.
    pub fn from_nibble(value: u8) -> Key {
        Self::ALL[usize::from(value & 0x0F)]
    }

    pub fn index(self) -> u8 {
        self as u8
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Keypad {
    pressed: [bool; NUM_KEYS],
}

impl Keypad {
    pub fn new() -> Self {
        Keypad {
            pressed: [false; NUM_KEYS],
        }
    }

    pub fn set_key(&mut self, key: Key, pressed: bool) {
        self.pressed[usize::from(key.index())] = pressed;
    }

    pub fn set_all(&mut self, pressed: [bool; NUM_KEYS]) {
        self.pressed = pressed;
    }

    pub fn is_key_pressed(&self, key: Key) -> bool {
        self.pressed[usize::from(key.index())]
    }

    /// Lowest-numbered key currently held down.
    pub fn first_pressed(&self) -> Option<Key> {
        Key::ALL.into_iter().find(|&key| self.is_key_pressed(key))
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum RunState {
    #[default]
    Running,
    /// Fx0A is blocked until a key is down; the key index goes into the register.
    AwaitingKey(Register),
}

/// Everything the interpreter can observe or mutate.
#[derive(Clone, Debug, PartialEq)]
pub struct Chip8State {
    pub memory: Memory,
    pub registers: RegisterBank,
    pub pc: Address,
    pub index: Address,
    pub stack: CallStack,
    pub timers: Timers,
    pub display: DisplayBuffer,
    pub keypad: Keypad,
    pub run_state: RunState,
    /// Set whenever the display changes, cleared by the host once it has redrawn.
    pub draw_flag: bool,
}

impl Default for Chip8State {
    fn default() -> Self {
        Self::new()
    }
}

impl Chip8State {
    pub fn new() -> Self {
        Chip8State {
            memory: Memory::new(),
            registers: RegisterBank::new(),
            pc: PC_START_ADDR,
            index: 0,
            stack: CallStack::new(),
            timers: Timers::default(),
            display: DisplayBuffer::new(),
            keypad: Keypad::new(),
            run_state: RunState::Running,
            draw_flag: false,
        }
    }

    pub fn reset(&mut self) {
        self.memory.clear();
        self.registers = RegisterBank::new();
        self.pc = PC_START_ADDR;
        self.index = 0;
        self.stack = CallStack::new();
        self.timers = Timers::default();
        self.display.clear();
        self.keypad = Keypad::new();
        self.run_state = RunState::Running;
        self.draw_flag = false;
    }

    pub fn clear_display(&mut self) {
        self.display.clear();
        self.draw_flag = true;
    }

    /// Draws the `rows`-byte sprite at I onto the display and sets VF on collision.
    pub fn draw_sprite(&mut self, x: u8, y: u8, rows: u8) {
        self.registers.write(Register::VF, 0);
        let sprite = self.memory.read_sprite(self.index, rows);
        let collision = self.display.draw_sprite(x, y, sprite);
        self.registers.write(Register::VF, u8::from(collision));
        self.draw_flag = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_at_bottom_of_memory() {
        let memory = Memory::new();
        assert_eq!(&memory.as_slice()[..5], FontSprite::ZERO.as_bytes());
        assert_eq!(&memory.as_slice()[0x4B..0x50], FontSprite::F.as_bytes());
        assert!(memory.as_slice()[0x50..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_load_rom_reports_length() {
        let mut memory = Memory::new();
        assert_eq!(memory.load_rom(&[0x12, 0x34, 0x56]), Ok(3));
        assert_eq!(memory.read_word(0x200), 0x1234);
        assert_eq!(memory.read(0x202), 0x56);
    }

    #[test]
    fn test_load_rom_accepts_full_program_space() {
        let mut memory = Memory::new();
        let rom = vec![0xAB; MAX_PROGRAM_SIZE];
        assert_eq!(memory.load_rom(&rom), Ok(3584));
        assert_eq!(memory.read(0xFFF), 0xAB);
    }

    #[test]
    fn test_load_rom_too_large_writes_nothing() {
        let mut memory = Memory::new();
        let rom = vec![0xAB; MAX_PROGRAM_SIZE + 1];
        assert_eq!(
            memory.load_rom(&rom),
            Err(Chip8Error::ProgramTooLarge {
                size: 3585,
                max: 3584
            })
        );
        assert_eq!(memory, Memory::new());
    }

    #[test]
    fn test_addresses_wrap_at_12_bits() {
        let mut memory = Memory::new();
        memory.write(0x1200, 0x42);
        assert_eq!(memory.read(0x200), 0x42);
        memory.write(0xFFF, 0x12);
        memory.write(0x000, 0x34);
        assert_eq!(memory.read_word(0xFFF), 0x1234);
    }

    #[test]
    fn test_clear_restores_font() {
        let mut memory = Memory::new();
        memory.write(0x000, 0xFF);
        memory.write(0x300, 0xFF);
        memory.clear();
        assert_eq!(memory, Memory::new());
    }

    #[test]
    fn test_call_stack_limits() {
        let mut stack = CallStack::new();
        assert_eq!(stack.pop(), None);
        for level in 0..STACK_DEPTH {
            assert!(stack.push(0x200 + 2 * level as Address));
        }
        assert!(!stack.push(0x400));
        assert_eq!(stack.sp(), STACK_DEPTH);
        assert_eq!(stack.pop(), Some(0x21E));
        assert_eq!(stack.sp(), STACK_DEPTH - 1);
    }

    #[test]
    fn test_timers_floor_at_zero() {
        let mut timers = Timers { delay: 1, sound: 0 };
        timers.tick();
        timers.tick();
        assert_eq!(timers, Timers::default());
    }

    #[test]
    fn test_keypad_first_pressed() {
        let mut keypad = Keypad::new();
        assert_eq!(keypad.first_pressed(), None);
        keypad.set_key(Key::KeyB, true);
        keypad.set_key(Key::Key7, true);
        assert_eq!(keypad.first_pressed(), Some(Key::Key7));
        keypad.set_all([false; NUM_KEYS]);
        assert!(!keypad.is_key_pressed(Key::KeyB));
    }

    #[test]
    fn test_key_from_index() {
        assert_eq!(Key::from_index(0xC), Ok(Key::KeyC));
        assert_eq!(Key::from_index(16), Err(Chip8Error::InvalidKey(16)));
        assert_eq!(Key::from_nibble(0x1C), Key::KeyC);
    }

    #[test]
    fn test_reset_matches_new() {
        let mut state = Chip8State::new();
        state.memory.load_rom(&[0xFF; 16]).unwrap();
        state.registers.write(Register::V4, 9);
        state.pc = 0x234;
        state.index = 0x456;
        state.stack.push(0x202);
        state.timers.delay = 3;
        state.keypad.set_key(Key::Key1, true);
        state.draw_sprite(0, 0, 5);
        state.run_state = RunState::AwaitingKey(Register::V2);
        state.reset();
        assert_eq!(state, Chip8State::new());
    }
}

use std::fmt;

use rand::Rng;

use crate::display::FontSprite;
use crate::error::Chip8Error;
use crate::state::{ADDRESS_MASK, Address, Chip8State, FONT_ADDR, Key, Register, RunState};

/// A decoded CHIP-8 instruction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0
    ClearScreen,
    /// 00EE
    SubroutineReturn,
    /// 1nnn
    Jump(Address),
    /// 2nnn
    SubroutineCall(Address),
    /// 3xkk
    SkipEqImmediate(Register, u8),
    /// 4xkk
    SkipNeqImmediate(Register, u8),
    /// 5xy0
    SkipEqRegister(Register, Register),
    /// 6xkk
    SetImmediate(Register, u8),
    /// 7xkk
    AddImmediate(Register, u8),
    /// 8xy0
    SetXToY(Register, Register),
    /// 8xy1
    BinaryOr(Register, Register),
    /// 8xy2
    BinaryAnd(Register, Register),
    /// 8xy3
    BinaryXor(Register, Register),
    /// 8xy4
    AddRegisters(Register, Register),
    /// 8xy5
    SubtractYFromX(Register, Register),
    /// 8xy6
    RightShift(Register),
    /// 8xy7
    SubtractXFromY(Register, Register),
    /// 8xyE
    LeftShift(Register),
    /// 9xy0
    SkipNeqRegister(Register, Register),
    /// Annn
    SetIndex(Address),
    /// Bnnn
    JumpWithOffset(Address),
    /// Cxkk
    Random(Register, u8),
    /// Dxyn
    Draw(Register, Register, u8),
    /// Ex9E
    SkipIfKeyPressed(Register),
    /// ExA1
    SkipIfKeyNotPressed(Register),
    /// Fx07
    ReadDelayTimer(Register),
    /// Fx0A
    WaitForKey(Register),
    /// Fx15
    SetDelayTimer(Register),
    /// Fx18
    SetSoundTimer(Register),
    /// Fx1E
    AddToIndex(Register),
    /// Fx29
    FontChar(Register),
    /// Fx33
    BinaryCodedDecimal(Register),
    /// Fx55
    Store(Register),
    /// Fx65
    Load(Register),
}

struct DecodedInstruction {
    /// First nibble. Selects the instruction family.
    opcode: u8,
    /// Second nibble. Used to look up one of the 16 registers.
    x: Register,
    /// Third nibble. Used to look up one of the 16 registers.
    y: Register,
    /// Fourth nibble. A 4-bit number.
    n: u8,
    /// The second byte (third and fourth nibbles). An 8-bit immediate number.
    nn: u8,
    /// The second, third, and fourth nibbles. A 12-bit immediate address.
    nnn: Address,
}

impl DecodedInstruction {
    fn new(raw: u16) -> Self {
        DecodedInstruction {
            opcode: (raw >> 12) as u8,
            x: Register::from_nibble((raw >> 8) as u8),
            y: Register::from_nibble((raw >> 4) as u8),
            n: (raw & 0x0F) as u8,
            nn: (raw & 0x00FF) as u8,
            nnn: raw & 0x0FFF,
        }
    }
}

/// Maps a raw opcode onto its instruction, or `None` if nothing is assigned to it.
pub fn decode(raw: u16) -> Option<Instruction> {
    use Instruction::*;

    let d = DecodedInstruction::new(raw);
    let instruction = match (d.opcode, d.n, d.nn) {
        (0x0, _, _) if d.nnn == 0x0E0 => ClearScreen,
        (0x0, _, _) if d.nnn == 0x0EE => SubroutineReturn,
        (0x1, _, _) => Jump(d.nnn),
        (0x2, _, _) => SubroutineCall(d.nnn),
        (0x3, _, _) => SkipEqImmediate(d.x, d.nn),
        (0x4, _, _) => SkipNeqImmediate(d.x, d.nn),
        (0x5, 0x0, _) => SkipEqRegister(d.x, d.y),
        (0x6, _, _) => SetImmediate(d.x, d.nn),
        (0x7, _, _) => AddImmediate(d.x, d.nn),
        (0x8, 0x0, _) => SetXToY(d.x, d.y),
        (0x8, 0x1, _) => BinaryOr(d.x, d.y),
        (0x8, 0x2, _) => BinaryAnd(d.x, d.y),
        (0x8, 0x3, _) => BinaryXor(d.x, d.y),
        (0x8, 0x4, _) => AddRegisters(d.x, d.y),
        (0x8, 0x5, _) => SubtractYFromX(d.x, d.y),
        (0x8, 0x6, _) => RightShift(d.x),
        (0x8, 0x7, _) => SubtractXFromY(d.x, d.y),
        (0x8, 0xE, _) => LeftShift(d.x),
        (0x9, 0x0, _) => SkipNeqRegister(d.x, d.y),
        (0xA, _, _) => SetIndex(d.nnn),
        (0xB, _, _) => JumpWithOffset(d.nnn),
        (0xC, _, _) => Random(d.x, d.nn),
        (0xD, _, _) => Draw(d.x, d.y, d.n),
        (0xE, _, 0x9E) => SkipIfKeyPressed(d.x),
        (0xE, _, 0xA1) => SkipIfKeyNotPressed(d.x),
        (0xF, _, 0x07) => ReadDelayTimer(d.x),
        (0xF, _, 0x0A) => WaitForKey(d.x),
        (0xF, _, 0x15) => SetDelayTimer(d.x),
        (0xF, _, 0x18) => SetSoundTimer(d.x),
        (0xF, _, 0x1E) => AddToIndex(d.x),
        (0xF, _, 0x29) => FontChar(d.x),
        (0xF, _, 0x33) => BinaryCodedDecimal(d.x),
        (0xF, _, 0x55) => Store(d.x),
        (0xF, _, 0x65) => Load(d.x),
        _ => return None,
    };
    Some(instruction)
}

impl Instruction {
    /// Applies the instruction to `state`. PC must already point past the opcode.
    pub fn execute<R: Rng>(
        self,
        state: &mut Chip8State,
        rng: &mut R,
    ) -> Result<(), Chip8Error> {
        use Instruction::*;

        let regs = &mut state.registers;
        match self {
            ClearScreen => state.clear_display(),
            SubroutineReturn => {
                state.pc = state.stack.pop().ok_or(Chip8Error::StackUnderflow {
                    pc: state.pc.wrapping_sub(2),
                })?;
            }
            Jump(addr) => state.pc = addr,
            SubroutineCall(addr) => {
                if !state.stack.push(state.pc) {
                    return Err(Chip8Error::StackOverflow {
                        pc: state.pc.wrapping_sub(2),
                    });
                }
                state.pc = addr;
            }
            SkipEqImmediate(x, kk) => skip_if(&mut state.pc, regs.read(x) == kk),
            SkipNeqImmediate(x, kk) => skip_if(&mut state.pc, regs.read(x) != kk),
            SkipEqRegister(x, y) => skip_if(&mut state.pc, regs.read(x) == regs.read(y)),
            SkipNeqRegister(x, y) => skip_if(&mut state.pc, regs.read(x) != regs.read(y)),
            SetImmediate(x, kk) => regs.write(x, kk),
            AddImmediate(x, kk) => regs.write(x, regs.read(x).wrapping_add(kk)),
            SetXToY(x, y) => regs.write(x, regs.read(y)),
            BinaryOr(x, y) => regs.write(x, regs.read(x) | regs.read(y)),
            BinaryAnd(x, y) => regs.write(x, regs.read(x) & regs.read(y)),
            BinaryXor(x, y) => regs.write(x, regs.read(x) ^ regs.read(y)),
            AddRegisters(x, y) => {
                let (sum, carry) = regs.read(x).overflowing_add(regs.read(y));
                regs.write(x, sum);
                regs.write(Register::VF, u8::from(carry));
            }
            SubtractYFromX(x, y) => {
                let (value_x, value_y) = (regs.read(x), regs.read(y));
                regs.write(x, value_x.wrapping_sub(value_y));
                regs.write(Register::VF, u8::from(value_x >= value_y)); // 1 when no borrow
            }
            SubtractXFromY(x, y) => {
                let (value_x, value_y) = (regs.read(x), regs.read(y));
                regs.write(x, value_y.wrapping_sub(value_x));
                regs.write(Register::VF, u8::from(value_y >= value_x));
            }
            RightShift(x) => {
                let value_x = regs.read(x);
                regs.write(x, value_x >> 1);
                regs.write(Register::VF, value_x & 0x01);
            }
            LeftShift(x) => {
                let value_x = regs.read(x);
                regs.write(x, value_x << 1);
                regs.write(Register::VF, value_x >> 7);
            }
            SetIndex(addr) => state.index = addr,
            JumpWithOffset(addr) => {
                state.pc = addr.wrapping_add(Address::from(regs.read(Register::V0)));
            }
            Random(x, kk) => regs.write(x, rng.random::<u8>() & kk),
            Draw(x, y, n) => {
                let (value_x, value_y) = (regs.read(x), regs.read(y));
                state.draw_sprite(value_x, value_y, n);
            }
            SkipIfKeyPressed(x) => {
                let key = Key::from_nibble(regs.read(x));
                skip_if(&mut state.pc, state.keypad.is_key_pressed(key));
            }
            SkipIfKeyNotPressed(x) => {
                let key = Key::from_nibble(regs.read(x));
                skip_if(&mut state.pc, !state.keypad.is_key_pressed(key));
            }
            ReadDelayTimer(x) => regs.write(x, state.timers.delay),
            WaitForKey(x) => state.run_state = RunState::AwaitingKey(x),
            SetDelayTimer(x) => state.timers.delay = regs.read(x),
            SetSoundTimer(x) => state.timers.sound = regs.read(x),
            AddToIndex(x) => {
                let offset = Address::from(regs.read(x));
                state.index = state.index.wrapping_add(offset) & ADDRESS_MASK;
            }
            FontChar(x) => {
                let digit = Address::from(regs.read(x));
                state.index = FONT_ADDR + digit * FontSprite::HEIGHT as Address;
            }
            BinaryCodedDecimal(x) => {
                let value_x = regs.read(x);
                let bcd = [value_x / 100, (value_x / 10) % 10, value_x % 10];
                for (offset, digit) in (0..).zip(bcd) {
                    state.memory.write(state.index.wrapping_add(offset), digit);
                }
            }
            Store(x) => {
                for (offset, reg) in (0..).zip(&Register::ALL[..=x.index()]) {
                    state
                        .memory
                        .write(state.index.wrapping_add(offset), regs.read(*reg));
                }
            }
            Load(x) => {
                for (offset, reg) in (0..).zip(&Register::ALL[..=x.index()]) {
                    regs.write(*reg, state.memory.read(state.index.wrapping_add(offset)));
                }
            }
        }
        Ok(())
    }
}

fn skip_if(pc: &mut Address, condition: bool) {
    if condition {
        *pc = pc.wrapping_add(2);
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;

        match *self {
            ClearScreen => write!(f, "CLS"),
            SubroutineReturn => write!(f, "RET"),
            Jump(addr) => write!(f, "JP {addr:#05X}"),
            SubroutineCall(addr) => write!(f, "CALL {addr:#05X}"),
            SkipEqImmediate(x, kk) => write!(f, "SE {x:?}, {kk:#04X}"),
            SkipNeqImmediate(x, kk) => write!(f, "SNE {x:?}, {kk:#04X}"),
            SkipEqRegister(x, y) => write!(f, "SE {x:?}, {y:?}"),
            SetImmediate(x, kk) => write!(f, "LD {x:?}, {kk:#04X}"),
            AddImmediate(x, kk) => write!(f, "ADD {x:?}, {kk:#04X}"),
            SetXToY(x, y) => write!(f, "LD {x:?}, {y:?}"),
            BinaryOr(x, y) => write!(f, "OR {x:?}, {y:?}"),
            BinaryAnd(x, y) => write!(f, "AND {x:?}, {y:?}"),
            BinaryXor(x, y) => write!(f, "XOR {x:?}, {y:?}"),
            AddRegisters(x, y) => write!(f, "ADD {x:?}, {y:?}"),
            SubtractYFromX(x, y) => write!(f, "SUB {x:?}, {y:?}"),
            RightShift(x) => write!(f, "SHR {x:?}"),
            SubtractXFromY(x, y) => write!(f, "SUBN {x:?}, {y:?}"),
            LeftShift(x) => write!(f, "SHL {x:?}"),
            SkipNeqRegister(x, y) => write!(f, "SNE {x:?}, {y:?}"),
            SetIndex(addr) => write!(f, "LD I, {addr:#05X}"),
            JumpWithOffset(addr) => write!(f, "JP V0, {addr:#05X}"),
            Random(x, kk) => write!(f, "RND {x:?}, {kk:#04X}"),
            Draw(x, y, n) => write!(f, "DRW {x:?}, {y:?}, {n}"),
            SkipIfKeyPressed(x) => write!(f, "SKP {x:?}"),
            SkipIfKeyNotPressed(x) => write!(f, "SKNP {x:?}"),
            ReadDelayTimer(x) => write!(f, "LD {x:?}, DT"),
            WaitForKey(x) => write!(f, "LD {x:?}, K"),
            SetDelayTimer(x) => write!(f, "LD DT, {x:?}"),
            SetSoundTimer(x) => write!(f, "LD ST, {x:?}"),
            AddToIndex(x) => write!(f, "ADD I, {x:?}"),
            FontChar(x) => write!(f, "LD F, {x:?}"),
            BinaryCodedDecimal(x) => write!(f, "LD B, {x:?}"),
            Store(x) => write!(f, "LD [I], {x:?}"),
            Load(x) => write!(f, "LD {x:?}, [I]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::state::{Key, PC_START_ADDR};
    use crate::state::Register::*;

    fn run(state: &mut Chip8State, raw: u16) -> Result<(), Chip8Error> {
        let mut rng = StdRng::seed_from_u64(8);
        state.pc += 2;
        decode(raw)
            .expect("opcode should decode")
            .execute(state, &mut rng)
    }

    #[test]
    fn test_decode_families() {
        let cases = [
            (0x00E0, Instruction::ClearScreen),
            (0x00EE, Instruction::SubroutineReturn),
            (0x1234, Instruction::Jump(0x234)),
            (0x2456, Instruction::SubroutineCall(0x456)),
            (0x342A, Instruction::SkipEqImmediate(V4, 0x2A)),
            (0x4A75, Instruction::SkipNeqImmediate(VA, 0x75)),
            (0x5AE0, Instruction::SkipEqRegister(VA, VE)),
            (0x63F5, Instruction::SetImmediate(V3, 0xF5)),
            (0x7B12, Instruction::AddImmediate(VB, 0x12)),
            (0x8590, Instruction::SetXToY(V5, V9)),
            (0x8264, Instruction::AddRegisters(V2, V6)),
            (0x8C45, Instruction::SubtractYFromX(VC, V4)),
            (0x8106, Instruction::RightShift(V1)),
            (0x86D7, Instruction::SubtractXFromY(V6, VD)),
            (0x8E0E, Instruction::LeftShift(VE)),
            (0x9990, Instruction::SkipNeqRegister(V9, V9)),
            (0xA568, Instruction::SetIndex(0x568)),
            (0xBABC, Instruction::JumpWithOffset(0xABC)),
            (0xC10F, Instruction::Random(V1, 0x0F)),
            (0xD3D2, Instruction::Draw(V3, VD, 2)),
            (0xE39E, Instruction::SkipIfKeyPressed(V3)),
            (0xE4A1, Instruction::SkipIfKeyNotPressed(V4)),
            (0xF50A, Instruction::WaitForKey(V5)),
            (0xF633, Instruction::BinaryCodedDecimal(V6)),
            (0xFF65, Instruction::Load(VF)),
        ];
        for (raw, expected) in cases {
            assert_eq!(decode(raw), Some(expected), "{raw:#06X}");
        }
    }

    #[test]
    fn test_decode_unassigned() {
        for raw in [0x0123, 0x5121, 0x8008, 0x9ABF, 0xE0FF, 0xF0FF] {
            assert_eq!(decode(raw), None, "{raw:#06X}");
        }
    }

    #[test]
    fn test_mnemonics() {
        assert_eq!(decode(0x7B12).unwrap().to_string(), "ADD VB, 0x12");
        assert_eq!(decode(0xD3D2).unwrap().to_string(), "DRW V3, VD, 2");
        assert_eq!(decode(0x2456).unwrap().to_string(), "CALL 0x456");
    }

    #[test]
    fn test_return_pops_stack() {
        let mut state = Chip8State::new();
        state.stack.push(0x30);
        run(&mut state, 0x00EE).unwrap();
        assert_eq!(state.pc, 0x30);
        assert_eq!(state.stack.sp(), 0);
    }

    #[test]
    fn test_return_underflow() {
        let mut state = Chip8State::new();
        assert_eq!(
            run(&mut state, 0x00EE),
            Err(Chip8Error::StackUnderflow { pc: PC_START_ADDR })
        );
    }

    #[test]
    fn test_call_overflow_leaves_state() {
        let mut state = Chip8State::new();
        for _ in 0..16 {
            state.stack.push(0x200);
        }
        let before = state.stack.clone();
        assert_eq!(
            run(&mut state, 0x2300),
            Err(Chip8Error::StackOverflow { pc: PC_START_ADDR })
        );
        assert_eq!(state.stack, before);
    }

    #[test]
    fn test_add_immediate_wraps_without_flag() {
        let mut state = Chip8State::new();
        state.registers.write(VC, 0x90);
        state.registers.write(VF, 0x07);
        run(&mut state, 0x7CFF).unwrap();
        assert_eq!(state.registers.read(VC), 0x8F);
        assert_eq!(state.registers.read(VF), 0x07);
    }

    #[test]
    fn test_add_registers_carry() {
        let mut state = Chip8State::new();
        state.registers.write(V1, 0xFF);
        state.registers.write(V2, 0x02);
        run(&mut state, 0x8124).unwrap();
        assert_eq!(state.registers.read(V1), 0x01);
        assert_eq!(state.registers.read(VF), 1);

        state.registers.write(V1, 0x10);
        run(&mut state, 0x8124).unwrap();
        assert_eq!(state.registers.read(V1), 0x12);
        assert_eq!(state.registers.read(VF), 0);
    }

    #[test]
    fn test_sub_flags() {
        let mut state = Chip8State::new();
        state.registers.write(V1, 5);
        state.registers.write(V2, 5);
        run(&mut state, 0x8125).unwrap();
        assert_eq!(state.registers.read(V1), 0);
        assert_eq!(state.registers.read(VF), 1);

        state.registers.write(V1, 3);
        run(&mut state, 0x8125).unwrap();
        assert_eq!(state.registers.read(V1), 0xFE);
        assert_eq!(state.registers.read(VF), 0);
    }

    #[test]
    fn test_subn_flags() {
        let mut state = Chip8State::new();
        state.registers.write(V1, 3);
        state.registers.write(V2, 5);
        run(&mut state, 0x8127).unwrap();
        assert_eq!(state.registers.read(V1), 2);
        assert_eq!(state.registers.read(VF), 1);

        state.registers.write(V1, 6);
        run(&mut state, 0x8127).unwrap();
        assert_eq!(state.registers.read(V1), 0xFF);
        assert_eq!(state.registers.read(VF), 0);
    }

    #[test]
    fn test_shifts_use_vx() {
        let mut state = Chip8State::new();
        state.registers.write(V3, 0b1000_0011);
        state.registers.write(V4, 0xAA);
        run(&mut state, 0x8346).unwrap();
        assert_eq!(state.registers.read(V3), 0b0100_0001);
        assert_eq!(state.registers.read(VF), 1);

        state.registers.write(V3, 0b1000_0010);
        run(&mut state, 0x834E).unwrap();
        assert_eq!(state.registers.read(V3), 0b0000_0100);
        assert_eq!(state.registers.read(VF), 1);

        run(&mut state, 0x834E).unwrap();
        assert_eq!(state.registers.read(V3), 0b0000_1000);
        assert_eq!(state.registers.read(VF), 0);
    }

    #[test]
    fn test_flag_wins_when_vf_is_destination() {
        let mut state = Chip8State::new();
        state.registers.write(VF, 0xFF);
        state.registers.write(V0, 0x01);
        run(&mut state, 0x8F04).unwrap();
        assert_eq!(state.registers.read(VF), 1);
    }

    #[test]
    fn test_logic_leaves_vf() {
        let mut state = Chip8State::new();
        state.registers.write(V1, 0b1100);
        state.registers.write(V2, 0b1010);
        state.registers.write(VF, 9);
        run(&mut state, 0x8121).unwrap();
        assert_eq!(state.registers.read(V1), 0b1110);
        run(&mut state, 0x8122).unwrap();
        assert_eq!(state.registers.read(V1), 0b1010);
        run(&mut state, 0x8123).unwrap();
        assert_eq!(state.registers.read(V1), 0);
        assert_eq!(state.registers.read(VF), 9);
    }

    #[test]
    fn test_skips() {
        let mut state = Chip8State::new();
        state.registers.write(V1, 0x42);
        run(&mut state, 0x3142).unwrap();
        assert_eq!(state.pc, 0x204);
        run(&mut state, 0x4142).unwrap();
        assert_eq!(state.pc, 0x206);
        run(&mut state, 0x5120).unwrap();
        assert_eq!(state.pc, 0x208);
        run(&mut state, 0x9120).unwrap();
        assert_eq!(state.pc, 0x20C);
    }

    #[test]
    fn test_jump_with_offset() {
        let mut state = Chip8State::new();
        state.registers.write(V0, 0x10);
        run(&mut state, 0xB300).unwrap();
        assert_eq!(state.pc, 0x310);
    }

    #[test]
    fn test_random_masks_with_kk() {
        let mut state = Chip8State::new();
        for _ in 0..32 {
            run(&mut state, 0xC50F).unwrap();
            assert_eq!(state.registers.read(V5) & 0xF0, 0);
        }
        run(&mut state, 0xC500).unwrap();
        assert_eq!(state.registers.read(V5), 0);
    }

    #[test]
    fn test_draw_scenario() {
        let mut state = Chip8State::new();
        state.index = 0x300;
        state.memory.write(0x300, 0x11);
        state.memory.write(0x301, 0x88);
        run(&mut state, 0xD3D2).unwrap();
        assert!(state.display.pixel(0, 3));
        assert!(state.display.pixel(0, 7));
        assert!(state.display.pixel(1, 0));
        assert!(state.display.pixel(1, 4));
        assert_eq!(state.display.lit_pixels(), 4);
        assert_eq!(state.registers.read(VF), 0);
        assert!(state.draw_flag);

        run(&mut state, 0xD3D1).unwrap();
        assert_eq!(state.registers.read(VF), 1);
        assert_eq!(state.display.lit_pixels(), 2);
    }

    #[test]
    fn test_key_skips() {
        let mut state = Chip8State::new();
        state.registers.write(V2, 0xA);
        state.keypad.set_key(Key::KeyA, true);
        run(&mut state, 0xE29E).unwrap();
        assert_eq!(state.pc, 0x204);
        run(&mut state, 0xE2A1).unwrap();
        assert_eq!(state.pc, 0x206);
        state.keypad.set_key(Key::KeyA, false);
        run(&mut state, 0xE2A1).unwrap();
        assert_eq!(state.pc, 0x20A);
    }

    #[test]
    fn test_timer_registers() {
        let mut state = Chip8State::new();
        state.registers.write(V1, 30);
        run(&mut state, 0xF115).unwrap();
        run(&mut state, 0xF118).unwrap();
        assert_eq!(state.timers.delay, 30);
        assert_eq!(state.timers.sound, 30);
        state.timers.delay = 12;
        run(&mut state, 0xF207).unwrap();
        assert_eq!(state.registers.read(V2), 12);
    }

    #[test]
    fn test_wait_for_key_enters_awaiting_state() {
        let mut state = Chip8State::new();
        run(&mut state, 0xF70A).unwrap();
        assert_eq!(state.run_state, RunState::AwaitingKey(V7));
        assert_eq!(state.pc, 0x202);
    }

    #[test]
    fn test_index_arithmetic() {
        let mut state = Chip8State::new();
        state.index = 0x0FFE;
        state.registers.write(V1, 3);
        run(&mut state, 0xF11E).unwrap();
        assert_eq!(state.index, 0x001);
        assert_eq!(state.registers.read(VF), 0);

        state.registers.write(V1, 0xB);
        run(&mut state, 0xF129).unwrap();
        assert_eq!(state.index, 55);
    }

    #[test]
    fn test_bcd() {
        let mut state = Chip8State::new();
        state.index = 0x300;
        state.registers.write(V4, 254);
        run(&mut state, 0xF433).unwrap();
        assert_eq!(&state.memory.as_slice()[0x300..0x303], &[2, 5, 4]);
    }

    #[test]
    fn test_store_and_load_are_inclusive() {
        let mut state = Chip8State::new();
        state.index = 0x400;
        for (value, reg) in (1..).zip(Register::ALL) {
            state.registers.write(reg, value);
        }
        run(&mut state, 0xF355).unwrap();
        assert_eq!(&state.memory.as_slice()[0x400..0x405], &[1, 2, 3, 4, 0]);
        assert_eq!(state.index, 0x400);

        let saved = state.registers.clone();
        state.registers = crate::state::RegisterBank::new();
        run(&mut state, 0xF365).unwrap();
        assert_eq!(&state.registers.as_slice()[..4], &saved.as_slice()[..4]);
        assert_eq!(state.registers.read(V4), 0);
    }

    #[test]
    fn test_clear_screen() {
        let mut state = Chip8State::new();
        state.draw_sprite(0, 0, 5);
        state.draw_flag = false;
        run(&mut state, 0x00E0).unwrap();
        assert_eq!(state.display.lit_pixels(), 0);
        assert!(state.draw_flag);
    }
}

//! JVM instruction set
//!
//! Only the opcodes the transformer needs to reason about get named
//! constants; every defined opcode has an entry in the length table so that
//! instruction boundaries can be found without interpreting operands.

use crate::encoder::{read_i32_at, DecodeError};

/// `aload_0`
pub const ALOAD_0: u8 = 0x2a;
/// `return`
pub const RETURN: u8 = 0xb1;
/// `invokevirtual`
pub const INVOKEVIRTUAL: u8 = 0xb6;
/// `invokespecial`: direct dispatch to a literal owner
pub const INVOKESPECIAL: u8 = 0xb7;
/// `invokestatic`
pub const INVOKESTATIC: u8 = 0xb8;
/// `invokeinterface`
pub const INVOKEINTERFACE: u8 = 0xb9;
/// `invokedynamic`
pub const INVOKEDYNAMIC: u8 = 0xba;
/// `tableswitch`
pub const TABLESWITCH: u8 = 0xaa;
/// `lookupswitch`
pub const LOOKUPSWITCH: u8 = 0xab;
/// `wide`
pub const WIDE: u8 = 0xc4;
/// `iinc`
pub const IINC: u8 = 0x84;

/// Fixed instruction lengths (opcode byte included); 0 marks an opcode that
/// is either undefined or variable-length.
const LENGTHS: [u8; 202] = [
    // 0x00 nop .. 0x0f dconst_1
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    // 0x10 bipush, sipush, ldc, ldc_w, ldc2_w, iload..aload, iload_0..
    2, 3, 2, 3, 3, 2, 2, 2, 2, 2, 1, 1, 1, 1, 1, 1,
    // 0x20
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    // 0x30 .. 0x35 array loads, 0x36..0x3a stores (index), 0x3b.. store_n
    1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 2, 1, 1, 1, 1, 1,
    // 0x40
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    // 0x50
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    // 0x60
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    // 0x70
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    // 0x80 .. 0x84 iinc
    1, 1, 1, 1, 3, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    // 0x90 .. 0x98 conversions/compares, 0x99.. if<cond>
    1, 1, 1, 1, 1, 1, 1, 1, 1, 3, 3, 3, 3, 3, 3, 3,
    // 0xa0 if_icmp*, goto, jsr, ret, tableswitch, lookupswitch, returns
    3, 3, 3, 3, 3, 3, 3, 3, 3, 2, 0, 0, 1, 1, 1, 1,
    // 0xb0 areturn, return, get/put static/field, invoke*, new
    1, 1, 3, 3, 3, 3, 3, 3, 3, 5, 5, 3, 2, 3, 1, 1,
    // 0xc0 checkcast, instanceof, monitorenter/exit, wide, multianewarray,
    // ifnull, ifnonnull, goto_w, jsr_w
    3, 3, 1, 1, 0, 4, 3, 3, 5, 5,
];

const MNEMONICS: [&str; 202] = [
    "nop", "aconst_null", "iconst_m1", "iconst_0", "iconst_1", "iconst_2", "iconst_3",
    "iconst_4", "iconst_5", "lconst_0", "lconst_1", "fconst_0", "fconst_1", "fconst_2",
    "dconst_0", "dconst_1", "bipush", "sipush", "ldc", "ldc_w", "ldc2_w", "iload", "lload",
    "fload", "dload", "aload", "iload_0", "iload_1", "iload_2", "iload_3", "lload_0",
    "lload_1", "lload_2", "lload_3", "fload_0", "fload_1", "fload_2", "fload_3", "dload_0",
    "dload_1", "dload_2", "dload_3", "aload_0", "aload_1", "aload_2", "aload_3", "iaload",
    "laload", "faload", "daload", "aaload", "baload", "caload", "saload", "istore", "lstore",
    "fstore", "dstore", "astore", "istore_0", "istore_1", "istore_2", "istore_3", "lstore_0",
    "lstore_1", "lstore_2", "lstore_3", "fstore_0", "fstore_1", "fstore_2", "fstore_3",
    "dstore_0", "dstore_1", "dstore_2", "dstore_3", "astore_0", "astore_1", "astore_2",
    "astore_3", "iastore", "lastore", "fastore", "dastore", "aastore", "bastore", "castore",
    "sastore", "pop", "pop2", "dup", "dup_x1", "dup_x2", "dup2", "dup2_x1", "dup2_x2",
    "swap", "iadd", "ladd", "fadd", "dadd", "isub", "lsub", "fsub", "dsub", "imul", "lmul",
    "fmul", "dmul", "idiv", "ldiv", "fdiv", "ddiv", "irem", "lrem", "frem", "drem", "ineg",
    "lneg", "fneg", "dneg", "ishl", "lshl", "ishr", "lshr", "iushr", "lushr", "iand", "land",
    "ior", "lor", "ixor", "lxor", "iinc", "i2l", "i2f", "i2d", "l2i", "l2f", "l2d", "f2i",
    "f2l", "f2d", "d2i", "d2l", "d2f", "i2b", "i2c", "i2s", "lcmp", "fcmpl", "fcmpg",
    "dcmpl", "dcmpg", "ifeq", "ifne", "iflt", "ifge", "ifgt", "ifle", "if_icmpeq",
    "if_icmpne", "if_icmplt", "if_icmpge", "if_icmpgt", "if_icmple", "if_acmpeq",
    "if_acmpne", "goto", "jsr", "ret", "tableswitch", "lookupswitch", "ireturn", "lreturn",
    "freturn", "dreturn", "areturn", "return", "getstatic", "putstatic", "getfield",
    "putfield", "invokevirtual", "invokespecial", "invokestatic", "invokeinterface",
    "invokedynamic", "new", "newarray", "anewarray", "arraylength", "athrow", "checkcast",
    "instanceof", "monitorenter", "monitorexit", "wide", "multianewarray", "ifnull",
    "ifnonnull", "goto_w", "jsr_w",
];

/// Mnemonic of an opcode, if defined
pub fn mnemonic(opcode: u8) -> Option<&'static str> {
    MNEMONICS.get(opcode as usize).copied()
}

/// Length in bytes of the instruction starting at `offset`
///
/// Switch instructions are padded so their operands start on a four-byte
/// boundary relative to the start of the code array.
pub fn instruction_length(code: &[u8], offset: usize) -> Result<usize, DecodeError> {
    let opcode = *code.get(offset).ok_or(DecodeError::UnexpectedEnd(offset))?;
    let length = match opcode {
        TABLESWITCH => {
            let base = switch_operands(offset);
            let low = read_i32_at(code, base + 4).ok_or(DecodeError::UnexpectedEnd(offset))?;
            let high = read_i32_at(code, base + 8).ok_or(DecodeError::UnexpectedEnd(offset))?;
            if high < low {
                return Err(DecodeError::InvalidOpcode { opcode, offset });
            }
            let entries = (high as i64 - low as i64 + 1) as usize;
            base - offset + 12 + entries * 4
        }
        LOOKUPSWITCH => {
            let base = switch_operands(offset);
            let pairs = read_i32_at(code, base + 4).ok_or(DecodeError::UnexpectedEnd(offset))?;
            if pairs < 0 {
                return Err(DecodeError::InvalidOpcode { opcode, offset });
            }
            base - offset + 8 + pairs as usize * 8
        }
        WIDE => {
            let widened = *code.get(offset + 1).ok_or(DecodeError::UnexpectedEnd(offset))?;
            if widened == IINC {
                6
            } else {
                4
            }
        }
        _ => match LENGTHS.get(opcode as usize) {
            Some(&len) if len > 0 => len as usize,
            _ => return Err(DecodeError::InvalidOpcode { opcode, offset }),
        },
    };
    if offset + length > code.len() {
        return Err(DecodeError::UnexpectedEnd(offset));
    }
    Ok(length)
}

fn switch_operands(offset: usize) -> usize {
    // One opcode byte, then 0-3 bytes of padding
    (offset + 4) & !3
}

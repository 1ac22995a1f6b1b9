//! Walks the instructions of a `Code` attribute and extracts the symbols
//! each instruction refers to. Every instruction yields at most one
//! [`Reference`]; `invokedynamic` call sites are skipped since their
//! targets are only known at link time.

use crate::classes::classfile::{ClassParseError, ConstantPool, MemberRefKind};
use crate::classes::node::{InvokeKind, Reference};

const LDC: u8 = 0x12;
const LDC_W: u8 = 0x13;
const GETSTATIC: u8 = 0xb2;
const PUTSTATIC: u8 = 0xb3;
const GETFIELD: u8 = 0xb4;
const PUTFIELD: u8 = 0xb5;
const INVOKEVIRTUAL: u8 = 0xb6;
const INVOKESPECIAL: u8 = 0xb7;
const INVOKESTATIC: u8 = 0xb8;
const INVOKEINTERFACE: u8 = 0xb9;
const NEW: u8 = 0xbb;
const ANEWARRAY: u8 = 0xbd;
const CHECKCAST: u8 = 0xc0;
const INSTANCEOF: u8 = 0xc1;
const MULTIANEWARRAY: u8 = 0xc5;
const TABLESWITCH: u8 = 0xaa;
const LOOKUPSWITCH: u8 = 0xab;
const WIDE: u8 = 0xc4;
const IINC: u8 = 0x84;

/// Symbol references made by `code`, in instruction order.
pub(crate) fn collect_references(
    code: &[u8],
    pool: &ConstantPool,
) -> Result<Vec<Reference>, ClassParseError> {
    let mut references = Vec::new();
    let mut offset = 0;

    while offset < code.len() {
        let opcode = code[offset];
        let length = instruction_length(code, offset)?;
        if offset + length > code.len() {
            return Err(ClassParseError::MalformedCode(format!(
                "instruction at offset {} runs past the end of the code array",
                offset
            )));
        }

        let reference = match opcode {
            LDC => pool.loadable_class(code[offset + 1] as u16)?.map(|name| Reference::Class { name }),
            LDC_W => pool
                .loadable_class(operand_u2(code, offset))?
                .map(|name| Reference::Class { name }),
            NEW => Some(Reference::New {
                name: pool.class_name(operand_u2(code, offset))?,
            }),
            ANEWARRAY | CHECKCAST | INSTANCEOF | MULTIANEWARRAY => Some(Reference::Class {
                name: pool.class_name(operand_u2(code, offset))?,
            }),
            GETSTATIC | PUTSTATIC | GETFIELD | PUTFIELD => {
                let (kind, owner, signature) = pool.member_ref(operand_u2(code, offset))?;
                if kind != MemberRefKind::Field {
                    return Err(mismatched_ref(opcode, offset));
                }
                Some(Reference::Field {
                    owner,
                    signature,
                    is_static: matches!(opcode, GETSTATIC | PUTSTATIC),
                })
            }
            INVOKEVIRTUAL | INVOKESPECIAL | INVOKESTATIC | INVOKEINTERFACE => {
                let (kind, owner, signature) = pool.member_ref(operand_u2(code, offset))?;
                let valid = match opcode {
                    INVOKEVIRTUAL => kind == MemberRefKind::Method,
                    INVOKEINTERFACE => kind == MemberRefKind::InterfaceMethod,
                    _ => kind != MemberRefKind::Field,
                };
                if !valid {
                    return Err(mismatched_ref(opcode, offset));
                }
                let kind = match opcode {
                    INVOKEVIRTUAL => InvokeKind::Virtual,
                    INVOKESPECIAL => InvokeKind::Special,
                    INVOKESTATIC => InvokeKind::Static,
                    _ => InvokeKind::Interface,
                };
                Some(Reference::Method {
                    owner,
                    signature,
                    kind,
                })
            }
            _ => None,
        };

        references.extend(reference);
        offset += length;
    }

    Ok(references)
}

fn operand_u2(code: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([code[offset + 1], code[offset + 2]])
}

fn mismatched_ref(opcode: u8, offset: usize) -> ClassParseError {
    ClassParseError::MalformedCode(format!(
        "opcode 0x{:02x} at offset {} refers to the wrong kind of member",
        opcode, offset
    ))
}

/// Total length in bytes of the instruction starting at `offset`,
/// opcode included.
fn instruction_length(code: &[u8], offset: usize) -> Result<usize, ClassParseError> {
    let opcode = code[offset];
    let length = match opcode {
        0x00..=0x0f => 1,
        0x10 => 2,
        0x11 => 3,
        0x12 => 2,
        0x13 | 0x14 => 3,
        0x15..=0x19 => 2,
        0x1a..=0x35 => 1,
        0x36..=0x3a => 2,
        0x3b..=0x83 => 1,
        IINC => 3,
        0x85..=0x98 => 1,
        0x99..=0xa8 => 3,
        0xa9 => 2,
        TABLESWITCH => {
            let base = switch_operands_start(offset);
            let low = read_i32(code, base + 4)?;
            let high = read_i32(code, base + 8)?;
            if high < low {
                return Err(ClassParseError::MalformedCode(format!(
                    "tableswitch at offset {} has high < low",
                    offset
                )));
            }
            let entries = (high as i64 - low as i64 + 1) as usize;
            base - offset + 12 + entries * 4
        }
        LOOKUPSWITCH => {
            let base = switch_operands_start(offset);
            let pairs = read_i32(code, base + 4)?;
            if pairs < 0 {
                return Err(ClassParseError::MalformedCode(format!(
                    "lookupswitch at offset {} has a negative pair count",
                    offset
                )));
            }
            base - offset + 8 + pairs as usize * 8
        }
        0xac..=0xb1 => 1,
        0xb2..=0xb8 => 3,
        0xb9 | 0xba => 5,
        NEW => 3,
        0xbc => 2,
        ANEWARRAY => 3,
        0xbe | 0xbf => 1,
        CHECKCAST | INSTANCEOF => 3,
        0xc2 | 0xc3 => 1,
        WIDE => match code.get(offset + 1) {
            Some(&IINC) => 6,
            Some(_) => 4,
            None => return Err(ClassParseError::UnexpectedEof),
        },
        MULTIANEWARRAY => 4,
        0xc6 | 0xc7 => 3,
        0xc8 | 0xc9 => 5,
        _ => return Err(ClassParseError::UnknownOpcode { opcode, offset }),
    };
    Ok(length)
}

/// Switch operands start at the next 4-byte boundary after the opcode,
/// measured from the start of the code array.
fn switch_operands_start(offset: usize) -> usize {
    (offset + 4) & !3
}

fn read_i32(code: &[u8], at: usize) -> Result<i32, ClassParseError> {
    let bytes = code.get(at..at + 4).ok_or(ClassParseError::UnexpectedEof)?;
    Ok(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

use std::collections::BTreeMap;

use thiserror::Error;

use crate::classes::bytecode::collect_references;
use crate::classes::node::{AccessFlags, ClassNode, MemberSignature, MethodBody, Reference};
use crate::classes::resolver::ReadMode;

const MAGIC: u32 = 0xCAFE_BABE;

/// Largest number of array dimensions a descriptor may declare.
const MAX_ARRAY_DIMENSIONS: usize = 255;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClassParseError {
    #[error("unexpected end of class file")]
    UnexpectedEof,
    #[error("invalid class file magic header")]
    InvalidMagic,
    #[error("malformed modified UTF-8 in constant pool entry {index}")]
    InvalidUtf8 { index: u16 },
    #[error("unsupported constant pool tag {tag}")]
    UnsupportedConstant { tag: u8 },
    #[error("invalid constant pool index {index}")]
    InvalidConstantIndex { index: u16 },
    #[error("malformed descriptor: {0}")]
    InvalidDescriptor(String),
    #[error("unknown opcode 0x{opcode:02x} at offset {offset}")]
    UnknownOpcode { opcode: u8, offset: usize },
    #[error("malformed Code attribute: {0}")]
    MalformedCode(String),
}

/// Kind of a member reference constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MemberRefKind {
    Field,
    Method,
    InterfaceMethod,
}

#[derive(Debug, Clone)]
enum Constant {
    Utf8(String),
    /// A string holding unpaired surrogates. Legal in string literals but
    /// not representable as a Rust string, and never a valid symbol.
    UnpairedUtf8,
    Class {
        name_index: u16,
    },
    MemberRef {
        kind: MemberRefKind,
        class_index: u16,
        name_and_type_index: u16,
    },
    NameAndType {
        name_index: u16,
        descriptor_index: u16,
    },
    Other,
    Unusable,
}

pub(crate) struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    fn parse(reader: &mut ClassReader<'_>) -> Result<Self, ClassParseError> {
        let count = reader.read_u2()? as usize;
        let mut entries = Vec::with_capacity(count);
        entries.push(Constant::Unusable); // index 0 unused

        let mut index = 1;
        while index < count {
            let tag = reader.read_u1()?;
            let entry = match tag {
                1 => {
                    let length = reader.read_u2()? as usize;
                    let bytes = reader.read_slice(length)?;
                    decode_modified_utf8(bytes, index as u16)?
                }
                3 | 4 => {
                    reader.skip(4)?;
                    Constant::Other
                }
                5 | 6 => {
                    reader.skip(8)?;
                    entries.push(Constant::Other);
                    index += 1;
                    Constant::Unusable
                }
                7 => Constant::Class {
                    name_index: reader.read_u2()?,
                },
                8 | 16 | 19 | 20 => {
                    reader.read_u2()?;
                    Constant::Other
                }
                9 | 10 | 11 => {
                    let kind = match tag {
                        9 => MemberRefKind::Field,
                        10 => MemberRefKind::Method,
                        _ => MemberRefKind::InterfaceMethod,
                    };
                    Constant::MemberRef {
                        kind,
                        class_index: reader.read_u2()?,
                        name_and_type_index: reader.read_u2()?,
                    }
                }
                12 => Constant::NameAndType {
                    name_index: reader.read_u2()?,
                    descriptor_index: reader.read_u2()?,
                },
                15 => {
                    reader.skip(3)?;
                    Constant::Other
                }
                17 | 18 => {
                    reader.skip(4)?;
                    Constant::Other
                }
                other => return Err(ClassParseError::UnsupportedConstant { tag: other }),
            };

            entries.push(entry);
            index += 1;
        }

        Ok(Self { entries })
    }

    fn get(&self, index: u16) -> Result<&Constant, ClassParseError> {
        self.entries
            .get(index as usize)
            .ok_or(ClassParseError::InvalidConstantIndex { index })
    }

    fn utf8(&self, index: u16) -> Result<&str, ClassParseError> {
        match self.get(index)? {
            Constant::Utf8(value) => Ok(value.as_str()),
            Constant::UnpairedUtf8 => Err(ClassParseError::InvalidUtf8 { index }),
            _ => Err(ClassParseError::InvalidConstantIndex { index }),
        }
    }

    /// Dotted name of the class constant at `index`.
    pub(crate) fn class_name(&self, index: u16) -> Result<String, ClassParseError> {
        match self.get(index)? {
            Constant::Class { name_index } => Ok(self.utf8(*name_index)?.replace('/', ".")),
            _ => Err(ClassParseError::InvalidConstantIndex { index }),
        }
    }

    /// Dotted class name if the loadable constant at `index` is a class.
    pub(crate) fn loadable_class(&self, index: u16) -> Result<Option<String>, ClassParseError> {
        match self.get(index)? {
            Constant::Class { .. } => self.class_name(index).map(Some),
            _ => Ok(None),
        }
    }

    pub(crate) fn member_ref(
        &self,
        index: u16,
    ) -> Result<(MemberRefKind, String, MemberSignature), ClassParseError> {
        let (kind, class_index, name_and_type_index) = match self.get(index)? {
            Constant::MemberRef {
                kind,
                class_index,
                name_and_type_index,
            } => (*kind, *class_index, *name_and_type_index),
            _ => return Err(ClassParseError::InvalidConstantIndex { index }),
        };
        let owner = self.class_name(class_index)?;
        let (name_index, descriptor_index) = match self.get(name_and_type_index)? {
            Constant::NameAndType {
                name_index,
                descriptor_index,
            } => (*name_index, *descriptor_index),
            _ => {
                return Err(ClassParseError::InvalidConstantIndex {
                    index: name_and_type_index,
                })
            }
        };
        let name = self.utf8(name_index)?;
        let descriptor = self.utf8(descriptor_index)?;
        match kind {
            MemberRefKind::Field => validate_field_descriptor(descriptor)?,
            MemberRefKind::Method | MemberRefKind::InterfaceMethod => {
                validate_method_descriptor(descriptor)?
            }
        }
        Ok((kind, owner, MemberSignature::new(name, descriptor)))
    }
}

/// Decodes a `CONSTANT_Utf8` payload. Class files use modified UTF-8:
/// NUL is stored as two bytes, and characters outside the Basic
/// Multilingual Plane as a surrogate pair of three-byte sequences.
fn decode_modified_utf8(bytes: &[u8], index: u16) -> Result<Constant, ClassParseError> {
    let malformed = || ClassParseError::InvalidUtf8 { index };
    let continuation = |byte: Option<&u8>| match byte {
        Some(byte) if byte & 0xc0 == 0x80 => Ok((byte & 0x3f) as u16),
        _ => Err(malformed()),
    };

    let mut units = Vec::with_capacity(bytes.len());
    let mut pos = 0;
    while pos < bytes.len() {
        let first = bytes[pos];
        let unit = match first {
            0x01..=0x7f => {
                pos += 1;
                first as u16
            }
            0xc0..=0xdf => {
                let unit = ((first & 0x1f) as u16) << 6 | continuation(bytes.get(pos + 1))?;
                pos += 2;
                unit
            }
            0xe0..=0xef => {
                let unit = ((first & 0x0f) as u16) << 12
                    | continuation(bytes.get(pos + 1))? << 6
                    | continuation(bytes.get(pos + 2))?;
                pos += 3;
                unit
            }
            _ => return Err(malformed()),
        };
        units.push(unit);
    }

    Ok(match String::from_utf16(&units) {
        Ok(value) => Constant::Utf8(value),
        Err(_) => Constant::UnpairedUtf8,
    })
}

pub(crate) struct ClassReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ClassReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn expect_magic(&mut self) -> Result<(), ClassParseError> {
        if self.read_u4()? != MAGIC {
            return Err(ClassParseError::InvalidMagic);
        }
        Ok(())
    }

    pub(crate) fn read_u1(&mut self) -> Result<u8, ClassParseError> {
        let value = *self.data.get(self.pos).ok_or(ClassParseError::UnexpectedEof)?;
        self.pos += 1;
        Ok(value)
    }

    pub(crate) fn read_u2(&mut self) -> Result<u16, ClassParseError> {
        let bytes = self.read_slice(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub(crate) fn read_u4(&mut self) -> Result<u32, ClassParseError> {
        let bytes = self.read_slice(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub(crate) fn read_slice(&mut self, len: usize) -> Result<&'a [u8], ClassParseError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(ClassParseError::UnexpectedEof)?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub(crate) fn skip(&mut self, len: usize) -> Result<(), ClassParseError> {
        self.read_slice(len).map(|_| ())
    }
}

/// Parses a class file into its [`ClassNode`]. In [`ReadMode::Full`] the
/// `Code` attribute of every method is decoded into symbol references.
pub fn parse_class(bytes: &[u8], mode: ReadMode) -> Result<ClassNode, ClassParseError> {
    let mut reader = ClassReader::new(bytes);
    reader.expect_magic()?;
    let _minor_version = reader.read_u2()?;
    let _major_version = reader.read_u2()?;
    let pool = ConstantPool::parse(&mut reader)?;

    let access = AccessFlags::from_bits_retain(reader.read_u2()?);
    let name = pool.class_name(reader.read_u2()?)?;
    let super_index = reader.read_u2()?;
    let super_name = if super_index == 0 {
        None
    } else {
        Some(pool.class_name(super_index)?)
    };

    let interfaces_count = reader.read_u2()?;
    let mut interfaces = Vec::with_capacity(interfaces_count as usize);
    for _ in 0..interfaces_count {
        interfaces.push(pool.class_name(reader.read_u2()?)?);
    }

    let mut fields = BTreeMap::new();
    let fields_count = reader.read_u2()?;
    for _ in 0..fields_count {
        let access_flags = AccessFlags::from_bits_retain(reader.read_u2()?);
        let field_name = pool.utf8(reader.read_u2()?)?;
        let descriptor = pool.utf8(reader.read_u2()?)?;
        validate_field_descriptor(descriptor)?;
        let attributes_count = reader.read_u2()?;
        skip_attributes(&mut reader, attributes_count)?;
        fields.insert(MemberSignature::new(field_name, descriptor), access_flags);
    }

    let mut methods = BTreeMap::new();
    let mut bodies = Vec::new();
    let methods_count = reader.read_u2()?;
    for _ in 0..methods_count {
        let access_flags = AccessFlags::from_bits_retain(reader.read_u2()?);
        let method_name = pool.utf8(reader.read_u2()?)?;
        let descriptor = pool.utf8(reader.read_u2()?)?;
        validate_method_descriptor(descriptor)?;
        let signature = MemberSignature::new(method_name, descriptor);

        let mut references = Vec::new();
        let mut has_body = false;
        let attributes_count = reader.read_u2()?;
        for _ in 0..attributes_count {
            let attribute_name = pool.utf8(reader.read_u2()?)?;
            let length = reader.read_u4()? as usize;
            let attribute = reader.read_slice(length)?;
            if mode != ReadMode::Full {
                continue;
            }
            match attribute_name {
                "Code" => {
                    let code = CodeAttribute::parse(attribute)?;
                    references.extend(collect_references(code.bytecode, &pool)?);
                    for catch_type in code.catch_types {
                        references.push(Reference::Class {
                            name: pool.class_name(catch_type)?,
                        });
                    }
                    has_body = true;
                }
                "Exceptions" => {
                    let mut exceptions = ClassReader::new(attribute);
                    for _ in 0..exceptions.read_u2()? {
                        references.push(Reference::Class {
                            name: pool.class_name(exceptions.read_u2()?)?,
                        });
                    }
                    has_body = true;
                }
                _ => {}
            }
        }
        if has_body {
            bodies.push(MethodBody {
                signature: signature.clone(),
                references,
            });
        }
        methods.insert(signature, access_flags);
    }

    let attributes_count = reader.read_u2()?;
    skip_attributes(&mut reader, attributes_count)?;

    Ok(ClassNode {
        name,
        super_name,
        interfaces,
        access,
        fields,
        methods,
        bodies,
    })
}

/// The parts of a `Code` attribute that refer to other classes.
struct CodeAttribute<'a> {
    bytecode: &'a [u8],
    /// Constant pool indices of the exception handlers' catch types.
    /// Handlers catching everything (`finally`) are left out.
    catch_types: Vec<u16>,
}

impl<'a> CodeAttribute<'a> {
    fn parse(attribute: &'a [u8]) -> Result<Self, ClassParseError> {
        let mut reader = ClassReader::new(attribute);
        let _max_stack = reader.read_u2()?;
        let _max_locals = reader.read_u2()?;
        let code_length = reader.read_u4()? as usize;
        if code_length == 0 {
            return Err(ClassParseError::MalformedCode("empty code array".into()));
        }
        let bytecode = reader.read_slice(code_length)?;

        let handlers = reader.read_u2()?;
        let mut catch_types = Vec::new();
        for _ in 0..handlers {
            reader.skip(6)?; // start_pc, end_pc, handler_pc
            let catch_type = reader.read_u2()?;
            if catch_type != 0 {
                catch_types.push(catch_type);
            }
        }
        Ok(Self {
            bytecode,
            catch_types,
        })
    }
}

fn skip_attributes(reader: &mut ClassReader<'_>, count: u16) -> Result<(), ClassParseError> {
    for _ in 0..count {
        reader.read_u2()?; // attribute_name_index
        let length = reader.read_u4()? as usize;
        reader.skip(length)?;
    }
    Ok(())
}

fn validate_field_descriptor(descriptor: &str) -> Result<(), ClassParseError> {
    let mut parser = DescriptorParser::new(descriptor);
    parser.parse_type()?;
    parser.finish()
}

fn validate_method_descriptor(descriptor: &str) -> Result<(), ClassParseError> {
    let mut parser = DescriptorParser::new(descriptor);
    parser.expect(b'(')?;
    while !parser.peek(b')')? {
        parser.parse_type()?;
    }
    parser.expect(b')')?;
    if parser.peek(b'V')? {
        parser.pos += 1;
    } else {
        parser.parse_type()?;
    }
    parser.finish()
}

struct DescriptorParser<'a> {
    descriptor: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> DescriptorParser<'a> {
    fn new(descriptor: &'a str) -> Self {
        Self {
            descriptor,
            bytes: descriptor.as_bytes(),
            pos: 0,
        }
    }

    fn error(&self) -> ClassParseError {
        ClassParseError::InvalidDescriptor(self.descriptor.to_string())
    }

    fn peek(&self, expected: u8) -> Result<bool, ClassParseError> {
        self.bytes
            .get(self.pos)
            .map(|byte| *byte == expected)
            .ok_or_else(|| self.error())
    }

    fn expect(&mut self, expected: u8) -> Result<(), ClassParseError> {
        if !self.peek(expected)? {
            return Err(self.error());
        }
        self.pos += 1;
        Ok(())
    }

    fn finish(&self) -> Result<(), ClassParseError> {
        if self.pos != self.bytes.len() {
            return Err(self.error());
        }
        Ok(())
    }

    fn parse_type(&mut self) -> Result<(), ClassParseError> {
        let dimensions = self.bytes[self.pos.min(self.bytes.len())..]
            .iter()
            .take_while(|byte| **byte == b'[')
            .count();
        if dimensions > MAX_ARRAY_DIMENSIONS {
            return Err(self.error());
        }
        self.pos += dimensions;

        let start = *self.bytes.get(self.pos).ok_or_else(|| self.error())?;
        match start {
            b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' => {
                self.pos += 1;
                Ok(())
            }
            b'L' => {
                let end = self.bytes[self.pos..]
                    .iter()
                    .position(|byte| *byte == b';')
                    .ok_or_else(|| self.error())?;
                // `L;` names no class
                if end == 1 {
                    return Err(self.error());
                }
                self.pos += end + 1;
                Ok(())
            }
            _ => Err(self.error()),
        }
    }
}

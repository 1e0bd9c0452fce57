use std::fmt::{self, Display, Formatter};

use crate::{common::opcode::Opcode, compiler::error::Error};

/// A single stack-machine instruction.
/// Only `STORE_CONST` carries an operand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bytecode {
    pub opcode: Opcode,
    pub operand: Option<f64>,
}

impl Bytecode {
    /// An instruction without an operand.
    pub fn new(opcode: Opcode) -> Bytecode {
        Bytecode {
            opcode,
            operand: None,
        }
    }

    /// A `STORE_CONST` pushing `value`.
    pub fn constant(value: f64) -> Bytecode {
        Bytecode {
            opcode: Opcode::StoreConst,
            operand: Some(value),
        }
    }
}

impl Display for Bytecode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.operand {
            Some(operand) => write!(f, "{:<12}{}", self.opcode, operand),
            None => write!(f, "{}", self.opcode),
        }
    }
}

/// Represents a single interpretable chunk of bytecode,
/// Think a function.
/// Instructions are only ever appended while the chunk is being generated;
/// once handed out of the crate it can't be changed.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    name: String,
    instructions: Vec<Bytecode>,
}

impl Chunk {
    /// Creates a new empty chunk to be filled.
    pub fn new(name: &str) -> Chunk {
        Chunk {
            name: name.to_string(),
            instructions: vec![],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instructions(&self) -> &[Bytecode] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Appends a single instruction.
    pub(crate) fn emit(&mut self, bytecode: Bytecode) {
        log::trace!("{}: emit {}", self.name, bytecode);
        self.instructions.push(bytecode)
    }

    /// Appends a run of instructions, in order.
    pub(crate) fn extend(&mut self, bytecode: impl IntoIterator<Item = Bytecode>) {
        for instruction in bytecode {
            self.emit(instruction);
        }
    }

    /// Serializes the instructions into a flat byte stream:
    /// each opcode is one byte, and a `STORE_CONST` is followed by
    /// the 8 little-endian bytes of its operand.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.instructions.len());
        for instruction in self.instructions.iter() {
            bytes.push(instruction.opcode as u8);
            if instruction.opcode.has_operand() {
                let operand = instruction.operand.unwrap_or_default();
                bytes.extend_from_slice(&operand.to_le_bytes());
            }
        }
        bytes
    }

    /// Rebuilds a chunk from the output of `encode`.
    /// Unknown opcodes and truncated operands are reported
    /// as runtime errors, as this is what an executor would load.
    pub fn decode(name: &str, bytes: &[u8]) -> Result<Chunk, Error> {
        let mut instructions = vec![];
        let mut index = 0;

        while index < bytes.len() {
            let opcode = Opcode::from_byte_safe(bytes[index]).ok_or_else(|| {
                Error::runtime(&format!(
                    "Unknown opcode byte `{:#04x}` at offset {} in chunk `{}`",
                    bytes[index], index, name,
                ))
            })?;
            index += 1;

            if opcode.has_operand() {
                let raw: [u8; 8] = bytes
                    .get(index..index + 8)
                    .and_then(|b| b.try_into().ok())
                    .ok_or_else(|| {
                        Error::runtime(&format!(
                            "Truncated operand for {} at offset {} in chunk `{}`",
                            opcode,
                            index - 1,
                            name,
                        ))
                    })?;
                index += 8;
                instructions.push(Bytecode::constant(f64::from_le_bytes(raw)));
            } else {
                instructions.push(Bytecode::new(opcode));
            }
        }

        let mut chunk = Chunk::new(name);
        chunk.extend(instructions);
        Ok(chunk)
    }
}

impl Display for Chunk {
    /// Dump the chunk's bytecode for inspection.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "-- chunk {} --", self.name)?;
        for (index, instruction) in self.instructions.iter().enumerate() {
            writeln!(f, "{:04}  {}", index, instruction)?;
        }
        Ok(())
    }
}

/// The result of one compilation: named chunks in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    name: String,
    chunks: Vec<Chunk>,
}

impl Module {
    pub fn new(name: &str) -> Module {
        Module {
            name: name.to_string(),
            chunks: vec![],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Looks up a chunk by name, like an executor resolving its entry point.
    /// If two functions share a name, the first declared wins.
    pub fn chunk(&self, name: &str) -> Option<&Chunk> {
        self.chunks.iter().find(|c| c.name == name)
    }

    pub(crate) fn push(&mut self, chunk: Chunk) {
        self.chunks.push(chunk)
    }
}

impl Display for Module {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "== module {} ==", self.name)?;
        for chunk in self.chunks.iter() {
            write!(f, "{}", chunk)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::error::ErrorKind;

    #[test]
    fn extend() {
        let mut chunk = Chunk::new("f");
        assert!(chunk.is_empty());

        chunk.extend(vec![Bytecode::new(Opcode::Nil), Bytecode::constant(12.3)]);
        assert_eq!(chunk.len(), 2);
        assert_eq!(chunk.instructions()[1].operand, Some(12.3));
    }

    #[test]
    fn encoding_layout() {
        let mut chunk = Chunk::new("f");
        chunk.extend(vec![Bytecode::constant(4.0), Bytecode::new(Opcode::Ret)]);

        let bytes = chunk.encode();
        assert_eq!(bytes.len(), 1 + 8 + 1);
        assert_eq!(bytes[0], Opcode::StoreConst as u8);
        assert_eq!(&bytes[1..9], &4.0f64.to_le_bytes());
        assert_eq!(bytes[9], Opcode::Ret as u8);

        assert_eq!(Chunk::decode("f", &bytes).unwrap(), chunk);
    }

    #[test]
    fn decode_unknown_opcode() {
        let error = Chunk::decode("f", &[Opcode::Ret as u8, 0xff]).unwrap_err();
        assert_eq!(error.kind, ErrorKind::Runtime);
    }

    #[test]
    fn decode_truncated_operand() {
        let error = Chunk::decode("f", &[Opcode::StoreConst as u8, 0, 0]).unwrap_err();
        assert_eq!(error.kind, ErrorKind::Runtime);
    }

    #[test]
    fn lookup_by_name() {
        let mut module = Module::new("main");
        module.push(Chunk::new("f"));
        module.push(Chunk::new("g"));

        assert_eq!(module.chunk("g").map(Chunk::name), Some("g"));
        assert!(module.chunk("h").is_none());
    }

    #[test]
    fn disassembly() {
        let mut module = Module::new("main");
        let mut chunk = Chunk::new("f");
        chunk.extend(vec![Bytecode::constant(4.0), Bytecode::new(Opcode::Ret)]);
        module.push(chunk);

        let target = "== module main ==\n-- chunk f --\n0000  STORE_CONST 4\n0001  RET\n";
        assert_eq!(format!("{}", module), target);
    }
}

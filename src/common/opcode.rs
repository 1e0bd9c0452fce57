use std::fmt::{self, Display, Formatter};

use crate::compiler::token::TokenType;

/// This enum represents a single stack-machine opcode.
/// Under the hood, it's just a byte,
/// which is what `Chunk::encode` writes out.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Add the top two numbers on the stack.
    Add        = 0,
    /// Subtract the top number from the one beneath it.
    Sub        = 1,
    /// Multiply the top two numbers on the stack.
    Mul        = 2,
    /// Divide the number beneath the top by the top.
    Div        = 3,
    /// Push the instruction's numeric operand.
    StoreConst = 4,
    /// Push a copy of a stack slot.
    StoreStack = 5,
    /// Return the top of the stack from the current chunk.
    Ret        = 6,
    /// No operation was produced. Must always be last.
    Nil        = 7,
}

impl Opcode {
    const ALL: [Opcode; 8] = [
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Div,
        Opcode::StoreConst,
        Opcode::StoreStack,
        Opcode::Ret,
        Opcode::Nil,
    ];

    /// Convert a raw byte to an opcode,
    /// performing a bounds check first.
    /// Used for bytecode verification.
    pub fn from_byte_safe(byte: u8) -> Option<Opcode> {
        Opcode::ALL.get(byte as usize).copied()
    }

    /// Maps an infix operator token to the opcode that combines its operands.
    /// Operators without a lowering map to `Opcode::Nil`;
    /// it's up to the caller to decide whether that's acceptable.
    pub fn from_operator(kind: TokenType) -> Opcode {
        match kind {
            TokenType::Plus => Opcode::Add,
            TokenType::Minus => Opcode::Sub,
            TokenType::Star => Opcode::Mul,
            TokenType::Slash => Opcode::Div,
            _ => Opcode::Nil,
        }
    }

    /// Whether this opcode carries a numeric operand.
    pub fn has_operand(self) -> bool {
        self == Opcode::StoreConst
    }
}

impl Display for Opcode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::StoreConst => "STORE_CONST",
            Opcode::StoreStack => "STORE_STACK",
            Opcode::Ret => "RET",
            Opcode::Nil => "NIL",
        };

        f.pad(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe() {
        assert_eq!(None, Opcode::from_byte_safe((Opcode::Nil as u8) + 1));
        assert_eq!(Some(Opcode::Nil), Opcode::from_byte_safe(Opcode::Nil as u8));
        assert_eq!(
            Some(Opcode::StoreConst),
            Opcode::from_byte_safe(Opcode::StoreConst as u8)
        );
    }

    #[test]
    fn operators() {
        assert_eq!(Opcode::from_operator(TokenType::Plus), Opcode::Add);
        assert_eq!(Opcode::from_operator(TokenType::Minus), Opcode::Sub);
        assert_eq!(Opcode::from_operator(TokenType::Star), Opcode::Mul);
        assert_eq!(Opcode::from_operator(TokenType::Slash), Opcode::Div);
        assert_eq!(Opcode::from_operator(TokenType::Nil), Opcode::Nil);
        assert_eq!(Opcode::from_operator(TokenType::EqualEq), Opcode::Nil);
    }
}

// src/vm/opcode.rs

use paste::paste;

// Every opcode is declared once: name, byte, operand width in bytes. The
// enum, the `OP_*` mnemonics and the byte decoding are all generated from it.
macro_rules! opcodes {
    ($($(#[$doc:meta])* $name:ident = $byte:literal, $width:literal;)*) => {
        paste! {
            #[derive(Debug, Clone, Copy, PartialEq, Eq)]
            #[repr(u8)]
            pub enum OpCode {
                $($(#[$doc])* $name = $byte,)*
            }

            impl OpCode {
                /// Every opcode, in byte order.
                pub const ALL: &'static [OpCode] = &[$(OpCode::$name),*];

                /// Mnemonic used by the disassembler, e.g. `OP_CONSTANT_LONG`.
                pub fn name(self) -> &'static str {
                    match self {
                        $(OpCode::$name => stringify!([<OP_ $name:snake:upper>]),)*
                    }
                }

                /// Number of operand bytes following the opcode byte.
                pub fn operand_width(self) -> usize {
                    match self {
                        $(OpCode::$name => $width,)*
                    }
                }
            }

            impl TryFrom<u8> for OpCode {
                type Error = u8;

                fn try_from(byte: u8) -> Result<Self, Self::Error> {
                    match byte {
                        $($byte => Ok(OpCode::$name),)*
                        other => Err(other),
                    }
                }
            }
        }
    };
}

opcodes! {
    /// Pushes a constant. Operand: one-byte pool index.
    Constant = 0, 1;
    /// Pushes a constant. Operand: 24-bit little-endian pool index.
    ConstantLong = 1, 3;
    Nil = 2, 0;
    True = 3, 0;
    False = 4, 0;
    Pop = 5, 0;
    /// Operand: pool index of the variable's name.
    GetGlobal = 6, 1;
    /// Operand: pool index of the variable's name.
    DefineGlobal = 7, 1;
    /// Operand: pool index of the variable's name.
    SetGlobal = 8, 1;
    Equal = 9, 0;
    Greater = 10, 0;
    Less = 11, 0;
    /// Adds two numbers or concatenates two strings.
    Add = 12, 0;
    Subtract = 13, 0;
    Multiply = 14, 0;
    Divide = 15, 0;
    Not = 16, 0;
    Negate = 17, 0;
    Print = 18, 0;
    /// Ends the run.
    Return = 19, 0;
}

impl OpCode {
    /// Opcodes whose operand is a constant-pool index.
    pub fn takes_constant(self) -> bool {
        matches!(
            self,
            OpCode::Constant
                | OpCode::ConstantLong
                | OpCode::GetGlobal
                | OpCode::DefineGlobal
                | OpCode::SetGlobal
        )
    }

    /// Opcodes whose constant must name a global.
    pub fn takes_name(self) -> bool {
        matches!(
            self,
            OpCode::GetGlobal | OpCode::DefineGlobal | OpCode::SetGlobal
        )
    }
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> u8 {
        op as u8
    }
}

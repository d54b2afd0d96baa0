//! Statement-level opcode table (§4.3): the stable numeric id each
//! statement kind is assigned on the wire. `Program`/`Stmt` carry this
//! decoding already done (`bincode` round-trips the parsed tree
//! directly), so nothing in `eval` decodes a byte through this table at
//! run time — it exists so a `.mbc` producer outside this crate can
//! target the same fixed numbering the original bytecode format used.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    /// Evaluate an expression and bind it to a symbol, creating an ALIAS
    /// slot if the right-hand side is itself a symbol reference.
    Let = 0,
    /// Like `Let`, but never aliases — always copies the evaluated value.
    LetNoAlias = 1,
    /// Store a value into an array element (§4.3 `ARRAYSET`).
    ArraySet = 2,
    /// Allocate a private array on this core's local heap.
    DimArray = 3,
    /// Allocate an array on the shared heap (visible to other cores).
    DimSharedArray = 4,
    If = 5,
    IfElse = 6,
    For = 7,
    Goto = 8,
    /// Call a function by bytecode address, binding arguments by alias.
    FnCall = 9,
    /// Return with no value; unwinds the current call frame.
    Return = 10,
    /// Return an expression's value; unwinds the current call frame.
    ReturnExp = 11,
    /// Halt this core's execution loop.
    Stop = 12,
    /// Read one numeric line from stdin (via the host mailbox).
    Input = 13,
    /// Read one string line from stdin (via the host mailbox).
    InputString = 14,
    Send = 15,
    Recv = 16,
    SendRecv = 17,
    Bcast = 18,
    Reduction = 19,
    Sync = 20,
    /// Call into a host-provided native routine by id.
    Native = 21,
    /// Release a heap allocation (`HeapAllocator::heap_free`).
    Free = 22,
    /// Run a mark-sweep collection pass over this core's local heap.
    Gc = 23,
    /// A transcendental/math function that this core routes to the host
    /// (§4.4 command codes `>= 1000`).
    Maths = 24,
    /// Display (print) an expression's value via the host mailbox.
    Print = 25,
}

impl Opcode {
    pub fn from_u8(byte: u8) -> Option<Opcode> {
        use Opcode::*;
        Some(match byte {
            0 => Let,
            1 => LetNoAlias,
            2 => ArraySet,
            3 => DimArray,
            4 => DimSharedArray,
            5 => If,
            6 => IfElse,
            7 => For,
            8 => Goto,
            9 => FnCall,
            10 => Return,
            11 => ReturnExp,
            12 => Stop,
            13 => Input,
            14 => InputString,
            15 => Send,
            16 => Recv,
            17 => SendRecv,
            18 => Bcast,
            19 => Reduction,
            20 => Sync,
            21 => Native,
            22 => Free,
            23 => Gc,
            24 => Maths,
            25 => Print,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_opcode_round_trips_through_its_byte() {
        for byte in 0..=25u8 {
            let op = Opcode::from_u8(byte).unwrap();
            assert_eq!(op as u8, byte);
        }
    }

    #[test]
    fn unknown_byte_is_none() {
        assert!(Opcode::from_u8(200).is_none());
    }
}

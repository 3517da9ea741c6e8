//! The type-tag registry shared by the compiler, the gamefile format, and
//! the virtual machine.
//!
//! Tag numbers are stable: they are written to disk and matched by opcodes,
//! so new variants may only be appended, never renumbered.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type tag carried by every [`crate::Value`].
///
/// Tags 93 and above exist only inside the compiler and are never
/// serialized; the encoder rejects them.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    TryFromPrimitive,
    IntoPrimitive,
)]
#[repr(u8)]
pub enum TypeTag {
    None = 0,
    Integer = 1,
    String = 2,
    List = 3,
    Map = 4,
    Function = 5,
    Object = 6,
    Property = 7,
    TypeId = 8,
    JumpTarget = 9,
    VarRef = 10,
    Vocab = 11,
    LocalVar = 15,

    // Compile-time only.
    Colon = 93,
    Indirection = 94,
    Reserved = 95,
    Opcode = 96,
    Expression = 97,
    FlagSet = 98,
    Symbol = 99,
}

impl TypeTag {
    /// True for tags that exist only before symbol translation.
    pub fn is_compile_only(self) -> bool {
        u8::from(self) >= TypeTag::Colon as u8
    }

    /// True for tags whose payload indexes one of the runtime arenas.
    pub fn is_arena_ref(self) -> bool {
        matches!(
            self,
            TypeTag::String
                | TypeTag::List
                | TypeTag::Map
                | TypeTag::Function
                | TypeTag::Object
        )
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeTag::None => "None",
            TypeTag::Integer => "Integer",
            TypeTag::String => "String",
            TypeTag::List => "List",
            TypeTag::Map => "Map",
            TypeTag::Function => "Function",
            TypeTag::Object => "Object",
            TypeTag::Property => "Property",
            TypeTag::TypeId => "TypeId",
            TypeTag::JumpTarget => "Jump Target",
            TypeTag::VarRef => "VarRef",
            TypeTag::Vocab => "Vocab",
            TypeTag::LocalVar => "LocalVar",
            TypeTag::Colon => "Colon",
            TypeTag::Indirection => "Indirection",
            TypeTag::Reserved => "Reserved Word",
            TypeTag::Opcode => "Opcode",
            TypeTag::Expression => "Expression",
            TypeTag::FlagSet => "FlagSet",
            TypeTag::Symbol => "Symbol",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_discriminants() {
        assert_eq!(u8::from(TypeTag::None), 0);
        assert_eq!(u8::from(TypeTag::Integer), 1);
        assert_eq!(u8::from(TypeTag::Vocab), 11);
        assert_eq!(u8::from(TypeTag::LocalVar), 15);
        assert_eq!(u8::from(TypeTag::Symbol), 99);
    }

    #[test]
    fn round_trips_through_bytes() {
        for tag in [
            TypeTag::None,
            TypeTag::Integer,
            TypeTag::JumpTarget,
            TypeTag::LocalVar,
        ] {
            assert_eq!(TypeTag::try_from(u8::from(tag)), Ok(tag));
        }
        assert!(TypeTag::try_from(12).is_err());
    }

    #[test]
    fn compile_only_boundary() {
        assert!(!TypeTag::LocalVar.is_compile_only());
        assert!(TypeTag::Colon.is_compile_only());
        assert!(TypeTag::Symbol.is_compile_only());
    }
}

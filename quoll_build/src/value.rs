//! The compile-time value record.
//!
//! Unlike the runtime [`quoll_common::Value`], compiler values carry the
//! side-channel fields the later phases need: the spelled name of an
//! unresolved symbol, reserved word, or opcode mnemonic, and the opcode
//! table entry once an identifier has resolved to one.

use quoll_common::opcode::OpcodeDef;
use quoll_common::TypeTag;
use std::fmt;

#[derive(Debug, Clone)]
pub struct Value {
    pub tag: TypeTag,
    pub payload: i32,
    /// Spelled name for Symbol, Reserved, and Opcode values.
    pub text: String,
    /// Table entry for Opcode values.
    pub opcode: Option<&'static OpcodeDef>,
}

impl Value {
    pub fn new(tag: TypeTag, payload: i32) -> Self {
        Value {
            tag,
            payload,
            text: String::new(),
            opcode: None,
        }
    }

    pub fn none() -> Self {
        Value::new(TypeTag::None, 0)
    }

    pub fn integer(n: i32) -> Self {
        Value::new(TypeTag::Integer, n)
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Value {
            tag: TypeTag::Symbol,
            payload: 0,
            text: name.into(),
            opcode: None,
        }
    }

    pub fn reserved(word: impl Into<String>) -> Self {
        Value {
            tag: TypeTag::Reserved,
            payload: 0,
            text: word.into(),
            opcode: None,
        }
    }

    pub fn opcode(def: &'static OpcodeDef) -> Self {
        Value {
            tag: TypeTag::Opcode,
            payload: def.code as u8 as i32,
            text: def.name.to_string(),
            opcode: Some(def),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag && self.payload == other.payload && self.text == other.text
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tag {
            TypeTag::Symbol | TypeTag::Reserved | TypeTag::Opcode => {
                write!(f, "<{} ~{}~>", self.tag, self.text)
            }
            TypeTag::None | TypeTag::Expression => write!(f, "<{}>", self.tag),
            _ => write!(f, "<{} {}>", self.tag, self.payload),
        }
    }
}

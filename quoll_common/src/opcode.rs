//! The opcode registry: stable byte codes, assembler mnemonics, and stack
//! arity for every instruction the virtual machine executes.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One-byte instruction codes. Codes 64 and 71–73 are unassigned.
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
pub enum Opcode {
    Return = 0,
    Push0 = 1,
    Push1 = 2,
    PushNone = 3,
    Push8 = 4,
    Push16 = 5,
    Push32 = 6,
    Store = 7,
    CollectGarbage = 8,
    SayUCFirst = 9,
    Say = 10,
    SayUnsigned = 11,
    SayChar = 12,
    StackPop = 13,
    StackDup = 14,
    StackPeek = 15,
    StackSize = 16,
    Call = 17,
    IsValid = 18,
    ListPush = 19,
    ListPop = 20,
    Sort = 21,
    GetItem = 22,
    HasItem = 23,
    GetSize = 24,
    SetItem = 25,
    TypeOf = 26,
    DelItem = 27,
    InsItem = 28,
    AsType = 29,
    Equal = 30,
    NotEqual = 31,
    LessThan = 32,
    LessThanEqual = 33,
    GreaterThan = 34,
    GreaterThanEqual = 35,
    Jump = 36,
    JumpZero = 37,
    JumpNotZero = 38,
    Not = 39,
    Add = 40,
    Sub = 41,
    Mult = 42,
    Div = 43,
    Mod = 44,
    Pow = 45,
    BitLeft = 46,
    BitRight = 47,
    BitAnd = 48,
    BitOr = 49,
    BitXor = 50,
    BitNot = 51,
    Random = 52,
    NextObject = 53,
    IndexOf = 54,
    GetRandom = 55,
    GetKeys = 56,
    StackSwap = 57,
    GetSetting = 58,
    SetSetting = 59,
    GetKey = 60,
    GetOption = 61,
    GetLine = 62,
    AddOption = 63,
    StringClear = 65,
    StringAppend = 66,
    StringLength = 67,
    StringCompare = 68,
    Error = 69,
    Origin = 70,
    New = 74,
    StringAppendUF = 75,
    IsStatic = 76,
    EncodeString = 77,
    DecodeString = 78,
    FileList = 79,
    FileRead = 80,
    FileWrite = 81,
    FileDelete = 82,
    Tokenize = 83,
}

/// Table entry describing one opcode: assembler mnemonic plus how many
/// values it pops (`inputs`) and pushes (`outputs`).
#[derive(Debug, Clone, Copy)]
pub struct OpcodeDef {
    pub name: &'static str,
    pub code: Opcode,
    pub inputs: u8,
    pub outputs: u8,
}

const fn def(name: &'static str, code: Opcode, inputs: u8, outputs: u8) -> OpcodeDef {
    OpcodeDef {
        name,
        code,
        inputs,
        outputs,
    }
}

/// The full opcode table, in code order.
pub const OPCODES: &[OpcodeDef] = &[
    def("return", Opcode::Return, 1, 0),
    def("push_0", Opcode::Push0, 0, 1),
    def("push_1", Opcode::Push1, 0, 1),
    def("push_none", Opcode::PushNone, 0, 1),
    def("push_8", Opcode::Push8, 0, 1),
    def("push_16", Opcode::Push16, 0, 1),
    def("push_32", Opcode::Push32, 0, 1),
    def("set", Opcode::Store, 2, 0),
    def("collect_garbage", Opcode::CollectGarbage, 0, 1),
    def("say_uf", Opcode::SayUCFirst, 1, 0),
    def("say", Opcode::Say, 1, 0),
    def("say_unsigned", Opcode::SayUnsigned, 1, 0),
    def("say_char", Opcode::SayChar, 1, 0),
    def("pop", Opcode::StackPop, 1, 0),
    def("stack_dup", Opcode::StackDup, 1, 2),
    def("stack_peek", Opcode::StackPeek, 1, 1),
    def("stack_size", Opcode::StackSize, 0, 1),
    def("call", Opcode::Call, 2, 1),
    def("is_valid", Opcode::IsValid, 1, 1),
    def("list_push", Opcode::ListPush, 2, 0),
    def("list_pop", Opcode::ListPop, 1, 1),
    def("sort", Opcode::Sort, 1, 0),
    def("get", Opcode::GetItem, 2, 1),
    def("has", Opcode::HasItem, 2, 1),
    def("get_size", Opcode::GetSize, 1, 1),
    def("setp", Opcode::SetItem, 3, 0),
    def("typeof", Opcode::TypeOf, 1, 1),
    def("del_item", Opcode::DelItem, 2, 0),
    def("ins", Opcode::InsItem, 3, 0),
    def("astype", Opcode::AsType, 2, 1),
    def("eq", Opcode::Equal, 2, 1),
    def("neq", Opcode::NotEqual, 2, 1),
    def("lt", Opcode::LessThan, 2, 1),
    def("lte", Opcode::LessThanEqual, 2, 1),
    def("gt", Opcode::GreaterThan, 2, 1),
    def("gte", Opcode::GreaterThanEqual, 2, 1),
    def("jmp", Opcode::Jump, 1, 0),
    def("jz", Opcode::JumpZero, 2, 0),
    def("jnz", Opcode::JumpNotZero, 2, 0),
    def("not", Opcode::Not, 1, 1),
    def("add", Opcode::Add, 2, 1),
    def("sub", Opcode::Sub, 2, 1),
    def("mult", Opcode::Mult, 2, 1),
    def("div", Opcode::Div, 2, 1),
    def("mod", Opcode::Mod, 2, 1),
    def("pow", Opcode::Pow, 2, 1),
    def("left_shift", Opcode::BitLeft, 2, 1),
    def("right_shift", Opcode::BitRight, 2, 1),
    def("bit_and", Opcode::BitAnd, 2, 1),
    def("bit_or", Opcode::BitOr, 2, 1),
    def("bit_xor", Opcode::BitXor, 2, 1),
    def("bit_not", Opcode::BitNot, 1, 1),
    def("random", Opcode::Random, 2, 1),
    def("next_object", Opcode::NextObject, 1, 1),
    def("index_of", Opcode::IndexOf, 2, 1),
    def("get_random", Opcode::GetRandom, 1, 1),
    def("get_keys", Opcode::GetKeys, 1, 1),
    def("stack_swap", Opcode::StackSwap, 2, 0),
    def("get_setting", Opcode::GetSetting, 1, 1),
    def("set_setting", Opcode::SetSetting, 2, 0),
    def("get_key", Opcode::GetKey, 0, 0),
    def("get_option", Opcode::GetOption, 1, 0),
    def("get_line", Opcode::GetLine, 0, 0),
    def("add_option", Opcode::AddOption, 4, 0),
    def("strclr", Opcode::StringClear, 1, 0),
    def("strcat", Opcode::StringAppend, 2, 0),
    def("strlen", Opcode::StringLength, 1, 1),
    def("strcmp", Opcode::StringCompare, 2, 1),
    def("error", Opcode::Error, 1, 0),
    def("origin", Opcode::Origin, 1, 1),
    def("new", Opcode::New, 1, 1),
    def("strcat_uf", Opcode::StringAppendUF, 2, 0),
    def("is_static", Opcode::IsStatic, 1, 1),
    def("encode_string", Opcode::EncodeString, 1, 1),
    def("decode_string", Opcode::DecodeString, 1, 1),
    def("file_list", Opcode::FileList, 0, 1),
    def("file_read", Opcode::FileRead, 1, 1),
    def("file_write", Opcode::FileWrite, 2, 1),
    def("file_delete", Opcode::FileDelete, 1, 1),
    def("tokenize", Opcode::Tokenize, 1, 1),
];

/// Look up an opcode by its assembler mnemonic.
pub fn by_name(name: &str) -> Option<&'static OpcodeDef> {
    OPCODES.iter().find(|def| def.name == name)
}

/// Look up the table entry for a code.
pub fn by_code(code: Opcode) -> &'static OpcodeDef {
    OPCODES
        .iter()
        .find(|def| def.code == code)
        .expect("every opcode has a table entry")
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(by_code(*self).name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn table_covers_every_opcode() {
        // A table entry per enum variant, each with a unique mnemonic.
        let mut names = HashSet::new();
        let mut codes = HashSet::new();
        for entry in OPCODES {
            assert!(names.insert(entry.name), "duplicate name {}", entry.name);
            assert!(codes.insert(entry.code as u8));
        }
        for code in 0u8..=83 {
            match Opcode::try_from(code) {
                Ok(op) => assert!(codes.contains(&(op as u8))),
                Err(_) => assert!(matches!(code, 64 | 71 | 72 | 73)),
            }
        }
    }

    #[test]
    fn lookup_by_name() {
        let add = by_name("add").unwrap();
        assert_eq!(add.code, Opcode::Add);
        assert_eq!(add.inputs, 2);
        assert_eq!(add.outputs, 1);
        assert!(by_name("no_such_op").is_none());
    }

    #[test]
    fn call_is_special_cased_elsewhere() {
        // Call's table arity covers only the function and the count; the
        // compiler adds the literal argument count on top.
        let call = by_name("call").unwrap();
        assert_eq!(call.inputs, 2);
    }
}

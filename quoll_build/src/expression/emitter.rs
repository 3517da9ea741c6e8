//! Byte emission: pending [`AsmLine`]s become function bytecode, with
//! forward label references recorded and patched once the label set is
//! complete.

use crate::gamedata::{AsmLine, FunctionDef, GameData};
use quoll_common::opcode::Opcode;
use quoll_common::{ByteStream, Origin, TypeTag};

/// A recorded placeholder: `position` is the offset of a 32-bit operand to
/// overwrite once `name` resolves in the function's label table.
#[derive(Debug, Clone)]
pub struct Backpatch {
    pub position: u32,
    pub name: String,
    pub origin: Origin,
}

/// Emit the shortest push instruction for a value.
pub fn bytecode_push_value(code: &mut ByteStream, tag: TypeTag, value: i32) {
    if tag == TypeTag::None {
        code.add_8(Opcode::PushNone as u8);
    } else if value == 0 {
        code.add_8(Opcode::Push0 as u8);
        code.add_8(tag as u8);
    } else if value == 1 {
        code.add_8(Opcode::Push1 as u8);
        code.add_8(tag as u8);
    } else if value >= i32::from(i8::MIN) && value <= i32::from(i8::MAX) {
        code.add_8(Opcode::Push8 as u8);
        code.add_8(tag as u8);
        code.add_8(value as i8 as u8);
    } else if value >= i32::from(i16::MIN) && value <= i32::from(i16::MAX) {
        code.add_8(Opcode::Push16 as u8);
        code.add_8(tag as u8);
        code.add_16(value as i16 as u16);
    } else {
        code.add_8(Opcode::Push32 as u8);
        code.add_8(tag as u8);
        code.add_32(value as u32);
    }
}

/// Turn the function's pending lines into bytecode and resolve every
/// symbolic reference against its label table.
pub fn build_function(gamedata: &mut GameData, function: &mut FunctionDef) {
    let lines = std::mem::take(&mut function.asm_code);
    let mut patches: Vec<Backpatch> = Vec::new();

    for line in &lines {
        match line {
            AsmLine::Label { name, .. } => {
                let at = function.code.size() as u32;
                function.labels.entry(name.clone()).or_insert(at);
            }
            AsmLine::Op { opcode, .. } => {
                function.code.add_8(*opcode as u8);
            }
            AsmLine::Value { origin, value } => {
                if value.tag == TypeTag::Symbol {
                    match function.labels.get(&value.text) {
                        Some(&offset) => bytecode_push_value(
                            &mut function.code,
                            TypeTag::JumpTarget,
                            offset as i32,
                        ),
                        None => {
                            function.code.add_8(Opcode::Push32 as u8);
                            function.code.add_8(TypeTag::JumpTarget as u8);
                            patches.push(Backpatch {
                                position: function.code.size() as u32,
                                name: value.text.clone(),
                                origin: origin.clone(),
                            });
                            function.code.add_32(0xFFFF_FFFF);
                        }
                    }
                } else {
                    bytecode_push_value(&mut function.code, value.tag, value.payload);
                    if matches!(value.tag, TypeTag::LocalVar | TypeTag::VarRef) {
                        if let Some(local) = function.locals.get_mut(value.payload as usize) {
                            local.reads += 1;
                        }
                    }
                }
            }
        }
    }

    for patch in patches {
        match function.labels.get(&patch.name) {
            Some(&offset) => function.code.overwrite_32(patch.position as usize, offset),
            None => gamedata.add_error(
                patch.origin,
                format!("Undefined symbol {}.", patch.name),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn push_encodings_choose_shortest_form() {
        let mut code = ByteStream::new();
        bytecode_push_value(&mut code, TypeTag::None, 7);
        assert_eq!(code.as_slice(), &[Opcode::PushNone as u8]);

        let mut code = ByteStream::new();
        bytecode_push_value(&mut code, TypeTag::Integer, 0);
        assert_eq!(code.as_slice(), &[Opcode::Push0 as u8, 1]);

        let mut code = ByteStream::new();
        bytecode_push_value(&mut code, TypeTag::String, 1);
        assert_eq!(code.as_slice(), &[Opcode::Push1 as u8, 2]);

        let mut code = ByteStream::new();
        bytecode_push_value(&mut code, TypeTag::Integer, -5);
        assert_eq!(code.as_slice(), &[Opcode::Push8 as u8, 1, 0xFB]);

        let mut code = ByteStream::new();
        bytecode_push_value(&mut code, TypeTag::Integer, 1000);
        assert_eq!(code.as_slice(), &[Opcode::Push16 as u8, 1, 232, 3]);

        let mut code = ByteStream::new();
        bytecode_push_value(&mut code, TypeTag::Integer, 100_000);
        assert_eq!(
            code.as_slice(),
            &[Opcode::Push32 as u8, 1, 0xA0, 0x86, 0x01, 0x00]
        );
    }

    #[test]
    fn forward_labels_are_patched() {
        let mut gamedata = GameData::new();
        let mut function =
            FunctionDef::new(Origin::new("t.src", 1, 1), 0, "f".to_string(), 0);
        let origin = Origin::new("t.src", 1, 1);
        function.add_value(origin.clone(), Value::symbol("later"));
        function.add_opcode(origin.clone(), Opcode::Jump);
        function.add_label(origin.clone(), "later");
        function.add_value(origin.clone(), Value::integer(0));
        function.add_opcode(origin, Opcode::Return);
        build_function(&mut gamedata, &mut function);
        assert!(!gamedata.has_errors());
        // Push32 JumpTarget <offset>, Jump, then the label lands at 7.
        assert_eq!(function.code.read_8(0), Some(Opcode::Push32 as u8));
        assert_eq!(function.code.read_8(1), Some(TypeTag::JumpTarget as u8));
        assert_eq!(function.code.read_32(2), Some(7));
        assert_eq!(function.labels["later"], 7);
    }

    #[test]
    fn backward_labels_use_short_pushes() {
        let mut gamedata = GameData::new();
        let mut function =
            FunctionDef::new(Origin::new("t.src", 1, 1), 0, "f".to_string(), 0);
        let origin = Origin::new("t.src", 1, 1);
        function.add_label(origin.clone(), "top");
        function.add_value(origin.clone(), Value::symbol("top"));
        function.add_opcode(origin, Opcode::Jump);
        build_function(&mut gamedata, &mut function);
        assert!(!gamedata.has_errors());
        // label at 0 encodes as Push0 JumpTarget
        assert_eq!(function.code.read_8(0), Some(Opcode::Push0 as u8));
        assert_eq!(function.code.read_8(1), Some(TypeTag::JumpTarget as u8));
    }

    #[test]
    fn unresolved_labels_report_undefined_symbol() {
        let mut gamedata = GameData::new();
        let mut function =
            FunctionDef::new(Origin::new("t.src", 3, 1), 0, "f".to_string(), 0);
        function.add_value(Origin::new("t.src", 3, 5), Value::symbol("nowhere"));
        function.add_opcode(Origin::new("t.src", 3, 5), Opcode::Jump);
        build_function(&mut gamedata, &mut function);
        assert!(gamedata.has_errors());
    }

    #[test]
    fn local_reads_are_counted() {
        let mut gamedata = GameData::new();
        let mut function =
            FunctionDef::new(Origin::new("t.src", 1, 1), 0, "f".to_string(), 0);
        function.add_local("self", TypeTag::None, true);
        function.add_local("x", TypeTag::None, false);
        function.add_value(
            Origin::new("t.src", 1, 2),
            Value::new(TypeTag::LocalVar, 1),
        );
        build_function(&mut gamedata, &mut function);
        assert_eq!(function.locals[1].reads, 1);
    }
}

//! Statement lowering for structured function bodies.
//!
//! Every statement form leaves exactly one value on the frame stack so the
//! function driver can pop between statements and return the last value.

use crate::expression::parser::{ListExpr, ListValue};
use crate::gamedata::{FunctionDef, GameData};
use crate::value::Value;
use quoll_common::opcode::Opcode;
use quoll_common::TypeTag;

/// Lower one list. The head decides the form: a call, a raw opcode, a bare
/// string (sugar for print), or a reserved word.
pub fn process_list(gamedata: &mut GameData, function: &mut FunctionDef, list: &ListExpr) {
    let Some(head) = list.values.first() else {
        return;
    };
    match head.value.tag {
        TypeTag::Function | TypeTag::List | TypeTag::LocalVar | TypeTag::Expression => {
            handle_call_stmt(gamedata, function, list);
        }
        TypeTag::Opcode => handle_asm_stmt(gamedata, function, list),
        TypeTag::String => {
            // A bare string statement prints itself.
            print_args(gamedata, function, &list.values, 0, false);
        }
        TypeTag::Reserved => handle_reserved_stmt(gamedata, function, list),
        other => {
            gamedata.add_error(
                head.origin.clone(),
                format!("Expression not permitted to begin with value of type {}.", other),
            );
        }
    }
}

/// Lower a single operand or argument position.
fn process_value(gamedata: &mut GameData, function: &mut FunctionDef, value: &ListValue) {
    match value.value.tag {
        TypeTag::Reserved | TypeTag::Opcode => {
            gamedata.add_error(
                value.origin.clone(),
                format!("Invalid expression value of type {}.", value.value.tag),
            );
        }
        TypeTag::Symbol => {
            gamedata.add_error(
                value.origin.clone(),
                format!("Undefined symbol {}.", value.value.text),
            );
        }
        TypeTag::Expression => {
            if let Some(sublist) = &value.list {
                process_list(gamedata, function, sublist);
            }
        }
        _ => function.add_value(value.origin.clone(), value.value.clone()),
    }
}

/// A list headed by an opcode: check arity, emit operands in reverse, emit
/// the opcode. Zero-output opcodes push None as their statement value.
fn handle_asm_stmt(gamedata: &mut GameData, function: &mut FunctionDef, list: &ListExpr) {
    let head = &list.values[0];
    let def = head
        .value
        .opcode
        .expect("opcode-tagged values carry their table entry");

    let mut wanted = def.inputs as usize + 1;
    if def.code == Opcode::Call {
        // call f argc a1 … aN — the literal count decides the full arity.
        const MINIMUM_CALL_OPERANDS: usize = 3;
        if list.values.len() < MINIMUM_CALL_OPERANDS {
            gamedata.add_error(
                head.origin.clone(),
                format!(
                    "Insufficient operands for call opcode (expected at least {}, but found {}).",
                    MINIMUM_CALL_OPERANDS,
                    list.values.len()
                ),
            );
            return;
        }
        if list.values[2].value.tag != TypeTag::Integer {
            gamedata.add_error(
                list.values[2].origin.clone(),
                "Argument count must be integer.",
            );
            return;
        }
        wanted = MINIMUM_CALL_OPERANDS + list.values[2].value.payload.max(0) as usize;
    }

    if list.values.len() != wanted {
        gamedata.add_error(
            head.origin.clone(),
            format!(
                "Opcode {} expected {} operands, but found {}.",
                def.name,
                wanted - 1,
                list.values.len() - 1
            ),
        );
        return;
    }

    for i in (1..list.values.len()).rev() {
        let operand = &list.values[i];
        if i == 1 && def.code == Opcode::Store {
            if operand.value.tag != TypeTag::LocalVar {
                gamedata.add_error(
                    operand.origin.clone(),
                    "Store opcode must reference local variable.",
                );
            } else {
                function.add_value(
                    operand.origin.clone(),
                    Value::new(TypeTag::VarRef, operand.value.payload),
                );
            }
            continue;
        }
        // Operands are emitted directly rather than through
        // process_value: a leftover Symbol here is a forward label
        // reference for the jump opcodes, resolved by the emitter.
        match operand.value.tag {
            TypeTag::Expression => {
                if let Some(sublist) = &operand.list {
                    process_list(gamedata, function, sublist);
                }
            }
            _ => function.add_value(operand.origin.clone(), operand.value.clone()),
        }
    }
    function.add_opcode(head.origin.clone(), def.code);
    if def.outputs == 0 {
        function.add_value(head.origin.clone(), Value::none());
    }
}

/// A list headed by a callable value: arguments in reverse, the literal
/// argument count, the callee, then `Call`.
fn handle_call_stmt(gamedata: &mut GameData, function: &mut FunctionDef, list: &ListExpr) {
    let argument_count = (list.values.len() - 1) as i32;
    for i in (1..list.values.len()).rev() {
        process_value(gamedata, function, &list.values[i]);
    }
    let head = &list.values[0];
    function.add_value(head.origin.clone(), Value::integer(argument_count));
    process_value(gamedata, function, head);
    function.add_opcode(head.origin.clone(), Opcode::Call);
}

fn handle_reserved_stmt(gamedata: &mut GameData, function: &mut FunctionDef, list: &ListExpr) {
    let word = list.values[0].value.text.clone();
    match word.as_str() {
        "and" => stmt_and_or(gamedata, function, list, true),
        "or" => stmt_and_or(gamedata, function, list, false),
        "break" => stmt_break_continue(gamedata, function, list, true),
        "continue" => stmt_break_continue(gamedata, function, list, false),
        "do_while" => stmt_do_while(gamedata, function, list),
        "if" => stmt_if(gamedata, function, list),
        "label" => stmt_label(gamedata, function, list),
        "print" => {
            if list.values.len() <= 1 {
                gamedata.add_error(
                    list.values[0].origin.clone(),
                    "print statement requires arguments.",
                );
                return;
            }
            print_args(gamedata, function, &list.values, 1, false);
        }
        "print_uf" => {
            if list.values.len() <= 1 {
                gamedata.add_error(
                    list.values[0].origin.clone(),
                    "print statement requires arguments.",
                );
                return;
            }
            print_args(gamedata, function, &list.values, 1, true);
        }
        "proc" => stmt_proc(gamedata, function, list),
        "while" => stmt_while(gamedata, function, list),
        _ => {
            gamedata.add_error(
                list.values[0].origin.clone(),
                format!("{} is not a valid expression command.", word),
            );
        }
    }
}

/// Short-circuit `and`/`or`. Each argument is tested as it is evaluated;
/// the result is Integer 1 or 0.
fn stmt_and_or(gamedata: &mut GameData, function: &mut FunctionDef, list: &ListExpr, is_and: bool) {
    let origin = list.values[0].origin.clone();
    if list.values.len() < 3 {
        gamedata.add_error(
            origin,
            format!(
                "{} requires at least two arguments.",
                if is_and { "and" } else { "or" }
            ),
        );
        return;
    }

    let after_label = function.fresh_label();
    let decided_label = function.fresh_label();
    let test = if is_and {
        Opcode::JumpZero
    } else {
        Opcode::JumpNotZero
    };
    let (fallthrough, decided) = if is_and { (1, 0) } else { (0, 1) };

    for value in &list.values[1..] {
        process_value(gamedata, function, value);
        function.add_value(origin.clone(), Value::symbol(decided_label.clone()));
        function.add_opcode(origin.clone(), test);
    }
    function.add_value(origin.clone(), Value::integer(fallthrough));
    function.add_value(origin.clone(), Value::symbol(after_label.clone()));
    function.add_opcode(origin.clone(), Opcode::Jump);

    function.add_label(origin.clone(), decided_label);
    function.add_value(origin.clone(), Value::integer(decided));
    function.add_label(origin, after_label);
}

fn stmt_break_continue(
    gamedata: &mut GameData,
    function: &mut FunctionDef,
    list: &ListExpr,
    is_break: bool,
) {
    let origin = list.values[0].origin.clone();
    let name = if is_break { "break" } else { "continue" };
    if list.values.len() != 1 {
        gamedata.add_error(origin, format!("{} statement cannot take arguments.", name));
        return;
    }
    let target = if is_break {
        function.break_labels.last().cloned()
    } else {
        function.continue_labels.last().cloned()
    };
    let Some(target) = target else {
        gamedata.add_error(origin, format!("{} statement found outside loop.", name));
        return;
    };
    function.add_value(origin.clone(), Value::symbol(target));
    function.add_opcode(origin.clone(), Opcode::Jump);
    function.add_value(origin, Value::integer(0));
}

/// `(if c t)` / `(if c t e)` — the missing else arm pushes Integer 0.
fn stmt_if(gamedata: &mut GameData, function: &mut FunctionDef, list: &ListExpr) {
    let origin = list.values[0].origin.clone();
    if list.values.len() < 3 || list.values.len() > 4 {
        gamedata.add_error(origin, "If expression must have two or three values.");
        return;
    }

    let after_label = function.fresh_label();
    let else_label = function.fresh_label();

    process_value(gamedata, function, &list.values[1]);
    function.add_value(origin.clone(), Value::symbol(else_label.clone()));
    function.add_opcode(origin.clone(), Opcode::JumpZero);
    process_value(gamedata, function, &list.values[2]);
    function.add_value(origin.clone(), Value::symbol(after_label.clone()));
    function.add_opcode(origin.clone(), Opcode::Jump);
    function.add_label(origin.clone(), else_label);
    if list.values.len() == 4 {
        process_value(gamedata, function, &list.values[3]);
    } else {
        function.add_value(origin.clone(), Value::integer(0));
    }
    function.add_label(origin, after_label);
}

/// `(label name)` — a jump target for the raw jump opcodes.
fn stmt_label(gamedata: &mut GameData, function: &mut FunctionDef, list: &ListExpr) {
    let origin = list.values[0].origin.clone();
    if list.values.len() != 2 {
        gamedata.add_error(origin, "label statement requires exactly one name.");
        return;
    }
    if list.values[1].value.tag != TypeTag::Symbol {
        gamedata.add_error(
            list.values[1].origin.clone(),
            "Label name must be undefined identifier.",
        );
        return;
    }
    function.add_label(list.values[1].origin.clone(), list.values[1].value.text.clone());
    function.add_value(origin, Value::integer(0));
}

/// `(print x …)` / `(print_uf x …)`.
fn print_args(
    gamedata: &mut GameData,
    function: &mut FunctionDef,
    values: &[ListValue],
    first: usize,
    uc_first: bool,
) {
    let origin = values[0].origin.clone();
    for (i, value) in values.iter().enumerate().skip(first) {
        process_value(gamedata, function, value);
        let opcode = if uc_first && i == first {
            Opcode::SayUCFirst
        } else {
            Opcode::Say
        };
        function.add_opcode(origin.clone(), opcode);
    }
    function.add_value(origin, Value::integer(0));
}

/// `(proc s …)` — a statement sequence whose value is the last statement's.
fn stmt_proc(gamedata: &mut GameData, function: &mut FunctionDef, list: &ListExpr) {
    let origin = list.values[0].origin.clone();
    if list.values.len() < 2 {
        gamedata.add_error(origin, "proc statement must contain at least one statement.");
        return;
    }
    for (i, value) in list.values.iter().enumerate().skip(1) {
        process_value(gamedata, function, value);
        if i + 1 < list.values.len() {
            function.add_opcode(origin.clone(), Opcode::StackPop);
        }
    }
}

/// `(while c body)`.
fn stmt_while(gamedata: &mut GameData, function: &mut FunctionDef, list: &ListExpr) {
    let origin = list.values[0].origin.clone();
    if list.values.len() != 3 {
        gamedata.add_error(origin, "While statement must have three expressions.");
        return;
    }

    let start_label = function.fresh_label();
    let after_label = function.fresh_label();
    function.continue_labels.push(start_label.clone());
    function.break_labels.push(after_label.clone());

    function.add_label(origin.clone(), start_label.clone());
    process_value(gamedata, function, &list.values[1]);
    function.add_value(origin.clone(), Value::symbol(after_label.clone()));
    function.add_opcode(origin.clone(), Opcode::JumpZero);
    process_value(gamedata, function, &list.values[2]);
    function.add_opcode(origin.clone(), Opcode::StackPop);
    function.add_value(origin.clone(), Value::symbol(start_label));
    function.add_opcode(origin.clone(), Opcode::Jump);
    function.add_label(origin.clone(), after_label);
    function.add_value(origin, Value::integer(0));

    function.continue_labels.pop();
    function.break_labels.pop();
}

/// `(do_while body c)` — the body runs before the first test.
fn stmt_do_while(gamedata: &mut GameData, function: &mut FunctionDef, list: &ListExpr) {
    let origin = list.values[0].origin.clone();
    if list.values.len() != 3 {
        gamedata.add_error(origin, "While statement must have three expressions.");
        return;
    }

    let start_label = function.fresh_label();
    let condition_label = function.fresh_label();
    let after_label = function.fresh_label();
    function.continue_labels.push(condition_label.clone());
    function.break_labels.push(after_label.clone());

    function.add_label(origin.clone(), start_label.clone());
    process_value(gamedata, function, &list.values[1]);
    function.add_opcode(origin.clone(), Opcode::StackPop);
    function.add_label(origin.clone(), condition_label);
    process_value(gamedata, function, &list.values[2]);
    function.add_value(origin.clone(), Value::symbol(after_label.clone()));
    function.add_opcode(origin.clone(), Opcode::JumpZero);
    function.add_value(origin.clone(), Value::symbol(start_label));
    function.add_opcode(origin.clone(), Opcode::Jump);
    function.add_label(origin.clone(), after_label);
    function.add_value(origin, Value::integer(0));

    function.continue_labels.pop();
    function.break_labels.pop();
}

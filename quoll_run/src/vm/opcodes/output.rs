//! Text output, settings, options, and the input-request opcodes.

use crate::error::{require, require_either, VmError};
use crate::vm::machine::{GameOption, OptionKind, Vm, INFO_TITLE};
use quoll_common::text::upper_first;
use quoll_common::{TypeTag, Value};

pub fn handle_say(vm: &mut Vm) -> Result<(), VmError> {
    let value = vm.pop()?;
    vm.say(&value)
}

pub fn handle_say_uc_first(vm: &mut Vm) -> Result<(), VmError> {
    let value = vm.pop()?;
    if value.tag == TypeTag::String {
        let text = upper_first(&vm.game.string(value.payload)?.text);
        vm.append_text(&text);
        Ok(())
    } else {
        vm.say(&value)
    }
}

pub fn handle_say_unsigned(vm: &mut Vm) -> Result<(), VmError> {
    let value = vm.pop()?;
    require(&value, TypeTag::Integer)?;
    let text = (value.payload as u32).to_string();
    vm.append_text(&text);
    Ok(())
}

pub fn handle_say_char(vm: &mut Vm) -> Result<(), VmError> {
    let value = vm.pop()?;
    require(&value, TypeTag::Integer)?;
    let c = u32::try_from(value.payload)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| VmError::game("say_char requires a valid codepoint."))?;
    let mut buffer = [0u8; 4];
    let text = c.encode_utf8(&mut buffer).to_string();
    vm.append_text(&text);
    Ok(())
}

/// Setting numbers: 0 is the save-allowed flag; 1–4 are the info-strip
/// slots (left, right, footer, title).
fn info_slot(setting: i32) -> Option<usize> {
    match setting {
        1..=3 => Some(setting as usize),
        4 => Some(INFO_TITLE),
        _ => None,
    }
}

pub fn handle_get_setting(vm: &mut Vm) -> Result<(), VmError> {
    let setting = vm.pop()?;
    require(&setting, TypeTag::Integer)?;
    if setting.payload == 0 {
        let allowed = if vm.save_allowed { 1 } else { 0 };
        return vm.push(Value::integer(allowed));
    }
    match info_slot(setting.payload) {
        Some(slot) => {
            let text = vm.info_text[slot].clone();
            let value = vm.game.make_string(text);
            vm.push(value)
        }
        None => Err(VmError::game(format!(
            "Unknown setting number {}.",
            setting.payload
        ))),
    }
}

pub fn handle_set_setting(vm: &mut Vm) -> Result<(), VmError> {
    let setting = vm.pop()?;
    let value = vm.pop()?;
    require(&setting, TypeTag::Integer)?;
    if setting.payload == 0 {
        vm.save_allowed = value.is_true();
        return Ok(());
    }
    match info_slot(setting.payload) {
        Some(slot) => {
            vm.info_text[slot] = match value.tag {
                TypeTag::None => String::new(),
                _ => vm.render(&value)?,
            };
            Ok(())
        }
        None => Err(VmError::game(format!(
            "Unknown setting number {}.",
            setting.payload
        ))),
    }
}

pub fn handle_get_key(vm: &mut Vm) -> Result<(), VmError> {
    vm.request_input(OptionKind::Key);
    Ok(())
}

pub fn handle_get_line(vm: &mut Vm) -> Result<(), VmError> {
    vm.request_input(OptionKind::Line);
    Ok(())
}

/// `get_option` records the option-filtering function and asks for a
/// choice.
pub fn handle_get_option(vm: &mut Vm) -> Result<(), VmError> {
    let function = vm.pop()?;
    require(&function, TypeTag::Function)?;
    vm.option_function = function.payload as u32;
    vm.request_input(OptionKind::Choice);
    Ok(())
}

/// `add_option text value extra hotkey` — hotkey may be None for
/// auto-numbered options.
pub fn handle_add_option(vm: &mut Vm) -> Result<(), VmError> {
    let text = vm.pop()?;
    let value = vm.pop()?;
    let extra = vm.pop()?;
    let hotkey = vm.pop()?;
    require(&text, TypeTag::String)?;
    require_either(&hotkey, TypeTag::Integer, TypeTag::None)?;
    vm.options.push(GameOption {
        text: text.payload as u32,
        value,
        extra,
        hotkey: if hotkey.tag == TypeTag::None {
            -1
        } else {
            hotkey.payload
        },
    });
    Ok(())
}

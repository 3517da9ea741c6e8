//! The interpreter: a stack machine over the decoded game data.
//!
//! Execution is cooperative. The input opcodes do not block; they record
//! the expected input kind and execution continues until control returns
//! out of the function that asked, at which point the loop suspends and
//! reports the kind to the host. The host answers with [`Vm::resume`].

use crate::error::{require, FrameSnapshot, RuntimeError, VmError};
use crate::gamedata::GameData;
use crate::storage::FileStore;
use crate::vm::frame::Frame;
use crate::vm::opcodes;
use quoll_common::opcode::Opcode;
use quoll_common::{TypeTag, Value};

/// Hard cap on instructions per host turn.
pub const MAX_RUNTIME: u32 = 1_000_000_000;

/// What the host is being asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    None,
    Choice,
    Key,
    Line,
    EndOfProgram,
}

/// One entry of the option list built by `AddOption`.
#[derive(Debug, Clone)]
pub struct GameOption {
    pub text: u32,
    pub value: Value,
    pub extra: Value,
    pub hotkey: i32,
}

/// Info-strip slots: title, left, right, bottom.
pub const INFO_TITLE: usize = 0;
pub const INFO_LEFT: usize = 1;
pub const INFO_RIGHT: usize = 2;
pub const INFO_BOTTOM: usize = 3;

enum ExecOutcome {
    Finished(Value),
    Suspended(OptionKind),
}

pub struct Vm {
    pub game: GameData,
    pub frames: Vec<Frame>,
    pub option_type: OptionKind,
    pub options: Vec<GameOption>,
    pub option_function: u32,
    pub option_extra: Value,
    pub text_buffer: String,
    pub info_text: [String; 4],
    pub instruction_count: u32,
    pub save_allowed: bool,
    pending_suspend: Option<(OptionKind, usize)>,
    store: Box<dyn FileStore>,
    rng: u64,
    last_result: Value,
}

impl Vm {
    pub fn new(game: GameData, store: Box<dyn FileStore>) -> Self {
        let seed = u64::from(game.build_number) | 0x9E37_79B9_7F4A_7C15;
        Vm {
            game,
            frames: Vec::new(),
            option_type: OptionKind::None,
            options: Vec::new(),
            option_function: 0,
            option_extra: Value::none(),
            text_buffer: String::new(),
            info_text: Default::default(),
            instruction_count: 0,
            save_allowed: false,
            pending_suspend: None,
            store,
            rng: seed,
            last_result: Value::none(),
        }
    }

    /// Replace the random stream; tests use a fixed seed.
    pub fn set_random_seed(&mut self, seed: u64) {
        self.rng = seed | 1;
    }

    pub fn next_random(&mut self) -> u64 {
        // xorshift64
        let mut x = self.rng;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.rng = x;
        x
    }

    /// The value the most recent completed function handed back.
    pub fn result(&self) -> Value {
        self.last_result
    }

    /// Begin execution at the gamefile's main function.
    pub fn start(&mut self) -> Result<OptionKind, RuntimeError> {
        let main = self.game.main_function;
        self.reset_turn();
        self.push_frame(main as i32, vec![Value::none()])
            .map_err(|error| self.unwind(error))?;
        self.run(0)
    }

    /// Continue after a suspension, optionally pushing the host's answer
    /// onto the waiting frame's stack.
    pub fn resume(&mut self, value: Option<Value>) -> Result<OptionKind, RuntimeError> {
        if self.frames.is_empty() {
            self.option_type = OptionKind::EndOfProgram;
            return Ok(OptionKind::EndOfProgram);
        }
        self.reset_turn();
        if let Some(value) = value {
            match self.frame_mut() {
                Ok(frame) => frame.stack.push(value),
                Err(error) => return Err(self.unwind(error)),
            }
        }
        self.run(0)
    }

    /// Run a single function to completion and hand back its value. Used
    /// by the host for option-filter functions and by tests; a suspension
    /// inside the call is an error.
    pub fn call_function(&mut self, id: u32, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let floor = self.frames.len();
        let mut full_args = vec![Value::none()];
        full_args.extend(args);
        self.instruction_count = 0;
        self.push_frame(id as i32, full_args)
            .map_err(|error| self.unwind(error))?;
        match self.execute(floor) {
            Ok(ExecOutcome::Finished(value)) => Ok(value),
            Ok(ExecOutcome::Suspended(_)) => Err(self.unwind(VmError::SuspendedInNestedCall)),
            Err(error) => Err(self.unwind(error)),
        }
    }

    fn run(&mut self, floor: usize) -> Result<OptionKind, RuntimeError> {
        match self.execute(floor) {
            Ok(ExecOutcome::Finished(_)) => {
                self.option_type = OptionKind::EndOfProgram;
                self.pending_suspend = None;
                Ok(OptionKind::EndOfProgram)
            }
            Ok(ExecOutcome::Suspended(kind)) => Ok(kind),
            Err(error) => Err(self.unwind(error)),
        }
    }

    fn reset_turn(&mut self) {
        self.text_buffer.clear();
        self.options.clear();
        self.option_type = OptionKind::None;
        self.instruction_count = 0;
    }

    /// Capture the call stack, then drop every frame.
    fn unwind(&mut self, error: VmError) -> RuntimeError {
        let trace = self.snapshot();
        self.frames.clear();
        self.pending_suspend = None;
        RuntimeError { error, trace }
    }

    fn snapshot(&self) -> Vec<FrameSnapshot> {
        self.frames
            .iter()
            .rev()
            .map(|frame| {
                let name = self
                    .game
                    .function(frame.function_id as i32)
                    .ok()
                    .filter(|f| f.info.src_name >= 0)
                    .and_then(|f| self.game.string(f.info.src_name).ok())
                    .map(|s| s.text.clone());
                FrameSnapshot {
                    function_id: frame.function_id,
                    name,
                    ip: frame.ip,
                    locals: frame.stack.locals.clone(),
                    stack: frame.stack.values.clone(),
                }
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Frame plumbing used by the opcode handlers
    // ------------------------------------------------------------------

    pub fn frame(&self) -> Result<&Frame, VmError> {
        self.frames.last().ok_or(VmError::StackUnderflow)
    }

    pub fn frame_mut(&mut self) -> Result<&mut Frame, VmError> {
        self.frames.last_mut().ok_or(VmError::StackUnderflow)
    }

    pub fn push(&mut self, value: Value) -> Result<(), VmError> {
        self.frame_mut()?.stack.push(value);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<Value, VmError> {
        self.frame_mut()?.stack.pop()
    }

    pub fn pop_raw(&mut self) -> Result<Value, VmError> {
        self.frame_mut()?.stack.pop_raw()
    }

    /// Install the expected input kind; delivered when control returns
    /// out of the current function.
    pub fn request_input(&mut self, kind: OptionKind) {
        self.pending_suspend = Some((kind, self.frames.len()));
    }

    pub fn append_text(&mut self, text: &str) {
        self.text_buffer.push_str(text);
    }

    /// Render a value the way the say opcodes do.
    pub fn render(&self, value: &Value) -> Result<String, VmError> {
        Ok(match value.tag {
            TypeTag::String => self.game.string(value.payload)?.text.clone(),
            TypeTag::Integer => value.payload.to_string(),
            TypeTag::Vocab => self
                .game
                .vocab
                .get(value.payload as usize)
                .cloned()
                .unwrap_or_else(|| format!("<Vocab {}>", value.payload)),
            _ => format!("<{}: {}>", value.tag, value.payload),
        })
    }

    pub fn say(&mut self, value: &Value) -> Result<(), VmError> {
        let text = self.render(value)?;
        self.text_buffer.push_str(&text);
        Ok(())
    }

    fn push_frame(&mut self, function_id: i32, args: Vec<Value>) -> Result<(), VmError> {
        let function = self.game.function(function_id)?;
        let position = function.position as usize;
        let arg_count = function.arg_count as usize;
        let local_count = function.local_count as usize;
        let mut frame = Frame::new(function_id as u32, position);
        frame.stack.set_args(args, arg_count, local_count);
        self.frames.push(frame);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Bytecode operand reads
    // ------------------------------------------------------------------

    fn read_code_8(&mut self) -> Result<u8, VmError> {
        let frame = self.frames.last_mut().ok_or(VmError::StackUnderflow)?;
        let byte = self
            .game
            .bytecode
            .read_8(frame.ip)
            .ok_or(VmError::EndOfBytecode(frame.ip))?;
        frame.ip += 1;
        Ok(byte)
    }

    fn read_code_16(&mut self) -> Result<u16, VmError> {
        let frame = self.frames.last_mut().ok_or(VmError::StackUnderflow)?;
        let word = self
            .game
            .bytecode
            .read_16(frame.ip)
            .ok_or(VmError::EndOfBytecode(frame.ip))?;
        frame.ip += 2;
        Ok(word)
    }

    fn read_code_32(&mut self) -> Result<u32, VmError> {
        let frame = self.frames.last_mut().ok_or(VmError::StackUnderflow)?;
        let word = self
            .game
            .bytecode
            .read_32(frame.ip)
            .ok_or(VmError::EndOfBytecode(frame.ip))?;
        frame.ip += 4;
        Ok(word)
    }

    fn read_code_tag(&mut self) -> Result<TypeTag, VmError> {
        let byte = self.read_code_8()?;
        TypeTag::try_from(byte).map_err(|_| VmError::BadTypeTag(byte))
    }

    /// Set the instruction pointer to a function-local offset.
    pub fn jump_to(&mut self, target: &Value) -> Result<(), VmError> {
        require(target, TypeTag::JumpTarget)?;
        if target.payload < 0 {
            return Err(VmError::game("Jump target out of range."));
        }
        let frame = self.frames.last_mut().ok_or(VmError::StackUnderflow)?;
        frame.ip = frame.base + target.payload as usize;
        Ok(())
    }

    // ------------------------------------------------------------------
    // The interpreter loop
    // ------------------------------------------------------------------

    /// Execute until the frame count drops to `floor` (the started
    /// function returned), a suspension is delivered, or an error.
    fn execute(&mut self, floor: usize) -> Result<ExecOutcome, VmError> {
        loop {
            if self.frames.len() <= floor {
                return Ok(ExecOutcome::Finished(self.last_result));
            }
            if self.instruction_count >= MAX_RUNTIME {
                let frame = self.frame()?;
                return Err(VmError::RuntimeExceeded {
                    ip: frame.ip,
                    offset: frame.ip - frame.base,
                });
            }
            self.instruction_count += 1;

            let byte = self.read_code_8()?;
            let opcode = Opcode::try_from(byte).map_err(|_| VmError::UnknownOpcode(byte))?;
            log::trace!("ip {} opcode {}", self.frame()?.ip - 1, opcode);

            match opcode {
                Opcode::Return => {
                    let value = if self.frame()?.stack.values.is_empty() {
                        Value::none()
                    } else {
                        self.pop()?
                    };
                    self.frames.pop();
                    self.last_result = value;

                    if self.frames.len() <= floor {
                        return Ok(ExecOutcome::Finished(value));
                    }
                    if let Some((kind, depth)) = self.pending_suspend {
                        if self.frames.len() < depth {
                            self.pending_suspend = None;
                            self.option_type = kind;
                            return Ok(ExecOutcome::Suspended(kind));
                        }
                    }
                    self.frame_mut()?.stack.push(value);
                }

                Opcode::Push0 => {
                    let tag = self.read_code_tag()?;
                    self.push(Value::new(tag, 0))?;
                }
                Opcode::Push1 => {
                    let tag = self.read_code_tag()?;
                    self.push(Value::new(tag, 1))?;
                }
                Opcode::PushNone => self.push(Value::none())?,
                Opcode::Push8 => {
                    let tag = self.read_code_tag()?;
                    let value = self.read_code_8()? as i8 as i32;
                    self.push(Value::new(tag, value))?;
                }
                Opcode::Push16 => {
                    let tag = self.read_code_tag()?;
                    let value = self.read_code_16()? as i16 as i32;
                    self.push(Value::new(tag, value))?;
                }
                Opcode::Push32 => {
                    let tag = self.read_code_tag()?;
                    let value = self.read_code_32()? as i32;
                    self.push(Value::new(tag, value))?;
                }

                Opcode::Call => {
                    let callee = self.pop()?;
                    let arg_count = self.pop()?;
                    require(&callee, TypeTag::Function)?;
                    require(&arg_count, TypeTag::Integer)?;
                    let mut args = Vec::with_capacity(arg_count.payload.max(0) as usize + 1);
                    if callee.self_obj > 0 {
                        args.push(Value::new(TypeTag::Object, callee.self_obj as i32));
                    } else {
                        args.push(Value::none());
                    }
                    for _ in 0..arg_count.payload.max(0) {
                        args.push(self.pop()?);
                    }
                    self.push_frame(callee.payload, args)?;
                }

                Opcode::Store => opcodes::stack_ops::handle_store(self)?,
                Opcode::CollectGarbage => {
                    let collected = crate::vm::gc::collect(self);
                    self.push(Value::integer(collected as i32))?;
                }

                Opcode::SayUCFirst => opcodes::output::handle_say_uc_first(self)?,
                Opcode::Say => opcodes::output::handle_say(self)?,
                Opcode::SayUnsigned => opcodes::output::handle_say_unsigned(self)?,
                Opcode::SayChar => opcodes::output::handle_say_char(self)?,

                Opcode::StackPop => opcodes::stack_ops::handle_stack_pop(self)?,
                Opcode::StackDup => opcodes::stack_ops::handle_stack_dup(self)?,
                Opcode::StackPeek => opcodes::stack_ops::handle_stack_peek(self)?,
                Opcode::StackSize => opcodes::stack_ops::handle_stack_size(self)?,
                Opcode::StackSwap => opcodes::stack_ops::handle_stack_swap(self)?,

                Opcode::IsValid => opcodes::misc::handle_is_valid(self)?,
                Opcode::ListPush => opcodes::collections::handle_list_push(self)?,
                Opcode::ListPop => opcodes::collections::handle_list_pop(self)?,
                Opcode::Sort => opcodes::collections::handle_sort(self)?,
                Opcode::GetItem => opcodes::collections::handle_get_item(self)?,
                Opcode::HasItem => opcodes::collections::handle_has_item(self)?,
                Opcode::GetSize => opcodes::collections::handle_get_size(self)?,
                Opcode::SetItem => opcodes::collections::handle_set_item(self)?,
                Opcode::DelItem => opcodes::collections::handle_del_item(self)?,
                Opcode::InsItem => opcodes::collections::handle_ins_item(self)?,
                Opcode::IndexOf => opcodes::collections::handle_index_of(self)?,
                Opcode::GetRandom => opcodes::collections::handle_get_random(self)?,
                Opcode::GetKeys => opcodes::collections::handle_get_keys(self)?,

                Opcode::TypeOf => opcodes::misc::handle_type_of(self)?,
                Opcode::AsType => opcodes::misc::handle_as_type(self)?,

                Opcode::Equal => opcodes::comparison::handle_equal(self)?,
                Opcode::NotEqual => opcodes::comparison::handle_not_equal(self)?,
                Opcode::LessThan => opcodes::comparison::handle_less_than(self)?,
                Opcode::LessThanEqual => opcodes::comparison::handle_less_than_equal(self)?,
                Opcode::GreaterThan => opcodes::comparison::handle_greater_than(self)?,
                Opcode::GreaterThanEqual => {
                    opcodes::comparison::handle_greater_than_equal(self)?
                }

                Opcode::Jump => opcodes::jump::handle_jump(self)?,
                Opcode::JumpZero => opcodes::jump::handle_jump_zero(self)?,
                Opcode::JumpNotZero => opcodes::jump::handle_jump_not_zero(self)?,

                Opcode::Not => opcodes::arithmetic::handle_not(self)?,
                Opcode::Add => opcodes::arithmetic::handle_add(self)?,
                Opcode::Sub => opcodes::arithmetic::handle_sub(self)?,
                Opcode::Mult => opcodes::arithmetic::handle_mult(self)?,
                Opcode::Div => opcodes::arithmetic::handle_div(self)?,
                Opcode::Mod => opcodes::arithmetic::handle_mod(self)?,
                Opcode::Pow => opcodes::arithmetic::handle_pow(self)?,
                Opcode::BitLeft => opcodes::arithmetic::handle_bit_left(self)?,
                Opcode::BitRight => opcodes::arithmetic::handle_bit_right(self)?,
                Opcode::BitAnd => opcodes::arithmetic::handle_bit_and(self)?,
                Opcode::BitOr => opcodes::arithmetic::handle_bit_or(self)?,
                Opcode::BitXor => opcodes::arithmetic::handle_bit_xor(self)?,
                Opcode::BitNot => opcodes::arithmetic::handle_bit_not(self)?,
                Opcode::Random => opcodes::misc::handle_random(self)?,

                Opcode::NextObject => opcodes::objects::handle_next_object(self)?,

                Opcode::GetSetting => opcodes::output::handle_get_setting(self)?,
                Opcode::SetSetting => opcodes::output::handle_set_setting(self)?,
                Opcode::GetKey => opcodes::output::handle_get_key(self)?,
                Opcode::GetOption => opcodes::output::handle_get_option(self)?,
                Opcode::GetLine => opcodes::output::handle_get_line(self)?,
                Opcode::AddOption => opcodes::output::handle_add_option(self)?,

                Opcode::StringClear => opcodes::strings::handle_string_clear(self)?,
                Opcode::StringAppend => opcodes::strings::handle_string_append(self)?,
                Opcode::StringAppendUF => opcodes::strings::handle_string_append_uf(self)?,
                Opcode::StringLength => opcodes::strings::handle_string_length(self)?,
                Opcode::StringCompare => opcodes::strings::handle_string_compare(self)?,
                Opcode::EncodeString => opcodes::strings::handle_encode_string(self)?,
                Opcode::DecodeString => opcodes::strings::handle_decode_string(self)?,
                Opcode::Tokenize => opcodes::strings::handle_tokenize(self)?,

                Opcode::Error => {
                    let message = self.pop()?;
                    require(&message, TypeTag::String)?;
                    let text = self.game.string(message.payload)?.text.clone();
                    return Err(VmError::Game(text));
                }
                Opcode::Origin => opcodes::misc::handle_origin(self)?,
                Opcode::New => opcodes::misc::handle_new(self)?,
                Opcode::IsStatic => opcodes::misc::handle_is_static(self)?,

                Opcode::FileList => opcodes::files::handle_file_list(self)?,
                Opcode::FileRead => opcodes::files::handle_file_read(self)?,
                Opcode::FileWrite => opcodes::files::handle_file_write(self)?,
                Opcode::FileDelete => opcodes::files::handle_file_delete(self)?,
            }
        }
    }

    // ------------------------------------------------------------------
    // Storage plumbing for the file opcodes
    // ------------------------------------------------------------------

    pub fn store(&self) -> &dyn FileStore {
        self.store.as_ref()
    }

    pub fn store_mut(&mut self) -> &mut dyn FileStore {
        self.store.as_mut()
    }
}

#[cfg(test)]
#[path = "test/machine_tests.rs"]
mod tests;

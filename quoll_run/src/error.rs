//! Runtime and load errors.

use quoll_common::{TypeTag, Value};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures while decoding a gamefile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("not a valid gamefile")]
    NotAGamefile,
    #[error("gamefile has format version {0}, but only version 0 is supported")]
    UnsupportedVersion(u32),
    #[error("unexpected end of gamefile at offset {0}")]
    Truncated(usize),
    #[error("invalid type tag {0} in gamefile")]
    BadTag(u8),
    #[error("gamefile string is not valid UTF-8")]
    BadString,
    #[error("trailing data after end of game data")]
    TrailingData,
}

/// The failure kinds the interpreter can raise.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    #[error("Stack underflow.")]
    StackUnderflow,
    #[error("Expected value of type {expected}, but found value of type {found}.")]
    TypeMismatch { expected: TypeTag, found: TypeTag },
    #[error("Tried to access invalid {kind} number {index}.")]
    BadIndex { kind: &'static str, index: i32 },
    #[error("Illegal local number {0}.")]
    BadLocal(i32),
    #[error("Division by zero.")]
    DivisionByZero,
    #[error("Unrecognized opcode {0}.")]
    UnknownOpcode(u8),
    #[error("Invalid type tag {0} in bytecode.")]
    BadTypeTag(u8),
    #[error("Unexpected end of bytecode at IP:{0}.")]
    EndOfBytecode(usize),
    #[error("Function exceeded max runtime at IP:{ip} (local offset: {offset}).")]
    RuntimeExceeded { ip: usize, offset: usize },
    #[error("Input requested during a nested call.")]
    SuspendedInNestedCall,
    #[error("{0}")]
    Game(String),
}

impl VmError {
    pub fn game(message: impl Into<String>) -> Self {
        VmError::Game(message.into())
    }
}

/// Check a value's tag, mirroring the `requireType` contract.
pub fn require(value: &Value, expected: TypeTag) -> Result<(), VmError> {
    if value.tag == expected {
        Ok(())
    } else {
        Err(VmError::TypeMismatch {
            expected,
            found: value.tag,
        })
    }
}

/// Accept either of two tags.
pub fn require_either(value: &Value, one: TypeTag, two: TypeTag) -> Result<(), VmError> {
    if value.tag == one || value.tag == two {
        Ok(())
    } else {
        Err(VmError::TypeMismatch {
            expected: one,
            found: value.tag,
        })
    }
}

/// One frame of a captured call stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub function_id: u32,
    pub name: Option<String>,
    pub ip: usize,
    pub locals: Vec<Value>,
    pub stack: Vec<Value>,
}

/// A runtime failure with the call stack captured at the point of the
/// error. All frames are unwound before this reaches the host.
#[derive(Debug, Clone, Error)]
#[error("{error}")]
pub struct RuntimeError {
    pub error: VmError,
    pub trace: Vec<FrameSnapshot>,
}

impl RuntimeError {
    pub fn report(&self) -> String {
        use std::fmt::Write;
        let mut out = String::new();
        let _ = writeln!(out, "RUNTIME ERROR: {}", self.error);
        let _ = writeln!(out, "CALL STACK:");
        if self.trace.is_empty() {
            let _ = writeln!(out, "    EMPTY");
        }
        for frame in &self.trace {
            let name = frame.name.as_deref().unwrap_or("(no debug info)");
            let _ = writeln!(out, "    {} #{} IP:{}", name, frame.function_id, frame.ip);
            let _ = write!(out, "        LOCAL:");
            for value in &frame.locals {
                let _ = write!(out, " {}", value);
            }
            let _ = writeln!(out);
            let _ = write!(out, "        STACK:");
            for value in &frame.stack {
                let _ = write!(out, " {}", value);
            }
            let _ = writeln!(out);
        }
        out
    }
}

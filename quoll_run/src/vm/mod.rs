//! The virtual machine: frames, the interpreter loop, and the opcode
//! handlers split by family.

pub mod frame;
pub mod gc;
pub mod machine;
pub mod opcodes;

pub use frame::{Frame, FrameStack};
pub use machine::{GameOption, OptionKind, Vm, MAX_RUNTIME};
pub use machine::{INFO_BOTTOM, INFO_LEFT, INFO_RIGHT, INFO_TITLE};

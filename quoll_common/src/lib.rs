//! Shared definitions for the QuollVM toolchain.
//!
//! Everything the compiler and the runner must agree on lives here: the
//! type-tag registry, the opcode table, the little-endian byte buffer both
//! sides build bytecode in, source origins, and the gamefile constants.

pub mod bytestream;
pub mod gamefile;
pub mod opcode;
pub mod origin;
pub mod tag;
pub mod text;
pub mod value;

pub use bytestream::ByteStream;
pub use opcode::{Opcode, OpcodeDef};
pub use origin::Origin;
pub use tag::TypeTag;
pub use value::Value;

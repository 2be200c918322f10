//! Diagnostics for the vine toolchain.
//!
//! Every phase reports failures as a [`Diagnostic`]: a message, the phase
//! that produced it ([`DiagnosticKind`]) and, when known, a [`Location`]
//! (file, line, column). The rendered form is stable and used by golden
//! output tests:
//!
//! ```text
//! [Line 3, Column 9] Interpreter Error: variable total is not defined
//! ```

mod diagnostic;
pub mod emitter;
mod line_index;

pub use diagnostic::{Diagnostic, DiagnosticKind, Location};
pub use line_index::LineIndex;

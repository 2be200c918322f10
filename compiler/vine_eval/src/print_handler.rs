//! Where `print` output goes.
//!
//! The binary writes to stdout; tests and the golden-output runner capture
//! into a buffer. Task threads print concurrently, so every line is written
//! in one locked call.

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;

/// Print handler using enum dispatch; the set of sinks is closed.
pub enum PrintHandler {
    Stdout,
    Buffer(Mutex<String>),
    Silent,
}

/// Print handler shared by the interpreter and every task thread.
pub type SharedPrintHandler = Arc<PrintHandler>;

impl PrintHandler {
    /// Write `msg` followed by a newline.
    pub fn println(&self, msg: &str) {
        match self {
            Self::Stdout => {
                let mut out = std::io::stdout().lock();
                let _ = writeln!(out, "{msg}");
                let _ = out.flush();
            }
            Self::Buffer(buf) => {
                let mut buf = buf.lock();
                buf.push_str(msg);
                buf.push('\n');
            }
            Self::Silent => {}
        }
    }

    /// Captured output; empty for sinks that do not capture.
    pub fn output(&self) -> String {
        match self {
            Self::Buffer(buf) => buf.lock().clone(),
            Self::Stdout | Self::Silent => String::new(),
        }
    }

    pub fn clear(&self) {
        if let Self::Buffer(buf) = self {
            buf.lock().clear();
        }
    }
}

pub fn stdout_handler() -> SharedPrintHandler {
    Arc::new(PrintHandler::Stdout)
}

pub fn buffer_handler() -> SharedPrintHandler {
    Arc::new(PrintHandler::Buffer(Mutex::new(String::new())))
}

pub fn silent_handler() -> SharedPrintHandler {
    Arc::new(PrintHandler::Silent)
}

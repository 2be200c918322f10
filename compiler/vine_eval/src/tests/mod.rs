//! Larger test suites kept out of their implementation files.

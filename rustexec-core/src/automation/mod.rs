//! Automation of interactive prompts
//!
//! Answers privilege-escalation password prompts on a process's input
//! stream while its output is being read.

mod prompt;

pub use prompt::{
    DEFAULT_PASSWORD_PROMPT, MAX_WINDOW_BYTES, MIN_WINDOW_BYTES, PromptPattern, PromptResponder,
    PromptScanningReader, validate_prompt_pattern,
};

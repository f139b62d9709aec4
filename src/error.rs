/*
 * error.rs
 *
 * Short list. The panic path itself has no errors: every sub-step degrades
 * to a placeholder. What's left is misconfiguration at startup.
 */

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanicError {
    /// `install` called on a registry that already has a hook.
    HookAlreadyInstalled,
}

impl fmt::Display for PanicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HookAlreadyInstalled => {
                write!(f, "panic hook already installed; it can only be set once")
            }
        }
    }
}

impl std::error::Error for PanicError {}

pub type Result<T> = core::result::Result<T, PanicError>;

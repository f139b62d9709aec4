/*
 * hook.rs
 *
 * The one function that runs on every panic.
 *
 * Starts out as the default handler. install() may replace it once, early,
 * before anything can panic; a second install() is a configuration error and
 * comes back as Err. No lock: the read on the panic path is one Acquire load.
 *
 * With the runtime-hook feature there's a second, mutable layer on top for
 * dynamically loaded units that want their own behaviour. replace() is NOT
 * synchronized against a panic that's already in flight on another thread.
 * making sure nothing is panicking while you swap is on the caller.
 *
 * Resolution order: runtime hook, installed hook, default handler.
 */

#[cfg(feature = "runtime-hook")]
use core::sync::atomic::{AtomicPtr, Ordering};

#[cfg(feature = "hook-override")]
use crate::error::{PanicError, Result};
use crate::handler::default_handler;
use crate::location::SourceLocation;
use crate::payload::ReportPayload;
#[cfg(feature = "hook-override")]
use crate::sync::OnceSlot;

/// Signature of a panic hook: message, payload, call site.
///
/// Hooks are expected not to return. If one does, the entry point aborts.
pub type PanicHook = fn(&str, ReportPayload<'_>, SourceLocation<'_>);

/// Holds the active hook. The process has one in [`registry`]; tests can
/// build their own.
pub struct HookRegistry {
    #[cfg(feature = "hook-override")]
    installed: OnceSlot<PanicHook>,
    #[cfg(feature = "runtime-hook")]
    runtime: AtomicPtr<()>,
}

impl HookRegistry {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            #[cfg(feature = "hook-override")]
            installed: OnceSlot::new(),
            #[cfg(feature = "runtime-hook")]
            runtime: AtomicPtr::new(core::ptr::null_mut()),
        }
    }

    /// The hook a panic raised right now would run. Never fails.
    #[inline]
    pub fn current(&self) -> PanicHook {
        #[cfg(feature = "runtime-hook")]
        if let Some(hook) = self.runtime_hook() {
            return hook;
        }

        #[cfg(feature = "hook-override")]
        if let Some(hook) = self.installed.get() {
            return *hook;
        }

        default_handler
    }

    /// Whether anything other than the default handler is active.
    pub fn is_overridden(&self) -> bool {
        #[cfg(feature = "runtime-hook")]
        if self.runtime_hook().is_some() {
            return true;
        }

        #[cfg(feature = "hook-override")]
        if self.installed.is_claimed() {
            return true;
        }

        false
    }

    /// Replace the default handler. Works once per registry.
    ///
    /// # Errors
    ///
    /// [`PanicError::HookAlreadyInstalled`] if a hook was installed before.
    #[cfg(feature = "hook-override")]
    pub fn install(&self, hook: PanicHook) -> Result<()> {
        match self.installed.set(hook) {
            Ok(()) => {
                log::debug!("panic hook installed");
                Ok(())
            }
            Err(_) => {
                log::warn!("panic hook already installed, ignoring second install");
                Err(PanicError::HookAlreadyInstalled)
            }
        }
    }

    /// Swap the runtime hook, returning the previous one. `None` removes
    /// it and falls back to the installed hook or the default handler.
    ///
    /// Not synchronized with panics in flight on other threads: a panic that
    /// already resolved its hook keeps running the old one.
    #[cfg(feature = "runtime-hook")]
    pub fn replace(&self, hook: Option<PanicHook>) -> Option<PanicHook> {
        let raw = hook.map_or(core::ptr::null_mut(), |h| h as *mut ());
        let previous = self.runtime.swap(raw, Ordering::AcqRel);
        log::debug!("runtime panic hook {}", if raw.is_null() { "cleared" } else { "replaced" });
        Self::from_raw(previous)
    }

    #[cfg(feature = "runtime-hook")]
    #[inline]
    fn runtime_hook(&self) -> Option<PanicHook> {
        Self::from_raw(self.runtime.load(Ordering::Acquire))
    }

    #[cfg(feature = "runtime-hook")]
    #[inline]
    fn from_raw(raw: *mut ()) -> Option<PanicHook> {
        if raw.is_null() {
            return None;
        }
        // SAFETY: the only non-null values ever stored in `runtime` come from
        // `replace`, which casts a valid PanicHook fn pointer. fn pointers and
        // data pointers have the same size on every target we build for.
        Some(unsafe { core::mem::transmute::<*mut (), PanicHook>(raw) })
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL: HookRegistry = HookRegistry::new();

/// The process-wide registry consulted by [`crate::panic::panic`].
#[inline]
#[must_use]
pub fn registry() -> &'static HookRegistry {
    &GLOBAL
}

/// Install a process-wide hook. Call once, at startup.
///
/// # Errors
///
/// [`PanicError::HookAlreadyInstalled`] on the second call.
#[cfg(feature = "hook-override")]
pub fn install_hook(hook: PanicHook) -> Result<()> {
    registry().install(hook)
}

/// The process-wide active hook.
#[inline]
#[must_use]
pub fn current_hook() -> PanicHook {
    registry().current()
}

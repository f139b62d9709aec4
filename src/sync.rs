/*
 * sync.rs
 *
 * Write-once slot for the installed panic hook.
 *
 * The registry needs exactly this: publish one value, once, from whichever
 * thread gets there first; everyone else reads it without a lock. A second
 * write is a configuration error and must be reported, not silently ignored,
 * so this is set()/get() only. No get_or_init: the fallback (the default
 * handler) is resolved by the reader, never stored.
 *
 * OnceLock would do, but its set() can block behind a concurrent initializer
 * and we want the panic path to be a single Acquire load.
 */

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU8, Ordering};

/* state machine for publication */
const EMPTY: u8 = 0;
const WRITING: u8 = 1;
const PUBLISHED: u8 = 2;

/// A slot that accepts exactly one value, thread-safe, lock-free to read.
///
/// # Safety Invariants
///
/// - `EMPTY`: value is None, writable by whoever wins the CAS
/// - `WRITING`: one thread is writing; readers see "not published"
/// - `PUBLISHED`: value is Some and immutable from here on
///
/// Writers store `PUBLISHED` with `Release`, readers load with `Acquire`.
pub struct OnceSlot<T> {
    state: AtomicU8,
    value: UnsafeCell<Option<T>>,
}

// SAFETY: The UnsafeCell is only written by the single thread that won the
// EMPTY -> WRITING transition, and only read after an Acquire load observes
// PUBLISHED, which happens-after the writer's Release store. Once published
// no &mut T is ever handed out.
unsafe impl<T: Send + Sync> Sync for OnceSlot<T> {}

// SAFETY: moving the slot moves the Option<T>; sound whenever T: Send.
unsafe impl<T: Send> Send for OnceSlot<T> {}

impl<T> OnceSlot<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(EMPTY),
            value: UnsafeCell::new(None),
        }
    }

    /// The published value, if any. Never blocks.
    #[inline]
    pub fn get(&self) -> Option<&T> {
        if self.state.load(Ordering::Acquire) == PUBLISHED {
            // SAFETY: Acquire load of PUBLISHED synchronizes with the Release
            // store in set(); the value was written before that store and is
            // immutable afterwards.
            unsafe { (*self.value.get()).as_ref() }
        } else {
            None
        }
    }

    /// Whether a write has started or finished.
    #[inline]
    pub fn is_claimed(&self) -> bool {
        self.state.load(Ordering::Acquire) != EMPTY
    }

    /// Publish `value`. Gives it back if the slot was already claimed,
    /// including by a writer that hasn't finished yet.
    pub fn set(&self, value: T) -> Result<(), T> {
        if self
            .state
            .compare_exchange(EMPTY, WRITING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(value);
        }

        // SAFETY: we won EMPTY -> WRITING, so no reader can observe the cell
        // (state isn't PUBLISHED) and no other writer can reach this line.
        unsafe {
            *self.value.get() = Some(value);
        }
        self.state.store(PUBLISHED, Ordering::Release);
        Ok(())
    }
}

impl<T> Default for OnceSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}


/* -------------------------------------------------------------------------- */
/*                              kani proofs                                   */
/* -------------------------------------------------------------------------- */

#[cfg(kani)]
mod kani_proofs {
    use super::*;

    /*
     * first set() publishes, second set() is rejected and hands the value
     * back unchanged. this is the install-once contract of the registry.
     */
    #[kani::proof]
    fn verify_set_once() {
        let slot: OnceSlot<u32> = OnceSlot::new();
        let first: u32 = kani::any();
        let second: u32 = kani::any();

        kani::assert(slot.set(first).is_ok(), "first set must succeed");
        kani::assert(
            slot.state.load(Ordering::Acquire) == PUBLISHED,
            "state should be PUBLISHED after set",
        );
        kani::assert(slot.set(second) == Err(second), "second set must fail");
    }
}

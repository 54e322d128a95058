//! Per-thread execution mode.
//!
//! Every operation that touches secret scalars must run in [`Mode::Secure`]:
//! fixed-base multiplications route through blinded tables and every
//! secret-derived table lookup is a conditional-move scan. [`Mode::Fast`]
//! trades that for roughly 3x throughput and is reserved for verification,
//! which operates on public data only.

use core::{cell::Cell, marker::PhantomData};

/// Execution mode for scalar-multiplication engines.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Mode {
    /// Variable-time, public data only.
    Fast,

    /// Constant-time table accesses and blinded fixed bases.
    Secure,
}

thread_local! {
    static CURRENT: Cell<Mode> = const { Cell::new(Mode::Secure) };
}

/// Returns the calling thread's current execution mode.
///
/// Threads start in [`Mode::Secure`].
pub fn current() -> Mode {
    CURRENT.with(Cell::get)
}

/// Scoped mode switch.
///
/// Sets the calling thread's mode on construction and restores the previous
/// mode when dropped. The guard is not `Send`: it must be released on the
/// thread that created it.
#[derive(Debug)]
pub struct Scope {
    prev: Mode,
    _thread_bound: PhantomData<*const ()>,
}

impl Scope {
    /// Enter `mode` until the returned guard is dropped.
    pub fn new(mode: Mode) -> Self {
        Scope {
            prev: CURRENT.with(|c| c.replace(mode)),
            _thread_bound: PhantomData,
        }
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        CURRENT.with(|c| c.set(self.prev));
    }
}

#[cfg(test)]
mod tests {
    use super::{current, Mode, Scope};

    #[test]
    fn default_is_secure() {
        std::thread::spawn(|| assert_eq!(current(), Mode::Secure))
            .join()
            .unwrap();
    }

    #[test]
    fn scopes_nest_and_restore() {
        let outer = current();
        {
            let _fast = Scope::new(Mode::Fast);
            assert_eq!(current(), Mode::Fast);
            {
                let _secure = Scope::new(Mode::Secure);
                assert_eq!(current(), Mode::Secure);
            }
            assert_eq!(current(), Mode::Fast);
        }
        assert_eq!(current(), outer);
    }

    #[test]
    fn mode_is_per_thread() {
        let _fast = Scope::new(Mode::Fast);
        std::thread::spawn(|| assert_eq!(current(), Mode::Secure))
            .join()
            .unwrap();
        assert_eq!(current(), Mode::Fast);
    }
}

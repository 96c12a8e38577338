//! # QEMU Debug Console
//!
//! Best-effort byte sink for QEMU's `-debugcon` device on I/O port `0x402`.
//! The patcher mirrors its log output here so a session can be captured on
//! the host even when the firmware console is not visible:
//!
//! ```bash
//! qemu-system-x86_64 ... -debugcon file:patcher.log -global isa-debugcon.iobase=0x402
//! ```
//!
//! With the `enabled` feature turned off every write compiles to nothing.
//! On real hardware the port is normally unclaimed and writes are dropped.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

#[cfg(all(feature = "enabled", target_arch = "x86_64"))]
#[doc(hidden)]
pub mod sink {
    use core::fmt::{self, Write};

    /// The port number of QEMU's debug console.
    pub const DEBUGCON_PORT: u16 = 0x402;

    #[allow(clippy::inline_always)]
    #[inline(always)]
    fn putc(c: u8) {
        unsafe {
            core::arch::asm!(
                "out dx, al",
                in("dx") DEBUGCON_PORT,
                in("al") c,
                options(nomem, nostack, preserves_flags)
            );
        }
    }

    pub struct DebugconSink;

    impl Write for DebugconSink {
        #[inline]
        fn write_str(&mut self, s: &str) -> fmt::Result {
            s.bytes().for_each(putc);
            Ok(())
        }
    }

    #[doc(hidden)]
    #[inline]
    pub fn write(args: fmt::Arguments) {
        let _ = fmt::write(&mut DebugconSink, args);
    }
}

#[cfg(not(all(feature = "enabled", target_arch = "x86_64")))]
#[doc(hidden)]
pub mod sink {
    use core::fmt;

    #[doc(hidden)]
    #[inline(always)]
    #[allow(clippy::inline_always)]
    pub const fn write(_: fmt::Arguments) {}
}

/// Write `format!`-style output to the debug console without allocating.
#[macro_export]
macro_rules! debugcon_trace {
    ($($arg:tt)*) => {{
        $crate::sink::write(core::format_args!($($arg)*));
    }};
}

/// `true` if writes reach the debug port in this build.
#[must_use]
pub const fn is_enabled() -> bool {
    cfg!(all(feature = "enabled", target_arch = "x86_64"))
}

use crate::LineFault;

/// Snapshot of the kernel's per-port receive error counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaultCounters {
    pub frame: u32,
    pub overrun: u32,
    pub parity: u32,
    pub brk: u32,
    pub buf_overrun: u32,
}

impl FaultCounters {
    /// Faults whose counters moved between `earlier` and `self`.
    pub fn faults_since(&self, earlier: &FaultCounters) -> Vec<LineFault> {
        let moved = |now: u32, before: u32| now.wrapping_sub(before) != 0;

        let mut faults = Vec::new();
        if moved(self.overrun, earlier.overrun) || moved(self.buf_overrun, earlier.buf_overrun) {
            faults.push(LineFault::Overrun);
        }
        if moved(self.frame, earlier.frame) {
            faults.push(LineFault::Framing);
        }
        if moved(self.parity, earlier.parity) {
            faults.push(LineFault::Parity);
        }
        if moved(self.brk, earlier.brk) {
            faults.push(LineFault::LineBreak);
        }
        faults
    }
}

#[cfg(all(
    target_os = "linux",
    any(
        target_arch = "x86",
        target_arch = "x86_64",
        target_arch = "arm",
        target_arch = "aarch64",
        target_arch = "riscv64"
    )
))]
mod icount {
    use std::os::raw::c_int;

    use super::FaultCounters;

    /// Mirrors `struct serial_icounter_struct` from `<linux/serial.h>`.
    #[repr(C)]
    #[derive(Default)]
    #[allow(dead_code)]
    struct SerialIcounter {
        cts: c_int,
        dsr: c_int,
        rng: c_int,
        dcd: c_int,
        rx: c_int,
        tx: c_int,
        frame: c_int,
        overrun: c_int,
        parity: c_int,
        brk: c_int,
        buf_overrun: c_int,
        reserved: [c_int; 9],
    }

    const TIOCGICOUNT: u32 = 0x545D;

    /// Fails with `ENOTTY`/`EINVAL` on drivers that keep no counters (most USB adapters do).
    pub fn read(fd: i32) -> std::io::Result<FaultCounters> {
        let mut raw = SerialIcounter::default();

        // SAFETY: `raw` is a properly sized `serial_icounter_struct` owned by this frame.
        let rc = unsafe { libc::ioctl(fd, TIOCGICOUNT as _, &mut raw as *mut SerialIcounter) };
        if rc < 0 {
            return Err(std::io::Error::last_os_error());
        }

        Ok(FaultCounters {
            frame: raw.frame as u32,
            overrun: raw.overrun as u32,
            parity: raw.parity as u32,
            brk: raw.brk as u32,
            buf_overrun: raw.buf_overrun as u32,
        })
    }
}

#[cfg(all(
    target_os = "linux",
    any(
        target_arch = "x86",
        target_arch = "x86_64",
        target_arch = "arm",
        target_arch = "aarch64",
        target_arch = "riscv64"
    )
))]
pub(crate) use icount::read as read_counters;

#[cfg(not(all(
    target_os = "linux",
    any(
        target_arch = "x86",
        target_arch = "x86_64",
        target_arch = "arm",
        target_arch = "aarch64",
        target_arch = "riscv64"
    )
)))]
#[cfg_attr(not(unix), allow(dead_code))]
pub(crate) fn read_counters(_fd: i32) -> std::io::Result<FaultCounters> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "line fault counters are not available on this platform",
    ))
}

use crate::LineFault;

/// Latched line faults waiting to be reported.
///
/// Faults are one-shot: [`LineStatus::take`] hands out the highest priority
/// fault and clears only that one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineStatus(u8);

impl LineStatus {
    pub fn latch(&mut self, fault: LineFault) {
        self.0 |= fault.bit();
    }

    pub fn is_pending(&self, fault: LineFault) -> bool {
        self.0 & fault.bit() != 0
    }

    pub fn is_clear(&self) -> bool {
        self.0 == 0
    }

    pub fn take(&mut self) -> Option<LineFault> {
        let fault = LineFault::ALL
            .into_iter()
            .find(|fault| self.is_pending(*fault))?;
        self.0 &= !fault.bit();
        Some(fault)
    }

    pub fn pending(&self) -> impl Iterator<Item = LineFault> + '_ {
        LineFault::ALL
            .into_iter()
            .filter(move |fault| self.is_pending(*fault))
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_clears_one_fault_at_a_time() {
        let mut status = LineStatus::default();
        status.latch(LineFault::Parity);
        status.latch(LineFault::Overrun);
        status.latch(LineFault::Parity);

        assert_eq!(status.pending().count(), 2);
        assert_eq!(status.take(), Some(LineFault::Overrun));
        assert_eq!(status.take(), Some(LineFault::Parity));
        assert_eq!(status.take(), None);
        assert!(status.is_clear());
    }

    #[test]
    fn test_priority_follows_declaration_order() {
        let mut status = LineStatus::default();
        for fault in LineFault::ALL.iter().rev() {
            status.latch(*fault);
        }
        let reported: Vec<_> = std::iter::from_fn(|| status.take()).collect();
        assert_eq!(reported, LineFault::ALL.to_vec());
    }

    #[test]
    fn test_clear() {
        let mut status = LineStatus::default();
        status.latch(LineFault::LineBreak);
        status.clear();
        assert!(!status.is_pending(LineFault::LineBreak));
        assert_eq!(status.take(), None);
    }
}

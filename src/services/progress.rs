/// Coalesces per-item completions into percentage reports.
///
/// Reports every `every` completions and once more at 100 %, so a slow
/// consumer sees a bounded number of calls. Reported values never decrease.
pub struct ProgressReporter<F: FnMut(u8)> {
    total: usize,
    every: usize,
    completed: usize,
    last: Option<u8>,
    callback: F,
}

impl<F: FnMut(u8)> ProgressReporter<F> {
    pub fn new(total: usize, every: usize, callback: F) -> Self {
        Self {
            total,
            every: every.max(1),
            completed: 0,
            last: None,
            callback,
        }
    }

    /// Record one finished item
    pub fn record(&mut self) {
        self.completed += 1;
        if self.completed % self.every == 0 {
            self.report(self.percent());
        }
    }

    /// Report completion if it has not been reported yet
    pub fn finish(&mut self) {
        self.report(100);
    }

    fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        (100 * self.completed.min(self.total) / self.total) as u8
    }

    fn report(&mut self, percent: u8) {
        if self.last.is_some_and(|last| percent <= last) {
            return;
        }
        self.last = Some(percent);
        (self.callback)(percent);
    }
}

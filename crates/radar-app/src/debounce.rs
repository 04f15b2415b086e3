//! Trailing-edge debounce driven by explicit deadlines.

use std::time::Duration;

use tokio::time::Instant;

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(600);

/// A value with a raw side, updated on every input, and a settled side that
/// catches up once input has been quiet for `delay`.
#[derive(Debug, Clone)]
pub struct Debounced<T> {
    raw: T,
    settled: T,
    pending: Option<Instant>,
    delay: Duration,
}

impl<T: Clone + PartialEq> Debounced<T> {
    pub fn new(initial: T, delay: Duration) -> Self {
        Self {
            raw: initial.clone(),
            settled: initial,
            pending: None,
            delay,
        }
    }

    pub fn raw(&self) -> &T {
        &self.raw
    }

    pub fn settled(&self) -> &T {
        &self.settled
    }

    /// Records a new raw value and restarts the quiet period.
    pub fn input(&mut self, value: T, now: Instant) {
        self.raw = value;
        self.pending = Some(now + self.delay);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending
    }

    /// Settles the raw value if the quiet period has elapsed.
    ///
    /// Returns `true` only when the settled value actually changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.pending {
            Some(deadline) if deadline <= now => {
                self.pending = None;
                self.settle()
            }
            _ => false,
        }
    }

    /// Sets both sides to `value` and drops any pending update.
    ///
    /// Returns `true` when the settled value changed.
    pub fn reset(&mut self, value: T) -> bool {
        self.pending = None;
        self.raw = value;
        self.settle()
    }

    fn settle(&mut self) -> bool {
        if self.settled == self.raw {
            return false;
        }
        self.settled = self.raw.clone();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[tokio::test(start_paused = true)]
    async fn settles_600ms_after_last_keystroke() {
        let t0 = Instant::now();
        let mut search = Debounced::new(String::new(), SEARCH_DEBOUNCE);

        for (i, text) in ["f", "fo", "foo", "foo ", "foo b", "foo ba"].iter().enumerate() {
            let at = t0 + ms(100 * i as u64);
            search.input((*text).to_string(), at);
            assert!(!search.poll(at));
            assert_eq!(search.settled(), "");
        }

        assert!(!search.poll(t0 + ms(1099)));
        assert_eq!(search.settled(), "");
        assert_eq!(search.raw(), "foo ba");

        assert!(search.poll(t0 + ms(1100)));
        assert_eq!(search.settled(), "foo ba");
        assert!(search.deadline().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn each_keystroke_pushes_the_deadline() {
        let t0 = Instant::now();
        let mut search = Debounced::new(String::new(), SEARCH_DEBOUNCE);
        search.input("a".into(), t0);
        assert_eq!(search.deadline(), Some(t0 + ms(600)));
        search.input("ab".into(), t0 + ms(500));
        assert_eq!(search.deadline(), Some(t0 + ms(1100)));
    }

    #[tokio::test(start_paused = true)]
    async fn retyping_the_settled_value_reports_no_change() {
        let t0 = Instant::now();
        let mut search = Debounced::new("x".to_string(), SEARCH_DEBOUNCE);
        search.input("xy".into(), t0);
        search.input("x".into(), t0 + ms(100));
        assert!(!search.poll(t0 + ms(700)));
        assert!(search.deadline().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn reset_drops_pending_input() {
        let t0 = Instant::now();
        let mut search = Debounced::new("acero".to_string(), SEARCH_DEBOUNCE);
        search.input("acero n".into(), t0);
        assert!(search.reset(String::new()));
        assert_eq!(search.raw(), "");
        assert_eq!(search.settled(), "");
        assert!(search.deadline().is_none());
        assert!(!search.poll(t0 + ms(5000)));
        assert!(!search.reset(String::new()));
    }
}

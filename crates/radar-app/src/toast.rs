//! Auto-expiring notifications. Every toast carries its own deadline.

use std::time::Duration;

use tokio::time::Instant;

pub const TOAST_TTL: Duration = Duration::from_millis(4000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

/// Emission time in milliseconds since the queue was created, plus a
/// sequence number that keeps ids unique within the same millisecond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ToastId {
    pub millis: u64,
    pub seq: u64,
}

impl std::fmt::Display for ToastId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.millis, self.seq)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: ToastId,
    pub message: String,
    pub kind: ToastKind,
    pub expires_at: Instant,
}

#[derive(Debug)]
pub struct ToastQueue {
    toasts: Vec<Toast>,
    epoch: Instant,
    next_seq: u64,
    ttl: Duration,
}

impl ToastQueue {
    pub fn new(epoch: Instant) -> Self {
        Self::with_ttl(epoch, TOAST_TTL)
    }

    pub fn with_ttl(epoch: Instant, ttl: Duration) -> Self {
        Self {
            toasts: Vec::new(),
            epoch,
            next_seq: 0,
            ttl,
        }
    }

    /// Appends a toast that expires `ttl` after `now`.
    pub fn enqueue(&mut self, message: impl Into<String>, kind: ToastKind, now: Instant) -> ToastId {
        let millis = u64::try_from(now.saturating_duration_since(self.epoch).as_millis())
            .unwrap_or(u64::MAX);
        let id = ToastId {
            millis,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        let message = message.into();
        tracing::debug!(toast_id = %id, ?kind, message = %message, "toast enqueued");
        self.toasts.push(Toast {
            id,
            message,
            kind,
            expires_at: now + self.ttl,
        });
        id
    }

    /// Removes one toast early. Returns `false` if it already expired.
    pub fn dismiss(&mut self, id: ToastId) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.id != id);
        self.toasts.len() != before
    }

    /// Removes every toast whose deadline has passed and returns their ids.
    pub fn expire(&mut self, now: Instant) -> Vec<ToastId> {
        let mut expired = Vec::new();
        self.toasts.retain(|t| {
            if t.expires_at <= now {
                expired.push(t.id);
                false
            } else {
                true
            }
        });
        expired
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.toasts.iter().map(|t| t.expires_at).min()
    }

    /// Live toasts in emission order.
    pub fn visible(&self) -> &[Toast] {
        &self.toasts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[tokio::test(start_paused = true)]
    async fn toast_expires_after_ttl() {
        let t0 = Instant::now();
        let mut queue = ToastQueue::new(t0);
        let id = queue.enqueue("Partner saved", ToastKind::Success, t0);

        assert!(queue.expire(t0 + ms(3999)).is_empty());
        assert_eq!(queue.expire(t0 + ms(4000)), vec![id]);
        assert!(queue.visible().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn toasts_expire_independently() {
        let t0 = Instant::now();
        let mut queue = ToastQueue::new(t0);
        let first = queue.enqueue("one", ToastKind::Info, t0);
        let second = queue.enqueue("two", ToastKind::Error, t0 + ms(100));

        assert_eq!(queue.next_deadline(), Some(t0 + ms(4000)));
        assert_eq!(queue.expire(t0 + ms(4000)), vec![first]);
        assert_eq!(queue.visible().len(), 1);
        assert_eq!(queue.visible()[0].id, second);

        assert_eq!(queue.next_deadline(), Some(t0 + ms(4100)));
        assert!(queue.expire(t0 + ms(4099)).is_empty());
        assert_eq!(queue.expire(t0 + ms(4100)), vec![second]);
    }

    #[tokio::test(start_paused = true)]
    async fn ids_are_unique_within_one_millisecond() {
        let t0 = Instant::now();
        let mut queue = ToastQueue::new(t0);
        let a = queue.enqueue("a", ToastKind::Info, t0);
        let b = queue.enqueue("a", ToastKind::Info, t0);
        assert_ne!(a, b);
        assert_eq!(queue.visible().len(), 2, "no deduplication");
    }

    #[tokio::test(start_paused = true)]
    async fn toasts_stack_in_emission_order() {
        let t0 = Instant::now();
        let mut queue = ToastQueue::new(t0);
        queue.enqueue("first", ToastKind::Info, t0);
        queue.enqueue("second", ToastKind::Info, t0 + ms(5));
        queue.enqueue("third", ToastKind::Info, t0 + ms(10));
        let messages: Vec<&str> = queue.visible().iter().map(|t| t.message.as_str()).collect();
        assert_eq!(messages, ["first", "second", "third"]);
    }

    #[tokio::test(start_paused = true)]
    async fn dismiss_removes_only_that_toast() {
        let t0 = Instant::now();
        let mut queue = ToastQueue::new(t0);
        let a = queue.enqueue("a", ToastKind::Info, t0);
        let b = queue.enqueue("b", ToastKind::Info, t0);
        assert!(queue.dismiss(a));
        assert!(!queue.dismiss(a));
        assert_eq!(queue.visible()[0].id, b);
    }
}

use std::collections::VecDeque;
use crate::models::QueueItem;

pub const MAX_QUEUE_LEN: usize = 100;

/* ------------ 播放佇列 (FIFO, 上限 100) ------------ */
#[derive(Debug, Default)]
pub struct PlayQueue {
    items: VecDeque<QueueItem>,
}

impl PlayQueue {
    /// Append at the tail. A full queue hands the item back untouched.
    pub fn push(&mut self, item: QueueItem) -> Result<(), QueueItem> {
        if self.items.len() >= MAX_QUEUE_LEN {
            return Err(item);
        }
        self.items.push_back(item);
        Ok(())
    }

    pub fn pop_front(&mut self) -> Option<QueueItem> { self.items.pop_front() }

    /// Remove by position; anything outside `0..len` is ignored.
    pub fn remove_at(&mut self, index: i64) -> Option<QueueItem> {
        let idx = usize::try_from(index).ok()?;
        self.items.remove(idx)
    }

    pub fn len(&self) -> usize { self.items.len() }

    pub fn snapshot(&self) -> Vec<QueueItem> { self.items.iter().cloned().collect() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaInfo;

    fn item(n: usize) -> QueueItem {
        QueueItem {
            media: MediaInfo { url: format!("https://x/{n}"), title: format!("#{n}"), duration: 60.0 },
            submitted_by: "alice".into(),
        }
    }

    #[test]
    fn rejects_past_capacity() {
        let mut q = PlayQueue::default();
        for n in 0..MAX_QUEUE_LEN {
            assert!(q.push(item(n)).is_ok());
        }
        let before = q.snapshot();
        let rejected = q.push(item(999)).unwrap_err();
        assert_eq!(rejected.media.url, "https://x/999");
        assert_eq!(q.len(), MAX_QUEUE_LEN);
        assert_eq!(q.snapshot(), before);
    }

    #[test]
    fn keeps_insertion_order() {
        let mut q = PlayQueue::default();
        q.push(item(1)).unwrap();
        q.push(item(2)).unwrap();
        assert_eq!(q.pop_front().map(|i| i.media.title), Some("#1".into()));
        assert_eq!(q.pop_front().map(|i| i.media.title), Some("#2".into()));
        assert!(q.pop_front().is_none());
    }

    #[test]
    fn remove_out_of_range_is_noop() {
        let mut q = PlayQueue::default();
        q.push(item(0)).unwrap();
        q.push(item(1)).unwrap();
        assert!(q.remove_at(2).is_none());
        assert!(q.remove_at(-1).is_none());
        assert!(q.remove_at(i64::MAX).is_none());
        assert_eq!(q.len(), 2);

        assert_eq!(q.remove_at(0).map(|i| i.media.title), Some("#0".into()));
        assert_eq!(q.snapshot()[0].media.title, "#1");
    }
}

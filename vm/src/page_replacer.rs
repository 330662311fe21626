use crate::frame_pool::{FrameId, FramePool};

pub trait PageReplacer {
    /// Chooses which of `candidates` (a process' frames, in assignment order)
    /// gets evicted. `None` only when `candidates` is empty.
    fn pick_victim(&mut self, candidates: &[FrameId], pool: &FramePool) -> Option<FrameId>;
}

/// Least recently used by the pool's logical clock. On equal timestamps the
/// first candidate wins, which favors the lowest frame in assignment order.
#[derive(Copy, Clone, Default, Debug)]
pub struct LruPageReplacer;

impl LruPageReplacer {
    pub fn new() -> Self {
        LruPageReplacer
    }
}

impl PageReplacer for LruPageReplacer {
    fn pick_victim(&mut self, candidates: &[FrameId], pool: &FramePool) -> Option<FrameId> {
        let mut victim: Option<FrameId> = None;

        for &candidate in candidates {
            let older = match victim {
                Some(current) => pool.frame(candidate).last_used < pool.frame(current).last_used,
                None => true,
            };

            if older {
                victim = Some(candidate);
            }
        }

        victim
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_oldest_frame() {
        let mut pool = FramePool::new(3);
        pool.touch(1);
        pool.touch(2);
        pool.touch(0);

        assert_eq!(LruPageReplacer::new().pick_victim(&[0, 1, 2], &pool), Some(1));
    }

    #[test]
    fn ties_go_to_the_first_candidate() {
        let pool = FramePool::new(2);

        assert_eq!(LruPageReplacer::new().pick_victim(&[0, 1], &pool), Some(0));
    }

    #[test]
    fn assignment_order_breaks_ties_not_frame_id() {
        let mut pool = FramePool::new(4);
        pool.touch(0);
        pool.touch(1);

        // frames 3 and 2 were never touched; 3 was assigned first
        assert_eq!(LruPageReplacer::new().pick_victim(&[0, 1, 3, 2], &pool), Some(3));
    }

    #[test]
    fn no_candidates_no_victim() {
        let pool = FramePool::new(1);

        assert_eq!(LruPageReplacer::new().pick_victim(&[], &pool), None);
    }
}

use log::trace;

use crate::{
    frame_pool::{FrameId, FramePool},
    page_replacer::PageReplacer,
    process::{Phase, Process},
    reference::Vpn,
};

/// Outcome of one resolution attempt.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Access {
    /// The page was resident; the reference is complete.
    Hit { frame: FrameId },
    /// The page went into one of the process' free frames.
    Load { frame: FrameId },
    /// The page replaced `evicted` in the victim frame.
    Evict { frame: FrameId, evicted: Option<Vpn> },
}

impl Access {
    pub fn frame(&self) -> FrameId {
        match *self {
            Access::Hit { frame } | Access::Load { frame } | Access::Evict { frame, .. } => frame,
        }
    }

    pub fn is_fault(&self) -> bool {
        !matches!(self, Access::Hit { .. })
    }

    pub fn swap_cost(&self) -> u64 {
        match self {
            Access::Hit { .. } => 0,
            Access::Load { .. } => 1,
            Access::Evict { .. } => 2,
        }
    }
}

/// Owns the frame pool and resolves references against it on behalf of
/// whichever process is running.
pub struct Mmu<REPLACER: PageReplacer> {
    pool: FramePool,
    replacer: REPLACER,
}

impl<REPLACER> Mmu<REPLACER>
where
    REPLACER: PageReplacer,
{
    pub fn new(total_frames: usize, replacer: REPLACER) -> Self {
        Mmu {
            pool: FramePool::new(total_frames),
            replacer,
        }
    }

    pub fn pool(&self) -> &FramePool {
        &self.pool
    }

    pub fn lookup(&self, process: &Process, vpn: Vpn) -> Option<FrameId> {
        process.page_table.get(vpn)
    }

    /// Maps `vpn` to `frame`, first dropping whatever page the frame held.
    pub fn bind(&mut self, process: &mut Process, vpn: Vpn, frame: FrameId) {
        if let Some(old) = self.pool.frame(frame).page {
            if process.page_table.get(old) == Some(frame) {
                process.page_table.remove(old);
            }
        }

        process.page_table.set(vpn, frame);
        self.pool.load(frame, process.pid, vpn);
    }

    /// Forgets the mapping for `vpn`. The frame itself is left as is.
    pub fn unbind(&mut self, process: &mut Process, vpn: Vpn) -> Option<FrameId> {
        process.page_table.remove(vpn)
    }

    pub fn touch(&mut self, frame: FrameId) -> u64 {
        self.pool.touch(frame)
    }

    /// Hands `frame` to `process` as a free frame.
    pub fn assign(&mut self, process: &mut Process, frame: FrameId) {
        self.pool.assign(frame, process.pid);
        process.frames.push(frame);
    }

    /// Takes every frame away from `process`, unmapping and wiping them.
    /// Returns the frames in their former assignment order.
    pub fn reclaim(&mut self, process: &mut Process) -> Vec<FrameId> {
        let frames = std::mem::take(&mut process.frames);

        for &frame in &frames {
            if let Some(vpn) = self.pool.frame(frame).page {
                self.unbind(process, vpn);
            }
            self.pool.release(frame);
        }

        frames
    }

    /// Resolves the reference under the process' cursor. A hit completes the
    /// reference and moves the cursor; a fault pages it in and leaves the
    /// cursor where it is, so the next attempt is a hit.
    ///
    /// Returns `None` when the process has nothing left to resolve.
    ///
    /// # Panics
    ///
    /// If the process still has references but owns no frame. The scheduler
    /// only hands a turn to processes holding their share.
    pub(crate) fn resolve(&mut self, process: &mut Process) -> Option<Access> {
        let vpn = process.current()?.vpn;

        if let Some(frame) = self.lookup(process, vpn) {
            self.touch(frame);
            process.complete_current();

            trace!("mmu: pid={} page {} hit in frame {}", process.pid, vpn, frame);

            return Some(Access::Hit { frame });
        }

        debug_assert_eq!(process.phase(), Phase::Pending, "loaded page went missing");

        let free = process
            .frames
            .iter()
            .copied()
            .find(|&frame| !self.pool.frame(frame).is_resident());

        let access = match free {
            Some(frame) => {
                trace!("mmu: pid={} page {} fault, free frame {}", process.pid, vpn, frame);

                self.bind(process, vpn, frame);
                Access::Load { frame }
            }
            None => {
                let frame = self
                    .replacer
                    .pick_victim(&process.frames, &self.pool)
                    .expect("every running process owns at least one frame");
                let evicted = self.pool.frame(frame).page;

                trace!(
                    "mmu: pid={} page {} fault, evicting {:?} from frame {}",
                    process.pid,
                    vpn,
                    evicted,
                    frame
                );

                if let Some(old) = evicted {
                    self.unbind(process, old);
                }
                self.bind(process, vpn, frame);
                Access::Evict { frame, evicted }
            }
        };

        self.touch(access.frame());
        process.mark_loaded();

        Some(access)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page_replacer::LruPageReplacer;

    fn setup(total_frames: usize, rows: u32, cols: u32) -> (Mmu<LruPageReplacer>, Process) {
        let mut mmu = Mmu::new(total_frames, LruPageReplacer::new());
        let mut process = Process::generate(0, 4, rows, cols).unwrap();

        for frame in 0..total_frames {
            mmu.assign(&mut process, frame);
        }

        (mmu, process)
    }

    #[test]
    fn fault_then_hit_completes_one_reference() {
        let (mut mmu, mut process) = setup(2, 1, 1);

        assert_eq!(mmu.resolve(&mut process), Some(Access::Load { frame: 0 }));
        assert_eq!(process.cursor(), 0);
        assert_eq!(process.phase(), Phase::Loaded);

        assert_eq!(mmu.resolve(&mut process), Some(Access::Hit { frame: 0 }));
        assert_eq!(process.cursor(), 1);
        assert_eq!(process.phase(), Phase::Pending);
        assert_eq!(mmu.pool().clock(), 2);
    }

    #[test]
    fn free_frames_are_used_in_assignment_order() {
        let (mut mmu, mut process) = setup(2, 1, 1);

        mmu.resolve(&mut process);
        mmu.resolve(&mut process);

        assert_eq!(mmu.resolve(&mut process), Some(Access::Load { frame: 1 }));
    }

    #[test]
    fn eviction_unmaps_the_victim_page() {
        let (mut mmu, mut process) = setup(1, 1, 1);

        mmu.resolve(&mut process);
        mmu.resolve(&mut process);

        assert_eq!(
            mmu.resolve(&mut process),
            Some(Access::Evict { frame: 0, evicted: Some(0) })
        );
        assert_eq!(process.page_table.get(0), None);
        assert_eq!(process.page_table.get(1), Some(0));
        assert_eq!(mmu.pool().frame(0).page, Some(1));
    }

    #[test]
    fn exhausted_process_resolves_nothing() {
        let (mut mmu, mut process) = setup(1, 0, 0);

        assert_eq!(mmu.resolve(&mut process), None);
        assert_eq!(mmu.pool().clock(), 0);
    }

    #[test]
    #[should_panic(expected = "owns at least one frame")]
    fn pending_process_without_frames_is_a_bug() {
        let (mut mmu, mut process) = setup(1, 1, 1);
        mmu.reclaim(&mut process);

        mmu.resolve(&mut process);
    }

    #[test]
    fn reclaim_wipes_frames_and_table() {
        let (mut mmu, mut process) = setup(2, 1, 1);
        mmu.resolve(&mut process);

        assert_eq!(mmu.reclaim(&mut process), vec![0, 1]);
        assert!(process.frames.is_empty());
        assert!(process.page_table.is_empty());
        assert!(mmu.pool().frames().iter().all(|f| f.owner.is_none() && f.page.is_none()));
    }

    #[test]
    fn bind_drops_the_frames_previous_page() {
        let (mut mmu, mut process) = setup(1, 1, 1);
        mmu.bind(&mut process, 0, 0);

        mmu.bind(&mut process, 2, 0);

        assert_eq!(process.page_table.get(0), None);
        assert_eq!(mmu.lookup(&process, 2), Some(0));
    }

    #[test]
    fn swap_cost_by_outcome() {
        assert_eq!(Access::Hit { frame: 0 }.swap_cost(), 0);
        assert_eq!(Access::Load { frame: 0 }.swap_cost(), 1);
        assert_eq!(Access::Evict { frame: 0, evicted: Some(1) }.swap_cost(), 2);
    }
}

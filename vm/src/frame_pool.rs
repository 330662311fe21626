use crate::{process::Pid, reference::Vpn};

pub type FrameId = usize;

/// A physical frame. `owner` and `page` are `None` while the frame is free.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub id: FrameId,
    pub owner: Option<Pid>,
    pub page: Option<Vpn>,
    /// Clock value of the last touch, 0 if never touched since the last reset.
    pub last_used: u64,
}

impl Frame {
    fn new(id: FrameId) -> Self {
        Frame {
            id,
            owner: None,
            page: None,
            last_used: 0,
        }
    }

    pub fn is_resident(&self) -> bool {
        self.page.is_some()
    }

    fn clear(&mut self) {
        self.owner = None;
        self.page = None;
        self.last_used = 0;
    }
}

/// The one pool of frames shared by every process, plus the logical clock
/// that stamps frame recency.
#[derive(Clone, Debug)]
pub struct FramePool {
    frames: Vec<Frame>,
    clock: u64,
}

impl FramePool {
    pub fn new(total_frames: usize) -> Self {
        FramePool {
            frames: (0..total_frames).map(Frame::new).collect(),
            clock: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn frame(&self, id: FrameId) -> &Frame {
        &self.frames[id]
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Splits the pool into `shares` contiguous runs of equal size. The caller
    /// guarantees `len()` is a multiple of `shares`.
    pub fn partition(&self, shares: usize) -> Vec<Vec<FrameId>> {
        let per_share = self.frames.len() / shares;

        (0..shares)
            .map(|share| (share * per_share..(share + 1) * per_share).collect())
            .collect()
    }

    /// Advances the clock and stamps `id` with the new value.
    pub fn touch(&mut self, id: FrameId) -> u64 {
        self.clock += 1;
        self.frames[id].last_used = self.clock;
        self.clock
    }

    pub fn assign(&mut self, id: FrameId, owner: Pid) {
        self.frames[id].owner = Some(owner);
    }

    pub fn load(&mut self, id: FrameId, owner: Pid, vpn: Vpn) -> Option<Vpn> {
        let frame = &mut self.frames[id];
        frame.owner = Some(owner);
        frame.page.replace(vpn)
    }

    /// Returns the frame to the unowned, non-resident, never-used state.
    pub fn release(&mut self, id: FrameId) {
        self.frames[id].clear();
    }
}

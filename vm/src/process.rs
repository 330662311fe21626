use crate::{
    error::{Result, VmError},
    frame_pool::FrameId,
    mmu::Access,
    page_table::PageTable,
    reference::{self, Reference},
};

pub type Pid = usize;

/// Per-process counters, fed only by access outcomes.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub struct Statistics {
    pub hits: u64,
    pub faults: u64,
    pub swap_cost: u64,
}

impl Statistics {
    pub fn record(&mut self, access: &Access) {
        if access.is_fault() {
            self.faults += 1;
            self.swap_cost += access.swap_cost();
        } else {
            self.hits += 1;
        }
    }

    pub fn fault_rate(&self, total_references: usize) -> f64 {
        rate(self.faults, total_references)
    }

    pub fn hit_rate(&self, total_references: usize) -> f64 {
        rate(self.hits, total_references)
    }
}

fn rate(count: u64, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

/// Where the reference under the cursor is in its two-step completion.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Not attempted yet, or attempted and completed (cursor moved on).
    #[default]
    Pending,
    /// Faulted and paged in; the next attempt completes it as a hit.
    Loaded,
}

#[derive(Clone, Debug)]
pub struct Process {
    pub pid: Pid,
    pub page_size: u64,
    pub rows: u32,
    pub cols: u32,
    pub total_references: usize,
    pub total_pages: u64,
    references: Vec<Reference>,
    cursor: usize,
    phase: Phase,
    pub page_table: PageTable,
    pub frames: Vec<FrameId>,
    pub finished: bool,
    pub stats: Statistics,
}

impl Process {
    /// Builds a process from its generated dimensions.
    pub fn generate(pid: Pid, page_size: u64, rows: u32, cols: u32) -> Result<Self> {
        if page_size == 0 {
            return Err(VmError::ZeroPageSize);
        }

        let too_large = || VmError::ProcessTooLarge { pid, rows, cols };

        let total_references = reference::reference_count(rows, cols).ok_or_else(too_large)?;
        let total_pages = reference::page_count(page_size, rows, cols).ok_or_else(too_large)?;
        let references = reference::generate(page_size, rows, cols).ok_or_else(too_large)?;

        Process::new(pid, page_size, rows, cols, total_references, total_pages, references)
    }

    /// Builds a process from a declared header and an already materialized
    /// trace, refusing traces that disagree with their header.
    pub fn new(
        pid: Pid,
        page_size: u64,
        rows: u32,
        cols: u32,
        total_references: usize,
        total_pages: u64,
        references: Vec<Reference>,
    ) -> Result<Self> {
        if page_size == 0 {
            return Err(VmError::ZeroPageSize);
        }

        if references.len() != total_references {
            return Err(VmError::malformed(
                pid,
                format!("declares {} references but has {}", total_references, references.len()),
            ));
        }

        let expected_pages = reference::page_count(page_size, rows, cols).ok_or_else(|| {
            VmError::malformed(
                pid,
                format!("{}x{} matrices overflow the address space", rows, cols),
            )
        })?;
        if total_pages != expected_pages {
            return Err(VmError::malformed(
                pid,
                format!(
                    "declares {} pages but a {}x{} process with page size {} spans {}",
                    total_pages, rows, cols, page_size, expected_pages
                ),
            ));
        }

        for (idx, r) in references.iter().enumerate() {
            if r.vpn >= total_pages {
                return Err(VmError::malformed(
                    pid,
                    format!("reference {} touches page {} of {}", idx, r.vpn, total_pages),
                ));
            }

            let rebuilt = r.vpn.checked_mul(page_size).and_then(|a| a.checked_add(r.offset));
            if r.offset >= page_size || rebuilt != Some(r.address) {
                return Err(VmError::malformed(
                    pid,
                    format!("reference {} has inconsistent address {:#x}", idx, r.address),
                ));
            }
        }

        Ok(Process {
            pid,
            page_size,
            rows,
            cols,
            total_references,
            total_pages,
            references,
            cursor: 0,
            phase: Phase::Pending,
            page_table: PageTable::new(),
            frames: Vec::new(),
            finished: false,
            stats: Statistics::default(),
        })
    }

    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current(&self) -> Option<&Reference> {
        self.references.get(self.cursor)
    }

    pub fn has_pending(&self) -> bool {
        self.cursor < self.references.len()
    }

    pub(crate) fn mark_loaded(&mut self) {
        self.phase = Phase::Loaded;
    }

    pub(crate) fn complete_current(&mut self) {
        self.cursor += 1;
        self.phase = Phase::Pending;
    }

    pub fn fault_rate(&self) -> f64 {
        self.stats.fault_rate(self.total_references)
    }

    pub fn hit_rate(&self) -> f64 {
        self.stats.hit_rate(self.total_references)
    }
}

use thiserror::Error;

use crate::{frame_pool::FrameId, process::Pid, reference::Vpn};

pub type Result<T> = std::result::Result<T, VmError>;

/// Errors raised while building a simulation. Once `Simulator::new` has
/// accepted its input, running it cannot fail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VmError {
    #[error("configuration error: total frame count must be positive")]
    NoFrames,

    #[error("configuration error: at least one process is required")]
    NoProcesses,

    #[error("configuration error: {frames} frames do not split evenly among {processes} processes")]
    UnevenFrames { frames: usize, processes: usize },

    #[error("configuration error: expected {expected} processes, found {found}")]
    ProcessCountMismatch { expected: usize, found: usize },

    #[error("configuration error: process at position {position} has pid {pid}")]
    PidOutOfOrder { position: usize, pid: Pid },

    #[error("configuration error: page size must be positive")]
    ZeroPageSize,

    #[error("configuration error: process {pid} with {rows}x{cols} matrices is too large")]
    ProcessTooLarge { pid: Pid, rows: u32, cols: u32 },

    #[error("malformed trace for process {pid}: {reason}")]
    MalformedTrace { pid: Pid, reason: String },
}

impl VmError {
    pub fn is_configuration(&self) -> bool {
        !matches!(self, VmError::MalformedTrace { .. })
    }

    pub(crate) fn malformed(pid: Pid, reason: impl Into<String>) -> Self {
        VmError::MalformedTrace {
            pid,
            reason: reason.into(),
        }
    }
}

/// A broken runtime invariant, reported by `Simulator::check_consistency`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyError {
    #[error("frame {frame} is assigned to both process {first} and process {second}")]
    SharedFrame { frame: FrameId, first: Pid, second: Pid },

    #[error("{assigned} frames are assigned but the pool only has {total}")]
    Overcommitted { assigned: usize, total: usize },

    #[error("frame {frame} is in the set of process {pid} but owned by {owner:?}")]
    OwnerMismatch { frame: FrameId, pid: Pid, owner: Option<Pid> },

    #[error("frame {frame} holds page {vpn} but has no owner")]
    OrphanPage { frame: FrameId, vpn: Vpn },

    #[error("frame {frame} holds page {vpn} of process {pid}, whose page table disagrees")]
    StaleFrame { frame: FrameId, pid: Pid, vpn: Vpn },

    #[error("page {vpn} of process {pid} maps to frame {frame}, which does not hold it")]
    StaleMapping { pid: Pid, vpn: Vpn, frame: FrameId },
}

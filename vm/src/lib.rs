//! Demand-paging simulator: processes replaying matrix access traces over a
//! shared pool of frames, scheduled round-robin, with LRU eviction and frame
//! redistribution when a process terminates.

pub mod config;
pub mod error;
pub mod event;
pub mod frame_pool;
pub mod mmu;
pub mod page_replacer;
pub mod page_table;
pub mod process;
pub mod redistributor;
pub mod reference;
pub mod scheduler;

pub use config::SimConfig;
pub use error::{ConsistencyError, VmError};
pub use event::{Event, EventSink, NullSink};
pub use frame_pool::{Frame, FrameId, FramePool};
pub use mmu::{Access, Mmu};
pub use page_replacer::{LruPageReplacer, PageReplacer};
pub use process::{Phase, Pid, Process, Statistics};
pub use reference::{AccessKind, Matrix, Reference, Vpn};
pub use scheduler::{Simulator, Turn};

//! Side channel describing what the simulator does, turn by turn. Sinks only
//! observe; nothing they do feeds back into the run.

use std::fmt;

use crate::{frame_pool::FrameId, process::Pid, reference::Vpn};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Event {
    FrameAssigned { pid: Pid, frame: FrameId },
    Turn { pid: Pid, cursor: usize },
    Hit { pid: Pid, vpn: Vpn, frame: FrameId, hits: u64 },
    Fault {
        pid: Pid,
        vpn: Vpn,
        frame: FrameId,
        evicted: Option<Vpn>,
        faults: u64,
    },
    Finished { pid: Pid },
    FrameReleased { pid: Pid, frame: FrameId },
    FrameReassigned { from: Pid, to: Pid, frame: FrameId },
    FramesUnassigned { pid: Pid, count: usize },
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Event::FrameAssigned { pid, frame } => {
                write!(f, "process {}: receives frame {}", pid, frame)
            }
            Event::Turn { pid, cursor } => {
                write!(f, "turn: process {} at reference {}", pid, cursor)
            }
            Event::Hit { pid, vpn, frame, hits } => {
                write!(f, "process {}: hit page {} in frame {} (hits: {})", pid, vpn, frame, hits)
            }
            Event::Fault {
                pid,
                vpn,
                frame,
                evicted: None,
                faults,
            } => write!(
                f,
                "process {}: page fault, page {} loaded into free frame {} (faults: {})",
                pid, vpn, frame, faults
            ),
            Event::Fault {
                pid,
                vpn,
                frame,
                evicted: Some(old),
                faults,
            } => write!(
                f,
                "process {}: page fault, page {} evicted from frame {} for page {} (faults: {})",
                pid, old, frame, vpn, faults
            ),
            Event::Finished { pid } => write!(f, "process {} finished", pid),
            Event::FrameReleased { pid, frame } => {
                write!(f, "process {}: releases frame {}", pid, frame)
            }
            Event::FrameReassigned { from, to, frame } => {
                write!(f, "process {}: receives frame {} from process {}", to, frame, from)
            }
            Event::FramesUnassigned { pid, count } => write!(
                f,
                "no active process to take {} frames of process {}",
                count, pid
            ),
        }
    }
}

pub trait EventSink {
    fn record(&mut self, event: &Event);
}

/// Discards every event.
#[derive(Copy, Clone, Default, Debug)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&mut self, _event: &Event) {}
}

impl EventSink for Vec<Event> {
    fn record(&mut self, event: &Event) {
        self.push(*event);
    }
}

use std::collections::VecDeque;

use log::{debug, info};

use crate::{
    config::SimConfig,
    error::{ConsistencyError, Result},
    event::{Event, EventSink, NullSink},
    frame_pool::FramePool,
    mmu::{Access, Mmu},
    page_replacer::{LruPageReplacer, PageReplacer},
    process::{Pid, Process},
    redistributor,
};

/// What happened during one dequeue.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Turn {
    pub pid: Pid,
    /// `None` when the process had nothing left to resolve.
    pub access: Option<Access>,
    pub finished: bool,
}

/// Round-robin driver of the whole run. Processes live in a dense vector
/// indexed by pid; the ready queue only holds indices into it.
pub struct Simulator<REPLACER: PageReplacer = LruPageReplacer, SINK: EventSink = NullSink> {
    processes: Vec<Process>,
    mmu: Mmu<REPLACER>,
    queue: VecDeque<usize>,
    sink: SINK,
}

impl Simulator {
    pub fn new(processes: Vec<Process>, total_frames: usize) -> Result<Self> {
        Simulator::with_parts(processes, total_frames, LruPageReplacer::new(), NullSink)
    }
}

impl<REPLACER, SINK> Simulator<REPLACER, SINK>
where
    REPLACER: PageReplacer,
    SINK: EventSink,
{
    /// Validates the input and hands each process its equal, contiguous share
    /// of the frame pool, in pid order.
    pub fn with_parts(
        mut processes: Vec<Process>,
        total_frames: usize,
        replacer: REPLACER,
        mut sink: SINK,
    ) -> Result<Self> {
        let config = SimConfig::new(total_frames, processes.len())?;
        config.check_processes(&processes)?;

        let mut mmu = Mmu::new(total_frames, replacer);
        let shares = mmu.pool().partition(config.processes);

        for (process, share) in processes.iter_mut().zip(shares) {
            for frame in share {
                mmu.assign(process, frame);
                sink.record(&Event::FrameAssigned {
                    pid: process.pid,
                    frame,
                });
            }
        }

        info!(
            "simulator: {} processes, {} frames ({} each)",
            config.processes,
            total_frames,
            config.frames_per_process()
        );

        Ok(Simulator {
            queue: (0..processes.len()).collect(),
            processes,
            mmu,
            sink,
        })
    }

    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    pub fn pool(&self) -> &FramePool {
        self.mmu.pool()
    }

    pub fn sink(&self) -> &SINK {
        &self.sink
    }

    pub fn into_parts(self) -> (Vec<Process>, SINK) {
        (self.processes, self.sink)
    }

    /// Pids still waiting for a turn, front first.
    pub fn queue(&self) -> impl Iterator<Item = Pid> + '_ {
        self.queue.iter().map(|&idx| self.processes[idx].pid)
    }

    pub fn is_done(&self) -> bool {
        self.queue.is_empty()
    }

    /// Gives the process at the front of the queue one resolution attempt.
    /// Returns `None` once the queue is empty.
    pub fn step(&mut self) -> Option<Turn> {
        let idx = self.queue.pop_front()?;
        let pid = self.processes[idx].pid;

        if !self.processes[idx].has_pending() {
            self.finish(idx);
            return Some(Turn {
                pid,
                access: None,
                finished: true,
            });
        }

        let process = &mut self.processes[idx];
        self.sink.record(&Event::Turn {
            pid,
            cursor: process.cursor(),
        });

        let vpn = process.current().map(|r| r.vpn).unwrap_or_default();
        let access = self.mmu.resolve(process);

        if let Some(access) = access {
            process.stats.record(&access);

            let event = match access {
                Access::Hit { frame } => Event::Hit {
                    pid,
                    vpn,
                    frame,
                    hits: process.stats.hits,
                },
                Access::Load { frame } => Event::Fault {
                    pid,
                    vpn,
                    frame,
                    evicted: None,
                    faults: process.stats.faults,
                },
                Access::Evict { frame, evicted } => Event::Fault {
                    pid,
                    vpn,
                    frame,
                    evicted,
                    faults: process.stats.faults,
                },
            };

            debug!("scheduler: {}", event);
            self.sink.record(&event);
        }

        let finished = !self.processes[idx].has_pending();
        if finished {
            self.finish(idx);
        } else {
            self.queue.push_back(idx);
        }

        Some(Turn {
            pid,
            access,
            finished,
        })
    }

    /// Steps until every process has finished.
    pub fn run(&mut self) {
        let mut turns = 0u64;
        while self.step().is_some() {
            turns += 1;
        }

        info!("simulator: done after {} turns, clock={}", turns, self.pool().clock());
    }

    fn finish(&mut self, idx: usize) {
        self.processes[idx].finished = true;
        self.sink.record(&Event::Finished {
            pid: self.processes[idx].pid,
        });

        debug!(
            "scheduler: pid={} finished with {:?}",
            self.processes[idx].pid, self.processes[idx].stats
        );

        redistributor::redistribute(
            &mut self.mmu,
            &mut self.processes,
            &self.queue,
            idx,
            &mut self.sink,
        );
    }

    /// Checks frame conservation and that frames and page tables agree.
    pub fn check_consistency(&self) -> std::result::Result<(), ConsistencyError> {
        let pool = self.pool();
        let mut holder: Vec<Option<Pid>> = vec![None; pool.len()];
        let mut assigned = 0;

        for process in &self.processes {
            assigned += process.frames.len();

            for &frame in &process.frames {
                if let Some(first) = holder[frame] {
                    return Err(ConsistencyError::SharedFrame {
                        frame,
                        first,
                        second: process.pid,
                    });
                }
                holder[frame] = Some(process.pid);

                let owner = pool.frame(frame).owner;
                if owner != Some(process.pid) {
                    return Err(ConsistencyError::OwnerMismatch {
                        frame,
                        pid: process.pid,
                        owner,
                    });
                }
            }

            for (vpn, frame) in process.page_table.iter() {
                let f = pool.frame(frame);
                if f.page != Some(vpn) || f.owner != Some(process.pid) {
                    return Err(ConsistencyError::StaleMapping {
                        pid: process.pid,
                        vpn,
                        frame,
                    });
                }
            }
        }

        if assigned > pool.len() {
            return Err(ConsistencyError::Overcommitted {
                assigned,
                total: pool.len(),
            });
        }

        for frame in pool.frames() {
            if let Some(vpn) = frame.page {
                let pid = frame.owner.ok_or(ConsistencyError::OrphanPage { frame: frame.id, vpn })?;

                if self.processes[pid].page_table.get(vpn) != Some(frame.id) {
                    return Err(ConsistencyError::StaleFrame {
                        frame: frame.id,
                        pid,
                        vpn,
                    });
                }
            }
        }

        Ok(())
    }
}

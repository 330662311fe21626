//! Hands a terminated process' frames to the surviving process under the
//! most memory pressure.

use std::collections::VecDeque;

use log::debug;

use crate::{
    event::{Event, EventSink},
    mmu::Mmu,
    page_replacer::PageReplacer,
    process::Process,
};

/// Among the queued, unfinished processes, the one with the most faults so
/// far; ties go to the lowest pid.
pub fn select_recipient(processes: &[Process], queue: &VecDeque<usize>) -> Option<usize> {
    let mut selected: Option<usize> = None;

    for &idx in queue {
        let candidate = &processes[idx];
        if candidate.finished {
            continue;
        }

        let better = match selected {
            None => true,
            Some(current) => {
                let current = &processes[current];
                let (faults, best) = (candidate.stats.faults, current.stats.faults);
                faults > best || (faults == best && candidate.pid < current.pid)
            }
        };

        if better {
            selected = Some(idx);
        }
    }

    selected
}

/// Reclaims every frame of `processes[finished]` and moves them, all
/// together, to the selected recipient. The frames arrive empty and are
/// filled lazily by the recipient's next faults. With no recipient they stay
/// unowned for the rest of the run.
pub fn redistribute<REPLACER, SINK>(
    mmu: &mut Mmu<REPLACER>,
    processes: &mut [Process],
    queue: &VecDeque<usize>,
    finished: usize,
    sink: &mut SINK,
) where
    REPLACER: PageReplacer,
    SINK: EventSink,
{
    if processes[finished].frames.is_empty() {
        return;
    }

    let from = processes[finished].pid;
    let released = mmu.reclaim(&mut processes[finished]);

    for &frame in &released {
        sink.record(&Event::FrameReleased { pid: from, frame });
    }

    match select_recipient(processes, queue) {
        Some(idx) => {
            let recipient = &mut processes[idx];

            debug!(
                "redistributor: {} frames from pid={} to pid={} (faults={})",
                released.len(),
                from,
                recipient.pid,
                recipient.stats.faults
            );

            for frame in released {
                mmu.assign(recipient, frame);
                sink.record(&Event::FrameReassigned {
                    from,
                    to: recipient.pid,
                    frame,
                });
            }
        }
        None => {
            debug!("redistributor: {} frames of pid={} left unassigned", released.len(), from);

            sink.record(&Event::FramesUnassigned {
                pid: from,
                count: released.len(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page_replacer::LruPageReplacer;

    fn processes(faults: &[u64]) -> Vec<Process> {
        faults
            .iter()
            .enumerate()
            .map(|(pid, &f)| {
                let mut p = Process::generate(pid, 16, 1, 1).unwrap();
                p.stats.faults = f;
                p
            })
            .collect()
    }

    #[test]
    fn most_faults_wins() {
        let procs = processes(&[0, 2, 5, 1]);
        let queue = VecDeque::from(vec![1, 2, 3]);

        assert_eq!(select_recipient(&procs, &queue), Some(2));
    }

    #[test]
    fn ties_go_to_lowest_pid_not_queue_order() {
        let procs = processes(&[0, 3, 3, 3]);
        let queue = VecDeque::from(vec![3, 2, 1]);

        assert_eq!(select_recipient(&procs, &queue), Some(1));
    }

    #[test]
    fn finished_processes_are_skipped() {
        let mut procs = processes(&[0, 9, 1]);
        procs[1].finished = true;
        let queue = VecDeque::from(vec![1, 2]);

        assert_eq!(select_recipient(&procs, &queue), Some(2));
        assert_eq!(select_recipient(&procs, &VecDeque::new()), None);
    }

    #[test]
    fn frames_move_as_a_block() {
        let mut procs = processes(&[0, 0]);
        let mut mmu = Mmu::new(4, LruPageReplacer::new());
        for frame in 0..2 {
            mmu.assign(&mut procs[0], frame);
        }
        for frame in 2..4 {
            mmu.assign(&mut procs[1], frame);
        }
        mmu.resolve(&mut procs[0]);

        let mut events: Vec<Event> = Vec::new();
        redistribute(&mut mmu, &mut procs, &VecDeque::from(vec![1]), 0, &mut events);

        assert!(procs[0].frames.is_empty());
        assert!(procs[0].page_table.is_empty());
        assert_eq!(procs[1].frames, vec![2, 3, 0, 1]);
        assert_eq!(mmu.pool().frame(0).owner, Some(1));
        assert_eq!(mmu.pool().frame(0).page, None);
        assert_eq!(mmu.pool().frame(0).last_used, 0);
        assert_eq!(
            events.last(),
            Some(&Event::FrameReassigned { from: 0, to: 1, frame: 1 })
        );
    }

    #[test]
    fn no_recipient_leaves_frames_unowned() {
        let mut procs = processes(&[0]);
        let mut mmu = Mmu::new(2, LruPageReplacer::new());
        mmu.assign(&mut procs[0], 0);
        mmu.assign(&mut procs[0], 1);

        let mut events: Vec<Event> = Vec::new();
        redistribute(&mut mmu, &mut procs, &VecDeque::new(), 0, &mut events);

        assert!(mmu.pool().frames().iter().all(|f| f.owner.is_none()));
        assert_eq!(events.last(), Some(&Event::FramesUnassigned { pid: 0, count: 2 }));
    }
}

use crate::{
    error::{Result, VmError},
    process::Process,
};

/// Validated frame and process counts for a run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SimConfig {
    pub total_frames: usize,
    pub processes: usize,
}

impl SimConfig {
    pub fn new(total_frames: usize, processes: usize) -> Result<Self> {
        if total_frames == 0 {
            return Err(VmError::NoFrames);
        }
        if processes == 0 {
            return Err(VmError::NoProcesses);
        }
        if total_frames % processes != 0 {
            return Err(VmError::UnevenFrames {
                frames: total_frames,
                processes,
            });
        }

        Ok(SimConfig {
            total_frames,
            processes,
        })
    }

    pub fn frames_per_process(&self) -> usize {
        self.total_frames / self.processes
    }

    /// Processes must match the declared count and sit at the index equal to
    /// their pid.
    pub fn check_processes(&self, processes: &[Process]) -> Result<()> {
        if processes.len() != self.processes {
            return Err(VmError::ProcessCountMismatch {
                expected: self.processes,
                found: processes.len(),
            });
        }

        for (position, process) in processes.iter().enumerate() {
            if process.pid != position {
                return Err(VmError::PidOutOfOrder {
                    position,
                    pid: process.pid,
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_must_split_evenly() {
        assert_eq!(SimConfig::new(8, 4).unwrap().frames_per_process(), 2);
        assert_eq!(
            SimConfig::new(7, 2),
            Err(VmError::UnevenFrames { frames: 7, processes: 2 })
        );
    }

    #[test]
    fn zero_counts_are_rejected() {
        assert_eq!(SimConfig::new(0, 1), Err(VmError::NoFrames));
        assert_eq!(SimConfig::new(4, 0), Err(VmError::NoProcesses));
        assert!(SimConfig::new(0, 1).unwrap_err().is_configuration());
    }

    #[test]
    fn process_list_must_match() {
        let config = SimConfig::new(4, 2).unwrap();
        let p0 = Process::generate(0, 16, 1, 1).unwrap();
        let p1 = Process::generate(1, 16, 1, 1).unwrap();
        let stray = Process::generate(5, 16, 1, 1).unwrap();

        assert!(config.check_processes(&[p0.clone(), p1]).is_ok());
        assert_eq!(
            config.check_processes(&[p0.clone()]),
            Err(VmError::ProcessCountMismatch { expected: 2, found: 1 })
        );
        assert_eq!(
            config.check_processes(&[p0, stray]),
            Err(VmError::PidOutOfOrder { position: 1, pid: 5 })
        );
    }
}

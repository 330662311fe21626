use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::Local;
use log::warn;
use vm::{Event, EventSink, Process};

pub const CSV_HEADER: &str = "pid,references,faults,hits,swap_cost,fault_rate,hit_rate";

pub fn write_csv<W: Write>(out: &mut W, processes: &[Process]) -> Result<()> {
    writeln!(out, "{}", CSV_HEADER)?;

    for p in processes {
        writeln!(
            out,
            "{},{},{},{},{},{:.4},{:.4}",
            p.pid,
            p.total_references,
            p.stats.faults,
            p.stats.hits,
            p.stats.swap_cost,
            p.fault_rate(),
            p.hit_rate()
        )?;
    }

    Ok(())
}

/// Writes `<dir>/stats.csv` and returns its path.
pub fn write_stats(dir: &Path, processes: &[Process]) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let path = dir.join("stats.csv");
    let file = fs::File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);

    write_csv(&mut out, processes).with_context(|| format!("writing {}", path.display()))?;
    out.flush()?;

    Ok(path)
}

pub fn summary(process: &Process) -> String {
    format!(
        "Process {}:\n  references: {}\n  faults:     {}\n  hits:       {}\n  \
         swap cost:  {}\n  fault rate: {:.4}\n  hit rate:   {:.4}",
        process.pid,
        process.total_references,
        process.stats.faults,
        process.stats.hits,
        process.stats.swap_cost,
        process.fault_rate(),
        process.hit_rate()
    )
}

/// Event sink writing one line per event to `run_<timestamp>.log`.
///
/// The sink can't fail the run, so the first write error is logged and the
/// rest of the log is dropped.
pub struct RunLog<W: Write> {
    out: W,
    broken: bool,
}

impl RunLog<BufWriter<fs::File>> {
    pub fn create(dir: &Path) -> Result<(Self, PathBuf)> {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

        let name = format!("run_{}.log", Local::now().format("%Y%m%d_%H%M%S"));
        let path = dir.join(name);
        let file = fs::File::create(&path).with_context(|| format!("creating {}", path.display()))?;

        Ok((RunLog::new(BufWriter::new(file)), path))
    }
}

impl<W: Write> RunLog<W> {
    pub fn new(out: W) -> Self {
        RunLog { out, broken: false }
    }

    pub fn line(&mut self, text: &str) {
        if self.broken {
            return;
        }

        if let Err(e) = writeln!(self.out, "{}", text) {
            warn!("run log: write failed, dropping the rest of the log: {}", e);
            self.broken = true;
        }
    }

    pub fn finish(mut self) -> Result<W> {
        self.out.flush().context("flushing run log")?;
        Ok(self.out)
    }
}

impl<W: Write> EventSink for RunLog<W> {
    fn record(&mut self, event: &Event) {
        if let Event::Finished { .. } = event {
            self.line("========================");
            self.line(&event.to_string());
            self.line("========================");
        } else {
            self.line(&event.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vm::Simulator;

    #[test]
    fn csv_has_one_row_per_process() {
        let processes = vec![
            Process::generate(0, 4, 1, 1).unwrap(),
            Process::generate(1, 4, 0, 0).unwrap(),
        ];
        let mut sim = Simulator::new(processes, 2).unwrap();
        sim.run();

        let mut buf: Vec<u8> = Vec::new();
        write_csv(&mut buf, sim.processes()).unwrap();

        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "pid,references,faults,hits,swap_cost,fault_rate,hit_rate\n\
             0,3,3,3,4,1.0000,1.0000\n\
             1,0,0,0,0,0.0000,0.0000\n"
        );
    }

    #[test]
    fn stats_file_lands_in_the_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested");

        let path = write_stats(&out, &[Process::generate(0, 4, 1, 1).unwrap()]).unwrap();

        assert_eq!(path, out.join("stats.csv"));
        assert!(fs::read_to_string(path).unwrap().starts_with(CSV_HEADER));
    }

    #[test]
    fn run_log_brackets_terminations() {
        let mut log = RunLog::new(Vec::<u8>::new());
        log.record(&Event::Turn { pid: 0, cursor: 2 });
        log.record(&Event::Finished { pid: 0 });

        let text = String::from_utf8(log.finish().unwrap()).unwrap();

        assert_eq!(
            text,
            "turn: process 0 at reference 2\n\
             ========================\n\
             process 0 finished\n\
             ========================\n"
        );
    }

    #[test]
    fn summary_mentions_every_counter() {
        let process = Process::generate(4, 8, 2, 2).unwrap();

        let text = summary(&process);

        assert!(text.starts_with("Process 4:"));
        assert!(text.contains("references: 12"));
        assert!(text.contains("fault rate: 0.0000"));
    }
}

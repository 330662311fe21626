//! Process trace files, one `proc<pid>.txt` per process.
//!
//! Each file is a five line header followed by one reference per line:
//!
//! | line  | contents                                  |
//! |-------|-------------------------------------------|
//! | 1     | `TP=<page size>`                          |
//! | 2     | `NF=<rows>`                               |
//! | 3     | `NC=<cols>`                               |
//! | 4     | `NR=<reference count>`                    |
//! | 5     | `NP=<page count>`                         |
//! | 6..   | `M<A/B/C>:[<row>-<col>],<vpn>,<offset>,<r/w>` |
//!
//! The virtual address is not stored; it is rebuilt as `vpn * TP + offset`.
//! Blank reference lines are skipped. Whatever is read back goes through
//! `Process::new`, so a header that disagrees with its body is rejected.

use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, Context, Result};
use log::debug;
use vm::{AccessKind, Matrix, Pid, Process, Reference, VmError};

const PREFIX: &str = "proc";
const SUFFIX: &str = ".txt";

pub fn file_name(pid: Pid) -> String {
    format!("{}{}{}", PREFIX, pid, SUFFIX)
}

pub fn write_process<W: Write>(out: &mut W, process: &Process) -> Result<()> {
    writeln!(out, "TP={}", process.page_size)?;
    writeln!(out, "NF={}", process.rows)?;
    writeln!(out, "NC={}", process.cols)?;
    writeln!(out, "NR={}", process.total_references)?;
    writeln!(out, "NP={}", process.total_pages)?;

    for reference in process.references() {
        writeln!(out, "{}", reference)?;
    }

    Ok(())
}

/// Writes `proc<pid>.txt` for every process into `dir`, creating it if needed.
pub fn write_processes(dir: &Path, processes: &[Process]) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    for process in processes {
        let path = dir.join(file_name(process.pid));
        let file =
            fs::File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        let mut out = BufWriter::new(file);

        write_process(&mut out, process).with_context(|| format!("writing {}", path.display()))?;
        out.flush()?;

        debug!(
            "trace_file: wrote {} ({} references)",
            path.display(),
            process.total_references
        );
    }

    Ok(())
}

/// Reads every `proc<n>.txt` in `dir`, ordered by `n`. Pids are assigned by
/// that order. `expected` must match the number of files found.
pub fn read_processes(dir: &Path, expected: usize) -> Result<Vec<Process>> {
    if !dir.is_dir() {
        bail!("input directory {} does not exist", dir.display());
    }

    let mut files: Vec<(u64, PathBuf)> = Vec::new();

    for entry in fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        if let Some(index) = name.strip_prefix(PREFIX).and_then(|n| n.strip_suffix(SUFFIX)) {
            let index = index
                .parse::<u64>()
                .with_context(|| format!("trace file {} has no numeric index", name))?;
            files.push((index, path));
        }
    }

    files.sort();

    if files.len() != expected {
        return Err(VmError::ProcessCountMismatch {
            expected,
            found: files.len(),
        }
        .into());
    }

    files
        .iter()
        .enumerate()
        .map(|(pid, (_, path))| {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            parse_process(pid, &text).with_context(|| format!("loading {}", path.display()))
        })
        .collect()
}

pub fn parse_process(pid: Pid, text: &str) -> Result<Process> {
    let mut lines = text.lines();
    let mut header = |key: &str| -> Result<String> {
        let line = lines.next().ok_or_else(|| anyhow!("incomplete header, missing {}", key))?;
        let value = line
            .trim()
            .strip_prefix(key)
            .and_then(|rest| rest.strip_prefix('='))
            .ok_or_else(|| anyhow!("expected {}= but found {:?}", key, line))?;

        Ok(value.trim().to_string())
    };

    let page_size = header("TP")?.parse::<u64>().context("bad TP")?;
    let rows = header("NF")?.parse::<u32>().context("bad NF")?;
    let cols = header("NC")?.parse::<u32>().context("bad NC")?;
    let total_references = header("NR")?.parse::<usize>().context("bad NR")?;
    let total_pages = header("NP")?.parse::<u64>().context("bad NP")?;

    let references = lines
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| parse_reference(l, page_size))
        .collect::<Result<Vec<_>>>()?;

    let process = Process::new(
        pid,
        page_size,
        rows,
        cols,
        total_references,
        total_pages,
        references,
    )?;

    Ok(process)
}

fn parse_reference(line: &str, page_size: u64) -> Result<Reference> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let [location, vpn, offset, kind] = fields.as_slice() else {
        bail!("invalid reference {:?}", line);
    };

    let (matrix, coords) = location
        .strip_prefix('M')
        .and_then(|rest| rest.split_once(':'))
        .ok_or_else(|| anyhow!("reference without matrix tag: {:?}", line))?;
    let matrix = single_char(matrix)
        .and_then(Matrix::from_tag)
        .ok_or_else(|| anyhow!("unknown matrix {:?} in {:?}", matrix, line))?;

    let (row, col) = coords
        .strip_prefix('[')
        .and_then(|c| c.strip_suffix(']'))
        .and_then(|c| c.split_once('-'))
        .ok_or_else(|| anyhow!("invalid coordinates in {:?}", line))?;

    let kind = single_char(kind)
        .and_then(AccessKind::from_code)
        .ok_or_else(|| anyhow!("unknown access kind in {:?}", line))?;

    let vpn = vpn.parse::<u64>().with_context(|| format!("bad page in {:?}", line))?;
    let offset = offset.parse::<u64>().with_context(|| format!("bad offset in {:?}", line))?;

    let address = vpn
        .checked_mul(page_size)
        .and_then(|a| a.checked_add(offset))
        .ok_or_else(|| anyhow!("address overflows in {:?}", line))?;

    Ok(Reference {
        matrix,
        row: row.parse::<u32>().with_context(|| format!("bad row in {:?}", line))?,
        col: col.parse::<u32>().with_context(|| format!("bad column in {:?}", line))?,
        address,
        vpn,
        offset,
        kind,
    })
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(process: &Process) -> String {
        let mut buf: Vec<u8> = Vec::new();
        write_process(&mut buf, process).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn header_then_one_line_per_reference() {
        let process = Process::generate(0, 8, 1, 2).unwrap();

        assert_eq!(
            render(&process),
            "TP=8\nNF=1\nNC=2\nNR=6\nNP=3\n\
             MA:[0-0],0,0,r\nMB:[0-0],1,0,r\nMC:[0-0],2,0,w\n\
             MA:[0-1],0,4,r\nMB:[0-1],1,4,r\nMC:[0-1],2,4,w\n"
        );
    }

    #[test]
    fn parsed_file_matches_generated_trace() {
        let process = Process::generate(3, 12, 3, 2).unwrap();

        let parsed = parse_process(3, &render(&process)).unwrap();

        assert_eq!(parsed.references(), process.references());
        assert_eq!(parsed.total_pages, process.total_pages);
    }

    #[test]
    fn reference_count_must_match_header() {
        let text = "TP=4\nNF=1\nNC=1\nNR=4\nNP=3\n\
                    MA:[0-0],0,0,r\nMB:[0-0],1,0,r\nMC:[0-0],2,0,w\n";

        let err = parse_process(0, text).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<VmError>(),
            Some(VmError::MalformedTrace { pid: 0, .. })
        ));
    }

    #[test]
    fn oversized_header_is_malformed() {
        let text = "TP=4\nNF=4294967295\nNC=4294967295\nNR=0\nNP=0\n";

        let err = parse_process(0, text).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<VmError>(),
            Some(VmError::MalformedTrace { pid: 0, .. })
        ));
    }

    #[test]
    fn bad_lines_are_rejected() {
        assert!(parse_reference("MA:[0-0],0,0", 4).is_err());
        assert!(parse_reference("MD:[0-0],0,0,r", 4).is_err());
        assert!(parse_reference("MA:(0-0),0,0,r", 4).is_err());
        assert!(parse_reference("MA:[0-0],0,0,x", 4).is_err());
        assert!(parse_process(0, "TP=4\nNF=1\n").is_err());
    }

    #[test]
    fn directory_round_trip_orders_by_index() {
        let dir = tempfile::tempdir().unwrap();
        let processes: Vec<Process> = (0..11)
            .map(|pid| Process::generate(pid, 16, 1, pid as u32 + 1).unwrap())
            .collect();

        write_processes(dir.path(), &processes).unwrap();
        fs::write(dir.path().join("notes.md"), "ignored").unwrap();

        let read = read_processes(dir.path(), 11).unwrap();

        // proc10 must sort after proc9
        assert_eq!(read[10].cols, 11);
        assert!(read.iter().enumerate().all(|(i, p)| p.pid == i));
    }

    #[test]
    fn file_count_must_match_expected() {
        let dir = tempfile::tempdir().unwrap();
        write_processes(dir.path(), &[Process::generate(0, 16, 1, 1).unwrap()]).unwrap();

        let err = read_processes(dir.path(), 2).unwrap_err();

        assert_eq!(
            err.downcast_ref::<VmError>(),
            Some(&VmError::ProcessCountMismatch { expected: 2, found: 1 })
        );
    }
}

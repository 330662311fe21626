//! Generator configuration file.
//!
//! ```text
//! TP=64
//! NPROC=2
//! TAMS=4x4,8x2
//! ```
//!
//! `TP` is the page size in bytes, `NPROC` the process count and `TAMS` the
//! matrix dimensions (`rows`x`cols`) of each process, in pid order.

use std::{fs, path::Path};

use anyhow::{anyhow, bail, Context, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub page_size: u64,
    pub processes: usize,
    pub dimensions: Vec<(u32, u32)>,
}

impl GeneratorConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;

        GeneratorConfig::parse(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut page_size = None;
        let mut processes = None;
        let mut dimensions = Vec::new();

        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if let Some(value) = line.strip_prefix("TP=") {
                let value = value.trim().parse::<u64>();
                page_size = Some(value.with_context(|| format!("bad TP: {}", line))?);
            } else if let Some(value) = line.strip_prefix("NPROC=") {
                let value = value.trim().parse::<usize>();
                processes = Some(value.with_context(|| format!("bad NPROC: {}", line))?);
            } else if let Some(value) = line.strip_prefix("TAMS=") {
                for size in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                    dimensions.push(parse_dimensions(size)?);
                }
            }
        }

        let page_size = page_size.ok_or_else(|| anyhow!("incomplete config: TP is required"))?;
        let processes = processes.ok_or_else(|| anyhow!("incomplete config: NPROC is required"))?;

        if page_size == 0 {
            bail!("TP must be positive");
        }
        if dimensions.len() != processes {
            bail!("NPROC={} but TAMS lists {} matrix sizes", processes, dimensions.len());
        }

        Ok(GeneratorConfig {
            page_size,
            processes,
            dimensions,
        })
    }
}

fn parse_dimensions(size: &str) -> Result<(u32, u32)> {
    let (rows, cols) = size
        .split_once('x')
        .ok_or_else(|| anyhow!("invalid matrix size {:?}, expected RxC", size))?;

    let rows = rows.trim().parse::<u32>().with_context(|| format!("invalid rows in {:?}", size))?;
    let cols = cols.trim().parse::<u32>().with_context(|| format!("invalid cols in {:?}", size))?;

    Ok((rows, cols))
}

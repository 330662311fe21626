//! Reference generator.
//!
//! Every process models the element-wise pass `C[i][j] = A[i][j] op B[i][j]`
//! over three `rows x cols` matrices of 4-byte elements. The matrices sit
//! back to back in the virtual address space:
//!
//! | matrix | base                | size            |
//! |--------|---------------------|-----------------|
//! | A      | 0                   | rows * cols * 4 |
//! | B      | rows * cols * 4     | rows * cols * 4 |
//! | C      | 2 * rows * cols * 4 | rows * cols * 4 |
//!
//! Cells are visited in row-major order and each one yields three
//! references: read A, read B, write C.

use std::fmt;

pub type Vpn = u64;

pub const ELEMENT_SIZE: u64 = 4;
pub const REFERENCES_PER_CELL: usize = 3;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Matrix {
    A,
    B,
    C,
}

impl Matrix {
    pub fn tag(self) -> char {
        match self {
            Matrix::A => 'A',
            Matrix::B => 'B',
            Matrix::C => 'C',
        }
    }

    pub fn from_tag(tag: char) -> Option<Self> {
        match tag {
            'A' => Some(Matrix::A),
            'B' => Some(Matrix::B),
            'C' => Some(Matrix::C),
            _ => None,
        }
    }

    /// Index of the matrix region, counting from the bottom of the address space.
    fn region(self) -> u64 {
        match self {
            Matrix::A => 0,
            Matrix::B => 1,
            Matrix::C => 2,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AccessKind {
    Read,
    Write,
}

impl AccessKind {
    pub fn code(self) -> char {
        match self {
            AccessKind::Read => 'r',
            AccessKind::Write => 'w',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'r' => Some(AccessKind::Read),
            'w' => Some(AccessKind::Write),
            _ => None,
        }
    }
}

/// One memory access of a process' trace.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Reference {
    pub matrix: Matrix,
    pub row: u32,
    pub col: u32,
    pub address: u64,
    pub vpn: Vpn,
    pub offset: u64,
    pub kind: AccessKind,
}

impl Reference {
    pub fn new(
        matrix: Matrix,
        row: u32,
        col: u32,
        address: u64,
        page_size: u64,
        kind: AccessKind,
    ) -> Self {
        Reference {
            matrix,
            row,
            col,
            address,
            vpn: address / page_size,
            offset: address % page_size,
            kind,
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "M{}:[{}-{}],{},{},{}",
            self.matrix.tag(),
            self.row,
            self.col,
            self.vpn,
            self.offset,
            self.kind.code()
        )
    }
}

/// Size of one matrix region, `None` if it does not fit the address space.
pub fn matrix_bytes(rows: u32, cols: u32) -> Option<u64> {
    (rows as u64).checked_mul(cols as u64)?.checked_mul(ELEMENT_SIZE)
}

pub fn reference_count(rows: u32, cols: u32) -> Option<usize> {
    (rows as usize).checked_mul(cols as usize)?.checked_mul(REFERENCES_PER_CELL)
}

/// `ceil(3 * rows * cols * 4 / page_size)`. `page_size` must be positive.
pub fn page_count(page_size: u64, rows: u32, cols: u32) -> Option<u64> {
    Some(matrix_bytes(rows, cols)?.checked_mul(3)?.div_ceil(page_size))
}

/// Builds the full trace for a `rows x cols` process. `page_size` must be
/// positive; `Process::generate` checks it before calling. `None` when the
/// three matrices overflow the address space.
pub fn generate(page_size: u64, rows: u32, cols: u32) -> Option<Vec<Reference>> {
    page_count(page_size, rows, cols)?;

    let region = matrix_bytes(rows, cols)?;
    let mut references = Vec::with_capacity(reference_count(rows, cols)?);

    let mut push = |matrix: Matrix, row: u32, col: u32, kind: AccessKind| {
        let linear = row as u64 * cols as u64 + col as u64;
        let address = matrix.region() * region + linear * ELEMENT_SIZE;
        references.push(Reference::new(matrix, row, col, address, page_size, kind));
    };

    for row in 0..rows {
        for col in 0..cols {
            push(Matrix::A, row, col, AccessKind::Read);
            push(Matrix::B, row, col, AccessKind::Read);
            push(Matrix::C, row, col, AccessKind::Write);
        }
    }

    Some(references)
}

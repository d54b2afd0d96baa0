//! Value: what the interpreter's expressions and symbols talk about.
//!
//! Replaces the original type-discriminated byte payload (`value_defn`:
//! a type tag, a dimensionality tag and an inline 4/8-byte buffer) with a
//! proper sum type, per the "Tagged unions" design note: the discriminant
//! and payload are one Rust enum instead of a manually tagged union, and a
//! symbol's scalar payload no longer needs the extra stack-slot
//! indirection the original used to avoid growing the record — mutating a
//! `Value` in place already gives cheap rebinding.
//!
//! `STRING` and `ARRAY` values are held by pointer (`HeapPtr`) into
//! whichever heap is backing the current execution (see `crate::alloc`),
//! exactly as the distilled spec requires, rather than as owned Rust
//! strings/vectors: heap allocations are explicit (`FREE` opcode, GC) and
//! shared across cores, so the value carrier must not own the bytes.

use serde::{Deserialize, Serialize};

/// Opaque address into a `HeapAllocator`-managed region.
///
/// Host-visible and absolute, per §4.2 of the spec: the device sees the
/// same region through its own base address, which is outside this
/// crate's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HeapPtr(pub u32);

impl HeapPtr {
    pub const NULL: HeapPtr = HeapPtr(0);

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Type tag, matching the distilled spec's `{INT, REAL, STRING, BOOLEAN,
/// NONE, FN_ADDR}` plus the pointer-qualified variants. The pointer
/// qualification itself is not carried here (see module docs above); this
/// tag exists purely so mailbox frames and error messages can name a
/// value's type without matching on the full enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueTag {
    Int,
    Real,
    Str,
    Bool,
    None,
    FnAddr,
    Array,
}

impl std::fmt::Display for ValueTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ValueTag::Int => "INT",
            ValueTag::Real => "REAL",
            ValueTag::Str => "STRING",
            ValueTag::Bool => "BOOLEAN",
            ValueTag::None => "NONE",
            ValueTag::FnAddr => "FN_ADDR",
            ValueTag::Array => "ARRAY",
        };
        f.write_str(name)
    }
}

/// A runtime value: the scalar/array carrier described in §3 of the spec.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Real(f64),
    Bool(bool),
    /// Heap pointer to null-terminated bytes.
    Str(HeapPtr),
    None,
    /// Address of a function's entry point in the bytecode stream.
    FnAddr(u32),
    /// Heap pointer to an array header + row-major element data.
    Array(HeapPtr),
}

impl Value {
    pub fn tag(&self) -> ValueTag {
        match self {
            Value::Int(_) => ValueTag::Int,
            Value::Real(_) => ValueTag::Real,
            Value::Bool(_) => ValueTag::Bool,
            Value::Str(_) => ValueTag::Str,
            Value::None => ValueTag::None,
            Value::FnAddr(_) => ValueTag::FnAddr,
            Value::Array(_) => ValueTag::Array,
        }
    }

    /// Pointer-identity used by the `IS` comparison (§4.3): two heap-backed
    /// values are `IS`-equal only if they refer to the same address.
    pub fn pointer_identity(&self) -> Option<HeapPtr> {
        match self {
            Value::Str(p) | Value::Array(p) => Some(*p),
            _ => None,
        }
    }
}

/// Encoded array header, per §3:
/// `[num_dims | (extendable_flag << 4)]` followed by `num_dims` u32 dims,
/// then row-major i32 element data.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayHeader {
    pub dims: Vec<u32>,
    pub extendable: bool,
}

impl ArrayHeader {
    pub fn new(dims: Vec<u32>, extendable: bool) -> Self {
        assert!(dims.len() <= 15, "num_dims must fit in 4 bits (<= 15)");
        Self { dims, extendable }
    }

    pub fn element_count(&self) -> u32 {
        self.dims.iter().product()
    }

    pub fn header_byte(&self) -> u8 {
        (self.dims.len() as u8) | ((self.extendable as u8) << 4)
    }

    /// Total byte size of the header + dimension words (element data
    /// follows immediately after, `4 * element_count()` bytes).
    pub fn prefix_len(&self) -> usize {
        1 + self.dims.len() * 4
    }

    pub fn encode_prefix(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.prefix_len());
        out.push(self.header_byte());
        for d in &self.dims {
            out.extend_from_slice(&d.to_le_bytes());
        }
        out
    }

    pub fn decode(bytes: &[u8]) -> Self {
        let header_byte = bytes[0];
        let num_dims = (header_byte & 0x0F) as usize;
        let extendable = (header_byte >> 4) & 1 == 1;
        let mut dims = Vec::with_capacity(num_dims);
        for i in 0..num_dims {
            let off = 1 + i * 4;
            dims.push(u32::from_le_bytes(bytes[off..off + 4].try_into().unwrap()));
        }
        Self { dims, extendable }
    }

    /// Weighted row-major index for `indices`, per §4.3's `ARRAYACCESS`
    /// formula: `Σᵢ(provIdx_i · ∏_{j<num_dims-1-i} dim_j)`.
    pub fn weighted_index(&self, indices: &[u32]) -> u64 {
        let n = self.dims.len();
        let mut total: u64 = 0;
        for (i, &idx) in indices.iter().enumerate() {
            let mut stride: u64 = 1;
            for &d in &self.dims[(n - 1 - i).min(n)..] {
                stride *= d as u64;
            }
            total += idx as u64 * stride;
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_header_round_trips() {
        let header = ArrayHeader::new(vec![2, 3, 4], true);
        let mut bytes = header.encode_prefix();
        bytes.extend(std::iter::repeat(0u8).take(header.element_count() as usize * 4));
        let decoded = ArrayHeader::decode(&bytes);
        assert_eq!(decoded, header);
        assert_eq!(decoded.element_count(), 24);
    }

    #[test]
    fn weighted_index_matches_row_major() {
        // a 2x3 array: dims = [2, 3]
        let header = ArrayHeader::new(vec![2, 3], false);
        // a[1][2] should be row*3 + col = 1*3 + 2 = 5
        assert_eq!(header.weighted_index(&[1, 2]), 5);
        assert_eq!(header.weighted_index(&[0, 0]), 0);
        assert_eq!(header.weighted_index(&[1, 0]), 3);
    }

    #[test]
    fn value_tag_display() {
        assert_eq!(Value::Int(1).tag().to_string(), "INT");
        assert_eq!(Value::None.tag().to_string(), "NONE");
    }

    #[test]
    fn pointer_identity_only_for_heap_values() {
        assert!(Value::Int(1).pointer_identity().is_none());
        assert_eq!(
            Value::Str(HeapPtr(42)).pointer_identity(),
            Some(HeapPtr(42))
        );
    }
}

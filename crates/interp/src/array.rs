//! Array allocation/access (§4.3's `DIMARRAY`, `ARRAYSET`, `ARRAYACCESS`,
//! `FREE`). Entirely local to a core's own `HeapAllocator` — arrays never
//! cross the mailbox boundary, unlike strings.

use meshrt_core::{ArrayHeader, HeapAllocator, HeapPtr, RuntimeError, Value};

/// Allocate a new array with the given dimensions, all elements zeroed
/// (§4.3 `DIMARRAY`/`DIMSHAREDARRAY` — the caller picks which
/// `HeapAllocator` backs it, private or shared).
pub fn dim_array(
    heap: &mut impl HeapAllocator,
    dims: Vec<u32>,
    extendable: bool,
) -> Result<HeapPtr, RuntimeError> {
    let header = ArrayHeader::new(dims, extendable);
    let total = header.prefix_len() + header.element_count() as usize * 4;
    let ptr = heap.heap_alloc(total as u32)?;
    let mut bytes = header.encode_prefix();
    bytes.extend(std::iter::repeat(0u8).take(header.element_count() as usize * 4));
    heap.write(ptr, &bytes);
    Ok(ptr)
}

fn read_header(heap: &impl HeapAllocator, ptr: HeapPtr) -> ArrayHeader {
    // Read a generous upper bound on the header first (1 + 15*4 bytes is
    // the worst case for 15 dimensions), then decode only what's used.
    let probe = heap.read(ptr, 1 + 15 * 4);
    ArrayHeader::decode(probe)
}

/// Element access (§4.3 `ARRAYACCESS`). Negative indices and too many
/// indices are caller errors; out-of-range indices against a
/// non-extendable array are too, but an extendable array with too few
/// dimensions supplied or an index beyond its current bound simply grows
/// (see `array_set` for the growth path — `array_get` never grows).
pub fn array_get(
    heap: &impl HeapAllocator,
    ptr: HeapPtr,
    indices: &[u32],
) -> Result<Value, RuntimeError> {
    let header = read_header(heap, ptr);
    if indices.len() > header.dims.len() {
        return Err(RuntimeError::TooManyArrIndex);
    }
    for (i, &idx) in indices.iter().enumerate() {
        if idx >= header.dims[i] {
            return Err(RuntimeError::ArrIndexExceedSize);
        }
    }
    let offset = header.weighted_index(indices) as usize * 4;
    let data_start = ptr.0 as usize + header.prefix_len();
    let bytes = heap.read(HeapPtr(data_start as u32 + offset as u32), 4);
    let raw = i32::from_le_bytes(bytes.try_into().unwrap());
    Ok(Value::Int(raw as i64))
}

/// Store an element (§4.3 `ARRAYSET`). When the target array is
/// extendable and any provided index falls outside its current bound —
/// not just the last one — the array grows to the smallest bounding box
/// covering every supplied index, reallocating and copying prior content
/// forward per §4.3's extend-with-content-preservation rule.
pub fn array_set(
    heap: &mut impl HeapAllocator,
    ptr: HeapPtr,
    indices: &[u32],
    value: i32,
) -> Result<HeapPtr, RuntimeError> {
    let header = read_header(heap, ptr);
    if indices.len() > header.dims.len() {
        return Err(RuntimeError::TooManyArrIndex);
    }

    let mut new_dims = header.dims.clone();
    let mut needs_growth = false;
    for (i, &idx) in indices.iter().enumerate() {
        if idx >= header.dims[i] {
            if !header.extendable {
                return Err(RuntimeError::ArrIndexExceedSize);
            }
            needs_growth = true;
            new_dims[i] = idx + 1;
        }
    }

    if !needs_growth {
        let offset = header.weighted_index(indices) as usize * 4;
        let data_start = ptr.0 as usize + header.prefix_len();
        heap.write(HeapPtr(data_start as u32 + offset as u32), &value.to_le_bytes());
        return Ok(ptr);
    }

    // Grow to the smallest bounding box covering every supplied index,
    // remapping each old element to its corresponding position in the
    // new, larger row-major layout (a straight byte-range copy only works
    // when growth is confined to the outermost dimension).
    let new_header = ArrayHeader::new(new_dims, true);
    let new_total = new_header.prefix_len() + new_header.element_count() as usize * 4;
    let new_ptr = heap.heap_alloc(new_total as u32)?;

    let mut bytes = new_header.encode_prefix();
    bytes.extend(std::iter::repeat(0u8).take(new_header.element_count() as usize * 4));
    heap.write(new_ptr, &bytes);

    copy_old_contents(heap, ptr, &header, new_ptr, &new_header);
    heap.heap_free(ptr);

    let offset = new_header.weighted_index(indices) as usize * 4;
    let data_start = new_ptr.0 as usize + new_header.prefix_len();
    heap.write(HeapPtr(data_start as u32 + offset as u32), &value.to_le_bytes());
    Ok(new_ptr)
}

/// Copy every element of the old array into its corresponding position
/// in the new (larger-or-equal, same rank) array, decoding/encoding
/// row-major offsets against each array's own dimensions.
fn copy_old_contents(
    heap: &mut impl HeapAllocator,
    old_ptr: HeapPtr,
    old_header: &ArrayHeader,
    new_ptr: HeapPtr,
    new_header: &ArrayHeader,
) {
    let old_elems = old_header.element_count() as usize;
    if old_elems == 0 {
        return;
    }
    let n = old_header.dims.len();
    let old_data_start = old_ptr.0 as usize + old_header.prefix_len();
    let new_data_start = new_ptr.0 as usize + new_header.prefix_len();
    let mut coords = vec![0u32; n];
    for flat in 0..old_elems {
        let mut rem = flat;
        for i in (0..n).rev() {
            let d = old_header.dims[i] as usize;
            coords[i] = (rem % d) as u32;
            rem /= d;
        }
        let old_offset = old_header.weighted_index(&coords) as usize * 4;
        let new_offset = new_header.weighted_index(&coords) as usize * 4;
        let bytes = heap
            .read(HeapPtr((old_data_start + old_offset) as u32), 4)
            .to_vec();
        heap.write(HeapPtr((new_data_start + new_offset) as u32), &bytes);
    }
}

/// `LEN(arr)`: product of the array's current dimensions (§4.3/GLOSSARY).
pub fn array_len(heap: &impl HeapAllocator, ptr: HeapPtr) -> u32 {
    read_header(heap, ptr).element_count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshrt_core::FirstFitHeap;

    #[test]
    fn dim_array_zero_initializes() {
        let mut heap = FirstFitHeap::new(4096);
        let ptr = dim_array(&mut heap, vec![3], false).unwrap();
        assert_eq!(array_get(&heap, ptr, &[0]).unwrap(), Value::Int(0));
        assert_eq!(array_get(&heap, ptr, &[2]).unwrap(), Value::Int(0));
    }

    #[test]
    fn array_set_then_get_round_trips() {
        let mut heap = FirstFitHeap::new(4096);
        let ptr = dim_array(&mut heap, vec![2, 3], false).unwrap();
        let ptr = array_set(&mut heap, ptr, &[1, 2], 42).unwrap();
        assert_eq!(array_get(&heap, ptr, &[1, 2]).unwrap(), Value::Int(42));
    }

    #[test]
    fn non_extendable_out_of_range_is_an_error() {
        let mut heap = FirstFitHeap::new(4096);
        let ptr = dim_array(&mut heap, vec![3], false).unwrap();
        let err = array_set(&mut heap, ptr, &[7], 9).unwrap_err();
        assert_eq!(err, RuntimeError::ArrIndexExceedSize);
    }

    #[test]
    fn extendable_array_grows_and_preserves_content() {
        let mut heap = FirstFitHeap::new(8192);
        let ptr = dim_array(&mut heap, vec![3], true).unwrap();
        let ptr = array_set(&mut heap, ptr, &[0], 11).unwrap();
        let ptr = array_set(&mut heap, ptr, &[7], 9).unwrap();
        assert_eq!(array_len(&heap, ptr), 8);
        assert_eq!(array_get(&heap, ptr, &[0]).unwrap(), Value::Int(11));
        assert_eq!(array_get(&heap, ptr, &[7]).unwrap(), Value::Int(9));
    }

    #[test]
    fn too_many_indices_is_an_error() {
        let mut heap = FirstFitHeap::new(4096);
        let ptr = dim_array(&mut heap, vec![3], false).unwrap();
        let err = array_get(&heap, ptr, &[0, 0]).unwrap_err();
        assert_eq!(err, RuntimeError::TooManyArrIndex);
    }

    #[test]
    fn extendable_growth_on_a_leading_dimension_preserves_every_prior_cell() {
        // a 2x3 array; writing row index 4 (beyond dim 0's bound of 2)
        // must grow dim 0 to 5 while leaving every existing [row][col]
        // value addressable at its own coordinates in the new layout.
        let mut heap = FirstFitHeap::new(8192);
        let ptr = dim_array(&mut heap, vec![2, 3], true).unwrap();
        let ptr = array_set(&mut heap, ptr, &[0, 0], 10).unwrap();
        let ptr = array_set(&mut heap, ptr, &[0, 2], 12).unwrap();
        let ptr = array_set(&mut heap, ptr, &[1, 1], 21).unwrap();
        let ptr = array_set(&mut heap, ptr, &[4, 2], 99).unwrap();

        assert_eq!(array_get(&heap, ptr, &[0, 0]).unwrap(), Value::Int(10));
        assert_eq!(array_get(&heap, ptr, &[0, 2]).unwrap(), Value::Int(12));
        assert_eq!(array_get(&heap, ptr, &[1, 1]).unwrap(), Value::Int(21));
        assert_eq!(array_get(&heap, ptr, &[4, 2]).unwrap(), Value::Int(99));
    }
}

//! Batched fragment container (`.frags`).
//!
//! One chunk's encoded meshes packed together for a later sharding pass.
//!
//! Layout (little-endian):
//!   00 : [u8;4]  magic = b"FRAG"
//!   04 : u32     version = 1
//!   08 : u32     entry count
//!   ..  : per entry, ascending id: u64 id, u32 len, [u8; len]

use crate::error::{MeshTaskError, Result};
use crate::types::LabelId;
use std::collections::BTreeMap;

pub const FRAGS_MAGIC: [u8; 4] = *b"FRAG";
pub const FRAGS_VERSION: u32 = 1;

/// Content type recorded for `.frags` objects.
pub const FRAGS_CONTENT_TYPE: &str = "application/x-chunk-mesher-frags";

pub fn write_batch(meshes: &BTreeMap<LabelId, Vec<u8>>) -> Vec<u8> {
    let payload: usize = meshes.values().map(|m| 12 + m.len()).sum();
    let mut out = Vec::with_capacity(12 + payload);
    out.extend_from_slice(&FRAGS_MAGIC);
    out.extend_from_slice(&FRAGS_VERSION.to_le_bytes());
    out.extend_from_slice(&(meshes.len() as u32).to_le_bytes());
    for (id, bytes) in meshes {
        out.extend_from_slice(&id.to_le_bytes());
        out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        out.extend_from_slice(bytes);
    }
    out
}

fn take<'a>(buf: &mut &'a [u8], n: usize) -> Result<&'a [u8]> {
    if buf.len() < n {
        return Err(MeshTaskError::MalformedFragmentBatch("truncated".to_string()));
    }
    let (head, tail) = buf.split_at(n);
    *buf = tail;
    Ok(head)
}

fn le_u32(buf: &mut &[u8]) -> Result<u32> {
    let b = take(buf, 4)?;
    Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

fn le_u64(buf: &mut &[u8]) -> Result<u64> {
    let b = take(buf, 8)?;
    let mut word = [0u8; 8];
    word.copy_from_slice(b);
    Ok(u64::from_le_bytes(word))
}

pub fn read_batch(mut buf: &[u8]) -> Result<BTreeMap<LabelId, Vec<u8>>> {
    if take(&mut buf, 4)? != FRAGS_MAGIC {
        return Err(MeshTaskError::MalformedFragmentBatch("bad magic".to_string()));
    }
    let version = le_u32(&mut buf)?;
    if version != FRAGS_VERSION {
        return Err(MeshTaskError::MalformedFragmentBatch(format!(
            "unsupported version {}",
            version
        )));
    }

    let count = le_u32(&mut buf)?;
    let mut meshes = BTreeMap::new();
    for _ in 0..count {
        let id = le_u64(&mut buf)?;
        let len = le_u32(&mut buf)? as usize;
        meshes.insert(id, take(&mut buf, len)?.to_vec());
    }
    if !buf.is_empty() {
        return Err(MeshTaskError::MalformedFragmentBatch(format!(
            "{} trailing bytes",
            buf.len()
        )));
    }
    Ok(meshes)
}

use memmap2::Mmap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

const MMAP_THRESHOLD: u64 = 1024 * 1024; // 1 MiB

/// Read up to `limit` bytes from the head of a file.
pub fn read_prefix<P: AsRef<Path>>(path: P, limit: usize) -> io::Result<Vec<u8>> {
    let file = File::open(path.as_ref())?;
    let mut buf = Vec::with_capacity(limit.min(64 * 1024));
    file.take(limit as u64).read_to_end(&mut buf)?;
    Ok(buf)
}

/// Read a whole file as text, replacing invalid UTF-8 with U+FFFD.
///
/// Only I/O can fail here; decoding never does.
pub fn read_lossy<P: AsRef<Path>>(path: P) -> io::Result<String> {
    let path = path.as_ref();
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();

    if len > MMAP_THRESHOLD {
        // SAFETY: read-only map of an existing regular file
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(String::from_utf8_lossy(&mmap).into_owned())
    } else {
        let mut buf = Vec::with_capacity(len as usize);
        file.read_to_end(&mut buf)?;
        Ok(match String::from_utf8(buf) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }
}

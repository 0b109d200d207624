use std::io::Read;

use flate2::read::GzDecoder;

/// Member name suffix that identifies a chart manifest
pub const MANIFEST_SUFFIX: &[u8] = b"Chart.yaml";

/// Upper bound on the buffer preallocated from a member's declared size
const MAX_PREALLOCATION: u64 = 128 * 1024;

/// Find the chart manifest inside a gzip-compressed tar archive
///
/// Members are scanned in archive order and the first one whose path ends in
/// `Chart.yaml` is returned; nothing after it is read.
///
/// Returns:
/// - `Ok(Some(bytes))` with the manifest contents
/// - `Ok(None)` if the archive was read to the end without a manifest
/// - `Err(_)` if decompression or tar parsing failed
pub fn find_manifest<R: Read>(input: R) -> std::io::Result<Option<Vec<u8>>> {
    let mut archive = tar::Archive::new(GzDecoder::new(input));

    for member in archive.entries()? {
        let mut member = member?;
        if !member.path_bytes().ends_with(MANIFEST_SUFFIX) {
            continue;
        }

        let size = member.size();
        let mut contents = Vec::with_capacity(size.min(MAX_PREALLOCATION) as usize);
        member.read_to_end(&mut contents)?;
        if contents.len() as u64 != size {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!(
                    "truncated {}: header declares {} bytes, archive holds {}",
                    String::from_utf8_lossy(&member.path_bytes()),
                    size,
                    contents.len()
                ),
            ));
        }
        return Ok(Some(contents));
    }

    Ok(None)
}

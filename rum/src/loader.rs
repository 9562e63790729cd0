//! Reads a program file into a vector of big-endian 32-bit words.

use std::fs;
use std::path::Path;

use crate::error::UmError;

/// Loads `path` as a sequence of tightly-packed big-endian 32-bit words.
///
/// The file length must be a non-negative multiple of 4; any other size,
/// or any I/O failure opening/reading the file, is reported as a
/// [`UmError`] rather than panicking, so `main` can print a diagnostic and
/// exit non-zero per the external interface contract.
pub fn load(path: &Path) -> Result<Vec<u32>, UmError> {
    log::debug!("loading program from {}", path.display());
    let bytes = fs::read(path).map_err(|err| UmError::ProgramUnreadable {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;

    if bytes.len() % 4 != 0 {
        return Err(UmError::TruncatedProgram {
            path: path.display().to_string(),
            len: bytes.len() as u64,
        });
    }

    let words: Vec<u32> = bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_be_bytes(chunk.try_into().expect("chunk of size 4")))
        .collect();
    log::debug!("loaded {} words ({} bytes)", words.len(), bytes.len());
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_big_endian_words() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0x00, 0x00, 0x00, 0x01, 0xFF, 0x00, 0x00, 0x00])
            .unwrap();
        let words = load(file.path()).unwrap();
        assert_eq!(words, vec![1, 0xFF000000]);
    }

    #[test]
    fn rejects_truncated_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0x00, 0x00, 0x00]).unwrap();
        assert!(matches!(
            load(file.path()),
            Err(UmError::TruncatedProgram { .. })
        ));
    }

    #[test]
    fn rejects_missing_file() {
        assert!(matches!(
            load(Path::new("/no/such/file/here")),
            Err(UmError::ProgramUnreadable { .. })
        ));
    }

    #[test]
    fn empty_file_is_a_valid_zero_length_program() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(load(file.path()).unwrap(), Vec::<u32>::new());
    }
}

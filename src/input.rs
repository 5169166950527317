use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

/// Read input lines from `files` in order, or from stdin when none are given.
pub fn read_input_lines(files: &[PathBuf]) -> Result<Vec<String>> {
    if files.is_empty() {
        let stdin = std::io::stdin();
        return read_lines(stdin.lock())
            .map_err(|e| Error::Input(format!("failed to read stdin: {e}")));
    }

    let mut lines = Vec::new();
    for path in files {
        lines.extend(read_file_lines(path)?);
    }
    Ok(lines)
}

fn read_file_lines(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path)
        .map_err(|e| Error::Input(format!("failed to open {}: {e}", path.display())))?;
    let lines = read_lines(BufReader::new(file))
        .map_err(|e| Error::Input(format!("failed to read {}: {e}", path.display())))?;
    debug!(path = %path.display(), count = lines.len(), "read input file");
    Ok(lines)
}

/// Split a reader into lines, dropping only the trailing `\n` of each line.
pub fn read_lines<R: BufRead>(mut reader: R) -> std::io::Result<Vec<String>> {
    let mut lines = Vec::new();
    let mut buf = String::new();
    loop {
        buf.clear();
        if reader.read_line(&mut buf)? == 0 {
            break;
        }
        let line = buf.strip_suffix('\n').unwrap_or(&buf);
        lines.push(line.to_string());
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_read_lines_keeps_inner_whitespace() {
        let lines = read_lines("  a  \n\tb\n\nc".as_bytes()).unwrap();
        assert_eq!(lines, vec!["  a  ", "\tb", "", "c"]);
    }

    #[test]
    fn test_read_lines_only_strips_newline() {
        let lines = read_lines("a\r\nb\n".as_bytes()).unwrap();
        assert_eq!(lines, vec!["a\r", "b"]);
    }

    #[test]
    fn test_multiple_files_concatenate_in_order() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("first.txt");
        let second = dir.path().join("second.txt");
        fs::write(&first, "l1\nl2\n").unwrap();
        fs::write(&second, "  l3\nl4\n").unwrap();

        let lines = read_input_lines(&[first, second]).unwrap();
        assert_eq!(lines.join("\n"), "l1\nl2\n  l3\nl4");
    }

    #[test]
    fn test_missing_file_is_input_error() {
        let dir = TempDir::new().unwrap();
        let err = read_input_lines(&[dir.path().join("absent.txt")]).unwrap_err();
        assert!(matches!(err, Error::Input(_)));
        assert!(err.to_string().contains("absent.txt"));
    }
}

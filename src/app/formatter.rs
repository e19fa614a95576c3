use crate::app::models::FileRecord;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Width of the dashed line framing each file header.
pub const SEPARATOR_WIDTH: usize = 50;

/// Prefix other tools scan for to find file boundaries.
pub const HEADER_PREFIX: &str = "FILE: ";

pub struct OutputGenerator;

impl OutputGenerator {
    /// Writes one file block:
    ///
    /// ```text
    /// --------------------------------------------------
    /// FILE: src/main.rs
    /// --------------------------------------------------
    ///
    /// <content>
    ///
    /// ```
    pub fn write_record<W: Write + ?Sized>(writer: &mut W, record: &FileRecord) -> io::Result<()> {
        let separator = "-".repeat(SEPARATOR_WIDTH);
        writeln!(writer, "{}", separator)?;
        writeln!(writer, "{}{}", HEADER_PREFIX, record.relative_path)?;
        writeln!(writer, "{}", separator)?;
        writeln!(writer)?;
        writer.write_all(&record.content)?;
        writer.write_all(b"\n\n")
    }

    /// Number of words in `path`, split on Unicode whitespace.
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn count_words(path: &Path) -> io::Result<usize> {
        let bytes = fs::read(path)?;
        Ok(String::from_utf8_lossy(&bytes).split_whitespace().count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_record_block_layout() {
        let record = FileRecord {
            relative_path: "src/main.rs".to_string(),
            content: b"fn main() {}".to_vec(),
        };
        let mut out = Vec::new();
        OutputGenerator::write_record(&mut out, &record).unwrap();

        let dashes = "-".repeat(50);
        let expected = format!("{dashes}\nFILE: src/main.rs\n{dashes}\n\nfn main() {{}}\n\n");
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn test_content_is_copied_verbatim() {
        let record = FileRecord {
            relative_path: "a.txt".to_string(),
            content: b"line one\r\n\ttabbed\n".to_vec(),
        };
        let mut out = Vec::new();
        OutputGenerator::write_record(&mut out, &record).unwrap();
        assert!(out.ends_with(b"line one\r\n\ttabbed\n\n\n"));
    }

    #[test]
    fn test_count_words() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.txt");
        std::fs::write(&path, "FILE: a.go\n\npackage main\n\n  func  main() {}\n").unwrap();
        assert_eq!(OutputGenerator::count_words(&path).unwrap(), 7);
    }

    #[test]
    fn test_count_words_splits_on_unicode_spaces() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.txt");
        std::fs::write(&path, "a\u{00A0}b\u{2003}c d\u{3000}e\n").unwrap();
        assert_eq!(OutputGenerator::count_words(&path).unwrap(), 5);

        std::fs::write(&path, b"caf\xe9 ok\n").unwrap();
        assert_eq!(OutputGenerator::count_words(&path).unwrap(), 2);
    }

    #[test]
    fn test_count_words_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(OutputGenerator::count_words(&dir.path().join("none")).is_err());
    }
}

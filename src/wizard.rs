//! Interactive prompts for the guided scan.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// Output file name used when the user just presses enter.
pub const DEFAULT_OUTPUT: &str = "storage_report.json";

/// Line-based question/answer session over any reader and writer.
pub struct Wizard<R, W> {
    input: R,
    out: W,
}

impl<R: BufRead, W: Write> Wizard<R, W> {
    pub fn new(input: R, out: W) -> Self {
        Self { input, out }
    }

    /// Ask for the directory to scan.
    ///
    /// Returns `None` when the user declines to retry after naming a
    /// missing path, or when input ends.
    pub fn prompt_root(&mut self) -> io::Result<Option<PathBuf>> {
        loop {
            writeln!(self.out, "\nEnter the directory path you want to scan:")?;
            let Some(answer) = self.ask("Path: ")? else {
                return Ok(None);
            };
            let answer = strip_quotes(&answer);
            if answer.is_empty() {
                writeln!(self.out, "Please enter a path")?;
                continue;
            }

            let path = PathBuf::from(answer);
            if !path.exists() {
                writeln!(self.out, "Path does not exist: {}", path.display())?;
                match self.ask("Try again? (y/n): ")? {
                    Some(retry) if retry.trim().eq_ignore_ascii_case("y") => continue,
                    _ => return Ok(None),
                }
            }
            if !path.is_dir() {
                writeln!(self.out, "Path is not a directory: {}", path.display())?;
                continue;
            }
            return Ok(Some(path));
        }
    }

    /// Ask for the report file name, defaulting to [`DEFAULT_OUTPUT`].
    pub fn prompt_output(&mut self) -> io::Result<PathBuf> {
        writeln!(self.out, "\nSave report as:")?;
        let answer = self
            .ask(&format!("Filename (default: {DEFAULT_OUTPUT}): "))?
            .unwrap_or_default();
        Ok(output_name(strip_quotes(&answer)))
    }

    /// Print a line of text.
    pub fn say(&mut self, line: impl AsRef<str>) -> io::Result<()> {
        writeln!(self.out, "{}", line.as_ref())
    }

    /// Print `prompt` and read one line; `None` at end of input.
    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.out, "{prompt}")?;
        self.out.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

/// Resolve the output file name, appending `.json` when missing.
pub fn output_name(answer: &str) -> PathBuf {
    let answer = answer.trim();
    if answer.is_empty() {
        return PathBuf::from(DEFAULT_OUTPUT);
    }
    let is_json = Path::new(answer)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        PathBuf::from(answer)
    } else {
        PathBuf::from(format!("{answer}.json"))
    }
}

fn strip_quotes(s: &str) -> &str {
    s.trim().trim_matches(|c| c == '"' || c == '\'')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn wizard(input: &str) -> Wizard<Cursor<Vec<u8>>, Vec<u8>> {
        Wizard::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_output_name_defaults_and_extension() {
        assert_eq!(output_name(""), PathBuf::from("storage_report.json"));
        assert_eq!(output_name("my_scan"), PathBuf::from("my_scan.json"));
        assert_eq!(output_name("data.JSON"), PathBuf::from("data.JSON"));
        assert_eq!(output_name("backup.txt"), PathBuf::from("backup.txt.json"));
    }

    #[test]
    fn test_prompt_root_accepts_directory() {
        let temp = TempDir::new().unwrap();
        let mut w = wizard(&format!("\"{}\"\n", temp.path().display()));
        assert_eq!(w.prompt_root().unwrap(), Some(temp.path().to_path_buf()));
    }

    #[test]
    fn test_missing_path_declined_exits() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");
        let mut w = wizard(&format!("{}\nn\n", missing.display()));

        assert_eq!(w.prompt_root().unwrap(), None);
        let out = String::from_utf8(w.out).unwrap();
        assert!(out.contains("Path does not exist"));
    }

    #[test]
    fn test_missing_path_retry_then_file_then_directory() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.txt");
        fs::write(&file, "x").unwrap();
        let input = format!(
            "{}\ny\n{}\n\n{}\n",
            temp.path().join("nope").display(),
            file.display(),
            temp.path().display()
        );
        let mut w = wizard(&input);

        assert_eq!(w.prompt_root().unwrap(), Some(temp.path().to_path_buf()));
        let out = String::from_utf8(w.out).unwrap();
        assert!(out.contains("Path is not a directory"));
        assert!(out.contains("Please enter a path"));
    }

    #[test]
    fn test_end_of_input() {
        assert_eq!(wizard("").prompt_root().unwrap(), None);
        assert_eq!(
            wizard("").prompt_output().unwrap(),
            PathBuf::from(DEFAULT_OUTPUT)
        );
    }
}

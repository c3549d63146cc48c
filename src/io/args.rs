//! Positional argument resolution and the interactive query prompt.

use crate::error::{IndexError, IndexResult};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

/// Where the query text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuerySource {
    /// Given on the command line
    Literal(String),
    /// Read from stdin after printing `Query: `
    Prompt,
}

/// Resolve `[PATH] [QUERY]`.
///
/// - nothing: current directory, prompt for the query
/// - path only: that directory, prompt for the query
/// - path and query: both literal
///
/// The root must exist and be a directory.
pub fn resolve_positionals(
    path: Option<&Path>,
    query: Option<&str>,
) -> IndexResult<(PathBuf, QuerySource)> {
    let root = path.map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    if !root.is_dir() {
        return Err(IndexError::Usage(format!(
            "'{}' is not a directory",
            root.display()
        )));
    }
    let source = match query {
        Some(q) => QuerySource::Literal(q.to_string()),
        None => QuerySource::Prompt,
    };
    Ok((root, source))
}

/// Trim surrounding whitespace; an empty query is a usage error.
pub fn normalize_query(raw: &str) -> IndexResult<String> {
    let query = raw.trim();
    if query.is_empty() {
        return Err(IndexError::Usage("query must not be empty".to_string()));
    }
    Ok(query.to_string())
}

/// Print `Query: ` to `output` and read one line from `input`.
pub fn prompt_query<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> IndexResult<String> {
    let prompt_err = |source| IndexError::Io {
        action: "write the query prompt",
        source,
    };
    write!(output, "Query: ").map_err(prompt_err)?;
    output.flush().map_err(prompt_err)?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .map_err(|source| IndexError::Io {
            action: "read the query from stdin",
            source,
        })?;
    normalize_query(&line)
}

/// Resolve the query text for `source`, prompting on stdin when needed.
pub fn read_query(source: &QuerySource) -> IndexResult<String> {
    match source {
        QuerySource::Literal(q) => normalize_query(q),
        QuerySource::Prompt => {
            let stdin = std::io::stdin();
            let mut input = stdin.lock();
            // Prompt goes to stderr so stdout stays machine-readable
            let mut output = std::io::stderr();
            prompt_query(&mut input, &mut output)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn test_no_positionals_uses_current_dir_and_prompt() {
        let (root, source) = resolve_positionals(None, None).unwrap();
        assert_eq!(root, PathBuf::from("."));
        assert_eq!(source, QuerySource::Prompt);
    }

    #[test]
    fn test_path_only_prompts() {
        let dir = TempDir::new().unwrap();
        let (root, source) = resolve_positionals(Some(dir.path()), None).unwrap();
        assert_eq!(root, dir.path());
        assert_eq!(source, QuerySource::Prompt);
    }

    #[test]
    fn test_path_and_query() {
        let dir = TempDir::new().unwrap();
        let (_, source) = resolve_positionals(Some(dir.path()), Some("http handler")).unwrap();
        assert_eq!(source, QuerySource::Literal("http handler".to_string()));
    }

    #[test]
    fn test_missing_path_is_usage_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let err = resolve_positionals(Some(&missing), Some("q")).unwrap_err();
        assert!(matches!(err, IndexError::Usage(_)));
    }

    #[test]
    fn test_normalize_query() {
        assert_eq!(normalize_query("  parse args \n").unwrap(), "parse args");
        assert!(matches!(
            normalize_query(" \t\n"),
            Err(IndexError::Usage(_))
        ));
    }

    #[test]
    fn test_prompt_reads_one_line() {
        let mut input = Cursor::new("where is the tokenizer\nignored\n");
        let mut output = Vec::new();
        let query = prompt_query(&mut input, &mut output).unwrap();
        assert_eq!(query, "where is the tokenizer");
        assert_eq!(String::from_utf8(output).unwrap(), "Query: ");
    }

    #[test]
    fn test_prompt_eof_is_usage_error() {
        let mut input = Cursor::new("");
        let mut output = Vec::new();
        let err = prompt_query(&mut input, &mut output).unwrap_err();
        assert!(matches!(err, IndexError::Usage(_)));
    }

    struct ClosedStream;

    impl std::io::Read for ClosedStream {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }
    }

    impl Write for ClosedStream {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_prompt_stream_failures_are_io_errors() {
        let mut input = std::io::BufReader::new(ClosedStream);
        let mut output = Vec::new();
        let err = prompt_query(&mut input, &mut output).unwrap_err();
        assert!(matches!(
            err,
            IndexError::Io {
                action: "read the query from stdin",
                ..
            }
        ));

        let mut input = Cursor::new("query\n");
        let err = prompt_query(&mut input, &mut ClosedStream).unwrap_err();
        assert!(matches!(err, IndexError::Io { .. }));
    }
}

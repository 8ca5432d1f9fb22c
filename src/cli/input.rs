//! Snapshot input and report output

use anyhow::{bail, Context, Result};
use repolens::signals::RawSnapshot;
use repolens::EngineResult;
use std::io::Read;
use std::path::Path;
use tracing::{debug, error};

/// Snapshots read from one input
pub(crate) struct Snapshots {
    pub items: Vec<RawSnapshot>,
    /// The input was a single object rather than an array
    pub single: bool,
}

/// Read a JSON object or array of snapshots from a file, or stdin for `-`
pub(crate) fn read_snapshots(path: &Path) -> Result<Snapshots> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read snapshots from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
    };
    parse_snapshots(&content).with_context(|| format!("Invalid snapshot JSON in {}", path.display()))
}

pub(crate) fn parse_snapshots(content: &str) -> Result<Snapshots> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    match value {
        serde_json::Value::Array(values) => {
            let items = values
                .into_iter()
                .enumerate()
                .map(|(i, v)| snapshot_at(i, v))
                .collect::<Result<Vec<RawSnapshot>>>()?;
            Ok(Snapshots { items, single: false })
        }
        value @ serde_json::Value::Object(_) => Ok(Snapshots {
            items: vec![snapshot_at(0, value)?],
            single: true,
        }),
        _ => bail!("expected a snapshot object or an array of snapshots"),
    }
}

/// Decode one array element. A non-object carries no identifier, so it
/// becomes an empty snapshot and fails extraction on its own.
fn snapshot_at(index: usize, value: serde_json::Value) -> Result<RawSnapshot> {
    if !value.is_object() {
        debug!("snapshot #{} is not an object", index);
        return Ok(RawSnapshot::default());
    }
    serde_json::from_value(value).with_context(|| format!("snapshot #{} could not be decoded", index))
}

/// Keep the successes, log the failures.
///
/// A single-snapshot input fails with its own error; for batches every
/// failure is logged and reported as one error after the successes.
pub(crate) fn collect<T>(results: Vec<EngineResult<T>>, single: bool) -> Result<(Vec<T>, usize)> {
    let mut ok = Vec::with_capacity(results.len());
    let mut failed = 0;
    for (i, result) in results.into_iter().enumerate() {
        match result {
            Ok(item) => ok.push(item),
            Err(e) if single => return Err(e.into()),
            Err(e) => {
                error!("snapshot #{}: {}", i, e);
                failed += 1;
            }
        }
    }
    Ok((ok, failed))
}

/// Print to stdout or write to `output`
pub(crate) fn emit(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}

/// Error out after output when part of a batch failed
pub(crate) fn finish(failed: usize, total: usize) -> Result<()> {
    if failed > 0 {
        bail!("{} of {} snapshots could not be processed", failed, total);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use repolens::EngineError;

    #[test]
    fn test_parse_single_and_array() {
        let one = parse_snapshots(r#"{"full_name": "a/b"}"#).unwrap();
        assert!(one.single);
        assert_eq!(one.items.len(), 1);

        let many = parse_snapshots(r#"[{"full_name": "a/b"}, {"full_name": "a/c"}]"#).unwrap();
        assert!(!many.single);
        assert_eq!(many.items.len(), 2);

        assert!(parse_snapshots("42").is_err());
    }

    #[test]
    fn test_bad_element_does_not_reject_batch() {
        let many = parse_snapshots(
            r#"[{"full_name": "a/b", "stargazers_count": -1, "topics": ["rust", null]}, 1, {"full_name": "a/c"}]"#,
        )
        .unwrap();
        assert_eq!(many.items.len(), 3);
        assert_eq!(many.items[0].full_name.as_deref(), Some("a/b"));
        assert_eq!(many.items[0].topics, vec!["rust"]);
        assert!(many.items[1].full_name.is_none());
        assert!(repolens::signals::extract(&many.items[1]).is_err());
        assert!(repolens::signals::extract(&many.items[2]).is_ok());
    }

    #[test]
    fn test_collect_batch_and_single() {
        let results: Vec<EngineResult<u32>> = vec![
            Ok(1),
            Err(EngineError::MalformedSnapshot { reason: "x".into() }),
            Ok(3),
        ];
        let (ok, failed) = collect(results, false).unwrap();
        assert_eq!(ok, vec![1, 3]);
        assert_eq!(failed, 1);

        let single: Vec<EngineResult<u32>> =
            vec![Err(EngineError::MalformedSnapshot { reason: "x".into() })];
        assert!(collect(single, true).is_err());
    }
}

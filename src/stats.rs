use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::prelude::*;

pub type StatsMap = BTreeMap<String, String>;

/// Parses `key value` lines. Blank lines and lines starting with `-` are
/// skipped; anything after the second token is ignored.
pub fn parse_stats(content: &str) -> Result<StatsMap> {
    let mut stats = StatsMap::new();
    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('-') {
            continue;
        }
        let mut tokens = trimmed.split_whitespace();
        match (tokens.next(), tokens.next()) {
            (Some(key), Some(value)) => {
                stats.insert(key.to_string(), value.to_string());
            }
            _ => {
                return Err(Error::MalformedStats {
                    line_no: idx + 1,
                    line: line.to_string(),
                });
            }
        }
    }
    Ok(stats)
}

pub fn read_stats<P: AsRef<Path>>(path: P) -> Result<StatsMap> {
    let path = path.as_ref();
    debug!("Reading stats from {}", path.display());
    let content = fs::read_to_string(path)?;
    parse_stats(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_stats() {
        let content = r#"
---------- Begin Simulation Statistics ----------
sim_seconds      0.012    # Number of seconds simulated
host_tick_rate   4.5k

system.cpu.ipc	1.25
---------- End Simulation Statistics   ----------
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();

        let stats = read_stats(temp_file.path()).unwrap();
        assert_eq!(stats.len(), 3);
        assert_eq!(stats["sim_seconds"], "0.012");
        assert_eq!(stats["host_tick_rate"], "4.5k");
        assert_eq!(stats["system.cpu.ipc"], "1.25");
    }

    #[test]
    fn written_pairs_read_back_unchanged() {
        let pairs = [("alpha", "1"), ("beta", "2.5"), ("gamma", "10ms")];
        let content: String = pairs
            .iter()
            .map(|(k, v)| format!("{} {}\n", k, v))
            .collect();

        let stats = parse_stats(&content).unwrap();
        let expected: StatsMap = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(stats, expected);
    }

    #[test]
    fn later_keys_overwrite_earlier_ones() {
        let stats = parse_stats("a 1\na 2\n").unwrap();
        assert_eq!(stats["a"], "2");
    }

    #[test]
    fn single_token_line_is_rejected() {
        let err = parse_stats("a 1\nlonely\n").unwrap_err();
        assert!(matches!(err, Error::MalformedStats { line_no: 2, .. }));
    }
}

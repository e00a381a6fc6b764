//! Plain text ledger that streamers can edit by hand.
//!
//! ```text
//! # BakeRank Player Database - Edit with Notepad
//! # Format: username | bake_score | last_bake_time
//! # WARNING: Keep the | separators intact!
//!
//! alice | 42 | 1718000000.25
//! ```
//!
//! `#` comments and blank lines are ignored and malformed lines are skipped.
//! The last field is Unix seconds with an optional fraction.

use super::{LedgerError, LedgerStore, UserRecord};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tracing::warn;

const HEADER: &str = "# BakeRank Player Database - Edit with Notepad\n\
# Format: username | bake_score | last_bake_time\n\
# WARNING: Keep the | separators intact!\n\n";

const NANOS_PER_SECOND: u128 = 1_000_000_000;

#[derive(Debug, Clone)]
pub struct TextFileStore {
    path: PathBuf,
}

impl TextFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl LedgerStore for TextFileStore {
    fn load_all(&self) -> Result<Vec<UserRecord>, LedgerError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let records = content
            .lines()
            .enumerate()
            .filter_map(|(index, line)| {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    return None;
                }
                let parsed = parse_line(line);
                if parsed.is_none() {
                    warn!(line = index + 1, path = %self.path.display(), "Skipping malformed ledger line");
                }
                parsed
            })
            .collect();

        Ok(records)
    }

    fn save_all(&self, records: &[UserRecord]) -> Result<(), LedgerError> {
        let mut sorted: Vec<&UserRecord> = records.iter().collect();
        sorted.sort_by(|a, b| b.score.cmp(&a.score));

        let mut out = String::from(HEADER);
        for record in sorted {
            out.push_str(&format_line(record));
            out.push('\n');
        }

        // Write atomically: write to temp file, then rename
        let temp_path = self.temp_path();
        std::fs::write(&temp_path, out)?;
        std::fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

fn parse_line(line: &str) -> Option<UserRecord> {
    let fields: Vec<&str> = line.split('|').map(str::trim).collect();
    let [user_id, score, last_action_at] = fields.as_slice() else {
        return None;
    };
    if user_id.is_empty() {
        return None;
    }
    Some(UserRecord {
        user_id: (*user_id).to_string(),
        score: score.parse().ok()?,
        last_action_at: parse_unix_seconds(last_action_at)?,
    })
}

fn format_line(record: &UserRecord) -> String {
    format!(
        "{} | {} | {}",
        record.user_id,
        record.score,
        format_unix_seconds(record.last_action_at)
    )
}

/// Parse `1718000000`, `1718000000.25` or `-3.5` into a timestamp.
fn parse_unix_seconds(raw: &str) -> Option<OffsetDateTime> {
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction) {
        return None;
    }

    let seconds: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    // Digits past nanosecond precision are dropped.
    let nanos = fraction
        .bytes()
        .chain(std::iter::repeat(b'0'))
        .take(9)
        .fold(0u128, |acc, b| acc * 10 + u128::from(b - b'0'));

    let total = i128::try_from(seconds.checked_mul(NANOS_PER_SECOND)?.checked_add(nanos)?).ok()?;
    let total = if negative { -total } else { total };
    OffsetDateTime::from_unix_timestamp_nanos(total).ok()
}

/// Shortest decimal form that round-trips through [`parse_unix_seconds`].
fn format_unix_seconds(at: OffsetDateTime) -> String {
    let nanos = at.unix_timestamp_nanos();
    let sign = if nanos < 0 { "-" } else { "" };
    let magnitude = nanos.unsigned_abs();
    let seconds = magnitude / NANOS_PER_SECOND;
    let fraction = magnitude % NANOS_PER_SECOND;
    if fraction == 0 {
        format!("{sign}{seconds}")
    } else {
        let digits = format!("{fraction:09}");
        format!("{sign}{seconds}.{}", digits.trim_end_matches('0'))
    }
}

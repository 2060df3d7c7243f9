//! Attempt log
//!
//! Append-only CSV of every delivery attempt, mirrored in memory so the
//! estimator and the history endpoint never re-read the file.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::PlannerResult;
use crate::types::DeliveryAttempt;

/// File-backed attempt log
#[derive(Debug)]
pub struct AttemptLog {
    path: PathBuf,
    attempts: Vec<DeliveryAttempt>,
}

impl AttemptLog {
    /// Load every readable row from `path`. A missing file is an empty log.
    pub fn open(path: impl Into<PathBuf>) -> PlannerResult<Self> {
        let path = path.into();
        let attempts = if path.exists() {
            Self::load_from_disk(&path)?
        } else {
            info!("No attempt log at {}, starting empty", path.display());
            Vec::new()
        };
        Ok(Self { path, attempts })
    }

    fn load_from_disk(path: &Path) -> PlannerResult<Vec<DeliveryAttempt>> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(path)?;

        let mut attempts = Vec::new();
        let mut skipped = 0usize;
        for (line, row) in reader.deserialize::<DeliveryAttempt>().enumerate() {
            match row {
                Ok(attempt) => attempts.push(attempt),
                Err(e) => {
                    skipped += 1;
                    warn!("Skipping attempt log row {}: {}", line + 2, e);
                }
            }
        }
        info!(
            "Loaded {} attempts from {} ({} skipped)",
            attempts.len(),
            path.display(),
            skipped
        );
        Ok(attempts)
    }

    /// Append one attempt to disk, then to memory. Nothing changes if the write fails.
    pub fn append(&mut self, attempt: DeliveryAttempt) -> PlannerResult<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&self.path)?;
        let needs_header = file.metadata()?.len() == 0;
        if !needs_header && !ends_with_newline(&mut file)? {
            file.write_all(b"\n")?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(&attempt)?;
        writer.flush()?;

        self.attempts.push(attempt);
        Ok(())
    }

    pub fn attempts(&self) -> &[DeliveryAttempt] {
        &self.attempts
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    /// Newest first, optionally for one customer
    pub fn recent(&self, customer: Option<&str>, limit: usize) -> Vec<DeliveryAttempt> {
        let customer = customer.map(str::trim).filter(|c| !c.is_empty());
        self.attempts
            .iter()
            .rev()
            .filter(|a| customer.map_or(true, |c| a.customer.eq_ignore_ascii_case(c)))
            .take(limit)
            .cloned()
            .collect()
    }
}

fn ends_with_newline(file: &mut File) -> std::io::Result<bool> {
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Area, Day, Outcome, PackageSize};
    use chrono::Weekday;

    const HEADER: &str = "Name,Day of Delivery Attempt,Time,Area,Package Size,Delivery Status";

    fn attempt(name: &str, success: bool) -> DeliveryAttempt {
        DeliveryAttempt {
            customer: name.to_string(),
            day: Day::new(Weekday::Wed),
            time_slot: "3 PM".parse().unwrap(),
            area: Area::Paldi,
            package_size: PackageSize::Medium,
            outcome: Outcome::from_success(success),
        }
    }

    #[test]
    fn missing_file_is_empty_log() {
        let dir = tempfile::tempdir().unwrap();
        let log = AttemptLog::open(dir.path().join("dataset.csv")).unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn first_append_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("dataset.csv");
        let mut log = AttemptLog::open(&path).unwrap();
        log.append(attempt("Meera", true)).unwrap();
        log.append(attempt("Meera", false)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], HEADER);
        assert_eq!(lines[1], "Meera,Wednesday,3 PM,Paldi,Medium,Success");
        assert_eq!(lines[2], "Meera,Wednesday,3 PM,Paldi,Medium,Fail");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn reload_sees_appended_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataset.csv");
        {
            let mut log = AttemptLog::open(&path).unwrap();
            log.append(attempt("Riya", true)).unwrap();
        }
        let log = AttemptLog::open(&path).unwrap();
        assert_eq!(log.attempts(), &[attempt("Riya", true)]);
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataset.csv");
        fs::write(
            &path,
            format!(
                "{}\nMeera,Wednesday,3 PM,Paldi,Medium,Success\nMeera,Someday,3 PM,Paldi,Medium,Success",
                HEADER
            ),
        )
        .unwrap();

        let mut log = AttemptLog::open(&path).unwrap();
        assert_eq!(log.len(), 1);

        // File had no trailing newline; the appended row must start on its own line
        log.append(attempt("Aditya", false)).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.ends_with("\nAditya,Wednesday,3 PM,Paldi,Medium,Fail\n"));
    }

    #[test]
    fn recent_is_newest_first_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = AttemptLog::open(dir.path().join("dataset.csv")).unwrap();
        log.append(attempt("Meera", true)).unwrap();
        log.append(attempt("Riya", false)).unwrap();
        log.append(attempt("Meera", false)).unwrap();

        let recent = log.recent(None, 2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].outcome, Outcome::Fail);
        assert_eq!(recent[0].customer, "Meera");

        let meera = log.recent(Some("meera"), 10);
        assert_eq!(meera.len(), 2);
        assert!(meera.iter().all(|a| a.customer == "Meera"));
    }
}

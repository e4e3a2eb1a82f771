//! Checkpoint ledger
//!
//! Append-only record of completed stages. Each completed stage adds one
//! `"<index>\tdone"` line, synced to disk before the stage is treated as
//! committed. On resume the file is scanned and the highest confirmed index
//! decides which stages can be passed.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use vsop_core::domain::checkpoint::{CheckpointRecord, CheckpointStatus};
use vsop_core::{PipelineError, Result};

/// What the ledger knows about earlier attempts of this run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeState {
    /// Fresh run: every stage executes
    Fresh,
    /// Resumed run: stages up to `last_confirmed` are passed
    Resumed { last_confirmed: Option<u32> },
}

/// Checkpoint ledger bound to a backing file
#[derive(Debug)]
pub struct CheckpointLedger {
    path: PathBuf,
    state: ResumeState,
    /// Highest index confirmed so far, from the file or this process
    last_written: Option<u32>,
}

impl CheckpointLedger {
    /// Associates a ledger with a backing file without touching it
    pub fn bind(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: ResumeState::Fresh,
            last_written: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> ResumeState {
        self.state
    }

    /// Highest confirmed index found by the last `load_for_resume`
    pub fn last_confirmed(&self) -> Option<u32> {
        match self.state {
            ResumeState::Fresh => None,
            ResumeState::Resumed { last_confirmed } => last_confirmed,
        }
    }

    /// Scans the backing file and switches the ledger to resume mode
    ///
    /// Lines that are not well-formed records are skipped; a crash during an
    /// append can leave a truncated last line behind.
    pub fn load_for_resume(&mut self) -> Result<Option<u32>> {
        let last_confirmed = read_last_confirmed(&self.path)?;

        self.state = ResumeState::Resumed { last_confirmed };
        self.last_written = last_confirmed;

        debug!(
            "Ledger {} loaded, last confirmed checkpoint: {:?}",
            self.path.display(),
            last_confirmed
        );
        Ok(last_confirmed)
    }

    /// Deletes the backing file and returns to fresh mode
    pub fn reset(&mut self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed stale ledger {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(PipelineError::io("removing stale checkpoint ledger", e)),
        }

        self.state = ResumeState::Fresh;
        self.last_written = None;
        Ok(())
    }

    /// Decides whether the stage at `index` has to run
    pub fn should_execute(&self, index: u32) -> bool {
        match self.state {
            ResumeState::Fresh => true,
            ResumeState::Resumed {
                last_confirmed: None,
            } => true,
            ResumeState::Resumed {
                last_confirmed: Some(last),
            } => index > last,
        }
    }

    /// Appends a `done` record for `index` and syncs it to disk
    ///
    /// Indices must strictly increase over the life of the ledger.
    pub fn confirm(&mut self, index: u32) -> Result<()> {
        if let Some(last) = self.last_written {
            if index <= last {
                return Err(PipelineError::LedgerOutOfOrder { index, last });
            }
        }

        let record = CheckpointRecord::done(index);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| PipelineError::io("opening checkpoint ledger", e))?;

        writeln!(file, "{}", record)
            .map_err(|e| PipelineError::io("appending checkpoint record", e))?;
        file.flush()
            .map_err(|e| PipelineError::io("flushing checkpoint ledger", e))?;
        file.sync_data()
            .map_err(|e| PipelineError::io("syncing checkpoint ledger", e))?;

        self.last_written = Some(index);
        debug!("Confirmed checkpoint {}", index);
        Ok(())
    }
}

/// Reads the highest `done` index from a ledger file without binding to it
///
/// Returns `None` when the file is absent or holds no valid record.
pub fn read_last_confirmed(path: &Path) -> Result<Option<u32>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(PipelineError::io("opening checkpoint ledger", e)),
    };

    let mut last_confirmed: Option<u32> = None;
    let mut skipped = 0usize;

    for line in BufReader::new(file).split(b'\n') {
        let line = line.map_err(|e| PipelineError::io("reading checkpoint ledger", e))?;
        let text = String::from_utf8_lossy(&line);

        match CheckpointRecord::parse_line(&text) {
            Some(record) if record.status == CheckpointStatus::Done => {
                last_confirmed = Some(last_confirmed.map_or(record.index, |l| l.max(record.index)));
            }
            Some(_) => {}
            None if text.trim().is_empty() => {}
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(
            "Ignored {} malformed line(s) in checkpoint ledger {}",
            skipped,
            path.display()
        );
    }

    Ok(last_confirmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ledger_in(dir: &TempDir) -> CheckpointLedger {
        CheckpointLedger::bind(dir.path().join("checkpoints.txt"))
    }

    #[test]
    fn test_bind_does_not_create_file() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger_in(&dir);

        assert!(!ledger.path().exists());
        assert_eq!(ledger.state(), ResumeState::Fresh);
    }

    #[test]
    fn test_missing_file_resumes_from_nothing() {
        let dir = TempDir::new().unwrap();
        let mut ledger = ledger_in(&dir);

        assert_eq!(ledger.load_for_resume().unwrap(), None);
        assert_eq!(
            ledger.state(),
            ResumeState::Resumed {
                last_confirmed: None
            }
        );
        assert!(ledger.should_execute(0));
    }

    #[test]
    fn test_confirm_creates_and_appends() {
        let dir = TempDir::new().unwrap();
        let mut ledger = ledger_in(&dir);

        ledger.confirm(0).unwrap();
        ledger.confirm(1).unwrap();

        let content = fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(content, "0\tdone\n1\tdone\n");
    }

    #[test]
    fn test_confirm_rejects_non_increasing_index() {
        let dir = TempDir::new().unwrap();
        let mut ledger = ledger_in(&dir);

        ledger.confirm(0).unwrap();
        ledger.confirm(1).unwrap();

        let err = ledger.confirm(1).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::LedgerOutOfOrder { index: 1, last: 1 }
        ));
        assert!(ledger.confirm(0).is_err());

        let content = fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_resume_rejects_reconfirming_loaded_index() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("checkpoints.txt"), "0\tdone\n1\tdone\n").unwrap();

        let mut ledger = ledger_in(&dir);
        ledger.load_for_resume().unwrap();

        assert!(ledger.confirm(1).is_err());
        assert!(ledger.confirm(2).is_ok());
    }

    #[test]
    fn test_should_execute_after_resume() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("checkpoints.txt"), "0\tdone\n1\tdone\n").unwrap();

        let mut ledger = ledger_in(&dir);
        assert_eq!(ledger.load_for_resume().unwrap(), Some(1));

        assert!(!ledger.should_execute(0));
        assert!(!ledger.should_execute(1));
        assert!(ledger.should_execute(2));
        assert!(ledger.should_execute(3));
    }

    #[test]
    fn test_truncated_last_line_is_ignored() {
        let dir = TempDir::new().unwrap();
        let full = dir.path().join("full.txt");
        let cut = dir.path().join("cut.txt");
        let trimmed = dir.path().join("trimmed.txt");

        fs::write(&full, "0\tdone\n1\tdone\n2\tdone\n").unwrap();
        fs::write(&cut, "0\tdone\n1\tdone\n2\tdo").unwrap();
        fs::write(&trimmed, "0\tdone\n1\tdone\n").unwrap();

        assert_eq!(read_last_confirmed(&full).unwrap(), Some(2));
        assert_eq!(
            read_last_confirmed(&cut).unwrap(),
            read_last_confirmed(&trimmed).unwrap()
        );
        assert_eq!(read_last_confirmed(&cut).unwrap(), Some(1));
    }

    #[test]
    fn test_garbage_and_binary_lines_are_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("checkpoints.txt");
        let mut content = b"0\tdone\nnot a record\n\n".to_vec();
        content.extend_from_slice(&[0xff, 0xfe, b'\n']);
        content.extend_from_slice(b"3\tdone\n");
        fs::write(&path, content).unwrap();

        assert_eq!(read_last_confirmed(&path).unwrap(), Some(3));
    }

    #[test]
    fn test_only_garbage_means_nothing_confirmed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("checkpoints.txt");
        fs::write(&path, "junk\n7\n").unwrap();

        assert_eq!(read_last_confirmed(&path).unwrap(), None);
    }

    #[test]
    fn test_reset_deletes_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("checkpoints.txt"), "0\tdone\n").unwrap();

        let mut ledger = ledger_in(&dir);
        ledger.load_for_resume().unwrap();
        ledger.reset().unwrap();

        assert!(!ledger.path().exists());
        assert_eq!(ledger.state(), ResumeState::Fresh);
        assert!(ledger.should_execute(0));
        ledger.confirm(0).unwrap();
    }
}

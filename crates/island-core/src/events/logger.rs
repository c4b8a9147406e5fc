//! Notification Logger
//!
//! Append-only JSONL log of everything the simulation emitted.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use island_events::Notification;

pub struct NotificationLogger {
    writer: Option<BufWriter<File>>,
    count: u64,
}

impl NotificationLogger {
    /// Create a logger writing to `path`, truncating any previous log
    pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            writer: Some(BufWriter::new(file)),
            count: 0,
        })
    }

    /// A logger that only counts
    pub fn null() -> Self {
        Self {
            writer: None,
            count: 0,
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn log(&mut self, note: &Notification) -> std::io::Result<()> {
        self.count += 1;
        if let Some(ref mut writer) = self.writer {
            let json = serde_json::to_string(note)?;
            writeln!(writer, "{}", json)?;
        }
        Ok(())
    }

    pub fn log_batch(&mut self, notes: &[Notification]) -> std::io::Result<()> {
        for note in notes {
            self.log(note)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for NotificationLogger {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!("failed to flush notification log: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use island_events::GameEvent;
    use std::io::BufRead;

    #[test]
    fn test_logs_one_line_per_notification() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.jsonl");

        let mut logger = NotificationLogger::new(&path).unwrap();
        logger
            .log_batch(&[
                GameEvent::RitualCompleted {
                    ritual: "blessing".to_string(),
                }
                .into(),
                GameEvent::TerrainModified {
                    terrain: "forest".to_string(),
                }
                .into(),
            ])
            .unwrap();
        logger.flush().unwrap();
        assert_eq!(logger.count(), 2);

        let file = File::open(&path).unwrap();
        let lines: Vec<String> = std::io::BufReader::new(file)
            .lines()
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        let parsed: Notification = serde_json::from_str(&lines[1]).unwrap();
        assert_eq!(
            parsed,
            Notification::Game(GameEvent::TerrainModified {
                terrain: "forest".to_string()
            })
        );
    }

    #[test]
    fn test_null_logger_counts() {
        let mut logger = NotificationLogger::null();
        logger
            .log(&GameEvent::InvadersApproaching { count: 1 }.into())
            .unwrap();
        assert_eq!(logger.count(), 1);
    }
}

//! Progress types for the installation workflow.

/// Progress event emitted while the workflow runs.
#[derive(Clone, Debug)]
pub struct InstallProgress {
    pub percentage: u32,
    pub message: String,
    pub phase: Option<String>,
}

impl InstallProgress {
    pub fn new(percentage: u32, message: String) -> Self {
        Self {
            percentage,
            message,
            phase: None,
        }
    }
}

/// Progress reporter for installation operations.
pub trait ProgressReporter: Send + Sync + 'static {
    fn emit(&self, percentage: u32, message: String);

    /// Emit progress with phase metadata.
    fn emit_phased(&self, percentage: u32, message: String, _phase: Option<String>) {
        self.emit(percentage, message);
    }

    /// Download progress: bytes read so far plus total size when known.
    ///
    /// When the total is unknown the raw byte count is reported instead of a
    /// percentage.
    fn emit_bytes(&self, bytes_read: u64, total_bytes: Option<u64>) {
        match total_bytes {
            Some(total) if total > 0 => {
                let percent = (bytes_read as f64 * 100.0 / total as f64).min(100.0);
                self.emit(percent as u32, format!("Downloaded {:.1}%", percent));
            }
            _ => self.emit(0, format!("Read {} bytes", bytes_read)),
        }
    }
}

/// Channel-based progress reporter.
pub struct ChannelProgressReporter {
    sender: tokio::sync::mpsc::Sender<InstallProgress>,
}

impl ChannelProgressReporter {
    pub fn new(sender: tokio::sync::mpsc::Sender<InstallProgress>) -> Self {
        Self { sender }
    }
}

impl ProgressReporter for ChannelProgressReporter {
    fn emit(&self, percentage: u32, message: String) {
        self.emit_phased(percentage, message, None);
    }

    fn emit_phased(&self, percentage: u32, message: String, phase: Option<String>) {
        let mut progress = InstallProgress::new(percentage, message);
        progress.phase = phase;
        let _ = self.sender.try_send(progress);
    }
}

/// Reporter that drops every event. Used where no presentation is attached.
pub struct NullProgressReporter;

impl ProgressReporter for NullProgressReporter {
    fn emit(&self, _percentage: u32, _message: String) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder(Mutex<Vec<(u32, String)>>);

    impl ProgressReporter for Recorder {
        fn emit(&self, percentage: u32, message: String) {
            self.0.lock().unwrap().push((percentage, message));
        }
    }

    #[test]
    fn byte_progress_reports_percentage_when_total_known() {
        let recorder = Recorder(Mutex::new(Vec::new()));
        recorder.emit_bytes(50, Some(200));
        let events = recorder.0.lock().unwrap();
        assert_eq!(events[0].0, 25);
        assert!(events[0].1.contains("25.0%"));
    }

    #[test]
    fn byte_progress_reports_raw_count_when_total_unknown() {
        let recorder = Recorder(Mutex::new(Vec::new()));
        recorder.emit_bytes(4096, None);
        let events = recorder.0.lock().unwrap();
        assert_eq!(events[0].0, 0);
        assert_eq!(events[0].1, "Read 4096 bytes");
    }

    #[test]
    fn byte_progress_caps_at_one_hundred() {
        let recorder = Recorder(Mutex::new(Vec::new()));
        recorder.emit_bytes(300, Some(200));
        let events = recorder.0.lock().unwrap();
        assert_eq!(events[0].0, 100);
    }

    #[tokio::test]
    async fn channel_reporter_delivers_events() {
        let (tx, mut rx) = tokio::sync::mpsc::channel(4);
        let reporter = ChannelProgressReporter::new(tx);

        reporter.emit(42, "Downloading project snapshot".to_string());

        let event = rx.recv().await.unwrap();
        assert_eq!(event.percentage, 42);
        assert_eq!(event.message, "Downloading project snapshot");
        assert!(event.phase.is_none());
    }
}

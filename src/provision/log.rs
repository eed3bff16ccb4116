use crate::models::{LogEntry, LogLevel};

/// Narrated log of one provisioning run. Entries are kept for the run
/// report and mirrored to tracing, tagged with the run id.
#[derive(Debug)]
pub struct RunLog {
    run_id: String,
    operation: &'static str,
    entries: Vec<LogEntry>,
}

impl RunLog {
    pub fn new(run_id: impl Into<String>, operation: &'static str) -> Self {
        Self {
            run_id: run_id.into(),
            operation,
            entries: Vec::new(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn debug(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Debug, message.into());
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Info, message.into());
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Success, message.into());
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Warning, message.into());
    }

    pub fn failure(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Failure, message.into());
    }

    fn push(&mut self, level: LogLevel, message: String) {
        let run_id = self.run_id.as_str();
        let operation = self.operation;
        match level {
            LogLevel::Debug => tracing::debug!(run_id, operation, "{}", message),
            LogLevel::Info | LogLevel::Success => tracing::info!(run_id, operation, "{}", message),
            LogLevel::Warning => tracing::warn!(run_id, operation, "{}", message),
            LogLevel::Failure => tracing::error!(run_id, operation, "{}", message),
        }
        self.entries.push(LogEntry { level, message });
    }

    #[cfg(test)]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<LogEntry> {
        self.entries
    }

    /// Messages logged at `level`, in order
    #[cfg(test)]
    pub fn messages(&self, level: LogLevel) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.level == level)
            .map(|e| e.message.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_keep_order_and_level() {
        let mut log = RunLog::new("run-1", "connect-cables");
        log.info("got VRF lab");
        log.debug("skipped 1-2");
        log.success("done");

        assert_eq!(log.run_id(), "run-1");
        assert_eq!(log.entries().len(), 3);
        assert_eq!(log.messages(LogLevel::Info), vec!["got VRF lab"]);
        assert_eq!(log.entries()[2], LogEntry { level: LogLevel::Success, message: "done".to_string() });
    }
}

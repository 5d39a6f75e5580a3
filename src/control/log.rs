use chrono::{DateTime, Local};
use std::collections::VecDeque;
use tracing::debug;

/// Bounded, timestamped connection log. Oldest lines are dropped first.
#[derive(Debug, Clone)]
pub struct ConnectionLog {
    lines: VecDeque<String>,
    capacity: usize,
}

impl ConnectionLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, message: &str) {
        self.push_at(Local::now(), message);
    }

    pub fn push_at(&mut self, time: DateTime<Local>, message: &str) {
        let line = format!("[{}] {}", time.format("%H:%M:%S"), message);
        debug!(target: "connection_log", "{}", line);
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn keeps_only_the_newest_lines() {
        let mut log = ConnectionLog::new(3);
        for i in 0..5 {
            log.push(&format!("line {}", i));
        }
        assert_eq!(log.len(), 3);
        let lines: Vec<&str> = log.lines().collect();
        assert!(lines[0].ends_with("line 2"));
        assert!(lines[2].ends_with("line 4"));
    }

    #[test]
    fn lines_are_prefixed_with_local_time() {
        let mut log = ConnectionLog::new(10);
        let time = Local.with_ymd_and_hms(2024, 5, 1, 9, 7, 3).unwrap();
        log.push_at(time, "Connecting");
        assert_eq!(log.lines().next(), Some("[09:07:03] Connecting"));
    }

    #[test]
    fn zero_capacity_still_keeps_the_latest_line() {
        let mut log = ConnectionLog::new(0);
        log.push("a");
        log.push("b");
        assert_eq!(log.len(), 1);
        assert!(log.lines().next().unwrap().ends_with("b"));
    }
}

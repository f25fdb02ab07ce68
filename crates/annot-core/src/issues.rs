/// Bounded list of issue messages with an exact total count.
#[derive(Debug, Clone, Default)]
pub struct IssueLog {
    messages: Vec<String>,
    total: usize,
    retention: usize,
}

impl IssueLog {
    pub fn with_retention(retention: usize) -> Self {
        Self {
            messages: Vec::new(),
            total: 0,
            retention,
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.total += 1;
        if self.messages.len() < self.retention {
            self.messages.push(message.into());
        }
    }

    pub fn extend<I: IntoIterator<Item = String>>(&mut self, messages: I) {
        for message in messages {
            self.push(message);
        }
    }

    /// Exact number of issues recorded, including ones past the retention cap.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<String> {
        self.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retention_keeps_exact_total() {
        let mut log = IssueLog::with_retention(2);
        for i in 0..5 {
            log.push(format!("issue {i}"));
        }
        assert_eq!(log.total(), 5);
        assert_eq!(log.messages(), ["issue 0", "issue 1"]);
    }
}

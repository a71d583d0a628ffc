use kb_engine::{IngestEvent, LogProgressSink, ProgressSink, StoredDocument};

/// Prints one status line per stage transition and forwards every event
/// to the log.
#[derive(Debug, Default)]
pub struct StatusLines {
    log: LogProgressSink,
}

impl ProgressSink for StatusLines {
    fn emit(&self, event: IngestEvent) {
        match &event {
            IngestEvent::StageStarted { stage } => println!("[{stage}] ..."),
            IngestEvent::StageCompleted { stage, detail } => println!("[{stage}] ok: {detail}"),
            IngestEvent::StageFailed { stage, error } => eprintln!("[{stage}] FAILED: {error}"),
            IngestEvent::StageSkipped { stage, reason } => println!("[{stage}] skipped: {reason}"),
            IngestEvent::Progress { .. } => {}
        }
        self.log.emit(event);
    }
}

pub fn print_documents(documents: &[StoredDocument]) {
    println!("Knowledge base holds {} files:", documents.len());
    for document in documents {
        println!("{}", document_line(document));
    }
}

fn document_line(document: &StoredDocument) -> String {
    format!(
        "  - {} ({}) {:.1} KB",
        document.name,
        document.status,
        document.size_kb()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_is_shown_in_kilobytes_with_one_decimal() {
        let document = StoredDocument {
            name: "documentation-2025-10-01.txt".to_string(),
            status: "Available".to_string(),
            size_bytes: 10_342,
        };
        assert_eq!(
            document_line(&document),
            "  - documentation-2025-10-01.txt (Available) 10.1 KB"
        );
    }
}

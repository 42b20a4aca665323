//! JSONL training records.
//!
//! Each input line is one record:
//!
//! ```json
//! {"messages": [{"role": "user", "content": "Hi"}], "functions": [{"name": "ping"}]}
//! ```

use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};
use turnwire::{
    Conversation, EncodedSegment, FunctionSpec, Message, PromptConfig, Warning, encode_segments,
};

use crate::error::{CliError, Result};

/// One training example: the turns and the functions offered to the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrainingRecord {
    pub messages: Vec<Message>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<FunctionSpec>,
}

impl TrainingRecord {
    /// Builds the full conversation for this record.
    ///
    /// Records that already open with a system message are taken as-is;
    /// otherwise the schema and instruction messages are prepended.
    #[must_use]
    pub fn into_conversation(self, prompt: &PromptConfig) -> Conversation {
        let conversation = Conversation::from_messages(self.messages);
        if conversation.starts_with_system() {
            conversation
        } else {
            prompt.assemble(&self.functions, conversation.messages)
        }
    }
}

/// Output line of the `encode` command.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EncodedRecord {
    pub text: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<EncodedSegment>>,
}

/// Output line of the `validate` command.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RecordReport {
    pub line: usize,
    pub warnings: Vec<Warning>,
}

/// Reads JSONL records, skipping blank lines.
///
/// Each record is returned with its 1-based line number.
///
/// # Errors
///
/// Returns an error if reading fails or a line is not a valid record.
pub fn read_records<R: BufRead>(reader: R) -> Result<Vec<(usize, TrainingRecord)>> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|source| CliError::Record {
            line: idx + 1,
            source,
        })?;
        records.push((idx + 1, record));
    }
    Ok(records)
}

/// Encodes one record.
///
/// # Errors
///
/// Returns [`CliError::Encode`] if the record's messages cannot be encoded.
pub fn encode_record(
    line: usize,
    record: TrainingRecord,
    prompt: &PromptConfig,
    with_segments: bool,
) -> Result<EncodedRecord> {
    let conversation = record.into_conversation(prompt);
    let encoded =
        encode_segments(&conversation.messages).map_err(|source| CliError::Encode { line, source })?;

    Ok(EncodedRecord {
        text: encoded.text,
        segments: with_segments.then_some(encoded.segments),
    })
}

/// Writes one JSON object per line.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_jsonl<W: Write, T: Serialize>(writer: &mut W, items: &[T]) -> Result<()> {
    for item in items {
        serde_json::to_writer(&mut *writer, item)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use super::*;
    use turnwire::MessageRole;

    const RECORDS: &str = r#"{"messages": [{"role": "user", "content": "How much is the Song?"}, {"role": "assistant", "function_call": {"name": "get_car_price", "arguments": "{\"car_name\": \"Song\"}"}}], "functions": [{"name": "get_car_price", "description": "Get the price of a particular car model", "parameters": {"type": "object", "properties": {"car_name": {"type": "string"}}, "required": ["car_name"]}}]}

{"messages": [{"role": "system", "content": "Be brief."}, {"role": "user", "content": "Hi"}]}
"#;

    #[test]
    fn test_read_records_skips_blank_lines() {
        let records = read_records(RECORDS.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].0, 1);
        assert_eq!(records[1].0, 3);
        assert_eq!(records[0].1.functions.len(), 1);
        assert!(records[1].1.functions.is_empty());
    }

    #[test]
    fn test_read_records_reports_line() {
        let input = "{\"messages\": []}\nnot json\n";
        let err = read_records(input.as_bytes()).unwrap_err();
        assert!(matches!(err, CliError::Record { line: 2, .. }));
    }

    #[test]
    fn test_record_gets_system_messages() {
        let records = read_records(RECORDS.as_bytes()).unwrap();
        let (_, record) = records.into_iter().next().unwrap();

        let conversation = record.into_conversation(&PromptConfig::default());
        assert_eq!(conversation.len(), 4);
        assert!(
            conversation.messages[0]
                .content_str()
                .contains("type get_car_price = (_: {")
        );
        assert_eq!(conversation.messages[1].role, MessageRole::System);
        assert_eq!(conversation.messages[2], Message::user("How much is the Song?"));
    }

    #[test]
    fn test_record_with_system_kept_as_is() {
        let records = read_records(RECORDS.as_bytes()).unwrap();
        let (_, record) = records.into_iter().nth(1).unwrap();

        let conversation = record.into_conversation(&PromptConfig::default());
        assert_eq!(
            conversation.messages,
            vec![Message::system("Be brief."), Message::user("Hi")]
        );
    }

    #[test]
    fn test_encode_record() {
        let record = TrainingRecord {
            messages: vec![Message::system("Be brief."), Message::assistant("Ok")],
            functions: vec![],
        };
        let encoded = encode_record(1, record.clone(), &PromptConfig::default(), false).unwrap();
        assert_eq!(
            encoded.text,
            "system:\nBe brief.\n<|END_OF_SYSTEM|>\nassistant:\nOk\n<|END_OF_ASSISTANT|>\n"
        );
        assert!(encoded.segments.is_none());

        let encoded = encode_record(1, record, &PromptConfig::default(), true).unwrap();
        assert_eq!(encoded.segments.map(|s| s.len()), Some(2));
    }

    #[test]
    fn test_encode_record_error_carries_line() {
        let record = TrainingRecord {
            messages: vec![Message::function_call("bad name", "{}")],
            functions: vec![],
        };
        let err = encode_record(7, record, &PromptConfig::default(), false).unwrap_err();
        assert!(matches!(err, CliError::Encode { line: 7, .. }));
    }

    #[test]
    fn test_write_jsonl() {
        let reports = vec![
            RecordReport {
                line: 1,
                warnings: vec![],
            },
            RecordReport {
                line: 2,
                warnings: vec![Warning::MisplacedSystemMessage { index: 3 }],
            },
        ];
        let mut out = Vec::new();
        write_jsonl(&mut out, &reports).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], r#"{"line":1,"warnings":[]}"#);
        assert_eq!(
            lines[1],
            r#"{"line":2,"warnings":[{"kind":"misplaced_system_message","index":3}]}"#
        );
    }
}

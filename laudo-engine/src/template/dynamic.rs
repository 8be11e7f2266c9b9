//! Prose for dynamic blocks
//!
//! Each dynamic block turns one dataset collection into a single pre-formatted string:
//!
//! - record lists: `- {primary} (ref: {secondary})`, one line per record
//! - prose: the text itself, list items one per line, record fields separated by blank lines
//! - questions: numbered question/answer pairs separated by blank lines, or the fixed
//!   preface when the party's skip flag is set
//!
//! An absent or empty collection renders the `none_submitted` sentence for the block label.

use crate::config::{DynamicBlockConfig, DynamicRule, LabelsConfig};
use crate::dataset::{Dataset, Record, Value};

pub fn render(block: &DynamicBlockConfig, dataset: &Dataset, labels: &LabelsConfig) -> String {
    let value = dataset.get(block.source_key());
    let rendered = match &block.rule {
        DynamicRule::RecordList { primary, secondary } => {
            record_lines(value, primary, secondary, labels)
        }
        DynamicRule::Prose { field } => prose(value, field),
        DynamicRule::Questions {
            question_field,
            answer_field,
            skip_flag,
            skipped_preface,
        } => {
            if dataset.scalar(skip_flag).is_some_and(|flag| flag.is_truthy()) {
                return skipped_preface.clone();
            }
            questions(value, question_field, answer_field, labels)
        }
    };
    rendered.unwrap_or_else(|| none_submitted(labels, &block.label))
}

pub fn none_submitted(labels: &LabelsConfig, label: &str) -> String {
    labels.none_submitted.replace("{label}", label)
}

fn record_lines(
    value: Option<&Value>,
    primary: &str,
    secondary: &str,
    labels: &LabelsConfig,
) -> Option<String> {
    let na = labels.not_available.as_str();
    let lines: Vec<String> = match value? {
        Value::Records(records) => records
            .iter()
            .map(|record| {
                format!(
                    "- {} (ref: {})",
                    record.text(primary).as_deref().unwrap_or(na),
                    record.text(secondary).as_deref().unwrap_or(na)
                )
            })
            .collect(),
        Value::List(items) => items
            .iter()
            .filter(|item| !item.trim().is_empty())
            .map(|item| format!("- {} (ref: {})", item, na))
            .collect(),
        Value::Scalar(scalar) => vec![scalar.to_string()],
    };
    non_blank(lines.join("\n"))
}

fn prose(value: Option<&Value>, field: &str) -> Option<String> {
    let text = match value? {
        Value::Scalar(scalar) => scalar.to_string(),
        Value::List(items) => items.join("\n"),
        Value::Records(records) => records
            .iter()
            .filter_map(|record| record.text(field))
            .collect::<Vec<_>>()
            .join("\n\n"),
    };
    non_blank(text)
}

fn questions(
    value: Option<&Value>,
    question_field: &str,
    answer_field: &str,
    labels: &LabelsConfig,
) -> Option<String> {
    let na = labels.not_available.as_str();
    let pairs: Vec<(String, String)> = match value? {
        Value::Records(records) => records
            .iter()
            .map(|record: &Record| {
                (
                    record.text(question_field).unwrap_or_else(|| na.to_string()),
                    record.text(answer_field).unwrap_or_else(|| na.to_string()),
                )
            })
            .collect(),
        Value::List(items) => items
            .iter()
            .map(|item| (item.clone(), na.to_string()))
            .collect(),
        Value::Scalar(scalar) => return non_blank(scalar.to_string()),
    };
    let blocks: Vec<String> = pairs
        .iter()
        .enumerate()
        .map(|(index, (question, answer))| {
            format!(
                "{}. {}: {}\n   {}: {}",
                index + 1,
                labels.question,
                question,
                labels.answer,
                answer
            )
        })
        .collect();
    non_blank(blocks.join("\n\n"))
}

fn non_blank(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

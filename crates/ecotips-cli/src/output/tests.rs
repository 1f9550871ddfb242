// Tests for output formatting
//
// These verify the confirmation view, tip rendering and the writer's
// handling of quiet and machine-readable modes.

use super::*;
use chrono::{TimeZone, Utc};
use ecotips_core::EcoMetrics;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn writer(format: OutputFormat, quiet: bool) -> (OutputWriter, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let writer = OutputWriter::with_writer(format, false, quiet, 0, Box::new(buffer.clone()));
    (writer, buffer)
}

fn record() -> ObservationRecord {
    ObservationRecord::new(
        EcoMetrics {
            electricity: 10.5,
            water: 200.0,
            temperature: 25.0,
            humidity: 60.0,
            weather: "晴れ".to_string(),
            people: 2,
        },
        Utc.with_ymd_and_hms(2025, 1, 17, 10, 30, 0).unwrap(),
    )
}

#[test]
fn test_record_human_view() {
    let formatted = OutputFormat::Human.format_record(&record()).unwrap();

    assert!(formatted.starts_with("入力データの確認:\n"));
    assert!(formatted.contains("  先月の電力使用量: 10.5kWh\n"));
    assert!(formatted.contains("  先月の水使用量: 200L\n"));
    assert!(formatted.contains("  気温: 25℃\n"));
    assert!(formatted.contains("  湿度: 60%\n"));
    assert!(formatted.contains("  天気: 晴れ\n"));
    assert!(formatted.contains("  在室人数: 2人\n"));
    assert!(formatted.contains("2025-01-17 10:30:00 UTC"));
}

#[test]
fn test_record_json_matches_web_shape() {
    let formatted = OutputFormat::Json.format_record(&record()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&formatted).unwrap();

    assert_eq!(value["electricity"], 10.5);
    assert_eq!(value["weather"], "晴れ");
    assert_eq!(value["people"], 2);
    assert_eq!(value["timestamp"], "2025-01-17T10:30:00Z");
}

#[test]
fn test_tips_rendering() {
    let tips = TipList::from_lines(["1. 照明を消す", "2. 外干しする"]);

    let human = OutputFormat::Human.format_tips(&tips).unwrap();
    assert_eq!(human, "エコライフTips:\n  1. 照明を消す\n  2. 外干しする\n");

    let json = OutputFormat::Json.format_tips(&tips).unwrap();
    assert_eq!(json, r#"{"tips":["1. 照明を消す","2. 外干しする"]}"#);

    let empty = OutputFormat::Human.format_tips(&TipList::default()).unwrap();
    assert!(empty.contains("生成されませんでした"));
}

#[test]
fn test_yaml_format() {
    let formatted = OutputFormat::Yaml.format(&serde_json::json!({"tips": ["a"]})).unwrap();
    assert_eq!(formatted, "tips:\n- a\n");
}

#[test]
fn test_quiet_suppresses_info_but_not_data() {
    let (mut output, buffer) = writer(OutputFormat::Human, true);

    output.info("hidden").unwrap();
    output.success("hidden").unwrap();
    output.section("hidden").unwrap();
    output.tips(&TipList::from_lines(["shown"])).unwrap();

    let contents = buffer.contents();
    assert!(!contents.contains("hidden"));
    assert!(contents.contains("shown"));
}

#[test]
fn test_machine_format_skips_decorations() {
    let (mut output, buffer) = writer(OutputFormat::Json, false);

    output.info("note").unwrap();
    output.warning("careful").unwrap();
    output.tips(&TipList::from_lines(["a"])).unwrap();

    assert_eq!(buffer.contents(), "{\"tips\":[\"a\"]}\n");
    assert!(output.spinner("working").is_none());
}

#[test]
fn test_plain_messages_without_color() {
    let (mut output, buffer) = writer(OutputFormat::Human, false);

    output.info("loading").unwrap();
    output.warning("careful").unwrap();
    output.error("failed").unwrap();
    output.section("Title").unwrap();

    let contents = buffer.contents();
    assert!(contents.contains("INFO: loading\n"));
    assert!(contents.contains("WARNING: careful\n"));
    assert!(contents.contains("ERROR: failed\n"));
    assert!(contents.contains("=== Title ===\n"));
}

#[test]
fn test_table_aligns_wide_characters() {
    let (mut output, buffer) = writer(OutputFormat::Human, false);

    output
        .table(
            &["項目", "value"],
            vec![
                vec!["天気".to_string(), "晴れ".to_string()],
                vec!["在室人数".to_string(), "2人".to_string()],
            ],
        )
        .unwrap();

    let contents = buffer.contents();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("項目     │"));
    assert!(lines[2].starts_with("天気     │"));
    assert!(lines[3].starts_with("在室人数 │"));
}

#[test]
fn test_data_writes_value_in_format() {
    let (mut output, buffer) = writer(OutputFormat::Json, false);
    output.data(&serde_json::json!({"provider": "openai"})).unwrap();
    assert_eq!(buffer.contents(), "{\"provider\":\"openai\"}\n");
}

#[test]
fn test_display_width() {
    assert_eq!(display_width("abc"), 3);
    assert_eq!(display_width("天気"), 4);
    assert_eq!(display_width("2人"), 3);
}

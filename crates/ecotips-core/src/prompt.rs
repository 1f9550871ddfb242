//! Prompt rendering shared by all providers

use crate::types::ObservationRecord;

/// System instruction sent with every request
pub const SYSTEM_PROMPT: &str = "あなたは省エネアドバイザーです。
与えられたデータを基に、エコな生活のためのTipsを10個生成してください。
各Tipsは50文字以内で、具体的で実行可能な内容にしてください。
回答はTipsを数字付きの箇条書きにした内容のみにしてください。ヘッダや前置き、まとめなどは不要です。";

const REQUEST_LINE: &str = "このデータを基に、エコな生活のためのTipsを10個生成してください。";

/// Render the user prompt for a record
pub fn render_user_prompt(record: &ObservationRecord) -> String {
    let mut prompt = String::from("\n現在のデータ:\n");
    for line in record.metrics().summary_lines() {
        prompt.push_str(&format!("- {}\n", line));
    }
    prompt.push('\n');
    prompt.push_str(REQUEST_LINE);
    prompt
}

/// System and user text joined into one turn, for providers without a system slot
pub fn render_combined_prompt(record: &ObservationRecord) -> String {
    format!("{}\n\n{}", SYSTEM_PROMPT, render_user_prompt(record).trim_start())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EcoMetrics;
    use chrono::Utc;

    fn record() -> ObservationRecord {
        ObservationRecord::new(
            EcoMetrics {
                electricity: 123.4,
                water: 5678.0,
                temperature: 21.5,
                humidity: 47.0,
                weather: "くもり時々雨".to_string(),
                people: 3,
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_user_prompt_contains_all_values() {
        let prompt = render_user_prompt(&record());
        for expected in ["123.4kWh", "5678L", "21.5℃", "47%", "くもり時々雨", "3人"] {
            assert!(prompt.contains(expected), "prompt lacks {}: {}", expected, prompt);
        }
        assert!(prompt.contains("- 先月の電力使用量: 123.4kWh\n"));
        assert!(prompt.ends_with(REQUEST_LINE));
    }

    #[test]
    fn test_combined_prompt_starts_with_system() {
        let combined = render_combined_prompt(&record());
        assert!(combined.starts_with(SYSTEM_PROMPT));
        assert!(combined.contains("現在のデータ:"));
    }
}

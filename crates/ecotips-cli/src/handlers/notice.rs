//! Notice command handler

use crate::cli::NoticeArgs;
use crate::error::Result;
use crate::output::OutputWriter;
use ecotips_core::ProviderKind;

const SECURITY: &str = "APIキーはこのマシンのユーザー設定ディレクトリにのみ保存され、外部に送信されることはありません。\nLLMのAPI呼び出し時のみ使用されます。";

const CAUTIONS: [&str; 3] = [
    "APIキーは定期的な更新をお勧めします",
    "大量のリクエストにご注意ください",
    "生成されたTipsは参考情報としてお使いください",
];

/// Handle the notice command
pub async fn handle_notice(args: NoticeArgs, output: &mut OutputWriter) -> Result<()> {
    output.writeln(notice_text(args.provider).trim_end())
}

/// Usage notes shown before a key is configured
pub fn notice_text(provider: Option<ProviderKind>) -> String {
    let mut text = String::from("APIの利用について\n\n");

    text.push_str("🔒 セキュリティについて：\n");
    text.push_str(SECURITY);
    text.push_str("\n\n💰 利用料金について：\n");
    text.push_str(pricing(provider));
    text.push_str("\n\n⚠️ 注意事項：\n");
    for caution in CAUTIONS {
        text.push_str("・");
        text.push_str(caution);
        text.push('\n');
    }

    text
}

fn pricing(provider: Option<ProviderKind>) -> &'static str {
    match provider {
        Some(ProviderKind::OpenAI) => {
            "OpenAI APIの利用には料金が発生します。\n1リクエストあたりの料金は使用するモデルによって異なります。\n詳細はOpenAIの料金ページ (https://openai.com/ja-JP/api/pricing/) をご確認ください。"
        }
        Some(ProviderKind::Anthropic) => {
            "Anthropic APIの利用には料金が発生します。\n利用料金は入力と出力のトークン数に基づいて計算されます。\n詳細はAnthropicの料金ページ (https://www.anthropic.com/pricing#anthropic-api) をご確認ください。"
        }
        Some(ProviderKind::Gemini) | None => {
            "APIの利用には各サービスの料金体系に基づいて料金が発生します。\n詳細は各サービスの料金ページをご確認ください。"
        }
    }
}

// Fixed strings and defaults shared by both chatbots.

use std::num::NonZeroUsize;
use std::time::Duration;

// OpenAI endpoints and models
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

// Environment keys
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_USER: &str = "GRADIO_USER";
pub const ENV_PASSWORD: &str = "GRADIO_PASSWORD";

/// Sampling temperature for the document QA bot.
pub const ANSWER_TEMPERATURE: f32 = 0.0;
/// Sampling temperature for the nutritionist persona.
pub const PERSONA_TEMPERATURE: f32 = 1.0;

/// Number of documents handed to the answer prompt unless overridden.
pub const DEFAULT_TOP_K: NonZeroUsize = match NonZeroUsize::new(4) {
    Some(k) => k,
    None => panic!("top-k must be non-zero"),
};

/// Web sessions untouched for this long are discarded.
pub const SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Private documents searched by the QA bot.
pub const CORPUS: [&str; 3] = [
    "会社の新しい休暇ポリシーは、年間20日の有給休暇を提供します。",
    "次の四半期の目標は、売上を10%増加させることです。",
    "社内のITサポートチームへの連絡先は内線1234です。",
];

pub const PERSONA_INPUT_VARIABLE: &str = "user_input";

pub const NUTRITIONIST_TEMPLATE: &str = "
あなたは管理栄養士です。以下の情報を元に、健康的でおいしいレシピを提案してください。
ユーザーの要望: {user_input}
";

// System prompt used when all retrieved context is stuffed into one call.
pub const STUFF_SYSTEM_TEMPLATE: &str = "Use the following pieces of context to answer the user's question. \n\
If you don't know the answer, just say that you don't know, don't try to make up an answer.\n\
----------------\n\
{context}";

pub const STUFF_DOCUMENT_SEPARATOR: &str = "\n\n";

// UI text
pub const DOCS_TITLE: &str = "社内マニュアル応答チャットボット";
pub const NUTRITIONIST_TITLE: &str = "管理栄養士チャットボット";
pub const LOGIN_SUCCESS: &str = "ログイン成功！";
pub const LOGIN_FAILURE: &str = "ユーザー名またはパスワードが間違っています。";
pub const CHAT_FAILURE: &str = "エラーが発生しました。しばらくしてから再度お試しください。";
pub const LABEL_USERNAME: &str = "ユーザー名";
pub const LABEL_PASSWORD: &str = "パスワード";
pub const LABEL_LOGIN: &str = "ログイン";
pub const LABEL_LOGIN_STATUS: &str = "ログインステータス";
pub const LABEL_CHAT_ROOM: &str = "チャットルーム";

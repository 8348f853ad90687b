//! LLM 服务 - 业务能力层
//!
//! 只负责"让语言模型写日记"能力，不关心流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型（DeepSeek 等 OpenAI 兼容服务）

use std::sync::LazyLock;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use regex::Regex;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::LlmError;
use crate::models::{DiaryRequest, DiaryText, GenerationMode};
use crate::utils::logging::truncate_text;

/// 模型未给出标题时的回退标题
const FALLBACK_TITLE: &str = "今日日记";

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"标题[：:]\s*([^\n]+)").expect("标题正则不合法"));
static BODY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)正文[：:]\s*(.+)").expect("正文正则不合法"));
static TITLE_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"标题[：:][^\n]*\n?").expect("标题行正则不合法"));

/// LLM 服务
///
/// 职责：
/// - 构造生成/润色两种模式的提示词
/// - 调用 LLM API 并解析返回的标题与正文
/// - 只处理单篇日记，不关心照片存储和导出
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
    api_key: String,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: config.llm_model_name.clone(),
            api_key: config.llm_api_key.clone(),
        }
    }

    /// 生成或润色一篇日记
    ///
    /// # 参数
    /// - `request`: 一次生成请求的全部输入（模式、描述、照片列表等）
    ///
    /// # 返回
    /// 返回解析好的标题与正文；正文中可能带有 `[图片n]` 占位符，
    /// 序号是否越界由组装层兜底，这里不做校验。
    pub async fn compose_diary(&self, request: &DiaryRequest) -> Result<DiaryText, LlmError> {
        self.check_api_key()?;

        let (system_message, user_message) = match request.mode {
            GenerationMode::Generate => build_generate_messages(request),
            GenerationMode::Polish => build_polish_messages(request),
        };

        let response = self
            .send_to_llm(&user_message, Some(&system_message))
            .await?;

        debug!("LLM 原始响应: {}", truncate_text(&response, 200));

        Ok(parse_diary_text(&response))
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（字符串）
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> Result<String, LlmError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()
                .map_err(|e| self.classify_error(e))?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(|e| self.classify_error(e))?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.7)
            .max_tokens(2000u32)
            .build()
            .map_err(|e| self.classify_error(e))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            self.classify_error(e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| LlmError::EmptyContent {
                model: self.model_name.clone(),
            })?;

        Ok(content.trim().to_string())
    }

    /// 校验 API Key 配置
    fn check_api_key(&self) -> Result<(), LlmError> {
        if self.api_key.is_empty() {
            return Err(LlmError::MissingApiKey);
        }
        // DeepSeek 的 Key 以 sk- 开头，提前拦住贴错的值
        if !self.api_key.starts_with("sk-") {
            return Err(LlmError::MalformedApiKey);
        }
        Ok(())
    }

    /// 把 API 错误归类成带类型的失败结果
    fn classify_error(&self, err: OpenAIError) -> LlmError {
        match err {
            OpenAIError::ApiError(api) => {
                let kind = api.r#type.clone().unwrap_or_default();
                if kind.contains("rate_limit") {
                    LlmError::RateLimited {
                        message: api.message,
                    }
                } else if kind.contains("auth") || kind.contains("permission") {
                    LlmError::AuthRejected {
                        message: api.message,
                    }
                } else {
                    LlmError::ApiCallFailed {
                        model: self.model_name.clone(),
                        source: Box::new(OpenAIError::ApiError(api)),
                    }
                }
            }
            other => LlmError::ApiCallFailed {
                model: self.model_name.clone(),
                source: Box::new(other),
            },
        }
    }
}

/// 构建自动创作模式的消息
///
/// 返回 (system_message, user_message)
fn build_generate_messages(request: &DiaryRequest) -> (String, String) {
    let system_message = format!(
        "你是一个多才多艺的日记写手。根据用户提供的信息，生成一篇极具感染力的内容。要求：\n\
         1. 严格遵守用户选择的【{}】风格，其核心要求是：{}\n\
         2. 语言要生动形象，富有情感，避免机械化的陈述。\n\
         3. 包含关键信息（时间、地点、人物、事件），用于以后长久的回忆。\n\
         4. 日记要有标题和正文两部分。\n\
         5. 正文要自然地融入日期、地点、照片等信息。\n\
         6. 在正文中，如果提到某个照片，请用 \"[图片n]\" 的形式（n为照片的索引，从1开始）来指代照片。\n\
         7. 每张照片在正文中只能被指代一次。",
        request.diary_style, request.style_description
    );

    let photos_line = if request.photos.is_empty() {
        String::new()
    } else {
        format!("照片信息：{}\n", describe_photos(request))
    };

    let user_message = format!(
        "请根据以下信息生成一篇日记：\n\n\
         日期：{}\n\
         地点：{}\n\
         用户描述：{}\n\
         {}日记风格：{}\n\n\
         请严格按照以下格式生成日记（每行单独显示）：\n\
         标题：你的标题\n\
         正文：你的正文内容\n\n\
         正文要生动形象，包含关键信息以便以后回忆。",
        request.date, request.location, request.description, photos_line, request.diary_style
    );

    (system_message, user_message)
}

/// 构建润色模式的消息
///
/// 返回 (system_message, user_message)
fn build_polish_messages(request: &DiaryRequest) -> (String, String) {
    let system_message = format!(
        "你是一个专业的日记润色助手。用户的任务是根据他写的一段原话，进行文学润色，使其更符合【{}】风格（核心要求：{}）。\n\
         要求：\n\
         1. 保持用户原意，不要虚构不存在的事实。\n\
         2. 优化语言表达，使其更自然、生动。\n\
         3. 如果用户提供了标题，请优化它；如果没提供，请根据内容起一个。\n\
         4. 必须包含用户提到的关键信息（时间、地点、事件）。\n\
         5. 必须在正文中合理插入 [图片n] 标签（n为照片索引，从1开始），每张照片仅限一次。",
        request.diary_style, request.style_description
    );

    let photos_line = if request.photos.is_empty() {
        String::new()
    } else {
        format!("照片信息：{}\n", describe_photos(request))
    };

    let title = if request.title.trim().is_empty() {
        "无"
    } else {
        request.title.trim()
    };

    let user_message = format!(
        "请润色以下日记内容：\n\
         日期：{}\n\
         地点：{}\n\
         原定标题：{}\n\
         用户原文：{}\n\
         {}\n\
         请严格按照以下格式输出：\n\
         标题：润色后的标题\n\
         正文：润色后的正文",
        request.date, request.location, title, request.description, photos_line
    );

    (system_message, user_message)
}

/// 照片列表的提示词描述，序号与正文占位符一致（1 起始）
fn describe_photos(request: &DiaryRequest) -> String {
    request
        .photos
        .iter()
        .enumerate()
        .map(|(i, photo)| {
            format!(
                "图片{} ({})，地点: {}",
                i + 1,
                photo.original_name,
                photo.location.as_deref().unwrap_or("未识别")
            )
        })
        .collect::<Vec<_>>()
        .join("； ")
}

/// 解析 LLM 响应中的标题与正文
///
/// 解析是宽容的：没有"标题："时用回退标题；没有"正文："时
/// 去掉标题行、剩余内容全部当正文。
fn parse_diary_text(content: &str) -> DiaryText {
    let title = TITLE_RE
        .captures(content)
        .map(|c| c[1].trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| FALLBACK_TITLE.to_string());

    let body = match BODY_RE.captures(content) {
        Some(c) => c[1].trim().to_string(),
        None => TITLE_LINE_RE.replace(content, "").trim().to_string(),
    };

    let body = if body.is_empty() {
        content.trim().to_string()
    } else {
        body
    };

    DiaryText {
        title,
        content: body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PhotoRecord;

    /// 创建测试用的 LlmService
    fn create_test_service(api_key: &str) -> LlmService {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base("https://api.deepseek.com/v1");

        LlmService {
            client: Client::with_config(config),
            model_name: "deepseek-chat".to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn request_with_photos() -> DiaryRequest {
        DiaryRequest {
            mode: GenerationMode::Generate,
            title: String::new(),
            date: "2024-05-01".to_string(),
            location: "杭州".to_string(),
            description: "和朋友逛了西湖".to_string(),
            diary_style: "游记".to_string(),
            style_description: "轻松自然".to_string(),
            photos: vec![PhotoRecord {
                filename: "x.jpg".to_string(),
                original_name: "断桥.jpg".to_string(),
                path: "/uploads/x.jpg".to_string(),
                location: Some("西湖".to_string()),
                width: None,
                height: None,
            }],
        }
    }

    #[test]
    fn test_parse_diary_text_full_format() {
        let parsed = parse_diary_text("标题：西湖半日\n正文：清晨出发。\n[图片1]\n傍晚归来。");
        assert_eq!(parsed.title, "西湖半日");
        assert_eq!(parsed.content, "清晨出发。\n[图片1]\n傍晚归来。");
    }

    #[test]
    fn test_parse_diary_text_half_width_colon() {
        let parsed = parse_diary_text("标题: 西湖半日\n正文: 清晨出发。");
        assert_eq!(parsed.title, "西湖半日");
        assert_eq!(parsed.content, "清晨出发。");
    }

    #[test]
    fn test_parse_diary_text_missing_title() {
        let parsed = parse_diary_text("正文：只有正文。");
        assert_eq!(parsed.title, "今日日记");
        assert_eq!(parsed.content, "只有正文。");
    }

    #[test]
    fn test_parse_diary_text_missing_body_marker() {
        let parsed = parse_diary_text("标题：散文一则\n今天走了很远的路。");
        assert_eq!(parsed.title, "散文一则");
        assert_eq!(parsed.content, "今天走了很远的路。");
    }

    #[test]
    fn test_parse_diary_text_free_form() {
        let parsed = parse_diary_text("今天没有按格式输出。");
        assert_eq!(parsed.title, "今日日记");
        assert_eq!(parsed.content, "今天没有按格式输出。");
    }

    #[test]
    fn test_check_api_key() {
        assert!(matches!(
            create_test_service("").check_api_key(),
            Err(LlmError::MissingApiKey)
        ));
        assert!(matches!(
            create_test_service("abc123").check_api_key(),
            Err(LlmError::MalformedApiKey)
        ));
        assert!(create_test_service("sk-test").check_api_key().is_ok());
    }

    #[test]
    fn test_generate_messages_carry_marker_rules() {
        let (system_message, user_message) = build_generate_messages(&request_with_photos());
        assert!(system_message.contains("[图片n]"));
        assert!(system_message.contains("只能被指代一次"));
        assert!(user_message.contains("图片1 (断桥.jpg)，地点: 西湖"));
        assert!(user_message.contains("日记风格：游记"));
    }

    #[test]
    fn test_polish_messages_carry_original_text() {
        let mut request = request_with_photos();
        request.mode = GenerationMode::Polish;
        request.title = "西湖记".to_string();
        let (system_message, user_message) = build_polish_messages(&request);
        assert!(system_message.contains("润色"));
        assert!(user_message.contains("原定标题：西湖记"));
        assert!(user_message.contains("用户原文：和朋友逛了西湖"));
    }

    /// 测试 LLM API 连接性
    ///
    /// 运行方式：
    /// ```bash
    /// DEEPSEEK_API_KEY=sk-xxx cargo test test_llm_api_connectivity -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_llm_api_connectivity() {
        let _ = tracing_subscriber::fmt::try_init();

        let api_key = std::env::var("DEEPSEEK_API_KEY").expect("需要设置 DEEPSEEK_API_KEY");
        let service = create_test_service(&api_key);

        let result = service.compose_diary(&request_with_photos()).await;

        match result {
            Ok(diary) => {
                println!("标题: {}", diary.title);
                println!("正文: {}", diary.content);
                assert!(!diary.content.is_empty());
            }
            Err(e) => panic!("LLM API 调用失败: {}", e),
        }
    }
}

/// 程序配置
///
/// 所有环境相关的取值在启动时一次性读入，之后显式传给各个
/// 协作方，运行中不再读环境变量。
#[derive(Clone, Debug)]
pub struct Config {
    /// HTTP 服务监听端口
    pub server_port: u16,
    /// 上传文件存放目录
    pub uploads_dir: String,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    // --- 飞书多维表格配置 ---
    pub feishu_api_base_url: String,
    pub feishu_app_id: String,
    pub feishu_app_secret: String,
    pub feishu_app_token: String,
    pub feishu_table_id: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3001,
            uploads_dir: "uploads".to_string(),
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.deepseek.com/v1".to_string(),
            llm_model_name: "deepseek-chat".to_string(),
            feishu_api_base_url: "https://open.feishu.cn/open-apis".to_string(),
            feishu_app_id: String::new(),
            feishu_app_secret: String::new(),
            feishu_app_token: String::new(),
            feishu_table_id: String::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            server_port: std::env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.server_port),
            uploads_dir: std::env::var("UPLOADS_DIR").unwrap_or(default.uploads_dir),
            llm_api_key: std::env::var("DEEPSEEK_API_KEY").map(|v| v.trim().to_string()).unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("DEEPSEEK_API_BASE").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            feishu_api_base_url: std::env::var("FEISHU_API_BASE").unwrap_or(default.feishu_api_base_url),
            feishu_app_id: std::env::var("FEISHU_APP_ID").unwrap_or(default.feishu_app_id),
            feishu_app_secret: std::env::var("FEISHU_APP_SECRET").unwrap_or(default.feishu_app_secret),
            feishu_app_token: std::env::var("FEISHU_APP_TOKEN").unwrap_or(default.feishu_app_token),
            feishu_table_id: std::env::var("FEISHU_TABLE_ID").unwrap_or(default.feishu_table_id),
        }
    }
}

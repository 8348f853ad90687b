pub mod feishu_service;
pub mod llm_service;
pub mod photo_service;

pub use feishu_service::FeishuService;
pub use llm_service::LlmService;
pub use photo_service::PhotoService;

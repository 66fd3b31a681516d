use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod access;
pub mod protocol;

// =========================================================
// 常量定义 (Constants)
// =========================================================

/// 回调页通过 postMessage 发送的消息类型标签
pub const OAUTH_CALLBACK_TAG: &str = "OAUTH_CALLBACK";
/// 回调页路径（OAuth 提供方最终重定向到此处）
pub const OAUTH_CALLBACK_PATH: &str = "/oauth-callback";
/// 授权 URL 中模特 ID 的查询参数名
pub const QUERY_MODEL_ID: &str = "modelId";

// =========================================================
// 领域模型 (Domain Models)
// =========================================================

/// 支持 OAuth 连接的社交平台
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Tiktok,
    Instagram,
    Threads,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Tiktok, Platform::Instagram, Platform::Threads];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Tiktok => "tiktok",
            Platform::Instagram => "instagram",
            Platform::Threads => "threads",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Tiktok => "TikTok",
            Platform::Instagram => "Instagram",
            Platform::Threads => "Threads",
        }
    }

    /// 后端上该平台授权入口的路径
    pub fn auth_path(&self) -> String {
        format!("/auth/{}", self.as_str())
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tiktok" => Ok(Platform::Tiktok),
            "instagram" => Ok(Platform::Instagram),
            "threads" => Ok(Platform::Threads),
            other => Err(format!("unsupported platform: {}", other)),
        }
    }
}

/// 构造平台授权 URL
///
/// `backend_url` 末尾的 `/` 会被去掉；提供 `model_id` 时以查询参数附加。
pub fn authorization_url(backend_url: &str, platform: Platform, model_id: Option<&str>) -> String {
    let base = format!("{}{}", backend_url.trim_end_matches('/'), platform.auth_path());
    match model_id.filter(|id| !id.is_empty()) {
        Some(id) => format!("{}?{}={}", base, QUERY_MODEL_ID, urlencoding::encode(id)),
        None => base,
    }
}

// =========================================================
// 跨窗口消息 (Cross-window Messages)
// =========================================================

/// OAuth 回调结果
///
/// 所有字段都允许缺失，弹窗端发来的旧格式消息也能解析。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthCallback {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl OAuthCallback {
    /// 从回调页查询参数 (`connected`, `error`, `message`) 构造结果
    pub fn from_query(
        connected: Option<String>,
        error: Option<String>,
        message: Option<String>,
    ) -> Self {
        let connected = connected.filter(|c| !c.is_empty());
        let error = error.filter(|e| !e.is_empty());
        Self {
            success: connected.is_some() && error.is_none(),
            platform: connected,
            error,
            message: message.filter(|m| !m.is_empty()),
        }
    }
}

/// 带类型标签的消息信封，对应 `{ type: "OAUTH_CALLBACK", ...payload }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub payload: OAuthCallback,
}

impl CallbackEnvelope {
    pub fn new(payload: OAuthCallback) -> Self {
        Self {
            kind: OAUTH_CALLBACK_TAG.to_string(),
            payload,
        }
    }

    /// 检查 `value.type` 是否等于 `tag`，是则解析出回调结果
    pub fn parse_tagged(value: &serde_json::Value, tag: &str) -> Option<OAuthCallback> {
        let kind = value.get("type")?.as_str()?;
        if kind != tag {
            return None;
        }
        Some(serde_json::from_value(value.clone()).unwrap_or_default())
    }
}

// =========================================================
// REST 数据模型 (REST Payloads)
// =========================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthConfig {
    pub backend_url: String,
}

/// 某个模特在某个平台上的连接状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub valid: bool,
}

impl ConnectionStatus {
    /// 已连接且令牌仍有效
    pub fn is_usable(&self) -> bool {
        self.connected && self.valid
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    Member,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: String,
    pub prenom: String,
    pub nom: String,
    pub email: String,
    pub role: Role,
    pub agence_id: String,
    #[serde(default)]
    pub is_demo: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    pub plan: String,
    pub status: String,
    pub is_premium: bool,
}

impl SubscriptionStatus {
    /// 支付失败导致的暂停状态
    pub fn is_suspended(&self) -> bool {
        self.status == "suspendu"
    }
}

/// 模特（OnlyTrack 中被代理的创作者）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub id: String,
    pub nom: String,
    #[serde(default)]
    pub nom_utilisateur: Option<String>,
    #[serde(default)]
    pub plateforme: Option<String>,
}

impl Model {
    /// 列表中显示的句柄：优先用户名，其次平台名
    pub fn handle(&self) -> &str {
        self.nom_utilisateur
            .as_deref()
            .or(self.plateforme.as_deref())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_platform_from_str_is_case_insensitive() {
        assert_eq!("TikTok".parse::<Platform>(), Ok(Platform::Tiktok));
        assert_eq!(" instagram ".parse::<Platform>(), Ok(Platform::Instagram));
        assert!("facebook".parse::<Platform>().is_err());
    }

    #[test]
    fn test_authorization_url_without_model() {
        let url = authorization_url("https://api.onlytrack.fr/", Platform::Tiktok, None);
        assert_eq!(url, "https://api.onlytrack.fr/auth/tiktok");
    }

    #[test]
    fn test_authorization_url_encodes_model_id() {
        let url = authorization_url("https://api.onlytrack.fr", Platform::Threads, Some("a b&c"));
        assert_eq!(url, "https://api.onlytrack.fr/auth/threads?modelId=a%20b%26c");
    }

    #[test]
    fn test_authorization_url_ignores_empty_model_id() {
        let url = authorization_url("http://localhost:5000", Platform::Instagram, Some(""));
        assert_eq!(url, "http://localhost:5000/auth/instagram");
    }

    #[test]
    fn test_callback_from_query_success() {
        let cb = OAuthCallback::from_query(Some("tiktok".into()), None, None);
        assert!(cb.success);
        assert_eq!(cb.platform.as_deref(), Some("tiktok"));
    }

    #[test]
    fn test_callback_from_query_error_wins() {
        let cb = OAuthCallback::from_query(
            Some("tiktok".into()),
            Some("access_denied".into()),
            Some("Refusé".into()),
        );
        assert!(!cb.success);
        assert_eq!(cb.error.as_deref(), Some("access_denied"));
        assert_eq!(cb.message.as_deref(), Some("Refusé"));
    }

    #[test]
    fn test_envelope_serializes_flat() {
        let envelope = CallbackEnvelope::new(OAuthCallback::from_query(
            Some("instagram".into()),
            None,
            None,
        ));
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "OAUTH_CALLBACK",
                "success": true,
                "platform": "instagram",
                "error": null,
                "message": null
            })
        );
    }

    #[test]
    fn test_parse_tagged_accepts_partial_payload() {
        let value = json!({ "type": "OAUTH_CALLBACK", "success": true });
        let cb = CallbackEnvelope::parse_tagged(&value, OAUTH_CALLBACK_TAG).unwrap();
        assert!(cb.success);
        assert_eq!(cb.platform, None);
    }

    #[test]
    fn test_parse_tagged_rejects_other_tags() {
        assert!(CallbackEnvelope::parse_tagged(&json!({ "type": "OTHER" }), OAUTH_CALLBACK_TAG).is_none());
        assert!(CallbackEnvelope::parse_tagged(&json!({ "success": true }), OAUTH_CALLBACK_TAG).is_none());
        assert!(CallbackEnvelope::parse_tagged(&json!("OAUTH_CALLBACK"), OAUTH_CALLBACK_TAG).is_none());
        assert!(CallbackEnvelope::parse_tagged(&json!({ "type": 1 }), OAUTH_CALLBACK_TAG).is_none());
    }

    #[test]
    fn test_session_user_camel_case() {
        let user: SessionUser = serde_json::from_value(json!({
            "id": "u1",
            "prenom": "Léa",
            "nom": "Martin",
            "email": "lea@agence.fr",
            "role": "owner",
            "agenceId": "ag1"
        }))
        .unwrap();
        assert_eq!(user.role, Role::Owner);
        assert!(!user.is_demo);
    }

    #[test]
    fn test_model_handle_fallback() {
        let model = Model {
            id: "m1".into(),
            nom: "Jade".into(),
            nom_utilisateur: None,
            plateforme: Some("tiktok".into()),
        };
        assert_eq!(model.handle(), "tiktok");
    }
}

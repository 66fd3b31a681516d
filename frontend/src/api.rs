//! 后端 API 客户端
//!
//! 所有请求都走 [`ApiRequest`] 描述的端点，会话凭据由浏览器 Cookie 携带。

use async_trait::async_trait;
use onlytrack_popup::ConfigSource;
use onlytrack_shared::protocol::{ApiRequest, ErrorBody, HttpMethod, oauth_status_path};
use onlytrack_shared::{ConnectionStatus, Platform};

use crate::web::HttpClient;

/// 编译期可指定后端地址，默认与前端同源
const API_URL_OVERRIDE: Option<&str> = option_env!("ONLYTRACK_API_URL");

/// 当前页面的源，例如 `https://app.onlytrack.fr`
pub fn page_origin() -> String {
    web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_default()
}

#[derive(Clone, Debug, PartialEq)]
pub struct OnlyTrackApi {
    pub base_url: String,
}

impl Default for OnlyTrackApi {
    fn default() -> Self {
        Self::new(API_URL_OVERRIDE.map(str::to_string).unwrap_or_else(page_origin))
    }
}

impl OnlyTrackApi {
    pub fn new(base_url: String) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self { base_url }
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// 发送请求并返回原始响应，非 2xx 状态转为错误信息
    async fn dispatch<R: ApiRequest>(&self, req: &R) -> Result<crate::web::HttpResponse, String> {
        let url = self.url(R::PATH);
        let builder = HttpClient::request(&url, R::METHOD);
        let builder = match R::METHOD {
            HttpMethod::Post => builder.json(req).map_err(|e| e.to_string())?,
            HttpMethod::Get => builder,
        };

        let res = builder.send().await.map_err(|e| e.to_string())?;
        if res.ok() {
            return Ok(res);
        }

        let status = res.status();
        // 认证端点在错误时返回 `{ error }`
        let detail = res.json::<ErrorBody>().await.ok().and_then(|body| body.error);
        Err(match detail {
            Some(msg) => msg,
            None => format!("requête échouée: {}", status),
        })
    }

    /// 执行请求并解析响应体
    pub async fn send<R: ApiRequest>(&self, req: R) -> Result<R::Response, String> {
        let res = self.dispatch(&req).await?;
        res.json::<R::Response>().await.map_err(|e| e.to_string())
    }

    /// 执行请求，只关心状态码
    pub async fn execute<R: ApiRequest>(&self, req: R) -> Result<(), String> {
        self.dispatch(&req).await.map(|_| ())
    }

    /// 查询模特在某个平台上的连接状态
    pub async fn oauth_status(
        &self,
        model_id: &str,
        platform: Platform,
    ) -> Result<ConnectionStatus, String> {
        let url = self.url(&oauth_status_path(model_id, platform));
        let res = HttpClient::get(&url).send().await.map_err(|e| e.to_string())?;

        if !res.ok() {
            return Err(format!("statut {} indisponible: {}", platform, res.status()));
        }

        res.json::<ConnectionStatus>().await.map_err(|e| e.to_string())
    }
}

#[async_trait(?Send)]
impl ConfigSource for OnlyTrackApi {
    async fn backend_url(&self) -> Result<String, String> {
        self.send(onlytrack_shared::protocol::OAuthConfigRequest)
            .await
            .map(|config| config.backend_url)
    }
}

//! HTTP 请求封装模块
//!
//! 使用 `web_sys::fetch` 替代 `gloo-net`，提供简洁的 HTTP 客户端接口。
//! 所有请求都携带 Cookie（`credentials: include`），会话由后端的 httpOnly JWT 维持。

use onlytrack_shared::protocol::HttpMethod;
use serde::{Serialize, de::DeserializeOwned};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestCredentials, RequestInit, Response};

fn method_str(method: HttpMethod) -> &'static str {
    match method {
        HttpMethod::Get => "GET",
        HttpMethod::Post => "POST",
    }
}

/// HTTP 错误类型
#[derive(Debug)]
pub enum HttpError {
    /// 请求构建失败
    RequestBuildFailed(String),
    /// 网络请求失败
    NetworkError(String),
    /// 响应解析失败
    ResponseParseFailed(String),
}

impl core::fmt::Display for HttpError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            HttpError::RequestBuildFailed(msg) => write!(f, "requête invalide: {}", msg),
            HttpError::NetworkError(msg) => write!(f, "erreur réseau: {}", msg),
            HttpError::ResponseParseFailed(msg) => write!(f, "réponse illisible: {}", msg),
        }
    }
}

impl std::error::Error for HttpError {}

/// HTTP 响应封装
pub struct HttpResponse {
    inner: Response,
}

impl HttpResponse {
    /// 获取 HTTP 状态码
    pub fn status(&self) -> u16 {
        self.inner.status()
    }

    /// 检查响应是否成功 (2xx)
    pub fn ok(&self) -> bool {
        self.inner.ok()
    }

    /// 获取响应体文本
    pub async fn text(self) -> Result<String, HttpError> {
        let promise = self
            .inner
            .text()
            .map_err(|e| HttpError::ResponseParseFailed(format!("{:?}", e)))?;

        let text = JsFuture::from(promise)
            .await
            .map_err(|e| HttpError::ResponseParseFailed(format!("{:?}", e)))?;

        text.as_string()
            .ok_or_else(|| HttpError::ResponseParseFailed("corps non textuel".to_string()))
    }

    /// 解析 JSON 响应体；空响应体按 `null` 处理
    pub async fn json<T: DeserializeOwned>(self) -> Result<T, HttpError> {
        let text = self.text().await?;
        let body = if text.trim().is_empty() { "null" } else { text.as_str() };
        serde_json_wasm::from_str(body).map_err(|e| HttpError::ResponseParseFailed(e.to_string()))
    }
}

/// HTTP 请求构建器
pub struct HttpRequestBuilder {
    url: String,
    method: HttpMethod,
    headers: Vec<(String, String)>,
    body: Option<String>,
}

impl HttpRequestBuilder {
    fn new(url: String, method: HttpMethod) -> Self {
        Self {
            url,
            method,
            headers: Vec::new(),
            body: None,
        }
    }

    /// 添加请求头
    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.headers.push((key.to_string(), value.to_string()));
        self
    }

    /// 设置 JSON 请求体
    pub fn json<T: Serialize>(mut self, value: &T) -> Result<Self, HttpError> {
        let body = serde_json_wasm::to_string(value)
            .map_err(|e| HttpError::RequestBuildFailed(e.to_string()))?;
        self.body = Some(body);
        Ok(self.header("Content-Type", "application/json"))
    }

    /// 发送请求
    pub async fn send(self) -> Result<HttpResponse, HttpError> {
        let headers = Headers::new()
            .map_err(|e| HttpError::RequestBuildFailed(format!("Headers: {:?}", e)))?;

        for (key, value) in &self.headers {
            headers
                .set(key, value)
                .map_err(|e| HttpError::RequestBuildFailed(format!("Header {}: {:?}", key, e)))?;
        }

        let opts = RequestInit::new();
        opts.set_method(method_str(self.method));
        opts.set_headers(&headers.into());
        opts.set_credentials(RequestCredentials::Include);

        if let Some(body) = &self.body {
            opts.set_body(&JsValue::from_str(body));
        }

        let request = Request::new_with_str_and_init(&self.url, &opts)
            .map_err(|e| HttpError::RequestBuildFailed(format!("{:?}", e)))?;

        let window = web_sys::window()
            .ok_or_else(|| HttpError::NetworkError("window indisponible".to_string()))?;

        let resp_value = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(|e| HttpError::NetworkError(format!("{:?}", e)))?;

        let response: Response = resp_value
            .dyn_into()
            .map_err(|e| HttpError::ResponseParseFailed(format!("Response: {:?}", e)))?;

        Ok(HttpResponse { inner: response })
    }
}

/// 轻量级 HTTP 客户端
pub struct HttpClient;

impl HttpClient {
    pub fn request(url: &str, method: HttpMethod) -> HttpRequestBuilder {
        HttpRequestBuilder::new(url.to_string(), method)
    }

    /// 创建 GET 请求
    pub fn get(url: &str) -> HttpRequestBuilder {
        Self::request(url, HttpMethod::Get)
    }
}

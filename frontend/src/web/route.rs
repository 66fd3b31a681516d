//! 路由定义模块 - 领域模型
//!
//! 这是纯粹的业务逻辑层，不依赖于 DOM 或 web_sys。
//! 定义了应用的所有路由及其访问规则。

use onlytrack_shared::OAUTH_CALLBACK_PATH;
use onlytrack_shared::access::AccessRule;
use std::fmt::Display;

/// 应用路由枚举
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AppRoute {
    /// 登录页面
    Login,
    /// 模特与社交平台连接 (默认路由，需要认证与订阅)
    #[default]
    Connections,
    /// OAuth 回调页（在弹窗中打开）
    OAuthCallback,
    /// 页面未找到
    NotFound,
}

impl AppRoute {
    /// 将 URL path 解析为路由枚举
    pub fn from_path(path: &str) -> Self {
        match path.trim_end_matches('/') {
            "" | "/connexions" => Self::Connections,
            "/login" => Self::Login,
            p if p == OAUTH_CALLBACK_PATH => Self::OAuthCallback,
            _ => Self::NotFound,
        }
    }

    /// 获取路由对应的 URL path
    pub fn to_path(&self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Connections => "/",
            Self::OAuthCallback => OAUTH_CALLBACK_PATH,
            Self::NotFound => "/404",
        }
    }

    /// **核心守卫逻辑：该路由的访问要求**
    pub fn access_rule(&self) -> AccessRule {
        match self {
            Self::Connections => AccessRule::MEMBER,
            Self::Login | Self::OAuthCallback | Self::NotFound => AccessRule::PUBLIC,
        }
    }

    pub fn requires_auth(&self) -> bool {
        self.access_rule().requires_auth
    }

    /// 定义已认证用户是否应该离开此路由（如登录页）
    pub fn should_redirect_when_authenticated(&self) -> bool {
        matches!(self, Self::Login)
    }

    /// 获取认证失败时的重定向目标
    pub fn auth_failure_redirect() -> Self {
        Self::Login
    }

    /// 获取认证成功时的重定向目标（从登录页）
    pub fn auth_success_redirect() -> Self {
        Self::Connections
    }
}

impl Display for AppRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(AppRoute::from_path("/"), AppRoute::Connections);
        assert_eq!(AppRoute::from_path("/connexions/"), AppRoute::Connections);
        assert_eq!(AppRoute::from_path("/login"), AppRoute::Login);
        assert_eq!(AppRoute::from_path("/oauth-callback"), AppRoute::OAuthCallback);
        assert_eq!(AppRoute::from_path("/comptabilite"), AppRoute::NotFound);
    }

    #[test]
    fn test_callback_page_is_public() {
        // 弹窗中的回调页不能被登录守卫重定向
        assert!(!AppRoute::OAuthCallback.requires_auth());
        assert!(AppRoute::Connections.requires_auth());
        assert!(AppRoute::Connections.access_rule().requires_subscription);
    }
}

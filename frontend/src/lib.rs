//! OnlyTrack 前端应用
//!
//! 采用 Context-Driven 的高内聚低耦合架构：
//! - `web::route`: 路由定义（领域模型）
//! - `web::router`: 路由服务（核心引擎）
//! - `web::popup`: 授权弹窗的浏览器宿主
//! - `auth`: 认证状态管理
//! - `components`: UI 组件层

mod api;
mod auth;
mod components {
    pub mod connect_dialog;
    pub mod connections;
    mod icons;
    pub mod login;
    pub mod oauth_callback;
    pub mod paywall;
}
mod serde_helper;

use crate::auth::{AuthContext, init_auth};
use crate::components::connections::ConnectionsPage;
use crate::components::login::LoginPage;
use crate::components::oauth_callback::OAuthCallbackPage;
use crate::components::paywall::AccessGuard;

use leptos::prelude::*;

// 原生 Web API 封装模块
// 此模块提供对浏览器原生 API 的轻量级封装，替代 gloo-* 系列 crate，
// 以减小 WASM 二进制体积。
pub(crate) mod web {
    mod http;
    mod popup;
    pub mod route;
    pub mod router;
    mod storage;
    mod timer;

    pub use http::{HttpClient, HttpResponse};
    pub use popup::BrowserPopupHost;
    pub use storage::LocalStorage;
    pub use timer::Timeout;
}

use web::route::AppRoute;
use web::router::{Router, RouterOutlet, use_router};

/// 路由匹配函数
///
/// 根据 AppRoute 枚举返回对应的视图组件。
fn route_matcher(route: AppRoute) -> AnyView {
    let rule = route.access_rule();
    match route {
        AppRoute::Login => view! { <LoginPage /> }.into_any(),
        AppRoute::Connections => view! {
            <AccessGuard rule=rule>
                <ConnectionsPage />
            </AccessGuard>
        }
        .into_any(),
        AppRoute::OAuthCallback => view! { <OAuthCallbackPage /> }.into_any(),
        AppRoute::NotFound => {
            let router = use_router();
            view! {
                <div class="flex items-center justify-center min-h-screen bg-base-200">
                    <div class="text-center">
                        <h1 class="text-6xl font-bold text-error">"404"</h1>
                        <p class="text-xl mt-4">"Page introuvable"</p>
                        <button class="btn btn-primary mt-6" on:click=move |_| router.navigate("/")>
                            "Retour à l'accueil"
                        </button>
                    </div>
                </div>
            }
            .into_any()
        }
    }
}

#[component]
pub fn App() -> impl IntoView {
    // 1. 创建认证上下文
    let auth_ctx = AuthContext::new();
    provide_context(auth_ctx);

    // 2. 恢复 Cookie 中的会话
    init_auth(&auth_ctx);

    // 3. 获取认证状态信号，用于注入路由服务
    let is_authenticated = auth_ctx.is_authenticated_signal();
    let is_loading = auth_ctx.is_loading_signal();

    view! {
        <Router is_authenticated=is_authenticated is_loading=is_loading>
            <RouterOutlet matcher=route_matcher />
        </Router>
    }
}

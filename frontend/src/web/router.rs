//! 路由服务模块 - 核心引擎
//!
//! 封装了 web_sys 的 History API，所有对 window.history 的操作都集中在此模块。
//! 导航流程："监听 -> 验证 -> 处理 -> 加载"。
//!
//! 会话恢复期间（`is_loading`）不做认证重定向，否则刷新受保护页面时
//! 会在 `/api/auth/moi` 返回之前被错误地送回登录页。

use leptos::prelude::*;
use wasm_bindgen::prelude::*;

use super::route::AppRoute;

/// 获取当前浏览器路径
fn current_path() -> String {
    web_sys::window()
        .and_then(|w| w.location().pathname().ok())
        .unwrap_or_else(|| "/".to_string())
}

fn write_history(path: &str, use_push: bool) {
    let Some(history) = web_sys::window().and_then(|w| w.history().ok()) else {
        return;
    };
    let _ = if use_push {
        history.push_state_with_url(&JsValue::NULL, "", Some(path))
    } else {
        history.replace_state_with_url(&JsValue::NULL, "", Some(path))
    };
}

/// 守卫判定：返回需要改道的目标路由
fn guard(target: &AppRoute, is_auth: bool, is_loading: bool) -> Option<AppRoute> {
    if is_loading {
        return None;
    }
    if target.requires_auth() && !is_auth {
        return Some(AppRoute::auth_failure_redirect());
    }
    if target.should_redirect_when_authenticated() && is_auth {
        return Some(AppRoute::auth_success_redirect());
    }
    None
}

/// 路由器服务
///
/// 通过注入认证信号实现与认证系统的解耦。
#[derive(Clone, Copy)]
pub struct RouterService {
    current_route: ReadSignal<AppRoute>,
    set_route: WriteSignal<AppRoute>,
    is_authenticated: Signal<bool>,
    is_loading: Signal<bool>,
}

impl RouterService {
    fn new(is_authenticated: Signal<bool>, is_loading: Signal<bool>) -> Self {
        let initial_route = AppRoute::from_path(&current_path());
        let (current_route, set_route) = signal(initial_route);

        Self {
            current_route,
            set_route,
            is_authenticated,
            is_loading,
        }
    }

    pub fn current_route(&self) -> ReadSignal<AppRoute> {
        self.current_route
    }

    /// **核心方法：导航与守卫**
    pub fn navigate(&self, path: &str) {
        self.navigate_to_route(AppRoute::from_path(path), true);
    }

    fn navigate_to_route(&self, target_route: AppRoute, use_push: bool) {
        let is_auth = self.is_authenticated.get_untracked();
        let is_loading = self.is_loading.get_untracked();

        let route = match guard(&target_route, is_auth, is_loading) {
            Some(redirect) => {
                web_sys::console::log_1(
                    &format!("[Router] {} -> {}", target_route, redirect).into(),
                );
                redirect
            }
            None => target_route,
        };

        write_history(route.to_path(), use_push);
        self.set_route.set(route);
    }

    /// 初始化浏览器后退/前进按钮监听
    fn init_popstate_listener(&self) {
        let router = *self;

        let closure = Closure::<dyn Fn()>::new(move || {
            let target_route = AppRoute::from_path(&current_path());
            router.navigate_to_route(target_route, false);
        });

        if let Some(window) = web_sys::window() {
            let _ = window
                .add_event_listener_with_callback("popstate", closure.as_ref().unchecked_ref());
        }

        // 泄漏闭包以保持监听器存活
        closure.forget();
    }

    /// 认证状态变化（登录、注销、会话恢复完成）时重新执行守卫
    fn setup_auth_redirect(&self) {
        let current_route = self.current_route;
        let set_route = self.set_route;
        let is_authenticated = self.is_authenticated;
        let is_loading = self.is_loading;

        Effect::new(move |_| {
            let is_auth = is_authenticated.get();
            let loading = is_loading.get();
            let route = current_route.get_untracked();

            if let Some(redirect) = guard(&route, is_auth, loading) {
                web_sys::console::log_1(
                    &format!("[Router] Auth state changed, redirecting to {}.", redirect).into(),
                );
                write_history(redirect.to_path(), false);
                set_route.set(redirect);
            }
        });
    }
}

fn provide_router(is_authenticated: Signal<bool>, is_loading: Signal<bool>) -> RouterService {
    let router = RouterService::new(is_authenticated, is_loading);

    router.init_popstate_listener();
    router.setup_auth_redirect();

    provide_context(router);
    router
}

/// 从 Context 获取路由服务
pub fn use_router() -> RouterService {
    use_context::<RouterService>()
        .expect("RouterService not found in context. Ensure Router is provided.")
}

// ============================================================================
// UI 组件
// ============================================================================

/// 路由器根组件
#[component]
pub fn Router(
    /// 认证状态信号
    is_authenticated: Signal<bool>,
    /// 会话恢复中
    is_loading: Signal<bool>,
    children: Children,
) -> impl IntoView {
    provide_router(is_authenticated, is_loading);

    children()
}

/// 路由出口组件
///
/// 根据当前路由状态渲染对应的组件。
#[component]
pub fn RouterOutlet(
    /// 路由匹配函数：接收当前路由，返回对应视图
    matcher: fn(AppRoute) -> AnyView,
) -> impl IntoView {
    let router = use_router();

    move || {
        let current = router.current_route().get();
        matcher(current)
    }
}

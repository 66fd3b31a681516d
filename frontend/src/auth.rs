//! 认证模块
//!
//! 管理用户认证状态，与路由系统解耦。
//! 会话保存在后端下发的 httpOnly Cookie 中，前端只持有当前用户信息。

use crate::api::OnlyTrackApi;
use crate::web::LocalStorage;
use leptos::prelude::*;
use leptos::task::spawn_local;
use onlytrack_shared::SessionUser;
use onlytrack_shared::protocol::{CurrentUserRequest, LoginRequest, LogoutRequest};

const STORAGE_EMAIL_KEY: &str = "onlytrack_email";

/// 认证状态
#[derive(Clone)]
pub struct AuthState {
    /// 当前用户（未登录时为 `None`）
    pub user: Option<SessionUser>,
    /// 是否正在恢复会话
    pub is_loading: bool,
    /// 上次登录使用的邮箱（用于自动填充）
    pub remembered_email: String,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            user: None,
            is_loading: true,
            remembered_email: String::new(),
        }
    }
}

/// 认证上下文
///
/// 包含读写信号，通过 Context 在组件间共享。
#[derive(Clone, Copy)]
pub struct AuthContext {
    pub state: ReadSignal<AuthState>,
    pub set_state: WriteSignal<AuthState>,
}

impl AuthContext {
    pub fn new() -> Self {
        let (state, set_state) = signal(AuthState::default());
        Self { state, set_state }
    }

    /// 获取认证状态信号（用于路由服务注入）
    pub fn is_authenticated_signal(&self) -> Signal<bool> {
        let state = self.state;
        Signal::derive(move || state.with(|s| s.user.is_some()))
    }

    pub fn is_loading_signal(&self) -> Signal<bool> {
        let state = self.state;
        Signal::derive(move || state.with(|s| s.is_loading))
    }
}

/// 从 Context 获取认证上下文
pub fn use_auth() -> AuthContext {
    use_context::<AuthContext>().expect("AuthContext should be provided")
}

/// 初始化认证状态
///
/// 通过 `/api/auth/moi` 恢复 Cookie 中的会话。
pub fn init_auth(ctx: &AuthContext) {
    let set_state = ctx.set_state;
    set_state.update(|state| {
        if let Some(email) = LocalStorage::get(STORAGE_EMAIL_KEY) {
            state.remembered_email = email;
        }
    });

    spawn_local(async move {
        let user = OnlyTrackApi::default().send(CurrentUserRequest).await.ok();
        set_state.update(|state| {
            state.user = user;
            state.is_loading = false;
        });
    });
}

/// 登录
///
/// 成功后记住邮箱以便下次自动填充，密码不落地。
pub async fn login(ctx: &AuthContext, email: String, password: String) -> Result<(), String> {
    let request = LoginRequest {
        email: email.clone(),
        password,
    };
    let response = OnlyTrackApi::default().send(request).await?;

    LocalStorage::set(STORAGE_EMAIL_KEY, &email);
    ctx.set_state.update(|state| {
        state.user = Some(response.user);
        state.remembered_email = email;
    });
    Ok(())
}

/// 注销并清除状态
///
/// 导航将由路由服务的认证状态监听自动处理。
pub async fn logout(ctx: &AuthContext) {
    if let Err(e) = OnlyTrackApi::default().execute(LogoutRequest {}).await {
        web_sys::console::error_1(&format!("[Auth] logout failed: {}", e).into());
    }
    ctx.set_state.update(|state| {
        state.user = None;
    });
}

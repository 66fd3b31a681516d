//! OAuth 回调页
//!
//! 授权服务完成后把弹窗重定向到这里。页面把查询参数整理成
//! `OAUTH_CALLBACK` 消息发给打开它的窗口，随后自行关闭；
//! 没有 opener（用户直接访问）时回到首页。

use crate::serde_helper;
use crate::web::Timeout;
use leptos::prelude::*;
use onlytrack_shared::{CallbackEnvelope, OAuthCallback};
use wasm_bindgen::JsCast;
use web_sys::UrlSearchParams;

const CLOSE_DELAY_MS: u32 = 500;
const REDIRECT_DELAY_MS: u32 = 1000;

fn read_callback(window: &web_sys::Window) -> OAuthCallback {
    let params = window
        .location()
        .search()
        .ok()
        .and_then(|search| UrlSearchParams::new_with_str(&search).ok());
    let get = |key: &str| params.as_ref().and_then(|p| p.get(key));
    OAuthCallback::from_query(get("connected"), get("error"), get("message"))
}

fn live_opener(window: &web_sys::Window) -> Option<web_sys::Window> {
    let opener = window.opener().ok()?;
    if opener.is_null() || opener.is_undefined() {
        return None;
    }
    let opener: web_sys::Window = opener.unchecked_into();
    if opener.closed().unwrap_or(true) {
        return None;
    }
    Some(opener)
}

/// 把结果交给 opener，返回是否已发送
fn notify_opener(window: &web_sys::Window) -> bool {
    let Some(opener) = live_opener(window) else {
        return false;
    };
    let origin = window.location().origin().unwrap_or_default();
    let envelope = CallbackEnvelope::new(read_callback(window));

    match serde_helper::to_value(&envelope) {
        Ok(message) => {
            if let Err(e) = opener.post_message(&message, &origin) {
                web_sys::console::error_1(&e);
            }
        }
        Err(e) => web_sys::console::error_1(&format!("[OAuthCallback] {}", e).into()),
    }
    true
}

#[component]
pub fn OAuthCallbackPage() -> impl IntoView {
    Effect::new(move |_| {
        let Some(window) = web_sys::window() else {
            return;
        };

        if notify_opener(&window) {
            Timeout::schedule(CLOSE_DELAY_MS, || {
                if let Some(window) = web_sys::window() {
                    if live_opener(&window).is_some() {
                        let _ = window.close();
                    }
                }
            });
        } else {
            Timeout::schedule(REDIRECT_DELAY_MS, || {
                if let Some(window) = web_sys::window() {
                    let _ = window.location().set_href("/");
                }
            });
        }
    });

    view! {
        <div class="min-h-screen w-full flex items-center justify-center bg-base-200">
            <div class="text-center space-y-4">
                <div class="w-16 h-16 mx-auto rounded-full bg-primary/20 flex items-center justify-center animate-pulse">
                    <svg class="w-8 h-8 text-primary" fill="none" stroke="currentColor" viewBox="0 0 24 24">
                        <path stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d="M9 12l2 2 4-4m6 2a9 9 0 11-18 0 9 9 0 0118 0z" />
                    </svg>
                </div>
                <h2 class="text-xl font-bold">"Connexion en cours..."</h2>
                <p class="text-base-content/70 text-sm">"Cette fenêtre se fermera automatiquement"</p>
            </div>
        </div>
    }
}

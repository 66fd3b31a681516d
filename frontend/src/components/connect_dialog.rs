//! 平台授权对话框
//!
//! 打开时向后端查询授权服务地址，点击按钮后通过 [`PopupCoordinator`]
//! 打开授权弹窗。`window.open` 必须在点击事件中同步调用，
//! 否则会被浏览器当作非用户触发的弹窗拦截。

use crate::api::{OnlyTrackApi, page_origin};
use crate::components::icons::Link2;
use crate::web::BrowserPopupHost;
use leptos::prelude::*;
use leptos::task::spawn_local;
use onlytrack_popup::{
    CancelReason, PopupCoordinator, PopupError, SessionOutcome, resolve_backend_url,
};
use onlytrack_shared::{Platform, authorization_url};

/// 等待授权的目标：平台与模特 ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectTarget {
    pub platform: Platform,
    pub model_id: Option<String>,
}

fn outcome_notice(platform: Platform, outcome: &SessionOutcome) -> Option<(String, bool)> {
    match outcome {
        SessionOutcome::Completed(cb) if cb.success => {
            Some((format!("Compte {} connecté", platform.display_name()), false))
        }
        SessionOutcome::Completed(cb) => {
            let detail = cb
                .message
                .clone()
                .or_else(|| cb.error.clone())
                .unwrap_or_else(|| "erreur inconnue".to_string());
            Some((format!("Connexion {} échouée: {}", platform.display_name(), detail), true))
        }
        SessionOutcome::Blocked => Some((PopupError::Blocked.message().to_string(), true)),
        // 用户关闭弹窗属于静默放弃
        SessionOutcome::Cancelled(_) => None,
    }
}

/// 由协调器自身发起的结束（新的 `start()` 或组件卸载），界面不做任何反应
fn is_internal_teardown(outcome: &SessionOutcome) -> bool {
    matches!(
        outcome,
        SessionOutcome::Cancelled(CancelReason::Superseded | CancelReason::Disposed)
    )
}

#[component]
pub fn ConnectDialog(
    /// 当前目标，`None` 表示对话框关闭
    #[prop(into)]
    target: Signal<Option<ConnectTarget>>,
    #[prop(into)] on_close: Callback<()>,
    /// 通知：消息内容, 是否出错
    #[prop(into)]
    on_notify: Callback<(String, bool)>,
) -> impl IntoView {
    let dialog_ref = NodeRef::<leptos::html::Dialog>::new();
    let backend_url = RwSignal::new(Option::<String>::None);
    let waiting = RwSignal::new(false);

    // 协调器持有 Rc 与浏览器句柄，只能存放在本地存储中
    let coordinator = StoredValue::new_local(BrowserPopupHost::new().map(|host| {
        PopupCoordinator::new(host).with_observer(move |outcome| {
            // 卸载时信号可能已被释放
            if is_internal_teardown(outcome) {
                return;
            }
            waiting.set(false);
            let Some(platform) = target.get_untracked().map(|t| t.platform) else {
                return;
            };
            if let Some(notice) = outcome_notice(platform, outcome) {
                on_notify.run(notice);
            }
            if matches!(outcome, SessionOutcome::Completed(_)) {
                on_close.run(());
            }
        })
    }));

    on_cleanup(move || {
        coordinator.try_with_value(|c| {
            if let Some(c) = c {
                c.dispose();
            }
        });
    });

    // 打开时查询授权服务地址
    Effect::new(move |_| {
        if target.get().is_none() {
            return;
        }
        backend_url.set(None);
        spawn_local(async move {
            let url = resolve_backend_url(&OnlyTrackApi::default(), &page_origin()).await;
            backend_url.set(Some(url));
        });
    });

    Effect::new(move |_| {
        if let Some(dialog) = dialog_ref.get() {
            if target.get().is_some() {
                if !dialog.open() {
                    let _ = dialog.show_modal();
                }
            } else if dialog.open() {
                dialog.close();
            }
        }
    });

    let on_connect = move |ev: leptos::web_sys::MouseEvent| {
        ev.prevent_default();
        ev.stop_propagation();

        let Some(base) = backend_url.get_untracked() else {
            on_notify.run((
                "Configuration OAuth non disponible. Veuillez réessayer.".to_string(),
                true,
            ));
            return;
        };
        let Some(ConnectTarget { platform, model_id }) = target.get_untracked() else {
            return;
        };
        let url = authorization_url(&base, platform, model_id.as_deref());

        // 拦截时观察者已发出通知
        match coordinator.with_value(|c| c.as_ref().map(|c| c.start(&url).is_ok())) {
            Some(started) => waiting.set(started),
            None => on_notify.run(("Fenêtre du navigateur indisponible".to_string(), true)),
        }
    };

    let title = move || {
        target
            .get()
            .map(|t| format!("Connecter {}", t.platform.display_name()))
            .unwrap_or_default()
    };
    let platform_name = move || {
        target
            .get()
            .map(|t| t.platform.display_name())
            .unwrap_or_default()
    };

    view! {
        <dialog node_ref=dialog_ref class="modal" on:close=move |_| on_close.run(())>
            <div class="modal-box max-w-md">
                <h3 class="font-bold text-lg">{title}</h3>
                <p class="py-4 text-base-content/70">
                    "Autorisez l'application à accéder à votre compte "
                    {platform_name}
                    " pour synchroniser les statistiques et le contenu."
                </p>
                <div class="flex justify-center">
                    <button
                        type="button"
                        class="btn btn-primary w-full max-w-sm gap-2"
                        on:click=on_connect
                        disabled=move || waiting.get() || backend_url.get().is_none()
                    >
                        {move || if waiting.get() || backend_url.get().is_none() {
                            view! { <span class="loading loading-spinner"></span> "Chargement..." }.into_any()
                        } else {
                            view! { <Link2 attr:class="h-4 w-4" /> "Autoriser l'accès à " {platform_name} }.into_any()
                        }}
                    </button>
                </div>
                <div class="modal-action">
                    <button type="button" class="btn btn-ghost" on:click=move |_| on_close.run(())>
                        "Fermer"
                    </button>
                </div>
            </div>
        </dialog>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onlytrack_shared::OAuthCallback;

    #[test]
    fn test_outcome_notice() {
        let ok = SessionOutcome::Completed(OAuthCallback {
            success: true,
            platform: Some("tiktok".into()),
            ..Default::default()
        });
        assert_eq!(
            outcome_notice(Platform::Tiktok, &ok),
            Some(("Compte TikTok connecté".to_string(), false))
        );

        let failed = SessionOutcome::Completed(OAuthCallback {
            error: Some("access_denied".into()),
            ..Default::default()
        });
        let (msg, is_err) = outcome_notice(Platform::Instagram, &failed).unwrap();
        assert!(is_err);
        assert!(msg.ends_with("access_denied"));

        let (msg, _) = outcome_notice(Platform::Threads, &SessionOutcome::Blocked).unwrap();
        assert_eq!(msg, "Popup blocked! Please allow popups for this site.");

        assert_eq!(
            outcome_notice(Platform::Threads, &SessionOutcome::Cancelled(CancelReason::Superseded)),
            None
        );
    }

    #[test]
    fn test_user_cancel_is_silent() {
        let cancelled = SessionOutcome::Cancelled(CancelReason::PopupClosed);
        assert_eq!(outcome_notice(Platform::Tiktok, &cancelled), None);
        // 仍需复位按钮状态
        assert!(!is_internal_teardown(&cancelled));
    }

    #[test]
    fn test_internal_teardown_skips_ui() {
        assert!(is_internal_teardown(&SessionOutcome::Cancelled(CancelReason::Disposed)));
        assert!(is_internal_teardown(&SessionOutcome::Cancelled(CancelReason::Superseded)));
        assert!(!is_internal_teardown(&SessionOutcome::Blocked));
    }
}

//! 访问守卫与订阅墙
//!
//! 路由服务只处理登录重定向；角色与订阅由 [`AccessGuard`] 在渲染时判定。

use crate::api::OnlyTrackApi;
use crate::auth::{logout, use_auth};
use crate::components::icons::{AlertTriangle, LogOut, ShieldCheck};
use leptos::prelude::*;
use leptos::task::spawn_local;
use onlytrack_shared::SubscriptionStatus;
use onlytrack_shared::access::{AccessDecision, AccessRule, BillingState, UserState, evaluate};
use onlytrack_shared::protocol::{
    BillingPortalRequest, CreateCheckoutRequest, SubscriptionStatusRequest, VerifyPaymentRequest,
};
use wasm_bindgen::JsValue;

/// 订阅查询状态（持有数据）
#[derive(Debug, Clone, PartialEq)]
enum Billing {
    Loading,
    Verifying,
    Failed,
    Loaded(Option<SubscriptionStatus>),
}

impl Billing {
    fn as_state(&self) -> BillingState<'_> {
        match self {
            Billing::Loading => BillingState::Loading,
            Billing::Verifying => BillingState::Verifying,
            Billing::Failed => BillingState::Failed,
            Billing::Loaded(status) => BillingState::Loaded(status.as_ref()),
        }
    }
}

/// 受阻页面提供的订阅操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BillingAction {
    /// 免费或已取消：发起 Premium 结账
    Checkout,
    /// 已有客户（如付款失败）：打开客户门户
    Portal,
}

impl BillingAction {
    fn label(&self) -> &'static str {
        match self {
            BillingAction::Checkout => "Voir les tarifs",
            BillingAction::Portal => "Gérer mon abonnement",
        }
    }
}

/// 获取支付页地址；门户不可用时退回结账
async fn billing_redirect(action: BillingAction) -> Result<String, String> {
    let api = OnlyTrackApi::default();
    if action == BillingAction::Portal {
        match api.send(BillingPortalRequest {}).await {
            Ok(portal) => return Ok(portal.url),
            Err(e) => web_sys::console::error_1(
                &format!("[Billing] portal unavailable, falling back to checkout: {}", e).into(),
            ),
        }
    }
    api.send(CreateCheckoutRequest {}).await.map(|checkout| checkout.url)
}

/// 从支付页返回时 URL 带有 `?success=true`
fn returning_from_checkout() -> bool {
    web_sys::window()
        .and_then(|w| w.location().search().ok())
        .and_then(|search| web_sys::UrlSearchParams::new_with_str(&search).ok())
        .and_then(|params| params.get("success"))
        .is_some_and(|v| v == "true")
}

fn clear_query() {
    if let Some(history) = web_sys::window().and_then(|w| w.history().ok()) {
        let _ = history.replace_state_with_url(&JsValue::NULL, "", Some("/"));
    }
}

async fn fetch_status(billing: RwSignal<Billing>) {
    match OnlyTrackApi::default().send(SubscriptionStatusRequest).await {
        Ok(status) => billing.set(Billing::Loaded(Some(status))),
        Err(e) => {
            // 查询失败时放行
            web_sys::console::error_1(&format!("[Billing] status unavailable: {}", e).into());
            billing.set(Billing::Failed);
        }
    }
}

#[component]
pub fn AccessGuard(rule: AccessRule, children: ChildrenFn) -> impl IntoView {
    let auth = use_auth();
    let billing = RwSignal::new(Billing::Loading);
    let (notice, set_notice) = signal(Option::<String>::None);

    // 只在登录用户变化时重新查询；演示账号不查询
    let billed_user = Memo::new(move |_| {
        auth.state.with(|s| {
            s.user
                .as_ref()
                .filter(|u| !u.is_demo)
                .map(|u| u.id.clone())
        })
    });

    if rule.requires_subscription && returning_from_checkout() {
        billing.set(Billing::Verifying);
        spawn_local(async move {
            let api = OnlyTrackApi::default();
            match api.send(VerifyPaymentRequest {}).await {
                Ok(res) if res.success && res.plan.as_deref() == Some("premium") => {
                    set_notice.set(Some("Abonnement Premium activé !".to_string()));
                }
                Ok(_) => {}
                Err(e) => web_sys::console::error_1(&format!("[Billing] verify failed: {}", e).into()),
            }
            clear_query();
            fetch_status(billing).await;
        });
    }

    Effect::new(move |_| {
        if !rule.requires_subscription || billed_user.get().is_none() {
            return;
        }
        if billing.get_untracked() == Billing::Verifying {
            return;
        }
        spawn_local(fetch_status(billing));
    });

    Effect::new(move |_| {
        if notice.get().is_some() {
            set_timeout(move || set_notice.set(None), std::time::Duration::from_secs(3));
        }
    });

    let decision = Memo::new(move |_| {
        auth.state.with(|s| {
            let user = match (&s.user, s.is_loading) {
                (_, true) => UserState::Loading,
                (Some(user), false) => UserState::SignedIn(user),
                (None, false) => UserState::Anonymous,
            };
            billing.with(|b| evaluate(rule, user, b.as_state()))
        })
    });

    let email = move || auth.state.with(|s| s.user.as_ref().map(|u| u.email.clone()).unwrap_or_default());

    view! {
        {move || notice.get().map(|msg| view! {
            <div class="toast toast-top toast-end z-50">
                <div class="alert alert-success shadow-lg"><span>{msg}</span></div>
            </div>
        })}
        {move || match decision.get() {
            AccessDecision::Granted => children().into_any(),
            AccessDecision::Loading | AccessDecision::RedirectToLogin => {
                let verifying = billing.get_untracked() == Billing::Verifying;
                view! {
                    <div class="min-h-screen flex flex-col items-center justify-center gap-4">
                        <span class="loading loading-spinner loading-lg text-primary"></span>
                        <Show when=move || verifying>
                            <p class="text-base-content/70">"Vérification de votre paiement..."</p>
                        </Show>
                    </div>
                }
                .into_any()
            }
            AccessDecision::Forbidden => view! {
                <BlockedCard title="Accès refusé" tone="text-error">
                    <p class="text-base-content/70">"Votre rôle ne permet pas d'accéder à cette page."</p>
                </BlockedCard>
            }
            .into_any(),
            AccessDecision::Suspended => view! {
                <BlockedCard title="Paiement en attente" tone="text-error" action=BillingAction::Portal>
                    <p class="text-base-content/70">
                        "Votre dernier paiement a échoué. Veuillez mettre à jour vos informations de paiement pour continuer à utiliser OnlyTrack."
                    </p>
                    <p class="text-sm text-base-content/50">
                        "Vos données sont préservées et seront disponibles dès que votre abonnement sera réactivé."
                    </p>
                </BlockedCard>
            }
            .into_any(),
            AccessDecision::SubscriptionRequired => view! {
                <BlockedCard title="Passez à Premium" tone="text-primary" action=BillingAction::Checkout>
                    <p class="text-sm text-base-content/50">"Connecté en tant que " {email}</p>
                    <p class="text-base-content/70">
                        "Pour accéder à toutes les fonctionnalités d'OnlyTrack, vous avez besoin d'un abonnement Premium."
                    </p>
                    <ul class="text-left text-sm space-y-2 bg-primary/5 rounded-xl p-4 w-full">
                        <li>"✓ Analytics connectés (TikTok, Instagram)"</li>
                        <li>"✓ Assistant IA illimité"</li>
                        <li>"✓ Support prioritaire"</li>
                        <li>"✓ 3 jours d'essai gratuit"</li>
                    </ul>
                    <p class="text-xs text-base-content/50">
                        "Essayez gratuitement pendant 3 jours, annulez quand vous voulez."
                    </p>
                </BlockedCard>
            }
            .into_any(),
        }}
    }
}

/// 受阻页面的公共外框：订阅操作（可选）与注销按钮
#[component]
fn BlockedCard(
    title: &'static str,
    tone: &'static str,
    #[prop(optional)] action: Option<BillingAction>,
    children: Children,
) -> impl IntoView {
    let auth = use_auth();
    let (error_msg, set_error_msg) = signal(Option::<String>::None);
    let (redirecting, set_redirecting) = signal(false);

    let on_billing = move |action: BillingAction| {
        set_redirecting.set(true);
        set_error_msg.set(None);
        spawn_local(async move {
            match billing_redirect(action).await {
                Ok(url) => {
                    if let Some(window) = web_sys::window() {
                        let _ = window.location().set_href(&url);
                    }
                }
                Err(e) => {
                    set_error_msg.set(Some(e));
                    set_redirecting.set(false);
                }
            }
        });
    };

    let on_logout = move |_| {
        spawn_local(async move { logout(&auth).await });
    };

    view! {
        <div class="min-h-screen flex items-center justify-center p-4 bg-base-200">
            <div class="card bg-base-100 shadow-xl max-w-md w-full">
                <div class="card-body items-center text-center space-y-2">
                    <div class=format!("p-3 rounded-full bg-base-200 {}", tone)>
                        {if tone == "text-error" {
                            view! { <AlertTriangle attr:class="h-8 w-8" /> }.into_any()
                        } else {
                            view! { <ShieldCheck attr:class="h-8 w-8" /> }.into_any()
                        }}
                    </div>
                    <h2 class="card-title text-2xl">{title}</h2>
                    {children()}
                    {move || error_msg.get().map(|msg| view! {
                        <div role="alert" class="alert alert-error text-sm py-2"><span>{msg}</span></div>
                    })}
                    {action.map(|action| view! {
                        <button
                            class="btn btn-primary w-full"
                            disabled=move || redirecting.get()
                            on:click=move |_| on_billing(action)
                        >
                            {action.label()}
                        </button>
                    })}
                    <button class="btn btn-ghost w-full gap-2" on:click=on_logout>
                        <LogOut attr:class="h-4 w-4" /> "Se déconnecter"
                    </button>
                </div>
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_billing_action_labels() {
        assert_eq!(BillingAction::Checkout.label(), "Voir les tarifs");
        assert_eq!(BillingAction::Portal.label(), "Gérer mon abonnement");
    }

    #[test]
    fn test_billing_as_state() {
        let status = SubscriptionStatus {
            plan: "free".into(),
            status: "actif".into(),
            is_premium: false,
        };
        let loaded = Billing::Loaded(Some(status));
        assert!(matches!(loaded.as_state(), BillingState::Loaded(Some(s)) if s.plan == "free"));
        assert!(matches!(Billing::Verifying.as_state(), BillingState::Verifying));
    }
}

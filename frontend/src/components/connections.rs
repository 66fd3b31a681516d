use crate::api::OnlyTrackApi;
use crate::auth::{logout, use_auth};
use crate::components::connect_dialog::{ConnectDialog, ConnectTarget};
use crate::components::icons::*;
use leptos::prelude::*;
use leptos::task::spawn_local;
use onlytrack_shared::protocol::ListModelsRequest;
use onlytrack_shared::{ConnectionStatus, Model, Platform};
use std::collections::HashMap;

type StatusMap = HashMap<(String, Platform), ConnectionStatus>;

fn status_badge(status: Option<ConnectionStatus>) -> (&'static str, &'static str) {
    match status {
        None => ("badge badge-ghost", "..."),
        Some(s) if s.is_usable() => ("badge badge-success", "Connecté"),
        Some(s) if s.connected => ("badge badge-warning", "Expiré"),
        Some(_) => ("badge badge-outline", "Non connecté"),
    }
}

#[component]
pub fn ConnectionsPage() -> impl IntoView {
    let auth = use_auth();

    let (models, set_models) = signal(Vec::<Model>::new());
    let (statuses, set_statuses) = signal(StatusMap::new());
    let (loading, set_loading) = signal(true);
    let (notification, set_notification) = signal(Option::<(String, bool)>::None); // 消息内容, 是否出错
    let target = RwSignal::new(Option::<ConnectTarget>::None);

    let load = move || {
        set_loading.set(true);
        spawn_local(async move {
            let api = OnlyTrackApi::default();
            match api.send(ListModelsRequest).await {
                Ok(list) => {
                    set_models.set(list.clone());
                    set_statuses.set(StatusMap::new());
                    for model in &list {
                        for platform in Platform::ALL {
                            // 单个平台查询失败不影响其他行
                            let status = api.oauth_status(&model.id, platform).await.unwrap_or_default();
                            set_statuses.update(|map| {
                                map.insert((model.id.clone(), platform), status);
                            });
                        }
                    }
                }
                Err(e) => {
                    set_notification.set(Some((format!("Chargement des modèles échoué: {}", e), true)));
                }
            }
            set_loading.set(false);
        });
    };

    // 初始加载
    Effect::new(move |_| load());

    // 3秒后清除通知
    Effect::new(move |_| {
        if notification.get().is_some() {
            set_timeout(
                move || set_notification.set(None),
                std::time::Duration::from_secs(3),
            );
        }
    });

    let on_logout = move |_| {
        spawn_local(async move { logout(&auth).await });
    };

    let user_name = move || {
        auth.state
            .get()
            .user
            .map(|u| format!("{} {}", u.prenom, u.nom))
            .unwrap_or_default()
    };

    view! {
        <div class="min-h-screen bg-base-200 p-4 md:p-8 font-sans">
            <div class="max-w-7xl mx-auto space-y-8">
                // 通知提示框
                {move || notification.get().map(|(msg, is_err)| view! {
                    <div class="toast toast-top toast-end z-50">
                        <div class=if is_err { "alert alert-error shadow-lg" } else { "alert alert-success shadow-lg" }>
                            <span>{msg}</span>
                        </div>
                    </div>
                })}

                <div class="navbar bg-base-100 rounded-box shadow-xl">
                    <div class="flex-1 gap-2">
                        <a class="btn btn-ghost text-xl">"OnlyTrack"</a>
                        <span class="badge badge-neutral hidden md:inline-flex">{user_name}</span>
                    </div>
                    <div class="flex-none gap-2">
                        <button on:click=on_logout class="btn btn-outline btn-error gap-2">
                            <LogOut attr:class="h-4 w-4" /> "Déconnexion"
                        </button>
                    </div>
                </div>

                <div class="card bg-base-100 shadow-xl">
                    <div class="card-body p-0">
                        <div class="flex items-center justify-between p-6 pb-2">
                            <div>
                                <h3 class="card-title">"Connexions"</h3>
                                <p class="text-base-content/70 text-sm">
                                    "Reliez les comptes TikTok, Instagram et Threads de vos modèles."
                                </p>
                            </div>
                            <button on:click=move |_| load() disabled=move || loading.get() class="btn btn-ghost btn-circle">
                                <RefreshCw attr:class=move || if loading.get() { "h-5 w-5 animate-spin" } else { "h-5 w-5" } />
                            </button>
                        </div>

                        <div class="overflow-x-auto w-full">
                            <table class="table table-zebra w-full">
                                <thead>
                                    <tr>
                                        <th>"Modèle"</th>
                                        {Platform::ALL.iter().map(|p| view! { <th>{p.display_name()}</th> }).collect_view()}
                                    </tr>
                                </thead>
                                <tbody>
                                    <Show when=move || models.with(|m| m.is_empty()) && !loading.get()>
                                        <tr>
                                            <td colspan="4" class="text-center py-8 text-base-content/50">
                                                "Aucun modèle pour le moment."
                                            </td>
                                        </tr>
                                    </Show>
                                    <For
                                        each=move || models.get()
                                        key=|m| m.id.clone()
                                        children=move |model| {
                                            let cells = Platform::ALL.into_iter().map(|platform| {
                                                let id = model.id.clone();
                                                let key = (id.clone(), platform);
                                                let badge = Memo::new(move |_| statuses.with(|map| status_badge(map.get(&key).copied())));
                                                view! {
                                                    <td>
                                                        <div class="flex items-center gap-2">
                                                            <span class=move || badge.get().0>{move || badge.get().1}</span>
                                                            <button
                                                                class="btn btn-ghost btn-xs"
                                                                on:click=move |_| target.set(Some(ConnectTarget {
                                                                    platform,
                                                                    model_id: Some(id.clone()),
                                                                }))
                                                            >
                                                                <Link2 attr:class="h-3 w-3" /> "Connecter"
                                                            </button>
                                                        </div>
                                                    </td>
                                                }
                                            }).collect_view();
                                            view! {
                                                <tr>
                                                    <td>
                                                        <div class="font-bold">{model.nom.clone()}</div>
                                                        <div class="text-sm opacity-50">{model.handle().to_string()}</div>
                                                    </td>
                                                    {cells}
                                                </tr>
                                            }
                                        }
                                    />
                                </tbody>
                            </table>
                        </div>
                    </div>
                </div>
            </div>

            <ConnectDialog
                target=target
                on_close=move |_: ()| target.set(None)
                on_notify=move |notice: (String, bool)| set_notification.set(Some(notice))
            />
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_badge() {
        assert_eq!(status_badge(None).1, "...");
        let ok = ConnectionStatus { connected: true, valid: true };
        assert_eq!(status_badge(Some(ok)).1, "Connecté");
        let expired = ConnectionStatus { connected: true, valid: false };
        assert_eq!(status_badge(Some(expired)).1, "Expiré");
        assert_eq!(status_badge(Some(ConnectionStatus::default())).1, "Non connecté");
    }
}

use crate::auth::{login, use_auth};
use crate::components::icons::ShieldCheck;
use leptos::prelude::*;
use leptos::task::spawn_local;

#[component]
pub fn LoginPage() -> impl IntoView {
    let auth = use_auth();

    let (email, set_email) = signal(auth.state.get_untracked().remembered_email);
    let (password, set_password) = signal(String::new());
    let (is_submitting, set_is_submitting) = signal(false);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);

    // 登录成功后的跳转由路由服务的认证监听处理
    let on_submit = move |ev: leptos::web_sys::SubmitEvent| {
        ev.prevent_default();
        if email.get().trim().is_empty() || password.get().is_empty() {
            set_error_msg.set(Some("Veuillez remplir tous les champs".to_string()));
            return;
        }

        set_is_submitting.set(true);
        set_error_msg.set(None);

        spawn_local(async move {
            if let Err(e) = login(&auth, email.get_untracked().trim().to_string(), password.get_untracked()).await {
                set_error_msg.set(Some(e));
                set_password.set(String::new());
            }
            set_is_submitting.set(false);
        });
    };

    view! {
        <Show when=move || !auth.state.get().is_loading fallback=|| view! { <div class="flex items-center justify-center min-h-screen"><span class="loading loading-spinner loading-lg text-primary"></span></div> }>
            <div class="hero min-h-screen bg-base-200">
                <div class="hero-content flex-col w-full max-w-md">
                    <div class="text-center mb-4">
                        <div class="flex flex-col items-center gap-2">
                            <div class="p-3 bg-primary/10 rounded-2xl text-primary">
                                <ShieldCheck attr:class="h-8 w-8" />
                            </div>
                            <h1 class="text-3xl font-bold">"OnlyTrack"</h1>
                            <p class="text-base-content/70">"Connectez-vous à votre agence"</p>
                        </div>
                    </div>

                    <div class="card shrink-0 w-full shadow-2xl bg-base-100">
                        <form class="card-body" on:submit=on_submit>
                            {move || error_msg.get().map(|msg| view! {
                                <div role="alert" class="alert alert-error text-sm py-2">
                                    <span>{msg}</span>
                                </div>
                            })}

                            <div class="form-control">
                                <label class="label" for="email">
                                    <span class="label-text">"Email"</span>
                                </label>
                                <input
                                    id="email"
                                    type="email"
                                    autocomplete="username"
                                    placeholder="vous@agence.fr"
                                    on:input=move |ev| set_email.set(event_target_value(&ev))
                                    prop:value=email
                                    class="input input-bordered"
                                    required
                                />
                            </div>
                            <div class="form-control">
                                <label class="label" for="password">
                                    <span class="label-text">"Mot de passe"</span>
                                </label>
                                <input
                                    id="password"
                                    type="password"
                                    autocomplete="current-password"
                                    placeholder="••••••••"
                                    on:input=move |ev| set_password.set(event_target_value(&ev))
                                    prop:value=password
                                    class="input input-bordered"
                                    required
                                />
                            </div>
                            <div class="form-control mt-6">
                                <button class="btn btn-primary" disabled=move || is_submitting.get()>
                                    {move || if is_submitting.get() {
                                        view! { <span class="loading loading-spinner"></span> "Connexion..." }.into_any()
                                    } else {
                                        "Se connecter".into_any()
                                    }}
                                </button>
                            </div>
                        </form>
                    </div>
                </div>
            </div>
        </Show>
    }
}

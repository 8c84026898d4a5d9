//! Snackbar host: shows the current notification with a close button.

use leptos::*;

use crate::models::Severity;
use crate::state::Snackbar;

#[component]
pub fn SnackbarHost(
    #[prop(into)]
    snackbar: Signal<Snackbar>,
    on_close: Callback<()>,
) -> impl IntoView {
    view! {
        {move || {
            let s = snackbar.get();
            if !s.open {
                return view! {}.into_view();
            }
            let (icon, class) = match s.severity {
                Some(severity) => {
                    let icon = if severity == Severity::Success { "✓" } else { "✕" };
                    (icon, format!("snackbar snackbar-{}", severity.as_str()))
                }
                None => ("•", "snackbar".to_string()),
            };
            view! {
                <div class=class role="alert">
                    <span class="snackbar-icon">{icon}</span>
                    <span class="snackbar-message">{s.message}</span>
                    <button
                        type="button"
                        class="snackbar-close"
                        aria-label="Close"
                        on:click=move |_| on_close.call(())
                    >
                        "×"
                    </button>
                </div>
            }.into_view()
        }}
    }
}

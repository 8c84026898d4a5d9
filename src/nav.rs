use leptos::*;
use leptos_router::*;

#[component]
pub fn Navbar() -> impl IntoView {
    view! {
        <nav class="navbar">
            <A href="/home" class="nav-link" active_class="active">"Home"</A>
            <A href="/leads" class="nav-link" active_class="active">"Leads"</A>
        </nav>
    }
}

use leptos::*;
use leptos_router::*;

use crate::api::connect_store;
use crate::leads::LeadsPage;
use crate::nav::Navbar;

#[component]
pub fn App() -> impl IntoView {
    provide_context(connect_store());

    view! {
        <Router>
            <main class="app-container">
                <Routes>
                    <Route path="/" view=LeadsPage />
                    <Route path="/leads" view=LeadsPage />
                    <Route path="/home" view=HomePage />
                </Routes>
            </main>
        </Router>
    }
}

#[component]
fn HomePage() -> impl IntoView {
    view! {
        <div class="container">
            <h1>"Home"</h1>
            <Navbar/>
            <div style="margin-top: 16px;">
                <A href="/leads" class="btn btn-contained">"Leads"</A>
            </div>
        </div>
    }
}

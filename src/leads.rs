use chrono::Local;
use gloo_timers::future::sleep;
use leptos::*;
use leptos_router::*;
use std::time::Duration;

use crate::api::SharedStore;
use crate::models::{parse_local_input, table_rows, to_local_input, LeadField, COLUMNS};
use crate::nav::Navbar;
use crate::snackbar::SnackbarHost;
use crate::state::{load_leads, submit_lead, LeadsCell, LeadsSelectors, LeadsState};

const AUTO_HIDE: Duration = Duration::from_millis(6000);

#[component]
pub fn LeadsPage() -> impl IntoView {
    let store = use_context::<SharedStore>().expect("lead store not provided");
    let state = create_rw_signal(LeadsState::default());
    let selectors = LeadsSelectors::new(state);

    {
        let store = store.clone();
        spawn_local(async move { load_leads(&*store, &state).await });
    }

    // One timer per message; expire_notification ignores timers that lost to a newer message
    let open_serial = create_memo(move |_| selectors.snackbar.with(|s| s.open.then_some(s.serial)));
    create_effect(move |_| {
        if let Some(serial) = open_serial.get() {
            spawn_local(async move {
                sleep(AUTO_HIDE).await;
                state.with_state(|s| s.expire_notification(serial));
            });
        }
    });

    let store = store_value(store);
    let on_submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        let store = store.get_value();
        spawn_local(async move { submit_lead(&*store, &state).await });
    };

    let form = move || {
        view! {
            <form class="lead-form" on:submit=on_submit>
                {LeadField::ALL.into_iter().map(|field| view! {
                    <label class="form-field">
                        <span>{field.label()}</span>
                        <input
                            type="text"
                            name=field.key()
                            required=true
                            prop:value=move || state.with(|s| s.form.get(field).to_string())
                            on:input=move |ev| {
                                let input = event_target::<web_sys::HtmlInputElement>(&ev);
                                state.update(|s| s.edit_named(&input.name(), input.value()));
                            }
                        />
                    </label>
                }).collect_view()}

                <label class="form-field">
                    <span>"Appointment"</span>
                    <input
                        type="datetime-local"
                        name="appointment"
                        required=true
                        prop:value=move || state.with(|s| to_local_input(s.form.appointment, &Local))
                        on:input=move |ev| {
                            let appointment = parse_local_input(&event_target_value(&ev), &Local);
                            state.update(|s| s.edit_appointment(appointment));
                        }
                    />
                </label>

                <div class="form-actions">
                    <button type="submit" class="btn btn-contained" disabled=move || selectors.loading.get()>
                        "Add Lead"
                    </button>
                    <button type="button" class="btn btn-outlined" on:click=move |_| state.update(|s| s.hide_form())>
                        "Cancel"
                    </button>
                </div>
            </form>
        }
    };

    let table = move || {
        if selectors.loading.get() {
            return view! { <p class="loading">"Loading leads..."</p> }.into_view();
        }
        let rows = selectors.leads.with(|leads| table_rows(leads, &Local));
        view! {
            <div class="table-container">
                <table class="leads-table">
                    <thead>
                        <tr>{COLUMNS.iter().map(|c| view! { <th>{*c}</th> }).collect_view()}</tr>
                    </thead>
                    <tbody>
                        {rows.into_iter().map(|(id, cells)| view! {
                            <tr data-lead-id=id.to_string()>
                                {cells.into_iter().map(|c| view! { <td>{c}</td> }).collect_view()}
                            </tr>
                        }).collect_view()}
                    </tbody>
                </table>
            </div>
        }.into_view()
    };

    view! {
        <div class="container">
            <h1>"Leads"</h1>
            <Navbar/>

            <button
                type="button"
                class="btn btn-contained"
                style="margin-top: 10px; margin-bottom: 16px;"
                on:click=move |_| state.update(|s| s.show_form())
            >
                "Create Lead"
            </button>

            <Show when=move || selectors.form_visible.get()>
                {form}
            </Show>
            {table}

            <div style="margin-top: 16px;">
                <A href="/home" class="btn btn-contained">"Home Page"</A>
            </div>

            <SnackbarHost
                snackbar=selectors.snackbar
                on_close=Callback::new(move |_| state.update(|s| s.dismiss_notification()))
            />
        </div>
    }
}

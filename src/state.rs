//! Leads view state.
//!
//! `LeadsState` is plain data plus its transitions. The async flows at the
//! bottom drive a `LeadStore` against a `LeadsCell`, which is whatever holds
//! the state: the page's `RwSignal` in the browser, a `RefCell` in tests.
//! Every mutation goes through the cell, so each step re-renders in order.

use std::cell::RefCell;

use chrono::{DateTime, Utc};
use leptos::{create_memo, Memo, RwSignal, SignalUpdate, SignalWith};

use crate::api::LeadStore;
use crate::error::{LeadsError, StoreError};
use crate::models::{Lead, LeadField, LeadForm, Severity};

pub const ADDED_MESSAGE: &str = "Lead added successfully!";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snackbar {
    pub open: bool,
    pub message: String,
    pub severity: Option<Severity>,
    /// Bumped by every new message, so a stale auto-hide can tell it lost.
    pub serial: u64,
}

impl Snackbar {
    pub fn show(&mut self, message: impl Into<String>, severity: Severity) {
        self.open = true;
        self.message = message.into();
        self.severity = Some(severity);
        self.serial += 1;
    }

    pub fn close(&mut self) {
        self.open = false;
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LeadsState {
    pub form: LeadForm,
    pub form_visible: bool,
    pub leads: Vec<Lead>,
    pub loading: bool,
    pub snackbar: Snackbar,
}

impl LeadsState {
    pub fn begin_load(&mut self) {
        self.loading = true;
    }

    /// Replaces the rows on success; on failure keeps whatever was shown.
    pub fn finish_load(&mut self, result: Result<Vec<Lead>, StoreError>) {
        match result {
            Ok(leads) => self.leads = leads,
            Err(e) => self.fail(LeadsError::FetchFailed(e)),
        }
        self.loading = false;
    }

    pub fn edit_field(&mut self, field: LeadField, value: impl Into<String>) {
        self.form.set(field, value.into());
    }

    /// Edit by input name; names that are not form fields are ignored.
    pub fn edit_named(&mut self, name: &str, value: impl Into<String>) {
        match LeadField::from_key(name) {
            Some(field) => self.edit_field(field, value),
            None => tracing::warn!(field = name, "ignoring edit of unknown lead field"),
        }
    }

    pub fn edit_appointment(&mut self, appointment: Option<DateTime<Utc>>) {
        self.form.appointment = appointment;
    }

    pub fn show_form(&mut self) {
        self.form_visible = true;
    }

    /// Unsaved edits survive hiding.
    pub fn hide_form(&mut self) {
        self.form_visible = false;
    }

    /// Returns the row to insert, or `None` after flagging a missing appointment.
    pub fn prepare_submit(&mut self) -> Option<LeadForm> {
        if self.form.appointment.is_none() {
            self.fail(LeadsError::MissingAppointment);
            return None;
        }
        Some(self.form.clone())
    }

    /// Applies the insert outcome. Returns true when the rows must be reloaded.
    pub fn finish_submit(&mut self, result: Result<(), StoreError>) -> bool {
        match result {
            Ok(()) => {
                self.snackbar.show(ADDED_MESSAGE, Severity::Success);
                self.form = LeadForm::default();
                self.form_visible = false;
                true
            }
            Err(e) => {
                self.fail(LeadsError::InsertFailed(e));
                false
            }
        }
    }

    pub fn dismiss_notification(&mut self) {
        self.snackbar.close();
    }

    /// Auto-hide for the message numbered `serial`; newer messages stay open.
    pub fn expire_notification(&mut self, serial: u64) {
        if self.snackbar.serial == serial {
            self.snackbar.close();
        }
    }

    fn fail(&mut self, err: LeadsError) {
        match &err {
            LeadsError::MissingAppointment => tracing::warn!("{}", err),
            LeadsError::FetchFailed(cause) | LeadsError::InsertFailed(cause) => {
                tracing::error!(error = %cause, "{}", err)
            }
        }
        self.snackbar.show(err.to_string(), Severity::Error);
    }
}

/// Holder of a `LeadsState`. `None` means the view is gone.
pub trait LeadsCell {
    fn with_state<R>(&self, f: impl FnOnce(&mut LeadsState) -> R) -> Option<R>;
}

impl LeadsCell for RwSignal<LeadsState> {
    fn with_state<R>(&self, f: impl FnOnce(&mut LeadsState) -> R) -> Option<R> {
        self.try_update(f)
    }
}

impl LeadsCell for RefCell<LeadsState> {
    fn with_state<R>(&self, f: impl FnOnce(&mut LeadsState) -> R) -> Option<R> {
        Some(f(&mut *self.borrow_mut()))
    }
}

/// Narrow reads of the page state. Each memo only notifies when its own
/// slice changes, so typing into the form rebuilds neither form nor table.
#[derive(Clone, Copy)]
pub struct LeadsSelectors {
    pub form_visible: Memo<bool>,
    pub loading: Memo<bool>,
    pub leads: Memo<Vec<Lead>>,
    pub snackbar: Memo<Snackbar>,
}

impl LeadsSelectors {
    pub fn new(state: RwSignal<LeadsState>) -> Self {
        Self {
            form_visible: create_memo(move |_| state.with(|s| s.form_visible)),
            loading: create_memo(move |_| state.with(|s| s.loading)),
            leads: create_memo(move |_| state.with(|s| s.leads.clone())),
            snackbar: create_memo(move |_| state.with(|s| s.snackbar.clone())),
        }
    }
}

/// Fetches every row into the view. Overlapping loads are not cancelled;
/// whichever answers last wins.
pub async fn load_leads<S, C>(store: &S, cell: &C)
where
    S: LeadStore + ?Sized,
    C: LeadsCell,
{
    if cell.with_state(LeadsState::begin_load).is_none() {
        return;
    }
    let result = store.fetch_all().await;
    if cell.with_state(|s| s.finish_load(result)).is_none() {
        tracing::debug!("leads view dropped before fetch returned");
    }
}

/// Validates, inserts the form as a new row, then reloads everything.
pub async fn submit_lead<S, C>(store: &S, cell: &C)
where
    S: LeadStore + ?Sized,
    C: LeadsCell,
{
    let Some(Some(lead)) = cell.with_state(LeadsState::prepare_submit) else {
        return;
    };
    let result = store.insert_one(&lead).await;
    if cell.with_state(|s| s.finish_submit(result)) == Some(true) {
        load_leads(store, cell).await;
    }
}

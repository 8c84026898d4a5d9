use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

pub const LEADS_TABLE: &str = "leads";

/// Table header, in column order.
pub const COLUMNS: [&str; 6] = ["Contact", "Field", "Name", "Address", "Doc Type", "Appointment"];

// Server-assigned key: bigint identity or uuid depending on how the table was created
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum LeadId {
    Int(i64),
    Text(String),
    Other(Value),
}

impl Default for LeadId {
    fn default() -> Self {
        LeadId::Other(Value::Null)
    }
}

impl fmt::Display for LeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeadId::Int(id) => write!(f, "{}", id),
            LeadId::Text(id) => f.write_str(id),
            LeadId::Other(v) => write!(f, "{}", v),
        }
    }
}

/// Stored appointment. Values that do not read as a timestamp are kept
/// verbatim so one odd row never sinks the whole table.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Appointment {
    At(DateTime<Utc>),
    Unparsed(String),
}

impl Appointment {
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Appointment::At(ts) => Some(*ts),
            Appointment::Unparsed(_) => None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Lead {
    #[serde(default)]
    pub id: LeadId,
    #[serde(default, deserialize_with = "nullable_text")]
    pub contact: String,
    #[serde(default, deserialize_with = "nullable_text")]
    pub field: String,
    #[serde(default, deserialize_with = "nullable_text")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable_text")]
    pub address: String,
    #[serde(rename = "docType", default, deserialize_with = "nullable_text")]
    pub doc_type: String,
    #[serde(default, deserialize_with = "lenient_appointment")]
    pub appointment: Option<Appointment>,
}

impl Lead {
    /// Display cells in `COLUMNS` order, appointment rendered in `tz`.
    pub fn cells<Tz: TimeZone>(&self, tz: &Tz) -> [String; 6]
    where
        Tz::Offset: fmt::Display,
    {
        [
            self.contact.clone(),
            self.field.clone(),
            self.name.clone(),
            self.address.clone(),
            self.doc_type.clone(),
            match &self.appointment {
                Some(Appointment::Unparsed(_)) => INVALID_DATE.to_string(),
                other => format_appointment(other.as_ref().and_then(Appointment::timestamp), tz),
            },
        ]
    }
}

/// Rows of the leads table, in the order the store returned them.
pub fn table_rows<Tz: TimeZone>(leads: &[Lead], tz: &Tz) -> Vec<(LeadId, [String; 6])>
where
    Tz::Offset: fmt::Display,
{
    leads.iter().map(|l| (l.id.clone(), l.cells(tz))).collect()
}

/// The in-progress "Create Lead" form. Serializes as the insert payload.
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct LeadForm {
    pub contact: String,
    pub field: String,
    pub name: String,
    pub address: String,
    #[serde(rename = "docType")]
    pub doc_type: String,
    pub appointment: Option<DateTime<Utc>>,
}

impl LeadForm {
    pub fn get(&self, field: LeadField) -> &str {
        match field {
            LeadField::Contact => &self.contact,
            LeadField::Field => &self.field,
            LeadField::Name => &self.name,
            LeadField::Address => &self.address,
            LeadField::DocType => &self.doc_type,
        }
    }

    pub fn set(&mut self, field: LeadField, value: String) {
        let slot = match field {
            LeadField::Contact => &mut self.contact,
            LeadField::Field => &mut self.field,
            LeadField::Name => &mut self.name,
            LeadField::Address => &mut self.address,
            LeadField::DocType => &mut self.doc_type,
        };
        *slot = value;
    }
}

/// Text inputs of the form, in display order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LeadField {
    Contact,
    Field,
    Name,
    Address,
    DocType,
}

impl LeadField {
    pub const ALL: [LeadField; 5] = [
        LeadField::Contact,
        LeadField::Field,
        LeadField::Name,
        LeadField::Address,
        LeadField::DocType,
    ];

    /// Column name in the `leads` table, also used as the input's `name`.
    pub fn key(self) -> &'static str {
        match self {
            LeadField::Contact => "contact",
            LeadField::Field => "field",
            LeadField::Name => "name",
            LeadField::Address => "address",
            LeadField::DocType => "docType",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LeadField::Contact => "Contact",
            LeadField::Field => "Field",
            LeadField::Name => "Name",
            LeadField::Address => "Address",
            LeadField::DocType => "DocType",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Error => "error",
        }
    }
}

pub fn format_appointment<Tz: TimeZone>(appointment: Option<DateTime<Utc>>, tz: &Tz) -> String
where
    Tz::Offset: fmt::Display,
{
    match appointment {
        Some(ts) => ts.with_timezone(tz).format("%-m/%-d/%Y, %-I:%M:%S %p").to_string(),
        None => "N/A".to_string(),
    }
}

const INVALID_DATE: &str = "Invalid Date";

const INPUT_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Parses the value of a `datetime-local` input, read as wall-clock time in `tz`.
/// An empty or unparsable value clears the appointment.
pub fn parse_local_input<Tz: TimeZone>(value: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let naive = INPUT_FORMATS
        .iter()
        .find_map(|pattern| NaiveDateTime::parse_from_str(value, pattern).ok())?;
    // DST gaps have no local mapping; folds take the earlier instant.
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Inverse of `parse_local_input`, for driving the input's value.
pub fn to_local_input<Tz: TimeZone>(appointment: Option<DateTime<Utc>>, tz: &Tz) -> String
where
    Tz::Offset: fmt::Display,
{
    appointment
        .map(|ts| {
            let local = ts.with_timezone(tz);
            let pattern = if local.second() == 0 { "%Y-%m-%dT%H:%M" } else { "%Y-%m-%dT%H:%M:%S" };
            local.format(pattern).to_string()
        })
        .unwrap_or_default()
}

// Any JSON cell renders as text; booleans render as nothing
fn nullable_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null | Value::Bool(_) => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

// timestamptz arrives with an offset, timestamp without one and date as a bare
// day (both taken as UTC); numbers are epoch millis. Empty, zero and false mean unset.
fn lenient_appointment<'de, D>(deserializer: D) -> Result<Option<Appointment>, D::Error>
where
    D: Deserializer<'de>,
{
    let appointment = match Value::deserialize(deserializer)? {
        Value::Null | Value::Bool(false) => None,
        Value::String(raw) if raw.trim().is_empty() => None,
        Value::String(raw) => Some(parse_stored_timestamp(&raw).map_or(Appointment::Unparsed(raw), Appointment::At)),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Number(n) => Some(
            n.as_i64()
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .map_or_else(|| Appointment::Unparsed(n.to_string()), Appointment::At),
        ),
        other => Some(Appointment::Unparsed(other.to_string())),
    };
    if let Some(Appointment::Unparsed(raw)) = &appointment {
        tracing::warn!(raw = %raw, "unreadable appointment value");
    }
    Ok(appointment)
}

fn parse_stored_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d").map(|d| d.and_time(Default::default())))
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use serde_json::json;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn null_appointment_renders_na() {
        let lead: Lead = serde_json::from_value(json!({
            "id": 7,
            "contact": "Acme",
            "field": "Sales",
            "name": "Jo",
            "address": "1 Rd",
            "docType": "W9",
            "appointment": null
        }))
        .unwrap();

        let cells = lead.cells(&Utc);
        assert_eq!(cells[4], "W9");
        assert_eq!(cells[5], "N/A");
    }

    #[test]
    fn empty_collection_has_no_rows() {
        assert!(table_rows(&[], &Utc).is_empty());
        assert_eq!(COLUMNS.len(), 6);
    }

    #[test]
    fn accepts_uuid_ids_and_null_text() {
        let lead: Lead = serde_json::from_value(json!({
            "id": "4b0c6f1e-0000-4000-8000-000000000001",
            "contact": null,
            "appointment": "2024-05-01T10:30:00+00:00"
        }))
        .unwrap();

        assert_eq!(lead.id.to_string(), "4b0c6f1e-0000-4000-8000-000000000001");
        assert_eq!(lead.contact, "");
        assert_eq!(lead.doc_type, "");
        assert_eq!(lead.appointment, Some(Appointment::At(at("2024-05-01T10:30:00Z"))));
    }

    #[test]
    fn naive_timestamps_are_utc() {
        let lead: Lead = serde_json::from_value(json!({
            "id": 1,
            "appointment": "2024-05-01T10:30:00.123"
        }))
        .unwrap();
        let ts = lead.appointment.and_then(|a| a.timestamp()).unwrap();
        assert_eq!(ts.format("%H:%M:%S").to_string(), "10:30:00");
    }

    #[test]
    fn odd_rows_load_alongside_good_ones() {
        let leads: Vec<Lead> = serde_json::from_value(json!([
            {"id": 1, "contact": "Acme", "appointment": "2024-05-01T10:30:00+00:00"},
            {"id": 2, "contact": 5551234, "appointment": "2024-05-01"},
            {"id": 3, "name": true, "appointment": "soon"},
            {"id": 4.5, "appointment": 1714559400000i64},
            {"appointment": ""}
        ]))
        .unwrap();

        assert_eq!(leads.len(), 5);
        let rows = table_rows(&leads, &Utc);
        assert_eq!(rows[0].1[5], "5/1/2024, 10:30:00 AM");
        assert_eq!(rows[1].1[0], "5551234");
        assert_eq!(rows[1].1[5], "5/1/2024, 12:00:00 AM");
        assert_eq!(rows[2].1[2], "");
        assert_eq!(rows[2].1[5], "Invalid Date");
        assert_eq!(leads[2].appointment, Some(Appointment::Unparsed("soon".into())));
        assert_eq!(rows[3].0.to_string(), "4.5");
        assert_eq!(rows[3].1[5], "5/1/2024, 10:30:00 AM");
        assert_eq!(rows[4].0.to_string(), "null");
        assert_eq!(rows[4].1[5], "N/A");
    }

    #[test]
    fn form_serializes_with_store_columns() {
        let form = LeadForm {
            contact: "Acme".into(),
            field: "Sales".into(),
            name: "Jo".into(),
            address: "1 Rd".into(),
            doc_type: "W9".into(),
            appointment: Some(at("2024-05-01T10:30:00Z")),
        };
        assert_eq!(
            serde_json::to_value(&form).unwrap(),
            json!({
                "contact": "Acme",
                "field": "Sales",
                "name": "Jo",
                "address": "1 Rd",
                "docType": "W9",
                "appointment": "2024-05-01T10:30:00Z"
            })
        );
    }

    #[test]
    fn field_keys_and_labels() {
        assert_eq!(LeadField::from_key("docType"), Some(LeadField::DocType));
        assert_eq!(LeadField::from_key("appointment"), None);
        assert_eq!(LeadField::DocType.label(), "DocType");

        let mut form = LeadForm::default();
        form.set(LeadField::Address, "1 Rd".into());
        assert_eq!(form.get(LeadField::Address), "1 Rd");
        assert_eq!(form.address, "1 Rd");
    }

    #[test]
    fn appointment_formats_in_local_zone() {
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let ts = Some(at("2024-05-01T22:05:09Z"));
        assert_eq!(format_appointment(ts, &plus_two), "5/2/2024, 12:05:09 AM");
        assert_eq!(format_appointment(ts, &Utc), "5/1/2024, 10:05:09 PM");
    }

    #[test]
    fn datetime_input_round_trip() {
        let minus_five = FixedOffset::west_opt(5 * 3600).unwrap();
        let parsed = parse_local_input("2024-05-01T09:15", &minus_five);
        assert_eq!(parsed, Some(at("2024-05-01T14:15:00Z")));
        assert_eq!(to_local_input(parsed, &minus_five), "2024-05-01T09:15");

        assert_eq!(parse_local_input("", &minus_five), None);
        assert_eq!(parse_local_input("not a date", &minus_five), None);
        assert_eq!(to_local_input(None, &minus_five), "");
    }

    #[test]
    fn datetime_input_keeps_seconds() {
        let minus_five = FixedOffset::west_opt(5 * 3600).unwrap();
        let parsed = parse_local_input("2024-05-01T09:15:42", &minus_five);
        assert_eq!(parsed, Some(at("2024-05-01T14:15:42Z")));
        assert_eq!(to_local_input(parsed, &minus_five), "2024-05-01T09:15:42");
    }
}

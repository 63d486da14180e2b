use chrono::{DateTime, Local, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

use crate::error::ConsoleError;
use crate::model::{AttendanceRecord, AttendanceStatus, Student};

pub trait Clock {
    fn now(&self) -> DateTime<Local>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// What a decoded QR string turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanPayload {
    Structured { id: String },
    Numeric { id: String },
    Unrecognized,
}

impl ScanPayload {
    pub fn identifier(&self) -> Option<&str> {
        match self {
            ScanPayload::Structured { id } | ScanPayload::Numeric { id } => Some(id),
            ScanPayload::Unrecognized => None,
        }
    }
}

/// ID-card QR codes carry `{"id":..,"name":..,"role":..}`; older printed cards
/// carry the bare DNI digits.
pub fn decode_scan_payload(raw: &str) -> ScanPayload {
    let t = raw.trim();
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(t) {
        let id = match map.get("id") {
            Some(serde_json::Value::String(s)) => s.trim().to_string(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };
        if id.is_empty() {
            return ScanPayload::Unrecognized;
        }
        return ScanPayload::Structured { id };
    }
    if !t.is_empty() && t.chars().all(|c| c.is_ascii_digit()) {
        return ScanPayload::Numeric { id: t.to_string() };
    }
    ScanPayload::Unrecognized
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Present,
    Absent,
}

#[derive(Debug, Clone)]
pub struct Resolution<'a> {
    pub student: &'a Student,
    pub presence: Presence,
    /// Only set while the student is present.
    pub open_record: Option<&'a AttendanceRecord>,
}

fn on_day(record: &AttendanceRecord, day: NaiveDate) -> bool {
    record.check_in_time.date_naive() == day
}

/// Latest record for the student on `day`. `max_by_key` keeps the last of
/// equal keys, so a later insertion wins a timestamp tie.
fn latest_on_day(
    records: &[AttendanceRecord],
    student_id: &str,
    day: NaiveDate,
) -> Option<usize> {
    records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.student_id == student_id && on_day(r, day))
        .max_by_key(|(_, r)| r.check_in_time)
        .map(|(idx, _)| idx)
}

fn open_on_day(records: &[AttendanceRecord], student_id: &str, day: NaiveDate) -> Option<usize> {
    records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.student_id == student_id && on_day(r, day) && r.is_open())
        .max_by_key(|(_, r)| r.check_in_time)
        .map(|(idx, _)| idx)
}

pub fn resolve<'a>(
    student_id: &str,
    roster: &'a [Student],
    records: &'a [AttendanceRecord],
    today: NaiveDate,
) -> Result<Resolution<'a>, ConsoleError> {
    let student = roster
        .iter()
        .find(|s| s.id == student_id)
        .ok_or_else(|| ConsoleError::not_found("student", student_id))?;

    let latest = latest_on_day(records, student_id, today).map(|idx| &records[idx]);
    match latest {
        Some(record) if record.is_open() => Ok(Resolution {
            student,
            presence: Presence::Present,
            open_record: Some(record),
        }),
        _ => Ok(Resolution {
            student,
            presence: Presence::Absent,
            open_record: None,
        }),
    }
}

pub fn resolve_scan<'a>(
    raw: &str,
    roster: &'a [Student],
    records: &'a [AttendanceRecord],
    today: NaiveDate,
) -> Result<Resolution<'a>, ConsoleError> {
    let payload = decode_scan_payload(raw);
    let Some(id) = payload.identifier() else {
        return Err(ConsoleError::UnrecognizedFormat);
    };
    resolve(id, roster, records, today)
}

pub fn check_in<'a>(
    records: &'a mut Vec<AttendanceRecord>,
    roster: &[Student],
    student_id: &str,
    now: DateTime<Local>,
) -> Result<&'a AttendanceRecord, ConsoleError> {
    let student = roster
        .iter()
        .find(|s| s.id == student_id)
        .ok_or_else(|| ConsoleError::not_found("student", student_id))?;

    if let Some(idx) = open_on_day(records, student_id, now.date_naive()) {
        return Err(ConsoleError::AlreadyActive {
            student_id: student_id.to_string(),
            record_id: records[idx].id.clone(),
        });
    }

    records.push(AttendanceRecord {
        id: format!("ATT-{}", Uuid::new_v4()),
        student_id: student.id.clone(),
        student_name: student.name.clone(),
        check_in_time: now,
        check_out_time: None,
        status: AttendanceStatus::CheckedIn,
    });
    let idx = records.len() - 1;
    Ok(&records[idx])
}

pub fn check_out<'a>(
    records: &'a mut [AttendanceRecord],
    student_id: &str,
    now: DateTime<Local>,
) -> Result<&'a AttendanceRecord, ConsoleError> {
    let Some(idx) = open_on_day(records, student_id, now.date_naive()) else {
        return Err(ConsoleError::NoActiveSession {
            student_id: student_id.to_string(),
        });
    };
    let record = &mut records[idx];
    record.check_out_time = Some(now.max(record.check_in_time));
    record.status = AttendanceStatus::CheckedOut;
    Ok(record)
}

/// Today's records, newest check-in first. Equal timestamps list the later
/// insertion first: 09:00, 09:05 (a), 09:05 (b) comes out as b, a, 09:00.
/// This is not plain insertion order for ties; keep the reverse before the sort.
pub fn daily_log(records: &[AttendanceRecord], today: NaiveDate) -> Vec<&AttendanceRecord> {
    let mut out: Vec<&AttendanceRecord> = records.iter().filter(|r| on_day(r, today)).collect();
    out.reverse();
    out.sort_by(|a, b| b.check_in_time.cmp(&a.check_in_time));
    out
}

pub fn present_count(records: &[AttendanceRecord], today: NaiveDate) -> usize {
    let mut ids: Vec<&str> = records
        .iter()
        .filter(|r| on_day(r, today) && r.is_open())
        .map(|r| r.student_id.as_str())
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids.len()
}

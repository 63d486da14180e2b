use serde::Serialize;

use crate::model::{Role, Student, Teacher};

pub const SCHOOL_NAME: &str = "COLEGIOS MONSERRAT";
pub const SCHOOL_LEVELS: &str = "INICIAL, PRIMARIA, SECUNDARIA";

/// Everything the UI needs to lay out and rasterize one card.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDocument {
    pub id: String,
    pub id_digits: String,
    pub name: String,
    pub name_label: &'static str,
    pub role: Role,
    pub detail: String,
    pub level: Option<&'static str>,
    pub school_name: &'static str,
    pub school_levels: &'static str,
    pub logo_image_url: Option<String>,
    pub profile_picture_url: Option<String>,
    pub qr_payload: String,
    pub file_name: String,
}

#[derive(Serialize)]
struct QrPayload<'a> {
    id: &'a str,
    name: &'a str,
    role: Role,
}

pub fn qr_payload(id: &str, name: &str, role: Role) -> String {
    serde_json::to_string(&QrPayload { id, name, role }).unwrap_or_else(|_| id.to_string())
}

pub fn card_file_name(id: &str) -> String {
    format!("carnet-{}.png", id)
}

/// Grades up to 6 are primary school; anything else, including grades with
/// no digits, is secondary.
pub fn level_for_grade(grade: &str) -> &'static str {
    let digits: String = grade.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.parse::<u32>() {
        Ok(n) if n <= 6 => "Primaria",
        _ => "Secundaria",
    }
}

fn build(
    id: &str,
    name: &str,
    role: Role,
    detail: &str,
    logo: Option<&str>,
    photo: Option<&str>,
) -> CardDocument {
    CardDocument {
        id: id.to_string(),
        id_digits: id.chars().filter(|c| c.is_ascii_digit()).collect(),
        name: name.to_string(),
        name_label: match role {
            Role::Student => "Nombre completo del alumno:",
            Role::Teacher => "Nombre completo del docente:",
        },
        role,
        detail: detail.to_string(),
        level: match role {
            Role::Student => Some(level_for_grade(detail)),
            Role::Teacher => None,
        },
        school_name: SCHOOL_NAME,
        school_levels: SCHOOL_LEVELS,
        logo_image_url: logo.map(str::to_string),
        profile_picture_url: photo.map(str::to_string),
        qr_payload: qr_payload(id, name, role),
        file_name: card_file_name(id),
    }
}

pub fn student_card(student: &Student, logo: Option<&str>) -> CardDocument {
    build(
        &student.id,
        &student.name,
        Role::Student,
        &student.grade,
        logo,
        student.profile_picture_url.as_deref(),
    )
}

pub fn teacher_card(teacher: &Teacher, logo: Option<&str>) -> CardDocument {
    build(
        &teacher.id,
        &teacher.name,
        Role::Teacher,
        &teacher.subject,
        logo,
        teacher.profile_picture_url.as_deref(),
    )
}

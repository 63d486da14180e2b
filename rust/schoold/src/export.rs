use anyhow::Context;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::model::{Course, Student};
use crate::store::School;

pub const SNAPSHOT_FILE_NAME: &str = "datos_escolares.json";
pub const STUDENTS_CSV_FILE_NAME: &str = "lista_estudiantes.csv";
const MANIFEST_ENTRY: &str = "manifest.json";
pub const BUNDLE_FORMAT_V1: &str = "school-console-export-v1";

const CSV_HEADERS: [&str; 6] = [
    "DNI",
    "Nombre",
    "Edad",
    "Grado",
    "Cursos Inscritos",
    "Historial de Cursos Completados",
];
const NONE_LABEL: &str = "Ninguno";

pub fn snapshot(school: &School) -> serde_json::Value {
    json!({
        "students": school.students(),
        "courses": school.courses(),
        "teachers": school.teachers(),
    })
}

pub fn snapshot_text(school: &School) -> anyhow::Result<String> {
    serde_json::to_string_pretty(&snapshot(school)).context("failed to serialize snapshot")
}

fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn enrolled_names(student: &Student, courses: &[Course]) -> String {
    let names: Vec<&str> = student
        .course_ids
        .iter()
        .filter_map(|id| courses.iter().find(|c| &c.id == id))
        .map(|c| c.name.as_str())
        .collect();
    if names.is_empty() {
        NONE_LABEL.to_string()
    } else {
        names.join("; ")
    }
}

fn history_labels(student: &Student) -> String {
    if student.course_history.is_empty() {
        return NONE_LABEL.to_string();
    }
    student
        .course_history
        .iter()
        .map(|c| format!("{} ({})", c.name, c.teacher))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Spreadsheet-friendly roster: BOM-prefixed UTF-8, `\n` line endings.
pub fn students_csv(students: &[&Student], courses: &[Course]) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(students.len() + 1);
    lines.push(CSV_HEADERS.join(","));
    for s in students {
        let cells = [
            s.id.clone(),
            s.name.clone(),
            s.age.to_string(),
            s.grade.clone(),
            enrolled_names(s, courses),
            history_labels(s),
        ];
        lines.push(
            cells
                .iter()
                .map(|c| csv_quote(c))
                .collect::<Vec<_>>()
                .join(","),
        );
    }
    format!("\u{FEFF}{}", lines.join("\n"))
}

#[derive(Debug, Clone)]
pub struct BundleSummary {
    pub bundle_format: String,
    pub entry_count: usize,
    pub student_rows: usize,
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Writes the JSON snapshot and the student CSV into one zip, with a manifest
/// carrying a SHA-256 per entry. `entry_count` includes the manifest.
pub fn write_bundle(
    school: &School,
    search: &str,
    out_path: &Path,
) -> anyhow::Result<BundleSummary> {
    let students = school.search_students(search);
    let snapshot = snapshot_text(school)?;
    let csv = students_csv(&students, school.courses());

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }
    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let exported_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let entries = [
        (SNAPSHOT_FILE_NAME, snapshot.as_bytes()),
        (STUDENTS_CSV_FILE_NAME, csv.as_bytes()),
    ];
    let manifest = json!({
        "format": BUNDLE_FORMAT_V1,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportedAt": exported_at,
        "entries": entries
            .iter()
            .map(|(name, bytes)| json!({
                "name": name,
                "bytes": bytes.len(),
                "sha256": sha256_hex(bytes),
            }))
            .collect::<Vec<_>>(),
    });

    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    for (name, bytes) in entries {
        zip.start_file(name, opts)
            .with_context(|| format!("failed to start {} entry", name))?;
        zip.write_all(bytes)
            .with_context(|| format!("failed to write {} entry", name))?;
    }
    zip.finish().context("failed to finalize zip bundle")?;

    Ok(BundleSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        entry_count: entries.len() + 1,
        student_rows: students.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::NewStudent;

    #[test]
    fn csv_quotes_separators_and_doubles_quotes() {
        let mut school = School::seeded();
        school.add_student(NewStudent {
            id: "11".to_string(),
            name: "Pérez, Juan \"Juancho\"".to_string(),
            age: 12,
            grade: "6º".to_string(),
        });
        let students: Vec<&Student> = school.students().iter().collect();
        let csv = students_csv(&students, school.courses());

        assert!(csv.starts_with('\u{FEFF}'));
        let lines: Vec<&str> = csv.trim_start_matches('\u{FEFF}').split('\n').collect();
        assert_eq!(
            lines[0],
            "DNI,Nombre,Edad,Grado,Cursos Inscritos,Historial de Cursos Completados"
        );
        assert_eq!(lines.len(), 5);
        assert_eq!(
            lines[4],
            "11,\"Pérez, Juan \"\"Juancho\"\"\",12,6º,Ninguno,Ninguno"
        );
    }

    #[test]
    fn csv_joins_enrolled_names_and_history() {
        let school = School::seeded();
        let luis: Vec<&Student> = school.search_students("Luis");
        let csv = students_csv(&luis, school.courses());
        let row = csv.split('\n').nth(1).expect("row");
        assert_eq!(
            row,
            "78123456,Luis Fernández,16,11º,Matemáticas Avanzadas; Física I,Literatura Española (Sra. Vega)"
        );
    }

    #[test]
    fn csv_skips_unknown_course_ids() {
        let mut school = School::seeded();
        school
            .assign_courses("78789012", vec!["C404".to_string()])
            .expect("assign");
        let elena = school.search_students("Elena");
        let csv = students_csv(&elena, school.courses());
        assert!(csv.ends_with(",Ninguno,Ninguno"));
    }

    #[test]
    fn snapshot_carries_the_three_collections() {
        let school = School::seeded();
        let v = snapshot(&school);
        assert_eq!(v["students"].as_array().map(|a| a.len()), Some(3));
        assert_eq!(v["courses"][0]["id"], "C01");
        assert_eq!(v["teachers"][2]["subject"], "Física");
        assert_eq!(v["students"][0]["courseHistory"][1]["teacher"], "Sra. Rios");
        assert!(v.get("attendance").is_none());
    }
}

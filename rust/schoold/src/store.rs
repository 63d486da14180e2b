use chrono::{DateTime, Local, NaiveDate};
use uuid::Uuid;

use crate::attendance::{self, Resolution};
use crate::error::ConsoleError;
use crate::model::{AttendanceRecord, Course, Notification, Student, Teacher};

#[derive(Debug, Clone)]
pub struct NewStudent {
    pub id: String,
    pub name: String,
    pub age: u32,
    pub grade: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub students: usize,
    pub teachers: usize,
    pub courses: usize,
    pub unread_notifications: usize,
}

/// All console state for one session. Collections are only changed through
/// the methods below.
#[derive(Debug, Default)]
pub struct School {
    students: Vec<Student>,
    teachers: Vec<Teacher>,
    courses: Vec<Course>,
    notifications: Vec<Notification>,
    attendance: Vec<AttendanceRecord>,
    logo_image_url: Option<String>,
}

fn generated_id(prefix: &str) -> String {
    format!("{}{}", prefix, Uuid::new_v4().simple())
}

fn course(id: &str, name: &str, teacher: &str) -> Course {
    Course {
        id: id.to_string(),
        name: name.to_string(),
        teacher: teacher.to_string(),
    }
}

impl School {
    /// The demo roster the console starts with.
    pub fn seeded() -> Self {
        let student = |id: &str, name: &str, age: u32, grade: &str, courses: &[&str]| Student {
            id: id.to_string(),
            name: name.to_string(),
            age,
            grade: grade.to_string(),
            course_ids: courses.iter().map(|c| c.to_string()).collect(),
            course_history: Vec::new(),
            profile_picture_url: None,
        };
        let teacher = |id: &str, name: &str, subject: &str| Teacher {
            id: id.to_string(),
            name: name.to_string(),
            subject: subject.to_string(),
            profile_picture_url: None,
        };
        let notification = |id: &str, title: &str, message: &str, date: &str, read: bool| {
            Notification {
                id: id.to_string(),
                title: title.to_string(),
                message: message.to_string(),
                date: date.to_string(),
                read,
            }
        };

        let mut ana = student("78945612", "Ana García", 15, "10º", &["C01"]);
        ana.course_history = vec![
            course("CH01", "Introducción a la Programación", "Sr. Salas"),
            course("CH02", "Química General", "Sra. Rios"),
        ];
        let mut luis = student("78123456", "Luis Fernández", 16, "11º", &["C01", "C03"]);
        luis.course_history = vec![course("CH03", "Literatura Española", "Sra. Vega")];
        let elena = student("78789012", "Elena Rodríguez", 14, "9º", &["C02"]);

        School {
            students: vec![ana, luis, elena],
            teachers: vec![
                teacher("T01", "Ricardo Pérez", "Matemáticas"),
                teacher("T02", "Laura Gómez", "Historia"),
                teacher("T03", "Carlos Morales", "Física"),
            ],
            courses: vec![
                course("C01", "Matemáticas Avanzadas", "Ricardo Pérez"),
                course("C02", "Historia Mundial", "Laura Gómez"),
                course("C03", "Física I", "Carlos Morales"),
            ],
            notifications: vec![
                notification(
                    "N001",
                    "Entrega de Proyecto de Ciencias",
                    "El proyecto de la feria de ciencias debe entregarse el viernes.",
                    "2024-08-15",
                    false,
                ),
                notification(
                    "N002",
                    "Reunión de Padres y Profesores",
                    "La reunión trimestral será el próximo lunes a las 6 PM.",
                    "2024-08-19",
                    false,
                ),
                notification(
                    "N003",
                    "Día de Fotografía Escolar",
                    "Recuerda sonreír para las fotos escolares mañana en el gimnasio.",
                    "2024-08-12",
                    true,
                ),
            ],
            attendance: Vec::new(),
            logo_image_url: None,
        }
    }

    pub fn summary(&self) -> Summary {
        Summary {
            students: self.students.len(),
            teachers: self.teachers.len(),
            courses: self.courses.len(),
            unread_notifications: self.unread_count(),
        }
    }

    // Students

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn student(&self, id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    /// Case-insensitive substring match over name and grade.
    pub fn search_students(&self, term: &str) -> Vec<&Student> {
        let needle = term.trim().to_lowercase();
        self.students
            .iter()
            .filter(|s| {
                needle.is_empty()
                    || s.name.to_lowercase().contains(&needle)
                    || s.grade.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn add_student(&mut self, new: NewStudent) -> &Student {
        self.students.push(Student {
            id: new.id,
            name: new.name,
            age: new.age,
            grade: new.grade,
            course_ids: Vec::new(),
            course_history: Vec::new(),
            profile_picture_url: None,
        });
        let idx = self.students.len() - 1;
        &self.students[idx]
    }

    /// Attendance history of the student is kept.
    pub fn delete_student(&mut self, id: &str) -> Result<Student, ConsoleError> {
        let idx = self
            .students
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| ConsoleError::not_found("student", id))?;
        Ok(self.students.remove(idx))
    }

    pub fn set_student_picture(&mut self, id: &str, url: Option<String>) -> Result<(), ConsoleError> {
        let student = self.student_mut(id)?;
        student.profile_picture_url = url;
        Ok(())
    }

    /// Replaces the enrollment list.
    pub fn assign_courses(
        &mut self,
        id: &str,
        course_ids: Vec<String>,
    ) -> Result<&Student, ConsoleError> {
        let mut ids: Vec<String> = Vec::with_capacity(course_ids.len());
        for cid in course_ids {
            if !ids.contains(&cid) {
                ids.push(cid);
            }
        }
        let student = self.student_mut(id)?;
        student.course_ids = ids;
        Ok(student)
    }

    /// Copies the live course into the student's history. Returns `false`
    /// when the history already has that course id.
    pub fn add_course_to_history(
        &mut self,
        student_id: &str,
        course_id: &str,
    ) -> Result<bool, ConsoleError> {
        let snapshot = self
            .courses
            .iter()
            .find(|c| c.id == course_id)
            .cloned()
            .ok_or_else(|| ConsoleError::not_found("course", course_id))?;
        let student = self.student_mut(student_id)?;
        if student.course_history.iter().any(|c| c.id == course_id) {
            return Ok(false);
        }
        student.course_history.push(snapshot);
        Ok(true)
    }

    fn student_mut(&mut self, id: &str) -> Result<&mut Student, ConsoleError> {
        self.students
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| ConsoleError::not_found("student", id))
    }

    // Teachers

    pub fn teachers(&self) -> &[Teacher] {
        &self.teachers
    }

    pub fn teacher(&self, id: &str) -> Option<&Teacher> {
        self.teachers.iter().find(|t| t.id == id)
    }

    pub fn add_teacher(&mut self, name: String, subject: String) -> &Teacher {
        self.teachers.push(Teacher {
            id: generated_id("T"),
            name,
            subject,
            profile_picture_url: None,
        });
        let idx = self.teachers.len() - 1;
        &self.teachers[idx]
    }

    pub fn update_teacher(
        &mut self,
        id: &str,
        name: String,
        subject: String,
    ) -> Result<&Teacher, ConsoleError> {
        let teacher = self.teacher_mut(id)?;
        teacher.name = name;
        teacher.subject = subject;
        Ok(teacher)
    }

    pub fn delete_teacher(&mut self, id: &str) -> Result<Teacher, ConsoleError> {
        let idx = self
            .teachers
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| ConsoleError::not_found("teacher", id))?;
        Ok(self.teachers.remove(idx))
    }

    pub fn set_teacher_picture(&mut self, id: &str, url: Option<String>) -> Result<(), ConsoleError> {
        let teacher = self.teacher_mut(id)?;
        teacher.profile_picture_url = url;
        Ok(())
    }

    fn teacher_mut(&mut self, id: &str) -> Result<&mut Teacher, ConsoleError> {
        self.teachers
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| ConsoleError::not_found("teacher", id))
    }

    // Courses

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn add_course(&mut self, name: String, teacher: String) -> &Course {
        self.courses.push(Course {
            id: generated_id("C"),
            name,
            teacher,
        });
        let idx = self.courses.len() - 1;
        &self.courses[idx]
    }

    /// Drops the course from every enrollment list. History snapshots stay.
    pub fn delete_course(&mut self, id: &str) -> Result<Course, ConsoleError> {
        let idx = self
            .courses
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| ConsoleError::not_found("course", id))?;
        let removed = self.courses.remove(idx);
        for student in &mut self.students {
            student.course_ids.retain(|cid| cid != id);
        }
        Ok(removed)
    }

    // Notifications

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }

    pub fn mark_notification_read(&mut self, id: &str) -> Result<(), ConsoleError> {
        let n = self
            .notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| ConsoleError::not_found("notification", id))?;
        n.read = true;
        Ok(())
    }

    /// Returns how many notifications changed.
    pub fn mark_all_notifications_read(&mut self) -> usize {
        let mut changed = 0;
        for n in self.notifications.iter_mut().filter(|n| !n.read) {
            n.read = true;
            changed += 1;
        }
        changed
    }

    // Attendance

    pub fn attendance(&self) -> &[AttendanceRecord] {
        &self.attendance
    }

    pub fn resolve_attendance(
        &self,
        student_id: &str,
        today: NaiveDate,
    ) -> Result<Resolution<'_>, ConsoleError> {
        attendance::resolve(student_id, &self.students, &self.attendance, today)
    }

    pub fn resolve_scan(&self, raw: &str, today: NaiveDate) -> Result<Resolution<'_>, ConsoleError> {
        attendance::resolve_scan(raw, &self.students, &self.attendance, today)
    }

    pub fn check_in(
        &mut self,
        student_id: &str,
        now: DateTime<Local>,
    ) -> Result<&AttendanceRecord, ConsoleError> {
        attendance::check_in(&mut self.attendance, &self.students, student_id, now)
    }

    pub fn check_out(
        &mut self,
        student_id: &str,
        now: DateTime<Local>,
    ) -> Result<&AttendanceRecord, ConsoleError> {
        attendance::check_out(&mut self.attendance, student_id, now)
    }

    pub fn daily_log(&self, today: NaiveDate) -> Vec<&AttendanceRecord> {
        attendance::daily_log(&self.attendance, today)
    }

    pub fn present_today(&self, today: NaiveDate) -> usize {
        attendance::present_count(&self.attendance, today)
    }

    // Branding

    pub fn logo_image_url(&self) -> Option<&str> {
        self.logo_image_url.as_deref()
    }

    pub fn set_logo_image_url(&mut self, url: String) {
        self.logo_image_url = Some(url);
    }
}

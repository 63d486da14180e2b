mod test_support;

use serde_json::json;
use test_support::{request_err, request_ok, spawn_sidecar};

#[test]
fn course_delete_drops_enrollment_but_keeps_history() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let history = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "students.addHistory",
        json!({ "studentId": "78123456", "courseId": "C03" }),
    );
    assert_eq!(history["added"], true);
    let again = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.addHistory",
        json!({ "studentId": "78123456", "courseId": "C03" }),
    );
    assert_eq!(again["added"], false);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "courses.delete",
        json!({ "courseId": "C03" }),
    );

    let list = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "students.list",
        json!({ "search": "luis" }),
    );
    let luis = &list["students"][0];
    assert_eq!(luis["courseIds"], json!(["C01"]));
    let names: Vec<&str> = luis["courseHistory"]
        .as_array()
        .expect("history")
        .iter()
        .filter_map(|c| c["name"].as_str())
        .collect();
    assert!(names.contains(&"Física I"));

    let courses = request_ok(&mut stdin, &mut reader, "5", "courses.list", json!({}));
    assert_eq!(courses["courses"].as_array().map(|a| a.len()), Some(2));

    let missing = request_err(
        &mut stdin,
        &mut reader,
        "6",
        "courses.delete",
        json!({ "courseId": "C03" }),
    );
    assert_eq!(missing["code"], "not_found");
}

#[test]
fn students_and_teachers_crud() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "students.create",
        json!({ "id": "70000001", "name": "Sofía Castro", "age": 12, "grade": "6º" }),
    );
    assert_eq!(created["student"]["courseIds"], json!([]));

    let assigned = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.assignCourses",
        json!({ "studentId": "70000001", "courseIds": ["C02", "C01", "C02"] }),
    );
    assert_eq!(assigned["courseIds"], json!(["C02", "C01"]));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.setPhoto",
        json!({ "studentId": "70000001", "url": "data:image/png;base64,AAAA" }),
    );
    let card = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "idcards.build",
        json!({ "role": "student", "personId": "70000001" }),
    );
    assert_eq!(card["card"]["profilePictureUrl"], "data:image/png;base64,AAAA");
    assert_eq!(card["card"]["level"], "Primaria");

    let bad_age = request_err(
        &mut stdin,
        &mut reader,
        "5",
        "students.create",
        json!({ "id": "70000002", "name": "X", "age": "doce", "grade": "6º" }),
    );
    assert_eq!(bad_age["code"], "bad_params");

    let teacher = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "teachers.create",
        json!({ "name": "Marta Díaz", "subject": "Biología" }),
    );
    let tid = teacher["teacher"]["id"].as_str().expect("teacher id").to_string();
    assert!(tid.starts_with('T'));

    let updated = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "teachers.update",
        json!({ "teacherId": tid, "name": "Marta Díaz", "subject": "Química" }),
    );
    assert_eq!(updated["teacher"]["subject"], "Química");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "teachers.delete",
        json!({ "teacherId": tid }),
    );
    let teachers = request_ok(&mut stdin, &mut reader, "9", "teachers.list", json!({}));
    assert_eq!(teachers["teachers"].as_array().map(|a| a.len()), Some(3));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "10",
        "students.delete",
        json!({ "studentId": "70000001" }),
    );
    let gone = request_err(
        &mut stdin,
        &mut reader,
        "11",
        "students.delete",
        json!({ "studentId": "70000001" }),
    );
    assert_eq!(gone["code"], "not_found");
}

#[test]
fn notifications_unread_count_tracks_marks() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let list = request_ok(&mut stdin, &mut reader, "1", "notifications.list", json!({}));
    assert_eq!(list["unreadCount"], 2);

    let one = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "notifications.markRead",
        json!({ "notificationId": "N001" }),
    );
    assert_eq!(one["unreadCount"], 1);

    let all = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "notifications.markAllRead",
        json!({}),
    );
    assert_eq!(all["unreadCount"], 0);

    let summary = request_ok(&mut stdin, &mut reader, "4", "dashboard.summary", json!({}));
    assert_eq!(summary["unreadNotifications"], 0);
    assert_eq!(summary["studentCount"], 3);
    assert_eq!(summary["teacherCount"], 3);
    assert_eq!(summary["courseCount"], 3);
}

use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_gradecalcd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn gradecalcd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn send(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = send(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn request_err(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = send(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(false),
        "{} unexpectedly succeeded: {}",
        method,
        value
    );
    value.get("error").cloned().unwrap_or_else(|| json!({}))
}

#[test]
fn subject_list_edits_and_sgpa() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let s = request_ok(&mut stdin, &mut reader, "1", "session.get", json!({}));
    let subjects = s["subjects"].as_array().expect("subjects");
    assert_eq!(subjects.len(), 1);
    assert_eq!(subjects[0]["credits"], json!(3));
    assert_eq!(subjects[0]["marks"], json!(0));
    assert_eq!(subjects[0]["grade"], json!(null));
    assert_eq!(s["sgpa"], json!(null));
    let first_id = subjects[0]["id"].as_str().expect("id").to_string();

    let e = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "session.subjects.remove",
        json!({ "id": first_id }),
    );
    assert_eq!(e["code"], json!("limit_reached"));

    let upd = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "session.subjects.update",
        json!({ "id": first_id, "name": "Data Structures", "credits": 4, "marks": 85 }),
    );
    assert_eq!(upd["subject"]["grade"]["letter"], json!("A+"));
    assert_eq!(upd["subject"]["grade"]["points"], json!(9));

    let add = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "session.subjects.add",
        json!({ "name": "OS", "credits": 3, "marks": 65 }),
    );
    let second_id = add["subject"]["id"].as_str().expect("id").to_string();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "session.subjects.add",
        json!({ "name": "Maths", "credits": 2, "marks": 92 }),
    );

    let res = request_ok(&mut stdin, &mut reader, "6", "session.sgpa.calculate", json!({}));
    assert_eq!(res["sgpa"], json!(8.11));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "session.subjects.remove",
        json!({ "id": second_id }),
    );
    let e = request_err(
        &mut stdin,
        &mut reader,
        "8",
        "session.subjects.update",
        json!({ "id": "missing", "marks": 10 }),
    );
    assert_eq!(e["code"], json!("not_found"));

    let s = request_ok(&mut stdin, &mut reader, "9", "session.get", json!({}));
    assert_eq!(s["sgpa"]["sgpa"], json!(8.11));
    assert_eq!(s["subjects"].as_array().map(|v| v.len()), Some(2));

    let reset = request_ok(&mut stdin, &mut reader, "10", "session.subjects.reset", json!({}));
    assert_eq!(reset["sgpa"], json!(null));
    assert_eq!(reset["subjects"].as_array().map(|v| v.len()), Some(1));

    // Nothing graded: no result, and nothing stored.
    let none = request_ok(&mut stdin, &mut reader, "11", "session.sgpa.calculate", json!({}));
    assert_eq!(none["sgpa"], json!(null));
    let s = request_ok(&mut stdin, &mut reader, "12", "session.get", json!({}));
    assert_eq!(s["sgpa"], json!(null));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn semester_list_limits_and_cgpa() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let e = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "session.semesters.remove",
        json!({ "semester": 1 }),
    );
    assert_eq!(e["code"], json!("limit_reached"));

    for i in 2..=8 {
        let res = request_ok(
            &mut stdin,
            &mut reader,
            &format!("add-{}", i),
            "session.semesters.add",
            json!({}),
        );
        assert_eq!(res["semester"]["semester"], json!(i));
    }
    let e = request_err(&mut stdin, &mut reader, "add-9", "session.semesters.add", json!({}));
    assert_eq!(e["code"], json!("limit_reached"));

    for (sem, sgpa) in [(1, 8.5), (2, 6.0), (3, 7.8), (4, 8.2)] {
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            &format!("upd-{}", sem),
            "session.semesters.update",
            json!({ "semester": sem, "sgpa": sgpa }),
        );
    }
    let e = request_err(
        &mut stdin,
        &mut reader,
        "upd-bad",
        "session.semesters.update",
        json!({ "semester": 1, "sgpa": 10.5 }),
    );
    assert_eq!(e["code"], json!("bad_params"));

    let res = request_ok(
        &mut stdin,
        &mut reader,
        "rm",
        "session.semesters.remove",
        json!({ "semester": 2 }),
    );
    let semesters = res["semesters"].as_array().expect("semesters");
    assert_eq!(semesters.len(), 7);
    let numbers: Vec<i64> = semesters
        .iter()
        .map(|s| s["semester"].as_i64().expect("semester"))
        .collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(semesters[1]["sgpa"], json!(7.8));

    let cgpa = request_ok(&mut stdin, &mut reader, "calc", "session.cgpa.calculate", json!({}));
    assert_eq!(cgpa["cgpa"], json!(8.17));
    assert_eq!(cgpa["semestersCounted"], json!(3));
    assert_eq!(cgpa["label"], json!("Excellent"));

    let reset = request_ok(&mut stdin, &mut reader, "reset", "session.semesters.reset", json!({}));
    assert_eq!(reset["cgpa"], json!(null));
    assert_eq!(reset["semesters"].as_array().map(|v| v.len()), Some(1));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn student_identity_is_trimmed() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let res = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "session.student.update",
        json!({ "name": "  Asha Rao ", "usn": " 1xy22cs001" }),
    );
    assert_eq!(res["student"]["name"], json!("Asha Rao"));
    assert_eq!(res["student"]["usn"], json!("1XY22CS001"));

    let e = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "session.student.update",
        json!({ "name": 12 }),
    );
    assert_eq!(e["code"], json!("bad_params"));
    drop(stdin);
    let _ = child.wait();
}

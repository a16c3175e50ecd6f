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
fn scale_lists_nine_contiguous_bands() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let res = request_ok(&mut stdin, &mut reader, "1", "grades.scale", json!({}));
    let bands = res["bands"].as_array().expect("bands array");
    assert_eq!(bands.len(), 9);
    assert_eq!(bands[0]["letter"], json!("O"));
    assert_eq!(bands[0]["range"], json!("90-100"));
    assert_eq!(bands[8]["letter"], json!("F"));
    assert_eq!(bands[8]["range"], json!("0-39"));
    assert_eq!(bands[3]["points"], json!(7));
    assert_eq!(bands[3]["description"], json!("Good"));
    assert_eq!(bands[4]["lowerBound"], json!(55));
    for pair in bands.windows(2) {
        let upper_next = pair[1]["upperBound"].as_i64().expect("upper");
        let lower_prev = pair[0]["lowerBound"].as_i64().expect("lower");
        assert_eq!(upper_next + 1, lower_prev);
    }
    drop(stdin);
    let _ = child.wait();
}

#[test]
fn lookup_boundaries_map_to_higher_band() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let cases = [
        (90, "O"),
        (89, "A+"),
        (80, "A+"),
        (70, "A"),
        (60, "B+"),
        (55, "B"),
        (50, "C+"),
        (45, "C"),
        (40, "P"),
        (39, "F"),
    ];
    for (i, (marks, letter)) in cases.iter().enumerate() {
        let res = request_ok(
            &mut stdin,
            &mut reader,
            &format!("{}", i),
            "grades.lookup",
            json!({ "marks": marks }),
        );
        assert_eq!(res["letter"], json!(letter), "marks {}", marks);
    }

    let e = request_err(
        &mut stdin,
        &mut reader,
        "bad",
        "grades.lookup",
        json!({ "marks": 101 }),
    );
    assert_eq!(e["code"], json!("bad_params"));
    assert_eq!(e["details"]["field"], json!("marks"));
    drop(stdin);
    let _ = child.wait();
}

#[test]
fn sgpa_worked_example_over_ipc() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let res = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "grades.sgpa",
        json!({
            "subjects": [
                { "name": "DS", "credits": 4, "marks": 85 },
                { "name": "OS", "credits": 3, "marks": 65 },
                { "name": "Maths", "credits": 2, "marks": 92 },
                { "name": "Not yet", "credits": 3, "marks": 0 }
            ]
        }),
    );
    assert_eq!(res["sgpa"], json!(8.11));
    assert_eq!(res["label"], json!("Excellent"));
    assert_eq!(res["letter"], json!("A"));
    assert_eq!(res["totalCredits"], json!(9));
    assert_eq!(res["gradedCount"], json!(3));
    assert_eq!(
        res["distribution"],
        json!([
            { "letter": "O", "count": 1 },
            { "letter": "A+", "count": 1 },
            { "letter": "B+", "count": 1 }
        ])
    );

    let empty = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "grades.sgpa",
        json!({ "subjects": [{ "credits": 0, "marks": 70 }, { "credits": 4, "marks": 0 }] }),
    );
    assert_eq!(empty["sgpa"], json!(null));

    let e = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "grades.sgpa",
        json!({ "subjects": [{ "credits": 7, "marks": 70 }] }),
    );
    assert_eq!(e["code"], json!("bad_params"));
    assert_eq!(e["details"]["field"], json!("subjects[0].credits"));
    drop(stdin);
    let _ = child.wait();
}

#[test]
fn cgpa_accepts_numbers_and_objects() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let res = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "grades.cgpa",
        json!({ "semesters": [8.5, 7.8, 8.2, 0] }),
    );
    assert_eq!(res["cgpa"], json!(8.17));
    assert_eq!(res["semestersCounted"], json!(3));

    let res = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "grades.cgpa",
        json!({ "semesters": [{ "semester": 1, "sgpa": 9.0 }, { "sgpa": 7.0 }] }),
    );
    assert_eq!(res["cgpa"], json!(8.0));

    let none = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "grades.cgpa",
        json!({ "semesters": [0, 0] }),
    );
    assert_eq!(none["cgpa"], json!(null));

    let e = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "grades.cgpa",
        json!({ "semesters": [1, 2, 3, 4, 5, 6, 7, 8, 9] }),
    );
    assert_eq!(e["code"], json!("bad_params"));
    drop(stdin);
    let _ = child.wait();
}

#[test]
fn classify_labels_at_boundaries() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let cases = [
        (8.0, "Excellent"),
        (7.99, "Good"),
        (6.0, "Good"),
        (5.99, "Needs Improvement"),
    ];
    for (i, (value, label)) in cases.iter().enumerate() {
        let res = request_ok(
            &mut stdin,
            &mut reader,
            &format!("{}", i),
            "grades.classify",
            json!({ "value": value }),
        );
        assert_eq!(res["label"], json!(label), "value {}", value);
    }
    drop(stdin);
    let _ = child.wait();
}

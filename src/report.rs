use crate::calc::{self, GradeDistribution, SubjectEntry};
use crate::settings::ReportSettings;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

const NOT_PROVIDED: &str = "Not Provided";
const TEXT_WIDTH: usize = 64;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentIdentity {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub usn: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentBlock {
    pub name: String,
    pub usn: String,
    pub generated: String,
    pub academic_year: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SgpaSummary {
    pub sgpa: f64,
    pub letter: &'static str,
    pub performance: &'static str,
    pub total_credits: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRow {
    pub name: String,
    pub credits: i64,
    pub marks: i64,
    pub grade: &'static str,
    pub points: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionLine {
    pub letter: &'static str,
    pub description: &'static str,
    pub count: usize,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceAnalysis {
    pub total_subjects: usize,
    pub excellent_count: usize,
    pub failed_count: usize,
    pub pass_percentage: f64,
    pub pass_percentage_text: String,
}

/// Grade report with its sections in print order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDocument {
    pub title: String,
    pub student: StudentBlock,
    pub sgpa_summary: Option<SgpaSummary>,
    pub subjects: Vec<SubjectRow>,
    pub distribution: Vec<DistributionLine>,
    pub analysis: PerformanceAnalysis,
    pub footer: Vec<String>,
}

/// `(total - failed) / total * 100`, one decimal; zero subjects is 0.0.
pub fn pass_percentage(total: usize, failed: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    debug_assert!(failed <= total, "{failed} failed out of {total}");
    let passed = total.saturating_sub(failed);
    calc::round_off_1_decimal(passed as f64 / total as f64 * 100.0)
}

fn or_not_provided(s: &str) -> String {
    let t = s.trim();
    if t.is_empty() {
        NOT_PROVIDED.to_string()
    } else {
        t.to_string()
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

pub fn render_report(
    student: &StudentIdentity,
    entries: &[SubjectEntry],
    sgpa: Option<f64>,
    distribution: &GradeDistribution,
    generated: NaiveDate,
    settings: &ReportSettings,
) -> ReportDocument {
    let graded: Vec<&SubjectEntry> = entries.iter().filter(|e| e.marks > 0).collect();

    let sgpa_summary = sgpa.map(|value| SgpaSummary {
        sgpa: value,
        letter: calc::sgpa_letter(value),
        performance: calc::classify(value).label(),
        total_credits: graded.iter().map(|e| e.credits).sum(),
    });

    let subjects = graded
        .iter()
        .map(|e| {
            let band = calc::grade_for_marks(e.marks);
            SubjectRow {
                name: truncate_chars(e.name.trim(), settings.subject_name_width),
                credits: e.credits,
                marks: e.marks,
                grade: band.letter,
                points: band.points,
            }
        })
        .collect();

    let distribution_lines = distribution
        .iter()
        .map(|(band, count)| DistributionLine {
            letter: band.letter,
            description: band.description,
            count,
            text: format!(
                "{} ({}): {} subject{}",
                band.letter,
                band.description,
                count,
                if count > 1 { "s" } else { "" }
            ),
        })
        .collect();

    let total_subjects = graded.len();
    let excellent_count = distribution.count("O") + distribution.count("A+");
    let failed_count = distribution.count("F");
    let pass = pass_percentage(total_subjects, failed_count);

    ReportDocument {
        title: settings.title.clone(),
        student: StudentBlock {
            name: or_not_provided(&student.name),
            usn: or_not_provided(&student.usn),
            generated: generated.format("%Y-%m-%d").to_string(),
            academic_year: generated.year(),
        },
        sgpa_summary,
        subjects,
        distribution: distribution_lines,
        analysis: PerformanceAnalysis {
            total_subjects,
            excellent_count,
            failed_count,
            pass_percentage: pass,
            pass_percentage_text: format!("{:.1}%", pass),
        },
        footer: settings.footer_lines.clone(),
    }
}

impl ReportDocument {
    pub fn to_text(&self) -> String {
        let rule = "=".repeat(TEXT_WIDTH);
        let mut out = String::new();

        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "{:^width$}", self.title, width = TEXT_WIDTH);
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out);

        let _ = writeln!(out, "STUDENT INFORMATION");
        let _ = writeln!(out, "  Name: {}", self.student.name);
        let _ = writeln!(out, "  USN: {}", self.student.usn);
        let _ = writeln!(out, "  Report Generated: {}", self.student.generated);
        let _ = writeln!(out, "  Academic Year: {}", self.student.academic_year);
        let _ = writeln!(out);

        if let Some(s) = &self.sgpa_summary {
            let _ = writeln!(out, "SGPA: {:.2}", s.sgpa);
            let _ = writeln!(out, "  Grade: {}", s.letter);
            let _ = writeln!(out, "  Performance: {}", s.performance);
            let _ = writeln!(out, "  Total Credits: {}", s.total_credits);
            let _ = writeln!(out);
        }

        let name_width = self
            .subjects
            .iter()
            .map(|r| r.name.chars().count())
            .max()
            .unwrap_or(0)
            .max("Subject Name".len());
        let _ = writeln!(out, "SUBJECT PERFORMANCE");
        let _ = writeln!(
            out,
            "  {:<nw$}  {:>7}  {:>5}  {:<5}  {:>6}",
            "Subject Name",
            "Credits",
            "Marks",
            "Grade",
            "Points",
            nw = name_width
        );
        for r in &self.subjects {
            let _ = writeln!(
                out,
                "  {:<nw$}  {:>7}  {:>5}  {:<5}  {:>6}",
                r.name,
                r.credits,
                r.marks,
                r.grade,
                r.points,
                nw = name_width
            );
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "GRADE DISTRIBUTION");
        for line in &self.distribution {
            let _ = writeln!(out, "  {}", line.text);
        }
        let _ = writeln!(out);

        let a = &self.analysis;
        let _ = writeln!(out, "PERFORMANCE ANALYSIS");
        let _ = writeln!(out, "  - Total Subjects: {}", a.total_subjects);
        let _ = writeln!(
            out,
            "  - Excellent Performance (O/A+): {} subjects",
            a.excellent_count
        );
        let _ = writeln!(out, "  - Failed Subjects: {} subjects", a.failed_count);
        let _ = writeln!(out, "  - Pass Percentage: {}", a.pass_percentage_text);

        if !self.footer.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", "-".repeat(TEXT_WIDTH));
            for line in &self.footer {
                let _ = writeln!(out, "{:^width$}", line, width = TEXT_WIDTH);
            }
        }
        out
    }
}

fn sanitize_file_component(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// `{name or "Student"}_Grade_Report_{YYYY-MM-DD}.txt`
pub fn report_file_name(student_name: &str, date: NaiveDate) -> String {
    let name = student_name.trim();
    let name = if name.is_empty() {
        "Student".to_string()
    } else {
        sanitize_file_component(name)
    };
    format!("{}_Grade_Report_{}.txt", name, date.format("%Y-%m-%d"))
}

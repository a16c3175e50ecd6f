use crate::calc::{self, SemesterEntry, SgpaResult, SubjectEntry};
use crate::report::StudentIdentity;
use serde::Serialize;
use uuid::Uuid;

pub const MAX_SEMESTERS: usize = 8;

#[derive(Debug, Clone, Serialize)]
pub struct SessionError {
    pub code: String,
    pub message: String,
}

impl SessionError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSubject {
    pub id: String,
    #[serde(flatten)]
    pub entry: SubjectEntry,
}

impl SessionSubject {
    fn blank(credits: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            entry: SubjectEntry {
                name: String::new(),
                credits,
                marks: 0,
            },
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SubjectPatch {
    pub name: Option<String>,
    pub credits: Option<i64>,
    pub marks: Option<i64>,
}

/// What the user is editing between calculations. The lists are never
/// empty: removing the last subject or semester is refused.
#[derive(Debug, Clone)]
pub struct Session {
    pub student: StudentIdentity,
    subjects: Vec<SessionSubject>,
    semesters: Vec<SemesterEntry>,
    sgpa: Option<SgpaResult>,
    cgpa: Option<f64>,
}

impl Session {
    pub fn new(default_credits: i64) -> Self {
        Self {
            student: StudentIdentity::default(),
            subjects: vec![SessionSubject::blank(default_credits)],
            semesters: vec![SemesterEntry {
                semester: 1,
                sgpa: 0.0,
            }],
            sgpa: None,
            cgpa: None,
        }
    }

    pub fn subjects(&self) -> &[SessionSubject] {
        &self.subjects
    }

    pub fn semesters(&self) -> &[SemesterEntry] {
        &self.semesters
    }

    pub fn sgpa(&self) -> Option<&SgpaResult> {
        self.sgpa.as_ref()
    }

    pub fn cgpa(&self) -> Option<f64> {
        self.cgpa
    }

    pub fn entries(&self) -> Vec<SubjectEntry> {
        self.subjects.iter().map(|s| s.entry.clone()).collect()
    }

    /// Gives the untouched starting subject new default credits. Does nothing
    /// once the user has entered anything.
    pub fn apply_default_credits(&mut self, default_credits: i64) {
        if let [only] = self.subjects.as_mut_slice() {
            if only.entry.name.is_empty() && only.entry.marks == 0 {
                only.entry.credits = default_credits;
            }
        }
    }

    pub fn add_subject(&mut self, entry: SubjectEntry) -> &SessionSubject {
        self.subjects.push(SessionSubject {
            id: Uuid::new_v4().to_string(),
            entry,
        });
        &self.subjects[self.subjects.len() - 1]
    }

    pub fn update_subject(
        &mut self,
        id: &str,
        patch: SubjectPatch,
    ) -> Result<&SessionSubject, SessionError> {
        let Some(subject) = self.subjects.iter_mut().find(|s| s.id == id) else {
            return Err(SessionError::new("not_found", "subject not found"));
        };
        if let Some(name) = patch.name {
            subject.entry.name = name;
        }
        if let Some(credits) = patch.credits {
            subject.entry.credits = credits;
        }
        if let Some(marks) = patch.marks {
            subject.entry.marks = marks;
        }
        Ok(&*subject)
    }

    pub fn remove_subject(&mut self, id: &str) -> Result<(), SessionError> {
        let Some(idx) = self.subjects.iter().position(|s| s.id == id) else {
            return Err(SessionError::new("not_found", "subject not found"));
        };
        if self.subjects.len() <= 1 {
            return Err(SessionError::new(
                "limit_reached",
                "at least one subject must remain",
            ));
        }
        self.subjects.remove(idx);
        Ok(())
    }

    pub fn reset_subjects(&mut self, default_credits: i64) {
        self.subjects = vec![SessionSubject::blank(default_credits)];
        self.sgpa = None;
    }

    /// Stores a fresh result when there is one. With nothing graded the
    /// previous result is left as it was.
    pub fn calculate_sgpa(&mut self) -> Option<&SgpaResult> {
        let res = calc::compute_sgpa(self.subjects.iter().map(|s| &s.entry))?;
        self.sgpa = Some(res);
        self.sgpa.as_ref()
    }

    pub fn add_semester(&mut self) -> Result<SemesterEntry, SessionError> {
        if self.semesters.len() >= MAX_SEMESTERS {
            return Err(SessionError::new(
                "limit_reached",
                format!("at most {} semesters", MAX_SEMESTERS),
            ));
        }
        let entry = SemesterEntry {
            semester: self.semesters.len() as i64 + 1,
            sgpa: 0.0,
        };
        self.semesters.push(entry);
        Ok(entry)
    }

    pub fn update_semester(&mut self, semester: i64, sgpa: f64) -> Result<(), SessionError> {
        let Some(s) = self.semesters.iter_mut().find(|s| s.semester == semester) else {
            return Err(SessionError::new("not_found", "semester not found"));
        };
        s.sgpa = sgpa;
        Ok(())
    }

    /// Removes one semester and renumbers the rest 1..=n.
    pub fn remove_semester(&mut self, semester: i64) -> Result<(), SessionError> {
        let Some(idx) = self.semesters.iter().position(|s| s.semester == semester) else {
            return Err(SessionError::new("not_found", "semester not found"));
        };
        if self.semesters.len() <= 1 {
            return Err(SessionError::new(
                "limit_reached",
                "at least one semester must remain",
            ));
        }
        self.semesters.remove(idx);
        for (i, s) in self.semesters.iter_mut().enumerate() {
            s.semester = i as i64 + 1;
        }
        Ok(())
    }

    pub fn reset_semesters(&mut self) {
        self.semesters = vec![SemesterEntry {
            semester: 1,
            sgpa: 0.0,
        }];
        self.cgpa = None;
    }

    pub fn calculate_cgpa(&mut self) -> Option<f64> {
        let cgpa = calc::compute_cgpa(&self.semesters)?;
        self.cgpa = Some(cgpa);
        Some(cgpa)
    }
}

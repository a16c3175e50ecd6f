use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};

/// One contiguous marks range of the grading scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeBand {
    pub lower_bound: i64,
    pub upper_bound: i64,
    pub letter: &'static str,
    pub points: i64,
    pub description: &'static str,
}

impl GradeBand {
    pub fn range(&self) -> String {
        format!("{}-{}", self.lower_bound, self.upper_bound)
    }
}

const BAND_COUNT: usize = 9;
const FAIL_BAND: usize = BAND_COUNT - 1;

/// VTU grading scale, highest band first. Bounds are contiguous over 0..=100.
pub static GRADE_SCALE: [GradeBand; BAND_COUNT] = [
    GradeBand {
        lower_bound: 90,
        upper_bound: 100,
        letter: "O",
        points: 10,
        description: "Outstanding",
    },
    GradeBand {
        lower_bound: 80,
        upper_bound: 89,
        letter: "A+",
        points: 9,
        description: "Excellent",
    },
    GradeBand {
        lower_bound: 70,
        upper_bound: 79,
        letter: "A",
        points: 8,
        description: "Very Good",
    },
    GradeBand {
        lower_bound: 60,
        upper_bound: 69,
        letter: "B+",
        points: 7,
        description: "Good",
    },
    GradeBand {
        lower_bound: 55,
        upper_bound: 59,
        letter: "B",
        points: 6,
        description: "Above Average",
    },
    GradeBand {
        lower_bound: 50,
        upper_bound: 54,
        letter: "C+",
        points: 5,
        description: "Average",
    },
    GradeBand {
        lower_bound: 45,
        upper_bound: 49,
        letter: "C",
        points: 4,
        description: "Satisfactory",
    },
    GradeBand {
        lower_bound: 40,
        upper_bound: 44,
        letter: "P",
        points: 4,
        description: "Pass",
    },
    GradeBand {
        lower_bound: 0,
        upper_bound: 39,
        letter: "F",
        points: 0,
        description: "Fail",
    },
];

fn band_index(marks: i64) -> usize {
    GRADE_SCALE
        .iter()
        .position(|b| marks >= b.lower_bound)
        .unwrap_or(FAIL_BAND)
}

fn band_for_letter(letter: &str) -> Option<usize> {
    GRADE_SCALE.iter().position(|b| b.letter == letter)
}

/// Band whose lower bound is the greatest value <= `marks`.
/// Negative marks land in F.
pub fn grade_for_marks(marks: i64) -> &'static GradeBand {
    &GRADE_SCALE[band_index(marks)]
}

pub fn grade_description(letter: &str) -> Option<&'static str> {
    band_for_letter(letter).map(|i| GRADE_SCALE[i].description)
}

/// Half-up rounding to 2 decimals: `floor(100*x + 0.5) / 100`.
///
/// The epsilon keeps decimal halves such as 8.115 (stored as 8.11499..)
/// rounding up. Inputs are never negative here.
pub fn round_off_2_decimal(x: f64) -> f64 {
    ((100.0 * x) + 0.5 + 1e-9).floor() / 100.0
}

/// Same rule at one decimal, used for percentages.
pub fn round_off_1_decimal(x: f64) -> f64 {
    ((10.0 * x) + 0.5 + 1e-9).floor() / 10.0
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectEntry {
    #[serde(default)]
    pub name: String,
    pub credits: i64,
    pub marks: i64,
}

impl SubjectEntry {
    /// Zero marks or zero credits means "not yet entered".
    pub fn is_graded(&self) -> bool {
        self.marks > 0 && self.credits > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemesterEntry {
    pub semester: i64,
    pub sgpa: f64,
}

/// Per-letter counts, always iterated in scale order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GradeDistribution {
    counts: [usize; BAND_COUNT],
}

impl GradeDistribution {
    pub fn record(&mut self, marks: i64) {
        self.counts[band_index(marks)] += 1;
    }

    pub fn count(&self, letter: &str) -> usize {
        band_for_letter(letter)
            .map(|i| self.counts[i])
            .unwrap_or(0)
    }

    /// Letters with a non-zero count, O first.
    pub fn iter(&self) -> impl Iterator<Item = (&'static GradeBand, usize)> + '_ {
        GRADE_SCALE
            .iter()
            .zip(self.counts.iter().copied())
            .filter(|(_, n)| *n > 0)
    }
}

impl Serialize for GradeDistribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Row {
            letter: &'static str,
            count: usize,
        }

        let mut seq = serializer.serialize_seq(None)?;
        for (band, count) in self.iter() {
            seq.serialize_element(&Row {
                letter: band.letter,
                count,
            })?;
        }
        seq.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SgpaResult {
    pub sgpa: f64,
    pub total_credits: i64,
    pub graded_count: usize,
    pub distribution: GradeDistribution,
}

/// Credit-weighted grade point average over graded entries.
///
/// Returns `None` when no entry carries both marks and credits; callers
/// treat that as "nothing to show" rather than a zero SGPA.
pub fn compute_sgpa<'a, I>(entries: I) -> Option<SgpaResult>
where
    I: IntoIterator<Item = &'a SubjectEntry>,
{
    let mut weighted_sum: i64 = 0;
    let mut total_credits: i64 = 0;
    let mut graded_count: usize = 0;
    let mut distribution = GradeDistribution::default();

    for e in entries {
        if !e.is_graded() {
            continue;
        }
        let band = grade_for_marks(e.marks);
        weighted_sum += band.points * e.credits;
        total_credits += e.credits;
        graded_count += 1;
        distribution.record(e.marks);
    }

    if total_credits <= 0 {
        return None;
    }

    Some(SgpaResult {
        sgpa: round_off_2_decimal(weighted_sum as f64 / total_credits as f64),
        total_credits,
        graded_count,
        distribution,
    })
}

/// Plain mean of the semesters that have an SGPA entered.
pub fn compute_cgpa<'a, I>(semesters: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a SemesterEntry>,
{
    let mut sum = 0.0_f64;
    let mut counted: usize = 0;
    for s in semesters {
        if s.sgpa > 0.0 {
            sum += s.sgpa;
            counted += 1;
        }
    }
    if counted == 0 {
        return None;
    }
    Some(round_off_2_decimal(sum / counted as f64))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standing {
    Excellent,
    Good,
    NeedsImprovement,
}

impl Standing {
    pub fn label(self) -> &'static str {
        match self {
            Standing::Excellent => "Excellent",
            Standing::Good => "Good",
            Standing::NeedsImprovement => "Needs Improvement",
        }
    }
}

pub fn classify(value: f64) -> Standing {
    if value >= 8.0 {
        Standing::Excellent
    } else if value >= 6.0 {
        Standing::Good
    } else {
        Standing::NeedsImprovement
    }
}

/// Overall letter printed next to an SGPA on the report.
pub fn sgpa_letter(value: f64) -> &'static str {
    if value >= 9.0 {
        "A+"
    } else if value >= 8.0 {
        "A"
    } else if value >= 7.0 {
        "B+"
    } else if value >= 6.0 {
        "B"
    } else {
        "C"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceTier {
    Outstanding,
    Excellent,
    Good,
    Fair,
    Low,
}

impl PerformanceTier {
    pub fn as_str(self) -> &'static str {
        match self {
            PerformanceTier::Outstanding => "outstanding",
            PerformanceTier::Excellent => "excellent",
            PerformanceTier::Good => "good",
            PerformanceTier::Fair => "fair",
            PerformanceTier::Low => "low",
        }
    }
}

pub fn performance_tier(value: f64) -> PerformanceTier {
    if value >= 9.0 {
        PerformanceTier::Outstanding
    } else if value >= 8.0 {
        PerformanceTier::Excellent
    } else if value >= 7.0 {
        PerformanceTier::Good
    } else if value >= 6.0 {
        PerformanceTier::Fair
    } else {
        PerformanceTier::Low
    }
}

/// Position of a 10-point value on a 0..=100 progress bar.
pub fn progress_percent(value: f64) -> f64 {
    (value * 10.0).clamp(0.0, 100.0)
}

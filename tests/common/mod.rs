//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

pub const HEADER: &str = "gender,race_ethnicity,parental_level_of_education,lunch,test_preparation_course,math_score,reading_score,writing_score";

const GROUPS: [&str; 5] = ["group A", "group B", "group C", "group D", "group E"];
const EDUCATION: [&str; 6] = [
    "associate's degree",
    "bachelor's degree",
    "high school",
    "master's degree",
    "some college",
    "some high school",
];

/// One synthetic student: (categoricals, math, reading, writing)
pub fn student_row(i: usize) -> ([&'static str; 5], f64, f64, f64) {
    let gender = if i % 2 == 0 { "female" } else { "male" };
    let race = GROUPS[i % 5];
    let education = EDUCATION[(i * 7) % 6];
    let lunch = if i % 3 == 0 { "free/reduced" } else { "standard" };
    let prep = if i % 4 == 0 { "completed" } else { "none" };

    let reading = 40.0 + ((i * 37) % 55) as f64;
    let writing = reading + ((i * 13) % 11) as f64 - 5.0;
    let mut math = 0.6 * reading + 0.3 * writing + ((i * 29) % 7) as f64 - 3.0;
    math += if lunch == "standard" { 5.0 } else { -5.0 };
    math += if gender == "male" { 4.0 } else { -2.0 };

    ([gender, race, education, lunch, prep], math.round(), reading, writing)
}

/// Write `n` synthetic rows to `path` as a student CSV
pub fn write_student_csv(path: &Path, n: usize) {
    let mut out = String::from(HEADER);
    out.push('\n');
    for i in 0..n {
        let (cats, math, reading, writing) = student_row(i);
        writeln!(
            out,
            "{},{},\"{}\",{},{},{},{},{}",
            cats[0], cats[1], cats[2], cats[3], cats[4], math, reading, writing
        )
        .unwrap();
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, out).unwrap();
}

//! Raw input rows for prediction

use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// One student as entered at prediction time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub gender: String,
    pub race_ethnicity: String,
    pub parental_level_of_education: String,
    pub lunch: String,
    pub test_preparation_course: String,
    /// Missing scores are imputed by the preprocessor
    pub reading_score: Option<f64>,
    pub writing_score: Option<f64>,
}

impl StudentRecord {
    pub fn new(
        gender: impl Into<String>,
        race_ethnicity: impl Into<String>,
        parental_level_of_education: impl Into<String>,
        lunch: impl Into<String>,
        test_preparation_course: impl Into<String>,
    ) -> Self {
        Self {
            gender: gender.into(),
            race_ethnicity: race_ethnicity.into(),
            parental_level_of_education: parental_level_of_education.into(),
            lunch: lunch.into(),
            test_preparation_course: test_preparation_course.into(),
            reading_score: None,
            writing_score: None,
        }
    }

    pub fn with_reading_score(mut self, score: f64) -> Self {
        self.reading_score = Some(score);
        self
    }

    pub fn with_writing_score(mut self, score: f64) -> Self {
        self.writing_score = Some(score);
        self
    }

    /// Table with one row per record, using the training column names
    pub fn to_dataframe(records: &[StudentRecord]) -> Result<DataFrame> {
        let df = df!(
            "gender" => text_column(records, |r| r.gender.as_str()),
            "race_ethnicity" => text_column(records, |r| r.race_ethnicity.as_str()),
            "parental_level_of_education" => text_column(records, |r| r.parental_level_of_education.as_str()),
            "lunch" => text_column(records, |r| r.lunch.as_str()),
            "test_preparation_course" => text_column(records, |r| r.test_preparation_course.as_str()),
            "reading_score" => records.iter().map(|r| r.reading_score).collect::<Vec<_>>(),
            "writing_score" => records.iter().map(|r| r.writing_score).collect::<Vec<_>>(),
        )?;
        Ok(df)
    }
}

fn text_column<'a>(records: &'a [StudentRecord], field: impl Fn(&'a StudentRecord) -> &'a str) -> Vec<&'a str> {
    records.iter().map(field).collect()
}

//! Prediction commands

use std::io::Read;

use anyhow::{Context, Result};
use tabled::Tabled;

use crate::client::{ApiClient, PredictionResponse};
use crate::output::{color_confidence, color_outcome, print_info, OutputFormat};

/// Row for the prediction table
#[derive(Tabled)]
struct PredictionRow {
    #[tabled(rename = "Outcome")]
    outcome: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Model")]
    model_version: String,
}

/// Submit a student record from a JSON file (or stdin with `-`) and print
/// the prediction. The record is forwarded as-is; the server owns the
/// schema and its validation.
pub async fn predict(client: &ApiClient, input: &str, format: OutputFormat) -> Result<()> {
    let raw = if input == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read student record from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read student record from {}", input))?
    };
    let record: serde_json::Value =
        serde_json::from_str(&raw).context("Input is not valid JSON")?;

    let prediction: PredictionResponse = client.post("api/v1/predict", &record).await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&prediction)?);
        }
        OutputFormat::Table => {
            let rows = vec![PredictionRow {
                outcome: color_outcome(&prediction.outcome),
                confidence: color_confidence(prediction.confidence),
                model_version: prediction.model_version.clone(),
            }];
            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
        }
    }

    Ok(())
}

/// Print a fillable input template with every field the form collects.
pub fn sample() -> Result<()> {
    let template = sample_record();
    println!("{}", serde_json::to_string_pretty(&template)?);
    print_info("Edit the values above and pass the file to `sdp predict --input`.");
    Ok(())
}

/// Representative record matching the server's collected fields. The seven
/// schema fields the form does not expose are filled server-side.
fn sample_record() -> serde_json::Value {
    serde_json::json!({
        "Marital_status": 1,
        "Application_mode": 1,
        "Application_order": 1,
        "Course": 33,
        "Daytime_evening_attendance": 1,
        "Previous_qualification": 1,
        "Nacionality": 1,
        "Mothers_qualification": 1,
        "Fathers_qualification": 1,
        "Educational_special_needs": 0,
        "Debtor": 0,
        "Tuition_fees_up_to_date": 1,
        "Gender": 0,
        "Scholarship_holder": 0,
        "Age_at_enrollment": 18,
        "International": 0,
        "Curricular_units_1st_sem_enrolled": 6,
        "Curricular_units_1st_sem_evaluations": 6,
        "Curricular_units_1st_sem_approved": 6,
        "Curricular_units_1st_sem_grade": 15.0,
        "Curricular_units_1st_sem_without_evaluations": 0,
        "Curricular_units_2nd_sem_enrolled": 6,
        "Curricular_units_2nd_sem_evaluations": 6,
        "Curricular_units_2nd_sem_approved": 5,
        "Curricular_units_2nd_sem_grade": 14.0,
        "Curricular_units_2nd_sem_without_evaluations": 0,
        "Unemployment_rate": 10.0,
        "Inflation_rate": 1.2,
        "GDP": 2.1
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_record_covers_the_collected_fields() {
        let template = sample_record();
        let object = template.as_object().unwrap();
        assert_eq!(object.len(), 29);
        assert!(object.contains_key("Marital_status"));
        assert!(object.contains_key("GDP"));
        // fields filled server-side stay out of the template
        assert!(!object.contains_key("Mothers_occupation"));
        assert!(!object.contains_key("Admission_grade"));
    }
}

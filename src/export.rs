use crate::error::Result;
use crate::models::{AdmissionRecord, ChartSeries};
use csv::Writer;
use std::path::{Path, PathBuf};

pub fn write_records_csv(records: &[AdmissionRecord], output_dir: &str) -> Result<PathBuf> {
    let csv_path = Path::new(output_dir).join("filtered_records.csv");
    let mut writer = Writer::from_path(&csv_path)?;

    writer.write_record([
        "ID",
        "Name",
        "Class",
        "Region",
        "University",
        "Major",
        "Type",
        "GPA",
        "Status",
    ])?;

    for record in records {
        let gpa = format!("{:.2}", record.gpa);
        let row: [&str; 9] = [
            &record.id,
            &record.student_name,
            &record.student_info,
            &record.region,
            &record.university,
            &record.major,
            &record.admission_type,
            &gpa,
            record.status.label(),
        ];
        writer.write_record(row)?;
    }

    writer.flush()?;
    Ok(csv_path)
}

pub fn write_chart_csv(chart: &ChartSeries, output_dir: &str) -> Result<PathBuf> {
    let csv_path = Path::new(output_dir).join("chart_series.csv");
    let mut writer = Writer::from_path(&csv_path)?;

    writer.write_record(["Category", "불합", "충원합격", "합격"])?;

    for bucket in chart {
        writer.write_record([
            bucket.category.label().to_string(),
            bucket.fail.to_string(),
            bucket.waitlist_pass.to_string(),
            bucket.pass.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(csv_path)
}

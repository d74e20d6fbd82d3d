//! CSV serialization of a loaded dataset.

use crate::dataset::Dataset;
use anyhow::Result;
use std::fs;

pub const CSV_HEADER: [&str; 6] = [
    "Latent ID",
    "Sequence",
    "Activation",
    "Context",
    "Annotations",
    "E-Value",
];

/// Render the full dataset as CSV, one row per activation record, latents in
/// dataset order. Fields follow RFC 4180 quoting, so embedded quotes in
/// free-text columns come out doubled.
pub fn dataset_to_csv(dataset: &Dataset) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(CSV_HEADER)?;
    for latent in dataset.iter() {
        for record in &latent.activations {
            let value = record.value.to_string();
            writer.write_record([
                latent.id.as_str(),
                record.input.as_str(),
                value.as_str(),
                record.context.as_str(),
                record.annotations.as_str(),
                record.e_value.as_str(),
            ])?;
        }
    }
    let bytes = writer.into_inner()?;
    Ok(String::from_utf8(bytes)?)
}

pub fn write_csv_file(dataset: &Dataset, path: &str) -> Result<()> {
    fs::write(path, dataset_to_csv(dataset)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use csv::ReaderBuilder;

    fn sample_dataset() -> Dataset {
        Dataset::from_json_text(
            r#"{
            "12": {"activations": [
                {"input": "TATAAT", "value": 2.5, "context": "GGC|TATAAT|ACT", "annotations": "['promoter', 'TATA-box']", "e-value": "1.2e-8"},
                {"input": "TATGAT", "value": 0.4, "context": "AAA|TATGAT|GGG", "annotations": "promoter", "e-value": "3.1e-2"}
            ]},
            "7": {"activations": [
                {"input": "GGCGCC", "value": 1.125, "context": "TT|GGCGCC|AA", "annotations": "say \"CpG\"", "e-value": 0.004}
            ]}
        }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_round_trip_row_count_and_values() {
        let dataset = sample_dataset();
        let text = dataset_to_csv(&dataset).unwrap();

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_reader(text.as_bytes());
        assert_eq!(
            reader.headers().unwrap().iter().collect::<Vec<_>>(),
            CSV_HEADER
        );

        let rows: Vec<csv::StringRecord> = reader.records().flatten().collect();
        assert_eq!(rows.len(), dataset.record_count());

        // Latents come out in dataset order, activations in record order
        assert_eq!(&rows[0][0], "12");
        assert_eq!(&rows[0][1], "TATAAT");
        assert_eq!(rows[0][2].parse::<f64>().unwrap(), 2.5);
        assert_eq!(rows[2][2].parse::<f64>().unwrap(), 1.125);
    }

    #[test]
    fn test_embedded_quotes_are_escaped() {
        let dataset = sample_dataset();
        let text = dataset_to_csv(&dataset).unwrap();
        assert!(text.contains(r#""say ""CpG""""#));

        // And the quoting round-trips
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_reader(text.as_bytes());
        let row = reader.records().flatten().nth(2).unwrap();
        assert_eq!(&row[4], r#"say "CpG""#);
    }

    #[test]
    fn test_empty_dataset_exports_header_only() {
        let dataset = Dataset::from_json_text(r#"{"1": {"activations": []}}"#).unwrap();
        let text = dataset_to_csv(&dataset).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}

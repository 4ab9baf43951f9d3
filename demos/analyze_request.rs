//! Run a small two-cohort analysis and print the JSON output

fn main() {
    let json = r#"{
        "config": { "bin_edges": [2, 4, 8, 16, 32, "inf"] },
        "cohorts": [
            { "label": "wild-type", "animal_ids": ["A"] },
            { "label": "mutant", "animal_ids": ["B"] }
        ],
        "animals": [
            { "animal_id": "A", "records": [
                { "timestamp": "2023-09-19 05:59:00", "duration_seconds": 2.0 },
                { "timestamp": "2023-09-19 06:00:00", "duration_seconds": 2.0 },
                { "timestamp": "2023-09-19 12:30:00", "duration_seconds": 5.0 },
                { "timestamp": "2023-09-19 21:10:00", "duration_seconds": 20.0 }
            ] },
            { "animal_id": "B", "records": [
                { "timestamp": "2023-09-19 19:00:00", "duration_seconds": 40.0 },
                { "timestamp": "not-a-date", "duration_seconds": 3.0 }
            ] }
        ]
    }"#;

    match sleepbin::analyze_json(json) {
        Ok(output) => print!("{output}"),
        Err(e) => eprintln!("Error: {e:?}"),
    }
}

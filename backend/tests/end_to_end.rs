//! End-to-end checks on the byte-stream API.

use sloscore::{
    collect_section_files, extract_to_csv, pair_mixed_files, process_batch, process_pairs,
    BatchError, ExtractError, ExtractOptions, ExtractWarning, InputRole, SectionFile,
    StudentIdentity,
};

const QUESTIONS_BIO: &str = "\
Quiz structure analysis,,
BIO 101 - Midterm,,
Q#,Question type,Question name
1,Multiple choice,  Covers SLO 1 basics
2,Essay,Unrelated topic
3,Numerical,slo 2 content
4,Multiple choice,Question relates to SLO 3 and SLO 4
";

const GRADES_BIO: &str = "\
Last name,First name,ID number,Email address,State,Grade/20.00,Q. 1 /10.00,Q. 2 /20.00,Q. 3 /5.00,Q. 4
Doe,Jane,1001,jane@x.edu,Finished,16.00,8.00,18.00,2.50,1.00
Roe,Rick,1002,rick@x.edu,Finished,12.00,-,10.00,5.00,0.00
Overall average,,,,,14.00,8.00,14.00,3.75,0.50
";

fn jane() -> StudentIdentity {
    StudentIdentity::new("Doe", "Jane", "1001", "jane@x.edu")
}

#[test]
fn test_single_question_pair() {
    let grades = "Last name,First name,ID number,Email address,Q. 1 /10,Q. 2 /20\nDoe,Jane,1001,jane@x.edu,8,18\n";
    let questions = "banner one\nbanner two\nQ#,Question name\n1,Covers SLO 1 basics\n2,Unrelated topic\n";

    let (csv, _) = extract_to_csv(grades.as_bytes(), questions.as_bytes(), &ExtractOptions::default()).unwrap();
    assert_eq!(
        String::from_utf8(csv).unwrap(),
        "Last name,First name,ID number,Email address,SLO 1\nDoe,Jane,1001,jane@x.edu,80.00%\n"
    );
}

#[test]
fn test_realistic_export() {
    let (csv, outcome) =
        extract_to_csv(GRADES_BIO.as_bytes(), QUESTIONS_BIO.as_bytes(), &ExtractOptions::default()).unwrap();
    let csv = String::from_utf8(csv).unwrap();

    assert_eq!(
        csv,
        "Last name,First name,ID number,Email address,SLO 1,SLO 2,SLO 3\n\
         Doe,Jane,1001,jane@x.edu,80.00%,50.00%,100.00%\n\
         Roe,Rick,1002,rick@x.edu,,100.00%,0.00%\n"
    );
    assert!(!csv.contains("Overall average"));
    assert_eq!(outcome.stats.dropped_summary_rows, 1);
    assert!(outcome.warnings.is_empty());
}

#[test]
fn test_malformed_metadata_reported() {
    let questions = "a\nb\nNumber,Name\n1,SLO 1\n";
    let err = extract_to_csv(GRADES_BIO.as_bytes(), questions.as_bytes(), &ExtractOptions::default())
        .unwrap_err();
    assert!(matches!(
        err,
        ExtractError::MalformedInput { role: InputRole::Questions, .. }
    ));
}

#[test]
fn test_batch_with_bad_and_unpaired_sections() {
    let opts = ExtractOptions::default();
    let section_b = "Last name,First name,ID number,Email address,Q. 1 /10.00\n\
                     Doe,Jane,1001,jane@x.edu,9.00\n\
                     Poe,Ed,1003,ed@x.edu,4.00\n";

    let batch = process_batch(
        vec![
            SectionFile::new("bio101-01-grades.csv", GRADES_BIO),
            SectionFile::new("bio101-02-grades.csv", section_b),
            SectionFile::new("bio101-03-grades.csv", "Student,Q. 1 /10\nX,1\n"),
            SectionFile::new("bio101-04-grades.csv", GRADES_BIO),
        ],
        vec![
            SectionFile::new("bio101-03-questionstats.csv", QUESTIONS_BIO),
            SectionFile::new("bio101-02-questionstats.csv", QUESTIONS_BIO),
            SectionFile::new("bio101-01-questionstats.csv", QUESTIONS_BIO),
        ],
        &opts,
    );

    assert_eq!(batch.sections.len(), 2);
    assert_eq!(batch.failures.len(), 1);
    assert_eq!(batch.failures[0].common_id, "bio101-03");
    assert!(batch.warnings.iter().any(|w| matches!(
        w,
        ExtractWarning::UnpairedFile { common_id, .. } if common_id == "bio101-04"
    )));

    let roster = batch.roster().unwrap();
    assert_eq!(roster.sections, vec!["bio101-01", "bio101-02"]);
    assert_eq!(roster.table.rows.len(), 3);
    assert_eq!(roster.table.find(&jane()).unwrap().score("SLO 1"), "80.00%");

    let csv = String::from_utf8(batch.combined_csv(&opts).unwrap()).unwrap();
    assert!(csv.ends_with("Poe,Ed,1003,ed@x.edu,40.00%,,\n"));
}

#[test]
fn test_batch_nothing_to_combine() {
    let opts = ExtractOptions::default();
    let batch = process_batch(
        vec![SectionFile::new("a-grades.csv", GRADES_BIO)],
        vec![SectionFile::new("b-questionstats.csv", QUESTIONS_BIO)],
        &opts,
    );
    assert!(matches!(batch.combined_csv(&opts), Err(BatchError::NoData)));
    assert_eq!(batch.warnings.len(), 2);
}

#[test]
fn test_batch_all_pairs_malformed() {
    let opts = ExtractOptions::default();
    let batch = process_batch(
        vec![
            SectionFile::new("x-grades.csv", GRADES_BIO),
            SectionFile::new("y-grades.csv", "Student,Q. 1 /10\nX,1\n"),
        ],
        vec![
            SectionFile::new("x-questionstats.csv", "a\nb\nNumber,Name\n1,SLO 1\n"),
            SectionFile::new("y-questionstats.csv", QUESTIONS_BIO),
        ],
        &opts,
    );

    let failed: Vec<&str> = batch.failures.iter().map(|f| f.common_id.as_str()).collect();
    assert_eq!(failed, vec!["x", "y"]);
    assert!(matches!(batch.combined_csv(&opts), Err(BatchError::NoData)));
}

#[test]
fn test_directory_batch() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("chem-grades.csv"), GRADES_BIO).unwrap();
    std::fs::write(dir.path().join("chem-questionstats.csv"), QUESTIONS_BIO).unwrap();
    std::fs::write(dir.path().join("summary.csv"), "x,y\n1,2\n").unwrap();

    let opts = ExtractOptions::default();
    let files = collect_section_files(dir.path()).unwrap();
    let batch = process_pairs(pair_mixed_files(files, &opts), &opts);

    assert_eq!(batch.sections.len(), 1);
    assert_eq!(
        batch.warnings,
        vec![ExtractWarning::UnrecognizedFileName {
            file_name: "summary.csv".into()
        }]
    );
    assert_eq!(batch.roster().unwrap().table.rows.len(), 2);
}

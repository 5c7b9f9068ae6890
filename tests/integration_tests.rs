use pathway_progress::config::PipelineConfig;
use pathway_progress::error::PipelineError;
use pathway_progress::export::{ExportOptions, export_sequences, sequence_spans};
use pathway_progress::merge::{Category, EnrollmentResult, Scope};
use pathway_progress::output::{write_diagnostics, write_student_table};
use pathway_progress::pipeline::{self, PipelineOutput};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/data")
}

fn run_fixture(scope: Scope) -> PipelineOutput {
    let config = PipelineConfig::default().with_data_dir(fixture_dir());
    pipeline::run(&config, scope).expect("fixture pipeline run failed")
}

fn copy_dir(from: &Path, to: &Path) {
    fs::create_dir_all(to).unwrap();
    for entry in fs::read_dir(from).unwrap() {
        let entry = entry.unwrap();
        let target = to.join(entry.file_name());
        if entry.file_type().unwrap().is_dir() {
            copy_dir(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), target).unwrap();
        }
    }
}

/// A scratch copy of the fixture data that a test may alter.
fn scratch_data() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    copy_dir(&fixture_dir(), &data);
    (dir, data)
}

#[test]
fn test_full_pipeline() {
    let run = run_fixture(Scope::Combined);

    let ids: Vec<&str> = run.table.iter().map(|r| r.student_id.as_str()).collect();
    assert_eq!(ids, vec!["100000001", "100000002", "100000003"]);

    let first = run.table.get("100000001").unwrap();
    assert_eq!(first.category, Category::Metro);
    assert_eq!(first.pathway.as_deref(), Some("HLTH-2012"));
    assert_eq!(first.first_math_course.as_deref(), Some("MATH110"));
    assert_eq!(first.first_math_semester, Some(0));
    assert_eq!(first.core_progress, Some(2));
    assert_eq!(first.fourth_term_completion, Some(true));
    assert_eq!(first.result, Some(EnrollmentResult::Graduated));

    let second = run.table.get("100000002").unwrap();
    assert_eq!(second.core_progress, Some(1));
    assert_eq!(second.fourth_term_completion, Some(false));
    assert_eq!(second.result, Some(EnrollmentResult::Left));

    let comp = run.table.get("100000003").unwrap();
    assert_eq!(comp.category, Category::Comp);
    assert_eq!(comp.pathway, None);
    assert_eq!(comp.core_progress, Some(0));
    assert_eq!(comp.fourth_term_completion, Some(false));
    assert_eq!(comp.result, Some(EnrollmentResult::Open));
}

#[test]
fn test_contact_attributes_take_priority_over_ir() {
    let run = run_fixture(Scope::Combined);

    let first = run.table.get("100000001").unwrap();
    assert_eq!(first.race, "Asian");
    assert_eq!(first.gender.as_deref(), Some("F"));
    assert_eq!(first.pell_eligible.as_deref(), Some("Y"));
    assert_eq!(first.department.as_deref(), Some("Health Education"));
    assert_eq!(first.mother_edu.as_deref(), Some("3"));
    assert_eq!(first.household_income, Some(1));

    let second = run.table.get("100000002").unwrap();
    assert_eq!(second.race, "Black");
    assert_eq!(second.gender.as_deref(), Some("F"));
    // Parent-education row predates the start-term cutoff.
    assert_eq!(second.mother_edu, None);

    assert_eq!(run.table.get("100000003").unwrap().race, "Hispanic/Latino");
}

#[test]
fn test_scan_diagnostics() {
    let run = run_fixture(Scope::Combined);

    assert_eq!(run.stats.files, 4);
    assert_eq!(run.stats.rows_read, 18);
    assert_eq!(run.stats.not_enrolled, 1);
    assert_eq!(run.stats.invalid_grade, 1);
    assert_eq!(run.stats.out_of_scope, 1);
    assert_eq!(run.stats.observations, 15);

    assert!(run.conflicts.contains("HLTH200", "100000001"));
    assert_eq!(run.conflicts.len(), 1);

    let diagnostics = run.diagnostics();
    assert_eq!(diagnostics.students, 3);
    assert_eq!(diagnostics.metro, 2);
    assert_eq!(diagnostics.comp, 1);
    assert_eq!(diagnostics.conflicting_courses, vec!["HLTH200".to_string()]);
    assert_eq!(diagnostics.remediation_math_students, 0);
}

#[test]
fn test_remedial_math_counted_per_student() {
    let (_dir, data) = scratch_data();
    let fall = data.join("query_data/F2012.csv");
    let mut content = fs::read_to_string(&fall).unwrap();
    content.push_str("100000002,Enrolled,CR,MATH 70\n");
    fs::write(&fall, content).unwrap();

    let config = PipelineConfig::default().with_data_dir(&data);
    let run = pipeline::run(&config, Scope::Combined).unwrap();
    assert_eq!(run.remediation_math_students, 1);
    assert_eq!(run.diagnostics().remediation_math_students, 1);

    let group = run.timelines["100000002"].get(13).unwrap();
    let remedial = group.math_courses(&config.remediation_math_courses);
    assert_eq!(remedial.len(), 1);
    assert_eq!(remedial[0].course, "MATH70");
    assert!(group.math_courses(&config.math_courses).iter().all(|o| o.course != "MATH70"));
}

#[test]
fn test_metro_scope_excludes_comparison_students() {
    let run = run_fixture(Scope::Metro);

    assert_eq!(run.table.len(), 2);
    assert!(run.table.get("100000003").is_none());
    assert!(!run.timelines.contains_key("100000003"));
    assert_eq!(run.stats.out_of_scope, 6);
}

#[test]
fn test_sequence_export_and_labels() {
    let run = run_fixture(Scope::Combined);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("spmf/input.txt");

    let summary = export_sequences(&run.table, &run.timelines, &ExportOptions::default(), &path).unwrap();
    assert_eq!(summary.sequences, 3);
    assert_eq!(summary.labels_path, dir.path().join("spmf/input_labels.txt"));

    let sequences = fs::read_to_string(&path).unwrap();
    let labels = fs::read_to_string(&summary.labels_path).unwrap();
    assert_eq!(
        sequences.lines().collect::<Vec<_>>(),
        vec![
            "HLTH100 MATH110 -1 HLTH200 -1 ENG214 -1 BIOL100 HLTH300 -1 -2",
            "HLTH101 -1 PSY171 -1 HLTH200 -1 -2",
            "ENG114 HLTH100 -1 PSY171 -1 MATH110 -1 ENG214 -1 -2",
        ]
    );
    assert_eq!(
        labels.lines().collect::<Vec<_>>(),
        vec!["100000001", "100000002", "100000003"]
    );
}

#[test]
fn test_sequence_export_with_gaps_and_filters() {
    let run = run_fixture(Scope::Combined);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gaps.txt");

    let options = ExportOptions {
        capture_gaps: true,
        ..ExportOptions::default()
    };
    export_sequences(&run.table, &run.timelines, &options, &path).unwrap();
    let sequences = fs::read_to_string(&path).unwrap();
    assert_eq!(
        sequences.lines().nth(1),
        Some("HLTH101 -1 PSY171 -1 GAP -1 HLTH200 -1 -2")
    );

    let options = ExportOptions {
        comp_only: true,
        cohort_years: BTreeSet::from([2012]),
        ..ExportOptions::default()
    };
    let summary = export_sequences(&run.table, &run.timelines, &options, &path).unwrap();
    assert_eq!(summary.sequences, 1);
    assert_eq!(fs::read_to_string(&summary.labels_path).unwrap(), "100000003\n");

    let options = ExportOptions {
        cohort_years: BTreeSet::from([2013]),
        ..ExportOptions::default()
    };
    let summary = export_sequences(&run.table, &run.timelines, &options, &path).unwrap();
    assert_eq!(summary.sequences, 0);
    assert!(fs::read_to_string(&path).unwrap().is_empty());
}

#[test]
fn test_spans_over_exported_sequences() {
    let run = run_fixture(Scope::Combined);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("input.txt");
    export_sequences(&run.table, &run.timelines, &ExportOptions::default(), &path).unwrap();

    let courses = vec!["HLTH100".to_string(), "HLTH200".to_string()];
    assert_eq!(sequence_spans(&path, &courses).unwrap(), vec![2]);

    let courses = vec!["PSY171".to_string(), "ENG214".to_string()];
    assert_eq!(sequence_spans(&path, &courses).unwrap(), vec![3]);
}

#[test]
fn test_outputs_written() {
    let run = run_fixture(Scope::Combined);
    let dir = tempfile::tempdir().unwrap();
    let table_path = dir.path().join("students.csv");
    let diagnostics_path = dir.path().join("diagnostics.json");

    write_student_table(&table_path, &run.table).unwrap();
    write_diagnostics(&diagnostics_path, &run.diagnostics()).unwrap();

    let table = fs::read_to_string(&table_path).unwrap();
    assert_eq!(table.lines().count(), 4);
    assert!(table.lines().next().unwrap().contains("core_progress"));

    let diagnostics: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&diagnostics_path).unwrap()).unwrap();
    assert_eq!(diagnostics["students_with_conflicts"], 1);
    assert_eq!(diagnostics["scan"]["rows_read"], 18);
}

#[test]
fn test_duplicate_cohort_aborts_run() {
    let (_dir, data) = scratch_data();
    let pathways = data.join("Pathways.csv");
    let mut content = fs::read_to_string(&pathways).unwrap();
    content.push_str("HLTH,2012,HLTH100,HLTH200,HLTH300,,,,\n");
    fs::write(&pathways, content).unwrap();

    let config = PipelineConfig::default().with_data_dir(&data);
    let err = pipeline::run(&config, Scope::Combined).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::DuplicateCohort { cohort }) if cohort == "HLTH-2012"
    ));
}

#[test]
fn test_comparison_cohort_in_pathway_table_gets_no_pathway() {
    let (_dir, data) = scratch_data();
    let pathways = data.join("Pathways.csv");
    let mut content = fs::read_to_string(&pathways).unwrap();
    content.push_str("COMP,2012,HLTH100,PSY171,ENG214,MATH110,,,\n");
    fs::write(&pathways, content).unwrap();

    let config = PipelineConfig::default().with_data_dir(&data);
    let run = pipeline::run(&config, Scope::Combined).unwrap();

    let comp = run.table.get("100000003").unwrap();
    assert_eq!(comp.category, Category::Comp);
    assert_eq!(comp.pathway, None);
    assert_eq!(comp.first_math_course, None);
    assert_eq!(comp.first_math_semester, None);
    assert_eq!(comp.core_progress, Some(0));

    let metro = run.table.get("100000001").unwrap();
    assert_eq!(metro.pathway.as_deref(), Some("HLTH-2012"));
    assert_eq!(metro.core_progress, Some(2));
}

#[test]
fn test_duplicate_student_aborts_run() {
    let (_dir, data) = scratch_data();
    let contacts = data.join("Contact.csv");
    let mut content = fs::read_to_string(&contacts).unwrap();
    content.push_str("c9,100000001,k1,a1,2012-2013,,,,,,,,,,\n");
    fs::write(&contacts, content).unwrap();

    let config = PipelineConfig::default().with_data_dir(&data);
    let err = pipeline::run(&config, Scope::Combined).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::DuplicateStudent { student_id, .. }) if student_id == "100000001"
    ));
}

#[test]
fn test_unknown_term_prefix_aborts_run() {
    let (_dir, data) = scratch_data();
    fs::write(
        data.join("query_data/X2014.csv"),
        "SF State ID,Status,Grade,Class\n",
    )
    .unwrap();

    let config = PipelineConfig::default().with_data_dir(&data);
    let err = pipeline::run(&config, Scope::Combined).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::UnknownTermPrefix { .. })
    ));
}

#[test]
fn test_config_file_overrides_defaults() {
    let (dir, data) = scratch_data();
    let config_path = dir.path().join("config.json");
    fs::write(
        &config_path,
        format!(
            r#"{{ "data_dir": {:?}, "progress_passing_only": false }}"#,
            data.display().to_string()
        ),
    )
    .unwrap();

    let config = PipelineConfig::load(&config_path).unwrap();
    assert!(!config.progress_passing_only);
    let run = pipeline::run(&config, Scope::Combined).unwrap();

    // The withdrawn capstone now counts as taken.
    assert_eq!(run.table.get("100000001").unwrap().core_progress, Some(3));
}

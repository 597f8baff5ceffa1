use super::*;
use dbup_core::{DirectoryClass, UpdateScript};
use dbup_updater::{Classification, DeadReference, PendingReason, PlannedFile};
use std::path::PathBuf;

fn planned(path: &str, classification: Classification) -> PlannedFile {
    PlannedFile {
        script: UpdateScript {
            path: path.to_string(),
            hash: "0123456789abcdef".to_string(),
            location: PathBuf::from(path),
            directory_class: DirectoryClass::Updates,
        },
        classification,
    }
}

fn sample_plan() -> UpdatePlan {
    UpdatePlan {
        entries: vec![
            planned("2024_01_01_00.sql", Classification::Applied),
            planned(
                "2024_01_02_00.sql",
                Classification::Pending(PendingReason::New),
            ),
            planned(
                "2024_01_03_00.sql",
                Classification::Renamed {
                    from: "old.sql".to_string(),
                },
            ),
        ],
        dead_references: vec![DeadReference {
            path: "gone.sql".to_string(),
            missing_runs: 2,
        }],
        recovered_references: vec![],
    }
}

#[test]
fn test_summarize_counts_actions() {
    let summary = summarize(DatabaseKind::World, &sample_plan());
    assert_eq!(summary, "World: 1 to apply, 1 renamed, 0 to archive, 1 dead");
}

#[test]
fn test_summarize_noop() {
    let plan = UpdatePlan {
        entries: vec![planned("a.sql", Classification::Applied)],
        ..UpdatePlan::default()
    };
    assert_eq!(summarize(DatabaseKind::Auth, &plan), "Auth: up-to-date");
}

#[test]
fn test_append_flattens_rows() {
    let mut report = PlanReport {
        files: Vec::new(),
        dead_references: Vec::new(),
    };
    append(&mut report, DatabaseKind::Characters, sample_plan());

    assert_eq!(report.files.len(), 3);
    assert_eq!(report.files[1].action, "new");
    assert_eq!(report.files[2].action, "renamed from old.sql");
    assert_eq!(report.files[0].directory, "updates");
    assert_eq!(report.dead_references[0].path, "gone.sql");
    assert_eq!(report.dead_references[0].database, DatabaseKind::Characters);
}

#[test]
fn test_report_json_shape() {
    let mut report = PlanReport {
        files: Vec::new(),
        dead_references: Vec::new(),
    };
    append(&mut report, DatabaseKind::Auth, sample_plan());

    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["files"][1]["database"], "auth");
    assert_eq!(value["files"][1]["action"], "new");
    assert_eq!(value["dead_references"][0]["missing_runs"], 2);
}

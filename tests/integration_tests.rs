//! Integration tests for deviceiq
//!
//! These tests drive the CLI end-to-end over temporary project directories.
//! The flow catalog is redirected into each test's own temp home via
//! DEVICEIQ_HOME so tests never touch the real user configuration.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to create a deviceiq Command bound to a project dir + home.
fn deviceiq(project: &TempDir, home: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("deviceiq");
    cmd.current_dir(project.path());
    cmd.env("DEVICEIQ_HOME", home.path());
    cmd
}

fn create_dirs() -> (TempDir, TempDir) {
    (TempDir::new().unwrap(), TempDir::new().unwrap())
}

fn init_project(project: &TempDir, home: &TempDir) {
    deviceiq(project, home).arg("init").assert().success();
}

/// Write the standard four-device usage table used across tests.
fn write_usage_csv(project: &TempDir) -> std::path::PathBuf {
    let path = project.path().join("usage.csv");
    fs::write(
        &path,
        "device_model,os_version,usage_percent\n\
         Pixel 8,14,40\n\
         Galaxy S24,14,30\n\
         iPhone 15,17.4,20\n\
         Moto G,13,10\n",
    )
    .unwrap();
    path
}

fn generate_local(project: &TempDir, home: &TempDir) {
    write_usage_csv(project);
    deviceiq(project, home)
        .args(["generate", "usage.csv", "--threshold", "80", "--local"])
        .assert()
        .success();
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_help() {
        let (project, home) = create_dirs();
        deviceiq(&project, &home).arg("--help").assert().success();
    }

    #[test]
    fn test_version() {
        let (project, home) = create_dirs();
        deviceiq(&project, &home).arg("--version").assert().success();
    }

    #[test]
    fn test_init_creates_session_dir() {
        let (project, home) = create_dirs();
        deviceiq(&project, &home)
            .arg("init")
            .assert()
            .success()
            .stdout(predicate::str::contains("Initialized deviceiq project"));
        assert!(project.path().join(".deviceiq").exists());
        assert!(project.path().join(".deviceiq/session.json").exists());
    }

    #[test]
    fn test_init_idempotent() {
        let (project, home) = create_dirs();
        init_project(&project, &home);
        deviceiq(&project, &home)
            .arg("init")
            .assert()
            .success()
            .stdout(predicate::str::contains("already initialized"));
    }

    #[test]
    fn test_matrix_requires_init() {
        let (project, home) = create_dirs();
        deviceiq(&project, &home)
            .arg("matrix")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Not initialized"));
    }

    #[test]
    fn test_matrix_empty_session() {
        let (project, home) = create_dirs();
        init_project(&project, &home);
        deviceiq(&project, &home)
            .arg("matrix")
            .assert()
            .success()
            .stdout(predicate::str::contains("No matrix yet"));
    }

    #[test]
    fn test_reset_requires_force() {
        let (project, home) = create_dirs();
        init_project(&project, &home);
        deviceiq(&project, &home)
            .arg("reset")
            .assert()
            .success()
            .stdout(predicate::str::contains("--force"));
    }
}

// =============================================================================
// Matrix Generation (local allocator)
// =============================================================================

mod generate {
    use super::*;

    #[test]
    fn test_local_generate_allocates_under_threshold() {
        let (project, home) = create_dirs();
        init_project(&project, &home);
        generate_local(&project, &home);

        deviceiq(&project, &home)
            .arg("matrix")
            .assert()
            .success()
            .stdout(predicate::str::contains("Pixel 8"))
            .stdout(predicate::str::contains("Galaxy S24"))
            .stdout(predicate::str::contains("iPhone 15").not())
            .stdout(predicate::str::contains(
                "2 of 4 devices in matrix, covering 70.00% of 100.00% total usage",
            ));
    }

    #[test]
    fn test_local_generate_rejects_bad_threshold() {
        let (project, home) = create_dirs();
        init_project(&project, &home);
        write_usage_csv(&project);
        deviceiq(&project, &home)
            .args(["generate", "usage.csv", "--threshold", "800", "--local"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("out of range"));
    }

    #[test]
    fn test_local_generate_rejects_group_by() {
        let (project, home) = create_dirs();
        init_project(&project, &home);
        write_usage_csv(&project);
        deviceiq(&project, &home)
            .args([
                "generate",
                "usage.csv",
                "--local",
                "--group-by",
                "os_version",
            ])
            .assert()
            .failure()
            .stderr(predicate::str::contains("drop --local"));
    }

    #[test]
    fn test_generate_requires_init() {
        let (project, home) = create_dirs();
        write_usage_csv(&project);
        deviceiq(&project, &home)
            .args(["generate", "usage.csv", "--local"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Not initialized"));
    }
}

// =============================================================================
// Overrides
// =============================================================================

mod overrides {
    use super::*;

    #[test]
    fn test_pin_admits_a_dropped_device() {
        let (project, home) = create_dirs();
        init_project(&project, &home);
        generate_local(&project, &home);

        deviceiq(&project, &home)
            .args(["pin", "Moto G", "13"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Pinned Moto G (13)"));

        deviceiq(&project, &home)
            .arg("matrix")
            .assert()
            .success()
            .stdout(predicate::str::contains("Moto G"));
    }

    #[test]
    fn test_exclude_removes_a_device() {
        let (project, home) = create_dirs();
        init_project(&project, &home);
        generate_local(&project, &home);

        deviceiq(&project, &home)
            .args(["exclude", "Galaxy S24", "14"])
            .assert()
            .success();

        deviceiq(&project, &home)
            .arg("matrix")
            .assert()
            .success()
            .stdout(predicate::str::contains("Excluded: Galaxy S24 (14)"))
            .stdout(predicate::str::contains(
                "1 of 4 devices in matrix, covering 40.00%",
            ));
    }

    #[test]
    fn test_pin_rejected_while_excluded() {
        let (project, home) = create_dirs();
        init_project(&project, &home);
        generate_local(&project, &home);

        deviceiq(&project, &home)
            .args(["exclude", "Galaxy S24", "14"])
            .assert()
            .success();
        deviceiq(&project, &home)
            .args(["pin", "Galaxy S24", "14"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("currently excluded"));
    }

    #[test]
    fn test_pin_survives_later_exclusion() {
        let (project, home) = create_dirs();
        init_project(&project, &home);
        generate_local(&project, &home);

        deviceiq(&project, &home)
            .args(["pin", "Galaxy S24", "14"])
            .assert()
            .success();
        deviceiq(&project, &home)
            .args(["exclude", "Galaxy S24", "14"])
            .assert()
            .success()
            .stdout(predicate::str::contains("the pin keeps it in the matrix"));

        deviceiq(&project, &home)
            .arg("matrix")
            .assert()
            .success()
            .stdout(predicate::str::contains("Galaxy S24"));
    }
}

// =============================================================================
// Flow Assignments & Catalog
// =============================================================================

mod flows {
    use super::*;

    #[test]
    fn test_default_assignment_is_the_full_catalog() {
        let (project, home) = create_dirs();
        init_project(&project, &home);
        generate_local(&project, &home);

        deviceiq(&project, &home)
            .args(["flows", "show", "Pixel 8", "14"])
            .assert()
            .success()
            .stdout(predicate::str::contains("LoginTest"))
            .stdout(predicate::str::contains("CheckoutTest"));
    }

    #[test]
    fn test_toggle_off_then_on_moves_flow_to_the_end() {
        let (project, home) = create_dirs();
        init_project(&project, &home);
        generate_local(&project, &home);

        for _ in 0..2 {
            deviceiq(&project, &home)
                .args(["flows", "toggle", "Pixel 8", "14", "LoginTest"])
                .assert()
                .success();
        }
        deviceiq(&project, &home)
            .args(["flows", "show", "Pixel 8", "14"])
            .assert()
            .success()
            .stdout(predicate::str::contains("4. LoginTest"));
    }

    #[test]
    fn test_reorder_moves_first_to_last() {
        let (project, home) = create_dirs();
        init_project(&project, &home);
        generate_local(&project, &home);

        deviceiq(&project, &home)
            .args(["flows", "reorder", "Pixel 8", "14", "1", "4"])
            .assert()
            .success()
            .stdout(predicate::str::contains("4. LoginTest"))
            .stdout(predicate::str::contains("1. SearchTest"));
    }

    #[test]
    fn test_flow_edits_rejected_while_excluded() {
        let (project, home) = create_dirs();
        init_project(&project, &home);
        generate_local(&project, &home);

        deviceiq(&project, &home)
            .args(["exclude", "Pixel 8", "14"])
            .assert()
            .success();
        deviceiq(&project, &home)
            .args(["flows", "toggle", "Pixel 8", "14", "LoginTest"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("currently excluded"));
    }

    #[test]
    fn test_catalog_defaults_and_add() {
        let (project, home) = create_dirs();
        deviceiq(&project, &home)
            .args(["catalog", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("LoginTest"))
            .stdout(predicate::str::contains("CheckoutTest"));

        deviceiq(&project, &home)
            .args(["catalog", "add", "SmokeTest"])
            .assert()
            .success();
        deviceiq(&project, &home)
            .args(["catalog", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("5. SmokeTest"));
        assert!(home.path().join("flows.json").exists());
    }

    #[test]
    fn test_catalog_remove_strips_assignments() {
        let (project, home) = create_dirs();
        init_project(&project, &home);
        generate_local(&project, &home);

        deviceiq(&project, &home)
            .args(["catalog", "remove", "SearchTest"])
            .assert()
            .success();
        deviceiq(&project, &home)
            .args(["flows", "show", "Pixel 8", "14"])
            .assert()
            .success()
            .stdout(predicate::str::contains("SearchTest").not());
    }
}

// =============================================================================
// Execution Status
// =============================================================================

mod status {
    use super::*;

    #[test]
    fn test_set_and_show_status() {
        let (project, home) = create_dirs();
        init_project(&project, &home);
        generate_local(&project, &home);

        deviceiq(&project, &home)
            .args(["status", "set", "Pixel 8", "14", "LoginTest", "passed"])
            .assert()
            .success();
        deviceiq(&project, &home)
            .args(["status", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Pixel 8 (14)"))
            .stdout(predicate::str::contains("passed"));
    }

    #[test]
    fn test_invalid_status_is_rejected() {
        let (project, home) = create_dirs();
        init_project(&project, &home);
        deviceiq(&project, &home)
            .args(["status", "set", "Pixel 8", "14", "LoginTest", "done"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid status"));
    }

    #[test]
    fn test_status_survives_reallocation() {
        let (project, home) = create_dirs();
        init_project(&project, &home);
        generate_local(&project, &home);

        deviceiq(&project, &home)
            .args(["status", "set", "Pixel 8", "14", "LoginTest", "failed"])
            .assert()
            .success();
        generate_local(&project, &home);
        deviceiq(&project, &home)
            .args(["status", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("failed"));
    }
}

// =============================================================================
// Plans
// =============================================================================

mod plans {
    use super::*;

    /// Pull a plan id (uuid token) out of `plan list` output by plan name.
    fn find_plan_id(stdout: &str, name: &str) -> String {
        stdout
            .lines()
            .find(|l| l.contains(name))
            .and_then(|l| {
                l.split_whitespace()
                    .find(|t| t.len() == 36 && t.chars().filter(|c| *c == '-').count() == 4)
            })
            .unwrap_or_else(|| panic!("no plan id found for '{}'", name))
            .to_string()
    }

    #[test]
    fn test_export_json_round_trips_through_import() {
        let (project, home) = create_dirs();
        init_project(&project, &home);
        generate_local(&project, &home);

        let artifact = project.path().join("plan.json");
        deviceiq(&project, &home)
            .args(["plan", "export", "--output"])
            .arg(&artifact)
            .assert()
            .success();

        deviceiq(&project, &home)
            .args(["plan", "import"])
            .arg(&artifact)
            .assert()
            .success()
            .stdout(predicate::str::contains("2 devices"));

        // Download the imported plan and compare byte-for-byte.
        let list = deviceiq(&project, &home)
            .args(["plan", "list"])
            .output()
            .unwrap();
        let stdout = String::from_utf8(list.stdout).unwrap();
        let id = find_plan_id(&stdout, "plan.json");

        let downloaded = deviceiq(&project, &home)
            .args(["plan", "download", &id])
            .output()
            .unwrap();
        assert_eq!(
            String::from_utf8(downloaded.stdout).unwrap(),
            fs::read_to_string(&artifact).unwrap()
        );
    }

    #[test]
    fn test_export_csv_header_and_pipe_delimited_flows() {
        let (project, home) = create_dirs();
        init_project(&project, &home);
        generate_local(&project, &home);

        deviceiq(&project, &home)
            .args(["plan", "export", "--format", "csv"])
            .assert()
            .success()
            .stdout(predicate::str::starts_with(
                "Device Model,OS Version,Test Flows",
            ))
            .stdout(predicate::str::contains(
                "LoginTest|SearchTest|AddToCartTest|CheckoutTest",
            ));
    }

    #[test]
    fn test_import_rejects_malformed_artifacts() {
        let (project, home) = create_dirs();
        init_project(&project, &home);
        let bad = project.path().join("bad.json");
        fs::write(&bad, "{definitely not a plan").unwrap();
        deviceiq(&project, &home)
            .args(["plan", "import"])
            .arg(&bad)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to parse plan artifact"));

        deviceiq(&project, &home)
            .args(["plan", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No saved plans"));
    }

    #[test]
    fn test_load_plan_resets_overrides_and_defaults_usage() {
        let (project, home) = create_dirs();
        init_project(&project, &home);
        generate_local(&project, &home);

        deviceiq(&project, &home)
            .args(["pin", "Moto G", "13"])
            .assert()
            .success();
        deviceiq(&project, &home)
            .args(["plan", "save", "baseline"])
            .assert()
            .success();

        let list = deviceiq(&project, &home)
            .args(["plan", "list"])
            .output()
            .unwrap();
        let stdout = String::from_utf8(list.stdout).unwrap();
        let id = find_plan_id(&stdout, "baseline");

        deviceiq(&project, &home)
            .args(["plan", "load", &id])
            .assert()
            .success()
            .stdout(predicate::str::contains("reset to defaults"));

        // Usage figures are not part of the plan format; they come back as 0.
        deviceiq(&project, &home)
            .arg("matrix")
            .assert()
            .success()
            .stdout(predicate::str::contains("Moto G"))
            .stdout(predicate::str::contains("covering 0.00% of 0.00%"));
    }

    #[test]
    fn test_delete_clears_selection() {
        let (project, home) = create_dirs();
        init_project(&project, &home);
        generate_local(&project, &home);

        deviceiq(&project, &home)
            .args(["plan", "save", "snap"])
            .assert()
            .success();
        let list = deviceiq(&project, &home)
            .args(["plan", "list"])
            .output()
            .unwrap();
        let stdout = String::from_utf8(list.stdout).unwrap();
        let id = find_plan_id(&stdout, "snap");

        deviceiq(&project, &home)
            .args(["plan", "select", &id])
            .assert()
            .success();
        deviceiq(&project, &home)
            .args(["plan", "delete", &id])
            .assert()
            .success();
        deviceiq(&project, &home)
            .args(["plan", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No saved plans"));
    }
}

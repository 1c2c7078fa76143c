// Integration tests for the saprecon binary: exit codes and the --json stdout contract.

use std::fs;
use std::process::Command;

use tempfile::TempDir;

const HEADER: &str = "SAP export\nDocNum,ItemCode,Description,GPBefDisc,PriceAfVAT,GTotal,Quantity\n";

fn saprecon() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_saprecon"));
    for var in ["SAPRECON_CONFIG", "SAPRECON_MASTER", "SAPRECON_HEADER_ROWS", "SAPRECON_KEYWORD", "RUST_LOG"] {
        cmd.env_remove(var);
    }
    cmd
}

fn export_folder() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("sap1_0501.txt"),
        format!("{HEADER}D1,SKU1,ส่วนลดติดลบ,0,0,0,1\nD2,SKU1,plain,0,0,0,1\n"),
    )
    .unwrap();
    fs::write(
        dir.path().join("sap2_0501.txt"),
        format!("{HEADER}D1,SKU1,Gift (แถม),0,0,0,2\nD2,SKU1,Other,0,0,0,1\n"),
    )
    .unwrap();
    fs::write(dir.path().join("msrp.csv"), "code,msrp\nSKU1,99\n").unwrap();
    dir
}

#[test]
fn run_json_is_single_value_on_stdout() {
    let dir = export_folder();
    let output = saprecon()
        .args(["-q", "run"])
        .arg(dir.path())
        .arg("--master")
        .arg(dir.path().join("msrp.csv"))
        .arg("--json")
        .output()
        .expect("saprecon run --json");

    assert!(
        output.status.success(),
        "exit code: {:?}\nstderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let val: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(val["keyword"]["doc_nums"], serde_json::json!(["D1"]));
    assert_eq!(val["enrichment"]["secondary_rows_updated"], 1);
    assert!(dir.path().join("sap2_0501.txt.bak").exists());
}

#[test]
fn env_master_is_honoured() {
    let dir = export_folder();
    let output = saprecon()
        .env("SAPRECON_MASTER", dir.path().join("msrp.csv"))
        .args(["-q", "run"])
        .arg(dir.path())
        .arg("--no-in-place")
        .output()
        .unwrap();

    assert!(output.status.success());
    let updated = fs::read_to_string(dir.path().join("minus_0/sap2_main_updated.txt")).unwrap();
    assert!(updated.contains("D1,SKU1,Gift,99.00,99.00,198.00,2\n"));
}

#[test]
fn missing_input_exits_4() {
    let dir = TempDir::new().unwrap();
    let output = saprecon().args(["-q", "run"]).arg(dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(String::from_utf8_lossy(&output.stderr).contains("hint:"));
}

#[test]
fn invalid_config_exits_3() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("recon.toml");
    fs::write(&config, "[marker]\ntext = \"\"\n").unwrap();

    let output = saprecon().arg("validate").arg(&config).output().unwrap();
    assert_eq!(output.status.code(), Some(3));

    let output = saprecon().arg("-c").arg(&config).arg("config").output().unwrap();
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn config_prints_parsable_toml() {
    let output = saprecon().args(["--keyword", "NEG", "config"]).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[marker]"));
    assert!(stdout.contains("text = \"NEG\""));
}

#[test]
fn missing_columns_exit_5() {
    let dir = export_folder();
    fs::write(dir.path().join("sap2_0501.txt"), "SAP export\nDocNum,ItemCode\nD1,SKU1\n").unwrap();

    let output = saprecon()
        .args(["-q", "run"])
        .arg(dir.path())
        .arg("--master")
        .arg(dir.path().join("msrp.csv"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(5));
    assert!(!dir.path().join("minus_0").exists());
}

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const ROSTER: &str = r#"{
  "cmd": { "name": "Captain", "is_commander": true, "cp": { "current": 1, "cap": 6 } },
  "a": { "name": "Alpha", "effects": [ { "key": "brace", "label": "Brace" } ] },
  "b": { "name": "Bravo", "role": "ranged", "weapon": "bow" }
}"#;

fn roster_in(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("roster.json");
    fs::write(&path, ROSTER).unwrap();
    path
}

fn cli(roster: &Path) -> Command {
    let mut cmd = Command::cargo_bin("squad-cli").unwrap();
    cmd.arg("--roster").arg(roster).arg("--seed").arg("7");
    cmd
}

fn unit_json(roster: &Path, id: &str) -> serde_json::Value {
    let text = fs::read_to_string(roster).unwrap();
    let v: serde_json::Value = serde_json::from_str(&text).unwrap();
    v[id].clone()
}

#[test]
fn roll_prints_one_line_per_roll() {
    let out = Command::cargo_bin("squad-cli")
        .unwrap()
        .args(["roll", "2d6+3", "--times", "3"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.lines().count(), 3);
    assert!(text.lines().all(|l| l.contains('→')));
}

#[test]
fn malformed_expression_is_an_error() {
    Command::cargo_bin("squad-cli")
        .unwrap()
        .args(["roll", "2x6"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid dice expression"));
}

#[test]
fn roster_is_required_outside_roll() {
    Command::cargo_bin("squad-cli")
        .unwrap()
        .args(["tick"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--roster"));
}

#[test]
fn attack_rewrites_the_roster() {
    let dir = TempDir::new().unwrap();
    let roster = roster_in(&dir);
    cli(&roster)
        .args(["attack", "--actor", "a", "--target", "b"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[TN][Alpha] Melee"))
        .stdout(predicate::str::contains("[ROLL][Alpha]"));
    assert_eq!(unit_json(&roster, "a")["last_target"], "Bravo");
    assert!(unit_json(&roster, "b")["hp"].as_i64().unwrap() < 100);
}

#[test]
fn json_reports_parse() {
    let dir = TempDir::new().unwrap();
    let roster = roster_in(&dir);
    let out = cli(&roster)
        .args(["--json", "attack", "--actor", "b", "--target", "a", "--ranged"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let report: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(report["actor"], "Bravo");
    assert_eq!(report["label"], "Ranged");
    assert!(report["tn"].as_i64().unwrap() >= 5);
}

#[test]
fn listing_shows_the_sword_catalog() {
    let dir = TempDir::new().unwrap();
    let roster = roster_in(&dir);
    cli(&roster)
        .args(["maneuvers", "--actor", "a"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mordhau"))
        .stdout(predicate::str::contains("flank"))
        .stdout(predicate::str::contains("bow_volley").not());
}

#[test]
fn maneuver_without_target_fails_and_keeps_the_roster() {
    let dir = TempDir::new().unwrap();
    let roster = roster_in(&dir);
    cli(&roster)
        .args(["maneuver", "--actor", "a", "--key", "flank"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("needs exactly one selected enemy"));
    assert_eq!(fs::read_to_string(&roster).unwrap(), ROSTER);
}

#[test]
fn short_wallet_rejects_the_command() {
    let dir = TempDir::new().unwrap();
    let roster = roster_in(&dir);
    cli(&roster)
        .args(["command", "--commander", "cmd", "--squad", "a", "--kind", "formation"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not enough command points: need 2, have 1"));
    assert_eq!(fs::read_to_string(&roster).unwrap(), ROSTER);
}

#[test]
fn orders_spend_a_point() {
    let dir = TempDir::new().unwrap();
    let roster = roster_in(&dir);
    cli(&roster)
        .args(["command", "--commander", "cmd", "--squad", "a", "--kind", "orders", "--order", "hold"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[CP][Captain] spent 1 (0 left)"));
    assert_eq!(unit_json(&roster, "a")["standing_order"], "hold");
    assert_eq!(unit_json(&roster, "cmd")["cp"]["current"], 0);
}

#[test]
fn tick_expires_one_round_effects() {
    let dir = TempDir::new().unwrap();
    let roster = roster_in(&dir);
    cli(&roster)
        .arg("tick")
        .assert()
        .success()
        .stdout(predicate::str::contains("[COND][Alpha] Brace expires"));
    assert_eq!(unit_json(&roster, "a")["effects"], serde_json::json!([]));
}

#[test]
fn cp_admin_clamps_to_the_cap() {
    let dir = TempDir::new().unwrap();
    let roster = roster_in(&dir);
    cli(&roster)
        .args(["cp", "--unit", "cmd", "--add", "10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[CP][cmd] 6/6"));
    cli(&roster)
        .args(["cp", "--unit", "cmd", "--add", "-9"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[CP][cmd] 0/6"));
}

#[test]
fn roster_with_bom_is_read() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("roster.json");
    let mut bytes = vec![0xEF, 0xBB, 0xBF];
    bytes.extend_from_slice(ROSTER.as_bytes());
    fs::write(&path, bytes).unwrap();
    cli(&path).args(["cp", "--unit", "cmd"]).assert().success();
}

#[test]
fn skirmish_simulation_reports_rates() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.json");
    let b = dir.path().join("b.json");
    fs::write(&a, r#"{ "name": "Swords", "experience_tier": 1 }"#).unwrap();
    fs::write(&b, r#"{ "name": "Pikes", "weapon": "polearm" }"#).unwrap();
    Command::cargo_bin("simulate-skirmish")
        .unwrap()
        .arg("--attacker")
        .arg(&a)
        .arg("--defender")
        .arg(&b)
        .args(["--trials", "20", "--max-rounds", "10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("attacker wins:"))
        .stdout(predicate::str::contains("median rounds:"));
}

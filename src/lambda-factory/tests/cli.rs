//! Binary-level checks that never reach AWS.

use assert_cmd::Command;

fn lambda_factory() -> Command {
    let mut cmd = Command::cargo_bin("lambda-factory").unwrap();
    cmd.env_remove("LAMBDA_FACTORY_CONFIG");
    cmd
}

#[test]
fn help_lists_options() {
    let output = lambda_factory().arg("--help").assert().success();
    let stdout = String::from_utf8_lossy(&output.get_output().stdout).into_owned();

    assert!(stdout.contains("--name <NAME>"), "{stdout}");
    assert!(stdout.contains("--config <CONFIG>"), "{stdout}");
    assert!(stdout.contains("--verbose"), "{stdout}");
}

#[test]
fn missing_explicit_config_fails_before_prompting() {
    let dir = tempfile::tempdir().unwrap();
    let output = lambda_factory()
        .current_dir(dir.path())
        .args(["--config", "nope.toml"])
        .assert()
        .failure()
        .code(1);
    let stderr = String::from_utf8_lossy(&output.get_output().stderr).into_owned();

    assert!(
        stderr.contains("Error: Failed to load configuration: reading "),
        "{stderr}"
    );
    assert!(!stderr.contains("Something went wrong"), "{stderr}");
}

#[test]
fn invalid_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("lambda-factory.toml"),
        "[function]\ntimeout = 0\n",
    )
    .unwrap();

    let output = lambda_factory()
        .current_dir(dir.path())
        .assert()
        .failure()
        .code(1);
    let stderr = String::from_utf8_lossy(&output.get_output().stderr).into_owned();

    assert!(
        stderr.contains("function.timeout must be between 1 and 900 seconds, got 0"),
        "{stderr}"
    );
}

#[test]
fn config_can_come_from_the_environment() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("custom.toml"), "[install]\ncommand = []\n").unwrap();

    let output = lambda_factory()
        .current_dir(dir.path())
        .env("LAMBDA_FACTORY_CONFIG", "custom.toml")
        .assert()
        .failure()
        .code(1);
    let stderr = String::from_utf8_lossy(&output.get_output().stderr).into_owned();

    assert!(
        stderr.contains("install.command must name a program to run"),
        "{stderr}"
    );
}

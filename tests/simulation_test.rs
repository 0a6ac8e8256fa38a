use std::process::Command;

fn run_headless(ticks: u32, extra: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_voronoi_city"))
        .args(["--map-size", "200", "--seed", "7"])
        .arg("--ticks")
        .arg(ticks.to_string())
        .args(extra)
        .env("RUST_LOG", "warn,voronoi_city=info")
        .output()
        .expect("Failed to execute simulation")
}

/// Test that the simulation runs in headless mode without crashing
#[test]
fn test_headless_simulation_runs() {
    let output = run_headless(300, &[]);

    assert!(
        output.status.success(),
        "Simulation failed to run in headless mode. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("SIMULATION COMPLETE"),
        "Simulation did not complete properly. stderr: {}",
        stderr
    );
}

/// Test that run statistics are logged
#[test]
fn test_simulation_statistics_logged() {
    let output = run_headless(300, &["--destroy", "3"]);
    assert!(output.status.success(), "Simulation failed to run");

    let stderr = String::from_utf8_lossy(&output.stderr);
    for key in [
        "Commutes started:",
        "Commutes completed:",
        "Structures destroyed:",
        "Agents relocated:",
        "Completion rate:",
    ] {
        assert!(stderr.contains(key), "Missing '{}' statistic", key);
    }

    let destroyed_line = stderr
        .lines()
        .find(|line| line.contains("Structures destroyed:"))
        .expect("Could not find 'Structures destroyed' line");
    let destroyed: u32 = destroyed_line
        .split("Structures destroyed:")
        .nth(1)
        .and_then(|s| s.trim().parse().ok())
        .expect("Could not parse destroyed count");
    assert_eq!(destroyed, 3);
}

/// Test that the ASCII map goes to stdout
#[test]
fn test_map_is_printed() {
    let output = run_headless(10, &["--map"]);
    assert!(output.status.success(), "Simulation failed to run");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains('#'),
        "Map should show roads. stdout: {}",
        stdout
    );
    assert!(stdout.lines().count() >= 80);
}

/// Test that a destroy count larger than the tick count is accepted
#[test]
fn test_destroy_count_beyond_ticks_runs() {
    let output = run_headless(5, &["--destroy", "4294967295"]);
    assert!(
        output.status.success(),
        "Simulation failed with a huge destroy count. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("SIMULATION COMPLETE"));
    assert!(stderr.contains("Structures destroyed: 5"));
}

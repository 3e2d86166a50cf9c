//! End-to-end tests driving the compiled `evo-sim` binary against small
//! config files, asserting on exit codes and the output files it writes.

use std::path::{Path, PathBuf};
use std::process::Command;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("evo_sim_cli_test_{name}"));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn run_cli(input: &Path, output: &Path) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_evo-sim"))
        .arg("-i")
        .arg(input)
        .arg("-o")
        .arg(output)
        .arg("--seed")
        .arg("7")
        .output()
        .expect("failed to run evo-sim")
}

#[test]
fn a_valid_config_runs_to_completion_and_writes_end_of_replica_files() {
    let dir = scratch_dir("valid_config");
    let input = dir.join("config.txt");
    let output = dir.join("out");
    std::fs::write(
        &input,
        "sim_params\tnum_simulations\t2\n\
         sim_params\tmax_time\t5\n\
         sim_params\tmax_cells\t200\n\
         pop_params\tdeath_rate\t0.1\n\
         clone\tSimple\t0\t5\tbirth_rate,1.0\tmut_prob,0.0\n\
         writer\tEndTime\n\
         writer\tEndPop\n\
         writer\tIsExtinct\n",
    )
    .unwrap();

    let result = run_cli(&input, &output);
    assert!(result.status.success(), "stderr: {}", String::from_utf8_lossy(&result.stderr));

    let end_time = std::fs::read_to_string(output.join("end_time.oevo")).unwrap();
    assert_eq!(end_time.lines().count(), 2);

    let end_pop = std::fs::read_to_string(output.join("end_pop.oevo")).unwrap();
    assert_eq!(end_pop.lines().count(), 2);

    let extinction = std::fs::read_to_string(output.join("extinction.oevo")).unwrap();
    assert_eq!(extinction.lines().count(), 2);
}

#[test]
fn a_malformed_config_exits_nonzero_and_writes_input_err() {
    let dir = scratch_dir("malformed_config");
    let input = dir.join("config.txt");
    let output = dir.join("out");
    std::fs::write(&input, "bogus_keyword\tfoo\nsim_params\tbogus_key\t1\n").unwrap();

    let result = run_cli(&input, &output);
    assert!(!result.status.success());

    let errors = std::fs::read_to_string(output.join("input_err.eevo")).unwrap();
    assert_eq!(errors.lines().count(), 2);
    assert!(errors.contains("line 1"));
    assert!(errors.contains("line 2"));
}

#[test]
fn a_config_that_fails_check_init_exits_nonzero_without_running() {
    let dir = scratch_dir("not_runnable");
    let input = dir.join("config.txt");
    let output = dir.join("out");
    // Every clone has a zero birth rate and the population has no death
    // rate either, so total event rate is zero: check_init should reject
    // this before any replica starts, rather than advance() erroring out
    // mid-run or spinning forever.
    std::fs::write(
        &input,
        "sim_params\tnum_simulations\t1\n\
         sim_params\tmax_time\t5\n\
         sim_params\tmax_cells\t200\n\
         pop_params\tdeath_rate\t0.0\n\
         clone\tSimple\t0\t5\tbirth_rate,0.0\tmut_prob,0.0\n",
    )
    .unwrap();

    let result = run_cli(&input, &output);
    assert!(!result.status.success());
    assert!(!output.join("end_time.oevo").exists());
}

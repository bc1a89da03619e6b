use std::env;
use std::fs;
use std::path::Path;

use anyhow::anyhow;
use datatest_stable::{harness, Result};

use mayalias_engine::flow::Workflow;
use mayalias_shared::logging;

fn run_test(path_output: &Path) -> Result<()> {
    // config based on environment variable
    let verify = env::var("VERIFY").map_or(true, |v| v != "0");
    if let Ok(level) = env::var("LOG") {
        // only the first test case gets to install the logger
        let _ = logging::setup(level.parse::<usize>().ok());
    }

    // load the expected result
    let expected = fs::read_to_string(path_output)
        .expect("unable to load content from the expected output file");

    // locate the serialized module
    let path_dir = path_output
        .parent()
        .expect("unable to locate the test case directory");
    let path_input = path_dir.join("input.json");

    // run the workflow, either a report or an error message is expected
    let flow = Workflow::new(vec![path_input], false, verify);
    let obtained = match flow.execute() {
        Ok(reports) => reports.iter().map(|r| r.to_string()).collect::<String>(),
        Err(err) => format!("{}\n", err),
    };

    // report back
    if expected == obtained {
        Ok(())
    } else {
        println!(
            "Result mismatch:\n{}\n<- expected vs obtained ->\n{}",
            expected, obtained
        );
        Err(anyhow!("result does not match with expectation").into())
    }
}

harness!(run_test, "tests/cases", r"output$");

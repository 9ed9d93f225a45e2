use anyhow::Result;
use northstar_voice::{Scenario, DEFAULT_SCENARIO_KEY};

/// Run the `northstar scenarios` command.
pub fn run() -> Result<()> {
    println!("{:<22} LABEL", "KEY");
    println!("{}", "-".repeat(52));
    for scenario in Scenario::ALL {
        let marker = if scenario.key() == DEFAULT_SCENARIO_KEY {
            " (default)"
        } else {
            ""
        };
        println!("{:<22} {}{marker}", scenario.key(), scenario.label());
    }
    Ok(())
}

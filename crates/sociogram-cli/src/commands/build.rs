use std::path::Path;

use anyhow::{Context, Result};

use sociogram_core::Analysis;

use super::{load_config, write_output, AnalysisArgs, InputArgs};
use crate::ui;

pub fn run(
    config_path: Option<&Path>,
    input: &InputArgs,
    analysis: &AnalysisArgs,
    print_report: bool,
    output: Option<&Path>,
) -> Result<()> {
    let config = load_config(config_path, analysis)?;
    let input = input.load()?;

    let spinner = ui::spinner("Building interaction graph");
    let result = Analysis::new(config).run(input);
    spinner.finish_and_clear();
    let output_graph = result?;

    ui::report(&output_graph.report);
    if print_report {
        let json = serde_json::to_string_pretty(&output_graph.report)
            .context("Failed to serialize run report")?;
        eprintln!("{}", json);
    }

    let export = output_graph.export();
    ui::success(&format!(
        "{} actors, {} edges",
        export.nodes.len(),
        export.edges.len()
    ));

    let json = export.to_json().context("Failed to serialize graph")?;
    write_output(output, &json)
}

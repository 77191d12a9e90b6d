use std::path::Path;

use anyhow::{Context, Result};

use sociogram_core::Analysis;
use sociogram_graph::{Focus, Projection, Structure};

use super::{load_config, write_output, AnalysisArgs, InputArgs};
use crate::ui;

pub fn run(
    config_path: Option<&Path>,
    input: &InputArgs,
    analysis: &AnalysisArgs,
    focus: Option<Focus>,
    structure: Option<&str>,
    output: Option<&Path>,
) -> Result<()> {
    let config = load_config(config_path, analysis)?;
    let focus = focus.unwrap_or(config.focus);
    let structure = structure.map(Structure::parse).unwrap_or(config.structure);
    let input = input.load()?;

    let spinner = ui::spinner("Projecting interaction series");
    let result = Analysis::new(config).run(input);
    spinner.finish_and_clear();
    let analysed = result?;
    ui::report(&analysed.report);

    let projection = analysed
        .project(focus, structure)
        .context("Failed to project time series")?;
    match &projection {
        Projection::Global(series) => {
            ui::success(&format!("{} rows ({})", series.len(), structure))
        }
        Projection::PerActor(per_actor) => ui::success(&format!(
            "{} actors, {} rows ({})",
            per_actor.len(),
            per_actor.values().map(|series| series.len()).sum::<usize>(),
            structure
        )),
    }

    let json = serde_json::to_string_pretty(&projection).context("Failed to serialize series")?;
    write_output(output, &json)
}

use super::{load_settings, read_scores};
use crate::chart::{ChartData, LabelOrientation};
use crate::cli::args::OutputFormat;
use crate::core::SubjectName;
use crate::pipeline::{PipelineOutput, ScorePipeline};
use anyhow::{Context, Result};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub scores: PathBuf,
    pub order: Option<Vec<String>>,
    pub config: Option<PathBuf>,
    pub format: OutputFormat,
    pub strict: bool,
}

pub fn handle_render_command(render_config: RenderConfig) -> Result<()> {
    let config = load_settings(render_config.config.as_deref())?;
    let scores = read_scores(&render_config.scores)?;

    let order: Vec<SubjectName> = match render_config.order {
        Some(names) => names
            .into_iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .map(SubjectName::from)
            .collect(),
        None => scores.default_display_order(),
    };

    let pipeline = ScorePipeline::from_config(&config);
    let output = if render_config.strict {
        pipeline
            .run_strict(&scores, &order)
            .context("Scores failed validation")?
    } else {
        pipeline.run(&scores, &order).context("Score pipeline failed")?
    };

    println!("{}", format_output(&output, render_config.format)?);
    Ok(())
}

pub fn format_output(output: &PipelineOutput, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(output.chart()).context("Failed to serialize chart data")
        }
        OutputFormat::Table => Ok(render_tables(output)),
    }
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header);
    table
}

fn render_tables(output: &PipelineOutput) -> String {
    let chart = output.chart();
    let mut sections = vec![
        format!("Total: {} ({:?})", chart.total_score, chart.status),
        detailed_table(chart).to_string(),
        outer_table(chart).to_string(),
    ];

    if chart.has_errors {
        let mut table = new_table(vec!["Subject", "Kind", "Message"]);
        for error in &chart.errors {
            table.add_row(vec![
                error
                    .subject
                    .as_ref()
                    .map_or_else(|| "-".to_string(), |s| s.to_string()),
                error.kind.to_string(),
                error.message.clone(),
            ]);
        }
        sections.push(table.to_string());
    }

    if !output.is_valid() {
        let mut table = new_table(vec!["Field", "Code", "Message"]);
        for error in output.validation_errors() {
            table.add_row(vec![error.field.clone(), error.code.clone(), error.message.clone()]);
        }
        sections.push(table.to_string());
    }

    sections.join("\n")
}

fn detailed_table(chart: &ChartData) -> Table {
    let mut table = new_table(vec!["Slice", "Category", "Score", "%", "Color", "Pattern"]);
    for slice in &chart.detailed_data {
        table.add_row(vec![
            slice.label(LabelOrientation::Inner).replace('\n', " "),
            slice.category.to_string(),
            slice.value.to_string(),
            format!("{:.2}", slice.percentage),
            slice.color.clone(),
            slice.pattern.to_string(),
        ]);
    }
    table
}

fn outer_table(chart: &ChartData) -> Table {
    let mut table = new_table(vec!["Category", "Score", "%", "Color"]);
    for slice in &chart.outer_data {
        table.add_row(vec![
            slice.name.clone(),
            slice.value.to_string(),
            format!("{:.2}", slice.percentage),
            slice.color.clone(),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoremapConfig;
    use crate::core::{ScoreEntry, SubjectScores};

    fn output() -> PipelineOutput {
        let scores = SubjectScores::new()
            .with("英語R", ScoreEntry::new(100.0, 200.0))
            .with("英語L", ScoreEntry::new(50.0, 150.0))
            .with("数学", ScoreEntry::new(-5.0, 10.0));
        let order = vec![
            SubjectName::from("英語R"),
            SubjectName::from("英語L"),
            SubjectName::from("数学"),
        ];
        ScorePipeline::from_config(&ScoremapConfig::default())
            .run(&scores, &order)
            .unwrap()
    }

    #[test]
    fn test_json_output_is_chart_data() {
        let json = format_output(&output(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["totalScore"], 500.0);
        assert_eq!(value["outerData"][0]["name"], "英語");
    }

    #[test]
    fn test_table_output_lists_slices_and_errors() {
        let text = format_output(&output(), OutputFormat::Table).unwrap();
        assert!(text.contains("英語R 共通"));
        assert!(text.contains("#4E79A7"));
        assert!(text.contains("数学.commonTest"));
    }
}

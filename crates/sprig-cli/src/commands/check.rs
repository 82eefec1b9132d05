//! `sprig check` command implementation.

use camino::{Utf8Path, Utf8PathBuf};
use sprig_config::SprigModel;
use sprig_core::error::SprigResult;

use super::CommandContext;

/// What a valid configuration declares
#[derive(Debug, Clone, PartialEq)]
pub struct CheckSummary {
    pub path: Utf8PathBuf,
    pub consumer_attributes: Vec<String>,
    pub producer_attributes: Vec<String>,
    pub precedence: Vec<String>,
    pub repositories: Vec<String>,
    /// Component coordinates with their variant count
    pub components: Vec<(String, usize)>,
}

pub fn summarize(model: &SprigModel, path: &Utf8Path) -> CheckSummary {
    let names = |attributes: Vec<sprig_attributes::Attribute>| {
        attributes.iter().map(|a| a.to_string()).collect::<Vec<_>>()
    };
    CheckSummary {
        path: path.to_path_buf(),
        consumer_attributes: names(model.consumer_schema().attributes()),
        producer_attributes: names(model.producer_schema().attributes()),
        precedence: model
            .consumer_schema()
            .precedence()
            .iter()
            .map(|a| a.name().to_string())
            .collect(),
        repositories: model
            .repositories()
            .repositories()
            .iter()
            .map(|r| r.name().to_string())
            .collect(),
        components: model
            .components()
            .iter()
            .map(|c| (c.id().to_string(), c.variants().len()))
            .collect(),
    }
}

/// Execute the `sprig check` command
pub async fn execute(ctx: &CommandContext) -> SprigResult<()> {
    let (model, path) = ctx.load_model().await?;
    let summary = summarize(&model, &path);

    ctx.output.success(&format!("{} is valid", summary.path));
    ctx.output.line(&format!(
        "Consumer attributes: {}",
        join_or_none(&summary.consumer_attributes)
    ));
    ctx.output.line(&format!(
        "Producer attributes: {}",
        join_or_none(&summary.producer_attributes)
    ));
    if !summary.precedence.is_empty() {
        ctx.output.line(&format!("Precedence: {}", summary.precedence.join(" > ")));
    }
    ctx.output
        .line(&format!("Repositories: {}", join_or_none(&summary.repositories)));
    for (component, variants) in &summary.components {
        ctx.output
            .line(&format!("Component {} ({} variants)", component, variants));
    }
    Ok(())
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

//! `sprig filter` command implementation.
//!
//! Reports, for every configured repository in declaration order, whether
//! its content rules allow a request.

use sprig_config::SprigModel;
use sprig_core::error::SprigResult;
use sprig_core::types::{ModuleComponentIdentifier, ModuleIdentifier};
use sprig_repository::ArtifactResolutionDetails;

use super::CommandContext;

/// Request details for `coordinates`, either a component or a version listing
pub fn details(
    model: &SprigModel,
    coordinates: &str,
    configuration: Option<&str>,
    attributes: &[String],
) -> SprigResult<ArtifactResolutionDetails> {
    let mut details = if coordinates.matches(':').count() >= 2 {
        ArtifactResolutionDetails::for_component(coordinates.parse::<ModuleComponentIdentifier>()?)
    } else {
        ArtifactResolutionDetails::for_listing(coordinates.parse::<ModuleIdentifier>()?)
    };
    if let Some(configuration) = configuration {
        details = details.with_configuration(configuration);
    }
    if !attributes.is_empty() {
        details = details.with_consumer_attributes(model.requested(attributes)?);
    }
    Ok(details)
}

/// Repository names paired with whether each may serve the request
pub fn evaluate(model: &SprigModel, details: &ArtifactResolutionDetails) -> Vec<(String, bool)> {
    model
        .repositories()
        .repositories()
        .iter()
        .map(|repository| (repository.name().to_string(), repository.is_eligible(details)))
        .collect()
}

/// Execute the `sprig filter` command
pub async fn execute(
    coordinates: &str,
    configuration: Option<&str>,
    attributes: &[String],
    ctx: &CommandContext,
) -> SprigResult<()> {
    let (model, _) = ctx.load_model().await?;
    let details = details(&model, coordinates, configuration, attributes)?;
    let results = evaluate(&model, &details);

    if results.is_empty() {
        ctx.output.warn("No repositories are configured");
        return Ok(());
    }
    for (repository, allowed) in &results {
        if *allowed {
            ctx.output.success(repository);
        } else {
            ctx.output.rejected(repository);
        }
    }
    if !results.iter().any(|(_, allowed)| *allowed) {
        ctx.output
            .warn(&format!("No repository may serve {}", coordinates));
    }
    Ok(())
}

//! `sprig select` command implementation.
//!
//! Runs the origin artifact selector chain over a configured component:
//! variant names first, then attribute matching, then every variant.

use camino::Utf8PathBuf;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use sprig_artifacts::{
    AllVariantsSelector, ArtifactSet, AttributeMatchingSelector, LocalArtifactResolver,
    OriginArtifactSelectorChain, ResolvedVariant, VariantNameSelector,
};
use sprig_attributes::{HasAttributes, Value};
use sprig_config::SprigModel;
use sprig_core::error::{SprigError, SprigResult};

use super::CommandContext;

/// Parameters of a selection
#[derive(Debug, Clone, Default)]
pub struct SelectRequest {
    pub coordinates: String,
    pub attributes: Vec<String>,
    pub variants: Vec<String>,
    pub artifact_root: Option<Utf8PathBuf>,
}

/// Selection as printed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionReport {
    pub component: String,
    pub variants: Vec<VariantReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantReport {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub capabilities: Vec<String>,
    pub artifacts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,
}

/// Selector chain for a request; always ends with the catch-all
pub fn build_chain(
    model: &SprigModel,
    request: &SelectRequest,
) -> SprigResult<OriginArtifactSelectorChain> {
    let mut chain = OriginArtifactSelectorChain::new();
    if !request.variants.is_empty() {
        chain.add(VariantNameSelector::new(request.variants.iter().cloned()));
    }
    if !request.attributes.is_empty() {
        let requested = model.requested(&request.attributes)?;
        chain.add(AttributeMatchingSelector::new(model.matcher(), requested));
    }
    chain.add(AllVariantsSelector);
    Ok(chain)
}

/// Select the artifacts of the requested component
pub fn select(
    model: &SprigModel,
    request: &SelectRequest,
    artifact_root: Utf8PathBuf,
) -> SprigResult<ArtifactSet> {
    let component = model.component(&request.coordinates).ok_or_else(|| {
        SprigError::invalid_argument(format!("No component '{}' is configured", request.coordinates))
    })?;
    let resolver = model.variant_resolver(Arc::new(LocalArtifactResolver::new(artifact_root)));
    build_chain(model, request)?.select(component, &resolver, model.exclusions())
}

pub fn report(set: &ArtifactSet, with_files: bool) -> SprigResult<SelectionReport> {
    let variants = set
        .variants()
        .iter()
        .map(|variant| variant_report(variant, with_files))
        .collect::<SprigResult<Vec<_>>>()?;
    Ok(SelectionReport {
        component: set.component().to_string(),
        variants,
    })
}

fn variant_report(variant: &ResolvedVariant, with_files: bool) -> SprigResult<VariantReport> {
    let files = if with_files {
        Some(variant.files()?.into_iter().map(|path| path.to_string()).collect())
    } else {
        None
    };
    Ok(VariantReport {
        name: variant.name().to_string(),
        attributes: variant
            .attributes()
            .iter()
            .map(|(attribute, value)| (attribute.name().to_string(), value_text(value)))
            .collect(),
        capabilities: variant.capabilities().iter().map(|c| c.to_string()).collect(),
        artifacts: variant.artifacts().iter().map(|a| a.file_name()).collect(),
        files,
    })
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) | Value::Named(text) => text.clone(),
        Value::Boolean(flag) => flag.to_string(),
    }
}

/// Execute the `sprig select` command
pub async fn execute(request: &SelectRequest, json: bool, ctx: &CommandContext) -> SprigResult<()> {
    let (model, path) = ctx.load_model().await?;
    let root = match &request.artifact_root {
        Some(root) => root.clone(),
        None => path.parent().map(|p| p.to_path_buf()).unwrap_or_else(|| ctx.cwd.clone()),
    };
    let set = select(&model, request, root)?;
    let report = report(&set, request.artifact_root.is_some())?;

    if json {
        let text = serde_json::to_string_pretty(&report).map_err(|e| SprigError::Serialization {
            message: e.to_string(),
        })?;
        ctx.output.line(&text);
        return Ok(());
    }

    if report.variants.is_empty() {
        ctx.output.warn(&format!("{} has no variants", report.component));
        return Ok(());
    }
    for variant in &report.variants {
        ctx.output.success(&format!("{} {}", report.component, variant.name));
        for (name, value) in &variant.attributes {
            ctx.output.line(&format!("    {} = {}", name, value));
        }
        for capability in &variant.capabilities {
            ctx.output.info(&format!("    provides {}", capability));
        }
        for artifact in &variant.artifacts {
            ctx.output.line(&format!("    {}", artifact));
        }
        for file in variant.files.iter().flatten() {
            ctx.output.info(&format!("    -> {}", file));
        }
    }
    Ok(())
}

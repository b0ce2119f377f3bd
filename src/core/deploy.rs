//! Deployment descriptor and its Helm rendering.

use crate::core::config::{Config, RunSettings};
use crate::core::registry::registry_host;

/// One logical service's image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// Chart values key, e.g. `dagit.image`.
    pub key: String,
    pub repository: String,
    pub tag: String,
}

/// What to install into the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentDescriptor {
    pub release: String,
    pub chart: String,
    pub images: Vec<ImageRef>,
}

impl DeploymentDescriptor {
    /// Build the descriptor for this run from configuration.
    ///
    /// Every image is pulled from the run's private registry and shares the
    /// rendered tag.
    pub fn from_config(config: &Config, settings: &RunSettings) -> Self {
        let host = registry_host(&settings.account_id, &config.registry.region);
        let tag = render_tag(&config.deploy.tag, settings);

        let images = config
            .deploy
            .images
            .iter()
            .map(|image| ImageRef {
                key: image.key.clone(),
                repository: format!("{}/{}", host, image.name),
                tag: tag.clone(),
            })
            .collect();

        Self {
            release: config.deploy.release.clone(),
            chart: config.deploy.chart.clone(),
            images,
        }
    }

    /// Arguments for `helm`, starting at the `install` subcommand.
    pub fn helm_args(&self) -> Vec<String> {
        let mut args = vec![
            "install".to_string(),
            self.release.clone(),
            self.chart.clone(),
        ];
        for image in &self.images {
            args.push("--set".to_string());
            args.push(format!("{}.repository={}", image.key, image.repository));
            args.push("--set".to_string());
            args.push(format!("{}.tag={}", image.key, image.tag));
        }
        args
    }
}

/// Substitute `{build_id}` and `{runtime}` in a tag template.
pub fn render_tag(template: &str, settings: &RunSettings) -> String {
    template
        .replace("{build_id}", &settings.build_id)
        .replace("{runtime}", &settings.runtime)
}

use crate::completion::{ChatCompletionClient, CompletionClient};
use crate::config::Config;
use crate::error::{ServiceError, Result};
use crate::github::{GitHubClient, RepositoryHost};
use crate::inspector;
use crate::prompts::PromptTemplate;
use crate::reference::RepositoryReference;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Runs parse → inspect → compose → complete for one repository reference
#[derive(Clone)]
pub struct ReadmeGenerator {
    host: Arc<dyn RepositoryHost>,
    completion: Arc<dyn CompletionClient>,
    template: Arc<PromptTemplate>,
    listing_limit: usize,
    deadline: Duration,
}

impl ReadmeGenerator {
    /// Assembles a generator from its collaborators
    pub fn new(
        host: Arc<dyn RepositoryHost>,
        completion: Arc<dyn CompletionClient>,
        template: PromptTemplate,
        listing_limit: usize,
        deadline: Duration,
    ) -> Self {
        Self {
            host,
            completion,
            template: Arc::new(template),
            listing_limit,
            deadline,
        }
    }

    /// Builds the production generator: GitHub REST plus an OpenAI-compatible endpoint
    pub fn from_config(config: &Config) -> Result<Self> {
        let host = GitHubClient::new(
            config.github.api_base.clone(),
            config.api_keys.github_token.as_deref(),
            config.http_timeout(),
        )?;
        let completion = ChatCompletionClient::new(
            &config.generation.api_base,
            config.api_keys.llm_api_key_or_placeholder(),
            config.generation.model.clone(),
            config.generation.temperature,
        );

        let template = config.prompt_template()?;
        for section in template.missing_sections() {
            warn!("Prompt template does not request the \"{}\" section", section);
        }

        Ok(Self::new(
            Arc::new(host),
            Arc::new(completion),
            template,
            config.generation.listing_limit,
            config.request_timeout(),
        ))
    }

    /// Generates a README for `input`, failing with [`ServiceError::Timeout`]
    /// when the whole flow exceeds the deadline
    pub async fn generate(&self, input: &str) -> Result<String> {
        // Reject bad input before any network call
        let reference = RepositoryReference::parse(input)?;

        match tokio::time::timeout(self.deadline, self.generate_for(&reference)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Generation for {} exceeded {:?}", reference, self.deadline);
                Err(ServiceError::Timeout(self.deadline))
            }
        }
    }

    /// Builds the prompt for `reference` without calling the completion endpoint
    pub async fn build_prompt(&self, reference: &RepositoryReference) -> Result<String> {
        let inspection = inspector::inspect(self.host.as_ref(), reference, self.listing_limit).await?;
        info!(
            "Inspected {}: {} listed paths, {} manifests",
            reference,
            inspection.listing.entries().len(),
            inspection.manifests.len()
        );
        Ok(self.template.compose(reference, &inspection.listing, &inspection.manifests))
    }

    async fn generate_for(&self, reference: &RepositoryReference) -> Result<String> {
        info!("Fetching data for: {}", reference);
        let prompt = self.build_prompt(reference).await?;
        let readme = self.completion.complete(&prompt).await?;
        info!("Generated {} bytes for {}", readme.len(), reference);
        Ok(readme)
    }
}

//! Wires the built-in tool set from configuration.

use std::sync::Arc;

use parley_core::config::ToolsConfig;
use parley_core::utils::expand_home;
use parley_providers::CompletionClient;

use crate::registry::ToolRegistry;
use crate::tools::{
    AppointmentTool, CleanupTool, EmailTool, FileRetriever, KnowledgeTool, NewsTool, OutputPaths,
    SentimentTool,
};

/// Build a registry with every built-in tool registered.
///
/// Tools whose backing service is unconfigured still register; they fail
/// at call time with an explanatory message the model can relay.
pub fn build_registry(
    config: &ToolsConfig,
    completions: Arc<dyn CompletionClient>,
) -> ToolRegistry {
    let outputs = OutputPaths::new(expand_home(&config.outputs_dir));
    let mut registry = ToolRegistry::new();

    registry.register(Arc::new(NewsTool::new(
        config.serper_api_key.clone(),
        outputs.clone(),
    )));
    registry.register(Arc::new(SentimentTool::new(
        completions.clone(),
        outputs.clone(),
    )));
    registry.register(Arc::new(EmailTool::new(
        config.smtp.clone(),
        outputs.clone(),
    )));
    registry.register(Arc::new(AppointmentTool::new(
        completions.clone(),
        expand_home(&config.database_path),
    )));
    registry.register(Arc::new(KnowledgeTool::new(
        completions,
        Arc::new(FileRetriever::new(expand_home(&config.knowledge_dir))),
        outputs.clone(),
    )));
    registry.register(Arc::new(CleanupTool::new(outputs)));

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parley_core::types::{CompletionResponse, Message, ToolDescriptor};
    use parley_providers::CompletionError;

    struct NullClient;

    #[async_trait]
    impl CompletionClient for NullClient {
        async fn complete(
            &self,
            _messages: &[Message],
            _tools: Option<&[ToolDescriptor]>,
        ) -> Result<CompletionResponse, CompletionError> {
            Ok(CompletionResponse::default())
        }

        fn model(&self) -> &str {
            "null"
        }
    }

    #[test]
    fn test_builtin_registry_has_all_tools() {
        let registry = build_registry(&ToolsConfig::default(), Arc::new(NullClient));

        assert_eq!(
            registry.tool_names(),
            vec![
                "analyze_sentiment",
                "cleanup_outputs",
                "lookup_knowledge",
                "manage_appointments",
                "search_news",
                "send_email",
            ]
        );
    }

    #[test]
    fn test_builtin_descriptors_are_well_formed() {
        let registry = build_registry(&ToolsConfig::default(), Arc::new(NullClient));

        for descriptor in registry.descriptors() {
            assert_eq!(descriptor.tool_type, "function");
            assert!(!descriptor.function.description.is_empty());
            assert_eq!(descriptor.function.parameters["type"], "object");
        }
    }
}

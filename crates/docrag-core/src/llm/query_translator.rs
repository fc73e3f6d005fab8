//! Query translation: expand one question into search queries
//!
//! Each translator sends a fixed instruction template to the language model
//! and turns the reply into an ordered list of queries (or, for HyDE, a
//! hypothetical passage used as a pseudo-document for embedding).

use super::LanguageModel;
use crate::error::{DocRagError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Available translation strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationStrategy {
    MultiQuery,
    StepBack,
    RagFusion,
    Hyde,
}

impl TranslationStrategy {
    pub const ALL: [TranslationStrategy; 4] = [
        TranslationStrategy::MultiQuery,
        TranslationStrategy::StepBack,
        TranslationStrategy::RagFusion,
        TranslationStrategy::Hyde,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MultiQuery => "multi_query",
            Self::StepBack => "step_back",
            Self::RagFusion => "rag_fusion",
            Self::Hyde => "hyde",
        }
    }
}

impl fmt::Display for TranslationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TranslationStrategy {
    type Err = DocRagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "multi_query" => Ok(Self::MultiQuery),
            "step_back" => Ok(Self::StepBack),
            "rag_fusion" => Ok(Self::RagFusion),
            "hyde" => Ok(Self::Hyde),
            other => Err(DocRagError::InvalidInput(format!(
                "Unknown query translation strategy: {}",
                other
            ))),
        }
    }
}

/// Turns one user query into the queries used for retrieval
#[async_trait]
pub trait QueryTranslator: Send + Sync {
    async fn translate(&self, query: &str) -> Result<Vec<String>>;

    fn strategy(&self) -> TranslationStrategy;
}

/// Build the translator for a strategy
pub fn create_translator(
    strategy: TranslationStrategy,
    llm: Arc<dyn LanguageModel>,
) -> Box<dyn QueryTranslator> {
    match strategy {
        TranslationStrategy::MultiQuery => Box::new(MultiQueryTranslator::new(llm)),
        TranslationStrategy::StepBack => Box::new(StepBackTranslator::new(llm)),
        TranslationStrategy::RagFusion => Box::new(RagFusionTranslator::new(llm)),
        TranslationStrategy::Hyde => Box::new(HydeTranslator::new(llm)),
    }
}

/// Split a model reply into trimmed, non-empty lines
pub fn non_empty_lines(response: &str) -> Vec<String> {
    response
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

/// Three alternative phrasings of the question
pub struct MultiQueryTranslator {
    llm: Arc<dyn LanguageModel>,
}

impl MultiQueryTranslator {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl QueryTranslator for MultiQueryTranslator {
    async fn translate(&self, query: &str) -> Result<Vec<String>> {
        let system = "You are an AI language model assistant. Your task is to generate 3 \
                      different versions of the given user question.";
        let prompt = format!(
            "Original question: {}\nProvide these alternative questions separated by newlines.",
            query
        );

        let response = self.llm.generate(&prompt, "", Some(system)).await?;
        Ok(non_empty_lines(&response))
    }

    fn strategy(&self) -> TranslationStrategy {
        TranslationStrategy::MultiQuery
    }
}

/// The original question plus one more generic "step-back" question
pub struct StepBackTranslator {
    llm: Arc<dyn LanguageModel>,
}

impl StepBackTranslator {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl QueryTranslator for StepBackTranslator {
    async fn translate(&self, query: &str) -> Result<Vec<String>> {
        let system = "You are an expert at world knowledge. Your task is to paraphrase a \
                      question to a more generic step-back question.";
        let prompt = format!("Original Question: {}\nStep-back Question:", query);

        let response = self.llm.generate(&prompt, "", Some(system)).await?;

        // Unlike multi-query and rag-fusion, the original question is kept
        let mut queries = vec![query.trim().to_string()];
        queries.push(response.trim().to_string());
        queries.retain(|q| !q.is_empty());
        Ok(queries)
    }

    fn strategy(&self) -> TranslationStrategy {
        TranslationStrategy::StepBack
    }
}

/// Four related search queries
pub struct RagFusionTranslator {
    llm: Arc<dyn LanguageModel>,
}

impl RagFusionTranslator {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl QueryTranslator for RagFusionTranslator {
    async fn translate(&self, query: &str) -> Result<Vec<String>> {
        let system = "You are a helpful assistant that generates multiple search queries \
                      based on a single input query.";
        let prompt = format!(
            "Generate 4 search queries related to: {}\nOUTPUT (4 queries):",
            query
        );

        let response = self.llm.generate(&prompt, "", Some(system)).await?;
        Ok(non_empty_lines(&response))
    }

    fn strategy(&self) -> TranslationStrategy {
        TranslationStrategy::RagFusion
    }
}

/// Hypothetical Document Embeddings: a passage that would answer the question
pub struct HydeTranslator {
    llm: Arc<dyn LanguageModel>,
}

impl HydeTranslator {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl QueryTranslator for HydeTranslator {
    async fn translate(&self, query: &str) -> Result<Vec<String>> {
        let system = "You are a helpful assistant. Write a hypothetical scientific paper \
                      passage to answer the question.";
        let prompt = format!("Question: {}\nPassage:", query);

        let response = self.llm.generate(&prompt, "", Some(system)).await?;
        let passage = response.trim();
        if passage.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![passage.to_string()])
    }

    fn strategy(&self) -> TranslationStrategy {
        TranslationStrategy::Hyde
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct CannedModel {
        reply: String,
        system_prompts: Mutex<Vec<Option<String>>>,
    }

    impl CannedModel {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                system_prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LanguageModel for CannedModel {
        async fn generate(
            &self,
            _prompt: &str,
            context: &str,
            system_prompt: Option<&str>,
        ) -> Result<String> {
            assert!(context.is_empty());
            self.system_prompts
                .lock()
                .unwrap()
                .push(system_prompt.map(String::from));
            Ok(self.reply.clone())
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    #[tokio::test]
    async fn test_multi_query_drops_original_and_blank_lines() {
        let llm = CannedModel::new("  What is Rust?  \n\n How does Rust work?\n   \nWhy Rust?\n");
        let translator = MultiQueryTranslator::new(llm.clone());
        let queries = translator.translate("Tell me about Rust").await.unwrap();

        assert_eq!(
            queries,
            vec!["What is Rust?", "How does Rust work?", "Why Rust?"]
        );
        assert!(llm.system_prompts.lock().unwrap()[0].is_some());
    }

    #[tokio::test]
    async fn test_step_back_keeps_original() {
        let llm = CannedModel::new("  What is systems programming?  \n");
        let translator = StepBackTranslator::new(llm);
        let queries = translator
            .translate("Does Rust have a garbage collector?")
            .await
            .unwrap();

        assert_eq!(
            queries,
            vec![
                "Does Rust have a garbage collector?",
                "What is systems programming?"
            ]
        );
    }

    #[tokio::test]
    async fn test_rag_fusion_returns_lines_without_original() {
        let llm = CannedModel::new("q1\nq2\nq3\nq4");
        let translator = RagFusionTranslator::new(llm);
        let queries = translator.translate("original").await.unwrap();

        assert_eq!(queries.len(), 4);
        assert!(!queries.contains(&"original".to_string()));
    }

    #[tokio::test]
    async fn test_hyde_returns_single_passage() {
        let llm = CannedModel::new("\n  Rust uses ownership.\nMemory is freed on drop.  \n");
        let translator = HydeTranslator::new(llm);
        let queries = translator.translate("How does Rust manage memory?").await.unwrap();

        assert_eq!(
            queries,
            vec!["Rust uses ownership.\nMemory is freed on drop."]
        );
    }

    #[tokio::test]
    async fn test_hyde_empty_reply() {
        let llm = CannedModel::new("   ");
        let translator = HydeTranslator::new(llm);
        assert!(translator.translate("q").await.unwrap().is_empty());
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!(
            "multi_query".parse::<TranslationStrategy>().unwrap(),
            TranslationStrategy::MultiQuery
        );
        assert_eq!(
            "step-back".parse::<TranslationStrategy>().unwrap(),
            TranslationStrategy::StepBack
        );
        assert_eq!(
            "RAG_FUSION".parse::<TranslationStrategy>().unwrap(),
            TranslationStrategy::RagFusion
        );
        assert_eq!(
            "hyde".parse::<TranslationStrategy>().unwrap(),
            TranslationStrategy::Hyde
        );
        assert!(matches!(
            "decompose".parse::<TranslationStrategy>(),
            Err(DocRagError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_factory_matches_strategy() {
        let llm: Arc<dyn LanguageModel> = CannedModel::new("x");
        for strategy in TranslationStrategy::ALL {
            let translator = create_translator(strategy, llm.clone());
            assert_eq!(translator.strategy(), strategy);
            assert_eq!(strategy.to_string(), strategy.as_str());
        }
    }
}

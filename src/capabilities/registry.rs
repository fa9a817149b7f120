use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::{
    AnswerQuestionCapability, Capability, Providers, SearchCapability, ANSWER_QUESTION_CAPABILITY,
    RAG_GROUP,
};
use crate::error::{ApproachError, ApproachResult};
use crate::templates::TemplateLibrary;
use crate::types::RagOptions;

#[derive(Default, Clone)]
pub struct CapabilityRegistry {
    groups: BTreeMap<String, BTreeMap<String, Arc<dyn Capability>>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, capability: Arc<dyn Capability>) {
        self.groups
            .entry(capability.group().to_string())
            .or_default()
            .insert(capability.name().to_string(), capability);
    }

    pub fn get(&self, group: &str, name: &str) -> Option<Arc<dyn Capability>> {
        let (_, capabilities) = self
            .groups
            .iter()
            .find(|(g, _)| g.eq_ignore_ascii_case(group))?;
        capabilities
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, c)| c.clone())
    }

    pub fn get_qualified(&self, qualified: &str) -> Option<Arc<dyn Capability>> {
        let (group, name) = qualified.split_once('.')?;
        self.get(group, name)
    }

    pub fn group_names(&self) -> Vec<&str> {
        self.groups.keys().map(String::as_str).collect()
    }

    pub fn capability_names(&self) -> BTreeSet<String> {
        self.iter().map(|c| c.qualified_name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Capability>> {
        self.groups.values().flat_map(|g| g.values())
    }

    pub fn len(&self) -> usize {
        self.groups.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn build_registry(
    options: &RagOptions,
    providers: &Providers,
    templates: &TemplateLibrary,
) -> ApproachResult<CapabilityRegistry> {
    let template = templates
        .load(RAG_GROUP, ANSWER_QUESTION_CAPABILITY)
        .map_err(|e| ApproachError::Configuration(e.to_string()))?;

    let mut registry = CapabilityRegistry::new();
    registry.register(Arc::new(SearchCapability::new(
        providers.search.clone(),
        providers.embedding.clone(),
        options.clone(),
    )));
    registry.register(Arc::new(AnswerQuestionCapability::new(
        template,
        providers.llm.clone(),
    )));

    Ok(registry)
}

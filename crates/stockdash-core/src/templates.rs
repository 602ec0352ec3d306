//! Filter template manager.
//!
//! Templates live on the backend. The manager keeps the list loaded for
//! this session and a selection cursor over it; it never persists anything
//! locally.

use tracing::info;

use crate::backend::Backend;
use crate::error::TemplateError;
use crate::models::{FilterMap, FilterTemplate};

/// Checks a template before it is sent and returns it with a trimmed name.
pub fn validate(name: &str, filters: &FilterMap) -> Result<FilterTemplate, TemplateError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TemplateError::EmptyName);
    }
    let filters: FilterMap = filters
        .iter()
        .filter(|(_, range)| range.is_active())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    if filters.is_empty() {
        return Err(TemplateError::NoFilters);
    }
    Ok(FilterTemplate {
        name: name.to_string(),
        filters,
    })
}

#[derive(Debug, Default)]
pub struct TemplateManager {
    templates: Vec<FilterTemplate>,
    selected: usize,
}

impl TemplateManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn templates(&self) -> &[FilterTemplate] {
        &self.templates
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected(&self) -> Option<&FilterTemplate> {
        self.templates.get(self.selected)
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.templates.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Replaces the loaded list, keeping the selection on the same name when possible.
    pub fn set_templates(&mut self, mut templates: Vec<FilterTemplate>) {
        let keep = self.selected().map(|t| t.name.clone());
        templates.sort_by(|a, b| a.name.cmp(&b.name));
        self.selected = keep
            .and_then(|name| templates.iter().position(|t| t.name == name))
            .unwrap_or(0)
            .min(templates.len().saturating_sub(1));
        self.templates = templates;
    }

    pub async fn refresh(&mut self, backend: &dyn Backend) -> Result<(), TemplateError> {
        let templates = backend.templates().await?;
        self.set_templates(templates);
        Ok(())
    }

    /// Creates or overwrites `name` and reloads the list. Returns the server message.
    pub async fn save(
        &mut self,
        backend: &dyn Backend,
        name: &str,
        filters: &FilterMap,
    ) -> Result<String, TemplateError> {
        let template = validate(name, filters)?;
        let message = backend.save_template(&template).await?.into_result()?;
        info!(name = %template.name, "template saved");
        self.refresh(backend).await?;
        if let Some(pos) = self.templates.iter().position(|t| t.name == template.name) {
            self.selected = pos;
        }
        Ok(message)
    }

    pub async fn delete(&mut self, backend: &dyn Backend, name: &str) -> Result<String, TemplateError> {
        let message = backend.delete_template(name).await?.into_result()?;
        info!(name, "template deleted");
        self.refresh(backend).await?;
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::columns::Columns;
    use crate::error::ApiError;
    use crate::models::FilterRange;

    fn peg_filter() -> FilterMap {
        let mut f = FilterMap::new();
        f.insert("PEG".into(), FilterRange::numeric(Some(0.0), Some(0.5)));
        f
    }

    #[test]
    fn validation_requires_name_and_active_bound() {
        assert_eq!(validate("  ", &peg_filter()), Err(TemplateError::EmptyName));

        let mut inactive = FilterMap::new();
        inactive.insert("PEG".into(), FilterRange::default());
        assert_eq!(validate("x", &inactive), Err(TemplateError::NoFilters));

        let ok = validate(" cheap ", &peg_filter()).unwrap();
        assert_eq!(ok.name, "cheap");
    }

    #[tokio::test]
    async fn save_list_and_delete() {
        let backend = MemoryBackend::new(Vec::new(), Columns::builtin());
        let mut mgr = TemplateManager::new();

        mgr.save(&backend, "zeta", &peg_filter()).await.unwrap();
        mgr.save(&backend, "alpha", &peg_filter()).await.unwrap();
        let names: Vec<&str> = mgr.templates().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert_eq!(mgr.selected().unwrap().name, "alpha");

        mgr.select_next();
        assert_eq!(mgr.selected().unwrap().name, "zeta");
        mgr.select_next();
        assert_eq!(mgr.selected_index(), 1);

        mgr.delete(&backend, "zeta").await.unwrap();
        assert_eq!(mgr.templates().len(), 1);
        assert_eq!(mgr.selected().unwrap().name, "alpha");
    }

    #[tokio::test]
    async fn deleting_missing_template_surfaces_server_message() {
        let backend = MemoryBackend::new(Vec::new(), Columns::builtin());
        let mut mgr = TemplateManager::new();
        let err = mgr.delete(&backend, "ghost").await.unwrap_err();
        assert_eq!(err, TemplateError::Api(ApiError::Rejected("模版不存在".into())));
        assert_eq!(err.to_string(), "模版不存在");
    }

    #[tokio::test]
    async fn overwrite_keeps_one_entry() {
        let backend = MemoryBackend::new(Vec::new(), Columns::builtin());
        let mut mgr = TemplateManager::new();
        mgr.save(&backend, "cheap", &peg_filter()).await.unwrap();

        let mut wider = FilterMap::new();
        wider.insert("PEG".into(), FilterRange::numeric(Some(0.0), Some(1.0)));
        mgr.save(&backend, "cheap", &wider).await.unwrap();
        assert_eq!(mgr.templates().len(), 1);
        assert_eq!(mgr.selected().unwrap().filters, wider);
    }
}

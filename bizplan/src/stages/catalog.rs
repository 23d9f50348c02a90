//! Stage registration and dependency ordering.

use super::{Persona, PromptTemplate, Stage};
use crate::errors::CatalogError;
use crate::intake::IntakeSchema;
use std::collections::{BTreeSet, HashMap, HashSet};

/// An ordered registry of stages.
///
/// Forward references are accepted at registration; they are checked when
/// the order is resolved.
#[derive(Debug, Clone, Default)]
pub struct StageCatalog {
    stages: Vec<Stage>,
    index: HashMap<String, usize>,
}

impl StageCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a content stage.
    ///
    /// # Errors
    ///
    /// Returns an error for a duplicate name or a self-dependency.
    pub fn register(
        &mut self,
        name: &str,
        persona: Persona,
        template: impl Into<PromptTemplate>,
        depends_on: &[&str],
    ) -> Result<&mut Self, CatalogError> {
        let stage = Stage::new(name, persona, template).with_dependencies(depends_on.iter().copied());
        self.register_stage(stage)
    }

    /// Registers a fully built stage.
    ///
    /// # Errors
    ///
    /// Returns an error for a duplicate name or a self-dependency.
    pub fn register_stage(&mut self, stage: Stage) -> Result<&mut Self, CatalogError> {
        if self.index.contains_key(&stage.name) {
            return Err(CatalogError::DuplicateStage(stage.name));
        }
        if stage.depends_on.contains(&stage.name) {
            return Err(CatalogError::Cycle { path: vec![stage.name.clone(), stage.name] });
        }

        self.index.insert(stage.name.clone(), self.stages.len());
        self.stages.push(stage);
        Ok(self)
    }

    /// Returns stage names so that each follows all of its dependencies.
    ///
    /// Among stages that are ready at the same time, the one registered
    /// first comes first.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog is empty, a dependency is unknown, or
    /// the dependencies form a cycle.
    pub fn resolve_order(&self) -> Result<Vec<String>, CatalogError> {
        Ok(self.resolve_indices()?.into_iter().map(|i| self.stages[i].name.clone()).collect())
    }

    /// Returns the stages in resolved order.
    ///
    /// # Errors
    ///
    /// Same as [`StageCatalog::resolve_order`].
    pub fn resolve(&self) -> Result<Vec<Stage>, CatalogError> {
        Ok(self.resolve_indices()?.into_iter().map(|i| self.stages[i].clone()).collect())
    }

    fn resolve_indices(&self) -> Result<Vec<usize>, CatalogError> {
        if self.stages.is_empty() {
            return Err(CatalogError::Empty);
        }

        for stage in &self.stages {
            if let Some(dep) = stage.depends_on.iter().find(|d| !self.index.contains_key(*d)) {
                return Err(CatalogError::UnknownDependency {
                    stage: stage.name.clone(),
                    dependency: dep.clone(),
                });
            }
        }

        self.detect_cycles()?;

        let mut remaining: Vec<usize> = self.stages.iter().map(|s| s.depends_on.len()).collect();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.stages.len()];
        for (i, stage) in self.stages.iter().enumerate() {
            for dep in &stage.depends_on {
                dependents[self.index[dep]].push(i);
            }
        }

        let mut ready: BTreeSet<usize> = (0..self.stages.len()).filter(|&i| remaining[i] == 0).collect();
        let mut order = Vec::with_capacity(self.stages.len());

        while let Some(next) = ready.pop_first() {
            order.push(next);
            for &dependent in &dependents[next] {
                remaining[dependent] -= 1;
                if remaining[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }

        Ok(order)
    }

    fn detect_cycles(&self) -> Result<(), CatalogError> {
        let mut visited = HashSet::new();
        let mut on_stack = HashSet::new();
        let mut path = Vec::new();

        for stage in &self.stages {
            if !visited.contains(stage.name.as_str()) {
                if let Some(cycle) = self.dfs_cycle(&stage.name, &mut visited, &mut on_stack, &mut path) {
                    return Err(CatalogError::Cycle { path: cycle });
                }
            }
        }
        Ok(())
    }

    fn dfs_cycle<'a>(
        &'a self,
        node: &'a str,
        visited: &mut HashSet<&'a str>,
        on_stack: &mut HashSet<&'a str>,
        path: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        visited.insert(node);
        on_stack.insert(node);
        path.push(node);

        if let Some(stage) = self.get(node) {
            for dep in &stage.depends_on {
                if on_stack.contains(dep.as_str()) {
                    let start = path.iter().position(|n| *n == dep)?;
                    let mut cycle: Vec<String> = path[start..].iter().map(|s| (*s).to_string()).collect();
                    cycle.push(dep.clone());
                    return Some(cycle);
                }
                if !visited.contains(dep.as_str()) {
                    if let Some(cycle) = self.dfs_cycle(dep, visited, on_stack, path) {
                        return Some(cycle);
                    }
                }
            }
        }

        path.pop();
        on_stack.remove(node);
        None
    }

    /// Checks that every template placeholder names an intake field.
    ///
    /// # Errors
    ///
    /// Returns the first unknown placeholder, in registration order.
    pub fn validate_templates(&self, schema: &IntakeSchema) -> Result<(), CatalogError> {
        for stage in &self.stages {
            if let Some(unknown) = stage.template.placeholders().into_iter().find(|p| !schema.contains(p)) {
                return Err(CatalogError::UnknownPlaceholder {
                    stage: stage.name.clone(),
                    placeholder: unknown.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Looks up a stage.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Stage> {
        self.index.get(name).map(|&i| &self.stages[i])
    }

    /// Checks whether a stage is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Returns stage names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name.as_str()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

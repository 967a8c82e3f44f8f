//! Artifact loading.
//!
//! A loaded artifact is the compiled rlib plus the parsed surface of the unit
//! it was built from. It borrows the artifact, which lives in the invocation's
//! workspace, so it can never outlive or escape the call that produced it.

use crate::config::types::{Result, SortboxError};
use crate::judge::compiler::CompiledArtifact;
use std::fs;

pub struct LoadedArtifact<'a> {
    artifact: &'a CompiledArtifact,
    surface: syn::File,
}

impl<'a> LoadedArtifact<'a> {
    pub fn crate_name(&self) -> &str {
        &self.artifact.crate_name
    }

    pub fn artifact(&self) -> &CompiledArtifact {
        self.artifact
    }

    /// Crate-root items in declaration order.
    pub fn items(&self) -> &[syn::Item] {
        &self.surface.items
    }
}

pub struct ArtifactLoader;

impl ArtifactLoader {
    pub fn load(artifact: &CompiledArtifact) -> Result<LoadedArtifact<'_>> {
        if !artifact.rlib_path.is_file() {
            return Err(SortboxError::Toolchain(format!(
                "compiled unit {} is missing from {}",
                artifact.crate_name,
                artifact.search_dir.display()
            )));
        }
        if !artifact.rlib_path.starts_with(&artifact.search_dir) {
            return Err(SortboxError::Toolchain(format!(
                "compiled unit {} lies outside its workspace",
                artifact.crate_name
            )));
        }

        let text = fs::read_to_string(&artifact.source_path)?;
        // rustc already accepted this text; a parse failure here means syn lags
        // behind the compiler's grammar.
        let surface = syn::parse_file(&text).map_err(|e| {
            SortboxError::Resolution(format!(
                "could not read the declared operations of {}: {}",
                artifact.crate_name, e
            ))
        })?;

        log::debug!(
            "loaded {} ({} crate-root items)",
            artifact.crate_name,
            surface.items.len()
        );
        Ok(LoadedArtifact { artifact, surface })
    }
}

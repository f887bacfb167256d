use brine_jsgen_schema::{Model, Registry};
use log::{debug, error, info};
use std::fs;
use std::path::{Path, PathBuf};
use crate::{
    verifier::verify_models,
    parser::parse_source,
    gen_c::compile_models_to_c,
    error::JsgenError,
};

pub const DEFAULT_EXTENSION: &str = "h";
pub const DEFAULT_OUTPUT: &str = "models.g.h";

/// Settings for one generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOptions {
    /// Extension (without the dot) of the files picked up from directories.
    pub extension: String,
    /// Reject arrays without a `sized_by` counter instead of warning.
    pub strict:    bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        GenerateOptions {
            extension: DEFAULT_EXTENSION.to_string(),
            strict:    false,
        }
    }
}

/// A file queued for scanning.
#[derive(Debug, Clone, PartialEq)]
pub struct Input {
    pub path:     PathBuf,
    /// Named on the command line rather than found in a directory. A failure
    /// on an explicit input aborts the run.
    pub explicit: bool,
}

/// Expands directories (non-recursively) into the files carrying
/// `extension`, sorted by file name. Other paths are taken as they are.
pub fn collect_inputs(paths: &[PathBuf], extension: &str) -> Result<Vec<Input>, JsgenError> {
    let mut inputs = Vec::new();

    for path in paths {
        if !path.is_dir() {
            inputs.push(Input { path: path.clone(), explicit: true });
            continue;
        }

        let mut found = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let file = entry.path();
            if entry.file_type()?.is_file() && file.extension().is_some_and(|e| e == extension) {
                found.push(file);
            }
        }
        found.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        debug!("{}: {} matching files", path.display(), found.len());

        inputs.extend(found.into_iter().map(|path| Input { path, explicit: false }));
    }

    Ok(inputs)
}

/// Reads one header and extracts its annotated structs.
pub fn scan_file(path: &Path) -> Result<Vec<Model>, JsgenError> {
    let scan = || -> Result<Vec<Model>, JsgenError> {
        let text = fs::read_to_string(path)?;
        parse_source(&text)
    };
    scan().map_err(|source| JsgenError::ScanFailed {
        path:   path.to_path_buf(),
        source: Box::new(source),
    })
}

/// Scans every input into one registry and verifies it. Files found inside
/// a directory that fail to scan are reported and skipped.
pub fn build_registry(paths: &[PathBuf], options: &GenerateOptions) -> Result<Registry, JsgenError> {
    let mut registry = Registry::default();

    for input in collect_inputs(paths, &options.extension)? {
        match scan_file(&input.path) {
            Ok(models) => {
                info!("{}: {} annotated structs", input.path.display(), models.len());
                registry.extend(models);
            }
            Err(err) if input.explicit => return Err(err),
            Err(err) => error!("{}", err),
        }
    }

    verify_models(registry.models(), options.strict)?;
    Ok(registry)
}

/// Compile a set of headers and directories into `(Registry, C source)`.
pub fn compile_paths(paths: &[PathBuf], options: &GenerateOptions) -> Result<(Registry, String), JsgenError> {
    let registry = build_registry(paths, options)?;
    let code = compile_models_to_c(registry.models());
    Ok((registry, code))
}

/// Compile header text into `(Registry, C source)`.
/// Returns `Err(JsgenError)` if tokenization or strict verification fails.
pub fn compile_source(text: &str, options: &GenerateOptions) -> Result<(Registry, String), JsgenError> {
    let registry = Registry::new(parse_source(text)?);
    verify_models(registry.models(), options.strict)?;
    let code = compile_models_to_c(registry.models());
    Ok((registry, code))
}

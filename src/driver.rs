//! File-level driver
//!
//! Maps each `Name.jack` source to its output files. Everything for a class is
//! built in memory before anything is written, and a failed class never leaves
//! a `Name.vm` behind, including one left over from an earlier run.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use snafu::ResultExt;

use crate::error::{IoSnafu, Result};

/// Which files to write and where
#[derive(Debug, Clone, Default)]
pub struct Outputs {
    /// Directory for every output; next to each source when `None`
    pub out_dir: Option<PathBuf>,
    /// Also write the token listing as `NameT.xml`
    pub tokens: bool,
    /// Also write the parse tree as `Name.xml`
    pub parse_tree: bool,
}

impl Outputs {
    /// `dir/stem<suffix>`, where dir is `out_dir` or the source's directory
    pub fn path_for(&self, source: &Path, suffix: &str) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dir = match &self.out_dir {
            Some(dir) => dir.clone(),
            None => source.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        dir.join(format!("{}{}", stem, suffix))
    }
}

/// The file itself, or the `.jack` files directly inside a directory in
/// name order
pub fn collect_sources(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut sources = Vec::new();
    for entry in fs::read_dir(path).context(IoSnafu { path })? {
        let candidate = entry.context(IoSnafu { path })?.path();
        if candidate.is_file() && candidate.extension().is_some_and(|ext| ext == "jack") {
            sources.push(candidate);
        }
    }
    sources.sort();
    debug!("found {} source files in {}", sources.len(), path.display());
    Ok(sources)
}

/// Compile one source file and write its outputs
pub fn compile_file(source_path: &Path, outputs: &Outputs) -> Result<()> {
    let vm_path = outputs.path_for(source_path, ".vm");
    let result = write_outputs(source_path, &vm_path, outputs);
    if result.is_err() && vm_path.exists() {
        fs::remove_file(&vm_path).context(IoSnafu { path: &vm_path })?;
        debug!("removed stale {}", vm_path.display());
    }
    result
}

fn write_outputs(source_path: &Path, vm_path: &Path, outputs: &Outputs) -> Result<()> {
    let source = fs::read_to_string(source_path).context(IoSnafu { path: source_path })?;

    if outputs.tokens {
        let xml_path = outputs.path_for(source_path, "T.xml");
        let xml = crate::tokenize_source(&source)?;
        fs::write(&xml_path, xml).context(IoSnafu { path: &xml_path })?;
        info!("wrote {}", xml_path.display());
    }

    if outputs.parse_tree {
        let xml_path = outputs.path_for(source_path, ".xml");
        let xml = crate::parse_tree_source(&source)?;
        fs::write(&xml_path, xml).context(IoSnafu { path: &xml_path })?;
        info!("wrote {}", xml_path.display());
    }

    let vm = crate::compile_source(&source)?;
    fs::write(vm_path, vm).context(IoSnafu { path: vm_path })?;
    info!("wrote {}", vm_path.display());
    Ok(())
}

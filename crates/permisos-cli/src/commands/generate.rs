//! `permisos generate` - emit `Permisos_*` sources for marked types

use crate::output;
use anyhow::{bail, Context};
use permisos_compiler::{load_graph, Config, DirectoryFiler, Processor};
use std::path::PathBuf;

pub fn execute(config: &Config, types: Vec<PathBuf>, out: PathBuf) -> anyhow::Result<()> {
    let graph = load_graph(&types).context("failed to load type declarations")?;
    tracing::info!(types = graph.len(), "loaded type graph");

    let mut processor = Processor::new(config);
    let mut filer = DirectoryFiler::new(&out);
    match processor.run(&graph, &mut filer) {
        Ok(generated) => {
            let mut stdout = output::stdout();
            for name in &generated {
                output::status(&mut stdout, "Generated", name)?;
            }
            if generated.is_empty() {
                output::status(&mut stdout, "Finished", "no @Permisos types found")?;
            }
            Ok(())
        }
        Err(diagnostics) => {
            let tag = config.marker_simple_name();
            let mut stderr = output::stderr();
            for diagnostic in &diagnostics {
                diagnostic.emit(&tag, &mut stderr)?;
            }
            bail!("{} error(s) while generating sources", diagnostics.len())
        }
    }
}

//! `permisos transform` - splice generated types into compiled classes

use crate::output;
use anyhow::Context;
use permisos_compiler::Config;
use permisos_transform::{ClassTransformer, TransformOptions};
use std::path::PathBuf;

pub struct TransformArgs {
    pub input: PathBuf,
    pub output: PathBuf,
    pub classpath: Vec<PathBuf>,
    pub copy_non_transformed: bool,
}

pub fn execute(config: &Config, args: TransformArgs) -> anyhow::Result<()> {
    let mut options = TransformOptions::from_config(config);
    options.copy_non_transformed |= args.copy_non_transformed;

    let mut transformer = ClassTransformer::new(options);
    for path in std::iter::once(&args.input).chain(&args.classpath) {
        transformer
            .index_path(path)
            .with_context(|| format!("failed to index {}", path.display()))?;
    }
    let summary = transformer
        .transform(&args.input, &args.output)
        .with_context(|| format!("failed to transform {}", args.input.display()))?;

    let mut stdout = output::stdout();
    for name in &summary.transformed {
        output::status(&mut stdout, "Transformed", name)?;
    }
    output::status(
        &mut stdout,
        "Finished",
        &format!(
            "{} of {} classes rewritten, {} copied",
            summary.transformed.len(),
            summary.scanned,
            summary.copied
        ),
    )?;
    Ok(())
}

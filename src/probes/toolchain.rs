use anyhow::{bail, Context, Result};
use which::which;

/// Check that every configured probe command's program resolves on PATH
/// before the run starts, instead of faulting every task at once later.
pub fn verify_or_bail(commands: &[&str]) -> Result<()> {
    let mut missing = Vec::new();

    for command in commands {
        let argv = shell_words::split(command)
            .with_context(|| format!("bad probe command: {command}"))?;
        let Some(program) = argv.first() else {
            bail!("probe command is empty");
        };
        match which(program) {
            Ok(path) => {
                tracing::debug!("found {}: {:?}", program, path);
            }
            Err(_) => {
                missing.push(program.clone());
            }
        }
    }

    if !missing.is_empty() {
        bail!(
            "missing required tools: {}. Install them or point the probe \
             commands at something else in the config file",
            missing.join(", ")
        );
    }

    tracing::debug!("all probe tools found");
    Ok(())
}

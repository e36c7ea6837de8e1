use std::io::Write;
use std::path::Path;

use anyhow::Context;
use linkspan_core::FileRecordSet;

/// Render the aggregate as the output document.
pub fn render(records: &FileRecordSet) -> anyhow::Result<String> {
    let mut document = records
        .to_json_pretty()
        .context("failed to serialize records")?;
    document.push('\n');
    Ok(document)
}

/// Write the document to `path`, or to stdout when no path is configured.
pub fn emit(records: &FileRecordSet, path: Option<&Path>) -> anyhow::Result<()> {
    let document = render(records)?;
    match path {
        Some(path) => std::fs::write(path, document)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(document.as_bytes())
                .and_then(|()| stdout.flush())
                .context("failed to write to stdout")?;
        }
    }
    Ok(())
}

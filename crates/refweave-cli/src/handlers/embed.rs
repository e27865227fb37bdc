//! Embed command handler

use super::utils::{document_dir, read_document, write_result};
use crate::cli::EmbedArgs;
use crate::config::Config;
use crate::error::Result;
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use refweave_core::{FileLoader, JsonSchemaEmbedder};
use tracing::{info, instrument};

/// Handle the embed command
#[instrument(skip(config, output), fields(document = %args.document.display()))]
pub fn handle_embed(args: EmbedArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let timer = Timer::with_details("embed_command", &format!("file: {}", args.document.display()));
    output.info(&format!("Embedding {}", args.document.display()))?;

    let root = read_document(&args.document)?;
    let loader = FileLoader::new(document_dir(&args.document));

    let mut embedder_config = config.embedder.clone();
    if let Some(mount) = args.mount {
        embedder_config.mount_path = mount;
    }

    let embedded = {
        let _enter = timer.span().enter();
        JsonSchemaEmbedder::from_config(&loader, &embedder_config)?.embed_into_parts(&root)?
    };
    info!(
        definitions = embedded.definitions.len(),
        documents = embedded.assigned_names.len(),
        "Embedding finished"
    );

    write_result(
        &embedded.document,
        args.save_to.as_deref(),
        args.golden.as_deref(),
        output,
    )?;

    if embedded.assigned_names.is_empty() {
        output.warning("No external schema references found")?;
    } else {
        output.section("Embedded documents")?;
        let rows = embedded
            .assigned_names
            .iter()
            .map(|(identity, name)| vec![identity.clone(), name.clone()])
            .collect();
        output.table(&["Identity", "Definition"], rows)?;
    }
    output.debug(&format!(
        "{} definitions under {} in {}ms",
        embedded.definitions.len(),
        embedder_config.mount_path,
        timer.elapsed().as_millis()
    ))?;

    Ok(())
}

//! CLI command implementations. Output goes to stdout; logs go to stderr.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::engine::Engine;
use crate::facts::facts;
use crate::indexer::SourceBatch;
use crate::loader::{collect_texts, default_include_globs};

/// Inputs collected from `scholask ingest` flags.
#[derive(Debug, Default)]
pub struct IngestInputs {
    pub texts: Vec<String>,
    pub files: Vec<PathBuf>,
    pub dirs: Vec<PathBuf>,
    pub source_url: Option<String>,
}

/// Chunk every input and run one rebuild.
///
/// Inline texts and files share `--source-url` (files default to their
/// own `file://` URL); directory entries always carry their own URL.
pub async fn run_ingest(engine: &Engine, tenant: &str, inputs: IngestInputs) -> Result<()> {
    let max_chars = engine.config().chunking.max_chars;
    let mut groups: Vec<(Option<String>, Vec<String>)> = Vec::new();

    for text in &inputs.texts {
        push_chunks(&mut groups, inputs.source_url.clone(), text, max_chars);
    }
    for file in &inputs.files {
        let bytes =
            std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
        let text = String::from_utf8_lossy(&bytes);
        let url = inputs.source_url.clone().or_else(|| {
            file.canonicalize()
                .ok()
                .map(|p| format!("file://{}", p.display()))
        });
        push_chunks(&mut groups, url, &text, max_chars);
    }
    for dir in &inputs.dirs {
        for item in collect_texts(dir, &default_include_globs(), &[])? {
            push_chunks(&mut groups, Some(item.source_url), &item.text, max_chars);
        }
    }

    if groups.iter().all(|(_, chunks)| chunks.is_empty()) {
        bail!("No content to ingest: inputs produced no chunks");
    }

    let batches: Vec<SourceBatch> = groups
        .into_iter()
        .filter(|(_, chunks)| !chunks.is_empty())
        .map(|(source_url, chunks)| SourceBatch { source_url, chunks })
        .collect();
    let report = engine
        .indexer()
        .ingest_batches(tenant, batches)
        .await
        .with_context(|| format!("Ingest failed for tenant '{}'", tenant))?;
    let (added, total) = (report.added.len(), report.ids.len());

    println!("Ingested {} new chunks into '{}' ({} total).", added, tenant, total);
    Ok(())
}

/// Append chunks, merging with the previous group when the URL matches.
fn push_chunks(
    groups: &mut Vec<(Option<String>, Vec<String>)>,
    url: Option<String>,
    text: &str,
    max_chars: usize,
) {
    let chunks = scholask_core::chunk::chunk_text(text, max_chars);
    match groups.last_mut() {
        Some((last_url, last)) if *last_url == url => last.extend(chunks),
        _ => groups.push((url, chunks)),
    }
}

pub async fn run_search(
    engine: &Engine,
    tenant: &str,
    query: &str,
    k: Option<usize>,
    json: bool,
) -> Result<()> {
    let k = k.unwrap_or(engine.config().retrieval.top_k);
    let passages = engine.searcher().retrieve(tenant, query, k).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&passages)?);
        return Ok(());
    }
    if passages.is_empty() {
        println!("No results.");
        return Ok(());
    }
    for (rank, p) in passages.iter().enumerate() {
        println!(
            "{}. [#{}] score={:.4}{}",
            rank + 1,
            p.meta.display_index(),
            p.hit.score,
            p.meta
                .source_url
                .as_deref()
                .map(|u| format!("  {}", u))
                .unwrap_or_default()
        );
        println!("   {}", p.meta.preview.replace('\n', " "));
    }
    Ok(())
}

pub async fn run_ask(
    engine: &Engine,
    tenant: &str,
    question: &str,
    k: Option<usize>,
    json: bool,
) -> Result<()> {
    let k = k.unwrap_or(engine.config().retrieval.top_k);
    let answer = engine.pipeline().answer_with_k(tenant, question, k).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&answer)?);
        return Ok(());
    }
    println!("{}", answer.answer);
    if !answer.sources.is_empty() {
        println!();
        println!("Sources:");
        for meta in &answer.sources {
            match &meta.source_url {
                Some(url) => println!("  [#{}] {}", meta.display_index(), url),
                None => println!(
                    "  [#{}] {}",
                    meta.display_index(),
                    meta.preview.replace('\n', " ")
                ),
            }
        }
    }
    Ok(())
}

pub async fn run_facts(engine: &Engine, tenant: &str, limit: usize) -> Result<()> {
    for fact in facts(engine.pipeline(), tenant, limit).await? {
        println!("## {}", fact.title);
        println!("{}", fact.answer);
        println!();
    }
    Ok(())
}

pub async fn run_status(engine: &Engine, tenant: &str) -> Result<()> {
    let status = engine.status(tenant).await?;
    let show = |v: Option<usize>| v.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string());
    println!("tenant:  {}", status.tenant);
    println!("backend: {}", status.backend.as_str());
    println!("chunks:  {}", show(status.chunks));
    println!("rows:    {}", show(status.rows));
    Ok(())
}

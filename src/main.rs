use chunked_translator::pipeline::config::parse_provider_list;
use chunked_translator::{
    DomainHint, PipelineConfig, TranslationDirection, TranslationSession, build_providers,
    char_count, estimate_seconds, export_text, import_text,
};
use clap::{Arg, ArgAction, Command};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = Command::new("chunked-translate")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Translate long documents chunk by chunk over free machine translation services")
        .arg(
            Arg::new("text")
                .help("Text to translate (use --file for documents)")
                .index(1)
                .conflicts_with("file"),
        )
        .arg(
            Arg::new("file")
                .long("file")
                .short('f')
                .help("Plain-text document to translate")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("direction")
                .long("direction")
                .short('d')
                .help("Language pair, e.g. de-en or en-de")
                .default_value("de-en"),
        )
        .arg(
            Arg::new("reverse")
                .long("reverse")
                .short('r')
                .help("Swap source and target language")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("domain")
                .long("domain")
                .help("Domain hint: general, technical or legal"),
        )
        .arg(
            Arg::new("providers")
                .long("providers")
                .short('p')
                .help("Comma separated providers in priority order (google, google-cloud, lingva, mymemory, llm)"),
        )
        .arg(
            Arg::new("mock")
                .long("mock")
                .short('m')
                .help("Use the offline mock translator instead of real providers")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("concurrency")
                .long("concurrency")
                .short('j')
                .help("Chunks translated in parallel")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("max-chunk")
                .long("max-chunk")
                .help("Maximum chunk length in characters")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("retries")
                .long("retries")
                .help("Extra rounds over all providers when a chunk fails")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("JSON configuration file")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .help("Write the translation to this .txt file instead of stdout")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Show per-chunk providers and debug logs")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let verbose = matches.get_flag("verbose");
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    // Configuration: file, then environment, then flags
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    config.apply_env(|key| std::env::var(key).ok())?;
    if let Some(concurrency) = matches.get_one::<usize>("concurrency") {
        config.concurrency = *concurrency;
    }
    if let Some(max_chunk) = matches.get_one::<usize>("max-chunk") {
        config.max_chunk_chars = *max_chunk;
    }
    if let Some(retries) = matches.get_one::<u32>("retries") {
        config.max_retries = *retries;
    }
    if let Some(providers) = matches.get_one::<String>("providers") {
        config.providers = parse_provider_list(providers);
    }
    if matches.get_flag("mock") {
        config.providers = vec!["mock".to_string()];
    }

    let mut direction: TranslationDirection = matches
        .get_one::<String>("direction")
        .map(|d| d.parse::<TranslationDirection>())
        .transpose()?
        .unwrap_or_default();
    if matches.get_flag("reverse") {
        direction = direction.reversed();
    }
    let domain: Option<DomainHint> = matches
        .get_one::<String>("domain")
        .map(|d| d.parse::<DomainHint>())
        .transpose()?;

    let text = match (
        matches.get_one::<PathBuf>("file"),
        matches.get_one::<String>("text"),
    ) {
        (Some(path), _) => import_text(path).await?,
        (None, Some(text)) => text.clone(),
        (None, None) => {
            eprintln!("❌ Nothing to translate");
            eprintln!("   Pass the text as an argument or use --file document.txt");
            return Err("Missing input".into());
        }
    };

    let providers = build_providers(&config)?;
    let session = Arc::new(TranslationSession::new(providers, config)?);
    session.set_direction(direction)?;

    let chars = char_count(&text);
    eprintln!(
        "🌍 {} → {} via {}",
        direction.source.name(),
        direction.target.name(),
        session.provider_names().join(", ")
    );
    eprintln!(
        "📝 {} characters, about {:.1}s",
        chars,
        estimate_seconds(chars)
    );

    {
        let session = Arc::clone(&session);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                session.cancel();
            }
        });
    }

    let document = session
        .translate_document(&text, direction, domain, |progress| {
            eprint!(
                "\r🔄 {}/{} chunks ({:.0}%)",
                progress.completed,
                progress.total,
                progress.fraction() * 100.0
            );
            let _ = std::io::stderr().flush();
        })
        .await;
    eprintln!();
    let document = document?;

    if verbose {
        for result in &document.results {
            let status = if result.succeeded { "✅" } else { "⚠️ " };
            eprintln!(
                "   {} [{}] via {}",
                status, result.chunk_index, result.provider_name
            );
        }
        let stats = session.cache().stats();
        eprintln!(
            "   Cache: {} hits, {} misses, {} entries",
            stats.hits,
            stats.misses,
            session.cache().len().await
        );
    }

    if !document.is_complete() {
        eprintln!(
            "⚠️  {} of {} chunks could not be translated and were kept in the original language",
            document.degraded.len(),
            document.results.len()
        );
    }
    eprintln!("⏱️  Done in {:.1}s", document.elapsed.as_secs_f64());

    match matches.get_one::<PathBuf>("output") {
        Some(path) => {
            export_text(path, &document.text).await?;
            eprintln!("💾 Saved to {}", path.display());
        }
        None => println!("{}", document.text),
    }

    Ok(())
}

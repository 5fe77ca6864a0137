use std::path::Path;
use std::sync::Arc;

use clap::{Arg, ArgAction, ArgMatches, Command};
use deepl_handler::language::{map_language, supported_languages};
use deepl_handler::{
    DocumentJob, HandlerConfig, HandlerSettings, JsonFileStore, KeyValueStore, LocalFileStorage,
    MemoryStore, MockMode, MockProvider, TranslateOption, TranslationDispatcher,
    TranslationProvider, TranslatorHandler, TranslatorResult,
};

fn cli() -> Command {
    let from = Arg::new("from")
        .long("from")
        .short('f')
        .help("Source locale in host format (e.g. ger-DE); detected when omitted");
    let to = Arg::new("to")
        .long("to")
        .short('t')
        .required(true)
        .help("Target locale in host format (e.g. eng-GB)");

    Command::new("deepl-handler")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Translate texts and documents through the DeepL translator handler")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .help("JSON config file (defaults come from DEEPL_* environment variables)"),
        )
        .arg(
            Arg::new("mock")
                .long("mock")
                .short('m')
                .global(true)
                .help("Use the mock provider instead of DeepL")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .help("Log dispatch decisions")
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("translate")
                .about("Translate one or more texts")
                .arg(
                    Arg::new("text")
                        .help("Texts to translate")
                        .required(true)
                        .num_args(1..),
                )
                .arg(from.clone())
                .arg(to.clone())
                .arg(
                    Arg::new("markup")
                        .long("markup")
                        .help("Texts are structured XML markup")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("document")
                .about("Translate files; prints one output path per file")
                .arg(
                    Arg::new("file")
                        .help("Files to translate")
                        .required(true)
                        .num_args(1..),
                )
                .arg(from)
                .arg(to),
        )
        .subcommand(
            Command::new("settings")
                .about("Manage the stored DeepL credentials")
                .subcommand_required(true)
                .subcommand(Command::new("show").about("Show settings including account usage"))
                .subcommand(
                    Command::new("set").about("Store an authentication key").arg(
                        Arg::new("key")
                            .long("key")
                            .short('k')
                            .required(true)
                            .help("DeepL authentication key; empty removes the settings"),
                    ),
                )
                .subcommand(Command::new("delete").about("Remove stored settings"))
                .subcommand(Command::new("schema").about("Print the settings form schema")),
        )
        .subcommand(
            Command::new("languages")
                .about("List supported locales, or check one")
                .arg(Arg::new("code").help("Host locale code to check")),
        )
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_handler(config: &HandlerConfig, use_mock: bool) -> TranslatorResult<TranslationDispatcher> {
    if !use_mock {
        return Ok(TranslationDispatcher::with_deepl(
            config,
            Arc::new(JsonFileStore::new(config.settings_path.clone())),
            Arc::new(LocalFileStorage),
        ));
    }

    let provider: Arc<dyn TranslationProvider> = Arc::new(MockProvider::new(MockMode::Suffix));
    let factory = move |_key: &str| -> TranslatorResult<Arc<dyn TranslationProvider>> {
        Ok(Arc::clone(&provider))
    };
    let store = MemoryStore::new();
    store.set(
        deepl_handler::settings::SETTINGS_STORAGE_KEY,
        &serde_json::to_string(&HandlerSettings::with_key("mock"))?,
    )?;

    Ok(TranslationDispatcher::new(
        config,
        Arc::new(factory),
        Arc::new(store),
        Arc::new(LocalFileStorage),
    ))
}

fn strings(matches: &ArgMatches, id: &str) -> Vec<String> {
    matches
        .get_many::<String>(id)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("verbose"));

    let config = match matches.get_one::<String>("config") {
        Some(path) => HandlerConfig::load_from_file(Path::new(path))?,
        None => HandlerConfig::from_env(),
    };
    let handler = build_handler(&config, matches.get_flag("mock"))?;

    match matches.subcommand() {
        Some(("translate", sub)) => {
            let texts = strings(sub, "text");
            let source = sub.get_one::<String>("from").map(String::as_str);
            let target = sub.get_one::<String>("to").map(String::as_str).unwrap_or_default();
            let options = if sub.get_flag("markup") {
                vec![TranslateOption::StructuredMarkup]
            } else {
                Vec::new()
            };

            for translated in handler.translate(&texts, source, target, &options).await? {
                println!("{}", translated);
            }
        }
        Some(("document", sub)) => {
            let jobs: Vec<DocumentJob> = strings(sub, "file")
                .into_iter()
                .map(DocumentJob::from_path)
                .collect();
            let source = sub.get_one::<String>("from").map(String::as_str);
            let target = sub.get_one::<String>("to").map(String::as_str).unwrap_or_default();

            for path in handler.translate_document(&jobs, source, target, &[]).await? {
                println!("{}", path.display());
            }
        }
        Some(("settings", sub)) => match sub.subcommand() {
            Some(("show", _)) => {
                let settings = handler.get_settings().await;
                println!("{}", serde_json::to_string_pretty(&settings)?);
            }
            Some(("set", set)) => {
                let key = set.get_one::<String>("key").cloned().unwrap_or_default();
                handler.store_settings(HandlerSettings::with_key(key)).await?;
                println!("Settings stored in {}", config.settings_path.display());
            }
            Some(("delete", _)) => {
                handler.delete_settings().await?;
                println!("Settings removed");
            }
            Some(("schema", _)) => {
                println!("{}", serde_json::to_string_pretty(&handler.settings_schema())?);
            }
            _ => unreachable!("clap requires a settings subcommand"),
        },
        Some(("languages", sub)) => match sub.get_one::<String>("code") {
            Some(code) => {
                let target = map_language(code, false)?;
                let source = map_language(code, true)?;
                println!("{}\ttarget: {}\tsource: {}", code, target, source);
            }
            None => {
                for entry in supported_languages() {
                    println!("{}\t{}", entry.host, entry.provider);
                }
            }
        },
        _ => unreachable!("clap requires a subcommand"),
    }

    Ok(())
}

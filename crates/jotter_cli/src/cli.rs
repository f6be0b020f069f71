use crate::recognizer::LineRecognizer;
use anyhow::{bail, Context};
use chrono::Utc;
use clap::ArgAction;
use jotter_core::db::open_db;
use jotter_core::dictation::stream::DEFAULT_LANGUAGE;
use jotter_core::{
    init_logging, ComposerState, DictationRequest, JotterConfig, KeyValueStorage, Note,
    NoteComposer, NoteId, NoteStore, SearchQuery, SqliteStorage, StoreError,
};
use std::io::Read;
use std::path::PathBuf;

const PREVIEW_CHARS: usize = 72;
const SHORT_ID_LEN: usize = 8;

#[derive(Debug, clap::Parser)]
#[command(name = "jotter", version, about = "Quick notes, typed or dictated")]
pub struct Cli {
    /// SQLite file holding the notes (overrides JOTTER_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Storage key for the note collection (overrides JOTTER_STORAGE_KEY)
    #[arg(long, global = true)]
    key: Option<String>,

    /// Directory for rolling log files (overrides JOTTER_LOG_DIR)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Verbosity (-v, -vv, -vvv); only used when file logging is enabled
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// List notes, newest first (default)
    List,

    /// Create a note from the given words
    Add {
        #[arg(required = true, num_args = 1..)]
        content: Vec<String>,
    },

    /// Delete a note by id or unique id prefix
    Delete { id: String },

    /// Show notes whose content contains the query (case-insensitive)
    Search { query: String },

    /// Dictate a note: each stdin line extends the transcript, EOF submits
    Dictate {
        /// BCP 47 language tag passed to the recognizer
        #[arg(long, default_value = DEFAULT_LANGUAGE)]
        language: String,
    },
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        let mut config = JotterConfig::from_env().context("invalid environment configuration")?;
        if let Some(db) = self.db {
            config.db_path = db;
        }
        if let Some(key) = self.key {
            config.storage_key = key;
        }
        if let Some(log_dir) = self.log_dir {
            config.log_dir = Some(log_dir);
        }
        if self.verbose > 0 {
            config.log_level = match self.verbose {
                1 => "info",
                2 => "debug",
                _ => "trace",
            };
        }

        if let Some(log_dir) = config.log_dir.as_deref() {
            init_logging(config.log_level, log_dir).context("failed to initialize logging")?;
        }

        let conn = open_db(&config.db_path)
            .with_context(|| format!("failed to open `{}`", config.db_path.display()))?;
        let storage = SqliteStorage::try_new(conn)?;
        let mut store = NoteStore::initialize_with(storage, config.store_options())
            .context("failed to load notes")?;

        self.command.unwrap_or(Command::List).run(&mut store)
    }
}

impl Command {
    fn run<S: KeyValueStorage>(self, store: &mut NoteStore<S>) -> anyhow::Result<()> {
        match self {
            Self::List => {
                if store.is_empty() {
                    println!("No notes yet.");
                }
                print_cards(store.list().iter());
            }
            Self::Add { content } => {
                let note = store.create(content.join(" ")).map_err(user_facing)?;
                println!("Note created: {}", short_id(note.id));
            }
            Self::Delete { id } => delete(store, &id)?,
            Self::Search { query } => {
                let hits = store.search(&SearchQuery::new(query));
                println!("{} of {} note(s) match.", hits.len(), store.len());
                print_cards(hits.into_iter());
            }
            Self::Dictate { language } => {
                dictate(store, DictationRequest::new(language), std::io::stdin())?
            }
        }
        Ok(())
    }
}

fn delete<S: KeyValueStorage>(store: &mut NoteStore<S>, raw: &str) -> anyhow::Result<()> {
    let id = match NoteId::parse_str(raw) {
        Ok(id) => id,
        Err(_) => {
            let prefix = raw.trim().to_ascii_lowercase();
            let matches = store
                .list()
                .iter()
                .filter(|note| !prefix.is_empty() && note.id.to_string().starts_with(&prefix))
                .map(|note| note.id)
                .collect::<Vec<_>>();
            match matches.as_slice() {
                [] => {
                    println!("No note matches `{raw}`.");
                    return Ok(());
                }
                [id] => *id,
                _ => bail!("id prefix `{raw}` is ambiguous; use more characters"),
            }
        }
    };

    if store.delete(id)? {
        println!("Note deleted: {}", short_id(id));
    } else {
        println!("No note matches `{raw}`.");
    }
    Ok(())
}

fn dictate<S, R>(
    store: &mut NoteStore<S>,
    request: DictationRequest,
    input: R,
) -> anyhow::Result<()>
where
    S: KeyValueStorage,
    R: Read + Send + 'static,
{
    let mut recognizer = LineRecognizer::new(input);
    let mut composer = NoteComposer::with_request(request);
    let session = composer.start_listening(&mut recognizer)?;
    eprintln!("Listening... (end input with Ctrl-D)");

    while let Some(event) = session.next_event() {
        composer.apply(event);
        match composer.state() {
            ComposerState::Listening { transcript } => eprintln!("  {transcript}"),
            _ => break,
        }
    }
    composer.stop_listening(&session);

    if composer.state() == &ComposerState::Idle {
        return Ok(());
    }
    let note = composer.submit(store).map_err(|err| match err {
        StoreError::Validation(_) => anyhow::anyhow!("nothing was dictated; no note created"),
        other => other.into(),
    })?;
    println!("Note created: {}", short_id(note.id));
    Ok(())
}

fn user_facing(err: StoreError) -> anyhow::Error {
    match err {
        StoreError::Validation(_) => anyhow::anyhow!("a note cannot be empty"),
        other => other.into(),
    }
}

fn print_cards<'a>(notes: impl Iterator<Item = &'a Note>) {
    let now = Utc::now();
    for note in notes {
        println!("{}  {}", short_id(note.id), note.relative_age(now));
        println!("    {}", note.preview(PREVIEW_CHARS));
    }
}

fn short_id(id: NoteId) -> String {
    id.to_string().chars().take(SHORT_ID_LEN).collect()
}

//! Your terminal AI assistant.
//!
//! Ask questions or generate images from the terminal.  The last text
//! conversation is saved on exit and continued on the next run.
//!
//! # Usage
//!
//! ```bash
//! # Continue the last conversation, or start one
//! termassist
//!
//! # Pick the model type, text model and system message first
//! termassist --config
//!
//! # Generate images instead of chatting
//! termassist --image
//!
//! # Start over even if there is a conversation to continue
//! termassist --new
//! ```
//!
//! The API key is read from `AI_ASSISTANT_OPENAI_API_KEY`, optionally set in
//! a `.env` file in the working directory.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use time::UtcOffset;
use tracing_subscriber::EnvFilter;

use termassist::chat::{
    API_KEY_VAR, Assistant, BASE_URL_VAR, ChatArgs, Config, PlainTextRenderer, RustylinePrompter,
    history_root,
};
use termassist::{HistoryStore, OpenAi};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Must run while the process is still single-threaded.
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);

    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = match ChatArgs::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}");
            eprintln!("{}", ChatArgs::usage("termassist"));
            ChatArgs {
                help: true,
                ..ChatArgs::default()
            }
        }
    };

    let env: HashMap<String, String> = std::env::vars().collect();
    let config = Config::from_env(&env);
    let history = HistoryStore::new(history_root(&env)).with_utc_offset(offset);

    let interrupted = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&interrupted);
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    })?;

    let renderer = PlainTextRenderer::with_color(!args.no_color);
    let prompter = RustylinePrompter::new(!args.no_color)?;
    let api_key = env.get(API_KEY_VAR).cloned();
    let base_url = env.get(BASE_URL_VAR).cloned();

    Assistant::new(config, args, history, prompter, renderer)
        .with_interrupt(interrupted)
        .run(move || OpenAi::with_options(api_key, base_url, None))
        .await?;
    Ok(())
}

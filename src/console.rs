//! Line-oriented terminal front end for the search app.

use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::info;

use crate::app::App;
use crate::config::ClientConfig;
use crate::feed::HttpFeedGateway;
use crate::orchestrator::FetchRequest;
use crate::store::FileStore;

const HELP: &str = "\
commands:
  search <term>   search by tag (a bare term works too)
  next | prev     change page
  history         list recent searches
  use <n|term>    re-run a recent search
  clear           forget recent searches
  theme           switch light/dark
  help            show this text
  quit            exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(String),
    Next,
    Prev,
    History,
    Use(String),
    Clear,
    Theme,
    Help,
    Quit,
    Nothing,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        match word {
            "" => Command::Nothing,
            "search" | "s" => Command::Search(rest.to_string()),
            "next" | "n" if rest.is_empty() => Command::Next,
            "prev" | "p" if rest.is_empty() => Command::Prev,
            "history" | "h" if rest.is_empty() => Command::History,
            "use" | "u" => Command::Use(rest.to_string()),
            "clear" if rest.is_empty() => Command::Clear,
            "theme" | "t" if rest.is_empty() => Command::Theme,
            "help" | "?" if rest.is_empty() => Command::Help,
            "quit" | "q" | "exit" if rest.is_empty() => Command::Quit,
            _ => Command::Search(line.to_string()),
        }
    }
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig::from_env()?;
    info!("Starting photo search console");
    info!("Gateway URL: {}", config.gateway_url);

    let http_client = HttpFeedGateway::build_http_client(config.timeout)?;
    let gateway = HttpFeedGateway::new(config.gateway_url.clone(), http_client)
        .with_tagmode(config.tagmode.clone());
    let store = FileStore::new(config.store_path.clone());
    info!("Store: {}", store.path().display());

    let mut app = App::new(Arc::new(gateway), Arc::new(store));
    app.search = app.search.with_gated_pagination(config.gate_pagination);

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    drive(&mut app, stdin, &mut stdout).await
}

/// Runs the startup fetch, then one command per input line until `quit` or EOF.
pub async fn drive<R, W>(app: &mut App, input: R, out: &mut W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let startup = app.start();
    app.search.execute(startup).await;
    render(app, out)?;

    let mut lines = input.lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let request = match Command::parse(&line) {
            Command::Nothing => continue,
            Command::Quit => break,
            Command::Help => {
                writeln!(out, "{}", HELP)?;
                continue;
            }
            Command::History => {
                render_history(app, out)?;
                continue;
            }
            Command::Clear => {
                app.search.history_mut().clear();
                writeln!(out, "history cleared")?;
                continue;
            }
            Command::Theme => {
                let theme = app.theme.toggle();
                writeln!(out, "theme: {} ({} available)", theme, theme.label())?;
                continue;
            }
            Command::Search(term) => app.search.submit(&term),
            Command::Next => app.search.go_to_page(1),
            Command::Prev => app.search.go_to_page(-1),
            Command::Use(choice) => match resolve_history(app, &choice) {
                Some(term) => app.search.select_history_term(&term),
                None => {
                    writeln!(out, "no such history entry: {}", choice)?;
                    continue;
                }
            },
        };

        run_fetch(app, request).await;
        render(app, out)?;
    }
    Ok(())
}

async fn run_fetch(app: &mut App, request: Option<FetchRequest>) {
    if let Some(request) = request {
        app.search.execute(request).await;
    }
}

// `choice` is a 1-based index into history, or a term already in it.
fn resolve_history(app: &App, choice: &str) -> Option<String> {
    let terms = app.search.history().terms();
    match choice.parse::<usize>() {
        Ok(n) if n >= 1 => terms.get(n - 1).cloned(),
        _ => terms.iter().find(|t| t.as_str() == choice).cloned(),
    }
}

pub fn render<W: Write>(app: &App, out: &mut W) -> std::io::Result<()> {
    let search = &app.search;
    let state = search.state();

    writeln!(
        out,
        "Results for {} - page {} of {}",
        state.active_query,
        state.current_page,
        search.total_pages()
    )?;
    if !state.error_message.is_empty() {
        writeln!(out, "! {}", state.error_message)?;
    }
    for item in &state.result_items {
        writeln!(out, "  {} by {} <{}>", item.title, item.author, item.link)?;
    }
    Ok(())
}

fn render_history<W: Write>(app: &App, out: &mut W) -> std::io::Result<()> {
    let terms = app.search.history().terms();
    if terms.is_empty() {
        return writeln!(out, "no recent searches");
    }
    for (i, term) in terms.iter().enumerate() {
        writeln!(out, "{:>2}. {}", i + 1, term)?;
    }
    Ok(())
}

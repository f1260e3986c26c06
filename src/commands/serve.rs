use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use axum::Router;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use futures_util::stream::Stream;
use tokio::sync::{broadcast, mpsc};
use tower_http::services::ServeDir;

use crate::{
    ServeArgs,
    build::{
        Builder, Completion, FileWatcher, PageController, PageQuery, RenderOutcome, WatchEvent,
        WatchPaths,
    },
    config::{Config, base_path_from_config},
};

const LIVE_RELOAD_ROUTE: &str = "/_pagewright/live-reload";

/// SSE handler for live reload notifications.
async fn live_reload_handler(
    State(tx): State<broadcast::Sender<()>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = tx.subscribe();
    let stream = async_stream::stream! {
        let mut rx = rx;
        loop {
            match rx.recv().await {
                Ok(_) => {
                    yield Ok(Event::default().event("reload").data("reload"));
                }
                // Missed some messages; one reload is enough
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };
    Sse::new(stream).keep_alive(KeepAlive::default())
}

pub async fn run(args: &ServeArgs) -> Result<(), anyhow::Error> {
    let config_path = Config::path_from_arg(args.config_file.as_deref())?;
    let base_path = base_path_from_config(&config_path);

    // Create broadcast channel for live reload
    let (reload_tx, _) = broadcast::channel::<()>(16);

    println!("Building page...");
    let session = Session::start(config_path.clone(), base_path)?;
    let output_dir = session.served_dir.clone();
    println!("Built page to {}", output_dir.display());

    // Set up file watcher if enabled
    if args.watch {
        let watch_paths = WatchPaths::new(
            &config_path,
            session.builder.document_path(),
            session.builder.theme().watched_paths(),
        );
        let watch_config = session.builder.config().dev.watch.clone();
        match FileWatcher::new(&watch_config, &watch_paths) {
            Ok(watcher) => {
                println!("Watching for changes...");

                // The watcher blocks; forward its events into the async loop.
                let (change_tx, change_rx) = mpsc::unbounded_channel();
                tokio::task::spawn_blocking(move || {
                    while let Some(event) = watcher.recv() {
                        if change_tx.send(event).is_err() {
                            break;
                        }
                    }
                });

                let reload = reload_tx.clone();
                tokio::spawn(async move { session.run(change_rx, reload).await });
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to start file watcher");
            }
        }
    }

    // Create the static file server
    let serve_dir = ServeDir::new(&output_dir).append_index_html_on_directories(true);

    // Build router with SSE endpoint for live reload
    let app = Router::new()
        .route(LIVE_RELOAD_ROUTE, get(live_reload_handler))
        .with_state(reload_tx)
        .fallback_service(serve_dir);

    let addr: SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;

    // Determine the URL to display
    let display_host = if args.bind == "0.0.0.0" {
        "localhost"
    } else {
        &args.bind
    };
    let url = format!("http://{}:{}", display_host, args.port);

    println!("\nServing page at {}", url);
    println!("Press Ctrl+C to stop\n");

    if args.open
        && let Err(e) = open::that(&url)
    {
        tracing::warn!(error = %e, "failed to open browser");
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// The single owner of the page controller while serving.
///
/// Document changes schedule pipeline runs on the blocking pool; their
/// outcomes come back over a channel and are applied in arrival order.
/// Config and theme changes rebuild everything under a new generation, so
/// runs started before the rebuild are dropped. The server keeps reading the
/// output directory it started with, so every rebuild writes there.
struct Session {
    config_path: PathBuf,
    base_path: PathBuf,
    served_dir: PathBuf,
    builder: Builder,
    controller: PageController,
    query: PageQuery,
    generation: u64,
}

impl Session {
    /// Load the config and build the page once, inline.
    fn start(config_path: PathBuf, base_path: PathBuf) -> Result<Self, anyhow::Error> {
        let builder = load_builder(&config_path, &base_path)?;
        let query = builder.query()?;
        let mut controller = PageController::new();
        controller.render_now(query.document.as_ref(), &builder.pipeline());
        builder.write(&query, &controller)?;
        let served_dir = builder.output_dir();

        Ok(Self {
            config_path,
            base_path,
            served_dir,
            builder,
            controller,
            query,
            generation: 0,
        })
    }

    async fn run(
        mut self,
        mut changes: mpsc::UnboundedReceiver<WatchEvent>,
        reload_tx: broadcast::Sender<()>,
    ) {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<(u64, RenderOutcome)>();

        loop {
            tokio::select! {
                Some(event) = changes.recv() => match event {
                    WatchEvent::FilesChanged(kinds) => {
                        println!("\nDetected {} change(s), rebuilding...", kinds.len());
                        if !kinds.iter().all(|kind| kind.is_document()) {
                            self.reload();
                        }
                        if self.refresh(&done_tx) {
                            let _ = reload_tx.send(());
                        }
                    }
                    WatchEvent::Error(e) => {
                        tracing::warn!(error = %e, "watch error");
                    }
                },
                Some((generation, outcome)) = done_rx.recv() => {
                    if generation != self.generation {
                        continue;
                    }
                    if self.controller.complete(outcome) == Completion::Applied
                        && self.write()
                    {
                        let _ = reload_tx.send(());
                    }
                }
                else => break,
            }
        }
    }

    /// Rebuild the builder from the config file. On failure the previous
    /// builder stays in place.
    fn reload(&mut self) {
        match load_builder(&self.config_path, &self.base_path) {
            Ok(builder) => {
                if builder.output_dir() != self.served_dir {
                    tracing::warn!(
                        serving = %self.served_dir.display(),
                        configured = %builder.output_dir().display(),
                        "site.output changed; restart the server to use the new directory"
                    );
                }
                self.builder = builder.with_output_dir(self.served_dir.clone());
                self.controller = PageController::new();
                self.generation += 1;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to reload configuration");
            }
        }
    }

    /// Re-query the content source and schedule a run if the document
    /// changed. Returns whether the page was rewritten right away.
    fn refresh(&mut self, done_tx: &mpsc::UnboundedSender<(u64, RenderOutcome)>) -> bool {
        self.query = match self.builder.query() {
            Ok(query) => query,
            Err(e) => {
                tracing::error!(error = %e, "failed to read document");
                return false;
            }
        };

        let Some(job) = self.controller.observe(self.query.document.as_ref()) else {
            // Same body or no document: only the shell may differ.
            return self.write();
        };

        tracing::debug!(document = %job.id(), "scheduling pipeline run");
        let pipeline = self.builder.pipeline();
        let generation = self.generation;
        let tx = done_tx.clone();
        tokio::task::spawn_blocking(move || {
            let _ = tx.send((generation, job.run(&pipeline)));
        });
        false
    }

    fn write(&self) -> bool {
        match self.builder.write(&self.query, &self.controller) {
            Ok(_) => {
                println!("Rebuilt page");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to write page");
                false
            }
        }
    }
}

fn load_builder(config_path: &Path, base_path: &Path) -> Result<Builder, anyhow::Error> {
    let config = Config::load_from_file(config_path)?;
    let live_reload = config.dev.live_reload;
    Ok(Builder::new(config, base_path.to_path_buf())?
        .with_dev_mode(true)
        .with_live_reload(live_reload))
}

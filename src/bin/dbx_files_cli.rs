//! dbx-files CLI - Dropbox folder browser
//!
//! Usage:
//!   dbx-files ls [path]                                 List a folder
//!   dbx-files put <local>... [--into <folder>] [--cwd <path>]  Upload files
//!   dbx-files rm <path>                                 Delete a file or folder
//!   dbx-files get <path> [--print]                      Open a temporary download link
//!   dbx-files get-folder <path> [--out <dir>]           Save a folder as a zip archive
//!
//! The access token is read from DROPBOX_ACCESS_TOKEN (or DROPBOX_APP_ACCESS_KEY).

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use dbx_files::{
    AppConfig, DirectorySink, DirectoryView, DropboxClient, Entry, EntryTag, FileManagerError,
    History, LinkOpener, NavigationRequest, Navigator, Notice, NoticeLevel, Notifier, RemotePath,
    UploadFile,
};

#[derive(Parser)]
#[command(
    name = "dbx-files",
    about = "dbx-files - Browse and manage a Dropbox folder tree",
    version,
    long_about = "Lists, uploads, deletes and downloads Dropbox files.\nSet DROPBOX_ACCESS_TOKEN before running."
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List a folder
    Ls {
        /// Folder path (default: /)
        #[arg(default_value = "/")]
        path: String,
    },
    /// Upload local files
    Put {
        /// Local files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Destination folder (default: the --cwd folder)
        #[arg(long)]
        into: Option<String>,
        /// Folder shown while uploading
        #[arg(long, default_value = "/")]
        cwd: String,
    },
    /// Delete a file or folder
    Rm {
        /// Remote path
        path: String,
    },
    /// Open a temporary download link for a file
    Get {
        /// Remote file path
        path: String,
        /// Print the link instead of opening it
        #[arg(long)]
        print: bool,
    },
    /// Download a folder as a zip archive
    GetFolder {
        /// Remote folder path
        path: String,
        /// Output directory (default: the user's download directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

/// Prints notices the way a toast would show them
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => eprintln!("Error: {}", notice.key.fallback_text()),
            _ => eprintln!("{}", notice.key.fallback_text()),
        }
    }
}

/// Writes links to stdout
struct PrintOpener;

impl LinkOpener for PrintOpener {
    fn open(&self, link: &str) -> dbx_files::Result<()> {
        println!("{}", link);
        Ok(())
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_listing(path: &RemotePath, listing: &[Entry]) {
    println!("{}", path);
    if listing.is_empty() {
        println!("  (empty)");
        return;
    }
    for entry in listing {
        match entry.tag {
            EntryTag::Folder => println!("{:>12}  {}/", "-", entry.name),
            EntryTag::File => {
                let size = entry.size().map(|s| s.to_string()).unwrap_or_default();
                println!("{:>12}  {}", size, entry.name);
            }
        }
    }
}

/// Navigate to `path`, following the redirect to the root when it cannot be listed
async fn open_folder(view: &DirectoryView, history: &History, path: RemotePath) -> Result<()> {
    history.navigate(NavigationRequest::To(path.clone()));
    match view.on_path_change(path).await {
        Ok(()) => Ok(()),
        Err(err @ FileManagerError::NavigationFault { .. }) => {
            let fallback = history.current();
            if fallback == view.current_path() {
                return Err(err.into());
            }
            eprintln!("{}; showing {}", err, fallback);
            view.on_path_change(fallback).await?;
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = AppConfig::from_env()?;
    let history = Arc::new(History::default());
    let view = DirectoryView::new(
        Arc::new(DropboxClient::from_config(&config)),
        Arc::new(ConsoleNotifier),
        history.clone(),
    )
    .with_max_concurrent_uploads(config.max_concurrent_uploads);

    match cli.command {
        Commands::Ls { path } => {
            open_folder(&view, &history, RemotePath::from_navigation(&path)).await?;
            print_listing(&view.current_path(), &view.listing());
        }
        Commands::Put { files, into, cwd } => {
            open_folder(&view, &history, RemotePath::from_navigation(&cwd)).await?;

            let mut batch = Vec::with_capacity(files.len());
            for local in &files {
                let name = local
                    .file_name()
                    .and_then(|n| n.to_str())
                    .with_context(|| format!("Invalid file name: {}", local.display()))?;
                let bytes = tokio::fs::read(local)
                    .await
                    .with_context(|| format!("Failed to read {}", local.display()))?;
                batch.push(UploadFile::new(name, bytes));
            }

            let target = into.as_deref().map(RemotePath::from_navigation);
            let uploaded = view.upload_files(batch, target).await?;
            for meta in &uploaded {
                println!("{}", meta.path_display.as_deref().unwrap_or(&meta.name));
            }
        }
        Commands::Rm { path } => {
            let target = RemotePath::from_navigation(&path);
            let parent = target.parent().context("Refusing to delete the root folder")?;
            open_folder(&view, &history, parent).await?;

            let wanted = target.as_navigation().to_lowercase();
            let entry = view
                .listing()
                .into_iter()
                .find(|e| e.target() == Some(wanted.as_str()))
                .with_context(|| format!("{} not found", target))?;
            view.delete_entry(&entry).await?;
            print_listing(&view.current_path(), &view.listing());
        }
        Commands::Get { path, print } => {
            let view = if print { view.with_opener(Arc::new(PrintOpener)) } else { view };
            view.download_file(RemotePath::from_navigation(&path).as_navigation()).await?;
        }
        Commands::GetFolder { path, out } => {
            let view = match out {
                Some(dir) => view.with_archive_sink(Arc::new(DirectorySink::new(dir))),
                None => view,
            };
            view.download_folder(RemotePath::from_navigation(&path).as_navigation()).await?;
        }
    }

    Ok(())
}

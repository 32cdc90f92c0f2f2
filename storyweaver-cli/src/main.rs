mod cli;

use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use storyweaver_core::library::SaveOutcome;
use storyweaver_core::text::{copyable_text, paragraphs};
use storyweaver_core::types::{GenerationRequest, Genre, TargetLanguage};
use storyweaver_engine::traits::GeneratedImage;
use storyweaver_engine::{
    CoordinatorEvent, JobStatus, SavedStories, StartOutcome, StreamStatus, VideoEvent, VideoStatus,
};
use storyweaver_runtime::config_store::ConfigStore;
use storyweaver_runtime::defaults::default_app_config;
use storyweaver_runtime::runtime_engine::{StoryRuntime, build_runtime_from_config, open_library};
use storyweaver_runtime::secrets::{SecretKey, delete_secret, set_secret};
use tokio::sync::broadcast::error::RecvError;

use cli::{Cli, Commands, LibraryCommands};

struct WriteOptions {
    idea: String,
    genre: Genre,
    translate: Option<TargetLanguage>,
    images: Option<PathBuf>,
    video: Option<PathBuf>,
    save: bool,
}

fn data_dir(cli: &Cli) -> anyhow::Result<PathBuf> {
    if let Some(dir) = &cli.data_dir {
        return Ok(dir.clone());
    }
    dirs::data_dir()
        .map(|d| d.join("storyweaver"))
        .context("no platform data directory; pass --data-dir")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let data_dir = data_dir(&cli)?;
    let config_store = ConfigStore::at_path(
        cli.config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.json")),
    );

    match cli.command {
        Commands::Write {
            idea,
            genre,
            translate,
            images,
            video,
            save,
        } => {
            let opts = WriteOptions {
                idea,
                genre: genre.parse()?,
                translate: translate.map(|t| t.parse()).transpose()?,
                images,
                video,
                save,
            };
            let cfg = config_store.load_or_default()?;
            let rt = build_runtime_from_config(&cfg, &data_dir)?;
            let result = write_story(&rt, opts).await;
            rt.coordinator.end_session().await;
            result?;
        }
        Commands::Library { command } => {
            run_library(&open_library(&data_dir), command).await?;
        }
        Commands::SetKey { key } => {
            set_secret(SecretKey::GeminiApiKey, key.trim())?;
            println!("API key stored in the OS keyring.");
        }
        Commands::ForgetKey => {
            delete_secret(SecretKey::GeminiApiKey)?;
            println!("API key removed from the OS keyring.");
        }
        Commands::InitConfig => {
            config_store.save(&default_app_config())?;
            println!("Wrote {}", config_store.path().display());
        }
    }

    Ok(())
}

async fn write_story(rt: &StoryRuntime, opts: WriteOptions) -> anyhow::Result<()> {
    let c = &rt.coordinator;

    let mut events = c.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(CoordinatorEvent::Fragment(f)) => {
                    print!("{f}");
                    let _ = std::io::stdout().flush();
                }
                Ok(CoordinatorEvent::StreamFinished { .. }) => println!("\n"),
                Ok(CoordinatorEvent::Video(VideoEvent::Progress(m))) => eprintln!("[video] {m}"),
                Ok(_) => {}
                Err(RecvError::Lagged(n)) => log::warn!("console missed {n} events"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    c.start_story(GenerationRequest::new(opts.idea, opts.genre))
        .await?
        .wait()
        .await;

    let view = c.snapshot().await;
    if view.session.status != StreamStatus::Complete {
        printer.abort();
        let message = view
            .session
            .error_message
            .unwrap_or_else(|| "The story could not be written.".into());
        return Err(anyhow::anyhow!(message));
    }

    let mut jobs: Vec<StartOutcome> = Vec::new();
    if let Some(language) = opts.translate {
        jobs.push(c.start_translation(language).await?);
    }
    if opts.images.is_some() {
        jobs.push(c.start_image_batch().await?);
    }
    if opts.video.is_some() {
        jobs.push(c.start_video_job().await?);
    }
    // Already running concurrently; this just waits for all of them.
    for job in jobs {
        job.wait().await;
    }
    printer.abort();

    let view = c.snapshot().await;

    if let Some(language) = opts.translate {
        match view.translation.status {
            JobStatus::Complete => {
                let direction = if language.is_rtl() { " (right-to-left)" } else { "" };
                println!("--- {language}{direction} ---");
                println!("{}\n", copyable_text(&view.translation.text));
            }
            _ => eprintln!("Translation: {}", view.translation.error_message.unwrap_or_default()),
        }
    }

    if let Some(dir) = &opts.images {
        match view.images.status {
            JobStatus::Complete => write_images(dir, &view.images.images)?,
            _ => eprintln!("Images: {}", view.images.error_message.unwrap_or_default()),
        }
    }

    if let Some(dest) = &opts.video {
        match (view.video.status, &view.video.result) {
            (VideoStatus::Complete, Some(handle)) => {
                rt.media.export(handle, dest)?;
                println!("Video saved to {}", dest.display());
            }
            _ => eprintln!("Video: {}", view.video.error_message.unwrap_or_default()),
        }
    }

    if opts.save {
        match c.save_current_story().await? {
            SaveOutcome::Saved(record) => println!("Saved to library as #{}", record.id),
            SaveOutcome::AlreadySaved => println!("This story is already in your library."),
        }
    }

    Ok(())
}

fn write_images(dir: &Path, images: &[GeneratedImage]) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    for (i, image) in images.iter().enumerate() {
        let path = dir.join(image.file_name(i));
        std::fs::write(&path, image.decode()?).with_context(|| format!("write {}", path.display()))?;
        println!("Image saved to {}", path.display());
    }
    Ok(())
}

async fn run_library(library: &SavedStories, command: LibraryCommands) -> anyhow::Result<()> {
    match command {
        LibraryCommands::List => {
            let records = library.list().await;
            if records.is_empty() {
                println!("No saved stories yet.");
            }
            for r in records {
                println!("#{:<14} [{}] {}", r.id, r.genre, r.idea);
            }
        }
        LibraryCommands::Show { id } => {
            let record = library
                .find(id)
                .await
                .with_context(|| format!("no saved story with id {id}"))?;
            println!("{} ({})\n", record.idea, record.genre);
            for p in paragraphs(&copyable_text(&record.story)) {
                println!("{p}");
            }
        }
        LibraryCommands::Delete { id } => {
            if library.delete(id).await? {
                println!("Deleted #{id}.");
            } else {
                println!("No saved story with id {id}.");
            }
        }
    }
    Ok(())
}

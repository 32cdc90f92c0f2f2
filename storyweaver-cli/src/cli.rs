//! Command-line surface for StoryWeaver.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "storyweaver", version, about = "Write short stories with Gemini, then translate, illustrate and film them")]
pub struct Cli {
    /// Directory for the story library and downloaded media
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Config file (JSON). Defaults apply when it does not exist
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a story from an idea, optionally deriving more from it
    Write {
        /// The story premise
        idea: String,

        /// General, Fantasy, Sci-Fi, Mystery, Romantic or Gothic
        #[arg(short, long, default_value = "General")]
        genre: String,

        /// Also translate the story (Urdu or Arabic)
        #[arg(long)]
        translate: Option<String>,

        /// Generate illustrations into this directory
        #[arg(long)]
        images: Option<PathBuf>,

        /// Generate a short video and copy it to this path
        #[arg(long)]
        video: Option<PathBuf>,

        /// Add the story to the library when done
        #[arg(long)]
        save: bool,
    },

    /// Manage saved stories
    Library {
        #[command(subcommand)]
        command: LibraryCommands,
    },

    /// Store the Gemini API key in the OS keyring
    SetKey {
        key: String,
    },

    /// Remove the stored Gemini API key from the OS keyring
    ForgetKey,

    /// Write the default config to the config path
    InitConfig,
}

#[derive(Subcommand, Debug)]
pub enum LibraryCommands {
    /// List saved stories, newest first
    List,

    /// Print one saved story
    Show { id: i64 },

    /// Delete one saved story
    Delete { id: i64 },
}

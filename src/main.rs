use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use tubify::{cli, config, error};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authorize with Spotify API
    Auth,

    /// Remove stored Spotify credentials
    Logout,

    /// Show whether a usable Spotify token is stored
    Status,

    /// Show the Spotify profile of the logged in user
    Whoami,

    /// Find the Spotify track for a YouTube video
    Search(VideoOptions),

    /// List your Spotify playlists
    Playlists,

    /// Find the Spotify track for a YouTube video and add it to a playlist
    Add(AddOptions),

    /// Find the Spotify track for a YouTube video and save it to your library
    Favorite(FavoriteOptions),

    /// Convert a list of YouTube videos into a new Spotify playlist
    Convert(ConvertOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct VideoOptions {
    /// Title of the YouTube video
    #[clap(long)]
    pub title: String,

    /// Name of the channel that uploaded the video
    #[clap(long)]
    pub channel: Option<String>,

    /// Accept the first track by the artist when no title matches exactly
    #[clap(long)]
    pub loose: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct AddOptions {
    #[clap(flatten)]
    pub video: VideoOptions,

    /// Id of the playlist to add the track to (see `tubify playlists`)
    #[clap(long)]
    pub playlist: String,

    /// Do not ask for confirmation
    #[clap(long, short)]
    pub yes: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct FavoriteOptions {
    #[clap(flatten)]
    pub video: VideoOptions,

    /// Do not ask for confirmation
    #[clap(long, short)]
    pub yes: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ConvertOptions {
    /// File with one video per line: `title<TAB>channel`
    #[clap(long)]
    pub input: String,

    /// Name of the playlist to create
    #[clap(long)]
    pub name: String,

    /// Accept the first track by the artist when no title matches exactly
    #[clap(long)]
    pub loose: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        Command::Auth => cli::auth().await,
        Command::Logout => cli::logout().await,
        Command::Status => cli::status().await,
        Command::Whoami => cli::whoami().await,
        Command::Search(opt) => cli::search(opt.title, opt.channel, opt.loose).await,
        Command::Playlists => cli::playlists().await,
        Command::Add(opt) => {
            cli::add(
                opt.video.title,
                opt.video.channel,
                opt.playlist,
                opt.yes,
                opt.video.loose,
            )
            .await
        }
        Command::Favorite(opt) => {
            cli::favorite(opt.video.title, opt.video.channel, opt.yes, opt.video.loose).await
        }
        Command::Convert(opt) => cli::convert(opt.input, opt.name, opt.loose).await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}

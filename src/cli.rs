use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "geo-chat")]
#[command(about = "Chat with whoever is nearby, in your terminal", long_about = None)]
pub struct Cli {
    /// Display name for this session (default: the remembered one)
    #[arg(short, long)]
    pub username: Option<String>,

    /// Latitude to chat from
    #[arg(long, allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude to chat from
    #[arg(long, allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// Firebase Realtime Database URL
    #[arg(long, value_name = "URL")]
    pub database_url: Option<String>,

    /// Keep rooms in memory instead of connecting to the database
    #[arg(long)]
    pub offline: bool,

    /// Use the light color theme
    #[arg(long)]
    pub light: bool,

    /// Custom config directory (default: ~/.config/geo-chat)
    #[arg(long, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Enable verbose logging (prints log path, sets DEBUG level)
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the room key for a coordinate pair
    Key {
        #[arg(allow_negative_numbers = true)]
        latitude: f64,
        #[arg(allow_negative_numbers = true)]
        longitude: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_coordinates_parse_as_values() {
        let cli = Cli::try_parse_from(["geo-chat", "--lat", "-33.9", "--lon", "-70.6"]).unwrap();
        assert_eq!(cli.lat, Some(-33.9));
        assert_eq!(cli.lon, Some(-70.6));
    }

    #[test]
    fn key_subcommand_takes_two_coordinates() {
        let cli = Cli::try_parse_from(["geo-chat", "key", "40", "-111"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Key { latitude, longitude }) if latitude == 40.0 && longitude == -111.0
        ));
    }

    #[test]
    fn flags_default_off() {
        let cli = Cli::try_parse_from(["geo-chat"]).unwrap();
        assert!(!cli.offline);
        assert!(!cli.verbose);
        assert!(cli.command.is_none());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

//! Line commands read from stdin

use crate::error::{ConsoleError, Result};
use podplay_playback::{PlaybackRequest, UserCommand};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    /// `load <uri> [ref]`
    Load {
        location: String,
        source_reference: Option<String>,
    },
    /// `unload`
    Unload,
    /// `toggle`, `back`, `forward`, `seek <delta>`
    Player(UserCommand),
    /// `scrub <t>...`: previews every target, in order
    Scrub(Vec<f64>),
    /// `commit <t>`
    Commit(f64),
    /// `state`
    State,
    /// `quit`
    Quit,
}

impl ConsoleCommand {
    /// Request for a `load` command, honouring the autoplay flag
    pub fn request(&self, autoplay: bool) -> Option<PlaybackRequest> {
        match self {
            ConsoleCommand::Load {
                location,
                source_reference,
            } => Some(PlaybackRequest {
                source_reference: source_reference.clone(),
                audio_location: Some(location.clone()),
                autoplay,
            }),
            ConsoleCommand::Unload => Some(PlaybackRequest::unload()),
            _ => None,
        }
    }
}

impl FromStr for ConsoleCommand {
    type Err = ConsoleError;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(ConsoleError::Command("empty line".to_string()));
        };
        let args: Vec<&str> = words.collect();

        let command = match (verb, args.as_slice()) {
            ("load", [location]) => ConsoleCommand::Load {
                location: (*location).to_string(),
                source_reference: None,
            },
            ("load", [location, reference]) => ConsoleCommand::Load {
                location: (*location).to_string(),
                source_reference: Some((*reference).to_string()),
            },
            ("unload", []) => ConsoleCommand::Unload,
            ("toggle", []) => ConsoleCommand::Player(UserCommand::TogglePlayPause),
            ("back", []) => ConsoleCommand::Player(UserCommand::SkipBack),
            ("forward", []) => ConsoleCommand::Player(UserCommand::SkipForward),
            ("seek", [delta]) => ConsoleCommand::Player(UserCommand::SeekRelative(seconds(delta)?)),
            ("scrub", targets) if !targets.is_empty() => ConsoleCommand::Scrub(
                targets
                    .iter()
                    .map(|&t| seconds(t))
                    .collect::<Result<Vec<_>>>()?,
            ),
            ("commit", [target]) => ConsoleCommand::Commit(seconds(target)?),
            ("state", []) => ConsoleCommand::State,
            ("quit" | "exit", []) => ConsoleCommand::Quit,
            _ => return Err(ConsoleError::Command(line.trim().to_string())),
        };
        Ok(command)
    }
}

fn seconds(word: &str) -> Result<f64> {
    word.parse::<f64>()
        .map_err(|_| ConsoleError::Command(format!("not a number of seconds: {word}")))
}

use anyhow::{Result, anyhow, bail};
use std::str::FromStr;

use common::network::DEFAULT_SERVER;
use keybinds::Keybinds;
use logos::Logos;
use strum::EnumString;
use tracing::error;
use url::Url;

use crate::app::{AppMessage, AppTab};
use crate::records::Msg as RecordsMsg;

use super::{ProgressMode, ThemeChoice};

const DEFAULT_CONFIG: &str = include_str!("../../assets/default.conf");

#[derive(Debug, EnumString, Clone, Copy, PartialEq, Eq)]
pub enum BindableMessage {
    RecordsTab,
    UploadTab,
    ToggleChart,
    NextPage,
    PreviousPage,
    Quit,
}

impl From<BindableMessage> for AppMessage {
    fn from(value: BindableMessage) -> Self {
        match value {
            BindableMessage::RecordsTab => AppMessage::Tab(AppTab::Records),
            BindableMessage::UploadTab => AppMessage::Tab(AppTab::Upload),
            BindableMessage::ToggleChart => AppMessage::Records(RecordsMsg::ToggleChart),
            BindableMessage::NextPage => AppMessage::Records(RecordsMsg::NextPage),
            BindableMessage::PreviousPage => AppMessage::Records(RecordsMsg::PreviousPage),
            BindableMessage::Quit => AppMessage::Quit,
        }
    }
}

#[derive(Debug)]
pub struct Config {
    pub keyboard: Keybinds<BindableMessage>,
    pub server: Url,
    pub progress: ProgressMode,
    pub dark_mode: bool,
}

impl Config {
    pub fn new() -> Self {
        Config {
            keyboard: Keybinds::new(vec![]),
            server: Url::parse(DEFAULT_SERVER).expect("DEFAULT_SERVER is a valid url"),
            progress: ProgressMode::default(),
            dark_mode: true,
        }
    }

    fn apply(&mut self, cmd: Command, args: &[String]) -> Result<()> {
        match cmd {
            Command::Bind => {
                expect_args("Bind", args, 2)?;
                let action = BindableMessage::from_str(&args[1])
                    .map_err(|_| anyhow!("Unknown action {}", args[1]))?;
                self.keyboard
                    .bind(&args[0], action)
                    .map_err(|e| anyhow!("Invalid key sequence {}: {:?}", args[0], e))?;
            }
            Command::SetServer => {
                expect_args("SetServer", args, 1)?;
                self.server = Url::parse(&args[0])?;
            }
            Command::Progress => {
                expect_args("Progress", args, 1)?;
                self.progress = ProgressMode::from_str(&args[0])
                    .map_err(|_| anyhow!("Unknown progress mode {}", args[0]))?;
            }
            Command::Theme => {
                expect_args("Theme", args, 1)?;
                let theme = ThemeChoice::from_str(&args[0])
                    .map_err(|_| anyhow!("Unknown theme {}", args[0]))?;
                self.dark_mode = theme == ThemeChoice::Dark;
            }
        }
        Ok(())
    }
}

fn expect_args(cmd: &str, args: &[String], n: usize) -> Result<()> {
    if args.len() != n {
        bail!("{} requires {} argument(s), got {}", cmd, n, args.len());
    }
    Ok(())
}

impl Default for Config {
    fn default() -> Self {
        Self::from_str(DEFAULT_CONFIG).unwrap_or_else(|e| {
            error!("Embedded default config is invalid: {}", e);
            Config::new()
        })
    }
}

impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let sanitized = s.chars().filter(|&c| c != '\r').collect::<String>();
        let mut lexer = Token::lexer(&sanitized);

        let mut out = Config::new();
        let mut cmd_name: Option<String> = None;
        let mut args = vec![];
        let mut line = 1;

        loop {
            let token = lexer.next();
            match token {
                Some(Ok(Token::String(s))) => {
                    if cmd_name.is_none() {
                        cmd_name = Some(s);
                    } else {
                        args.push(s);
                    }
                }
                Some(Ok(Token::ArgDelim)) => {}
                Some(Ok(Token::StatementDelim)) | None => {
                    if let Some(name) = cmd_name.take() {
                        let cmd = Command::from_str(&name)
                            .map_err(|_| anyhow!("line {}: unknown command {}", line, name))?;
                        out.apply(cmd, &args)
                            .map_err(|e| anyhow!("line {}: {}", line, e))?;
                    }
                    args.clear();
                    line += 1;
                    if token.is_none() {
                        break;
                    }
                }
                Some(Err(())) => bail!("line {}: unexpected input {:?}", line, lexer.slice()),
            }
        }
        Ok(out)
    }
}

/// Represents valid tokens in a configuration file.
#[derive(Debug, Logos)]
#[logos(skip r"#[^\n]*")]
enum Token {
    #[regex("[ \t]+")]
    ArgDelim,

    #[token("\n")]
    StatementDelim,

    #[regex("[^ \t\n#][^ \t\n]*", |lex| lex.slice().to_owned())]
    String(String),
}

#[derive(Debug, EnumString)]
enum Command {
    Bind,
    SetServer,
    Progress,
    Theme,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_default_parses() {
        let config = Config::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.server.as_str(), "http://localhost:5000/");
        assert_eq!(config.progress, ProgressMode::Streamed);
        assert!(config.dark_mode);
    }

    #[test]
    fn last_line_without_newline_is_applied() {
        let config = Config::from_str("# staging\r\nTheme Light\nProgress Simulated").unwrap();
        assert!(!config.dark_mode);
        assert_eq!(config.progress, ProgressMode::Simulated);
    }

    #[test]
    fn blank_lines_and_comments_are_ignored() {
        let config = Config::from_str("\n\n# nothing here\nSetServer http://ledger.local:8080\n\n")
            .unwrap();
        assert_eq!(config.server.host_str(), Some("ledger.local"));
    }

    #[test]
    fn errors_name_the_line() {
        let err = Config::from_str("Theme Dark\nFrobnicate now\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
        let err = Config::from_str("SetServer\n").unwrap_err();
        assert!(err.to_string().contains("requires 1"));
        assert!(Config::from_str("Bind Ctrl+x Explode\n").is_err());
    }
}

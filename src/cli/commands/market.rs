//! Market command implementation.
//!
//! The `reprise market` command group talks to the sharing service:
//! accounts, balances, listings, publishing, and purchasing.

use std::path::{Path, PathBuf};

use crate::cli::args::{KindArg, MarketArgs, MarketSubcommand};
use crate::engine::Engine;
use crate::error::Result;
use crate::input::TraceInput;
use crate::market::{ItemSummary, MarketClient, PublishReceipt};
use crate::package::{ExportOptions, ImportReport};

use super::dispatcher::{Command, CommandResult};

/// The market command implementation.
pub struct MarketCommand {
    data_dir: PathBuf,
    args: MarketArgs,
}

impl MarketCommand {
    /// Create a new market command.
    pub fn new(data_dir: &Path, args: MarketArgs) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            args,
        }
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn client(&self) -> MarketClient {
        let client = MarketClient::new(&self.args.url);
        match &self.args.token {
            Some(token) => client.with_token(token),
            None => client,
        }
    }
}

impl Command for MarketCommand {
    fn execute(&self) -> Result<CommandResult> {
        match &self.args.command {
            MarketSubcommand::Register { user, password } => {
                let message = self.client().register(user, password)?;
                println!("{}", message);
            }
            MarketSubcommand::Login { user, password } => {
                let mut client = self.client();
                let session = client.login(user, password)?;
                println!(
                    "Logged in as '{}' ({} points)",
                    session.user_id, session.points
                );
                println!("Token: {}", session.token);
                println!("Pass it via --token or REPRISE_MARKET_TOKEN");
            }
            MarketSubcommand::Points => {
                let points = self.client().points()?;
                println!("{} points", points);
            }
            MarketSubcommand::List { kind } => {
                let items = self.client().list_items((*kind).into())?;
                if items.is_empty() {
                    println!("No items published yet");
                } else {
                    for item in &items {
                        print_item(item);
                    }
                }
            }
            MarketSubcommand::Publish {
                kind,
                name,
                author,
                description,
                price,
            } => {
                let receipt = self.publish(*kind, name, author, description, *price)?;
                println!("Published '{}' as item {}", name, receipt.item_id);
                println!("{} points", receipt.points);
            }
            MarketSubcommand::Purchase { kind, item_id } => {
                let (report, points) = self.purchase(*kind, *item_id)?;
                println!("Imported '{}' ({} steps)", report.name, report.steps.len());
                println!("{} points left", points);
            }
        }
        Ok(CommandResult::success())
    }
}

impl MarketCommand {
    fn publish(
        &self,
        kind: KindArg,
        name: &str,
        author: &str,
        description: &str,
        price: i64,
    ) -> Result<PublishReceipt> {
        let engine = Engine::open(&self.data_dir, TraceInput::new())?;
        let opts = ExportOptions {
            author: author.to_string(),
            description: description.to_string(),
            price,
        };
        let archive = engine.export_package_bytes(kind.into(), name, &opts)?;
        self.client().publish(kind.into(), name, &archive, &opts)
    }

    fn purchase(&self, kind: KindArg, item_id: i64) -> Result<(ImportReport, i64)> {
        let purchase = self.client().purchase(item_id)?;
        let mut engine = Engine::open(&self.data_dir, TraceInput::new())?;
        let report = engine.import_package_bytes(&purchase.archive, kind.into(), None)?;
        Ok((report, purchase.points))
    }
}

fn print_item(item: &ItemSummary) {
    println!(
        "[{}] {} by {} ({} points, {} downloads)",
        item.id, item.name, item.author, item.price, item.download_count
    );
    if !item.description.is_empty() {
        println!("    {}", item.description);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RepriseError;
    use tempfile::TempDir;

    fn market_args(url: &str, command: MarketSubcommand) -> MarketArgs {
        MarketArgs {
            url: url.into(),
            token: None,
            command,
        }
    }

    #[test]
    fn market_command_creation() {
        let temp = TempDir::new().unwrap();
        let args = market_args("http://localhost:9", MarketSubcommand::Points);
        let cmd = MarketCommand::new(temp.path(), args);

        assert_eq!(cmd.data_dir(), temp.path());
    }

    #[test]
    fn points_without_a_token_fails_before_any_request() {
        let temp = TempDir::new().unwrap();
        let args = market_args("http://localhost:9", MarketSubcommand::Points);
        let cmd = MarketCommand::new(temp.path(), args);

        let err = cmd.execute().unwrap_err();

        assert!(matches!(err, RepriseError::MarketAuth { .. }));
    }

    #[test]
    fn publish_unknown_item_fails_before_any_request() {
        let temp = TempDir::new().unwrap();
        let args = MarketArgs {
            url: "http://localhost:9".into(),
            token: Some("t0k".into()),
            command: MarketSubcommand::Publish {
                kind: KindArg::Component,
                name: "missing".into(),
                author: String::new(),
                description: String::new(),
                price: 0,
            },
        };
        let cmd = MarketCommand::new(temp.path(), args);

        let err = cmd.execute().unwrap_err();

        assert!(matches!(err, RepriseError::UnknownComponent { .. }));
    }
}

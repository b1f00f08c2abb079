//! Comments command: ad-hoc lookup of one ticket's comments

use clap::Args;

use super::{Cli, CliError};
use crate::exporter::RateLimitBackoff;
use crate::fetcher::zendesk::ZendeskClient;
use crate::fetcher::{classify_status, StatusClass};

/// Comments command arguments
#[derive(Args, Debug)]
pub struct CommentsArgs {
    /// Ticket id
    pub ticket_id: u64,
}

impl CommentsArgs {
    /// Fetch the comments and print them as pretty JSON
    pub async fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let client = ZendeskClient::new(cli.zendesk_config()?)?;
        let backoff = RateLimitBackoff::new(cli.max_retries);

        let response = backoff
            .send(|| client.fetch_comments(self.ticket_id))
            .await?;

        match classify_status(&response) {
            StatusClass::Success => {
                match serde_json::from_str::<serde_json::Value>(&response.body) {
                    Ok(value) => println!(
                        "{}",
                        serde_json::to_string_pretty(&value).unwrap_or(response.body)
                    ),
                    Err(_) => println!("{}", response.body),
                }
                Ok(())
            }
            _ => Err(CliError::RequestFailed {
                status: response.status,
                body: response.body.chars().take(512).collect(),
            }),
        }
    }
}

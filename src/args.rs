use clap::Parser;
use site_harvest::InvocationEvent;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "site-harvest")]
#[command(about = "Crawl a site through Firecrawl, save its pages, text and images")]
#[command(version)]
pub struct Args {
    /// JSON file holding the invocation event
    #[arg(short, long)]
    pub event: Option<PathBuf>,

    /// Page limit, overriding the event's `max_pages`
    #[arg(short, long)]
    pub max_pages: Option<u32>,
}

impl Args {
    /// Build the invocation event from the event file and flags
    pub fn to_event(&self) -> Result<Option<InvocationEvent>, Box<dyn std::error::Error>> {
        let mut event = match &self.event {
            Some(path) => {
                let contents = std::fs::read_to_string(path)?;
                Some(serde_json::from_str::<InvocationEvent>(&contents)?)
            }
            None => None,
        };

        if let Some(max_pages) = self.max_pages {
            event.get_or_insert_with(InvocationEvent::default).max_pages = Some(max_pages);
        }
        Ok(event)
    }
}

use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{
    HttpGraphqlTransport, PersonDetailController, PersonListController, PersonsQuery, QueryClient,
    QueryStore, SearchController, ViewState,
};
use shared::{
    display::PersonCard,
    domain::{PersonId, PersonLink, PersonType},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod render;

use config::load_settings;

#[derive(Parser, Debug)]
#[command(about = "Browse politicians and billionaires from the transparency GraphQL API")]
struct Cli {
    /// Config file; defaults to ./viewer.toml when it exists.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the configured GraphQL endpoint.
    #[arg(long)]
    endpoint: Option<String>,
    /// Print cards as JSON instead of text.
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Kind {
    Politician,
    Billionaire,
}

impl From<Kind> for PersonType {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Politician => PersonType::Politician,
            Kind::Billionaire => PersonType::Billionaire,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    List {
        #[arg(long, value_enum, default_value_t = Kind::Politician)]
        kind: Kind,
        #[arg(long)]
        limit: Option<i64>,
        #[arg(long)]
        offset: Option<i64>,
        #[arg(long)]
        party: Option<String>,
    },
    Show {
        id: String,
        /// Name shown until the record loads.
        #[arg(long)]
        name: Option<String>,
        #[arg(long, value_enum, default_value_t = Kind::Politician)]
        kind: Kind,
        #[arg(long)]
        limit: Option<i64>,
    },
    Search {
        #[arg(required = true)]
        text: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(endpoint) = cli.endpoint.clone() {
        settings.graphql_endpoint = endpoint;
    }
    let endpoint = settings.endpoint()?;
    info!(%endpoint, "viewer starting");

    let store = Arc::new(QueryStore::new(settings.cache_config()));
    let transport = HttpGraphqlTransport::new(endpoint, settings.request_timeout())
        .context("failed to build graphql transport")?;
    let client = Arc::new(QueryClient::new(Arc::new(transport), Arc::clone(&store)));

    let outcome = run(&cli, settings.default_limit, client).await;
    store.clear();
    outcome
}

async fn run(cli: &Cli, default_limit: i64, client: Arc<QueryClient>) -> Result<()> {
    match &cli.command {
        Command::List {
            kind,
            limit,
            offset,
            party,
        } => {
            let mut query = PersonsQuery::new((*kind).into(), limit.unwrap_or(default_limit));
            if let Some(offset) = offset {
                query = query.with_offset(*offset);
            }
            if let Some(party) = party {
                query = query.with_party(party.clone());
            }

            let list = PersonListController::new(client);
            settle_list(&list, query).await?;
            let cards = list.cards()?;
            if cli.json {
                println!("{}", render::cards_json(&cards)?);
            } else {
                println!("{}", render::card_list(&cards));
            }
        }
        Command::Show {
            id,
            name,
            kind,
            limit,
        } => {
            let source = PersonsQuery::new((*kind).into(), limit.unwrap_or(default_limit));
            let id = PersonId::new(id.clone());

            let list = PersonListController::new(Arc::clone(&client));
            settle_list(&list, source.clone()).await?;
            let link = list.link_for(&id).unwrap_or_else(|| PersonLink {
                full_name: name.clone().unwrap_or_else(|| id.to_string()),
                id: id.clone(),
            });
            list.unmount();

            let detail = PersonDetailController::open(client, link, source);
            info!(id = %detail.id(), title = %detail.title(), "opening person");
            if let Some(handle) = detail.load()? {
                handle.await.context("person task panicked")?;
            }
            let person = match detail.state() {
                ViewState::Ready(person) => person,
                ViewState::Error(err) => return Err(err.into()),
                ViewState::Loading => bail!("person {id} is still loading"),
            };
            let card = PersonCard::try_from(&person)?;
            if cli.json {
                println!("{}", render::cards_json(std::slice::from_ref(&card))?);
            } else {
                println!("{}", render::card_detail(&card, person.biography()));
            }
        }
        Command::Search { text } => {
            let mut search = SearchController::default();
            search.set_text(text.join(" "));
            if search.submit().await? {
                println!("search for '{}' submitted", search.text().trim());
            } else {
                println!("nothing to search for");
            }
        }
    }
    Ok(())
}

async fn settle_list(list: &PersonListController, query: PersonsQuery) -> Result<()> {
    if let Some(handle) = list.dispatch(query)? {
        handle.await.context("persons task panicked")?;
    }
    match list.state() {
        ViewState::Ready(_) => Ok(()),
        ViewState::Error(err) => Err(err.into()),
        ViewState::Loading => bail!("persons query is still loading"),
    }
}

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use log::{error, info};
use std::sync::Arc;
use tokio::sync::watch;

use plant_manager::core::Config;
use plant_manager::features::catalog::filter_by_environment;
use plant_manager::{
    CatalogClient, KeyValueStore, LogSink, PlantStore, ReminderScheduler, SqliteKeyValueStore,
};

#[derive(Parser)]
#[command(name = "plant-manager")]
#[command(about = "Lembretes de rega para as suas plantas")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Perfil do usuário
    #[command(subcommand)]
    User(UserCommand),
    /// Catálogo remoto de plantas
    #[command(subcommand)]
    Catalog(CatalogCommand),
    /// Plantas salvas
    #[command(subcommand)]
    Plant(PlantCommand),
    /// Entregar lembretes até Ctrl-C
    Watch,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Salvar nome (e foto opcional)
    Set {
        name: String,
        #[arg(long)]
        picture: Option<String>,
    },
    /// Mostrar o perfil salvo
    Show,
}

#[derive(Subcommand, Debug)]
enum CatalogCommand {
    /// Listar ambientes
    Environments,
    /// Listar plantas do catálogo
    Plants {
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Filtrar por ambiente (chave)
        #[arg(long, default_value = "all")]
        environment: String,
    },
}

#[derive(Subcommand, Debug)]
enum PlantCommand {
    /// Salvar uma planta do catálogo com lembrete
    Add(AddArgs),
    /// Listar plantas salvas
    List,
    /// Remover planta salva
    Remove { id: String },
}

#[derive(Args, Debug)]
struct AddArgs {
    /// ID da planta no catálogo
    id: String,
    /// Momento do lembrete (RFC 3339, ex: 2024-05-01T08:00:00-03:00)
    #[arg(long)]
    at: String,
}

struct App {
    config: Config,
    store: PlantStore,
    scheduler: Arc<ReminderScheduler>,
}

impl App {
    fn open(config: Config) -> Result<Self> {
        let kv: Arc<dyn KeyValueStore> = Arc::new(
            SqliteKeyValueStore::open(&config.database_path)
                .with_context(|| format!("opening {}", config.database_path))?,
        );
        let scheduler = Arc::new(ReminderScheduler::new(kv.clone()));
        let store = PlantStore::new(kv, scheduler.clone());
        Ok(Self {
            config,
            store,
            scheduler,
        })
    }

    fn catalog(&self) -> Result<CatalogClient> {
        Ok(CatalogClient::new(
            self.config.catalog_api_url.clone(),
            self.config.catalog_page_size,
        )?)
    }

    async fn run(&self, command: Commands) -> Result<()> {
        match command {
            Commands::User(UserCommand::Set { name, picture }) => {
                let user = self.store.save_user(&name, picture.as_deref()).await?;
                println!("Prontinho, {}!", user.name);
            }
            Commands::User(UserCommand::Show) => {
                let user = self.store.get_user().await?;
                println!("Olá, {}", user.name);
                if !user.picture.is_empty() {
                    println!("Foto: {}", user.picture);
                }
            }
            Commands::Catalog(CatalogCommand::Environments) => {
                for env in self.catalog()?.environments().await? {
                    println!("{:<16} {}", env.key, env.title);
                }
            }
            Commands::Catalog(CatalogCommand::Plants { page, environment }) => {
                let plants = self.catalog()?.plants(page).await?;
                let plants = filter_by_environment(&plants, &environment);
                if plants.is_empty() {
                    println!("Nenhuma planta encontrada");
                }
                for plant in plants {
                    println!(
                        "{:>4}  {:<24} {}x/{}",
                        plant.id, plant.name, plant.frequency.times, plant.frequency.repeat_every
                    );
                }
            }
            Commands::Plant(PlantCommand::Add(args)) => {
                let at = DateTime::parse_from_rfc3339(&args.at)
                    .with_context(|| format!("invalid --at '{}'", args.at))?
                    .with_timezone(&Utc);
                let catalog_plant = self
                    .catalog()?
                    .find_plant(&args.id)
                    .await?
                    .with_context(|| format!("plant {} not found in catalog", args.id))?;
                let plant = self.store.plan_reminder(catalog_plant, at)?;
                let name = plant.name.clone();
                let handle = self.store.save_plant(plant).await?;
                println!("Tudo certo! {name} salva (lembrete {handle})");
            }
            Commands::Plant(PlantCommand::List) => {
                let plants = self.store.load_plants().await?;
                println!("{}", self.store.watering_summary().await?);
                for plant in plants {
                    println!(
                        "{}  {:<24} {}",
                        plant.hour,
                        plant.name,
                        plant
                            .date_time_notification
                            .with_timezone(&Local)
                            .format("%d/%m/%Y")
                    );
                }
            }
            Commands::Plant(PlantCommand::Remove { id }) => {
                self.store.remove_plant(&id).await?;
                println!("Planta {id} removida");
            }
            Commands::Watch => self.watch().await?,
        }
        Ok(())
    }

    async fn watch(&self) -> Result<()> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let loop_handle = tokio::spawn(self.scheduler.clone().run(
            Arc::new(LogSink),
            self.config.reminder_poll_interval,
            shutdown_rx,
        ));

        tokio::signal::ctrl_c().await?;
        info!("Shutting down reminder loop");
        let _ = shutdown_tx.send(true);
        loop_handle.await?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    let cli = Cli::parse();
    let app = App::open(config)?;

    if let Err(e) = app.run(cli.command).await {
        error!("{e:#}");
        return Err(e);
    }
    Ok(())
}

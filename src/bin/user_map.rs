use clap::{Parser, Subcommand};
use wh_productivity::utils::logger;
use wh_productivity::{LocalStorage, UserMappingStore};

#[derive(Parser)]
#[command(name = "user-map")]
#[command(about = "Manage the worker id to display name mapping")]
struct Args {
    /// Directory holding userMappings.json
    #[arg(long, default_value = ".")]
    mappings_path: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Map a worker id to a name, replacing any previous name
    Add { user_id: String, name: String },
    /// Forget one worker id
    Remove { user_id: String },
    /// Delete every mapping
    Clear,
    /// Print all mappings
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let store = UserMappingStore::new(LocalStorage::new(args.mappings_path.clone()));

    match args.command {
        Command::Add { user_id, name } => {
            let mut mappings = store.load().await?;
            if !mappings.add(&user_id, &name) {
                eprintln!("❌ Both a user id and a name are required");
                std::process::exit(1);
            }
            store.save(&mappings).await?;
            println!("✅ {}", mappings.display_name(user_id.trim()));
        }
        Command::Remove { user_id } => {
            let mut mappings = store.load().await?;
            match mappings.remove(&user_id) {
                Some(name) => {
                    store.save(&mappings).await?;
                    println!("✅ Removed {} → {}", user_id, name);
                }
                None => println!("{} has no mapping", user_id),
            }
        }
        Command::Clear => {
            store.clear().await?;
            println!("✅ All mappings cleared");
        }
        Command::List => {
            let mappings = store.load().await?;
            if mappings.is_empty() {
                println!("No user mappings");
            }
            for (user_id, name) in mappings.iter() {
                println!("{} → {}", user_id, name);
            }
        }
    }

    Ok(())
}

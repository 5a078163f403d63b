use clap::{Parser, Subcommand};
use eyre::WrapErr;
use models::Role;

#[derive(Parser, Debug)]
#[command(name = "boost-admin")]
#[command(about = "Provision users and API tokens for the order server", long_about = None)]
struct Args {
    /// SQLite database URL
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://data/boost.sqlite3")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a user and print its first API token
    CreateUser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        /// client, booster or admin
        #[arg(long, default_value = "client")]
        role: Role,
    },
    /// Issue an additional API token for an existing user
    IssueToken {
        #[arg(long)]
        user_id: i64,
    },
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "boost_admin=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let pool = boost_db::connect(&args.database_url)
        .await
        .wrap_err_with(|| format!("failed to open {}", args.database_url))?;
    boost_db::migrate(&pool).await?;

    let now = chrono::Utc::now().timestamp();

    match args.command {
        Command::CreateUser { email, name, role } => {
            let user = boost_db::insert_user(&pool, &email, &name, role, now)
                .await
                .wrap_err("failed to create user")?;
            tracing::info!("Created {} user {} ({})", user.role, user.id, user.email);
            let token = boost_db::issue_token(&pool, user.id, now).await?;
            println!("{token}");
        }
        Command::IssueToken { user_id } => {
            let user = boost_db::get_user(&pool, user_id)
                .await?
                .ok_or_else(|| eyre::eyre!("no user with id {user_id}"))?;
            let token = boost_db::issue_token(&pool, user.id, now).await?;
            tracing::info!("Issued token for user {} ({})", user.id, user.email);
            println!("{token}");
        }
    }

    Ok(())
}

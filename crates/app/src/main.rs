use std::error::Error;

use clap::{Args, Parser, Subcommand};
use engine::{Engine, Money, Permission, Role, RoleSet, Subject, deny_unless_granted};
use migration::{Migrator, MigratorTrait};
use uuid::Uuid;

use hasher::Argon2Hasher;

mod hasher;
mod settings;

#[derive(Parser, Debug)]
#[command(name = "pennywise")]
#[command(about = "Pennywise administration: schema, users and reports")]
struct Cli {
    /// Settings file, without extension.
    #[arg(long, default_value = "settings")]
    config: String,

    /// Overrides the database from the settings (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending migrations and exit.
    Migrate,
    User(User),
    Report(Report),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
    /// Grant a role.
    Promote(UserRoleArgs),
    /// Revoke a role.
    Demote(UserRoleArgs),
    /// Delete a user with everything they own.
    Delete(UserEmailArgs),
    List(PageArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    email: String,
    #[arg(long, env = "PENNYWISE_PASSWORD", hide_env_values = true)]
    password: String,
    /// Extra roles, e.g. `--role admin --role super_admin`.
    #[arg(long = "role")]
    roles: Vec<String>,
}

#[derive(Args, Debug)]
struct UserRoleArgs {
    #[arg(long)]
    email: String,
    #[arg(long, default_value = "admin")]
    role: String,
}

#[derive(Args, Debug)]
struct UserEmailArgs {
    #[arg(long)]
    email: String,
}

#[derive(Args, Debug)]
struct PageArgs {
    #[arg(long)]
    page: Option<String>,
}

#[derive(Args, Debug)]
struct Report {
    #[command(subcommand)]
    command: ReportCommand,
}

#[derive(Subcommand, Debug)]
enum ReportCommand {
    /// Print the operations a report selects.
    Show(ReportShowArgs),
}

#[derive(Args, Debug)]
struct ReportShowArgs {
    #[arg(long)]
    id: Uuid,
    /// E-mail of the user viewing the report; must be its author.
    #[arg(long = "as")]
    viewer: String,
    #[arg(long)]
    page: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();
    let settings = settings::Settings::new(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "pennywise={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let url = cli
        .database_url
        .clone()
        .unwrap_or_else(|| settings.database.clone().unwrap_or_default().url());
    let db = sea_orm::Database::connect(&url).await?;
    Migrator::up(&db, None).await?;
    tracing::debug!(%url, "database ready");

    let mut builder = Engine::builder().database(db);
    if let Some(page_size) = settings.engine.page_size {
        builder = builder.page_size(page_size);
    }
    if let Some(floor) = &settings.engine.balance_floor {
        builder = builder.balance_floor(floor.parse::<Money>()?);
    }
    let engine = builder.build().await?;
    let hasher = Argon2Hasher::default();

    match cli.command {
        Command::Migrate => println!("migrations applied"),
        Command::User(User { command }) => run_user(&engine, &hasher, command).await?,
        Command::Report(Report {
            command: ReportCommand::Show(args),
        }) => show_report(&engine, args).await?,
    }

    Ok(())
}

async fn run_user(
    engine: &Engine,
    hasher: &Argon2Hasher,
    command: UserCommand,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    match command {
        UserCommand::Create(args) => {
            let roles = args
                .roles
                .iter()
                .map(|raw| Role::try_from(raw.as_str()))
                .collect::<Result<RoleSet, _>>()?;
            let user = engine
                .register_user(&args.email, &args.password, roles, hasher)
                .await?;
            println!("created user: {} ({})", user.email, user.id);
        }
        UserCommand::Promote(args) => {
            let role = Role::try_from(args.role.as_str())?;
            let user = require_user(engine, &args.email).await?;
            let mut roles = user.roles.clone();
            roles.grant(role);
            let user = engine.set_user_roles(user.id, roles).await?;
            println!("{}: {}", user.email, format_roles(&user.roles));
        }
        UserCommand::Demote(args) => {
            let role = Role::try_from(args.role.as_str())?;
            let user = require_user(engine, &args.email).await?;
            let mut roles = user.roles.clone();
            roles.revoke(role);
            let user = engine.set_user_roles(user.id, roles).await?;
            println!("{}: {}", user.email, format_roles(&user.roles));
        }
        UserCommand::Delete(args) => {
            let user = require_user(engine, &args.email).await?;
            engine.delete_user(user.id).await?;
            println!("deleted user: {}", user.email);
        }
        UserCommand::List(args) => {
            let page = engine
                .users_page(engine::page_number(args.page.as_deref()))
                .await?;
            for user in &page.items {
                println!("{}\t{}\t{}", user.id, user.email, format_roles(&user.roles));
            }
            println!(
                "page {}/{} ({} users)",
                page.page, page.total_pages, page.total_items
            );
        }
    }
    Ok(())
}

async fn show_report(
    engine: &Engine,
    args: ReportShowArgs,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let viewer = require_user(engine, &args.viewer).await?;
    let actor = engine.actor(viewer.id).await?;
    let report = engine
        .report_by_id(args.id)
        .await?
        .ok_or_else(|| format!("report not found: {}", args.id))?;
    deny_unless_granted(Permission::View, &Subject::report(&report), actor.as_ref())?;

    let page = engine
        .report_operations_page(&report, engine::page_number(args.page.as_deref()))
        .await?;
    println!("{}", report.title);
    for view in &page.items {
        let tags: Vec<&str> = view.tags.iter().map(|t| t.title.as_str()).collect();
        println!(
            "{}\t{}\t{:>12}\t{:>12}\t{}\t{}\t{}",
            view.operation.created_at.format("%Y-%m-%d"),
            view.operation.title,
            view.operation.amount,
            view.operation.current_balance,
            view.wallet.title,
            view.category.title,
            tags.join(", ")
        );
    }
    println!(
        "page {}/{} ({} operations)",
        page.page, page.total_pages, page.total_items
    );
    Ok(())
}

async fn require_user(
    engine: &Engine,
    email: &str,
) -> Result<engine::User, Box<dyn Error + Send + Sync>> {
    Ok(engine
        .user_by_email(email)
        .await?
        .ok_or_else(|| format!("user not found: {email}"))?)
}

fn format_roles(roles: &RoleSet) -> String {
    roles
        .effective()
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

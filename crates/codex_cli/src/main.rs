//! Command-line client for the Codex snippet gateway.

use anyhow::{bail, Context};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use codex_client::aggregator::collect_tag_results;
use codex_client::{AdminConsole, AdminGateway, CodexApp, HttpGateway, Partition};
use codex_core::models::admin::AdminStats;
use codex_core::models::collection::Collection;
use codex_core::models::snippet::{
    parse_tags_csv, CreateSnippetRequest, Snippet, UpdateSnippetRequest,
};
use codex_core::{ClientStore, Config, FileStore, MemoryStore};
use serde::Serialize;
use std::io::{self, Read};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "codex", about = "Codex snippet sharing CLI", version)]
struct Cli {
    /// Gateway URL (can also be set via CODEX_API_URL env var)
    #[arg(short, long, env = "CODEX_API_URL")]
    server: Option<String>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    json: bool,

    /// Request timeout in seconds
    #[arg(short = 't', long)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Sign in and remember the session
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = "CODEX_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Signup {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = "CODEX_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List public snippets (or your own with --mine)
    List {
        #[arg(long)]
        mine: bool,
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    Show {
        id: String,
    },
    /// Create a snippet from a file or stdin
    New {
        #[arg(long)]
        title: String,
        #[arg(short, long)]
        file: Option<String>,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(short, long, default_value = "plaintext")]
        language: String,
        /// Comma separated tags
        #[arg(long, default_value = "")]
        tags: String,
        #[arg(long)]
        private: bool,
    },
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long)]
        file: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        language: Option<String>,
        #[arg(long)]
        tags: Option<String>,
        #[arg(long, conflicts_with = "private")]
        public: bool,
        #[arg(long)]
        private: bool,
    },
    Delete {
        id: String,
    },
    /// Like or unlike a snippet
    Like {
        id: String,
    },
    Comment {
        id: String,
        text: String,
    },
    Fork {
        id: String,
    },
    /// Push a snippet to a GitHub Gist
    Gist {
        id: String,
    },
    Search {
        query: String,
    },
    /// Snippets carrying any of the given tags
    Tags {
        #[arg(required = true)]
        tags: Vec<String>,
    },
    Collections {
        #[command(subcommand)]
        action: CollectionCommands,
    },
    Admin {
        /// Admin key (can also be set via CODEX_ADMIN_KEY env var)
        #[arg(long, env = "CODEX_ADMIN_KEY", hide_env_values = true, global = true)]
        key: Option<String>,
        #[command(subcommand)]
        action: AdminCommands,
    },
}

#[derive(Subcommand)]
enum CollectionCommands {
    List,
    Show {
        id: String,
    },
    Create {
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    Delete {
        id: String,
    },
    Add {
        collection: String,
        snippet: String,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Exchange admin credentials for an admin key and print it
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long, env = "CODEX_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Stats,
    Users,
    DeleteUser {
        id: String,
    },
    Snippets,
    DeleteSnippet {
        id: String,
    },
    GithubUsers,
    RevokeGithub {
        user_id: String,
    },
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("codex=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn explicit_server_override(server: Option<String>) -> Option<String> {
    server
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Apply command-line overrides on top of the environment configuration.
fn resolve_config(mut config: Config, server: Option<String>, timeout: Option<u64>) -> Config {
    if let Some(server) = explicit_server_override(server) {
        config.api_url = server;
    }
    if let Some(secs) = timeout.filter(|secs| *secs > 0) {
        config.request_timeout = Duration::from_secs(secs);
    }
    config
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<String> {
    serde_json::to_string_pretty(value).context("response encoding error")
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn snippet_row(snippet: &Snippet) -> String {
    let owner = snippet
        .owner
        .as_ref()
        .map(|owner| owner.username().unwrap_or(owner.id()).to_string())
        .unwrap_or_default();
    let visibility = if snippet.visibility.is_public() {
        ""
    } else {
        " [private]"
    };
    format!(
        "{:<26} {:<32} {:<12} {:>4}♥ {}{}",
        snippet.id,
        truncate(&snippet.title, 32),
        truncate(&snippet.language, 12),
        snippet.like_count(),
        owner,
        visibility
    )
}

fn format_snippet_rows(snippets: &[&Snippet], json: bool) -> anyhow::Result<String> {
    if json {
        return to_json(snippets);
    }
    Ok(snippets
        .iter()
        .map(|s| snippet_row(s))
        .collect::<Vec<_>>()
        .join("\n"))
}

fn format_snippet_detail(snippet: &Snippet, json: bool) -> anyhow::Result<String> {
    if json {
        return to_json(snippet);
    }
    let mut lines = vec![
        format!("{} ({})", snippet.title, snippet.id),
        format!(
            "language: {}  likes: {}  views: {}",
            snippet.language,
            snippet.like_count(),
            snippet.views
        ),
    ];
    if !snippet.tags.is_empty() {
        lines.push(format!("tags: {}", snippet.tags.join(", ")));
    }
    if let Some(url) = &snippet.gist_url {
        lines.push(format!("gist: {}", url));
    }
    if !snippet.description.is_empty() {
        lines.push(String::new());
        lines.push(snippet.description.clone());
    }
    lines.push(String::new());
    lines.push(snippet.code.clone());
    for comment in &snippet.comments {
        lines.push(format!("  [{}] {}: {}", comment.id, comment.username, comment.text));
    }
    Ok(lines.join("\n"))
}

fn format_collections(collections: &[Collection], json: bool) -> anyhow::Result<String> {
    if json {
        return to_json(collections);
    }
    Ok(collections
        .iter()
        .map(|c| format!("{:<26} {:<32} {:>3} snippets", c.id, truncate(&c.name, 32), c.snippets.len()))
        .collect::<Vec<_>>()
        .join("\n"))
}

fn format_stats(stats: &AdminStats, json: bool) -> anyhow::Result<String> {
    if json {
        return to_json(stats);
    }
    Ok(format!(
        "users: {}\nsnippets: {}\nactive today: {}",
        stats.total_users, stats.total_snippets, stats.active_today
    ))
}

fn print_nonempty(output: String) {
    if !output.is_empty() {
        println!("{}", output);
    }
}

fn read_code(file: Option<&str>) -> anyhow::Result<String> {
    match file {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path))
        }
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            Ok(buffer)
        }
    }
}

fn visibility_flag(public: bool, private: bool) -> Option<bool> {
    match (public, private) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

async fn run_admin(
    gateway: HttpGateway,
    key: Option<String>,
    action: AdminCommands,
    json: bool,
) -> anyhow::Result<()> {
    let console = AdminConsole::new(AdminGateway::new(gateway), Arc::new(MemoryStore::new()));
    if let AdminCommands::Login { username, password } = &action {
        let session = console.login(username, password).await?;
        println!("{}", session.key);
        return Ok(());
    }
    let Some(key) = key else {
        bail!("admin commands need --key or CODEX_ADMIN_KEY; run `codex admin login` first");
    };
    console.adopt_key(&key)?;

    match action {
        AdminCommands::Login { .. } => unreachable!("admin login handled before key check"),
        AdminCommands::Stats => {
            let dashboard = console.dashboard().await?;
            if json {
                println!(
                    "{}",
                    to_json(&serde_json::json!({
                        "stats": dashboard.stats,
                        "userGrowth": dashboard.user_growth,
                        "snippetActivity": dashboard.snippet_activity,
                    }))?
                );
            } else {
                println!("{}", format_stats(&dashboard.stats, false)?);
                for point in &dashboard.user_growth {
                    println!("  new users {:<12} {}", point.label, point.count);
                }
                for point in &dashboard.snippet_activity {
                    println!("  snippets  {:<12} {}", point.label, point.count);
                }
            }
        }
        AdminCommands::Users => {
            let users = console.users().await?;
            if json {
                println!("{}", to_json(&users)?);
            } else {
                for user in users {
                    println!("{:<26} {:<20} {}", user.id, user.username, user.email);
                }
            }
        }
        AdminCommands::DeleteUser { id } => {
            console.delete_user(&id).await?;
            println!("Deleted user: {}", id);
        }
        AdminCommands::Snippets => {
            let snippets = console.snippets().await?;
            let refs: Vec<&Snippet> = snippets.iter().collect();
            print_nonempty(format_snippet_rows(&refs, json)?);
        }
        AdminCommands::DeleteSnippet { id } => {
            console.delete_snippet(&id).await?;
            println!("Deleted snippet: {}", id);
        }
        AdminCommands::GithubUsers => {
            let connections = console.github_users().await?;
            if json {
                println!("{}", to_json(&connections)?);
            } else {
                for c in connections {
                    println!(
                        "{:<26} {:<20} {}",
                        c.id,
                        c.username,
                        c.github_username.as_deref().unwrap_or("-")
                    );
                }
            }
        }
        AdminCommands::RevokeGithub { user_id } => {
            console.revoke_github(&user_id).await?;
            println!("Revoked GitHub connection for {}", user_id);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Cli {
        server,
        json,
        timeout,
        command,
    } = Cli::parse();

    if let Commands::Completions { shell } = &command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    init_tracing();
    let config = resolve_config(Config::from_env(), server, timeout);
    debug!(server = config.api_url.as_str(), "using gateway");
    let gateway = HttpGateway::from_config(&config)?;

    if let Commands::Admin { key, action } = command {
        return run_admin(gateway, key, action, json).await;
    }

    let durable: Arc<dyn ClientStore> = Arc::new(
        FileStore::open(config.state_file())
            .with_context(|| format!("failed to open {}", config.state_file().display()))?,
    );
    // One query per invocation, nothing to coalesce.
    let mut app = CodexApp::new(Arc::new(gateway), durable, Duration::ZERO);

    match command {
        Commands::Completions { .. } | Commands::Admin { .. } => {
            unreachable!("handled before the app is built")
        }
        Commands::Login { email, password } => {
            let session = app.login(&email, &password).await?;
            println!("Signed in as {}", session.user.username);
        }
        Commands::Signup {
            username,
            email,
            password,
        } => {
            let session = app.signup(&username, &email, &password).await?;
            println!("Signed up as {}", session.user.username);
        }
        Commands::Logout => {
            app.logout();
            println!("Logged out");
        }
        Commands::Whoami => {
            let user = app.load_profile().await?;
            if json {
                println!("{}", to_json(&user)?);
            } else {
                match &user.github_username {
                    Some(github) => println!("{} <{}> (GitHub: {})", user.username, user.email, github),
                    None => println!("{} <{}>", user.username, user.email),
                }
            }
        }
        Commands::List { mine, limit } => {
            if mine && !app.is_signed_in() {
                bail!("not signed in; run `codex login` first");
            }
            app.refresh().await?;
            let partition = if mine {
                Partition::Mine
            } else {
                Partition::Public
            };
            let items: Vec<&Snippet> = app.cache().partition(partition).iter().take(limit).collect();
            print_nonempty(format_snippet_rows(&items, json)?);
        }
        Commands::Show { id } => {
            let snippet = app.open_snippet(&id).await?;
            println!("{}", format_snippet_detail(&snippet, json)?);
        }
        Commands::New {
            title,
            file,
            description,
            language,
            tags,
            private,
        } => {
            let request = CreateSnippetRequest {
                title,
                description,
                language,
                code: read_code(file.as_deref())?,
                tags: parse_tags_csv(&tags),
                is_public: !private,
            };
            let created = app.create_snippet(request).await?;
            if json {
                println!("{}", to_json(&created)?);
            } else {
                println!("Created: {} ({})", created.title, created.id);
            }
        }
        Commands::Edit {
            id,
            title,
            file,
            description,
            language,
            tags,
            public,
            private,
        } => {
            let code = match file.as_deref() {
                Some(path) => Some(read_code(Some(path))?),
                None => None,
            };
            let request = UpdateSnippetRequest {
                title,
                description,
                language,
                code,
                tags: tags.as_deref().map(parse_tags_csv),
                is_public: visibility_flag(public, private),
            };
            let updated = app.update_snippet(&id, request).await?;
            if json {
                println!("{}", to_json(&updated)?);
            } else {
                println!("Updated: {} ({})", updated.title, updated.id);
            }
        }
        Commands::Delete { id } => {
            app.delete_snippet(&id).await?;
            println!("Deleted snippet: {}", id);
        }
        Commands::Like { id } => {
            let likes = app.toggle_like(&id).await?;
            let liked = app
                .session()
                .is_some_and(|session| likes.iter().any(|user| user == &session.user.id));
            println!(
                "{} {} ({} likes)",
                if liked { "Liked" } else { "Unliked" },
                id,
                likes.len()
            );
        }
        Commands::Comment { id, text } => {
            let updated = app.add_comment(&id, &text).await?;
            println!("Commented on {} ({} comments)", updated.id, updated.comments.len());
        }
        Commands::Fork { id } => {
            let fork = app.fork_snippet(&id).await?;
            println!("Forked: {} ({})", fork.title, fork.id);
        }
        Commands::Gist { id } => match app.sync_to_gist(&id).await? {
            Some(url) => println!("{}", url),
            None => println!("Synced {} to GitHub Gist", id),
        },
        Commands::Search { query } => {
            app.set_search_query(&query);
            if let Some(Err(action)) = app.settle_search().await {
                return Err(action.into());
            }
            let items: Vec<&Snippet> = app.cache().partition(Partition::SearchResults).iter().collect();
            print_nonempty(format_snippet_rows(&items, json)?);
        }
        Commands::Tags { tags } => {
            let (items, failed) = collect_tag_results(app.gateway(), &tags).await;
            for failure in &failed {
                eprintln!("tag '{}' failed: {}", failure.tag, failure.message);
            }
            let refs: Vec<&Snippet> = items.iter().collect();
            print_nonempty(format_snippet_rows(&refs, json)?);
        }
        Commands::Collections { action } => match action {
            CollectionCommands::List => {
                let collections = app.load_collections().await?;
                print_nonempty(format_collections(collections, json)?);
            }
            CollectionCommands::Show { id } => {
                let collection = app.open_collection(&id).await?;
                if json {
                    println!("{}", to_json(collection)?);
                } else {
                    println!("{} ({})", collection.name, collection.id);
                    let items: Vec<&Snippet> = collection.populated_snippets().collect();
                    print_nonempty(format_snippet_rows(&items, false)?);
                }
            }
            CollectionCommands::Create { name, description } => {
                let created = app.create_collection(&name, &description).await?;
                println!("Created collection: {} ({})", created.name, created.id);
            }
            CollectionCommands::Delete { id } => {
                app.delete_collection(&id).await?;
                println!("Deleted collection: {}", id);
            }
            CollectionCommands::Add {
                collection,
                snippet,
            } => {
                app.add_to_collection(&collection, &snippet).await?;
                println!("Added {} to {}", snippet, collection);
            }
        },
    }

    Ok(())
}

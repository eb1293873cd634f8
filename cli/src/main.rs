use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use codegenie_client::code_gen_type;
use codegenie_client::config::{ClientConfig, ConfigError, normalize_base_url};
use codegenie_client::net::app_api::{self, GenCodeChunk};
use codegenie_client::net::chat_history_api;
use codegenie_client::net::envelope::{ApiError, BaseResponse};
use codegenie_client::net::transport::{HttpTransport, Transport, TransportError};
use codegenie_client::net::types::{
    AppAddRequest, AppAdminUpdateRequest, AppDeployRequest, AppQueryRequest, AppUpdateRequest, ChatHistoryQueryRequest,
    ChatToGenCodeParams, DeleteRequest, IdParams, ListAppChatHistoryParams, UserAddRequest, UserLoginRequest,
    UserQueryRequest, UserRegisterRequest, UserUpdateRequest,
};
use codegenie_client::net::user_api;
use codegenie_client::router::{Navigation, Router, RouterError};
use codegenie_client::state::{SessionFailure, SessionStore};
use codegenie_client::storage::{FileStore, KeyValueStore, StorageError};
use futures_util::StreamExt;
use serde::Serialize;

/// Storage key for the backend session cookie shared across invocations.
const SESSION_COOKIE_KEY: &str = "sessionCookie";

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("--base-url must not be empty")]
    EmptyBaseUrl,
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("{0}")]
    Session(#[from] SessionFailure),
    #[error(transparent)]
    Router(#[from] RouterError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("write to stdout failed: {0}")]
    Io(#[from] io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "codegenie", about = "CodeGenie API, session and route CLI")]
struct Cli {
    /// Overrides CODEGENIE_BASE_URL.
    #[arg(long)]
    base_url: Option<String>,

    /// Overrides CODEGENIE_STORAGE_DIR.
    #[arg(long)]
    storage_dir: Option<PathBuf>,

    /// Log requests and session events to stderr.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        user_name: String,
        #[arg(long, env = "CODEGENIE_PASSWORD")]
        password: String,
    },
    Register {
        user_name: String,
        #[arg(long, env = "CODEGENIE_PASSWORD")]
        password: String,
        /// Defaults to --password.
        #[arg(long)]
        check_password: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    Logout,
    /// Show the stored session, or ask the server with --refresh.
    Whoami {
        #[arg(long, default_value_t = false)]
        refresh: bool,
    },
    /// Resolve a route and run the navigation guard for the current session.
    Navigate { path: String },
    /// List the menu entries visible to the current session.
    Menu,
    User(UserCommand),
    App(AppCommand),
    Chat(ChatCommand),
}

#[derive(Args, Debug, Clone, Copy)]
struct PageArgs {
    #[arg(long, default_value_t = 1)]
    page: i64,
    #[arg(long, default_value_t = 10)]
    page_size: i64,
}

#[derive(Args, Debug)]
struct UserCommand {
    #[command(subcommand)]
    command: UserSubcommand,
}

#[derive(Subcommand, Debug)]
enum UserSubcommand {
    /// Full user record (admin).
    Get { id: i64 },
    GetVo { id: i64 },
    Add {
        user_name: String,
        #[arg(long)]
        avatar: Option<String>,
        #[arg(long)]
        profile: Option<String>,
        #[arg(long)]
        role: Option<String>,
    },
    Delete { id: i64 },
    Update {
        id: i64,
        #[arg(long)]
        user_name: Option<String>,
        #[arg(long)]
        avatar: Option<String>,
        #[arg(long)]
        profile: Option<String>,
        #[arg(long)]
        role: Option<String>,
    },
    List {
        #[command(flatten)]
        page: PageArgs,
        #[arg(long)]
        user_name: Option<String>,
        #[arg(long)]
        role: Option<String>,
    },
}

#[derive(Args, Debug)]
struct AppCommand {
    #[command(subcommand)]
    command: AppSubcommand,
}

#[derive(Subcommand, Debug)]
enum AppSubcommand {
    Add { init_prompt: String },
    Get {
        id: i64,
        /// Fetch the raw entity (admin) instead of the view object.
        #[arg(long, default_value_t = false)]
        raw: bool,
    },
    Update {
        id: i64,
        #[arg(long)]
        name: String,
    },
    AdminUpdate {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        cover: Option<String>,
        #[arg(long)]
        priority: Option<i32>,
    },
    Delete {
        id: i64,
        #[arg(long, default_value_t = false)]
        admin: bool,
    },
    Mine {
        #[command(flatten)]
        page: PageArgs,
        #[arg(long)]
        name: Option<String>,
        /// Generation mode, by wire value or label.
        #[arg(long)]
        gen_type: Option<String>,
    },
    Featured {
        #[command(flatten)]
        page: PageArgs,
        #[arg(long)]
        name: Option<String>,
        /// Generation mode, by wire value or label.
        #[arg(long)]
        gen_type: Option<String>,
    },
    /// All apps (admin).
    List {
        #[command(flatten)]
        page: PageArgs,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        gen_type: Option<String>,
    },
    Deploy { id: i64 },
    /// Stream generated code for a chat message to stdout.
    Generate { app_id: i64, message: String },
}

#[derive(Args, Debug)]
struct ChatCommand {
    #[command(subcommand)]
    command: ChatSubcommand,
}

#[derive(Subcommand, Debug)]
enum ChatSubcommand {
    /// One cursor page of an app's conversation.
    History {
        app_id: i64,
        #[arg(long)]
        page_size: Option<i64>,
        /// Only messages created before this timestamp.
        #[arg(long)]
        before: Option<String>,
    },
    Latest { app_id: i64 },
    Get {
        id: i64,
        #[arg(long, default_value_t = false)]
        vo: bool,
    },
    Delete { id: i64 },
    /// Delete every message of an app.
    Clear { app_id: i64 },
    List {
        #[command(flatten)]
        page: PageArgs,
        #[arg(long)]
        app_id: Option<i64>,
        /// Only the caller's own messages.
        #[arg(long, default_value_t = false)]
        mine: bool,
    },
}

struct CliContext {
    http: Arc<HttpTransport>,
    storage: Arc<FileStore>,
    session: SessionStore,
}

impl CliContext {
    fn transport(&self) -> &dyn Transport {
        self.http.as_ref()
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::WARN };
    tracing_subscriber::fmt().with_writer(io::stderr).with_max_level(level).init();

    let mut config = ClientConfig::from_env()?;
    if let Some(raw) = cli.base_url.as_deref() {
        config.base_url = normalize_base_url(raw).ok_or(CliError::EmptyBaseUrl)?;
    }
    if let Some(dir) = cli.storage_dir {
        config.storage_dir = dir;
    }

    let http = Arc::new(HttpTransport::new(&config)?);
    let storage = Arc::new(FileStore::new(config.storage_dir.clone()));
    if let Some(cookie) = storage.get(SESSION_COOKIE_KEY)? {
        http.import_cookies(&cookie);
    }
    let session = SessionStore::new(http.clone(), storage.clone());
    let mut ctx = CliContext { http, storage, session };

    let logging_out = matches!(cli.command, Command::Logout);
    let result = run(&mut ctx, cli.command).await;
    if logging_out {
        return result;
    }
    settle(result, save_cookies(&ctx))
}

/// The command's own error wins over a failure to save cookies.
fn settle(result: Result<(), CliError>, saved: Result<(), CliError>) -> Result<(), CliError> {
    match (result, saved) {
        (Err(err), Err(save_err)) => {
            tracing::warn!(error = %save_err, "saving session cookie failed");
            Err(err)
        }
        (Err(err), Ok(())) => Err(err),
        (Ok(()), saved) => saved,
    }
}

async fn run(ctx: &mut CliContext, command: Command) -> Result<(), CliError> {
    match command {
        Command::Login { user_name, password } => {
            let request = UserLoginRequest { user_name: Some(user_name), user_password: Some(password) };
            let user = ctx.session.login(&request).await?;
            println!("logged in as {}", user.user_name.as_deref().unwrap_or("(unnamed)"));
            Ok(())
        }
        Command::Register { user_name, password, check_password, email } => {
            let request = UserRegisterRequest {
                email,
                user_name: Some(user_name),
                check_password: Some(check_password.unwrap_or_else(|| password.clone())),
                user_password: Some(password),
            };
            let id = ctx.session.register(&request).await?;
            match id {
                Some(id) => println!("registered user {id}"),
                None => println!("registered"),
            }
            Ok(())
        }
        Command::Logout => {
            ctx.session.initialize();
            ctx.session.logout().await;
            ctx.storage.remove(SESSION_COOKIE_KEY)?;
            println!("logged out");
            Ok(())
        }
        Command::Whoami { refresh } => {
            ctx.session.initialize();
            if refresh {
                ctx.session.fetch_current_user().await;
            }
            match ctx.session.user() {
                Some(user) => print_json(user),
                None => {
                    println!("not logged in");
                    Ok(())
                }
            }
        }
        Command::Navigate { path } => {
            let mut router = Router::new();
            match router.navigate(&mut ctx.session, &path)? {
                Navigation::Arrived(route) => println!("{} ({:?})", route.path, route.name()),
                Navigation::Redirected { requested, route } => {
                    println!("{} ({:?}) redirected from {requested}", route.path, route.name());
                }
            }
            Ok(())
        }
        Command::Menu => {
            ctx.session.initialize();
            for route in Router::menu(&ctx.session) {
                println!("{:<16} {}", route.path, route.meta.title.unwrap_or(""));
            }
            Ok(())
        }
        Command::User(user) => run_user(ctx, user).await,
        Command::App(app) => run_app(ctx, app).await,
        Command::Chat(chat) => run_chat(ctx, chat).await,
    }
}

async fn run_user(ctx: &CliContext, user: UserCommand) -> Result<(), CliError> {
    let transport = ctx.transport();
    match user.command {
        UserSubcommand::Get { id } => print_envelope(user_api::get_user_by_id(transport, IdParams { id }).await?),
        UserSubcommand::GetVo { id } => {
            print_envelope(user_api::get_user_vo_by_id(transport, IdParams { id }).await?)
        }
        UserSubcommand::Add { user_name, avatar, profile, role } => {
            let body =
                UserAddRequest { user_name: Some(user_name), user_avatar: avatar, user_profile: profile, user_role: role };
            print_envelope(user_api::add_user(transport, &body).await?)
        }
        UserSubcommand::Delete { id } => {
            print_envelope(user_api::delete_user(transport, &DeleteRequest { id: Some(id) }).await?)
        }
        UserSubcommand::Update { id, user_name, avatar, profile, role } => {
            let body = UserUpdateRequest {
                id: Some(id),
                user_name,
                user_avatar: avatar,
                user_profile: profile,
                user_role: role,
            };
            print_envelope(user_api::update_user(transport, &body).await?)
        }
        UserSubcommand::List { page, user_name, role } => {
            let query = UserQueryRequest {
                page_num: Some(page.page),
                page_size: Some(page.page_size),
                user_name,
                user_role: role,
                ..UserQueryRequest::default()
            };
            print_envelope(user_api::list_user_vo_by_page(transport, &query).await?)
        }
    }
}

fn app_query(page: PageArgs, name: Option<String>, gen_type: Option<&str>) -> AppQueryRequest {
    AppQueryRequest {
        page_num: Some(page.page),
        page_size: Some(page.page_size),
        app_name: name,
        code_gen_type: gen_type.map(|t| code_gen_type::value_for(t).to_owned()),
        ..AppQueryRequest::default()
    }
}

async fn run_app(ctx: &CliContext, app: AppCommand) -> Result<(), CliError> {
    let transport = ctx.transport();
    match app.command {
        AppSubcommand::Add { init_prompt } => {
            print_envelope(app_api::add_app(transport, &AppAddRequest { init_prompt: Some(init_prompt) }).await?)
        }
        AppSubcommand::Get { id, raw: true } => {
            print_envelope(app_api::get_app_by_id(transport, IdParams { id }).await?)
        }
        AppSubcommand::Get { id, raw: false } => {
            print_envelope(app_api::get_app_vo_by_id(transport, IdParams { id }).await?)
        }
        AppSubcommand::Update { id, name } => {
            let body = AppUpdateRequest { id: Some(id), app_name: Some(name) };
            print_envelope(app_api::update_app(transport, &body).await?)
        }
        AppSubcommand::AdminUpdate { id, name, cover, priority } => {
            let body = AppAdminUpdateRequest { id: Some(id), app_name: name, cover, priority };
            print_envelope(app_api::update_app_by_admin(transport, &body).await?)
        }
        AppSubcommand::Delete { id, admin } => {
            let body = DeleteRequest { id: Some(id) };
            let resp = if admin {
                app_api::delete_app_by_admin(transport, &body).await?
            } else {
                app_api::delete_app(transport, &body).await?
            };
            print_envelope(resp)
        }
        AppSubcommand::Mine { page, name, gen_type } => {
            let query = app_query(page, name, gen_type.as_deref());
            print_envelope(app_api::list_my_app_vo_by_page(transport, &query).await?)
        }
        AppSubcommand::Featured { page, name, gen_type } => {
            let query = app_query(page, name, gen_type.as_deref());
            print_envelope(app_api::list_featured_app_vo_by_page(transport, &query).await?)
        }
        AppSubcommand::List { page, name, gen_type } => {
            let query = app_query(page, name, gen_type.as_deref());
            print_envelope(app_api::list_app_vo_by_page_admin(transport, &query).await?)
        }
        AppSubcommand::Deploy { id } => {
            print_envelope(app_api::deploy_app(transport, &AppDeployRequest { app_id: Some(id) }).await?)
        }
        AppSubcommand::Generate { app_id, message } => {
            let params = ChatToGenCodeParams { app_id, message };
            let mut chunks = app_api::chat_to_gen_code(transport, &params).await?;
            let mut stdout = io::stdout();
            while let Some(chunk) = chunks.next().await {
                match chunk? {
                    GenCodeChunk::Content(text) => {
                        stdout.write_all(text.as_bytes())?;
                        stdout.flush()?;
                    }
                    GenCodeChunk::Done => break,
                }
            }
            writeln!(stdout)?;
            Ok(())
        }
    }
}

async fn run_chat(ctx: &CliContext, chat: ChatCommand) -> Result<(), CliError> {
    let transport = ctx.transport();
    match chat.command {
        ChatSubcommand::History { app_id, page_size, before } => {
            let params = ListAppChatHistoryParams { app_id, page_size, last_create_time: before };
            print_envelope(chat_history_api::list_app_chat_history(transport, &params).await?)
        }
        ChatSubcommand::Latest { app_id } => {
            print_envelope(chat_history_api::get_latest_chat_history_by_app_id(transport, app_id).await?)
        }
        ChatSubcommand::Get { id, vo: true } => {
            print_envelope(chat_history_api::get_chat_history_vo_by_id(transport, IdParams { id }).await?)
        }
        ChatSubcommand::Get { id, vo: false } => {
            print_envelope(chat_history_api::get_chat_history_by_id(transport, IdParams { id }).await?)
        }
        ChatSubcommand::Delete { id } => {
            print_envelope(chat_history_api::delete_chat_history(transport, &DeleteRequest { id: Some(id) }).await?)
        }
        ChatSubcommand::Clear { app_id } => {
            print_envelope(chat_history_api::delete_chat_history_by_app_id(transport, app_id).await?)
        }
        ChatSubcommand::List { page, app_id, mine } => {
            let query = ChatHistoryQueryRequest {
                page_num: Some(page.page),
                page_size: Some(page.page_size),
                app_id,
                ..ChatHistoryQueryRequest::default()
            };
            let resp = if mine {
                chat_history_api::list_my_chat_history_vo_by_page(transport, &query).await?
            } else {
                chat_history_api::list_chat_history_vo_by_page(transport, &query).await?
            };
            print_envelope(resp)
        }
    }
}

/// Keep the jar's cookies for the next invocation.
fn save_cookies(ctx: &CliContext) -> Result<(), CliError> {
    match ctx.http.export_cookies() {
        Some(cookie) => ctx.storage.set(SESSION_COOKIE_KEY, &cookie)?,
        None => ctx.storage.remove(SESSION_COOKIE_KEY)?,
    }
    Ok(())
}

/// Print the whole envelope, then fail on a non-zero `code`.
fn print_envelope<T: Serialize>(resp: BaseResponse<T>) -> Result<(), CliError> {
    print_json(&resp)?;
    if resp.requires_login() {
        tracing::warn!("not logged in; run `codegenie login` first");
    }
    resp.into_result()?;
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;

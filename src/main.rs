use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use timetable_share::api::{ApiClient, ApiConfig, HttpApiClient};
use timetable_share::error::AppError;
use timetable_share::models::{
    ClassForm, ProfileUpdate, TIME_SLOTS, Timetable, UserId, Weekday, resolve_status,
};
use timetable_share::services::{
    Auth, FriendDirectory, Inbox, ProfileView, QrInvite, RegisterForm, StatusTicker, TimetableStore,
};
use timetable_share::session::{SessionRecord, SessionStore};

#[derive(Parser)]
#[command(name = "timetable-share", version, about = "Share your class timetable with friends")]
struct Cli {
    /// API base url (overrides TIMETABLE_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Session file (overrides TIMETABLE_SESSION_PATH)
    #[arg(long)]
    session: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    Login { username: String, password: String },
    Register {
        username: String,
        email: String,
        password: String,
        #[arg(long)]
        confirm: String,
    },
    Logout,
    Whoami,
    /// Current class status; --watch keeps it updated every second
    Status {
        #[arg(long)]
        watch: bool,
    },
    /// Show your timetable, or a friend's with --user
    Timetable {
        #[arg(long)]
        user: Option<UserId>,
    },
    Set {
        day: String,
        period: u8,
        subject: String,
        #[arg(long, default_value = "")]
        room: String,
        #[arg(long, default_value = "")]
        professor: String,
    },
    Delete { day: String, period: u8 },
    /// Re-send every cell of your timetable
    SaveAll,
    Friends,
    Search { query: String },
    Request { user_id: UserId },
    Requests,
    Accept { request_id: String },
    Reject { request_id: String },
    /// Your add-friend QR code; --out writes the PNG
    Qr {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Send a friend request from a scanned share link
    Scan { text: String },
    Conversations,
    Messages { conversation_id: i64 },
    Chat { user_id: UserId },
    Send { conversation_id: i64, content: String },
    Unread,
    Profile {
        #[arg(long)]
        bio: Option<String>,
        #[arg(long)]
        grade: Option<String>,
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        hobbies: Option<String>,
        #[arg(long)]
        public: Option<bool>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "timetable_share=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let mut config = ApiConfig::new_from_env()?;
    if let Some(url) = cli.api_url {
        config.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(path) = cli.session {
        config.session_path = path.display().to_string();
    }

    let mut session = SessionStore::new(&config.session_path);
    let client = Arc::new(HttpApiClient::new(config.clone())?);
    if let Some(cookie) = session.init().and_then(|r| r.cookie.clone()) {
        client.restore_cookies(&cookie);
    }
    let api: Arc<dyn ApiClient> = client.clone();

    match cli.command {
        Command::Login { username, password } => {
            let user = Auth::new(api).login(&username, &password).await?;
            println!("ログインしました: {}", user.username);
            session.set(SessionRecord { user, cookie: client.cookie_header() })?;
        }
        Command::Register { username, email, password, confirm } => {
            let form = RegisterForm { username, email, password, confirm_password: confirm };
            let user = Auth::new(api).register(&form).await?;
            println!("登録しました: {}", user.username);
            session.set(SessionRecord { user, cookie: client.cookie_header() })?;
        }
        Command::Logout => {
            Auth::new(api).logout().await;
            session.clear()?;
            println!("ログアウトしました");
        }
        command => {
            if session.user().is_none() {
                return Err(AppError::Validation("先にログインしてください".to_string()));
            }
            run_authenticated(command, api, &config, &session).await?;
        }
    }

    Ok(())
}

async fn run_authenticated(
    command: Command,
    api: Arc<dyn ApiClient>,
    config: &ApiConfig,
    session: &SessionStore,
) -> Result<(), AppError> {
    match command {
        Command::Whoami => {
            let user = api.current_user().await?;
            println!("{} <{}> (id: {})", user.username, user.email, user.id);
        }
        Command::Status { watch } => {
            let mut store = TimetableStore::new(api);
            let timetable = store.load().await.clone();
            if !watch {
                let now = chrono::Local::now().naive_local();
                println!("{}", resolve_status(now, &timetable));
                return Ok(());
            }
            watch_status(timetable).await;
        }
        Command::Timetable { user } => {
            let timetable = match user {
                Some(user_id) => FriendDirectory::new(api).friend_timetable(user_id).await,
                None => TimetableStore::new(api).load().await.clone(),
            };
            print_timetable(&timetable);
        }
        Command::Set { day, period, subject, room, professor } => {
            let day = parse_day(&day)?;
            let mut store = TimetableStore::new(api);
            store.load().await;
            let form = ClassForm::new(subject).with_room(room).with_professor(professor);
            if store.save_cell(day, period, form).await? {
                println!("授業を保存しました");
                print_timetable(store.timetable());
            } else {
                return Err(AppError::Validation("保存に失敗しました".to_string()));
            }
        }
        Command::Delete { day, period } => {
            let day = parse_day(&day)?;
            let mut store = TimetableStore::new(api);
            store.load().await;
            if store.delete_cell(day, period).await? {
                println!("授業を削除しました");
            } else {
                return Err(AppError::Validation("削除に失敗しました".to_string()));
            }
        }
        Command::SaveAll => {
            let mut store = TimetableStore::new(api);
            store.load().await;
            let report = store.save_all().await;
            println!("{}", report.message());
        }
        Command::Friends => {
            let mut directory = FriendDirectory::new(api);
            directory.load_friends().await;
            let summary = directory.status_summary();
            println!("友達 {} 人 (授業中 {} / 空き {})", summary.total, summary.in_class, summary.free);
            for friend in directory.friends() {
                let status = match &friend.class_status {
                    Some(s) if s.is_in_class() => "授業中",
                    _ => "空き時間",
                };
                println!("  [{}] {} - {}", friend.id, friend.username, status);
            }
        }
        Command::Search { query } => {
            let mut directory = FriendDirectory::new(api);
            for user in directory.search(&query).await {
                println!("  [{}] {} ({})", user.id, user.username, user.friendship_state.label());
            }
        }
        Command::Request { user_id } => {
            let mut directory = FriendDirectory::new(api);
            directory.send_request(user_id).await?;
            println!("友達申請を送信しました");
        }
        Command::Requests => {
            let mut directory = FriendDirectory::new(api);
            directory.load_requests().await;
            println!("受信した申請:");
            for req in directory.received() {
                println!("  #{} {}", req.id, req.user.username);
            }
            println!("送信した申請:");
            for req in directory.sent() {
                println!("  #{} {}", req.id, req.user.username);
            }
        }
        Command::Accept { request_id } => {
            let mut directory = FriendDirectory::new(api);
            directory.load_requests().await;
            directory.accept_request(&request_id).await?;
            println!("友達申請を承認しました");
        }
        Command::Reject { request_id } => {
            let mut directory = FriendDirectory::new(api);
            directory.load_requests().await;
            directory.reject_request(&request_id).await?;
            println!("友達申請を拒否しました");
        }
        Command::Qr { out } => {
            let invite = QrInvite::new(api, config.share_base_url.clone());
            let code = invite.fetch_code().await?;
            println!("{}", invite.share_url(code.user_id));
            if let Some(path) = out {
                code.save_png(&path).await?;
                println!("QRコードを保存しました: {}", path.display());
            }
        }
        Command::Scan { text } => {
            let invite = QrInvite::new(api, config.share_base_url.clone());
            println!("{}", invite.send_request_from_code(&text).await?);
        }
        Command::Conversations => {
            let mut inbox = Inbox::new(api);
            for conv in inbox.load_conversations().await {
                let preview = conv.last_message.as_ref().map(|m| m.content.as_str()).unwrap_or("");
                println!("  #{} {}: {}", conv.id, conv.other_user.username, preview);
            }
        }
        Command::Messages { conversation_id } => {
            let mut inbox = Inbox::new(api);
            let me = session.user().map(|u| u.id);
            for message in inbox.select(conversation_id).await {
                let who = if Some(message.sender_id) == me { "自分" } else { "相手" };
                println!("  [{}] {}", who, message.content);
            }
        }
        Command::Chat { user_id } => {
            let mut inbox = Inbox::new(api);
            let conv = inbox.start_conversation(user_id).await?;
            println!("会話 #{} ({})", conv.id, conv.other_user.username);
        }
        Command::Send { conversation_id, content } => {
            let mut inbox = Inbox::new(api);
            inbox.select(conversation_id).await;
            inbox.send_message(&content).await?;
            println!("送信しました");
        }
        Command::Unread => {
            let mut inbox = Inbox::new(api);
            println!("未読 {} 件", inbox.load_unread_count().await);
        }
        Command::Profile { bio, grade, department, hobbies, public } => {
            let mut view = ProfileView::new(api);
            let update = ProfileUpdate { bio, grade, department, hobbies, is_public: public };
            let profile = if update.is_empty() {
                view.load().await?
            } else {
                view.update(&update).await?
            };
            println!("{:#?}", profile);
        }
        Command::Login { .. } | Command::Register { .. } | Command::Logout => {}
    }

    Ok(())
}

async fn watch_status(timetable: Timetable) {
    let (_schedule_tx, schedule_rx) = watch::channel(timetable);
    let (ticker, mut status) = StatusTicker::every_second(schedule_rx);
    println!("{}", *status.borrow());

    loop {
        tokio::select! {
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("{}", *status.borrow_and_update());
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    debug!("status watch finished");
    drop(ticker);
}

fn parse_day(input: &str) -> Result<Weekday, AppError> {
    Weekday::from_key(input)
        .or_else(|| Weekday::ALL.into_iter().find(|d| d.short_name() == input || d.full_name() == input))
        .or_else(|| input.parse::<u8>().ok().and_then(Weekday::from_id))
        .ok_or_else(|| AppError::Validation(format!("無効な曜日です: {}", input)))
}

fn print_timetable(timetable: &Timetable) {
    let header: Vec<&str> = Weekday::ALL.iter().map(|d| d.short_name()).collect();
    println!("{:<6}{}", "", header.join("\t"));
    for slot in TIME_SLOTS {
        let row: Vec<&str> = Weekday::ALL
            .iter()
            .map(|d| timetable.get(*d, slot.period).map(|e| e.subject.as_str()).unwrap_or("-"))
            .collect();
        println!("{:<6}{}", slot.display_name, row.join("\t"));
    }
}

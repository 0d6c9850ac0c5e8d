use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use market_client::core::forms::{
    BlockForm, ComplaintForm, LoginForm, NoticeForm, PasswordResetForm, ProfileForm, RegisterForm,
    ReviewForm,
};
use market_client::core::listing::{
    ListingFilter, NOTICES_PAGE_SIZE, PageItem, Paginator, SortTab, filter_posts, sort_posts,
};
use market_client::core::models::{
    AuthResponse, Dialogue, Post, Review, SearchParams, User, VerificationStatus,
};
use market_client::{MarketClient, MarketClientError, Upload};

mod logging;
mod settings;

use logging::init_logging;
use settings::Settings;

const DEFAULT_CURRENCY: &str = "RUB";

#[derive(Debug, Parser)]
#[command(name = "market-cli", version, about = "CLI клиент доски объявлений")]
struct Cli {
    /// Адрес REST API (перекрывает MARKET_API_URL).
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Регистрация пользователя.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        surname: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Вход пользователя.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Выход: удаляет сохранённый токен.
    Logout,
    /// Запрос на сброс пароля.
    ResetPassword {
        #[arg(long)]
        email: String,
    },
    /// Текущая сессия и доступные разделы.
    Whoami,
    /// Обновление профиля (требует токен).
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        surname: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        avatar: Option<PathBuf>,
    },
    /// Публичный профиль пользователя.
    User {
        #[arg(long)]
        id: i64,
    },
    /// Список категорий.
    Categories,
    /// Избранные категории (требует токен).
    ///
    /// С `--set` заменяет список, без него печатает текущий.
    Favorites {
        #[arg(long, value_delimiter = ',')]
        set: Option<Vec<i64>>,
    },
    /// Лента объявлений с сортировкой и постраничным выводом.
    List {
        #[arg(long, default_value_t = SortTab::All)]
        tab: SortTab,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = NOTICES_PAGE_SIZE)]
        page_size: usize,
        #[arg(long)]
        query: Option<String>,
        #[arg(long)]
        category: Option<i64>,
        #[arg(long)]
        min_price: Option<f64>,
        #[arg(long)]
        max_price: Option<f64>,
        /// Показывать закрытые объявления.
        #[arg(long)]
        include_closed: bool,
    },
    /// Объявление по id.
    Get {
        #[arg(long)]
        id: i64,
    },
    /// Создание объявления (требует токен).
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        caption: String,
        #[arg(long)]
        price: f64,
        #[arg(long, default_value = DEFAULT_CURRENCY)]
        currency: String,
        #[arg(long)]
        category: Option<i64>,
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
        /// Путь к картинке; флаг можно повторять.
        #[arg(long)]
        image: Vec<PathBuf>,
    },
    /// Обновление объявления (требует токен).
    ///
    /// Неуказанные поля берутся из текущей версии объявления.
    Update {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        caption: Option<String>,
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        currency: Option<String>,
        #[arg(long)]
        category: Option<i64>,
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
        #[arg(long)]
        image: Vec<PathBuf>,
    },
    /// Удаление объявления (требует токен).
    Delete {
        #[arg(long)]
        id: i64,
    },
    /// Закрытие объявления (требует токен).
    Close {
        #[arg(long)]
        id: i64,
        /// Открыть закрытое объявление снова.
        #[arg(long)]
        reopen: bool,
    },
    /// Продвижение объявления (требует токен).
    Promote {
        #[arg(long)]
        id: i64,
        /// Снять продвижение.
        #[arg(long)]
        off: bool,
    },
    /// Мои объявления (требует токен).
    Mine,
    /// Список диалогов (требует токен).
    Chats,
    /// Лента диалога (требует токен).
    Chat {
        #[arg(long)]
        with: i64,
        #[arg(long)]
        post: i64,
    },
    /// Отправка сообщения (требует токен).
    Send {
        #[arg(long)]
        to: i64,
        #[arg(long)]
        post: i64,
        #[arg(long)]
        text: String,
    },
    /// Отзыв о пользователе (требует токен).
    Review {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        rating: u8,
        #[arg(long)]
        text: String,
    },
    /// Отзывы о пользователе.
    Reviews {
        #[arg(long)]
        user: i64,
    },
    /// Жалоба на объявление или пользователя (требует токен).
    Complain {
        #[arg(long)]
        message: String,
        #[arg(long)]
        post: Option<i64>,
        #[arg(long)]
        user: Option<i64>,
    },
    /// Заявка на верификацию (требует токен).
    Verify {
        /// Путь к фото; флаг можно повторять.
        #[arg(long, required = true)]
        photo: Vec<PathBuf>,
    },
    /// Модерация (требует роль moderator или admin).
    Admin {
        #[command(subcommand)]
        command: AdminCommand,
    },
}

#[derive(Debug, Subcommand)]
enum AdminCommand {
    /// Все пользователи.
    Users,
    /// Жалобы.
    Complaints,
    /// Блокировка пользователя.
    Block {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        reason: String,
    },
    /// Снятие блокировки.
    Unblock {
        #[arg(long)]
        id: i64,
    },
    /// Заблокированные пользователи.
    Blocked,
    /// Заявки на верификацию.
    Verifications,
    /// Решение по заявке.
    Respond {
        #[arg(long)]
        id: i64,
        #[arg(long, value_enum)]
        decision: Decision,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Decision {
    Approve,
    Reject,
}

impl From<Decision> for VerificationStatus {
    fn from(value: Decision) -> Self {
        match value {
            Decision::Approve => VerificationStatus::Approved,
            Decision::Reject => VerificationStatus::Rejected,
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Ошибка: {err:#}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;
    init_logging(&settings.log_level)?;

    let cli = Cli::parse();

    let mut client = MarketClient::new(settings.client_config(cli.server))
        .map_err(map_client_error)
        .context("не удалось создать HTTP клиент")?;

    let token_file = settings.token_file.as_path();
    if let Some(token) = load_token(token_file)
        .with_context(|| format!("не удалось прочитать {}", token_file.display()))?
    {
        client.set_token(token);
    }

    match cli.command {
        Command::Register {
            name,
            surname,
            phone,
            email,
            password,
        } => {
            let form = RegisterForm {
                name,
                surname,
                phone,
                email,
                password,
            };
            let auth = client.register(&form).await.map_err(map_client_error)?;
            persist_token(&client, token_file).context("не удалось сохранить токен")?;
            print_auth("Регистрация успешна", &auth);
        }
        Command::Login { email, password } => {
            let auth = client
                .login(&LoginForm { email, password })
                .await
                .map_err(map_client_error)?;
            persist_token(&client, token_file).context("не удалось сохранить токен")?;
            print_auth("Вход выполнен", &auth);
        }
        Command::Logout => {
            client.logout();
            remove_token(token_file).context("не удалось удалить токен")?;
            println!("Выход выполнен");
        }
        Command::ResetPassword { email } => {
            client
                .request_password_reset(&PasswordResetForm { email })
                .await
                .map_err(map_client_error)?;
            println!("Инструкции по сбросу пароля отправлены");
        }
        Command::Whoami => {
            let session = client.session();
            match session.user_id() {
                Some(id) => println!(
                    "Сессия: user_id={id}, staff={}, verified={}",
                    session.is_staff(),
                    session.is_verified()
                ),
                None => println!("Сессия: гость"),
            }
            let links: Vec<&str> = client.nav_links().iter().map(|l| l.label()).collect();
            println!("Разделы: {}", links.join(" | "));

            if session.is_logged_in() {
                let me = client.current_user().await.map_err(map_client_error)?;
                print_user("Профиль", &me);
            }
        }
        Command::Profile {
            name,
            surname,
            phone,
            avatar,
        } => {
            let avatar = avatar.map(Upload::from_path).transpose().map_err(map_client_error)?;
            let form = ProfileForm {
                name,
                surname,
                phone,
            };
            let user = client
                .update_profile(&form, avatar)
                .await
                .map_err(map_client_error)?;
            print_user("Профиль обновлён", &user);
        }
        Command::User { id } => {
            let user = client.get_user(id).await.map_err(map_client_error)?;
            print_user("Пользователь", &user);
        }
        Command::Categories => {
            let categories = client.categories().await.map_err(map_client_error)?;
            for category in &categories {
                println!("- [{}] {}", category.id, category.name);
            }
        }
        Command::Favorites { set } => match set {
            Some(ids) => {
                client
                    .set_favorite_categories(&ids)
                    .await
                    .map_err(map_client_error)?;
                println!("Избранные категории сохранены: {ids:?}");
            }
            None => {
                let categories = client.favorite_categories().await.map_err(map_client_error)?;
                println!("Избранных категорий: {}", categories.len());
                for category in &categories {
                    println!("- [{}] {}", category.id, category.name);
                }
            }
        },
        Command::List {
            tab,
            page,
            page_size,
            query,
            category,
            min_price,
            max_price,
            include_closed,
        } => {
            let params = SearchParams {
                query: query.clone(),
                category_id: category,
                min_price,
                max_price,
            };
            let posts = client.search_posts(&params).await.map_err(map_client_error)?;
            let filter = ListingFilter {
                query,
                category_id: category,
                min_price,
                max_price,
                include_closed,
            };
            let sorted = sort_posts(&filter_posts(&posts, &filter), tab);

            let mut paginator = Paginator::new(sorted.len(), page_size);
            paginator.set_page(page);
            print_posts(
                &format!("Объявления ({tab}), всего {}", sorted.len()),
                paginator.slice(&sorted),
            );
            println!("Страницы: {}", render_page_items(&paginator.items()));
        }
        Command::Get { id } => {
            let post = client.get_post(id).await.map_err(map_client_error)?;
            print_post("Объявление", &post);
        }
        Command::Create {
            title,
            caption,
            price,
            currency,
            category,
            tags,
            image,
        } => {
            let form = NoticeForm {
                title,
                caption,
                price,
                currency,
                category_id: category,
                tags,
            };
            let images = read_uploads(&image)?;
            let post = client
                .create_post(&form, images)
                .await
                .map_err(map_client_error)?;
            print_post("Объявление создано", &post);
        }
        Command::Update {
            id,
            title,
            caption,
            price,
            currency,
            category,
            tags,
            image,
        } => {
            let current = client.get_post(id).await.map_err(map_client_error)?;
            let current_category_id = current.category_id();
            let form = NoticeForm {
                title: title.unwrap_or(current.title),
                caption: caption.or(current.caption).unwrap_or_default(),
                price: price.or(current.price).unwrap_or_default(),
                currency: currency
                    .or(current.currency)
                    .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
                category_id: category.or(current_category_id),
                tags: tags.unwrap_or(current.tags),
            };
            let images = read_uploads(&image)?;
            let post = client
                .update_post(id, &form, images)
                .await
                .map_err(map_client_error)?;
            print_post("Объявление обновлено", &post);
        }
        Command::Delete { id } => {
            client.delete_post(id).await.map_err(map_client_error)?;
            println!("Объявление удалено: id={id}");
        }
        Command::Close { id, reopen } => {
            client
                .set_post_closed(id, !reopen)
                .await
                .map_err(map_client_error)?;
            if reopen {
                println!("Объявление снова открыто: id={id}");
            } else {
                println!("Объявление закрыто: id={id}");
            }
        }
        Command::Promote { id, off } => {
            client
                .set_post_promoted(id, !off)
                .await
                .map_err(map_client_error)?;
            println!("Продвижение {}: id={id}", if off { "снято" } else { "включено" });
        }
        Command::Mine => {
            let posts = client.my_posts().await.map_err(map_client_error)?;
            print_posts(&format!("Мои объявления: {}", posts.len()), &posts);
        }
        Command::Chats => {
            let dialogues = client.dialogues().await.map_err(map_client_error)?;
            let me = client.session().user_id().unwrap_or_default();
            print_dialogues(&dialogues, me);
        }
        Command::Chat { with, post } => {
            let mut chat = client.chat().await.map_err(map_client_error)?;
            let me = chat.me();
            let messages = chat.open(with, post).await.map_err(map_client_error)?;
            println!("Диалог с user_id={with} по объявлению id={post}");
            for message in messages {
                let who = if message.sender_id == me { "я" } else { "собеседник" };
                println!("[{who}] {}", message.message);
            }
        }
        Command::Send { to, post, text } => {
            let mut chat = client.chat().await.map_err(map_client_error)?;
            chat.open(to, post).await.map_err(map_client_error)?;
            let sent = chat.send(&text).await.map_err(map_client_error)?;
            match sent.id {
                Some(id) if id > 0 => println!("Сообщение отправлено: id={id}"),
                _ => println!("Сообщение отправлено"),
            }
        }
        Command::Review { user, rating, text } => {
            let review = client
                .create_review(&ReviewForm {
                    user_id: user,
                    rating,
                    text,
                })
                .await
                .map_err(map_client_error)?;
            print_reviews("Отзыв сохранён", std::slice::from_ref(&review));
        }
        Command::Reviews { user } => {
            let reviews = client.user_reviews(user).await.map_err(map_client_error)?;
            print_reviews(&format!("Отзывов: {}", reviews.len()), &reviews);
        }
        Command::Complain {
            message,
            post,
            user,
        } => {
            client
                .create_complaint(&ComplaintForm {
                    message,
                    post_id: post,
                    user_id: user,
                })
                .await
                .map_err(map_client_error)?;
            println!("Жалоба отправлена");
        }
        Command::Verify { photo } => {
            let photos = read_uploads(&photo)?;
            client
                .submit_verification(photos)
                .await
                .map_err(map_client_error)?;
            println!("Заявка на верификацию отправлена");
        }
        Command::Admin { command } => run_admin(&client, command).await?,
    }

    Ok(())
}

async fn run_admin(client: &MarketClient, command: AdminCommand) -> Result<()> {
    match command {
        AdminCommand::Users => {
            let users = client.users().await.map_err(map_client_error)?;
            println!("Пользователей: {}", users.len());
            for user in &users {
                println!(
                    "- [{}] {} <{}> role={}{}",
                    user.id,
                    user.display_name(),
                    user.email,
                    user.role.as_str(),
                    if user.is_blocked { " (заблокирован)" } else { "" }
                );
            }
        }
        AdminCommand::Complaints => {
            let complaints = client.complaints().await.map_err(map_client_error)?;
            println!("Жалоб: {}", complaints.len());
            for complaint in &complaints {
                println!(
                    "- post_id={} user_id={}: {}",
                    fmt_opt(complaint.post_id),
                    fmt_opt(complaint.user_id),
                    complaint.message
                );
            }
        }
        AdminCommand::Block { id, reason } => {
            client
                .block_user(id, &BlockForm { reason })
                .await
                .map_err(map_client_error)?;
            println!("Пользователь заблокирован: id={id}");
        }
        AdminCommand::Unblock { id } => {
            client.unblock_user(id).await.map_err(map_client_error)?;
            println!("Блокировка снята: id={id}");
        }
        AdminCommand::Blocked => {
            let blocked = client.blocked_users().await.map_err(map_client_error)?;
            println!("Заблокировано: {}", blocked.len());
            for entry in &blocked {
                println!(
                    "- [{}] {}: {}",
                    entry.user.id,
                    entry.user.name,
                    entry.block_reason.as_deref().unwrap_or("-")
                );
            }
        }
        AdminCommand::Verifications => {
            let requests = client
                .verification_requests()
                .await
                .map_err(map_client_error)?;
            println!("Заявок: {}", requests.len());
            for request in &requests {
                println!(
                    "- [{}] user_id={} status={} photos={}",
                    request.id,
                    fmt_opt(request.user_id.or(request.user.as_ref().map(|u| u.id))),
                    request.status.as_str(),
                    request.images.as_slice().len()
                );
            }
        }
        AdminCommand::Respond { id, decision } => {
            let status = VerificationStatus::from(decision);
            client
                .respond_verification(id, status)
                .await
                .map_err(map_client_error)?;
            println!("Заявка id={id}: {}", status.as_str());
        }
    }
    Ok(())
}

fn parse_token_content(raw: &str) -> Option<String> {
    let token = raw.trim().to_string();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

fn load_token(path: &Path) -> io::Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(path)?;
    Ok(parse_token_content(&raw))
}

fn persist_token(client: &MarketClient, path: &Path) -> io::Result<()> {
    if let Some(token) = client.get_token() {
        fs::write(path, token)?;
    }
    Ok(())
}

fn remove_token(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

fn read_uploads(paths: &[PathBuf]) -> Result<Vec<Upload>> {
    paths
        .iter()
        .map(|path| {
            Upload::from_path(path)
                .map_err(map_client_error)
                .with_context(|| format!("не удалось прочитать {}", path.display()))
        })
        .collect()
}

fn map_client_error(err: MarketClientError) -> anyhow::Error {
    let message = match err {
        MarketClientError::Unauthorized => {
            "требуется авторизация: выполните `market-cli login ...` или `market-cli register ...`"
                .to_string()
        }
        MarketClientError::NotFound => "ресурс не найден".to_string(),
        MarketClientError::InvalidRequest(message) => format!("некорректный запрос: {message}"),
        MarketClientError::Validation(errors) => format!("ошибка в данных формы: {errors}"),
        MarketClientError::Decode(message) => format!("неожиданный ответ сервера: {message}"),
        MarketClientError::Http(err) => format!("ошибка HTTP: {err}"),
        MarketClientError::Io(err) => format!("ошибка ввода-вывода: {err}"),
    };
    anyhow::anyhow!(message)
}

fn render_page_items(items: &[PageItem]) -> String {
    items
        .iter()
        .map(|item| match item {
            PageItem::Page {
                number,
                current: true,
            } => format!("[{number}]"),
            PageItem::Page { number, .. } => number.to_string(),
            PageItem::Ellipsis => "...".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn fmt_opt<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn print_auth(title: &str, auth: &AuthResponse) {
    println!("{title}");
    println!("token: {}", auth.token);
    if let Some(user) = &auth.user {
        println!("user:");
        println!("  id: {}", user.id);
        println!("  name: {}", user.display_name());
        println!("  email: {}", user.email);
    }
}

fn print_user(title: &str, user: &User) {
    println!("{title}");
    println!("id: {}", user.id);
    println!("name: {}", user.display_name());
    println!("email: {}", user.email);
    println!("phone: {}", user.phone.as_deref().unwrap_or("-"));
    println!("role: {}", user.role.as_str());
    println!("verified: {}", user.is_verified);
    println!("created_at: {}", fmt_opt(user.created_at));
}

fn print_post(title: &str, post: &Post) {
    println!("{title}");
    println!("id: {}", post.id);
    println!("title: {}", post.title);
    println!("caption: {}", post.caption.as_deref().unwrap_or(""));
    println!("price: {}", post.price_label());
    println!("tags: {}", post.tags.join(", "));
    println!("category_id: {}", fmt_opt(post.category_id()));
    println!("owner_id: {}", fmt_opt(post.owner_id()));
    println!("views: {}", post.views.unwrap_or_default());
    println!("images: {}", post.images.as_slice().len());
    println!("promoted: {}", post.is_promoted);
    println!("closed: {}", post.is_closed);
    println!("created_at: {}", fmt_opt(post.created_at));
}

fn print_posts(title: &str, posts: &[Post]) {
    println!("{title}");
    for post in posts {
        let mut flags = String::new();
        if post.is_promoted {
            flags.push_str(" *");
        }
        if post.is_closed {
            flags.push_str(" (закрыто)");
        }
        println!(
            "- [{}] {} | {} | views={}{flags}",
            post.id,
            post.title,
            post.price_label(),
            post.views.unwrap_or_default()
        );
    }
}

fn print_dialogues(dialogues: &[Dialogue], me: i64) {
    println!("Диалогов: {}", dialogues.len());
    for dialogue in dialogues {
        let other = dialogue
            .counterpart(me)
            .map_or_else(|| "-".to_string(), |u| format!("{} (id={})", u.name, u.id));
        println!(
            "- {other} | post_id={} | {}",
            fmt_opt(dialogue.post_id()),
            dialogue.last_message.as_deref().unwrap_or("")
        );
    }
}

fn print_reviews(title: &str, reviews: &[Review]) {
    println!("{title}");
    for review in reviews {
        let author = review
            .author
            .as_ref()
            .map(|a| a.name.clone())
            .or_else(|| review.author_id.map(|id| format!("id={id}")))
            .unwrap_or_else(|| "-".to_string());
        println!("- {}/5 от {author}: {}", review.rating, review.text);
    }
}

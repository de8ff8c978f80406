use std::{fmt::Display, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use client_core::{
    load_settings,
    pagination::{page_view, PageItem},
    validation::{LoginForm, PasswordChangeForm, ProfileForm, RegisterForm},
    JobBoardClient, ListingController, ListingSnapshot, ListingSource, RawFilterForm, RawRegion,
};
use shared::domain::{ResumeId, ResumeShort, VacancyId, VacancyShort};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const DEFAULT_TOKEN_FILE: &str = ".jobboard-tokens.json";

#[derive(Parser, Debug)]
#[command(name = "jobboard", about = "Command-line front end for the job board API")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        email: String,
        password: String,
    },
    Register {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
        /// YYYY-MM-DD
        #[arg(long)]
        birth_date: String,
        /// male or female
        #[arg(long)]
        gender: String,
    },
    Logout,
    Me,
    UpdateProfile {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    ChangePassword {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
        #[arg(long)]
        repeat: String,
    },
    Avatar {
        path: PathBuf,
    },
    Vacancies(SearchArgs),
    Resumes(SearchArgs),
    Vacancy {
        id: i64,
    },
    Resume {
        id: i64,
    },
    Liked {
        kind: ListingKind,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    Like {
        kind: ListingKind,
        id: i64,
    },
    Unlike {
        kind: ListingKind,
        id: i64,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ListingKind {
    Vacancy,
    Resume,
}

#[derive(Args, Debug)]
struct SearchArgs {
    #[arg(long, default_value = "")]
    title: String,
    #[arg(long, default_value = "")]
    salary_min: String,
    #[arg(long, default_value = "")]
    salary_max: String,
    #[arg(long)]
    experience: Vec<String>,
    #[arg(long)]
    region: Option<String>,
    #[arg(long)]
    skill: Vec<String>,
    #[arg(long)]
    source: Vec<String>,
    #[arg(long, default_value_t = 1)]
    page: u32,
}

impl SearchArgs {
    fn form(&self) -> RawFilterForm {
        RawFilterForm {
            title: self.title.clone(),
            salary_min: self.salary_min.clone(),
            salary_max: self.salary_max.clone(),
            experience: self.experience.clone(),
            region: self
                .region
                .clone()
                .map(RawRegion::Text)
                .unwrap_or_default(),
            skills: self.skill.clone(),
            sources: self.source.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings()?;
    settings
        .token_store_path
        .get_or_insert_with(|| PathBuf::from(DEFAULT_TOKEN_FILE));
    debug!(base_url = %settings.base_url, page_size = settings.page_size, "settings loaded");
    let client = JobBoardClient::new(&settings)?;

    match cli.command {
        Command::Login { email, password } => {
            client.session.login(&LoginForm { email, password }).await?;
            println!("signed in");
        }
        Command::Register {
            first_name,
            last_name,
            email,
            password,
            confirm_password,
            birth_date,
            gender,
        } => {
            let form = RegisterForm {
                first_name,
                last_name,
                email,
                password,
                confirm_password,
                birth_date,
                gender,
            };
            client.session.register(&form).await?;
            println!("account created, signed in");
        }
        Command::Logout => {
            client.session.logout().await?;
            println!("signed out");
        }
        Command::Me => {
            let me = client.session.get_me().await?;
            println!("{} {} <{}>", me.first_name, me.last_name, me.email);
            if let Some(birth_date) = me.birth_date {
                println!("born {birth_date}");
            }
            if let Some(url) = me.profile_pic_url {
                println!("avatar {url}");
            }
        }
        Command::UpdateProfile {
            first_name,
            last_name,
            email,
        } => {
            let changes = ProfileForm {
                first_name,
                last_name,
                email,
            }
            .validate()?;
            if changes.is_empty() {
                bail!("nothing to update");
            }
            client.session.update_me(&changes).await?;
            println!("profile updated");
        }
        Command::ChangePassword {
            current,
            new,
            repeat,
        } => {
            let changes = PasswordChangeForm {
                current_password: current,
                password: new,
                password_again: repeat,
            }
            .validate()?;
            client.session.update_me(&changes).await?;
            println!("password changed");
        }
        Command::Avatar { path } => {
            let mime = image_mime(&path)?;
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            let filename = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("avatar")
                .to_string();
            client
                .session
                .update_profile_pic(bytes, &filename, mime)
                .await?;
            println!("profile picture updated");
        }
        Command::Vacancies(args) => {
            search(&client.vacancies, &args, |v: &VacancyShort| {
                format!("#{} {} | {}", v.id, v.title, v.salary)
            })
            .await;
        }
        Command::Resumes(args) => {
            search(&client.resumes, &args, |r: &ResumeShort| {
                let name = r.full_name().unwrap_or_else(|| "anonymous".into());
                format!("#{} {} ({name}) | {}", r.id, r.title, r.salary)
            })
            .await;
        }
        Command::Vacancy { id } => {
            let vacancy = client.vacancies.load_detail(VacancyId(id)).await?;
            println!("{}", serde_json::to_string_pretty(&vacancy)?);
        }
        Command::Resume { id } => {
            let resume = client.resumes.load_detail(ResumeId(id)).await?;
            println!("{}", serde_json::to_string_pretty(&resume)?);
        }
        Command::Liked { kind, page } => {
            let view = page_view(page.max(1), settings.page_size);
            match kind {
                ListingKind::Vacancy => {
                    let liked = client.session.liked_vacancies(view).await?;
                    println!("{} liked vacancies", liked.total_count);
                    for v in liked.items {
                        println!("#{} {} | {}", v.id, v.title, v.salary);
                    }
                }
                ListingKind::Resume => {
                    let liked = client.session.liked_resumes(view).await?;
                    println!("{} liked resumes", liked.total_count);
                    for r in liked.items {
                        println!("#{} {} | {}", r.id, r.title, r.salary);
                    }
                }
            }
        }
        Command::Like { kind, id } => {
            match kind {
                ListingKind::Vacancy => client.session.like_vacancy(VacancyId(id)).await?,
                ListingKind::Resume => client.session.like_resume(ResumeId(id)).await?,
            }
            println!("liked");
        }
        Command::Unlike { kind, id } => {
            match kind {
                ListingKind::Vacancy => client.session.unlike_vacancy(VacancyId(id)).await?,
                ListingKind::Resume => client.session.unlike_resume(ResumeId(id)).await?,
            }
            println!("unliked");
        }
    }

    Ok(())
}

async fn search<S, F>(controller: &ListingController<S>, args: &SearchArgs, line: F)
where
    S: ListingSource,
    F: Fn(&S::Item) -> String,
{
    controller.apply_form(&args.form()).await;
    if args.page > 1 {
        controller.set_page(args.page).await;
    }
    print_listing(&controller.snapshot().await, line);
}

fn print_listing<T>(snapshot: &ListingSnapshot<T>, line: impl Fn(&T) -> String) {
    println!(
        "{} results, page {} of {}",
        snapshot.total_count,
        snapshot.page,
        snapshot.total_pages().max(1)
    );
    for item in &snapshot.items {
        println!("  {}", line(item));
    }
    let pages = snapshot.pagination();
    if !pages.is_empty() {
        println!("{}", render_pages(&pages, snapshot.page));
    }
}

fn render_pages(pages: &[PageItem], current: u32) -> String {
    pages
        .iter()
        .map(|item| match item {
            PageItem::Page(page) if *page == current => format!("[{page}]"),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn image_mime(path: &std::path::Path) -> Result<&'static str> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => Ok("image/jpeg"),
        Some("png") => Ok("image/png"),
        Some("webp") => Ok("image/webp"),
        other => bail!("unsupported image type: {}", describe(other)),
    }
}

fn describe(ext: Option<impl Display>) -> String {
    ext.map(|e| format!(".{e}"))
        .unwrap_or_else(|| "no extension".into())
}

//*** START FILE: src/main.rs ***//
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use essay_sheet::admin::AdminDashboard;
use essay_sheet::chat::{ChatRouter, Reply};
use essay_sheet::config::{load_config_from_file, Config};
use essay_sheet::essay_service::EssayService;
use essay_sheet::grammar::{paginate, GrammarDb, PER_PAGE};
use essay_sheet::storage::{EssayStore, UserStore};
use essay_sheet::types::essay_data::UserProfile;
use essay_sheet::EssayError;

#[derive(Parser, Debug)]
#[command(name = "essay-sheet", version, about = "Grade TOPIK essays onto a wongoji grid sheet.")]
struct Cli {
    /// TOML configuration file. Missing file means defaults.
    #[arg(long, global = true, default_value = "essay_sheet.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score one essay file and write its grid sheet.
    Grade {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "cli")]
        user: String,
        #[arg(long, default_value = "essay.png")]
        output: PathBuf,
    },
    /// Read chat messages from stdin, one per line.
    Chat {
        #[arg(long)]
        user: String,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Search the grammar inventory.
    Grammar {
        keyword: Option<String>,
        #[arg(long)]
        function: Option<String>,
        #[arg(long)]
        level: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Print the admin report.
    Dashboard {
        #[arg(long = "as")]
        requester: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("essay_sheet=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config_from_file(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    match cli.command {
        Commands::Grade { input, user, output } => run_grade(&config, &input, &user, &output),
        Commands::Chat { user, out_dir } => run_chat(config, &user, &out_dir),
        Commands::Grammar { keyword, function, level, page } => {
            run_grammar(&config, keyword.as_deref(), function.as_deref(), level.as_deref(), page)
        }
        Commands::Dashboard { requester } => run_dashboard(&config, &requester),
    }
}

fn run_grade(config: &Config, input: &Path, user: &str, output: &Path) -> Result<()> {
    let text = fs::read_to_string(input).with_context(|| format!("reading essay {}", input.display()))?;
    let service = EssayService::from_config(config);
    let done = match service.finalize(user, &text) {
        Ok(done) => done,
        Err(EssayError::EmptyEssay) => bail!("{} contains no essay text", input.display()),
        Err(e) => return Err(e).context("grading essay"),
    };
    fs::write(output, &done.image_png).with_context(|| format!("writing {}", output.display()))?;
    println!("{}", done.caption);
    println!("Sheet written to {}", output.display());
    Ok(())
}

fn run_chat(config: Config, user_id: &str, out_dir: &Path) -> Result<()> {
    fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
    let user = UserProfile::anonymous(user_id);
    let mut router = ChatRouter::from_config(config);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut sheets = 0usize;

    for line in io::stdin().lock().lines() {
        let line = line.context("reading stdin")?;
        for reply in router.handle(&user, &line) {
            match reply {
                Reply::Text(text) => writeln!(out, "{}", text)?,
                Reply::Photo { png, caption } => {
                    sheets += 1;
                    let path = out_dir.join(format!("essay-{}-{}.png", user_id, sheets));
                    fs::write(&path, png).with_context(|| format!("writing {}", path.display()))?;
                    writeln!(out, "[sheet: {}]\n{}", path.display(), caption)?;
                }
            }
        }
        out.flush()?;
    }
    Ok(())
}

fn run_grammar(
    config: &Config,
    keyword: Option<&str>,
    function: Option<&str>,
    level: Option<&str>,
    page: usize,
) -> Result<()> {
    let db = GrammarDb::load(&config.grammar_path());
    let matches = db.filter(function, level, keyword);
    let (entries, total) = paginate(&matches, page, PER_PAGE);
    if entries.is_empty() {
        println!("No matching grammar patterns found. ({} total)", total);
        return Ok(());
    }
    let pages = total.div_ceil(PER_PAGE);
    println!("Page {}/{} ({} patterns)\n", page, pages, total);
    for entry in entries {
        println!("{}\n{}", entry.render(), "-".repeat(20));
    }
    Ok(())
}

fn run_dashboard(config: &Config, requester: &str) -> Result<()> {
    let essays = EssayStore::new(config.essays_path());
    let users = UserStore::new(config.users_path());
    let chunks = AdminDashboard::new(config, &essays, &users)
        .report(requester)
        .context("building admin dashboard")?;
    for chunk in chunks {
        print!("{}", chunk);
    }
    println!();
    Ok(())
}

//*** END FILE: src/main.rs ***//

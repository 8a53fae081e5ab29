use crate::admin::AdminDashboard;
use crate::config::Config;
use crate::error::EssayError;
use crate::essay_service::EssayService;
use crate::grammar::{paginate, GrammarDb, PER_PAGE};
use crate::session::SessionManager;
use crate::storage::UserStore;
use crate::types::essay_data::UserProfile;

pub const GREETING: &str = "안녕하세요! TOPIK Essay Master 봇입니다.";
pub const HELP_TEXT: &str = "/essay - 54번 에세이 작성 시작\n\
/done - 작성 완료 및 채점\n\
/cancel - 작성 취소\n\
/grammar [키워드] - 문법 검색\n\
/grammar page <n> <키워드> - 검색 결과 n쪽\n\
/grammar function <기능> [n] - 기능별 문법\n\
/grammar level <급> [n] - 급수별 문법\n\
/help - 도움말";
pub const ESSAY_PROMPT: &str = "📝 54번 에세이 작성 시작\n600~700자 이내로 작문하십시오.\n입력 후 /done 을 입력하세요.";
pub const SAVED_ACK: &str = "✍️ 저장했습니다. 계속 입력하거나 /done 을 입력하세요.";
pub const NO_ESSAY: &str = "❌ 작성된 에세이가 없습니다.";
pub const CANCELLED: &str = "🚫 에세이 작성을 취소했습니다.";
pub const NOT_WRITING: &str = "/essay 를 입력해 에세이 작성을 시작하세요.";
pub const UNKNOWN_COMMAND: &str = "알 수 없는 명령입니다. /help 를 입력하세요.";
pub const PROCESSING_FAILED: &str = "⚠️ 에세이를 처리하지 못했습니다. 잠시 후 다시 시도하세요.";
pub const UNAUTHORIZED: &str = "❌ You are not authorized to use this command.";
pub const GRAMMAR_TITLE: &str = "TOPIK Writing — Grammar Inventory";
pub const GRAMMAR_NO_RESULTS: &str = "No matching grammar patterns found.";

/// What the bot sends back for one incoming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Photo { png: Vec<u8>, caption: String },
}

impl Reply {
    fn text(s: impl Into<String>) -> Self {
        Reply::Text(s.into())
    }
}

/// Routes plain chat messages to sessions, the essay pipeline, grammar and admin views.
pub struct ChatRouter {
    config: Config,
    sessions: SessionManager,
    service: EssayService,
    users: UserStore,
    grammar: GrammarDb,
}

impl ChatRouter {
    pub fn new(config: Config, service: EssayService, users: UserStore, grammar: GrammarDb) -> Self {
        ChatRouter { config, sessions: SessionManager::new(), service, users, grammar }
    }

    /// Wires the production collaborators from configuration.
    pub fn from_config(config: Config) -> Self {
        let service = EssayService::from_config(&config);
        let users = UserStore::new(config.users_path());
        let grammar = GrammarDb::load(&config.grammar_path());
        Self::new(config, service, users, grammar)
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn handle(&mut self, user: &UserProfile, text: &str) -> Vec<Reply> {
        let text = text.trim_end_matches(['\r', '\n']);
        match parse_command(text) {
            Some((command, args)) => {
                self.audit(user, command);
                self.dispatch(user, command, args)
            }
            None => {
                self.audit(user, text);
                if self.sessions.append(&user.id, text) {
                    vec![Reply::text(SAVED_ACK)]
                } else {
                    vec![Reply::text(NOT_WRITING)]
                }
            }
        }
    }

    fn audit(&self, user: &UserProfile, entry: &str) {
        if let Err(e) = self.users.record_activity(user, entry) {
            tracing::warn!("Could not record activity for user {}: {}", user.id, e);
        }
    }

    fn dispatch(&mut self, user: &UserProfile, command: &str, args: &str) -> Vec<Reply> {
        tracing::debug!("User {} sent {}", user.id, command);
        match command {
            "/start" => vec![Reply::text(GREETING)],
            "/help" => vec![Reply::text(HELP_TEXT)],
            "/essay" => {
                self.sessions.start(&user.id);
                vec![Reply::text(ESSAY_PROMPT)]
            }
            "/done" => vec![self.finish_essay(user)],
            "/cancel" => {
                self.sessions.cancel(&user.id);
                vec![Reply::text(CANCELLED)]
            }
            "/grammar" => vec![Reply::Text(self.grammar_reply(args))],
            "/admin_dashboard" => self.admin_reply(user),
            _ => vec![Reply::text(UNKNOWN_COMMAND)],
        }
    }

    // The draft stays open until the sheet is delivered, so a failed or
    // empty `/done` can be retried.
    fn finish_essay(&mut self, user: &UserProfile) -> Reply {
        let Some(buffer) = self.sessions.peek(&user.id).map(str::to_string) else {
            return Reply::text(NO_ESSAY);
        };
        match self.service.finalize(&user.id, &buffer) {
            Ok(done) => {
                self.sessions.take(&user.id);
                Reply::Photo { png: done.image_png, caption: done.caption }
            }
            Err(EssayError::EmptyEssay) => Reply::text(NO_ESSAY),
            Err(e) => {
                tracing::error!("Finalizing essay for user {} failed: {}", user.id, e);
                Reply::text(PROCESSING_FAILED)
            }
        }
    }

    fn grammar_reply(&self, args: &str) -> String {
        let query = match GrammarQuery::parse(args) {
            Some(query) => query,
            None => {
                return format!(
                    "{}\n\nFunctions: {}\nLevels: {}\n\n{}",
                    GRAMMAR_TITLE,
                    self.grammar.list_functions().join(", "),
                    self.grammar.list_levels().join(", "),
                    GRAMMAR_USAGE
                )
            }
        };
        let matches = self.grammar.filter(query.function, query.level, query.keyword);
        if matches.is_empty() {
            return GRAMMAR_NO_RESULTS.to_string();
        }
        let (entries, total) = paginate(&matches, query.page, PER_PAGE);
        let pages = total.div_ceil(PER_PAGE);
        if entries.is_empty() {
            return format!("{} (page {} of {})", GRAMMAR_NO_RESULTS, query.page, pages);
        }
        let mut lines = vec![format!(
            "{} — {} ({} patterns, page {}/{})\n",
            GRAMMAR_TITLE,
            query.describe(),
            total,
            query.page,
            pages
        )];
        for entry in entries {
            lines.push(entry.render());
            lines.push("-".repeat(20));
        }
        if query.page < pages {
            lines.push(format!("Next: {}", query.command_for_page(query.page + 1)));
        }
        lines.join("\n")
    }

    fn admin_reply(&self, user: &UserProfile) -> Vec<Reply> {
        let dashboard = AdminDashboard::new(&self.config, self.service.essays(), &self.users);
        match dashboard.report(&user.id) {
            Ok(chunks) => chunks.into_iter().map(Reply::Text).collect(),
            Err(EssayError::Unauthorized) => vec![Reply::text(UNAUTHORIZED)],
            Err(e) => {
                tracing::error!("Admin dashboard failed: {}", e);
                vec![Reply::text(PROCESSING_FAILED)]
            }
        }
    }
}

const GRAMMAR_USAGE: &str = "/grammar <keyword> - search pattern or example\n\
/grammar page <n> <keyword> - more results\n\
/grammar function <function> [n] - browse by function\n\
/grammar level <level> [n] - browse by level";

/// Arguments of `/grammar`, resolved to filter criteria and a 1-based page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GrammarQuery<'a> {
    function: Option<&'a str>,
    level: Option<&'a str>,
    keyword: Option<&'a str>,
    page: usize,
}

impl<'a> GrammarQuery<'a> {
    /// `None` means no arguments: show the menu.
    fn parse(args: &'a str) -> Option<Self> {
        let args = args.trim();
        if args.is_empty() {
            return None;
        }
        let search = GrammarQuery { function: None, level: None, keyword: Some(args), page: 1 };
        let (head, rest) = args
            .split_once(char::is_whitespace)
            .map(|(head, rest)| (head, rest.trim()))
            .unwrap_or((args, ""));
        let query = match head {
            "function" | "level" if !rest.is_empty() => {
                let (value, page) = split_trailing_page(rest);
                let base = GrammarQuery { keyword: None, page, ..search };
                if head == "function" {
                    GrammarQuery { function: Some(value), ..base }
                } else {
                    GrammarQuery { level: Some(value), ..base }
                }
            }
            "page" => {
                let (number, keyword) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                match number.parse::<usize>() {
                    Ok(page) if page > 0 => {
                        let keyword = Some(keyword.trim()).filter(|k| !k.is_empty());
                        GrammarQuery { keyword, page, ..search }
                    }
                    _ => search,
                }
            }
            _ => search,
        };
        Some(query)
    }

    fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(function) = self.function {
            parts.push(format!("function: {}", function));
        }
        if let Some(level) = self.level {
            parts.push(format!("level: {}", level));
        }
        if let Some(keyword) = self.keyword {
            parts.push(format!("search: {}", keyword));
        }
        if parts.is_empty() {
            "all patterns".to_string()
        } else {
            parts.join(", ")
        }
    }

    fn command_for_page(&self, page: usize) -> String {
        match (self.function, self.level, self.keyword) {
            (Some(function), _, _) => format!("/grammar function {} {}", function, page),
            (None, Some(level), _) => format!("/grammar level {} {}", level, page),
            (None, None, Some(keyword)) => format!("/grammar page {} {}", page, keyword),
            (None, None, None) => format!("/grammar page {}", page),
        }
    }
}

// `Cause/Effect 2` -> ("Cause/Effect", 2); a value without a page number is page 1.
fn split_trailing_page(rest: &str) -> (&str, usize) {
    if let Some((value, last)) = rest.rsplit_once(char::is_whitespace) {
        if let Ok(page) = last.parse::<usize>() {
            if page > 0 {
                return (value.trim(), page);
            }
        }
    }
    (rest, 1)
}

/// Splits `/command@bot rest` into `("/command", "rest")`.
pub fn parse_command(text: &str) -> Option<(&str, &str)> {
    let trimmed = text.trim_start();
    if !trimmed.starts_with('/') {
        return None;
    }
    let (head, rest) = trimmed.split_once(char::is_whitespace).unwrap_or((trimmed, ""));
    let command = head.split('@').next().unwrap_or(head);
    Some((command, rest.trim()))
}

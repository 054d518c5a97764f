use playground_core::{SortField, SortOrder, UserQuery};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Signup {
        username: String,
        password: String,
        confirm_password: String,
        email: Option<String>,
    },
    Login {
        username: String,
        password: String,
    },
    Logout,
    Guess(String),
    GuessReset,
    Move(usize),
    BoardReset,
    SessionReset,
    Quiz(u32),
    Profile,
    ShowBio,
    SaveBio(String),
    AdminList(UserQuery),
    AdminStats,
    AdminExport,
    AdminDelete(String),
    AdminReset(String),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Empty command")]
    Empty,
    #[error("Unknown command: {0}")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
}

pub const HELP: &str = "\
signup <user> <password> <confirm> [email]
login <user> <password>
logout
guess <1-100>          guess-reset
move <0-8>             board-reset          session-reset
quiz <correct answers>
profile
bio [new text]
admin list [search] [--by username|games|login] [--desc]
admin stats | admin export | admin delete <user> | admin reset <user>
help | quit";

pub fn parse(line: &str) -> Result<Command, ParseError> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Err(ParseError::Empty);
    };
    let args: Vec<&str> = words.collect();

    match name.to_lowercase().as_str() {
        "signup" => match args.as_slice() {
            [username, password, confirm] | [username, password, confirm, _] => {
                Ok(Command::Signup {
                    username: username.to_string(),
                    password: password.to_string(),
                    confirm_password: confirm.to_string(),
                    email: args.get(3).map(|email| email.to_string()),
                })
            }
            _ => Err(ParseError::Usage("signup <user> <password> <confirm> [email]")),
        },
        "login" => match args.as_slice() {
            [username, password] => Ok(Command::Login {
                username: username.to_string(),
                password: password.to_string(),
            }),
            _ => Err(ParseError::Usage("login <user> <password>")),
        },
        "logout" => Ok(Command::Logout),
        // Raw text is kept so the engine decides what counts as a number
        "guess" if !args.is_empty() => Ok(Command::Guess(args.join(" "))),
        "guess" => Err(ParseError::Usage("guess <1-100>")),
        "guess-reset" => Ok(Command::GuessReset),
        "move" => args
            .first()
            .and_then(|cell| cell.parse().ok())
            .map(Command::Move)
            .ok_or(ParseError::Usage("move <0-8>")),
        "board-reset" => Ok(Command::BoardReset),
        "session-reset" => Ok(Command::SessionReset),
        "quiz" => args
            .first()
            .and_then(|count| count.parse().ok())
            .map(Command::Quiz)
            .ok_or(ParseError::Usage("quiz <correct answers>")),
        "profile" => Ok(Command::Profile),
        "bio" if args.is_empty() => Ok(Command::ShowBio),
        "bio" => Ok(Command::SaveBio(args.join(" "))),
        "admin" => parse_admin(&args),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(ParseError::Unknown(other.to_string())),
    }
}

fn parse_admin(args: &[&str]) -> Result<Command, ParseError> {
    match args {
        ["list", rest @ ..] => parse_admin_list(rest),
        ["stats"] => Ok(Command::AdminStats),
        ["export"] => Ok(Command::AdminExport),
        ["delete", username] => Ok(Command::AdminDelete(username.to_string())),
        ["reset", username] => Ok(Command::AdminReset(username.to_string())),
        _ => Err(ParseError::Usage(
            "admin list|stats|export|delete <user>|reset <user>",
        )),
    }
}

fn parse_admin_list(args: &[&str]) -> Result<Command, ParseError> {
    const USAGE: &str = "admin list [search] [--by username|games|login] [--desc]";
    let mut query = UserQuery::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match *arg {
            "--desc" => query.order = SortOrder::Descending,
            "--by" => {
                query.sort_by = match iter.next().copied() {
                    Some("username") => SortField::Username,
                    Some("games") => SortField::GamesPlayed,
                    Some("login") => SortField::LastLogin,
                    _ => return Err(ParseError::Usage(USAGE)),
                }
            }
            search if query.search.is_none() => query.search = Some(search.to_string()),
            _ => return Err(ParseError::Usage(USAGE)),
        }
    }

    Ok(Command::AdminList(query))
}
